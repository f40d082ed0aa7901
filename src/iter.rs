//! Iteration API (component C10, spec §6.2).
//!
//! A decode-one call only produces a single record; walking a whole buffer
//! is left to a small external cursor that remembers the last record's
//! length. On an `opcode` error the decoder forces `length = 1`, which is
//! exactly what lets [`X86Cursor::next`]/[`ArmCursor::next`] resynchronize
//! by skipping a single byte instead of getting stuck.

cfg_if::cfg_if! {
    if #[cfg(feature = "x86")] {
        use crate::x86::{self, Inst as X86Inst};

        /// Walks a buffer of x86/x86-64 instructions one record at a time.
        pub struct X86Cursor<'a> {
            buf: &'a [u8],
            pc: usize,
            last_len: usize,
        }

        impl<'a> X86Cursor<'a> {
            pub fn new(buf: &'a [u8]) -> Self {
                Self { buf, pc: 0, last_len: 0 }
            }

            /// Current position within the buffer.
            pub fn pc(&self) -> usize {
                self.pc
            }

            /// Decodes the record at the current PC without advancing.
            pub fn decode(&mut self) -> X86Inst {
                let inst = x86::decode(self.buf, self.pc);
                self.last_len = inst.length as usize;
                inst
            }

            /// Advances the PC by the length of the last decoded record.
            pub fn next(&mut self) {
                self.pc += self.last_len;
            }

            /// True if the current PC still lies inside the buffer, i.e.
            /// there is at least one more byte for `decode` to read.
            pub fn has_next(&self) -> bool {
                self.pc < self.buf.len()
            }

            /// Seeks to `p`, discarding the remembered last length.
            pub fn set_pc(&mut self, p: usize) {
                self.pc = p;
                self.last_len = 0;
            }
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "arm")] {
        use crate::arm::{self, CpuState, Inst as ArmInst};

        /// Walks a buffer of ARM instructions one record at a time.
        pub struct ArmCursor<'a> {
            buf: &'a [u8],
            pc: usize,
            last_len: usize,
            state: CpuState,
        }

        impl<'a> ArmCursor<'a> {
            pub fn new(buf: &'a [u8], state: CpuState) -> Self {
                Self { buf, pc: 0, last_len: 0, state }
            }

            pub fn pc(&self) -> usize {
                self.pc
            }

            /// Decodes the record at the current PC without advancing.
            pub fn decode(&mut self) -> ArmInst {
                let inst = arm::decode(self.buf, self.pc, self.state);
                self.last_len = inst.length as usize;
                inst
            }

            /// Advances the PC by the length of the last decoded record.
            pub fn next(&mut self) {
                self.pc += self.last_len;
            }

            /// True if the current PC still lies inside the buffer, i.e.
            /// there is at least one more byte for `decode` to read.
            pub fn has_next(&self) -> bool {
                self.pc < self.buf.len()
            }

            /// Seeks to `p`, discarding the remembered last length.
            pub fn set_pc(&mut self, p: usize) {
                self.pc = p;
                self.last_len = 0;
            }
        }
    }
}


#[cfg(all(test, feature = "arm"))]
mod arm_tests {
    use super::ArmCursor;
    use crate::arm::CpuState;

    #[test]
    fn walks_branch_then_stops_at_end() {
        let bytes = [0xFB, 0xFF, 0xFF, 0x1A];
        let mut cur = ArmCursor::new(&bytes, CpuState::Arm);

        assert!(cur.has_next());
        let inst = cur.decode();
        assert_eq!(inst.length, 4);
        cur.next();
        assert_eq!(cur.pc(), 4);
        assert!(!cur.has_next());
    }
}
