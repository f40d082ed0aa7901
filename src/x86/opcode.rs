//! Opcode dispatcher (component C5).

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::x86::prefix::{LegacyPrefix, PrefixState};
use crate::x86::tables::{self, OpFlags, OpMap};
use crate::x86::vex::SyntheticOpcode;
use bit_field::BitField;

#[derive(Debug, Clone, Copy)]
pub struct OpcodeResult {
    pub opcode: [u8; 3],
    pub opcode_length: u8,
    /// `None` means the table entry was `error` (no legal instruction).
    pub flags: Option<OpFlags>,
    pub error: DecodeError,
}

/// Reads 1-3 opcode bytes (or deduces them from a VEX/EVEX map), selects
/// the table entry, and fixes up the two irregular opcode-extension
/// opcodes 0xF6/0xF7.
pub fn decode(cur: &mut Cursor, prefixes: &PrefixState, vex_map: Option<SyntheticOpcode>) -> OpcodeResult {
    let mut opcode = [0u8; 3];

    let (opcode_length, flags) = if let Some(map) = vex_map {
        opcode[0] = 0x0F;
        match map {
            SyntheticOpcode::Map0F => {
                opcode[1] = cur.get();
                (2, tables::lookup(OpMap::Map0F, opcode[1]))
            }
            SyntheticOpcode::Map0F38 => {
                opcode[1] = 0x38;
                opcode[2] = cur.get();
                (3, tables::lookup(OpMap::Map0F38, opcode[2]))
            }
            SyntheticOpcode::Map0F3A => {
                opcode[1] = 0x3A;
                opcode[2] = cur.get();
                (3, tables::lookup(OpMap::Map0F3A, opcode[2]))
            }
        }
    } else {
        opcode[0] = cur.get();
        if opcode[0] != 0x0F {
            (1, tables::lookup(OpMap::Primary, opcode[0]))
        } else {
            opcode[1] = cur.get();
            match opcode[1] {
                0x38 => {
                    opcode[2] = cur.get();
                    (3, tables::lookup(OpMap::Map0F38, opcode[2]))
                }
                0x3A => {
                    opcode[2] = cur.get();
                    (3, tables::lookup(OpMap::Map0F3A, opcode[2]))
                }
                _ => (2, tables::lookup(OpMap::Map0F, opcode[1])),
            }
        }
    };

    let mut flags = flags;

    // Two exceptional opcode-extension opcodes whose immediate size
    // depends on ModR/M.reg; peek (not consume) the upcoming ModR/M byte.
    if vex_map.is_none() && opcode_length == 1 && (opcode[0] == 0xF6 || opcode[0] == 0xF7) {
        let modrm_byte = cur.peek(0);
        let reg = modrm_byte.get_bits(3..6);
        flags = Some(if reg == 0 || reg == 1 {
            if opcode[0] == 0xF6 {
                OpFlags::RM | OpFlags::I8
            } else {
                OpFlags::RM | OpFlags::RW | OpFlags::I32
            }
        } else {
            OpFlags::RM
        });
    }

    let mut error = DecodeError::empty();

    if let Some(flags) = flags {
        if flags.contains(OpFlags::VX) && vex_map.is_none() {
            error |= DecodeError::NO_VEX;
        }
        if flags.contains(OpFlags::MP) && prefixes.slots[2] != Some(LegacyPrefix::P66) {
            error |= DecodeError::OPCODE;
        }
    }

    OpcodeResult {
        opcode,
        opcode_length,
        flags,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_nop() {
        let bytes = [0x90];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, None);
        assert_eq!(r.opcode_length, 1);
        assert_eq!(r.opcode[0], 0x90);
        assert_eq!(r.flags, Some(OpFlags::empty()));
    }

    #[test]
    fn two_byte_escape() {
        let bytes = [0x0F, 0xB6, 0x0C];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, None);
        assert_eq!(r.opcode_length, 2);
        assert_eq!(r.opcode, [0x0F, 0xB6, 0x00]);
        assert!(r.flags.unwrap().contains(OpFlags::RM));
    }

    #[test]
    fn f7_fixup_selects_test_form() {
        // reg field = 0 -> TEST form: rm|rw|i32
        let bytes = [0xF7, 0x00];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, None);
        let flags = r.flags.unwrap();
        assert!(flags.contains(OpFlags::I32));
        assert!(flags.contains(OpFlags::RW));
    }

    #[test]
    fn f6_fixup_selects_plain_rm_for_other_subop() {
        // reg field = 2 (NOT) -> plain rm, no immediate
        let bytes = [0xF6, 0x10];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, None);
        assert_eq!(r.flags, Some(OpFlags::RM));
    }

    #[test]
    fn mandatory_prefix_missing_is_opcode_error() {
        let bytes = [0x0F, 0x38, 0x10, 0x00];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, None);
        assert!(r.error.contains(DecodeError::OPCODE));
    }
}
