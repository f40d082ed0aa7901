//! Decode error bitset shared by every architecture backend.
//!
//! Decoding never fails out of band: every call returns a record, possibly
//! carrying one or more of these flags. Multiple flags may be set at once
//! (e.g. `OPCODE | LENGTH`).

use bitflags::bitflags;

bitflags! {
    /// Non-fatal decode error flags (spec §3.3).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct DecodeError: u16 {
        /// Ran off the end of the buffer while decoding.
        const EOF       = 1 << 0;
        /// Encoding exceeded the architectural maximum length; length was clamped.
        const LENGTH    = 1 << 1;
        /// No valid opcode-table entry, or an entry that forbids the observed prefix state.
        const OPCODE    = 1 << 2;
        /// Operand shape is illegal (e.g. EVEX requesting a 1024-bit vector).
        const OPERAND   = 1 << 3;
        /// Opcode requires VEX/EVEX encoding but was reached without one.
        const NO_VEX    = 1 << 4;
        /// LOCK used with Mod=reg, or with an instruction that never accepts it.
        const LOCK      = 1 << 5;
        /// REX appears together with VEX/EVEX, which is forbidden.
        const REX       = 1 << 6;
        /// ARM: CPU state is unknown or unimplemented (Thumb/Thumb-2 stubs).
        const CPU_STATE = 1 << 7;
        /// ARM: program counter is not aligned to the architectural boundary.
        const ALIGNMENT = 1 << 8;
    }
}

impl DecodeError {
    /// True if no error flag is set.
    pub fn is_clean(self) -> bool {
        self.is_empty()
    }
}
