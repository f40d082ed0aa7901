//! Decoded ARM instruction record (spec §3.2).

use crate::error::DecodeError;
use numeric_enum_macro::numeric_enum;

numeric_enum! {
    #[repr(u8)]
    /// Which ARM decode mode the processor is in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CpuState {
        Arm    = 0x00,
        Thumb  = 0x01,
        Thumb2 = 0x02,
    }
}

numeric_enum! {
    #[repr(u8)]
    /// ARM's 4-bit execution condition (bits 31..28 of an ARM word).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ExecCond {
        Eq = 0x0,
        Ne = 0x1,
        Hs = 0x2,
        Lo = 0x3,
        Mi = 0x4,
        Pl = 0x5,
        Vs = 0x6,
        Vc = 0x7,
        Hi = 0x8,
        Ls = 0x9,
        Ge = 0xA,
        Lt = 0xB,
        Gt = 0xC,
        Le = 0xD,
        Al = 0xE,
        Nv = 0xF,
    }
}

/// A single decoded ARM instruction.
#[derive(Debug, Clone, Copy)]
pub struct Inst {
    pub length: u8,
    pub state: CpuState,
    pub cond: ExecCond,

    pub is_branch: bool,
    pub has_link: bool,
    pub rel: i32,
    pub rel_abs: u32,

    pub is_swi: bool,
    pub swi_data: u32,

    pub error: DecodeError,
}

impl Inst {
    fn empty(state: CpuState) -> Self {
        Self {
            length: 0,
            state,
            cond: ExecCond::Al,
            is_branch: false,
            has_link: false,
            rel: 0,
            rel_abs: 0,
            is_swi: false,
            swi_data: 0,
            error: DecodeError::empty(),
        }
    }

    pub(crate) fn cpu_state_error(state: CpuState) -> Self {
        let mut inst = Self::empty(state);
        inst.error |= DecodeError::CPU_STATE;
        inst
    }
}
