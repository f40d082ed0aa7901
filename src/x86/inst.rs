//! Decoded x86/x86-64 instruction record (spec §3.1).

use crate::error::DecodeError;
use crate::x86::modrm::{ModRm, Sib};
use crate::x86::prefix::{LegacyPrefix, Rex};
use crate::x86::vex::VexInfo;

/// A single decoded x86/x86-64 instruction.
///
/// Produced by [`crate::x86::decode`]. A value of this type is always
/// returned, even on error — errors are reported through [`Inst::error`]
/// rather than by failing to produce a record.
#[derive(Debug, Clone, Copy)]
pub struct Inst {
    pub length: u8,

    /// Slot 0: LOCK/REPNZ/REPZ. Slot 1: segment override. Slot 2: 0x66. Slot 3: 0x67.
    pub prefixes: [Option<LegacyPrefix>; 4],

    pub rex: Option<Rex>,

    pub vex: Option<VexInfo>,

    pub opcode_length: u8,
    pub opcode: [u8; 3],

    pub modrm: Option<ModRm>,
    pub sib: Option<Sib>,

    pub disp_size: u8,
    pub disp: i32,

    pub has_imm: bool,
    pub has_imm2: bool,
    pub imm_size: u8,
    pub imm2_size: u8,
    pub imm: u64,
    pub imm2: u64,

    pub has_rel: bool,
    pub rel_size: u8,
    pub rel: i32,

    pub error: DecodeError,
}

impl Default for Inst {
    fn default() -> Self {
        Self {
            length: 0,
            prefixes: [None; 4],
            rex: None,
            vex: None,
            opcode_length: 0,
            opcode: [0; 3],
            modrm: None,
            sib: None,
            disp_size: 0,
            disp: 0,
            has_imm: false,
            has_imm2: false,
            imm_size: 0,
            imm2_size: 0,
            imm: 0,
            imm2: 0,
            has_rel: false,
            rel_size: 0,
            rel: 0,
            error: DecodeError::empty(),
        }
    }
}

impl Inst {
    pub fn has_modrm(&self) -> bool {
        self.modrm.is_some()
    }

    pub fn has_sib(&self) -> bool {
        self.sib.is_some()
    }

    pub fn has_disp(&self) -> bool {
        self.disp_size != 0
    }

    pub fn has_vex(&self) -> bool {
        self.vex.is_some()
    }

    pub fn has_rex(&self) -> bool {
        self.rex.is_some()
    }

    /// True if any of the four prefix slots is filled.
    pub fn has_prefix(&self) -> bool {
        self.prefixes.iter().any(|p| p.is_some())
    }

    /// True if `prefix` occupies any of the four prefix slots.
    pub fn has_prefix_byte(&self, prefix: LegacyPrefix) -> bool {
        self.prefixes.iter().any(|p| *p == Some(prefix))
    }

    /// Absolute branch/call target for a PC-relative instruction, computed
    /// as `start_offset + length + rel` with wrapping (32-bit) arithmetic.
    /// Only meaningful when [`Inst::has_rel`] is set.
    pub fn rel_abs(&self, start_offset: u32) -> u32 {
        start_offset
            .wrapping_add(self.length as u32)
            .wrapping_add(self.rel as u32)
    }
}
