//! Opcode flag tables (component C2).
//!
//! Four immutable 256-entry tables map an opcode byte to a bitset of
//! structural hints (spec §3.4). The raw `u16` layout below is reproduced
//! byte-for-byte from the reference implementation; `0xFFFF` is the
//! reserved `error` sentinel (spec §6.3) and is translated to `None` by the
//! lookup functions rather than exposed as a forgeable [`OpFlags`] value.

use bitflags::bitflags;

bitflags! {
    /// Structural hint bits carried by an opcode-table entry (spec §3.4).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpFlags: u16 {
        /// A ModR/M byte follows the opcode.
        const RM  = 1 << 0;
        /// Opcode extended by ModR/M.reg; REX.B (not REX.R) extends modrm_reg.
        const OX  = 1 << 1;
        /// The primary immediate is a PC-relative offset, exposed as `rel`.
        const REL = 1 << 2;
        /// An 8-bit immediate follows.
        const I8  = 1 << 3;
        /// A 16-bit immediate follows.
        const I16 = 1 << 4;
        /// A 32-bit immediate follows (shrinks to 16 under 0x66, widens to 64 under REX.W+RW).
        const I32 = 1 << 5;
        /// REX.W may widen an `I32` immediate to 64 bits.
        const RW  = 1 << 6;
        /// Address-mode (moffs) immediate; width toggles with 0x67.
        const AM  = 1 << 7;
        /// Instruction must be VEX/EVEX-encoded.
        const VX  = 1 << 8;
        /// 0x66 is a mandatory part of the opcode identity, not an operand-size override.
        const MP  = 1 << 9;
    }
}

impl OpFlags {
    /// `rm | ox`: opcode-extension form with a ModR/M byte.
    pub const EX: Self = Self::RM.union(Self::OX);
    /// `i8 | rel`: short (8-bit) relative branch.
    pub const R8: Self = Self::I8.union(Self::REL);
    /// `i32 | rel`: near (32-bit) relative branch/call.
    pub const R32: Self = Self::I32.union(Self::REL);
}

const NONE: u16 = 0;
const RM: u16 = 1 << 0;
const OX: u16 = 1 << 1;
const REL: u16 = 1 << 2;
const I8: u16 = 1 << 3;
const I16: u16 = 1 << 4;
const I32: u16 = 1 << 5;
const RW: u16 = 1 << 6;
const AM: u16 = 1 << 7;
const VX: u16 = 1 << 8;
const MP: u16 = 1 << 9;
const EX: u16 = RM | OX;
const R8: u16 = I8 | REL;
const R32: u16 = I32 | REL;
const ERROR: u16 = 0xFFFF;

/// Primary (single-byte) opcode table.
#[rustfmt::skip]
static T_PRIMARY: [u16; 256] = [
    //x0   x1     x2     x3     x4     x5     x6     x7     x8     x9     xA     xB     xC     xD     xE     xF
      RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, // 0x
      RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, // 1x
      RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, // 2x
      RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, RM  , RM  , RM  , RM  , I8  , I32 , ERROR, ERROR, // 3x
      ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 4x
      NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , // 5x
      ERROR,ERROR,ERROR, RM  ,ERROR,ERROR,ERROR,ERROR, I32 ,RM|I32, I8  ,RM|I8, NONE , NONE , NONE , NONE , // 6x
      R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , R8  , // 7x
      EX|I8,EX|I32,ERROR,EX|I8, RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , EX  , // 8x
      NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE , NONE ,ERROR,ERROR, NONE , NONE , NONE , NONE , // 9x
      AM  , AM  , AM  , AM  , NONE , NONE , NONE , NONE , I8  , I32 , NONE , NONE , NONE , NONE , NONE , NONE , // Ax
      I8  , I8  , I8  , I8  , I8  , I8  , I8  , I8  ,RW|I32,RW|I32,RW|I32,RW|I32,RW|I32,RW|I32,RW|I32,RW|I32, // Bx
      EX|I8, EX|I8, I16 , NONE ,ERROR,ERROR, EX|I8,EX|I32,I16|I8, NONE , I16 , NONE , NONE , I8  , NONE , NONE , // Cx
      EX  , EX  , EX  , EX  ,ERROR,ERROR,ERROR, NONE , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , // Dx
      R8  , R8  , R8  , R8  , I8  , I8  , I8  , I8  , R32 , R32 ,ERROR, R8  , NONE , NONE , NONE , NONE , // Ex
      NONE , NONE ,ERROR,ERROR, NONE , NONE ,ERROR,ERROR, NONE , NONE , NONE , NONE , NONE , NONE , RM  , EX  , // Fx
];

/// Two-byte (`0F xx`) opcode table.
#[rustfmt::skip]
static T_0F: [u16; 256] = [
    //x0   x1     x2     x3     x4     x5     x6     x7     x8     x9     xA     xB     xC     xD     xE     xF
      EX  , EX  , RM  , RM  ,ERROR,ERROR, NONE ,ERROR, NONE , NONE ,ERROR, NONE ,ERROR, RM  , NONE ,ERROR, // 0x
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , EX  , RM  , RM  , RM  , RM  , RM  , RM  , EX  , // 1x
      RM  , RM  , RM  , RM  , RM  ,ERROR, RM  ,ERROR, RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // 2x
      NONE , NONE , NONE , NONE , NONE , NONE ,ERROR, NONE ,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 3x
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // 4x
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // 5x
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // 6x
      RM|I8, EX|I8, EX|I8, EX|I8, RM  , RM  , RM  , NONE , RM  , RM  ,ERROR,ERROR, RM  , RM  , RM  , RM  , // 7x
      R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , R32 , // 8x
      EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , EX  , // 9x
      NONE , NONE , NONE , RM  ,RM|I8, RM  ,ERROR,ERROR, NONE , NONE , NONE , RM  ,RM|I8, RM  , EX  , RM  , // Ax
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , NONE , EX|I8, RM  , RM  , RM  , RM  , RM  , // Bx
      RM  , RM  ,RM|I8, RM  ,RM|I8,RM|I8,RM|I8, EX  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // Cx
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // Dx
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // Ex
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , // Fx
];

/// Three-byte (`0F 38 xx`) opcode table.
#[rustfmt::skip]
static T_0F38: [u16; 256] = [
    //x0    x1     x2     x3     x4     x5     x6     x7     x8     x9     xA     xB     xC      xD      xE     xF
      RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , RM  , VX|RM, VX|RM,ERROR,ERROR, // 0x
      MP|RM,ERROR,ERROR,ERROR, MP|RM, MP|RM,ERROR, MP|RM, VX|RM,ERROR, VX|RM,ERROR, RM  , RM  , RM  ,ERROR, // 1x
      MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM,ERROR,ERROR, MP|RM, MP|RM, MP|RM, MP|RM, VX|RM, VX|RM,ERROR,ERROR, // 2x
      MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM,ERROR, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, MP|RM, // 3x
      MP|RM, MP|RM,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 4x
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, VX|RM, VX|RM,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 5x
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 6x
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, VX|RM, VX|RM,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 7x
      MP|RM, MP|RM,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // 8x
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, VX|RM, VX|RM, VX|RM,ERROR, VX|RM,ERROR, VX|RM,ERROR, VX|RM,ERROR, // 9x
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, VX|RM, VX|RM, VX|RM,ERROR, VX|RM,ERROR, VX|RM,ERROR, VX|RM,ERROR, // Ax
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, VX|RM, VX|RM, VX|RM,ERROR, VX|RM,ERROR, VX|RM,ERROR, VX|RM,ERROR, // Bx
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, RM  , RM  , RM  , RM  , RM  , RM  ,ERROR,ERROR, // Cx
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, RM  , RM  , RM  , RM  , RM  , // Dx
     ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // Ex
      RM  , RM  ,ERROR,ERROR,ERROR,ERROR, RM  ,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR,ERROR, // Fx
];

/// Three-byte (`0F 3A xx`) opcode table.
#[rustfmt::skip]
static T_0F3A: [u16; 256] = [
    //x0     x1      x2      x3      x4      x5      x6       x7      x8        x9        xA        xB        xC        xD        xE      xF
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,VX|RM|I8,ERROR ,MP|RM|I8,MP|RM|I8,MP|RM|I8,MP|RM|I8,MP|RM|I8,MP|RM|I8,MP|RM|I8, RM   , // 0x
     ERROR ,ERROR ,ERROR ,ERROR ,MP|RM|I8,MP|RM|I8,MP|RM|I8,MP|RM|I8,VX|RM|I8,VX|RM|I8,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 1x
    MP|RM|I8,MP|RM|I8,MP|RM|I8,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 2x
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 3x
      MP|RM , MP|RM ,MP|RM|I8,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,VX|RM|I8,VX|RM|I8,VX|RM|I8,ERROR ,ERROR ,ERROR , // 4x
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 5x
    MP|RM|I8,MP|RM|I8,MP|RM|I8,MP|RM|I8,ERROR ,ERROR ,ERROR ,ERROR ,VX|RM|I8,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 6x
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 7x
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 8x
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // 9x
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // Ax
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // Bx
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,MP|RM|I8,ERROR ,ERROR ,ERROR , // Cx
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // Dx
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // Ex
     ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR ,ERROR , // Fx
];

/// Which opcode map a (possibly VEX/EVEX-synthesized) opcode sequence selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMap {
    Primary,
    Map0F,
    Map0F38,
    Map0F3A,
}

fn decode_entry(raw: u16) -> Option<OpFlags> {
    if raw == ERROR {
        None
    } else {
        Some(OpFlags::from_bits_truncate(raw))
    }
}

/// Looks up the flag entry for `opcode[last_byte]` in the table selected by `map`.
pub fn lookup(map: OpMap, byte: u8) -> Option<OpFlags> {
    let raw = match map {
        OpMap::Primary => T_PRIMARY[byte as usize],
        OpMap::Map0F => T_0F[byte as usize],
        OpMap::Map0F38 => T_0F38[byte as usize],
        OpMap::Map0F3A => T_0F3A[byte as usize],
    };
    decode_entry(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_is_flagless() {
        assert_eq!(lookup(OpMap::Primary, 0x90), Some(OpFlags::empty()));
    }

    #[test]
    fn mov_eax_imm32_has_i32() {
        assert_eq!(lookup(OpMap::Primary, 0xB8), Some(OpFlags::RW | OpFlags::I32));
    }

    #[test]
    fn short_jump_is_rel8() {
        assert_eq!(lookup(OpMap::Primary, 0x75), Some(OpFlags::R8));
    }

    #[test]
    fn enter_is_i16_then_i8() {
        assert_eq!(lookup(OpMap::Primary, 0xC8), Some(OpFlags::I16 | OpFlags::I8));
    }

    #[test]
    fn push_es_is_invalid_in_64_bit_mode() {
        assert_eq!(lookup(OpMap::Primary, 0x06), None);
    }

    #[test]
    fn vex_only_0f38_entries_carry_vx() {
        let flags = lookup(OpMap::Map0F38, 0x0C).unwrap();
        assert!(flags.contains(OpFlags::VX));
        assert!(flags.contains(OpFlags::RM));
    }

    #[test]
    fn mandatory_prefix_0f3a_entries_carry_mp() {
        let flags = lookup(OpMap::Map0F3A, 0x08).unwrap();
        assert!(flags.contains(OpFlags::MP));
        assert!(flags.contains(OpFlags::RM));
        assert!(flags.contains(OpFlags::I8));
    }
}
