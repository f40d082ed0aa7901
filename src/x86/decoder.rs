//! Top-level x86/x86-64 decode entry point, tying together prefixes, the
//! opcode dispatcher, ModR/M+SIB, displacement, and immediates (spec §4,
//! components C3-C8).

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::x86::inst::Inst;
use crate::x86::modrm;
use crate::x86::opcode;
use crate::x86::prefix::{self, LegacyPrefix};
use crate::x86::tables::OpFlags;
use crate::x86::vex;

const MAX_LENGTH: u8 = 15;

/// Decodes exactly one x86/x86-64 instruction at `start` within `buf`.
///
/// Always returns a record (spec §5/§7): malformed or truncated input is
/// reported through [`Inst::error`], never by failing to produce a value.
pub fn decode(buf: &[u8], start: usize) -> Inst {
    let mut cur = Cursor::new(buf, start);
    let mut inst = Inst::default();

    let prefixes = prefix::decode(&mut cur);
    inst.prefixes = prefixes.slots;
    inst.rex = prefixes.rex;

    let mut prefixes = prefixes;

    let first = cur.peek(0);
    let vex_map = if matches!(first, 0xC4 | 0xC5 | 0x62) {
        let out = vex::decode(&mut cur, &mut prefixes, first);
        inst.vex = Some(out.info);
        inst.rex = prefixes.rex;
        inst.error |= out.error;
        Some(out.map)
    } else {
        None
    };
    inst.prefixes = prefixes.slots;

    let op = opcode::decode(&mut cur, &prefixes, vex_map);
    inst.opcode = op.opcode;
    inst.opcode_length = op.opcode_length;
    inst.error |= op.error;

    let Some(flags) = op.flags else {
        trace!("ssde(x86): no opcode-table entry, resynchronizing");
        inst.length = 1;
        inst.error |= DecodeError::OPCODE;
        return inst;
    };

    if flags.contains(OpFlags::RM) {
        let mr = modrm::decode(&mut cur, &prefixes, flags, inst.rex);
        inst.modrm = mr.modrm;
        inst.sib = mr.sib;
        inst.error |= mr.error;

        if let Some(size) = mr.disp_size {
            inst.disp_size = size;
            inst.disp = read_disp(&mut cur, size);
        }
    } else if prefixes.slots[0] == Some(LegacyPrefix::Lock) {
        inst.error |= DecodeError::LOCK;
    }

    read_imm(&mut cur, &mut inst, flags, &prefixes, start as u32);

    if cur.eof() {
        inst.error |= DecodeError::EOF;
    }

    inst.length = cur.consumed() as u8;
    if cur.consumed() > MAX_LENGTH as usize {
        debug!("ssde(x86): length {} exceeds architectural max, clamping", cur.consumed());
        inst.length = MAX_LENGTH;
        inst.error |= DecodeError::LENGTH;
    }

    inst
}

fn read_disp(cur: &mut Cursor, size: u8) -> i32 {
    let mut disp: u32 = 0;
    for i in 0..size {
        disp |= (cur.get() as u32) << (i * 8);
    }
    sign_extend(disp, size) as i32
}

/// Sign-extends an 8- or 16-bit field held in the low bits of `value` up to
/// 32 bits; 32-bit fields are returned unchanged.
fn sign_extend(value: u32, size: u8) -> u32 {
    match size {
        1 if value & 0x80 != 0 => value | 0xFFFF_FF00,
        2 if value & 0x8000 != 0 => value | 0xFFFF_0000,
        _ => value,
    }
}

fn read_imm(
    cur: &mut Cursor,
    inst: &mut Inst,
    flags: OpFlags,
    prefixes: &prefix::PrefixState,
    start_offset: u32,
) {
    if flags.contains(OpFlags::AM) {
        inst.has_imm = true;
        inst.imm_size = if prefixes.slots[3] == Some(LegacyPrefix::P67) { 4 } else { 8 };
    } else {
        if flags.contains(OpFlags::I32) {
            inst.has_imm = true;
            inst.imm_size = if inst.rex.is_some_and(|r| r.w) && flags.contains(OpFlags::RW) {
                8
            } else if prefixes.slots[2] == Some(LegacyPrefix::P66) {
                2
            } else {
                4
            };
        }

        if flags.contains(OpFlags::I16) {
            if inst.has_imm {
                inst.has_imm2 = true;
                inst.imm2_size = 2;
            } else {
                inst.has_imm = true;
                inst.imm_size = 2;
            }
        }

        if flags.contains(OpFlags::I8) {
            if inst.has_imm {
                inst.has_imm2 = true;
                inst.imm2_size = 1;
            } else {
                inst.has_imm = true;
                inst.imm_size = 1;
            }
        }
    }

    if inst.has_imm {
        inst.imm = read_le(cur, inst.imm_size);
        if inst.has_imm2 {
            inst.imm2 = read_le(cur, inst.imm2_size);
        }
    }

    if flags.contains(OpFlags::REL) {
        inst.has_imm = false;
        inst.rel_size = inst.imm_size;
        inst.rel = sign_extend(inst.imm as u32, inst.rel_size) as i32;
        inst.has_rel = true;
        trace!(
            "ssde(x86): rel={:#x} rel_abs={:#x}",
            inst.rel,
            inst.rel_abs(start_offset)
        );
    }
}

fn read_le(cur: &mut Cursor, size: u8) -> u64 {
    let mut value: u64 = 0;
    for i in 0..size {
        value |= (cur.get() as u64) << (i * 8);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn s1_single_byte_no_operand() {
        let inst = decode(&[0x90], 0);
        assert_eq!(inst.length, 1);
        assert!(!inst.has_prefix());
        assert_eq!(inst.opcode[0], 0x90);
        assert!(!inst.has_modrm());
        assert!(!inst.has_imm);
        assert!(inst.error.is_clean());
    }

    #[test]
    fn s2_rel8_jump_backwards() {
        let inst = decode(&[0x75, 0xF1], 0x10);
        assert_eq!(inst.length, 2);
        assert!(inst.has_rel);
        assert_eq!(inst.rel_size, 1);
        assert_eq!(inst.rel, -15);
        assert_eq!(inst.rel_abs(0x10), 0x03);
    }

    #[test]
    fn s3_modrm_disp8() {
        let inst = decode(&[0x8B, 0x45, 0x08], 0);
        assert_eq!(inst.length, 3);
        assert_eq!(inst.opcode, [0x8B, 0, 0]);
        let modrm = inst.modrm.unwrap();
        assert_eq!(modrm.reg, 0);
        assert_eq!(modrm.rm, 5);
        assert_eq!(inst.disp_size, 1);
        assert_eq!(inst.disp, 8);
        assert!(!inst.has_imm);
    }

    #[test]
    fn s4_modrm_sib_no_disp() {
        let inst = decode(&[0x0F, 0xB6, 0x0C, 0x16], 0);
        assert_eq!(inst.length, 4);
        assert_eq!(inst.opcode, [0x0F, 0xB6, 0]);
        assert!(inst.has_modrm());
        let sib = inst.sib.unwrap();
        assert_eq!(sib.scale, 1);
        assert_eq!(sib.index, 2);
        assert_eq!(sib.base, 6);
        assert!(!inst.has_disp());
        assert!(!inst.has_imm);
    }

    #[test]
    fn s5_rel32_call() {
        let inst = decode(&[0xE8, 0x00, 0x01, 0x00, 0x00], 0);
        assert_eq!(inst.length, 5);
        assert!(inst.has_rel);
        assert_eq!(inst.rel_size, 4);
        assert_eq!(inst.rel, 0x100);
        assert_eq!(inst.rel_abs(0), 0x105);
    }

    #[test]
    fn s6_lock_with_mod_reg() {
        let inst = decode(&[0xF0, 0x01, 0xC0], 0);
        assert_eq!(inst.length, 3);
        assert_eq!(inst.prefixes[0], Some(LegacyPrefix::Lock));
        let modrm = inst.modrm.unwrap();
        assert_eq!(modrm.mode, crate::x86::modrm::RmMode::Reg);
        assert!(inst.error.contains(DecodeError::LOCK));
    }

    #[test]
    fn s7_operand_size_override() {
        let inst = decode(&[0x66, 0xB8, 0x34, 0x12], 0);
        assert_eq!(inst.length, 4);
        assert_eq!(inst.prefixes[2], Some(LegacyPrefix::P66));
        assert_eq!(inst.opcode[0], 0xB8);
        assert!(inst.has_imm);
        assert_eq!(inst.imm_size, 2);
        assert_eq!(inst.imm, 0x1234);
    }

    #[test]
    fn s8_length_overflow_clamped() {
        let mut bytes = vec![0x67; 16];
        bytes.push(0x90);
        let inst = decode(&bytes, 0);
        assert_eq!(inst.length, 15);
        assert!(inst.error.contains(DecodeError::LENGTH));
    }

    #[test]
    fn s10_enter_i16_then_i8() {
        let inst = decode(&[0xC8, 0x10, 0x00, 0x00], 0);
        assert_eq!(inst.length, 4);
        assert!(inst.has_imm);
        assert_eq!(inst.imm_size, 2);
        assert_eq!(inst.imm, 0x0010);
        assert!(inst.has_imm2);
        assert_eq!(inst.imm2_size, 1);
        assert_eq!(inst.imm2, 0);
    }

    #[test]
    fn rex_w_promotes_mov_imm_to_64_bit() {
        let inst = decode(&[0x48, 0x89, 0xD8], 0);
        assert_eq!(inst.length, 3);
        assert!(inst.rex.unwrap().w);
    }

    #[test]
    fn vex_encoded_instruction_requiring_vex_has_no_error() {
        // VEX.128.0F.WIG 58 /r -> VADDPS xmm,xmm,xmm/m128 (vx-gated in table_0f? not actually;
        // use an explicit vx-only 0F38 opcode instead: VEX PSHUFB-like 0x00 is plain rm, so use 0x0C (vx|rm)).
        let inst = decode(&[0xC4, 0xE2, 0x79, 0x0C, 0xC1], 0);
        assert!(inst.has_vex());
        assert!(!inst.error.contains(DecodeError::NO_VEX));
    }

    #[test]
    fn same_opcode_without_vex_signals_no_vex() {
        let inst = decode(&[0x0F, 0x38, 0x0C, 0xC1], 0);
        assert!(inst.error.contains(DecodeError::NO_VEX));
    }
}
