//! ModR/M and SIB decoder (component C6).

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::x86::prefix::{LegacyPrefix, PrefixState, Rex};
use crate::x86::tables::OpFlags;
use bit_field::BitField;
use numeric_enum_macro::numeric_enum;

numeric_enum! {
    #[repr(u8)]
    /// ModR/M addressing mode (spec §3.1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RmMode {
        Mem       = 0x00, // [r]
        MemDisp8  = 0x01, // [r]+disp8
        MemDisp32 = 0x02, // [r]+disp32
        Reg       = 0x03, // r
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModRm {
    pub mode: RmMode,
    pub reg: u8,
    pub rm: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Sib {
    pub scale: u8,
    pub index: u8,
    pub base: u8,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ModRmResult {
    pub modrm: Option<ModRm>,
    pub sib: Option<Sib>,
    pub disp_size: Option<u8>,
    pub error: DecodeError,
}

/// Decodes ModR/M (and SIB, if selected), applying REX register-field
/// extension per the rules in spec §4.6. `flags` carries the opcode-table
/// entry so the `ox` bit can steer which REX bit extends `modrm_reg`.
pub fn decode(
    cur: &mut Cursor,
    prefixes: &PrefixState,
    flags: OpFlags,
    rex: Option<Rex>,
) -> ModRmResult {
    let byte = cur.get();
    let mode = RmMode::try_from(byte.get_bits(6..8)).expect("2-bit field always valid");
    let mut reg = byte.get_bits(3..6);
    let mut rm = byte.get_bits(0..3);

    let addr16 = prefixes.slots[3] == Some(LegacyPrefix::P67);
    let mut error = DecodeError::empty();
    let mut sib = None;
    let mut disp_size = None;

    match mode {
        RmMode::Mem => {
            if addr16 {
                if rm == 0x06 {
                    disp_size = Some(2);
                }
            } else {
                if rm == 0x04 {
                    sib = Some(decode_sib(cur));
                }
                if rm == 0x05 {
                    disp_size = Some(4);
                }
            }
        }
        RmMode::MemDisp8 => {
            if !addr16 && rm == 0x04 {
                sib = Some(decode_sib(cur));
            }
            disp_size = Some(1);
        }
        RmMode::MemDisp32 => {
            if !addr16 && rm == 0x04 {
                sib = Some(decode_sib(cur));
            }
            disp_size = Some(if addr16 { 2 } else { 4 });
        }
        RmMode::Reg => {
            if prefixes.slots[0] == Some(LegacyPrefix::Lock) {
                error |= DecodeError::LOCK;
            }
        }
    }

    if let Some(rex) = rex {
        if let Some(sib) = &mut sib {
            reg |= if rex.r { 0x08 } else { 0 };
            sib.index |= if rex.x { 0x08 } else { 0 };
            sib.base |= if rex.b { 0x08 } else { 0 };
        } else if flags.contains(OpFlags::OX) {
            reg |= if rex.b { 0x08 } else { 0 };
        } else {
            reg |= if rex.r { 0x08 } else { 0 };
            rm |= if rex.b { 0x08 } else { 0 };
        }
    }

    ModRmResult {
        modrm: Some(ModRm { mode, reg, rm }),
        sib,
        disp_size,
        error,
    }
}

fn decode_sib(cur: &mut Cursor) -> Sib {
    let byte = cur.get();
    Sib {
        scale: 1 << byte.get_bits(6..8),
        index: byte.get_bits(3..6),
        base: byte.get_bits(0..3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_disp8_ebp_plus_8() {
        // 0x45 = mod=01 reg=000 rm=101 (ebp), followed by disp8 0x08
        let bytes = [0x45, 0x08];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, OpFlags::RM, None);
        let modrm = r.modrm.unwrap();
        assert_eq!(modrm.mode, RmMode::MemDisp8);
        assert_eq!(modrm.reg, 0);
        assert_eq!(modrm.rm, 5);
        assert_eq!(r.disp_size, Some(1));
        assert!(r.sib.is_none());
    }

    #[test]
    fn sib_selected_for_rm4_mem() {
        // 0x0C = mod=00 reg=001 rm=100 -> SIB follows
        let bytes = [0x0C, 0x16];
        let mut cur = Cursor::new(&bytes, 0);
        let prefixes = PrefixState::default();
        let r = decode(&mut cur, &prefixes, OpFlags::RM, None);
        let sib = r.sib.unwrap();
        assert_eq!(sib.scale, 1);
        assert_eq!(sib.index, 2);
        assert_eq!(sib.base, 6);
        assert!(r.disp_size.is_none());
    }

    #[test]
    fn lock_with_reg_mode_is_error() {
        let bytes = [0xC0]; // mod=11 (reg)
        let mut cur = Cursor::new(&bytes, 0);
        let mut prefixes = PrefixState::default();
        prefixes.slots[0] = Some(LegacyPrefix::Lock);
        let r = decode(&mut cur, &prefixes, OpFlags::RM, None);
        assert!(r.error.contains(DecodeError::LOCK));
    }
}
