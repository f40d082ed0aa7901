//! VEX/EVEX escape decoder (component C4).

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::x86::prefix::{LegacyPrefix, PrefixState, Rex};
use bit_field::BitField;

/// EVEX rounding-control mode, only meaningful when [`VexInfo::sae`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VexRoundTo {
    Near,
    Floor,
    Ceil,
    Trunc,
}

/// Decoded VEX (2/3-byte) or EVEX (4-byte) prefix fields (spec §3.1, §4.4).
#[derive(Debug, Clone, Copy)]
pub struct VexInfo {
    pub size: u8, // 2, 3, or 4
    pub l: bool,
    pub ll: bool,
    pub rr: bool,
    /// Destination register specifier; 5 bits wide under EVEX (via `V'`).
    pub reg: u8,
    pub opmask: u8,
    pub zero: bool,
    pub sae: bool,
    pub round_to: Option<VexRoundTo>,
    pub vec_bits: u16, // 128, 256, or 512
}

/// First opcode map byte synthesized from VEX.mm / EVEX.mm, as if the
/// encoding had been legacy `0F` / `0F 38` / `0F 3A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticOpcode {
    Map0F,
    Map0F38,
    Map0F3A,
}

pub struct VexDecode {
    pub info: VexInfo,
    pub map: SyntheticOpcode,
    pub error: DecodeError,
}

/// Decodes a VEX/EVEX escape. `first_byte` is 0xC4, 0xC5, or 0x62 and has
/// already been peeked but not consumed. `prefixes` is mutated in place:
/// the SIMD `pp` field is synthesized into prefix slots 0/2 so that the
/// `mp` mandatory-prefix check works uniformly for VEX and legacy opcodes.
pub fn decode(cur: &mut Cursor, prefixes: &mut PrefixState, first_byte: u8) -> VexDecode {
    let mut error = DecodeError::empty();

    if prefixes.has_prefix() {
        error |= DecodeError::OPCODE;
    }
    if prefixes.rex.is_some() {
        error |= DecodeError::REX;
    }

    cur.get(); // consume the escape byte itself

    let (info, map, err2) = match first_byte {
        0xC5 => decode_2byte(cur, prefixes),
        0xC4 => decode_3byte(cur, prefixes),
        0x62 => decode_4byte(cur, prefixes),
        _ => unreachable!("caller guarantees a VEX/EVEX escape byte"),
    };

    VexDecode {
        info,
        map,
        error: error | err2,
    }
}

fn decode_pp(pp: u8, prefixes: &mut PrefixState) {
    match pp {
        0x01 => prefixes.slots[2] = Some(LegacyPrefix::P66),
        0x02 => prefixes.slots[0] = Some(LegacyPrefix::RepZ),
        0x03 => prefixes.slots[0] = Some(LegacyPrefix::RepNz),
        _ => {}
    }
}

fn decode_mm(mm: u8) -> (SyntheticOpcode, DecodeError) {
    match mm {
        0x01 => (SyntheticOpcode::Map0F, DecodeError::empty()),
        0x02 => (SyntheticOpcode::Map0F38, DecodeError::empty()),
        0x03 => (SyntheticOpcode::Map0F3A, DecodeError::empty()),
        _ => (SyntheticOpcode::Map0F, DecodeError::OPCODE),
    }
}

fn decode_2byte(cur: &mut Cursor, prefixes: &mut PrefixState) -> (VexInfo, SyntheticOpcode, DecodeError) {
    let b1 = cur.get();

    prefixes.rex = Some(Rex {
        w: false,
        r: !b1.get_bit(7),
        x: false,
        b: false,
    });
    let l = b1.get_bit(2);
    let reg = (!b1).get_bits(3..7);

    decode_pp(b1.get_bits(0..2), prefixes);

    let info = VexInfo {
        size: 2,
        l,
        ll: false,
        rr: false,
        reg,
        opmask: 0,
        zero: false,
        sae: false,
        round_to: None,
        vec_bits: if l { 256 } else { 128 },
    };
    (info, SyntheticOpcode::Map0F, DecodeError::empty())
}

fn decode_3byte(cur: &mut Cursor, prefixes: &mut PrefixState) -> (VexInfo, SyntheticOpcode, DecodeError) {
    let b1 = cur.get();
    let b2 = cur.get();

    let (map, error) = decode_mm(b1.get_bits(0..5));

    prefixes.rex = Some(Rex {
        w: b2.get_bit(7),
        r: !b1.get_bit(7),
        x: !b1.get_bit(6),
        b: !b1.get_bit(5),
    });
    let l = b2.get_bit(2);
    let reg = (!b2).get_bits(3..7);

    decode_pp(b2.get_bits(0..2), prefixes);

    let info = VexInfo {
        size: 3,
        l,
        ll: false,
        rr: false,
        reg,
        opmask: 0,
        zero: false,
        sae: false,
        round_to: None,
        vec_bits: if l { 256 } else { 128 },
    };
    (info, map, error)
}

fn decode_4byte(cur: &mut Cursor, prefixes: &mut PrefixState) -> (VexInfo, SyntheticOpcode, DecodeError) {
    let b1 = cur.get();
    let b2 = cur.get();
    let b3 = cur.get();

    let (map, mut error) = decode_mm(b1.get_bits(0..2));

    prefixes.rex = Some(Rex {
        w: b2.get_bit(7),
        r: b1.get_bit(7),
        x: b1.get_bit(6),
        b: b1.get_bit(5),
    });
    let rr = b1.get_bit(4);

    decode_pp(b2.get_bits(0..2), prefixes);

    let reg = (!b2).get_bits(3..7) | if b3.get_bit(7) { 0x10 } else { 0 };
    let opmask = b3.get_bits(0..3);
    let zero = b3.get_bit(7);
    let sae = b3.get_bit(4);
    let ll_raw = b3.get_bits(5..7);

    let (round_to, ll, l, vec_bits) = if sae {
        let round_to = match ll_raw {
            0x00 => VexRoundTo::Near,
            0x01 => VexRoundTo::Floor,
            0x02 => VexRoundTo::Ceil,
            _ => VexRoundTo::Trunc,
        };
        (Some(round_to), true, false, 512)
    } else if ll_raw == 0x03 {
        error |= DecodeError::OPERAND;
        (None, ll_raw & 0x02 != 0, ll_raw & 0x01 != 0, 128u16 << ll_raw)
    } else {
        (None, ll_raw & 0x02 != 0, ll_raw & 0x01 != 0, 128u16 << ll_raw)
    };

    let info = VexInfo {
        size: 4,
        l,
        ll,
        rr,
        reg,
        opmask,
        zero,
        sae,
        round_to,
        vec_bits,
    };
    (info, map, error)
}
