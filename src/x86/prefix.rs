//! Legacy prefix and REX decoder (component C3).

use crate::cursor::Cursor;
use numeric_enum_macro::numeric_enum;

numeric_enum! {
    #[repr(u8)]
    /// A recognized legacy prefix byte, tagged by its semantic group.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LegacyPrefix {
        Lock   = 0xF0,
        RepNz  = 0xF2,
        RepZ   = 0xF3,
        SegCs  = 0x2E,
        SegSs  = 0x36,
        SegDs  = 0x3E,
        SegEs  = 0x26,
        SegFs  = 0x64,
        SegGs  = 0x65,
        P66    = 0x66,
        P67    = 0x67,
    }
}

/// REX prefix bits (x64 only).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rex {
    pub w: bool,
    pub r: bool,
    pub x: bool,
    pub b: bool,
}

impl Rex {
    fn from_byte(byte: u8) -> Self {
        Self {
            w: byte & 0x08 != 0,
            r: byte & 0x04 != 0,
            x: byte & 0x02 != 0,
            b: byte & 0x01 != 0,
        }
    }
}

/// Outcome of walking the legacy-prefix / REX region of an instruction.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixState {
    /// Slot 0: LOCK/REPNZ/REPZ. Slot 1: segment override. Slot 2: 0x66. Slot 3: 0x67.
    pub slots: [Option<LegacyPrefix>; 4],
    pub rex: Option<Rex>,
}

impl PrefixState {
    pub fn has_prefix(&self) -> bool {
        self.slots.iter().any(|s| s.is_some())
    }

    pub fn has_prefix_byte(&self, p: LegacyPrefix) -> bool {
        self.slots.iter().any(|s| *s == Some(p))
    }

    fn slot_for(byte: u8) -> Option<(usize, LegacyPrefix)> {
        match byte {
            0xF0 => Some((0, LegacyPrefix::Lock)),
            0xF2 => Some((0, LegacyPrefix::RepNz)),
            0xF3 => Some((0, LegacyPrefix::RepZ)),
            0x2E => Some((1, LegacyPrefix::SegCs)),
            0x36 => Some((1, LegacyPrefix::SegSs)),
            0x3E => Some((1, LegacyPrefix::SegDs)),
            0x26 => Some((1, LegacyPrefix::SegEs)),
            0x64 => Some((1, LegacyPrefix::SegFs)),
            0x65 => Some((1, LegacyPrefix::SegGs)),
            0x66 => Some((2, LegacyPrefix::P66)),
            0x67 => Some((3, LegacyPrefix::P67)),
            _ => None,
        }
    }
}

/// Walks up to 15 leading bytes classifying legacy prefixes and REX.
///
/// Stops at the first byte that is neither a recognized legacy prefix nor a
/// REX byte immediately preceding it; that byte is the first opcode byte
/// (or VEX/EVEX escape) and is left unconsumed.
pub fn decode(cur: &mut Cursor) -> PrefixState {
    let mut state = PrefixState::default();

    for _ in 0..15 {
        let byte = cur.peek(0);

        if let Some((slot, prefix)) = PrefixState::slot_for(byte) {
            if state.slots[slot].is_none() {
                state.slots[slot] = Some(prefix);
            }
            // Any legacy prefix nullifies a REX seen before it: only a REX
            // immediately preceding the opcode bytes counts.
            state.rex = None;
            cur.get();
        } else if byte & 0xF0 == 0x40 {
            // Last-REX-wins: a later REX overwrites an earlier one.
            state.rex = Some(Rex::from_byte(byte));
            cur.get();
        } else {
            break;
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(bytes: &[u8]) -> (PrefixState, usize) {
        let mut cur = Cursor::new(bytes, 0);
        let state = decode(&mut cur);
        (state, cur.consumed())
    }

    #[test]
    fn no_prefixes() {
        let (state, len) = decode_bytes(&[0x90]);
        assert!(!state.has_prefix());
        assert_eq!(state.rex, None);
        assert_eq!(len, 0);
    }

    #[test]
    fn lock_rep_combo_fills_slot0_once() {
        let (state, len) = decode_bytes(&[0xF0, 0xF3, 0x89]);
        assert_eq!(state.slots[0], Some(LegacyPrefix::Lock));
        assert_eq!(len, 2);
    }

    #[test]
    fn rex_discarded_by_trailing_legacy_prefix() {
        // REX then 0x66: the 0x66 nullifies the REX since REX must
        // immediately precede the opcode.
        let (state, _) = decode_bytes(&[0x48, 0x66, 0x89]);
        assert_eq!(state.rex, None);
        assert_eq!(state.slots[2], Some(LegacyPrefix::P66));
    }

    #[test]
    fn last_rex_wins() {
        let (state, _) = decode_bytes(&[0x48, 0x41, 0x89]);
        let rex = state.rex.unwrap();
        assert!(!rex.w);
        assert!(rex.b);
    }
}
