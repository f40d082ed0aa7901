//! ARM length decoder (component C9).
//!
//! This is a parity skeleton, not a full ARM decoder: it fetches the
//! instruction word, classifies a handful of shape masks, and extracts the
//! PC-relative target only for the unconditional-branch family (`B`/`BL`)
//! and the software-interrupt (`SWI`/`SVC`) family. Thumb and Thumb-2 are
//! unimplemented stubs that report [`crate::DecodeError::CPU_STATE`].

mod inst;

pub use inst::{CpuState, ExecCond, Inst};

use crate::cursor::Cursor;
use crate::error::DecodeError;

const BRANCH_MASK: u32 = 0x0E00_0000;
const BRANCH_VALUE: u32 = 0x0A00_0000;
const SWI_MASK: u32 = 0x0F00_0000;
const SWI_VALUE: u32 = 0x0F00_0000;

/// Decodes exactly one ARM instruction at `start` within `buf`, assuming
/// the processor is in `state`.
pub fn decode(buf: &[u8], start: usize, state: CpuState) -> Inst {
    match state {
        CpuState::Thumb | CpuState::Thumb2 => {
            trace!("ssde(arm): {:?} has no decode semantics yet", state);
            Inst::cpu_state_error(state)
        }
        CpuState::Arm => decode_arm(buf, start),
    }
}

fn decode_arm(buf: &[u8], start: usize) -> Inst {
    let mut cur = Cursor::new(buf, start);
    let word = cur.fetch_le(4);

    let mut inst = Inst {
        length: 4,
        state: CpuState::Arm,
        cond: ExecCond::try_from(((word >> 28) & 0x0F) as u8).expect("4-bit field always valid"),
        is_branch: false,
        has_link: false,
        rel: 0,
        rel_abs: 0,
        is_swi: false,
        swi_data: 0,
        error: DecodeError::empty(),
    };

    if start % 4 != 0 {
        inst.error |= DecodeError::ALIGNMENT;
    }
    if cur.eof() {
        inst.error |= DecodeError::EOF;
    }

    if word & BRANCH_MASK == BRANCH_VALUE {
        inst.is_branch = true;
        inst.has_link = word & (1 << 24) != 0;

        let mut rel = (word & 0x00FF_FFFF) << 2;
        if rel & (1 << 25) != 0 {
            rel |= 0xFC00_0000;
        }
        inst.rel = rel as i32;
        // ARM pipeline semantics: PC reads two instructions ahead of the
        // currently executing one, i.e. start_offset + 8, not + length.
        inst.rel_abs = (start as u32).wrapping_add(8).wrapping_add(inst.rel as u32);
    } else if word & SWI_MASK == SWI_VALUE {
        inst.is_swi = true;
        inst.swi_data = word & 0x00FF_FFFF;
    } else {
        inst.error |= DecodeError::OPCODE;
    }

    inst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s9_arm_branch_backwards() {
        let bytes = [0xFB, 0xFF, 0xFF, 0x1A];
        let inst = decode(&bytes, 0x14, CpuState::Arm);
        assert_eq!(inst.length, 4);
        assert_eq!(inst.cond, ExecCond::Ne);
        assert!(inst.is_branch);
        assert!(!inst.has_link);
        assert_eq!(inst.rel, -20);
        assert_eq!(inst.rel_abs, 0x08);
    }

    #[test]
    fn unaligned_pc_is_advisory_only() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x00, 0xFB, 0xFF, 0xFF, 0x1A];
        let inst = decode(&bytes, 5, CpuState::Arm);
        assert!(inst.error.contains(DecodeError::ALIGNMENT));
        assert!(!inst.error.contains(DecodeError::EOF));
        assert!(inst.is_branch);
    }

    #[test]
    fn swi_extracts_24_bit_payload() {
        // EF 12 34 56 -> SWI/SVC 0x563412, condition AL
        let bytes = [0x12, 0x34, 0x56, 0xEF];
        let inst = decode(&bytes, 0, CpuState::Arm);
        assert!(inst.is_swi);
        assert_eq!(inst.swi_data, 0x563412);
        assert_eq!(inst.cond, ExecCond::Al);
    }

    #[test]
    fn unmatched_pattern_is_opcode_error() {
        // 0x00000000: cond=EQ, AND r0,r0,r0 - data processing, not modeled
        let bytes = [0x00, 0x00, 0x00, 0x00];
        let inst = decode(&bytes, 0, CpuState::Arm);
        assert!(inst.error.contains(DecodeError::OPCODE));
        assert!(!inst.is_branch);
        assert!(!inst.is_swi);
    }

    #[test]
    fn thumb_state_is_unimplemented() {
        let inst = decode(&[0x00, 0x00], 0, CpuState::Thumb);
        assert_eq!(inst.length, 0);
        assert!(inst.error.contains(DecodeError::CPU_STATE));
    }
}
