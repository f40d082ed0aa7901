#![no_std]
#![doc = include_str!("../README.md")]

//! Streaming single-instruction length decoder for x86/x86-64 and ARM.
//!
//! This crate answers exactly one question per call: "how long is the
//! instruction starting here, and what are its structural fields?" It never
//! produces a mnemonic or an operand string, never allocates, and never
//! fails out of band — every decode call returns a record, with problems
//! reported through [`DecodeError`] flags on that record (see the
//! `error` module and each architecture's `Inst::error` field).

#[macro_use]
extern crate log;

mod cursor;
mod error;

cfg_if::cfg_if! {
    if #[cfg(feature = "x86")] {
        pub mod x86;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "arm")] {
        pub mod arm;
    }
}

mod iter;

pub use error::DecodeError;

#[cfg(feature = "x86")]
pub use iter::X86Cursor;

#[cfg(feature = "arm")]
pub use iter::ArmCursor;
