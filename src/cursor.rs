//! Bounded cursor over an opaque instruction buffer (component C1).
//!
//! The cursor never panics and never indexes out of bounds: reads past the
//! end of the buffer are reported through [`Cursor::eof`] rather than by
//! throwing, matching spec.md's "Exceptions for out-of-range reads" design
//! note — this replaces the original C++ implementation's exception-backed
//! indexed access with explicit bounds checks.

pub struct Cursor<'a> {
    buf: &'a [u8],
    start: usize,
    pos: usize,
    eof: bool,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor starting at `start` within `buf`. `start` may be
    /// past the end of `buf`; every read then reports EOF immediately.
    pub fn new(buf: &'a [u8], start: usize) -> Self {
        Self {
            buf,
            start,
            pos: start,
            eof: false,
        }
    }

    /// Bytes consumed since the cursor was created.
    pub fn consumed(&self) -> usize {
        self.pos - self.start
    }

    /// True once a read has gone past the end of the buffer.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Reads the next byte and advances the cursor. Returns 0 and sets
    /// [`Cursor::eof`] once the buffer is exhausted.
    pub fn get(&mut self) -> u8 {
        match self.buf.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b
            }
            None => {
                self.eof = true;
                0
            }
        }
    }

    /// Peeks `offset` bytes ahead of the current position without
    /// advancing. Returns 0 past the end of the buffer.
    pub fn peek(&self, offset: usize) -> u8 {
        self.buf.get(self.pos + offset).copied().unwrap_or(0)
    }

    /// Reads `n` little-endian bytes (ARM word/halfword fetch) without
    /// advancing past what was actually available; sets EOF if the buffer
    /// ran out partway through.
    pub fn fetch_le(&mut self, n: usize) -> u32 {
        let mut result: u32 = 0;
        for i in 0..n {
            result |= (self.get() as u32) << (i * 8);
        }
        result
    }
}
