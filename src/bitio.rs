//! Fixed-capacity bit buffer and streamed flush/refill bit I/O, MSB-first.
//!
//! Bit ordering is fixed regardless of host endianness: bit 0 of byte 0 is
//! the high bit. This deliberately ignores the host-endian branch the
//! original implementation carried (it conditioned packing on
//! `std::endian::native`); the wire format here is always MSB-first.

use crate::error::{OwlVisionError, Result};
use std::io::{Read, Write};

/// A fixed-capacity buffer of `capacity_bits()` bits, addressable by bit index.
pub struct BitBuffer {
  buf: Vec<u8>,
  pos: usize,
  capacity_bytes: usize,
}

impl BitBuffer {
  pub fn new(capacity_bits: usize) -> Self {
    let capacity_bytes = capacity_bits >> 3;
    BitBuffer { buf: vec![0u8; capacity_bytes], pos: 0, capacity_bytes }
  }

  pub fn capacity_bits(&self) -> usize {
    self.capacity_bytes << 3
  }

  pub fn pos(&self) -> usize {
    self.pos
  }

  pub fn put_bit(&mut self, pos: usize, v: u8) {
    let byte_pos = pos >> 3;
    let bit_pos = 0x07 - (pos & 0x07);
    self.buf[byte_pos] |= (v & 1) << bit_pos;
  }

  pub fn get_bit(&self, pos: usize) -> u8 {
    let byte_pos = pos >> 3;
    let bit_pos = 0x07 - (pos & 0x07);
    (self.buf[byte_pos] >> bit_pos) & 1
  }

  pub fn clear(&mut self) {
    self.pos = 0;
    self.buf.iter_mut().for_each(|b| *b = 0);
  }

  pub fn is_full(&self) -> bool {
    self.pos > self.capacity_bits() - 1
  }

  fn bytes_in_use(&self) -> usize {
    let whole = self.pos >> 3;
    let remain = (self.pos & 0x07 != 0) as usize;
    whole + remain
  }
}

/// Wraps a `BitBuffer` and a byte sink, flushing when the buffer fills.
pub struct OutputBitStream<W> {
  buf: BitBuffer,
  sink: W,
}

impl<W: Write> OutputBitStream<W> {
  pub fn new(capacity_bits: usize, sink: W) -> Self {
    OutputBitStream { buf: BitBuffer::new(capacity_bits), sink }
  }

  pub fn put(&mut self, v: u8) -> Result<()> {
    if self.buf.is_full() {
      self.flush()?;
      self.buf.clear();
    }
    let pos = self.buf.pos;
    self.buf.put_bit(pos, v);
    self.buf.pos += 1;
    Ok(())
  }

  /// Force a partial flush of the current buffer contents, without clearing.
  pub fn flush(&mut self) -> Result<()> {
    let n = self.buf.bytes_in_use();
    self.sink.write_all(&self.buf.buf[..n])?;
    Ok(())
  }

  /// Flush remaining bits and return the underlying sink.
  pub fn finish(mut self) -> Result<W> {
    self.flush()?;
    Ok(self.sink)
  }
}

/// Wraps a `BitBuffer` and a byte source, refilling when the buffer is exhausted.
pub struct InputBitStream<R> {
  buf: BitBuffer,
  source: R,
  filled: bool,
}

impl<R: Read> InputBitStream<R> {
  pub fn new(capacity_bits: usize, source: R) -> Self {
    InputBitStream { buf: BitBuffer::new(capacity_bits), source, filled: false }
  }

  fn fill(&mut self) -> Result<()> {
    self.buf.clear();
    let cap = self.buf.capacity_bytes;
    let mut read_total = 0;
    // Eager fill: read up to capacity, accepting short reads (remaining bytes).
    while read_total < cap {
      let n = self.source.read(&mut self.buf.buf[read_total..cap])?;
      if n == 0 {
        break;
      }
      read_total += n;
    }
    self.filled = true;
    Ok(())
  }

  pub fn get(&mut self) -> Result<u8> {
    if !self.filled || self.buf.is_full() {
      self.fill()?;
    }
    let pos = self.buf.pos;
    let v = self.buf.get_bit(pos);
    self.buf.pos += 1;
    Ok(v)
  }
}

/// Convenience check used by callers that need to report a malformed stream
/// as `CorruptPayload` rather than propagate a raw I/O error.
pub fn corrupt(msg: impl Into<String>) -> OwlVisionError {
  OwlVisionError::CorruptPayload(msg.into())
}
