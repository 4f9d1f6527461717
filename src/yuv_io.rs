//! Raw YUV420p plane reader/writer, used by the demo CLI and by tests that
//! need file-backed frames instead of in-memory buffers.
//!
//! Grounded in the teacher's `y4m.rs` (`Y4MReader`/`Y4MWriter` API shape: a
//! reader/writer pair keyed on width/height, one `read_frame`/`write_frame`
//! call per frame). Unlike the teacher, there is no container header to
//! parse here — SPEC_FULL.md's raw-YUV path is a bare plane dump, one frame
//! after another, with geometry supplied out of band (by the CLI's width/
//! height arguments) — so this reworks the teacher's shape to read/write
//! `plane::Image`s directly and return `Result` instead of panicking.

use crate::alloc::ByteAllocator;
use crate::error::Result;
use crate::plane::Image;
use std::io::{Read, Write};

pub struct YuvReader<R> {
  inner: R,
  width: usize,
  height: usize,
}

pub struct YuvWriter<W> {
  inner: W,
  width: usize,
  height: usize,
}

impl<R: Read> YuvReader<R> {
  pub fn new(inner: R, width: usize, height: usize) -> Self {
    YuvReader { inner, width, height }
  }

  /// Reads one full YUV420p frame. Returns `Ok(None)` at a clean
  /// end-of-stream (no bytes read before the frame starts).
  pub fn read_frame(&mut self, alloc: &dyn ByteAllocator) -> Result<Option<Image>> {
    let total = Image::total_size(self.width, self.height);
    let mut image = Image::allocate(self.width, self.height, alloc)?;

    let mut read = 0;
    while read < total {
      let n = self.inner.read(&mut image.data[read..])?;
      if n == 0 {
        break;
      }
      read += n;
    }

    if read == 0 {
      return Ok(None);
    }
    if read != total {
      return Err(crate::error::OwlVisionError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short frame read")));
    }
    Ok(Some(image))
  }
}

impl<W: Write> YuvWriter<W> {
  pub fn new(inner: W, width: usize, height: usize) -> Self {
    YuvWriter { inner, width, height }
  }

  pub fn write_frame(&mut self, image: &Image) -> Result<()> {
    if image.width != self.width || image.height != self.height {
      return Err(crate::error::OwlVisionError::UnsupportedGeometry(format!(
        "frame is {}x{}, writer expects {}x{}",
        image.width, image.height, self.width, self.height
      )));
    }
    self.inner.write_all(&image.data)?;
    Ok(())
  }

  pub fn into_inner(self) -> W {
    self.inner
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alloc::SystemAllocator;

  #[test]
  fn round_trip_single_frame() {
    let (w, h) = (8, 8);
    let total = Image::total_size(w, h);
    let data: Vec<u8> = (0..total).map(|i| (i % 256) as u8).collect();
    let image = Image::from_bytes(w, h, data.into_boxed_slice());

    let mut buf = Vec::new();
    let mut writer = YuvWriter::new(&mut buf, w, h);
    writer.write_frame(&image).unwrap();

    let alloc = SystemAllocator;
    let mut reader = YuvReader::new(std::io::Cursor::new(buf), w, h);
    let read_back = reader.read_frame(&alloc).unwrap().unwrap();
    assert_eq!(read_back.data, image.data);
    assert!(reader.read_frame(&alloc).unwrap().is_none());
  }

  #[test]
  fn short_read_is_an_error() {
    let (w, h) = (8, 8);
    let alloc = SystemAllocator;
    let mut reader = YuvReader::new(std::io::Cursor::new(vec![0u8; 4]), w, h);
    assert!(reader.read_frame(&alloc).is_err());
  }
}
