//! MMC sequence container: header framing plus a flat stream of raw YUV420p
//! frames. Per spec.md §4.2, frames are *not* per-frame entropy coded in
//! this design — only the still-image OVC path runs MaxFOG.
//!
//! Grounded in `MacaqueMixture.{hpp,cpp}`: `SetFrameRate`/`GetFrequency`
//! pack/unpack `frameRate = num<<16 | den`. The original's `GetFrequency`
//! divides the low 16 bits by the high 16 bits, inverted relative to its own
//! packing order; this crate implements `num/den` as named (DESIGN.md Open
//! Question 3).

use crate::error::{OwlVisionError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const MAGIC: &[u8; 8] = b"SBAV-MMC";

/// Packs `num`/`den` into the wire's 32-bit frame-rate field: `num<<16 | den`.
pub fn pack_frame_rate(num: u16, den: u16) -> u32 {
  ((num as u32) << 16) | (den as u32)
}

/// `num / den` as `frequency = num/den`; `den == 0` is a malformed header.
pub fn frequency(frame_rate: u32) -> Result<f32> {
  let num = (frame_rate >> 16) & 0xFFFF;
  let den = frame_rate & 0xFFFF;
  if den == 0 {
    return Err(OwlVisionError::InvalidFormat("frame rate denominator is zero".into()));
  }
  Ok(num as f32 / den as f32)
}

/// Writes the MMC header followed by every frame in `frames`, each expected
/// to be exactly `width*height*3/2` raw YUV420p bytes.
pub fn write<W: Write>(width: usize, height: usize, num: u16, den: u16, frames: &[Box<[u8]>], out: &mut W) -> Result<()> {
  let frame_size = (width * height * 3) >> 1;
  out.write_all(MAGIC)?;
  out.write_u64::<LittleEndian>(width as u64)?;
  out.write_u64::<LittleEndian>(height as u64)?;
  out.write_u32::<LittleEndian>(pack_frame_rate(num, den))?;
  for frame in frames {
    if frame.len() != frame_size {
      return Err(OwlVisionError::UnsupportedGeometry(format!(
        "frame is {} bytes, expected {} for {}x{} YUV420p",
        frame.len(),
        frame_size,
        width,
        height
      )));
    }
    out.write_all(frame)?;
  }
  Ok(())
}

/// Parsed MMC header, with the trailing frame stream left for the caller to
/// pull frame-by-frame (frames are read on demand, not buffered up front).
pub struct SequenceHeader {
  pub width: usize,
  pub height: usize,
  pub frame_rate: u32,
}

pub fn read_header<R: Read>(source: &mut R) -> Result<SequenceHeader> {
  let mut magic = [0u8; 8];
  source.read_exact(&mut magic)?;
  if &magic != MAGIC {
    return Err(OwlVisionError::InvalidFormat(format!(
      "expected magic {:?}, got {:?}",
      String::from_utf8_lossy(MAGIC),
      String::from_utf8_lossy(&magic)
    )));
  }
  let width = source.read_u64::<LittleEndian>()? as usize;
  let height = source.read_u64::<LittleEndian>()? as usize;
  let frame_rate = source.read_u32::<LittleEndian>()?;
  Ok(SequenceHeader { width, height, frame_rate })
}

/// Reads one raw YUV420p frame of the header's geometry from `source`.
/// Returns `Ok(None)` at a clean end-of-stream (zero bytes read before the
/// frame starts).
pub fn read_frame<R: Read>(source: &mut R, header: &SequenceHeader) -> Result<Option<Box<[u8]>>> {
  let frame_size = (header.width * header.height * 3) >> 1;
  let mut buf = vec![0u8; frame_size];
  let mut total = 0;
  while total < frame_size {
    let n = source.read(&mut buf[total..])?;
    if n == 0 {
      break;
    }
    total += n;
  }
  if total == 0 {
    return Ok(None);
  }
  if total != frame_size {
    return Err(OwlVisionError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short frame read")));
  }
  Ok(Some(buf.into_boxed_slice()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn frame_rate_round_trip() {
    let packed = pack_frame_rate(30, 1);
    assert_eq!(frequency(packed).unwrap(), 30.0);

    let packed = pack_frame_rate(24000, 1001);
    assert!((frequency(packed).unwrap() - 23.976).abs() < 1e-2);
  }

  #[test]
  fn container_round_trip() {
    let (w, h) = (8, 8);
    let frame_size = (w * h * 3) >> 1;
    let frames: Vec<Box<[u8]>> = (0..3).map(|i| vec![i as u8; frame_size].into_boxed_slice()).collect();

    let mut buf = Vec::new();
    write(w, h, 30, 1, &frames, &mut buf).unwrap();

    let mut cursor = std::io::Cursor::new(buf);
    let header = read_header(&mut cursor).unwrap();
    assert_eq!(header.width, w);
    assert_eq!(header.height, h);
    assert_eq!(frequency(header.frame_rate).unwrap(), 30.0);

    let mut read_frames = Vec::new();
    while let Some(f) = read_frame(&mut cursor, &header).unwrap() {
      read_frames.push(f);
    }
    assert_eq!(read_frames.len(), 3);
    for (a, b) in frames.iter().zip(read_frames.iter()) {
      assert_eq!(a, b);
    }
  }

  #[test]
  fn bad_magic_is_invalid_format() {
    let bytes = b"SBAD-MMC".to_vec();
    let mut cursor = std::io::Cursor::new(bytes);
    assert!(read_header(&mut cursor).is_err());
  }
}
