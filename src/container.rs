//! OVC still-image container: header framing plus the encode/decode
//! pipeline that sequences project -> transform+quantize -> pack (and its
//! inverse) across the three YUV 4:2:0 planes.
//!
//! Grounded in `OwlVision.cpp::SbOwlVisionContainer::operator()` for the
//! header read/write and the plane fan-out (`std::async` there, scoped
//! threads here — see DESIGN.md Open Question 9), and in
//! `ShadowReceieveData`/`ShadowTransformAndQuantize`/`ShadowReturnData` for
//! the per-plane project/transform+quantize/pack stage order.

use crate::alloc::ByteAllocator;
use crate::array2d::Array2D;
use crate::dct;
use crate::error::{OwlVisionError, Result};
use crate::maxfog;
use crate::plane::{self, Image, PlaneKind, check_geometry};
use crate::quant::{self, Profile};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::thread;

const MAGIC: &[u8; 8] = b"SBAV-OVC";

/// Project to float, forward-transform + quantize every tile, then round
/// back into signed bytes. Operates on one plane's byte range in place.
fn encode_plane(bytes: &mut [u8], width: usize, height: usize, n: usize, profile: Profile) {
  let mut shadow: Vec<f32> = bytes.iter().map(|&b| b as f32 - 128.0).collect();
  let table = quant::table(n, profile);
  let mut tile = Array2D::<f32>::zeroed(n, n);

  for ty in (0..height).step_by(n) {
    for tx in (0..width).step_by(n) {
      for r in 0..n {
        tile[r].copy_from_slice(&shadow[(ty + r) * width + tx..(ty + r) * width + tx + n]);
      }
      dct::forward_2d(&mut tile);
      dct::quantize_2d(&mut tile, &table);
      for r in 0..n {
        shadow[(ty + r) * width + tx..(ty + r) * width + tx + n].copy_from_slice(&tile[r]);
      }
    }
  }

  for (b, &f) in bytes.iter_mut().zip(shadow.iter()) {
    let rounded = f.round().clamp(-128.0, 127.0) as i32;
    *b = rounded as i8 as u8;
  }
}

/// Reinterpret as signed bytes, dequantize + inverse-transform every tile,
/// then restore the 128 bias and clamp back to `u8`.
fn decode_plane(bytes: &mut [u8], width: usize, height: usize, n: usize, profile: Profile) {
  let mut shadow: Vec<f32> = bytes.iter().map(|&b| (b as i8) as f32).collect();
  let table = quant::table(n, profile);
  let mut tile = Array2D::<f32>::zeroed(n, n);

  for ty in (0..height).step_by(n) {
    for tx in (0..width).step_by(n) {
      for r in 0..n {
        tile[r].copy_from_slice(&shadow[(ty + r) * width + tx..(ty + r) * width + tx + n]);
      }
      dct::dequantize_2d(&mut tile, &table);
      dct::inverse_2d(&mut tile);
      for r in 0..n {
        shadow[(ty + r) * width + tx..(ty + r) * width + tx + n].copy_from_slice(&tile[r]);
      }
    }
  }

  for (b, &f) in bytes.iter_mut().zip(shadow.iter()) {
    let v = (f + 128.0).round().clamp(0.0, 255.0) as u8;
    *b = v;
  }
}

/// Splits the packed image buffer into its three disjoint plane ranges and
/// runs `f` over each on its own scoped thread. The only mandated
/// concurrency point in the design (spec.md §5): planes never overlap, so
/// no synchronization beyond the join barrier is required.
fn for_each_plane_parallel(width: usize, height: usize, data: &mut [u8], f: impl Fn(&mut [u8], usize, usize, Profile) + Sync) {
  let y_size = plane::plane_size(width, height, PlaneKind::Luma);
  let uv_size = plane::plane_size(width, height, PlaneKind::ChromaBlue);
  let (y, rest) = data.split_at_mut(y_size);
  let (u, v) = rest.split_at_mut(uv_size);

  let yw = plane::plane_width(width, PlaneKind::Luma);
  let yh = plane::plane_height(height, PlaneKind::Luma);
  let cw = plane::plane_width(width, PlaneKind::ChromaBlue);
  let ch = plane::plane_height(height, PlaneKind::ChromaBlue);

  thread::scope(|s| {
    s.spawn(|| f(y, yw, yh, Profile::Luma));
    s.spawn(|| f(u, cw, ch, Profile::Chroma));
    s.spawn(|| f(v, cw, ch, Profile::Chroma));
  });
}

/// Write `image` as an OVC container to `out`, tiling with side `tile_n`.
pub fn write<W: Write>(image: &Image, tile_n: usize, out: &mut W) -> Result<()> {
  check_geometry(image.width, image.height, tile_n)?;
  log::debug!("encoding {}x{} image, tile side {}", image.width, image.height, tile_n);

  let mut packed = image.data.to_vec();
  for_each_plane_parallel(image.width, image.height, &mut packed, |bytes, w, h, profile| {
    encode_plane(bytes, w, h, tile_n, profile);
  });

  let (alphabet, bits, payload) = maxfog::encode(&packed, Vec::new())?;
  log::trace!("maxfog alphabet size {}, {} bits encoded", alphabet.len(), bits);

  out.write_all(MAGIC)?;
  out.write_u64::<LittleEndian>(image.width as u64)?;
  out.write_u64::<LittleEndian>(image.height as u64)?;
  out.write_u64::<LittleEndian>(bits)?;
  out.write_u8(alphabet.len() as u8)?;
  out.write_all(&alphabet)?;
  out.write_all(&payload)?;
  Ok(())
}

/// Read an OVC container from `source`, tiling with side `tile_n` (the
/// caller must supply the same tile side used at encode time; it is not
/// carried in the wire format).
pub fn read<R: Read>(source: &mut R, tile_n: usize, alloc: &dyn ByteAllocator) -> Result<Image> {
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
  check_geometry(width, height, tile_n)?;

  let bits = source.read_u64::<LittleEndian>()?;
  let alen = source.read_u8()? as usize;
  let mut alphabet = vec![0u8; alen];
  source.read_exact(&mut alphabet)?;

  let total = Image::total_size(width, height);
  // Each byte costs at least the 1-bit zero/non-zero escape, and at most
  // 1 + alen bits (escape plus a full alphabet walk). A declared bit count
  // outside that range can't possibly decode to `total` bytes, so reject it
  // up front rather than letting it surface as a generic CorruptPayload deep
  // inside the MaxFOG walk.
  let max_bits = (total as u64) * (1 + alen as u64);
  if bits > max_bits || (total > 0 && bits == 0) {
    return Err(OwlVisionError::InvalidFormat(format!(
      "bit count {bits} implausible for a {alen}-symbol alphabet over {total} bytes (max {max_bits})"
    )));
  }

  let mut packed = maxfog::decode(source, &alphabet, bits, total)?;
  log::debug!("decoding {}x{} image, tile side {}", width, height, tile_n);

  for_each_plane_parallel(width, height, &mut packed, |bytes, w, h, profile| {
    decode_plane(bytes, w, h, tile_n, profile);
  });

  let mut image = Image::allocate(width, height, alloc)?;
  image.data.copy_from_slice(&packed);
  Ok(image)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alloc::SystemAllocator;

  #[test]
  fn s5_solid_gray_round_trips_exactly() {
    let (w, h) = (32, 32);
    let total = Image::total_size(w, h);
    let data = vec![128u8; total].into_boxed_slice();
    let image = Image::from_bytes(w, h, data);

    let mut buf = Vec::new();
    write(&image, 32, &mut buf).unwrap();

    let alloc = SystemAllocator;
    let decoded = read(&mut std::io::Cursor::new(buf), 32, &alloc).unwrap();
    assert!(decoded.data.iter().all(|&b| b == 128));
  }

  #[test]
  fn s6_bad_magic_is_invalid_format() {
    let mut bytes = b"SBAD-OVC".to_vec();
    bytes.extend_from_slice(&[0u8; 32]);
    let alloc = SystemAllocator;
    let result = read(&mut std::io::Cursor::new(bytes), 8, &alloc);
    assert!(matches!(result, Err(OwlVisionError::InvalidFormat(_))));
  }

  #[test]
  fn round_trip_within_quantization_bound() {
    let (w, h) = (16, 16);
    let total = Image::total_size(w, h);
    let data: Vec<u8> = (0..total).map(|i| (i % 256) as u8).collect();
    let image = Image::from_bytes(w, h, data.into_boxed_slice());

    let mut buf = Vec::new();
    write(&image, 8, &mut buf).unwrap();
    let alloc = SystemAllocator;
    let decoded = read(&mut std::io::Cursor::new(buf), 8, &alloc).unwrap();

    let max_table_entry = 121.0f32;
    for (&a, &b) in image.data.iter().zip(decoded.data.iter()) {
      assert!((a as f32 - b as f32).abs() <= max_table_entry);
    }
  }

  #[test]
  fn implausible_bit_count_is_invalid_format() {
    let mut bytes = MAGIC.to_vec();
    bytes.write_u64::<LittleEndian>(8).unwrap();
    bytes.write_u64::<LittleEndian>(8).unwrap();
    // 8x8 4:2:0 is 96 bytes total; with an empty alphabet the max payload is
    // 96 bits, so declaring far more than that must be rejected up front.
    bytes.write_u64::<LittleEndian>(1_000_000).unwrap();
    bytes.write_u8(0).unwrap();

    let alloc = SystemAllocator;
    let result = read(&mut std::io::Cursor::new(bytes), 8, &alloc);
    assert!(matches!(result, Err(OwlVisionError::InvalidFormat(_))));
  }

  #[test]
  fn zero_bits_for_nonempty_image_is_invalid_format() {
    let mut bytes = MAGIC.to_vec();
    bytes.write_u64::<LittleEndian>(8).unwrap();
    bytes.write_u64::<LittleEndian>(8).unwrap();
    bytes.write_u64::<LittleEndian>(0).unwrap();
    bytes.write_u8(0).unwrap();

    let alloc = SystemAllocator;
    let result = read(&mut std::io::Cursor::new(bytes), 8, &alloc);
    assert!(matches!(result, Err(OwlVisionError::InvalidFormat(_))));
  }

  #[test]
  fn single_tile_image() {
    let (w, h) = (8, 8);
    let total = Image::total_size(w, h);
    let data = vec![100u8; total].into_boxed_slice();
    let image = Image::from_bytes(w, h, data);
    let mut buf = Vec::new();
    write(&image, 8, &mut buf).unwrap();
    let alloc = SystemAllocator;
    let decoded = read(&mut std::io::Cursor::new(buf), 8, &alloc).unwrap();
    assert_eq!(decoded.width, 8);
    assert_eq!(decoded.height, 8);
  }
}
