//! Plane geometry and the owned YUV 4:2:0 image buffer.
//!
//! Grounded in `OwlVision.cpp::InitShadowOperationPipelineInfo`, which
//! computes per-plane offset/size/width/height via the same bit-shift
//! formulas reproduced below, and in the teacher's `frame.rs` for the
//! owned-buffer shape (`Box<[u8]>`, `width`/`height`/`stride`).

use crate::alloc::ByteAllocator;
use crate::error::{OwlVisionError, Result};

/// Which of the three YUV 4:2:0 planes a geometry query or tile loop targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
  Luma,
  ChromaBlue,
  ChromaRed,
}

impl PlaneKind {
  pub const ALL: [PlaneKind; 3] = [PlaneKind::Luma, PlaneKind::ChromaBlue, PlaneKind::ChromaRed];

  fn is_chroma(self) -> bool {
    self != PlaneKind::Luma
  }
}

/// `W >> (p != Luma)`.
pub fn plane_width(width: usize, kind: PlaneKind) -> usize {
  if kind.is_chroma() { width >> 1 } else { width }
}

/// `H >> (p != Luma)`.
pub fn plane_height(height: usize, kind: PlaneKind) -> usize {
  if kind.is_chroma() { height >> 1 } else { height }
}

/// `W*H >> (2 if p != Luma else 0)`.
pub fn plane_size(width: usize, height: usize, kind: PlaneKind) -> usize {
  let wh = width * height;
  if kind.is_chroma() { wh >> 2 } else { wh }
}

/// Byte offset of a plane within the packed Y-then-Cb-then-Cr image buffer.
pub fn plane_offset(width: usize, height: usize, kind: PlaneKind) -> usize {
  let wh = width * height;
  match kind {
    PlaneKind::Luma => 0,
    PlaneKind::ChromaBlue => wh,
    PlaneKind::ChromaRed => wh + (wh >> 2),
  }
}

/// Checks that `n` is a supported DCT tile side and that every plane's width
/// and height divide evenly by it, i.e. that 4:2:0 planes tile exactly with
/// no partial tiles.
pub fn check_geometry(width: usize, height: usize, n: usize) -> Result<()> {
  if !matches!(n, 4 | 8 | 16 | 32) {
    return Err(OwlVisionError::UnsupportedGeometry(format!(
      "tile side {n} is not one of the supported DCT sizes 4, 8, 16, 32"
    )));
  }
  for kind in PlaneKind::ALL {
    let w = plane_width(width, kind);
    let h = plane_height(height, kind);
    if w % n != 0 || h % n != 0 {
      return Err(OwlVisionError::UnsupportedGeometry(format!(
        "plane {kind:?} is {w}x{h}, not divisible by tile side {n}"
      )));
    }
  }
  Ok(())
}

/// An owned YUV 4:2:0 image: `W*H*3/2` bytes, Y followed by Cb followed by Cr.
pub struct Image {
  pub width: usize,
  pub height: usize,
  pub data: Box<[u8]>,
}

impl Image {
  /// `W*H*3/2`.
  pub fn total_size(width: usize, height: usize) -> usize {
    (width * height * 3) >> 1
  }

  pub fn allocate(width: usize, height: usize, alloc: &dyn ByteAllocator) -> Result<Self> {
    let data = alloc.alloc(Self::total_size(width, height))?;
    Ok(Image { width, height, data })
  }

  pub fn from_bytes(width: usize, height: usize, data: Box<[u8]>) -> Self {
    assert_eq!(data.len(), Self::total_size(width, height));
    Image { width, height, data }
  }

  pub fn plane(&self, kind: PlaneKind) -> &[u8] {
    let off = plane_offset(self.width, self.height, kind);
    let size = plane_size(self.width, self.height, kind);
    &self.data[off..off + size]
  }

  pub fn plane_mut(&mut self, kind: PlaneKind) -> &mut [u8] {
    let off = plane_offset(self.width, self.height, kind);
    let size = plane_size(self.width, self.height, kind);
    &mut self.data[off..off + size]
  }
}
