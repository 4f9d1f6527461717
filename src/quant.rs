//! Quantization tables for tile sizes N in {4, 8, 16, 32}, luma and chroma.
//!
//! The N=8 tables are the standard JPEG annex-K tables, ported verbatim from
//! `OwlVision.hpp::quantTablesInv8x8`. Other sizes are not present in the
//! original (it hardcodes 32x32 for the video path and 8x8 for the
//! standalone-image path) and are synthesized here; see DESIGN.md for the
//! rationale.

use crate::array2d::Array2D;

/// The standard JPEG luma quantization table, row-major 8x8.
#[rustfmt::skip]
const LUMA_8: [f32; 64] = [
  16.0, 11.0, 10.0, 16.0,  24.0,  40.0,  51.0,  61.0,
  12.0, 12.0, 14.0, 19.0,  26.0,  58.0,  60.0,  55.0,
  14.0, 13.0, 16.0, 24.0,  40.0,  57.0,  69.0,  56.0,
  14.0, 17.0, 22.0, 29.0,  51.0,  87.0,  80.0,  62.0,
  18.0, 22.0, 37.0, 56.0,  68.0, 109.0, 103.0,  77.0,
  24.0, 35.0, 55.0, 64.0,  81.0, 104.0, 113.0,  92.0,
  49.0, 64.0, 78.0, 87.0, 103.0, 121.0, 120.0, 101.0,
  72.0, 92.0, 95.0, 98.0, 112.0, 100.0, 103.0,  99.0,
];

/// The standard JPEG chroma quantization table, row-major 8x8.
#[rustfmt::skip]
const CHROMA_8: [f32; 64] = [
  17.0, 18.0, 24.0, 47.0, 99.0, 99.0, 99.0, 99.0,
  18.0, 21.0, 26.0, 66.0, 99.0, 99.0, 99.0, 99.0,
  24.0, 26.0, 56.0, 99.0, 99.0, 99.0, 99.0, 99.0,
  47.0, 66.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0,
  99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0,
  99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0,
  99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0,
  99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0, 99.0,
];

/// Which plane kind a quantization table profile applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
  Luma,
  Chroma,
}

/// Returns an N x N quantization table for the given profile.
///
/// N=8 reuses the JPEG table verbatim. N=4 takes its top-left 4x4 corner
/// (preserves DC and the lowest-frequency falloff). N=16/32 replicate each
/// 8x8 entry into an (N/8) x (N/8) block of identical values, preserving the
/// DC corner and the same asymptotic AC falloff at coarser granularity.
pub fn table(n: usize, profile: Profile) -> Array2D<f32> {
  let base = match profile {
    Profile::Luma => &LUMA_8,
    Profile::Chroma => &CHROMA_8,
  };
  match n {
    8 => Array2D::new_with(8, 8, |r, c| base[r * 8 + c]),
    4 => Array2D::new_with(4, 4, |r, c| base[r * 8 + c]),
    16 | 32 => {
      let scale = n / 8;
      Array2D::new_with(n, n, |r, c| base[(r / scale) * 8 + (c / scale)])
    }
    _ => panic!("unsupported quantization table size {n}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn n8_matches_jpeg_table_verbatim() {
    let t = table(8, Profile::Luma);
    for r in 0..8 {
      for c in 0..8 {
        assert_eq!(t[r][c], LUMA_8[r * 8 + c]);
      }
    }
  }

  #[test]
  fn n4_is_top_left_corner_of_n8() {
    let t4 = table(4, Profile::Chroma);
    let t8 = table(8, Profile::Chroma);
    for r in 0..4 {
      for c in 0..4 {
        assert_eq!(t4[r][c], t8[r][c]);
      }
    }
  }

  #[test]
  fn n32_replicates_each_n8_entry_into_a_4x4_block() {
    let t8 = table(32, Profile::Luma);
    for r in 0..32 {
      for c in 0..32 {
        assert_eq!(t8[r][c], LUMA_8[(r / 4) * 8 + (c / 4)]);
      }
    }
  }
}
