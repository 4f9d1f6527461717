//! Forward/inverse DCT-II kernels (N = 4, 8, 16, 32) and their 2-D square-tile
//! drivers, plus elementwise quantization.
//!
//! N=8 is the closed-form "rotator" fast DCT (four butterfly sums/differences
//! then four 2-D rotations), ported from `DCT.cpp::SbDCT::Transform8`. N=4 is
//! the same family collapsed to a single rotation. N=16/32 use the recursive
//! base-2 Lee decomposition from `base2_lee_dct_impl.hpp`, generalized from
//! its compile-time template recursion into an ordinary runtime-recursive
//! function. All four share the same `rotate2d` primitive; no transcendental
//! calls happen outside table construction and the Lee butterfly cosines.

use crate::array2d::Array2D;
use std::f32::consts::{PI, SQRT_2};

/// `(c*x - s*y, s*x + c*y)`. The only rotation primitive every kernel below
/// is built from.
#[inline]
pub fn rotate2d(c: f32, s: f32, x: f32, y: f32) -> (f32, f32) {
  (c * x - s * y, s * x + c * y)
}

#[inline]
fn pam(a: f32, b: f32, k: f32) -> (f32, f32) {
  (k * (a + b), k * (a - b))
}

// ---------------------------------------------------------------------
// Length 4
// ---------------------------------------------------------------------

const A4: f32 = 0.5;
const C4: f32 = 0.6532815; // sqrt(1/2) * cos(pi/8)
const S4: f32 = 0.2705981; // sqrt(1/2) * sin(pi/8)

fn forward4(x: &mut [f32]) {
  let (s0, s1) = pam(x[0], x[3], 1.0);
  let (s2, s3) = pam(x[1], x[2], 1.0);

  let x0 = A4 * (s0 + s2);
  let x2 = A4 * (s0 - s2);
  let (r0, r1) = rotate2d(C4, -S4, s1, s3);

  x[0] = x0;
  x[2] = x2;
  x[1] = r0;
  x[3] = -r1;
}

fn inverse4(x: &mut [f32]) {
  let (k0, k1) = pam(x[0], x[2], A4);
  let (t0, neg_t1) = rotate2d(C4, -S4, x[1], x[3]);
  let t1 = -neg_t1;

  x[0] = k0 + t0;
  x[3] = k0 - t0;
  x[1] = k1 + t1;
  x[2] = k1 - t1;
}

// ---------------------------------------------------------------------
// Length 8 (classic rotator fast DCT, JPEG constants)
// ---------------------------------------------------------------------

const A8: f32 = 0.3535534; // sqrt(1/8)
const B8: f32 = 0.4903926;
const C8: f32 = 0.4157348;
const D8: f32 = 0.4619398;
const BB8: f32 = 0.0975452;
const CC8: f32 = 0.2777851;
const DD8: f32 = 0.1913417;

fn forward8(x: &mut [f32]) {
  let (s0, s1) = pam(x[0], x[7], 1.0);
  let (s2, s3) = pam(x[1], x[6], 1.0);
  let (s4, s5) = pam(x[2], x[5], 1.0);
  let (s6, s7) = pam(x[3], x[4], 1.0);

  let x0 = A8 * (s0 + s6 + s2 + s4);
  let x4 = A8 * (s0 + s6 - s2 - s4);

  let (r0_0, r0_1) = rotate2d(B8, BB8, s7, s1);
  let (r1_0, r1_1) = rotate2d(C8, CC8, s5, s3);
  let x1 = r0_1 + r1_1;
  let x7 = r1_0 - r0_0;

  let (g0, g1) = rotate2d(D8, DD8, s2 - s4, s0 - s6);
  let x2 = g1;
  let x6 = -g0;

  let (t0_0, t0_1) = rotate2d(C8, CC8, s1, s7);
  let (t1_0, t1_1) = rotate2d(B8, BB8, s3, s5);
  let x3 = t0_0 - t1_1;
  let x5 = t0_1 - t1_0;

  x[0] = x0;
  x[1] = x1;
  x[2] = x2;
  x[3] = x3;
  x[4] = x4;
  x[5] = x5;
  x[6] = x6;
  x[7] = x7;
}

fn inverse8(x: &mut [f32]) {
  let (s0, s1) = pam(x[0], x[4], A8);
  let (s2, s3) = rotate2d(DD8, D8, x[2], x[6]);

  let (g0, g1) = rotate2d(BB8, B8, x[1], x[7]);
  let (g2, g3) = rotate2d(B8, BB8, x[3], x[5]);
  let (g4, g5) = rotate2d(C8, CC8, x[1], x[7]);
  let (g6, g7) = rotate2d(CC8, C8, x[3], x[5]);

  let t0 = g1 + g7;
  let t1 = g3 - g4;
  let t2 = g2 - g5;
  let t3 = g0 - g6;

  let (k0, k1) = pam(s0, s3, 1.0);
  let (k2, k3) = pam(s1, s2, 1.0);

  x[0] = k0 + t0;
  x[7] = k0 - t0;
  x[1] = k2 - t1;
  x[6] = k2 + t1;
  x[2] = k3 - t2;
  x[5] = k3 + t2;
  x[3] = k1 + t3;
  x[4] = k1 - t3;
}

// ---------------------------------------------------------------------
// Length 16 / 32 (recursive base-2 Lee DCT)
// ---------------------------------------------------------------------

fn lee_orthogonalize(x: &mut [f32]) {
  let n = x.len();
  let inv_sqrt_n = 1.0 / (n as f32).sqrt();
  for (i, v) in x.iter_mut().enumerate() {
    let f = if i == 0 { 1.0 } else { SQRT_2 };
    *v *= f * inv_sqrt_n;
  }
}

fn lee_forward_recursive(x: &mut [f32], t: &mut [f32]) {
  let n = x.len();
  if n == 1 {
    return;
  }
  let half = n / 2;
  for i in 0..half {
    let r = PI * ((2 * i + 1) as f32) / ((2 * n) as f32);
    let a = x[i];
    let b = x[n - 1 - i];
    t[i] = a + b;
    t[i + half] = (a - b) * 0.5 / r.cos();
  }
  {
    let (t0, t1) = t.split_at_mut(half);
    let (x0, x1) = x.split_at_mut(half);
    lee_forward_recursive(t0, x0);
    lee_forward_recursive(t1, x1);
  }
  for i in 0..half.saturating_sub(1) {
    x[2 * i] = t[i];
    x[2 * i + 1] = t[i + half] + t[i + half + 1];
  }
  x[n - 2] = t[half - 1];
  x[n - 1] = t[n - 1];
}

fn lee_inverse_recursive(x: &mut [f32], t: &mut [f32]) {
  let n = x.len();
  if n == 1 {
    return;
  }
  let half = n / 2;
  for i in 1..half {
    t[i] = x[2 * i];
    t[i + half] = x[2 * i - 1] + x[2 * i + 1];
  }
  t[0] = x[0];
  t[half] = x[1];
  {
    let (t0, t1) = t.split_at_mut(half);
    let (x0, x1) = x.split_at_mut(half);
    lee_inverse_recursive(t0, x0);
    lee_inverse_recursive(t1, x1);
  }
  for i in 0..half {
    let r = PI * ((2 * i + 1) as f32) / ((2 * n) as f32);
    let a = t[i];
    let b = t[i + half] * 0.5 / r.cos();
    x[i] = a + b;
    x[n - 1 - i] = a - b;
  }
}

fn forward_lee(x: &mut [f32]) {
  let n = x.len();
  let mut tmp = vec![0.0f32; n];
  lee_forward_recursive(x, &mut tmp);
  lee_orthogonalize(x);
}

fn inverse_lee(x: &mut [f32]) {
  lee_orthogonalize(x);
  let n = x.len();
  let mut tmp = vec![0.0f32; n];
  lee_inverse_recursive(x, &mut tmp);
}

// ---------------------------------------------------------------------
// Public dispatch
// ---------------------------------------------------------------------

/// In-place forward DCT-II of `x.len()` (must be 4, 8, 16, or 32).
pub fn forward_1d(x: &mut [f32]) {
  match x.len() {
    4 => forward4(x),
    8 => forward8(x),
    n if n.is_power_of_two() && n >= 16 => forward_lee(x),
    n => panic!("unsupported DCT length {n}"),
  }
}

/// In-place inverse DCT-II of `x.len()` (must be 4, 8, 16, or 32).
pub fn inverse_1d(x: &mut [f32]) {
  match x.len() {
    4 => inverse4(x),
    8 => inverse8(x),
    n if n.is_power_of_two() && n >= 16 => inverse_lee(x),
    n => panic!("unsupported DCT length {n}"),
  }
}

/// Elementwise divide a single row by the matching row of a quantization table.
pub fn quantize_1d(row: &mut [f32], table_row: &[f32]) {
  for (v, t) in row.iter_mut().zip(table_row) {
    *v /= t;
  }
}

/// Elementwise multiply a single row by the matching row of a quantization table.
pub fn dequantize_1d(row: &mut [f32], table_row: &[f32]) {
  for (v, t) in row.iter_mut().zip(table_row) {
    *v *= t;
  }
}

/// Apply the forward DCT to every row then every column of a square tile.
pub fn forward_2d(tile: &mut Array2D<f32>) {
  transform_2d(tile, forward_1d);
}

/// Inverse of [`forward_2d`].
pub fn inverse_2d(tile: &mut Array2D<f32>) {
  transform_2d(tile, inverse_1d);
}

fn transform_2d(tile: &mut Array2D<f32>, f: fn(&mut [f32])) {
  let n = tile.rows();
  debug_assert_eq!(tile.cols(), n);
  for r in 0..n {
    f(&mut tile[r]);
  }
  let mut col = vec![0.0f32; n];
  for c in 0..n {
    for r in 0..n {
      col[r] = tile[r][c];
    }
    f(&mut col);
    for r in 0..n {
      tile[r][c] = col[r];
    }
  }
}

/// Divide every element of a square tile by the matching entry of a
/// same-size quantization table.
pub fn quantize_2d(tile: &mut Array2D<f32>, table: &Array2D<f32>) {
  for r in 0..tile.rows() {
    quantize_1d(&mut tile[r], &table[r]);
  }
}

/// Multiply every element of a square tile by the matching entry of a
/// same-size quantization table.
pub fn dequantize_2d(tile: &mut Array2D<f32>, table: &Array2D<f32>) {
  for r in 0..tile.rows() {
    dequantize_1d(&mut tile[r], &table[r]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    for (x, y) in a.iter().zip(b) {
      assert!((x - y).abs() <= tol, "{:?} vs {:?}", a, b);
    }
  }

  #[test]
  fn round_trip_all_sizes() {
    for &n in &[4usize, 8, 16, 32] {
      let mut x: Vec<f32> = (0..n).map(|i| ((i * 37 % 1024) as f32) - 512.0).collect();
      let orig = x.clone();
      forward_1d(&mut x);
      inverse_1d(&mut x);
      assert_close(&orig, &x, 1e-3);
    }
  }

  #[test]
  fn s1_identity_dc() {
    let mut x = [1.0f32; 8];
    forward_1d(&mut x);
    assert!((x[0] - 2.0 * std::f32::consts::SQRT_2).abs() < 1e-4);
    for &v in &x[1..] {
      assert!(v.abs() < 1e-4);
    }
  }

  #[test]
  fn s2_inverse_of_basis_vector() {
    let mut x = [0.3536, 0.4904, 0.4157, 0.2778, 0.0, -0.2778, -0.4157, -0.4904];
    forward_1d(&mut x);
    let expected = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    assert_close(&x, &expected, 1e-3);
  }

  #[test]
  fn tile_round_trip() {
    let n = 8;
    let mut tile = Array2D::<f32>::new_with(n, n, |r, c| (r * n + c) as f32 - 32.0);
    let orig = tile.clone();
    forward_2d(&mut tile);
    inverse_2d(&mut tile);
    for r in 0..n {
      assert_close(&orig[r], &tile[r], 1e-2);
    }
  }

  #[test]
  fn parseval_energy_preserved() {
    let mut x: Vec<f32> = vec![3.0, -1.0, 2.0, 0.5, -4.0, 7.0, 1.0, -2.0];
    let energy_before: f32 = x.iter().map(|v| v * v).sum();
    forward_1d(&mut x);
    let energy_after: f32 = x.iter().map(|v| v * v).sum();
    assert!((energy_before - energy_after).abs() < 1e-2);
  }
}
