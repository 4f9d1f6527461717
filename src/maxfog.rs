//! MaxFOG entropy codec: alphabet construction plus the zero-escape,
//! paired-alphabet-walk bit grammar.
//!
//! Grounded in `MaxFOG.cpp::MakeTree`/`EncodeBytes`/`DecodeBits`. The tree
//! there is walked starting one slot in (`treeBeg+1`); the grammar
//! implemented here instead walks from `alphabet[0]` per the authoritative
//! written grammar — see DESIGN.md Open Question 1. The portable decoder
//! below is the full specification of what the original's JIT-compiled
//! `SbIKPByteDecoder` accelerates; no code generation happens here.

use crate::bitio::{InputBitStream, OutputBitStream, corrupt};
use crate::error::Result;
use std::io::{Read, Write};

/// Distinct non-zero byte values present in `bytes`, sorted by descending
/// frequency. Ties break by order of first appearance (stable sort) — any
/// deterministic tie-break round-trips, since the decoder only ever needs
/// the alphabet the encoder wrote alongside the payload.
pub fn build_alphabet(bytes: &[u8]) -> Vec<u8> {
  let mut counts = [0usize; 256];
  let mut seen = [false; 256];
  let mut order = Vec::new();
  for &b in bytes {
    if b == 0 {
      continue;
    }
    counts[b as usize] += 1;
    if !seen[b as usize] {
      seen[b as usize] = true;
      order.push(b);
    }
  }
  order.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]));
  order
}

/// Bits needed to encode one non-zero symbol under the paired-walk grammar,
/// given it has already been matched against `alphabet` (caller supplies the
/// escape bit itself; this starts counting from the walk).
fn walk_cost_and_bits(b: u8, alphabet: &[u8]) -> (u64, WalkOutcome) {
  let n = alphabet.len();
  let mut idx = 0usize;
  loop {
    let pair_start = idx * 2;
    let remaining = n - pair_start;
    if remaining == 1 {
      return (0, WalkOutcome::Singleton);
    } else if remaining == 2 {
      let bit = if b == alphabet[pair_start] { 0 } else { 1 };
      return (1, WalkOutcome::LastPair(bit));
    } else if b == alphabet[pair_start] {
      return (2, WalkOutcome::FoundFirst);
    } else if b == alphabet[pair_start + 1] {
      return (2, WalkOutcome::FoundSecond);
    } else {
      idx += 1;
      continue;
    }
  }
}

enum WalkOutcome {
  Singleton,
  LastPair(u8),
  FoundFirst,
  FoundSecond,
}

/// Bits a single byte costs under the grammar (escape bit included).
fn symbol_cost(b: u8, alphabet: &[u8]) -> u64 {
  if b == 0 {
    return 1;
  }
  1 + skip_bits(b, alphabet) + walk_cost_and_bits(b, alphabet).0
}

/// Number of `1` skip bits emitted before the pair (or singleton) containing
/// `b` is reached.
fn skip_bits(b: u8, alphabet: &[u8]) -> u64 {
  let n = alphabet.len();
  let mut idx = 0usize;
  let mut skips = 0u64;
  loop {
    let pair_start = idx * 2;
    let remaining = n - pair_start;
    if remaining <= 2 {
      return skips;
    }
    if b == alphabet[pair_start] || b == alphabet[pair_start + 1] {
      return skips;
    }
    idx += 1;
    skips += 1;
  }
}

/// Predicted total bit length for `bytes` under `alphabet`, per spec.md's
/// "emitted bit length equals predicted length" invariant.
pub fn predicted_bit_length(bytes: &[u8], alphabet: &[u8]) -> u64 {
  bytes.iter().map(|&b| symbol_cost(b, alphabet)).sum()
}

fn encode_symbol<W: Write>(b: u8, alphabet: &[u8], out: &mut OutputBitStream<W>) -> Result<u64> {
  if b == 0 {
    out.put(0)?;
    return Ok(1);
  }
  out.put(1)?;
  let mut bits = 1u64;
  let n = alphabet.len();
  let mut idx = 0usize;
  loop {
    let pair_start = idx * 2;
    let remaining = n - pair_start;
    if remaining == 1 {
      return Ok(bits);
    } else if remaining == 2 {
      out.put(if b == alphabet[pair_start] { 0 } else { 1 })?;
      return Ok(bits + 1);
    } else if b == alphabet[pair_start] {
      out.put(0)?;
      out.put(0)?;
      return Ok(bits + 2);
    } else if b == alphabet[pair_start + 1] {
      out.put(0)?;
      out.put(1)?;
      return Ok(bits + 2);
    } else {
      out.put(1)?;
      bits += 1;
      idx += 1;
    }
  }
}

fn decode_symbol<R: Read>(input: &mut InputBitStream<R>, alphabet: &[u8]) -> Result<(u8, u64)> {
  let escape = input.get()?;
  if escape == 0 {
    return Ok((0, 1));
  }
  let n = alphabet.len();
  if n == 0 {
    return Err(corrupt("non-zero escape bit with an empty alphabet"));
  }
  let mut bits = 1u64;
  let mut idx = 0usize;
  loop {
    let pair_start = idx * 2;
    let remaining = n - pair_start;
    if remaining == 1 {
      return Ok((alphabet[pair_start], bits));
    } else if remaining == 2 {
      let bit = input.get()?;
      bits += 1;
      return Ok((alphabet[pair_start + bit as usize], bits));
    } else {
      let marker = input.get()?;
      bits += 1;
      if marker == 0 {
        let pos = input.get()?;
        bits += 1;
        return Ok((alphabet[pair_start + pos as usize], bits));
      }
      idx += 1;
    }
  }
}

/// Encode `bytes` into `sink` using MaxFOG's bit grammar. Returns the
/// frequency-sorted alphabet and the total number of bits emitted (the
/// value the caller stores as `encoded_bit_count`). The bitstream itself is
/// flushed into `sink` before returning.
pub fn encode<W: Write>(bytes: &[u8], sink: W) -> Result<(Vec<u8>, u64, W)> {
  let alphabet = build_alphabet(bytes);
  let mut out = OutputBitStream::new(65536, sink);
  let mut bits = 0u64;
  for &b in bytes {
    bits += encode_symbol(b, &alphabet, &mut out)?;
  }
  let sink = out.finish()?;
  Ok((alphabet, bits, sink))
}

/// Decode exactly `out_len` bytes from `source`, consuming exactly
/// `bit_count` bits under the given alphabet. Fails with `CorruptPayload` if
/// the grammar is violated or the stream disagrees with `bit_count`.
pub fn decode<R: Read>(source: R, alphabet: &[u8], bit_count: u64, out_len: usize) -> Result<Vec<u8>> {
  let mut input = InputBitStream::new(65536, source);
  let mut out = Vec::with_capacity(out_len);
  let mut consumed = 0u64;
  for _ in 0..out_len {
    let (b, bits) = decode_symbol(&mut input, alphabet)?;
    out.push(b);
    consumed += bits;
  }
  if consumed != bit_count {
    return Err(corrupt(format!("expected {bit_count} encoded bits, consumed {consumed}")));
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trip_arbitrary() {
    let bytes: Vec<u8> = (0..2000u32).map(|i| ((i * 91 + 13) % 251) as u8).collect();
    let mut sink = Vec::new();
    let alphabet = {
      let (a, bits, s) = encode(&bytes, std::io::Cursor::new(&mut sink)).unwrap();
      assert_eq!(bits, predicted_bit_length(&bytes, &a));
      let _ = s;
      a
    };
    let decoded = decode(std::io::Cursor::new(&sink), &alphabet, predicted_bit_length(&bytes, &alphabet), bytes.len()).unwrap();
    assert_eq!(decoded, bytes);
  }

  #[test]
  fn s3_all_zero() {
    let bytes = [0u8, 0, 0, 0];
    let mut sink = Vec::new();
    let (alphabet, bits, _) = encode(&bytes, std::io::Cursor::new(&mut sink)).unwrap();
    assert!(alphabet.is_empty());
    assert_eq!(bits, 4);
    assert_eq!(sink, vec![0u8]);
  }

  #[test]
  fn s4_two_symbol() {
    let bytes = [0u8, 7, 0, 7, 7];
    let mut sink = Vec::new();
    let (alphabet, bits, _) = encode(&bytes, std::io::Cursor::new(&mut sink)).unwrap();
    assert_eq!(alphabet, vec![7]);
    assert_eq!(bits, 5);
    // bits: 0 1 0 1 1 -> MSB-first in one byte: 01011xxx = 0x58
    assert_eq!(sink[0], 0x58);
  }

  #[test]
  fn single_symbol_one_bit_each() {
    let bytes = [9u8, 9, 9];
    let mut sink = Vec::new();
    let (alphabet, bits, _) = encode(&bytes, std::io::Cursor::new(&mut sink)).unwrap();
    assert_eq!(alphabet, vec![9]);
    assert_eq!(bits, 3);
  }

  #[test]
  fn corrupt_payload_on_bit_count_mismatch() {
    let bytes = [0u8, 7, 0, 7, 7];
    let mut sink = Vec::new();
    let (alphabet, _bits, _) = encode(&bytes, std::io::Cursor::new(&mut sink)).unwrap();
    let result = decode(std::io::Cursor::new(&sink), &alphabet, 999, bytes.len());
    assert!(result.is_err());
  }
}
