//! Injected allocator seam for image/shadow buffer construction.
//!
//! The original implementation threads raw `alloc(size) -> *mut u8` /
//! `dealloc(*mut u8)` function pointers through every buffer-owning type.
//! Idiomatic Rust prefers a trait object at the same seam (cf.
//! `Array2D::zeroed`, which already hides its allocation behind `bytemuck`
//! rather than a raw function pointer) — deallocation then falls out of
//! `Drop` instead of needing to be threaded back through.

use crate::error::{OwlVisionError, Result};

/// A source of zeroed byte buffers, swappable for tests or custom arenas.
///
/// Fallible so that bounded arenas (test doubles, fixed-size pools) can
/// reject an oversized request with `AllocationError` instead of the caller
/// having to trust an infallible signature it can't honor.
pub trait ByteAllocator {
  fn alloc(&self, size: usize) -> Result<Box<[u8]>>;
}

/// Default allocator backed by the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl ByteAllocator for SystemAllocator {
  fn alloc(&self, size: usize) -> Result<Box<[u8]>> {
    Ok(vec![0u8; size].into_boxed_slice())
  }
}

/// Allocator that rejects any request over a fixed byte budget; used to
/// exercise the `AllocationError` path without needing to exhaust real memory.
#[derive(Debug, Clone, Copy)]
pub struct BoundedAllocator {
  pub max_bytes: usize,
}

impl ByteAllocator for BoundedAllocator {
  fn alloc(&self, size: usize) -> Result<Box<[u8]>> {
    if size > self.max_bytes {
      return Err(OwlVisionError::AllocationError(format!(
        "requested {size} bytes exceeds bound of {}",
        self.max_bytes
      )));
    }
    Ok(vec![0u8; size].into_boxed_slice())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn system_allocator_returns_zeroed_buffer_of_requested_size() {
    let buf = SystemAllocator.alloc(16).unwrap();
    assert_eq!(buf.len(), 16);
    assert!(buf.iter().all(|&b| b == 0));
  }

  #[test]
  fn bounded_allocator_rejects_oversized_request() {
    let bounded = BoundedAllocator { max_bytes: 8 };
    assert!(bounded.alloc(8).is_ok());
    assert!(matches!(bounded.alloc(9), Err(OwlVisionError::AllocationError(_))));
  }
}
