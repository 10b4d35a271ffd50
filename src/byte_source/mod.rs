//! Random-access views over bytes backed by memory, a memory-map, or a
//! file (spec.md §4.1). `ByteSource` is a capability set — `length`,
//! `slice`, `open_stream` — realized as a tagged variant so slices stay
//! cheap value types that borrow from the root, per DESIGN.md's note on
//! polymorphism over IO backends.

mod file;
mod memory;
mod mmap;

pub use file::FileByteSource;
pub use memory::MemoryByteSource;
pub use mmap::MmapByteSource;

use std::io::Read;
use std::sync::Arc;

use crate::errors::DeltaResult;

/// A forward-only reader over a `ByteSource` slice. Multiple independent
/// streams may be opened concurrently on the same source.
pub type ByteStream = Box<dyn Read + Send>;

/// Random-access view over a byte range. `length()` is O(1); `slice()`
/// never panics (out-of-range bounds are clamped to the source length).
/// Implementations must support multiple concurrent readers.
#[derive(Clone)]
pub enum ByteSource {
  Memory(MemoryByteSource),
  Mmap(Arc<MmapByteSource>),
  File(FileByteSource),
}

impl ByteSource {
  pub fn from_vec(bytes: Vec<u8>) -> Self {
    ByteSource::Memory(MemoryByteSource::new(bytes))
  }

  pub fn from_static(bytes: &'static [u8]) -> Self {
    ByteSource::Memory(MemoryByteSource::from_slice(bytes))
  }

  pub fn open_mmap(path: &std::path::Path) -> DeltaResult<Self> {
    Ok(ByteSource::Mmap(Arc::new(MmapByteSource::open(path)?)))
  }

  pub fn open_file(path: &std::path::Path) -> DeltaResult<Self> {
    Ok(ByteSource::File(FileByteSource::open(path)?))
  }

  pub fn length(&self) -> u64 {
    match self {
      ByteSource::Memory(m) => m.length(),
      ByteSource::Mmap(m) => m.length(),
      ByteSource::File(f) => f.length(),
    }
  }

  /// Returns a sub-view. Bounds are clamped to `[0, length())`; this never
  /// panics, matching the spec's "bounds clamped... never panicking".
  pub fn slice(&self, offset: u64, len: u64) -> ByteSource {
    let total = self.length();
    let clamped_offset = offset.min(total);
    let clamped_len = len.min(total - clamped_offset);
    match self {
      ByteSource::Memory(m) => ByteSource::Memory(m.slice(clamped_offset, clamped_len)),
      ByteSource::Mmap(m) => ByteSource::Mmap(Arc::new(m.slice(clamped_offset, clamped_len))),
      ByteSource::File(f) => ByteSource::File(f.slice(clamped_offset, clamped_len)),
    }
  }

  /// Materializes the whole view into memory. Used by small reads
  /// (headers, central directories); large payloads should prefer
  /// `open_stream`.
  pub fn read_to_vec(&self) -> DeltaResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(self.length() as usize);
    self.open_stream()?.read_to_end(&mut buf)?;
    Ok(buf)
  }

  /// Opens a forward-only stream over this view.
  pub fn open_stream(&self) -> DeltaResult<ByteStream> {
    match self {
      ByteSource::Memory(m) => m.open_stream(),
      ByteSource::Mmap(m) => m.open_stream(),
      ByteSource::File(f) => f.open_stream(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slice_clamps_out_of_range() {
    let src = ByteSource::from_vec(vec![1, 2, 3, 4, 5]);
    let sliced = src.slice(3, 100);
    assert_eq!(sliced.length(), 2);
    assert_eq!(sliced.read_to_vec().unwrap(), vec![4, 5]);
  }

  #[test]
  fn slice_of_slice_does_not_close_parent() {
    let src = ByteSource::from_vec(vec![1, 2, 3, 4, 5]);
    let child = src.slice(1, 3);
    drop(child.open_stream().unwrap());
    // parent is still fully readable after a child slice is dropped
    assert_eq!(src.read_to_vec().unwrap(), vec![1, 2, 3, 4, 5]);
  }

  #[test]
  fn multiple_concurrent_readers() {
    let src = ByteSource::from_vec(vec![1, 2, 3]);
    let mut a = src.open_stream().unwrap();
    let mut b = src.open_stream().unwrap();
    let mut buf_a = Vec::new();
    let mut buf_b = Vec::new();
    a.read_to_end(&mut buf_a).unwrap();
    b.read_to_end(&mut buf_b).unwrap();
    assert_eq!(buf_a, buf_b);
  }

  #[test]
  fn offset_beyond_length_yields_empty() {
    let src = ByteSource::from_vec(vec![1, 2, 3]);
    let sliced = src.slice(10, 5);
    assert_eq!(sliced.length(), 0);
  }
}
