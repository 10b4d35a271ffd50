use std::io::Cursor;
use std::sync::Arc;

use crate::byte_source::ByteStream;
use crate::errors::DeltaResult;

/// In-memory backed `ByteSource`. Cheap to slice and clone: the backing
/// bytes are reference-counted, slices just narrow the window.
#[derive(Clone)]
pub struct MemoryByteSource {
  bytes: Arc<[u8]>,
  offset: u64,
  length: u64,
}

impl MemoryByteSource {
  pub fn new(bytes: Vec<u8>) -> Self {
    let length = bytes.len() as u64;
    MemoryByteSource {
      bytes: Arc::from(bytes.into_boxed_slice()),
      offset: 0,
      length,
    }
  }

  pub fn from_slice(bytes: &[u8]) -> Self {
    Self::new(bytes.to_vec())
  }

  pub fn length(&self) -> u64 {
    self.length
  }

  pub fn slice(&self, offset: u64, len: u64) -> Self {
    MemoryByteSource {
      bytes: Arc::clone(&self.bytes),
      offset: self.offset + offset,
      length: len,
    }
  }

  pub fn as_slice(&self) -> &[u8] {
    let start = self.offset as usize;
    let end = start + self.length as usize;
    &self.bytes[start..end]
  }

  pub fn open_stream(&self) -> DeltaResult<ByteStream> {
    Ok(Box::new(Cursor::new(self.as_slice().to_vec())))
  }
}
