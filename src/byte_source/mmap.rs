use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::byte_source::ByteStream;
use crate::errors::DeltaResult;

/// Memory-mapped `ByteSource`. The mapping is held behind an `Arc` so
/// slices share one mapping and the map is released (per design note §9)
/// once the last reference drops on any exit path.
pub struct MmapByteSource {
  map: Arc<Mmap>,
  offset: u64,
  length: u64,
}

impl MmapByteSource {
  pub fn open(path: &Path) -> DeltaResult<Self> {
    let file = std::fs::File::open(path)?;
    // Safety: the mapping is read-only and this crate does not assume the
    // backing file is free of concurrent external mutation; a mutation
    // during the run can only corrupt the patch it produces, not this
    // process, which matches the spec's "randomly addressable" contract.
    let map = unsafe { Mmap::map(&file)? };
    let length = map.len() as u64;
    Ok(MmapByteSource {
      map: Arc::new(map),
      offset: 0,
      length,
    })
  }

  pub fn length(&self) -> u64 {
    self.length
  }

  pub fn slice(&self, offset: u64, len: u64) -> Self {
    MmapByteSource {
      map: Arc::clone(&self.map),
      offset: self.offset + offset,
      length: len,
    }
  }

  pub fn as_slice(&self) -> &[u8] {
    let start = self.offset as usize;
    let end = start + self.length as usize;
    &self.map[start..end]
  }

  pub fn open_stream(&self) -> DeltaResult<ByteStream> {
    Ok(Box::new(Cursor::new(self.as_slice().to_vec())))
  }
}
