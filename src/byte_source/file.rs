use std::fs::File;
use std::io::{Seek, SeekFrom, Take};
use std::path::Path;
use std::sync::Arc;

use crate::byte_source::ByteStream;
use crate::errors::DeltaResult;

/// File-backed `ByteSource` for inputs too large or inconvenient to map.
/// Opening a stream seeks a fresh handle to the window's start, so
/// concurrent readers never contend on a shared cursor.
#[derive(Clone)]
pub struct FileByteSource {
  file: Arc<File>,
  offset: u64,
  length: u64,
}

impl FileByteSource {
  pub fn open(path: &Path) -> DeltaResult<Self> {
    let file = File::open(path)?;
    let length = file.metadata()?.len();
    Ok(FileByteSource {
      file: Arc::new(file),
      offset: 0,
      length,
    })
  }

  pub fn length(&self) -> u64 {
    self.length
  }

  pub fn slice(&self, offset: u64, len: u64) -> Self {
    FileByteSource {
      file: Arc::clone(&self.file),
      offset: self.offset + offset,
      length: len,
    }
  }

  pub fn open_stream(&self) -> DeltaResult<ByteStream> {
    let mut handle = self.file.try_clone()?;
    handle.seek(SeekFrom::Start(self.offset))?;
    let reader: Take<File> = handle.take(self.length);
    Ok(Box::new(reader))
  }
}
