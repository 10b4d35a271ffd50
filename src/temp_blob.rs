//! Write-once/read-many staging area whose backing storage transparently
//! migrates from memory to a temp file once the write exceeds a
//! configurable threshold (spec.md §4.1). Used for delta-friendly blobs
//! and for capturing a `DeltaGenerator`'s output before its length is
//! known.

use std::io::{Read, Seek, SeekFrom, Write};

use tempfile::NamedTempFile;

use crate::byte_source::ByteSource;
use crate::errors::{DeltaError, DeltaResult};

enum Backing {
  Memory(Vec<u8>),
  File(NamedTempFile),
}

/// A `TempBlob` is either empty, has an open writer, or is finished and
/// readable. Opening a second writer, or calling `clear()` while a writer
/// is open, is a `PreconditionViolation`.
pub struct TempBlob {
  backing: Backing,
  threshold_bytes: u64,
  writer_open: bool,
}

impl TempBlob {
  pub fn new(threshold_bytes: u64) -> Self {
    TempBlob {
      backing: Backing::Memory(Vec::new()),
      threshold_bytes,
      writer_open: false,
    }
  }

  pub fn len(&self) -> DeltaResult<u64> {
    match &self.backing {
      Backing::Memory(v) => Ok(v.len() as u64),
      Backing::File(f) => Ok(f.as_file().metadata()?.len()),
    }
  }

  pub fn is_empty(&self) -> DeltaResult<bool> {
    Ok(self.len()? == 0)
  }

  /// Returns to in-memory state, dropping any prior contents. Fails while
  /// a writer is open.
  pub fn clear(&mut self) -> DeltaResult<()> {
    if self.writer_open {
      return Err(DeltaError::precondition_violation(
        "cannot clear a TempBlob while a writer is open",
      ));
    }
    self.backing = Backing::Memory(Vec::new());
    Ok(())
  }

  /// Opens a writer. Fails if one is already open (the write-once part of
  /// write-once/read-many).
  pub fn writer(&mut self) -> DeltaResult<TempBlobWriter<'_>> {
    if self.writer_open {
      return Err(DeltaError::precondition_violation(
        "a TempBlob writer is already open",
      ));
    }
    self.writer_open = true;
    Ok(TempBlobWriter { blob: self })
  }

  /// Opens a forward-only reader over the blob's full contents. Fails
  /// while a writer is open.
  pub fn reader(&self) -> DeltaResult<Box<dyn Read + '_>> {
    if self.writer_open {
      return Err(DeltaError::precondition_violation(
        "cannot open a reader on a TempBlob while a writer is open",
      ));
    }
    match &self.backing {
      Backing::Memory(v) => Ok(Box::new(std::io::Cursor::new(v.as_slice()))),
      Backing::File(f) => {
        let mut handle = f.reopen()?;
        handle.seek(SeekFrom::Start(0))?;
        Ok(Box::new(handle))
      }
    }
  }

  /// Materializes the blob as a `ByteSource`. For in-memory blobs this is
  /// a cheap copy into a `MemoryByteSource`; for file-backed blobs it maps
  /// the temp file.
  pub fn as_byte_source(&self) -> DeltaResult<ByteSource> {
    if self.writer_open {
      return Err(DeltaError::precondition_violation(
        "cannot read a TempBlob while a writer is open",
      ));
    }
    match &self.backing {
      Backing::Memory(v) => Ok(ByteSource::from_vec(v.clone())),
      Backing::File(f) => ByteSource::open_mmap(f.path()),
    }
  }

  fn migrate_to_file_if_needed(&mut self) -> DeltaResult<()> {
    if let Backing::Memory(v) = &self.backing {
      if v.len() as u64 > self.threshold_bytes {
        log::debug!(
          "TempBlob spilling {} bytes to disk (threshold {})",
          v.len(),
          self.threshold_bytes
        );
        let mut file = NamedTempFile::new().map_err(|e| DeltaError::io(e.to_string()))?;
        file.write_all(v)?;
        self.backing = Backing::File(file);
      }
    }
    Ok(())
  }
}

/// The single writer a `TempBlob` permits at a time. Dropping it without
/// an explicit `finish()` still leaves the blob's contents intact — only
/// the `writer_open` flag needs clearing, which `Drop` handles.
pub struct TempBlobWriter<'a> {
  blob: &'a mut TempBlob,
}

impl<'a> TempBlobWriter<'a> {
  pub fn write_all(&mut self, bytes: &[u8]) -> DeltaResult<()> {
    match &mut self.blob.backing {
      Backing::Memory(v) => v.extend_from_slice(bytes),
      Backing::File(f) => f.write_all(bytes)?,
    }
    self.blob.migrate_to_file_if_needed()
  }

  pub fn finish(self) -> DeltaResult<()> {
    // Drop handles clearing `writer_open`; this method exists so callers
    // can propagate a final flush error explicitly if one ever arises.
    Ok(())
  }
}

impl<'a> Drop for TempBlobWriter<'a> {
  fn drop(&mut self) {
    self.blob.writer_open = false;
  }
}
