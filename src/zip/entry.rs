use crate::range::Range;

/// Compression method tag 8: deflate. `ZipEntry::is_deflate_compressed`
/// also requires `compressed_size != uncompressed_size`.
pub const METHOD_DEFLATE: u16 = 8;
/// Compression method tag 0: stored (no compression).
pub const METHOD_STORED: u16 = 0;

/// Whether an entry's raw filename bytes are UTF-8 or legacy code-page 437
/// (the two encodings the ZIP "language encoding" general-purpose bit
/// flag distinguishes between).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilenameEncoding {
  Utf8,
  Cp437,
}

/// The minimal immutable record extracted from each archive entry
/// (spec.md §3). Created once during enumeration, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZipEntry {
  pub compression_method: u16,
  pub crc32: u32,
  pub compressed_size: u64,
  pub uncompressed_size: u64,
  pub filename_bytes: Vec<u8>,
  pub filename_encoding: FilenameEncoding,
  pub local_entry_range: Range,
  pub compressed_data_range: Range,
}

impl ZipEntry {
  /// True iff compression method is 8 (deflate) **and** the compressed
  /// size differs from the uncompressed size (spec.md §3's exact
  /// definition — a deflate-tagged entry that happens to be stored at
  /// parity, e.g. truly incompressible input, does not count).
  pub fn is_deflate_compressed(&self) -> bool {
    self.compression_method == METHOD_DEFLATE && self.compressed_size != self.uncompressed_size
  }

  pub fn is_stored(&self) -> bool {
    self.compression_method == METHOD_STORED
  }

  /// True for any method this planner can't act on: not stored, and not
  /// "genuinely" deflate-compressed per `is_deflate_compressed`.
  pub fn is_unsuitable_method(&self) -> bool {
    !self.is_stored() && !self.is_deflate_compressed() && self.compression_method != METHOD_DEFLATE
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(method: u16, comp: u64, uncomp: u64) -> ZipEntry {
    ZipEntry {
      compression_method: method,
      crc32: 0,
      compressed_size: comp,
      uncompressed_size: uncomp,
      filename_bytes: b"x".to_vec(),
      filename_encoding: FilenameEncoding::Utf8,
      local_entry_range: Range::new(0, 0),
      compressed_data_range: Range::new(0, 0),
    }
  }

  #[test]
  fn deflate_requires_size_mismatch() {
    assert!(entry(METHOD_DEFLATE, 10, 20).is_deflate_compressed());
    assert!(!entry(METHOD_DEFLATE, 20, 20).is_deflate_compressed());
  }

  #[test]
  fn stored_is_never_deflate() {
    assert!(entry(METHOD_STORED, 20, 20).is_stored());
    assert!(!entry(METHOD_STORED, 20, 20).is_deflate_compressed());
  }

  #[test]
  fn implode_is_unsuitable() {
    let e = entry(7, 15, 20);
    assert!(e.is_unsuitable_method());
  }
}
