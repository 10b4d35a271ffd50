//! A reference `CentralDirectoryReader` implementation. ZIP
//! central-directory parsing proper is an external collaborator per
//! spec.md §1 ("treated as external collaborators, specified only where
//! the core consumes them"); this module exists so the planner has
//! something real to pair against in tests and in `demos/make_patch.rs`,
//! adapted from `hansmrtn-pulp-os/smol-epub/src/zip.rs`'s
//! `parse_eocd`/`parse_central_directory` walk (generalized from its
//! no_std fixed-capacity form to a plain heap-allocated `Vec`).

use crate::byte_source::ByteSource;
use crate::errors::{DeltaError, DeltaResult};
use crate::range::Range;
use crate::zip::entry::{FilenameEncoding, ZipEntry};

const EOCD_SIG: u32 = 0x0605_4b50;
const CD_SIG: u32 = 0x0201_4b50;
const LOCAL_SIG: u32 = 0x0403_4b50;
const LANGUAGE_ENCODING_FLAG: u16 = 0x0800;

/// Anything that can enumerate an archive's entries. The planner is
/// written against this trait, not against any concrete ZIP parser.
pub trait CentralDirectoryReader {
  fn entries(&self) -> DeltaResult<Vec<ZipEntry>>;
}

/// Parses a full ZIP/JAR/APK byte source's central directory into
/// `ZipEntry` records.
pub struct ZipReader {
  source: ByteSource,
}

impl ZipReader {
  pub fn new(source: ByteSource) -> Self {
    ZipReader { source }
  }

  fn find_eocd(&self, bytes: &[u8]) -> DeltaResult<(u32, u32)> {
    if bytes.len() < 22 {
      return Err(DeltaError::corrupt_archive("archive too short for EOCD"));
    }
    let mut i = bytes.len() - 22;
    loop {
      if le_u32(bytes, i) == EOCD_SIG {
        break;
      }
      if i == 0 {
        return Err(DeltaError::corrupt_archive("EOCD signature not found"));
      }
      i -= 1;
    }
    let cd_size = le_u32(bytes, i + 12);
    let cd_offset = le_u32(bytes, i + 16);
    if (cd_offset as u64) + (cd_size as u64) > bytes.len() as u64 {
      return Err(DeltaError::corrupt_archive(
        "central directory extends past EOF",
      ));
    }
    Ok((cd_offset, cd_size))
  }
}

impl CentralDirectoryReader for ZipReader {
  fn entries(&self) -> DeltaResult<Vec<ZipEntry>> {
    let bytes = self.source.read_to_vec()?;
    let (cd_offset, cd_size) = self.find_eocd(&bytes)?;
    let cd = &bytes[cd_offset as usize..(cd_offset + cd_size) as usize];

    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos + 46 <= cd.len() {
      if le_u32(cd, pos) != CD_SIG {
        break;
      }

      let flags = le_u16(cd, pos + 8);
      let method = le_u16(cd, pos + 10);
      let crc32 = le_u32(cd, pos + 16);
      let comp_size = le_u32(cd, pos + 20) as u64;
      let uncomp_size = le_u32(cd, pos + 24) as u64;
      let name_len = le_u16(cd, pos + 28) as usize;
      let extra_len = le_u16(cd, pos + 30) as usize;
      let comment_len = le_u16(cd, pos + 32) as usize;
      let local_offset = le_u32(cd, pos + 42) as u64;

      let name_start = pos + 46;
      let entry_end = name_start + name_len + extra_len + comment_len;
      if entry_end > cd.len() {
        return Err(DeltaError::corrupt_archive(
          "central directory entry extends past its buffer",
        ));
      }
      let filename_bytes = cd[name_start..name_start + name_len].to_vec();
      let filename_encoding = if flags & LANGUAGE_ENCODING_FLAG != 0 {
        FilenameEncoding::Utf8
      } else {
        FilenameEncoding::Cp437
      };

      let local_entry_range = Range::new(local_offset, local_header_len(&bytes, local_offset)?);
      let compressed_data_range = Range::new(local_entry_range.end(), comp_size);

      out.push(ZipEntry {
        compression_method: method,
        crc32,
        compressed_size: comp_size,
        uncompressed_size: uncomp_size,
        filename_bytes,
        filename_encoding,
        local_entry_range,
        compressed_data_range,
      });

      pos = entry_end;
    }

    Ok(out)
  }
}

fn local_header_len(bytes: &[u8], local_offset: u64) -> DeltaResult<u64> {
  let start = local_offset as usize;
  if start + 30 > bytes.len() || le_u32(bytes, start) != LOCAL_SIG {
    return Err(DeltaError::corrupt_archive(
      "local file header signature mismatch",
    ));
  }
  let name_len = le_u16(bytes, start + 26) as u64;
  let extra_len = le_u16(bytes, start + 28) as u64;
  Ok(30 + name_len + extra_len)
}

fn le_u16(d: &[u8], o: usize) -> u16 {
  u16::from_le_bytes([d[o], d[o + 1]])
}

fn le_u32(d: &[u8], o: usize) -> u32 {
  u32::from_le_bytes([d[o], d[o + 1], d[o + 2], d[o + 3]])
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Builds a minimal single-entry stored ZIP by hand, the way a unit
  /// test for a ZIP parser has to when no `zip` crate is a dependency.
  fn build_stored_zip(name: &[u8], content: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let local_offset = 0u32;
    let mut crc_hasher = flate2::Crc::new();
    crc_hasher.update(content);
    let crc32 = crc_hasher.sum();

    // local file header
    out.extend_from_slice(&LOCAL_SIG.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes()); // version needed
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&0u16.to_le_bytes()); // method: stored
    out.extend_from_slice(&0u16.to_le_bytes()); // mod time
    out.extend_from_slice(&0u16.to_le_bytes()); // mod date
    out.extend_from_slice(&crc32.to_le_bytes());
    out.extend_from_slice(&(content.len() as u32).to_le_bytes()); // comp size
    out.extend_from_slice(&(content.len() as u32).to_le_bytes()); // uncomp size
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extra len
    out.extend_from_slice(name);
    out.extend_from_slice(content);

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&CD_SIG.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes()); // version made by
    out.extend_from_slice(&20u16.to_le_bytes()); // version needed
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&0u16.to_le_bytes()); // method
    out.extend_from_slice(&0u16.to_le_bytes()); // mod time
    out.extend_from_slice(&0u16.to_le_bytes()); // mod date
    out.extend_from_slice(&crc32.to_le_bytes());
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extra len
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
    out.extend_from_slice(&0u32.to_le_bytes()); // external attrs
    out.extend_from_slice(&local_offset.to_le_bytes());
    out.extend_from_slice(name);
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(&EOCD_SIG.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // disk with CD
    out.extend_from_slice(&1u16.to_le_bytes()); // entries on this disk
    out.extend_from_slice(&1u16.to_le_bytes()); // total entries
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len

    out
  }

  #[test]
  fn parses_a_single_stored_entry() {
    let bytes = build_stored_zip(b"hello.txt", b"hello world");
    let reader = ZipReader::new(ByteSource::from_vec(bytes));
    let entries = reader.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].filename_bytes, b"hello.txt");
    assert!(entries[0].is_stored());
    assert_eq!(entries[0].uncompressed_size, 11);
  }

  #[test]
  fn rejects_missing_eocd() {
    let reader = ZipReader::new(ByteSource::from_vec(vec![0u8; 10]));
    assert!(reader.entries().is_err());
  }
}
