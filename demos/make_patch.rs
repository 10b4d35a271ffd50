//! Builds two tiny single-entry ZIP archives in memory, one deflated at a
//! lower level than the other, and writes the resulting patch to stdout's
//! byte count (not the bytes themselves, to keep terminal output sane).

use rand::{Rng, SeedableRng};

use zipdelta::{ByteSource, CancellationToken, CentralDirectoryReader, PatchOptions};

const LOCAL_SIG: u32 = 0x0403_4b50;
const CD_SIG: u32 = 0x0201_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;

fn build_single_entry_zip(name: &[u8], content: &[u8], level: u8) -> Vec<u8> {
  let compressed = {
    use std::io::Write;
    let mut encoder =
      flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(level as u32));
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
  };

  let mut crc = flate2::Crc::new();
  crc.update(content);
  let crc32 = crc.sum();

  let mut out = Vec::new();
  out.extend_from_slice(&LOCAL_SIG.to_le_bytes());
  out.extend_from_slice(&20u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&8u16.to_le_bytes()); // method: deflate
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&crc32.to_le_bytes());
  out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
  out.extend_from_slice(&(content.len() as u32).to_le_bytes());
  out.extend_from_slice(&(name.len() as u16).to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(name);
  out.extend_from_slice(&compressed);

  let cd_offset = out.len() as u32;
  out.extend_from_slice(&CD_SIG.to_le_bytes());
  out.extend_from_slice(&20u16.to_le_bytes());
  out.extend_from_slice(&20u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&8u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&crc32.to_le_bytes());
  out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
  out.extend_from_slice(&(content.len() as u32).to_le_bytes());
  out.extend_from_slice(&(name.len() as u16).to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u32.to_le_bytes());
  out.extend_from_slice(&0u32.to_le_bytes());
  out.extend_from_slice(name);
  let cd_size = out.len() as u32 - cd_offset;

  out.extend_from_slice(&EOCD_SIG.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());
  out.extend_from_slice(&1u16.to_le_bytes());
  out.extend_from_slice(&1u16.to_le_bytes());
  out.extend_from_slice(&cd_size.to_le_bytes());
  out.extend_from_slice(&cd_offset.to_le_bytes());
  out.extend_from_slice(&0u16.to_le_bytes());

  out
}

fn main() {
  env_logger::init();

  let mut rng = rand::rngs::StdRng::seed_from_u64(7);
  let content: Vec<u8> = (0..4000).map(|_| rng.gen()).collect();

  let old_archive = build_single_entry_zip(b"payload.bin", &content, 6);
  let new_archive = build_single_entry_zip(b"payload.bin", &content, 9);

  let old_source = ByteSource::from_vec(old_archive);
  let new_source = ByteSource::from_vec(new_archive);

  let old_entries = zipdelta::ZipReader::new(old_source.clone()).entries().unwrap();
  let new_entries = zipdelta::ZipReader::new(new_source.clone()).entries().unwrap();

  let options = PatchOptions::default();
  let token = CancellationToken::new();
  let patch = zipdelta::generate_patch(
    &old_source,
    &new_source,
    &old_entries,
    &new_entries,
    &options,
    &token,
    0,
  )
  .unwrap();

  log::info!(
    "old archive: {} bytes, new archive: {} bytes, patch: {} bytes",
    old_source.length(),
    new_source.length(),
    patch.len()
  );
  println!("patch size: {} bytes", patch.len());
}
