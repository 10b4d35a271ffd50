//! Infers the deflate parameters that would reproduce a given compressed
//! byte stream by exhaustive re-deflation (spec.md §4.5).
//!
//! `flate2` (used for deflate throughout this crate, following the
//! `keller-mark-blusc`/`JohnTheCoolingFan-mtzip` pack precedent) exposes
//! `level` and the raw-vs-zlib-wrapped (`nowrap`) axes uniformly across
//! backends, but not a portable `strategy` knob. The diviner therefore
//! varies `(nowrap, level)` and reports `strategy = 0` (or the strategy-2
//! canonical representative when canonicalization collapsed levels) on
//! the returned `DeflateParameters` — the equivalence-class bookkeeping in
//! `params.rs` is honored structurally even though this diviner cannot
//! itself distinguish a zlib-strategy-driven difference in output bytes.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::deflate::params::{canonical_try_order, DeflateParameters};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DivinationResult {
  Divined(DeflateParameters),
  NotDivinable,
}

/// Re-deflates `uncompressed` under every try-order parameter set until
/// one reproduces `observed_compressed` exactly.
pub fn divine(uncompressed: &[u8], observed_compressed: &[u8]) -> DivinationResult {
  let mut tried = std::collections::HashSet::new();
  for params in canonical_try_order() {
    if !tried.insert((params.level, params.nowrap)) {
      continue;
    }
    match compress_with(uncompressed, params.level, params.nowrap) {
      Ok(bytes) if bytes == observed_compressed => {
        return DivinationResult::Divined(params);
      }
      _ => {}
    }
  }
  DivinationResult::NotDivinable
}

/// Re-deflates `uncompressed` under a known parameter set (used by the
/// planner when recompressing during patch application, and by tests
/// exercising the divinability-equivalence property).
pub fn compress_with(data: &[u8], level: u8, nowrap: bool) -> std::io::Result<Vec<u8>> {
  let compression = Compression::new(level.clamp(1, 9) as u32);
  if nowrap {
    let mut encoder = DeflateEncoder::new(Vec::new(), compression);
    encoder.write_all(data)?;
    encoder.finish()
  } else {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), compression);
    encoder.write_all(data)?;
    encoder.finish()
  }
}

pub fn decompress(compressed: &[u8], nowrap: bool) -> std::io::Result<Vec<u8>> {
  let mut out = Vec::new();
  if nowrap {
    let mut decoder = flate2::read::DeflateDecoder::new(compressed);
    std::io::Read::read_to_end(&mut decoder, &mut out)?;
  } else {
    let mut decoder = flate2::read::ZlibDecoder::new(compressed);
    std::io::Read::read_to_end(&mut decoder, &mut out)?;
  }
  Ok(out)
}
