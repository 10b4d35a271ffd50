//! Pairs entries across two archives, classifies each pair, and assembles
//! a `PreDiffPlan` (spec.md §4.6).

use std::collections::HashMap;

use crate::byte_source::ByteSource;
use crate::deflate::{self, DeflateParameters, DivinationResult};
use crate::errors::DeltaResult;
use crate::plan::entry::{
  explanation, format_explanation, DeltaFormat, PreDiffPlanEntry, UncompressionOption,
};
use crate::range::{is_strictly_ordered_and_disjoint, typed_ranges_as_plain, Range, TypedRange};
use crate::zip::{CentralDirectoryReader, ZipEntry, ZipReader};

#[derive(Clone, Debug, Default)]
pub struct PreDiffPlan {
  pub old_uncompression_ranges: Vec<Range>,
  pub new_uncompression_ranges: Vec<TypedRange<DeflateParameters>>,
  /// Left empty by the planner; filled in by the executor once the
  /// delta-friendly blobs exist and output-side offsets are known
  /// (spec.md §4.7).
  pub new_recompression_ranges: Vec<TypedRange<DeflateParameters>>,
  pub entries: Vec<PreDiffPlanEntry>,
}

impl PreDiffPlan {
  pub fn is_well_ordered(&self) -> bool {
    is_strictly_ordered_and_disjoint(&self.old_uncompression_ranges)
      && is_strictly_ordered_and_disjoint(&typed_ranges_as_plain(&self.new_uncompression_ranges))
  }
}

/// Caps the total new-side recompression cost, downgrading the largest
/// would-be-recompressed entries to NEITHER once the budget is spent
/// (spec.md §4.6).
#[derive(Clone, Copy, Debug)]
pub struct RecompressionLimiter {
  pub limit_bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryState {
  Deflate,
  Stored,
  Unsuitable,
}

fn effective_state(e: &ZipEntry) -> EntryState {
  if e.is_unsuitable_method() {
    EntryState::Unsuitable
  } else if e.is_deflate_compressed() {
    EntryState::Deflate
  } else {
    EntryState::Stored
  }
}

fn read_range(source: &ByteSource, range: Range) -> DeltaResult<Vec<u8>> {
  source.slice(range.offset, range.length).read_to_vec()
}

/// Attempts to parse `bytes` as a nested ZIP/JAR/APK central directory.
fn try_parse_embedded(bytes: Vec<u8>) -> Option<Vec<ZipEntry>> {
  ZipReader::new(ByteSource::from_vec(bytes)).entries().ok()
}

fn uncompressed_bytes(source: &ByteSource, e: &ZipEntry) -> DeltaResult<Vec<u8>> {
  let compressed = read_range(source, e.compressed_data_range)?;
  if e.is_deflate_compressed() {
    Ok(deflate::decompress(&compressed, true)?)
  } else {
    Ok(compressed)
  }
}

/// Pairs `old_entries` with `new_entries` by filename bytes first, then by
/// uncompressed CRC-32 for entries not matched by name ("rename-as-same-
/// content"). A given old entry may be the source for more than one new
/// entry (clone-plus-recompress).
fn pair_entries<'a>(
  old_entries: &'a [ZipEntry],
  new_entries: &'a [ZipEntry],
) -> Vec<(Option<&'a ZipEntry>, &'a ZipEntry)> {
  let mut by_name: HashMap<&[u8], &ZipEntry> = HashMap::new();
  for e in old_entries {
    by_name.insert(e.filename_bytes.as_slice(), e);
  }

  let mut matched_old_names: std::collections::HashSet<&[u8]> = std::collections::HashSet::new();
  let mut pairs = Vec::with_capacity(new_entries.len());
  let mut unnamed_new = Vec::new();

  for new_entry in new_entries {
    if let Some(&old_entry) = by_name.get(new_entry.filename_bytes.as_slice()) {
      matched_old_names.insert(old_entry.filename_bytes.as_slice());
      pairs.push((Some(old_entry), new_entry));
    } else {
      unnamed_new.push(new_entry);
    }
  }

  if !unnamed_new.is_empty() {
    let mut by_crc: HashMap<u32, &ZipEntry> = HashMap::new();
    for e in old_entries {
      by_crc.entry(e.crc32).or_insert(e);
    }
    for new_entry in unnamed_new {
      let old_match = by_crc.get(&new_entry.crc32).copied();
      pairs.push((old_match, new_entry));
    }
  }

  pairs
}

/// Classifies one (old,new) pair and decides its uncompression option and
/// delta format, per the decision table in spec.md §4.6.
fn classify(
  old_source: &ByteSource,
  new_source: &ByteSource,
  old: Option<&ZipEntry>,
  new: &ZipEntry,
) -> DeltaResult<PreDiffPlanEntry> {
  let old = match old {
    None => {
      log::debug!(
        "{:?}: no old-side match, classified NEITHER/BSDIFF",
        String::from_utf8_lossy(&new.filename_bytes)
      );
      return Ok(PreDiffPlanEntry {
        old: None,
        new: Some(new.clone()),
        uncompression_option: UncompressionOption::Neither,
        uncompression_option_explanation: explanation::UNSUITABLE,
        delta_format: DeltaFormat::Bsdiff,
        delta_format_explanation: format_explanation::BSDIFF_DEFAULT,
      });
    }
    Some(old) => old,
  };

  let (option, option_explanation) = match (effective_state(old), effective_state(new)) {
    (EntryState::Unsuitable, _) | (_, EntryState::Unsuitable) => {
      (UncompressionOption::Neither, explanation::UNSUITABLE)
    }
    (EntryState::Deflate, EntryState::Deflate) => {
      let old_bytes = read_range(old_source, old.compressed_data_range)?;
      let new_bytes = read_range(new_source, new.compressed_data_range)?;
      if old_bytes == new_bytes {
        (UncompressionOption::Neither, explanation::COMPRESSED_BYTES_IDENTICAL)
      } else {
        match divine_new(new_source, new)? {
          Some(_) => (UncompressionOption::Both, explanation::COMPRESSED_BYTES_CHANGED),
          None => (UncompressionOption::Neither, explanation::DEFLATE_UNSUITABLE),
        }
      }
    }
    (EntryState::Deflate, EntryState::Stored) => {
      (UncompressionOption::Old, explanation::COMPRESSED_CHANGED_TO_UNCOMPRESSED)
    }
    (EntryState::Stored, EntryState::Deflate) => match divine_new(new_source, new)? {
      Some(_) => (UncompressionOption::New, explanation::UNCOMPRESSED_CHANGED_TO_COMPRESSED),
      None => (UncompressionOption::Neither, explanation::DEFLATE_UNSUITABLE),
    },
    (EntryState::Stored, EntryState::Stored) => {
      (UncompressionOption::Neither, explanation::BOTH_ENTRIES_UNCOMPRESSED)
    }
  };

  let (delta_format, delta_format_explanation) = {
    let old_bytes = uncompressed_bytes(old_source, old).ok();
    let new_bytes = uncompressed_bytes(new_source, new).ok();
    match (old_bytes.and_then(try_parse_embedded), new_bytes.and_then(try_parse_embedded)) {
      (Some(_), Some(_)) => (
        DeltaFormat::FileByFile,
        format_explanation::FILE_BY_FILE_EMBEDDED_ARCHIVE,
      ),
      _ => (DeltaFormat::Bsdiff, format_explanation::BSDIFF_DEFAULT),
    }
  };

  log::debug!(
    "{:?}: uncompression={:?} ({}), delta_format={:?} ({})",
    String::from_utf8_lossy(&new.filename_bytes),
    option,
    option_explanation,
    delta_format,
    delta_format_explanation
  );

  Ok(PreDiffPlanEntry {
    old: Some(old.clone()),
    new: Some(new.clone()),
    uncompression_option: option,
    uncompression_option_explanation: option_explanation,
    delta_format,
    delta_format_explanation,
  })
}

fn divine_new(new_source: &ByteSource, new: &ZipEntry) -> DeltaResult<Option<DeflateParameters>> {
  let compressed = read_range(new_source, new.compressed_data_range)?;
  let uncompressed = deflate::decompress(&compressed, true)?;
  match deflate::divine(&uncompressed, &compressed) {
    DivinationResult::Divined(p) => Ok(Some(p)),
    DivinationResult::NotDivinable => Ok(None),
  }
}

/// Builds the full plan: pairs entries, classifies each pair, applies an
/// optional recompression limiter, and assembles the ordered range lists.
pub fn build_plan(
  old_source: &ByteSource,
  new_source: &ByteSource,
  old_entries: &[ZipEntry],
  new_entries: &[ZipEntry],
  limiter: Option<RecompressionLimiter>,
) -> DeltaResult<PreDiffPlan> {
  let pairs = pair_entries(old_entries, new_entries);
  let mut entries = Vec::with_capacity(pairs.len());
  for (old, new) in pairs {
    entries.push(classify(old_source, new_source, old, new)?);
  }

  if let Some(limiter) = limiter {
    apply_recompression_limiter(&mut entries, limiter);
  }

  let mut old_ranges: Vec<Range> = Vec::new();
  let mut seen_old_offsets = std::collections::HashSet::new();
  let mut new_ranges: Vec<TypedRange<DeflateParameters>> = Vec::new();

  for e in &entries {
    if let Some(range) = e.old_uncompression_range() {
      if seen_old_offsets.insert(range.offset) {
        old_ranges.push(range);
      }
    }
    if matches!(
      e.uncompression_option,
      UncompressionOption::New | UncompressionOption::Both
    ) {
      if let Some(new_entry) = &e.new {
        if let Some(params) = divine_new(new_source, new_entry)? {
          new_ranges.push(TypedRange::new(new_entry.compressed_data_range, params));
        }
      }
    }
  }

  old_ranges.sort();
  new_ranges.sort_by_key(|r| r.offset());

  Ok(PreDiffPlan {
    old_uncompression_ranges: old_ranges,
    new_uncompression_ranges: new_ranges,
    new_recompression_ranges: Vec::new(),
    entries,
  })
}

/// Greedily accepts would-be-recompressed entries by descending cost
/// (`uncompressedSize - compressedSize`) until the budget is spent; a
/// rejected entry does not preempt smaller later candidates.
fn apply_recompression_limiter(entries: &mut [PreDiffPlanEntry], limiter: RecompressionLimiter) {
  let mut candidates: Vec<(usize, u64)> = entries
    .iter()
    .enumerate()
    .filter_map(|(i, e)| {
      if matches!(
        e.uncompression_option,
        UncompressionOption::New | UncompressionOption::Both
      ) {
        let new_entry = e.new.as_ref()?;
        let cost = new_entry
          .uncompressed_size
          .saturating_sub(new_entry.compressed_size);
        Some((i, cost))
      } else {
        None
      }
    })
    .collect();

  candidates.sort_by(|a, b| b.1.cmp(&a.1));

  let mut running_total = 0u64;
  for (idx, cost) in candidates {
    if running_total + cost <= limiter.limit_bytes {
      running_total += cost;
    } else {
      let name = entries[idx]
        .new
        .as_ref()
        .map(|e| String::from_utf8_lossy(&e.filename_bytes).into_owned())
        .unwrap_or_default();
      log::warn!(
        "{:?}: downgrading to RESOURCE_CONSTRAINED, cost {} would exceed limit {} (running total {})",
        name,
        cost,
        limiter.limit_bytes,
        running_total
      );
      entries[idx].uncompression_option = UncompressionOption::Neither;
      entries[idx].uncompression_option_explanation = explanation::RESOURCE_CONSTRAINED;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::zip::{FilenameEncoding, METHOD_DEFLATE, METHOD_STORED};

  fn entry(name: &[u8], method: u16, crc32: u32, comp: u64, uncomp: u64, offset: u64) -> ZipEntry {
    ZipEntry {
      compression_method: method,
      crc32,
      compressed_size: comp,
      uncompressed_size: uncomp,
      filename_bytes: name.to_vec(),
      filename_encoding: FilenameEncoding::Utf8,
      local_entry_range: Range::new(offset, 0),
      compressed_data_range: Range::new(offset, comp),
    }
  }

  #[test]
  fn identical_stored_entries_are_neither() {
    let old_src = ByteSource::from_vec(b"hello world".to_vec());
    let new_src = ByteSource::from_vec(b"hello world".to_vec());
    let old_entries = vec![entry(b"/x", METHOD_STORED, 1, 11, 11, 0)];
    let new_entries = vec![entry(b"/x", METHOD_STORED, 1, 11, 11, 0)];
    let plan = build_plan(&old_src, &new_src, &old_entries, &new_entries, None).unwrap();
    assert_eq!(plan.entries.len(), 1);
    assert_eq!(
      plan.entries[0].uncompression_option,
      UncompressionOption::Neither
    );
    assert_eq!(
      plan.entries[0].uncompression_option_explanation,
      explanation::BOTH_ENTRIES_UNCOMPRESSED
    );
    assert!(plan.old_uncompression_ranges.is_empty());
    assert!(plan.new_uncompression_ranges.is_empty());
  }

  #[test]
  fn rename_with_identical_compressed_bytes_is_identical() {
    let raw = b"payload-bytes-repeated-enough-to-actually-compress".repeat(4);
    let compressed = crate::deflate::compress_with(&raw, 6, true).unwrap();
    let old_src = ByteSource::from_vec(compressed.clone());
    let new_src = ByteSource::from_vec(compressed.clone());
    let old_entries = vec![entry(
      b"/a",
      METHOD_DEFLATE,
      77,
      compressed.len() as u64,
      raw.len() as u64,
      0,
    )];
    let new_entries = vec![entry(
      b"/b",
      METHOD_DEFLATE,
      77,
      compressed.len() as u64,
      raw.len() as u64,
      0,
    )];
    let plan = build_plan(&old_src, &new_src, &old_entries, &new_entries, None).unwrap();
    assert_eq!(plan.entries.len(), 1);
    assert!(plan.entries[0].old.is_some());
    assert_eq!(
      plan.entries[0].uncompression_option,
      UncompressionOption::Neither
    );
    assert_eq!(
      plan.entries[0].uncompression_option_explanation,
      explanation::COMPRESSED_BYTES_IDENTICAL
    );
    assert!(plan.old_uncompression_ranges.is_empty());
    assert!(plan.new_uncompression_ranges.is_empty());
  }

  #[test]
  fn deflate_level_change_plan_marks_both_sides_for_recompression() {
    let raw: Vec<u8> = (0..5000u32).map(|i| (i % 253) as u8).collect();
    let old_compressed = crate::deflate::compress_with(&raw, 9, true).unwrap();
    let new_compressed = crate::deflate::compress_with(&raw, 3, true).unwrap();
    let old_src = ByteSource::from_vec(old_compressed.clone());
    let new_src = ByteSource::from_vec(new_compressed.clone());
    let old_entries = vec![entry(
      b"/x",
      METHOD_DEFLATE,
      1,
      old_compressed.len() as u64,
      raw.len() as u64,
      0,
    )];
    let new_entries = vec![entry(
      b"/x",
      METHOD_DEFLATE,
      2,
      new_compressed.len() as u64,
      raw.len() as u64,
      0,
    )];
    let plan = build_plan(&old_src, &new_src, &old_entries, &new_entries, None).unwrap();
    assert_eq!(plan.entries.len(), 1);
    assert_eq!(plan.entries[0].uncompression_option, UncompressionOption::Both);
    assert_eq!(
      plan.entries[0].uncompression_option_explanation,
      explanation::COMPRESSED_BYTES_CHANGED
    );
    assert_eq!(plan.old_uncompression_ranges.len(), 1);
    assert_eq!(plan.new_uncompression_ranges.len(), 1);
    let params = &plan.new_uncompression_ranges[0].metadata;
    assert_eq!((params.level, params.strategy, params.nowrap), (3, 0, true));
  }

  #[test]
  fn unsuitable_method_downgrades_to_neither() {
    let old_src = ByteSource::from_vec(b"0123456789".to_vec());
    let new_src = ByteSource::from_vec(b"9876543210".to_vec());
    let old_entries = vec![entry(b"/x", 7, 1, 10, 10, 0)];
    let new_entries = vec![entry(b"/x", 7, 2, 10, 10, 0)];
    let plan = build_plan(&old_src, &new_src, &old_entries, &new_entries, None).unwrap();
    assert_eq!(
      plan.entries[0].uncompression_option,
      UncompressionOption::Neither
    );
    assert_eq!(
      plan.entries[0].uncompression_option_explanation,
      explanation::UNSUITABLE
    );
  }

  #[test]
  fn limiter_downgrades_smaller_middle_candidates_first() {
    let mut entries = vec![
      PreDiffPlanEntry {
        old: Some(entry(b"/a", METHOD_STORED, 1, 1, 1, 0)),
        new: Some(entry(b"/a", METHOD_DEFLATE, 1, 1, 100_001, 0)),
        uncompression_option: UncompressionOption::New,
        uncompression_option_explanation: explanation::UNCOMPRESSED_CHANGED_TO_COMPRESSED,
        delta_format: DeltaFormat::Bsdiff,
        delta_format_explanation: format_explanation::BSDIFF_DEFAULT,
      },
      PreDiffPlanEntry {
        old: Some(entry(b"/b", METHOD_STORED, 2, 1, 200_001, 0)),
        new: Some(entry(b"/b", METHOD_DEFLATE, 2, 1, 200_001, 0)),
        uncompression_option: UncompressionOption::New,
        uncompression_option_explanation: explanation::UNCOMPRESSED_CHANGED_TO_COMPRESSED,
        delta_format: DeltaFormat::Bsdiff,
        delta_format_explanation: format_explanation::BSDIFF_DEFAULT,
      },
      PreDiffPlanEntry {
        old: Some(entry(b"/c", METHOD_STORED, 3, 1, 300_001, 0)),
        new: Some(entry(b"/c", METHOD_DEFLATE, 3, 1, 300_001, 0)),
        uncompression_option: UncompressionOption::New,
        uncompression_option_explanation: explanation::UNCOMPRESSED_CHANGED_TO_COMPRESSED,
        delta_format: DeltaFormat::Bsdiff,
        delta_format_explanation: format_explanation::BSDIFF_DEFAULT,
      },
      PreDiffPlanEntry {
        old: Some(entry(b"/d", METHOD_STORED, 4, 1, 400_001, 0)),
        new: Some(entry(b"/d", METHOD_DEFLATE, 4, 1, 400_001, 0)),
        uncompression_option: UncompressionOption::New,
        uncompression_option_explanation: explanation::UNCOMPRESSED_CHANGED_TO_COMPRESSED,
        delta_format: DeltaFormat::Bsdiff,
        delta_format_explanation: format_explanation::BSDIFF_DEFAULT,
      },
    ];
    apply_recompression_limiter(&mut entries, RecompressionLimiter { limit_bytes: 600_000 });
    assert_eq!(entries[0].uncompression_option, UncompressionOption::Neither);
    assert_eq!(entries[1].uncompression_option, UncompressionOption::New);
    assert_eq!(entries[2].uncompression_option, UncompressionOption::Neither);
    assert_eq!(entries[3].uncompression_option, UncompressionOption::New);
  }
}
