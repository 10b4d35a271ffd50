//! Top-level patch container: pairs entries, plans, executes, generates
//! one `DeltaEntry`, and serializes the framed patch (spec.md §6, §4.8).

use crate::byte_source::ByteSource;
use crate::cancel::CancellationToken;
use crate::config::PatchOptions;
use crate::delta::{BsdiffGenerator, DeltaEntry, DeltaGenerator, FileByFileGenerator};
use crate::errors::DeltaResult;
use crate::plan::{self, DeltaFormat, PreDiffPlanEntry, RecompressionLimiter, UncompressionOption};
use crate::range::Range;
use crate::zip::ZipEntry;

pub const MAGIC: &[u8; 8] = b"GFbFv1_0";

/// Builds and serializes a patch transforming `old_source` into
/// `new_source`, given each archive's already-enumerated entry list.
/// `depth` is the current FILE_BY_FILE recursion depth (0 at the
/// top level); recursion stops once `options.max_embedded_recursion_depth`
/// is reached, falling back to a flat bsdiff over the outer blobs.
pub fn generate_patch(
  old_source: &ByteSource,
  new_source: &ByteSource,
  old_entries: &[ZipEntry],
  new_entries: &[ZipEntry],
  options: &PatchOptions,
  token: &CancellationToken,
  depth: u32,
) -> DeltaResult<Vec<u8>> {
  let limiter = options
    .total_recompression_limit_bytes
    .map(|limit_bytes| RecompressionLimiter { limit_bytes });

  let plan = plan::build_plan(old_source, new_source, old_entries, new_entries, limiter)?;
  let execution = plan::execute(
    &plan,
    old_source,
    new_source,
    options.temp_blob_threshold_bytes,
    token,
  )?;

  let old_blob = execution.old_delta_friendly.as_byte_source()?;
  let new_blob = execution.new_delta_friendly.as_byte_source()?;

  let use_file_by_file = depth < options.max_embedded_recursion_depth
    && plan.entries.len() == 1
    && plan.entries[0].delta_format == DeltaFormat::FileByFile;

  let delta_entries = if use_file_by_file {
    generate_file_by_file_entries(
      &plan.entries[0],
      &plan,
      &execution,
      &old_blob,
      &new_blob,
      options,
      token,
      depth,
    )?
  } else {
    let generator = BsdiffGenerator {
      options: options.bsdiff_options(),
    };
    vec![DeltaEntry {
      delta_format: DeltaFormat::Bsdiff,
      old_blob_range: Range::new(0, old_blob.length()),
      new_blob_range: Range::new(0, new_blob.length()),
      delta_bytes: generator.generate(&old_blob, &new_blob, token)?,
    }]
  };

  Ok(serialize(
    old_blob.length(),
    &plan.old_uncompression_ranges,
    &execution.new_recompression_ranges,
    &delta_entries,
  ))
}

/// Builds the DeltaEntry segments for a single-entry FILE_BY_FILE plan:
/// an optional leading bsdiff segment over the bytes before the embedded
/// entry's payload, the nested patch over the embedded entry's own
/// (old, new) payload range, and an optional trailing bsdiff segment. The
/// entry's `new_blob_range`s concatenate to cover the whole new
/// delta-friendly blob (spec.md §3), and the nested generator only ever
/// sees the isolated embedded archive bytes, not the surrounding outer
/// archive (spec.md §4.7).
fn generate_file_by_file_entries(
  entry: &PreDiffPlanEntry,
  plan: &plan::PreDiffPlan,
  execution: &plan::ExecutionResult,
  old_blob: &ByteSource,
  new_blob: &ByteSource,
  options: &PatchOptions,
  token: &CancellationToken,
  depth: u32,
) -> DeltaResult<Vec<DeltaEntry>> {
  let old_entry = entry.old.as_ref().expect("FILE_BY_FILE entry always has an old side");
  let new_entry = entry.new.as_ref().expect("FILE_BY_FILE entry always has a new side");

  let old_start = execution.translate_old_offset(plan, old_entry.compressed_data_range.offset);
  let old_len = if matches!(entry.uncompression_option, UncompressionOption::Old | UncompressionOption::Both) {
    old_entry.uncompressed_size
  } else {
    old_entry.compressed_size
  };
  let new_start = execution.translate_new_offset(plan, new_entry.compressed_data_range.offset);
  let new_len = if matches!(entry.uncompression_option, UncompressionOption::New | UncompressionOption::Both) {
    new_entry.uncompressed_size
  } else {
    new_entry.compressed_size
  };

  let bsdiff_options = options.bsdiff_options();
  let mut out = Vec::with_capacity(3);

  if old_start > 0 || new_start > 0 {
    let generator = BsdiffGenerator { options: bsdiff_options };
    out.push(DeltaEntry {
      delta_format: DeltaFormat::Bsdiff,
      old_blob_range: Range::new(0, old_start),
      new_blob_range: Range::new(0, new_start),
      delta_bytes: generator.generate(&old_blob.slice(0, old_start), &new_blob.slice(0, new_start), token)?,
    });
  }

  let isolated_old = old_blob.slice(old_start, old_len);
  let isolated_new = new_blob.slice(new_start, new_len);
  let nested_generator = FileByFileGenerator { options, depth };
  out.push(DeltaEntry {
    delta_format: DeltaFormat::FileByFile,
    old_blob_range: Range::new(old_start, old_len),
    new_blob_range: Range::new(new_start, new_len),
    delta_bytes: nested_generator.generate(&isolated_old, &isolated_new, token)?,
  });

  let old_tail_start = old_start + old_len;
  let new_tail_start = new_start + new_len;
  if old_tail_start < old_blob.length() || new_tail_start < new_blob.length() {
    let old_tail_len = old_blob.length() - old_tail_start;
    let new_tail_len = new_blob.length() - new_tail_start;
    let generator = BsdiffGenerator { options: bsdiff_options };
    out.push(DeltaEntry {
      delta_format: DeltaFormat::Bsdiff,
      old_blob_range: Range::new(old_tail_start, old_tail_len),
      new_blob_range: Range::new(new_tail_start, new_tail_len),
      delta_bytes: generator.generate(
        &old_blob.slice(old_tail_start, old_tail_len),
        &new_blob.slice(new_tail_start, new_tail_len),
        token,
      )?,
    });
  }

  Ok(out)
}

fn serialize(
  old_delta_friendly_size: u64,
  old_uncompression_ranges: &[Range],
  new_recompression_ranges: &[crate::range::TypedRange<crate::deflate::DeflateParameters>],
  delta_entries: &[DeltaEntry],
) -> Vec<u8> {
  let mut out = Vec::new();
  out.extend_from_slice(MAGIC);
  out.extend_from_slice(&0i32.to_be_bytes()); // flags, reserved
  out.extend_from_slice(&(old_delta_friendly_size as i64).to_be_bytes());

  out.extend_from_slice(&(old_uncompression_ranges.len() as i32).to_be_bytes());
  for r in old_uncompression_ranges {
    out.extend_from_slice(&(r.offset as i64).to_be_bytes());
    out.extend_from_slice(&(r.length as i64).to_be_bytes());
  }

  out.extend_from_slice(&(new_recompression_ranges.len() as i32).to_be_bytes());
  for r in new_recompression_ranges {
    out.extend_from_slice(&(r.offset() as i64).to_be_bytes());
    out.extend_from_slice(&(r.range.length as i64).to_be_bytes());
    out.push(0u8); // compatibilityWindowId: 0 = default deflate
    out.push(r.metadata.level);
    out.push(r.metadata.strategy);
    out.push(r.metadata.nowrap as u8);
  }

  out.extend_from_slice(&(delta_entries.len() as i32).to_be_bytes());
  for e in delta_entries {
    out.push(match e.delta_format {
      DeltaFormat::Bsdiff => 0,
      DeltaFormat::FileByFile => 1,
    });
    out.extend_from_slice(&(e.old_blob_range.offset as i64).to_be_bytes());
    out.extend_from_slice(&(e.old_blob_range.length as i64).to_be_bytes());
    out.extend_from_slice(&(e.new_blob_range.offset as i64).to_be_bytes());
    out.extend_from_slice(&(e.new_blob_range.length as i64).to_be_bytes());
    out.extend_from_slice(&(e.delta_bytes.len() as i64).to_be_bytes());
    out.extend_from_slice(&e.delta_bytes);
  }

  out
}
