//! Materializes the two delta-friendly blobs from a `PreDiffPlan`: copy
//! untouched bytes through, stream each uncompression range through the
//! deflate decoder, and (for the new side) record where each decompressed
//! span landed so the recompression plan can reinflate it exactly
//! (spec.md §4.7).

use crate::byte_source::ByteSource;
use crate::cancel::CancellationToken;
use crate::deflate::{self, DeflateParameters};
use crate::errors::DeltaResult;
use crate::plan::planner::PreDiffPlan;
use crate::range::{Range, TypedRange};
use crate::temp_blob::TempBlob;

pub struct ExecutionResult {
  pub old_delta_friendly: TempBlob,
  pub new_delta_friendly: TempBlob,
  /// Output-side positions of each `old_uncompression_ranges` entry,
  /// parallel to that list, so callers can translate an old-archive
  /// offset into its position in `old_delta_friendly` (spec.md §4.7).
  pub old_uncompression_output_ranges: Vec<Range>,
  /// Output-side ranges and the parameters needed to recompress each back
  /// to the observed deflate bytes, completing the plan's third range list.
  pub new_recompression_ranges: Vec<TypedRange<DeflateParameters>>,
}

impl ExecutionResult {
  /// Translates a byte offset in the old archive into the corresponding
  /// offset in `old_delta_friendly`. `offset` must be a range boundary:
  /// either an uncompression range's start (e.g. an entry's
  /// `compressed_data_range.offset`) or a position never touched by any
  /// uncompression range.
  pub fn translate_old_offset(&self, plan: &PreDiffPlan, offset: u64) -> u64 {
    translate_offset(&plan.old_uncompression_ranges, &self.old_uncompression_output_ranges, offset)
  }

  /// Translates a byte offset in the new archive into the corresponding
  /// offset in `new_delta_friendly`.
  pub fn translate_new_offset(&self, plan: &PreDiffPlan, offset: u64) -> u64 {
    let source_ranges: Vec<Range> = plan.new_uncompression_ranges.iter().map(|r| r.range).collect();
    let output_ranges: Vec<Range> = self.new_recompression_ranges.iter().map(|r| r.range).collect();
    translate_offset(&source_ranges, &output_ranges, offset)
  }
}

/// Maps a source-side offset to its delta-friendly-blob offset given the
/// (parallel, ascending) lists of transformed source ranges and the
/// output ranges they landed at. An offset inside a pass-through gap is
/// shifted by the cumulative length delta of every transform strictly
/// before it; an offset exactly at a transformed range's start resolves
/// directly to that range's output start.
fn translate_offset(source_ranges: &[Range], output_ranges: &[Range], offset: u64) -> u64 {
  let mut cumulative_delta: i64 = 0;
  for (src, out) in source_ranges.iter().zip(output_ranges.iter()) {
    if src.offset == offset {
      return out.offset;
    }
    if src.offset > offset {
      break;
    }
    cumulative_delta += out.length as i64 - src.length as i64;
  }
  (offset as i64 + cumulative_delta) as u64
}

/// Runs the plan against the two archive sources, producing delta-friendly
/// blobs and the new-side recompression ranges.
pub fn execute(
  plan: &PreDiffPlan,
  old_source: &ByteSource,
  new_source: &ByteSource,
  temp_blob_threshold_bytes: u64,
  token: &CancellationToken,
) -> DeltaResult<ExecutionResult> {
  let (old_delta_friendly, old_uncompression_output_ranges) = materialize_old(
    old_source,
    &plan.old_uncompression_ranges,
    temp_blob_threshold_bytes,
    token,
  )?;
  let (new_delta_friendly, new_recompression_ranges) = materialize_new(
    new_source,
    &plan.new_uncompression_ranges,
    temp_blob_threshold_bytes,
    token,
  )?;
  Ok(ExecutionResult {
    old_delta_friendly,
    new_delta_friendly,
    old_uncompression_output_ranges,
    new_recompression_ranges,
  })
}

fn materialize_old(
  source: &ByteSource,
  ranges: &[Range],
  threshold_bytes: u64,
  token: &CancellationToken,
) -> DeltaResult<(TempBlob, Vec<Range>)> {
  let mut blob = TempBlob::new(threshold_bytes);
  let total_len = source.length();
  let mut cursor = 0u64;
  let mut out_pos = 0u64;
  let mut output_ranges = Vec::with_capacity(ranges.len());
  {
    let mut writer = blob.writer()?;
    for range in ranges {
      token.check()?;
      if range.offset > cursor {
        let gap_len = range.offset - cursor;
        writer.write_all(&source.slice(cursor, gap_len).read_to_vec()?)?;
        out_pos += gap_len;
      }
      let compressed = source.slice(range.offset, range.length).read_to_vec()?;
      let uncompressed = deflate::decompress(&compressed, true)?;
      output_ranges.push(Range::new(out_pos, uncompressed.len() as u64));
      writer.write_all(&uncompressed)?;
      out_pos += uncompressed.len() as u64;
      cursor = range.end();
    }
    if cursor < total_len {
      writer.write_all(&source.slice(cursor, total_len - cursor).read_to_vec()?)?;
    }
  }
  Ok((blob, output_ranges))
}

fn materialize_new(
  source: &ByteSource,
  ranges: &[TypedRange<DeflateParameters>],
  threshold_bytes: u64,
  token: &CancellationToken,
) -> DeltaResult<(TempBlob, Vec<TypedRange<DeflateParameters>>)> {
  let mut blob = TempBlob::new(threshold_bytes);
  let total_len = source.length();
  let mut cursor = 0u64;
  let mut out_pos = 0u64;
  let mut recompression_ranges = Vec::with_capacity(ranges.len());
  {
    let mut writer = blob.writer()?;
    for r in ranges {
      token.check()?;
      if r.offset() > cursor {
        let gap_len = r.offset() - cursor;
        writer.write_all(&source.slice(cursor, gap_len).read_to_vec()?)?;
        out_pos += gap_len;
      }
      let compressed = source.slice(r.offset(), r.range.length).read_to_vec()?;
      let uncompressed = deflate::decompress(&compressed, true)?;
      let out_range = Range::new(out_pos, uncompressed.len() as u64);
      writer.write_all(&uncompressed)?;
      out_pos += uncompressed.len() as u64;
      recompression_ranges.push(TypedRange::new(out_range, r.metadata));
      cursor = r.end();
    }
    if cursor < total_len {
      writer.write_all(&source.slice(cursor, total_len - cursor).read_to_vec()?)?;
    }
  }
  Ok((blob, recompression_ranges))
}
