//! Caller-tunable knobs for a patch-generation run. Generalizes the
//! teacher's paired compressor/decompressor config structs into a single
//! options struct, since generation here has no separate decode side.

use crate::matcher::{DEFAULT_MIN_MATCH_LEN, GUARD_BYTES};

/// Default threshold past which a `TempBlob` migrates from memory to a
/// temp file (spec.md §4.1's "recommended default: 50 MiB").
pub const DEFAULT_TEMP_BLOB_THRESHOLD_BYTES: u64 = 50 * 1024 * 1024;

/// Default cap on FILE_BY_FILE recursion depth (spec.md §6: "implementations
/// may cap depth to 1").
pub const DEFAULT_MAX_EMBEDDED_RECURSION_DEPTH: u32 = 1;

#[derive(Clone, Debug)]
pub struct PatchOptions {
  /// Write threshold past which a delta-friendly blob spills to a temp
  /// file instead of staying in memory.
  pub temp_blob_threshold_bytes: u64,
  /// Matcher's minimum match length `L` (spec.md §4.3).
  pub matcher_min_match_len: usize,
  /// Matcher's cumulative match-length budget, the "n² guard".
  pub matcher_guard_bytes: u64,
  /// Optional cap on total new-side recompression cost (spec.md §4.6).
  pub total_recompression_limit_bytes: Option<u64>,
  /// How many levels of FILE_BY_FILE nesting to follow before giving up
  /// and falling back to a flat bsdiff over the outer blobs.
  pub max_embedded_recursion_depth: u32,
}

impl Default for PatchOptions {
  fn default() -> Self {
    PatchOptions {
      temp_blob_threshold_bytes: DEFAULT_TEMP_BLOB_THRESHOLD_BYTES,
      matcher_min_match_len: DEFAULT_MIN_MATCH_LEN,
      matcher_guard_bytes: GUARD_BYTES,
      total_recompression_limit_bytes: None,
      max_embedded_recursion_depth: DEFAULT_MAX_EMBEDDED_RECURSION_DEPTH,
    }
  }
}

impl PatchOptions {
  pub fn bsdiff_options(&self) -> crate::bsdiff::BsdiffOptions {
    crate::bsdiff::BsdiffOptions {
      min_match_len: self.matcher_min_match_len,
      guard_bytes: self.matcher_guard_bytes,
    }
  }
}
