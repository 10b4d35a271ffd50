//! The per-entry-pair planning record (spec.md §3) plus the explanation
//! taxonomy it is drawn from (spec.md §4.6).

use crate::deflate::DeflateParameters;
use crate::range::{Range, TypedRange};
use crate::zip::ZipEntry;

/// Which side(s), if any, should be uncompressed before diffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UncompressionOption {
  Neither,
  Old,
  New,
  Both,
}

/// Which generator produces the delta for this entry pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaFormat {
  Bsdiff,
  FileByFile,
}

/// Named constants for `uncompressionOptionExplanation` (spec.md §4.6's
/// decision table; `RESOURCE_CONSTRAINED` comes from the limiter in §4.6).
pub mod explanation {
  pub const COMPRESSED_BYTES_IDENTICAL: &str = "COMPRESSED_BYTES_IDENTICAL";
  pub const COMPRESSED_BYTES_CHANGED: &str = "COMPRESSED_BYTES_CHANGED";
  pub const COMPRESSED_CHANGED_TO_UNCOMPRESSED: &str = "COMPRESSED_CHANGED_TO_UNCOMPRESSED";
  pub const UNCOMPRESSED_CHANGED_TO_COMPRESSED: &str = "UNCOMPRESSED_CHANGED_TO_COMPRESSED";
  pub const BOTH_ENTRIES_UNCOMPRESSED: &str = "BOTH_ENTRIES_UNCOMPRESSED";
  pub const UNSUITABLE: &str = "UNSUITABLE";
  pub const DEFLATE_UNSUITABLE: &str = "DEFLATE_UNSUITABLE";
  pub const RESOURCE_CONSTRAINED: &str = "RESOURCE_CONSTRAINED";
}

pub mod format_explanation {
  pub const BSDIFF_DEFAULT: &str = "BSDIFF";
  pub const FILE_BY_FILE_EMBEDDED_ARCHIVE: &str = "FILE_BY_FILE_EMBEDDED_ARCHIVE";
  pub const FILE_BY_FILE_FALLBACK_CORRUPT: &str = "EMBEDDED_ARCHIVE_CORRUPT_FALLBACK_TO_BSDIFF";
}

/// One (old,new) pairing decision. `old`/`new` are `None` for an orphan
/// entry present on only one side (still carried so the executor can copy
/// its bytes through untouched).
#[derive(Clone, Debug)]
pub struct PreDiffPlanEntry {
  pub old: Option<ZipEntry>,
  pub new: Option<ZipEntry>,
  pub uncompression_option: UncompressionOption,
  pub uncompression_option_explanation: &'static str,
  pub delta_format: DeltaFormat,
  pub delta_format_explanation: &'static str,
}

impl PreDiffPlanEntry {
  pub fn old_uncompression_range(&self) -> Option<Range> {
    if matches!(
      self.uncompression_option,
      UncompressionOption::Old | UncompressionOption::Both
    ) {
      self.old.as_ref().map(|e| e.compressed_data_range)
    } else {
      None
    }
  }

  pub fn new_uncompression_range(
    &self,
    params: DeflateParameters,
  ) -> Option<TypedRange<DeflateParameters>> {
    if matches!(
      self.uncompression_option,
      UncompressionOption::New | UncompressionOption::Both
    ) {
      self
        .new
        .as_ref()
        .map(|e| TypedRange::new(e.compressed_data_range, params))
    } else {
      None
    }
  }
}
