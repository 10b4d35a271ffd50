use crate::plan::DeltaFormat;
use crate::range::Range;

/// `(deltaFormat, oldBlobRange, newBlobRange)` selected over the two
/// delta-friendly blobs (spec.md §3). The concatenation of `new_blob_range`
/// across a patch's `DeltaEntry` list covers the whole new delta-friendly
/// blob contiguously.
#[derive(Clone, Debug)]
pub struct DeltaEntry {
  pub delta_format: DeltaFormat,
  pub old_blob_range: Range,
  pub new_blob_range: Range,
  pub delta_bytes: Vec<u8>,
}
