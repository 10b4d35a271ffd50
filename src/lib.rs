//! Archive-aware binary patching: produces a compact delta transforming an
//! old ZIP/JAR/APK archive into a new one, exploiting each entry's deflate
//! structure rather than diffing raw compressed bytes.
//!
//! The top-level entry point is [`patch::generate_patch`]; [`config::PatchOptions`]
//! controls match-length, temp-blob spill threshold, the optional
//! recompression budget, and FILE_BY_FILE recursion depth.

pub use byte_source::{ByteSource, ByteStream};
pub use cancel::CancellationToken;
pub use config::PatchOptions;
pub use deflate::DeflateParameters;
pub use delta::{BsdiffGenerator, DeltaEntry, DeltaGenerator, FileByFileGenerator};
pub use errors::{DeltaError, DeltaErrorKind, DeltaResult};
pub use patch::generate_patch;
pub use plan::{DeltaFormat, PreDiffPlan, PreDiffPlanEntry, UncompressionOption};
pub use range::{Range, TypedRange};
pub use zip::{CentralDirectoryReader, FilenameEncoding, ZipEntry, ZipReader};

mod bsdiff;
mod byte_source;
mod cancel;
mod config;
mod deflate;
mod delta;
mod errors;
mod formatted_long;
mod matcher;
mod patch;
mod plan;
mod range;
mod suffix_array;
mod temp_blob;
mod zip;
