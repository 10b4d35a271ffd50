use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The different kinds of errors this crate can produce.
///
/// Per-entry-pair kinds (`UndivinableDeflate`, `UnsuitableEntry`) are caught
/// by the planner and downgraded to a `NEITHER` plan entry rather than
/// propagated; everything else surfaces to the caller unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaErrorKind {
  /// The suffix sorter was asked to index more than `2^31 / 4` bytes.
  InputTooLarge,
  /// ZIP framing (central directory, local header, EOCD) was invalid.
  CorruptArchive,
  /// No deflate parameter triple reproduced the observed compressed bytes.
  UndivinableDeflate,
  /// An entry uses a compression method the planner can't act on.
  UnsuitableEntry,
  /// Cooperative cancellation tripped mid-operation.
  Interrupted,
  /// Underlying read/write failure.
  Io,
  /// A stateful precondition was violated (e.g. a second writer opened on
  /// a `TempBlob`, or a reader opened while a writer is still live). This
  /// indicates a programmer bug, not bad input.
  PreconditionViolation,
  /// A caller-supplied argument was invalid.
  InvalidArgument,
}

/// The error type used in results for all `zipdelta` functionality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaError {
  pub kind: DeltaErrorKind,
  pub message: String,
}

impl DeltaError {
  pub fn new<S: AsRef<str>>(kind: DeltaErrorKind, message: S) -> Self {
    DeltaError {
      kind,
      message: message.as_ref().to_string(),
    }
  }

  pub fn input_too_large<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::InputTooLarge, message)
  }

  pub fn corrupt_archive<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::CorruptArchive, message)
  }

  pub fn undivinable_deflate<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::UndivinableDeflate, message)
  }

  pub fn unsuitable_entry<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::UnsuitableEntry, message)
  }

  pub fn interrupted<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::Interrupted, message)
  }

  pub fn io<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::Io, message)
  }

  pub fn precondition_violation<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::PreconditionViolation, message)
  }

  pub fn invalid_argument<S: AsRef<str>>(message: S) -> Self {
    Self::new(DeltaErrorKind::InvalidArgument, message)
  }

  /// True for the two kinds the planner catches per-entry-pair rather than
  /// propagating (spec §7 propagation policy).
  pub fn is_per_entry_demotable(&self) -> bool {
    matches!(
      self.kind,
      DeltaErrorKind::UndivinableDeflate | DeltaErrorKind::UnsuitableEntry
    )
  }
}

impl Display for DeltaError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "zipdelta {:?} error: {}", self.kind, &self.message)
  }
}

impl Error for DeltaError {}

impl From<std::io::Error> for DeltaError {
  fn from(e: std::io::Error) -> Self {
    DeltaError::io(e.to_string())
  }
}

pub type DeltaResult<T> = Result<T, DeltaError>;
