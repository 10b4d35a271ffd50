use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{DeltaError, DeltaResult};

/// A cooperative cancellation flag shared between a caller (typically on
/// another thread) and the long-running loops of this crate: suffix sort,
/// trsort-equivalent refinement, the matcher, and the byte-by-byte bsdiff
/// extensions. Checked at least once per outer iteration; never preempts
/// mid-iteration.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
  flag: Arc<AtomicBool>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self {
      flag: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  /// Returns `Err(DeltaError::interrupted(..))` iff cancellation has
  /// tripped; callers check this once per outer iteration of a long loop.
  pub fn check(&self) -> DeltaResult<()> {
    if self.is_cancelled() {
      Err(DeltaError::interrupted("operation was cancelled"))
    } else {
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_uncancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
    assert!(token.check().is_ok());
  }

  #[test]
  fn cancel_is_visible_across_clones() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
    assert!(token.check().is_err());
  }
}
