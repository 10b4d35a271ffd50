//! The deflate parameter triple and its equivalence classes (spec.md §3).

/// `level` in `1..=9`, `strategy` in `{0 = default, 1 = filtered, 2 =
/// huffman-only}`, `nowrap` true for a raw deflate stream (no zlib
/// wrapper).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeflateParameters {
  pub level: u8,
  pub strategy: u8,
  pub nowrap: bool,
}

impl DeflateParameters {
  pub fn new(level: u8, strategy: u8, nowrap: bool) -> Self {
    DeflateParameters {
      level,
      strategy,
      nowrap,
    }
  }

  /// Canonicalizes to the representative of this parameter set's
  /// equivalence class (spec.md §3): strategy 1 at levels 1-3 is
  /// equivalent to strategy 0 at the same level; strategy 2 collapses all
  /// levels to a single representative.
  pub fn canonical(&self) -> Self {
    if self.strategy == 2 {
      return DeflateParameters::new(1, 2, self.nowrap);
    }
    if self.strategy == 1 && self.level <= 3 {
      return DeflateParameters::new(self.level, 0, self.nowrap);
    }
    *self
  }

  pub fn is_equivalent_to(&self, other: &Self) -> bool {
    self.canonical() == other.canonical()
  }
}

/// The canonical try order the diviner walks (SPEC_FULL.md §4.5): nowrap
/// outer (false before true), then strategy, then level, skipping
/// parameter sets a prior one in the order already canonicalizes to.
pub fn canonical_try_order() -> Vec<DeflateParameters> {
  let mut seen = std::collections::HashSet::new();
  let mut order = Vec::new();
  for nowrap in [false, true] {
    for strategy in [0u8, 1, 2] {
      for level in 1u8..=9 {
        let params = DeflateParameters::new(level, strategy, nowrap);
        let canon = params.canonical();
        if seen.insert(canon) {
          order.push(canon);
        }
      }
    }
  }
  order
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strategy_1_low_level_collapses_to_strategy_0() {
    let a = DeflateParameters::new(2, 1, false);
    let b = DeflateParameters::new(2, 0, false);
    assert!(a.is_equivalent_to(&b));
  }

  #[test]
  fn strategy_1_high_level_is_distinct() {
    let a = DeflateParameters::new(6, 1, false);
    let b = DeflateParameters::new(6, 0, false);
    assert!(!a.is_equivalent_to(&b));
  }

  #[test]
  fn strategy_2_collapses_across_all_levels() {
    let a = DeflateParameters::new(1, 2, false);
    let b = DeflateParameters::new(9, 2, false);
    assert!(a.is_equivalent_to(&b));
  }

  #[test]
  fn try_order_has_no_duplicate_canonical_entries() {
    let order = canonical_try_order();
    let mut seen = std::collections::HashSet::new();
    for p in &order {
      assert!(seen.insert(*p), "duplicate canonical entry {:?}", p);
    }
  }

  #[test]
  fn try_order_is_nowrap_major() {
    let order = canonical_try_order();
    let first_nowrap_true = order.iter().position(|p| p.nowrap).unwrap();
    assert!(order[..first_nowrap_true].iter().all(|p| !p.nowrap));
  }
}
