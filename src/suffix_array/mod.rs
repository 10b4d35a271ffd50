//! Suffix array construction over a byte string (spec.md §4.2), structured
//! after divsufsort 2.0's four stages:
//!
//!   (a) `bucket` classifies suffix types (A/L, B/S, B*/LMS) and
//!       bucket-sorts the B* substrings by their first two bytes.
//!   (b) `sssort` refines each bucket into true B*-substring order via a
//!       multikey introsort (insertion-sort base case, median-of-three
//!       quicksort, depth-limited heapsort fallback).
//!   (c) `trsort` resolves remaining ties by sorting the reduced sequence
//!       of B* rank groups.
//!   (d) `induce` places every type-A and type-B suffix by induction from
//!       the now fully-ordered B* suffixes.
//!
//! `constants` carries the named thresholds and LG/SQQ-derived lookup
//! tables the stages above use. `divsufsort` is the orchestrator tying
//! all four together.
//!
//! The public contract is unaffected by this structure: the result is a
//! 0-based permutation of `[0, n)` in suffix-lexicographic order (§8
//! property 7), construction is rejected above the same size bound, and
//! cancellation is checked at least once per stage per round.
//!
//! Per design note §9, the historical "store length at SA[0], shift every
//! access by one" artifact is dropped; `SuffixArray::sa` is a plain
//! 0-based `Vec<i32>` of length `n`.

mod bucket;
mod constants;
mod divsufsort;
mod induce;
mod sssort;
mod trsort;

use crate::cancel::CancellationToken;
use crate::errors::{DeltaError, DeltaResult};

/// `4 * (n + 1) >= 2^31` is rejected (hard upper bound ~2 GiB), matching
/// spec.md §4.2's failure semantics for the `i32`-indexed suffix array.
pub fn check_size(n: usize) -> DeltaResult<()> {
  let bound = 1u64 << 31;
  if 4 * (n as u64 + 1) >= bound {
    return Err(DeltaError::input_too_large(format!(
      "cannot suffix-sort {} bytes: 4*(n+1) would reach the 2GiB SA bound",
      n
    )));
  }
  Ok(())
}

/// A suffix array over an input of length `n <= 2^31/4`, alphabet 256.
pub struct SuffixArray {
  sa: Vec<i32>,
}

impl SuffixArray {
  /// Builds the suffix array of `text`. `token` is polled at least once
  /// per stage per round (sssort's partitioning, trsort's doubling
  /// rounds, the rank-assignment sweep); a tripped token unwinds with
  /// `Interrupted`.
  pub fn build(text: &[u8], token: &CancellationToken) -> DeltaResult<Self> {
    check_size(text.len())?;
    let sa = divsufsort::build(text, token)?;
    Ok(SuffixArray { sa })
  }

  pub fn len(&self) -> usize {
    self.sa.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sa.is_empty()
  }

  pub fn as_slice(&self) -> &[i32] {
    &self.sa
  }

  /// Binary searches the suffixes of `text` (the same text this array was
  /// built over) for the entry whose suffix shares the longest common
  /// prefix with `needle`. Returns `(start, length)` of the match.
  pub fn search_lcp(&self, text: &[u8], needle: &[u8]) -> (usize, usize) {
    if self.sa.is_empty() || needle.is_empty() {
      return (0, 0);
    }

    let mut lo = 0usize;
    let mut hi = self.sa.len();
    let mut best_len = 0usize;
    let mut best_start = self.sa[0] as usize;

    // Standard binary search over suffixes, tracking the best LCP seen;
    // the suffix array's sortedness means the true longest-common-prefix
    // match is adjacent to where `needle` would insert.
    while lo < hi {
      let mid = lo + (hi - lo) / 2;
      let suffix_start = self.sa[mid] as usize;
      let suffix = &text[suffix_start..];
      let lcp = common_prefix_len(suffix, needle);
      if lcp > best_len {
        best_len = lcp;
        best_start = suffix_start;
      }
      match compare_from(suffix, needle, lcp) {
        std::cmp::Ordering::Less => lo = mid + 1,
        std::cmp::Ordering::Greater => hi = mid,
        std::cmp::Ordering::Equal => {
          lo = mid;
          hi = mid;
        }
      }
    }

    // The insertion point's immediate neighbors are the only other
    // candidates for the longest match; check both.
    for &idx in &[lo.saturating_sub(1), lo] {
      if idx < self.sa.len() {
        let suffix_start = self.sa[idx] as usize;
        let lcp = common_prefix_len(&text[suffix_start..], needle);
        if lcp > best_len {
          best_len = lcp;
          best_start = suffix_start;
        }
      }
    }

    (best_start, best_len)
  }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
  a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn compare_from(a: &[u8], b: &[u8], skip: usize) -> std::cmp::Ordering {
  a[skip.min(a.len())..].cmp(&b[skip.min(b.len())..])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn token() -> CancellationToken {
    CancellationToken::new()
  }

  #[test]
  fn sa_is_permutation_and_sorted() {
    let text = b"banana$banana$banana";
    let sa = SuffixArray::build(text, &token()).unwrap();
    let mut seen = vec![false; text.len()];
    for &i in sa.as_slice() {
      assert!(!seen[i as usize]);
      seen[i as usize] = true;
    }
    assert!(seen.iter().all(|&b| b));
    for w in sa.as_slice().windows(2) {
      let a = &text[w[0] as usize..];
      let b = &text[w[1] as usize..];
      assert!(a < b, "suffix array not sorted at {:?}", w);
    }
  }

  #[test]
  fn empty_input() {
    let sa = SuffixArray::build(b"", &token()).unwrap();
    assert_eq!(sa.len(), 0);
  }

  #[test]
  fn single_byte() {
    let sa = SuffixArray::build(b"x", &token()).unwrap();
    assert_eq!(sa.as_slice(), &[0]);
  }

  #[test]
  fn all_same_byte() {
    let text = vec![b'a'; 200];
    let sa = SuffixArray::build(&text, &token()).unwrap();
    // all suffixes are prefixes of each other in a run of one repeated
    // byte, so SA must be sorted in descending start order (shortest
    // suffix is lexicographically smallest).
    let expected: Vec<i32> = (0..text.len() as i32).rev().collect();
    assert_eq!(sa.as_slice(), expected.as_slice());
  }

  #[test]
  fn rejects_oversized_input() {
    assert!(check_size((1usize << 29) + 1).is_err());
    assert!(check_size(1000).is_ok());
  }

  #[test]
  fn cancellation_is_observed() {
    let text = vec![0u8; 10_000];
    let tok = token();
    tok.cancel();
    let result = SuffixArray::build(&text, &tok);
    assert!(result.is_err());
  }

  #[test]
  fn search_lcp_finds_longest_match() {
    let text = b"xabcxabdxabce";
    let sa = SuffixArray::build(text, &token()).unwrap();
    let (start, len) = sa.search_lcp(text, b"abce");
    assert_eq!(len, 4);
    assert_eq!(&text[start..start + len], b"abce");
  }
}
