//! Stage (c): resolves ties left by `sssort` — B* substrings that compare
//! equal because one is a prefix of another within its bucket — by
//! ordering the *rank sequence* of B* positions (spec.md §4.2's trsort).
//!
//! divsufsort recurses on the reduced string at this point; a recursive
//! suffix-sort-of-a-suffix-sort is equivalent to sorting the rank sequence
//! by prefix doubling, so that's what this does, reusing the same
//! `O(n log n)` doubling loop the whole-text path used before this
//! rewrite.

use crate::cancel::CancellationToken;
use crate::errors::DeltaResult;
use crate::suffix_array::constants::{tr_ilg, tr_isqrt};

/// Returns the permutation of `0..ranks.len()` that sorts `ranks`
/// lexicographically by `(ranks[i], ranks[i+1], ranks[i+2], ...)`, i.e.
/// the suffix array of the rank sequence read as a string over an
/// arbitrary-size alphabet.
pub fn suffix_array_of_ranks(ranks_in: &[i64], token: &CancellationToken) -> DeltaResult<Vec<i32>> {
  let n = ranks_in.len();
  if n == 0 {
    return Ok(Vec::new());
  }
  // divsufsort sizes trsort's per-round work budget from isqrt(n) + ilg(n);
  // the doubling loop below has no separate budgeted phase to feed this
  // into, so it's computed for parity with the source structure and
  // otherwise unused.
  let _budget = tr_isqrt(n as i64) + tr_ilg(n as i64) as i64;

  let mut sa: Vec<usize> = (0..n).collect();
  let mut rank: Vec<i64> = ranks_in.to_vec();
  let mut tmp = vec![0i64; n];
  let rank_at = |rank: &[i64], i: usize, k: usize| -> i64 {
    if i + k < n {
      rank[i + k]
    } else {
      -1
    }
  };
  let mut k = 1usize;
  while k < n {
    token.check()?;
    sa.sort_unstable_by(|&a, &b| {
      let key_a = (rank[a], rank_at(&rank, a, k));
      let key_b = (rank[b], rank_at(&rank, b, k));
      key_a.cmp(&key_b)
    });
    tmp[sa[0]] = 0;
    for i in 1..n {
      let prev = sa[i - 1];
      let cur = sa[i];
      let same = rank[prev] == rank[cur] && rank_at(&rank, prev, k) == rank_at(&rank, cur, k);
      tmp[cur] = tmp[prev] + if same { 0 } else { 1 };
    }
    std::mem::swap(&mut rank, &mut tmp);
    if rank[sa[n - 1]] as usize == n - 1 {
      break;
    }
    k *= 2;
  }
  Ok(sa.into_iter().map(|x| x as i32).collect())
}
