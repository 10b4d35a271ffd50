//! Stage (b): orders the type-B* substrings sharing a first-two-byte
//! bucket key by direct comparison — insertion sort below
//! `INSERTIONSORT_THRESHOLD`, a median-of-three quicksort above it with a
//! depth-limited fallback to heapsort (the introsort shape spec.md §4.2
//! calls for), and a block/merge split once a bucket exceeds
//! `SS_BLOCKSIZE`.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::cancel::CancellationToken;
use crate::errors::DeltaResult;
use crate::suffix_array::constants::{tr_ilg, INSERTIONSORT_THRESHOLD, SS_BLOCKSIZE};

fn at(text: &[u8], pos: usize) -> i32 {
  if pos < text.len() {
    text[pos] as i32
  } else {
    -1
  }
}

/// Lexicographically compares the type-B* substrings `[i, i_end]` and
/// `[j, j_end]` (both bounds inclusive; `i_end`/`j_end` is the next B*
/// position, or `text.len()` for the last one, standing in for the
/// end-of-text sentinel). A substring that runs out while still matching
/// its counterpart is the smaller of the two — the standard convention
/// for comparing LMS substrings of different lengths.
pub(crate) fn compare_lms_substrings(
  text: &[u8],
  i: usize,
  i_end: usize,
  j: usize,
  j_end: usize,
) -> Ordering {
  let mut a = i;
  let mut b = j;
  loop {
    match at(text, a).cmp(&at(text, b)) {
      Ordering::Equal => {}
      other => return other,
    }
    let a_done = a == i_end;
    let b_done = b == j_end;
    match (a_done, b_done) {
      (true, true) => return Ordering::Equal,
      (true, false) => return Ordering::Less,
      (false, true) => return Ordering::Greater,
      (false, false) => {
        a += 1;
        b += 1;
      }
    }
  }
}

fn cmp(text: &[u8], bound_of: &HashMap<usize, usize>, a: usize, b: usize) -> Ordering {
  compare_lms_substrings(text, a, bound_of[&a], b, bound_of[&b])
}

/// Sorts `positions` (all sharing one AB-bucket key) into true B*-
/// substring order.
pub fn sssort(
  text: &[u8],
  bound_of: &HashMap<usize, usize>,
  positions: &mut Vec<usize>,
  token: &CancellationToken,
) -> DeltaResult<()> {
  if positions.len() <= 1 {
    return Ok(());
  }
  if positions.len() <= SS_BLOCKSIZE {
    sssort_range(text, bound_of, positions.as_mut_slice(), token)
  } else {
    sssort_blocked(text, bound_of, positions, token)
  }
}

fn sssort_blocked(
  text: &[u8],
  bound_of: &HashMap<usize, usize>,
  positions: &mut Vec<usize>,
  token: &CancellationToken,
) -> DeltaResult<()> {
  let mut runs: Vec<Vec<usize>> = positions.chunks(SS_BLOCKSIZE).map(|c| c.to_vec()).collect();
  for run in runs.iter_mut() {
    sssort_range(text, bound_of, run.as_mut_slice(), token)?;
  }
  while runs.len() > 1 {
    token.check()?;
    let mut merged = Vec::with_capacity(runs.len() / 2 + 1);
    let mut it = runs.into_iter();
    while let Some(a) = it.next() {
      match it.next() {
        Some(b) => merged.push(merge_sorted(text, bound_of, a, b)),
        None => merged.push(a),
      }
    }
    runs = merged;
  }
  *positions = runs.pop().unwrap_or_default();
  Ok(())
}

fn merge_sorted(
  text: &[u8],
  bound_of: &HashMap<usize, usize>,
  a: Vec<usize>,
  b: Vec<usize>,
) -> Vec<usize> {
  let mut out = Vec::with_capacity(a.len() + b.len());
  let (mut i, mut j) = (0usize, 0usize);
  while i < a.len() && j < b.len() {
    if cmp(text, bound_of, a[i], b[j]) != Ordering::Greater {
      out.push(a[i]);
      i += 1;
    } else {
      out.push(b[j]);
      j += 1;
    }
  }
  out.extend_from_slice(&a[i..]);
  out.extend_from_slice(&b[j..]);
  out
}

fn sssort_range(
  text: &[u8],
  bound_of: &HashMap<usize, usize>,
  positions: &mut [usize],
  token: &CancellationToken,
) -> DeltaResult<()> {
  let depth_limit = 2 * (tr_ilg(positions.len() as i64).max(0) as usize + 1);
  let mut stack: Vec<(usize, usize, usize)> = vec![(0, positions.len(), depth_limit)];
  while let Some((lo, hi, depth)) = stack.pop() {
    token.check()?;
    let len = hi - lo;
    if len <= 1 {
      continue;
    }
    if len <= INSERTIONSORT_THRESHOLD {
      insertion_sort_range(text, bound_of, &mut positions[lo..hi]);
      continue;
    }
    if depth == 0 {
      heap_sort_range(text, bound_of, &mut positions[lo..hi]);
      continue;
    }
    let p = partition(text, bound_of, positions, lo, hi);
    stack.push((lo, p, depth - 1));
    stack.push((p + 1, hi, depth - 1));
  }
  Ok(())
}

fn sort3(text: &[u8], bound_of: &HashMap<usize, usize>, positions: &mut [usize], a: usize, b: usize, c: usize) {
  if cmp(text, bound_of, positions[a], positions[b]) == Ordering::Greater {
    positions.swap(a, b);
  }
  if cmp(text, bound_of, positions[b], positions[c]) == Ordering::Greater {
    positions.swap(b, c);
  }
  if cmp(text, bound_of, positions[a], positions[b]) == Ordering::Greater {
    positions.swap(a, b);
  }
}

/// Lomuto partition with a median-of-three pivot, operating on
/// `positions[lo..hi]`. Returns the pivot's final index.
fn partition(text: &[u8], bound_of: &HashMap<usize, usize>, positions: &mut [usize], lo: usize, hi: usize) -> usize {
  let mid = lo + (hi - lo) / 2;
  sort3(text, bound_of, positions, lo, mid, hi - 1);
  positions.swap(mid, hi - 1);
  let pivot = positions[hi - 1];
  let pivot_bound = bound_of[&pivot];
  let mut store = lo;
  for k in lo..hi - 1 {
    if compare_lms_substrings(text, positions[k], bound_of[&positions[k]], pivot, pivot_bound) == Ordering::Less {
      positions.swap(store, k);
      store += 1;
    }
  }
  positions.swap(store, hi - 1);
  store
}

fn insertion_sort_range(text: &[u8], bound_of: &HashMap<usize, usize>, positions: &mut [usize]) {
  for i in 1..positions.len() {
    let mut j = i;
    while j > 0 && cmp(text, bound_of, positions[j - 1], positions[j]) == Ordering::Greater {
      positions.swap(j - 1, j);
      j -= 1;
    }
  }
}

fn heap_sort_range(text: &[u8], bound_of: &HashMap<usize, usize>, positions: &mut [usize]) {
  let n = positions.len();
  for start in (0..n / 2).rev() {
    sift_down(text, bound_of, positions, start, n);
  }
  for end in (1..n).rev() {
    positions.swap(0, end);
    sift_down(text, bound_of, positions, 0, end);
  }
}

fn sift_down(text: &[u8], bound_of: &HashMap<usize, usize>, positions: &mut [usize], start: usize, end: usize) {
  let mut root = start;
  loop {
    let mut child = 2 * root + 1;
    if child >= end {
      break;
    }
    if child + 1 < end && cmp(text, bound_of, positions[child], positions[child + 1]) == Ordering::Less {
      child += 1;
    }
    if cmp(text, bound_of, positions[root], positions[child]) == Ordering::Less {
      positions.swap(root, child);
      root = child;
    } else {
      break;
    }
  }
}
