//! Ties the four stages together into the suffix array construction
//! spec.md §4.2 calls for: classify types, bucket-sort type-B* substrings,
//! refine each bucket with `sssort`, resolve remaining ties with `trsort`
//! over the reduced rank sequence, then induce the full array.

use std::collections::HashMap;

use crate::cancel::CancellationToken;
use crate::errors::DeltaResult;
use crate::suffix_array::bucket::{bucket_sort_by_two_chars, classify_types, lms_positions};
use crate::suffix_array::induce::induced_sort;
use crate::suffix_array::sssort::{compare_lms_substrings, sssort};
use crate::suffix_array::trsort::suffix_array_of_ranks;

pub fn build(text: &[u8], token: &CancellationToken) -> DeltaResult<Vec<i32>> {
  let n = text.len();
  if n == 0 {
    return Ok(Vec::new());
  }

  let types = classify_types(text);
  let lms_in_text_order = lms_positions(&types);

  if lms_in_text_order.is_empty() {
    return Ok(induced_sort(text, &types, &[]));
  }

  let mut bound_of: HashMap<usize, usize> = HashMap::new();
  for w in lms_in_text_order.windows(2) {
    bound_of.insert(w[0], w[1]);
  }
  bound_of.insert(*lms_in_text_order.last().unwrap(), n);

  let mut buckets = bucket_sort_by_two_chars(&lms_in_text_order, text);
  for bucket in buckets.iter_mut() {
    sssort(text, &bound_of, bucket, token)?;
  }

  // Concatenate buckets in ascending key order (now each fully ordered)
  // and assign rank groups, incrementing only where two consecutive
  // substrings are genuinely unequal.
  let concatenated: Vec<usize> = buckets.into_iter().flatten().collect();
  let mut rank_of: HashMap<usize, i64> = HashMap::new();
  let mut rank = 0i64;
  rank_of.insert(concatenated[0], 0);
  for w in concatenated.windows(2) {
    token.check()?;
    let (prev, cur) = (w[0], w[1]);
    let unequal = compare_lms_substrings(text, prev, bound_of[&prev], cur, bound_of[&cur]) != std::cmp::Ordering::Equal;
    if unequal {
      rank += 1;
    }
    rank_of.insert(cur, rank);
  }
  let distinct_count = rank + 1;

  let sorted_lms: Vec<usize> = if distinct_count as usize == lms_in_text_order.len() {
    concatenated
  } else {
    let reduced_ranks: Vec<i64> = lms_in_text_order.iter().map(|p| rank_of[p]).collect();
    let reduced_sa = suffix_array_of_ranks(&reduced_ranks, token)?;
    reduced_sa
      .into_iter()
      .map(|k| lms_in_text_order[k as usize])
      .collect()
  };

  Ok(induced_sort(text, &types, &sorted_lms))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn naive_sa(text: &[u8]) -> Vec<i32> {
    let n = text.len();
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
    idx.into_iter().map(|x| x as i32).collect()
  }

  fn check(text: &[u8]) {
    let token = CancellationToken::new();
    let sa = build(text, &token).unwrap();
    assert_eq!(sa, naive_sa(text), "mismatch for {:?}", String::from_utf8_lossy(text));
  }

  #[test]
  fn empty_input() {
    assert_eq!(build(b"", &CancellationToken::new()).unwrap(), Vec::<i32>::new());
  }

  #[test]
  fn matches_naive_sort_on_varied_inputs() {
    check(b"banana");
    check(b"mississippi");
    check(b"abracadabra");
    check(b"aaaaaaaaaa");
    check(b"zyxwvutsrqponmlkjihgfedcba");
    check(b"a");
    check(b"ab");
    check(b"aabbccddaabbccdd");
    check(b"the quick brown fox jumps over the lazy dog the quick brown fox");
  }

  #[test]
  fn matches_naive_sort_with_many_repeats() {
    let text: Vec<u8> = (0..3000u32).map(|i| (i % 17) as u8).collect();
    let token = CancellationToken::new();
    let sa = build(&text, &token).unwrap();
    assert_eq!(sa, naive_sa(&text));
  }

  #[test]
  fn cancellation_is_observed() {
    let text: Vec<u8> = (0..3000u32).map(|i| (i % 17) as u8).collect();
    let token = CancellationToken::new();
    token.cancel();
    assert!(build(&text, &token).is_err());
  }
}
