//! Suffix type classification (A/B/B*) and the first stage of the
//! algorithm: bucket-sorting type-B* substrings by their first two
//! characters into the 256×256 AB table (spec.md §4.2 stage (a)).

/// `true` marks a type-B (S-type) position, `false` a type-A (L-type)
/// one. `types[n]` — the virtual end-of-text sentinel — is always type-B
/// by convention; it never appears in the returned suffix array.
pub fn classify_types(text: &[u8]) -> Vec<bool> {
  let n = text.len();
  let mut types = vec![false; n + 1];
  types[n] = true;
  if n == 0 {
    return types;
  }
  // Position n-1 is always type-A: it's compared against the sentinel,
  // which sorts before every real byte.
  types[n - 1] = false;
  for i in (0..n - 1).rev() {
    types[i] = match text[i].cmp(&text[i + 1]) {
      std::cmp::Ordering::Less => true,
      std::cmp::Ordering::Greater => false,
      std::cmp::Ordering::Equal => types[i + 1],
    };
  }
  types
}

/// Type-B* ("B*") positions in left-to-right text order: `i` such that
/// `types[i]` is type-B and `types[i-1]` is type-A. Position 0 is never
/// B* (it has no predecessor) and position `n-1` is never B* (it's always
/// type-A), so every returned position `i` satisfies `i + 1 < text.len()`.
pub fn lms_positions(types: &[bool]) -> Vec<usize> {
  let n = types.len() - 1;
  let mut out = Vec::new();
  for i in 1..n {
    if types[i] && !types[i - 1] {
      out.push(i);
    }
  }
  out
}

/// Bucket-sorts `lms` by the pair `(text[i], text[i+1])` into the
/// 256×256 AB table, returning one bucket (in original left-to-right
/// relative order within the bucket, refined further by `sssort`) per key
/// in ascending key order.
pub fn bucket_sort_by_two_chars(lms: &[usize], text: &[u8]) -> Vec<Vec<usize>> {
  let mut buckets: Vec<Vec<usize>> = (0..65536).map(|_| Vec::new()).collect();
  for &i in lms {
    let key = (text[i] as usize) * 256 + (text[i + 1] as usize);
    buckets[key].push(i);
  }
  buckets
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn all_same_byte_is_all_type_a() {
    let text = vec![b'a'; 10];
    let types = classify_types(&text);
    assert!(types[..text.len()].iter().all(|&t| !t));
    assert!(types[text.len()]);
    assert!(lms_positions(&types).is_empty());
  }

  #[test]
  fn finds_lms_positions_in_a_simple_run() {
    // "mmiissiissiippii" style alternation: b is smaller than a so the
    // "ba" boundary is a type-B* position.
    let text = b"abaaba";
    let types = classify_types(text);
    let lms = lms_positions(&types);
    for &i in &lms {
      assert!(types[i] && !types[i - 1]);
    }
  }

  #[test]
  fn bucket_sort_groups_by_first_two_chars() {
    let text = b"xyabxyzzabqr";
    let lms = vec![0usize, 4, 8];
    let buckets = bucket_sort_by_two_chars(&lms, text);
    let key = |i: usize| (text[i] as usize) * 256 + (text[i + 1] as usize);
    for (k, bucket) in buckets.iter().enumerate() {
      for &p in bucket {
        assert_eq!(key(p), k);
      }
    }
  }
}
