//! Drives the matcher, extends matches, and serializes the classic
//! bsdiff43 control-entry stream (spec.md §4.4, §6).

use crate::bsdiff::extend::{extend_backward, extend_forward, resolve_overlap};
use crate::cancel::CancellationToken;
use crate::errors::DeltaResult;
use crate::formatted_long;
use crate::matcher::{Matcher, DEFAULT_MIN_MATCH_LEN, GUARD_BYTES};
use crate::suffix_array::SuffixArray;

pub const MAGIC: &[u8; 16] = b"ENDSLEY/BSDIFF43";

#[derive(Clone, Copy, Debug)]
pub struct BsdiffOptions {
  pub min_match_len: usize,
  pub guard_bytes: u64,
}

impl Default for BsdiffOptions {
  fn default() -> Self {
    BsdiffOptions {
      min_match_len: DEFAULT_MIN_MATCH_LEN,
      guard_bytes: GUARD_BYTES,
    }
  }
}

struct ControlEntry {
  diff_len: usize,
  extra_len: usize,
  old_offset_delta: i64,
  diff_start_new: usize,
  diff_start_old: usize,
  extra_start_new: usize,
}

/// Generates a bsdiff43-framed patch transforming `old_text` into
/// `new_text`. Output is byte-identical across runs for the same inputs
/// and options (spec.md §8 property 5).
pub fn generate_bsdiff(
  old_text: &[u8],
  new_text: &[u8],
  options: BsdiffOptions,
  token: &CancellationToken,
) -> DeltaResult<Vec<u8>> {
  let sa = SuffixArray::build(old_text, token)?;
  let matcher = Matcher::new(
    old_text,
    new_text,
    &sa,
    options.min_match_len,
    options.guard_bytes,
    token.clone(),
  );

  let mut entries = Vec::new();
  let mut lastscan = 0usize;
  let mut lastpos = 0usize;

  for next in matcher {
    let m = next?;
    token.check()?;
    let scan = m.new_pos;
    let pos = m.old_pos;

    let lenf = extend_forward(old_text, new_text, lastpos, lastscan, scan);
    let lenb = extend_backward(old_text, new_text, pos, scan, lastscan);
    let (lenf, lenb) =
      resolve_overlap(old_text, new_text, lastscan, lastpos, scan, pos, lenf, lenb);

    let copy_start_new = scan - lenb;
    let copy_start_old = pos - lenb;
    let diff_len = lenf;
    let extra_len = copy_start_new - (lastscan + lenf);
    let old_offset_delta = copy_start_old as i64 - (lastpos as i64 + lenf as i64);

    entries.push(ControlEntry {
      diff_len,
      extra_len,
      old_offset_delta,
      diff_start_new: lastscan,
      diff_start_old: lastpos,
      extra_start_new: lastscan + lenf,
    });

    lastscan = copy_start_new;
    lastpos = copy_start_old;
  }

  // Trailing flush: whatever remains between `lastscan` and the end of
  // `new_text` has no further match to bound it, so there is no backward
  // extension; the cursor reaches the end of `new_text`, so the final
  // entry's old-position offset is zero (spec.md §4.4).
  let scan = new_text.len();
  let lenf = extend_forward(old_text, new_text, lastpos, lastscan, scan);
  let diff_len = lenf;
  let extra_len = scan - (lastscan + lenf);
  entries.push(ControlEntry {
    diff_len,
    extra_len,
    old_offset_delta: 0,
    diff_start_new: lastscan,
    diff_start_old: lastpos,
    extra_start_new: lastscan + lenf,
  });

  let mut out = Vec::new();
  out.extend_from_slice(MAGIC);
  formatted_long::write_to(new_text.len() as i64, &mut out);

  for e in &entries {
    formatted_long::write_to(e.diff_len as i64, &mut out);
    formatted_long::write_to(e.extra_len as i64, &mut out);
    formatted_long::write_to(e.old_offset_delta, &mut out);
    for i in 0..e.diff_len {
      out.push(new_text[e.diff_start_new + i].wrapping_sub(old_text[e.diff_start_old + i]));
    }
    out.extend_from_slice(&new_text[e.extra_start_new..e.extra_start_new + e.extra_len]);
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn apply_patch(old_text: &[u8], patch: &[u8]) -> Vec<u8> {
    assert_eq!(&patch[0..16], MAGIC);
    let new_size = formatted_long::read(&patch[16..24]).unwrap() as usize;
    let mut out = Vec::with_capacity(new_size);
    let mut old_pos: i64 = 0;
    let mut cursor = 24usize;
    while out.len() < new_size {
      let diff_len = formatted_long::read(&patch[cursor..cursor + 8]).unwrap() as usize;
      let extra_len = formatted_long::read(&patch[cursor + 8..cursor + 16]).unwrap() as usize;
      let old_offset_delta = formatted_long::read(&patch[cursor + 16..cursor + 24]).unwrap();
      cursor += 24;
      for i in 0..diff_len {
        let old_byte = old_text[(old_pos as usize) + i];
        out.push(old_byte.wrapping_add(patch[cursor + i]));
      }
      cursor += diff_len;
      old_pos += diff_len as i64;
      out.extend_from_slice(&patch[cursor..cursor + extra_len]);
      cursor += extra_len;
      old_pos += old_offset_delta;
    }
    out
  }

  #[test]
  fn identity_round_trips() {
    let data = b"hello world".to_vec();
    let token = CancellationToken::new();
    let patch = generate_bsdiff(&data, &data, BsdiffOptions::default(), &token).unwrap();
    let reconstructed = apply_patch(&data, &patch);
    assert_eq!(reconstructed, data);
  }

  #[test]
  fn small_edit_round_trips() {
    let old_text = b"the quick brown fox jumps over the lazy dog, repeatedly and often".to_vec();
    let mut new_text = old_text.clone();
    new_text.splice(10..15, b"SLOW!".iter().copied());
    let token = CancellationToken::new();
    let patch = generate_bsdiff(
      &old_text,
      &new_text,
      BsdiffOptions::default(),
      &token,
    )
    .unwrap();
    let reconstructed = apply_patch(&old_text, &patch);
    assert_eq!(reconstructed, new_text);
  }

  #[test]
  fn unrelated_inputs_round_trip() {
    let old_text: Vec<u8> = (0..500u32).map(|i| (i % 197) as u8).collect();
    let new_text: Vec<u8> = (0..700u32).map(|i| ((i * 7 + 3) % 211) as u8).collect();
    let token = CancellationToken::new();
    let patch = generate_bsdiff(&old_text, &new_text, BsdiffOptions::default(), &token).unwrap();
    let reconstructed = apply_patch(&old_text, &patch);
    assert_eq!(reconstructed, new_text);
  }

  #[test]
  fn empty_new_text() {
    let old_text = b"anything at all".to_vec();
    let new_text: Vec<u8> = Vec::new();
    let token = CancellationToken::new();
    let patch = generate_bsdiff(&old_text, &new_text, BsdiffOptions::default(), &token).unwrap();
    let reconstructed = apply_patch(&old_text, &patch);
    assert_eq!(reconstructed, new_text);
  }

  #[test]
  fn determinism_across_runs() {
    let old_text: Vec<u8> = (0..2000u32).map(|i| (i % 113) as u8).collect();
    let mut new_text = old_text.clone();
    new_text[500] = 255;
    new_text.truncate(1800);
    let patch_a = generate_bsdiff(
      &old_text,
      &new_text,
      BsdiffOptions::default(),
      &CancellationToken::new(),
    )
    .unwrap();
    let patch_b = generate_bsdiff(
      &old_text,
      &new_text,
      BsdiffOptions::default(),
      &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(patch_a, patch_b);
  }

  #[test]
  fn cancellation_is_propagated() {
    let old_text = vec![0u8; 10_000];
    let new_text = vec![1u8; 10_000];
    let token = CancellationToken::new();
    token.cancel();
    let result = generate_bsdiff(&old_text, &new_text, BsdiffOptions::default(), &token);
    assert!(result.is_err());
  }
}
