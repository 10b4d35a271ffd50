//! Streams next-longest-match pairs through the new blob using the old
//! blob's suffix array (spec.md §4.3).

use crate::cancel::CancellationToken;
use crate::suffix_array::SuffixArray;

/// Cumulative match-length budget that bounds worst-case matcher work on
/// pathological inputs ("the n² guard").
pub const GUARD_BYTES: u64 = 1 << 26;

/// Default minimum match length `L`.
pub const DEFAULT_MIN_MATCH_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextMatch {
  pub old_pos: usize,
  pub new_pos: usize,
  pub len: usize,
}

/// Lazily streams `NextMatch` values moving strictly forward through
/// `new_text`, per spec.md §4.3's numbered procedure.
pub struct Matcher<'a> {
  old_text: &'a [u8],
  new_text: &'a [u8],
  sa: &'a SuffixArray,
  min_match_len: usize,
  guard_bytes: u64,
  token: CancellationToken,

  new_pos: usize,
  num_matches: usize,
  prev_old_offset: usize,
  total_match_len: u64,
  done: bool,
}

impl<'a> Matcher<'a> {
  pub fn new(
    old_text: &'a [u8],
    new_text: &'a [u8],
    sa: &'a SuffixArray,
    min_match_len: usize,
    guard_bytes: u64,
    token: CancellationToken,
  ) -> Self {
    Matcher {
      old_text,
      new_text,
      sa,
      min_match_len,
      guard_bytes,
      token,
      new_pos: 0,
      num_matches: 0,
      prev_old_offset: 0,
      total_match_len: 0,
      done: false,
    }
  }
}

impl<'a> Iterator for Matcher<'a> {
  type Item = crate::errors::DeltaResult<NextMatch>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if self.done || self.new_pos >= self.new_text.len() {
        return None;
      }
      if let Err(e) = self.token.check() {
        self.done = true;
        return Some(Err(e));
      }

      let (start, match_len) = self
        .sa
        .search_lcp(self.old_text, &self.new_text[self.new_pos..]);

      // Incrementally maintain `num_matches`: how many bytes starting at
      // `new_pos` still agree with the forward extension of the previous
      // match, i.e. `old_text[prev_old_offset + new_pos ..]` vs
      // `new_text[new_pos..]`.
      let candidate_old_pos = self.prev_old_offset + self.new_pos;
      let forward_matches = if candidate_old_pos < self.old_text.len() {
        self.old_text[candidate_old_pos] == self.new_text[self.new_pos]
      } else {
        false
      };

      self.total_match_len += match_len as u64;
      let guard_tripped = self.total_match_len > self.guard_bytes;

      if match_len > self.num_matches + self.min_match_len || guard_tripped {
        let emitted = NextMatch {
          old_pos: start,
          new_pos: self.new_pos,
          len: match_len,
        };
        // Advance past this match's contribution; the next iteration's
        // rolling counter resets relative to this newly emitted match.
        self.prev_old_offset = start.wrapping_sub(self.new_pos);
        self.num_matches = match_len;
        self.new_pos += 1;
        return Some(Ok(emitted));
      }

      if match_len == 0 {
        self.new_pos += 1;
        self.num_matches = 0;
      } else if match_len == self.num_matches {
        self.new_pos += self.num_matches;
        self.num_matches = 0;
      } else {
        self.new_pos += 1;
        self.num_matches = if forward_matches {
          self.num_matches.saturating_sub(1) + 1
        } else {
          self.num_matches.saturating_sub(1)
        };
      }
    }
  }
}
