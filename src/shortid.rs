//! Short, human-typable codes derived from full record ids.
//!
//! A code is six symbols from a 33-symbol alphabet (uppercase letters and
//! digits without `0`, `O` and `I`). The full id is hashed with SHA-256, the
//! digest is read as a big-endian unsigned integer, and the integer is
//! written in base 33, keeping the six least significant digits with the
//! most significant of them first.
//!
//! Uniqueness only holds within one [`ShortIdCache`]. On a collision the
//! integer is incremented and the code recomputed until it is fresh. There
//! is no registry shared between processes.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Alphabet for short codes, in digit order.
pub const CHARSET: &[u8; 33] = b"ABCDEFGHJKLMNPQRSTUVWXYZ123456789";

/// Number of symbols in every code.
pub const SHORTCODE_LENGTH: usize = 6;

const RADIX: u32 = 33;

/// Codes already handed out during this invocation.
#[derive(Debug, Default, Clone)]
pub struct ShortIdCache {
    issued: HashSet<String>,
}

impl ShortIdCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.issued.contains(code)
    }

    /// Reserve a code that was issued elsewhere (e.g. reloaded by the caller).
    pub fn reserve(&mut self, code: impl Into<String>) -> bool {
        self.issued.insert(code.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

/// Derive the short code for `id`, unique within `cache`.
///
/// The returned code is recorded in the cache.
pub fn generate(id: &str, cache: &mut ShortIdCache) -> String {
    let mut number = Sha256::digest(id.as_bytes()).to_vec();
    loop {
        let code = encode_number(&number);
        if !cache.contains(&code) {
            cache.issued.insert(code.clone());
            return code;
        }
        tracing::trace!(id, code = %code, "short code collision, perturbing");
        increment(&mut number);
    }
}

/// Assign codes to `ids` in the order given, with a fresh cache.
///
/// Feeding the same ids in the same order always yields the same codes.
pub fn assign_all<'a, I>(ids: I) -> Vec<(String, &'a str)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut cache = ShortIdCache::new();
    ids.into_iter()
        .map(|id| (generate(id, &mut cache), id))
        .collect()
}

/// Whether `candidate` has the shape of a short code.
#[must_use]
pub fn is_short_code(candidate: &str) -> bool {
    candidate.len() == SHORTCODE_LENGTH && candidate.bytes().all(|b| CHARSET.contains(&b))
}

/// Short codes referenced by closing keywords in a commit message.
///
/// Recognises `close`, `fix` and `resolve` in their usual inflections,
/// followed by a code with an optional leading `#`. Matching is
/// case-insensitive; returned codes are uppercase and deduplicated in order
/// of appearance.
#[must_use]
pub fn closing_codes(message: &str) -> Vec<String> {
    const KEYWORDS: [&str; 9] = [
        "close", "closes", "closed", "fix", "fixes", "fixed", "resolve", "resolves", "resolved",
    ];

    let mut found: Vec<String> = Vec::new();
    let mut words = message.split_whitespace().peekable();
    while let Some(word) = words.next() {
        let keyword = word.trim_end_matches(':').to_lowercase();
        if !KEYWORDS.contains(&keyword.as_str()) {
            continue;
        }
        let Some(next) = words.peek() else { break };
        let code = next
            .trim_start_matches('#')
            .trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | ')' | ']'))
            .to_uppercase();
        if is_short_code(&code) && !found.contains(&code) {
            found.push(code);
        }
    }
    found
}

fn encode_number(number: &[u8]) -> String {
    let mut n = number.to_vec();
    let mut symbols = [0u8; SHORTCODE_LENGTH];
    for slot in symbols.iter_mut().rev() {
        let rem = div_rem_in_place(&mut n, RADIX);
        *slot = CHARSET[rem as usize];
    }
    symbols.iter().map(|&b| char::from(b)).collect()
}

/// Divide a big-endian integer by a small divisor, returning the remainder.
#[allow(clippy::cast_possible_truncation)]
fn div_rem_in_place(n: &mut [u8], divisor: u32) -> u32 {
    let mut rem = 0u32;
    for byte in n.iter_mut() {
        let acc = (rem << 8) | u32::from(*byte);
        // rem < divisor, so the quotient always fits in a byte
        *byte = (acc / divisor) as u8;
        rem = acc % divisor;
    }
    rem
}

fn increment(n: &mut Vec<u8>) {
    for byte in n.iter_mut().rev() {
        let (value, overflow) = byte.overflowing_add(1);
        *byte = value;
        if !overflow {
            return;
        }
    }
    n.insert(0, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_excludes_ambiguous_symbols() {
        assert_eq!(CHARSET.len(), 33);
        for b in [b'0', b'O', b'I'] {
            assert!(!CHARSET.contains(&b));
        }
    }

    #[test]
    fn test_generate_deterministic_with_fresh_cache() {
        let id = "6f1c7d1e-3b1a-4a8e-9a57-0c7f2d8c1b11";
        let first = generate(id, &mut ShortIdCache::new());
        let second = generate(id, &mut ShortIdCache::new());
        assert_eq!(first, second);
        assert_eq!(first.len(), SHORTCODE_LENGTH);
        assert!(is_short_code(&first));
    }

    #[test]
    fn test_generate_avoids_cached_code() {
        let id = "issue-a";
        let mut cache = ShortIdCache::new();
        let first = generate(id, &mut cache);
        let second = generate(id, &mut cache);
        assert_ne!(first, second);
        assert!(cache.contains(&first));
        assert!(cache.contains(&second));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reserved_code_is_skipped() {
        let id = "issue-b";
        let code = generate(id, &mut ShortIdCache::new());
        let mut cache = ShortIdCache::new();
        cache.reserve(code.clone());
        assert_ne!(generate(id, &mut cache), code);
    }

    #[test]
    fn test_encode_number_small_values() {
        // 0 -> all first symbols, 33 -> "...BA"
        assert_eq!(encode_number(&[0]), "AAAAAA");
        assert_eq!(encode_number(&[33]), "AAAABA");
        assert_eq!(encode_number(&[0, 32]), "AAAAA9");
    }

    #[test]
    fn test_increment_carries() {
        let mut n = vec![0x00, 0xff, 0xff];
        increment(&mut n);
        assert_eq!(n, vec![0x01, 0x00, 0x00]);

        let mut n = vec![0xff];
        increment(&mut n);
        assert_eq!(n, vec![0x01, 0x00]);
    }

    #[test]
    fn test_assign_all_is_stable() {
        let ids = ["a", "b", "c"];
        let first = assign_all(ids);
        let second = assign_all(ids);
        assert_eq!(first, second);
        let codes: HashSet<_> = first.iter().map(|(c, _)| c.clone()).collect();
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn test_closing_codes() {
        let msg = "Tidy the parser\n\nCloses #ABC123, fixes: xyz789.\nresolves QWE (too short)\nfixed #ABC123";
        assert_eq!(closing_codes(msg), vec!["ABC123", "XYZ789"]);
    }

    #[test]
    fn test_closing_codes_rejects_ambiguous_symbols() {
        // '0' and 'O' never appear in a code
        assert!(closing_codes("closes AB0C12").is_empty());
        assert!(closing_codes("closes").is_empty());
    }
}
