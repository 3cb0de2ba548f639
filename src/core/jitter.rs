//! Deterministic anti-degeneracy adjustment for match scores.
//!
//! Weighted averages over sparse postings collapse onto the same value for
//! many jobs. The offset applied here is a pure function of the posting's
//! identity (title + company), so the same posting always moves by the same
//! amount and rankings stay reproducible across runs and builds.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Largest absolute offset applied to a raw score
pub const MAX_OFFSET: i64 = 10;

/// Scores landing in this band are pushed out of it
pub const DEGENERATE_BAND: (i64, i64) = (48, 52);
pub const BAND_ESCAPE: i64 = 7;

pub const MIN_SCORE: i64 = 15;
pub const MAX_SCORE: i64 = 95;

/// 64-bit FNV-1a over the UTF-8 bytes of `input`
#[inline]
pub fn fnv1a_64(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Stable identity key of a posting for jitter purposes
pub fn identity_key(title: &str, company: &str) -> String {
    format!(
        "{}\u{1f}{}",
        title.trim().to_lowercase(),
        company.trim().to_lowercase()
    )
}

/// Offset in [-MAX_OFFSET, +MAX_OFFSET] derived from the posting identity
pub fn jitter_offset(title: &str, company: &str) -> i64 {
    let span = (2 * MAX_OFFSET + 1) as u64;
    (fnv1a_64(&identity_key(title, company)) % span) as i64 - MAX_OFFSET
}

/// Apply the offset, escape the degenerate band and clamp to the final range
pub fn apply_jitter(raw: f64, title: &str, company: &str) -> u8 {
    let raw = if raw.is_finite() { raw } else { 0.0 };
    let mut adjusted = (raw + jitter_offset(title, company) as f64).round() as i64;

    if (DEGENERATE_BAND.0..=DEGENERATE_BAND.1).contains(&adjusted) {
        adjusted += BAND_ESCAPE;
    }

    adjusted.clamp(MIN_SCORE, MAX_SCORE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_vectors() {
        assert_eq!(fnv1a_64(""), 0xcbf29ce484222325);
        assert_eq!(fnv1a_64("a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_offset_is_bounded_and_stable() {
        for i in 0..200 {
            let title = format!("Engineer {}", i);
            let offset = jitter_offset(&title, "Acme");
            assert!((-MAX_OFFSET..=MAX_OFFSET).contains(&offset));
            assert_eq!(offset, jitter_offset(&title, "Acme"));
        }
    }

    #[test]
    fn test_identity_ignores_case_and_padding() {
        assert_eq!(
            jitter_offset("Data Scientist", "TechCorp"),
            jitter_offset("  data scientist ", "TECHCORP")
        );
    }

    #[test]
    fn test_never_returns_fifty() {
        for raw in 0..=100 {
            for i in 0..50 {
                let score = apply_jitter(raw as f64, &format!("Role {}", i), "Company");
                assert_ne!(score, 50);
                assert!((15..=95).contains(&score));
            }
        }
    }

    #[test]
    fn test_non_finite_raw_is_clamped() {
        let score = apply_jitter(f64::NAN, "Role", "Company");
        assert!((15..=95).contains(&score));
    }
}
