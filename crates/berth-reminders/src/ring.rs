//! Ring hashing and wrap-around interval arithmetic.
//!
//! Reminder documents are partitioned over a 32-bit hash ring: each owner
//! hashes to a point, and the runtime's scheduling subsystem claims ranges
//! of the ring. A range `(begin, end]` may wrap past the ring's maximum,
//! so membership is derived from wrapping distance rather than ordering —
//! one check covers both the ordinary and the wrapped interval.

use sha2::{Digest, Sha256};

/// Hashes an owner identifier to its ring position.
///
/// The position must be stable across processes and releases — it is
/// persisted and later matched against ranges computed elsewhere — so it is
/// derived from a fixed cryptographic digest rather than any in-process
/// hasher.
#[must_use]
pub fn owner_hash(owner_id: &str) -> u32 {
    let digest = Sha256::digest(owner_id.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Returns whether `hash` lies in the ring interval `(begin, end]`.
///
/// Both the ordinary (`begin < end`) and the wrapped (`begin >= end`)
/// interval fall out of one wrapping-distance check: `hash` is inside when
/// its distance from `begin` is non-zero and no greater than the interval
/// width. A zero width denotes the interval covering the whole ring, which
/// still excludes `begin` itself.
#[must_use]
pub const fn in_range(hash: u32, begin: u32, end: u32) -> bool {
    let distance = hash.wrapping_sub(begin);
    let width = end.wrapping_sub(begin);
    distance != 0 && (width == 0 || distance <= width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_interval_is_half_open() {
        assert!(!in_range(100, 100, 200), "begin itself is excluded");
        assert!(in_range(101, 100, 200));
        assert!(in_range(200, 100, 200), "end itself is included");
        assert!(!in_range(201, 100, 200));
        assert!(!in_range(99, 100, 200));
    }

    #[test]
    fn wrapped_interval_covers_both_arms() {
        // (4_000_000_000, 100] wraps past u32::MAX.
        let begin = 4_000_000_000;
        let end = 100;
        assert!(!in_range(begin, begin, end), "begin itself is excluded");
        assert!(in_range(begin + 1, begin, end), "high arm start");
        assert!(in_range(u32::MAX, begin, end), "ring maximum");
        assert!(in_range(0, begin, end), "wraps through zero");
        assert!(in_range(end, begin, end), "end itself is included");
        assert!(!in_range(end + 1, begin, end));
        assert!(!in_range(2_000_000_000, begin, end), "gap between arms");
    }

    #[test]
    fn degenerate_interval_is_the_full_ring_minus_begin() {
        assert!(!in_range(42, 42, 42));
        assert!(in_range(43, 42, 42));
        assert!(in_range(0, 42, 42));
        assert!(in_range(u32::MAX, 42, 42));
    }

    #[test]
    fn hash_is_stable_and_spread() {
        assert_eq!(owner_hash("entity/42"), owner_hash("entity/42"));
        assert_ne!(owner_hash("entity/42"), owner_hash("entity/43"));
    }
}
