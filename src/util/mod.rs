//! Shared helpers: timestamp parsing and cache key hashing.

pub mod time;

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Hash arbitrary string-ish input to a u64 cache key.
pub fn hash_key(input: &str) -> u64 {
    let mut hasher = FxHasher::default();
    input.hash(&mut hasher);
    hasher.finish()
}

/// Combine two hashes into one key (content hash + keyword fingerprint).
pub fn combine_keys(a: u64, b: u64) -> u64 {
    let mut hasher = FxHasher::default();
    a.hash(&mut hasher);
    b.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_key_is_stable() {
        assert_eq!(hash_key("abc"), hash_key("abc"));
        assert_ne!(hash_key("abc"), hash_key("abd"));
    }

    #[test]
    fn combine_keys_order_sensitive() {
        assert_ne!(combine_keys(1, 2), combine_keys(2, 1));
    }
}
