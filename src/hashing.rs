//! Key hashing and prime capacity helpers.

use xxhash_rust::xxh3::xxh3_64;

/// The one hash applied to raw key bytes. Cached per entry and reused on resize.
#[inline]
pub fn hash_key(key: &[u8]) -> u64 {
    xxh3_64(key)
}

pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut i = 3usize;
    while let Some(sq) = i.checked_mul(i) {
        if sq > n {
            break;
        }
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Smallest prime `>= n`. Saturates at `n` if no prime fits in `usize`.
pub fn next_prime(n: usize) -> usize {
    if n <= 2 {
        return 2;
    }
    let mut c = n | 1;
    while !is_prime(c) {
        match c.checked_add(2) {
            Some(next) => c = next,
            None => return n,
        }
    }
    c
}
