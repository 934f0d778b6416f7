//! Construction-time configuration. Nothing here can change once a table exists.

use crate::error::TableError;

pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.65;

/// Upper bound (exclusive) on string key length used by `StrTable::new`.
pub const DEFAULT_MAX_KEY_LEN: usize = 256;

/// Offset sequence applied to the start index on each probe attempt.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Probing {
    /// offset = attempt
    #[default]
    Linear,
    /// offset = attempt²
    Quadratic,
}

impl Probing {
    /// Offset for probe attempt `x`, already reduced modulo `capacity`.
    #[inline]
    pub(crate) fn offset(self, x: u64, capacity: u64) -> u64 {
        match self {
            Probing::Linear => x % capacity,
            Probing::Quadratic => {
                let x = x % capacity;
                ((x as u128 * x as u128) % capacity as u128) as u64
            }
        }
    }
}

/// How keys are shaped and compared.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyLayout {
    /// Every key is exactly this many bytes.
    Fixed(usize),
    /// Keys are strings shorter than `max_len` bytes with no NUL byte.
    Bounded { max_len: usize },
}

impl KeyLayout {
    pub(crate) fn validate(self) -> Result<(), TableError> {
        match self {
            KeyLayout::Fixed(0) => Err(TableError::ZeroKeySize),
            KeyLayout::Bounded { max_len: 0 } => Err(TableError::ZeroMaxKeyLen),
            _ => Ok(()),
        }
    }

    /// Checks a single key against the layout.
    pub(crate) fn check_key(self, key: &[u8]) -> Result<(), TableError> {
        match self {
            KeyLayout::Fixed(expected) if key.len() != expected => Err(TableError::KeyLength {
                expected,
                got: key.len(),
            }),
            KeyLayout::Fixed(_) => Ok(()),
            KeyLayout::Bounded { max_len } if key.len() >= max_len => {
                Err(TableError::KeyTooLong {
                    len: key.len(),
                    max: max_len,
                })
            }
            KeyLayout::Bounded { .. } if key.contains(&0) => Err(TableError::KeyContainsNul),
            KeyLayout::Bounded { .. } => Ok(()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub probing: Probing,
    pub max_load_factor: f64,
    /// Round resize targets up to the next prime.
    pub prime_capacity: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            probing: Probing::Linear,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            prime_capacity: true,
        }
    }
}

impl TableConfig {
    pub fn with_probing(mut self, probing: Probing) -> Self {
        self.probing = probing;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn with_prime_capacity(mut self, prime_capacity: bool) -> Self {
        self.prime_capacity = prime_capacity;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), TableError> {
        // NaN fails both comparisons.
        if self.max_load_factor > 0.0 && self.max_load_factor < 1.0 {
            Ok(())
        } else {
            Err(TableError::InvalidLoadFactor(self.max_load_factor))
        }
    }

    /// Capacity a resize request for `desired` slots actually produces.
    pub(crate) fn round_capacity(&self, desired: usize) -> usize {
        if self.prime_capacity {
            crate::hashing::next_prime(desired)
        } else {
            desired
        }
    }

    /// True when holding `count` entries in `capacity` slots reaches the threshold.
    #[inline]
    pub(crate) fn at_threshold(&self, count: usize, capacity: usize) -> bool {
        capacity == 0 || count as f64 / capacity as f64 >= self.max_load_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TableConfig::default();
        assert_eq!(c.probing, Probing::Linear);
        assert_eq!(c.max_load_factor, 0.65);
        assert!(c.prime_capacity);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn load_factor_bounds_are_exclusive() {
        for lf in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let c = TableConfig::default().with_max_load_factor(lf);
            assert!(c.validate().is_err(), "{lf} accepted");
        }
        assert!(TableConfig::default()
            .with_max_load_factor(0.99)
            .validate()
            .is_ok());
    }

    #[test]
    fn quadratic_offsets_are_squares_mod_capacity() {
        let q = Probing::Quadratic;
        assert_eq!(q.offset(0, 7), 0);
        assert_eq!(q.offset(1, 7), 1);
        assert_eq!(q.offset(2, 7), 4);
        assert_eq!(q.offset(3, 7), 2);
        assert_eq!(Probing::Linear.offset(9, 7), 2);
    }

    #[test]
    fn quadratic_offset_does_not_overflow() {
        let cap = u64::MAX - 58;
        let x = cap - 1;
        // (cap - 1)² ≡ 1 (mod cap)
        assert_eq!(Probing::Quadratic.offset(x, cap), 1);
    }

    #[test]
    fn key_checks() {
        let fixed = KeyLayout::Fixed(4);
        assert!(fixed.check_key(&[1, 2, 3, 4]).is_ok());
        assert_eq!(
            fixed.check_key(&[1, 2, 3]),
            Err(TableError::KeyLength {
                expected: 4,
                got: 3
            })
        );

        let bounded = KeyLayout::Bounded { max_len: 4 };
        assert!(bounded.check_key(b"").is_ok());
        assert!(bounded.check_key(b"abc").is_ok());
        assert_eq!(
            bounded.check_key(b"abcd"),
            Err(TableError::KeyTooLong { len: 4, max: 4 })
        );
        assert_eq!(bounded.check_key(b"a\0b"), Err(TableError::KeyContainsNul));

        assert_eq!(KeyLayout::Fixed(0).validate(), Err(TableError::ZeroKeySize));
        assert_eq!(
            KeyLayout::Bounded { max_len: 0 }.validate(),
            Err(TableError::ZeroMaxKeyLen)
        );
    }
}
