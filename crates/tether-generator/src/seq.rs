use crate::IdGenerator;
use std::sync::atomic::{AtomicU64, Ordering};
use tether_core::ShortId;

/// A sequential id generator.
///
/// The n-th call renders `n` in base `alphabet.len()` using the alphabet as
/// digits, left-padded with the first symbol to `length`. Ids are unique
/// within one instance until the counter no longer fits in `length` digits,
/// at which point it wraps.
///
/// For distributed deployments, give each node a disjoint offset range
/// (e.g., node 1 starts at 0, node 2 at 1_000_000).
#[derive(Debug, Default)]
pub struct SeqGenerator {
    counter: AtomicU64,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self::with_offset(self.counter.load(Ordering::SeqCst))
    }
}

impl SeqGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator starting from a specific counter value.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }
}

impl IdGenerator for SeqGenerator {
    fn generate(&self, alphabet: &str, length: usize) -> ShortId {
        let symbols: Vec<char> = alphabet.chars().collect();
        let Some(&zero) = symbols.first() else {
            return ShortId::new_unchecked("");
        };

        let base = symbols.len() as u64;
        let mut n = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut digits = vec![zero; length];
        for slot in digits.iter_mut().rev() {
            *slot = symbols[(n % base) as usize];
            n /= base;
        }
        ShortId::new_unchecked(digits.into_iter().collect::<String>())
    }
}
