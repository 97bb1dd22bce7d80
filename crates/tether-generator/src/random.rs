use crate::IdGenerator;
use rand::seq::IndexedRandom;
use tether_core::ShortId;

/// Draws every character uniformly at random from the alphabet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomGenerator {
    fn generate(&self, alphabet: &str, length: usize) -> ShortId {
        let symbols: Vec<char> = alphabet.chars().collect();
        let mut rng = rand::rng();
        let id: String = (0..length)
            .filter_map(|_| symbols.choose(&mut rng).copied())
            .collect();
        ShortId::new_unchecked(id)
    }
}
