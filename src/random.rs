//! Randomness used to build a backup check attempt.
//!
//! Nothing here protects a secret: the holder already knows the phrase. The
//! choices only need to be uniform so repeated attempts do not fall into a
//! guessable pattern. Tests inject a seeded or scripted source.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub trait ChallengeRandom {
    /// Picks the word to hide in a group of `group_len` words.
    fn missing_index(&mut self, group_len: usize) -> usize;

    /// Reorders chips for display.
    fn shuffle<T>(&mut self, chips: &mut [T]);
}

/// [`ChallengeRandom`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngChallenge<R> {
    rng: R,
}

impl<R: Rng> RngChallenge<R> {
    pub fn new(rng: R) -> Self {
        RngChallenge { rng }
    }
}

impl RngChallenge<StdRng> {
    pub fn from_entropy() -> Self {
        RngChallenge::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        RngChallenge::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ChallengeRandom for RngChallenge<R> {
    fn missing_index(&mut self, group_len: usize) -> usize {
        self.rng.gen_range(0..group_len)
    }

    fn shuffle<T>(&mut self, chips: &mut [T]) {
        chips.shuffle(&mut self.rng);
    }
}

impl<C: ChallengeRandom> ChallengeRandom for &mut C {
    fn missing_index(&mut self, group_len: usize) -> usize {
        (**self).missing_index(group_len)
    }

    fn shuffle<T>(&mut self, chips: &mut [T]) {
        (**self).shuffle(chips)
    }
}
