//! Builds one backup check attempt out of a recovery phrase.
//!
//! Each group loses one word. The lost words become chips, shown in an order
//! unrelated to the group order, and the user has to drop every chip back
//! into the right blank.

use std::fmt;

use tracing::debug;
use zeroize::Zeroize;

use crate::phrase::RecoveryPhrase;
use crate::random::ChallengeRandom;

/// Display position of a chip in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChipId(pub usize);

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A hidden word waiting to be placed.
#[derive(Clone, PartialEq, Eq)]
pub struct Chip {
    id: ChipId,
    word: String,
    // Not exposed: the order of the pool must not give away group membership.
    origin: usize,
}

impl Chip {
    pub fn id(&self) -> ChipId {
        self.id
    }

    pub fn word(&self) -> &str {
        &self.word
    }
}

impl fmt::Debug for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chip").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Drop for Chip {
    fn drop(&mut self) {
        self.word.zeroize();
    }
}

/// Group-local index of the hidden word, one entry per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MissingIndices(Vec<usize>);

impl MissingIndices {
    pub(crate) fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub(crate) fn get(&self, group: usize) -> Option<usize> {
        self.0.get(group).copied()
    }
}

/// What the user sees of one attempt: blanked groups and a chip pool.
///
/// The full phrase and the blank positions stay inside the crate; the
/// public side only knows which slots are empty and which chips are left.
#[derive(Clone)]
pub struct Challenge {
    phrase: RecoveryPhrase,
    missing: MissingIndices,
    chips: Vec<Chip>,
}

impl Challenge {
    /// Hides one word per group and shuffles the hidden words into chips.
    ///
    /// # Panics
    ///
    /// If the phrase cannot be split into equal groups. [`RecoveryPhrase`]
    /// refuses such input at construction, so this only fires on a bug.
    pub fn build<R: ChallengeRandom>(phrase: RecoveryPhrase, random: &mut R) -> Self {
        let groups = phrase.group_count();
        let group_len = phrase.group_len();
        assert!(
            groups > 0 && group_len > 0 && phrase.len() == groups * group_len,
            "recovery phrase must split into equal non-empty groups"
        );

        let missing: Vec<usize> = (0..groups)
            .map(|_| {
                let index = random.missing_index(group_len);
                assert!(
                    index < group_len,
                    "missing index {} outside group of {}",
                    index,
                    group_len
                );
                index
            })
            .collect();

        let mut hidden: Vec<(usize, String)> = missing
            .iter()
            .enumerate()
            .map(|(group, &local)| {
                let word = phrase.words()[phrase.position(group, local)].clone();
                (group, word)
            })
            .collect();
        random.shuffle(&mut hidden);

        let chips = hidden
            .into_iter()
            .enumerate()
            .map(|(slot, (origin, word))| Chip {
                id: ChipId(slot),
                word,
                origin,
            })
            .collect();

        debug!(groups, group_len, "built backup check challenge");

        let challenge = Challenge {
            phrase,
            missing: MissingIndices(missing),
            chips,
        };
        debug_assert!(challenge.pool_matches_hidden_words());
        challenge
    }

    pub(crate) fn phrase(&self) -> &RecoveryPhrase {
        &self.phrase
    }

    #[cfg(test)]
    pub(crate) fn missing(&self) -> &MissingIndices {
        &self.missing
    }

    /// Chips in display order.
    pub fn chips(&self) -> &[Chip] {
        &self.chips
    }

    pub fn chip(&self, id: ChipId) -> Option<&Chip> {
        self.chips.get(id.0)
    }

    pub fn group_count(&self) -> usize {
        self.phrase.group_count()
    }

    /// Groups as shown to the user, with `None` in place of the hidden word.
    pub fn blanked_groups(&self) -> Vec<Vec<Option<&str>>> {
        self.phrase
            .groups()
            .zip(self.missing.as_slice())
            .map(|(words, &hole)| {
                words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| if i == hole { None } else { Some(w.as_str()) })
                    .collect()
            })
            .collect()
    }

    /// Position of the blank of `group` in the full phrase.
    pub(crate) fn blank_position(&self, group: usize) -> Option<usize> {
        self.missing
            .get(group)
            .map(|local| self.phrase.position(group, local))
    }

    fn pool_matches_hidden_words(&self) -> bool {
        let mut seen = vec![false; self.group_count()];
        self.chips.len() == self.group_count()
            && self.chips.iter().all(|chip| {
                let fresh = !std::mem::replace(&mut seen[chip.origin], true);
                let expected = self
                    .blank_position(chip.origin)
                    .map(|pos| &self.phrase.words()[pos]);
                fresh && expected.map(String::as_str) == Some(chip.word())
            })
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenge")
            .field("groups", &self.group_count())
            .field("chips", &self.chips)
            .finish_non_exhaustive()
    }
}
