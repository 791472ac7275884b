use std::fmt;

use zeroize::Zeroize;

use crate::error::PhraseError;

/// Number of groups a phrase is split into for the backup check.
pub const DEFAULT_GROUP_COUNT: usize = 4;

/// An ordered recovery phrase split into equal, contiguous groups.
///
/// The words are wiped from memory when the value is dropped and never show
/// up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryPhrase {
    words: Vec<String>,
    group_count: usize,
}

impl RecoveryPhrase {
    /// Builds a phrase from already validated words.
    pub fn new(words: Vec<String>, group_count: usize) -> Result<Self, PhraseError> {
        if words.is_empty() {
            return Err(PhraseError::Empty);
        }
        if let Some(position) = words.iter().position(|w| w.is_empty()) {
            return Err(PhraseError::EmptyWord { position });
        }
        if group_count == 0 || words.len() % group_count != 0 {
            return Err(PhraseError::UnevenGroups {
                words: words.len(),
                groups: group_count,
            });
        }

        Ok(RecoveryPhrase { words, group_count })
    }

    /// Splits a space separated phrase into words.
    pub fn parse(phrase: &str, group_count: usize) -> Result<Self, PhraseError> {
        let words = phrase.split_whitespace().map(str::to_owned).collect();
        Self::new(words, group_count)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn group_len(&self) -> usize {
        self.words.len() / self.group_count
    }

    /// Words of group `index`, or `None` past the last group.
    pub fn group(&self, index: usize) -> Option<&[String]> {
        if index >= self.group_count {
            return None;
        }
        let len = self.group_len();
        Some(&self.words[index * len..(index + 1) * len])
    }

    pub fn groups(&self) -> impl Iterator<Item = &[String]> {
        self.words.chunks(self.group_len())
    }

    /// Position of a group-local index in the full phrase.
    pub fn position(&self, group: usize, local: usize) -> usize {
        group * self.group_len() + local
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryPhrase")
            .field("words", &format_args!("<{} redacted>", self.words.len()))
            .field("group_count", &self.group_count)
            .finish()
    }
}

impl Drop for RecoveryPhrase {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}
