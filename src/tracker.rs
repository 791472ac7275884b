//! Placement of chips into blanks.
//!
//! Nothing is judged here. A placement only records which word the user put
//! into which group; the evaluator decides once every blank is filled.

use tracing::debug;

use crate::challenge::{Challenge, Chip, ChipId};
use crate::error::AssignError;

/// The chip the user dropped into the blank of `group`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWord {
    pub group: usize,
    pub chip: ChipId,
}

/// One backup check attempt: the challenge plus what the user placed so far.
#[derive(Debug, Clone)]
pub struct Attempt {
    challenge: Challenge,
    assigned: Vec<bool>,
    placed: Vec<Option<ValidationWord>>,
}

impl Attempt {
    pub fn new(challenge: Challenge) -> Self {
        let chips = challenge.chips().len();
        let groups = challenge.group_count();
        Attempt {
            challenge,
            assigned: vec![false; chips],
            placed: vec![None; groups],
        }
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    /// Drops `chip` into the blank of `group`.
    ///
    /// A group that already holds a word must be released first; silently
    /// overwriting would hide which of two words the user meant.
    pub fn assign(&mut self, chip: ChipId, group: usize) -> Result<(), AssignError> {
        if self.is_complete() {
            return Err(AssignError::AttemptComplete);
        }
        let groups = self.placed.len();
        if group >= groups {
            return Err(AssignError::GroupOutOfRange { group, groups });
        }
        match self.assigned.get(chip.0) {
            None => return Err(AssignError::UnknownChip(chip)),
            Some(true) => return Err(AssignError::ChipAlreadyAssigned(chip)),
            Some(false) => {}
        }
        if self.placed[group].is_some() {
            return Err(AssignError::GroupOccupied(group));
        }

        self.assigned[chip.0] = true;
        self.placed[group] = Some(ValidationWord { group, chip });
        debug!(%chip, group, filled = self.filled(), "chip placed");
        Ok(())
    }

    /// Takes the word back out of `group` and returns its chip to the pool.
    pub fn release(&mut self, group: usize) -> Result<ChipId, AssignError> {
        let groups = self.placed.len();
        let slot = self
            .placed
            .get_mut(group)
            .ok_or(AssignError::GroupOutOfRange { group, groups })?;
        let word = slot.take().ok_or(AssignError::GroupEmpty(group))?;

        self.assigned[word.chip.0] = false;
        debug!(chip = %word.chip, group, "chip released");
        Ok(word.chip)
    }

    /// Every group holds exactly one word.
    pub fn is_complete(&self) -> bool {
        self.filled() == self.placed.len()
    }

    pub fn filled(&self) -> usize {
        self.placed.iter().filter(|p| p.is_some()).count()
    }

    pub fn validation_words(&self) -> impl Iterator<Item = &ValidationWord> {
        self.placed.iter().flatten()
    }

    /// Word currently sitting in the blank of `group`.
    pub fn placed_word(&self, group: usize) -> Option<&str> {
        let word = self.placed.get(group)?.as_ref()?;
        self.challenge.chip(word.chip).map(Chip::word)
    }

    /// Chips still waiting to be placed, in display order.
    pub fn unassigned_chips(&self) -> impl Iterator<Item = &Chip> {
        self.challenge
            .chips()
            .iter()
            .zip(&self.assigned)
            .filter(|&(_, taken)| !*taken)
            .map(|(chip, _)| chip)
    }
}
