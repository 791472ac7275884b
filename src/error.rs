//! Typed errors for phrase loading, chip placement and flow dispatch.
//!
//! A failed backup check is not an error: it is [`Outcome::Failed`](crate::Outcome)
//! and is surfaced through the flow like any other stage.

use thiserror::Error;

use crate::challenge::ChipId;
use crate::flow::Stage;

#[derive(Error, Debug)]
pub enum MnemonicError {
    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("Failed to generate entropy")]
    EntropyGenerationFailed,

    #[error(transparent)]
    Phrase(#[from] PhraseError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhraseError {
    #[error("recovery phrase has no words")]
    Empty,

    #[error("word {position} of the recovery phrase is empty")]
    EmptyWord { position: usize },

    #[error("{words} words cannot be split into {groups} equal groups")]
    UnevenGroups { words: usize, groups: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    #[error("no chip {0} in this attempt")]
    UnknownChip(ChipId),

    #[error("chip {0} is already placed")]
    ChipAlreadyAssigned(ChipId),

    #[error("group {group} out of range, phrase has {groups} groups")]
    GroupOutOfRange { group: usize, groups: usize },

    #[error("group {0} already holds a word, release it first")]
    GroupOccupied(usize),

    #[error("group {0} holds no word")]
    GroupEmpty(usize),

    #[error("every blank is filled, the attempt is being evaluated")]
    AttemptComplete,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("{action} is not allowed while {stage:?}")]
    NotAllowed { action: &'static str, stage: Stage },

    #[error("no recovery phrase loaded")]
    NoPhrase,

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Phrase(#[from] PhraseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config: group_count must be at least 1")]
    ZeroGroups,
}
