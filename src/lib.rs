//! Recovery phrase backup check.
//!
//! After a wallet shows its recovery phrase, the user proves they wrote it
//! down: the phrase is split into groups, one word per group is hidden, and
//! the hidden words come back as shuffled chips to drop into the blanks. The
//! check passes only if the rebuilt phrase equals the original word for word.
//!
//! ```no_run
//! use phrase_check::{BackupCheck, FlowConfig, MnemonicStrength, SecureMnemonic};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FlowConfig::default();
//! let mnemonic = SecureMnemonic::generate(MnemonicStrength::Words24)?;
//! let mut check = BackupCheck::with_entropy(config.clone());
//! check.start_validation(mnemonic.recovery_phrase(config.group_count)?)?;
//!
//! let attempt = check.state().attempt().expect("attempt started");
//! for chip in attempt.unassigned_chips() {
//!     println!("{}: {}", chip.id(), chip.word());
//! }
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod flow;
pub mod mnemonic;
pub mod phrase;
pub mod random;
pub mod tracker;

pub use challenge::{Challenge, Chip, ChipId};
pub use config::FlowConfig;
pub use error::{AssignError, ConfigError, FlowError, MnemonicError, PhraseError};
pub use evaluator::{evaluate, Outcome};
pub use flow::{
    drive, Action, AttemptTicket, BackupCheck, Effect, FlowHost, Stage, ValidationState,
};
pub use mnemonic::{generate_entropy, MnemonicStrength, SecureMnemonic};
pub use phrase::{RecoveryPhrase, DEFAULT_GROUP_COUNT};
pub use random::{ChallengeRandom, RngChallenge};
pub use tracker::{Attempt, ValidationWord};
