use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::MnemonicError;
use crate::phrase::RecoveryPhrase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicStrength {
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl MnemonicStrength {
    fn to_entropy_bits(self) -> usize {
        match self {
            MnemonicStrength::Words12 => 128,
            MnemonicStrength::Words15 => 160,
            MnemonicStrength::Words18 => 192,
            MnemonicStrength::Words21 => 224,
            MnemonicStrength::Words24 => 256,
        }
    }

    pub fn word_count(self) -> usize {
        // 11 bits per word, one checksum bit per 32 bits of entropy
        let bits = self.to_entropy_bits();
        (bits + bits / 32) / 11
    }

    pub fn from_word_count(words: usize) -> Option<Self> {
        match words {
            12 => Some(MnemonicStrength::Words12),
            15 => Some(MnemonicStrength::Words15),
            18 => Some(MnemonicStrength::Words18),
            21 => Some(MnemonicStrength::Words21),
            24 => Some(MnemonicStrength::Words24),
            _ => None,
        }
    }
}

/// A BIP-39 mnemonic checked against the English wordlist.
///
/// This is where the backup check gets its phrase from: either freshly
/// generated for a new wallet or parsed from what the user typed.
pub struct SecureMnemonic {
    mnemonic: Mnemonic,
}

impl SecureMnemonic {
    pub fn generate(strength: MnemonicStrength) -> Result<Self, MnemonicError> {
        let entropy_bits = strength.to_entropy_bits();
        let entropy_bytes = entropy_bits / 8;

        let entropy = generate_entropy(entropy_bytes)?;

        match Mnemonic::from_entropy(&entropy) {
            Ok(mnemonic) => {
                debug!(words = strength.word_count(), "generated mnemonic");
                Ok(Self { mnemonic })
            }
            Err(_) => Err(MnemonicError::EntropyGenerationFailed),
        }
    }

    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        match Mnemonic::parse_normalized(phrase) {
            Ok(mnemonic) => Ok(Self { mnemonic }),
            Err(_) => Err(MnemonicError::InvalidMnemonic),
        }
    }

    pub fn phrase(&self) -> Zeroizing<String> {
        let mut result = Zeroizing::new(String::new());
        for (i, word) in self.mnemonic.word_iter().enumerate() {
            if i > 0 {
                result.push(' ');
            }
            result.push_str(word);
        }
        result
    }

    pub fn word_count(&self) -> usize {
        self.mnemonic.word_iter().count()
    }

    /// Hands the words over to the backup check, split into `group_count`
    /// groups. 15, 18 and 21 word phrases do not split into four groups.
    pub fn recovery_phrase(&self, group_count: usize) -> Result<RecoveryPhrase, MnemonicError> {
        let words = self.mnemonic.word_iter().map(str::to_owned).collect();
        Ok(RecoveryPhrase::new(words, group_count)?)
    }
}

pub fn generate_entropy(byte_length: usize) -> Result<Zeroizing<Vec<u8>>, MnemonicError> {
    let mut bytes = Zeroizing::new(vec![0u8; byte_length]);
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| MnemonicError::EntropyGenerationFailed)?;
    Ok(bytes)
}
