//! Algorand 25-word mnemonics.
//!
//! The first 24 words encode a 32-byte ed25519 seed as little-endian 11-bit groups. The 25th
//! word is a checksum: the first 11 bits of the SHA-512/256 digest of the seed.

mod english;

use crate::constants::{Byte32, MNEMONIC_BITS_PER_WORD, MNEMONIC_WORD_COUNT};
use crate::error::TransactError;
use crate::utils::hash;
use english::ENGLISH;

const KEY_WORD_COUNT: usize = MNEMONIC_WORD_COUNT - 1;
const WORD_MASK: u32 = (1 << MNEMONIC_BITS_PER_WORD) - 1;

/// Encodes a 32-byte seed as a 25-word mnemonic.
pub fn from_key(key: &Byte32) -> String {
    let mut words: Vec<&str> = to_uint11(key)
        .into_iter()
        .map(|index| ENGLISH[index as usize])
        .collect();
    words.push(checksum_word(key));
    words.join(" ")
}

/// Decodes a 25-word mnemonic into the 32-byte seed it encodes.
///
/// Words are matched case-insensitively and may be separated by any whitespace.
pub fn to_key(mnemonic: &str) -> Result<Byte32, TransactError> {
    let words: Vec<String> = mnemonic
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    if words.len() != MNEMONIC_WORD_COUNT {
        return Err(TransactError::InvalidMnemonic {
            message: format!(
                "expected {} words, got {}",
                MNEMONIC_WORD_COUNT,
                words.len()
            ),
        });
    }

    let indices = words[..KEY_WORD_COUNT]
        .iter()
        .map(|word| {
            ENGLISH
                .binary_search(&word.as_str())
                .map(|index| index as u32)
                .map_err(|_| TransactError::InvalidMnemonic {
                    message: format!("'{word}' is not in the word list"),
                })
        })
        .collect::<Result<Vec<u32>, TransactError>>()?;

    let bytes = to_uint8(&indices);
    // 24 words carry 264 bits, the final byte is padding and must be empty.
    let key: Byte32 = match bytes.split_last() {
        Some((&0, key)) => key.try_into().map_err(|_| TransactError::InvalidMnemonic {
            message: "mnemonic does not decode to a 32-byte key".to_string(),
        })?,
        _ => {
            return Err(TransactError::InvalidMnemonic {
                message: "mnemonic does not decode to a 32-byte key".to_string(),
            });
        }
    };

    if checksum_word(&key) != words[KEY_WORD_COUNT] {
        return Err(TransactError::InvalidMnemonic {
            message: "checksum word does not match".to_string(),
        });
    }

    Ok(key)
}

fn checksum_word(key: &Byte32) -> &'static str {
    let digest = hash(key);
    let index = to_uint11(&digest[..2])[0];
    ENGLISH[index as usize]
}

fn to_uint11(bytes: &[u8]) -> Vec<u32> {
    let mut out = Vec::with_capacity(bytes.len() * 8 / MNEMONIC_BITS_PER_WORD + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for byte in bytes {
        buffer |= u32::from(*byte) << bits;
        bits += 8;
        if bits >= MNEMONIC_BITS_PER_WORD {
            out.push(buffer & WORD_MASK);
            buffer >>= MNEMONIC_BITS_PER_WORD;
            bits -= MNEMONIC_BITS_PER_WORD;
        }
    }
    if bits > 0 {
        out.push(buffer & WORD_MASK);
    }
    out
}

fn to_uint8(indices: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len() * MNEMONIC_BITS_PER_WORD / 8 + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for index in indices {
        buffer |= index << bits;
        bits += MNEMONIC_BITS_PER_WORD;
        while bits >= 8 {
            out.push((buffer & 0xff) as u8);
            buffer >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push((buffer & 0xff) as u8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SEED: Byte32 = [
        2, 205, 103, 33, 67, 14, 82, 196, 115, 196, 206, 254, 50, 110, 63, 182, 149, 229, 184,
        216, 93, 11, 13, 99, 69, 213, 218, 165, 134, 118, 47, 44,
    ];
    const SEED_MNEMONIC: &str = "park palace mouse tomorrow piano valve castle solution garlic rhythm cabbage fork sleep comfort uphold area giant better height frozen ask tank gesture ability little";

    #[test]
    fn test_zero_key() {
        let expected = format!("{} invest", vec!["abandon"; 24].join(" "));
        assert_eq!(from_key(&[0u8; 32]), expected);
        assert_eq!(to_key(&expected).unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_known_seed() {
        assert_eq!(from_key(&SEED), SEED_MNEMONIC);
        assert_eq!(to_key(SEED_MNEMONIC).unwrap(), SEED);
    }

    #[test]
    fn test_whitespace_and_case_are_ignored() {
        let noisy = format!("  {}\n", SEED_MNEMONIC.to_uppercase().replace(' ', "   "));
        assert_eq!(to_key(&noisy).unwrap(), SEED);
    }

    #[rstest]
    #[case::too_few_words(
        SEED_MNEMONIC.rsplit_once(' ').unwrap().0.to_string(),
        "expected 25 words, got 24"
    )]
    #[case::unknown_word(
        SEED_MNEMONIC.replacen("park", "parkk", 1),
        "'parkk' is not in the word list"
    )]
    #[case::wrong_checksum(
        SEED_MNEMONIC.replace(" little", " abandon"),
        "checksum word does not match"
    )]
    fn test_invalid_mnemonics(#[case] mnemonic: String, #[case] expected: &str) {
        let err = to_key(&mnemonic).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "unexpected error message: {err}"
        );
    }
}
