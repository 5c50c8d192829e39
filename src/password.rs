//! Random password generation.
//!
//! Character sets leave out look-alikes (`0`/`O`, `1`/`l`/`I`, `i`, `j`, `o`).
//! A generated password holds exactly the requested number of symbols and
//! digits; the rest are letters.  With at least two letters it also starts
//! and ends with one.

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

const LOWER: &[u8] = b"abcdefghkmnpqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"_!@#$%^&*";

/// Longest password we will generate.
pub const MAX_LENGTH: usize = 1024;

/// Shape of a generated password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Total length in characters.
    pub length: usize,
    /// How many characters come from the symbol set.
    pub symbols: usize,
    /// How many characters come from the digit set.
    pub digits: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 15,
            symbols: 3,
            digits: 3,
        }
    }
}

impl PasswordPolicy {
    /// Letters only.
    pub fn letters_only(length: usize) -> Self {
        Self {
            length,
            symbols: 0,
            digits: 0,
        }
    }

    fn check(&self) -> Result<()> {
        if self.length == 0 || self.length > MAX_LENGTH {
            return Err(VaultError::InvalidPolicy(format!(
                "length must be 1-{MAX_LENGTH}, got {}",
                self.length
            )));
        }
        if self.symbols + self.digits > self.length {
            return Err(VaultError::InvalidPolicy(format!(
                "{} symbols and {} digits do not fit in {} characters",
                self.symbols, self.digits, self.length
            )));
        }
        Ok(())
    }
}

/// Generate a password following `policy`.
pub fn generate(policy: &PasswordPolicy) -> Result<Zeroizing<String>> {
    policy.check()?;
    let mut rng = rand::rng();

    let letters = policy.length - policy.symbols - policy.digits;
    let mut chars = Zeroizing::new(Vec::with_capacity(policy.length));
    for (set, count) in [(SYMBOLS, policy.symbols), (DIGITS, policy.digits)] {
        for _ in 0..count {
            chars.push(set[rng.random_range(0..set.len())]);
        }
    }
    for _ in 0..letters {
        let pick = rng.random_range(0..LOWER.len() + UPPER.len());
        chars.push(if pick < LOWER.len() {
            LOWER[pick]
        } else {
            UPPER[pick - LOWER.len()]
        });
    }

    chars.shuffle(&mut rng);
    if letters >= 2 {
        letters_at_ends(&mut chars, &mut rng);
    }

    // Every byte comes from an ASCII set.
    Ok(Zeroizing::new(chars.iter().map(|&b| char::from(b)).collect()))
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Swap a randomly chosen inner letter into each end that holds a
/// symbol or digit.  Needs at least two letters.
fn letters_at_ends(chars: &mut [u8], rng: &mut impl Rng) {
    let last = chars.len() - 1;
    for end in [0, last] {
        if is_letter(chars[end]) {
            continue;
        }
        let candidates: Vec<usize> = (1..last).filter(|&i| is_letter(chars[i])).collect();
        if !candidates.is_empty() {
            let pick = candidates[rng.random_range(0..candidates.len())];
            chars.swap(end, pick);
        }
    }
}
