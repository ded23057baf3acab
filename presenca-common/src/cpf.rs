//! CPF (Cadastro de Pessoas Físicas) validation
//!
//! A CPF is an 11-digit identifier whose last two digits are check digits
//! computed with a modulo-11 weighted sum over the preceding digits.
//!
//! Two levels of checking are provided:
//! - [`validate`]: full validation (format, repeated digits, check digits)
//! - [`check_format`]: structural check only (exactly 11 ASCII digits)

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of digits in a CPF
pub const CPF_LENGTH: usize = 11;

/// Reasons a string is not a valid CPF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidCpf {
    #[error("CPF must have 11 digits, got {0} characters")]
    WrongLength(usize),

    #[error("CPF must contain only digits")]
    NonDigit,

    #[error("CPF digits are all identical")]
    RepeatedDigits,

    #[error("CPF check digits do not match")]
    CheckDigitMismatch,
}

/// A validated CPF
///
/// Only constructible through [`validate`] (or `FromStr`), so holding a `Cpf`
/// means the check digits were verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// The 11 raw digits
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Punctuated form, e.g. `529.982.247-25`
    pub fn formatted(&self) -> String {
        let d = &self.0;
        format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }

    /// Form safe for logs: only the first three and the check digits are kept
    pub fn masked(&self) -> String {
        format!("{}.***.***-{}", &self.0[0..3], &self.0[9..11])
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cpf {
    type Err = InvalidCpf;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

/// Validate a CPF string
///
/// Accepts only 11 decimal digits, not all identical, whose 10th and 11th
/// digits equal the computed check digits. No normalization is performed:
/// punctuation or surrounding whitespace is rejected.
pub fn validate(input: &str) -> Result<Cpf, InvalidCpf> {
    let digits = digits_of(input)?;

    if digits.iter().all(|&d| d == digits[0]) {
        return Err(InvalidCpf::RepeatedDigits);
    }

    let first = check_digit(&digits[..9]);
    let second = check_digit(&digits[..10]);
    if first != digits[9] || second != digits[10] {
        return Err(InvalidCpf::CheckDigitMismatch);
    }

    Ok(Cpf(input.to_owned()))
}

/// Structural check only: exactly 11 ASCII digits
///
/// Used where the backend is the authority on whether the CPF exists
/// (login, promotion) and check digits are not verified locally.
pub fn check_format(input: &str) -> Result<&str, InvalidCpf> {
    digits_of(input).map(|_| input)
}

fn digits_of(input: &str) -> Result<[u8; CPF_LENGTH], InvalidCpf> {
    let len = input.chars().count();
    if len != CPF_LENGTH {
        return Err(InvalidCpf::WrongLength(len));
    }

    let mut digits = [0u8; CPF_LENGTH];
    for (slot, c) in digits.iter_mut().zip(input.chars()) {
        *slot = c.to_digit(10).ok_or(InvalidCpf::NonDigit)? as u8;
    }
    Ok(digits)
}

/// Modulo-11 check digit over `digits`, weights descending from `len + 1` to 2
fn check_digit(digits: &[u8]) -> u8 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * (top - i as u32))
        .sum();

    match (sum * 10) % 11 {
        10 | 11 => 0,
        r => r as u8,
    }
}
