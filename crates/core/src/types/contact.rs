//! Validated contact fields: display name and phone number.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};

/// Two capitalized words of 2-15 letters, both Latin or both Cyrillic.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Z][a-z]{1,14} [A-Z][a-z]{1,14}|[А-Я][а-я]{1,14} [А-Я][а-я]{1,14})$")
        .expect("name pattern is a valid regex")
});

/// Ukrainian phone number with optional `+38`/`38`/`8` prefix and a
/// three-digit operator code, optionally in parentheses.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((\+?3)?8)?((0\(\d{2}\)?)|(\(0\d{2}\))|(0\d{2}))\d{7}$")
        .expect("phone pattern is a valid regex")
});

/// Error returned when a contact name fails validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactNameError {
    #[error("name is required")]
    Empty,
    #[error("name must be two capitalized words, e.g. \"Jane Doe\"")]
    InvalidFormat,
}

/// Error returned when a phone number fails validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone is required")]
    Empty,
    #[error("phone must be a Ukrainian number, e.g. \"0501234567\" or \"+380501234567\"")]
    InvalidFormat,
}

/// A contact's display name ("First Last").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ContactName(String);

impl ContactName {
    /// Parse a `ContactName`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not two capitalized words.
    pub fn parse(s: &str) -> Result<Self, ContactNameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ContactNameError::Empty);
        }
        if !NAME_PATTERN.is_match(trimmed) {
            return Err(ContactNameError::InvalidFormat);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContactName {
    type Error = ContactNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContactName> for String {
    fn from(name: ContactName) -> Self {
        name.0
    }
}

/// A phone number as entered by the user (digits and the allowed punctuation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not a recognised number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !PHONE_PATTERN.is_match(trimmed) {
            return Err(PhoneError::InvalidFormat);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

/// A contact's email address.
///
/// Validated like an account [`Email`], but only surrounding whitespace is
/// removed: the address comes back exactly as the user typed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Parse a `ContactEmail`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Email::parse`].
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let trimmed = s.trim();
        Email::parse(trimmed)?;
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContactEmail {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContactEmail> for String {
    fn from(email: ContactEmail) -> Self {
        email.0
    }
}

#[cfg(feature = "postgres")]
impl_pg_text!(ContactName, ContactName::parse);
#[cfg(feature = "postgres")]
impl_pg_text!(Phone, Phone::parse);
#[cfg(feature = "postgres")]
impl_pg_text!(ContactEmail, ContactEmail::parse);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_accepts_two_capitalized_words() {
        assert!(ContactName::parse("Jane Doe").is_ok());
        assert!(ContactName::parse("  Allen Raymond ").is_ok());
        assert!(ContactName::parse("Тарас Шевченко").is_ok());
    }

    #[test]
    fn test_name_rejects_bad_shapes() {
        assert_eq!(ContactName::parse(""), Err(ContactNameError::Empty));
        for input in ["jane doe", "Jane", "Jane Van Doe", "J Doe", "Jane Дое", "JANE DOE"] {
            assert_eq!(
                ContactName::parse(input),
                Err(ContactNameError::InvalidFormat),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_contact_email_keeps_case() {
        let email = ContactEmail::parse("  John.Doe@Mail.com ").unwrap();
        assert_eq!(email.as_str(), "John.Doe@Mail.com");

        assert_eq!(ContactEmail::parse("nope"), Err(EmailError::InvalidFormat));
        assert_eq!(ContactEmail::parse("  "), Err(EmailError::Empty));
    }

    #[test]
    fn test_phone_accepts_known_formats() {
        for input in ["0501234567", "80501234567", "380501234567", "+380501234567", "(050)1234567", "0(50)1234567"] {
            assert!(Phone::parse(input).is_ok(), "{input} should be accepted");
        }
    }

    #[test]
    fn test_phone_rejects_bad_numbers() {
        assert_eq!(Phone::parse(" "), Err(PhoneError::Empty));
        for input in ["12345", "050-123-45-67", "+1 555 123 4567", "05012345678"] {
            assert_eq!(
                Phone::parse(input),
                Err(PhoneError::InvalidFormat),
                "{input} should be rejected"
            );
        }
    }
}
