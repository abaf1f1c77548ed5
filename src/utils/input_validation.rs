use derive_more::derive::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AgeRange, Credential, StoredPassword};
use crate::utils::password_utils::verify;

// Usernames and regions are plain words
static LETTERS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("Failed to compile letters regex"));

const MIN_PASSWORD_LENGTH: usize = 8;

const DEFAULT_LOWER_AGE: i32 = 0;
const DEFAULT_UPPER_AGE: i32 = 100;

/// Why a form input was refused. The display form is the message shown
/// to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Rejection {
    #[error("Username is required")]
    UsernameRequired,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Old Password is required")]
    OldPasswordRequired,
    #[error("New Password is required")]
    NewPasswordRequired,
    #[error("Username must contain only letters")]
    UsernameNotLetters,
    #[error("Username not found")]
    UsernameNotFound,
    #[error("Invalid password")]
    InvalidPassword,
    // Both spellings are shown to users and kept as they are.
    #[error("Invalid Old password")]
    InvalidDefaultOldPassword,
    #[error("Invalid old password")]
    InvalidOldPassword,
    #[error("New password must be at least 8 characters long.")]
    NewPasswordTooShort,
    #[error("New password must contain at least 8 characters, including 1 uppercase, 1 lowercase, 1 number and 1 special character.")]
    NewPasswordTooWeak,
    #[error("New password must be different from current password")]
    NewPasswordUnchanged,
    #[error("Region cannot be empty")]
    RegionEmpty,
    #[error("Region must contain only letters")]
    RegionNotLetters,
    #[error("At least one age bound must be provided")]
    AgeBoundsMissing,
    #[error("Age bounds must be valid numbers")]
    AgeBoundsNotNumbers,
    #[error("Age bounds cannot be negative")]
    AgeBoundsNegative,
    #[error("Upper bound cannot be less than lower bound")]
    AgeBoundsInverted,
}

/// Outcome of a form check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }

    /// The message to show the user, empty when accepted
    pub fn message(&self) -> String {
        self.rejection().map(|r| r.to_string()).unwrap_or_default()
    }
}

impl From<Result<(), Rejection>> for Verdict {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Verdict::Accepted,
            Err(reason) => Verdict::Rejected(reason),
        }
    }
}

/// Outcome of an age range check. The range is reported whenever both
/// bounds could be parsed, even if the check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeVerdict {
    pub verdict: Verdict,
    pub range: Option<AgeRange>,
}

impl RangeVerdict {
    fn rejected(reason: Rejection, range: Option<AgeRange>) -> Self {
        Self {
            verdict: Verdict::Rejected(reason),
            range,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    pub fn message(&self) -> String {
        self.verdict.message()
    }

    /// The range to query with, only if the check passed
    pub fn accepted_range(&self) -> Option<AgeRange> {
        self.range.filter(|_| self.is_accepted())
    }
}

#[derive(Debug, Clone, Copy, Display, Error)]
pub struct InvalidInput;

/// Wrapper type for a username that has been validated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct Username(String);

impl TryFrom<String> for Username {
    type Error = InvalidInput;

    fn try_from(username: String) -> Result<Self, Self::Error> {
        username_validation(&username)?;
        Ok(Self(username))
    }
}

impl TryFrom<&str> for Username {
    type Error = InvalidInput;

    fn try_from(username: &str) -> Result<Self, Self::Error> {
        username_validation(username)?;
        Ok(Self(username.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn username_validation(username: &str) -> Result<(), InvalidInput> {
    if LETTERS_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(InvalidInput)
    }
}

fn is_blank(field: Option<&str>) -> bool {
    field.map_or(true, str::is_empty)
}

/// Fails with `missing` if the field is absent or empty
fn require(field: Option<&str>, missing: Rejection) -> Result<(), Rejection> {
    if is_blank(field) {
        Err(missing)
    } else {
        Ok(())
    }
}

fn login_fields(username: Option<&str>, password: Option<&str>) -> Result<(), Rejection> {
    require(username, Rejection::UsernameRequired)?;
    require(password, Rejection::PasswordRequired)
}

fn change_fields(
    username: Option<&str>,
    old_password: Option<&str>,
    new_password: Option<&str>,
) -> Result<(), Rejection> {
    require(username, Rejection::UsernameRequired)?;
    require(old_password, Rejection::OldPasswordRequired)?;
    require(new_password, Rejection::NewPasswordRequired)
}

fn username_shape(username: &str) -> Result<(), Rejection> {
    username_validation(username).map_err(|_| Rejection::UsernameNotLetters)
}

/// At least one digit, one lowercase, one uppercase and one character
/// outside `[A-Za-z0-9]`, and long enough.
fn is_complex(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

fn current_credential(
    stored: Option<&Credential>,
    username: &str,
    password: &str,
) -> Result<(), Rejection> {
    login_fields(Some(username), Some(password))?;
    username_shape(username)?;
    let stored = stored.ok_or(Rejection::UsernameNotFound)?;

    if verify(password, &stored.password) {
        Ok(())
    } else {
        Err(Rejection::InvalidPassword)
    }
}

fn new_credential(
    stored: Option<&Credential>,
    username: &str,
    old_password: &str,
    new_password: &str,
) -> Result<(), Rejection> {
    change_fields(Some(username), Some(old_password), Some(new_password))?;
    username_shape(username)?;
    let stored = stored.ok_or(Rejection::UsernameNotFound)?;

    if new_password == old_password {
        return Err(Rejection::NewPasswordUnchanged);
    }
    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Rejection::NewPasswordTooShort);
    }
    if !is_complex(new_password) {
        return Err(Rejection::NewPasswordTooWeak);
    }

    if verify(old_password, &stored.password) {
        Ok(())
    } else {
        match stored.password {
            StoredPassword::Default => Err(Rejection::InvalidDefaultOldPassword),
            StoredPassword::Hashed(_) => Err(Rejection::InvalidOldPassword),
        }
    }
}

/// Checks that both login fields were filled in, username first
pub fn check_fields_present<'a>(
    username: impl Into<Option<&'a str>>,
    password: impl Into<Option<&'a str>>,
) -> Verdict {
    login_fields(username.into(), password.into()).into()
}

/// Checks that the three password change fields were filled in, in form order
pub fn check_fields_present_for_change<'a>(
    username: impl Into<Option<&'a str>>,
    old_password: impl Into<Option<&'a str>>,
    new_password: impl Into<Option<&'a str>>,
) -> Verdict {
    change_fields(username.into(), old_password.into(), new_password.into()).into()
}

/// A username is one or more ASCII letters
pub fn check_username_shape(username: &str) -> Verdict {
    username_shape(username).into()
}

/// Checks a login attempt against the stored credential, if any
pub fn check_current_credential(
    stored: Option<&Credential>,
    username: &str,
    password: &str,
) -> Verdict {
    current_credential(stored, username, password).into()
}

/// Checks a password change request: the new password must differ from
/// the old one, be complex enough, and the old one must match what is
/// stored.
pub fn check_new_credential(
    stored: Option<&Credential>,
    username: &str,
    old_password: &str,
    new_password: &str,
) -> Verdict {
    new_credential(stored, username, old_password, new_password).into()
}

pub fn check_region<'a>(region: impl Into<Option<&'a str>>) -> Verdict {
    let region = region.into();
    let result = match region {
        None | Some("") => Err(Rejection::RegionEmpty),
        Some(r) if !LETTERS_REGEX.is_match(r) => Err(Rejection::RegionNotLetters),
        Some(_) => Ok(()),
    };
    result.into()
}

/// Parses an optional bound, falling back to `default` when left blank
fn parse_bound(text: Option<&str>, default: i32) -> Result<i32, Rejection> {
    match text {
        None | Some("") => Ok(default),
        Some(t) => t.parse().map_err(|_| Rejection::AgeBoundsNotNumbers),
    }
}

/// Checks the bounds typed into the age query. A blank lower bound means
/// 0 and a blank upper bound means 100, but not both may be blank.
pub fn check_age_range<'a>(
    lower: impl Into<Option<&'a str>>,
    upper: impl Into<Option<&'a str>>,
) -> RangeVerdict {
    let (lower, upper) = (lower.into(), upper.into());

    if is_blank(lower) && is_blank(upper) {
        return RangeVerdict::rejected(Rejection::AgeBoundsMissing, None);
    }

    let bounds = parse_bound(lower, DEFAULT_LOWER_AGE)
        .and_then(|l| parse_bound(upper, DEFAULT_UPPER_AGE).map(|u| AgeRange::new(l, u)));
    let range = match bounds {
        Ok(range) => range,
        Err(reason) => return RangeVerdict::rejected(reason, None),
    };

    if range.lower < 0 || range.upper < 0 {
        return RangeVerdict::rejected(Rejection::AgeBoundsNegative, Some(range));
    }
    if range.upper < range.lower {
        return RangeVerdict::rejected(Rejection::AgeBoundsInverted, Some(range));
    }

    RangeVerdict {
        verdict: Verdict::Accepted,
        range: Some(range),
    }
}
