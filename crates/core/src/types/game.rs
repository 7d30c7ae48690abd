//! Validated catalog input.
//!
//! Everything that arrives from the admin form or a seed file passes through
//! [`GameDraft::parse`] or [`NewGame::validate`] before it reaches the database,
//! so repositories can assume well-formed values.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::platform::{Platform, PlatformParseError};
use super::price::{Price, PriceError};

/// Maximum length of a game name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of developer and publisher names.
pub const MAX_STUDIO_LENGTH: usize = 120;

/// Maximum length of a game description.
pub const MAX_DETAILS_LENGTH: usize = 5000;

/// Errors raised while validating catalog input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length in characters.
        max: usize,
    },

    /// The platform is not one the store sells.
    #[error(transparent)]
    Platform(#[from] PlatformParseError),

    /// The price is malformed or out of range.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// The stock count is not a non-negative integer.
    #[error("stock must be a whole number of at least 0 (got {0:?})")]
    Stock(String),

    /// The name has no characters usable for a cover image key.
    #[error("name must contain at least one letter or digit")]
    UnusableName,
}

/// Remaining units of a game (`game_inventory.games_count`).
///
/// Never negative. The database enforces the same bound with a CHECK
/// constraint and purchases decrement it with a conditional UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stock(i32);

impl Stock {
    /// No units left.
    pub const ZERO: Self = Self(0);

    /// Create a stock count.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Stock` if `count` is negative.
    pub fn new(count: i32) -> Result<Self, ValidationError> {
        if count < 0 {
            return Err(ValidationError::Stock(count.to_string()));
        }
        Ok(Self(count))
    }

    /// Parse a stock count from form input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Stock` for anything but a non-negative integer.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("stock"));
        }
        let count = trimmed
            .parse::<i32>()
            .map_err(|_| ValidationError::Stock(trimmed.to_owned()))?;
        Self::new(count)
    }

    /// Number of units.
    #[must_use]
    pub const fn count(self) -> i32 {
        self.0
    }

    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn is_available(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A game ready to be inserted into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub publisher: String,
    pub platform: Platform,
    pub price: Price,
}

impl NewGame {
    /// Trim text fields and check required fields and lengths.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = required("name", &self.name)?;
        check_length("name", &name, MAX_NAME_LENGTH)?;
        if cover_key(&name).is_empty() {
            return Err(ValidationError::UnusableName);
        }

        let details = self.details.trim().to_owned();
        check_length("details", &details, MAX_DETAILS_LENGTH)?;
        let developer = self.developer.trim().to_owned();
        check_length("developer", &developer, MAX_STUDIO_LENGTH)?;
        let publisher = self.publisher.trim().to_owned();
        check_length("publisher", &publisher, MAX_STUDIO_LENGTH)?;

        Ok(Self {
            name,
            details,
            developer,
            publisher,
            platform: self.platform,
            price: self.price,
        })
    }

    /// Key under which this game's cover image is stored.
    #[must_use]
    pub fn cover_key(&self) -> String {
        cover_key(&self.name)
    }
}

/// Untyped catalog input as submitted by the admin form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
}

impl GameDraft {
    /// Convert the draft into a validated game and its initial stock.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn parse(&self) -> Result<(NewGame, Stock), ValidationError> {
        let platform = required("platform", &self.platform)?.parse::<Platform>()?;
        let price = Price::parse(&required("price", &self.price)?)?;
        let stock = Stock::parse(&self.stock)?;

        let game = NewGame {
            name: self.name.clone(),
            details: self.details.clone(),
            developer: self.developer.clone(),
            publisher: self.publisher.clone(),
            platform,
            price,
        }
        .validate()?;

        Ok((game, stock))
    }
}

/// Sanitize a game name into a cover image key.
///
/// Drops everything except word characters, whitespace and hyphens, collapses
/// whitespace runs into a single space and trims the ends. The result is safe
/// to use as a file stem: it never contains path separators or dots.
///
/// ```
/// use pixel_vault_core::cover_key;
///
/// assert_eq!(cover_key("Half-Life: Alyx"), "Half-Life Alyx");
/// assert_eq!(cover_key("  ../../etc/passwd "), "etcpasswd");
/// ```
#[must_use]
pub fn cover_key(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
