//! Search criteria and their validation
//!
//! `City` and `Age` can only be built through the validating constructors, so a
//! `Criteria` value is valid by construction.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Latin and Cyrillic letters, spaces and hyphens
static CITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Zа-яА-ЯёЁ -]+$").expect("city pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid city name: {0:?}")]
    InvalidCity(String),
    #[error("Invalid age: {0:?}")]
    InvalidAge(String),
}

/// Check a free-text city name.
pub fn validate_city(text: &str) -> bool {
    CITY_PATTERN.is_match(text) && text.chars().any(char::is_alphabetic)
}

/// Parse a free-text age. Only non-negative integers are accepted.
pub fn validate_age(text: &str) -> Result<Age, ValidationError> {
    text.trim()
        .parse::<u32>()
        .map(Age)
        .map_err(|_| ValidationError::InvalidAge(text.to_string()))
}

/// A validated, capitalized city name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct City(String);

impl City {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if !validate_city(trimmed) {
            return Err(ValidationError::InvalidCity(text.to_string()));
        }
        Ok(Self(capitalize(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated age in years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Age(u32);

impl Age {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        validate_age(text)
    }

    pub fn years(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, years_word(self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Button label shown to the user
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Парень",
            Gender::Female => "Девушка",
        }
    }

    /// VK `sex` field value
    pub fn sex_code(self) -> u8 {
        match self {
            Gender::Female => 1,
            Gender::Male => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Complete search criteria
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Criteria {
    pub city: City,
    pub gender: Gender,
    pub age: Age,
}

/// Russian plural form of "year" for the given count
pub fn years_word(years: u32) -> &'static str {
    if (11..=19).contains(&(years % 100)) {
        return "лет";
    }
    match years % 10 {
        1 => "год",
        2..=4 => "года",
        _ => "лет",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
