//! `AppLocale` — a closed BCP-47-flavored language/region tag.

use crate::errors::CoreError;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `language[-REGION]`, e.g. `en` or `en-US`. Language is lowercase
/// 2-3 letters, region (if present) is uppercase 2 letters — validated, not
/// normalized, so callers see exactly what was supplied once it parses.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AppLocale(String);

impl AppLocale {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    pub fn region(&self) -> Option<&str> {
        self.0.split_once('-').map(|(_, region)| region)
    }
}

fn is_lang(s: &str) -> bool {
    (2..=3).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_region(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_uppercase())
}

impl FromStr for AppLocale {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            None if is_lang(s) => Ok(AppLocale(s.to_string())),
            Some((lang, region)) if is_lang(lang) && is_region(region) => Ok(AppLocale(s.to_string())),
            _ => Err(CoreError::InvalidLocale),
        }
    }
}

impl TryFrom<&str> for AppLocale {
    type Error = CoreError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AppLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_only() {
        let l: AppLocale = "en".parse().unwrap();
        assert_eq!(l.language(), "en");
        assert_eq!(l.region(), None);
    }

    #[test]
    fn parses_language_and_region() {
        let l: AppLocale = "en-US".parse().unwrap();
        assert_eq!(l.language(), "en");
        assert_eq!(l.region(), Some("US"));
    }

    #[test]
    fn rejects_malformed_tags() {
        assert!("EN".parse::<AppLocale>().is_err());
        assert!("en-us".parse::<AppLocale>().is_err());
        assert!("english".parse::<AppLocale>().is_err());
        assert!("en-USA".parse::<AppLocale>().is_err());
    }
}
