//! `Platform` — the closed set of client platforms targeting can match on.

use crate::errors::CoreError;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Platform {
    Ios,
    Android,
    Web,
    Server,
}

impl Platform {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Web => "web",
            Platform::Server => "server",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "web" => Ok(Platform::Web),
            "server" => Ok(Platform::Server),
            _ => Err(CoreError::InvalidPlatform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        for p in [Platform::Ios, Platform::Android, Platform::Web, Platform::Server] {
            let s = p.to_string();
            assert_eq!(s.parse::<Platform>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("desktop".parse::<Platform>().is_err());
    }
}
