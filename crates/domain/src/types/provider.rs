//! Provider identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LinkError;

/// External OAuth-authenticated service a dashboard account can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Calendar,
    Payment,
}

impl Provider {
    /// Every supported provider, in display order.
    pub const ALL: [Provider; 2] = [Provider::Calendar, Provider::Payment];

    /// Stable identifier used in logs and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Payment => "payment",
        }
    }

    /// Backend path segment for the upstream service.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Calendar => "google",
            Self::Payment => "stripe",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Calendar => "Google Calendar",
            Self::Payment => "Stripe",
        }
    }

    /// Whether the provider supports choosing a sub-resource after linking.
    pub fn supports_selection(self) -> bool {
        matches!(self, Self::Calendar)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" | "google" => Ok(Self::Calendar),
            "payment" | "stripe" => Ok(Self::Payment),
            other => Err(LinkError::Config(format!("unknown provider: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_slug_and_name() {
        assert_eq!("calendar".parse::<Provider>().unwrap(), Provider::Calendar);
        assert_eq!("Stripe".parse::<Provider>().unwrap(), Provider::Payment);
        assert!(matches!("paypal".parse::<Provider>(), Err(LinkError::Config(_))));
    }

    #[test]
    fn test_only_calendar_supports_selection() {
        assert!(Provider::Calendar.supports_selection());
        assert!(!Provider::Payment.supports_selection());
    }
}
