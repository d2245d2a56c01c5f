// ── Identity types ──
//
// Backend ids are opaque strings. Wrapping each in its own type keeps a
// device id from being passed where an alert id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Backend-assigned device id.
    DeviceId
);

string_id!(
    /// Event id: the backend's, or `local-{n}` when the source sent none.
    EventId
);

string_id!(
    /// Security alert id: the backend's, or `local-{n}`.
    AlertId
);

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Accepts colon-separated or dash-separated input in any case.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase().replace('-', ":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_is_normalized() {
        assert_eq!(MacAddress::new("AA-BB-CC-0D-0E-0F").as_str(), "aa:bb:cc:0d:0e:0f");
        assert_eq!(MacAddress::new(" aa:bb:cc:dd:ee:ff "), MacAddress::new("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn ids_display_verbatim() {
        assert_eq!(DeviceId::from("dev-1").to_string(), "dev-1");
        assert_eq!(EventId::new("local-3").as_str(), "local-3");
    }
}
