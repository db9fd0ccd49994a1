//! Upstream routing regions

use serde::{Deserialize, Serialize};

/// Shard the storefront and identity calls are routed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Asia-Pacific (default)
    #[default]
    Ap,
    /// North America, also serves LATAM and BR
    Na,
    /// Europe
    Eu,
    /// Korea
    Kr,
}

impl Region {
    /// Every routable region
    pub const ALL: [Region; 4] = [Self::Ap, Self::Na, Self::Eu, Self::Kr];

    /// Resolve a user-supplied region code, falling back to [`Region::Ap`].
    ///
    /// Never fails: unknown or empty input resolves to the default.
    pub fn resolve(code: &str) -> Self {
        Self::resolve_or(code, Self::default())
    }

    /// Resolve a user-supplied region code with an explicit fallback
    pub fn resolve_or(code: &str, default: Region) -> Self {
        match code.trim().to_lowercase().as_str() {
            "na" | "latam" | "br" => Self::Na,
            "eu" => Self::Eu,
            "ap" => Self::Ap,
            "kr" => Self::Kr,
            _ => default,
        }
    }

    /// Lowercase shard name used in upstream hostnames
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ap => "ap",
            Self::Na => "na",
            Self::Eu => "eu",
            Self::Kr => "kr",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Region {
    type Err = RegionParseError;

    /// Strict parse: aliases are accepted, unknown codes are an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ap" => Ok(Self::Ap),
            "na" | "latam" | "br" => Ok(Self::Na),
            "eu" => Ok(Self::Eu),
            "kr" => Ok(Self::Kr),
            _ => Err(RegionParseError(s.to_string())),
        }
    }
}

/// Error parsing a region string
#[derive(Debug, Clone)]
pub struct RegionParseError(pub String);

impl std::fmt::Display for RegionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid region: {}", self.0)
    }
}

impl std::error::Error for RegionParseError {}
