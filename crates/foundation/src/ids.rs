use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a record in the remote record store.
///
/// Always strictly positive. Raw identifiers coming from the page or from
/// record properties (where `-1` and `0` are used as "unknown" markers) go
/// through [`FeatureId::new`] before any I/O is attempted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct FeatureId(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid record identifier: {raw}")]
pub struct InvalidIdentifier {
    pub raw: String,
}

impl FeatureId {
    pub fn new(raw: i64) -> Result<Self, InvalidIdentifier> {
        if raw <= 0 {
            return Err(InvalidIdentifier {
                raw: raw.to_string(),
            });
        }
        Ok(FeatureId(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for FeatureId {
    type Error = InvalidIdentifier;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        FeatureId::new(raw)
    }
}

impl From<FeatureId> for i64 {
    fn from(id: FeatureId) -> Self {
        id.0
    }
}

impl FromStr for FeatureId {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().parse::<i64>().map_err(|_| InvalidIdentifier {
            raw: s.to_string(),
        })?;
        FeatureId::new(raw)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
