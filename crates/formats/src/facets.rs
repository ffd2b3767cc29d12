use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::DocumentError;

/// One facet grouping returned by a listing's facet endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResponse {
    pub facet: Facet,
    #[serde(default)]
    pub results: Vec<FacetCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    #[serde(deserialize_with = "string_or_number")]
    pub key: String,
    pub count: u64,
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "facet key must be a string or number, got {other}"
        ))),
    }
}

impl FacetResponse {
    pub fn list_from_json(body: &str) -> Result<Vec<Self>, DocumentError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Collapse the `isdeprecated` facet into exactly two buckets,
    /// `"0"` (not deprecated) and `"1"` (deprecated). Other facets pass through.
    pub fn normalized(self) -> Self {
        if self.facet.property != "isdeprecated" {
            return self;
        }
        let mut deprecated = 0;
        let mut not_deprecated = 0;
        for r in &self.results {
            match r.key.trim().parse::<i64>() {
                Ok(1) => deprecated += r.count,
                _ => not_deprecated += r.count,
            }
        }
        Self {
            facet: self.facet,
            results: vec![
                FacetCount {
                    key: "0".to_string(),
                    count: not_deprecated,
                },
                FacetCount {
                    key: "1".to_string(),
                    count: deprecated,
                },
            ],
        }
    }
}
