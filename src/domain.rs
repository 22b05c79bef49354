use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value written in place of a qualifier the feature does not carry.
pub const NOT_AVAILABLE: &str = "NA";

/// Feature types that become feature documents.
pub const LOADED_FEATURE_TYPES: [&str; 2] = ["gene", "CDS"];

/// A span in zero-based, end-exclusive coordinates with fuzziness already dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLocation {
    pub start: i64,
    pub end: i64,
}

impl FeatureLocation {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl From<Strand> for i8 {
    fn from(value: Strand) -> Self {
        match value {
            Strand::Forward => 1,
            Strand::Reverse => -1,
            Strand::Unknown => 0,
        }
    }
}

impl TryFrom<i8> for Strand {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Strand::Forward),
            -1 => Ok(Strand::Reverse),
            0 => Ok(Strand::Unknown),
            other => Err(format!("invalid strand: {other}")),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i8::from(*self))
    }
}

/// Qualifier key to every value given for it, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers(BTreeMap<String, Vec<String>>);

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Qualifiers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut qualifiers = Qualifiers::new();
        for (key, value) in iter {
            qualifiers.push(key, value);
        }
        qualifiers
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFeature {
    pub kind: String,
    pub location: FeatureLocation,
    pub strand: Strand,
    /// `join`, `order`, or another multi-location operator; `None` for a plain span.
    pub operator: Option<String>,
    pub sub_locations: Vec<FeatureLocation>,
    pub qualifiers: Qualifiers,
}

impl RawFeature {
    pub fn new(kind: impl Into<String>, location: FeatureLocation, strand: Strand) -> Self {
        Self {
            kind: kind.into(),
            location,
            strand,
            operator: None,
            sub_locations: Vec::new(),
            qualifiers: Qualifiers::new(),
        }
    }

    pub fn is_multi_location(&self) -> bool {
        matches!(self.operator.as_deref(), Some("join" | "order"))
    }

    pub fn is_loaded_type(&self) -> bool {
        LOADED_FEATURE_TYPES.contains(&self.kind.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub gi: Option<i64>,
    pub sequence_version: Option<i64>,
    pub taxonomy: Option<String>,
    pub organism: Option<String>,
}

/// One decoded GenBank entry. The first feature is expected to span the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub description: String,
    pub annotations: Annotations,
    pub features: Vec<RawFeature>,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeDoc {
    pub gi: i64,
    pub name: String,
    pub accession: String,
    pub version: i64,
    pub length: i64,
    pub strand: Strand,
    pub taxonomy: String,
    pub organism: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDoc {
    pub name: String,
    pub genome: i64,
    pub gene_id: String,
    pub locus_tag: String,
    /// 1-based, inclusive.
    pub start: i64,
    pub end: i64,
    pub operator: Option<String>,
    pub strand: Strand,
    #[serde(rename = "type")]
    pub kind: String,
}
