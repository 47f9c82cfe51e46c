//! Traveler profile enums shared by posts and candidate filtering.

use serde::{Deserialize, Serialize};

/// Traveler gender as recorded by the account subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Who a post creator wants to travel with.
///
/// `Any` is the wildcard; the other variants must equal the candidate's
/// gender exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderPreference {
    Any,
    Male,
    Female,
}
