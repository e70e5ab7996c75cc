use serde::{Deserialize, Serialize};

use super::Category;

/// Placeholder used when an upstream item carries no title.
pub const UNNAMED_PLACE: &str = "이름 없음";

/// A normalized point of interest. Coordinates are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub name: String,
    pub district: String,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub description: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub category: Category,
}
