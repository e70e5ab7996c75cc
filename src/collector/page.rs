//! Response-shape normalization for one page of a listing.
//!
//! The upstream API wraps each page in a dataset-specific key and returns
//! `item` as either a single object or an array. Both shapes become a plain
//! `Vec<RawItem>` here so nothing downstream has to care.

use serde::Deserialize;
use serde_json::Value;

use super::dataset::Dataset;
use super::error::CollectError;
use crate::models::{Category, PoiRecord, UNNAMED_PLACE};
use crate::utils::value_to_text;

/// Header result code the API uses for a successful call
pub const RESULT_CODE_OK: &str = "00";

/// A value that the API sends either bare or inside an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

/// One listing entry as the API sends it. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(rename = "MAIN_TITLE", default)]
    pub main_title: Option<Value>,
    #[serde(rename = "GUGUN_NM", default)]
    pub gugun_nm: Option<Value>,
    #[serde(rename = "LAT", default)]
    pub lat: Option<Value>,
    #[serde(rename = "LNG", default)]
    pub lng: Option<Value>,
    #[serde(rename = "ADDR1", default)]
    pub addr1: Option<Value>,
    #[serde(rename = "ITEMCNTNTS", default)]
    pub itemcntnts: Option<Value>,
    #[serde(rename = "CNTCT_TEL", default)]
    pub cntct_tel: Option<Value>,
}

impl RawItem {
    /// Both coordinates carry a non-empty, non-zero value.
    pub fn has_coordinates(&self) -> bool {
        is_present(self.lat.as_ref()) && is_present(self.lng.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct PageHeader {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    header: Option<PageHeader>,
    #[serde(default)]
    item: Option<Value>,
    #[serde(rename = "totalCount", default)]
    total_count: Option<Value>,
}

/// What one page of a listing contained.
#[derive(Debug, Clone)]
pub enum Page {
    /// The wrapper key was absent or empty
    MissingWrapper,
    /// Zero or more items; empty means the listing is exhausted
    Items {
        items: Vec<RawItem>,
        total_count: Option<u64>,
    },
}

/// Pull the item list for `dataset` out of a response body.
pub fn parse_page(dataset: Dataset, body: &Value) -> Result<Page, CollectError> {
    let wrapper = match body.get(dataset.wrapper_key()) {
        Some(w) if is_truthy(w) => w,
        _ => return Ok(Page::MissingWrapper),
    };
    if !wrapper.is_object() {
        return Err(CollectError::Shape(format!(
            "{} is not an object",
            dataset.wrapper_key()
        )));
    }

    let page: PageBody = serde_json::from_value(wrapper.clone())
        .map_err(|e| CollectError::Shape(e.to_string()))?;

    if let Some(header) = &page.header {
        let code = header.code.as_ref().map(value_to_text).unwrap_or_default();
        if !code.is_empty() && code != RESULT_CODE_OK {
            return Err(CollectError::Api {
                code,
                message: header.message.as_ref().map(value_to_text).unwrap_or_default(),
            });
        }
    }

    let total_count = page.total_count.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let items = match page.item {
        Some(v) if is_truthy(&v) => serde_json::from_value::<OneOrMany<RawItem>>(v)
            .map_err(|e| CollectError::Shape(format!("item: {}", e)))?
            .into_vec(),
        _ => Vec::new(),
    };

    Ok(Page::Items { items, total_count })
}

/// Build a record from an item, or `None` when a coordinate is missing.
pub fn normalize_item(item: &RawItem, category: Category) -> Result<Option<PoiRecord>, CollectError> {
    if !item.has_coordinates() {
        return Ok(None);
    }
    let lat = parse_coordinate("LAT", item.lat.as_ref())?;
    let lng = parse_coordinate("LNG", item.lng.as_ref())?;

    Ok(Some(PoiRecord {
        name: item
            .main_title
            .as_ref()
            .filter(|v| !v.is_null())
            .map(value_to_text)
            .unwrap_or_else(|| UNNAMED_PLACE.to_string()),
        district: text_or_empty(item.gugun_nm.as_ref()),
        lat,
        lng,
        address: text_or_empty(item.addr1.as_ref()),
        description: text_or_empty(item.itemcntnts.as_ref()),
        phone: text_or_empty(item.cntct_tel.as_ref()),
        category,
    }))
}

fn text_or_empty(value: Option<&Value>) -> String {
    value.map(value_to_text).unwrap_or_default()
}

fn is_present(value: Option<&Value>) -> bool {
    value.map(is_truthy).unwrap_or(false)
}

// Empty strings, zero, null and empty containers count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn parse_coordinate(field: &'static str, value: Option<&Value>) -> Result<f64, CollectError> {
    let parse_err = || CollectError::Parse {
        field,
        value: value.map(value_to_text).unwrap_or_default(),
    };
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).ok_or_else(parse_err)
}
