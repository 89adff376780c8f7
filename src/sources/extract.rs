//! Mapping from a source's JSON listing object to [`Listing`].
//!
//! The mapping is total: each field is read on its own and anything missing
//! or malformed becomes absent (or the schema default). Only a missing
//! identity rejects the whole entry.

use crate::models::Listing;
use crate::store::persist::{coerce_count, parse_bool};
use serde_json::Value;
use tracing::{debug, warn};

/// Convert one JSON listing. Returns `None` when the entry has no usable `id`.
pub fn listing_from_value(value: &Value) -> Option<Listing> {
    let id = text(value.get("id")).filter(|id| !id.trim().is_empty())?;

    Some(Listing {
        id,
        price: text(value.get("price")),
        title: text(value.get("title")),
        latitude: number(value.get("latitude")),
        longitude: number(value.get("longitude")),
        monthly_price: text(value.get("monthly_price")),
        publish_date: text(value.get("publish_date")),
        sale_type: text(value.get("sale_type")),
        size_meters_squared: number(value.get("size_meters_squared")),
        shortcode: text(value.get("shortcode")),
        total_images: count(value.get("total_images")),
        has_virtual_tour: flag(value.get("has_virtual_tour")),
        images: blob(value.get("images")),
        sections: blob(value.get("sections")),
    })
}

/// Convert a batch, dropping entries without an identity.
pub fn listings_from_values(values: &[Value]) -> Vec<Listing> {
    let listings: Vec<Listing> = values.iter().filter_map(listing_from_value).collect();
    let skipped = values.len() - listings.len();
    if skipped > 0 {
        warn!(skipped, "Skipped listings without an id");
    }
    debug!("Extracted {} listings from {} entries", listings.len(), values.len());
    listings
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn count(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => coerce_count(s),
        _ => 0,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => parse_bool(s).unwrap_or(false),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Nested structures are kept as serialized text; empty ones are absent.
fn blob(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) if !items.is_empty() => serde_json::to_string(items).ok(),
        Value::Object(map) if !map.is_empty() => serde_json::to_string(map).ok(),
        _ => None,
    }
}
