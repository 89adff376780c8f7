//! Read-only filters over a table snapshot.

use crate::models::{Field, FieldValue, ListingRecord};
use crate::price::normalize_price;
use crate::store::ListingTable;

/// Optional bounds per axis; an absent bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
}

impl BoundingBox {
    pub fn is_unbounded(&self) -> bool {
        self.lat_min.is_none()
            && self.lat_max.is_none()
            && self.lon_min.is_none()
            && self.lon_max.is_none()
    }

    /// Records without coordinates only match a fully open box.
    pub fn contains(&self, latitude: Option<f64>, longitude: Option<f64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let (Some(lat), Some(lon)) = (latitude, longitude) else {
            return false;
        };
        within(lat, self.lat_min, self.lat_max) && within(lon, self.lon_min, self.lon_max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Unparseable prices never satisfy a bounded range.
    pub fn contains(&self, price: Option<&str>) -> bool {
        if self.min.is_none() && self.max.is_none() {
            return true;
        }
        normalize_price(price).is_some_and(|value| within(value, self.min, self.max))
    }
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

impl ListingTable {
    /// Records (active or not) where every given column equals its expected value.
    pub fn matching(&self, criteria: &[(Field, FieldValue)]) -> Vec<&ListingRecord> {
        self.iter()
            .filter(|record| {
                criteria
                    .iter()
                    .all(|(field, expected)| record.value(*field).matches(expected))
            })
            .collect()
    }

    /// Active records inside the bounding box.
    pub fn within_bounds(&self, bounds: &BoundingBox) -> Vec<&ListingRecord> {
        self.active()
            .filter(|record| bounds.contains(record.listing.latitude, record.listing.longitude))
            .collect()
    }

    /// Active records whose normalized price falls within `range`.
    pub fn within_price_range(&self, range: &PriceRange) -> Vec<&ListingRecord> {
        self.active()
            .filter(|record| range.contains(record.listing.price.as_deref()))
            .collect()
    }

    /// Active records with at least `min_images` images.
    pub fn with_min_images(&self, min_images: i64) -> Vec<&ListingRecord> {
        self.active()
            .filter(|record| record.listing.total_images >= min_images)
            .collect()
    }
}
