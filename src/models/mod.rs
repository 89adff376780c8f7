use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A listing as supplied by a listing source, before tracking columns are attached.
///
/// Every field is either present or explicitly absent; sources never hand over
/// a partial object with fields missing from the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub price: Option<String>,
    pub title: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub monthly_price: Option<String>,
    pub publish_date: Option<String>,
    pub sale_type: Option<String>,
    pub size_meters_squared: Option<f64>,
    pub shortcode: Option<String>,
    pub total_images: i64,
    pub has_virtual_tour: bool,
    /// Serialized image list, not interpreted here
    pub images: Option<String>,
    /// Serialized section list, not interpreted here
    pub sections: Option<String>,
}

impl Listing {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Collapse values the store file cannot tell apart from absence
    /// (blank text, non-finite numbers) into `None`.
    pub fn normalized(self) -> Self {
        Self {
            id: self.id,
            price: non_blank(self.price),
            title: non_blank(self.title),
            latitude: finite(self.latitude),
            longitude: finite(self.longitude),
            monthly_price: non_blank(self.monthly_price),
            publish_date: non_blank(self.publish_date),
            sale_type: non_blank(self.sale_type),
            size_meters_squared: finite(self.size_meters_squared),
            shortcode: non_blank(self.shortcode),
            total_images: self.total_images,
            has_virtual_tour: self.has_virtual_tour,
            images: non_blank(self.images),
            sections: non_blank(self.sections),
        }
    }
}

/// `None` for missing or whitespace-only text.
pub fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// A row of the durable store: the latest observed listing plus its tracking columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing: Listing,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub active: bool,
}

impl ListingRecord {
    /// Record for an identity observed for the first time.
    pub fn first_observation(listing: Listing, today: NaiveDate) -> Self {
        Self {
            listing,
            first_seen: today,
            last_seen: today,
            active: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.listing.id
    }

    /// Current value of a column, typed per the store schema.
    pub fn value(&self, field: Field) -> FieldValue {
        let l = &self.listing;
        match field {
            Field::Id => FieldValue::Text(l.id.clone()),
            Field::Price => l.price.clone().into(),
            Field::Title => l.title.clone().into(),
            Field::Latitude => l.latitude.into(),
            Field::Longitude => l.longitude.into(),
            Field::MonthlyPrice => l.monthly_price.clone().into(),
            Field::PublishDate => l.publish_date.clone().into(),
            Field::SaleType => l.sale_type.clone().into(),
            Field::SizeMetersSquared => l.size_meters_squared.into(),
            Field::Shortcode => l.shortcode.clone().into(),
            Field::TotalImages => FieldValue::Integer(l.total_images),
            Field::HasVirtualTour => FieldValue::Bool(l.has_virtual_tour),
            Field::Images => l.images.clone().into(),
            Field::Sections => l.sections.clone().into(),
            Field::FirstSeen => FieldValue::Date(self.first_seen),
            Field::LastSeen => FieldValue::Date(self.last_seen),
            Field::Active => FieldValue::Bool(self.active),
        }
    }
}

/// Columns of the listing store, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Price,
    Title,
    Latitude,
    Longitude,
    MonthlyPrice,
    PublishDate,
    SaleType,
    SizeMetersSquared,
    Shortcode,
    TotalImages,
    HasVirtualTour,
    Images,
    Sections,
    FirstSeen,
    LastSeen,
    Active,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::Id,
        Field::Price,
        Field::Title,
        Field::Latitude,
        Field::Longitude,
        Field::MonthlyPrice,
        Field::PublishDate,
        Field::SaleType,
        Field::SizeMetersSquared,
        Field::Shortcode,
        Field::TotalImages,
        Field::HasVirtualTour,
        Field::Images,
        Field::Sections,
        Field::FirstSeen,
        Field::LastSeen,
        Field::Active,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Price => "price",
            Field::Title => "title",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::MonthlyPrice => "monthly_price",
            Field::PublishDate => "publish_date",
            Field::SaleType => "sale_type",
            Field::SizeMetersSquared => "size_meters_squared",
            Field::Shortcode => "shortcode",
            Field::TotalImages => "total_images",
            Field::HasVirtualTour => "has_virtual_tour",
            Field::Images => "images",
            Field::Sections => "sections",
            Field::FirstSeen => "first_seen",
            Field::LastSeen => "last_seen",
            Field::Active => "active",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown listing field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A typed column value, used by exact-match queries.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue {
    /// Equality across the numeric variants, strict everywhere else.
    pub fn matches(&self, expected: &FieldValue) -> bool {
        match (self, expected) {
            (FieldValue::Number(a), FieldValue::Integer(b))
            | (FieldValue::Integer(b), FieldValue::Number(a)) => *a == *b as f64,
            _ => self == expected,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Text)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Number)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}
