use serde::{Deserialize, Serialize};

/// Search filters forwarded to a listing source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Counties to search; the first one is used as the location
    pub counties: Vec<String>,
    /// e.g. "residential_sale", "residential_rent"
    pub search_type: Option<String>,
    /// e.g. "house", "apartment"
    pub property_type: Option<String>,
    pub min_beds: Option<u32>,
    pub max_beds: Option<u32>,
    pub min_baths: Option<u32>,
    pub max_baths: Option<u32>,
    /// Minimum price (EUR)
    pub min_price: Option<i64>,
    /// Maximum price (EUR)
    pub max_price: Option<i64>,
    pub facilities: Vec<String>,
    pub sort_type: Option<String>,
    /// First page to request, 1-based
    pub page: u32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            counties: vec!["Dublin".to_string()],
            search_type: None,
            property_type: None,
            min_beds: None,
            max_beds: None,
            min_baths: None,
            max_baths: None,
            min_price: None,
            max_price: None,
            facilities: Vec::new(),
            sort_type: None,
            page: 1,
        }
    }
}

impl SearchFilters {
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// One page of results from a search feed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub listings: Vec<serde_json::Value>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub error: Option<String>,
}
