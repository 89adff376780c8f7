//! CSV representation of the listing store.
//!
//! One row per listing, columns in [`Field::ALL`] order. Absent values are
//! empty cells and booleans are written `True`/`False`, which keeps the file
//! readable by spreadsheet and dataframe tooling that produced earlier copies.

use crate::error::{Result, StoreError};
use crate::models::{non_blank, Field, Listing, ListingRecord};
use crate::store::ListingTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw CSV row. Every cell is text so that loosely typed files still load;
/// typing happens in [`Row::into_record`].
#[derive(Debug, Serialize, Deserialize)]
struct Row {
    id: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    latitude: Option<String>,
    #[serde(default)]
    longitude: Option<String>,
    #[serde(default)]
    monthly_price: Option<String>,
    #[serde(default)]
    publish_date: Option<String>,
    #[serde(default)]
    sale_type: Option<String>,
    #[serde(default)]
    size_meters_squared: Option<String>,
    #[serde(default)]
    shortcode: Option<String>,
    #[serde(default)]
    total_images: Option<String>,
    #[serde(default)]
    has_virtual_tour: Option<String>,
    #[serde(default)]
    images: Option<String>,
    #[serde(default)]
    sections: Option<String>,
    first_seen: String,
    last_seen: String,
    active: String,
}

impl From<&ListingRecord> for Row {
    fn from(record: &ListingRecord) -> Self {
        let l = &record.listing;
        Row {
            id: l.id.clone(),
            price: l.price.clone(),
            title: l.title.clone(),
            latitude: l.latitude.map(|v| v.to_string()),
            longitude: l.longitude.map(|v| v.to_string()),
            monthly_price: l.monthly_price.clone(),
            publish_date: l.publish_date.clone(),
            sale_type: l.sale_type.clone(),
            size_meters_squared: l.size_meters_squared.map(|v| v.to_string()),
            shortcode: l.shortcode.clone(),
            total_images: Some(l.total_images.to_string()),
            has_virtual_tour: Some(bool_cell(l.has_virtual_tour).to_string()),
            images: l.images.clone(),
            sections: l.sections.clone(),
            first_seen: record.first_seen.format(DATE_FORMAT).to_string(),
            last_seen: record.last_seen.format(DATE_FORMAT).to_string(),
            active: bool_cell(record.active).to_string(),
        }
    }
}

impl Row {
    fn into_record(self, line: u64) -> Result<ListingRecord> {
        if self.id.trim().is_empty() {
            return Err(corrupt(line, Field::Id, self.id));
        }

        let first_seen = parse_date(&self.first_seen)
            .ok_or_else(|| corrupt(line, Field::FirstSeen, self.first_seen.clone()))?;
        let last_seen = parse_date(&self.last_seen)
            .ok_or_else(|| corrupt(line, Field::LastSeen, self.last_seen.clone()))?;
        let active =
            parse_bool(&self.active).ok_or_else(|| corrupt(line, Field::Active, self.active.clone()))?;

        let listing = Listing {
            id: self.id,
            price: non_blank(self.price),
            title: non_blank(self.title),
            latitude: self.latitude.as_deref().and_then(parse_number),
            longitude: self.longitude.as_deref().and_then(parse_number),
            monthly_price: non_blank(self.monthly_price),
            publish_date: non_blank(self.publish_date),
            sale_type: non_blank(self.sale_type),
            size_meters_squared: self.size_meters_squared.as_deref().and_then(parse_number),
            shortcode: non_blank(self.shortcode),
            total_images: self
                .total_images
                .as_deref()
                .map(coerce_count)
                .unwrap_or_default(),
            has_virtual_tour: self
                .has_virtual_tour
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(false),
            images: non_blank(self.images),
            sections: non_blank(self.sections),
        };

        Ok(ListingRecord {
            listing,
            first_seen,
            last_seen,
            active,
        })
    }
}

/// Read the store file at `path`. A missing file is an empty store.
pub fn load(path: &Path) -> Result<ListingTable> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No store file yet, starting empty");
            return Ok(ListingTable::new());
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut table = ListingTable::new();

    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let record = row
            .deserialize::<Row>(Some(&headers))
            .map_err(csv_err)?
            .into_record(line)?;

        let id = record.id().to_string();
        if table.insert(record).is_some() {
            return Err(corrupt(line, Field::Id, id));
        }
    }

    Ok(table)
}

/// Write the full table to `path`, replacing the previous file atomically.
///
/// Rows go to a temporary file in the same directory which is synced and then
/// renamed over the target; on any failure the old file is left as it was.
pub fn save(path: &Path, table: &ListingTable) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;

    {
        // Header is written by hand so an empty table still produces one.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer
            .write_record(Field::ALL.iter().map(|field| field.column()))
            .map_err(csv_err)?;
        for record in table.iter() {
            writer.serialize(Row::from(record)).map_err(csv_err)?;
        }
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file_mut().flush().map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|err| {
        warn!(path = %path.display(), error = %err.error, "Could not replace store file");
        StoreError::Persist {
            path: path.to_path_buf(),
            source: err.error,
        }
    })?;

    Ok(())
}

fn corrupt(line: u64, field: Field, value: String) -> StoreError {
    StoreError::CorruptRow {
        line,
        column: field.column(),
        value,
    }
}

fn bool_cell(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), DATE_FORMAT).ok()
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Integer count from text such as `"12"` or `"12.0"`; anything else is 0.
pub(crate) fn coerce_count(cell: &str) -> i64 {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| {
            cell.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        })
        .unwrap_or(0)
}
