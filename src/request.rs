//! Request model shared by every adapter.
//!
//! A request carries a `grid_data` object (`T_Date` plus optional `T_00` to
//! `T_23` symbols) and a few output options. Parsing is lenient about hour
//! values and strict about the date: a `null` hour is treated as absent, a
//! non-string hour is unknown, unrelated keys are ignored, and a missing
//! `T_Date` stops the request before anything is rendered.

use crate::{error::RequestError, layout::Orientation, DayRecord, HourState, HOURS_PER_DAY};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

/// Key of the date label inside `grid_data`.
pub const DATE_KEY: &str = "T_Date";
pub const MIME_PNG: &str = "image/png";
pub const SUCCESS_MESSAGE: &str = "Grid availability image generated successfully";

/// Raw `grid_data` object, kept as JSON until converted to a [`DayRecord`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GridData(pub Map<String, Value>);

impl GridData {
    /// Key for `hour`, e.g. `T_07`.
    pub fn hour_key(hour: u8) -> String {
        format!("T_{hour:02}")
    }

    /// Hour addressed by a `T_HH` key, if it is one.
    pub fn parse_hour_key(key: &str) -> Option<u8> {
        let digits = key.strip_prefix("T_")?;
        if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|h| *h < HOURS_PER_DAY)
    }

    pub fn date(&self) -> Option<&Value> {
        self.0.get(DATE_KEY).filter(|v| !v.is_null())
    }

    /// Convert to a [`DayRecord`].
    pub fn to_record(&self) -> Result<DayRecord, RequestError> {
        let date = match self.date() {
            None => return Err(RequestError::MissingDate),
            Some(Value::String(date)) => date.clone(),
            Some(other) => {
                return Err(RequestError::invalid(format!(
                    "{DATE_KEY} must be a string, got {other}"
                )))
            }
        };

        let mut record = DayRecord::new(date);
        for (key, value) in &self.0 {
            let Some(hour) = Self::parse_hour_key(key) else {
                continue;
            };
            match value {
                Value::Null => {}
                Value::String(symbol) => record.set_hour(hour, HourState::from_symbol(symbol)),
                _ => record.set_hour(hour, HourState::Unknown),
            }
        }
        Ok(record)
    }

    /// Build `grid_data` from a record, one key per explicit hour.
    pub fn from_record(record: &DayRecord) -> Self {
        let mut map = Map::new();
        map.insert(DATE_KEY.to_string(), Value::String(record.date.clone()));
        for (hour, state) in record.explicit() {
            map.insert(Self::hour_key(hour), Value::String(state.symbol().to_string()));
        }
        Self(map)
    }
}

/// Body of an image generation request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GenerateImageRequest {
    pub grid_data: GridData,
    #[serde(default)]
    pub return_base64: bool,
    #[serde(default)]
    pub vertical: bool,
    /// Destination file, honored by the tool protocol only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl GenerateImageRequest {
    /// Parse a request from an arbitrary JSON value.
    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        serde_json::from_value(value).map_err(|e| RequestError::invalid(e.to_string()))
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_vertical(self.vertical)
    }

    pub fn record(&self) -> Result<DayRecord, RequestError> {
        self.grid_data.to_record()
    }
}

/// `grid_availability_<date>.png`, with `-` and anything outside
/// `[A-Za-z0-9_]` replaced by `_` so the name is safe in a header.
pub fn attachment_filename(date: &str) -> String {
    let date: String = date
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("grid_availability_{date}.png")
}

/// JSON envelope returned instead of raw bytes when base64 output is requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageEnvelope {
    pub success: bool,
    pub message: String,
    pub image_size: String,
    pub image_base64: String,
    pub mime_type: String,
}

impl ImageEnvelope {
    pub fn new(png: &[u8], orientation: Orientation) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            image_size: orientation.size_label(),
            image_base64: STANDARD.encode(png),
            mime_type: MIME_PNG.to_string(),
        }
    }
}

/// Sample day used when the CLI is run without input.
pub fn example_grid_data() -> GridData {
    let mut map = Map::new();
    map.insert(DATE_KEY.to_string(), json!("20-11-2025"));
    let symbols = [
        (0..=5, HourState::AVAILABLE_SYMBOL),
        (6..=12, HourState::UNAVAILABLE_SYMBOL),
        (13..=15, HourState::AVAILABLE_SYMBOL),
        (16..=16, HourState::PARTIAL_SYMBOL),
        (17..=22, HourState::UNAVAILABLE_SYMBOL),
        (23..=23, HourState::PARTIAL_SYMBOL),
    ];
    for (hours, symbol) in symbols {
        for hour in hours {
            map.insert(GridData::hour_key(hour), json!(symbol));
        }
    }
    // Out of range on purpose; ignored by the parser
    map.insert("T_24".to_string(), json!(HourState::UNKNOWN_SYMBOL));
    GridData(map)
}

/// JSON schema of the `grid_data` object.
pub fn grid_data_schema() -> Value {
    let mut properties = Map::new();
    properties.insert(
        DATE_KEY.to_string(),
        json!({
            "type": "string",
            "description": "Date in DD-MM-YYYY format (e.g., '20-11-2025')"
        }),
    );
    for hour in 0..HOURS_PER_DAY {
        properties.insert(
            GridData::hour_key(hour),
            json!({
                "type": "string",
                "description": format!(
                    "State for hour {hour}: '●' (available), '✕' (unavailable), '%' (partial), '-' (unknown)"
                )
            }),
        );
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": [DATE_KEY]
    })
}

/// Input schema of an image tool. `vertical` adds the orientation flag and
/// `output_path` the destination file option.
pub fn input_schema(vertical: bool, output_path: bool) -> Value {
    let mut properties = Map::new();
    properties.insert("grid_data".to_string(), grid_data_schema());
    if output_path {
        properties.insert(
            "output_path".to_string(),
            json!({
                "type": "string",
                "description": "Optional output file path. If not provided, a temporary file will be used."
            }),
        );
    }
    properties.insert(
        "return_base64".to_string(),
        json!({
            "type": "boolean",
            "description": "If true, return the image as a base64-encoded string.",
            "default": false
        }),
    );
    if vertical {
        properties.insert(
            "vertical".to_string(),
            json!({
                "type": "boolean",
                "description": "If true, generate vertical image (250x1024px). If false, generate horizontal image (1024x250px).",
                "default": false
            }),
        );
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["grid_data"]
    })
}
