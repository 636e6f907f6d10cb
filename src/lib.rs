//! # Grid Availability Core Library
//!
//! This library renders a single day of hourly electricity grid availability
//! into a fixed-layout PNG card. The rendering engine is a pure function of its
//! input: one [`DayRecord`] and one [`Orientation`] in, one image out. Nothing is
//! cached between calls except the process-wide font discovery in [`text`].
//!
//! ## Data Flow
//! 1. **Adapters** ([`request`], [`server`], [`mcp`], the CLI) parse JSON into a
//!    [`DayRecord`] and reject payloads without a date
//! 2. **Layout** ([`layout`]) derives every position from the orientation and the
//!    immutable [`config::Style`]
//! 3. **Timeline** ([`timeline`]) resolves the 24 hour states into colored segments
//! 4. **Renderer** ([`renderer`]) draws cards, axis, segments, marker and legend onto
//!    a [`canvas::Canvas`] and encodes it as PNG
//!
//! ## Core Types
//! - [`HourState`]: availability of one hour, parsed from the wire symbols
//! - [`DayRecord`]: date label plus a sparse hour → state map

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Module declarations
pub mod canvas;
pub mod config;
pub mod error;
pub mod layout;
pub mod mcp;
pub mod primitives;
pub mod renderer;
pub mod request;
pub mod server;
pub mod text;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use error::{RenderError, RequestError};
pub use layout::{Layout, Orientation};
pub use renderer::GridRenderer;

/// Number of hour slots drawn on every timeline.
pub const HOURS_PER_DAY: u8 = 24;

/// Availability of the grid during one hour.
///
/// The wire format uses single symbols:
/// - `●` available
/// - `✕` unavailable
/// - `%` partial (availability changed during the hour)
/// - anything else, typically `-`, is unknown
///
/// Unrecognized symbols are never an error; they become [`HourState::Unknown`]
/// and render in the neutral color.
///
/// # Example
/// ```
/// use grid_image_lib::HourState;
///
/// assert_eq!(HourState::from_symbol("●"), HourState::Available);
/// assert_eq!(HourState::from_symbol("✕"), HourState::Unavailable);
/// assert_eq!(HourState::from_symbol("?"), HourState::Unknown);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HourState {
    #[default]
    Available,
    Unavailable,
    Partial,
    Unknown,
}

impl HourState {
    pub const AVAILABLE_SYMBOL: &'static str = "●";
    pub const UNAVAILABLE_SYMBOL: &'static str = "✕";
    pub const PARTIAL_SYMBOL: &'static str = "%";
    pub const UNKNOWN_SYMBOL: &'static str = "-";

    /// Parse a wire symbol. Matching is exact, so `" ✕"` is unknown.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            Self::AVAILABLE_SYMBOL => HourState::Available,
            Self::UNAVAILABLE_SYMBOL => HourState::Unavailable,
            Self::PARTIAL_SYMBOL => HourState::Partial,
            _ => HourState::Unknown,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            HourState::Available => Self::AVAILABLE_SYMBOL,
            HourState::Unavailable => Self::UNAVAILABLE_SYMBOL,
            HourState::Partial => Self::PARTIAL_SYMBOL,
            HourState::Unknown => Self::UNKNOWN_SYMBOL,
        }
    }
}

impl From<String> for HourState {
    fn from(symbol: String) -> Self {
        HourState::from_symbol(&symbol)
    }
}

impl From<HourState> for String {
    fn from(state: HourState) -> Self {
        state.symbol().to_string()
    }
}

/// One day of hourly availability.
///
/// The hour map is sparse: any hour without an entry is [`HourState::Available`].
/// Hours outside `0..24` are dropped on insertion so every record describes
/// exactly 24 slots.
///
/// # Example
/// ```
/// use grid_image_lib::{DayRecord, HourState};
///
/// let record = DayRecord::new("20-11-2025")
///     .with_hour(6, HourState::Unavailable)
///     .with_hour(16, HourState::Partial);
///
/// assert_eq!(record.state_at(0), HourState::Available);
/// assert_eq!(record.state_at(6), HourState::Unavailable);
/// assert_eq!(record.explicit_hours(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDayRecord")]
pub struct DayRecord {
    /// Free-text date label, nominally `DD-MM-YYYY`
    pub date: String,
    /// Explicitly provided hour states, keyed by hour (0-23)
    hour_states: BTreeMap<u8, HourState>,
}

/// Serialized shape of [`DayRecord`]; hours pass through
/// [`DayRecord::set_hour`] on the way in.
#[derive(Deserialize)]
struct RawDayRecord {
    date: String,
    #[serde(default)]
    hour_states: BTreeMap<u8, HourState>,
}

impl From<RawDayRecord> for DayRecord {
    fn from(raw: RawDayRecord) -> Self {
        let mut record = DayRecord::new(raw.date);
        for (hour, state) in raw.hour_states {
            record.set_hour(hour, state);
        }
        record
    }
}

impl DayRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            hour_states: BTreeMap::new(),
        }
    }

    /// Builder-style variant of [`DayRecord::set_hour`].
    pub fn with_hour(mut self, hour: u8, state: HourState) -> Self {
        self.set_hour(hour, state);
        self
    }

    /// Record the state of one hour. Out-of-range hours are ignored.
    pub fn set_hour(&mut self, hour: u8, state: HourState) {
        if hour < HOURS_PER_DAY {
            self.hour_states.insert(hour, state);
        }
    }

    /// State of `hour`, defaulting to [`HourState::Available`] when absent.
    pub fn state_at(&self, hour: u8) -> HourState {
        self.hour_states.get(&hour).copied().unwrap_or_default()
    }

    /// Number of hours that were given explicitly.
    pub fn explicit_hours(&self) -> usize {
        self.hour_states.len()
    }

    /// Explicitly provided hours in ascending order.
    pub fn explicit(&self) -> impl Iterator<Item = (u8, HourState)> + '_ {
        self.hour_states.iter().map(|(hour, state)| (*hour, *state))
    }

    /// All 24 states in hour order, defaults filled in.
    pub fn states(&self) -> [HourState; HOURS_PER_DAY as usize] {
        let mut states = [HourState::Available; HOURS_PER_DAY as usize];
        for (hour, state) in &self.hour_states {
            states[*hour as usize] = *state;
        }
        states
    }
}

#[cfg(test)]
mod record_tests {
    use super::*;

    #[test]
    fn test_symbol_parsing() {
        assert_eq!(HourState::from_symbol("●"), HourState::Available);
        assert_eq!(HourState::from_symbol("✕"), HourState::Unavailable);
        assert_eq!(HourState::from_symbol(" ✕"), HourState::Unknown);
        assert_eq!(HourState::from_symbol("● "), HourState::Unknown);
        assert_eq!(HourState::from_symbol("%"), HourState::Partial);
        assert_eq!(HourState::from_symbol("-"), HourState::Unknown);
        assert_eq!(HourState::from_symbol(""), HourState::Unknown);
        assert_eq!(HourState::from_symbol("available"), HourState::Unknown);
    }

    #[test]
    fn test_missing_hours_default_to_available() {
        let record = DayRecord::new("01-01-2025");
        assert!(record.states().iter().all(|s| *s == HourState::Available));
        assert_eq!(record.explicit_hours(), 0);
    }

    #[test]
    fn test_out_of_range_hours_are_dropped() {
        let record = DayRecord::new("01-01-2025")
            .with_hour(24, HourState::Unavailable)
            .with_hour(200, HourState::Unavailable);
        assert_eq!(record.explicit_hours(), 0);
    }

    #[test]
    fn test_deserialize_drops_out_of_range_hours() {
        let record: DayRecord = serde_json::from_str(
            r#"{"date":"20-11-2025","hour_states":{"200":"✕","24":"%","6":"✕"}}"#,
        )
        .unwrap();
        assert_eq!(record.explicit_hours(), 1);
        assert_eq!(record.state_at(6), HourState::Unavailable);
        assert_eq!(record.states().len(), 24);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(serde_json::from_str::<DayRecord>(&json).unwrap(), record);
    }

    #[test]
    fn test_state_serde_uses_symbols() {
        let json = serde_json::to_string(&HourState::Unavailable).unwrap();
        assert_eq!(json, "\"✕\"");
        let parsed: HourState = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(parsed, HourState::Unknown);
    }
}
