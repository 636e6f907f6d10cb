//! Hour states to colored segments, and the current-time position.
//!
//! Everything here is pure: no pixels, no clock reads. Positions are expressed
//! in hours along the day (0.0 to 24.0) and mapped to pixels by
//! [`crate::layout::Axis`].

use crate::{config::Palette, DayRecord, HourState, HOURS_PER_DAY};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use embedded_graphics::pixelcolor::Rgb888;

/// Date label format used on the wire, e.g. `20-11-2025`.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Color class of a drawn segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tone {
    Available,
    Unavailable,
    Neutral,
}

impl Tone {
    /// Tone of a raw state. Partial and Unknown have no color of their own.
    pub fn of(state: HourState) -> Self {
        match state {
            HourState::Available => Tone::Available,
            HourState::Unavailable => Tone::Unavailable,
            HourState::Partial | HourState::Unknown => Tone::Neutral,
        }
    }

    pub fn color(self, palette: &Palette) -> Rgb888 {
        match self {
            Tone::Available => palette.available.rgb(),
            Tone::Unavailable => palette.unavailable.rgb(),
            Tone::Neutral => palette.neutral.rgb(),
        }
    }
}

/// A colored stretch of the availability line, in hours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Hour slot the segment belongs to
    pub hour: u8,
    pub start: f32,
    pub end: f32,
    pub tone: Tone,
}

/// Raw state of the hour before `hour`. Hour 0 is its own predecessor.
pub fn previous_state(record: &DayRecord, hour: u8) -> HourState {
    record.state_at(hour.saturating_sub(1))
}

/// Raw state of the hour after `hour`. The last hour is its own successor.
pub fn next_state(record: &DayRecord, hour: u8) -> HourState {
    if hour + 1 >= HOURS_PER_DAY {
        record.state_at(hour)
    } else {
        record.state_at(hour + 1)
    }
}

/// Resolve all 24 hours into segments, in drawing order.
///
/// Full hours produce one segment. A partial hour is split at its midpoint:
/// the first half takes the previous hour's color, the second half the next
/// hour's. Neighbors are looked up raw, so a partial neighbor (or a partial
/// edge hour looking at itself) resolves to the neutral tone.
pub fn segments(record: &DayRecord) -> Vec<Segment> {
    let mut out = Vec::with_capacity(HOURS_PER_DAY as usize * 2);
    for hour in 0..HOURS_PER_DAY {
        let start = f32::from(hour);
        let end = start + 1.0;
        match record.state_at(hour) {
            HourState::Partial => {
                let mid = start + 0.5;
                out.push(Segment {
                    hour,
                    start,
                    end: mid,
                    tone: Tone::of(previous_state(record, hour)),
                });
                out.push(Segment {
                    hour,
                    start: mid,
                    end,
                    tone: Tone::of(next_state(record, hour)),
                });
            }
            state => out.push(Segment {
                hour,
                start,
                end,
                tone: Tone::of(state),
            }),
        }
    }
    out
}

/// Parse a `DD-MM-YYYY` label. Malformed labels yield `None`.
pub fn parse_date(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(label.trim(), DATE_FORMAT).ok()
}

/// Position of `now` in hours when the record's date is today, else `None`.
pub fn now_position(date_label: &str, now: NaiveDateTime) -> Option<f32> {
    let date = parse_date(date_label)?;
    if date != now.date() {
        return None;
    }
    Some(now.hour() as f32 + now.minute() as f32 / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, hour: u32, minute: u32) -> NaiveDateTime {
        parse_date(date)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn tone_at(segments: &[Segment], pos: f32) -> Tone {
        segments
            .iter()
            .find(|s| s.start <= pos && pos < s.end)
            .map(|s| s.tone)
            .unwrap()
    }

    #[test]
    fn test_empty_record_is_all_available() {
        let segments = segments(&DayRecord::new("20-11-2025"));
        assert_eq!(segments.len(), 24);
        assert!(segments.iter().all(|s| s.tone == Tone::Available));
        assert_eq!(segments[23].end, 24.0);
    }

    #[test]
    fn test_partial_takes_neighbor_colors() {
        let record = DayRecord::new("20-11-2025")
            .with_hour(15, HourState::Available)
            .with_hour(16, HourState::Partial)
            .with_hour(17, HourState::Unavailable);
        let segments = segments(&record);
        assert_eq!(segments.len(), 25);
        assert_eq!(tone_at(&segments, 16.25), Tone::Available);
        assert_eq!(tone_at(&segments, 16.75), Tone::Unavailable);
    }

    #[test]
    fn test_partial_edges_use_own_state() {
        let record = DayRecord::new("20-11-2025")
            .with_hour(0, HourState::Partial)
            .with_hour(1, HourState::Unavailable)
            .with_hour(22, HourState::Unavailable)
            .with_hour(23, HourState::Partial);
        let segments = segments(&record);
        assert_eq!(tone_at(&segments, 0.25), Tone::Neutral);
        assert_eq!(tone_at(&segments, 0.75), Tone::Unavailable);
        assert_eq!(tone_at(&segments, 23.25), Tone::Unavailable);
        assert_eq!(tone_at(&segments, 23.75), Tone::Neutral);
    }

    #[test]
    fn test_partial_next_to_partial_is_neutral() {
        let record = DayRecord::new("20-11-2025")
            .with_hour(9, HourState::Partial)
            .with_hour(10, HourState::Partial);
        let segments = segments(&record);
        assert_eq!(tone_at(&segments, 9.25), Tone::Available);
        assert_eq!(tone_at(&segments, 9.75), Tone::Neutral);
        assert_eq!(tone_at(&segments, 10.25), Tone::Neutral);
        assert_eq!(tone_at(&segments, 10.75), Tone::Available);
    }

    #[test]
    fn test_unknown_is_neutral() {
        let record = DayRecord::new("20-11-2025").with_hour(5, HourState::Unknown);
        assert_eq!(tone_at(&segments(&record), 5.5), Tone::Neutral);
    }

    #[test]
    fn test_now_position_only_for_today() {
        let now = at("20-11-2025", 14, 30);
        assert_eq!(now_position("20-11-2025", now), Some(14.5));
        assert_eq!(now_position("19-11-2025", now), None);
        assert_eq!(now_position("2025-11-20", now), None);
        assert_eq!(now_position("", now), None);
    }

    #[test]
    fn test_now_position_at_midnight() {
        assert_eq!(now_position("01-01-2026", at("01-01-2026", 0, 0)), Some(0.0));
        let late = now_position("01-01-2026", at("01-01-2026", 23, 59)).unwrap();
        assert!(late < 24.0 && late > 23.98);
    }
}
