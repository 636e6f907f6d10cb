//! # End-to-End Rendering Tests
//!
//! These tests render complete images with deterministic bitmap fonts and a
//! fixed clock, then probe pixels on the availability line. Colors are checked
//! at slot midpoints (and at quarter points for split hours) so that tick
//! marks and hour separators never interfere.

use chrono::{NaiveDate, NaiveDateTime};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};

use crate::{
    canvas::Canvas,
    config::Style,
    error::RenderError,
    request::{example_grid_data, GenerateImageRequest},
    text::{FontSpec, MonoPainter, TextPainter},
    DayRecord, GridRenderer, HourState, Layout, Orientation,
};

const GREEN: Rgb888 = Rgb888::new(52, 199, 89);
const ORANGE: Rgb888 = Rgb888::new(255, 107, 0);
const GRAY: Rgb888 = Rgb888::new(142, 142, 147);
const MARKER: Rgb888 = Rgb888::new(128, 128, 128);

const BOTH: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

fn renderer() -> GridRenderer<MonoPainter> {
    GridRenderer::new(Style::default(), MonoPainter)
}

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// A clock that is never on the rendered date.
fn other_day() -> NaiveDateTime {
    at(1, 12, 0)
}

/// Color on the availability line at `hours` along the day.
fn line_color(canvas: &Canvas, orientation: Orientation, hours: f32) -> Rgb888 {
    let layout = Layout::compute(orientation, &Style::default());
    let point = layout.axis.point_at(hours, 0);
    canvas.pixel(point.x, point.y).unwrap()
}

fn compose(record: &DayRecord, orientation: Orientation) -> Canvas {
    renderer()
        .compose(record, orientation, other_day())
        .unwrap()
}

/// Every hour of an empty record is drawn green, in both orientations.
#[test]
fn empty_record_renders_all_available() {
    let record = DayRecord::new("20-11-2025");
    for orientation in BOTH {
        let canvas = compose(&record, orientation);
        for hour in 0..24u8 {
            assert_eq!(
                line_color(&canvas, orientation, f32::from(hour) + 0.5),
                GREEN,
                "hour {hour} should default to available ({orientation:?})"
            );
        }
    }
}

/// The reference request: one unavailable hour and one partial hour whose
/// neighbors are both available.
#[test]
fn reference_request_round_trip() {
    let request = GenerateImageRequest::from_value(serde_json::json!({
        "grid_data": {"T_Date": "20-11-2025", "T_06": "✕", "T_16": "%"}
    }))
    .unwrap();
    let record = request.record().unwrap();
    let canvas = compose(&record, request.orientation());
    assert_eq!((canvas.width(), canvas.height()), (1024, 250));

    for hour in 0..24u8 {
        let expected = if hour == 6 { ORANGE } else { GREEN };
        assert_eq!(
            line_color(&canvas, Orientation::Horizontal, f32::from(hour) + 0.5),
            expected,
            "unexpected color at hour {hour}"
        );
    }
    // Hour 16 splits between hour 15 and hour 17, both available
    assert_eq!(line_color(&canvas, Orientation::Horizontal, 16.25), GREEN);
    assert_eq!(line_color(&canvas, Orientation::Horizontal, 16.75), GREEN);
}

/// A partial hour takes the previous color on its first half and the next
/// color on its second half.
#[test]
fn partial_hour_splits_between_neighbors() {
    let record = DayRecord::new("20-11-2025")
        .with_hour(16, HourState::Partial)
        .with_hour(17, HourState::Unavailable);
    for orientation in BOTH {
        let canvas = compose(&record, orientation);
        assert_eq!(line_color(&canvas, orientation, 16.25), GREEN);
        assert_eq!(line_color(&canvas, orientation, 16.75), ORANGE);
        assert_eq!(line_color(&canvas, orientation, 17.5), ORANGE);
    }
}

/// Partial first and last hours look at themselves on their outer half,
/// which resolves to the neutral color.
#[test]
fn partial_edge_hours_use_their_own_state() {
    let record = DayRecord::new("20-11-2025")
        .with_hour(0, HourState::Partial)
        .with_hour(1, HourState::Unavailable)
        .with_hour(22, HourState::Unavailable)
        .with_hour(23, HourState::Partial);
    let canvas = compose(&record, Orientation::Horizontal);
    assert_eq!(line_color(&canvas, Orientation::Horizontal, 0.25), GRAY);
    assert_eq!(line_color(&canvas, Orientation::Horizontal, 0.75), ORANGE);
    assert_eq!(line_color(&canvas, Orientation::Horizontal, 23.25), ORANGE);
    assert_eq!(line_color(&canvas, Orientation::Horizontal, 23.75), GRAY);
}

/// Unknown and unrecognized symbols are drawn in the neutral color.
#[test]
fn unknown_symbols_render_neutral() {
    let request = GenerateImageRequest::from_value(serde_json::json!({
        "grid_data": {"T_Date": "20-11-2025", "T_03": "-", "T_04": "??", "T_05": 1}
    }))
    .unwrap();
    let canvas = compose(&request.record().unwrap(), Orientation::Vertical);
    for hour in [3.5, 4.5, 5.5] {
        assert_eq!(line_color(&canvas, Orientation::Vertical, hour), GRAY);
    }
    assert_eq!(line_color(&canvas, Orientation::Vertical, 6.5), GREEN);
}

/// Canvas size depends only on orientation.
#[test]
fn canvas_size_follows_orientation() {
    let record = example_grid_data().to_record().unwrap();
    let horizontal = compose(&record, Orientation::Horizontal);
    let vertical = compose(&record, Orientation::Vertical);
    assert_eq!((horizontal.width(), horizontal.height()), (1024, 250));
    assert_eq!((vertical.width(), vertical.height()), (250, 1024));
}

/// The now marker is drawn for today's date only, not yesterday or tomorrow.
#[test]
fn now_marker_only_for_today() {
    let record = DayRecord::new("20-11-2025");
    for orientation in BOTH {
        let today = renderer()
            .compose(&record, orientation, at(20, 14, 30))
            .unwrap();
        assert!(
            today.count_color(MARKER) > 0,
            "marker missing for today ({orientation:?})"
        );
        for day in [19, 21] {
            let other = renderer()
                .compose(&record, orientation, at(day, 14, 30))
                .unwrap();
            assert_eq!(
                other.count_color(MARKER),
                0,
                "marker drawn with the clock on day {day} ({orientation:?})"
            );
        }
    }
}

/// The marker pointer sits just before the availability line at the
/// current time.
#[test]
fn now_marker_position() {
    let record = DayRecord::new("20-11-2025");
    let canvas = renderer()
        .compose(&record, Orientation::Horizontal, at(20, 14, 30))
        .unwrap();
    let layout = Layout::compute(Orientation::Horizontal, &Style::default());
    let x = layout.axis.pixel_at(14.5);
    // Pointer base row is 12px above the axis
    assert_eq!(canvas.pixel(x, layout.axis.cross - 12), Some(MARKER));
    assert_eq!(canvas.pixel(x, layout.axis.cross - 8), Some(MARKER));
}

/// Malformed dates never fail the render; they only suppress the marker.
#[test]
fn malformed_date_renders_without_marker() {
    let record = DayRecord::new("next tuesday");
    let canvas = renderer()
        .compose(&record, Orientation::Horizontal, at(20, 9, 0))
        .unwrap();
    assert_eq!(canvas.count_color(MARKER), 0);
}

/// Draws every text box as a solid block, so text placement can be checked
/// without glyph shapes.
struct BlockPainter;

impl TextPainter for BlockPainter {
    fn measure(&self, text: &str, font: FontSpec) -> Size {
        Size::new(8 * text.chars().count() as u32, font.px)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError> {
        canvas.fill_solid(&Rectangle::new(top_left, self.measure(text, font)), color)?;
        Ok(())
    }
}

/// The title is horizontally centered on the canvas.
#[test]
fn title_is_centered() {
    let renderer = GridRenderer::new(Style::default(), BlockPainter);
    let canvas = renderer
        .compose(&DayRecord::new("20-11-2025"), Orientation::Horizontal, other_day())
        .unwrap();
    let layout = Layout::compute(Orientation::Horizontal, &Style::default());

    let y = layout.title_top + 5;
    let inked: Vec<i32> = (0..canvas.width() as i32)
        .filter(|x| canvas.pixel(*x, y) == Some(Rgb888::BLACK))
        .collect();
    let (first, last) = (inked[0], inked[inked.len() - 1]);
    // 29 characters at 8px
    assert_eq!(last - first + 1, 232);
    assert_eq!(first, (1024 - 232) / 2);
}

/// The vertical title wraps to two centered lines.
#[test]
fn vertical_title_wraps() {
    let renderer = GridRenderer::new(Style::default(), BlockPainter);
    let canvas = renderer
        .compose(&DayRecord::new("20-11-2025"), Orientation::Vertical, other_day())
        .unwrap();
    let layout = Layout::compute(Orientation::Vertical, &Style::default());
    let row_width = |y: i32| {
        (0..canvas.width() as i32)
            .filter(|x| canvas.pixel(*x, y) == Some(Rgb888::BLACK))
            .count()
    };
    // "Electricity Grid" then "Availability"
    assert_eq!(row_width(layout.title_top + 2), 16 * 8);
    assert_eq!(row_width(layout.title_top + 19 + 2), 12 * 8);
}

/// The legend swatches use the state colors.
#[test]
fn legend_swatches() {
    for orientation in BOTH {
        let canvas = compose(&DayRecord::new("20-11-2025"), orientation);
        let origin = Layout::compute(orientation, &Style::default()).legend_origin;
        assert_eq!(canvas.pixel(origin.x + 20, origin.y + 8), Some(GREEN));
        let second = match orientation {
            // "Available" is 9 bitmap characters of 7px
            Orientation::Horizontal => origin + Point::new(50 + 63 + 20 + 20, 8),
            Orientation::Vertical => origin + Point::new(20, 22 + 8),
        };
        assert_eq!(canvas.pixel(second.x, second.y), Some(ORANGE));
    }
}

/// Styles are plain values: a custom palette changes the output colors.
#[test]
fn custom_palette_is_used() {
    let mut style = Style::default();
    style.palette.available = crate::config::Color::new(0, 0, 255);
    let renderer = GridRenderer::new(style, MonoPainter);
    let canvas = renderer
        .compose(&DayRecord::new("20-11-2025"), Orientation::Horizontal, other_day())
        .unwrap();
    assert_eq!(
        line_color(&canvas, Orientation::Horizontal, 0.5),
        Rgb888::new(0, 0, 255)
    );
    assert_eq!(canvas.count_color(GREEN), 0);
}

/// Renders produce decodable PNGs of the right size.
#[test]
fn png_output_decodes() {
    let record = example_grid_data().to_record().unwrap();
    for orientation in BOTH {
        let png = renderer()
            .render_at(&record, orientation, other_day())
            .unwrap();
        let image = image::load_from_memory(&png).unwrap();
        let expected = orientation.canvas_size();
        assert_eq!((image.width(), image.height()), (expected.width, expected.height));
    }
}
