//! Geometry for one render.
//!
//! Both orientations share one algorithm. Positions along the timeline are
//! expressed on the *primary* axis (x for horizontal, y for vertical) and
//! positions across it on the *cross* axis; [`Orientation`] maps those back
//! to screen coordinates. Header and legend are always laid out upright.

use crate::{config::Style, text::FontSpec, HOURS_PER_DAY};
use embedded_graphics::{prelude::*, primitives::Rectangle};
use serde::{Deserialize, Serialize};

/// Canvas size of the horizontal layout.
pub const HORIZONTAL_SIZE: Size = Size::new(1024, 250);
/// Canvas size of the vertical layout.
pub const VERTICAL_SIZE: Size = Size::new(250, 1024);

/// Title top, measured from the outer card's top edge.
pub const HEADER_OFFSET: i32 = 16;
/// Gap after each title line.
pub const LINE_GAP: u32 = 4;
/// Gap between date label and separator.
pub const SEPARATOR_GAP: u32 = 7;
/// Gap between separator and timeline card.
pub const TIMELINE_GAP: i32 = 8;
/// Gap between timeline card and legend.
pub const LEGEND_GAP: i32 = 12;
/// Height of one legend row.
pub const LEGEND_ROW: i32 = 22;
/// Gap between a tick's end and its label.
pub const TICK_LABEL_GAP: i32 = 4;

/// Which way the timeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// How the two legend entries are arranged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegendFlow {
    /// Side by side on one row
    Inline,
    /// One row per entry
    Stacked,
}

/// Per-orientation typography and placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub title_font: FontSpec,
    /// Row budget for the wrapped title
    pub title_lines: usize,
    pub date_font: FontSpec,
    pub tick_font: FontSpec,
    pub legend_font: FontSpec,
    /// Axis inset from both primary ends of the timeline card
    pub axis_inset: i32,
    /// Axis offset from the timeline card's cross start
    pub axis_offset: i32,
    pub legend_flow: LegendFlow,
}

const HORIZONTAL_METRICS: Metrics = Metrics {
    title_font: FontSpec::semibold(22),
    title_lines: 1,
    date_font: FontSpec::regular(15),
    tick_font: FontSpec::regular(10),
    legend_font: FontSpec::regular(13),
    axis_inset: 0,
    axis_offset: 48,
    legend_flow: LegendFlow::Inline,
};

const VERTICAL_METRICS: Metrics = Metrics {
    title_font: FontSpec::semibold(15),
    title_lines: 2,
    date_font: FontSpec::regular(13),
    tick_font: FontSpec::regular(10),
    legend_font: FontSpec::regular(13),
    axis_inset: 16,
    axis_offset: 70,
    legend_flow: LegendFlow::Stacked,
};

impl Orientation {
    pub fn from_vertical(vertical: bool) -> Self {
        if vertical {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    pub fn is_vertical(self) -> bool {
        self == Orientation::Vertical
    }

    /// Canvas size, fixed per orientation.
    pub const fn canvas_size(self) -> Size {
        match self {
            Orientation::Horizontal => HORIZONTAL_SIZE,
            Orientation::Vertical => VERTICAL_SIZE,
        }
    }

    /// Human-readable canvas size, e.g. `1024x250px`.
    pub fn size_label(self) -> String {
        let size = self.canvas_size();
        format!("{}x{}px", size.width, size.height)
    }

    pub fn metrics(self) -> &'static Metrics {
        match self {
            Orientation::Horizontal => &HORIZONTAL_METRICS,
            Orientation::Vertical => &VERTICAL_METRICS,
        }
    }

    /// Screen point for axis coordinates.
    pub fn point(self, primary: i32, cross: i32) -> Point {
        match self {
            Orientation::Horizontal => Point::new(primary, cross),
            Orientation::Vertical => Point::new(cross, primary),
        }
    }

    /// Screen rectangle for a box given in axis coordinates.
    pub fn rect(self, primary: i32, cross: i32, primary_len: u32, cross_len: u32) -> Rectangle {
        Rectangle::new(self.point(primary, cross), self.size(primary_len, cross_len))
    }

    /// Screen size for axis lengths.
    pub fn size(self, primary_len: u32, cross_len: u32) -> Size {
        match self {
            Orientation::Horizontal => Size::new(primary_len, cross_len),
            Orientation::Vertical => Size::new(cross_len, primary_len),
        }
    }

    /// Screen size split into `(primary_len, cross_len)`.
    pub fn split(self, size: Size) -> (u32, u32) {
        match self {
            Orientation::Horizontal => (size.width, size.height),
            Orientation::Vertical => (size.height, size.width),
        }
    }

    /// Start and length of `area` along the primary axis.
    pub fn primary_span(self, area: &Rectangle) -> (i32, u32) {
        match self {
            Orientation::Horizontal => (area.top_left.x, area.size.width),
            Orientation::Vertical => (area.top_left.y, area.size.height),
        }
    }

    /// Start and length of `area` along the cross axis.
    pub fn cross_span(self, area: &Rectangle) -> (i32, u32) {
        match self {
            Orientation::Horizontal => (area.top_left.y, area.size.height),
            Orientation::Vertical => (area.top_left.x, area.size.width),
        }
    }
}

/// The timeline axis: where hours land on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Axis {
    pub orientation: Orientation,
    /// Primary coordinate of 00:00
    pub start: i32,
    /// Primary length of the whole day
    pub length: u32,
    /// Cross coordinate of the axis line
    pub cross: i32,
}

impl Axis {
    /// Primary length of one hour slot.
    pub fn slot_len(&self) -> f32 {
        self.length as f32 / f32::from(HOURS_PER_DAY)
    }

    /// Primary coordinate of a position given in hours.
    pub fn primary_at(&self, hours: f32) -> f32 {
        self.start as f32 + hours * self.slot_len()
    }

    /// Pixel-rounded primary coordinate.
    pub fn pixel_at(&self, hours: f32) -> i32 {
        self.primary_at(hours).round() as i32
    }

    /// Screen point `cross_offset` pixels across from the axis at `hours`.
    pub fn point_at(&self, hours: f32, cross_offset: i32) -> Point {
        self.orientation
            .point(self.pixel_at(hours), self.cross + cross_offset)
    }

    /// Screen point at the middle of `hour`'s slot, on the axis line.
    pub fn slot_center(&self, hour: u8) -> Point {
        self.point_at(f32::from(hour) + 0.5, 0)
    }
}

/// Every position needed to draw one image.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub orientation: Orientation,
    pub canvas: Size,
    pub metrics: Metrics,
    /// Outer rounded card
    pub card: Rectangle,
    /// Card interior minus padding; header text and separator span its width
    pub content: Rectangle,
    /// Top of the first title line
    pub title_top: i32,
    pub date_top: i32,
    /// Separator endpoints
    pub separator: (Point, Point),
    /// Inner rounded card holding the axis
    pub timeline_card: Rectangle,
    pub axis: Axis,
    /// Top-left of the first legend entry
    pub legend_origin: Point,
}

impl Layout {
    /// Derive the layout for `orientation` from `style`.
    pub fn compute(orientation: Orientation, style: &Style) -> Self {
        let canvas = orientation.canvas_size();
        let metrics = *orientation.metrics();
        let margin = style.margin as i32;
        let padding = style.card_padding as i32;
        let (width, height) = (canvas.width as i32, canvas.height as i32);

        let card = Rectangle::new(
            Point::new(margin, margin),
            Size::new(span(margin, width - margin), span(margin, height - margin)),
        );
        let content_left = margin + padding;
        let content_right = width - margin - padding;
        let card_bottom = height - margin;
        let content = Rectangle::new(
            Point::new(content_left, margin + padding),
            Size::new(
                span(content_left, content_right),
                span(margin + padding, card_bottom - padding),
            ),
        );

        let title_top = margin + HEADER_OFFSET;
        let title_rows = metrics.title_lines as i32 * (metrics.title_font.px + LINE_GAP) as i32;
        let date_top = title_top + title_rows;
        let separator_y = date_top + (metrics.date_font.px + SEPARATOR_GAP) as i32;
        let separator = (
            Point::new(content_left, separator_y),
            Point::new(content_right, separator_y),
        );

        let legend_rows = match metrics.legend_flow {
            LegendFlow::Inline => 1,
            LegendFlow::Stacked => 2,
        };
        let timeline_top = separator_y + TIMELINE_GAP;
        let timeline_bottom = card_bottom - padding - legend_rows * LEGEND_ROW - LEGEND_GAP;
        let timeline_card = Rectangle::new(
            Point::new(content_left, timeline_top),
            Size::new(
                span(content_left, content_right),
                span(timeline_top, timeline_bottom),
            ),
        );

        let (primary_start, primary_len) = orientation.primary_span(&timeline_card);
        let (cross_start, _) = orientation.cross_span(&timeline_card);
        let axis = Axis {
            orientation,
            start: primary_start + metrics.axis_inset,
            length: primary_len.saturating_sub(2 * metrics.axis_inset as u32),
            cross: cross_start + metrics.axis_offset,
        };

        Self {
            orientation,
            canvas,
            metrics,
            card,
            content,
            title_top,
            date_top,
            separator,
            timeline_card,
            axis,
            legend_origin: Point::new(content_left, timeline_bottom + LEGEND_GAP),
        }
    }
}

/// Length from `from` to `to`, zero when reversed.
fn span(from: i32, to: i32) -> u32 {
    (to - from).max(0) as u32
}
