//! # Grid Availability Rendering
//!
//! [`GridRenderer`] turns one [`DayRecord`] into a PNG card. Drawing happens
//! in a fixed order on a fresh [`Canvas`] per call:
//!
//! 1. outer card and header (title, date, separator)
//! 2. timeline card, axis, hour ticks and `HH:00` labels
//! 3. availability segments and hour boundary separators
//! 4. the "now" marker, only when the record's date is today
//! 5. the legend
//!
//! The renderer holds nothing but an immutable [`Style`] and a
//! [`TextPainter`], so one instance can serve concurrent requests.

use crate::{
    canvas::Canvas,
    config::{Config, Style},
    error::RenderError,
    layout::{Layout, LegendFlow, Orientation, LEGEND_ROW, LINE_GAP, TICK_LABEL_GAP},
    primitives::{dashed_line, fill_rounded_rect, stroke_rounded_rect},
    text::{wrap_lines, FontSpec, SystemPainter, TextPainter},
    timeline::{self, Segment},
    DayRecord, HOURS_PER_DAY,
};
use chrono::{Local, NaiveDateTime};
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Triangle},
};
use std::{fs, path::Path};
use tracing::debug;

/// Legend swatch length.
const SWATCH_LEN: i32 = 40;
const SWATCH_THICKNESS: u32 = 4;
/// Swatch offset from the legend row top.
const SWATCH_OFFSET: i32 = 8;
/// Label offset from the swatch start.
const SWATCH_LABEL_GAP: i32 = 50;
const LABEL_OFFSET: i32 = 2;
/// Gap between inline legend entries.
const LEGEND_ITEM_GAP: i32 = 20;
/// Half width of the now pointer.
const POINTER: i32 = 3;
/// Gap between the availability line and the pointer tip.
const POINTER_GAP: i32 = 9;
/// Guide extent before and after the pointer base.
const GUIDE_BEFORE: i32 = 30;
const GUIDE_AFTER: i32 = 40;
/// Extra reach of hour separators beyond the availability line.
const SEPARATOR_REACH: i32 = 2;

/// Renders day records into PNG images.
pub struct GridRenderer<P = &'static SystemPainter> {
    style: Style,
    painter: P,
}

impl GridRenderer {
    /// Renderer with the configured style and the process-wide font painter.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.style.clone(), SystemPainter::shared(&config.fonts))
    }
}

impl<P: TextPainter> GridRenderer<P> {
    /// Oversized style lengths are capped, see [`Style::clamped`].
    pub fn new(style: Style, painter: P) -> Self {
        Self {
            style: style.clamped(),
            painter,
        }
    }

    /// Render `record` as PNG bytes, checking "today" against the local clock.
    pub fn render(
        &self,
        record: &DayRecord,
        orientation: Orientation,
    ) -> Result<Vec<u8>, RenderError> {
        self.render_at(record, orientation, Local::now().naive_local())
    }

    /// Render `record` as PNG bytes with an explicit wall-clock instant.
    pub fn render_at(
        &self,
        record: &DayRecord,
        orientation: Orientation,
        now: NaiveDateTime,
    ) -> Result<Vec<u8>, RenderError> {
        let canvas = self.compose(record, orientation, now)?;
        let png = canvas.encode_png()?;
        debug!(bytes = png.len(), "Encoded PNG");
        Ok(png)
    }

    /// Render `record` and write the PNG to `path`, creating parent directories.
    /// Returns the written bytes.
    pub fn render_to_file(
        &self,
        record: &DayRecord,
        orientation: Orientation,
        path: &Path,
    ) -> Result<Vec<u8>, RenderError> {
        let png = self.render(record, orientation)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &png)?;
        debug!(path = %path.display(), bytes = png.len(), "Wrote PNG");
        Ok(png)
    }

    /// Draw `record` onto a new canvas without encoding it.
    pub fn compose(
        &self,
        record: &DayRecord,
        orientation: Orientation,
        now: NaiveDateTime,
    ) -> Result<Canvas, RenderError> {
        let layout = Layout::compute(orientation, &self.style);
        debug!(
            ?orientation,
            date = %record.date,
            explicit_hours = record.explicit_hours(),
            "Composing grid image"
        );

        let mut canvas = Canvas::new(layout.canvas, self.style.palette.background.rgb())?;
        self.draw_cards(&mut canvas, &layout)?;
        self.draw_header(&mut canvas, &layout, &record.date)?;
        self.draw_axis(&mut canvas, &layout)?;
        self.draw_availability(&mut canvas, &layout, &timeline::segments(record))?;

        match timeline::now_position(&record.date, now) {
            Some(position) => {
                debug!(position, "Date is today, drawing now marker");
                self.draw_now_marker(&mut canvas, &layout, position)?;
            }
            None => debug!("Date is not today, skipping now marker"),
        }

        self.draw_legend(&mut canvas, &layout)?;
        Ok(canvas)
    }

    fn draw_cards(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), RenderError> {
        let style = &self.style;
        let palette = &style.palette;

        fill_rounded_rect(
            canvas,
            &layout.card,
            style.corner_radius,
            palette.card_background.rgb(),
        )?;
        if style.card_border_width > 0 {
            stroke_rounded_rect(
                canvas,
                &layout.card,
                style.corner_radius,
                palette.card_border.rgb(),
                style.card_border_width,
            )?;
        }

        let (start, end) = layout.separator;
        Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(palette.separator.rgb(), 1))
            .draw(canvas)?;

        fill_rounded_rect(
            canvas,
            &layout.timeline_card,
            style.timeline_corner_radius,
            palette.timeline_card.rgb(),
        )?;
        Ok(())
    }

    fn draw_header(
        &self,
        canvas: &mut Canvas,
        layout: &Layout,
        date: &str,
    ) -> Result<(), RenderError> {
        let metrics = &layout.metrics;
        let palette = &self.style.palette;
        let font = metrics.title_font;

        let lines = wrap_lines(
            &self.painter,
            &self.style.title,
            font,
            layout.content.size.width,
            metrics.title_lines,
        );
        let mut y = layout.title_top;
        for line in &lines {
            self.draw_centered(canvas, layout, line, y, font, palette.primary_text.rgb())?;
            y += (font.px + LINE_GAP) as i32;
        }

        self.draw_centered(
            canvas,
            layout,
            date,
            layout.date_top,
            metrics.date_font,
            palette.secondary_text.rgb(),
        )
    }

    fn draw_centered(
        &self,
        canvas: &mut Canvas,
        layout: &Layout,
        text: &str,
        y: i32,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError> {
        let size = self.painter.measure(text, font);
        let x = (layout.canvas.width as i32 - size.width as i32) / 2;
        self.painter.draw(canvas, text, Point::new(x, y), font, color)
    }

    fn draw_axis(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), RenderError> {
        let axis = &layout.axis;
        let orientation = layout.orientation;
        let palette = &self.style.palette;
        let font = layout.metrics.tick_font;
        let half_tick = (self.style.tick_length / 2) as i32;

        Line::new(axis.point_at(0.0, 0), axis.point_at(f32::from(HOURS_PER_DAY), 0))
            .into_styled(PrimitiveStyle::with_stroke(
                palette.timeline.rgb(),
                self.style.axis_width,
            ))
            .draw(canvas)?;

        let tick_style = PrimitiveStyle::with_stroke(palette.timeline_tick.rgb(), 1);
        for hour in 0..HOURS_PER_DAY {
            let position = f32::from(hour);
            Line::new(
                axis.point_at(position, -half_tick),
                axis.point_at(position, half_tick),
            )
            .into_styled(tick_style)
            .draw(canvas)?;

            let label = format!("{hour:02}:00");
            let size = self.painter.measure(&label, font);
            let (primary_len, cross_len) = orientation.split(size);
            let top_left = orientation
                .rect(
                    axis.pixel_at(position) - primary_len as i32 / 2,
                    axis.cross + half_tick + TICK_LABEL_GAP,
                    primary_len,
                    cross_len,
                )
                .top_left;
            self.painter
                .draw(canvas, &label, top_left, font, palette.secondary_text.rgb())?;
        }
        Ok(())
    }

    fn draw_availability(
        &self,
        canvas: &mut Canvas,
        layout: &Layout,
        segments: &[Segment],
    ) -> Result<(), RenderError> {
        let axis = &layout.axis;
        let orientation = layout.orientation;
        let palette = &self.style.palette;
        let thickness = self.style.line_thickness;
        let half = (thickness / 2) as i32;

        for segment in segments {
            let start = axis.pixel_at(segment.start);
            let end = axis.pixel_at(segment.end);
            if end <= start {
                continue;
            }
            orientation
                .rect(start, axis.cross - half, (end - start) as u32, thickness)
                .into_styled(PrimitiveStyle::with_fill(segment.tone.color(palette)))
                .draw(canvas)?;
        }

        let reach = half + SEPARATOR_REACH;
        let separator_style = PrimitiveStyle::with_stroke(palette.timeline_tick.rgb(), 1);
        for hour in 1..HOURS_PER_DAY {
            let position = f32::from(hour);
            Line::new(
                axis.point_at(position, -reach),
                axis.point_at(position, reach),
            )
            .into_styled(separator_style)
            .draw(canvas)?;
        }
        debug!(segments = segments.len(), "Drew availability line");
        Ok(())
    }

    fn draw_now_marker(
        &self,
        canvas: &mut Canvas,
        layout: &Layout,
        position: f32,
    ) -> Result<(), RenderError> {
        let axis = &layout.axis;
        let orientation = layout.orientation;
        let color = self.style.palette.current_time.rgb();
        let center = axis.pixel_at(position);
        let top = axis.cross - (self.style.line_thickness / 2) as i32 - POINTER_GAP;

        Triangle::new(
            orientation.point(center - POINTER, top),
            orientation.point(center + POINTER, top),
            orientation.point(center, top + 2 * POINTER),
        )
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(canvas)?;

        let font = layout.metrics.tick_font;
        let label = &self.style.now_label;
        let (primary_len, cross_len) = orientation.split(self.painter.measure(label, font));
        let top_left = orientation
            .rect(
                center + POINTER,
                top - POINTER - cross_len as i32,
                primary_len,
                cross_len,
            )
            .top_left;
        self.painter.draw(canvas, label, top_left, font, color)?;

        dashed_line(
            canvas,
            orientation.point(center, top - GUIDE_BEFORE),
            orientation.point(center, top + GUIDE_AFTER),
            self.style.dash_length,
            self.style.dash_gap,
            color,
            1,
        )?;
        Ok(())
    }

    fn draw_legend(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), RenderError> {
        let palette = &self.style.palette;
        let font = layout.metrics.legend_font;
        let entries = [
            (&self.style.available_label, palette.available.rgb()),
            (&self.style.unavailable_label, palette.unavailable.rgb()),
        ];

        let mut origin = layout.legend_origin;
        for (label, color) in entries {
            let y = origin.y + SWATCH_OFFSET;
            Line::new(Point::new(origin.x, y), Point::new(origin.x + SWATCH_LEN, y))
                .into_styled(PrimitiveStyle::with_stroke(color, SWATCH_THICKNESS))
                .draw(canvas)?;
            self.painter.draw(
                canvas,
                label,
                origin + Point::new(SWATCH_LABEL_GAP, LABEL_OFFSET),
                font,
                palette.primary_text.rgb(),
            )?;

            origin = match layout.metrics.legend_flow {
                LegendFlow::Inline => {
                    let width = self.painter.measure(label, font).width as i32;
                    origin + Point::new(SWATCH_LABEL_GAP + width + LEGEND_ITEM_GAP, 0)
                }
                LegendFlow::Stacked => origin + Point::new(0, LEGEND_ROW),
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{text::MonoPainter, HourState};
    use chrono::NaiveDate;

    fn renderer() -> GridRenderer<MonoPainter> {
        GridRenderer::new(Style::default(), MonoPainter)
    }

    fn noon(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_compose_canvas_size() {
        let record = DayRecord::new("20-11-2025");
        let r = renderer();
        let h = r.compose(&record, Orientation::Horizontal, noon(1)).unwrap();
        let v = r.compose(&record, Orientation::Vertical, noon(1)).unwrap();
        assert_eq!((h.width(), h.height()), (1024, 250));
        assert_eq!((v.width(), v.height()), (250, 1024));
    }

    #[test]
    fn test_png_decodes_to_canvas_size() {
        let record = DayRecord::new("20-11-2025").with_hour(3, HourState::Unavailable);
        let png = renderer()
            .render_at(&record, Orientation::Vertical, noon(1))
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (250, 1024));
    }

    #[test]
    fn test_header_and_legend_are_drawn() {
        let canvas = renderer()
            .compose(&DayRecord::new("20-11-2025"), Orientation::Horizontal, noon(1))
            .unwrap();
        // Title pixels in the header band
        let black = (40..88)
            .flat_map(|y| (40..984).map(move |x| (x, y)))
            .filter(|(x, y)| canvas.pixel(*x, *y) == Some(Rgb888::BLACK))
            .count();
        assert!(black > 0);
        // Legend swatches
        assert_eq!(canvas.pixel(60, 196), Some(Rgb888::new(52, 199, 89)));
        assert_eq!(canvas.pixel(40, 0), Some(Rgb888::WHITE));
    }

    struct FailingPainter;

    impl TextPainter for FailingPainter {
        fn measure(&self, _text: &str, _font: FontSpec) -> Size {
            Size::new(10, 10)
        }

        fn draw(
            &self,
            _canvas: &mut Canvas,
            text: &str,
            _top_left: Point,
            _font: FontSpec,
            _color: Rgb888,
        ) -> Result<(), RenderError> {
            Err(RenderError::Text(format!("no glyphs for {text:?}")))
        }
    }

    #[test]
    fn test_text_failure_is_reported() {
        let renderer = GridRenderer::new(Style::default(), FailingPainter);
        let result = renderer.render_at(
            &DayRecord::new("20-11-2025"),
            Orientation::Horizontal,
            noon(1),
        );
        assert!(matches!(result, Err(RenderError::Text(_))));
    }

    #[test]
    fn test_extreme_style_values_render() {
        let style = Style {
            dash_length: u32::MAX,
            dash_gap: u32::MAX,
            line_thickness: u32::MAX,
            tick_length: u32::MAX,
            card_border_width: u32::MAX,
            ..Style::default()
        };
        let renderer = GridRenderer::new(style, MonoPainter);
        let today = NaiveDate::from_ymd_opt(2025, 11, 20)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let png = renderer
                .render_at(&DayRecord::new("20-11-2025"), orientation, today)
                .unwrap();
            assert!(image::load_from_memory(&png).is_ok());
        }
    }

    #[test]
    fn test_render_to_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grid.png");
        let written = renderer()
            .render_to_file(&DayRecord::new("20-11-2025"), Orientation::Horizontal, &path)
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), written);
    }
}
