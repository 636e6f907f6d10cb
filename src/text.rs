//! Text measuring and drawing
//!
//! The renderer never touches font files directly. It talks to a
//! [`TextPainter`], which can measure a string and draw it at a top-left
//! position. Three painters are provided:
//!
//! - [`MonoPainter`]: `embedded-graphics` bitmap fonts compiled into the binary.
//!   Always available and pixel-exact, which makes it the painter of choice
//!   for tests.
//! - [`TrueTypePainter`]: anti-aliased TrueType text through `rusttype` and
//!   `imageproc`, with faces loaded from a fallback chain of file paths.
//! - [`SystemPainter`]: TrueType when a face could be loaded, bitmap otherwise.
//!   [`SystemPainter::shared`] performs discovery once per process.

use crate::{canvas::Canvas, config::FontConfig, error::RenderError};
use embedded_graphics::{
    mono_font::{ascii, MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use image::Rgb;
use imageproc::drawing::{draw_text_mut, text_size};
use once_cell::sync::OnceCell;
use rusttype::{Font, Scale};
use std::{fs, path::PathBuf};
use tracing::{debug, info, warn};

/// Weight class requested by the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    Semibold,
}

/// Requested pixel size and weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub px: u32,
    pub weight: Weight,
}

impl FontSpec {
    pub const fn regular(px: u32) -> Self {
        Self {
            px,
            weight: Weight::Regular,
        }
    }

    pub const fn semibold(px: u32) -> Self {
        Self {
            px,
            weight: Weight::Semibold,
        }
    }
}

/// Capability to measure and draw single-line text.
pub trait TextPainter: Send + Sync {
    /// Size of the box `text` occupies when drawn with `font`.
    fn measure(&self, text: &str, font: FontSpec) -> Size;

    /// Draw `text` so that its box starts at `top_left`.
    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError>;
}

impl<T: TextPainter + ?Sized> TextPainter for &T {
    fn measure(&self, text: &str, font: FontSpec) -> Size {
        (**self).measure(text, font)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError> {
        (**self).draw(canvas, text, top_left, font, color)
    }
}

/// Bitmap fonts from `embedded-graphics`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoPainter;

impl MonoPainter {
    /// Closest bitmap font for a requested size. Sizes without a bold cut use
    /// the regular face.
    pub fn font_for(spec: FontSpec) -> &'static MonoFont<'static> {
        match (spec.px, spec.weight) {
            (0..=10, _) => &ascii::FONT_6X10,
            (11..=13, Weight::Regular) => &ascii::FONT_7X13,
            (11..=13, Weight::Semibold) => &ascii::FONT_7X13_BOLD,
            (14, Weight::Regular) => &ascii::FONT_7X14,
            (14, Weight::Semibold) => &ascii::FONT_7X14_BOLD,
            (15..=16, Weight::Regular) => &ascii::FONT_9X15,
            (15..=16, Weight::Semibold) => &ascii::FONT_9X15_BOLD,
            (17..=19, Weight::Regular) => &ascii::FONT_9X18,
            (17..=19, Weight::Semibold) => &ascii::FONT_9X18_BOLD,
            _ => &ascii::FONT_10X20,
        }
    }
}

impl TextPainter for MonoPainter {
    fn measure(&self, text: &str, font: FontSpec) -> Size {
        let font = Self::font_for(font);
        let chars = text.chars().count() as u32;
        let width = if chars == 0 {
            0
        } else {
            chars * font.character_size.width + (chars - 1) * font.character_spacing
        };
        Size::new(width, font.character_size.height)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError> {
        let style = MonoTextStyle::new(Self::font_for(font), color);
        Text::with_baseline(text, top_left, style, Baseline::Top).draw(canvas)?;
        Ok(())
    }
}

/// Regular and semibold TrueType faces.
#[derive(Clone)]
pub struct FontFaces {
    regular: Font<'static>,
    semibold: Font<'static>,
}

impl FontFaces {
    /// Load the first usable face of each candidate list. Semibold falls back
    /// to the regular face; `None` when no regular face loads.
    pub fn load(config: &FontConfig) -> Option<Self> {
        let regular = first_loadable(&config.regular)?;
        let semibold = first_loadable(&config.semibold).unwrap_or_else(|| regular.clone());
        Some(Self { regular, semibold })
    }

    fn face(&self, weight: Weight) -> &Font<'static> {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Semibold => &self.semibold,
        }
    }
}

fn first_loadable(paths: &[PathBuf]) -> Option<Font<'static>> {
    paths.iter().find_map(|path| {
        let data = fs::read(path).ok()?;
        match Font::try_from_vec(data) {
            Some(font) => {
                debug!(path = %path.display(), "Loaded font face");
                Some(font)
            }
            None => {
                warn!(path = %path.display(), "Unparseable font file, trying next candidate");
                None
            }
        }
    })
}

/// Anti-aliased TrueType text.
#[derive(Clone)]
pub struct TrueTypePainter {
    faces: FontFaces,
}

impl TrueTypePainter {
    pub fn new(faces: FontFaces) -> Self {
        Self { faces }
    }
}

impl TextPainter for TrueTypePainter {
    fn measure(&self, text: &str, font: FontSpec) -> Size {
        let face = self.faces.face(font.weight);
        let scale = Scale::uniform(font.px as f32);
        let (width, _) = text_size(scale, face, text);
        let metrics = face.v_metrics(scale);
        let height = (metrics.ascent - metrics.descent).ceil();
        Size::new(width.max(0) as u32, height.max(0.0) as u32)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError> {
        if font.px == 0 {
            return Err(RenderError::Text(format!("zero font size for {text:?}")));
        }
        let face = self.faces.face(font.weight);
        draw_text_mut(
            canvas.image_mut(),
            Rgb([color.r(), color.g(), color.b()]),
            top_left.x,
            top_left.y,
            Scale::uniform(font.px as f32),
            face,
            text,
        );
        Ok(())
    }
}

/// Best painter available on this machine.
#[derive(Clone)]
pub enum SystemPainter {
    TrueType(TrueTypePainter),
    Mono(MonoPainter),
}

static SHARED_PAINTER: OnceCell<SystemPainter> = OnceCell::new();

impl SystemPainter {
    /// Probe the configured font paths.
    pub fn detect(config: &FontConfig) -> Self {
        match FontFaces::load(config) {
            Some(faces) => {
                info!("Using TrueType fonts");
                SystemPainter::TrueType(TrueTypePainter::new(faces))
            }
            None => {
                warn!("No TrueType font found, using built-in bitmap fonts");
                SystemPainter::Mono(MonoPainter)
            }
        }
    }

    /// Process-wide painter. The first caller's font configuration wins;
    /// later calls reuse the already loaded faces.
    pub fn shared(config: &FontConfig) -> &'static SystemPainter {
        SHARED_PAINTER.get_or_init(|| Self::detect(config))
    }

    pub fn is_truetype(&self) -> bool {
        matches!(self, SystemPainter::TrueType(_))
    }
}

impl TextPainter for SystemPainter {
    fn measure(&self, text: &str, font: FontSpec) -> Size {
        match self {
            SystemPainter::TrueType(painter) => painter.measure(text, font),
            SystemPainter::Mono(painter) => painter.measure(text, font),
        }
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontSpec,
        color: Rgb888,
    ) -> Result<(), RenderError> {
        match self {
            SystemPainter::TrueType(painter) => painter.draw(canvas, text, top_left, font, color),
            SystemPainter::Mono(painter) => painter.draw(canvas, text, top_left, font, color),
        }
    }
}

/// Greedy word wrap into at most `max_lines` lines no wider than `max_width`.
///
/// Words that do not fit once the line budget is spent are appended to the
/// last line, so no text is dropped.
pub fn wrap_lines<P: TextPainter + ?Sized>(
    painter: &P,
    text: &str,
    font: FontSpec,
    max_width: u32,
    max_lines: usize,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let budget_spent = lines.len() >= max_lines.max(1);
        let joins = match lines.last() {
            Some(line) => {
                budget_spent || painter.measure(&format!("{line} {word}"), font).width <= max_width
            }
            None => false,
        };
        match lines.last_mut() {
            Some(line) if joins => {
                line.push(' ');
                line.push_str(word);
            }
            _ => lines.push(word.to_string()),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_measure() {
        let painter = MonoPainter;
        // FONT_6X10 has no extra character spacing
        assert_eq!(painter.measure("00:00", FontSpec::regular(10)), Size::new(30, 10));
        assert_eq!(painter.measure("", FontSpec::regular(10)), Size::new(0, 10));
        assert_eq!(
            painter.measure("Grid", FontSpec::semibold(15)),
            Size::new(36, 15)
        );
    }

    #[test]
    fn test_mono_font_selection() {
        assert_eq!(
            MonoPainter::font_for(FontSpec::semibold(22)).character_size,
            Size::new(10, 20)
        );
        assert_eq!(
            MonoPainter::font_for(FontSpec::regular(13)).character_size,
            Size::new(7, 13)
        );
    }

    #[test]
    fn test_mono_draw_stays_in_box() {
        let mut canvas = Canvas::new(Size::new(60, 30), Rgb888::WHITE).unwrap();
        let painter = MonoPainter;
        let font = FontSpec::regular(10);
        painter
            .draw(&mut canvas, "now", Point::new(5, 5), font, Rgb888::BLACK)
            .unwrap();
        let size = painter.measure("now", font);

        let mut inked = 0;
        for y in 0..30 {
            for x in 0..60 {
                if canvas.pixel(x, y) == Some(Rgb888::BLACK) {
                    inked += 1;
                    assert!(x >= 5 && x < 5 + size.width as i32);
                    assert!(y >= 5 && y < 5 + size.height as i32);
                }
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn test_wrap_lines() {
        let painter = MonoPainter;
        let font = FontSpec::semibold(15); // 9px per character
        let lines = wrap_lines(&painter, "Electricity Grid Availability", font, 170, 2);
        assert_eq!(lines, vec!["Electricity Grid", "Availability"]);

        let single = wrap_lines(&painter, "Electricity Grid Availability", font, 1000, 2);
        assert_eq!(single, vec!["Electricity Grid Availability"]);
    }

    #[test]
    fn test_wrap_respects_line_budget() {
        let painter = MonoPainter;
        let lines = wrap_lines(&painter, "a b c d", FontSpec::regular(10), 6, 2);
        assert_eq!(lines, vec!["a", "b c d"]);
        assert!(wrap_lines(&painter, "   ", FontSpec::regular(10), 100, 2).is_empty());
    }

    #[test]
    fn test_missing_fonts_fall_back_to_mono() {
        let config = FontConfig {
            regular: vec![PathBuf::from("/nonexistent/regular.ttf")],
            semibold: vec![],
        };
        assert!(FontFaces::load(&config).is_none());
        assert!(!SystemPainter::detect(&config).is_truetype());
    }
}
