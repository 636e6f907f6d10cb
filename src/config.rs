//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! `grid-config.toml` file. It covers the visual style passed to the renderer,
//! the font fallback chain for TrueType text, and the HTTP listen address.
//!
//! Every section is optional: a missing file, a missing section or a missing
//! key falls back to the built-in defaults, which reproduce the reference look
//! (iOS light-mode system colors, 24px margin, 12px corner radius).

use embedded_graphics::pixelcolor::Rgb888;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "grid-config.toml";

/// Application configuration loaded from grid-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Visual style handed to the renderer
    pub style: Style,
    /// TrueType font discovery
    pub fonts: FontConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// An sRGB color, written as `[r, g, b]` in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn rgb(self) -> Rgb888 {
        let [r, g, b] = self.0;
        Rgb888::new(r, g, b)
    }
}

/// Colors used by the renderer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Palette {
    /// Availability line for available hours
    pub available: Color,
    /// Availability line for unavailable hours
    pub unavailable: Color,
    /// Availability line for unknown or unresolved hours
    pub neutral: Color,
    pub background: Color,
    pub card_background: Color,
    pub card_border: Color,
    pub timeline_card: Color,
    pub primary_text: Color,
    pub secondary_text: Color,
    pub separator: Color,
    /// Timeline axis
    pub timeline: Color,
    /// Hour ticks and hour boundary separators
    pub timeline_tick: Color,
    /// Now marker, guide and label
    pub current_time: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            available: Color::new(52, 199, 89),
            unavailable: Color::new(255, 107, 0),
            neutral: Color::new(142, 142, 147),
            background: Color::new(255, 255, 255),
            card_background: Color::new(255, 255, 255),
            card_border: Color::new(229, 229, 234),
            timeline_card: Color::new(255, 255, 255),
            primary_text: Color::new(0, 0, 0),
            secondary_text: Color::new(60, 60, 67),
            separator: Color::new(198, 198, 200),
            timeline: Color::new(142, 142, 147),
            timeline_tick: Color::new(174, 174, 178),
            current_time: Color::new(128, 128, 128),
        }
    }
}

/// Upper bound for every pixel length in [`Style`], the longest canvas side.
pub const MAX_STYLE_EXTENT: u32 = 1024;

/// Immutable style value consumed by [`crate::GridRenderer`].
///
/// Canvas sizes are not part of the style: they are fixed per orientation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Style {
    pub title: String,
    pub available_label: String,
    pub unavailable_label: String,
    pub now_label: String,
    /// Gap between canvas edge and outer card
    pub margin: u32,
    /// Inner padding of the outer card
    pub card_padding: u32,
    pub corner_radius: u32,
    pub timeline_corner_radius: u32,
    /// Outer card outline width, 0 disables the outline
    pub card_border_width: u32,
    pub axis_width: u32,
    /// Thickness of the availability line
    pub line_thickness: u32,
    pub tick_length: u32,
    pub dash_length: u32,
    pub dash_gap: u32,
    pub palette: Palette,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            title: "Electricity Grid Availability".to_string(),
            available_label: "Available".to_string(),
            unavailable_label: "Not Available".to_string(),
            now_label: "now".to_string(),
            margin: 24,
            card_padding: 16,
            corner_radius: 12,
            timeline_corner_radius: 8,
            card_border_width: 1,
            axis_width: 2,
            line_thickness: 6,
            tick_length: 8,
            dash_length: 4,
            dash_gap: 6,
            palette: Palette::default(),
        }
    }
}

impl Style {
    /// Copy with every pixel length capped at [`MAX_STYLE_EXTENT`], keeping
    /// layout arithmetic in range for any config file.
    pub fn clamped(mut self) -> Self {
        for value in [
            &mut self.margin,
            &mut self.card_padding,
            &mut self.corner_radius,
            &mut self.timeline_corner_radius,
            &mut self.card_border_width,
            &mut self.axis_width,
            &mut self.line_thickness,
            &mut self.tick_length,
            &mut self.dash_length,
            &mut self.dash_gap,
        ] {
            *value = (*value).min(MAX_STYLE_EXTENT);
        }
        self
    }
}

/// Candidate TrueType files, tried in order. The first readable, parseable
/// file of each list wins.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    pub regular: Vec<PathBuf>,
    pub semibold: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        let shared = [
            "/System/Library/Fonts/Helvetica.ttc",
            "/Library/Fonts/Arial.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ];
        let regular = [
            "/System/Library/Fonts/Supplemental/SF-Pro-Text-Regular.otf",
            "/System/Library/Fonts/Supplemental/SFProText-Regular.otf",
        ];
        let semibold = [
            "/System/Library/Fonts/Supplemental/SF-Pro-Text-Semibold.otf",
            "/System/Library/Fonts/Supplemental/SFProText-Semibold.otf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ];
        Self {
            regular: regular.iter().chain(shared.iter()).map(PathBuf::from).collect(),
            semibold: semibold
                .iter()
                .chain(regular.iter())
                .chain(shared.iter())
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// HTTP listen address
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `SocketAddr` parsing.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "Configuration saved");
        Ok(())
    }
}
