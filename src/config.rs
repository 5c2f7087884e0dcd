//! Runtime configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock starfield: one star per 10000 square pixels, sizes in `[1, 4)`,
//! speeds in `[0.1, 0.6)`, opacities in `[0.3, 1.0)` and a parallax factor
//! of one half.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::experience::ExperienceEntry;
use crate::page::Section;

/// Square pixels of viewport per star.
pub const DEFAULT_DENSITY: f64 = 10_000.0;
/// Scroll-to-offset multiplier applied on top of each star's speed.
pub const DEFAULT_PARALLAX: f64 = 0.5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub field: FieldConfig,
    pub terminal: TerminalConfig,
    pub theme: Theme,
    pub page: PageConfig,
}

/// Half-open interval `[min, max)` that star attributes are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub min: f64,
    pub max: f64,
}

impl UniformRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    fn check(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(Error::InvalidConfig(format!(
                "{name} range must satisfy min < max, got [{}, {})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub density: f64,
    pub size: UniformRange,
    pub speed: UniformRange,
    pub opacity: UniformRange,
    pub parallax: f64,
    /// Upper bound on stars per generation. `None` keeps the count purely
    /// area-driven.
    pub max_stars: Option<usize>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            size: UniformRange::new(1.0, 4.0),
            speed: UniformRange::new(0.1, 0.6),
            opacity: UniformRange::new(0.3, 1.0),
            parallax: DEFAULT_PARALLAX,
            max_stars: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Pixels covered by one terminal column.
    pub cell_width: u32,
    /// Pixels covered by one terminal row.
    pub cell_height: u32,
    /// Rows moved per wheel notch or arrow key.
    pub scroll_step: u32,
    pub frame_ms: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cell_width: 8,
            cell_height: 16,
            scroll_step: 3,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Rgb,
    pub star: Rgb,
    pub text: Rgb,
    pub accent: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgb(0x0b, 0x0d, 0x17),
            star: Rgb(0xf5, 0xf3, 0xe7),
            text: Rgb(0xc8, 0xcc, 0xd8),
            accent: Rgb(0x7a, 0xa2, 0xf7),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Seconds a section takes to fade in once scrolled into view.
    pub reveal_secs: f32,
    /// Replaces the built-in portfolio when present.
    pub sections: Option<Vec<Section>>,
    /// Replaces the built-in education and work history when present.
    pub experience: Option<Vec<ExperienceEntry>>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            reveal_secs: 0.6,
            sections: None,
            experience: None,
        }
    }
}

/// 24-bit color, written as `RRGGBB` hex in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn parse_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        Ok(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Linear mix toward `other`; `t = 0` keeps `self`, `t = 1` gives `other`.
    pub fn blend(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Rgb::parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let field = &self.field;
        if !(field.density.is_finite() && field.density > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "density must be positive, got {}",
                field.density
            )));
        }
        if !(field.parallax.is_finite() && field.parallax > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "parallax must be positive, got {}",
                field.parallax
            )));
        }

        field.size.check("size")?;
        field.speed.check("speed")?;
        field.opacity.check("opacity")?;
        if field.size.min <= 0.0 {
            return Err(Error::InvalidConfig("size range must start above zero".into()));
        }
        if field.speed.min <= 0.0 {
            return Err(Error::InvalidConfig("speed range must start above zero".into()));
        }
        if field.opacity.min < 0.0 || field.opacity.max > 1.0 {
            return Err(Error::InvalidConfig("opacity range must lie within [0, 1]".into()));
        }

        let terminal = &self.terminal;
        if terminal.cell_width == 0 || terminal.cell_height == 0 {
            return Err(Error::InvalidConfig("cell size must be non-zero".into()));
        }
        if terminal.frame_ms == 0 {
            return Err(Error::InvalidConfig("frame_ms must be non-zero".into()));
        }
        if !(self.page.reveal_secs.is_finite() && self.page.reveal_secs >= 0.0) {
            return Err(Error::InvalidConfig("reveal_secs must be zero or positive".into()));
        }
        Ok(())
    }
}
