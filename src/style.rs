//! Configuration inputs supplied by the toolbar: tool, stroke style, and page
//! appearance.
//!
//! The host owns these choices and pushes them into the engine as JSON
//! patches. Only the fields present in a patch change; everything else keeps
//! its current value.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use serde::Deserialize;

use crate::consts::{MAX_STROKE_WIDTH, MIN_STROKE_WIDTH};
use crate::input::Tool;

/// Errors raised while reading configuration from the host.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// The payload is not valid JSON or does not match the expected shape.
    #[error("invalid settings payload: {0}")]
    Json(#[from] serde_json::Error),
    /// A color string is not `#rgb` or `#rrggbb`.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
}

/// Cap and dash treatment for freehand strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushStyle {
    #[default]
    Round,
    Square,
    Dashed,
}

impl BrushStyle {
    /// Canvas `lineCap` value for this brush.
    #[must_use]
    pub fn line_cap(self) -> &'static str {
        match self {
            BrushStyle::Round | BrushStyle::Dashed => "round",
            BrushStyle::Square => "square",
        }
    }

    /// Whether strokes drawn with this brush are dashed.
    #[must_use]
    pub fn is_dashed(self) -> bool {
        self == BrushStyle::Dashed
    }
}

/// Background pattern drawn under the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    #[default]
    Dotted,
    Grid,
    Ruled,
    /// Small crosshairs at every grid intersection.
    Matrix,
    /// Plain page, no pattern.
    #[serde(alias = "plain")]
    None,
}

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    /// Parse `#rgb` or `#rrggbb` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidColor`] for any other input.
    pub fn parse(raw: &str) -> Result<Self, StyleError> {
        let invalid = || StyleError::InvalidColor(raw.to_owned());
        let hex = raw.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
                Ok(Self { r: expand(0)?, g: expand(1)?, b: expand(2)? })
            }
            6 => Ok(Self { r: channel(&hex[0..2])?, g: channel(&hex[2..4])?, b: channel(&hex[4..6])? }),
            _ => Err(invalid()),
        }
    }

    /// WCAG relative luminance in `[0, 1]`.
    #[must_use]
    pub fn luminance(self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.039_28 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// `#rrggbb` form for the canvas fill style.
    #[must_use]
    pub fn css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// The current toolbar selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Active tool.
    pub tool: Tool,
    /// Stroke color as a CSS color string.
    pub color: String,
    /// Stroke width in world units, within `[MIN_STROKE_WIDTH, MAX_STROKE_WIDTH]`.
    pub width: f64,
    /// Brush style for pen strokes; `Dashed` also dashes new closed shapes.
    pub brush: BrushStyle,
    /// Background pattern.
    pub pattern: Pattern,
    /// Page fill color.
    pub page_color: Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            color: "#1f1a17".to_owned(),
            width: 3.0,
            brush: BrushStyle::default(),
            pattern: Pattern::default(),
            page_color: Rgb::WHITE,
        }
    }
}

impl Settings {
    /// Merge a patch into these settings. Widths are clamped into range.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(tool) = patch.tool {
            self.tool = tool;
        }
        if let Some(ref color) = patch.color {
            self.color.clone_from(color);
        }
        if let Some(width) = patch.width.filter(|w| w.is_finite()) {
            self.width = clamp_width(width);
        }
        if let Some(brush) = patch.brush {
            self.brush = brush;
        }
        if let Some(pattern) = patch.pattern {
            self.pattern = pattern;
        }
        if let Some(page_color) = patch.page_color {
            self.page_color = page_color;
        }
    }
}

/// Sparse update for [`Settings`]. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    pub tool: Option<Tool>,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub brush: Option<BrushStyle>,
    pub pattern: Option<Pattern>,
    pub page_color: Option<Rgb>,
}

impl SettingsPatch {
    /// Parse a patch from the host's JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Json`] for malformed payloads, unknown fields,
    /// or colors that fail [`Rgb::parse`].
    pub fn from_json(raw: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Clamp a stroke width into the selectable range.
#[must_use]
pub fn clamp_width(width: f64) -> f64 {
    width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
}
