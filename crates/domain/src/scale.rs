//! Linear raw ↔ display scaling shared by sensors and controls.
//!
//! A [`LinearScale`] maps the device-native integer range `[raw_low, raw_high]`
//! onto the human-facing range `[display_low, display_high]`. Sensors map
//! raw → display, controls map display → raw; both clamp into the target
//! range and render out-of-range values with a marker.

use serde::Serialize;

use crate::error::{ChannelKind, ConfigError};
use crate::event::ControlCommand;
use crate::format::DisplayFormat;

/// Why a pair of ranges cannot be mapped onto each other.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("raw range is empty (both bounds are {bound})")]
    ZeroWidthRaw { bound: i64 },
    #[error("display range is empty (both bounds are {bound})")]
    ZeroWidthDisplay { bound: f64 },
    #[error("display bound is not a finite number")]
    NonFiniteDisplay,
}

/// Linear interpolation between a raw and a display range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    raw_low: i64,
    raw_high: i64,
    display_low: f64,
    display_high: f64,
}

impl LinearScale {
    /// Build a scale.
    ///
    /// # Errors
    ///
    /// Returns a [`ScaleError`] when either range has zero width or a
    /// display bound is not finite.
    #[allow(clippy::float_cmp)]
    pub fn new(
        raw_low: i64,
        raw_high: i64,
        display_low: f64,
        display_high: f64,
    ) -> Result<Self, ScaleError> {
        if raw_low == raw_high {
            return Err(ScaleError::ZeroWidthRaw { bound: raw_low });
        }
        if !display_low.is_finite() || !display_high.is_finite() {
            return Err(ScaleError::NonFiniteDisplay);
        }
        if display_low == display_high {
            return Err(ScaleError::ZeroWidthDisplay { bound: display_low });
        }
        Ok(Self {
            raw_low,
            raw_high,
            display_low,
            display_high,
        })
    }

    #[must_use]
    pub fn raw_range(&self) -> (i64, i64) {
        (self.raw_low, self.raw_high)
    }

    #[must_use]
    pub fn display_range(&self) -> (f64, f64) {
        (self.display_low, self.display_high)
    }

    /// Raw → display without clamping.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_display_unclamped(&self, raw: i64) -> f64 {
        let raw_span = (self.raw_high - self.raw_low) as f64;
        (raw - self.raw_low) as f64 / raw_span * (self.display_high - self.display_low)
            + self.display_low
    }

    /// Raw → display, clamped into the display range.
    #[must_use]
    pub fn to_display(&self, raw: i64) -> f64 {
        clamp_between(
            self.to_display_unclamped(raw),
            self.display_low,
            self.display_high,
        )
    }

    /// Display → raw without clamping or rounding.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_raw_unclamped(&self, display: f64) -> f64 {
        let raw_span = (self.raw_high - self.raw_low) as f64;
        (display - self.display_low) / (self.display_high - self.display_low) * raw_span
            + self.raw_low as f64
    }

    /// Display → raw, clamped into the raw range and rounded to the nearest
    /// device value.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn to_raw(&self, display: f64) -> i64 {
        let clamped = clamp_between(
            self.to_raw_unclamped(display),
            self.raw_low as f64,
            self.raw_high as f64,
        );
        clamped.round() as i64
    }

    fn display_bounds(&self) -> (f64, f64) {
        (
            self.display_low.min(self.display_high),
            self.display_low.max(self.display_high),
        )
    }
}

/// Clamp into `[a, b]` regardless of which bound is larger.
fn clamp_between(value: f64, a: f64, b: f64) -> f64 {
    value.max(a.min(b)).min(a.max(b))
}

fn scale_for(
    kind: ChannelKind,
    name: &str,
    raw: (i64, i64),
    display: (f64, f64),
) -> Result<LinearScale, ConfigError> {
    LinearScale::new(raw.0, raw.1, display.0, display.1).map_err(|source| ConfigError::Scale {
        kind,
        name: name.to_string(),
        source,
    })
}

fn format_for(
    kind: ChannelKind,
    name: &str,
    template: Option<&str>,
    display: (f64, f64),
) -> Result<DisplayFormat, ConfigError> {
    match template {
        Some(template) => DisplayFormat::parse(template).map_err(|source| ConfigError::Format {
            kind,
            name: name.to_string(),
            source,
        }),
        None => Ok(DisplayFormat::default_for(display.0, display.1)),
    }
}

/// Declaration of a sensor channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSpec {
    pub name: String,
    pub scale: LinearScale,
    pub format: DisplayFormat,
}

impl SensorSpec {
    /// Declare a sensor. Without a template, the default for the display
    /// range applies (see [`DisplayFormat::default_for`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Scale`] or [`ConfigError::Format`].
    pub fn new(
        name: impl Into<String>,
        raw: (i64, i64),
        display: (f64, f64),
        template: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let scale = scale_for(ChannelKind::Sensor, &name, raw, display)?;
        let format = format_for(ChannelKind::Sensor, &name, template, display)?;
        Ok(Self {
            name,
            scale,
            format,
        })
    }

    /// Display value used for trigger evaluation (clamped).
    #[must_use]
    pub fn display_value(&self, raw: i64) -> f64 {
        self.scale.to_display(raw)
    }

    /// Render a raw reading; out-of-range readings render as `<min` / `>max`.
    #[must_use]
    pub fn render(&self, raw: i64) -> String {
        let display = self.scale.to_display_unclamped(raw);
        let (low, high) = self.scale.display_bounds();
        if display < low {
            format!("<{}", self.format.render(low))
        } else if display > high {
            format!(">{}", self.format.render(high))
        } else {
            self.format.render(display)
        }
    }
}

/// Declaration of a control channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSpec {
    pub name: String,
    pub scale: LinearScale,
    pub format: DisplayFormat,
}

impl ControlSpec {
    /// Declare a control.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Scale`] or [`ConfigError::Format`].
    pub fn new(
        name: impl Into<String>,
        raw: (i64, i64),
        display: (f64, f64),
        template: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let scale = scale_for(ChannelKind::Control, &name, raw, display)?;
        let format = format_for(ChannelKind::Control, &name, template, display)?;
        Ok(Self {
            name,
            scale,
            format,
        })
    }

    /// Build the command for the output driver from a requested display value.
    #[must_use]
    pub fn command(&self, display: f64) -> ControlCommand {
        ControlCommand {
            control: self.name.clone(),
            display,
            raw: self.scale.to_raw(display),
        }
    }

    /// Render a requested display value; out-of-range requests render as the
    /// clamped bound annotated with the original request.
    #[must_use]
    pub fn render(&self, display: f64) -> String {
        let (low, high) = self.scale.display_bounds();
        let requested = self.format.render(display);
        if display < low {
            format!("{} (clipped from {requested})", self.format.render(low))
        } else if display > high {
            format!("{} (clipped from {requested})", self.format.render(high))
        } else {
            requested
        }
    }
}
