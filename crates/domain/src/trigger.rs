//! Trigger — a sensor threshold that moves the machine to another state.
//!
//! Triggers are declared with a short descriptive phrase:
//!
//! ```text
//! sensor <name> above|below <threshold>
//! ```
//!
//! The sensor name may contain spaces; the rightmost direction keyword
//! separates it from the threshold.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Leading keyword of every trigger declaration.
pub const SENSOR_PREFIX: &str = "sensor";

/// Which side of the threshold fires the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    /// `+1` for [`Above`](Self::Above), `-1` for [`Below`](Self::Below).
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Above => 1.0,
            Self::Below => -1.0,
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => f.write_str("above"),
            Self::Below => f.write_str("below"),
        }
    }
}

/// Why a trigger declaration could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerParseError {
    #[error("declaration must start with `sensor`")]
    MissingPrefix,
    #[error("declaration has no threshold")]
    MissingThreshold,
    #[error("threshold `{0}` is not a number")]
    InvalidThreshold(String),
    #[error("declaration has no `above` or `below` keyword")]
    MissingDirection,
    #[error("declaration names no sensor")]
    MissingSensorName,
}

/// A single threshold condition bound to a target state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub sensor: String,
    pub direction: Direction,
    /// Threshold in display units.
    pub threshold: f64,
    pub target: String,
}

impl Trigger {
    #[must_use]
    pub fn new(
        sensor: impl Into<String>,
        direction: Direction,
        threshold: f64,
        target: impl Into<String>,
    ) -> Self {
        Self {
            sensor: sensor.into(),
            direction,
            threshold,
            target: target.into(),
        }
    }

    /// Parse a declaration such as `"sensor water temp above 32"`.
    ///
    /// The sensor name is the text between the prefix and the rightmost
    /// `above`/`below` token, trimmed at both ends only. The threshold is the
    /// last token; any words between the keyword and the threshold are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`TriggerParseError`] describing the first problem found.
    pub fn parse(description: &str, target: impl Into<String>) -> Result<Self, TriggerParseError> {
        let rest = description
            .trim_start()
            .strip_prefix(SENSOR_PREFIX)
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .ok_or(TriggerParseError::MissingPrefix)?;

        let words = tokens(rest);
        let ((_, threshold_token), head) = words
            .split_last()
            .ok_or(TriggerParseError::MissingThreshold)?;
        let threshold = threshold_token
            .parse::<f64>()
            .map_err(|_| TriggerParseError::InvalidThreshold((*threshold_token).to_string()))?;

        let (offset, direction) = head
            .iter()
            .rev()
            .find_map(|(offset, token)| token.parse::<Direction>().ok().map(|d| (*offset, d)))
            .ok_or(TriggerParseError::MissingDirection)?;

        let sensor = rest[..offset].trim();
        if sensor.is_empty() {
            return Err(TriggerParseError::MissingSensorName);
        }

        Ok(Self::new(sensor, direction, threshold, target))
    }

    /// Whether `value` (display units) is strictly past the threshold.
    #[must_use]
    pub fn matches(&self, value: f64) -> bool {
        let sign = self.direction.sign();
        sign * value > sign * self.threshold
    }

    /// Whether this trigger watches `sensor` and `value` fires it.
    #[must_use]
    pub fn fires_on(&self, sensor: &str, value: f64) -> bool {
        self.sensor == sensor && self.matches(value)
    }
}

/// Whitespace-separated tokens of `text` with their byte offsets.
fn tokens(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (index, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(from)) => {
                tokens.push((from, &text[from..index]));
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }
    if let Some(from) = start {
        tokens.push((from, &text[from..]));
    }
    tokens
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} -> {}",
            SENSOR_PREFIX, self.sensor, self.direction, self.threshold, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_simple_above_declaration() {
        let t = Trigger::parse("sensor temp above 32", "melting").unwrap();
        assert_eq!(t.sensor, "temp");
        assert_eq!(t.direction, Direction::Above);
        assert!((t.threshold - 32.0).abs() < f64::EPSILON);
        assert_eq!(t.target, "melting");
    }

    #[test]
    fn should_parse_multi_word_sensor_name() {
        let t = Trigger::parse("sensor water temp below -1.5", "frozen").unwrap();
        assert_eq!(t.sensor, "water temp");
        assert_eq!(t.direction, Direction::Below);
        assert!((t.threshold + 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_use_rightmost_direction_keyword() {
        let t = Trigger::parse("sensor above ground below 3", "x").unwrap();
        assert_eq!(t.sensor, "above ground");
        assert_eq!(t.direction, Direction::Below);
    }

    #[test]
    fn should_reject_missing_prefix() {
        assert_eq!(
            Trigger::parse("temp above 3", "x"),
            Err(TriggerParseError::MissingPrefix)
        );
        assert_eq!(
            Trigger::parse("control heater above 3", "x"),
            Err(TriggerParseError::MissingPrefix)
        );
    }

    #[test]
    fn should_reject_missing_direction() {
        assert_eq!(
            Trigger::parse("sensor temp over 3", "x"),
            Err(TriggerParseError::MissingDirection)
        );
    }

    #[test]
    fn should_reject_non_numeric_threshold() {
        assert_eq!(
            Trigger::parse("sensor temp above hot", "x"),
            Err(TriggerParseError::InvalidThreshold("hot".to_string()))
        );
    }

    #[test]
    fn should_reject_bare_prefix() {
        assert_eq!(
            Trigger::parse("sensor", "x"),
            Err(TriggerParseError::MissingThreshold)
        );
    }

    #[test]
    fn should_reject_empty_sensor_name() {
        assert_eq!(
            Trigger::parse("sensor above 3", "x"),
            Err(TriggerParseError::MissingSensorName)
        );
    }

    #[test]
    fn should_keep_inner_whitespace_of_sensor_name() {
        let t = Trigger::parse("sensor  water  temp\tbelow 3", "frozen").unwrap();
        assert_eq!(t.sensor, "water  temp");
        assert!(t.fires_on("water  temp", 2.0));
        assert!(!t.fires_on("water temp", 2.0));
    }

    #[test]
    fn should_ignore_words_between_direction_and_threshold() {
        let t = Trigger::parse("sensor temp above roughly 3", "x").unwrap();
        assert_eq!(t.sensor, "temp");
        assert_eq!(t.direction, Direction::Above);
        assert!((t.threshold - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reject_word_glued_to_prefix() {
        assert_eq!(
            Trigger::parse("sensortemp above 3", "x"),
            Err(TriggerParseError::MissingPrefix)
        );
    }

    #[test]
    fn should_match_strictly_above_threshold() {
        let t = Trigger::new("temp", Direction::Above, 32.0, "melting");
        assert!(t.matches(32.5));
        assert!(!t.matches(32.0));
        assert!(!t.matches(10.0));
    }

    #[test]
    fn should_match_strictly_below_threshold() {
        let t = Trigger::new("temp", Direction::Below, 0.0, "frozen");
        assert!(t.matches(-0.1));
        assert!(!t.matches(0.0));
        assert!(!t.matches(5.0));
    }

    #[test]
    fn should_only_fire_on_watched_sensor() {
        let t = Trigger::new("temp", Direction::Above, 1.0, "x");
        assert!(t.fires_on("temp", 2.0));
        assert!(!t.fires_on("level", 2.0));
    }

    #[test]
    fn should_display_declaration() {
        let t = Trigger::new("temp", Direction::Above, 32.0, "melting");
        assert_eq!(t.to_string(), "sensor temp above 32 -> melting");
    }
}
