//! Display templates for scaled values.
//!
//! A template is literal text around at most one placeholder:
//! `{}` renders the shortest exact representation, `{:.2f}` renders a
//! fixed number of decimals and `{:f}` renders six of them.
//! Braces are escaped by doubling them (`{{`, `}}`).

use std::fmt::Write;

use serde::{Serialize, Serializer};

/// Why a display template was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("placeholder opened but never closed")]
    Unclosed,
    #[error("unmatched `}}` outside a placeholder")]
    UnmatchedClose,
    #[error("only one placeholder is allowed")]
    MultiplePlaceholders,
    #[error("unsupported placeholder `{{{0}}}`")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Shortest,
    Fixed(usize),
}

impl Placeholder {
    fn parse(body: &str) -> Result<Self, FormatError> {
        let unsupported = || FormatError::Unsupported(body.to_string());
        let Some(spec) = body.strip_prefix(':') else {
            return if body.is_empty() {
                Ok(Self::Shortest)
            } else {
                Err(unsupported())
            };
        };
        if spec == "f" {
            return Ok(Self::Fixed(6));
        }
        spec.strip_prefix('.')
            .and_then(|rest| rest.strip_suffix('f'))
            .and_then(|digits| digits.parse().ok())
            .map(Self::Fixed)
            .ok_or_else(unsupported)
    }
}

/// A parsed display template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    template: String,
    prefix: String,
    placeholder: Option<Placeholder>,
    suffix: String,
}

impl DisplayFormat {
    /// Parse a template such as `"{:.1f}°C"`.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] for unbalanced braces, more than one
    /// placeholder, or a placeholder spec other than `{}`, `{:f}` or `{:.Nf}`.
    pub fn parse(template: &str) -> Result<Self, FormatError> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut placeholder = None;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if placeholder.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => body.push(ch),
                            None => return Err(FormatError::Unclosed),
                        }
                    }
                    if placeholder.is_some() {
                        return Err(FormatError::MultiplePlaceholders);
                    }
                    placeholder = Some(Placeholder::parse(&body)?);
                }
                '}' => return Err(FormatError::UnmatchedClose),
                other => out.push(other),
            }
        }

        Ok(Self {
            template: template.to_string(),
            prefix,
            placeholder,
            suffix,
        })
    }

    /// Default template for a display range: whole percent for exactly
    /// `[0, 100]`, the plain value otherwise.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn default_for(display_low: f64, display_high: f64) -> Self {
        if display_low == 0.0 && display_high == 100.0 {
            Self {
                template: "{:.0f}%".to_string(),
                prefix: String::new(),
                placeholder: Some(Placeholder::Fixed(0)),
                suffix: "%".to_string(),
            }
        } else {
            Self {
                template: "{}".to_string(),
                prefix: String::new(),
                placeholder: Some(Placeholder::Shortest),
                suffix: String::new(),
            }
        }
    }

    /// Render `value` through the template.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn render(&self, value: f64) -> String {
        let mut out = self.prefix.clone();
        match self.placeholder {
            Some(Placeholder::Shortest) => {
                // whole values keep their decimal point: 37.0, not 37
                if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
                    let _ = write!(out, "{value:.1}");
                } else {
                    let _ = write!(out, "{value}");
                }
            }
            Some(Placeholder::Fixed(precision)) => {
                let _ = write!(out, "{value:.precision$}");
            }
            None => {}
        }
        out.push_str(&self.suffix);
        out
    }

    /// The template text as configured.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl std::fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}

impl Serialize for DisplayFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.template)
    }
}
