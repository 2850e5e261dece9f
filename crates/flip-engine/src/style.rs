//! Typed inline-style values written by the driver.
//!
//! Hosts backed by a real DOM turn these into `style.setProperty` calls via
//! [`InlineStyle::to_css`]; the headless host consumes them directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Resolved CSS `position` value of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// Offset-based animation is only safe for elements still in normal flow.
    pub fn supports_offset_animation(&self) -> bool {
        matches!(self, Self::Static | Self::Relative)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
            Self::Sticky => "sticky",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown position value `{0}`")]
pub struct PositionParseError(pub String);

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            "fixed" => Ok(Self::Fixed),
            "sticky" => Ok(Self::Sticky),
            _ => Err(PositionParseError(s.to_string())),
        }
    }
}

/// The inline properties the driver owns while an element is animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleProperty {
    Position,
    Top,
    Left,
    Transition,
}

impl StyleProperty {
    /// Every property the driver may have set, in removal order.
    pub const OVERRIDES: [StyleProperty; 4] = [
        StyleProperty::Top,
        StyleProperty::Left,
        StyleProperty::Position,
        StyleProperty::Transition,
    ];

    pub fn css_name(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Top => "top",
            Self::Left => "left",
            Self::Transition => "transition",
        }
    }
}

/// A `transition` declaration covering `top` and `left`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetTransition {
    pub duration_ms: f64,
    pub easing: Easing,
}

impl OffsetTransition {
    pub fn to_css(&self) -> String {
        let timing = format!("{}ms {}", self.duration_ms, self.easing.to_css());
        format!("top {timing}, left {timing}")
    }
}

/// One inline style assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum InlineStyle {
    Position(Position),
    /// Pixels.
    Top(f64),
    /// Pixels.
    Left(f64),
    Transition(OffsetTransition),
}

impl InlineStyle {
    pub fn property(&self) -> StyleProperty {
        match self {
            Self::Position(_) => StyleProperty::Position,
            Self::Top(_) => StyleProperty::Top,
            Self::Left(_) => StyleProperty::Left,
            Self::Transition(_) => StyleProperty::Transition,
        }
    }

    /// `(property, value)` pair suitable for `CSSStyleDeclaration.setProperty`.
    pub fn to_css(&self) -> (&'static str, String) {
        let value = match self {
            Self::Position(position) => position.as_str().to_string(),
            Self::Top(px) | Self::Left(px) => format!("{px}px"),
            Self::Transition(transition) => transition.to_css(),
        };
        (self.property().css_name(), value)
    }
}
