//! CSS timing functions for the settle transition.
//!
//! The engine never interpolates positions itself: it hands the curve to the
//! host as part of the `transition` declaration. Hosts that simulate the CSS
//! engine (the headless host, tests) use [`Easing::evaluate`] to compute the
//! in-between offsets.
//!
//! ```
//! use flip_engine::easing::Easing;
//!
//! let ease: Easing = "ease-in-out".parse().unwrap();
//! assert_eq!(ease.to_css(), "ease-in-out");
//! assert!((ease.evaluate(0.5) - 0.5).abs() < 1e-3);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position for stepped timing (`steps(n, <position>)`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// `jump-start` / `start`
    Start,
    /// `jump-end` / `end`
    #[default]
    End,
    /// `jump-both`
    Both,
    /// `jump-none`
    None,
}

impl StepPosition {
    fn css_name(&self) -> &'static str {
        match self {
            Self::Start => "jump-start",
            Self::End => "jump-end",
            Self::Both => "jump-both",
            Self::None => "jump-none",
        }
    }
}

/// Easing curve for the settle transition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`, the container default.
    #[default]
    EaseInOut,
    /// x values must be in [0, 1], y values are unconstrained.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// `count` must be at least 1.
    Steps { count: u32, position: StepPosition },
}

/// Error returned when CSS timing-function text cannot be understood.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EasingParseError {
    #[error("unknown timing function `{0}`")]
    Unknown(String),
    #[error("malformed arguments in `{0}`")]
    Arguments(String),
    #[error("cubic-bezier x values must be in [0, 1], got {0} and {1}")]
    BezierRange(f64, f64),
    #[error("steps() needs at least one step")]
    ZeroSteps,
}

impl Easing {
    /// Map linear progress in [0, 1] to eased progress. Input is clamped.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
        }
    }

    /// # Panics
    /// Panics if x1 or x2 are outside [0, 1].
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "Bezier x values must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// # Panics
    /// Panics if `count` is 0.
    pub fn steps(count: u32, position: StepPosition) -> Self {
        assert!(count >= 1, "Steps must be at least 1");
        Self::Steps { count, position }
    }

    /// CSS `<easing-function>` text.
    pub fn to_css(&self) -> String {
        match self {
            Self::Linear => "linear".to_string(),
            Self::Ease => "ease".to_string(),
            Self::EaseIn => "ease-in".to_string(),
            Self::EaseOut => "ease-out".to_string(),
            Self::EaseInOut => "ease-in-out".to_string(),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                format!("cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            Self::Steps { count, position } => format!("steps({count}, {})", position.css_name()),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl FromStr for Easing {
    type Err = EasingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        match text.as_str() {
            "linear" => return Ok(Self::Linear),
            "ease" => return Ok(Self::Ease),
            "ease-in" => return Ok(Self::EaseIn),
            "ease-out" => return Ok(Self::EaseOut),
            "ease-in-out" => return Ok(Self::EaseInOut),
            "step-start" => {
                return Ok(Self::Steps {
                    count: 1,
                    position: StepPosition::Start,
                });
            }
            "step-end" => {
                return Ok(Self::Steps {
                    count: 1,
                    position: StepPosition::End,
                });
            }
            _ => {}
        }

        let (name, args) =
            split_function(&text).ok_or_else(|| EasingParseError::Unknown(s.to_string()))?;
        match name {
            "cubic-bezier" => {
                let values = args
                    .iter()
                    .map(|a| a.parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| EasingParseError::Arguments(s.to_string()))?;
                let [x1, y1, x2, y2] = values[..] else {
                    return Err(EasingParseError::Arguments(s.to_string()));
                };
                if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                    return Err(EasingParseError::BezierRange(x1, x2));
                }
                Ok(Self::CubicBezier { x1, y1, x2, y2 })
            }
            "steps" => {
                let count = args
                    .first()
                    .and_then(|a| a.parse::<u32>().ok())
                    .ok_or_else(|| EasingParseError::Arguments(s.to_string()))?;
                if count == 0 {
                    return Err(EasingParseError::ZeroSteps);
                }
                let position = match args.get(1).copied() {
                    None | Some("end") | Some("jump-end") => StepPosition::End,
                    Some("start") | Some("jump-start") => StepPosition::Start,
                    Some("jump-both") => StepPosition::Both,
                    Some("jump-none") => StepPosition::None,
                    Some(_) => return Err(EasingParseError::Arguments(s.to_string())),
                };
                Ok(Self::Steps { count, position })
            }
            _ => Err(EasingParseError::Unknown(s.to_string())),
        }
    }
}

/// Split `name(a, b, c)` into its name and trimmed arguments.
fn split_function(text: &str) -> Option<(&str, Vec<&str>)> {
    let open = text.find('(')?;
    let inner = text[open + 1..].strip_suffix(')')?;
    let args = inner.split(',').map(str::trim).filter(|a| !a.is_empty()).collect();
    Some((text[..open].trim(), args))
}

/// Evaluate a cubic bezier timing curve at progress `progress`.
///
/// Newton-Raphson finds the curve parameter whose x matches the progress,
/// then the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_y(y1, y2, t)
}

/// Convergence threshold on x. Offsets span hundreds of pixels, so the solve
/// is held to well under a thousandth of a pixel.
const SOLVE_EPSILON: f64 = 1e-7;

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;
    for _ in 0..8 {
        let error = bezier_x(x1, x2, t) - target_x;
        if error.abs() < SOLVE_EPSILON {
            return t;
        }
        let slope = bezier_x_derivative(x1, x2, t);
        if slope.abs() < SOLVE_EPSILON {
            break;
        }
        t = (t - error / slope).clamp(0.0, 1.0);
    }

    // Newton stalled on a flat stretch; x(t) is monotonic for x1, x2 in
    // [0, 1], so bisection always lands.
    let (mut low, mut high) = (0.0, 1.0);
    while high - low > SOLVE_EPSILON {
        let mid = (low + high) / 2.0;
        if bezier_x(x1, x2, mid) < target_x {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f64, x2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * t * x1 + 3.0 * mt * t2 * x2 + t2 * t
}

#[inline]
fn bezier_y(y1: f64, y2: f64, t: f64) -> f64 {
    let t2 = t * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * t * y1 + 3.0 * mt * t2 * y2 + t2 * t
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f64, x2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f64) -> f64 {
    if steps == 0 {
        return t;
    }

    let steps_f = steps as f64;

    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
        StepPosition::Both => ((t * (steps_f + 1.0)).floor() / steps_f).min(1.0),
        StepPosition::None => {
            if steps == 1 {
                0.5
            } else {
                ((t * steps_f).floor() / (steps_f - 1.0)).min(1.0)
            }
        }
    }
}
