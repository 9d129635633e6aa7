use crate::core::geo::{Color, Point, Size};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interpolation trait for values that can be smoothly transitioned
pub trait Interpolatable {
    /// `t` may leave `[0, 1]` under overshooting easing curves.
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

/// A value delivered to a transition sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(f64),
    Point(Point),
    Size(Size),
    Color(Color),
    /// Ordered pair of non-pair values, e.g. the two edges of a rectangle
    Pair(Box<Value>, Box<Value>),
}

/// Runtime kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Scalar,
    Point,
    Size,
    Color,
    Pair,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Point => "point",
            ValueKind::Size => "size",
            ValueKind::Color => "color",
            ValueKind::Pair => "pair",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn pair(first: impl Into<Value>, second: impl Into<Value>) -> Self {
        Value::Pair(Box::new(first.into()), Box::new(second.into()))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Point(_) => ValueKind::Point,
            Value::Size(_) => ValueKind::Size,
            Value::Color(_) => ValueKind::Color,
            Value::Pair(..) => ValueKind::Pair,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            Value::Size(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&Value, &Value)> {
        match self {
            Value::Pair(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<Point> for Value {
    fn from(value: Point) -> Self {
        Value::Point(value)
    }
}

impl From<Size> for Value {
    fn from(value: Size) -> Self {
        Value::Size(value)
    }
}

impl From<Color> for Value {
    fn from(value: Color) -> Self {
        Value::Color(value)
    }
}

/// Main interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two f64 values
    pub fn linear(start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * t
    }

    /// Verify that `start` and `end` can be interpolated and return their kind
    pub fn check_compatible(start: &Value, end: &Value) -> Result<ValueKind> {
        match (start, end) {
            (Value::Pair(a0, a1), Value::Pair(b0, b1)) => {
                for element in [a0, a1, b0, b1] {
                    if element.kind() == ValueKind::Pair {
                        return Err(Error::UnsupportedValueKind(
                            "nested pair".to_string(),
                        ));
                    }
                }
                Self::check_compatible(a0, b0)?;
                Self::check_compatible(a1, b1)?;
                Ok(ValueKind::Pair)
            }
            _ if start.kind() == end.kind() => Ok(start.kind()),
            _ => Err(Error::MismatchedValueKind {
                start: start.kind(),
                end: end.kind(),
            }),
        }
    }

    /// Interpolate between two values of the same kind at eased progress `y`
    pub fn lerp(start: &Value, end: &Value, y: f64) -> Result<Value> {
        Self::check_compatible(start, end)?;
        Ok(Self::lerp_unchecked(start, end, y))
    }

    /// Caller guarantees `check_compatible(start, end)` succeeded; on
    /// mismatch `start` is returned unchanged.
    pub(crate) fn lerp_unchecked(start: &Value, end: &Value, y: f64) -> Value {
        match (start, end) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a.lerp(b, y)),
            (Value::Point(a), Value::Point(b)) => Value::Point(a.lerp(b, y)),
            (Value::Size(a), Value::Size(b)) => Value::Size(a.lerp(b, y)),
            (Value::Color(a), Value::Color(b)) => Value::Color(a.lerp(b, y)),
            (Value::Pair(a0, a1), Value::Pair(b0, b1)) => Value::Pair(
                Box::new(Self::lerp_unchecked(a0, b0, y)),
                Box::new(Self::lerp_unchecked(a1, b1, y)),
            ),
            _ => start.clone(),
        }
    }
}

impl Interpolatable for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Interpolation::linear(*self, *other, t)
    }
}

impl Interpolatable for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }
}

impl Interpolatable for Size {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Size::new(
            self.width.lerp(&other.width, t),
            self.height.lerp(&other.height, t),
        )
    }
}

impl Interpolatable for Color {
    /// Channels are rounded and clamped to `0..=255`, so overshoot never wraps.
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let from = self.channels();
        let to = other.channels();
        let mut out = [0u8; 4];
        for (i, channel) in out.iter_mut().enumerate() {
            let value = Interpolation::linear(from[i] as f64, to[i] as f64, t);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
        Color::from_channels(out)
    }
}

impl<A: Interpolatable, B: Interpolatable> Interpolatable for (A, B) {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        (self.0.lerp(&other.0, t), self.1.lerp(&other.1, t))
    }
}
