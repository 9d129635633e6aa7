//! Parametric Bezier easing curves.
//!
//! A curve is an ordered list of control points. Consecutive segments share
//! their end anchors: every full segment is cubic (three new points), and a
//! trailing remainder of one or two points forms a linear or quadratic
//! segment. `evaluate` treats the curve as `y = f(x)` and inverts `Bx(t) = x`
//! before reading `By(t)`.

use crate::core::constants::{
    CURVE_BISECTION_ITERATIONS, CURVE_DERIVATIVE_EPSILON, CURVE_NEWTON_ITERATIONS,
    CURVE_TOLERANCE,
};
use crate::core::geo::Point;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest number of control points in a single segment (cubic).
const MAX_SEGMENT_POINTS: usize = 4;

/// Easing curve mapping elapsed-time fraction to eased progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EasingCurve {
    points: Vec<Point>,
}

impl EasingCurve {
    /// Create a curve from its control points
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let curve = Self { points };
        curve.validate()?;
        Ok(curve)
    }

    /// Single cubic segment anchored at `(0,0)` and `(1,1)`, CSS `cubic-bezier` style
    pub fn cubic(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(x1, y1),
                Point::new(x2, y2),
                Point::new(1.0, 1.0),
            ],
        }
    }

    pub fn linear() -> Self {
        Self {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
        }
    }

    pub fn ease() -> Self {
        Self::cubic(0.25, 0.1, 0.25, 1.0)
    }

    pub fn ease_in() -> Self {
        Self::cubic(0.42, 0.0, 1.0, 1.0)
    }

    pub fn ease_out() -> Self {
        Self::cubic(0.0, 0.0, 0.58, 1.0)
    }

    pub fn ease_in_out() -> Self {
        Self::cubic(0.42, 0.0, 0.58, 1.0)
    }

    /// Overshoots the target before settling back onto it
    pub fn back_out() -> Self {
        Self::cubic(0.175, 0.885, 0.32, 1.275)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Check the invariants `evaluate` relies on.
    ///
    /// Curves built through `new` are always valid; curves deserialized from
    /// configuration are checked again before a transition starts.
    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 2 {
            return Err(Error::CurveDegenerate(self.points.len()));
        }
        if let Some(index) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(Error::InvalidSpec(format!(
                "easing control point {} is not finite",
                index
            )));
        }
        Ok(())
    }

    /// Number of chained Bezier segments
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Raw parametric evaluation, `t` spread evenly over the segments
    pub fn point_at(&self, t: f64) -> Point {
        let segments: Vec<&[Point]> = self.segments().collect();
        match segments.len() {
            0 => self.points.first().copied().unwrap_or_default(),
            count => {
                let scaled = t.clamp(0.0, 1.0) * count as f64;
                let index = (scaled.floor() as usize).min(count - 1);
                bezier(segments[index], scaled - index as f64)
            }
        }
    }

    /// Eased progress `y` for an elapsed-time fraction `x`.
    ///
    /// The result is not clamped; overshooting curves return values outside
    /// `[0, 1]`. When the curve folds back on itself in x, the first segment
    /// spanning `x` and the root found from the Newton seed win.
    pub fn evaluate(&self, x: f64) -> f64 {
        let Some(segment) = self.segment_for(x) else {
            return x;
        };
        let t = solve_for_x(segment, x);
        bezier(segment, t).y
    }

    fn segments(&self) -> impl Iterator<Item = &[Point]> + '_ {
        let last = self.points.len().saturating_sub(1);
        let mut start = 0;
        std::iter::from_fn(move || {
            if start >= last {
                return None;
            }
            let end = (start + MAX_SEGMENT_POINTS - 1).min(last);
            let segment = &self.points[start..=end];
            start = end;
            Some(segment)
        })
    }

    fn segment_for(&self, x: f64) -> Option<&[Point]> {
        let mut first = None;
        let mut last = None;
        for segment in self.segments() {
            let (x0, x1) = anchor_span(segment);
            if x >= x0.min(x1) && x <= x0.max(x1) {
                return Some(segment);
            }
            first.get_or_insert(segment);
            last = Some(segment);
        }

        // Outside the curve's x range: extend from the nearest end.
        let first = first?;
        let (start_x, _) = anchor_span(first);
        if x < start_x {
            Some(first)
        } else {
            last
        }
    }
}

impl Default for EasingCurve {
    fn default() -> Self {
        Self::ease()
    }
}

fn anchor_span(segment: &[Point]) -> (f64, f64) {
    let first = segment.first().map_or(0.0, |p| p.x);
    let last = segment.last().map_or(0.0, |p| p.x);
    (first, last)
}

/// Find `t` in `[0, 1]` with `Bx(t) = x`: Newton-Raphson seeded from the
/// anchor-normalized `x`, bisection when the derivative vanishes or Newton
/// does not converge.
fn solve_for_x(segment: &[Point], x: f64) -> f64 {
    let (x0, x1) = anchor_span(segment);
    let span = x1 - x0;
    let mut t = if span.abs() > CURVE_DERIVATIVE_EPSILON {
        ((x - x0) / span).clamp(0.0, 1.0)
    } else {
        x.clamp(0.0, 1.0)
    };

    for _ in 0..CURVE_NEWTON_ITERATIONS {
        let error = bezier(segment, t).x - x;
        if error.abs() < CURVE_TOLERANCE {
            return t;
        }
        let slope = bezier_derivative(segment, t).x;
        if slope.abs() < CURVE_DERIVATIVE_EPSILON {
            break;
        }
        t = (t - error / slope).clamp(0.0, 1.0);
    }

    if (bezier(segment, t).x - x).abs() < CURVE_TOLERANCE {
        return t;
    }
    bisect_for_x(segment, x)
}

fn bisect_for_x(segment: &[Point], x: f64) -> f64 {
    let increasing = bezier(segment, 0.0).x <= bezier(segment, 1.0).x;
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut mid = 0.5;

    for _ in 0..CURVE_BISECTION_ITERATIONS {
        mid = 0.5 * (lo + hi);
        let error = bezier(segment, mid).x - x;
        if error.abs() < CURVE_TOLERANCE {
            break;
        }
        if (error < 0.0) == increasing {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    mid
}

/// De Casteljau evaluation of a segment of up to four points
fn bezier(segment: &[Point], t: f64) -> Point {
    let n = segment.len().min(MAX_SEGMENT_POINTS);
    let mut work = [Point::default(); MAX_SEGMENT_POINTS];
    work[..n].copy_from_slice(&segment[..n]);

    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i].add(&work[i + 1].subtract(&work[i]).multiply(t));
        }
    }

    work[0]
}

/// `B'(t) = d * sum` over the hodograph of the segment
fn bezier_derivative(segment: &[Point], t: f64) -> Point {
    let n = segment.len().min(MAX_SEGMENT_POINTS);
    if n < 2 {
        return Point::default();
    }
    let degree = (n - 1) as f64;
    let mut hodograph = [Point::default(); MAX_SEGMENT_POINTS - 1];
    for i in 0..n - 1 {
        hodograph[i] = segment[i + 1].subtract(&segment[i]).multiply(degree);
    }
    bezier(&hodograph[..n - 1], t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-4;

    fn presets() -> Vec<EasingCurve> {
        vec![
            EasingCurve::linear(),
            EasingCurve::ease(),
            EasingCurve::ease_in(),
            EasingCurve::ease_out(),
            EasingCurve::ease_in_out(),
            EasingCurve::back_out(),
        ]
    }

    #[test]
    fn test_endpoints_are_fixed() {
        for curve in presets() {
            assert!(curve.evaluate(0.0).abs() < EPS, "{:?}", curve);
            assert!((curve.evaluate(1.0) - 1.0).abs() < EPS, "{:?}", curve);
        }
    }

    #[test]
    fn test_linear_is_identity() {
        let curve = EasingCurve::linear();
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert!((curve.evaluate(x) - x).abs() < EPS);
        }
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let curve = EasingCurve::ease_in_out();
        assert!((curve.evaluate(0.5) - 0.5).abs() < EPS);
        let a = curve.evaluate(0.2);
        let b = curve.evaluate(0.8);
        assert!((a + b - 1.0).abs() < EPS);
        assert!(a < 0.2);
    }

    #[test]
    fn test_ease_out_leads_linear() {
        let curve = EasingCurve::ease_out();
        assert!(curve.evaluate(0.3) > 0.3);
    }

    #[test]
    fn test_back_out_overshoots() {
        let curve = EasingCurve::back_out();
        let peak = (1..100)
            .map(|i| curve.evaluate(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_solution_matches_curve_x() {
        let curve = EasingCurve::cubic(0.8, 0.1, 0.1, 0.9);
        let segment = curve.points();
        for i in 0..=20 {
            let x = i as f64 / 20.0;
            let t = solve_for_x(segment, x);
            assert!((bezier(segment, t).x - x).abs() < CURVE_TOLERANCE);
        }
    }

    #[test]
    fn test_flat_derivative_falls_back() {
        // Bx'(0.5) = 0 for this curve
        let curve = EasingCurve::cubic(1.0, 0.0, 0.0, 1.0);
        let mut previous = curve.evaluate(0.0);
        for i in 1..=50 {
            let y = curve.evaluate(i as f64 / 50.0);
            assert!(y + EPS >= previous);
            previous = y;
        }
        assert!((curve.evaluate(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_piecewise_segments() {
        let curve = EasingCurve::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.1, 0.0),
            Point::new(0.4, 0.5),
            Point::new(0.5, 0.5),
            Point::new(0.6, 0.5),
            Point::new(0.9, 1.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(curve.segment_count(), 2);
        assert!((curve.evaluate(0.5) - 0.5).abs() < EPS);
        assert!(curve.evaluate(0.25) < 0.5);
        assert!(curve.evaluate(0.75) > 0.5);
        assert!((curve.evaluate(1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_trailing_remainder_segments() {
        let quadratic = EasingCurve::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.58, 1.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(quadratic.segment_count(), 1);
        assert!(quadratic.evaluate(0.5) > 0.5);

        let five = EasingCurve::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.2, 0.0),
            Point::new(0.3, 0.5),
            Point::new(0.5, 0.5),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(five.segment_count(), 2);
        assert!((five.evaluate(0.75) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_point_at_spans_segments() {
        let curve = EasingCurve::linear();
        assert_eq!(curve.point_at(0.0), Point::new(0.0, 0.0));
        assert_eq!(curve.point_at(1.0), Point::new(1.0, 1.0));
        assert_eq!(curve.point_at(0.5), Point::new(0.5, 0.5));
    }

    #[test]
    fn test_degenerate_curve_rejected() {
        let err = EasingCurve::new(vec![Point::new(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, Error::CurveDegenerate(1)));

        let err = EasingCurve::new(vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSpec(_)));
    }

    #[test]
    fn test_deserialized_curve_is_revalidated() {
        let curve: EasingCurve = serde_json::from_str(r#"{"points":[]}"#).unwrap();
        assert!(matches!(curve.validate(), Err(Error::CurveDegenerate(0))));
        assert_eq!(curve.evaluate(0.3), 0.3);
    }
}
