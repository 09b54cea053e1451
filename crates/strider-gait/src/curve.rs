//! Step curves mapping swing phase to height and distance fractions.
//!
//! A [`StepCurve`] is a piecewise cubic Bezier through its keys: between two
//! keys the control points are offset from the key values by a third of the
//! segment duration times the leave/arrive tangents. Phases outside the key
//! range clamp to the first/last key value.

use strider_core::{CurveKey, StepConfig, StepCurveKind};

// Tangent of the builtin height curves at lift-off and touchdown.
const LIFT_TANGENT: f32 = 2.8878;

/// Evaluate a cubic Bezier segment at `t` using De Casteljau's algorithm.
fn bezier_eval(points: [f32; 4], t: f32) -> f32 {
    let mut work = points;
    for k in 1..4 {
        for i in 0..(4 - k) {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
    }
    work[0]
}

/// A cubic key curve over phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepCurve {
    keys: Vec<CurveKey>,
}

impl StepCurve {
    /// Build from keys in any order. Auto-tangent keys get their tangents
    /// from their neighbours; end keys with auto tangents are flat.
    pub fn new(keys: &[CurveKey]) -> Self {
        let mut keys = keys.to_vec();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));

        for i in 0..keys.len() {
            if !keys[i].auto_tangent {
                continue;
            }
            let tangent = if i == 0 || i + 1 == keys.len() {
                0.0
            } else {
                let (prev, next) = (keys[i - 1], keys[i + 1]);
                let span = next.time - prev.time;
                if span.abs() > f32::EPSILON {
                    (next.value - prev.value) / span
                } else {
                    0.0
                }
            };
            keys[i].arrive_tangent = tangent;
            keys[i].leave_tangent = tangent;
        }

        Self { keys }
    }

    /// Symmetric lift peaking at mid-swing.
    pub fn robot_height() -> Self {
        Self::new(&[
            CurveKey::new(0.0, 0.0, LIFT_TANGENT),
            CurveKey::auto(0.5, 1.0),
            CurveKey::new(1.0, 0.0, -LIFT_TANGENT),
        ])
    }

    /// Fast lift peaking at 20% of the swing, long descent.
    pub fn organic_height() -> Self {
        Self::new(&[
            CurveKey::new(0.0, 0.0, LIFT_TANGENT),
            CurveKey::new(0.2, 1.0, 0.0),
            CurveKey::new(1.0, 0.0, -LIFT_TANGENT),
        ])
    }

    /// Ease-in/ease-out progress from anchor to target.
    pub fn distance() -> Self {
        Self::new(&[CurveKey::new(0.0, 0.0, 0.0), CurveKey::new(1.0, 1.0, 0.0)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Value at `time`. An empty curve evaluates to 0.
    pub fn eval(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let segment = self
            .keys
            .windows(2)
            .find(|pair| time < pair[1].time)
            .unwrap_or(&self.keys[self.keys.len() - 2..]);
        let (a, b) = (segment[0], segment[1]);
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }

        let points = [
            a.value,
            a.value + a.leave_tangent * span / 3.0,
            b.value - b.arrive_tangent * span / 3.0,
            b.value,
        ];
        bezier_eval(points, (time - a.time) / span)
    }
}

/// The height and distance curves driving one swing.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCurves {
    pub height: StepCurve,
    pub distance: StepCurve,
}

impl Default for StepCurves {
    fn default() -> Self {
        Self {
            height: StepCurve::robot_height(),
            distance: StepCurve::distance(),
        }
    }
}

impl StepCurves {
    /// Select curves per the step configuration. An unset custom curve
    /// evaluates to 0 everywhere.
    pub fn from_config(step: &StepConfig) -> Self {
        match step.curve {
            StepCurveKind::Robot => Self::default(),
            StepCurveKind::Organic => Self {
                height: StepCurve::organic_height(),
                distance: StepCurve::distance(),
            },
            StepCurveKind::Custom => Self {
                height: step
                    .custom_height_curve
                    .as_deref()
                    .map(StepCurve::new)
                    .unwrap_or_default(),
                distance: step
                    .custom_distance_curve
                    .as_deref()
                    .map(StepCurve::new)
                    .unwrap_or_default(),
            },
        }
    }

    /// Height fraction at `phase`.
    pub fn height(&self, phase: f32) -> f32 {
        self.height.eval(phase)
    }

    /// Distance fraction at `phase`.
    pub fn distance(&self, phase: f32) -> f32 {
        self.distance.eval(phase)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn robot_height_extremes_and_peak() {
        let curve = StepCurve::robot_height();
        assert_relative_eq!(curve.eval(0.0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(curve.eval(0.5), 1.0, epsilon = 1e-6);
        assert_relative_eq!(curve.eval(1.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn robot_height_is_symmetric_and_non_negative() {
        let curve = StepCurve::robot_height();
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let value = curve.eval(t);
            assert!(value >= -1e-6, "height {value} at {t}");
            assert!(value <= 1.0 + 1e-6, "height {value} at {t}");
            assert_relative_eq!(value, curve.eval(1.0 - t), epsilon = 1e-5);
        }
    }

    #[test]
    fn organic_height_peaks_early() {
        let curve = StepCurve::organic_height();
        assert_relative_eq!(curve.eval(0.0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(curve.eval(0.2), 1.0, epsilon = 1e-6);
        assert_relative_eq!(curve.eval(1.0), 0.0, epsilon = 1e-6);
        assert!(curve.eval(0.1) > curve.eval(0.9));
    }

    #[test]
    fn distance_is_monotonic() {
        let curve = StepCurve::distance();
        let mut previous = curve.eval(0.0);
        assert_relative_eq!(previous, 0.0);
        for i in 1..=50 {
            let value = curve.eval(i as f32 / 50.0);
            assert!(value >= previous);
            previous = value;
        }
        assert_relative_eq!(previous, 1.0);
        assert_relative_eq!(curve.eval(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn clamps_outside_key_range() {
        let curve = StepCurve::distance();
        assert_relative_eq!(curve.eval(-1.0), 0.0);
        assert_relative_eq!(curve.eval(2.0), 1.0);
    }

    #[test]
    fn empty_curve_is_zero() {
        assert_relative_eq!(StepCurve::default().eval(0.3), 0.0);
    }

    #[test]
    fn auto_tangent_interior_key() {
        let curve = StepCurve::new(&[
            CurveKey::new(0.0, 0.0, 0.0),
            CurveKey::auto(1.0, 1.0),
            CurveKey::new(2.0, 2.0, 0.0),
        ]);
        assert_relative_eq!(curve.keys()[1].leave_tangent, 1.0);
    }

    #[test]
    fn unsorted_keys_are_sorted() {
        let curve = StepCurve::new(&[CurveKey::new(1.0, 1.0, 0.0), CurveKey::new(0.0, 0.0, 0.0)]);
        assert_relative_eq!(curve.keys()[0].time, 0.0);
        assert_relative_eq!(curve.eval(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn curves_from_config() {
        let mut step = StepConfig::default();
        let robot = StepCurves::from_config(&step);
        assert_relative_eq!(robot.height(0.5), 1.0, epsilon = 1e-6);

        step.curve = StepCurveKind::Organic;
        let organic = StepCurves::from_config(&step);
        assert_relative_eq!(organic.height(0.2), 1.0, epsilon = 1e-6);

        step.curve = StepCurveKind::Custom;
        let unset = StepCurves::from_config(&step);
        assert_relative_eq!(unset.height(0.5), 0.0);
        assert_relative_eq!(unset.distance(0.5), 0.0);

        step.custom_height_curve = Some(vec![CurveKey::new(0.0, 0.25, 0.0)]);
        let custom = StepCurves::from_config(&step);
        assert_relative_eq!(custom.height(0.7), 0.25);
    }
}
