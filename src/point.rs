//! Points on the unit circle and their data-plane encoding.
//!
//! The server samples [`position`] once per tick and ships each sample as a
//! single datagram holding a JSON object:
//!
//! ```text
//! {"X":0.9990329346781247,"Y":0.04396811831786302}
//! ```
//!
//! No framing beyond the datagram boundary, no sequence numbers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::time::Duration;

/// One full revolution of the circle.
pub const PERIOD: Duration = Duration::from_secs(1);

/// Slack allowed past `[-1, 1]` when accepting a decoded coordinate
const RANGE_TOLERANCE: f64 = 1e-9;

/// A coordinate on the unit disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "X", alias = "x")]
    pub x: f64,
    #[serde(rename = "Y", alias = "y")]
    pub y: f64,
}

impl Point {
    #[cfg(test)]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Serialize to the wire record.
    ///
    /// # Panics
    ///
    /// Panics if a coordinate is not finite. The generator never produces
    /// such a point, so reaching this is a bug.
    pub fn encode(&self) -> Vec<u8> {
        assert!(
            self.x.is_finite() && self.y.is_finite(),
            "point coordinates must be finite: {:?}",
            self
        );
        serde_json::to_vec(self).expect("finite point always serializes")
    }

    /// Parse one datagram payload. Coordinates must lie in `[-1, 1]`.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let point: Point = serde_json::from_slice(payload)?;
        let in_range = |v: f64| v.abs() <= 1.0 + RANGE_TOLERANCE;
        if !(in_range(point.x) && in_range(point.y)) {
            return Err(Error::OutOfRange {
                x: point.x,
                y: point.y,
            });
        }
        Ok(point)
    }
}

/// Position on the unit circle after `elapsed` time, at one revolution per
/// [`PERIOD`], starting from `(1, 0)`.
pub fn position(elapsed: Duration) -> Point {
    let radians = (elapsed.as_secs_f64() / PERIOD.as_secs_f64()) * TAU;
    Point {
        x: radians.cos(),
        y: radians.sin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f64 = 1e-10;

    fn assert_near(expected: f64, actual: f64, delta: f64) {
        assert!(
            (expected - actual).abs() <= delta,
            "expected {} within {}, got {}",
            expected,
            delta,
            actual
        );
    }

    #[test]
    fn test_position_zero() {
        let p = position(Duration::ZERO);
        assert_near(1.0, p.x, DELTA);
        assert_near(0.0, p.y, DELTA);
    }

    #[test]
    fn test_position_quarter_turn() {
        let p = position(PERIOD / 4);
        assert_near(0.0, p.x, DELTA);
        assert_near(1.0, p.y, DELTA);
    }

    #[test]
    fn test_position_full_turn() {
        let p = position(PERIOD);
        assert_near(1.0, p.x, DELTA);
        assert_near(0.0, p.y, DELTA);
    }

    #[test]
    fn test_position_on_unit_circle() {
        for ms in (0..5000).step_by(7) {
            let p = position(Duration::from_millis(ms));
            assert_near(1.0, p.x * p.x + p.y * p.y, DELTA);
        }
    }

    #[test]
    fn test_position_is_periodic() {
        for ms in [0u64, 3, 125, 333, 999, 4321] {
            let d = Duration::from_millis(ms);
            let a = position(d);
            let b = position(d + PERIOD);
            assert_near(a.x, b.x, 1e-9);
            assert_near(a.y, b.y, 1e-9);
        }
    }

    #[test]
    fn test_encode_uses_capitalized_keys() {
        let encoded = Point::new(0.5, -0.25).encode();
        assert_eq!(encoded, br#"{"X":0.5,"Y":-0.25}"#);
    }

    #[test]
    fn test_decode() {
        let p = Point::decode(br#"{"X": 1, "Y": -0.5}"#).unwrap();
        assert_eq!(p, Point::new(1.0, -0.5));

        let p = Point::decode(br#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(p, Point::new(0.25, 0.75));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Point::decode(b"not json").is_err());
        assert!(Point::decode(br#"{"X":1.0}"#).is_err());
        assert!(Point::decode(br#"{"X":"a","Y":0}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        for payload in [
            &br#"{"X":1e300,"Y":0}"#[..],
            br#"{"X":0,"Y":-1e8}"#,
            br#"{"X":1.001,"Y":0}"#,
        ] {
            assert!(matches!(
                Point::decode(payload),
                Err(Error::OutOfRange { .. })
            ));
        }

        // Edges of the square, with a little float slack, are accepted.
        assert!(Point::decode(br#"{"X":-1,"Y":1}"#).is_ok());
        assert!(Point::decode(br#"{"X":1.0000000000000002,"Y":0}"#).is_ok());
    }

    #[test]
    #[should_panic(expected = "finite")]
    fn test_encode_non_finite_panics() {
        Point::new(f64::NAN, 0.0).encode();
    }
}
