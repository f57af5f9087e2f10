//! Curve math shared by the edge-loop and vertex-curve tools.
//!
//! Everything here is pure: points in, points out. The Hermite
//! parameterisation uses the classic tension/bias form where a tension of
//! `0` gives Catmull-Rom tangents, positive values tighten the curve and
//! negative values loosen it.

use nalgebra::{Point3, Vector3};

/// Number of samples used when discretising a fitted curve.
pub const CURVE_SAMPLES: usize = 1000;

/// One-dimensional Hermite interpolation between `y1` and `y2`.
///
/// `y0` and `y3` are the outer control values, `mu` in `[0, 1]` selects the
/// position between `y1` and `y2`.
///
/// # Example
/// ```
/// use edgeflow::algo::interpolate::hermite_1d;
///
/// // Evenly spaced control values stay on the line.
/// let y = hermite_1d(0.0, 1.0, 2.0, 3.0, 0.5, 0.0, 0.0);
/// assert!((y - 1.5).abs() < 1e-12);
/// ```
pub fn hermite_1d(y0: f64, y1: f64, y2: f64, y3: f64, mu: f64, tension: f64, bias: f64) -> f64 {
    let mu2 = mu * mu;
    let mu3 = mu2 * mu;

    let scale = (1.0 - tension) / 2.0;
    let m0 = (y1 - y0) * (1.0 + bias) * scale + (y2 - y1) * (1.0 - bias) * scale;
    let m1 = (y2 - y1) * (1.0 + bias) * scale + (y3 - y2) * (1.0 - bias) * scale;

    let a0 = 2.0 * mu3 - 3.0 * mu2 + 1.0;
    let a1 = mu3 - 2.0 * mu2 + mu;
    let a2 = mu3 - mu2;
    let a3 = -2.0 * mu3 + 3.0 * mu2;

    a0 * y1 + a1 * m0 + a2 * m1 + a3 * y2
}

/// Hermite interpolation applied independently to each axis.
pub fn hermite_3d(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
    mu: f64,
    tension: f64,
    bias: f64,
) -> Point3<f64> {
    Point3::new(
        hermite_1d(p1.x, p2.x, p3.x, p4.x, mu, tension, bias),
        hermite_1d(p1.y, p2.y, p3.y, p4.y, mu, tension, bias),
        hermite_1d(p1.z, p2.z, p3.z, p4.z, mu, tension, bias),
    )
}

/// Evaluate a cubic Bezier curve at `t`.
pub fn cubic_bezier(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    t: f64,
) -> Point3<f64> {
    let s = 1.0 - t;
    let b0 = s * s * s;
    let b1 = 3.0 * s * s * t;
    let b2 = 3.0 * s * t * t;
    let b3 = t * t * t;
    Point3::from(p0.coords * b0 + p1.coords * b1 + p2.coords * b2 + p3.coords * b3)
}

/// Sample a cubic Bezier curve at `samples + 1` evenly spaced parameters.
pub fn sample_bezier(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    samples: usize,
) -> Vec<Point3<f64>> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| cubic_bezier(p0, p1, p2, p3, i as f64 / samples as f64))
        .collect()
}

/// Sample a Hermite segment between `p2` and `p3` at `samples + 1` parameters.
pub fn sample_hermite(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
    tension: f64,
    samples: usize,
) -> Vec<Point3<f64>> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| hermite_3d(p1, p2, p3, p4, i as f64 / samples as f64, tension, 0.0))
        .collect()
}

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: &Point3<f64>, b: &Point3<f64>, t: f64) -> Point3<f64> {
    a + (b - a) * t
}

/// Smoothstep easing of `t` clamped to `[0, 1]`.
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Spherical interpolation between two directions.
///
/// The result has the length linearly interpolated between the input
/// lengths. Nearly parallel inputs fall back to linear interpolation.
pub fn slerp(a: &Vector3<f64>, b: &Vector3<f64>, t: f64) -> Vector3<f64> {
    let la = a.norm();
    let lb = b.norm();
    if la < f64::EPSILON || lb < f64::EPSILON {
        return a.lerp(b, t);
    }

    let ua = a / la;
    let ub = b / lb;
    let cos = ua.dot(&ub).clamp(-1.0, 1.0);
    let angle = cos.acos();
    let sin = angle.sin();
    let length = la + (lb - la) * t;

    if sin.abs() < 1e-9 {
        if cos > 0.0 {
            return a.lerp(b, t);
        }
        // Opposite directions: the rotation plane is undefined.
        return ua.lerp(&ub, t) * length;
    }

    let wa = ((1.0 - t) * angle).sin() / sin;
    let wb = (t * angle).sin() / sin;
    (ua * wa + ub * wb) * length
}

/// Closest points between the infinite lines `p1-p2` and `p3-p4`.
///
/// Returns `None` when the lines are parallel or degenerate.
pub fn intersect_line_line(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
) -> Option<(Point3<f64>, Point3<f64>)> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let r = p1 - p3;

    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    if a < f64::EPSILON || e < f64::EPSILON {
        return None;
    }

    let b = d1.dot(&d2);
    let c = d1.dot(&r);
    let f = d2.dot(&r);
    let denom = a * e - b * b;
    if denom.abs() < 1e-12 * a * e {
        return None;
    }

    let s = (b * f - c * e) / denom;
    let t = (a * f - b * c) / denom;
    Some((p1 + d1 * s, p3 + d2 * t))
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Point3<f64>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Redistribute `count` points evenly by arc length along a sampled curve.
///
/// The first and last results equal the first and last samples. Interior
/// point `j` sits at cumulative length `j * total / (count - 1)`, linearly
/// interpolated inside the sample segment that contains it.
pub fn resample_by_arc_length(samples: &[Point3<f64>], count: usize) -> Vec<Point3<f64>> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };
    match count {
        0 => return Vec::new(),
        1 => return vec![first],
        _ => {}
    }
    if samples.len() < 2 {
        return vec![first; count];
    }

    let mut cumulative = Vec::with_capacity(samples.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for w in samples.windows(2) {
        total += (w[1] - w[0]).norm();
        cumulative.push(total);
    }

    let mut result = Vec::with_capacity(count);
    result.push(first);
    for j in 1..count - 1 {
        let target = total * j as f64 / (count - 1) as f64;
        // First sample at or past the target length.
        let hi = cumulative
            .partition_point(|&d| d < target)
            .clamp(1, samples.len() - 1);
        let lo = hi - 1;
        let span = cumulative[hi] - cumulative[lo];
        let t = if span > 0.0 {
            (target - cumulative[lo]) / span
        } else {
            0.0
        };
        result.push(lerp(&samples[lo], &samples[hi], t));
    }
    result.push(last);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hermite_endpoints() {
        for &tension in &[-1.8, 0.0, 1.0] {
            assert!((hermite_1d(5.0, 1.0, 2.0, 7.0, 0.0, tension, 0.0) - 1.0).abs() < 1e-12);
            assert!((hermite_1d(5.0, 1.0, 2.0, 7.0, 1.0, tension, 0.0) - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hermite_midpoint_bulges() {
        // Control points on a parabola: the midpoint rises above the chord.
        let y = hermite_1d(0.0, 1.0, 1.0, 0.0, 0.5, 0.0, 0.0);
        assert!(y > 1.0);

        // Full tension flattens the tangents to zero.
        let flat = hermite_1d(0.0, 1.0, 1.0, 0.0, 0.5, 1.0, 0.0);
        assert!((flat - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hermite_3d_collinear() {
        let p = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
            Point3::new(3.0, 3.0, 3.0),
        ];
        let mid = hermite_3d(&p[0], &p[1], &p[2], &p[3], 0.5, 0.0, 0.0);
        assert!((mid - Point3::new(1.5, 1.5, 1.5)).norm() < 1e-12);
    }

    #[test]
    fn test_bezier_endpoints() {
        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(0.0, 1.0, 0.0);
        let p2 = Point3::new(1.0, 1.0, 0.0);
        let p3 = Point3::new(1.0, 0.0, 0.0);
        assert!((cubic_bezier(&p0, &p1, &p2, &p3, 0.0) - p0).norm() < 1e-12);
        assert!((cubic_bezier(&p0, &p1, &p2, &p3, 1.0) - p3).norm() < 1e-12);

        let samples = sample_bezier(&p0, &p1, &p2, &p3, 10);
        assert_eq!(samples.len(), 11);
        // Symmetric control polygon: apex at t = 0.5, height 0.75.
        assert!((samples[5] - Point3::new(0.5, 0.75, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_slerp_quarter_turn() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 0.0);
        let half = slerp(&a, &b, 0.5);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert!((half - Vector3::new(s, s, 0.0)).norm() < 1e-12);
        assert!((slerp(&a, &b, 1.0) - b).norm() < 1e-12);
    }

    #[test]
    fn test_slerp_interpolates_length() {
        let a = Vector3::new(2.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 4.0, 0.0);
        assert!((slerp(&a, &b, 0.5).norm() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_intersect_line_line() {
        let (a, b) = intersect_line_line(
            &Point3::new(-1.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, -1.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert!((a - Point3::origin()).norm() < 1e-12);
        assert!((b - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-12);

        let parallel = intersect_line_line(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
        );
        assert!(parallel.is_none());
    }

    #[test]
    fn test_resample_uneven_samples() {
        // Dense at the start, sparse at the end.
        let samples = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.1, 0.0, 0.0),
            Point3::new(0.2, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let points = resample_by_arc_length(&samples, 5);
        assert_eq!(points.len(), 5);
        for (j, p) in points.iter().enumerate() {
            assert!((p.x - j as f64).abs() < 1e-12, "point {} at {}", j, p.x);
        }
    }

    #[test]
    fn test_resample_edge_cases() {
        let samples = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 2.0, 3.0)];
        assert!(resample_by_arc_length(&samples, 0).is_empty());
        assert_eq!(resample_by_arc_length(&samples, 1), vec![samples[0]]);
        assert!(resample_by_arc_length(&[], 3).is_empty());

        let two = resample_by_arc_length(&samples, 2);
        assert_eq!(two, samples);
    }

    #[test]
    fn test_resample_single_sample() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(resample_by_arc_length(&[p], 3), vec![p; 3]);
    }

    #[test]
    fn test_resample_dense_bezier_by_arc_length() {
        let samples = sample_bezier(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
            &Point3::new(3.0, 2.0, 1.0),
            &Point3::new(4.0, 0.0, 0.0),
            CURVE_SAMPLES,
        );
        let total = polyline_length(&samples);
        let count = 7;
        let points = resample_by_arc_length(&samples, count);
        assert_eq!(points.len(), count);

        // Arc length along the sample polyline of a point lying on it.
        let arc_position = |p: &Point3<f64>| {
            let mut walked = 0.0;
            let mut best = (f64::INFINITY, 0.0);
            for w in samples.windows(2) {
                let span = w[1] - w[0];
                let length = span.norm();
                let t = ((p - w[0]).dot(&span) / (length * length)).clamp(0.0, 1.0);
                let off = (p - lerp(&w[0], &w[1], t)).norm();
                if off < best.0 {
                    best = (off, walked + t * length);
                }
                walked += length;
            }
            best.1
        };

        for (j, p) in points.iter().enumerate() {
            let expected = total * j as f64 / (count - 1) as f64;
            let step = total / (CURVE_SAMPLES - 1) as f64;
            assert!(
                (arc_position(p) - expected).abs() <= step,
                "point {} at {} instead of {}",
                j,
                arc_position(p),
                expected
            );
        }
    }

    #[test]
    fn test_polyline_length() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 4.0, 0.0),
        ];
        assert!((polyline_length(&points) - 7.0).abs() < 1e-12);
    }
}
