//! Forward and inverse geodesics on an ellipsoid (Vincenty's formulae).
//!
//! All bearings are degrees clockwise from north and are returned in
//! [0, 360); longitudes are returned in [-180, 180); distances are meters.
//! The model is a plain `Copy` value with no interior state, so a single
//! instance can be shared freely between threads.

use std::f64::consts::PI;

use crate::core::coordinates::{GeoPoint, normalize_bearing, normalize_longitude};
use crate::geodesy::GeodesicError;
use crate::geodesy::ellipsoid::Ellipsoid;

/// Convergence threshold on the iterated angle (radians). ~0.006 mm on the ground.
const CONVERGENCE_RAD: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;
/// Upper bound on the stepped samples of one path
pub const MAX_PATH_STEPS: usize = 100_000;
/// sin(sigma) below this is treated as a zero-length (or antipodal) pair.
const DEGENERATE_SIN_SIGMA: f64 = 1e-12;

/// Result of the forward (direct) problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direct {
    pub point: GeoPoint,
    /// Forward azimuth at the destination
    pub final_bearing: f64,
}

/// Result of the inverse problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inverse {
    pub distance_m: f64,
    /// Forward azimuth at the first point
    pub initial_bearing: f64,
    /// Forward azimuth at the second point
    pub final_bearing: f64,
}

/// Geodesic calculator bound to one ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geodesic {
    ellipsoid: Ellipsoid,
}

impl Geodesic {
    pub const WGS84: Geodesic = Geodesic {
        ellipsoid: Ellipsoid::WGS84,
    };

    /// Destination reached from `origin` after `distance_m` along the initial `bearing_deg`.
    pub fn destination(
        &self,
        origin: GeoPoint,
        distance_m: f64,
        bearing_deg: f64,
    ) -> Result<GeoPoint, GeodesicError> {
        self.direct(origin, distance_m, bearing_deg).map(|d| d.point)
    }

    /// Solve the forward problem. Negative or non-finite distances are rejected.
    pub fn direct(
        &self,
        origin: GeoPoint,
        distance_m: f64,
        bearing_deg: f64,
    ) -> Result<Direct, GeodesicError> {
        if !origin.is_valid() {
            return Err(GeodesicError::InvalidCoordinate(origin));
        }
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(GeodesicError::InvalidDistance(distance_m));
        }
        if !bearing_deg.is_finite() {
            return Err(GeodesicError::InvalidBearing(bearing_deg));
        }

        let f = self.ellipsoid.f;
        let b = self.ellipsoid.b();

        let alpha1 = bearing_deg.to_radians();
        let (sin_a1, cos_a1) = alpha1.sin_cos();

        let (sin_u1, cos_u1) = reduced_latitude(origin.lat.to_radians(), f);
        let sigma1 = sin_u1.atan2(cos_u1 * cos_a1);
        let sin_alpha = cos_u1 * sin_a1;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let u_sq = cos_sq_alpha * self.ellipsoid.ep2();
        let (big_a, big_b) = series_coefficients(u_sq);

        let sigma0 = distance_m / (b * big_a);
        let mut sigma = sigma0;
        let mut iterations = 0;
        loop {
            let cos_2sm = (2.0 * sigma1 + sigma).cos();
            let (sin_s, cos_s) = sigma.sin_cos();
            let next = sigma0 + delta_sigma(big_b, sin_s, cos_s, cos_2sm);
            let converged = (next - sigma).abs() <= CONVERGENCE_RAD;
            sigma = next;
            if converged {
                break;
            }
            iterations += 1;
            if iterations >= MAX_ITERATIONS {
                return Err(GeodesicError::NoConvergence(origin));
            }
        }

        let (sin_s, cos_s) = sigma.sin_cos();
        let cos_2sm = (2.0 * sigma1 + sigma).cos();
        let x = sin_u1 * sin_s - cos_u1 * cos_s * cos_a1;
        let phi2 = (sin_u1 * cos_s + cos_u1 * sin_s * cos_a1)
            .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());
        let lambda = (sin_s * sin_a1).atan2(cos_u1 * cos_s - sin_u1 * sin_s * cos_a1);
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let l = lambda
            - (1.0 - c)
                * f
                * sin_alpha
                * (sigma + c * sin_s * (cos_2sm + c * cos_s * (-1.0 + 2.0 * cos_2sm * cos_2sm)));

        let point = GeoPoint::new(normalize_longitude(origin.lon + l.to_degrees()), phi2.to_degrees());
        let final_bearing = normalize_bearing(sin_alpha.atan2(-x).to_degrees());
        Ok(Direct {
            point,
            final_bearing,
        })
    }

    /// Solve the inverse problem between two points.
    ///
    /// Coincident points give a zero distance with zero bearings. Nearly
    /// antipodal pairs where the iteration does not settle fail with
    /// [`GeodesicError::Antipodal`].
    pub fn inverse(&self, p1: GeoPoint, p2: GeoPoint) -> Result<Inverse, GeodesicError> {
        for p in [p1, p2] {
            if !p.is_valid() {
                return Err(GeodesicError::InvalidCoordinate(p));
            }
        }

        let f = self.ellipsoid.f;
        let b = self.ellipsoid.b();

        let l = normalize_longitude(p2.lon - p1.lon).to_radians();
        let (sin_u1, cos_u1) = reduced_latitude(p1.lat.to_radians(), f);
        let (sin_u2, cos_u2) = reduced_latitude(p2.lat.to_radians(), f);
        let antipodal = l.abs() > PI / 2.0 || (p2.lat - p1.lat).abs().to_radians() > PI / 2.0;

        let mut lambda = l;
        let mut iterations = 0;
        let state = loop {
            let (sin_l, cos_l) = lambda.sin_cos();
            let t = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_l;
            let sin_s = ((cos_u2 * sin_l).powi(2) + t * t).sqrt();
            let cos_s = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_l;
            if sin_s.abs() < DEGENERATE_SIN_SIGMA {
                if cos_s > 0.0 {
                    return Ok(Inverse {
                        distance_m: 0.0,
                        initial_bearing: 0.0,
                        final_bearing: 0.0,
                    });
                }
                return Err(GeodesicError::Antipodal { from: p1, to: p2 });
            }
            let sigma = sin_s.atan2(cos_s);
            let sin_alpha = cos_u1 * cos_u2 * sin_l / sin_s;
            let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            // Equatorial lines have cos²α = 0
            let cos_2sm = if cos_sq_alpha != 0.0 {
                cos_s - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };
            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let previous = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma + c * sin_s * (cos_2sm + c * cos_s * (-1.0 + 2.0 * cos_2sm * cos_2sm)));

            let check = if antipodal { lambda.abs() - PI } else { lambda.abs() };
            if check > PI {
                return Err(GeodesicError::Antipodal { from: p1, to: p2 });
            }
            if (lambda - previous).abs() <= CONVERGENCE_RAD {
                break InverseState {
                    sin_l,
                    cos_l,
                    sin_s,
                    cos_s,
                    sigma,
                    cos_sq_alpha,
                    cos_2sm,
                };
            }
            iterations += 1;
            if iterations >= MAX_ITERATIONS {
                return Err(GeodesicError::Antipodal { from: p1, to: p2 });
            }
        };

        let u_sq = state.cos_sq_alpha * self.ellipsoid.ep2();
        let (big_a, big_b) = series_coefficients(u_sq);
        let d_sigma = delta_sigma(big_b, state.sin_s, state.cos_s, state.cos_2sm);
        let distance_m = b * big_a * (state.sigma - d_sigma);

        let alpha1 = (cos_u2 * state.sin_l)
            .atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * state.cos_l);
        let alpha2 = (cos_u1 * state.sin_l)
            .atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * state.cos_l);

        Ok(Inverse {
            distance_m,
            initial_bearing: normalize_bearing(alpha1.to_degrees()),
            final_bearing: normalize_bearing(alpha2.to_degrees()),
        })
    }

    /// Distance in meters between two points.
    pub fn distance(&self, p1: GeoPoint, p2: GeoPoint) -> Result<f64, GeodesicError> {
        self.inverse(p1, p2).map(|inv| inv.distance_m)
    }

    /// Reusable line from `p1` through `p2`; `total_length` is the p1→p2 distance.
    pub fn inverse_line(&self, p1: GeoPoint, p2: GeoPoint) -> Result<GeodesicLine, GeodesicError> {
        let inv = self.inverse(p1, p2)?;
        if inv.distance_m == 0.0 {
            return Err(GeodesicError::CoincidentPoints(p1));
        }
        Ok(GeodesicLine {
            geodesic: *self,
            origin: p1,
            azimuth: inv.initial_bearing,
            total_length: inv.distance_m,
        })
    }

    /// Line leaving `origin` on `bearing_deg`, nominally `length_m` long.
    pub fn direct_line(
        &self,
        origin: GeoPoint,
        bearing_deg: f64,
        length_m: f64,
    ) -> Result<GeodesicLine, GeodesicError> {
        if !origin.is_valid() {
            return Err(GeodesicError::InvalidCoordinate(origin));
        }
        if !bearing_deg.is_finite() {
            return Err(GeodesicError::InvalidBearing(bearing_deg));
        }
        if !length_m.is_finite() || length_m < 0.0 {
            return Err(GeodesicError::InvalidDistance(length_m));
        }
        Ok(GeodesicLine {
            geodesic: *self,
            origin,
            azimuth: normalize_bearing(bearing_deg),
            total_length: length_m,
        })
    }
}

struct InverseState {
    sin_l: f64,
    cos_l: f64,
    sin_s: f64,
    cos_s: f64,
    sigma: f64,
    cos_sq_alpha: f64,
    cos_2sm: f64,
}

/// A geodesic fixed by its origin and initial azimuth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodesicLine {
    geodesic: Geodesic,
    origin: GeoPoint,
    azimuth: f64,
    total_length: f64,
}

impl GeodesicLine {
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Initial azimuth at the origin, degrees in [0, 360)
    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Point at arc distance `distance_m` from the origin. Distances past
    /// `total_length` continue along the same geodesic.
    pub fn position(&self, distance_m: f64) -> Result<GeoPoint, GeodesicError> {
        self.geodesic
            .destination(self.origin, distance_m, self.azimuth)
    }

    /// Step the line every `step_m` meters from 0 to `length_m`, then append
    /// one sample at exactly `length_m`.
    ///
    /// Steps run over `0..=max(1, ceil(length_m / step_m))`, so the last
    /// stepped sample may coincide with or overshoot the endpoint.
    pub fn sample_path(&self, step_m: f64, length_m: f64) -> Result<GeodesicPath, GeodesicError> {
        if !step_m.is_finite() || step_m <= 0.0 {
            return Err(GeodesicError::InvalidDistance(step_m));
        }
        if !length_m.is_finite() || length_m < 0.0 {
            return Err(GeodesicError::InvalidDistance(length_m));
        }

        let ratio = (length_m / step_m).ceil();
        if ratio > MAX_PATH_STEPS as f64 {
            return Err(GeodesicError::TooManySteps { steps: ratio, max: MAX_PATH_STEPS });
        }
        let n_steps = (ratio as usize).max(1);
        let capacity = n_steps
            .checked_add(2)
            .ok_or(GeodesicError::TooManySteps { steps: ratio, max: MAX_PATH_STEPS })?;
        let mut samples = Vec::with_capacity(capacity);
        for step in 0..=n_steps {
            let distance_m = step as f64 * step_m;
            samples.push(PathSample {
                step: Some(step),
                distance_m,
                point: self.position(distance_m)?,
            });
        }
        samples.push(PathSample {
            step: None,
            distance_m: length_m,
            point: self.position(length_m)?,
        });
        Ok(GeodesicPath { samples })
    }
}

/// One sample of a discretized geodesic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// Step index for stepped samples, `None` for the exact endpoint
    pub step: Option<usize>,
    pub distance_m: f64,
    pub point: GeoPoint,
}

/// Fixed-step discretization of a geodesic line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeodesicPath {
    pub samples: Vec<PathSample>,
}

impl GeodesicPath {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn endpoint(&self) -> Option<&PathSample> {
        self.samples.last()
    }
}

/// (sin U, cos U) of the reduced latitude
fn reduced_latitude(phi: f64, f: f64) -> (f64, f64) {
    let tan_u = (1.0 - f) * phi.tan();
    let cos_u = 1.0 / (1.0 + tan_u * tan_u).sqrt();
    (tan_u * cos_u, cos_u)
}

/// Vincenty's A and B series in u²
fn series_coefficients(u_sq: f64) -> (f64, f64) {
    let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    (a, b)
}

fn delta_sigma(big_b: f64, sin_s: f64, cos_s: f64, cos_2sm: f64) -> f64 {
    let c2 = cos_2sm * cos_2sm;
    big_b
        * sin_s
        * (cos_2sm
            + big_b / 4.0
                * (cos_s * (-1.0 + 2.0 * c2)
                    - big_b / 6.0 * cos_2sm * (-3.0 + 4.0 * sin_s * sin_s) * (-3.0 + 4.0 * c2)))
}

// =================================== Tests ===================================
