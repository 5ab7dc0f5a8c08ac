//! Reference ellipsoid parameters

/// WGS84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// An oblate ellipsoid of revolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius in meters
    pub a: f64,
    /// Flattening
    pub f: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: WGS84_A,
        f: WGS84_F,
    };

    /// Polar radius in meters
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// Second eccentricity squared, (a² - b²) / b²
    pub fn ep2(&self) -> f64 {
        let b = self.b();
        (self.a * self.a - b * b) / (b * b)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
