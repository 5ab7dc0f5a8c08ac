//! Coordinate reference systems known to the reference pipeline

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::core::coordinates::GeoPoint;
use crate::projection::ProjectionError;

/// Sphere radius used by EPSG:3857
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;
/// Latitude limit of EPSG:3857 (square world)
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// CRS identified by its authority id (e.g. `"EPSG:4326"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Crs {
    /// EPSG:4326, geographic lon/lat degrees
    #[default]
    Wgs84,
    /// EPSG:3857, spherical web mercator meters
    WebMercator,
    /// Any other authority id; carried but not transformable here
    Other(String),
}

impl Crs {
    pub fn from_authid(authid: &str) -> Self {
        match authid.trim().to_ascii_uppercase().as_str() {
            "EPSG:4326" | "OGC:CRS84" => Crs::Wgs84,
            "EPSG:3857" | "EPSG:900913" => Crs::WebMercator,
            _ => Crs::Other(authid.trim().to_string()),
        }
    }

    pub fn authid(&self) -> &str {
        match self {
            Crs::Wgs84 => "EPSG:4326",
            Crs::WebMercator => "EPSG:3857",
            Crs::Other(id) => id,
        }
    }

    /// Point in this CRS -> WGS84 lon/lat
    pub fn to_wgs84(&self, p: DVec2) -> Result<GeoPoint, ProjectionError> {
        let out_of_domain = || ProjectionError::OutOfDomain {
            crs: self.authid().to_string(),
            x: p.x,
            y: p.y,
        };
        match self {
            Crs::Wgs84 => GeoPoint::from_degrees(p.x, p.y).map_err(|_| out_of_domain()),
            Crs::WebMercator => {
                if !p.is_finite() {
                    return Err(out_of_domain());
                }
                let lon = (p.x / WEB_MERCATOR_RADIUS_M).to_degrees();
                let lat = (2.0 * (p.y / WEB_MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
                GeoPoint::from_degrees(lon, lat).map_err(|_| out_of_domain())
            }
            Crs::Other(id) => Err(ProjectionError::UnsupportedCrs(id.clone())),
        }
    }

    /// WGS84 lon/lat -> point in this CRS
    pub fn from_wgs84(&self, g: GeoPoint) -> Result<DVec2, ProjectionError> {
        let out_of_domain = || ProjectionError::OutOfDomain {
            crs: self.authid().to_string(),
            x: g.lon,
            y: g.lat,
        };
        if !g.is_valid() {
            return Err(out_of_domain());
        }
        match self {
            Crs::Wgs84 => Ok(g.as_dvec2()),
            Crs::WebMercator => {
                if g.lat.abs() > WEB_MERCATOR_MAX_LAT {
                    return Err(out_of_domain());
                }
                let x = WEB_MERCATOR_RADIUS_M * g.lon.to_radians();
                let y = WEB_MERCATOR_RADIUS_M * (PI / 4.0 + g.lat.to_radians() / 2.0).tan().ln();
                Ok(DVec2::new(x, y))
            }
            Crs::Other(id) => Err(ProjectionError::UnsupportedCrs(id.clone())),
        }
    }
}

impl From<String> for Crs {
    fn from(value: String) -> Self {
        Crs::from_authid(&value)
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.authid().to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.authid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authid_roundtrip() {
        assert_eq!(Crs::from_authid("EPSG:4326"), Crs::Wgs84);
        assert_eq!(Crs::from_authid("epsg:3857"), Crs::WebMercator);
        assert_eq!(Crs::from_authid("EPSG:2056").authid(), "EPSG:2056");
        assert_eq!(Crs::WebMercator.to_string(), "EPSG:3857");
    }

    #[test]
    fn test_web_mercator_origin_and_extent() {
        let origin = Crs::WebMercator.from_wgs84(GeoPoint::new(0.0, 0.0)).unwrap();
        assert!(origin.length() < 1e-9);
        let edge = Crs::WebMercator
            .from_wgs84(GeoPoint::new(180.0 - 1e-12, 0.0))
            .unwrap();
        assert!((edge.x - 20_037_508.342_789_244).abs() < 1e-3);
    }

    #[test]
    fn test_web_mercator_roundtrip() {
        let g = GeoPoint::new(7.0, 47.0);
        let m = Crs::WebMercator.from_wgs84(g).unwrap();
        let back = Crs::WebMercator.to_wgs84(m).unwrap();
        assert!((back.lon - g.lon).abs() < 1e-10);
        assert!((back.lat - g.lat).abs() < 1e-10);
    }

    #[test]
    fn test_web_mercator_rejects_poles() {
        assert!(matches!(
            Crs::WebMercator.from_wgs84(GeoPoint::new(0.0, 89.0)),
            Err(ProjectionError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn test_unsupported_crs_fails() {
        let crs = Crs::from_authid("EPSG:21781");
        assert_eq!(
            crs.to_wgs84(DVec2::new(600_000.0, 200_000.0)).unwrap_err(),
            ProjectionError::UnsupportedCrs("EPSG:21781".to_string())
        );
    }

    #[test]
    fn test_serde_as_authid_string() {
        let json = serde_json::to_string(&Crs::WebMercator).unwrap();
        assert_eq!(json, "\"EPSG:3857\"");
        let crs: Crs = serde_json::from_str("\"EPSG:4326\"").unwrap();
        assert_eq!(crs, Crs::Wgs84);
    }
}
