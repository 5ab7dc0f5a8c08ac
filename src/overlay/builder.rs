//! PS overlay geometry builder
//!
//! Turns an [`OverlayParams`] snapshot into an [`OverlayGeometry`]: the ring,
//! the two main-axis legs and the three flight lines, each followed by its
//! tick strokes, with one label per tick. A build either produces the whole
//! geometry or fails; nothing is emitted on error.

use bevy::log::debug;

use crate::core::coordinates::{GeoPoint, normalize_bearing};
use crate::error::OverlayError;
use crate::geodesy::{Geodesic, PathSample};
use crate::overlay::geometry::{OverlayGeometry, OverlayLabel, OverlayPath, PathKind};
use crate::overlay::params::{LegFamily, LegSpec, OverlayParams};

/// Capability interface for anything that can turn parameters into geometry.
pub trait GeometryBuilder {
    fn build(&self, params: &OverlayParams) -> Result<OverlayGeometry, OverlayError>;
}

/// Default builder on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsOverlayBuilder {
    geodesic: Geodesic,
}

impl PsOverlayBuilder {
    /// Ring of `params.ring.radius_m` whose center sits one radius away from
    /// the overlay center, 90° clockwise of the azimuth.
    fn build_ring(
        &self,
        params: &OverlayParams,
        azimuth: f64,
        out: &mut OverlayGeometry,
    ) -> Result<(), OverlayError> {
        let geod = &self.geodesic;
        let radius = params.ring.radius_m;
        let bearing = normalize_bearing(azimuth + 90.0);

        let point = geod
            .destination(params.center, radius, bearing)
            .map_err(OverlayError::geodesic(bearing))?;
        // Pin the ring center at exactly one radius along the line, not at `point`.
        let ring_center = geod
            .inverse_line(params.center, point)
            .and_then(|line| line.position(radius))
            .map_err(OverlayError::geodesic(bearing))?;

        let spacing = params.ring.spacing_deg();
        let half = (params.ring.samples - 1) as f64 / 2.0;
        let mut points = Vec::with_capacity(params.ring.samples);
        for i in 0..params.ring.samples {
            let offset = i as f64 - half;
            let b = normalize_bearing(bearing + offset * spacing);
            points.push(
                geod.destination(ring_center, radius, b)
                    .map_err(OverlayError::geodesic(b))?,
            );
        }
        out.paths.push(OverlayPath::new(PathKind::Ring, points));
        Ok(())
    }

    fn build_family(
        &self,
        params: &OverlayParams,
        azimuth: f64,
        family: &LegFamily,
        out: &mut OverlayGeometry,
    ) -> Result<(), OverlayError> {
        for leg in &family.legs {
            self.build_leg(params, azimuth, family, leg, out)?;
        }
        Ok(())
    }

    fn build_leg(
        &self,
        params: &OverlayParams,
        azimuth: f64,
        family: &LegFamily,
        leg: &LegSpec,
        out: &mut OverlayGeometry,
    ) -> Result<(), OverlayError> {
        let geod = &self.geodesic;
        let bearing = normalize_bearing(azimuth + leg.bearing_offset_deg);
        let end = geod
            .destination(params.center, family.length_m, bearing)
            .map_err(OverlayError::geodesic(bearing))?;
        let path = geod
            .inverse_line(params.center, end)
            .and_then(|line| line.sample_path(family.step_m, family.length_m))
            .map_err(OverlayError::geodesic(bearing))?;

        let drawn: Vec<&PathSample> = path
            .samples
            .iter()
            .filter(|s| s.step.is_none_or(|step| step >= family.skip_steps))
            .collect();
        out.paths.push(OverlayPath::new(
            family.kind,
            drawn.iter().map(|s| s.point).collect(),
        ));

        for sample in drawn {
            let Some(step) = sample.step else { continue };
            if !family.tick_rule.is_tick(step) {
                continue;
            }
            self.build_tick(
                sample.point,
                bearing,
                leg.flip,
                params.tick_half_length_m,
                format_km(step as f64 * family.step_m),
                out,
            )?;
        }
        Ok(())
    }

    /// Cross-stroke `[inner, tick, outer]` perpendicular to the leg, with the
    /// label anchored at `outer`. `flip` mirrors the stroke so the label
    /// lands on the other side of the leg.
    fn build_tick(
        &self,
        tick: GeoPoint,
        leg_bearing: f64,
        flip: bool,
        half_length_m: f64,
        text: String,
        out: &mut OverlayGeometry,
    ) -> Result<(), OverlayError> {
        let s = if flip { -1.0 } else { 1.0 };
        let inner_bearing = normalize_bearing(leg_bearing + 90.0 * s);
        let outer_bearing = normalize_bearing(leg_bearing + 270.0 * s);

        let inner = self
            .geodesic
            .destination(tick, half_length_m, inner_bearing)
            .map_err(OverlayError::geodesic(inner_bearing))?;
        let outer = self
            .geodesic
            .destination(tick, half_length_m, outer_bearing)
            .map_err(OverlayError::geodesic(outer_bearing))?;

        out.paths
            .push(OverlayPath::new(PathKind::Tick, vec![inner, tick, outer]));
        out.labels.push(OverlayLabel {
            anchor: outer,
            tail: inner,
            outward_bearing: outer_bearing,
            text,
        });
        Ok(())
    }
}

impl GeometryBuilder for PsOverlayBuilder {
    fn build(&self, params: &OverlayParams) -> Result<OverlayGeometry, OverlayError> {
        params.validate()?;
        let azimuth = params.normalized_azimuth();

        let mut geometry = OverlayGeometry::default();
        self.build_ring(params, azimuth, &mut geometry)?;
        self.build_family(params, azimuth, &params.main_axis, &mut geometry)?;
        self.build_family(params, azimuth, &params.flight_lines, &mut geometry)?;

        debug!(
            "Built PS overlay at {} azimuth {:.2}°: {} paths, {} labels, {} points",
            params.center,
            azimuth,
            geometry.paths.len(),
            geometry.labels.len(),
            geometry.point_count()
        );
        Ok(geometry)
    }
}

/// Build with the default WGS84 builder.
pub fn build(params: &OverlayParams) -> Result<OverlayGeometry, OverlayError> {
    PsOverlayBuilder::default().build(params)
}

/// Kilometer label: integer when whole, one decimal otherwise.
pub fn format_km(distance_m: f64) -> String {
    let km = distance_m / 1000.0;
    if (km - km.round()).abs() < 1e-9 {
        format!("{}", km.round() as i64)
    } else {
        format!("{:.1}", km)
    }
}

// =================================== Tests ===================================
