//! Overlay build parameters
//!
//! The family constants (radius, step, skipped steps, tick rule, legs) are
//! plain data so one builder serves the ring, the main axis and the flight
//! lines alike.

use crate::core::coordinates::{GeoPoint, normalize_bearing};
use crate::error::OverlayError;
use crate::overlay::geometry::PathKind;
use crate::overlay::style::OverlayStyle;

pub const DEFAULT_RING_RADIUS_M: f64 = 1750.0;
pub const DEFAULT_MAIN_AXIS_LENGTH_M: f64 = 7000.0;
pub const DEFAULT_FLIGHT_LINE_LENGTH_M: f64 = 6000.0;
pub const MAIN_AXIS_STEP_M: f64 = 1000.0;
pub const FLIGHT_LINE_STEP_M: f64 = 500.0;
pub const DEFAULT_TICK_HALF_LENGTH_M: f64 = 250.0;
pub const RING_SAMPLES: usize = 301;
/// Largest accepted ring discretization
pub const MAX_RING_SAMPLES: usize = 3601;
/// Largest accepted number of marker steps on one leg
pub const MAX_STEPS_PER_LEG: usize = 1000;

/// Ring discretization
#[derive(Debug, Clone, PartialEq)]
pub struct RingSpec {
    pub radius_m: f64,
    /// Number of samples, both seam samples included
    pub samples: usize,
    /// Angular sweep covered by the samples, degrees
    pub sweep_deg: f64,
}

impl RingSpec {
    /// Angular spacing between consecutive samples
    pub fn spacing_deg(&self) -> f64 {
        self.sweep_deg / (self.samples.saturating_sub(1).max(1)) as f64
    }
}

impl Default for RingSpec {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RING_RADIUS_M,
            samples: RING_SAMPLES,
            sweep_deg: 360.0,
        }
    }
}

/// Which stepped samples carry a tick and a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRule {
    pub first_step: usize,
    pub every: usize,
}

impl TickRule {
    pub fn is_tick(&self, step: usize) -> bool {
        step >= self.first_step && step % self.every.max(1) == 0
    }
}

/// One leg of a family: bearing relative to the azimuth plus the side ticks
/// and labels are mirrored to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegSpec {
    pub bearing_offset_deg: f64,
    pub flip: bool,
}

impl LegSpec {
    pub const fn new(bearing_offset_deg: f64, flip: bool) -> Self {
        Self {
            bearing_offset_deg,
            flip,
        }
    }
}

/// A family of straight legs radiating from the overlay center
#[derive(Debug, Clone, PartialEq)]
pub struct LegFamily {
    pub kind: PathKind,
    pub length_m: f64,
    pub step_m: f64,
    /// Stepped samples with an index below this are not drawn
    pub skip_steps: usize,
    pub tick_rule: TickRule,
    pub legs: Vec<LegSpec>,
}

impl LegFamily {
    /// Two opposite legs, kilometer ticks on every step.
    pub fn main_axis(length_m: f64) -> Self {
        Self {
            kind: PathKind::MainAxis,
            length_m,
            step_m: MAIN_AXIS_STEP_M,
            skip_steps: 0,
            tick_rule: TickRule {
                first_step: 1,
                every: 1,
            },
            legs: vec![LegSpec::new(0.0, false), LegSpec::new(180.0, true)],
        }
    }

    /// Three legs at 45° spacing; the innermost 1.5 km is left out and
    /// ticks start at 2 km.
    pub fn flight_lines(length_m: f64) -> Self {
        Self {
            kind: PathKind::FlightLine,
            length_m,
            step_m: FLIGHT_LINE_STEP_M,
            skip_steps: 3,
            tick_rule: TickRule {
                first_step: 4,
                every: 2,
            },
            legs: vec![
                LegSpec::new(45.0, true),
                LegSpec::new(90.0, false),
                LegSpec::new(135.0, true),
            ],
        }
    }

    fn validate(&self, name: &str) -> Result<(), OverlayError> {
        positive(self.length_m, &format!("{name} length"))?;
        positive(self.step_m, &format!("{name} marker step"))?;
        let steps = (self.length_m / self.step_m).ceil();
        if steps > MAX_STEPS_PER_LEG as f64 {
            return Err(OverlayError::invalid_params(format!(
                "{name} needs {steps} marker steps, at most {MAX_STEPS_PER_LEG} allowed"
            )));
        }
        if self.legs.iter().any(|l| !l.bearing_offset_deg.is_finite()) {
            return Err(OverlayError::invalid_params(format!(
                "{name} leg bearing offsets must be finite"
            )));
        }
        Ok(())
    }
}

/// Immutable input of one overlay build
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayParams {
    /// WGS84 center
    pub center: GeoPoint,
    /// Clockwise rotation in degrees, any range
    pub azimuth: f64,
    pub ring: RingSpec,
    pub main_axis: LegFamily,
    pub flight_lines: LegFamily,
    pub tick_half_length_m: f64,
    pub style: OverlayStyle,
}

impl OverlayParams {
    pub fn new(center: GeoPoint, azimuth: f64) -> Self {
        Self {
            center,
            azimuth,
            ring: RingSpec::default(),
            main_axis: LegFamily::main_axis(DEFAULT_MAIN_AXIS_LENGTH_M),
            flight_lines: LegFamily::flight_lines(DEFAULT_FLIGHT_LINE_LENGTH_M),
            tick_half_length_m: DEFAULT_TICK_HALF_LENGTH_M,
            style: OverlayStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Azimuth reduced into [0, 360)
    pub fn normalized_azimuth(&self) -> f64 {
        normalize_bearing(self.azimuth)
    }

    /// Fail-fast checks run before any geodesic work.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if !self.center.is_valid() {
            return Err(OverlayError::invalid_params(format!(
                "center {} is not a finite geographic coordinate",
                self.center
            )));
        }
        if !self.azimuth.is_finite() {
            return Err(OverlayError::invalid_params(format!(
                "azimuth {} is not finite",
                self.azimuth
            )));
        }
        positive(self.ring.radius_m, "ring radius")?;
        if !(2..=MAX_RING_SAMPLES).contains(&self.ring.samples) {
            return Err(OverlayError::invalid_params(format!(
                "ring needs 2 to {MAX_RING_SAMPLES} samples, got {}",
                self.ring.samples
            )));
        }
        positive(self.ring.sweep_deg, "ring sweep")?;
        self.main_axis.validate("main axis")?;
        self.flight_lines.validate("flight line")?;
        positive(self.tick_half_length_m, "tick half length")?;
        Ok(())
    }
}

fn positive(value: f64, what: &str) -> Result<(), OverlayError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(OverlayError::invalid_params(format!(
            "{what} must be positive, got {value}"
        )))
    }
}
