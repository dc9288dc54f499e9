//! Conical-spiral embedding of alphabet indices.
//!
//! Index `i` sits at parameter `s = i / (N - 1)` along a spiral that turns
//! [`MAX_ROTATIONS`] times while its radius grows from [`INITIAL_RADIUS`] to
//! [`FINAL_RADIUS`] and its depth from 0 to [`MAX_DEPTH`]. The resulting
//! coordinates are metadata only; decoding never reads them.

use std::f64::consts::TAU;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::error::{Result, SjzError};

pub const MAX_ROTATIONS: f64 = 5.0;
pub const INITIAL_RADIUS: f64 = 0.01;
pub const FINAL_RADIUS: f64 = 0.5;
pub const MAX_DEPTH: f64 = 1.0;
/// Spiral axis in (x, y, z).
pub const FRONT_CENTER: [f64; 3] = [0.5, 0.5, 0.5];

static SPIRAL: OnceLock<SpiralMapper> = OnceLock::new();

/// Four auxiliary coordinates, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpiralCoordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl SpiralCoordinate {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        t: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.t]
    }

    pub fn from_array([x, y, z, t]: [f64; 4]) -> Self {
        Self { x, y, z, t }
    }

    /// True when every component is a number in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }

    /// Reject NaN and anything outside `[0, 1]`.
    pub fn ensure_normalized(&self) -> Result<()> {
        if self.is_normalized() {
            Ok(())
        } else {
            Err(SjzError::field_out_of_range(
                "coordinates",
                format!("{:?} must lie in [0, 1]", self.to_array()),
            ))
        }
    }

    /// Round every component to 6 decimal places.
    pub fn rounded(self) -> Self {
        let round = |v: f64| (v * 1e6).round() / 1e6;
        Self {
            x: round(self.x),
            y: round(self.y),
            z: round(self.z),
            t: round(self.t),
        }
    }
}

/// Precomputed spatial properties of a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiralProperties {
    pub symbol: char,
    pub index: u16,
    pub angle_deg: f64,
    pub angle_rad: f64,
    pub radius: f64,
    pub depth: f64,
    pub time: f64,
    /// Approximate arc length from index 0.
    pub distance: f64,
    pub coordinate: SpiralCoordinate,
}

impl SpiralProperties {
    /// Angular position within one turn, in `[0, 1)`.
    pub fn time_fraction(&self) -> f64 {
        self.angle_deg.rem_euclid(360.0) / 360.0
    }
}

#[derive(Debug)]
pub struct SpiralMapper {
    properties: Vec<SpiralProperties>,
}

impl SpiralMapper {
    pub fn get() -> &'static SpiralMapper {
        SPIRAL.get_or_init(|| Self::build(Alphabet::get()))
    }

    fn build(alphabet: &Alphabet) -> Self {
        let steps = alphabet.len().saturating_sub(1).max(1) as f64;
        let total_angle = MAX_ROTATIONS * TAU;
        let dr = (FINAL_RADIUS - INITIAL_RADIUS) / steps;
        let dtheta = total_angle / steps;
        let dz = MAX_DEPTH / steps;

        let properties = alphabet
            .symbols()
            .iter()
            .enumerate()
            .map(|(index, symbol)| {
                let s = index as f64 / steps;
                let angle_rad = s * total_angle;
                let radius = INITIAL_RADIUS + s * (FINAL_RADIUS - INITIAL_RADIUS);
                let depth = s * MAX_DEPTH;

                let distance = if index == 0 {
                    0.0
                } else {
                    let r_prev = INITIAL_RADIUS
                        + ((index - 1) as f64 / steps) * (FINAL_RADIUS - INITIAL_RADIUS);
                    let ds = (dr.powi(2) + (r_prev * dtheta).powi(2) + dz.powi(2)).sqrt();
                    ds * index as f64
                };

                let coordinate = SpiralCoordinate {
                    x: (FRONT_CENTER[0] + radius * angle_rad.cos()).clamp(0.0, 1.0),
                    y: (FRONT_CENTER[1] + radius * angle_rad.sin()).clamp(0.0, 1.0),
                    z: (FRONT_CENTER[2] - depth).clamp(0.0, 1.0),
                    t: depth.clamp(0.0, 1.0),
                };

                SpiralProperties {
                    symbol: *symbol,
                    index: index as u16,
                    angle_deg: angle_rad.to_degrees(),
                    angle_rad,
                    radius,
                    depth,
                    time: depth,
                    distance,
                    coordinate,
                }
            })
            .collect();

        Self { properties }
    }

    /// Cached properties of `ch`.
    pub fn get_properties(&self, ch: char) -> Result<&SpiralProperties> {
        let index = Alphabet::get().ensure_supported(ch)?;
        Ok(&self.properties[usize::from(index)])
    }

    pub fn properties_at(&self, index: u16) -> Option<&SpiralProperties> {
        self.properties.get(usize::from(index))
    }

    pub fn coordinate(&self, ch: char) -> Result<SpiralCoordinate> {
        Ok(self.get_properties(ch)?.coordinate)
    }

    pub fn time_fraction(&self, ch: char) -> Result<f64> {
        Ok(self.get_properties(ch)?.time_fraction())
    }
}
