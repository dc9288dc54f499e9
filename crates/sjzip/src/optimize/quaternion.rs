//! Quantized quaternion view of a spiral position.
//!
//! `(angle, radius, depth)` is folded into a unit quaternion; only x, y and z
//! are stored, as 16-bit fixed point over `[-1, 1]`. `w` is rebuilt from the
//! unit-norm constraint on decode, so its sign is not preserved.

use std::f64::consts::TAU;

use crate::error::{Result, SjzError};
use crate::spiral::SpiralMapper;

/// Bytes of a compressed quaternion (x, y, z as `u16`).
pub const COMPRESSED_SIZE: usize = 6;

pub const PRECISION_BITS: u32 = 16;

/// Weight of radius and depth inside the vector part.
pub const COMPONENT_SCALE: f64 = 0.1;

const MAX_VALUE: f64 = ((1u32 << PRECISION_BITS) - 1) as f64;
const NORM_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit-length copy; a near-zero quaternion becomes the identity.
    pub fn normalize(&self) -> Self {
        let norm = self.norm();
        if norm.is_nan() || norm < NORM_EPSILON {
            return Self::IDENTITY;
        }
        Self {
            w: self.w / norm,
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuaternionSpiralEncoder {
    max_rotations: f64,
    max_angle: f64,
}

impl Default for QuaternionSpiralEncoder {
    fn default() -> Self {
        Self::build(crate::spiral::MAX_ROTATIONS)
    }
}

impl QuaternionSpiralEncoder {
    pub fn new(max_rotations: f64) -> Result<Self> {
        if max_rotations.is_nan() || max_rotations <= 0.0 || max_rotations > 100.0 {
            return Err(SjzError::InvalidConfig(format!(
                "max_rotations must be in (0, 100], got {max_rotations}"
            )));
        }
        Ok(Self::build(max_rotations))
    }

    fn build(max_rotations: f64) -> Self {
        Self {
            max_rotations,
            max_angle: max_rotations * TAU,
        }
    }

    pub fn max_rotations(&self) -> f64 {
        self.max_rotations
    }

    pub fn max_angle(&self) -> f64 {
        self.max_angle
    }

    pub fn angle_radius_to_quaternion(&self, angle_rad: f64, radius: f64, depth: f64) -> Quaternion {
        let radius = radius.clamp(0.0, 1.0);
        let depth = depth.clamp(0.0, 1.0);
        let half = angle_rad / 2.0;
        Quaternion {
            w: half.cos(),
            x: radius * angle_rad.cos() * COMPONENT_SCALE,
            y: radius * angle_rad.sin() * COMPONENT_SCALE,
            z: half.sin() + depth * COMPONENT_SCALE,
        }
        .normalize()
    }

    /// Approximate inverse of [`Self::angle_radius_to_quaternion`].
    ///
    /// The angle is recovered modulo `4π` and radius and depth are clamped to
    /// `[0, 1]`; normalization loses the exact scale of both.
    pub fn quaternion_to_angle_radius(&self, quaternion: &Quaternion) -> (f64, f64, f64) {
        let q = quaternion.normalize();
        let half = q.z.atan2(q.w);
        let radius = (q.x / COMPONENT_SCALE).hypot(q.y / COMPONENT_SCALE);
        let depth = (q.z - half.sin()) / COMPONENT_SCALE;
        (2.0 * half, radius.clamp(0.0, 1.0), depth.clamp(0.0, 1.0))
    }

    /// Quantize the vector part of the normalized quaternion to three `u16`s.
    pub fn compress(&self, quaternion: &Quaternion) -> [u8; COMPRESSED_SIZE] {
        let q = quaternion.normalize();
        let quantize =
            |value: f64| ((value + 1.0) * 0.5 * MAX_VALUE).round().clamp(0.0, MAX_VALUE) as u16;

        let mut out = [0u8; COMPRESSED_SIZE];
        out[0..2].copy_from_slice(&quantize(q.x).to_be_bytes());
        out[2..4].copy_from_slice(&quantize(q.y).to_be_bytes());
        out[4..6].copy_from_slice(&quantize(q.z).to_be_bytes());
        out
    }

    pub fn decompress(&self, bytes: &[u8]) -> Result<Quaternion> {
        let bytes: [u8; COMPRESSED_SIZE] =
            bytes.try_into().map_err(|_| SjzError::SizeMismatch {
                expected: COMPRESSED_SIZE,
                actual: bytes.len(),
            })?;
        let dequantize =
            |hi: u8, lo: u8| f64::from(u16::from_be_bytes([hi, lo])) / MAX_VALUE * 2.0 - 1.0;
        let mut x = dequantize(bytes[0], bytes[1]);
        let mut y = dequantize(bytes[2], bytes[3]);
        let mut z = dequantize(bytes[4], bytes[5]);

        let w_squared = 1.0 - (x * x + y * y + z * z);
        let w = if w_squared < 0.0 {
            let norm = (x * x + y * y + z * z).sqrt();
            x /= norm;
            y /= norm;
            z /= norm;
            0.0
        } else {
            w_squared.sqrt()
        };
        Ok(Quaternion { w, x, y, z })
    }

    /// Compressed quaternion for the spiral position of `ch`.
    pub fn compress_symbol_position(&self, ch: char) -> Result<[u8; COMPRESSED_SIZE]> {
        let props = SpiralMapper::get().get_properties(ch)?;
        let quaternion = self.angle_radius_to_quaternion(props.angle_rad, props.radius, props.depth);
        Ok(self.compress(&quaternion))
    }
}
