//! Octant-recursive 3-D space-filling index.
//!
//! At each level the remaining cube is halved along every axis and the
//! octant holding the point contributes `octant * n^3` to the index, where
//! `n` is the half-size at that level (bit 0 of the octant is x, bit 1 y,
//! bit 2 z). The mapping is a bijection between `[0, 2^order)^3` and
//! `[0, 2^(3 * order))`.

use crate::error::{Result, SjzError};
use crate::spiral::SpiralCoordinate;

pub const MAX_ORDER: u32 = 10;
pub const DEFAULT_ORDER: u32 = 8;

/// 3-byte index plus 2-byte time.
pub const COMPRESSED_SIZE: usize = 5;

/// Largest index that fits the 3-byte wire field.
pub const MAX_WIRE_INDEX: u64 = (1 << 24) - 1;

const TIME_SCALE: f64 = 65535.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HilbertCurve3D {
    order: u32,
    max_coord: u32,
    total_points: u64,
}

impl Default for HilbertCurve3D {
    fn default() -> Self {
        Self::build(DEFAULT_ORDER)
    }
}

impl HilbertCurve3D {
    pub fn new(order: u32) -> Result<Self> {
        if !(1..=MAX_ORDER).contains(&order) {
            return Err(SjzError::InvalidConfig(format!(
                "Hilbert order must be between 1 and {MAX_ORDER}, got {order}"
            )));
        }
        Ok(Self::build(order))
    }

    fn build(order: u32) -> Self {
        Self {
            order,
            max_coord: (1 << order) - 1,
            total_points: 1 << (3 * order),
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Largest coordinate on each axis.
    pub fn max_coord(&self) -> u32 {
        self.max_coord
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn coords_to_index(&self, [x, y, z]: [u32; 3]) -> Result<u64> {
        if x > self.max_coord || y > self.max_coord || z > self.max_coord {
            return Err(SjzError::field_out_of_range(
                "hilbert coordinates",
                format!("({x}, {y}, {z}) not in [0, {}]", self.max_coord),
            ));
        }

        let (mut x, mut y, mut z) = (u64::from(x), u64::from(y), u64::from(z));
        let mut index = 0u64;
        for level in 0..self.order {
            let n = 1u64 << (self.order - level - 1);
            let mut octant = 0u64;
            if x >= n {
                octant |= 1;
                x -= n;
            }
            if y >= n {
                octant |= 2;
                y -= n;
            }
            if z >= n {
                octant |= 4;
                z -= n;
            }
            index += octant * n * n * n;
        }
        Ok(index)
    }

    pub fn index_to_coords(&self, index: u64) -> Result<[u32; 3]> {
        if index >= self.total_points {
            return Err(SjzError::field_out_of_range(
                "hilbert_index",
                format!("{index} not in [0, {})", self.total_points),
            ));
        }

        let (mut x, mut y, mut z) = (0u32, 0u32, 0u32);
        for level in 0..self.order {
            let n = 1u64 << (self.order - level - 1);
            let octant = (index / (n * n * n)) % 8;
            if octant & 1 != 0 {
                x += n as u32;
            }
            if octant & 2 != 0 {
                y += n as u32;
            }
            if octant & 4 != 0 {
                z += n as u32;
            }
        }
        Ok([x, y, z])
    }

    /// Grid point of a normalized coordinate; each axis is truncated onto the grid.
    pub fn grid_point(&self, coordinate: SpiralCoordinate) -> [u32; 3] {
        let max = f64::from(self.max_coord);
        [coordinate.x, coordinate.y, coordinate.z]
            .map(|value| ((value * max) as u32).min(self.max_coord))
    }

    /// Pack (x, y, z) as a 3-byte curve index followed by `t` as 16-bit fixed point.
    pub fn compress_coordinates(&self, coordinate: SpiralCoordinate) -> Result<[u8; COMPRESSED_SIZE]> {
        let index = self.coords_to_index(self.grid_point(coordinate))?;
        if index > MAX_WIRE_INDEX {
            return Err(SjzError::field_out_of_range(
                "hilbert_index",
                format!("{index} does not fit in 3 bytes"),
            ));
        }

        let time = (coordinate.t.clamp(0.0, 1.0) * TIME_SCALE) as u16;
        let mut out = [0u8; COMPRESSED_SIZE];
        out[..3].copy_from_slice(&index.to_be_bytes()[5..]);
        out[3..].copy_from_slice(&time.to_be_bytes());
        Ok(out)
    }

    pub fn decompress_coordinates(&self, bytes: &[u8]) -> Result<SpiralCoordinate> {
        let bytes: [u8; COMPRESSED_SIZE] =
            bytes.try_into().map_err(|_| SjzError::SizeMismatch {
                expected: COMPRESSED_SIZE,
                actual: bytes.len(),
            })?;
        let index = u64::from(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]));
        let time = u16::from_be_bytes([bytes[3], bytes[4]]);

        let [x, y, z] = self.index_to_coords(index)?;
        let max = f64::from(self.max_coord);
        Ok(SpiralCoordinate {
            x: f64::from(x) / max,
            y: f64::from(y) / max,
            z: f64::from(z) / max,
            t: f64::from(time) / TIME_SCALE,
        })
    }
}
