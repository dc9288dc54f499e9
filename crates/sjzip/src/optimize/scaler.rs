//! Integer quantization of spiral coordinates into a single 64-bit word.
//!
//! Bit layout of a packed coordinate (big-endian on the wire):
//!
//! ```text
//! 63..60  unused
//! 59..44  x   (up to 16 bits)
//! 43..28  y   (up to 16 bits)
//! 27..12  z   (up to 16 bits)
//! 11..0   t   (up to 12 bits)
//! ```

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SjzError};
use crate::spiral::SpiralCoordinate;

/// Ceiling on the number of coordinates in one batch.
pub const MAX_COORDS: usize = 10_000;

/// Bytes per packed coordinate.
pub const PACKED_COORD_SIZE: usize = 8;

const X_SHIFT: u32 = 44;
const Y_SHIFT: u32 = 28;
const Z_SHIFT: u32 = 12;
const XYZ_MASK: u64 = 0xFFFF;
const T_MASK: u64 = 0x0FFF;

const MAX_XYZ_BITS: u8 = 16;
const MAX_T_BITS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub x_bits: u8,
    pub y_bits: u8,
    pub z_bits: u8,
    pub t_bits: u8,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub z_range: (f64, f64),
    pub t_range: (f64, f64),
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            x_bits: 16,
            y_bits: 16,
            z_bits: 16,
            t_bits: 12,
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.0),
            z_range: (0.0, 1.0),
            t_range: (0.0, 1.0),
        }
    }
}

impl ScalingConfig {
    /// Bit widths must fit their slot in the packed word; ranges must be finite and non-empty.
    pub fn validate(&self) -> Result<()> {
        let widths = [
            ("x_bits", self.x_bits, MAX_XYZ_BITS),
            ("y_bits", self.y_bits, MAX_XYZ_BITS),
            ("z_bits", self.z_bits, MAX_XYZ_BITS),
            ("t_bits", self.t_bits, MAX_T_BITS),
        ];
        for (name, bits, max) in widths {
            if !(1..=max).contains(&bits) {
                return Err(SjzError::InvalidConfig(format!(
                    "{name} must be between 1 and {max}, got {bits}"
                )));
            }
        }

        for (name, (lo, hi)) in self.ranges() {
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(SjzError::InvalidConfig(format!(
                    "invalid {name}: ({lo}, {hi})"
                )));
            }
        }
        Ok(())
    }

    fn bits(&self) -> [u8; 4] {
        [self.x_bits, self.y_bits, self.z_bits, self.t_bits]
    }

    fn ranges(&self) -> [(&'static str, (f64, f64)); 4] {
        [
            ("x_range", self.x_range),
            ("y_range", self.y_range),
            ("z_range", self.z_range),
            ("t_range", self.t_range),
        ]
    }
}

/// Scales coordinates to integers and back.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerScaler {
    config: ScalingConfig,
    max: [u32; 4],
    scale: [f64; 4],
}

impl Default for IntegerScaler {
    fn default() -> Self {
        Self::build(ScalingConfig::default())
    }
}

impl IntegerScaler {
    pub fn new(config: ScalingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ScalingConfig) -> Self {
        let max = config.bits().map(|bits| (1u32 << bits) - 1);
        let ranges = config.ranges();
        let scale = std::array::from_fn(|axis| {
            let (_, (lo, hi)) = ranges[axis];
            f64::from(max[axis]) / (hi - lo)
        });
        Self { config, max, scale }
    }

    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    /// Largest integer per axis, in x, y, z, t order.
    pub fn max_values(&self) -> [u32; 4] {
        self.max
    }

    /// Clamp each axis to its range and scale it down to an integer.
    pub fn scale_to_integer(&self, coordinate: SpiralCoordinate) -> [u32; 4] {
        let ranges = self.config.ranges();
        let values = coordinate.to_array();
        std::array::from_fn(|axis| {
            let (_, (lo, hi)) = ranges[axis];
            let clamped = values[axis].clamp(lo, hi);
            // Float-to-int casts saturate, and NaN becomes 0.
            (((clamped - lo) * self.scale[axis]) as u32).min(self.max[axis])
        })
    }

    pub fn scale_from_integer(&self, values: [u32; 4]) -> SpiralCoordinate {
        let ranges = self.config.ranges();
        SpiralCoordinate::from_array(std::array::from_fn(|axis| {
            let (_, (lo, _)) = ranges[axis];
            f64::from(values[axis]) / self.scale[axis] + lo
        }))
    }

    pub fn pack(&self, coordinate: SpiralCoordinate) -> [u8; PACKED_COORD_SIZE] {
        let [x, y, z, t] = self.scale_to_integer(coordinate).map(u64::from);
        let packed = ((x & XYZ_MASK) << X_SHIFT)
            | ((y & XYZ_MASK) << Y_SHIFT)
            | ((z & XYZ_MASK) << Z_SHIFT)
            | (t & T_MASK);
        packed.to_be_bytes()
    }

    pub fn unpack(&self, bytes: &[u8]) -> Result<SpiralCoordinate> {
        let bytes: [u8; PACKED_COORD_SIZE] =
            bytes.try_into().map_err(|_| SjzError::SizeMismatch {
                expected: PACKED_COORD_SIZE,
                actual: bytes.len(),
            })?;
        let packed = u64::from_be_bytes(bytes);
        let values = [
            (packed >> X_SHIFT) & XYZ_MASK,
            (packed >> Y_SHIFT) & XYZ_MASK,
            (packed >> Z_SHIFT) & XYZ_MASK,
            packed & T_MASK,
        ]
        .map(|value| value as u32);
        Ok(self.scale_from_integer(values))
    }

    /// Count-prefixed batch of packed coordinates.
    pub fn pack_batch(&self, coordinates: &[SpiralCoordinate]) -> Result<Vec<u8>> {
        if coordinates.len() > MAX_COORDS {
            return Err(SjzError::TooManyCoordinates {
                count: coordinates.len(),
                max: MAX_COORDS,
            });
        }

        let mut out = Vec::with_capacity(4 + coordinates.len() * PACKED_COORD_SIZE);
        out.put_u32(coordinates.len() as u32);
        for coordinate in coordinates {
            out.put_slice(&self.pack(*coordinate));
        }
        Ok(out)
    }

    pub fn unpack_batch(&self, data: &[u8]) -> Result<Vec<SpiralCoordinate>> {
        let mut buf = data;
        if buf.remaining() < 4 {
            return Err(SjzError::truncated("coordinate count", 4, buf.remaining()));
        }
        let count = buf.get_u32() as usize;
        if count > MAX_COORDS {
            return Err(SjzError::TooManyCoordinates {
                count,
                max: MAX_COORDS,
            });
        }

        let expected = 4 + count * PACKED_COORD_SIZE;
        if data.len() != expected {
            return Err(SjzError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        buf.chunks_exact(PACKED_COORD_SIZE)
            .map(|packed| self.unpack(packed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_packed_layout() {
        let scaler = IntegerScaler::default();
        assert_eq!(scaler.max_values(), [65535, 65535, 65535, 4095]);

        let full = scaler.pack(SpiralCoordinate::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(u64::from_be_bytes(full), 0x0FFF_FFFF_FFFF_FFFF);

        let only_t = scaler.pack(SpiralCoordinate::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(u64::from_be_bytes(only_t), 0xFFF);

        let only_x = scaler.pack(SpiralCoordinate::new(1.0, 0.0, 0.0, 0.0));
        assert_eq!(u64::from_be_bytes(only_x), 0xFFFF << 44);
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        let scaler = IntegerScaler::default();
        assert_eq!(
            scaler.scale_to_integer(SpiralCoordinate::new(-3.0, 7.0, f64::NAN, 0.5)),
            [0, 65535, 0, 2047]
        );
    }

    #[test]
    fn test_custom_ranges() {
        let config = ScalingConfig {
            x_bits: 8,
            x_range: (-1.0, 1.0),
            ..ScalingConfig::default()
        };
        let scaler = IntegerScaler::new(config).unwrap();
        let [x, ..] = scaler.scale_to_integer(SpiralCoordinate::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(x, 127);
        let restored = scaler.unpack(&scaler.pack(SpiralCoordinate::new(-1.0, 0.0, 0.0, 0.0))).unwrap();
        assert_eq!(restored.x, -1.0);
    }

    #[test]
    fn test_config_validation() {
        let bad_bits = ScalingConfig {
            t_bits: 13,
            ..ScalingConfig::default()
        };
        assert!(IntegerScaler::new(bad_bits).is_err());

        let zero_bits = ScalingConfig {
            y_bits: 0,
            ..ScalingConfig::default()
        };
        assert!(IntegerScaler::new(zero_bits).is_err());

        let empty_range = ScalingConfig {
            z_range: (0.5, 0.5),
            ..ScalingConfig::default()
        };
        let err = IntegerScaler::new(empty_range).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let infinite = ScalingConfig {
            x_range: (0.0, f64::INFINITY),
            ..ScalingConfig::default()
        };
        assert!(IntegerScaler::new(infinite).is_err());
    }

    #[test]
    fn test_unpack_requires_eight_bytes() {
        assert_eq!(
            IntegerScaler::default().unpack(&[0; 7]),
            Err(SjzError::SizeMismatch {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_batch() {
        let scaler = IntegerScaler::default();
        let coordinates = vec![
            SpiralCoordinate::new(0.0, 0.0, 0.0, 0.0),
            SpiralCoordinate::new(1.0, 1.0, 1.0, 1.0),
        ];
        let packed = scaler.pack_batch(&coordinates).unwrap();
        assert_eq!(packed.len(), 4 + 2 * PACKED_COORD_SIZE);
        assert_eq!(&packed[..4], &[0, 0, 0, 2]);
        assert_eq!(scaler.unpack_batch(&packed).unwrap(), coordinates);

        assert_eq!(scaler.unpack_batch(&[0, 0, 0, 0]).unwrap(), vec![]);
    }

    #[test]
    fn test_batch_limits() {
        let scaler = IntegerScaler::default();
        let too_many = vec![SpiralCoordinate::ZERO; MAX_COORDS + 1];
        assert_eq!(
            scaler.pack_batch(&too_many),
            Err(SjzError::TooManyCoordinates {
                count: MAX_COORDS + 1,
                max: MAX_COORDS
            })
        );

        let declared = ((MAX_COORDS + 1) as u32).to_be_bytes();
        assert!(matches!(
            scaler.unpack_batch(&declared),
            Err(SjzError::TooManyCoordinates { .. })
        ));

        let mut packed = scaler.pack_batch(&[SpiralCoordinate::ZERO]).unwrap();
        packed.push(0);
        assert_eq!(
            scaler.unpack_batch(&packed),
            Err(SjzError::SizeMismatch {
                expected: 12,
                actual: 13
            })
        );
        assert!(matches!(
            scaler.unpack_batch(&[0, 0]),
            Err(SjzError::Truncated { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_quantization_error_is_one_step(
            x in 0.0..=1.0f64,
            y in 0.0..=1.0f64,
            z in 0.0..=1.0f64,
            t in 0.0..=1.0f64,
        ) {
            let scaler = IntegerScaler::default();
            let coordinate = SpiralCoordinate::new(x, y, z, t);
            let restored = scaler.unpack(&scaler.pack(coordinate)).unwrap();
            let steps = scaler.max_values();
            for (axis, (original, restored)) in coordinate
                .to_array()
                .iter()
                .zip(restored.to_array())
                .enumerate()
            {
                let step = 1.0 / f64::from(steps[axis]);
                prop_assert!(restored <= *original + 1e-12);
                prop_assert!(*original - restored < step + 1e-12);
            }
        }
    }
}
