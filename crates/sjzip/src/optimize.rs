//! Optional geometric metadata layer and the `SJZO` container.
//!
//! The mixed-radix payload is identical at every level; the level only
//! decides which auxiliary metadata rides along with it.

mod hilbert;
mod optimized;
mod quaternion;
mod scaler;

pub use hilbert::{
    COMPRESSED_SIZE as HILBERT_COMPRESSED_SIZE, DEFAULT_ORDER, HilbertCurve3D, MAX_ORDER,
    MAX_WIRE_INDEX,
};
pub use optimized::{
    CompressionStats, OPTIMIZED_FILE_HEADER_SIZE, OPTIMIZED_MAGIC, OPTIMIZED_RECORD_HEADER_SIZE,
    OptimizedCodec, OptimizedDotRecord, RecordGeometry,
};
pub use quaternion::{
    COMPONENT_SCALE, COMPRESSED_SIZE as QUATERNION_SIZE, PRECISION_BITS, Quaternion,
    QuaternionSpiralEncoder,
};
pub use scaler::{IntegerScaler, MAX_COORDS, PACKED_COORD_SIZE, ScalingConfig};

use crate::error::SjzError;
use crate::mixed_radix::DigitPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum OptimizationLevel {
    /// Metadata fields zeroed.
    Raw = 0,
    /// Quantized coordinates available through the coordinate sidecar.
    Scaled = 1,
    /// Same record metadata as [`OptimizationLevel::Scaled`].
    Packed = 2,
    /// Curve index and compressed quaternion stored in every record.
    #[default]
    Geometric = 3,
}

impl OptimizationLevel {
    pub const ALL: [OptimizationLevel; 4] = [
        OptimizationLevel::Raw,
        OptimizationLevel::Scaled,
        OptimizationLevel::Packed,
        OptimizationLevel::Geometric,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether records carry the curve index and quaternion.
    pub fn has_geometry(self) -> bool {
        self >= OptimizationLevel::Geometric
    }

    /// Whether per-chunk coordinates can be quantized.
    pub fn has_scaling(self) -> bool {
        self >= OptimizationLevel::Scaled
    }

    /// Only level 3 tolerates digits outside the front order.
    pub fn digit_policy(self) -> DigitPolicy {
        if self.has_geometry() {
            DigitPolicy::DegradeToSentinel
        } else {
            DigitPolicy::Strict
        }
    }
}

impl TryFrom<u8> for OptimizationLevel {
    type Error = SjzError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(OptimizationLevel::Raw),
            1 => Ok(OptimizationLevel::Scaled),
            2 => Ok(OptimizationLevel::Packed),
            3 => Ok(OptimizationLevel::Geometric),
            other => Err(SjzError::InvalidLevel(other)),
        }
    }
}
