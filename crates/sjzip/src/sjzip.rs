//! SJZIP: a reversible transform between text over a fixed extended alphabet
//! and a compact binary container.
//!
//! - Alphabet and per-front permutations ("front orders")
//! - Mixed-radix packing of every chunk into one big-endian integer
//! - The `SJZ1` container and its JSON exchange form
//! - The optional `SJZO` container with quantized geometric metadata
//!
//! All lookup tables are built once on first use and are read-only afterwards,
//! so codecs can be shared freely between threads.

mod alphabet;
mod codec;
mod config;
mod dot;
mod error;
mod front_order;
mod io;
mod mixed_radix;
mod optimize;
mod record;
mod spiral;

pub use alphabet::*;
pub use codec::*;
pub use config::*;
pub use dot::*;
pub use error::*;
pub use front_order::*;
pub use io::*;
pub use mixed_radix::*;
pub use optimize::*;
pub use record::*;
pub use spiral::*;
