//! # edgebench-core
//!
//! Core types shared by the edgebench crates.
//!
//! - [`HostImage`] - Tightly packed RGBA8 pixel buffer, the only layout the
//!   device pipeline accepts
//! - [`codec`] - Decode/encode glue over the `image` crate
//! - [`filter`] - Host-side reference "find edges" filter
//! - [`CoreError`] - Error type for the above
//!
//! ## Crate Structure
//!
//! ```text
//! edgebench-core (this crate)
//!    ^
//!    |
//!    +-- edgebench-compute (device registry, dispatch, orchestrator)
//!    +-- edgebench-cli (binary)
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Adds `filter::find_edges_parallel`, a rayon variant of the
//!   reference filter used by the benchmarks

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod codec;
pub mod error;
pub mod filter;
pub mod image;

pub use error::{CoreError, CoreResult};
pub use filter::find_edges;
pub use crate::image::{HostImage, CHANNELS};
