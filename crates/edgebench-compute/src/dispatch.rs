//! Dispatch and read-back.
//!
//! One kernel run: enqueue with the computed work sizes, block on the
//! completion event, take the profiling timestamps, then block on a full
//! read-back of the output image. There is no timeout; a hung device stalls
//! the run.

use serde::Serialize;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::backend::DeviceSession;
use crate::sizing::WorkSizes;
use crate::transfer;
use crate::{ComputeError, ComputeResult};

/// Device-side execution timestamps of one completed command, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfilingResult {
    pub start_ns: u64,
    pub end_ns: u64,
}

impl ProfilingResult {
    pub fn new(start_ns: u64, end_ns: u64) -> Self {
        Self { start_ns, end_ns }
    }

    /// `end - start`, zero if the clock went backwards.
    pub fn elapsed_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }

    /// Elapsed time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ns() as f64 * 1e-9
    }
}

/// Runs the program once and reads the output image back.
///
/// Any enqueue or wait failure is a [`ComputeError::Dispatch`] for this
/// device's run.
pub fn run_once<S: DeviceSession>(
    session: &S,
    program: &S::Program,
    sizes: &WorkSizes,
    input: &S::Image,
    output: &S::Image,
    width: u32,
    height: u32,
) -> ComputeResult<(ProfilingResult, Vec<u8>)> {
    trace!(?sizes, width, height, "run_once");

    if !sizes.covers(width as usize, height as usize) {
        return Err(ComputeError::Dispatch(format!(
            "work sizes {sizes:?} do not cover {width}x{height}"
        )));
    }
    let w = i32::try_from(width).map_err(|_| ComputeError::InvalidDimensions(width, height))?;
    let h = i32::try_from(height).map_err(|_| ComputeError::InvalidDimensions(width, height))?;

    let timing = session.execute(program, sizes, input, output, w, h)?;
    debug!(elapsed_ns = timing.elapsed_ns(), "kernel complete");

    let pixels = transfer::download(session, output, width, height)?;
    Ok((timing, pixels))
}
