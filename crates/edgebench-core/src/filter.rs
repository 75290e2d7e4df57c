//! Host-side reference edge filter.
//!
//! A 3x3 "find edges" convolution: every colour channel becomes
//! `8 * centre - sum(8 neighbours)`, clamped to `0..=255`. Border pixels read
//! their neighbours with clamp-to-edge addressing, the same boundary policy the
//! device sampler uses by default. Alpha is copied through untouched so the
//! output stays visible.
//!
//! [`find_edges`] is the sequential baseline the device kernels are timed
//! against, not a general convolution engine. With the `parallel` feature,
//! `find_edges_parallel` produces the same output over rayon rows; it is
//! only used for benchmarking.
//!
//! # Example
//!
//! ```rust
//! use edgebench_core::{find_edges, HostImage};
//!
//! // A flat image has no edges.
//! let flat = HostImage::from_rgba8(4, 4, vec![90; 64]).unwrap();
//! let edges = find_edges(&flat);
//! assert_eq!(edges.pixel(1, 1), [0, 0, 0, 90]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::{HostImage, CHANNELS};

/// Kernel weights, row-major.
pub const FIND_EDGES: [i32; 9] = [
    -1, -1, -1,
    -1,  8, -1,
    -1, -1, -1,
];

/// Runs the reference filter over `src` on the calling thread and returns a
/// new image of the same size.
pub fn find_edges(src: &HostImage) -> HostImage {
    let (width, height) = src.dimensions();
    trace!(width, height, "find_edges");

    let mut dst = HostImage::new(width, height);
    let pitch = src.row_pitch();
    if pitch == 0 {
        return dst;
    }

    dst.data_mut()
        .chunks_mut(pitch)
        .enumerate()
        .for_each(|(y, row)| filter_row(src, y, row));

    dst
}

/// Same output as [`find_edges`], rows spread over the rayon pool.
#[cfg(feature = "parallel")]
pub fn find_edges_parallel(src: &HostImage) -> HostImage {
    let (width, height) = src.dimensions();
    trace!(width, height, "find_edges_parallel");

    let mut dst = HostImage::new(width, height);
    let pitch = src.row_pitch();
    if pitch == 0 {
        return dst;
    }

    dst.data_mut()
        .par_chunks_mut(pitch)
        .enumerate()
        .for_each(|(y, row)| filter_row(src, y, row));

    dst
}

#[cfg(test)]
thread_local! {
    static ROWS_FILTERED: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

fn filter_row(src: &HostImage, y: usize, row: &mut [u8]) {
    #[cfg(test)]
    ROWS_FILTERED.with(|n| n.set(n.get() + 1));

    let w = src.width() as usize;
    let h = src.height() as usize;
    let data = src.data();

    for x in 0..w {
        let mut sums = [0i32; 3];

        for ky in 0..3 {
            let sy = (y + ky).saturating_sub(1).min(h - 1);
            for kx in 0..3 {
                let sx = (x + kx).saturating_sub(1).min(w - 1);
                let weight = FIND_EDGES[ky * 3 + kx];
                let idx = (sy * w + sx) * CHANNELS;
                for (c, sum) in sums.iter_mut().enumerate() {
                    *sum += data[idx + c] as i32 * weight;
                }
            }
        }

        let out = x * CHANNELS;
        for (c, sum) in sums.iter().enumerate() {
            row[out + c] = (*sum).clamp(0, 255) as u8;
        }
        row[out + 3] = data[(y * w + x) * CHANNELS + 3];
    }
}
