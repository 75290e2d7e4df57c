//! Workgroup sizing policy.
//!
//! The local size starts from a fixed per-class heuristic: one 128-wide row
//! for CPUs, a 16x16 tile for everything else. It is then clamped to the
//! device's reported per-axis and per-group limits. The global size is the
//! image extent rounded up to a multiple of the local size on each axis, so
//! the kernel must ignore work-items outside the image.

use serde::Serialize;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::registry::{DeviceKind, DeviceLimits};

/// Local size for CPU devices.
pub const CPU_LOCAL_SIZE: [usize; 2] = [128, 1];

/// Local size for GPUs and accelerators.
pub const GPU_LOCAL_SIZE: [usize; 2] = [16, 16];

/// Two-dimensional dispatch sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkSizes {
    pub local: [usize; 2],
    pub global: [usize; 2],
}

impl WorkSizes {
    /// Work-groups per axis.
    pub fn groups(&self) -> [usize; 2] {
        [self.global[0] / self.local[0], self.global[1] / self.local[1]]
    }

    /// Whether the sizes cover `width x height` with whole groups.
    pub fn covers(&self, width: usize, height: usize) -> bool {
        self.local.iter().all(|&l| l > 0)
            && self.global[0] >= width
            && self.global[1] >= height
            && self.global[0] % self.local[0] == 0
            && self.global[1] % self.local[1] == 0
    }
}

/// Heuristic local size for a device class, before limits are applied.
pub fn compute_local_size(kind: DeviceKind) -> [usize; 2] {
    match kind {
        DeviceKind::Cpu => CPU_LOCAL_SIZE,
        _ => GPU_LOCAL_SIZE,
    }
}

/// Rounds `extent` up to the next multiple of `local`.
///
/// A zero `local` is treated as 1.
#[inline]
pub fn round_up(local: usize, extent: usize) -> usize {
    let local = local.max(1);
    let r = extent % local;
    if r == 0 {
        extent
    } else {
        extent + local - r
    }
}

/// Shrinks `local` until it fits the device limits.
///
/// Each axis is capped at the device's per-dimension maximum, then the larger
/// axis is halved until the group fits `max_work_group_size`. Axes never drop
/// below 1; unknown limits are ignored.
pub fn clamp_local_size(local: [usize; 2], limits: &DeviceLimits) -> [usize; 2] {
    let mut out = [local[0].max(1), local[1].max(1)];

    for (axis, size) in out.iter_mut().enumerate() {
        if let Some(max) = limits.max_items(axis) {
            *size = (*size).min(max);
        }
    }

    if limits.max_work_group_size > 0 {
        while out[0] * out[1] > limits.max_work_group_size {
            let axis = if out[0] >= out[1] { 0 } else { 1 };
            if out[axis] == 1 {
                break;
            }
            out[axis] /= 2;
        }
    }

    out
}

/// Full sizing policy: heuristic, clamp to limits, round the global size up.
pub fn work_sizes(kind: DeviceKind, limits: &DeviceLimits, width: u32, height: u32) -> WorkSizes {
    let heuristic = compute_local_size(kind);
    let local = clamp_local_size(heuristic, limits);
    if local != heuristic {
        debug!(?heuristic, ?local, "local size clamped to device limits");
    }

    let global = [
        round_up(local[0], width as usize),
        round_up(local[1], height as usize),
    ];
    trace!(?kind, ?local, ?global, width, height, "work_sizes");

    WorkSizes { local, global }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlimited() -> DeviceLimits {
        DeviceLimits::default()
    }

    #[test]
    fn test_round_up_known_values() {
        assert_eq!(round_up(128, 256), 256);
        assert_eq!(round_up(128, 257), 384);
        assert_eq!(round_up(16, 16), 16);
        assert_eq!(round_up(16, 17), 32);
    }

    #[test]
    fn test_round_up_is_covering_multiple() {
        for local in 1..=130 {
            for extent in 1..=300 {
                let g = round_up(local, extent);
                assert!(g >= extent, "round_up({local}, {extent}) = {g} < extent");
                assert_eq!(g % local, 0, "round_up({local}, {extent}) = {g} not a multiple");
                assert!(g < extent + local, "round_up({local}, {extent}) overshoots");
            }
        }
    }

    #[test]
    fn test_round_up_zero_local() {
        assert_eq!(round_up(0, 7), 7);
    }

    #[test]
    fn test_local_size_per_class() {
        assert_eq!(compute_local_size(DeviceKind::Cpu), [128, 1]);
        assert_eq!(compute_local_size(DeviceKind::Gpu), [16, 16]);
        assert_eq!(compute_local_size(DeviceKind::Accelerator), [16, 16]);
        assert_eq!(compute_local_size(DeviceKind::Other), [16, 16]);
    }

    #[test]
    fn test_gpu_640x480_needs_no_rounding() {
        let ws = work_sizes(DeviceKind::Gpu, &unlimited(), 640, 480);
        assert_eq!(ws.local, [16, 16]);
        assert_eq!(ws.global, [640, 480]);
        assert_eq!(ws.groups(), [40, 30]);
    }

    #[test]
    fn test_gpu_100x100_rounds_to_112() {
        let ws = work_sizes(DeviceKind::Gpu, &unlimited(), 100, 100);
        assert_eq!(ws.local, [16, 16]);
        assert_eq!(ws.global, [112, 112]);
        assert!(ws.covers(100, 100));
    }

    #[test]
    fn test_cpu_rows() {
        let ws = work_sizes(DeviceKind::Cpu, &unlimited(), 300, 7);
        assert_eq!(ws.local, [128, 1]);
        assert_eq!(ws.global, [384, 7]);
    }

    #[test]
    fn test_clamp_to_work_group_size() {
        let limits = DeviceLimits { max_work_group_size: 64, max_work_item_sizes: vec![1024, 1024, 64] };
        let ws = work_sizes(DeviceKind::Gpu, &limits, 100, 100);
        assert_eq!(ws.local, [8, 8]);
        assert_eq!(ws.global, [104, 104]);
    }

    #[test]
    fn test_clamp_to_per_axis_items() {
        let limits = DeviceLimits { max_work_group_size: 8192, max_work_item_sizes: vec![32, 1, 1] };
        assert_eq!(work_sizes(DeviceKind::Cpu, &limits, 10, 10).local, [32, 1]);
        assert_eq!(work_sizes(DeviceKind::Gpu, &limits, 10, 10).local, [16, 1]);
    }

    #[test]
    fn test_clamp_never_reaches_zero() {
        let limits = DeviceLimits { max_work_group_size: 1, max_work_item_sizes: vec![1, 1, 1] };
        let ws = work_sizes(DeviceKind::Gpu, &limits, 5, 3);
        assert_eq!(ws.local, [1, 1]);
        assert_eq!(ws.global, [5, 3]);
    }

    #[test]
    fn test_covers_holds_for_all_policies() {
        let limit_sets = [
            unlimited(),
            DeviceLimits { max_work_group_size: 256, max_work_item_sizes: vec![256, 256, 256] },
            DeviceLimits { max_work_group_size: 48, max_work_item_sizes: vec![12, 12, 12] },
        ];
        for kind in [DeviceKind::Cpu, DeviceKind::Gpu] {
            for limits in &limit_sets {
                for (w, h) in [(1, 1), (17, 3), (640, 480), (1921, 1081)] {
                    let ws = work_sizes(kind, limits, w, h);
                    assert!(ws.covers(w as usize, h as usize), "{kind:?} {limits:?} {w}x{h} -> {ws:?}");
                    if limits.max_work_group_size > 0 {
                        assert!(ws.local[0] * ws.local[1] <= limits.max_work_group_size);
                    }
                }
            }
        }
    }
}
