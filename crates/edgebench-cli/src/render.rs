//! Console rendering of run progress and the final summary.
//!
//! Each function returns the text so the caller decides where it goes.

use std::fmt::Write;

use edgebench_compute::{DeviceOutcome, DeviceReport, ReferenceReport, RunReport};

const HEAVY_RULE: &str = "===============================================================";
const LIGHT_RULE: &str = "---------------------------------------------------------------";

/// Reference filter block.
pub fn reference(r: &ReferenceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Step One: host reference filter");
    let _ = writeln!(out, "Executed successfully. {:.6} s", r.elapsed_secs);
    let _ = writeln!(out, "Output: {}", r.output.display());
    let _ = writeln!(out);
    let _ = writeln!(out, "Step Two: OpenCL devices");
    out
}

/// Platform and device capability dump followed by the attempt's outcome.
pub fn device(d: &DeviceReport, reference_secs: Option<f64>) -> String {
    let mut out = String::new();
    let p = &d.platform;
    let info = &d.device;

    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "Platform name:    {}", p.name);
    let _ = writeln!(out, "Platform profile: {}", p.profile);
    let _ = writeln!(out, "Platform vendor:  {}", p.vendor);
    let _ = writeln!(out, "Platform version: {}", p.version);
    let _ = writeln!(out, "{LIGHT_RULE}");
    let _ = writeln!(out, "Device name:                {}", info.name);
    let _ = writeln!(out, "Device type:                {}", info.kind);
    let _ = writeln!(out, "Device memory:              {} MB", info.global_mem_mb());
    let _ = writeln!(out, "Device max clock speed:     {} MHz", info.max_clock_frequency);
    let _ = writeln!(out, "Device compute units:       {}", info.max_compute_units);
    let _ = writeln!(out, "Device max work group size: {}", info.max_work_group_size);
    let _ = writeln!(out, "Device max work item sizes: {:?}", info.max_work_item_sizes);
    let _ = writeln!(
        out,
        "Device image support:       {} (max {}x{})",
        if info.image_support { "yes" } else { "no" },
        info.image2d_max_width,
        info.image2d_max_height
    );

    match &d.outcome {
        DeviceOutcome::Success { output, work_sizes, kernel_secs } => {
            let _ = writeln!(out, "Local work size:  {}x{}", work_sizes.local[0], work_sizes.local[1]);
            let _ = writeln!(out, "Global work size: {}x{}", work_sizes.global[0], work_sizes.global[1]);
            let _ = writeln!(out, "Executed successfully. {kernel_secs:.6} s (wall {:.6} s)", d.wall_secs);
            if let Some(speedup) = reference_secs.and_then(|r| d.speedup(r)) {
                let _ = writeln!(out, "Speedup vs reference: {speedup:.2}x");
            }
            let _ = writeln!(out, "Output: {}", output.display());
        }
        DeviceOutcome::Skipped { reason } => {
            let _ = writeln!(out, "Skipped: {reason}");
        }
        DeviceOutcome::Failed { stage, error, work_sizes } => {
            if let Some(ws) = work_sizes {
                let _ = writeln!(out, "Local work size:  {}x{}", ws.local[0], ws.local[1]);
                let _ = writeln!(out, "Global work size: {}x{}", ws.global[0], ws.global[1]);
            }
            let _ = writeln!(out, "FAILED during {stage}: {error}");
        }
    }
    out
}

/// Closing summary with host info and the fastest device.
pub fn summary(report: &RunReport) -> String {
    let mut out = String::new();
    let s = report.summary();

    let _ = writeln!(out, "{HEAVY_RULE}");
    let _ = writeln!(out, "Input: {} ({}x{})", report.input.display(), report.width, report.height);
    let _ = writeln!(
        out,
        "Host: {} CPUs, {} MB RAM",
        report.host.cpu_count,
        report.host.memory / 1024 / 1024
    );
    let _ = writeln!(out, "Reference: {:.6} s", report.reference.elapsed_secs);
    let _ = writeln!(
        out,
        "Devices: {} total, {} succeeded, {} skipped, {} failed",
        s.total, s.succeeded, s.skipped, s.failed
    );
    if s.total == 0 {
        let _ = writeln!(out, "No OpenCL devices found.");
    }
    if let Some(best) = report.fastest() {
        let secs = best.outcome.kernel_secs().unwrap_or_default();
        let _ = writeln!(out, "Fastest: {} ({}) {secs:.6} s", best.device.name, best.device.kind);
    }
    out
}
