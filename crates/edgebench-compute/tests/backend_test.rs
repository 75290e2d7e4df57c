//! OpenCL backend tests against whatever devices the machine has. These pass
//! on machines without an OpenCL runtime: enumeration is then empty and every
//! check is vacuous.

#![cfg(feature = "opencl")]

use std::path::PathBuf;

use edgebench_compute::{
    supports_images, transfer, ComputeBackend, ComputeDevice, DeviceOutcome, ImageHandle,
    OpenClBackend, Orchestrator, RunConfig, SamplerConfig,
};
use edgebench_core::{codec, find_edges, HostImage};

fn kernel_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../kernels/xFilter.cl")
}

fn checker(width: u32, height: u32) -> HostImage {
    let mut img = HostImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / 4 + y / 4) % 2 == 0 { 255 } else { 0 };
            img.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    img
}

fn noisy(width: u32, height: u32) -> HostImage {
    let mut img = HostImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = x.wrapping_mul(31) ^ y.wrapping_mul(17);
            img.set_pixel(x, y, [v as u8, (v >> 3) as u8, (v * 7) as u8, (x * 9) as u8]);
        }
    }
    img
}

#[test]
fn test_describe_devices() {
    for device in OpenClBackend::new().enumerate() {
        let info = device.info();
        println!(
            "{} / {} [{}] images={} wg={}",
            device.platform().name,
            info.name,
            info.kind,
            supports_images(info),
            info.max_work_group_size
        );
        assert_eq!(info.limits().max_work_group_size, info.max_work_group_size);
    }
}

#[test]
fn test_sessions_open_independently() {
    let backend = OpenClBackend::new();
    let first: Vec<bool> = backend
        .enumerate()
        .map(|d| d.open_session(&SamplerConfig::default()).is_ok())
        .collect();
    // reopening after the first sessions were dropped gives the same answers
    let second: Vec<bool> = backend
        .enumerate()
        .map(|d| d.open_session(&SamplerConfig::default()).is_ok())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_upload_download_roundtrip() {
    let img = noisy(37, 23);
    let (w, h) = img.dimensions();

    for device in OpenClBackend::new().enumerate().filter(|d| supports_images(d.info())) {
        let Ok(session) = device.open_session(&SamplerConfig::default()) else {
            continue;
        };

        let handle = transfer::upload_input(&session, &img).unwrap();
        assert_eq!(handle.dimensions(), (w, h));

        let data = transfer::download(&session, &handle, w, h).unwrap();
        assert_eq!(data.as_slice(), img.data(), "round-trip on {}", device.info().name);

        let output = transfer::allocate_output(&session, w, h).unwrap();
        assert_eq!(output.dimensions(), (w, h));
    }
}

#[test]
fn test_full_run_on_real_devices() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("checker.png");
    let img = checker(33, 17);
    codec::save(&input, &img).unwrap();
    let expected_pixels = find_edges(&img);

    let cfg = RunConfig {
        kernel_path: kernel_path(),
        output_dir: dir.path().to_path_buf(),
        ..RunConfig::default()
    };
    let expected = OpenClBackend::new().enumerate().count();
    let report = Orchestrator::new(OpenClBackend::new(), cfg).run(&input).unwrap();

    assert_eq!(report.devices.len(), expected);
    assert!(report.reference.output.exists());

    for d in &report.devices {
        match &d.outcome {
            DeviceOutcome::Success { output, .. } => {
                let got = codec::load(output).unwrap();
                assert_eq!(got.dimensions(), expected_pixels.dimensions());
                // float clamp plus UNORM_INT8 conversion may round differently
                let worst = got
                    .data()
                    .iter()
                    .zip(expected_pixels.data())
                    .map(|(a, b)| a.abs_diff(*b))
                    .max()
                    .unwrap_or(0);
                assert!(worst <= 1, "{}: max channel difference {worst}", d.device.name);
            }
            DeviceOutcome::Skipped { .. } => {
                assert!(!supports_images(&d.device), "{} skipped with image support", d.device.name);
            }
            DeviceOutcome::Failed { stage, error, .. } => {
                panic!("{} failed at {stage}: {error}", d.device.name);
            }
        }
    }
}
