//! Integration tests preparing a kernel launch end to end
//!
//! Covers the path a caller takes before dispatching a runtime-compiled
//! kernel:
//! 1. Pick a device and describe its compilation target
//! 2. Marshal the compiler arguments
//! 3. Resolve the launch geometry against the compiled kernel's limits

use hologram_launch_suite::launch::sim::{DeviceSpec, KernelSpec};
use hologram_launch_suite::launch::{
    BlockDim, Device, GeometryMode, LaunchConfigBuilder, OverallDim, ToolkitVersion, Validation,
};
use hologram_launch_suite::rtc::{marshal, CompilationOptions};

fn init() {
    hologram_tracing::init_test_tracing();
}

#[test]
fn test_compile_then_launch() {
    init();
    let device = DeviceSpec::hopper_h100();

    let mut opts = CompilationOptions::new();
    opts.set_target_device(&device)
        .set_language_dialect_name("c++17")
        .unwrap()
        .define_value("TILE", "16");
    opts.maximum_register_count = Some(64);
    let args = marshal(&opts);
    assert!(args.iter().any(|arg| arg == "--gpu-architecture=sm_90"));
    assert!(args.iter().any(|arg| arg == "--maxrregcount=64"));

    // The compiled kernel honours the register cap
    let kernel = KernelSpec::new(&device, 64, 2048);
    let config = LaunchConfigBuilder::new()
        .device(&device)
        .unwrap()
        .kernel(&kernel)
        .unwrap()
        .block_dimensions(BlockDim::square(16, 16))
        .unwrap()
        .overall_dimensions(OverallDim::square(1000, 1000))
        .unwrap()
        .dynamic_shared_memory_size(16 * 16 * 4)
        .unwrap()
        .build(Validation::Checked)
        .unwrap();

    assert_eq!(config.grid().x, 63);
    assert_eq!(config.grid().y, 63);
    assert!(config.overall().is_covered_by(config.dimensions()));
}

#[test]
fn test_saturate_across_devices() {
    init();
    for device in [DeviceSpec::ampere_a100(), DeviceSpec::ada_rtx4090(), DeviceSpec::hopper_h100()] {
        let kernel = KernelSpec::new(&device, 32, 0);
        let mut builder = LaunchConfigBuilder::new();
        builder
            .kernel(&kernel)
            .unwrap()
            .use_maximum_linear_block()
            .unwrap()
            .saturate_with_active_blocks()
            .unwrap();
        assert_eq!(builder.mode(), GeometryMode::SaturateWithActiveBlocks);

        let config = builder.build(Validation::Checked).unwrap();
        assert_eq!(config.block().x, device.max_threads_per_block());
        assert_eq!(config.grid().x % device.multiprocessor_count(), 0);
        assert!(config.total_threads() >= u64::from(device.multiprocessor_count()));
    }
}

#[test]
fn test_toolkit_capabilities_flow_through_both_crates() {
    init();
    let toolkit = "10.2".parse::<ToolkitVersion>().unwrap();
    let device = DeviceSpec::ampere_a100();
    let kernel = KernelSpec::new(&device, 32, 0);

    let mut opts = CompilationOptions::new();
    opts.toolkit = toolkit;
    opts.set_target_device(&device);
    assert_eq!(marshal(&opts).options(), ["--gpu-architecture=compute_80"]);

    let config = LaunchConfigBuilder::new()
        .toolkit(toolkit)
        .kernel(&kernel)
        .unwrap()
        .min_params_for_max_occupancy()
        .unwrap()
        .build(Validation::Checked)
        .unwrap();
    assert_eq!(config.block(), BlockDim::linear(1024));
}

#[test]
fn test_reseed_builder_from_descriptor() {
    init();
    let device = DeviceSpec::ampere_a100();
    let kernel = KernelSpec::new(&device, 32, 0);

    let first = LaunchConfigBuilder::new()
        .kernel(&kernel)
        .unwrap()
        .min_params_for_max_occupancy()
        .unwrap()
        .blocks_may_cooperate()
        .build(Validation::Checked)
        .unwrap();

    let mut builder = LaunchConfigBuilder::from_config(&first);
    builder.kernel(&kernel).unwrap().block_size(512).unwrap();
    let second = builder.build(Validation::Checked).unwrap();

    assert_eq!(second.grid(), first.grid());
    assert_eq!(second.block(), BlockDim::linear(512));
    assert!(second.block_cooperation());
}
