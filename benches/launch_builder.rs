//! Launch configuration resolution benchmarks
//!
//! Compares the `Fast` and `Checked` build policies across the ways a launch
//! geometry can be specified:
//! - Explicit block + overall, grid + overall, block + grid
//! - Saturation with active blocks against the reference occupancy model
//! - Minimum parameters for maximum occupancy (block size search)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hologram_launch::sim::{DeviceSpec, KernelSpec};
use hologram_launch::{BlockDim, GridDim, LaunchConfigBuilder, OverallDim, Validation};

const POLICIES: [(&str, Validation); 2] = [("fast", Validation::Fast), ("checked", Validation::Checked)];

fn benchmark_explicit(c: &mut Criterion) {
    let mut group = c.benchmark_group("explicit_geometry");
    let device = DeviceSpec::ampere_a100();
    let kernel = KernelSpec::new(&device, 32, 0);

    for (name, policy) in POLICIES {
        group.bench_with_input(BenchmarkId::new("block_overall", name), &policy, |b, &policy| {
            let mut builder = LaunchConfigBuilder::new();
            builder
                .kernel(&kernel)
                .unwrap()
                .block_dimensions(BlockDim::square(16, 16))
                .unwrap()
                .overall_dimensions(OverallDim::square(3840, 2160))
                .unwrap();
            b.iter(|| black_box(builder.build(black_box(policy)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("grid_overall", name), &policy, |b, &policy| {
            let mut builder = LaunchConfigBuilder::new();
            builder
                .kernel(&kernel)
                .unwrap()
                .grid_dimensions(GridDim::linear(4096))
                .unwrap()
                .overall_size(1 << 20)
                .unwrap();
            b.iter(|| black_box(builder.build(black_box(policy)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("block_grid", name), &policy, |b, &policy| {
            let mut builder = LaunchConfigBuilder::new();
            builder
                .device(&device)
                .unwrap()
                .block_size(256)
                .unwrap()
                .grid_size(1024)
                .unwrap();
            b.iter(|| black_box(builder.build(black_box(policy)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_occupancy_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("occupancy_geometry");
    let device = DeviceSpec::ampere_a100();

    for registers in [32, 64, 128] {
        let kernel = KernelSpec::new(&device, registers, 0);

        group.bench_with_input(BenchmarkId::new("saturate", registers), &registers, |b, _| {
            let mut builder = LaunchConfigBuilder::new();
            builder
                .kernel(&kernel)
                .unwrap()
                .block_size(256)
                .unwrap()
                .saturate_with_active_blocks()
                .unwrap();
            b.iter(|| black_box(builder.build(Validation::Checked).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("min_params", registers), &registers, |b, _| {
            let mut builder = LaunchConfigBuilder::new();
            builder
                .kernel(&kernel)
                .unwrap()
                .min_params_for_max_occupancy()
                .unwrap()
                .dynamic_shared_memory_sizer(|threads| threads * 16);
            b.iter(|| black_box(builder.build(Validation::Checked).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_explicit, benchmark_occupancy_modes);
criterion_main!(benches);
