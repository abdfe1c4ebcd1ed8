//! Layer benchmark — measure one full layer of pulse sequencing against
//! the simulation bus with a no-op clock.
//!
//! Isolates the sequencing overhead (counter arithmetic + bus writes)
//! from wall-clock pulse pacing, which dominates a real run by orders of
//! magnitude.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use winder_common::hal::Line;
use winder_common::state::FeedDirection;
use winder_control::controller::WindingController;
use winder_control::pace::NullClock;
use winder_control::plan::WindingPlan;
use winder_hal::SimulationBus;

/// Plan for one layer at the given resolution, reference step ratio 26.
fn layer_plan(steps_per_rev: u32) -> WindingPlan {
    WindingPlan {
        number_of_layers: 1,
        step_ratio: 26,
        turns_per_layer: 1,
        steps_per_rev,
        big_step_delay: Duration::from_micros(1000),
        small_pulse_width: Duration::from_micros(2),
    }
}

fn bench_run_layer(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_layer");

    for steps_per_rev in [400u32, 3200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(steps_per_rev),
            &steps_per_rev,
            |b, &steps_per_rev| {
                b.iter(|| {
                    let mut ctl = WindingController::new(
                        layer_plan(steps_per_rev),
                        SimulationBus::new(),
                        NullClock::new(),
                    );
                    ctl.run_layer(FeedDirection::Forward).unwrap();
                    black_box(ctl.bus().pulses(Line::BigStepPulse))
                });
            },
        );
    }

    group.finish();
}

fn bench_plan_derivation(c: &mut Criterion) {
    use winder_control::plan::{derive_layer_count, derive_step_ratio};

    c.bench_function("derive", |b| {
        b.iter(|| {
            let ratio = derive_step_ratio(black_box(4.0), black_box(0.15));
            let layers = derive_layer_count(black_box(4040), black_box(172));
            black_box((ratio, layers))
        });
    });
}

criterion_group!(benches, bench_run_layer, bench_plan_derivation);
criterion_main!(benches);
