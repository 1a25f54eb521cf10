//! Black-box end-to-end scenarios. Each one exercises the library's
//! public surface the way a generated binary would at runtime, without
//! requiring the emitted
//! source text itself to be compiled — the compiler-driver pipeline
//! (parse -> digest -> plan -> emit) is covered separately by
//! `n2a_core::compile`'s own unit tests; these integration tests pin
//! down the *runtime semantics* the emitted code relies on.

use n2a_core::runtime::connect::{accept, enumerate_candidates, ConnectPopulation};
use n2a_core::runtime::event_queue::{quantize_delay, Event, EventPayload, EventQueue};
use n2a_core::runtime::integrator::{Euler, Integrator, Rk4};
use n2a_core::runtime::population::{Membership, ResizePlan};
use n2a_core::storage::InputHolder;

/// Scenario 1: `x' = -x`, `x(0) = 1`, Euler, `dt = 0.1`, run 1 second.
/// Expect `|x(1) - 0.348| < 0.05`.
#[test]
fn scenario_1_single_ode_euler() {
    let mut x: f64 = 1.0;
    let dt = 0.1;
    for _ in 0..10 {
        x = Euler.step(x, dt, &mut |v| -v);
    }
    assert!((x - 0.348).abs() < 0.05, "x(1)={x}");
}

/// Scenario 2: same ODE, RK4, `dt = 0.1`. Expect `|x(1) - e^-1| < 1e-4`.
#[test]
fn scenario_2_single_ode_runge_kutta_matches_analytic() {
    let mut x: f64 = 1.0;
    let dt = 0.1;
    for _ in 0..10 {
        x = Rk4.step(x, dt, &mut |v| -v);
    }
    assert!((x - std::f64::consts::E.recip()).abs() < 1e-4, "x(1)={x}");
}

/// Scenario 3: `$n` driven 0 -> 10 at `t=0.5`, 10 -> 0 at `t=1.0`.
/// Expect `n == 10` during `[0.5, 1.0)` and all instances dead after 1.0.
#[test]
fn scenario_3_population_resize_tracks_n() {
    let mut membership = Membership::new();

    // t=0.5: grow from 0 to 10.
    match membership.resize_plan(10) {
        ResizePlan::Grow(count) => {
            for _ in 0..count {
                membership.acquire();
            }
        }
        other => panic!("expected Grow, got {other:?}"),
    }
    assert_eq!(membership.n(), 10);

    // t=1.0: shrink from 10 to 0, oldest-first.
    match membership.resize_plan(0) {
        ResizePlan::Die(victims) => {
            assert_eq!(victims, (0..10).collect::<Vec<_>>());
            for v in victims {
                membership.release(v);
            }
        }
        other => panic!("expected Die, got {other:?}"),
    }
    assert_eq!(membership.n(), 0);
}

/// Scenario 4: endpoint populations A(10) and B(10), connection with
/// `$p=1, $max=3` per A. Expect total connections = 30.
#[test]
fn scenario_4_connection_matching_respects_max_per_endpoint() {
    let a = ConnectPopulation::new(10, 10);
    let b = ConnectPopulation::new(10, 10);
    let candidates = enumerate_candidates(&[a, b], Some(3));

    let mut rng = rand::thread_rng();
    let accepted: Vec<_> = candidates.into_iter().filter(|_| accept(1.0, &mut rng)).collect();
    assert_eq!(accepted.len(), 30);
}

/// Scenario 5: source fires at `t=0.13`, `delay=0.20`, `dt=0.1`. Expect
/// spike delivered at exactly `t=0.30` (snapped), observed during the
/// `finalize` dispatch at that tick.
#[test]
fn scenario_5_event_spike_with_quantized_delay() {
    let delivered = quantize_delay(0.13, 0.20, 0.1);
    assert!((delivered - 0.30).abs() < 1e-9, "delivered={delivered}");

    let mut queue = EventQueue::with_capacity(4);
    queue
        .push(Event { time: delivered, part: 0, instance: 0, payload: EventPayload::Delayed { original_time: 0.13 } })
        .unwrap();

    // Nothing is due before the snapped time, everything is due at it.
    assert!(queue.drain_due(0.29).is_empty());
    let due = queue.drain_due(0.30);
    assert_eq!(due.len(), 1);
    assert!((due[0].time - 0.30).abs() < 1e-9);
}

/// Scenario 6: CSV with rows `(0,0),(1,10)`; reading column 1 at `t=0.3`
/// with smoothing returns `3`.
#[test]
fn scenario_6_input_stream_smoothing_interpolates() {
    let holder = InputHolder::parse("t\tv\n0\t0\n1\t10\n");
    let value = holder.smooth(1, 0.3);
    assert!((value - 3.0).abs() < 1e-9, "value={value}");
}
