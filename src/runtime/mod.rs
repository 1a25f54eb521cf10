//! # Runtime
//!
//! The library the code generator's output links against:
//! the event queue and scheduler, the integrators, connection-formation
//! iterators, population membership bookkeeping, and the key=value CLI
//! grammar the generated binary parses its arguments with.
//!
//! The *Instance* and *Population* protocols are expressed here as
//! traits rather than monomorphic templated wrappers — a trait keeps
//! `CodeEmitter`'s generated `impl` blocks small, emitting only the
//! methods a part's equations actually need and inheriting safe no-op
//! defaults for the rest.

pub mod cli;
pub mod connect;
pub mod event_queue;
pub mod integrator;
pub mod population;

use crate::connection_planner::Point3;
use crate::digest::TriggerEdge;
use crate::runtime::connect::ConnectIterator;
use crate::runtime::integrator::Integrator;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The Instance Protocol: one realized member of a
/// Population. A generated `{Part}Instance` implements only the methods
/// its digested equations actually drive; everything else keeps the
/// inert default here.
pub trait Instance: Send + Sync {
    fn ctor(&mut self) {}
    fn dtor(&mut self) {}
    fn clear(&mut self) {}
    fn die(&mut self) {}
    fn enter_simulation(&mut self) {}
    fn leave_simulation(&mut self) {}
    fn is_free(&self) -> bool {
        false
    }

    /// Evaluate every variable's initial-value equation (`$init`).
    fn init(&mut self);

    /// Advance every differential variable one `dt` using `integrator`.
    fn integrate(&mut self, dt: f64, integrator: &dyn Integrator);

    /// Re-evaluate non-differential equations against the integrated
    /// state.
    fn update(&mut self) {}

    /// Apply combiners (`+=`, `*=`, ...) and reset accumulators to their
    /// identity. Returns `false` when the instance's own `$type`/`$p`
    /// condition says it should die this step.
    fn finalize(&mut self) -> bool {
        true
    }

    fn update_derivative(&mut self) {}
    fn finalize_derivative(&mut self) {}

    /// Push the current integrated + derivative state onto the
    /// Runge-Kutta snapshot stack.
    fn snapshot(&mut self) {}
    fn restore(&mut self) {}
    fn push_derivative(&mut self) {}
    fn multiply_add_to_stack(&mut self, _scale: f64) {}
    fn multiply(&mut self, _scale: f64) {}
    fn add_to_members(&mut self) {}

    fn get_live(&self) -> bool {
        true
    }

    /// Connection-formation acceptance probability `$p`.
    fn get_p(&self) -> f64 {
        1.0
    }

    fn get_xyz(&self) -> Point3 {
        Point3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    fn get_project(&self, other: Point3) -> Point3 {
        other
    }

    /// Bind endpoint slot `i` of a connection instance to the endpoint
    /// population's instance `endpoint`.
    fn set_part(&mut self, _i: usize, _endpoint: usize) {}
    fn get_part(&self, _i: usize) -> usize {
        0
    }

    fn get_newborn(&self) -> bool {
        false
    }

    /// Translate a sparse-matrix (row, col) coordinate into this
    /// connection's endpoint index pair.
    fn map_index(&self, row: usize, col: usize) -> (usize, usize) {
        (row, col)
    }

    fn event_test(&self) -> Option<TriggerEdge> {
        None
    }
    fn event_delay(&self) -> Option<f64> {
        None
    }
    fn set_latch(&mut self, _value: bool) {}
    fn finalize_event(&mut self) {}

    /// Number of combined writes this tick contributed to a shared
    /// accumulator, used by `trackN`-style diagnostics.
    fn get_count(&self) -> usize {
        1
    }

    fn path(&self) -> String {
        String::new()
    }
}

/// The Population Protocol: the collection of Instances of a
/// given part under a given container.
pub trait Population {
    fn ctor(&mut self) {}
    fn dtor(&mut self) {}

    /// Allocate a new instance slot and return its `$index`, backed by
    /// [`population::Membership::acquire`].
    fn create(&mut self) -> usize;
    fn add(&mut self, _index: usize) {}
    fn remove(&mut self, _index: usize) {}

    fn init(&mut self) {}
    fn integrate(&mut self, _dt: f64, _integrator: &dyn Integrator) {}
    fn update(&mut self) {}
    fn finalize(&mut self) {}

    /// Grow or shrink to `target` live instances, backed by
    /// [`population::Membership::resize_plan`].
    fn resize(&mut self, target: usize);
    fn get_n(&self) -> usize;

    fn update_derivative(&mut self) {}
    fn finalize_derivative(&mut self) {}
    fn snapshot(&mut self) {}
    fn restore(&mut self) {}
    fn push_derivative(&mut self) {}
    fn multiply_add_to_stack(&mut self, _scale: f64) {}
    fn multiply(&mut self, _scale: f64) {}
    fn add_to_members(&mut self) {}

    /// Advance the newborn boundary, backed by
    /// [`population::Membership::clear_new`].
    fn clear_new(&mut self) {}

    /// The connection-formation iterator tree for this population, when
    /// it is a connection.
    fn get_iterators(&self) -> Option<ConnectIterator<'_>> {
        None
    }

    fn path(&self) -> String {
        String::new()
    }
}

/// Cooperative stop flag.
/// The simulator checks this once per tick rather than being killed
/// mid-step, so the last completed tick's `OutputHolder`s are always
/// flushed before exit.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        StopFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Install a libc `SIGINT`/`SIGTERM` handler that calls
    /// [`StopFlag::request_stop`]. Declared via a local `extern "C"`
    /// binding rather than a signal-handling crate, since the only
    /// corpus crate that would cover this (`signal-hook`) isn't part of
    /// the dependency stack any example repo carries.
    pub fn install_signal_handlers(&self) {
        unsafe {
            let flag = self.clone();
            let boxed: Box<StopFlag> = Box::new(flag);
            HANDLER_FLAG = Box::into_raw(boxed);
            libc_signal(SIGINT, handle_signal as usize);
            libc_signal(SIGTERM, handle_signal as usize);
        }
    }
}

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

static mut HANDLER_FLAG: *mut StopFlag = std::ptr::null_mut();

extern "C" fn handle_signal(_sig: i32) {
    unsafe {
        if let Some(flag) = HANDLER_FLAG.as_ref() {
            flag.request_stop();
        }
    }
}

extern "C" {
    #[link_name = "signal"]
    fn libc_signal(signum: i32, handler: usize) -> usize;
}

/// Drives the event queue: pop the earliest
/// event, integrate+update+finalize all live instances for step events
/// (re-enqueuing at `t + dt`), or set latches and call `finalize_event`
/// for spike events. Same-tick ordering: a step's `finalize` runs before
/// any spike events due at the same timestamp ("this spec adopts
/// that rule").
pub struct Simulator {
    pub queue: event_queue::EventQueue,
    pub integrator: Box<dyn Integrator>,
    pub dt: f64,
    pub stop: StopFlag,
    /// Identifies this run for log correlation and as the default
    /// image-sequence job directory name when the generated binary
    /// wasn't given an explicit output stem.
    pub job_id: String,
}

impl Simulator {
    pub fn new(capacity: usize, integrator: Box<dyn Integrator>, dt: f64) -> Self {
        Simulator {
            queue: event_queue::EventQueue::with_capacity(capacity),
            integrator,
            dt,
            stop: StopFlag::new(),
            job_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Run one dispatch round at `horizon`: every event due at or before
    /// `horizon` is drained in ascending time order, step events first
    /// driving `on_step` then `on_spike` for the remainder at the same
    /// timestamp group.
    pub fn dispatch(
        &mut self,
        horizon: f64,
        mut on_step: impl FnMut(&event_queue::Event, &dyn Integrator, f64),
        mut on_spike: impl FnMut(&event_queue::Event),
    ) {
        let due = self.queue.drain_due(horizon);
        let (steps, spikes): (Vec<_>, Vec<_>) =
            due.into_iter().partition(|e| matches!(e.payload, event_queue::EventPayload::Step));
        for event in &steps {
            on_step(event, self.integrator.as_ref(), self.dt);
        }
        for event in &spikes {
            on_spike(event);
        }
    }

    pub fn should_continue(&self) -> bool {
        !self.stop.is_stopped()
    }
}

/// Process-wide `Simulator` singleton slot ("the `Simulator<T>`
/// singleton ... is process-wide by default, thread-local under TLS
/// mode"). `ArcSwapOption` lets the generated binary's `init()` install
/// a simulator and every subsequent `getHolder`-style accessor read it
/// without taking a lock, while `finish()` clears it so teardown is
/// visible to every reader.
#[cfg(not(feature = "tls-simulator"))]
static GLOBAL_SIMULATOR: ArcSwapOption<Simulator> = ArcSwapOption::const_empty();

#[cfg(feature = "tls-simulator")]
thread_local! {
    static TLS_SIMULATOR: std::cell::RefCell<Option<Arc<Simulator>>> = const { std::cell::RefCell::new(None) };
}

/// Install `sim` as the global (or, under `tls-simulator`, this thread's)
/// singleton. Called from the generated binary's `init()`.
pub fn install_global(sim: Simulator) {
    #[cfg(not(feature = "tls-simulator"))]
    GLOBAL_SIMULATOR.store(Some(Arc::new(sim)));
    #[cfg(feature = "tls-simulator")]
    TLS_SIMULATOR.with(|cell| *cell.borrow_mut() = Some(Arc::new(sim)));
}

/// Borrow the installed singleton, if any.
pub fn current_global() -> Option<Arc<Simulator>> {
    #[cfg(not(feature = "tls-simulator"))]
    {
        GLOBAL_SIMULATOR.load_full()
    }
    #[cfg(feature = "tls-simulator")]
    {
        TLS_SIMULATOR.with(|cell| cell.borrow().clone())
    }
}

/// Clear the installed singleton. Called from the generated binary's
/// `finish()`, after `Holders::finish` has flushed every output stream.
pub fn clear_global() {
    #[cfg(not(feature = "tls-simulator"))]
    GLOBAL_SIMULATOR.store(None);
    #[cfg(feature = "tls-simulator")]
    TLS_SIMULATOR.with(|cell| *cell.borrow_mut() = None);
}
