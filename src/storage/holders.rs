//! `Holders`: the simulator-owned registry of process-scoped I/O streams
//! ("A `getHolder` interface returns an existing instance or
//! `null`, letting caller construct and register"). Keyed by file name;
//! the empty string means stdin/stdout.

use crate::storage::error::StorageResult;
use crate::storage::input::InputHolder;
use crate::storage::output::OutputHolder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::OnceLock;

pub type BoxedOutput = OutputHolder<Box<dyn Write>>;

/// Owns every open `InputHolder`/`OutputHolder` for one simulation run.
/// Destroyed at `finish` ("the `Holders` list is process-wide by
/// default, thread-local under TLS mode").
#[derive(Default)]
pub struct Holders {
    inputs: HashMap<String, InputHolder>,
    outputs: HashMap<String, BoxedOutput>,
    /// Registration order, walked in reverse at teardown so the
    /// most-recently-opened stream flushes first.
    order: Vec<String>,
}

impl Holders {
    pub fn new() -> Self {
        Holders::default()
    }

    pub fn get_input(&self, key: &str) -> Option<&InputHolder> {
        self.inputs.get(key)
    }

    /// Return the existing holder for `key`, opening and registering it
    /// first if this is the first request.
    pub fn open_input(&mut self, key: &str) -> StorageResult<&InputHolder> {
        if !self.inputs.contains_key(key) {
            let holder = if key.is_empty() {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                InputHolder::parse(&text)
            } else {
                InputHolder::open(Path::new(key))?
            };
            self.inputs.insert(key.to_string(), holder);
            self.order.push(key.to_string());
        }
        Ok(self.inputs.get(key).unwrap())
    }

    pub fn get_output(&mut self, key: &str) -> Option<&mut BoxedOutput> {
        self.outputs.get_mut(key)
    }

    pub fn open_output(&mut self, key: &str) -> StorageResult<&mut BoxedOutput> {
        if !self.outputs.contains_key(key) {
            let writer: Box<dyn Write> = if key.is_empty() {
                Box::new(std::io::stdout())
            } else {
                Box::new(BufWriter::new(File::create(key)?))
            };
            self.outputs.insert(key.to_string(), OutputHolder::new(writer));
            self.order.push(key.to_string());
        }
        Ok(self.outputs.get_mut(key).unwrap())
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.inputs.contains_key(key) || self.outputs.contains_key(key)
    }

    /// Flush every output holder in reverse-registration order, then
    /// drop everything ("always flush `OutputHolder` values
    /// before exit, even under unhandled exceptions, via scoped teardown
    /// of the `Holders` list").
    pub fn finish(&mut self) -> StorageResult<()> {
        for key in self.order.iter().rev() {
            if let Some(output) = self.outputs.get_mut(key) {
                output.flush()?;
            }
        }
        self.outputs.clear();
        self.inputs.clear();
        self.order.clear();
        Ok(())
    }
}

/// Process-wide (or, under `tls-simulator`, per-thread) access to the
/// one `Holders` registry a running simulation owns ("Global
/// state: ... the `Holders` list are process-wide by default,
/// thread-local under TLS mode"). The generated binary's `init()` never
/// constructs a `Holders` directly; every I/O holder lookup goes through
/// `with_global`, so process-wide and TLS builds share call sites.
#[cfg(not(feature = "tls-simulator"))]
static GLOBAL_HOLDERS: OnceLock<parking_lot::Mutex<Holders>> = OnceLock::new();

#[cfg(feature = "tls-simulator")]
thread_local! {
    static TLS_HOLDERS: std::cell::RefCell<Holders> = std::cell::RefCell::new(Holders::new());
}

/// Run `f` against the process's (or this thread's) `Holders` registry.
#[cfg(not(feature = "tls-simulator"))]
pub fn with_global<R>(f: impl FnOnce(&mut Holders) -> R) -> R {
    let cell = GLOBAL_HOLDERS.get_or_init(|| parking_lot::Mutex::new(Holders::new()));
    let mut guard = cell.lock();
    f(&mut guard)
}

#[cfg(feature = "tls-simulator")]
pub fn with_global<R>(f: impl FnOnce(&mut Holders) -> R) -> R {
    TLS_HOLDERS.with(|cell| f(&mut cell.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn opening_the_same_key_twice_reuses_the_holder() {
        let mut holders = Holders::default();
        holders.outputs.insert("x".into(), OutputHolder::new(Box::new(Vec::new()) as Box<dyn Write>));
        holders.order.push("x".into());
        assert!(holders.is_open("x"));
        let first_len = holders.order.len();
        let _ = holders.get_output("x").unwrap();
        assert_eq!(holders.order.len(), first_len);
    }

    #[test]
    fn finish_clears_every_registered_holder() {
        let mut holders = Holders::default();
        holders.outputs.insert("a".into(), OutputHolder::new(Box::new(Vec::new()) as Box<dyn Write>));
        holders.order.push("a".into());
        holders.finish().unwrap();
        assert!(!holders.is_open("a"));
        assert!(holders.order.is_empty());
    }

    #[test]
    fn with_global_reuses_the_same_registry_across_calls() {
        with_global(|holders| {
            holders.outputs.insert("global".into(), OutputHolder::new(Box::new(Vec::new()) as Box<dyn Write>));
            holders.order.push("global".into());
        });
        with_global(|holders| {
            assert!(holders.is_open("global"));
            holders.finish().unwrap();
        });
        with_global(|holders| assert!(!holders.is_open("global")));
    }

    #[test]
    fn input_parsed_from_an_in_memory_reader_is_queryable_afterward() {
        let mut cursor = Cursor::new(b"t,x\n0,0\n1,10\n".to_vec());
        let mut text = String::new();
        cursor.read_to_string(&mut text).unwrap();
        let holder = InputHolder::parse(&text);
        assert_eq!(holder.get(1, 1), 10.0);
    }
}
