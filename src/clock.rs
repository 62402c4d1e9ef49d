use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// Source of the current instant for timestamps and deferred deadlines.
pub trait Clock {
    fn now_millis(&self) -> Millis;
}

/// Production clock backed by the system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Millis {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests; clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Millis) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Millis {
        self.now.get()
    }
}

/// Allocates identifiers for new drafts.
pub trait IdSource {
    fn new_id(&self) -> String;
}

/// Default ids: the creation instant in epoch milliseconds, as a string.
#[derive(Debug, Clone)]
pub struct ClockIds<C: Clock> {
    clock: C,
}

impl<C: Clock> ClockIds<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdSource for ClockIds<C> {
    fn new_id(&self) -> String {
        self.clock.now_millis().to_string()
    }
}

/// Deterministic ids for tests: `prefix` followed by 1, 2, 3, ...
#[derive(Debug, Clone)]
pub struct SequenceIds {
    prefix: String,
    next: Rc<Cell<u64>>,
}

impl SequenceIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Rc::new(Cell::new(1)),
        }
    }
}

impl IdSource for SequenceIds {
    fn new_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}{}", self.prefix, n)
    }
}
