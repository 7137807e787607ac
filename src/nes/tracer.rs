use std::collections::VecDeque;

mod macros;
pub mod traceable;
pub use traceable::Traceable;

/// Bounded history of trace lines, owned by whichever component records them
#[derive(Debug, Clone)]
pub struct Tracer {
    history: VecDeque<String>,
    capacity: usize,
}

impl Tracer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn write(&mut self, msg: String) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(msg);
    }

    pub fn log<T: Traceable + ?Sized>(&mut self, thing: &T) {
        if let Some(trace) = thing.trace() {
            self.write(trace);
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
