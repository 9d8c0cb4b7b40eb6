//! Sliding window over the most recent turns

use std::collections::VecDeque;

use tracing::debug;

use crate::turn::Turn;

/// Bounded FIFO window of recent turns.
///
/// Insertion is append-only at the tail; once capacity is exceeded the
/// oldest turns are evicted from the head. A capacity of zero keeps the
/// window permanently empty.
#[derive(Debug, Clone)]
pub struct ContextMemory {
    window: VecDeque<Turn>,
    capacity: usize,
}

impl ContextMemory {
    /// Create a window with the given capacity in turns
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a turn, evicting from the head if over capacity
    pub fn record(&mut self, turn: Turn) {
        self.window.push_back(turn);

        while self.window.len() > self.capacity {
            if let Some(evicted) = self.window.pop_front() {
                debug!(turn_id = evicted.id, "Evicted turn from context window");
            }
        }
    }

    /// Current window contents in chronological order.
    ///
    /// Query-independent: context memory surfaces the same turns regardless
    /// of what is being asked.
    pub fn assemble(&self) -> Vec<Turn> {
        self.window.iter().cloned().collect()
    }

    /// Number of turns currently held
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Window capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
