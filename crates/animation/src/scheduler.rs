/// Delayed events on the frame clock.
///
/// A delay is measured from the first frame that follows [`Scheduler::after`],
/// since callers usually schedule from event handlers that have no clock.
#[derive(Debug)]
pub struct Scheduler<E> {
    queued: Vec<(f64, E)>,
    armed: Vec<Armed<E>>,
    seq: u64,
}

#[derive(Debug)]
struct Armed<E> {
    due: f64,
    seq: u64,
    event: E,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queued: Vec::new(),
            armed: Vec::new(),
            seq: 0,
        }
    }

    /// Emit `event` once `delay_ms` has passed.
    pub fn after(&mut self, delay_ms: f64, event: E) {
        self.queued.push((delay_ms, event));
    }

    /// Arm newly queued events at `now` and return every event that is due,
    /// ordered by due time then scheduling order.
    pub fn tick(&mut self, now: f64) -> Vec<E> {
        for (delay, event) in self.queued.drain(..) {
            self.armed.push(Armed {
                due: now + delay,
                seq: self.seq,
                event,
            });
            self.seq += 1;
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.armed.len() {
            if self.armed[i].due <= now {
                due.push(self.armed.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        if !due.is_empty() {
            tracing::trace!(fired = due.len(), pending = self.pending(), "scheduler tick");
        }
        due.into_iter().map(|a| a.event).collect()
    }

    /// Events not yet fired, including ones not armed yet.
    pub fn pending(&self) -> usize {
        self.queued.len() + self.armed.len()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
        self.armed.clear();
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
