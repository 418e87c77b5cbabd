/// Ring buffer of recent frame intervals, in milliseconds.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<f64>,
    capacity: usize,
    index: usize,
    filled: bool,
    last_frame: Option<f64>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![0.0; capacity],
            capacity,
            index: 0,
            filled: false,
            last_frame: None,
        }
    }

    pub fn record(&mut self, dt: f64) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    /// Record the interval since the previous call. The first call only
    /// latches the clock.
    pub fn mark(&mut self, now: f64) {
        if let Some(last) = self.last_frame.replace(now) {
            self.record((now - last).max(0.0));
        }
    }

    fn samples(&self) -> &[f64] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> f64 {
        let samples = self.samples();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.samples().iter().copied().fold(0.0, f64::max)
    }

    pub fn min(&self) -> f64 {
        let samples = self.samples();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Frames per second implied by the average interval.
    pub fn fps(&self) -> f64 {
        let average = self.average();
        if average > 0.0 { 1000.0 / average } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }
}
