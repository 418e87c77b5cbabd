use std::f64::consts::TAU;

/// Sine oscillation with a fixed period, phase zero on the first sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    period: f64,
    amplitude: f32,
    started_at: Option<f64>,
}

impl Oscillator {
    pub fn new(period_ms: f64, amplitude: f32) -> Self {
        Self {
            period: period_ms,
            amplitude,
            started_at: None,
        }
    }

    /// Value at frame time `now`: `amplitude * sin(2π * progress)`.
    pub fn value(&mut self, now: f64) -> f32 {
        let started_at = *self.started_at.get_or_insert(now);
        if self.period <= 0.0 {
            return 0.0;
        }
        let progress = ((now - started_at) / self.period).rem_euclid(1.0);
        self.amplitude * (TAU * progress).sin() as f32
    }

    /// Restart the phase on the next sampled frame.
    pub fn reset(&mut self) {
        self.started_at = None;
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn starts_at_zero_phase() {
        let mut osc = Oscillator::new(4000.0, 1.0);
        assert_eq!(osc.value(12_345.0), 0.0);
        assert!(close(osc.value(13_345.0), 1.0));
        assert!(close(osc.value(15_345.0), -1.0));
    }

    #[test]
    fn repeats_every_period() {
        let mut osc = Oscillator::new(4000.0, 0.5);
        osc.value(0.0);
        let a = osc.value(700.0);
        let b = osc.value(4700.0);
        assert!(close(a, b));
    }

    #[test]
    fn reset_relatches() {
        let mut osc = Oscillator::new(1000.0, 1.0);
        osc.value(0.0);
        osc.reset();
        assert_eq!(osc.value(250.0), 0.0);
    }
}
