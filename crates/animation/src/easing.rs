use serde::{Deserialize, Serialize};

/// Progress curve applied to a tween.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress. Input is clamped.
    pub fn sample(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => t * (2.0 - t),
            Self::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::QuadraticIn,
        Easing::QuadraticOut,
        Easing::QuadraticInOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for easing in ALL {
            assert_eq!(easing.sample(0.0), 0.0);
            assert!((easing.sample(1.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in ALL {
            let mut last = 0.0;
            for step in 0..=20 {
                let v = easing.sample(step as f64 / 20.0);
                assert!(v >= last - 1e-12, "{easing:?} decreased at step {step}");
                last = v;
            }
        }
    }

    #[test]
    fn quadratic_shapes() {
        assert_eq!(Easing::QuadraticIn.sample(0.5), 0.25);
        assert_eq!(Easing::QuadraticOut.sample(0.5), 0.75);
        assert_eq!(Easing::QuadraticInOut.sample(0.5), 0.5);
        assert_eq!(Easing::Linear.sample(2.0), 1.0);
    }
}
