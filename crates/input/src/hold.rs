use crate::event::Arrow;

/// Continuous orbit direction from held arrow keys.
///
/// Each axis is a step count clamped to `[-1, 1]`. Pressing moves the axis one
/// step toward the arrow and releasing moves it one step back, so key repeat
/// saturates instead of accumulating and opposite arrows cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArrowHold {
    pan: f32,
    tilt: f32,
}

impl ArrowHold {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, arrow: Arrow, pressed: bool) {
        let (axis, toward) = match arrow {
            Arrow::Left => (&mut self.pan, -1.0),
            Arrow::Right => (&mut self.pan, 1.0),
            Arrow::Up => (&mut self.tilt, -1.0),
            Arrow::Down => (&mut self.tilt, 1.0),
        };
        let step = if pressed { toward } else { -toward };
        *axis = (*axis + step).clamp(-1.0, 1.0);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn is_idle(&self) -> bool {
        self.pan == 0.0 && self.tilt == 0.0
    }
}
