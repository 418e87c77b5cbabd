use crate::event::{Arrow, InputEvent, Key};

/// A high-level action a scene reacts to.
///
/// Scenes consume actions, never raw input events, so the same scene logic
/// can be driven by a browser host, a native window or a scripted replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Rotate the view by a delta in radians.
    Orbit { pan: f32, tilt: f32 },
    /// Zoom in (`-1`) or out (`+1`) by one step.
    Zoom { steps: f32 },
    /// An arrow key was pressed or released.
    Steer { arrow: Arrow, pressed: bool },
    /// Drop the swinging block onto the tower.
    Drop,
    /// Event with no binding.
    Noop,
}

/// Converts raw events to actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputMap {
    /// Radians of orbit per pixel of pointer drag.
    pub drag_sensitivity: f32,
}

impl Default for InputMap {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.01,
        }
    }
}

impl InputMap {
    pub fn map(&self, event: &InputEvent) -> Action {
        match *event {
            // Dragging right pans left: the camera orbits against the pointer.
            InputEvent::PointerDrag { dx, dy } => Action::Orbit {
                pan: -dx * self.drag_sensitivity,
                tilt: -dy * self.drag_sensitivity,
            },
            InputEvent::Wheel { delta_y } if delta_y != 0.0 => Action::Zoom {
                steps: delta_y.signum(),
            },
            InputEvent::Wheel { .. } => Action::Noop,
            InputEvent::KeyDown(Key::Space) => Action::Drop,
            InputEvent::KeyDown(Key::Arrow(arrow)) => Action::Steer {
                arrow,
                pressed: true,
            },
            InputEvent::KeyUp(Key::Arrow(arrow)) => Action::Steer {
                arrow,
                pressed: false,
            },
            InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => Action::Noop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_maps_to_inverted_orbit() {
        let map = InputMap::default();
        let action = map.map(&InputEvent::PointerDrag { dx: 10.0, dy: -5.0 });
        match action {
            Action::Orbit { pan, tilt } => {
                assert!((pan + 0.1).abs() < 1e-6);
                assert!((tilt - 0.05).abs() < 1e-6);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn wheel_keeps_only_the_sign() {
        let map = InputMap::default();
        assert_eq!(
            map.map(&InputEvent::Wheel { delta_y: 120.0 }),
            Action::Zoom { steps: 1.0 }
        );
        assert_eq!(
            map.map(&InputEvent::Wheel { delta_y: -3.0 }),
            Action::Zoom { steps: -1.0 }
        );
        assert_eq!(map.map(&InputEvent::Wheel { delta_y: 0.0 }), Action::Noop);
    }

    #[test]
    fn keys_map_to_drop_and_steer() {
        let map = InputMap::default();
        assert_eq!(map.map(&InputEvent::KeyDown(Key::Space)), Action::Drop);
        assert_eq!(map.map(&InputEvent::KeyUp(Key::Space)), Action::Noop);
        assert_eq!(
            map.map(&InputEvent::KeyUp(Key::Arrow(Arrow::Left))),
            Action::Steer {
                arrow: Arrow::Left,
                pressed: false
            }
        );
        assert_eq!(
            map.map(&InputEvent::KeyDown(Key::Character('q'))),
            Action::Noop
        );
    }
}
