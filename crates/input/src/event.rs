use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Arrow key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Arrow(Arrow),
    Space,
    Character(char),
}

impl Key {
    /// Parse a DOM-style key name: `ArrowLeft`, `Space` (or a literal space),
    /// or any single character.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowLeft" => Self::Arrow(Arrow::Left),
            "ArrowRight" => Self::Arrow(Arrow::Right),
            "ArrowUp" => Self::Arrow(Arrow::Up),
            "ArrowDown" => Self::Arrow(Arrow::Down),
            " " | "Space" => Self::Space,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Character(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrow(Arrow::Left) => f.write_str("ArrowLeft"),
            Self::Arrow(Arrow::Right) => f.write_str("ArrowRight"),
            Self::Arrow(Arrow::Up) => f.write_str("ArrowUp"),
            Self::Arrow(Arrow::Down) => f.write_str("ArrowDown"),
            Self::Space => f.write_str("Space"),
            Self::Character(c) => write!(f, "{c}"),
        }
    }
}

/// A raw event delivered by the host between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer moved while a button is held, in pixels.
    PointerDrag { dx: f32, dy: f32 },
    /// Wheel scrolled; only the sign of `delta_y` matters.
    Wheel { delta_y: f32 },
    KeyDown(Key),
    KeyUp(Key),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseEventError {
    #[error("unknown event kind '{0}', expected drag, wheel, down or up")]
    UnknownKind(String),
    #[error("malformed arguments '{0}'")]
    BadArguments(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Parses the compact form used by input scripts:
/// `drag:DX,DY`, `wheel:DY`, `down:KEY`, `up:KEY`.
impl FromStr for InputEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, args) = s.split_once(':').unwrap_or((s, ""));
        let number = |text: &str| {
            text.trim()
                .parse::<f32>()
                .map_err(|_| ParseEventError::BadArguments(args.to_owned()))
        };
        let key = |text: &str| {
            Key::from_name(text).ok_or_else(|| ParseEventError::UnknownKey(text.to_owned()))
        };

        match kind.trim() {
            "drag" => {
                let (dx, dy) = args
                    .split_once(',')
                    .ok_or_else(|| ParseEventError::BadArguments(args.to_owned()))?;
                Ok(Self::PointerDrag {
                    dx: number(dx)?,
                    dy: number(dy)?,
                })
            }
            "wheel" => Ok(Self::Wheel {
                delta_y: number(args)?,
            }),
            "down" => Ok(Self::KeyDown(key(args)?)),
            "up" => Ok(Self::KeyUp(key(args)?)),
            other => Err(ParseEventError::UnknownKind(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_round_trip_through_display() {
        for name in ["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown", "Space", "x"] {
            let key = Key::from_name(name).unwrap();
            assert_eq!(key.to_string(), name);
        }
        assert_eq!(Key::from_name(" "), Some(Key::Space));
        assert_eq!(Key::from_name("Escape"), None);
    }

    #[test]
    fn parses_script_events() {
        assert_eq!(
            "drag:12,-3".parse::<InputEvent>(),
            Ok(InputEvent::PointerDrag { dx: 12.0, dy: -3.0 })
        );
        assert_eq!(
            "wheel:-100".parse::<InputEvent>(),
            Ok(InputEvent::Wheel { delta_y: -100.0 })
        );
        assert_eq!(
            "down:Space".parse::<InputEvent>(),
            Ok(InputEvent::KeyDown(Key::Space))
        );
        assert_eq!(
            "up:ArrowUp".parse::<InputEvent>(),
            Ok(InputEvent::KeyUp(Key::Arrow(Arrow::Up)))
        );
    }

    #[test]
    fn rejects_malformed_events() {
        assert_eq!(
            "tap:1".parse::<InputEvent>(),
            Err(ParseEventError::UnknownKind("tap".into()))
        );
        assert!(matches!(
            "drag:12".parse::<InputEvent>(),
            Err(ParseEventError::BadArguments(_))
        ));
        assert!(matches!(
            "down:Escape".parse::<InputEvent>(),
            Err(ParseEventError::UnknownKey(_))
        ));
    }
}
