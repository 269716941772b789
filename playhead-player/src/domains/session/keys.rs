use crate::domains::seek::SeekDirection;

/// Remote-control input the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    PlayPause,
    /// `repeat` counts key repeats while held, 0 for a single press.
    Seek { direction: SeekDirection, repeat: u32 },
    Next,
    Previous,
    Stop,
}

impl KeyAction {
    pub fn seek_forward(repeat: u32) -> Self {
        KeyAction::Seek {
            direction: SeekDirection::Forward,
            repeat,
        }
    }

    pub fn seek_backward(repeat: u32) -> Self {
        KeyAction::Seek {
            direction: SeekDirection::Backward,
            repeat,
        }
    }
}
