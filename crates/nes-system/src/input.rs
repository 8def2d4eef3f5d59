//! Input handling.
//!
//! Two layers:
//! 1. `NesButton` — logical button names mapped to controller bit positions.
//! 2. `InputQueue` — frame-stamped button events for scripted sequences,
//!    applied to controller 1 at each frame boundary.

use std::collections::VecDeque;

use crate::controller::{self, Controller};

/// Logical button on the NES controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NesButton {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl NesButton {
    /// Bit position of this button in the shift register.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::A => controller::button::A,
            Self::B => controller::button::B,
            Self::Select => controller::button::SELECT,
            Self::Start => controller::button::START,
            Self::Up => controller::button::UP,
            Self::Down => controller::button::DOWN,
            Self::Left => controller::button::LEFT,
            Self::Right => controller::button::RIGHT,
        }
    }
}

/// A timed button event.
#[derive(Debug, Clone)]
pub struct InputEvent {
    /// Frame number at which this event fires.
    pub frame: u64,
    pub button: NesButton,
    /// True = press, false = release.
    pub pressed: bool,
}

/// Frame-stamped input queue for scripted button sequences.
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Enqueue an event, keeping the queue ordered by frame.
    pub fn push(&mut self, event: InputEvent) {
        let pos = self
            .events
            .iter()
            .position(|e| e.frame > event.frame)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    /// Enqueue a press at `at_frame` and its release `hold_frames` later.
    pub fn enqueue_button(&mut self, button: NesButton, at_frame: u64, hold_frames: u64) {
        self.push(InputEvent {
            frame: at_frame,
            button,
            pressed: true,
        });
        self.push(InputEvent {
            frame: at_frame + hold_frames,
            button,
            pressed: false,
        });
    }

    /// Apply all events due at `frame` to controller 1.
    pub fn process(&mut self, frame: u64, controller: &mut Controller) {
        while let Some(event) = self.events.front() {
            if event.frame > frame {
                break;
            }
            let event = self.events.pop_front().expect("front was Some");
            controller.set_button(event.button.bit(), event.pressed);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_button_creates_press_and_release() {
        let mut queue = InputQueue::new();
        queue.enqueue_button(NesButton::A, 10, 3);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn process_applies_due_events() {
        let mut queue = InputQueue::new();
        let mut ctrl = Controller::new();

        queue.enqueue_button(NesButton::A, 5, 3);

        queue.process(4, &mut ctrl);
        assert_eq!(ctrl.buttons() & 0x01, 0x00);

        queue.process(5, &mut ctrl);
        assert_eq!(ctrl.buttons() & 0x01, 0x01);

        queue.process(8, &mut ctrl);
        assert_eq!(ctrl.buttons() & 0x01, 0x00);
    }

    #[test]
    fn events_stay_frame_ordered() {
        let mut queue = InputQueue::new();
        queue.enqueue_button(NesButton::B, 20, 1);
        queue.enqueue_button(NesButton::A, 10, 1);
        let mut ctrl = Controller::new();
        queue.process(10, &mut ctrl);
        assert_eq!(ctrl.buttons(), 0x01, "only the frame-10 press applied");
    }
}
