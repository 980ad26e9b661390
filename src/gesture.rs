use std::collections::VecDeque;

const DOUBLE_TAP_WINDOW: f64 = 0.3;
const DOUBLE_TAP_RANGE: f32 = 20.;
const HOLD_DELAY: f64 = 0.25;
const DRAG_MIN_DISTANCE: f32 = 10.;
const SWIPE_MIN_DISTANCE: f32 = 40.;
const SWIPE_MIN_SPEED: f32 = 250.;
const PINCH_STEP: f32 = 8.;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    #[default]
    None,
    Tap,
    DoubleTap,
    Hold,
    Drag,
    SwipeRight,
    SwipeLeft,
    SwipeUp,
    SwipeDown,
    PinchIn,
    PinchOut,
}

impl Gesture {
    pub fn label(self) -> Option<&'static str> {
        let label = match self {
            Self::None => return None,
            Self::Tap => "GESTURE TAP",
            Self::DoubleTap => "GESTURE DOUBLETAP",
            Self::Hold => "GESTURE HOLD",
            Self::Drag => "GESTURE DRAG",
            Self::SwipeRight => "GESTURE SWIPE RIGHT",
            Self::SwipeLeft => "GESTURE SWIPE LEFT",
            Self::SwipeUp => "GESTURE SWIPE UP",
            Self::SwipeDown => "GESTURE SWIPE DOWN",
            Self::PinchIn => "GESTURE PINCH IN",
            Self::PinchOut => "GESTURE PINCH OUT",
        };

        Some(label)
    }
}

/// Region of the screen that accepts touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchArea {
    Rect { x: f32, y: f32, width: f32, height: f32 },
    Circle { x: f32, y: f32, radius: f32 },
}

impl TouchArea {
    pub fn contains(&self, (px, py): (f32, f32)) -> bool {
        match *self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => px >= x && px < x + width && py >= y && py < y + height,
            Self::Circle { x, y, radius } => distance((x, y), (px, py)) <= radius,
        }
    }
}

#[derive(Debug, Default)]
pub struct GestureDetector {
    pending: VecDeque<Gesture>,
    last_queued: Option<Gesture>,
    press: Option<Press>,
    last_tap: Option<((f32, f32), f64)>,
    fingers: Vec<(i64, (f32, f32))>,
    pinch: Option<Pinch>,
}

#[derive(Debug)]
struct Press {
    start: (f32, f32),
    pos: (f32, f32),
    time: f64,
    dragging: bool,
    pinched: bool,
}

#[derive(Debug)]
struct Pinch {
    spacing: f32,
    gesture: Gesture,
}

impl GestureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, pos: (f32, f32), time: f64) {
        let tap = match self.last_tap {
            Some((last_pos, last_time))
                if time - last_time <= DOUBLE_TAP_WINDOW
                    && distance(last_pos, pos) <= DOUBLE_TAP_RANGE =>
            {
                Gesture::DoubleTap
            }
            _ => Gesture::Tap,
        };

        self.last_tap = (tap == Gesture::Tap).then_some((pos, time));
        self.pending.push_back(tap);
        self.press = Some(Press {
            start: pos,
            pos,
            time,
            dragging: false,
            pinched: self.pinch.is_some(),
        });
    }

    pub fn pointer_move(&mut self, pos: (f32, f32)) {
        let Some(press) = self.press.as_mut() else {
            return;
        };

        press.pos = pos;

        if !press.dragging && distance(press.start, pos) >= DRAG_MIN_DISTANCE {
            press.dragging = true;
        }
    }

    pub fn pointer_up(&mut self, pos: (f32, f32), time: f64) {
        let Some(mut press) = self.press.take() else {
            return;
        };

        press.pos = pos;

        if distance(press.start, pos) >= DRAG_MIN_DISTANCE {
            press.dragging = true;
        }

        if !press.dragging {
            return;
        }

        self.last_tap = None;

        if press.pinched {
            return;
        }

        let dx = press.pos.0 - press.start.0;
        let dy = press.pos.1 - press.start.1;
        let travelled = dx.hypot(dy);
        #[allow(clippy::cast_possible_truncation)]
        let elapsed = (time - press.time).max(1e-3) as f32;

        if travelled >= SWIPE_MIN_DISTANCE && travelled / elapsed >= SWIPE_MIN_SPEED {
            self.pending.push_back(swipe_direction(dx, dy));
        }
    }

    pub fn finger_down(&mut self, id: i64, pos: (f32, f32)) {
        self.fingers.retain(|&(other, _)| other != id);
        self.fingers.push((id, pos));

        if self.fingers.len() == 2 {
            self.pinch = Some(Pinch {
                spacing: self.finger_spacing(),
                gesture: Gesture::None,
            });

            if let Some(press) = self.press.as_mut() {
                press.pinched = true;
            }
        }
    }

    pub fn finger_move(&mut self, id: i64, pos: (f32, f32)) {
        if let Some(finger) = self.fingers.iter_mut().find(|(other, _)| *other == id) {
            finger.1 = pos;
        }

        if self.fingers.len() != 2 {
            return;
        }

        let spacing = self.finger_spacing();
        let Some(pinch) = self.pinch.as_mut() else {
            return;
        };

        let delta = spacing - pinch.spacing;

        if delta.abs() >= PINCH_STEP {
            pinch.gesture = if delta < 0. {
                Gesture::PinchIn
            } else {
                Gesture::PinchOut
            };
            pinch.spacing = spacing;
        }
    }

    pub fn finger_up(&mut self, id: i64) {
        self.fingers.retain(|&(other, _)| other != id);

        if self.fingers.len() < 2 {
            self.pinch = None;
        }
    }

    pub fn inject(&mut self, gesture: Gesture) {
        if gesture != Gesture::None {
            self.pending.push_back(gesture);
        }
    }

    /// Gesture for the current frame. Queued one-shot gestures come out one
    /// per call, ahead of the continuous ones.
    pub fn poll(&mut self, time: f64) -> Gesture {
        if let Some(&next) = self.pending.front() {
            // Repeats need an empty frame between them to show up as new.
            if self.last_queued.take() == Some(next) {
                return Gesture::None;
            }

            self.pending.pop_front();
            self.last_queued = Some(next);
            return next;
        }

        self.last_queued = None;

        if let Some(pinch) = &self.pinch {
            if pinch.gesture != Gesture::None {
                return pinch.gesture;
            }
        }

        match &self.press {
            Some(press) if press.pinched => Gesture::None,
            Some(press) if press.dragging => Gesture::Drag,
            Some(press) if time - press.time >= HOLD_DELAY => Gesture::Hold,
            _ => Gesture::None,
        }
    }

    fn finger_spacing(&self) -> f32 {
        match self.fingers.as_slice() {
            [(_, a), (_, b)] => distance(*a, *b),
            _ => 0.,
        }
    }
}

fn swipe_direction(dx: f32, dy: f32) -> Gesture {
    if dx.abs() >= dy.abs() {
        if dx > 0. {
            Gesture::SwipeRight
        } else {
            Gesture::SwipeLeft
        }
    } else if dy > 0. {
        Gesture::SwipeDown
    } else {
        Gesture::SwipeUp
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
