use log::{debug, info};

use crate::config::Config;
use crate::gesture::{Gesture, TouchArea};

/// Edge detector over the per-frame gesture stream. A gesture fires on the
/// first frame it appears and stays quiet while it is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    #[default]
    Idle,
    Active(Gesture),
}

impl Trigger {
    pub fn advance(self, current: Gesture) -> (Self, Option<Gesture>) {
        match (self, current) {
            (_, Gesture::None) => (Self::Idle, None),
            (Self::Active(last), current) if last == current => (self, None),
            (_, current) => (Self::Active(current), Some(current)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureLog {
    entries: Vec<&'static str>,
    capacity: usize,
}

impl GestureLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, gesture: Gesture) {
        let Some(label) = gesture.label() else {
            return;
        };

        self.entries.push(label);

        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
    }

    pub fn entries(&self) -> &[&'static str] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Clock,
    Overlay,
}

impl Page {
    pub fn flip(self) -> Self {
        match self {
            Self::Clock => Self::Overlay,
            Self::Overlay => Self::Clock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub touch: (f32, f32),
    pub gesture: Gesture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEffects {
    pub target_fps: Option<u32>,
    pub refresh_background: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    page: Page,
    frames_since_touch: u32,
    frames_since_page_change: u32,
    target_fps: u32,
    top_fps: u32,
    idle_fps: u32,
    idle_frames: u32,
    trigger: Trigger,
    log: GestureLog,
    touch_area: TouchArea,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            page: Page::Clock,
            frames_since_touch: 0,
            frames_since_page_change: 0,
            target_fps: config.top_fps,
            top_fps: config.top_fps,
            idle_fps: config.idle_fps,
            idle_frames: config.idle_frames,
            trigger: Trigger::Idle,
            log: GestureLog::new(config.log_capacity),
            touch_area: config.touch_area,
        }
    }

    pub fn step(&mut self, input: &FrameInput) -> FrameEffects {
        let mut effects = FrameEffects::default();

        let (trigger, fired) = self.trigger.advance(input.gesture);
        self.trigger = trigger;

        self.frames_since_touch = self.frames_since_touch.saturating_add(1);
        self.frames_since_page_change = self.frames_since_page_change.saturating_add(1);

        if input.gesture != Gesture::None && self.touch_area.contains(input.touch) {
            self.frames_since_touch = 0;

            if self.target_fps != self.top_fps {
                info!("touch, restoring {} fps", self.top_fps);
                self.target_fps = self.top_fps;
                effects.target_fps = Some(self.top_fps);
            }

            if let Some(gesture) = fired {
                self.on_gesture(gesture, &mut effects);
            }
        }

        if self.frames_since_touch > self.idle_frames && self.target_fps == self.top_fps {
            info!(
                "no touch for {} frames, dropping to {} fps",
                self.frames_since_touch, self.idle_fps
            );
            self.target_fps = self.idle_fps;
            effects.target_fps = Some(self.idle_fps);
        }

        effects
    }

    fn on_gesture(&mut self, gesture: Gesture, effects: &mut FrameEffects) {
        debug!("{}", gesture.label().unwrap_or_default());
        self.log.record(gesture);

        match gesture {
            Gesture::SwipeRight => {
                self.page = self.page.flip();
                self.frames_since_page_change = 0;
                info!("page {:?}", self.page);
            }
            Gesture::SwipeLeft => effects.refresh_background = true,
            _ => (),
        }
    }

    pub fn overlay_alpha(&self) -> u8 {
        u8::try_from(self.frames_since_page_change.saturating_mul(10)).unwrap_or(u8::MAX)
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn frames_since_touch(&self) -> u32 {
        self.frames_since_touch
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn log(&self) -> &GestureLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureDetector;

    const INSIDE: (f32, f32) = (240., 240.);
    const OUTSIDE: (f32, f32) = (2., 2.);

    fn frame(gesture: Gesture) -> FrameInput {
        FrameInput {
            touch: INSIDE,
            gesture,
        }
    }

    fn tap_release(state: &mut AppState, gesture: Gesture) -> FrameEffects {
        let effects = state.step(&frame(gesture));
        state.step(&frame(Gesture::None));
        effects
    }

    #[test]
    fn trigger_fires_once_per_occurrence() {
        let t = Trigger::Idle;
        let (t, fired) = t.advance(Gesture::Hold);
        assert_eq!(fired, Some(Gesture::Hold));
        let (t, fired) = t.advance(Gesture::Hold);
        assert_eq!(fired, None);
        let (t, fired) = t.advance(Gesture::Drag);
        assert_eq!(fired, Some(Gesture::Drag));
        let (t, fired) = t.advance(Gesture::None);
        assert_eq!((t, fired), (Trigger::Idle, None));
        let (_, fired) = t.advance(Gesture::Drag);
        assert_eq!(fired, Some(Gesture::Drag));
    }

    #[test]
    fn gestures_are_logged_in_order() {
        let mut state = AppState::new(&Config::default());
        let sequence = [Gesture::Tap, Gesture::SwipeUp, Gesture::DoubleTap];

        for gesture in sequence {
            tap_release(&mut state, gesture);
        }

        assert_eq!(
            state.log().entries(),
            ["GESTURE TAP", "GESTURE SWIPE UP", "GESTURE DOUBLETAP"]
        );
    }

    #[test]
    fn twentieth_gesture_clears_the_log() {
        let mut state = AppState::new(&Config::default());

        for _ in 0..19 {
            tap_release(&mut state, Gesture::Tap);
        }
        assert_eq!(state.log().len(), 19);

        state.step(&frame(Gesture::Tap));
        assert!(state.log().is_empty());
    }

    #[test]
    fn held_gesture_logs_once() {
        let mut state = AppState::new(&Config::default());

        for _ in 0..30 {
            state.step(&frame(Gesture::Hold));
        }

        assert_eq!(state.log().entries(), ["GESTURE HOLD"]);
        assert_eq!(state.frames_since_touch(), 0);
    }

    #[test]
    fn gestures_outside_the_area_are_ignored() {
        let mut state = AppState::new(&Config::default());

        state.step(&FrameInput {
            touch: OUTSIDE,
            gesture: Gesture::SwipeRight,
        });

        assert!(state.log().is_empty());
        assert_eq!(state.page(), Page::Clock);
        assert_eq!(state.frames_since_touch(), 1);
    }

    #[test]
    fn idle_drops_frame_rate_once_and_touch_restores_it() {
        let mut state = AppState::new(&Config::default());

        for _ in 0..500 {
            assert_eq!(state.step(&frame(Gesture::None)), FrameEffects::default());
        }

        let effects = state.step(&frame(Gesture::None));
        assert_eq!(effects.target_fps, Some(10));
        assert_eq!(state.target_fps(), 10);

        for _ in 0..100 {
            assert_eq!(state.step(&frame(Gesture::None)).target_fps, None);
        }

        let effects = state.step(&frame(Gesture::Tap));
        assert_eq!(effects.target_fps, Some(60));
        assert_eq!(state.target_fps(), 60);
        assert_eq!(state.frames_since_touch(), 0);
    }

    #[test]
    fn swipe_right_flips_page_and_restarts_fade() {
        let mut state = AppState::new(&Config::default());

        for _ in 0..40 {
            state.step(&frame(Gesture::None));
        }
        assert_eq!(state.overlay_alpha(), 255);

        state.step(&frame(Gesture::SwipeRight));
        assert_eq!(state.page(), Page::Overlay);
        assert_eq!(state.overlay_alpha(), 0);

        state.step(&frame(Gesture::SwipeRight));
        assert_eq!(state.page(), Page::Overlay);
        assert_eq!(state.overlay_alpha(), 10);

        for _ in 0..24 {
            state.step(&frame(Gesture::None));
        }
        assert_eq!(state.overlay_alpha(), 250);
        state.step(&frame(Gesture::None));
        assert_eq!(state.overlay_alpha(), 255);

        tap_release(&mut state, Gesture::SwipeRight);
        assert_eq!(state.page(), Page::Clock);
    }

    #[test]
    fn swipe_left_requests_refresh_on_the_edge_only() {
        let mut state = AppState::new(&Config::default());

        assert!(state.step(&frame(Gesture::SwipeLeft)).refresh_background);
        assert!(!state.step(&frame(Gesture::SwipeLeft)).refresh_background);
        assert!(!state.step(&frame(Gesture::Tap)).refresh_background);
        assert!(state.step(&frame(Gesture::SwipeLeft)).refresh_background);
    }

    #[test]
    fn two_queued_swipes_flip_the_page_twice() {
        let mut state = AppState::new(&Config::default());
        let mut gd = GestureDetector::new();

        gd.inject(Gesture::SwipeRight);
        gd.inject(Gesture::SwipeRight);

        for n in 0..4_u32 {
            state.step(&frame(gd.poll(f64::from(n) / 60.)));
        }

        assert_eq!(state.page(), Page::Clock);
        assert_eq!(
            state.log().entries(),
            ["GESTURE SWIPE RIGHT", "GESTURE SWIPE RIGHT"]
        );
    }
}
