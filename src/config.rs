use crate::gesture::TouchArea;

pub const TITLE: &str = "Darius";
pub const SCREEN_DIAMETER: u32 = 480;
pub const SCREEN_CENTER: f32 = 240.;

pub const TOP_FPS: u32 = 60;
pub const IDLE_FPS: u32 = 10;
pub const IDLE_FRAMES: u32 = 500;

pub const MAX_GESTURE_STRINGS: usize = 20;

pub const HOUR_HAND_LENGTH: f32 = 150.;
pub const MINUTE_HAND_LENGTH: f32 = 200.;
pub const SECOND_HAND_LENGTH: f32 = 200.;

pub const IMAGE_URL: &str = "https://source.unsplash.com/480x480";

#[derive(Debug, Clone)]
pub struct Config {
    pub title: &'static str,
    pub diameter: u32,
    pub center: (f32, f32),
    pub top_fps: u32,
    pub idle_fps: u32,
    pub idle_frames: u32,
    pub log_capacity: usize,
    pub hand_lengths: [f32; 3],
    pub image_url: Option<String>,
    // Off on a desktop, where a bezel disc stands in for the panel.
    pub round_display: bool,
    pub touch_area: TouchArea,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: TITLE,
            diameter: SCREEN_DIAMETER,
            center: (SCREEN_CENTER, SCREEN_CENTER),
            top_fps: TOP_FPS,
            idle_fps: IDLE_FPS,
            idle_frames: IDLE_FRAMES,
            log_capacity: MAX_GESTURE_STRINGS,
            hand_lengths: [HOUR_HAND_LENGTH, MINUTE_HAND_LENGTH, SECOND_HAND_LENGTH],
            image_url: Some(IMAGE_URL.to_owned()),
            round_display: false,
            touch_area: TouchArea::Circle {
                x: SCREEN_CENTER,
                y: SCREEN_CENTER,
                radius: SCREEN_CENTER,
            },
        }
    }
}
