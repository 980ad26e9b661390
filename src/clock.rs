use std::f64::consts::PI;

use chrono::{Local, Timelike};

use crate::config::Config;

/// Wall-clock reading on a 12 hour dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSample {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl TimeSample {
    pub fn now() -> Self {
        Self::from_time(&Local::now())
    }

    pub fn from_time(time: &impl Timelike) -> Self {
        Self {
            hour: time.hour() % 12,
            minute: time.minute(),
            second: time.second(),
            // Leap seconds report up to 1999ms.
            millisecond: (time.nanosecond() / 1_000_000).min(999),
        }
    }

    pub fn hour_fraction(&self) -> f64 {
        f64::from((self.hour % 12) * 60 + self.minute) / 720.
    }

    pub fn minute_fraction(&self) -> f64 {
        (f64::from(self.minute) + f64::from(self.second) / 60.) / 60.
    }

    pub fn second_fraction(&self) -> f64 {
        f64::from(self.second * 1000 + self.millisecond) / 60_000.
    }
}

/// Point on the circle of radius `length` around `center`. Zero is at the
/// top and the percentage grows clockwise.
#[allow(clippy::cast_possible_truncation)]
pub fn percent_to_vector(percent: f64, length: f32, center: (f32, f32)) -> (f32, f32) {
    // Rotate back a quarter turn so zero points up.
    let angle = 2. * PI * percent - PI / 2.;

    (
        angle.cos() as f32 * length + center.0,
        angle.sin() as f32 * length + center.1,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hands {
    pub hour: (f32, f32),
    pub minute: (f32, f32),
    pub second: (f32, f32),
}

impl Hands {
    pub fn project(time: &TimeSample, config: &Config) -> Self {
        let [hour_len, minute_len, second_len] = config.hand_lengths;

        Self {
            hour: percent_to_vector(time.hour_fraction(), hour_len, config.center),
            minute: percent_to_vector(time.minute_fraction(), minute_len, config.center),
            second: percent_to_vector(time.second_fraction(), second_len, config.center),
        }
    }
}
