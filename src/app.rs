use std::sync::Arc;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{Point, Primitive};
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle};
use embedded_graphics::Drawable;
use log::{debug, info};

use crate::clock::{Hands, TimeSample};
use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::{BackgroundLoader, ImageSource};
use crate::state::{AppState, FrameEffects, FrameInput, Page};
use crate::texture::Texture;
use crate::{DrawHandle, Event, FontSize, Framebuffer, Gesture, Key, MainLoop};

const DARK_PURPLE: Rgb888 = Rgb888::new(0x70, 0x1f, 0x7e);
const HUB_DIAMETER: u32 = 20;
const HAND_WIDTHS: [u32; 3] = [12, 8, 4];

pub struct App<S> {
    config: Config,
    state: AppState,
    background: Option<Texture>,
    loader: BackgroundLoader<S>,
    time: TimeSample,
    hands: Hands,
    failure: Option<FetchError>,
}

impl<S: ImageSource> App<S> {
    /// Loads the first background synchronously, before any window exists.
    pub fn start(config: Config, source: S) -> Result<Self, FetchError> {
        let background = match &config.image_url {
            Some(url) => {
                info!("fetching background from {url}");
                Some(Texture::from_rgba(&source.fetch(url)?))
            }
            None => None,
        };

        let time = TimeSample::now();
        let hands = Hands::project(&time, &config);

        Ok(Self {
            state: AppState::new(&config),
            loader: BackgroundLoader::new(Arc::new(source)),
            config,
            background,
            time,
            hands,
            failure: None,
        })
    }

    pub fn tick(&mut self, input: &FrameInput) -> Result<FrameEffects, FetchError> {
        if let Some(result) = self.loader.poll() {
            let texture = result?;
            info!("background refreshed");
            self.background = Some(texture);
        }

        let effects = self.state.step(input);

        if effects.refresh_background {
            if let Some(url) = &self.config.image_url {
                if !self.loader.request(url) {
                    debug!("background refresh already running");
                }
            }
        }

        self.time = TimeSample::now();
        self.hands = Hands::project(&self.time, &self.config);

        Ok(effects)
    }

    pub fn finish(self) -> Result<(), FetchError> {
        self.failure.map_or(Ok(()), Err)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    fn draw_bezel(&self, d: &mut DrawHandle) {
        if self.config.round_display {
            d.fill(rgb(DARK_PURPLE));
            return;
        }

        // Simulate the round panel on a square window.
        d.clear();
        Circle::with_center(point(self.config.center), self.config.diameter)
            .into_styled(PrimitiveStyle::with_fill(DARK_PURPLE))
            .draw(d)
            .ok();
    }

    fn draw_clock(&self, d: &mut DrawHandle) {
        if let Some(background) = &self.background {
            d.draw_texture(background, 0, 0, u8::MAX);
        }

        let center = point(self.config.center);
        let tips = [self.hands.hour, self.hands.minute, self.hands.second];

        for (tip, width) in tips.into_iter().zip(HAND_WIDTHS) {
            Line::new(center, point(tip))
                .into_styled(PrimitiveStyle::with_stroke(Rgb888::WHITE, width))
                .draw(d)
                .ok();
        }

        Circle::with_center(center, HUB_DIAMETER)
            .into_styled(PrimitiveStyle::with_fill(Rgb888::BLACK))
            .draw(d)
            .ok();
    }

    fn draw_overlay(&self, d: &mut DrawHandle) {
        if let Some(background) = &self.background {
            d.draw_texture(background, 0, 0, self.state.overlay_alpha());
        }

        let TimeSample {
            hour,
            minute,
            second,
            ..
        } = self.time;
        let hour = if hour == 0 { 12 } else { hour };
        let clock = format!("{hour:2}:{minute:02}:{second:02}");

        d.draw_text(200, 70, rgb(Rgb888::WHITE), FontSize::Large, &clock);

        for (row, label) in (0..).zip(self.state.log().entries()) {
            d.draw_text(130, 110 + row * 14, rgb(Rgb888::WHITE), FontSize::Small, label);
        }
    }
}

impl<S: ImageSource> MainLoop for App<S> {
    fn handle_event(&mut self, fb: &mut Framebuffer, event: &Event) {
        let Event::KeyPress(key) = event else {
            return;
        };

        // Keys stand in for the touch panel on a desktop.
        let gesture = match key {
            Key::Escape | Key::Q => {
                fb.close();
                return;
            }
            Key::Left => Gesture::SwipeLeft,
            Key::Right => Gesture::SwipeRight,
            Key::Up => Gesture::SwipeUp,
            Key::Down => Gesture::SwipeDown,
            Key::Space => Gesture::Tap,
            Key::Return => Gesture::DoubleTap,
            Key::Other(_) => return,
        };

        fb.inject_gesture(gesture);
    }

    fn update(&mut self, fb: &mut Framebuffer, _dt: f32, _time: f64) {
        let input = FrameInput {
            touch: fb.touch_position(),
            gesture: fb.gesture(),
        };

        match self.tick(&input) {
            Ok(effects) => {
                if let Some(fps) = effects.target_fps {
                    fb.set_target_fps(fps);
                }
            }
            Err(err) => {
                self.failure = Some(err);
                fb.close();
            }
        }
    }

    fn render(&mut self, d: &mut DrawHandle) {
        self.draw_bezel(d);

        match self.state.page() {
            Page::Clock => self.draw_clock(d),
            Page::Overlay => self.draw_overlay(d),
        }

        d.draw_fps(200, 440);
    }
}

fn rgb(color: Rgb888) -> u32 {
    u32::from_be_bytes([0, color.r(), color.g(), color.b()])
}

#[allow(clippy::cast_possible_truncation)]
fn point((x, y): (f32, f32)) -> Point {
    Point::new(x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::decode;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    // Good image first, garbage afterwards.
    #[derive(Default)]
    struct Flaky {
        calls: AtomicUsize,
    }

    impl ImageSource for Flaky {
        fn fetch(&self, _url: &str) -> Result<RgbaImage, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(RgbaImage::from_pixel(480, 480, Rgba([0, 0x80, 0, 0xff])))
            } else {
                decode(b"\x89PNG truncated", 480)
            }
        }
    }

    struct Offline;

    impl ImageSource for Offline {
        fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError> {
            Err(FetchError::Network {
                url: url.to_owned(),
                source: "connection refused".into(),
            })
        }
    }

    fn idle() -> FrameInput {
        FrameInput {
            touch: (240., 240.),
            gesture: Gesture::None,
        }
    }

    fn render(app: &mut App<impl ImageSource>) -> Vec<u32> {
        let mut pixels = vec![0; 480 * 480];
        let mut d = DrawHandle::new(480, 480, &mut pixels);
        app.render(&mut d);
        pixels
    }

    #[test]
    fn failed_first_fetch_stops_before_startup() {
        let err = App::start(Config::default(), Offline).err();

        assert!(matches!(err, Some(FetchError::Network { .. })));
    }

    #[test]
    fn undecodable_first_image_stops_before_startup() {
        let source = Flaky {
            calls: AtomicUsize::new(1),
        };

        let err = App::start(Config::default(), source).err();

        assert!(matches!(err, Some(FetchError::Decode(_))));
    }

    #[test]
    fn no_url_means_no_fetch() {
        let config = Config {
            image_url: None,
            ..Config::default()
        };

        let app = App::start(config, Offline).expect("started");

        assert!(!app.has_background());
        assert!(app.finish().is_ok());
    }

    #[test]
    fn failed_refresh_is_fatal() {
        let mut app = App::start(Config::default(), Flaky::default()).expect("started");
        assert!(app.has_background());

        let swipe = FrameInput {
            gesture: Gesture::SwipeLeft,
            ..idle()
        };
        let effects = app.tick(&swipe).expect("first frame");
        assert!(effects.refresh_background);

        for _ in 0..500 {
            match app.tick(&idle()) {
                Ok(_) => thread::sleep(Duration::from_millis(10)),
                Err(err) => {
                    assert!(matches!(err, FetchError::Decode(_)));
                    return;
                }
            }
        }
        panic!("refresh never failed");
    }

    #[test]
    fn clock_page_draws_bezel_hands_and_hub() {
        let config = Config {
            image_url: None,
            ..Config::default()
        };
        let mut app = App::start(config, Offline).expect("started");

        let pixels = render(&mut app);
        let at = |x: usize, y: usize| pixels[y * 480 + x];

        assert_eq!(at(240, 240), 0xff_00_00_00);
        assert_eq!(at(0, 0), 0xff_00_00_00);
        assert_eq!(at(240, 470), 0xff_70_1f_7e);
    }

    #[test]
    fn background_covers_the_clock_page() {
        let mut app = App::start(Config::default(), Flaky::default()).expect("started");

        let pixels = render(&mut app);

        assert_eq!(pixels[5 * 480 + 5], 0xff_00_80_00);
    }

    #[test]
    fn overlay_fades_in_after_swipe_right() {
        let mut app = App::start(Config::default(), Flaky::default()).expect("started");
        let swipe = FrameInput {
            gesture: Gesture::SwipeRight,
            ..idle()
        };

        app.tick(&swipe).expect("swipe");
        assert_eq!(app.state().page(), Page::Overlay);

        // Fully transparent on the first frame, so the bezel shows through.
        let pixels = render(&mut app);
        assert_eq!(pixels[5 * 480 + 5], 0xff_00_00_00);

        for _ in 0..30 {
            app.tick(&idle()).expect("frame");
        }

        let pixels = render(&mut app);
        assert_eq!(pixels[5 * 480 + 5], 0xff_00_80_00);
    }
}
