#![allow(clippy::missing_const_for_fn, clippy::must_use_candidate)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gesture;
pub mod key;
pub mod state;
pub mod texture;
mod text_renderer;

use std::convert::Infallible;
use std::ffi::{c_int, CStr, CString};
use std::mem::{size_of, ManuallyDrop, MaybeUninit};
use std::ptr;
use std::slice;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use sdl2_sys::{
    SDL_CreateRenderer, SDL_CreateTexture, SDL_CreateWindow, SDL_Delay, SDL_DestroyRenderer,
    SDL_DestroyTexture, SDL_DestroyWindow, SDL_Event, SDL_EventType, SDL_GetError, SDL_GetTicks,
    SDL_Init, SDL_LockTexture, SDL_PixelFormatEnum, SDL_PollEvent, SDL_Quit, SDL_RenderCopy,
    SDL_RenderPresent, SDL_Renderer, SDL_RendererFlags, SDL_SetWindowTitle, SDL_Texture,
    SDL_TextureAccess, SDL_UnlockTexture, SDL_Window, SDL_BUTTON_LEFT, SDL_INIT_EVENTS,
    SDL_INIT_TIMER, SDL_INIT_VIDEO, SDL_WINDOWPOS_UNDEFINED_MASK,
};

pub use gesture::Gesture;
pub use key::Key;
pub use text_renderer::FontSize;
use gesture::GestureDetector;
use text_renderer::TextRenderer;
use texture::Texture;

pub struct Framebuffer {
    main_window: ManuallyDrop<Window>,
    running: bool,
    target_fps: u32,
    fps: f64,
    fps_buf: FpsCounter,
    gestures: GestureDetector,
    touch: (f32, f32),
    gesture: Gesture,
}

struct Window {
    width: u32,
    height: u32,
    handle: *mut SDL_Window,
    renderer: *mut SDL_Renderer,
    texture: *mut SDL_Texture,
    title: &'static str,
}

pub struct DrawHandle<'p> {
    width: u32,
    height: u32,
    pixels: &'p mut [u32],
    fps: f64,
}

#[derive(Debug)]
pub enum Event {
    KeyPress(Key),
    KeyRelease(Key),
    MouseMove(i32, i32),
    MouseDown(i32, i32),
    MouseUp(i32, i32),
    FingerDown(i64, f32, f32),
    FingerMotion(i64, f32, f32),
    FingerUp(i64, f32, f32),
}

pub trait MainLoop {
    fn handle_event(&mut self, fb: &mut Framebuffer, event: &Event);
    fn update(&mut self, fb: &mut Framebuffer, dt: f32, time: f64);
    fn render(&mut self, d: &mut DrawHandle);
}

trait CheckErr {
    fn check_err(self, action: &'static str) -> Self;
}

struct FpsCounter {
    measurements: Vec<f64>,
    idx: usize,
    sum: f64,
}

const TEXT_RENDERER: TextRenderer = TextRenderer::new();

const KEYDOWN: u32 = SDL_EventType::SDL_KEYDOWN as u32;
const KEYUP: u32 = SDL_EventType::SDL_KEYUP as u32;
const MOUSEMOTION: u32 = SDL_EventType::SDL_MOUSEMOTION as u32;
const MOUSEBUTTONDOWN: u32 = SDL_EventType::SDL_MOUSEBUTTONDOWN as u32;
const MOUSEBUTTONUP: u32 = SDL_EventType::SDL_MOUSEBUTTONUP as u32;
const FINGERDOWN: u32 = SDL_EventType::SDL_FINGERDOWN as u32;
const FINGERUP: u32 = SDL_EventType::SDL_FINGERUP as u32;
const FINGERMOTION: u32 = SDL_EventType::SDL_FINGERMOTION as u32;
const QUIT: u32 = SDL_EventType::SDL_QUIT as u32;

impl Framebuffer {
    pub fn new(width: u32, height: u32, title: &'static str, target_fps: u32) -> Self {
        init_library();

        let main_window = ManuallyDrop::new(Window::new(width, height, title));
        #[allow(clippy::cast_precision_loss)]
        let touch = (width as f32 / 2., height as f32 / 2.);

        Self {
            main_window,
            running: true,
            target_fps: target_fps.max(1),
            fps: 0.,
            fps_buf: FpsCounter::new(32),
            gestures: GestureDetector::new(),
            touch,
            gesture: Gesture::None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn poll_events(&mut self, state: &mut impl MainLoop) {
        let mut event_ptr = MaybeUninit::<SDL_Event>::uninit();
        let (w, h) = (self.widthf(), self.heightf());

        loop {
            unsafe {
                if SDL_PollEvent(event_ptr.as_mut_ptr()) == 0 {
                    break;
                }

                let event = event_ptr.assume_init();
                let now = current_time_seconds();

                let event = match event.type_ {
                    KEYDOWN if event.key.repeat == 0 => {
                        Event::KeyPress(Key::from_keycode(event.key.keysym.sym))
                    }
                    KEYUP => Event::KeyRelease(Key::from_keycode(event.key.keysym.sym)),
                    MOUSEMOTION => {
                        let (x, y) = (event.motion.x, event.motion.y);
                        self.touch = (x as f32, y as f32);
                        self.gestures.pointer_move(self.touch);
                        Event::MouseMove(x, y)
                    }
                    MOUSEBUTTONDOWN if u32::from(event.button.button) == SDL_BUTTON_LEFT => {
                        let (x, y) = (event.button.x, event.button.y);
                        self.touch = (x as f32, y as f32);
                        self.gestures.pointer_down(self.touch, now);
                        Event::MouseDown(x, y)
                    }
                    MOUSEBUTTONUP if u32::from(event.button.button) == SDL_BUTTON_LEFT => {
                        let (x, y) = (event.button.x, event.button.y);
                        self.touch = (x as f32, y as f32);
                        self.gestures.pointer_up(self.touch, now);
                        Event::MouseUp(x, y)
                    }
                    FINGERDOWN => {
                        let f = event.tfinger;
                        let (x, y) = (f.x * w, f.y * h);
                        self.gestures.finger_down(f.fingerId, (x, y));
                        Event::FingerDown(f.fingerId, x, y)
                    }
                    FINGERMOTION => {
                        let f = event.tfinger;
                        let (x, y) = (f.x * w, f.y * h);
                        self.gestures.finger_move(f.fingerId, (x, y));
                        Event::FingerMotion(f.fingerId, x, y)
                    }
                    FINGERUP => {
                        let f = event.tfinger;
                        self.gestures.finger_up(f.fingerId);
                        Event::FingerUp(f.fingerId, f.x * w, f.y * h)
                    }
                    QUIT => {
                        self.running = false;
                        continue;
                    }
                    _ => continue,
                };

                state.handle_event(self, &event);
            }
        }
    }

    fn show_fps(&mut self, real_time: f64) {
        let elapsed = current_time_seconds() - real_time;

        if elapsed <= 0. {
            return;
        }

        self.fps = self.fps_buf.add_measurement(1. / elapsed);

        self.set_window_title(&format!("{} FPS {:5.3}", self.main_window.title, self.fps));
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn run(&mut self, state: &mut impl MainLoop) {
        while self.running {
            let real_time = current_time_seconds();

            self.poll_events(state);
            self.gesture = self.gestures.poll(real_time);

            let dt = 1. / self.target_fps as f32;
            state.update(self, dt, real_time);

            if !self.running {
                break;
            }

            let mut handle = self.main_window.start_render(self.fps);
            state.render(&mut handle);
            self.main_window.present();

            limit_fps(f64::from(self.target_fps), real_time);
            self.show_fps(real_time);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn widthf(&self) -> f32 {
        self.main_window.width as f32
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn heightf(&self) -> f32 {
        self.main_window.height as f32
    }

    pub fn close(&mut self) {
        self.running = false;
    }

    pub fn set_window_title(&mut self, title: &str) {
        self.main_window.set_window_title(title);
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
    }

    pub fn touch_position(&self) -> (f32, f32) {
        self.touch
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn inject_gesture(&mut self, gesture: Gesture) {
        self.gestures.inject(gesture);
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            ManuallyDrop::drop(&mut self.main_window);
            SDL_Quit();
        }
    }
}

impl Window {
    fn new(width: u32, height: u32, title: &'static str) -> Self {
        let w_int = width as c_int;
        let h_int = height as c_int;
        let handle = create_window(w_int, h_int, title);
        let renderer = create_renderer(handle);
        let texture = create_texture(renderer, w_int, h_int);

        Self {
            width,
            height,
            handle,
            renderer,
            texture,
            title,
        }
    }

    fn start_render(&self, fps: f64) -> DrawHandle {
        let mut ptr: *mut u32 = ptr::null_mut();
        let mut pitch = 0;
        let num_pixels = (self.width * self.height) as usize;

        let pixels = unsafe {
            SDL_LockTexture(
                self.texture,
                ptr::null(),
                ptr::addr_of_mut!(ptr).cast(),
                &mut pitch,
            )
            .check_err("lock texture");

            debug_assert!(pitch / self.width as i32 == size_of::<u32>() as i32);

            slice::from_raw_parts_mut(ptr, num_pixels)
        };

        DrawHandle {
            width: self.width,
            height: self.height,
            pixels,
            fps,
        }
    }

    fn present(&self) {
        unsafe {
            SDL_UnlockTexture(self.texture);
            SDL_RenderCopy(self.renderer, self.texture, ptr::null(), ptr::null());
            SDL_RenderPresent(self.renderer);
        }
    }

    fn set_window_title(&self, title: &str) {
        let Ok(cstr) = CString::new(title) else {
            return;
        };

        unsafe {
            SDL_SetWindowTitle(self.handle, cstr.as_ptr());
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            SDL_DestroyTexture(self.texture);
            SDL_DestroyRenderer(self.renderer);
            SDL_DestroyWindow(self.handle);
        }
    }
}

impl<'p> DrawHandle<'p> {
    pub fn new(width: u32, height: u32, pixels: &'p mut [u32]) -> Self {
        assert_eq!(pixels.len(), (width * height) as usize);

        Self {
            width,
            height,
            pixels,
            fps: 0.,
        }
    }

    pub fn clear(&mut self) {
        self.fill(0);
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color | 0xff_00_00_00);
    }

    pub fn set(&mut self, x: u32, y: u32, color: u32) {
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = y * self.width + x;
        self.pixels[idx as usize] = color | 0xff_00_00_00;
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn draw_text(&mut self, pos_x: i32, pos_y: i32, color: u32, size: FontSize, text: &str) {
        TEXT_RENDERER.render(self, pos_x, pos_y, color, size, text);
    }

    // Texture alpha is scaled by `alpha`.
    pub fn draw_texture(&mut self, texture: &Texture, pos_x: i32, pos_y: i32, alpha: u8) {
        if alpha == 0 {
            return;
        }

        let tex_w = texture.width() as usize;
        let rows = texture.pixels().chunks_exact(tex_w.max(1));

        for (row, line) in rows.take(texture.height() as usize).enumerate() {
            let Ok(y) = u32::try_from(pos_y + row as i32) else {
                continue;
            };
            if y >= self.height {
                break;
            }

            for (col, &src) in line.iter().enumerate() {
                let Ok(x) = u32::try_from(pos_x + col as i32) else {
                    continue;
                };
                if x >= self.width {
                    break;
                }

                let idx = (y * self.width + x) as usize;
                self.pixels[idx] = texture::blend(self.pixels[idx], src, alpha);
            }
        }
    }

    pub fn draw_fps(&mut self, pos_x: i32, pos_y: i32) {
        let text = format!("{:.0} FPS", self.fps);

        self.draw_text(pos_x, pos_y, 0x00_e4_30, FontSize::Large, &text);
    }
}

impl OriginDimensions for DrawHandle<'_> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for DrawHandle<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };

            let rgb = u32::from_be_bytes([0, color.r(), color.g(), color.b()]);
            self.set(x, y, rgb);
        }

        Ok(())
    }
}

impl CheckErr for c_int {
    fn check_err(self, action: &'static str) -> Self {
        if self == 0 {
            return self;
        }

        let err_str = unsafe { CStr::from_ptr(SDL_GetError()) };

        panic!("Failed to {action}: {err_str:?}");
    }
}

impl<T> CheckErr for *mut T {
    fn check_err(self, action: &'static str) -> Self {
        if !self.is_null() {
            return self;
        }

        let err_str = unsafe { CStr::from_ptr(SDL_GetError()) };

        panic!("Failed to {action}: {err_str:?}");
    }
}

impl FpsCounter {
    pub fn new(num_measurements: usize) -> Self {
        Self {
            measurements: vec![0.; num_measurements],
            idx: 0,
            sum: 0.,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn add_measurement(&mut self, fps: f64) -> f64 {
        let num_measurements = self.measurements.len();

        self.sum -= self.measurements[self.idx];
        self.sum += fps;
        self.measurements[self.idx] = fps;
        self.idx += 1;
        self.idx %= num_measurements;

        self.sum / (num_measurements as f64)
    }
}

fn init_library() {
    let flags = SDL_INIT_VIDEO | SDL_INIT_EVENTS | SDL_INIT_TIMER;

    unsafe { SDL_Init(flags) }.check_err("initialize SDL");
}

fn create_window(w: c_int, h: c_int, title: &'static str) -> *mut SDL_Window {
    let cstr = CString::new(title).expect("Title contains null byte");
    let any_pos = SDL_WINDOWPOS_UNDEFINED_MASK as c_int;
    let flags = 0;

    unsafe { SDL_CreateWindow(cstr.as_ptr(), any_pos, any_pos, w, h, flags) }
        .check_err("create window")
}

fn create_renderer(window: *mut SDL_Window) -> *mut SDL_Renderer {
    let flags = SDL_RendererFlags::SDL_RENDERER_ACCELERATED as u32;

    unsafe { SDL_CreateRenderer(window, -1, flags) }.check_err("create renderer")
}

fn create_texture(renderer: *mut SDL_Renderer, w: c_int, h: c_int) -> *mut SDL_Texture {
    let format = SDL_PixelFormatEnum::SDL_PIXELFORMAT_ARGB8888 as u32;
    let access = SDL_TextureAccess::SDL_TEXTUREACCESS_STREAMING as c_int;

    unsafe { SDL_CreateTexture(renderer, format, access, w, h) }.check_err("create texture")
}

fn current_time_seconds() -> f64 {
    let ms = unsafe { SDL_GetTicks() };

    f64::from(ms) / 1000.0
}

fn limit_fps(target_fps: f64, real_time: f64) {
    let frame_end = current_time_seconds();
    let frame_time = frame_end - real_time;
    let to_sleep_f = 1000.0 / target_fps - frame_time * 1000.0;

    if to_sleep_f.is_sign_negative() {
        return;
    }

    let to_sleep = to_sleep_f.floor() as u32;

    unsafe { SDL_Delay(to_sleep) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::{Point, Primitive};
    use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle};
    use embedded_graphics::Drawable;

    #[test]
    fn fps_counter_averages_over_window() {
        let mut counter = FpsCounter::new(4);

        counter.add_measurement(60.);
        counter.add_measurement(60.);
        counter.add_measurement(60.);
        assert_eq!(counter.add_measurement(60.), 60.);
        assert_eq!(counter.add_measurement(20.), 50.);
    }

    #[test]
    fn primitives_are_clipped_to_the_buffer() {
        let mut pixels = vec![0; 16 * 16];
        let mut d = DrawHandle::new(16, 16, &mut pixels);

        Circle::with_center(Point::new(0, 0), 20)
            .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
            .draw(&mut d)
            .ok();

        assert_eq!(d.get(0, 0), Some(0xff_ff_ff_ff));
        assert_eq!(d.get(15, 15), Some(0));
    }

    #[test]
    fn reads_outside_the_buffer_are_empty() {
        let mut pixels = vec![0; 4 * 4];
        let d = DrawHandle::new(4, 4, &mut pixels);

        assert_eq!(d.get(3, 3), Some(0));
        assert_eq!(d.get(4, 0), None);
        assert_eq!(d.get(0, 4), None);
    }

    #[test]
    fn wide_lines_cover_their_width() {
        let mut pixels = vec![0; 32 * 32];
        let mut d = DrawHandle::new(32, 32, &mut pixels);

        Line::new(Point::new(16, 16), Point::new(16, 2))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::WHITE, 6))
            .draw(&mut d)
            .ok();

        assert_eq!(d.get(14, 8), Some(0xff_ff_ff_ff));
        assert_eq!(d.get(17, 8), Some(0xff_ff_ff_ff));
        assert_eq!(d.get(25, 8), Some(0));
    }

    #[test]
    fn textures_blend_and_clip() {
        let image = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        let texture = Texture::from_rgba(&image);
        let mut pixels = vec![0; 8 * 8];
        let mut d = DrawHandle::new(8, 8, &mut pixels);

        d.fill(0x00_00_ff);
        d.draw_texture(&texture, 6, -2, 255);

        assert_eq!(d.get(6, 0), Some(0xff_ff_00_00));
        assert_eq!(d.get(7, 1), Some(0xff_ff_00_00));
        assert_eq!(d.get(6, 2), Some(0xff_00_00_ff));
        assert_eq!(d.get(5, 0), Some(0xff_00_00_ff));
    }

    #[test]
    fn text_lands_inside_its_box() {
        let mut pixels = vec![0; 64 * 32];
        let mut d = DrawHandle::new(64, 32, &mut pixels);

        d.draw_text(2, 2, 0xff_ff_ff, FontSize::Large, "W");

        let glyph = TextRenderer::glyph_size(FontSize::Large);
        let lit = (0..32u32)
            .flat_map(|y| (0..64u32).map(move |x| (x, y)))
            .filter(|&(x, y)| d.get(x, y) != Some(0))
            .collect::<Vec<_>>();

        assert!(!lit.is_empty());
        assert!(lit
            .iter()
            .all(|&(x, y)| x >= 2 && x < 2 + glyph.width && y >= 2 && y < 2 + glyph.height));
    }
}
