use darius::{DrawHandle, Event, FontSize, Framebuffer, Key, MainLoop};

struct State;

impl MainLoop for State {
    fn handle_event(&mut self, fb: &mut Framebuffer, event: &Event) {
        if matches!(event, Event::KeyPress(Key::Escape)) {
            fb.close();
        }
    }

    fn update(&mut self, _fb: &mut Framebuffer, _dt: f32, _time: f64) {}

    fn render(&mut self, d: &mut DrawHandle) {
        d.fill(0xf5_f5_f5);
        d.draw_text(190, 200, 0xc8_c8_c8, FontSize::Large, "Hello World!");
        d.draw_fps(10, 10);
    }
}

fn main() {
    let mut fb = Framebuffer::new(480, 480, "Hello", 60);

    fb.run(&mut State);
}
