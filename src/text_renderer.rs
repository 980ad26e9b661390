use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::Point;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;

use crate::DrawHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Small,
    Large,
}

pub struct TextRenderer;

impl TextRenderer {
    pub const fn new() -> Self {
        Self
    }

    fn font(size: FontSize) -> &'static MonoFont<'static> {
        match size {
            FontSize::Small => &FONT_6X10,
            FontSize::Large => &FONT_10X20,
        }
    }

    #[cfg(test)]
    pub fn glyph_size(size: FontSize) -> embedded_graphics::prelude::Size {
        Self::font(size).character_size
    }

    pub fn render(
        &self,
        d: &mut DrawHandle,
        pos_x: i32,
        pos_y: i32,
        color: u32,
        size: FontSize,
        text: &str,
    ) {
        let [_, r, g, b] = color.to_be_bytes();
        let style = MonoTextStyle::new(Self::font(size), Rgb888::new(r, g, b));
        let ascii: String = text
            .chars()
            .map(|ch| if ch.is_ascii() { ch } else { '?' })
            .collect();

        // Drawing into the framebuffer cannot fail.
        let _ = Text::with_baseline(&ascii, Point::new(pos_x, pos_y), style, Baseline::Top).draw(d);
    }
}
