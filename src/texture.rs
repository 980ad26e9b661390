use image::RgbaImage;

/// Decoded image ready to blit, stored as ARGB8888 like the window texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Texture {
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let pixels = image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                u32::from_be_bytes([a, r, g, b])
            })
            .collect();

        Self {
            width: image.width(),
            height: image.height(),
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

/// Source-over blend of `src` onto `dst`. The source's own alpha is scaled by
/// `tint` first. The result is always opaque.
pub fn blend(dst: u32, src: u32, tint: u8) -> u32 {
    let [src_a, sr, sg, sb] = src.to_be_bytes();
    let [_, dr, dg, db] = dst.to_be_bytes();

    let alpha = u32::from(src_a) * u32::from(tint) / 255;
    let mix = |s: u8, d: u8| {
        let v = (u32::from(s) * alpha + u32::from(d) * (255 - alpha)) / 255;
        v as u8
    };

    u32::from_be_bytes([0xff, mix(sr, dr), mix(sg, dg), mix(sb, db)])
}
