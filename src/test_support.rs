use tiny_skia as sk;

use crate::render::{Camera, Renderer};
use crate::scene::Scene;

/// renderer that ignores the scene and always exposes a fixed buffer.
pub(crate) struct StubRenderer {
    pixels: Vec<u8>,
}

impl StubRenderer {
    pub(crate) fn new(pixels: Vec<u8>) -> Self {
        Self { pixels }
    }
}

impl Renderer for StubRenderer {
    fn draw(&mut self, _scene: &Scene, _camera: &Camera) {}

    fn read_pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// software rasterizer for the end-to-end tests. paints triangles in scene
/// order with alpha blending over an opaque black background, then hands the
/// rows back bottom-first per the renderer contract.
pub(crate) struct SkiaRenderer {
    flipped: Vec<u8>,
}

impl SkiaRenderer {
    pub(crate) fn new() -> Self {
        Self {
            flipped: Vec::new(),
        }
    }
}

impl Renderer for SkiaRenderer {
    fn draw(&mut self, scene: &Scene, camera: &Camera) {
        let mut pix = sk::Pixmap::new(camera.width, camera.height).expect("pixmap");
        // black background; every pixel stays opaque, so the premultiplied
        // bytes tiny-skia stores equal the straight ones
        pix.fill(sk::Color::from_rgba(0.0, 0.0, 0.0, 1.0).unwrap());

        for tri in &scene.tris {
            let [a, b, c] = tri.verts;
            let mut pb = sk::PathBuilder::new();
            pb.move_to(a.0 as f32, a.1 as f32);
            pb.line_to(b.0 as f32, b.1 as f32);
            pb.line_to(c.0 as f32, c.1 as f32);
            pb.close();
            // zero-area triangles may not form a drawable path
            let Some(path) = pb.finish() else { continue };

            let color =
                sk::Color::from_rgba(tri.rgb[0], tri.rgb[1], tri.rgb[2], tri.opacity).unwrap();
            let mut paint = sk::Paint::default();
            paint.anti_alias = false;
            paint.shader = sk::Shader::SolidColor(color);

            pix.fill_path(
                &path,
                &paint,
                sk::FillRule::Winding,
                sk::Transform::identity(),
                None,
            );
        }

        let stride = camera.width as usize * 4;
        let data = pix.data();
        self.flipped.clear();
        self.flipped.reserve(data.len());
        for y in (0..camera.height as usize).rev() {
            self.flipped.extend_from_slice(&data[y * stride..][..stride]);
        }
    }

    fn read_pixels(&self) -> &[u8] {
        &self.flipped
    }
}
