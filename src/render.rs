use serde::{Deserialize, Serialize};

use crate::scene::Scene;

/// canvas dimensions a renderer draws into. the cost function sizes its
/// buffers from the same values, so the two always agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub width: u32,
    pub height: u32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "canvas must be non-empty");
        assert!(
            width <= i32::MAX as u32 && height <= i32::MAX as u32,
            "canvas exceeds vertex coordinate range"
        );
        Self { width, height }
    }

    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// drawing backend the optimizer evaluates candidate scenes through.
///
/// `read_pixels` returns tightly packed RGBA, one byte per channel, in the
/// backend's native row order with the bottom row first. the cost function
/// reconciles that against top-row-first targets itself, so implementations
/// must not pre-flip.
pub trait Renderer {
    /// rasterize `scene` onto a canvas of `camera`'s size, replacing any
    /// previous contents.
    fn draw(&mut self, scene: &Scene, camera: &Camera);

    /// pixels of the most recent `draw`, `width * height * 4` bytes.
    fn read_pixels(&self) -> &[u8];
}
