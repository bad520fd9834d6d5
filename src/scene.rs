use rand::Rng;
use serde::{Deserialize, Serialize};

/// a filled triangle: integer pixel vertices, un-premultiplied color channels in 0..1
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub verts: [(i32, i32); 3], // pixel coordinates, bounded by the canvas
    pub rgb: [f32; 3],          // un-premultiplied, 0..1
    pub opacity: f32,           // 0..1
}

impl Triangle {
    /// spawn a triangle with uniformly random vertices, color and opacity.
    /// vertex coordinates land in [0, width) x [0, height).
    pub fn random<R: Rng>(rng: &mut R, width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0, "canvas must be non-empty");
        debug_assert!(
            width <= i32::MAX as u32 && height <= i32::MAX as u32,
            "canvas exceeds vertex coordinate range"
        );
        let w = width as i32;
        let h = height as i32;
        let verts = [
            (rng.random_range(0..w), rng.random_range(0..h)),
            (rng.random_range(0..w), rng.random_range(0..h)),
            (rng.random_range(0..w), rng.random_range(0..h)),
        ];
        Self {
            verts,
            rgb: [rng.random(), rng.random(), rng.random()],
            opacity: rng.random(),
        }
    }
}

/// ordered triangle collection. order is z-order: later entries draw on top
/// (painter's algorithm), so reordering alone changes the composite.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub tris: Vec<Triangle>,
}

impl Scene {
    pub fn new() -> Self {
        Self { tris: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tris.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }
}
