use rayon::prelude::*;

use crate::anneal::CostFn;
use crate::render::{Camera, Renderer};
use crate::state::SceneState;

/// receives the per-channel difference image after each evaluation, e.g. to
/// feed a preview surface.
pub trait DiffSink {
    fn publish(&mut self, diff: &[u8], width: u32, height: u32);
}

/// cost of a scene against a fixed target image: the euclidean norm of the
/// per-channel color error over every pixel. alpha never contributes.
///
/// the target is top-row-first, the renderer hands back bottom-row-first;
/// `flipped_row` pairs the rows up so equal images always cost zero.
pub struct ImageCost<R: Renderer> {
    renderer: R,
    target: Vec<u8>,
    camera: Camera,
    diff: Option<Vec<u8>>,
    sink: Option<Box<dyn DiffSink>>,
}

impl<R: Renderer> ImageCost<R> {
    /// `target` is tightly packed RGBA matching `camera`'s size.
    pub fn new(renderer: R, target: Vec<u8>, camera: Camera) -> Self {
        assert_eq!(
            target.len(),
            camera.num_pixels() * 4,
            "target buffer does not match the canvas size"
        );
        Self {
            renderer,
            target,
            camera,
            diff: None,
            sink: None,
        }
    }

    /// keep a per-channel absolute difference image alongside each
    /// evaluation. alpha stays opaque; only the color bytes are rewritten.
    pub fn with_diff(mut self) -> Self {
        self.ensure_diff();
        self
    }

    /// publish the difference image to `sink` after every evaluation.
    pub fn with_sink(mut self, sink: Box<dyn DiffSink>) -> Self {
        self.ensure_diff();
        self.sink = Some(sink);
        self
    }

    fn ensure_diff(&mut self) {
        if self.diff.is_none() {
            let mut diff = vec![0u8; self.target.len()];
            for px in diff.chunks_exact_mut(4) {
                px[3] = 0xFF;
            }
            self.diff = Some(diff);
        }
    }

    /// most recent difference image, in target row order.
    pub fn diff_pixels(&self) -> Option<&[u8]> {
        self.diff.as_deref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// draw the scene and measure it against the target. full recompute, no
    /// incremental caching, so the result only depends on the scene itself.
    pub fn evaluate(&mut self, state: &SceneState) -> f64 {
        profiling::scope!("image_cost");
        debug_assert_eq!(state.width(), self.camera.width);
        debug_assert_eq!(state.height(), self.camera.height);
        self.renderer.draw(&state.scene, &self.camera);
        let render = self.renderer.read_pixels();
        let target = &self.target;
        debug_assert_eq!(render.len(), target.len());
        let (width, height) = (self.camera.width, self.camera.height);
        let sum = match self.diff.as_mut() {
            Some(diff) => sum_rows_diff(render, target, width, height, diff),
            None => sum_rows(render, target, width, height),
        };
        if let (Some(sink), Some(diff)) = (self.sink.as_mut(), self.diff.as_ref()) {
            sink.publish(diff, width, height);
        }
        (sum as f64).sqrt()
    }
}

impl<R: Renderer> CostFn for ImageCost<R> {
    fn cost(&mut self, state: &SceneState) -> f64 {
        self.evaluate(state)
    }
}

/// translate a top-row-first row index into the bottom-row-first order the
/// renderer hands back.
#[inline]
pub(crate) fn flipped_row(y: u32, height: u32) -> u32 {
    debug_assert!(y < height);
    height - 1 - y
}

fn sum_rows(render: &[u8], target: &[u8], width: u32, height: u32) -> u64 {
    let stride = width as usize * 4;
    (0..height)
        .into_par_iter()
        .map(|ty| {
            let ry = flipped_row(ty, height);
            let trow = &target[ty as usize * stride..][..stride];
            let rrow = &render[ry as usize * stride..][..stride];
            row_ssd(trow, rrow)
        })
        .sum()
}

fn sum_rows_diff(render: &[u8], target: &[u8], width: u32, height: u32, diff: &mut [u8]) -> u64 {
    let stride = width as usize * 4;
    diff.par_chunks_exact_mut(stride)
        .enumerate()
        .map(|(ty, drow)| {
            let ry = flipped_row(ty as u32, height);
            let trow = &target[ty * stride..][..stride];
            let rrow = &render[ry as usize * stride..][..stride];
            row_ssd_diff(trow, rrow, drow)
        })
        .sum()
}

fn row_ssd(target_row: &[u8], render_row: &[u8]) -> u64 {
    debug_assert_eq!(target_row.len(), render_row.len());
    let mut sum = 0u64;
    for (t, r) in target_row.chunks_exact(4).zip(render_row.chunks_exact(4)) {
        let dr = (t[0] as i32 - r[0] as i32).unsigned_abs();
        let dg = (t[1] as i32 - r[1] as i32).unsigned_abs();
        let db = (t[2] as i32 - r[2] as i32).unsigned_abs();
        sum += (dr * dr + dg * dg + db * db) as u64;
    }
    sum
}

fn row_ssd_diff(target_row: &[u8], render_row: &[u8], diff_row: &mut [u8]) -> u64 {
    debug_assert_eq!(target_row.len(), render_row.len());
    debug_assert_eq!(target_row.len(), diff_row.len());
    let mut sum = 0u64;
    for ((t, r), d) in target_row
        .chunks_exact(4)
        .zip(render_row.chunks_exact(4))
        .zip(diff_row.chunks_exact_mut(4))
    {
        let dr = (t[0] as i32 - r[0] as i32).unsigned_abs();
        let dg = (t[1] as i32 - r[1] as i32).unsigned_abs();
        let db = (t[2] as i32 - r[2] as i32).unsigned_abs();
        d[0] = dr as u8;
        d[1] = dg as u8;
        d[2] = db as u8;
        sum += (dr * dr + dg * dg + db * db) as u64;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubRenderer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let mut buf = vec![0u8; width as usize * height as usize * 4];
        for px in buf.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        buf
    }

    fn flip_rows(buf: &[u8], width: u32, height: u32) -> Vec<u8> {
        let stride = width as usize * 4;
        let mut out = vec![0u8; buf.len()];
        for y in 0..height as usize {
            let src = &buf[y * stride..][..stride];
            let dst = height as usize - 1 - y;
            out[dst * stride..][..stride].copy_from_slice(src);
        }
        out
    }

    #[test]
    fn test_flipped_row_endpoints() {
        assert_eq!(flipped_row(0, 10), 9);
        assert_eq!(flipped_row(9, 10), 0);
        for y in 0..10 {
            assert_eq!(flipped_row(flipped_row(y, 10), 10), y);
        }
    }

    #[test]
    fn test_equal_images_cost_zero() {
        let cam = Camera::new(6, 4);
        let target = solid(6, 4, [128, 128, 128, 255]);
        let render = target.clone();
        let mut cost = ImageCost::new(StubRenderer::new(render), target, cam);
        let state = SceneState::new(6, 4, 10);
        assert_eq!(cost.evaluate(&state), 0.0);
    }

    #[test]
    fn test_uniform_error_matches_closed_form() {
        let cam = Camera::new(8, 8);
        let target = solid(8, 8, [255, 255, 255, 255]);
        let render = solid(8, 8, [0, 0, 0, 255]);
        let mut cost = ImageCost::new(StubRenderer::new(render), target, cam);
        let state = SceneState::new(8, 8, 10);
        let expected = ((8u64 * 8 * 3 * 255 * 255) as f64).sqrt();
        assert_eq!(cost.evaluate(&state), expected);
    }

    #[test]
    fn test_alpha_never_contributes() {
        let cam = Camera::new(4, 4);
        let target = solid(4, 4, [10, 20, 30, 0]);
        let render = solid(4, 4, [10, 20, 30, 255]);
        let mut cost = ImageCost::new(StubRenderer::new(render), target, cam);
        let state = SceneState::new(4, 4, 10);
        assert_eq!(cost.evaluate(&state), 0.0);
    }

    #[test]
    fn test_row_order_reconciled_against_native_output() {
        // top row red, everything else black
        let mut target = solid(4, 3, [0, 0, 0, 255]);
        for px in target[..4 * 4].chunks_exact_mut(4) {
            px[0] = 255;
        }

        let cam = Camera::new(4, 3);
        let state = SceneState::new(4, 3, 10);

        // a bottom-row-first renderer output of the same image costs zero
        let native = flip_rows(&target, 4, 3);
        let mut cost = ImageCost::new(StubRenderer::new(native), target.clone(), cam);
        assert_eq!(cost.evaluate(&state), 0.0);

        // the unflipped bytes are a different image and must not
        let mut cost = ImageCost::new(StubRenderer::new(target.clone()), target, cam);
        assert!(cost.evaluate(&state) > 0.0);
    }

    #[test]
    fn test_diff_buffer_holds_channel_errors() {
        let cam = Camera::new(2, 2);
        let target = solid(2, 2, [100, 50, 25, 255]);
        let render = solid(2, 2, [90, 70, 25, 255]);
        let mut cost = ImageCost::new(StubRenderer::new(render), target, cam).with_diff();
        let state = SceneState::new(2, 2, 10);
        cost.evaluate(&state);
        let diff = cost.diff_pixels().unwrap();
        for px in diff.chunks_exact(4) {
            assert_eq!(px, &[10, 20, 0, 0xFF]);
        }
    }

    #[test]
    fn test_diff_alpha_stays_opaque_before_first_evaluation() {
        let cam = Camera::new(3, 3);
        let target = solid(3, 3, [0, 0, 0, 255]);
        let cost = ImageCost::new(StubRenderer::new(target.clone()), target, cam).with_diff();
        for px in cost.diff_pixels().unwrap().chunks_exact(4) {
            assert_eq!(px[3], 0xFF);
        }
    }

    struct Recorder {
        log: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl DiffSink for Recorder {
        fn publish(&mut self, diff: &[u8], _width: u32, _height: u32) {
            self.log.borrow_mut().push(diff.to_vec());
        }
    }

    #[test]
    fn test_sink_sees_every_evaluation() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let cam = Camera::new(2, 2);
        let target = solid(2, 2, [5, 5, 5, 255]);
        let render = solid(2, 2, [1, 5, 5, 255]);
        let mut cost = ImageCost::new(StubRenderer::new(render), target, cam)
            .with_sink(Box::new(Recorder { log: log.clone() }));
        let state = SceneState::new(2, 2, 10);
        cost.evaluate(&state);
        cost.evaluate(&state);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        for px in log[0].chunks_exact(4) {
            assert_eq!(px, &[4, 0, 0, 0xFF]);
        }
    }
}
