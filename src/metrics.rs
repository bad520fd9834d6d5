//─────────────────────────────────────────────────────────────────────────────
// resolution-invariant quality metrics (MSE, PSNR)
//─────────────────────────────────────────────────────────────────────────────

/// PSNR (peak signal-to-noise ratio) in decibels.
/// - `mse`: mean squared error per channel
/// - `peak`: 255.0 for 8-bit images
/// higher PSNR = better quality.
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

/// snapshot of resolution-invariant metrics derived from a raw cost value.
/// reporting only; the optimizer itself compares raw costs.
#[derive(Clone, Copy, Debug, Default)]
pub struct CostSnapshot {
    pub mse: f64,
    pub psnr: f64,
}

impl CostSnapshot {
    /// build metrics from a cost (the euclidean norm of the per-channel
    /// error) and the pixel count it was measured over. the error is
    /// RGB-only, so the mean divides by three channels per pixel.
    #[inline]
    pub fn from_cost(cost: f64, num_pixels: usize) -> Self {
        let ssd = cost * cost;
        let mse = ssd / (num_pixels as f64 * 3.0);
        let psnr = psnr_from_mse(mse, 255.0);
        Self { mse, psnr }
    }
}
