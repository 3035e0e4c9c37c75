//! Edge-map extraction from a grayscale frame.
//!
//! Gaussian blur -> Canny (Sobel gradients, quadrant non-maximum
//! suppression, two-threshold hysteresis) -> one 3x3 dilation followed by
//! one 3x3 erosion to close small gaps without materially growing contours.
//! The transform is purely deterministic and has no failure modes.

use bovimetry_core::GrayImage;
use serde::{Deserialize, Serialize};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Settings for blur and edge detection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessParams {
    /// Gaussian kernel side length in pixels (odd).
    pub blur_kernel: usize,
    /// Hysteresis lower gradient-magnitude threshold.
    pub canny_low: f32,
    /// Hysteresis upper gradient-magnitude threshold.
    pub canny_high: f32,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            blur_kernel: 9,
            canny_low: 50.0,
            canny_high: 100.0,
        }
    }
}

/// Blurred frame plus the binary (0/255) edge map derived from it.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    pub blurred: GrayImage,
    pub edges: GrayImage,
}

/// Run the full preprocessing chain on a grayscale frame.
pub fn preprocess(gray: &GrayImage, params: &PreprocessParams) -> Preprocessed {
    let blurred = gaussian_blur(gray, params.blur_kernel);
    let mut edges = canny(&blurred, params.canny_low, params.canny_high);
    edges = dilate3x3(&edges);
    edges = erode3x3(&edges);
    log::debug!(
        "preprocess: {}x{} frame, {} edge pixels",
        gray.width,
        gray.height,
        edges.data.iter().filter(|&&v| v > 0).count()
    );
    Preprocessed { blurred, edges }
}

/// 1-D Gaussian taps for an odd kernel size, normalized to sum 1.
///
/// Sigma follows the usual `0.3 * ((k - 1) * 0.5 - 1) + 0.8` rule so a 9x9
/// kernel matches what the measurement formulas were tuned against.
fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let ksize = ksize.max(1) | 1; // force odd
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (ksize / 2) as i64;
    let mut taps: Vec<f32> = (-half..=half)
        .map(|i| {
            let x = i as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    for t in &mut taps {
        *t /= sum;
    }
    taps
}

/// Separable Gaussian blur with clamped borders.
pub fn gaussian_blur(src: &GrayImage, ksize: usize) -> GrayImage {
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 {
        return src.clone();
    }
    let taps = gaussian_kernel(ksize);
    let half = (taps.len() / 2) as i64;

    let mut horizontal = vec![0f32; w * h];
    for y in 0..h {
        let row = src.row(y);
        for x in 0..w {
            let mut acc = 0.0;
            for (k, tap) in taps.iter().enumerate() {
                let xx = (x as i64 + k as i64 - half).clamp(0, w as i64 - 1) as usize;
                acc += row[xx] as f32 * tap;
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, tap) in taps.iter().enumerate() {
                let yy = (y as i64 + k as i64 - half).clamp(0, h as i64 - 1) as usize;
                acc += horizontal[yy * w + x] * tap;
            }
            out.set(x, y, acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

struct Gradients {
    gx: Vec<f32>,
    gy: Vec<f32>,
    mag: Vec<f32>,
}

fn sobel_gradients(src: &GrayImage) -> Gradients {
    let (w, h) = (src.width, src.height);
    let mut gx = vec![0f32; w * h];
    let mut gy = vec![0f32; w * h];
    let mut mag = vec![0f32; w * h];
    if w == 0 || h == 0 {
        return Gradients { gx, gy, mag };
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, &yy) in y_idx.iter().enumerate() {
                for (kx, &xx) in x_idx.iter().enumerate() {
                    let sample = src.get(xx, yy) as f32;
                    sum_x += sample * SOBEL_KERNEL_X[ky][kx];
                    sum_y += sample * SOBEL_KERNEL_Y[ky][kx];
                }
            }

            let idx = y * w + x;
            gx[idx] = sum_x;
            gy[idx] = sum_y;
            mag[idx] = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }

    Gradients { gx, gy, mag }
}

/// Canny edge detector on a (pre-blurred) grayscale frame.
///
/// Output is binary: 255 on edge ridges, 0 elsewhere.
pub fn canny(src: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    let grad = sobel_gradients(src);

    // Non-maximum suppression along the gradient direction, quantized to
    // four quadrants.
    let mut thin = vec![0f32; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let m = grad.mag[idx];
            if m < low {
                continue;
            }

            let mut angle_deg = grad.gy[idx].atan2(grad.gx[idx]).to_degrees();
            if angle_deg < 0.0 {
                angle_deg += 180.0;
            }
            let (n1, n2) = if !(22.5..157.5).contains(&angle_deg) {
                (idx - 1, idx + 1)
            } else if angle_deg < 67.5 {
                (idx - w + 1, idx + w - 1)
            } else if angle_deg < 112.5 {
                (idx - w, idx + w)
            } else {
                (idx - w - 1, idx + w + 1)
            };

            if m >= grad.mag[n1] && m >= grad.mag[n2] {
                thin[idx] = m;
            }
        }
    }

    // Two-threshold hysteresis: seed from strong pixels, grow through weak
    // ones (8-connectivity).
    let mut stack: Vec<usize> = Vec::new();
    for (idx, &m) in thin.iter().enumerate() {
        if m >= high {
            out.data[idx] = 255;
            stack.push(idx);
        }
    }
    while let Some(idx) = stack.pop() {
        let x = (idx % w) as i64;
        let y = (idx / w) as i64;
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let nidx = ny as usize * w + nx as usize;
                if out.data[nidx] == 0 && thin[nidx] >= low {
                    out.data[nidx] = 255;
                    stack.push(nidx);
                }
            }
        }
    }

    out
}

fn morph3x3(src: &GrayImage, dilate: bool) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut hit = !dilate;
            'scan: for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    let v = src.get_or_zero(x as i64 + dx, y as i64 + dy);
                    if dilate && v > 0 {
                        hit = true;
                        break 'scan;
                    }
                    if !dilate && v == 0 {
                        hit = false;
                        break 'scan;
                    }
                }
            }
            out.set(x, y, if hit { 255 } else { 0 });
        }
    }
    out
}

/// Binary 3x3 dilation.
pub fn dilate3x3(src: &GrayImage) -> GrayImage {
    morph3x3(src, true)
}

/// Binary 3x3 erosion.
pub fn erode3x3(src: &GrayImage) -> GrayImage {
    morph3x3(src, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_image(w: usize, h: usize, split_x: usize) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in 0..h {
            for x in split_x..w {
                img.set(x, y, 255);
            }
        }
        img
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let taps = gaussian_kernel(9);
        assert_eq!(taps.len(), 9);
        let sum: f32 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..4 {
            assert!((taps[i] - taps[8 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn blur_preserves_flat_regions() {
        let mut img = GrayImage::new(16, 16);
        img.data.fill(100);
        let blurred = gaussian_blur(&img, 9);
        assert!(blurred.data.iter().all(|&v| v == 100));
    }

    #[test]
    fn canny_finds_a_vertical_step_edge() {
        let img = step_image(40, 20, 20);
        let blurred = gaussian_blur(&img, 9);
        let edges = canny(&blurred, 50.0, 100.0);
        // The ridge sits near the step; nothing fires far away from it.
        let near: usize = (0..20)
            .map(|y| (17..23).filter(|&x| edges.get(x, y) > 0).count())
            .sum();
        assert!(near >= 20, "expected a ridge near x=20, got {near} pixels");
        assert_eq!(edges.get(5, 10), 0);
        assert_eq!(edges.get(35, 10), 0);
    }

    #[test]
    fn dilate_then_erode_closes_single_pixel_gaps() {
        let mut img = GrayImage::new(9, 3);
        for x in 0..9 {
            if x != 4 {
                img.set(x, 1, 255);
            }
        }
        let closed = erode3x3(&dilate3x3(&img));
        assert!(closed.get(4, 1) > 0, "gap should be closed");
    }

    #[test]
    fn preprocess_is_deterministic() {
        let img = step_image(30, 30, 15);
        let params = PreprocessParams::default();
        let a = preprocess(&img, &params);
        let b = preprocess(&img, &params);
        assert_eq!(a.edges, b.edges);
        assert_eq!(a.blurred, b.blurred);
    }
}
