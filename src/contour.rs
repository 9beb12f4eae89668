use nalgebra as na;
use ndarray::Array2;

use crate::frame::DepthFrame;

/// One connected component pulled out of a thresholded depth frame,
/// before any identity tracking.
#[derive(Debug, Clone)]
pub struct RawContour {
    /// Boundary polyline in image space, clockwise.
    pub points: Vec<na::Point2<f32>>,
    /// Component pixel count.
    pub area: f32,
    /// Mean of the component pixels.
    pub centroid: na::Point2<f32>,
}

/// Binarizes a depth frame to the configured band.
///
/// A pixel is kept iff it carries depth (`d != 0`) and `near <= d <= far`,
/// both bounds inclusive, in raw sensor units. The banded image is then
/// binarized like an 8-bit working image: a kept pixel has gray value 255
/// and survives iff `255 > threshold`.
pub fn threshold(frame: &DepthFrame, near: u16, far: u16, thresh: u8) -> Array2<bool> {
    let keep_band = 255u16 > thresh as u16;

    frame
        .samples()
        .map(|&d| keep_band && d != 0 && near <= d && d <= far)
}

/// Suppressed mask cells force pixels to background.
pub fn apply_mask(bitmap: &mut Array2<bool>, mask: &Array2<bool>) {
    if bitmap.dim() != mask.dim() {
        return;
    }

    ndarray::Zip::from(bitmap).and(mask).for_each(|b, &m| {
        if !m {
            *b = false;
        }
    });
}

/// Extracts 4-connected components with their boundary polylines.
pub fn extract(bitmap: &Array2<bool>) -> Vec<RawContour> {
    let (height, width) = bitmap.dim();
    let mut labels: Array2<u32> = Array2::zeros((height, width));
    let mut contours = Vec::new();
    let mut next_label = 1u32;

    for y in 0..height {
        for x in 0..width {
            if !bitmap[(y, x)] || labels[(y, x)] != 0 {
                continue;
            }

            let label = next_label;
            next_label += 1;

            let pixels = flood_fill(bitmap, &mut labels, x, y, label);
            let area = pixels.len() as f32;

            let (mut cx, mut cy) = (0.0f32, 0.0f32);
            for &(px, py) in &pixels {
                cx += px as f32;
                cy += py as f32;
            }
            let centroid = na::Point2::new(cx / area, cy / area);

            let boundary = trace_boundary(&labels, label, (x as i32, y as i32), pixels.len());
            let points = boundary
                .into_iter()
                .map(|(px, py)| na::Point2::new(px as f32, py as f32))
                .collect();

            contours.push(RawContour {
                points,
                area,
                centroid,
            });
        }
    }

    contours
}

fn flood_fill(
    bitmap: &Array2<bool>,
    labels: &mut Array2<u32>,
    x: usize,
    y: usize,
    label: u32,
) -> Vec<(usize, usize)> {
    let (height, width) = bitmap.dim();
    let mut stack = vec![(x, y)];
    let mut pixels = Vec::new();
    labels[(y, x)] = label;

    while let Some((px, py)) = stack.pop() {
        pixels.push((px, py));

        let mut visit = |nx: usize, ny: usize, labels: &mut Array2<u32>| {
            if bitmap[(ny, nx)] && labels[(ny, nx)] == 0 {
                labels[(ny, nx)] = label;
                stack.push((nx, ny));
            }
        };

        if px > 0 {
            visit(px - 1, py, labels);
        }
        if px + 1 < width {
            visit(px + 1, py, labels);
        }
        if py > 0 {
            visit(px, py - 1, labels);
        }
        if py + 1 < height {
            visit(px, py + 1, labels);
        }
    }

    pixels
}

// Moore neighborhood, clockwise from west.
const DIRS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Moore-neighbor boundary tracing from the component's scan-order first
/// pixel. `start` must be the leftmost pixel of the topmost row, so the
/// west neighbor is guaranteed background.
fn trace_boundary(
    labels: &Array2<u32>,
    label: u32,
    start: (i32, i32),
    component_size: usize,
) -> Vec<(i32, i32)> {
    let (height, width) = labels.dim();
    let is_fg = |x: i32, y: i32| -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < width
            && (y as usize) < height
            && labels[(y as usize, x as usize)] == label
    };

    let mut boundary = vec![start];
    let b0 = (start.0 - 1, start.1);
    let mut cur = start;
    let mut back = b0;

    let cap = 4 * component_size + 8;
    for _ in 0..cap {
        let back_dir = DIRS
            .iter()
            .position(|&(dx, dy)| (cur.0 + dx, cur.1 + dy) == back)
            .expect("backtrack is always a Moore neighbor");

        let mut advance = None;
        let mut prev = back;
        for i in 1..=8 {
            let (dx, dy) = DIRS[(back_dir + i) % 8];
            let n = (cur.0 + dx, cur.1 + dy);
            if is_fg(n.0, n.1) {
                advance = Some((n, prev));
                break;
            }
            prev = n;
        }

        let Some((next, next_back)) = advance else {
            // isolated pixel
            break;
        };

        if next == start && next_back == b0 {
            break;
        }

        boundary.push(next);
        back = next_back;
        cur = next;
    }

    boundary
}

/// Douglas-Peucker polyline simplification with tolerance `epsilon`.
pub fn simplify(points: &[na::Point2<f32>], epsilon: f32) -> Vec<na::Point2<f32>> {
    if points.len() <= 2 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    dp_mark(points, 0, points.len() - 1, epsilon, &mut keep);

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then(|| *p))
        .collect()
}

fn dp_mark(points: &[na::Point2<f32>], lo: usize, hi: usize, epsilon: f32, keep: &mut [bool]) {
    if hi <= lo + 1 {
        return;
    }

    let a = points[lo];
    let b = points[hi];
    let ab = b - a;
    let len = ab.norm();

    let mut max_dist = 0.0f32;
    let mut max_idx = lo;
    for i in lo + 1..hi {
        let d = if len <= f32::EPSILON {
            (points[i] - a).norm()
        } else {
            let ap = points[i] - a;
            (ab.x * ap.y - ab.y * ap.x).abs() / len
        };

        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        keep[max_idx] = true;
        dp_mark(points, lo, max_idx, epsilon, keep);
        dp_mark(points, max_idx, hi, epsilon, keep);
    }
}
