use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::projector::WorldPoint;

/// Planar homographies need 4 correspondences; more improve the fit.
pub const MIN_PAIRS: usize = 4;

const FILE_FORMAT: &str = "depthtrack-calibration";
const FILE_VERSION: u32 = 1;

/// Display-space point in [0,1]x[0,1] normalized coordinates.
pub type DisplayPoint = na::Point2<f64>;

/// One (world, display) sample used to fit the mapping. Duplicates are
/// allowed; they only degrade conditioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrespondencePair {
    pub world: na::Point3<f64>,
    pub display: DisplayPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Idle,
    CollectingPairs,
    Fitted,
}

#[derive(Serialize, Deserialize)]
struct CalibrationFile {
    format: String,
    version: u32,
    /// Row-major 3x3 homography, world (x, y) -> normalized display (u, v).
    homography: [f64; 9],
}

/// Correspondence collector and homography solver mapping sensor-space world
/// coordinates onto a projected display surface.
///
/// `Idle -> CollectingPairs -> Fitted`, back to `Idle` on [`reset`].
///
/// [`reset`]: Calibration::reset
pub struct Calibration {
    pairs: Vec<CorrespondencePair>,
    mapping: Option<na::Matrix3<f64>>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibration {
    pub fn new() -> Self {
        Self {
            pairs: Vec::new(),
            mapping: None,
        }
    }

    #[inline]
    pub fn state(&self) -> CalibrationState {
        if self.mapping.is_some() {
            CalibrationState::Fitted
        } else if self.pairs.is_empty() {
            CalibrationState::Idle
        } else {
            CalibrationState::CollectingPairs
        }
    }

    #[inline]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.mapping.is_some()
    }

    /// Appends one correspondence. Samples without depth are rejected
    /// without touching the pair list.
    pub fn add_pair(&mut self, world: WorldPoint, display: DisplayPoint) -> Result<(), Error> {
        if world.z <= 0.0 {
            return Err(Error::InvalidPoint);
        }

        self.pairs.push(CorrespondencePair {
            world: na::Point3::new(world.x as f64, world.y as f64, world.z as f64),
            display,
        });

        Ok(())
    }

    /// Batch form used by the chessboard flow: world points that lost their
    /// depth sample are skipped together with their display mate.
    pub fn add_point_pairs(&mut self, world: &[WorldPoint], display: &[DisplayPoint]) -> usize {
        let mut added = 0;
        for (w, d) in world.iter().zip(display) {
            if self.add_pair(*w, *d).is_ok() {
                added += 1;
            }
        }

        if added < world.len() {
            log::warn!(
                "calibration: skipped {} of {} points without depth",
                world.len() - added,
                world.len()
            );
        }

        added
    }

    /// Fits the world-to-display homography from all accumulated pairs by
    /// normalized direct linear transform.
    pub fn fit(&mut self) -> Result<(), Error> {
        if self.pairs.len() < MIN_PAIRS {
            return Err(Error::InsufficientPairs {
                have: self.pairs.len(),
                need: MIN_PAIRS,
            });
        }

        let src: Vec<na::Point2<f64>> = self
            .pairs
            .iter()
            .map(|p| na::Point2::new(p.world.x, p.world.y))
            .collect();
        let dst: Vec<na::Point2<f64>> = self.pairs.iter().map(|p| p.display).collect();

        self.mapping = Some(dlt_homography(&src, &dst)?);
        log::info!("calibration: fitted from {} pairs", self.pairs.len());

        Ok(())
    }

    /// Maps a world point into normalized display space.
    pub fn project(&self, world: WorldPoint) -> Result<DisplayPoint, Error> {
        if world.z <= 0.0 {
            return Err(Error::InvalidPoint);
        }

        let h = self.mapping.ok_or(Error::NotCalibrated)?;
        let p = h * na::Vector3::new(world.x as f64, world.y as f64, 1.0);

        Ok(na::Point2::new(p.x / p.z, p.y / p.z))
    }

    /// Display point scaled to pixel space. The display's v axis points up,
    /// screen rows grow down, hence the flip.
    pub fn map_to_screen(
        &self,
        world: WorldPoint,
        width: f64,
        height: f64,
    ) -> Result<na::Point2<f64>, Error> {
        let p = self.project(world)?;
        Ok(na::Point2::new(width * p.x, height - height * p.y))
    }

    /// Drops all pairs and the mapping, back to `Idle`.
    pub fn reset(&mut self) {
        self.pairs.clear();
        self.mapping = None;
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let h = self.mapping.ok_or(Error::NotCalibrated)?;

        let mut coeffs = [0.0f64; 9];
        for r in 0..3 {
            for c in 0..3 {
                coeffs[r * 3 + c] = h[(r, c)];
            }
        }

        let file = CalibrationFile {
            format: FILE_FORMAT.to_string(),
            version: FILE_VERSION,
            homography: coeffs,
        };

        let json = serde_json::to_string_pretty(&file).map_err(|e| Error::CorruptFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json)?;
        log::info!("calibration: saved to {}", path.display());

        Ok(())
    }

    /// Restores a fitted mapping. State is left untouched on any failure.
    pub fn load(&mut self, path: &Path) -> Result<(), Error> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::NotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let file: CalibrationFile =
            serde_json::from_str(&content).map_err(|e| Error::CorruptFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if file.format != FILE_FORMAT || file.version != FILE_VERSION {
            return Err(Error::CorruptFile {
                path: path.to_path_buf(),
                reason: format!("unexpected format tag {}/{}", file.format, file.version),
            });
        }

        let c = &file.homography;
        self.mapping = Some(na::Matrix3::new(
            c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7], c[8],
        ));
        log::info!("calibration: loaded from {}", path.display());

        Ok(())
    }
}

/// Hartley-normalized DLT: least-squares homography from `src` to `dst`.
fn dlt_homography(
    src: &[na::Point2<f64>],
    dst: &[na::Point2<f64>],
) -> Result<na::Matrix3<f64>, Error> {
    let (t_src, src_n) = normalize_points(src)?;
    let (t_dst, dst_n) = normalize_points(dst)?;

    let n = src_n.len();
    // thin SVD only yields min(rows, cols) right-singular vectors, so pad
    // the 4-pair case (8x9) with a zero row to expose the null vector
    let rows = (2 * n).max(9);
    let mut a = na::DMatrix::<f64>::zeros(rows, 9);

    for (i, (s, d)) in src_n.iter().zip(&dst_n).enumerate() {
        let (x, y) = (s.x, s.y);
        let (u, v) = (d.x, d.y);

        let r = 2 * i;
        a[(r, 0)] = -x;
        a[(r, 1)] = -y;
        a[(r, 2)] = -1.0;
        a[(r, 6)] = u * x;
        a[(r, 7)] = u * y;
        a[(r, 8)] = u;

        a[(r + 1, 3)] = -x;
        a[(r + 1, 4)] = -y;
        a[(r + 1, 5)] = -1.0;
        a[(r + 1, 6)] = v * x;
        a[(r + 1, 7)] = v * y;
        a[(r + 1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t.as_ref().ok_or(Error::DegenerateConfiguration)?;

    // nalgebra does not guarantee singular value ordering
    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&i, &j| {
        svd.singular_values[i]
            .partial_cmp(&svd.singular_values[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let smallest = order[0];
    let largest = *order.last().expect("svd produced no singular values");

    // rank < 8 means the correspondences do not pin down a homography
    if order.len() >= 2 {
        let second = order[1];
        if svd.singular_values[second] <= svd.singular_values[largest] * 1e-9 {
            return Err(Error::DegenerateConfiguration);
        }
    }

    let h_row = v_t.row(smallest);
    let h_n = na::Matrix3::new(
        h_row[0], h_row[1], h_row[2], h_row[3], h_row[4], h_row[5], h_row[6], h_row[7], h_row[8],
    );

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(Error::DegenerateConfiguration)?;
    let mut h = t_dst_inv * h_n * t_src;

    if h[(2, 2)].abs() <= f64::EPSILON {
        return Err(Error::DegenerateConfiguration);
    }
    h /= h[(2, 2)];

    Ok(h)
}

/// Translates the centroid to the origin and scales the mean distance to
/// sqrt(2). Coincident point sets cannot be normalized.
fn normalize_points(
    points: &[na::Point2<f64>],
) -> Result<(na::Matrix3<f64>, Vec<na::Point2<f64>>), Error> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist <= f64::EPSILON {
        return Err(Error::DegenerateConfiguration);
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = na::Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let normalized = points
        .iter()
        .map(|p| na::Point2::new(s * (p.x - cx), s * (p.y - cy)))
        .collect();

    Ok((t, normalized))
}
