use nalgebra as na;
use ndarray::Array2;

use crate::config::TrackerConfig;
use crate::contour::{self, RawContour};
use crate::frame::DepthFrame;

/// A contour with a persistent identity across frames.
#[derive(Debug, Clone)]
pub struct Contour {
    pub id: u32,
    pub points: Vec<na::Point2<f32>>,
    pub area: f32,
    pub centroid: na::Point2<f32>,
    /// Frames since first seen.
    pub age: u32,
    /// Consecutive frames without a match.
    pub misses: u32,
}

/// Frame-to-frame contour tracker: nearest-centroid matching within
/// `max_distance`, miss aging up to `persistence`, exponential smoothing
/// of matched positions.
///
/// IDs are monotonically increasing and never reused, so a consumer can
/// key long-lived state on them safely.
pub struct ContourTracker {
    contours: Vec<Contour>,
    next_id: u32,
}

impl Default for ContourTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourTracker {
    pub fn new() -> Self {
        Self {
            contours: Vec::new(),
            next_id: 1,
        }
    }

    /// Runs the full per-tick pipeline on a depth frame.
    ///
    /// A cold-start (all-zero) frame simply produces zero live contours.
    pub fn track(&mut self, frame: &DepthFrame, mask: Option<&Array2<bool>>, cfg: &TrackerConfig) {
        let mut bits =
            contour::threshold(frame, cfg.near_threshold, cfg.far_threshold, cfg.threshold);
        if let Some(mask) = mask {
            contour::apply_mask(&mut bits, mask);
        }

        let mut raw = contour::extract(&bits);

        if cfg.simplified {
            let epsilon = cfg.smoothness.max(1.0);
            for r in &mut raw {
                r.points = contour::simplify(&r.points, epsilon);
            }
        }

        raw.retain(|r| r.area >= cfg.min_area && r.area <= cfg.max_area);

        self.advance(raw, cfg);
    }

    /// Matches one tick's surviving raw contours against the live set.
    pub fn advance(&mut self, raw: Vec<RawContour>, cfg: &TrackerConfig) {
        // candidate (raw, tracked) pairs within range, closest first
        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (ri, r) in raw.iter().enumerate() {
            for (ti, t) in self.contours.iter().enumerate() {
                let d = na::distance(&r.centroid, &t.centroid);
                if d <= cfg.max_distance {
                    pairs.push((ri, ti, d));
                }
            }
        }
        pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        let mut raw: Vec<Option<RawContour>> = raw.into_iter().map(Some).collect();
        let mut matched: Vec<Option<usize>> = vec![None; self.contours.len()];
        let mut raw_taken = vec![false; raw.len()];

        for (ri, ti, _) in pairs {
            if !raw_taken[ri] && matched[ti].is_none() {
                raw_taken[ri] = true;
                matched[ti] = Some(ri);
            }
        }

        let rate = cfg.smoothing_rate.clamp(0.0, 1.0);

        for (ti, t) in self.contours.iter_mut().enumerate() {
            t.age += 1;

            match matched[ti] {
                Some(ri) => {
                    let obs = raw[ri].take().expect("raw contour taken twice");
                    t.misses = 0;

                    // smooth the centroid, carry the vertices along with it
                    let target = t.centroid + rate * (obs.centroid - t.centroid);
                    let shift = target - obs.centroid;

                    t.centroid = target;
                    t.points = obs.points.into_iter().map(|p| p + shift).collect();
                    t.area = obs.area;
                }
                None => {
                    t.misses += 1;
                }
            }
        }

        let persistence = cfg.persistence;
        self.contours
            .retain(|t| t.misses == 0 || t.misses < persistence);

        for obs in raw.into_iter().flatten() {
            let id = self.next_id;
            self.next_id += 1;

            self.contours.push(Contour {
                id,
                points: obs.points,
                area: obs.area,
                centroid: obs.centroid,
                age: 0,
                misses: 0,
            });
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Contour> {
        self.contours.get(idx)
    }

    #[inline]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter()
    }

    pub fn clear(&mut self) {
        self.contours.clear();
    }
}
