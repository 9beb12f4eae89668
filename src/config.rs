use serde_derive::{Deserialize, Serialize};

/// Live tracking parameters.
///
/// Each numeric field is bound by the GUI collaborator to the range in
/// [`descriptors`]; the collaborator clamps out-of-range writes, the core
/// takes values as given. Depth thresholds are raw sensor units
/// (millimeters), the smoothing rate is normalized to [0, 1].
///
/// [`descriptors`]: TrackerConfig::descriptors
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub min_area: f32,
    pub max_area: f32,
    pub threshold: u8,
    pub persistence: u32,
    pub max_distance: f32,
    pub near_threshold: u16,
    pub far_threshold: u16,
    pub smoothing_rate: f32,
    pub simplified: bool,
    pub smoothness: f32,
    pub delay: usize,
    pub num_frames: usize,
    pub max_users: usize,
    pub depth_mask_enabled: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_area: 5000.0,
            max_area: 140_000.0,
            threshold: 15,
            persistence: 15,
            max_distance: 32.0,
            near_threshold: 500,
            far_threshold: 4000,
            smoothing_rate: 1.0,
            simplified: false,
            smoothness: 1.0,
            delay: 0,
            num_frames: 1024,
            max_users: 1,
            depth_mask_enabled: false,
        }
    }
}

/// Range the GUI collaborator binds a slider to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Typed parameter-change message, dispatched synchronously through
/// [`TrackerConfig::apply`] instead of per-widget listener tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamUpdate {
    MinArea(f32),
    MaxArea(f32),
    Threshold(u8),
    Persistence(u32),
    MaxDistance(f32),
    NearThreshold(u16),
    FarThreshold(u16),
    SmoothingRate(f32),
    Simplified(bool),
    Smoothness(f32),
    Delay(usize),
    MaxUsers(usize),
    DepthMaskEnabled(bool),
}

impl TrackerConfig {
    pub fn descriptors(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor { name: "minArea", min: 0.0, max: 100_000.0 },
            ParamDescriptor { name: "maxArea", min: 2500.0, max: 150_000.0 },
            ParamDescriptor { name: "threshold", min: 0.0, max: 255.0 },
            ParamDescriptor { name: "persistence", min: 0.0, max: 100.0 },
            ParamDescriptor { name: "maxDistance", min: 0.0, max: 100.0 },
            ParamDescriptor { name: "nearThreshold", min: 0.0, max: 10_000.0 },
            ParamDescriptor { name: "farThreshold", min: 0.0, max: 10_000.0 },
            ParamDescriptor { name: "smoothingRate", min: 0.0, max: 1.0 },
            ParamDescriptor { name: "smoothness", min: 1.0, max: 100.0 },
            ParamDescriptor { name: "delay", min: 0.0, max: self.num_frames as f64 },
            ParamDescriptor { name: "maxUsers", min: 1.0, max: 10.0 },
        ]
    }

    pub fn apply(&mut self, update: ParamUpdate) {
        match update {
            ParamUpdate::MinArea(v) => self.min_area = v,
            ParamUpdate::MaxArea(v) => self.max_area = v,
            ParamUpdate::Threshold(v) => self.threshold = v,
            ParamUpdate::Persistence(v) => self.persistence = v,
            ParamUpdate::MaxDistance(v) => self.max_distance = v,
            ParamUpdate::NearThreshold(v) => self.near_threshold = v,
            ParamUpdate::FarThreshold(v) => self.far_threshold = v,
            ParamUpdate::SmoothingRate(v) => self.smoothing_rate = v,
            ParamUpdate::Simplified(v) => self.simplified = v,
            ParamUpdate::Smoothness(v) => self.smoothness = v,
            ParamUpdate::Delay(v) => self.delay = v,
            ParamUpdate::MaxUsers(v) => self.max_users = v,
            ParamUpdate::DepthMaskEnabled(v) => self.depth_mask_enabled = v,
        }
    }
}
