use std::collections::HashMap;

use nalgebra as na;

/// Skeletal lifecycle events from the sensor collaborator, delivered
/// synchronously at the tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    TrackingStarted(u32),
    TrackingStopped(u32),
    CalibrationStarted(u32),
    CalibrationStopped(u32),
    SkeletonLost(u32),
    SkeletonFound(u32),
}

/// One skeletal user, keyed by the sensor-assigned ID. Owned exclusively
/// by the registry; joint index 0 is the torso.
#[derive(Debug, Clone)]
pub struct TrackedUser {
    pub id: u32,
    pub joints: Vec<na::Point3<f32>>,
    pub feature_tracking: bool,
}

impl TrackedUser {
    #[inline]
    pub fn torso(&self) -> Option<na::Point3<f32>> {
        self.joints.first().copied()
    }
}

/// Registry of active skeletal users. Single writer for all user state;
/// entries are addressed by stable sensor IDs, so removal is just a map
/// erase with no dangling handles.
pub struct UserRegistry {
    users: HashMap<u32, TrackedUser>,
    max_users: usize,
    feature_tracking_enabled: bool,
}

impl UserRegistry {
    pub fn new(max_users: usize) -> Self {
        Self {
            users: HashMap::new(),
            max_users,
            feature_tracking_enabled: false,
        }
    }

    pub fn set_max_users(&mut self, max_users: usize) {
        self.max_users = max_users;
    }

    #[inline]
    pub fn max_users(&self) -> usize {
        self.max_users
    }

    #[inline]
    pub fn feature_tracking_enabled(&self) -> bool {
        self.feature_tracking_enabled
    }

    /// Toggles per-user joint polling. Disabling clears all current users;
    /// they are re-created from sensor observations on the next tick.
    pub fn set_feature_tracking_enabled(&mut self, enabled: bool) {
        self.feature_tracking_enabled = enabled;
        if enabled {
            for user in self.users.values_mut() {
                user.feature_tracking = true;
            }
        } else {
            self.clear();
        }
    }

    /// Consumes one sensor lifecycle event. `TrackingStopped` for an
    /// unknown ID is a no-op.
    pub fn handle_event(&mut self, event: UserEvent) {
        match event {
            UserEvent::TrackingStarted(id) => {
                log::info!("user registry: tracking started for {}", id);
            }
            UserEvent::TrackingStopped(id) => {
                log::info!("user registry: tracking stopped for {}", id);
                self.users.remove(&id);
            }
            UserEvent::CalibrationStarted(id) => {
                log::info!("user registry: calibration started for {}", id);
            }
            UserEvent::CalibrationStopped(id) => {
                log::info!("user registry: calibration stopped for {}", id);
            }
            UserEvent::SkeletonLost(id) => {
                log::info!("user registry: skeleton lost for {}", id);
            }
            UserEvent::SkeletonFound(id) => {
                log::info!("user registry: skeleton found for {}", id);
            }
        }
    }

    /// Feeds one per-tick skeleton observation for a sensor-tracked user.
    ///
    /// Unknown users are created while the `max_users` cap allows; known
    /// users get their joints refreshed when feature tracking is on and
    /// the torso actually moved.
    pub fn observe(&mut self, id: u32, joints: &[na::Point3<f32>]) {
        if let Some(user) = self.users.get_mut(&id) {
            if user.feature_tracking && torso_moved(&user.joints, joints) {
                user.joints = joints.to_vec();
            }
            return;
        }

        if self.users.len() >= self.max_users {
            return;
        }

        self.users.insert(
            id,
            TrackedUser {
                id,
                joints: joints.to_vec(),
                feature_tracking: self.feature_tracking_enabled,
            },
        );
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&TrackedUser> {
        self.users.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }
}

/// Only a non-zero torso that differs from the stored one counts as
/// fresh skeleton data.
fn torso_moved(old: &[na::Point3<f32>], new: &[na::Point3<f32>]) -> bool {
    let origin = na::Point3::new(0.0, 0.0, 0.0);
    match (old.first(), new.first()) {
        (Some(prev), Some(next)) => *next != origin && next != prev,
        (None, Some(next)) => *next != origin,
        _ => false,
    }
}
