use nalgebra as na;

use crate::frame::DepthFrame;
use crate::projector::Intrinsics;
use crate::users::UserEvent;

/// The sensor collaborator. The core depends on this seam only, never on
/// a concrete SDK; hosts wrap their device behind it, tests drive a
/// synthetic implementation.
pub trait DepthSensor {
    /// The next depth frame, or `None` when the sensor has nothing new
    /// this tick (downstream stages simply skip processing).
    fn next_frame(&mut self) -> Option<DepthFrame>;

    fn intrinsics(&self) -> Intrinsics;

    /// Skeletal lifecycle events accumulated since the previous tick.
    fn drain_events(&mut self) -> Vec<UserEvent>;

    /// IDs the sensor is currently tracking a skeleton for.
    fn tracked_user_ids(&self) -> Vec<u32>;

    /// Joint positions for one tracked user, torso first, sensor-space
    /// millimeters.
    fn skeleton(&self, id: u32) -> Option<Vec<na::Point3<f32>>>;
}
