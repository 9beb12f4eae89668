use nalgebra as na;

use crate::frame::DepthFrame;

/// Pinhole intrinsics supplied by the sensor collaborator.
/// Focal lengths and principal point in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    /// Nominal intrinsics for a 640x480 structured-light sensor,
    /// 58 degree horizontal field of view.
    pub fn vga_default() -> Self {
        Self {
            fx: 577.3,
            fy: 577.3,
            cx: 320.0,
            cy: 240.0,
        }
    }
}

/// 3D point in the sensor frame, millimeters. `z <= 0` means "no depth".
pub type WorldPoint = na::Point3<f32>;

/// Back-projects an image pixel through the depth sample at that pixel.
///
/// Pure function of its inputs. A missing sample (depth 0 or pixel outside
/// the frame) yields the invalid point sentinel with `z = 0`.
pub fn project(px: usize, py: usize, frame: &DepthFrame, intr: &Intrinsics) -> WorldPoint {
    let z = frame.get(px, py).unwrap_or(0) as f32;
    if z == 0.0 {
        return na::Point3::new(0.0, 0.0, 0.0);
    }

    let x = (px as f32 - intr.cx) * z / intr.fx;
    let y = (intr.cy - py as f32) * z / intr.fy;

    na::Point3::new(x, y, z)
}
