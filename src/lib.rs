pub mod calibration;
pub mod config;
pub mod contour;
pub mod draw;
pub mod error;
pub mod frame;
pub mod history;
pub mod mask;
pub mod projector;
pub mod sensor;
pub mod tracker;
pub mod users;

pub use calibration::{Calibration, CalibrationState, CorrespondencePair, DisplayPoint};
pub use config::{ParamDescriptor, ParamUpdate, TrackerConfig};
pub use contour::RawContour;
pub use draw::Canvas;
pub use error::Error;
pub use frame::DepthFrame;
pub use history::DepthHistory;
pub use mask::MaskEditor;
pub use projector::{Intrinsics, WorldPoint};
pub use sensor::DepthSensor;
pub use tracker::{Contour, ContourTracker};
pub use users::{TrackedUser, UserEvent, UserRegistry};

use nalgebra as na;

/// The tracking module: depth history, projective calibration, contour
/// tracking, and the skeletal user registry, driven one tick at a time by
/// the host's render loop.
///
/// Single-threaded by contract: all state is owned here and mutated only
/// from [`update`]. Mode flags are read once per tick, so mode switches
/// take effect atomically at tick boundaries.
///
/// [`update`]: DepthTracker::update
pub struct DepthTracker {
    config: TrackerConfig,
    history: DepthHistory,
    calibration: Calibration,
    tracker: ContourTracker,
    users: UserRegistry,
    mask: mask::MaskEditor,
    width: usize,
    height: usize,
    calibrating: bool,
    tracking_contours: bool,
    tracking_users: bool,
}

impl DepthTracker {
    pub fn new(width: usize, height: usize, config: TrackerConfig) -> Self {
        let history = DepthHistory::new(config.num_frames, width, height);
        let users = UserRegistry::new(config.max_users);

        Self {
            config,
            history,
            calibration: Calibration::new(),
            tracker: ContourTracker::new(),
            users,
            mask: mask::MaskEditor::new(),
            width,
            height,
            calibrating: false,
            tracking_contours: false,
            tracking_users: false,
        }
    }

    /// One processing tick. Returns `false` when the sensor had no new
    /// frame, in which case nothing is mutated.
    pub fn update<S: DepthSensor>(&mut self, sensor: &mut S) -> bool {
        let Some(frame) = sensor.next_frame() else {
            return false;
        };

        self.history.push(frame);

        for event in sensor.drain_events() {
            self.users.handle_event(event);
        }

        if self.tracking_users {
            for id in sensor.tracked_user_ids() {
                if let Some(joints) = sensor.skeleton(id) {
                    self.users.observe(id, &joints);
                }
            }
        }

        if self.tracking_contours {
            let delay = self.config.delay.min(self.history.capacity() - 1);
            let frame = self
                .history
                .frame_at(delay)
                .expect("delay clamped to capacity");

            let mask = if self.config.depth_mask_enabled {
                Some(self.mask.mask(self.width, self.height))
            } else {
                None
            };

            self.tracker.track(frame, mask, &self.config);
        }

        true
    }

    /// Back-projects an image pixel through the delayed depth frame
    /// (`z = 0` when no depth is available there).
    pub fn world_coordinate_at(
        &self,
        x: usize,
        y: usize,
        intrinsics: &Intrinsics,
    ) -> WorldPoint {
        let delay = self.config.delay.min(self.history.capacity() - 1);
        let frame = self
            .history
            .frame_at(delay)
            .expect("delay clamped to capacity");

        projector::project(x, y, frame, intrinsics)
    }

    /// The calibrated display point under an image pixel. Also serves the
    /// calibration test probe.
    pub fn projected_point_at(
        &self,
        x: usize,
        y: usize,
        intrinsics: &Intrinsics,
    ) -> Result<DisplayPoint, Error> {
        self.calibration
            .project(self.world_coordinate_at(x, y, intrinsics))
    }

    /// Projects detected reference corners into world space and feeds them
    /// to the calibration solver, paired with their known display points.
    /// Corners without depth are skipped. Returns the number accepted.
    pub fn add_calibration_points(
        &mut self,
        pixels: &[(usize, usize)],
        display: &[DisplayPoint],
        intrinsics: &Intrinsics,
    ) -> usize {
        let world: Vec<WorldPoint> = pixels
            .iter()
            .map(|&(x, y)| self.world_coordinate_at(x, y, intrinsics))
            .collect();

        self.calibration.add_point_pairs(&world, display)
    }

    /// Exports one tracked contour mapped through the calibration into
    /// pixel space of a `width` x `height` output surface. Vertices whose
    /// depth sample vanished since extraction are skipped.
    pub fn calibrated_contour(
        &self,
        idx: usize,
        width: f64,
        height: f64,
        smoothness: f32,
        intrinsics: &Intrinsics,
    ) -> Result<Vec<na::Point2<f64>>, Error> {
        if !self.calibration.is_calibrated() {
            return Err(Error::NotCalibrated);
        }

        let contour = self.tracker.get(idx).ok_or(Error::OutOfRange {
            index: idx,
            limit: self.tracker.len(),
        })?;

        let simplified = contour::simplify(&contour.points, smoothness.max(1.0));

        let mut mapped = Vec::with_capacity(simplified.len());
        for p in simplified {
            let world = self.world_coordinate_at(p.x as usize, p.y as usize, intrinsics);
            if world.z <= 0.0 {
                continue;
            }
            mapped.push(self.calibration.map_to_screen(world, width, height)?);
        }

        Ok(mapped)
    }

    /// Emits the debug view: the working depth image plus the outlines of
    /// all live contours.
    pub fn draw_debug<C: Canvas>(&self, canvas: &mut C) {
        canvas.image(self.history.latest().samples(), 0.0, 0.0);

        if self.tracking_contours {
            for contour in self.tracker.iter() {
                canvas.polyline(&contour.points);
            }
        }

        if self.tracking_users {
            for id in self.users.ids() {
                if let Some(torso) = self.users.get(id).and_then(|u| u.torso()) {
                    canvas.rect(torso.x - 2.0, torso.y - 2.0, 4.0, 4.0);
                }
            }
        }
    }

    // Mode switches. The modes are coupled: calibration is exclusive,
    // and user features cannot outlive user tracking.

    /// Entering calibration shuts down both tracking modes.
    pub fn set_calibrating(&mut self, calibrating: bool) {
        self.calibrating = calibrating;
        if calibrating {
            self.set_tracking_users(false);
            self.set_tracking_contours(false);
        }
    }

    pub fn set_tracking_contours(&mut self, tracking: bool) {
        self.tracking_contours = tracking;
        if !tracking {
            self.tracker.clear();
        }
    }

    /// Disabling user tracking also disables feature tracking, which
    /// clears the registry.
    pub fn set_tracking_users(&mut self, tracking: bool) {
        self.tracking_users = tracking;
        if !tracking {
            self.users.set_feature_tracking_enabled(false);
        }
    }

    pub fn set_tracking_user_features(&mut self, enabled: bool) {
        self.users.set_feature_tracking_enabled(enabled);
    }

    /// Routes a parameter message to the config and the owning component.
    pub fn apply(&mut self, update: ParamUpdate) {
        self.config.apply(update);

        match update {
            ParamUpdate::MaxUsers(n) => self.users.set_max_users(n),
            ParamUpdate::DepthMaskEnabled(enabled) => self.mask.set_enabled(enabled),
            _ => {}
        }
    }

    #[inline]
    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    #[inline]
    pub fn is_tracking_contours(&self) -> bool {
        self.tracking_contours
    }

    #[inline]
    pub fn is_tracking_users(&self) -> bool {
        self.tracking_users
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn history(&self) -> &DepthHistory {
        &self.history
    }

    #[inline]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[inline]
    pub fn calibration_mut(&mut self) -> &mut Calibration {
        &mut self.calibration
    }

    #[inline]
    pub fn contours(&self) -> &[Contour] {
        self.tracker.contours()
    }

    #[inline]
    pub fn num_contours(&self) -> usize {
        self.tracker.len()
    }

    #[inline]
    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    #[inline]
    pub fn mask_editor_mut(&mut self) -> &mut mask::MaskEditor {
        &mut self.mask
    }
}
