use nalgebra as na;

use depthtrack::{
    DepthFrame, DepthSensor, DepthTracker, Intrinsics, ParamUpdate, TrackerConfig, UserEvent,
};

const W: usize = 64;
const H: usize = 48;

/// Scripted sensor double: a queue of frames, a queue of events, and a
/// fixed set of skeletons.
struct SyntheticSensor {
    frames: Vec<DepthFrame>,
    events: Vec<UserEvent>,
    skeletons: Vec<(u32, Vec<na::Point3<f32>>)>,
}

impl SyntheticSensor {
    fn new() -> Self {
        Self {
            frames: Vec::new(),
            events: Vec::new(),
            skeletons: Vec::new(),
        }
    }

    fn queue_frame(&mut self, frame: DepthFrame) {
        self.frames.insert(0, frame);
    }

    fn queue_blob_frame(&mut self, x0: usize, y0: usize, w: usize, h: usize, depth: u16) {
        let mut samples = vec![0u16; W * H];
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                samples[x + y * W] = depth;
            }
        }
        self.queue_frame(DepthFrame::from_raw(W, H, samples).unwrap());
    }
}

impl DepthSensor for SyntheticSensor {
    fn next_frame(&mut self) -> Option<DepthFrame> {
        self.frames.pop()
    }

    fn intrinsics(&self) -> Intrinsics {
        Intrinsics {
            fx: 100.0,
            fy: 100.0,
            cx: W as f32 / 2.0,
            cy: H as f32 / 2.0,
        }
    }

    fn drain_events(&mut self) -> Vec<UserEvent> {
        std::mem::take(&mut self.events)
    }

    fn tracked_user_ids(&self) -> Vec<u32> {
        self.skeletons.iter().map(|(id, _)| *id).collect()
    }

    fn skeleton(&self, id: u32) -> Option<Vec<na::Point3<f32>>> {
        self.skeletons
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, joints)| joints.clone())
    }
}

fn test_config() -> TrackerConfig {
    TrackerConfig {
        near_threshold: 500,
        far_threshold: 2000,
        min_area: 20.0,
        max_area: 5000.0,
        persistence: 2,
        max_distance: 16.0,
        num_frames: 8,
        ..Default::default()
    }
}

#[test]
fn tick_without_a_frame_changes_nothing() {
    let mut tracker = DepthTracker::new(W, H, test_config());
    let mut sensor = SyntheticSensor::new();

    assert!(!tracker.update(&mut sensor));
    assert!(tracker.history().is_empty());
}

#[test]
fn contour_tracking_across_ticks() {
    let mut tracker = DepthTracker::new(W, H, test_config());
    tracker.set_tracking_contours(true);

    let mut sensor = SyntheticSensor::new();
    for i in 0..5 {
        sensor.queue_blob_frame(10 + i, 10, 8, 8, 1000);
    }

    let mut id = None;
    for _ in 0..5 {
        assert!(tracker.update(&mut sensor));
        assert_eq!(tracker.num_contours(), 1);

        let c = &tracker.contours()[0];
        match id {
            None => id = Some(c.id),
            Some(prev) => assert_eq!(c.id, prev, "drifting blob keeps its identity"),
        }
    }

    // blob disappears; persistence 2 keeps the track one extra frame
    sensor.queue_frame(DepthFrame::zeros(W, H));
    sensor.queue_frame(DepthFrame::zeros(W, H));
    tracker.update(&mut sensor);
    assert_eq!(tracker.num_contours(), 1);
    tracker.update(&mut sensor);
    assert_eq!(tracker.num_contours(), 0);
}

#[test]
fn delay_reads_an_older_frame() {
    let mut cfg = test_config();
    cfg.delay = 2;

    let mut tracker = DepthTracker::new(W, H, cfg);
    tracker.set_tracking_contours(true);

    let mut sensor = SyntheticSensor::new();
    // two blob frames, then two empty frames
    sensor.queue_blob_frame(10, 10, 8, 8, 1000);
    sensor.queue_blob_frame(10, 10, 8, 8, 1000);
    sensor.queue_frame(DepthFrame::zeros(W, H));
    sensor.queue_frame(DepthFrame::zeros(W, H));

    tracker.update(&mut sensor);
    tracker.update(&mut sensor);
    tracker.update(&mut sensor);
    // the delayed view still shows the first blob frame
    assert_eq!(tracker.num_contours(), 1);
}

#[test]
fn depth_mask_suppresses_the_blob() {
    let mut cfg = test_config();
    cfg.persistence = 1;
    let mut tracker = DepthTracker::new(W, H, cfg);
    tracker.set_tracking_contours(true);

    let mut sensor = SyntheticSensor::new();
    sensor.queue_blob_frame(10, 10, 8, 8, 1000);
    tracker.update(&mut sensor);
    assert_eq!(tracker.num_contours(), 1);

    // draw a mask polygon over the blob and enable it
    let editor = tracker.mask_editor_mut();
    editor.add_vertex(na::Point2::new(5.0, 5.0));
    editor.add_vertex(na::Point2::new(25.0, 5.0));
    editor.add_vertex(na::Point2::new(25.0, 25.0));
    editor.add_vertex(na::Point2::new(5.0, 25.0));
    tracker.apply(ParamUpdate::DepthMaskEnabled(true));

    sensor.queue_blob_frame(10, 10, 8, 8, 1000);
    tracker.update(&mut sensor);
    assert_eq!(tracker.num_contours(), 0);
}

#[test]
fn user_lifecycle_through_events() {
    let mut tracker = DepthTracker::new(W, H, test_config());
    tracker.set_tracking_users(true);

    let mut sensor = SyntheticSensor::new();
    sensor
        .skeletons
        .push((7, vec![na::Point3::new(100.0, 0.0, 1500.0)]));
    sensor.events.push(UserEvent::TrackingStarted(7));
    sensor.queue_frame(DepthFrame::zeros(W, H));

    tracker.update(&mut sensor);
    assert_eq!(tracker.users().ids(), vec![7]);

    sensor.skeletons.clear();
    sensor.events.push(UserEvent::TrackingStopped(7));
    sensor.queue_frame(DepthFrame::zeros(W, H));

    tracker.update(&mut sensor);
    assert!(tracker.users().is_empty());

    // stop for an unknown id is harmless
    sensor.events.push(UserEvent::TrackingStopped(42));
    sensor.queue_frame(DepthFrame::zeros(W, H));
    assert!(tracker.update(&mut sensor));
}

#[test]
fn calibration_flow_end_to_end() {
    let mut tracker = DepthTracker::new(W, H, test_config());
    let mut sensor = SyntheticSensor::new();

    // a flat wall at 1 meter gives every corner a valid world point
    sensor.queue_frame(DepthFrame::from_raw(W, H, vec![1000u16; W * H]).unwrap());
    tracker.set_calibrating(true);
    tracker.update(&mut sensor);

    let intr = sensor.intrinsics();
    let pixels = [(8, 8), (56, 8), (56, 40), (8, 40)];
    let display = [
        na::Point2::new(0.0, 1.0),
        na::Point2::new(1.0, 1.0),
        na::Point2::new(1.0, 0.0),
        na::Point2::new(0.0, 0.0),
    ];

    assert_eq!(
        tracker.add_calibration_points(&pixels, &display, &intr),
        4
    );
    tracker.calibration_mut().fit().unwrap();

    // the probe between the corners lands mid-display
    let p = tracker.projected_point_at(32, 24, &intr).unwrap();
    assert!((p.x - 0.5).abs() < 1e-6, "u = {}", p.x);
    assert!((p.y - 0.5).abs() < 1e-6, "v = {}", p.y);
}

#[test]
fn calibrated_contour_export() {
    let mut tracker = DepthTracker::new(W, H, test_config());
    let mut sensor = SyntheticSensor::new();
    let intr = sensor.intrinsics();

    // calibrate against a flat wall
    sensor.queue_frame(DepthFrame::from_raw(W, H, vec![1000u16; W * H]).unwrap());
    tracker.update(&mut sensor);
    let pixels = [(8, 8), (56, 8), (56, 40), (8, 40)];
    let display = [
        na::Point2::new(0.0, 1.0),
        na::Point2::new(1.0, 1.0),
        na::Point2::new(1.0, 0.0),
        na::Point2::new(0.0, 0.0),
    ];
    tracker.add_calibration_points(&pixels, &display, &intr);
    tracker.calibration_mut().fit().unwrap();

    // track a blob standing in front of the wall
    tracker.set_tracking_contours(true);
    let mut samples = vec![0u16; W * H];
    for y in 16..32 {
        for x in 20..44 {
            samples[x + y * W] = 1000;
        }
    }
    sensor.queue_frame(DepthFrame::from_raw(W, H, samples).unwrap());
    tracker.update(&mut sensor);
    assert_eq!(tracker.num_contours(), 1);

    let mapped = tracker
        .calibrated_contour(0, 1920.0, 1080.0, 1.0, &intr)
        .unwrap();
    assert!(!mapped.is_empty());
    for p in &mapped {
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    // out-of-range contour index is a reported error, not a panic
    assert!(tracker
        .calibrated_contour(5, 1920.0, 1080.0, 1.0, &intr)
        .is_err());
}

#[test]
fn entering_calibration_disables_tracking_modes() {
    let mut tracker = DepthTracker::new(W, H, test_config());
    tracker.set_tracking_contours(true);
    tracker.set_tracking_users(true);

    tracker.set_calibrating(true);
    assert!(tracker.is_calibrating());
    assert!(!tracker.is_tracking_contours());
    assert!(!tracker.is_tracking_users());
}
