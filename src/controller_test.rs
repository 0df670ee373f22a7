use std::cell::{Cell, RefCell};

use image::{GrayImage, Luma};

use super::*;
use crate::config::ArenaConfig;
use crate::transport::TransportError;

// =============================================================================
// TEST TRANSPORT
// =============================================================================

#[derive(Default)]
struct RecordingTransport {
    poses: RefCell<Vec<Pose>>,
    metadata: RefCell<Vec<MapMetaData>>,
    maps: RefCell<Vec<OccupancyGrid>>,
    closed: Cell<u32>,
    fail: bool,
}

impl RecordingTransport {
    fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    fn check(&self, topic: &str) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::QueueFull { topic: topic.into() });
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn publish_initial_pose(&self, pose: &Pose) -> Result<(), TransportError> {
        self.check("initial_pose")?;
        self.poses.borrow_mut().push(*pose);
        Ok(())
    }

    fn publish_map_metadata(&self, metadata: &MapMetaData) -> Result<(), TransportError> {
        self.check("map_metadata")?;
        self.metadata.borrow_mut().push(metadata.clone());
        Ok(())
    }

    fn publish_map(&self, grid: &OccupancyGrid) -> Result<(), TransportError> {
        self.check("map")?;
        self.maps.borrow_mut().push(grid.clone());
        Ok(())
    }

    fn close(&self) {
        self.closed.set(self.closed.get() + 1);
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// 22 x 12 px arena (20 x 10 floor, 1 px border) at 0.1 m/px; robot radius 2 px.
fn config() -> AppConfig {
    AppConfig {
        arena: ArenaConfig { width: 20, height: 10, margin: 1, resolution: 0.1 },
        robot_diameter: 0.4,
        ..AppConfig::default()
    }
}

fn controller() -> WorldStateController<RecordingTransport> {
    WorldStateController::new(RecordingTransport::default(), &config())
}

fn key(c: &mut WorldStateController<RecordingTransport>, name: &str) -> Vec<Action> {
    c.on_key(&Key::new(name))
}

fn maps_published(c: &WorldStateController<RecordingTransport>) -> usize {
    c.transport().maps.borrow().len()
}

fn last_pose(c: &WorldStateController<RecordingTransport>) -> Pose {
    match c.transport().poses.borrow().last() {
        Some(pose) => *pose,
        None => panic!("no pose published"),
    }
}

fn write_map(dir: &tempfile::TempDir) -> PathBuf {
    GrayImage::from_pixel(30, 15, Luma([255])).save(dir.path().join("lab.png")).unwrap();
    let path = dir.path().join("lab.yaml");
    std::fs::write(&path, "image: lab.png\nresolution: 0.05\norigin: [1.0, 2.0, 0.0]\nnegate: 0\n").unwrap();
    path
}

// =============================================================================
// STARTUP
// =============================================================================

#[test]
fn starts_on_blank_arena_without_publishing() {
    let c = controller();
    let status = c.status();
    assert_eq!((status.width, status.height), (22, 12));
    assert_eq!(status.resolution, 0.1);
    assert_eq!(status.mode, Mode::Idle);
    assert!(status.map.is_none());
    assert!(status.robot.is_none());
    assert_eq!(maps_published(&c), 0);
    assert_eq!(c.engine().robot_radius_px(), 2.0);
}

// =============================================================================
// MAP PUBLICATION
// =============================================================================

#[test]
fn update_map_publishes_metadata_and_grid() {
    let mut c = controller();
    c.update_map();

    let metadata = c.transport().metadata.borrow();
    assert_eq!(metadata.len(), 1);
    assert_eq!((metadata[0].width, metadata[0].height), (22, 12));
    assert!(metadata[0].map_load_time.is_some());

    let maps = c.transport().maps.borrow();
    assert_eq!(maps.len(), 1);
    let grid = &maps[0];
    let header = grid.header.as_ref().unwrap();
    assert_eq!(header.seq, 0);
    assert_eq!(header.frame_id, "map_frame");
    assert!(header.stamp.is_some());
    assert_eq!(grid.data.len(), 22 * 12);
    assert_eq!(grid.data[0], 100);
    assert_eq!(grid.data[22 + 1], 0);

    let info = grid.info.as_ref().unwrap();
    let origin = info.origin.unwrap();
    assert_eq!(origin.x(), 0.0);
    assert!((origin.y() - 1.2).abs() < 1e-9);
    assert_eq!(origin.yaw(), 0.0);
}

#[test]
fn switching_out_of_add_wall_mid_drag_publishes_once() {
    let mut c = controller();
    key(&mut c, "w");
    c.on_pointer_down(Point::new(5.0, 5.0));
    c.on_pointer_drag(Point::new(15.0, 5.0));
    assert_eq!(maps_published(&c), 0);

    let actions = key(&mut c, "w");
    assert_eq!(actions, vec![Action::SetCursor("left_ptr")]);
    assert_eq!(maps_published(&c), 1);
    assert_eq!(c.status().walls, 1);

    let maps = c.transport().maps.borrow();
    assert_eq!(maps[0].data[5 * 22 + 10], 100);
}

#[test]
fn each_wall_edit_publishes_on_release() {
    let mut c = controller();
    for (n, y) in [(1, 3.0), (2, 6.0)] {
        key(&mut c, "w");
        c.on_pointer_down(Point::new(3.0, y));
        c.on_pointer_drag(Point::new(18.0, y));
        assert_eq!(maps_published(&c), n - 1);
        let actions = c.on_pointer_up(Point::new(18.0, y));
        assert_eq!(actions, vec![Action::SetCursor("left_ptr")]);
        assert_eq!(maps_published(&c), n);
        assert_eq!(c.status().mode, Mode::Idle);
    }

    key(&mut c, "d");
    assert_eq!(maps_published(&c), 2);
    c.on_pointer_down(Point::new(10.0, 3.0));
    assert_eq!(maps_published(&c), 2);
    c.on_pointer_up(Point::new(10.0, 3.0));
    assert_eq!(maps_published(&c), 3);
    assert_eq!(c.status().walls, 1);
    assert_eq!(c.status().mode, Mode::Idle);

    let maps = c.transport().maps.borrow();
    assert_eq!(maps[2].data[3 * 22 + 10], 0);
    assert_eq!(maps[2].data[6 * 22 + 10], 100);
}

// =============================================================================
// POSES
// =============================================================================

#[test]
fn live_pose_places_marker_in_metric_space() {
    let mut c = controller();
    let actions = c.on_live_pose(&Pose::planar(1.0, 0.6, 0.5));
    assert_eq!(actions, vec![Action::RenderNeeded]);
    let robot = c.status().robot.unwrap();
    assert!((robot.x - 1.0).abs() < 1e-9);
    assert!((robot.y - 0.6).abs() < 1e-9);
    assert!((robot.yaw - 0.5).abs() < 1e-9);
}

#[test]
fn live_pose_ignored_while_setting_pose() {
    let mut c = controller();
    c.on_live_pose(&Pose::planar(1.0, 0.6, 0.0));
    key(&mut c, "p");
    assert!(c.on_live_pose(&Pose::planar(0.2, 0.2, 1.0)).is_empty());
    let robot = c.status().robot.unwrap();
    assert!((robot.x - 1.0).abs() < 1e-9);
}

#[test]
fn rotate_gesture_publishes_metric_pose_on_release() {
    let mut c = controller();
    c.on_live_pose(&Pose::planar(1.0, 0.6, 2.0));
    key(&mut c, "p");

    // Marker sits at pixel (10, 6); click 5 px to its right.
    c.on_pointer_down(Point::new(15.0, 6.0));
    assert!(c.transport().poses.borrow().is_empty());
    c.on_pointer_up(Point::new(15.0, 6.0));

    let pose = last_pose(&c);
    assert!((pose.x() - 1.0).abs() < 1e-9);
    assert!((pose.y() - 0.6).abs() < 1e-9);
    assert!(pose.yaw().abs() < 1e-9);
    assert_eq!(pose.position.unwrap().z, 0.0);
}

#[test]
fn translate_gesture_publishes_moved_pose() {
    let mut c = controller();
    c.on_live_pose(&Pose::planar(1.0, 0.6, 0.0));
    key(&mut c, "p");
    c.on_pointer_down(Point::new(10.0, 6.0));
    c.on_pointer_drag(Point::new(12.0, 2.0));
    c.on_pointer_up(Point::new(12.0, 2.0));

    let pose = last_pose(&c);
    assert!((pose.x() - 1.2).abs() < 1e-9);
    assert!((pose.y() - 1.0).abs() < 1e-9);
}

#[test]
fn pose_key_twice_confirms_and_returns_to_idle() {
    let mut c = controller();
    c.on_live_pose(&Pose::planar(1.0, 0.6, 0.0));
    key(&mut c, "p");
    let actions = key(&mut c, "p");
    assert_eq!(actions, vec![Action::SetCursor("left_ptr")]);
    assert_eq!(c.transport().poses.borrow().len(), 1);
    assert_eq!(c.status().mode, Mode::Idle);
}

#[test]
fn reset_publishes_unknown_pose() {
    let mut c = controller();
    c.reset();
    let pose = last_pose(&c);
    assert!(pose.x().is_infinite() && pose.x() > 0.0);
    assert!(pose.y().is_infinite() && pose.y() > 0.0);
    assert_eq!(pose.yaw(), 0.0);
}

#[test]
fn reset_ignores_active_map() {
    let dir = tempfile::tempdir().unwrap();
    let mut c = controller();
    c.load_map(&write_map(&dir)).unwrap();
    c.reset();
    let pose = last_pose(&c);
    assert_eq!((pose.x(), pose.y()), (f64::INFINITY, f64::INFINITY));
}

// =============================================================================
// MAP LOADING
// =============================================================================

#[test]
fn load_map_replaces_everything_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_map(&dir);
    let mut c = controller();
    c.on_live_pose(&Pose::planar(1.0, 0.6, 0.0));
    key(&mut c, "w");
    c.on_pointer_down(Point::new(3.0, 3.0));
    c.on_pointer_up(Point::new(8.0, 3.0));
    assert_eq!(maps_published(&c), 1);

    let actions = c.load_map(&path).unwrap();
    assert_eq!(actions, vec![Action::RenderNeeded]);

    let status = c.status();
    assert_eq!((status.width, status.height), (30, 15));
    assert_eq!(status.resolution, 0.05);
    assert_eq!(status.walls, 0);
    assert_eq!(status.next_wall, 0);
    assert!(status.robot.is_none());
    assert_eq!(status.map, Some(path));
    assert_eq!(status.mode, Mode::Idle);
    assert_eq!(c.engine().robot_radius_px(), 4.0);

    let maps = c.transport().maps.borrow();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[1].info.as_ref().unwrap().width, 30);
    assert!(maps[1].data.iter().all(|&v| v == 0));
}

#[test]
fn loaded_map_uses_descriptor_origin_for_poses() {
    let dir = tempfile::tempdir().unwrap();
    let mut c = controller();
    c.load_map(&write_map(&dir)).unwrap();
    // Bottom-left is (1.0, 2.0); top-left is (1.0, 2.75).
    c.on_live_pose(&Pose::planar(1.5, 2.25, 0.0));
    let marker = c.engine().current_pose().unwrap();
    assert!((marker.center.x - 10.0).abs() < 1e-6);
    assert!((marker.center.y - 10.0).abs() < 1e-6);
}

#[test]
fn failed_load_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.yaml"), "image: lab.png\nresolution: -1\norigin: [0, 0]\n").unwrap();
    let mut c = controller();
    key(&mut c, "w");
    c.on_pointer_down(Point::new(3.0, 3.0));
    c.on_pointer_up(Point::new(8.0, 3.0));
    let before = c.status();
    let published = maps_published(&c);

    let err = c.load_map(&dir.path().join("bad.yaml")).unwrap_err();
    assert!(matches!(err, MapLoadError::InvalidResolution(_)));
    assert!(c.load_map(&dir.path().join("missing.yaml")).is_err());

    assert_eq!(c.status(), before);
    assert_eq!(maps_published(&c), published);
}

#[test]
fn cancelled_open_is_a_noop() {
    let mut c = controller();
    assert!(c.open_map(None).unwrap().is_empty());
    assert_eq!(maps_published(&c), 0);
    assert!(c.status().map.is_none());
}

#[test]
fn open_map_with_path_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_map(&dir);
    let mut c = controller();
    c.open_map(Some(&path)).unwrap();
    assert_eq!(c.status().map, Some(path));
}

// =============================================================================
// FAILURES AND SHUTDOWN
// =============================================================================

#[test]
fn transport_failures_do_not_block_editing() {
    let mut c = WorldStateController::new(RecordingTransport::failing(), &config());
    c.update_map();
    c.reset();
    key(&mut c, "w");
    c.on_pointer_down(Point::new(3.0, 3.0));
    c.on_pointer_up(Point::new(8.0, 3.0));
    assert_eq!(c.status().walls, 1);
    assert_eq!(c.status().mode, Mode::Idle);
}

#[test]
fn shutdown_is_idempotent() {
    let mut c = controller();
    assert!(c.shutdown());
    assert!(!c.shutdown());
    assert!(c.is_shut_down());
    assert_eq!(c.transport().closed.get(), 1);
    assert!(c.status().shut_down);
}

#[test]
fn status_serializes_mode_in_snake_case() {
    let mut c = controller();
    key(&mut c, "w");
    let json = serde_json::to_value(c.status()).unwrap();
    assert_eq!(json["mode"], "add_wall");
    assert_eq!(json["walls"], 0);
}
