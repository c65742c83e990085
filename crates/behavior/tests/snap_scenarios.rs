//! End-to-end snap scenarios against the reference scene.

use glam::{Quat, Vec3};
use snapto_behavior::{EulerAngles, Lifecycle, SnapOutcome, SnapTo};
use snapto_core::{
    Behavior, ConfigError, FrameScheduler, ObjectId, RawOptions, SceneGraph, SnapMode,
};
use snapto_scene::{Geometry, Node, Runtime, Scene};
use snapto_testkit::{entity_at, ground_plane, tilted_plane, yawed_entity_at};

const EPS: f32 = 1e-4;

fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < EPS,
        "expected {expected:?}, got {actual:?}"
    );
}

fn position(runtime: &Runtime<SnapTo>, entity: ObjectId) -> Vec3 {
    runtime.scene().transform(entity).expect("entity exists").position
}

fn rotation(runtime: &Runtime<SnapTo>, entity: ObjectId) -> Quat {
    runtime.scene().transform(entity).expect("entity exists").rotation
}

fn attach(runtime: &mut Runtime<SnapTo>, entity: ObjectId, options: RawOptions) {
    let behavior = SnapTo::from_options(entity, &options).expect("valid options");
    runtime.attach(entity, behavior);
}

/// Route snap logs to the test harness (`RUST_LOG=snapto_behavior=debug`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Scene whose render loop is already running, so activation snaps at once.
fn rendering_scene() -> Scene {
    let mut scene = Scene::new();
    scene.start_render();
    scene
}

#[test]
fn drops_onto_plane_below() {
    init_tracing();
    let mut scene = Scene::new();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::ZERO);

    let mut runtime = Runtime::new(scene);
    attach(&mut runtime, entity, RawOptions::new());
    assert_eq!(position(&runtime, entity), Vec3::ZERO);
    assert!(runtime.behavior(entity).expect("attached").pending_render_start().is_some());

    runtime.step();
    assert_close(position(&runtime, entity), Vec3::new(0.0, -5.0, 0.0));
    assert!(runtime.behavior(entity).expect("attached").pending_render_start().is_none());
}

#[test]
fn grid_snap_floors_each_axis() {
    let mut scene = Scene::new();
    let entity = entity_at(&mut scene, Vec3::new(3.0, 5.0, -1.0));

    let mut runtime = Runtime::new(scene);
    attach(
        &mut runtime,
        entity,
        RawOptions::new().with("mode", "gridsnap").with("grid", "2 2 2"),
    );
    runtime.step();
    assert_eq!(position(&runtime, entity), Vec3::new(2.0, 4.0, -2.0));
}

#[test]
fn miss_leaves_transform_untouched() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let start = Vec3::new(1.0, 0.0, 2.0);
    let entity = yawed_entity_at(&mut scene, start, 0.3);
    let before = scene.transform(entity).expect("entity");

    let options = RawOptions::new()
        .with("type", "hitnormal")
        .with("direction", "0 1 0");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);

    assert_eq!(snap.snap(&mut scene), SnapOutcome::Missed);
    assert_eq!(scene.transform(entity), Some(before));
}

#[test]
fn offset_is_added_to_hit_point() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::ZERO);

    let options = RawOptions::new().with("offset", [0.0, 0.5, 0.0]);
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);

    assert_close(scene.transform(entity).expect("entity").position, Vec3::new(0.0, -4.5, 0.0));
    assert_eq!(scene.transform(entity).expect("entity").rotation, Quat::IDENTITY);
}

#[test]
fn ray_start_shifts_origin_along_direction() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::new(0.0, -6.0, 0.0));

    let mut below = SnapTo::from_options(entity, &RawOptions::new()).expect("valid options");
    below.on_activate(&mut scene);
    assert_eq!(below.snap(&mut scene), SnapOutcome::Missed);

    let options = RawOptions::new().with("rayStart", -2.0);
    let mut lifted = SnapTo::from_options(entity, &options).expect("valid options");
    lifted.on_activate(&mut scene);
    assert_close(scene.transform(entity).expect("entity").position, Vec3::new(0.0, -5.0, 0.0));
}

#[test]
fn selector_limits_candidates() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    scene.spawn(
        Node::entity()
            .with_class("platform")
            .at(Vec3::new(0.0, -2.0, 0.0))
            .with_geometry(Geometry::plane(4.0, 4.0)),
    );
    let first = entity_at(&mut scene, Vec3::ZERO);
    let second = entity_at(&mut scene, Vec3::ZERO);

    let mut any = SnapTo::from_options(first, &RawOptions::new()).expect("valid options");
    any.on_activate(&mut scene);
    assert_close(scene.transform(first).expect("entity").position, Vec3::new(0.0, -2.0, 0.0));

    let options = RawOptions::new().with("objects", ".ground");
    let mut ground_only = SnapTo::from_options(second, &options).expect("valid options");
    ground_only.on_activate(&mut scene);
    assert_close(scene.transform(second).expect("entity").position, Vec3::new(0.0, -5.0, 0.0));
}

#[test]
fn unmatched_selector_is_a_no_op() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::ONE);

    let options = RawOptions::new().with("objects", "#nothing-here");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);
    assert_eq!(snap.snap(&mut scene), SnapOutcome::NoCandidates);
    assert_eq!(scene.transform(entity).expect("entity").position, Vec3::ONE);
}

#[test]
fn own_geometry_is_never_a_candidate() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let entity = scene.spawn(Node::entity().with_geometry(Geometry::cuboid(Vec3::ONE)));
    scene.spawn_child(
        entity,
        Node::entity()
            .at(Vec3::new(0.0, -1.0, 0.0))
            .with_geometry(Geometry::plane(2.0, 2.0)),
    );

    let mut snap = SnapTo::from_options(entity, &RawOptions::new()).expect("valid options");
    snap.on_activate(&mut scene);
    assert!(snap
        .candidates()
        .objects()
        .iter()
        .all(|c| *c != entity && !scene.is_descendant_of(*c, entity)));
    assert_close(scene.transform(entity).expect("entity").position, Vec3::new(0.0, -5.0, 0.0));
}

#[test]
fn flat_surface_keeps_only_yaw() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let entity = yawed_entity_at(&mut scene, Vec3::ZERO, 0.7);

    let options = RawOptions::new()
        .with("mode", "hitnormal")
        .with("offset", "0 1 0");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);

    let transform = scene.transform(entity).expect("entity");
    assert_close(transform.rotation * Vec3::Y, Vec3::Y);
    assert!((EulerAngles::from_quat_yxz(transform.rotation).y - 0.7).abs() < EPS);
    assert_close(transform.position, Vec3::new(0.0, -4.0, 0.0));
}

#[test]
fn tilted_surface_aligns_up_axis_and_keeps_yaw() {
    let normal = Vec3::new(0.3, 1.0, 0.2).normalize();
    let mut scene = rendering_scene();
    tilted_plane(&mut scene, Vec3::new(0.0, -5.0, 0.0), normal);
    let entity = yawed_entity_at(&mut scene, Vec3::new(0.5, 0.0, -1.5), -0.9);

    let options = RawOptions::new().with("mode", "surface-normal-align");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);

    // point of the plane straight below (0.5, _, -1.5)
    let height = -5.0 - (normal.x * 0.5 - normal.z * 1.5) / normal.y;
    let transform = scene.transform(entity).expect("entity");
    assert_close(transform.position, Vec3::new(0.5, height, -1.5));
    assert_close(transform.rotation * Vec3::Y, normal);
    assert!((EulerAngles::from_quat_yxz(transform.rotation).y + 0.9).abs() < EPS);

    // a second cycle reads the live yaw again and lands on the same pose
    let again = snap.snap(&mut scene);
    match again {
        SnapOutcome::Aligned { rotation, .. } => {
            assert!(rotation.dot(transform.rotation).abs() > 1.0 - EPS);
        }
        other => panic!("expected an aligned snap, got {other:?}"),
    }
}

#[test]
fn continuous_alignment_settles_on_steep_slope() {
    let normal = Vec3::new(0.6, 1.0, 0.5).normalize();
    let mut scene = Scene::new();
    tilted_plane(&mut scene, Vec3::new(0.0, -5.0, 0.0), normal);
    let entity = yawed_entity_at(&mut scene, Vec3::new(0.5, 0.0, -1.5), 1.0);

    let mut runtime = Runtime::new(scene);
    attach(
        &mut runtime,
        entity,
        RawOptions::new()
            .with("mode", "hitnormal")
            .with("rayStart", -1.0)
            .with("continuous", true),
    );

    runtime.step();
    let settled = rotation(&runtime, entity);
    let landed = position(&runtime, entity);
    assert_close(settled * Vec3::Y, normal);
    assert!((EulerAngles::from_quat_yxz(settled).y - 1.0).abs() < EPS);

    for frame in 1..30 {
        runtime.step();
        let current = rotation(&runtime, entity);
        assert!(
            current.dot(settled).abs() > 1.0 - EPS,
            "rotation moved on frame {frame}: {settled:?} -> {current:?}"
        );
        assert_close(position(&runtime, entity), landed);
    }
    assert!((EulerAngles::from_quat_yxz(rotation(&runtime, entity)).y - 1.0).abs() < EPS);
}

#[test]
fn faceless_hit_only_positions() {
    let mut scene = rendering_scene();
    scene.spawn(
        Node::entity()
            .at(Vec3::new(0.0, -3.0, 0.0))
            .with_geometry(Geometry::Marker { radius: 1.0 }),
    );
    let entity = yawed_entity_at(&mut scene, Vec3::ZERO, 0.4);
    let before = scene.transform(entity).expect("entity").rotation;

    let options = RawOptions::new().with("mode", "hitnormal");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);

    let outcome = snap.snap(&mut scene);
    assert!(matches!(outcome, SnapOutcome::Positioned(p) if (p - Vec3::new(0.0, -2.0, 0.0)).length() < EPS));
    assert_eq!(scene.transform(entity).expect("entity").rotation, before);
}

#[test]
fn compose_external_policy_tracks_foreign_rotation() {
    init_tracing();
    let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
    let tilt = Quat::from_rotation_arc(Vec3::Y, normal);
    let mut scene = Scene::new();
    tilted_plane(&mut scene, Vec3::new(0.0, -5.0, 0.0), normal);
    let entity = yawed_entity_at(&mut scene, Vec3::new(0.5, 0.0, -1.5), 0.5);

    let mut runtime = Runtime::new(scene);
    attach(
        &mut runtime,
        entity,
        RawOptions::new()
            .with("mode", "hitnormal")
            .with("orientation", "compose-external")
            .with("continuous", true),
    );

    runtime.step();
    let composed = tilt * Quat::from_rotation_y(0.5);
    assert!(rotation(&runtime, entity).dot(composed).abs() > 1.0 - EPS);

    // unchanged since the last write: tilt alone
    runtime.step();
    assert!(rotation(&runtime, entity).dot(tilt).abs() > 1.0 - EPS);
    assert!(rotation(&runtime, entity).dot(composed).abs() < 1.0 - EPS);

    let foreign = Quat::from_rotation_y(-0.2);
    runtime.scene_mut().set_rotation(entity, foreign);
    runtime.step();
    assert!(rotation(&runtime, entity).dot(tilt * foreign).abs() > 1.0 - EPS);
}

#[test]
fn render_start_snap_fires_once() {
    let mut scene = Scene::new();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::ZERO);

    let mut runtime = Runtime::new(scene);
    attach(&mut runtime, entity, RawOptions::new());
    runtime.step();
    assert_close(position(&runtime, entity), Vec3::new(0.0, -5.0, 0.0));

    runtime.scene_mut().set_position(entity, Vec3::new(1.0, 0.0, 0.0));
    runtime.run(3);
    assert_eq!(position(&runtime, entity), Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(runtime.scene().scheduler().pending_render_start(), 0);
}

#[test]
fn deactivation_detaches_every_hook() {
    let mut scene = Scene::new();
    let pending = entity_at(&mut scene, Vec3::ZERO);
    let continuous = entity_at(&mut scene, Vec3::new(0.5, 0.5, 0.5));

    let mut runtime = Runtime::new(scene);
    attach(&mut runtime, pending, RawOptions::new());
    attach(
        &mut runtime,
        continuous,
        RawOptions::new().with("mode", "gridsnap").with("continuous", true),
    );
    assert_eq!(runtime.scene().scheduler().pending_render_start(), 1);
    assert_eq!(runtime.scene().scheduler().frame_hook_count(), 1);

    let detached = runtime.detach(pending).expect("attached");
    assert_eq!(detached.lifecycle(), Lifecycle::Detached);
    assert_eq!(runtime.scene().scheduler().pending_render_start(), 0);

    runtime.shutdown();
    assert_eq!(runtime.scene().scheduler().frame_hook_count(), 0);
    runtime.run(2);
    assert_eq!(position(&runtime, continuous), Vec3::new(0.5, 0.5, 0.5));
}

#[test]
fn detached_behavior_ignores_triggers() {
    let mut scene = rendering_scene();
    let entity = entity_at(&mut scene, Vec3::new(1.5, 0.0, 0.0));
    let options = RawOptions::new().with("mode", "gridsnap");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);
    snap.on_deactivate(&mut scene);

    scene.set_position(entity, Vec3::new(2.5, 0.0, 0.0));
    assert_eq!(snap.snap(&mut scene), SnapOutcome::Inactive);
    assert!(snap
        .on_config_change(&mut scene, &RawOptions::new().with("continuous", true))
        .is_ok());
    assert_eq!(snap.frame_hook(), None);
    assert_eq!(scene.transform(entity).expect("entity").position.x, 2.5);
}

#[test]
fn continuous_flag_can_be_toggled() {
    init_tracing();
    let mut scene = Scene::new();
    let entity = entity_at(&mut scene, Vec3::new(1.0, 0.0, 0.0));
    let grid = RawOptions::new().with("mode", "gridsnap").with("grid", "2 2 2");

    let mut runtime = Runtime::new(scene);
    attach(&mut runtime, entity, grid.clone());
    runtime.step();
    assert_eq!(position(&runtime, entity), Vec3::ZERO);

    runtime.scene_mut().set_position(entity, Vec3::new(3.3, 0.0, 0.0));
    runtime.step();
    assert_eq!(position(&runtime, entity).x, 3.3);

    runtime
        .configure(entity, &grid.clone().with("continuous", true))
        .expect("valid options");
    assert_eq!(runtime.scene().scheduler().frame_hook_count(), 1);
    runtime.step();
    assert_eq!(position(&runtime, entity).x, 2.0);

    runtime.scene_mut().set_position(entity, Vec3::new(5.5, 0.0, 0.0));
    runtime
        .configure(entity, &grid.with("continuous", false))
        .expect("valid options");
    assert_eq!(runtime.scene().scheduler().frame_hook_count(), 0);
    // one-shot after render start snaps immediately
    assert_eq!(position(&runtime, entity).x, 4.0);
}

#[test]
fn unrecognized_mode_does_nothing() {
    let mut scene = rendering_scene();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::new(0.3, 0.3, 0.3));

    let options = RawOptions::new().with("mode", "teleport");
    let mut snap = SnapTo::from_options(entity, &options).expect("unknown modes are accepted");
    snap.on_activate(&mut scene);
    assert!(matches!(&snap.config().mode, SnapMode::Unrecognized(name) if name == "teleport"));
    assert_eq!(snap.snap(&mut scene), SnapOutcome::UnknownMode);
    assert_eq!(scene.transform(entity).expect("entity").position, Vec3::new(0.3, 0.3, 0.3));
}

#[test]
fn invalid_options_keep_previous_configuration() {
    init_tracing();
    let mut scene = rendering_scene();
    let entity = entity_at(&mut scene, Vec3::ZERO);
    let options = RawOptions::new().with("mode", "gridsnap").with("grid", "4 4 4");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);
    let before = snap.config().clone();

    let err = snap
        .on_config_change(&mut scene, &RawOptions::new().with("offset", "1 2"))
        .expect_err("two components are not a vector");
    assert!(matches!(err, ConfigError::InvalidVector { option: "offset", .. }));
    assert_eq!(snap.config(), &before);
}

#[test]
fn zero_grid_writes_non_finite_position() {
    let mut scene = rendering_scene();
    let entity = entity_at(&mut scene, Vec3::new(1.0, 1.0, 1.0));
    let options = RawOptions::new().with("mode", "gridsnap").with("grid", "0 1 1");
    let mut snap = SnapTo::from_options(entity, &options).expect("valid options");
    snap.on_activate(&mut scene);
    let position = scene.transform(entity).expect("entity").position;
    assert!(!position.x.is_finite());
    assert_eq!(position.y, 1.0);
}

#[test]
fn late_activation_snaps_immediately() {
    let mut scene = Scene::new();
    ground_plane(&mut scene, -5.0);
    let entity = entity_at(&mut scene, Vec3::ZERO);
    let mut runtime: Runtime<SnapTo> = Runtime::new(scene);
    runtime.step();
    assert!(runtime.scene().render_started());

    attach(&mut runtime, entity, RawOptions::new());
    assert_close(position(&runtime, entity), Vec3::new(0.0, -5.0, 0.0));
    assert_eq!(runtime.scene().scheduler().pending_render_start(), 0);
}
