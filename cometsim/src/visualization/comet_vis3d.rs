use bevy::prelude::*;
use bevy::log::LogPlugin;
use bevy::math::primitives::{Sphere, Cuboid};

use crate::simulation::recorder::Trajectory;
use crate::simulation::reference::ReferenceOrbit;
use crate::simulation::states::NVec3;

/// Recorded run handed to the viewer; nothing is integrated here
#[derive(Resource)]
pub struct Playback {
    pub trajectory: Trajectory,
    pub references: Vec<ReferenceOrbit>,
    pub mu: f64,                 // G M, for placing reference planets
    pub central: NVec3,          // attractor position
    pub marker: Option<usize>,   // frame highlighted with a static marker
    pub frames_per_second: f32,
}

/// Which frame is on screen
#[derive(Resource)]
struct FrameClock {
    timer: Timer,
    frame: usize,
}

#[derive(Component)]
struct Comet;

/// Component tagging each planet sphere with its index into Playback.references
#[derive(Component)]
struct PlanetIndex(pub usize);

/// World-space → screen-space scaling factor for positions and radii
const SCALE3D: f32 = 100.0;

/// Distance of the camera from the origin along +Z
const CAMERA_DISTANCE: f32 = 1500.0;

fn to_screen(x: &NVec3) -> Vec3 {
    Vec3::new(x.x as f32, x.y as f32, x.z as f32) * SCALE3D
}

/// Replay a recorded trajectory in a Bevy window, looping over its frames
pub fn run_3d(playback: Playback) {
    tracing::info!(frames = playback.trajectory.len(), "starting Bevy 3D viewer");

    let period = 1.0 / playback.frames_per_second.max(0.1);

    App::new()
        .insert_resource(FrameClock {
            timer: Timer::from_seconds(period, TimerMode::Repeating),
            frame: 0,
        })
        .insert_resource(playback)
        // the binary already installed a tracing subscriber
        .add_plugins(DefaultPlugins.build().disable::<LogPlugin>())
        .add_systems(Startup, setup_3d)
        .add_systems(Update, (advance_frame, sync_transforms_3d, draw_trail).chain())
        .run();
}

/// Startup system: camera, light, axes, sun, comet, planets and the marker
fn setup_3d(mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    playback: Res<Playback>,
) {
    commands.spawn(Camera3dBundle {
        camera: Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.0, 0.0, 0.0)),
            ..Default::default()
        },
        transform: Transform::from_xyz(200.0, -900.0, CAMERA_DISTANCE)
            .looking_at(Vec3::ZERO, Vec3::Z),
        ..Default::default()
    });

    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 1500.0,
            range: 1000.0,
            ..Default::default()
        },
        transform: Transform::from_xyz(100.0, 100.0, CAMERA_DISTANCE),
        ..Default::default()
    });

    spawn_axes(&mut commands, &mut meshes, &mut materials);

    // Sun
    commands.spawn(PbrBundle {
        mesh: meshes.add(Sphere::new(0.12 * SCALE3D).mesh()),
        material: unlit(&mut materials, Color::srgb(1.0, 0.9, 0.1)),
        transform: Transform::from_translation(to_screen(&playback.central)),
        ..Default::default()
    });

    // Comet, placed on its first frame
    let start = playback.trajectory.first().map(|s| to_screen(&s.x)).unwrap_or(Vec3::ZERO);
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Sphere::new(0.05 * SCALE3D).mesh()),
            material: unlit(&mut materials, Color::srgb(0.2, 0.4, 1.0)),
            transform: Transform::from_translation(start),
            ..Default::default()
        },
        Comet,
    ));

    // Reference planets
    for (i, r) in playback.references.iter().enumerate() {
        commands.spawn((
            PbrBundle {
                mesh: meshes.add(Sphere::new(0.04 * SCALE3D).mesh()),
                material: unlit(&mut materials, planet_color(i)),
                transform: Transform::from_translation(to_screen(&r.position_at(0.0, playback.mu, &playback.central))),
                ..Default::default()
            },
            PlanetIndex(i),
        ));
    }

    // Static marker on the highlighted frame
    if let Some(s) = playback.marker.and_then(|i| playback.trajectory.get(i)) {
        commands.spawn(PbrBundle {
            mesh: meshes.add(Sphere::new(0.07 * SCALE3D).mesh()),
            material: unlit(&mut materials, Color::srgb(1.0, 0.0, 0.0)),
            transform: Transform::from_translation(to_screen(&s.x)),
            ..Default::default()
        });
    }
}

fn unlit(materials: &mut Assets<StandardMaterial>, color: Color) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: color,
        unlit: true,
        ..Default::default()
    })
}

fn planet_color(i: usize) -> Color {
    const COLORS: [(f32, f32, f32); 4] = [(0.1, 0.8, 0.2), (1.0, 0.5, 0.0), (0.6, 0.35, 0.2), (0.7, 0.7, 0.7)];
    let (r, g, b) = COLORS[i % COLORS.len()];
    Color::srgb(r, g, b)
}

/// Step the frame counter at the playback rate, looping at the end
fn advance_frame(time: Res<Time>, playback: Res<Playback>, mut clock: ResMut<FrameClock>) {
    let n = playback.trajectory.len();
    if n == 0 {
        return;
    }
    clock.timer.tick(time.delta());
    let ticks = clock.timer.times_finished_this_tick() as usize;
    clock.frame = (clock.frame + ticks) % n;
}

fn sync_transforms_3d(
    playback: Res<Playback>,
    clock: Res<FrameClock>,
    mut comet: Query<&mut Transform, With<Comet>>,
    mut planets: Query<(&PlanetIndex, &mut Transform), Without<Comet>>,
) {
    let Some(s) = playback.trajectory.get(clock.frame) else {
        return;
    };

    for mut transform in &mut comet {
        transform.translation = to_screen(&s.x);
    }

    for (PlanetIndex(i), mut transform) in &mut planets {
        if let Some(r) = playback.references.get(*i) {
            transform.translation = to_screen(&r.position_at(s.t, playback.mu, &playback.central));
        }
    }
}

/// Trail up to the current frame (colored by speed) and the reference orbit circles
fn draw_trail(playback: Res<Playback>, clock: Res<FrameClock>, mut gizmos: Gizmos) {
    let frames = &playback.trajectory.states()[..(clock.frame + 1).min(playback.trajectory.len())];
    let max_speed = playback
        .trajectory
        .iter()
        .map(|s| s.v.norm() as f32)
        .fold(0.0_f32, f32::max);

    gizmos.linestrip_gradient(
        frames
            .iter()
            .map(|s| (to_screen(&s.x), speed_to_color(s.v.norm() as f32, max_speed))),
    );

    for (i, r) in playback.references.iter().enumerate() {
        gizmos.circle(to_screen(&playback.central), Dir3::Z, r.radius as f32 * SCALE3D, planet_color(i));
    }
}

fn speed_to_color(speed: f32, max_speed: f32) -> Color {
    if max_speed <= 0.0 {
        return Color::srgb(1.0, 1.0, 1.0);
    }

    let t = (speed / max_speed).clamp(0.0, 1.0);

    // Simple blue -> red gradient
    Color::srgb(t, 0.0, 1.0 - t)
}

// =========================================================================================
// Draw 3D axes for visual reference
// =========================================================================================

fn spawn_axes(commands: &mut Commands, meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) {
    // Axis length and thickness, in *world* units
    let axis_len = 12.0 * SCALE3D;
    let axis_thickness = 0.009 * SCALE3D;

    let axes = [
        (Cuboid::new(axis_len, axis_thickness, axis_thickness), Color::srgb(1.0, 0.0, 0.0)), // X, red
        (Cuboid::new(axis_thickness, axis_len, axis_thickness), Color::srgb(0.0, 1.0, 0.0)), // Y, green
        (Cuboid::new(axis_thickness, axis_thickness, axis_len), Color::srgb(0.0, 0.0, 1.0)), // Z, blue
    ];

    for (cuboid, color) in axes {
        // Cuboid is centered at its transform origin, so each axis crosses the world origin
        commands.spawn(PbrBundle {
            mesh: meshes.add(cuboid.mesh()),
            material: unlit(materials, color),
            transform: Transform::from_xyz(0.0, 0.0, 0.0),
            ..Default::default()
        });
    }
}
