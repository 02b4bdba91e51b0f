use bevy::prelude::*;

use crate::animation::AnimatorParams;
use crate::combat::AttackAction;
use crate::components::{HitCollider, Player, PlayerCamera, Tags};
use crate::config::GameConfig;
use crate::door::Door;
use crate::locomotion::LocomotionController;
use crate::physics::Body;
use crate::raycast::ENEMY_TAG;
use crate::tween::Pose;

const EYE_HEIGHT: f32 = 1.6;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_level, spawn_player));
    }
}

fn spawn_player(mut commands: Commands, config: Res<GameConfig>) {
    commands
        .spawn((
            Player,
            Transform::from_xyz(0.0, 0.0, 6.0),
            Visibility::default(),
            Body::default(),
            LocomotionController::from_config(&config.locomotion),
            AttackAction::from_config(&config.attack),
            AnimatorParams::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                PlayerCamera,
                Camera3d::default(),
                Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
            ));
        });
}

fn spawn_level(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(40.0, 40.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.22, 0.2, 0.18))),
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let enemy_half = Vec3::new(0.4, 0.9, 0.4);
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(enemy_half * 2.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.6, 0.12, 0.1))),
        Transform::from_xyz(0.0, enemy_half.y, 2.0),
        HitCollider {
            half_extents: enemy_half,
        },
        Tags::single(ENEMY_TAG),
    ));

    let door_transform = Transform::from_xyz(3.0, 1.0, 3.0);
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(1.2, 2.0, 0.12))),
        MeshMaterial3d(materials.add(Color::srgb(0.4, 0.26, 0.12))),
        door_transform,
        Door::new(Pose::from_transform(&door_transform), &config.door),
    ));
}
