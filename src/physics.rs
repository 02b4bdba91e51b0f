use bevy::prelude::*;

pub const GRAVITY: f32 = 9.81;
/// Terminal fall speed so a long drop cannot tunnel through the ground.
pub const MAX_FALL_SPEED: f32 = 50.0;
pub const GROUND_HEIGHT: f32 = 0.0;

/// Linear velocity of a simulated body, in world units per second.
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct Body {
    pub velocity: Vec3,
}

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            integrate_bodies.after(crate::locomotion::drive_locomotion),
        );
    }
}

pub fn apply_gravity(vy: &mut f32, grounded: bool, dt: f32) {
    if grounded {
        return;
    }
    *vy -= GRAVITY * dt;
    *vy = vy.max(-MAX_FALL_SPEED);
}

/// Advances `translation` by one step and keeps it above the ground plane.
pub fn integrate(translation: &mut Vec3, velocity: &mut Vec3, dt: f32) {
    let grounded = translation.y <= GROUND_HEIGHT && velocity.y <= 0.0;
    apply_gravity(&mut velocity.y, grounded, dt);
    *translation += *velocity * dt;
    if translation.y <= GROUND_HEIGHT {
        translation.y = GROUND_HEIGHT;
        velocity.y = velocity.y.max(0.0);
    }
}

fn integrate_bodies(time: Res<Time>, mut bodies: Query<(&mut Transform, &mut Body)>) {
    let dt = time.delta_secs();
    for (mut transform, mut body) in bodies.iter_mut() {
        let mut velocity = body.velocity;
        integrate(&mut transform.translation, &mut velocity, dt);
        body.velocity = velocity;
    }
}
