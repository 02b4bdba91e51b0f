use bevy::prelude::*;
use serde::Serialize;

use crate::animation::{params, AnimationSink, AnimatorParams};
use crate::config::LocomotionConfig;
use crate::input::{actions, VirtualInput};
use crate::physics::Body;

/// Axis magnitude below which the stick counts as centred for animation.
const MOVE_DEADZONE: f32 = 0.1;

pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, drive_locomotion)
            .add_systems(Update, trigger_jump_animation);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocomotionInput {
    pub horizontal: f32,
    pub vertical: f32,
    pub run_held: bool,
    pub crouch_held: bool,
}

impl LocomotionInput {
    pub fn from_virtual(input: &VirtualInput) -> Self {
        Self {
            horizontal: input.horizontal(),
            vertical: input.vertical(),
            run_held: input.pressed(actions::RUN),
            crouch_held: input.pressed(actions::CROUCH),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LocomotionFlags {
    pub walk_forward: bool,
    pub walk_backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub crouching: bool,
    pub running: bool,
}

impl LocomotionFlags {
    pub fn write_to(&self, sink: &mut impl AnimationSink) {
        sink.set_bool(params::WALK_FORWARD, self.walk_forward);
        sink.set_bool(params::WALK_BACKWARD, self.walk_backward);
        sink.set_bool(params::STRAFE_LEFT, self.strafe_left);
        sink.set_bool(params::STRAFE_RIGHT, self.strafe_right);
        sink.set_bool(params::CROUCH, self.crouching);
        sink.set_bool(params::RUN, self.running);
    }
}

type SpeedProvider = Box<dyn Fn() -> f32 + Send + Sync>;

/// Speed providers that replace the held-key speed. The most recently pushed
/// one is in effect.
#[derive(Default)]
pub struct SpeedOverrides(Vec<SpeedProvider>);

impl SpeedOverrides {
    #[allow(dead_code)]
    pub fn push(&mut self, provider: impl Fn() -> f32 + Send + Sync + 'static) {
        self.0.push(Box::new(provider));
    }

    #[allow(dead_code)]
    pub fn pop(&mut self) -> bool {
        self.0.pop().is_some()
    }

    pub fn current(&self) -> Option<f32> {
        self.0.last().map(|provider| provider())
    }
}

#[derive(Component)]
pub struct LocomotionController {
    pub speed: f32,
    pub can_run: bool,
    pub run_speed: f32,
    pub overrides: SpeedOverrides,
    is_running: bool,
}

impl Default for LocomotionController {
    fn default() -> Self {
        Self::from_config(&LocomotionConfig::default())
    }
}

impl LocomotionController {
    pub fn from_config(config: &LocomotionConfig) -> Self {
        Self {
            speed: config.speed,
            can_run: config.can_run,
            run_speed: config.run_speed,
            overrides: SpeedOverrides::default(),
            is_running: false,
        }
    }

    /// Whether run was held on the last step (and running is allowed).
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn target_speed(&self) -> f32 {
        self.overrides.current().unwrap_or(if self.is_running {
            self.run_speed
        } else {
            self.speed
        })
    }

    /// One physics step. The returned velocity keeps `current_velocity.y`;
    /// the planar part is expressed in the entity's frame (forward is -Z).
    pub fn step(
        &mut self,
        input: LocomotionInput,
        rotation: Quat,
        current_velocity: Vec3,
    ) -> (Vec3, LocomotionFlags) {
        self.is_running = self.can_run && input.run_held;
        let speed = self.target_speed();

        let local = Vec3::new(
            input.horizontal * speed,
            current_velocity.y,
            -input.vertical * speed,
        );
        let velocity = rotation * local;

        let moving_forward = input.vertical > MOVE_DEADZONE;
        let flags = LocomotionFlags {
            walk_forward: moving_forward && !self.is_running,
            walk_backward: input.vertical < -MOVE_DEADZONE,
            strafe_left: input.horizontal < -MOVE_DEADZONE,
            strafe_right: input.horizontal > MOVE_DEADZONE,
            crouching: input.crouch_held,
            running: moving_forward && self.is_running,
        };
        (velocity, flags)
    }
}

pub(crate) fn drive_locomotion(
    input: Res<VirtualInput>,
    mut movers: Query<(
        &mut LocomotionController,
        &Transform,
        &mut Body,
        Option<&mut AnimatorParams>,
    )>,
) {
    let step_input = LocomotionInput::from_virtual(&input);
    for (mut controller, transform, mut body, animator) in movers.iter_mut() {
        let (velocity, flags) = controller.step(step_input, transform.rotation, body.velocity);
        body.velocity = velocity;
        if let Some(mut animator) = animator {
            flags.write_to(&mut *animator);
        }
    }
}

/// No jump physics here; the animation graph owns the jump.
fn trigger_jump_animation(
    input: Res<VirtualInput>,
    mut animators: Query<&mut AnimatorParams, With<LocomotionController>>,
) {
    if !input.just_pressed(actions::JUMP) {
        return;
    }
    for mut animator in animators.iter_mut() {
        animator.set_trigger(params::JUMP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn input(horizontal: f32, vertical: f32, run_held: bool) -> LocomotionInput {
        LocomotionInput {
            horizontal,
            vertical,
            run_held,
            crouch_held: false,
        }
    }

    #[test]
    fn walking_forward_uses_base_speed_and_keeps_vertical_velocity() {
        let mut controller = LocomotionController::default();
        let (velocity, flags) =
            controller.step(input(0.0, 1.0, false), Quat::IDENTITY, Vec3::new(3.0, -2.0, 0.0));
        assert_eq!(velocity, Vec3::new(0.0, -2.0, -5.0));
        assert!(flags.walk_forward);
        assert!(!flags.running);
        assert!(!controller.is_running());
    }

    #[test]
    fn running_forward_switches_flags_and_speed() {
        let mut controller = LocomotionController::default();
        let (velocity, flags) =
            controller.step(input(0.0, 1.0, true), Quat::IDENTITY, Vec3::ZERO);
        assert_eq!(velocity, Vec3::new(0.0, 0.0, -9.0));
        assert!(flags.running);
        assert!(!flags.walk_forward);
        assert!(controller.is_running());
    }

    #[test]
    fn run_disabled_ignores_run_key() {
        let mut controller = LocomotionController::from_config(&LocomotionConfig {
            can_run: false,
            ..Default::default()
        });
        let (velocity, flags) =
            controller.step(input(0.0, 1.0, true), Quat::IDENTITY, Vec3::ZERO);
        assert_eq!(velocity.z, -5.0);
        assert!(flags.walk_forward);
        assert!(!controller.is_running());
    }

    #[test]
    fn strafe_and_backward_flags_respect_deadzone() {
        let mut controller = LocomotionController::default();
        let (_, flags) = controller.step(input(-0.5, -0.05, false), Quat::IDENTITY, Vec3::ZERO);
        assert!(flags.strafe_left);
        assert!(!flags.strafe_right);
        assert!(!flags.walk_backward);
        let (_, flags) = controller.step(input(0.05, -1.0, true), Quat::IDENTITY, Vec3::ZERO);
        assert!(!flags.strafe_right);
        assert!(flags.walk_backward);
        assert!(!flags.running);
    }

    #[test]
    fn movement_follows_entity_facing() {
        let mut controller = LocomotionController::default();
        let facing_left = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let (velocity, _) = controller.step(input(0.0, 1.0, false), facing_left, Vec3::ZERO);
        assert!((velocity - Vec3::new(-5.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn last_registered_override_wins() {
        let mut controller = LocomotionController::default();
        let slow = Arc::new(AtomicU32::new(2));
        let slow_reader = Arc::clone(&slow);
        controller.overrides.push(|| 1.0);
        controller
            .overrides
            .push(move || slow_reader.load(Ordering::Relaxed) as f32);

        let (velocity, _) = controller.step(input(1.0, 0.0, true), Quat::IDENTITY, Vec3::ZERO);
        assert_eq!(velocity.x, 2.0);

        slow.store(3, Ordering::Relaxed);
        assert_eq!(controller.target_speed(), 3.0);

        assert!(controller.overrides.pop());
        assert_eq!(controller.target_speed(), 1.0);
        assert!(controller.overrides.pop());
        assert!(!controller.overrides.pop());
        assert!(controller.overrides.current().is_none());
        assert_eq!(controller.target_speed(), 9.0);
    }

    #[test]
    fn system_writes_velocity_and_flags() {
        let mut app = App::new();
        let mut vinput = VirtualInput::default();
        vinput.set_held([actions::FORWARD, actions::CROUCH]);
        app.insert_resource(vinput)
            .add_systems(Update, drive_locomotion);
        let with_animator = app
            .world_mut()
            .spawn((
                LocomotionController::default(),
                Transform::default(),
                Body::default(),
                AnimatorParams::default(),
            ))
            .id();
        let without_animator = app
            .world_mut()
            .spawn((
                LocomotionController::default(),
                Transform::default(),
                Body::default(),
            ))
            .id();
        app.update();

        let world = app.world();
        let anim = world
            .get::<AnimatorParams>(with_animator)
            .expect("animator present");
        assert!(anim.bool(params::WALK_FORWARD));
        assert!(anim.bool(params::CROUCH));
        assert!(!anim.bool(params::RUN));
        let body = world.get::<Body>(without_animator).expect("body present");
        assert_eq!(body.velocity, Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn jump_edge_sets_trigger_only_on_animated_controllers() {
        let mut app = App::new();
        let mut vinput = VirtualInput::default();
        vinput.set_held([actions::JUMP]);
        app.insert_resource(vinput)
            .add_systems(Update, trigger_jump_animation);
        let entity = app
            .world_mut()
            .spawn((LocomotionController::default(), AnimatorParams::default()))
            .id();
        app.update();
        assert!(app
            .world()
            .get::<AnimatorParams>(entity)
            .expect("animator present")
            .is_triggered(params::JUMP));
    }
}
