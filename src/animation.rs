use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::locomotion::LocomotionController;

/// Parameter names as authored in the character's animator controller.
pub mod params {
    pub const JUMP: &str = "isJumping";
    pub const SLASH: &str = "isSlashing";
    pub const SLASH_TYPE: &str = "slashType";
    // Spelling matches the authored controller.
    pub const WALK_FORWARD: &str = "isWalkingFoward";
    pub const WALK_BACKWARD: &str = "isWalkingBackward";
    pub const STRAFE_LEFT: &str = "isStrafingLeft";
    pub const STRAFE_RIGHT: &str = "isStrafingRight";
    pub const CROUCH: &str = "isCrouching";
    pub const RUN: &str = "IsRunning";
}

/// Write side of an animation state graph's parameter set.
pub trait AnimationSink {
    fn set_bool(&mut self, name: &str, value: bool);
    fn set_integer(&mut self, name: &str, value: i32);
    fn set_trigger(&mut self, name: &str);
    fn reset_trigger(&mut self, name: &str);
}

/// Parameter block read by the animation graph. Triggers stay pending until
/// the graph consumes them.
#[derive(Component, Clone, Debug, Default)]
pub struct AnimatorParams {
    pub bools: HashMap<String, bool>,
    pub integers: HashMap<String, i32>,
    pub pending_triggers: HashSet<String>,
}

impl AnimatorParams {
    pub fn bool(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn integer(&self, name: &str) -> i32 {
        self.integers.get(name).copied().unwrap_or(0)
    }

    pub fn is_triggered(&self, name: &str) -> bool {
        self.pending_triggers.contains(name)
    }
}

impl AnimationSink for AnimatorParams {
    fn set_bool(&mut self, name: &str, value: bool) {
        self.bools.insert(name.to_string(), value);
    }

    fn set_integer(&mut self, name: &str, value: i32) {
        self.integers.insert(name.to_string(), value);
    }

    fn set_trigger(&mut self, name: &str) {
        self.pending_triggers.insert(name.to_string());
    }

    fn reset_trigger(&mut self, name: &str) {
        self.pending_triggers.remove(name);
    }
}

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MissingAnimators>()
            .add_systems(Update, warn_missing_animator)
            .add_systems(PostUpdate, fire_pending_triggers);
    }
}

/// Controllers that were reported for running without an animator.
#[derive(Resource, Default, Debug)]
pub struct MissingAnimators {
    pub reported: Vec<Entity>,
}

fn warn_missing_animator(
    mut missing: ResMut<MissingAnimators>,
    added: Query<Entity, (Added<LocomotionController>, Without<AnimatorParams>)>,
) {
    for entity in added.iter() {
        if missing.reported.contains(&entity) {
            continue;
        }
        warn!(
            "[Tower animation] No animator on {entity:?}; animation parameters skipped"
        );
        missing.reported.push(entity);
    }
}

/// Stand-in for the animation graph: one-shot triggers are consumed on the
/// frame they were set.
fn fire_pending_triggers(mut animators: Query<(Entity, &mut AnimatorParams)>) {
    for (entity, mut anim) in animators.iter_mut() {
        if anim.pending_triggers.is_empty() {
            continue;
        }
        for name in anim.pending_triggers.drain() {
            debug!("[Tower animation] {entity:?} fired '{name}'");
        }
    }
}
