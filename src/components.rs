use std::collections::HashSet;

use bevy::prelude::*;

/// Marks the player entity
#[derive(Component)]
pub struct Player;

/// Marks the camera the player looks and attacks through
#[derive(Component)]
pub struct PlayerCamera;

#[derive(Component, Clone, Default)]
pub struct Tags(pub HashSet<String>);

impl Tags {
    pub fn single(tag: &str) -> Self {
        Self(HashSet::from([tag.to_string()]))
    }
}

/// Axis-aligned box the attack ray can hit, centered on the entity.
#[derive(Component, Clone, Copy)]
pub struct HitCollider {
    pub half_extents: Vec3,
}
