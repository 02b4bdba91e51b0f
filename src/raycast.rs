use bevy::prelude::*;

use crate::components::{HitCollider, Tags};

/// Tag that makes a collider count as a landed attack.
pub const ENEMY_TAG: &str = "enemy";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayOrigin {
    pub position: Vec3,
    pub forward: Vec3,
}

impl RayOrigin {
    pub fn from_global(transform: &GlobalTransform) -> Self {
        Self {
            position: transform.translation(),
            forward: *transform.forward(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaycastAabb {
    pub id: u64,
    pub min: Vec3,
    pub max: Vec3,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaycastHit {
    pub id: u64,
    pub point: Vec3,
    pub distance: f32,
    pub tags: Vec<String>,
}

impl RaycastHit {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Directional hit-test against whatever the world can collide with.
pub trait HitTest {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit>;
}

pub fn ray_aabb_distance(
    origin: Vec3,
    dir_normalized: Vec3,
    max_distance: f32,
    min: Vec3,
    max: Vec3,
) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let (o, d, mn, mx) = (origin[axis], dir_normalized[axis], min[axis], max[axis]);
        if d.abs() < 1e-6 {
            if o < mn || o > mx {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (mn - o) * inv;
        let mut t2 = (mx - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        tmin = tmin.max(t1);
        tmax = tmax.min(t2);
        if tmin > tmax {
            return None;
        }
    }

    // Boxes that contain the origin, or lie behind it, are not hit.
    if tmin < 0.0 {
        return None;
    }
    (tmin <= max_distance).then_some(tmin)
}

pub type ColliderItem<'a> = (
    Entity,
    &'a GlobalTransform,
    &'a HitCollider,
    Option<&'a Tags>,
);

/// Snapshot of the collidable boxes for one frame.
#[derive(Clone, Debug, Default)]
pub struct ColliderSet(pub Vec<RaycastAabb>);

impl HitTest for ColliderSet {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let len = direction.length();
        if len <= 0.0001 {
            return None;
        }
        let dir = direction / len;
        self.0
            .iter()
            .filter_map(|target| {
                ray_aabb_distance(origin, dir, max_distance, target.min, target.max).map(
                    |distance| RaycastHit {
                        id: target.id,
                        point: origin + dir * distance,
                        distance,
                        tags: target.tags.clone(),
                    },
                )
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl ColliderSet {
    pub fn from_query<'a>(colliders: impl IntoIterator<Item = ColliderItem<'a>>) -> Self {
        Self(
            colliders
                .into_iter()
                .map(|(entity, transform, collider, tags)| {
                    let center = transform.translation();
                    RaycastAabb {
                        id: entity.to_bits(),
                        min: center - collider.half_extents,
                        max: center + collider.half_extents,
                        tags: tags
                            .map(|t| t.0.iter().cloned().collect())
                            .unwrap_or_default(),
                    }
                })
                .collect(),
        )
    }
}

/// Nearest collider in range decides; anything but an enemy is a miss.
pub fn hits_enemy(origin: Option<RayOrigin>, range: f32, world: &impl HitTest) -> bool {
    let Some(origin) = origin else {
        return false;
    };
    world
        .cast(origin.position, origin.forward, range)
        .is_some_and(|hit| hit.has_tag(ENEMY_TAG))
}
