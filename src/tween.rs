use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    #[default]
    SmoothStep,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Position and orientation of a posed entity.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }

    pub fn apply_to(&self, transform: &mut Transform) {
        transform.translation = self.translation;
        transform.rotation = self.rotation;
    }

    /// Offset is added in world space; the rotation offset is Euler degrees
    /// applied in Y, X, Z order on top of the current rotation.
    pub fn offset_by(&self, translation: Vec3, euler_degrees: Vec3) -> Self {
        let delta = Quat::from_euler(
            EulerRot::YXZ,
            euler_degrees.y.to_radians(),
            euler_degrees.x.to_radians(),
            euler_degrees.z.to_radians(),
        );
        Self::new(self.translation + translation, self.rotation * delta)
    }

    pub fn interpolate(&self, to: &Pose, t: f32) -> Self {
        Self::new(
            self.translation.lerp(to.translation, t),
            self.rotation.slerp(to.rotation, t),
        )
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TweenProgress {
    InProgress(Pose),
    /// Always carries the exact end pose.
    Done(Pose),
}

/// A pose interpolation that is advanced once per tick until it completes.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PoseTween {
    pub start: Pose,
    pub end: Pose,
    pub duration: f32,
    pub elapsed: f32,
    pub easing: Easing,
}

impl PoseTween {
    pub fn new(start: Pose, end: Pose, duration: f32, easing: Easing) -> Self {
        Self {
            start,
            end,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn current(&self) -> Pose {
        if self.duration <= 0.0 {
            return self.end;
        }
        let t = self.easing.apply(self.elapsed / self.duration);
        self.start.interpolate(&self.end, t)
    }

    pub fn advance(&mut self, dt: f32) -> TweenProgress {
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            TweenProgress::Done(self.end)
        } else {
            TweenProgress::InProgress(self.current())
        }
    }
}
