use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::audio::ClipDefinition;
use crate::tween::Easing;

fn default_speed() -> f32 {
    5.0
}

fn default_run_speed() -> f32 {
    9.0
}

fn default_true() -> bool {
    true
}

fn default_attack_range() -> f32 {
    2.5
}

fn default_slash_duration() -> f32 {
    1.0
}

fn default_rotation_offset() -> [f32; 3] {
    [0.0, 90.0, 0.0]
}

fn default_door_duration() -> f32 {
    1.0
}

fn default_interaction_distance() -> f32 {
    3.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocomotionConfig {
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_true")]
    pub can_run: bool,
    #[serde(default = "default_run_speed")]
    pub run_speed: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            can_run: true,
            run_speed: default_run_speed(),
        }
    }
}

/// Clip fields name entries of the audio clip library; unset means silence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttackConfig {
    #[serde(default = "default_attack_range")]
    pub attack_range: f32,
    #[serde(default = "default_slash_duration")]
    pub slash1_duration: f32,
    #[serde(default = "default_slash_duration")]
    pub slash2_duration: f32,
    #[serde(default)]
    pub slash1_hit_clip: Option<String>,
    #[serde(default)]
    pub slash2_hit_clip: Option<String>,
    #[serde(default)]
    pub slash1_miss_clip: Option<String>,
    #[serde(default)]
    pub slash2_miss_clip: Option<String>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            attack_range: default_attack_range(),
            slash1_duration: default_slash_duration(),
            slash2_duration: default_slash_duration(),
            slash1_hit_clip: None,
            slash2_hit_clip: None,
            slash1_miss_clip: None,
            slash2_miss_clip: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoorConfig {
    #[serde(default)]
    pub open_position_offset: [f32; 3],
    /// Euler degrees.
    #[serde(default = "default_rotation_offset")]
    pub open_rotation_offset: [f32; 3],
    #[serde(default = "default_door_duration")]
    pub animation_duration: f32,
    #[serde(default = "default_interaction_distance")]
    pub interaction_distance: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub open_clip: Option<String>,
    #[serde(default)]
    pub close_clip: Option<String>,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            open_position_offset: [0.0; 3],
            open_rotation_offset: default_rotation_offset(),
            animation_duration: default_door_duration(),
            interaction_distance: default_interaction_distance(),
            easing: Easing::SmoothStep,
            open_clip: None,
            close_clip: None,
        }
    }
}

impl DoorConfig {
    pub fn position_offset(&self) -> Vec3 {
        Vec3::from_array(self.open_position_offset)
    }

    pub fn rotation_offset(&self) -> Vec3 {
        Vec3::from_array(self.open_rotation_offset)
    }
}

/// Per-entity tuning, read once at startup.
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub locomotion: LocomotionConfig,
    #[serde(default)]
    pub attack: AttackConfig,
    #[serde(default)]
    pub door: DoorConfig,
    #[serde(default)]
    pub clips: HashMap<String, ClipDefinition>,
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl GameConfig {
    /// Reads the gameplay sections of a startup document; other keys are ignored.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }
}
