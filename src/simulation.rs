use bevy::prelude::{Quat, Vec3};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::animation::{params, AnimationSink, AnimatorParams};
use crate::audio::AudioManager;
use crate::combat::AttackAction;
use crate::config::GameConfig;
use crate::door::{Door, DoorEvent, DoorState};
use crate::input::{actions, VirtualInput};
use crate::locomotion::{LocomotionController, LocomotionFlags, LocomotionInput};
use crate::physics;
use crate::raycast::{ColliderSet, RayOrigin, RaycastAabb, ENEMY_TAG};
use crate::tween::Pose;

const EYE_HEIGHT: f32 = 1.6;
const ENEMY_HALF_EXTENTS: Vec3 = Vec3::new(0.4, 0.9, 0.4);

fn default_tick_hz() -> f32 {
    60.0
}

fn default_record_interval() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Clone)]
pub struct SimulationRequest {
    pub inputs: Vec<SimInput>,
    pub max_frames: u32,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
    #[serde(default)]
    pub player_start: [f32; 3],
    /// Without a camera the attack ray has no origin and always misses.
    #[serde(default = "default_true")]
    pub camera: bool,
    #[serde(default)]
    pub door_position: Option<[f32; 3]>,
    /// Centres of enemy boxes.
    #[serde(default)]
    pub enemies: Vec<[f32; 3]>,
    #[serde(default)]
    pub config: Option<GameConfig>,
}

#[derive(Deserialize, Clone)]
pub struct SimInput {
    pub frame: u32,
    pub action: String,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Serialize, Clone)]
pub struct SimulationResult {
    pub frames_elapsed: u32,
    pub trace: Vec<TraceFrame>,
    pub events: Vec<SimEvent>,
}

#[derive(Serialize, Clone)]
pub struct TraceFrame {
    pub frame: u32,
    pub time: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub flags: LocomotionFlags,
    /// Run held and allowed, whether or not the player is moving.
    pub is_running: bool,
    pub animator: AnimatorTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door: Option<DoorTrace>,
}

/// Parameters the animation graph sees at the end of the frame.
#[derive(Serialize, Clone)]
pub struct AnimatorTrace {
    pub slash_type: i32,
    pub slashing: bool,
    pub jumping: bool,
    pub running: bool,
}

impl AnimatorTrace {
    fn capture(animator: &AnimatorParams) -> Self {
        Self {
            slash_type: animator.integer(params::SLASH_TYPE),
            slashing: animator.is_triggered(params::SLASH),
            jumping: animator.is_triggered(params::JUMP),
            running: animator.bool(params::RUN),
        }
    }
}

#[derive(Serialize, Clone)]
pub struct DoorTrace {
    pub state: DoorState,
    pub is_open: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

#[derive(Serialize, Clone)]
pub struct SimEvent {
    pub frame: u32,
    pub time: f32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

struct SimState {
    position: Vec3,
    velocity: Vec3,
    locomotion: LocomotionController,
    attack: AttackAction,
    animator: AnimatorParams,
    door: Option<Door>,
    audio: AudioManager,
    rng: SmallRng,
}

pub fn run_simulation(request: &SimulationRequest) -> SimulationResult {
    let config = request.config.clone().unwrap_or_default();
    let tick_hz = if request.tick_hz > 0.0 {
        request.tick_hz
    } else {
        default_tick_hz()
    };
    let dt = 1.0 / tick_hz;

    let mut state = SimState {
        position: Vec3::from_array(request.player_start),
        velocity: Vec3::ZERO,
        locomotion: LocomotionController::from_config(&config.locomotion),
        attack: AttackAction::from_config(&config.attack),
        animator: AnimatorParams::default(),
        door: request.door_position.map(|p| {
            Door::new(
                Pose::new(Vec3::from_array(p), Quat::IDENTITY),
                &config.door,
            )
        }),
        audio: AudioManager::with_clips(config.clips.clone()),
        rng: SmallRng::seed_from_u64(config.rng_seed.unwrap_or(0)),
    };
    let world = ColliderSet(
        request
            .enemies
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let center = Vec3::from_array(*c);
                RaycastAabb {
                    id: i as u64,
                    min: center - ENEMY_HALF_EXTENTS,
                    max: center + ENEMY_HALF_EXTENTS,
                    tags: vec![ENEMY_TAG.to_string()],
                }
            })
            .collect(),
    );

    // Pre-process inputs into per-frame held actions
    let mut held: Vec<Vec<&str>> = vec![Vec::new(); request.max_frames as usize + 1];
    for input in &request.inputs {
        let duration = input.duration.max(1);
        for f in input.frame..input.frame.saturating_add(duration).min(request.max_frames) {
            held[f as usize].push(input.action.as_str());
        }
    }

    let record_interval = request.record_interval.max(1);
    let mut vinput = VirtualInput::default();
    let mut trace = Vec::new();
    let mut events = Vec::new();

    for frame in 0..request.max_frames {
        let now = frame as f32 * dt;
        vinput.set_held(held[frame as usize].iter().copied());
        let mut emit = |event_type: &str, data: serde_json::Value| {
            events.push(SimEvent {
                frame,
                time: now,
                event_type: event_type.to_string(),
                data,
            });
        };

        // Edge-triggered actions first, like the per-frame update.
        if vinput.just_pressed(actions::JUMP) {
            state.animator.set_trigger(params::JUMP);
            emit("jump", serde_json::json!({}));
        }
        if vinput.just_pressed(actions::ATTACK) {
            let ray = request.camera.then(|| RayOrigin {
                position: state.position + Vec3::Y * EYE_HEIGHT,
                forward: Vec3::NEG_Z,
            });
            if let Some(outcome) = state.attack.try_slash(
                now,
                &mut state.rng,
                ray,
                &world,
                &mut state.animator,
                &mut state.audio,
            ) {
                emit(
                    "slash",
                    serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null),
                );
            }
        }
        if let Some(door) = state.door.as_mut() {
            let distance = door.pose().translation.distance(state.position);
            let tick = door.tick(
                now,
                dt,
                vinput.just_pressed(actions::INTERACT),
                Some(distance),
                &mut state.audio,
            );
            match tick.event {
                Some(DoorEvent::Toggled { motion, audio_secs }) => emit(
                    "door_toggled",
                    serde_json::json!({ "motion": motion, "audio_secs": audio_secs }),
                ),
                Some(DoorEvent::Settled { ready_at }) => {
                    emit("door_settled", serde_json::json!({ "ready_at": ready_at }))
                }
                Some(DoorEvent::Ready) => emit("door_ready", serde_json::json!({})),
                None => {}
            }
        }

        // Fixed step: locomotion then integration.
        let (velocity, flags) = state.locomotion.step(
            LocomotionInput::from_virtual(&vinput),
            Quat::IDENTITY,
            state.velocity,
        );
        flags.write_to(&mut state.animator);
        state.velocity = velocity;
        physics::integrate(&mut state.position, &mut state.velocity, dt);

        if frame % record_interval == 0 {
            trace.push(TraceFrame {
                frame,
                time: now,
                position: state.position.to_array(),
                velocity: state.velocity.to_array(),
                flags,
                is_running: state.locomotion.is_running(),
                animator: AnimatorTrace::capture(&state.animator),
                door: state.door.as_ref().map(|door| DoorTrace {
                    state: door.state(now),
                    is_open: door.is_open(),
                    position: door.pose().translation.to_array(),
                    rotation: door.pose().rotation.to_array(),
                }),
            });
        }
        state.animator.pending_triggers.clear();
    }

    SimulationResult {
        frames_elapsed: request.max_frames,
        trace,
        events,
    }
}
