use bevy::prelude::*;
use serde::Serialize;

use crate::audio::{AudioManager, AudioSink};
use crate::components::Player;
use crate::config::DoorConfig;
use crate::input::{actions, VirtualInput};
use crate::timed_action::{CooldownPolicy, TimedAction, Variant, VariantTable};
use crate::tween::{Easing, Pose, PoseTween, TweenProgress};

pub struct DoorPlugin;

impl Plugin for DoorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, operate_doors);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum DoorMotion {
    Open,
    Close,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum DoorState {
    Idle,
    Animating,
    Cooling,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum DoorPhase {
    Idle,
    Animating { tween: PoseTween, audio_secs: f32 },
    Cooling,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub enum DoorEvent {
    Toggled { motion: DoorMotion, audio_secs: f32 },
    Settled { ready_at: f32 },
    Ready,
}

/// What one tick changed: the new pose (if the door moved) and at most one
/// phase change.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct DoorTick {
    pub pose: Option<Pose>,
    pub event: Option<DoorEvent>,
}

/// Proximity-triggered open/close toggle. A toggle plays its cue, animates to
/// the target pose, then stays closed to input until the cue's overhang plus
/// padding has passed.
#[derive(Component, Clone, Debug)]
pub struct Door {
    pub interaction_distance: f32,
    pub animation_duration: f32,
    pub easing: Easing,
    pub cues: VariantTable<DoorMotion>,
    closed: Pose,
    open: Pose,
    pose: Pose,
    is_open: bool,
    phase: DoorPhase,
    gate: TimedAction,
}

impl Door {
    /// `closed` is the spawn pose; the open pose is derived from it once.
    pub fn new(closed: Pose, config: &DoorConfig) -> Self {
        let cues = VariantTable::new()
            .with(
                DoorMotion::Open,
                Variant {
                    presentation_secs: config.animation_duration,
                    clip: config.open_clip.clone(),
                    impact_clip: None,
                },
            )
            .with(
                DoorMotion::Close,
                Variant {
                    presentation_secs: config.animation_duration,
                    clip: config.close_clip.clone(),
                    impact_clip: None,
                },
            );
        Self {
            interaction_distance: config.interaction_distance,
            animation_duration: config.animation_duration.max(0.0),
            easing: config.easing,
            cues,
            closed,
            open: closed.offset_by(config.position_offset(), config.rotation_offset()),
            pose: closed,
            is_open: false,
            phase: DoorPhase::Idle,
            gate: TimedAction::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn state(&self, now: f32) -> DoorState {
        match self.phase {
            DoorPhase::Idle => DoorState::Idle,
            DoorPhase::Animating { .. } => DoorState::Animating,
            DoorPhase::Cooling if self.gate.is_idle(now) => DoorState::Idle,
            DoorPhase::Cooling => DoorState::Cooling,
        }
    }

    /// Advance one tick. `target_distance` is `None` when there is nobody to
    /// track, in which case the door never toggles.
    pub fn tick(
        &mut self,
        now: f32,
        dt: f32,
        interact_pressed: bool,
        target_distance: Option<f32>,
        audio: &mut impl AudioSink,
    ) -> DoorTick {
        match self.phase {
            DoorPhase::Animating {
                mut tween,
                audio_secs,
            } => return self.animate(now, dt, &mut tween, audio_secs),
            DoorPhase::Cooling => {
                if !self.gate.is_idle(now) {
                    return DoorTick::default();
                }
                self.phase = DoorPhase::Idle;
                let toggled = self.try_toggle(now, interact_pressed, target_distance, audio);
                return DoorTick {
                    event: toggled.event.or(Some(DoorEvent::Ready)),
                    ..toggled
                };
            }
            DoorPhase::Idle => {}
        }
        self.try_toggle(now, interact_pressed, target_distance, audio)
    }

    fn try_toggle(
        &mut self,
        now: f32,
        interact_pressed: bool,
        target_distance: Option<f32>,
        audio: &mut impl AudioSink,
    ) -> DoorTick {
        let in_reach = target_distance.is_some_and(|d| d <= self.interaction_distance);
        if !interact_pressed || !in_reach {
            return DoorTick::default();
        }

        self.is_open = !self.is_open;
        let (motion, target) = if self.is_open {
            (DoorMotion::Open, self.open)
        } else {
            (DoorMotion::Close, self.closed)
        };
        let clip = self.cues.get(motion).and_then(|cue| cue.cue(false));
        let audio_secs = audio.play_one_shot(clip, now, "door");

        let event = Some(DoorEvent::Toggled { motion, audio_secs });
        // No animation: snap and start cooling on this tick.
        if self.animation_duration <= 0.0 {
            self.settle(now, target, audio_secs);
            return DoorTick {
                pose: Some(target),
                event,
            };
        }
        let tween = PoseTween::new(self.pose, target, self.animation_duration, self.easing);
        self.phase = DoorPhase::Animating { tween, audio_secs };
        DoorTick {
            pose: Some(tween.current()),
            event,
        }
    }

    /// Lands on `pose` and waits out the cue overhang. Returns the ready time.
    fn settle(&mut self, now: f32, pose: Pose, audio_secs: f32) -> f32 {
        self.pose = pose;
        self.phase = DoorPhase::Cooling;
        let wait = CooldownPolicy::AfterPresentation
            .combined_duration(self.animation_duration, audio_secs);
        self.gate.start(now, wait)
    }

    fn animate(&mut self, now: f32, dt: f32, tween: &mut PoseTween, audio_secs: f32) -> DoorTick {
        match tween.advance(dt) {
            TweenProgress::InProgress(pose) => {
                self.pose = pose;
                self.phase = DoorPhase::Animating {
                    tween: *tween,
                    audio_secs,
                };
                DoorTick {
                    pose: Some(pose),
                    event: None,
                }
            }
            TweenProgress::Done(pose) => {
                let ready_at = self.settle(now, pose, audio_secs);
                DoorTick {
                    pose: Some(pose),
                    event: Some(DoorEvent::Settled { ready_at }),
                }
            }
        }
    }
}

fn operate_doors(
    time: Res<Time>,
    input: Res<VirtualInput>,
    mut audio: ResMut<AudioManager>,
    players: Query<&Transform, (With<Player>, Without<Door>)>,
    mut doors: Query<(Entity, &mut Door, &mut Transform)>,
) {
    let now = time.elapsed_secs();
    let dt = time.delta_secs();
    let interact = input.just_pressed(actions::INTERACT);
    let player = players.get_single().ok().map(|t| t.translation);

    for (entity, mut door, mut transform) in doors.iter_mut() {
        let distance = player.map(|p| door.pose().translation.distance(p));
        let tick = door.tick(now, dt, interact, distance, &mut *audio);
        if let Some(pose) = tick.pose {
            pose.apply_to(&mut transform);
        }
        match tick.event {
            Some(DoorEvent::Toggled { motion, audio_secs }) => {
                debug!("[Tower door] {entity:?} {motion:?} (cue {audio_secs:.2}s)");
            }
            Some(DoorEvent::Settled { ready_at }) => {
                debug!("[Tower door] {entity:?} settled; ready at {ready_at:.2}");
            }
            Some(DoorEvent::Ready) | None => {}
        }
    }
}
