use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::animation::{params, AnimationSink, AnimatorParams};
use crate::audio::{AudioManager, AudioSink};
use crate::components::{HitCollider, PlayerCamera, Tags};
use crate::config::AttackConfig;
use crate::input::{actions, VirtualInput};
use crate::raycast::{hits_enemy, ColliderSet, HitTest, RayOrigin};
use crate::timed_action::{CooldownPolicy, TimedAction, Variant, VariantTable};

pub struct CombatPlugin {
    pub seed: Option<u64>,
}

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        app.insert_resource(CombatRng(rng))
            .add_systems(Update, slash_on_attack_press);
    }
}

#[derive(Resource)]
pub struct CombatRng(pub SmallRng);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum SlashVariant {
    First,
    Second,
}

impl SlashVariant {
    /// Value of the animator's slash selector.
    pub fn selector(self) -> i32 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlashOutcome {
    pub variant: SlashVariant,
    pub hit_enemy: bool,
    pub clip: Option<String>,
    pub audio_secs: f32,
    pub presentation_secs: f32,
    pub ready_at: f32,
}

/// Cooldown-gated melee slash. Triggers arriving before `ready_at` are dropped.
#[derive(Component, Clone, Debug)]
pub struct AttackAction {
    pub range: f32,
    pub variants: VariantTable<SlashVariant>,
    gate: TimedAction,
}

impl Default for AttackAction {
    fn default() -> Self {
        Self::from_config(&AttackConfig::default())
    }
}

impl AttackAction {
    pub fn from_config(config: &AttackConfig) -> Self {
        let variants = VariantTable::new()
            .with(
                SlashVariant::First,
                Variant {
                    presentation_secs: config.slash1_duration,
                    clip: config.slash1_miss_clip.clone(),
                    impact_clip: config.slash1_hit_clip.clone(),
                },
            )
            .with(
                SlashVariant::Second,
                Variant {
                    presentation_secs: config.slash2_duration,
                    clip: config.slash2_miss_clip.clone(),
                    impact_clip: config.slash2_hit_clip.clone(),
                },
            );
        Self {
            range: config.attack_range,
            variants,
            gate: TimedAction::default(),
        }
    }

    pub fn is_ready(&self, now: f32) -> bool {
        self.gate.is_idle(now)
    }

    pub fn cooldown_remaining(&self, now: f32) -> f32 {
        self.gate.remaining(now)
    }

    /// Performs the whole slash within the calling tick, or returns `None`
    /// while the previous one is still cooling down.
    pub fn try_slash(
        &mut self,
        now: f32,
        rng: &mut impl Rng,
        ray: Option<RayOrigin>,
        world: &impl HitTest,
        animator: &mut impl AnimationSink,
        audio: &mut impl AudioSink,
    ) -> Option<SlashOutcome> {
        if !self.is_ready(now) {
            return None;
        }
        let variant = self.variants.choose(rng)?;
        let entry = self.variants.get(variant).cloned().unwrap_or_default();

        animator.reset_trigger(params::SLASH);
        animator.set_integer(params::SLASH_TYPE, variant.selector());
        animator.set_trigger(params::SLASH);

        let hit_enemy = hits_enemy(ray, self.range, world);
        let clip = entry.cue(hit_enemy).map(str::to_string);
        let audio_secs = audio.play_one_shot(clip.as_deref(), now, "attack");

        let combined =
            CooldownPolicy::UpFront.combined_duration(entry.presentation_secs, audio_secs);
        let ready_at = self.gate.start(now, combined);

        Some(SlashOutcome {
            variant,
            hit_enemy,
            clip,
            audio_secs,
            presentation_secs: entry.presentation_secs,
            ready_at,
        })
    }
}

fn slash_on_attack_press(
    input: Res<VirtualInput>,
    time: Res<Time>,
    mut rng: ResMut<CombatRng>,
    mut audio: ResMut<AudioManager>,
    cameras: Query<&GlobalTransform, With<PlayerCamera>>,
    colliders: Query<(Entity, &GlobalTransform, &HitCollider, Option<&Tags>)>,
    mut attackers: Query<(Entity, &mut AttackAction, &mut AnimatorParams)>,
) {
    if !input.just_pressed(actions::ATTACK) {
        return;
    }
    let now = time.elapsed_secs();
    let ray = cameras.get_single().ok().map(RayOrigin::from_global);
    let world = ColliderSet::from_query(colliders.iter());

    for (entity, mut attack, mut animator) in attackers.iter_mut() {
        let Some(outcome) = attack.try_slash(
            now,
            &mut rng.0,
            ray,
            &world,
            &mut *animator,
            &mut *audio,
        ) else {
            debug!(
                "[Tower combat] {entity:?} slash ignored, {:.2}s cooldown left",
                attack.cooldown_remaining(now)
            );
            continue;
        };
        debug!(
            "[Tower combat] {entity:?} slash {:?} hit_enemy={} ready_at={:.2}",
            outcome.variant, outcome.hit_enemy, outcome.ready_at
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ClipDefinition;
    use crate::raycast::{RaycastAabb, RaycastHit};
    use std::collections::HashMap;

    struct AlwaysEnemy;

    impl HitTest for AlwaysEnemy {
        fn cast(&self, origin: Vec3, direction: Vec3, _max: f32) -> Option<RaycastHit> {
            Some(RaycastHit {
                id: 1,
                point: origin + direction,
                distance: 1.0,
                tags: vec!["enemy".to_string()],
            })
        }
    }

    fn origin() -> Option<RayOrigin> {
        Some(RayOrigin {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        })
    }

    fn clip(length_secs: f32) -> ClipDefinition {
        ClipDefinition {
            path: "audio/sword.ogg".to_string(),
            length_secs,
            volume: 1.0,
        }
    }

    fn attack_with_clips() -> (AttackAction, AudioManager) {
        let config = AttackConfig {
            slash1_hit_clip: Some("swing1".into()),
            slash2_hit_clip: Some("swing2".into()),
            slash1_miss_clip: Some("woosh1".into()),
            slash2_miss_clip: Some("woosh2".into()),
            ..Default::default()
        };
        let audio = AudioManager::with_clips(HashMap::from([
            ("swing1".to_string(), clip(0.5)),
            ("swing2".to_string(), clip(0.5)),
            ("woosh1".to_string(), clip(0.5)),
            ("woosh2".to_string(), clip(0.5)),
        ]));
        (AttackAction::from_config(&config), audio)
    }

    #[test]
    fn cooldown_is_longer_of_animation_and_audio_plus_padding() {
        let (mut attack, mut audio) = attack_with_clips();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut anim = AnimatorParams::default();

        let outcome = attack
            .try_slash(0.0, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
            .expect("first slash accepted");
        assert_eq!(outcome.ready_at, 2.0);
        assert_eq!(outcome.audio_secs, 0.5);

        assert!(attack
            .try_slash(1.9, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
            .is_none());
        assert!(attack
            .try_slash(2.0, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
            .is_some());
    }

    #[test]
    fn long_audio_extends_cooldown() {
        let (mut attack, mut audio) = attack_with_clips();
        for def in audio.clips.values_mut() {
            def.length_secs = 2.5;
        }
        let mut rng = SmallRng::seed_from_u64(3);
        let mut anim = AnimatorParams::default();
        let outcome = attack
            .try_slash(10.0, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
            .expect("slash accepted");
        assert_eq!(outcome.ready_at, 13.5);
    }

    #[test]
    fn no_ray_origin_always_misses() {
        let (mut attack, mut audio) = attack_with_clips();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut anim = AnimatorParams::default();
        let mut now = 0.0;
        for _ in 0..20 {
            let outcome = attack
                .try_slash(now, &mut rng, None, &AlwaysEnemy, &mut anim, &mut audio)
                .expect("idle slash accepted");
            assert!(!outcome.hit_enemy);
            let expected = match outcome.variant {
                SlashVariant::First => "woosh1",
                SlashVariant::Second => "woosh2",
            };
            assert_eq!(outcome.clip.as_deref(), Some(expected));
            now = outcome.ready_at;
        }
    }

    #[test]
    fn wall_in_range_is_a_miss() {
        let (mut attack, mut audio) = attack_with_clips();
        let wall = ColliderSet(vec![RaycastAabb {
            id: 9,
            min: Vec3::new(-1.0, -1.0, -2.0),
            max: Vec3::new(1.0, 1.0, -1.0),
            tags: vec!["wall".to_string()],
        }]);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut anim = AnimatorParams::default();
        let outcome = attack
            .try_slash(0.0, &mut rng, origin(), &wall, &mut anim, &mut audio)
            .expect("slash accepted");
        assert!(!outcome.hit_enemy);
    }

    #[test]
    fn unset_clips_are_silent_and_presentation_alone_gates() {
        let mut attack = AttackAction::default();
        let mut audio = AudioManager::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut anim = AnimatorParams::default();
        let outcome = attack
            .try_slash(0.0, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
            .expect("slash accepted");
        assert_eq!(outcome.clip, None);
        assert_eq!(outcome.audio_secs, 0.0);
        assert_eq!(outcome.ready_at, 2.0);
        assert!(audio.recent_events.is_empty());
    }

    #[test]
    fn slash_sets_selector_and_single_pending_trigger() {
        let (mut attack, mut audio) = attack_with_clips();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut anim = AnimatorParams::default();
        anim.set_trigger(params::SLASH);
        let outcome = attack
            .try_slash(0.0, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
            .expect("slash accepted");
        assert_eq!(anim.integer(params::SLASH_TYPE), outcome.variant.selector());
        assert!(anim.is_triggered(params::SLASH));
        assert_eq!(anim.pending_triggers.len(), 1);
    }

    #[test]
    fn variants_are_chosen_evenly() {
        let (mut attack, mut audio) = attack_with_clips();
        let mut rng = SmallRng::seed_from_u64(2024);
        let mut anim = AnimatorParams::default();
        let mut firsts = 0;
        let mut now = 0.0;
        for _ in 0..1000 {
            let outcome = attack
                .try_slash(now, &mut rng, origin(), &AlwaysEnemy, &mut anim, &mut audio)
                .expect("idle slash accepted");
            assert!(outcome.hit_enemy);
            if outcome.variant == SlashVariant::First {
                firsts += 1;
            }
            now = outcome.ready_at;
        }
        assert!((430..=570).contains(&firsts), "first variant picked {firsts} times");
    }

    #[test]
    fn system_slashes_once_per_press_and_respects_cooldown() {
        let mut app = App::new();
        let mut vinput = VirtualInput::default();
        vinput.set_held([actions::ATTACK]);
        app.insert_resource(vinput)
            .insert_resource(Time::<()>::default())
            .insert_resource(CombatRng(SmallRng::seed_from_u64(8)))
            .insert_resource(AudioManager::default())
            .add_systems(Update, slash_on_attack_press);
        let player = app
            .world_mut()
            .spawn((AttackAction::default(), AnimatorParams::default()))
            .id();
        app.update();

        let remaining = app
            .world()
            .get::<AttackAction>(player)
            .expect("attack present")
            .cooldown_remaining(0.0);
        assert_eq!(remaining, 2.0);

        // Still inside the cooldown: the next press is ignored.
        app.world_mut()
            .get_mut::<AnimatorParams>(player)
            .expect("animator present")
            .pending_triggers
            .clear();
        app.update();
        let anim = app
            .world()
            .get::<AnimatorParams>(player)
            .expect("animator present");
        assert!(!anim.is_triggered(params::SLASH));
        assert_eq!(
            app.world()
                .get::<AttackAction>(player)
                .expect("attack present")
                .cooldown_remaining(0.0),
            2.0
        );
    }

    #[test]
    fn system_skips_attackers_without_animator() {
        let mut app = App::new();
        let mut vinput = VirtualInput::default();
        vinput.set_held([actions::ATTACK]);
        app.insert_resource(vinput)
            .insert_resource(Time::<()>::default())
            .insert_resource(CombatRng(SmallRng::seed_from_u64(8)))
            .insert_resource(AudioManager::default())
            .add_systems(Update, slash_on_attack_press);
        let player = app.world_mut().spawn(AttackAction::default()).id();
        app.update();
        assert!(app
            .world()
            .get::<AttackAction>(player)
            .expect("attack present")
            .is_ready(0.0));
    }
}
