use rand::Rng;
use serde::Serialize;

/// Extra wait appended to every busy period, on top of presentation/audio.
pub const COOLDOWN_PADDING_SECS: f32 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ActionState {
    Idle,
    Busy,
}

/// How an actuator turns its presentation and audio lengths into a busy span.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum CooldownPolicy {
    /// Busy for the longer of presentation and audio, decided when the action starts.
    UpFront,
    /// The presentation blocks on its own; afterwards only the audio overhang is waited out.
    AfterPresentation,
}

impl CooldownPolicy {
    pub fn combined_duration(self, presentation_secs: f32, audio_secs: f32) -> f32 {
        let presentation_secs = presentation_secs.max(0.0);
        let audio_secs = audio_secs.max(0.0);
        match self {
            Self::UpFront => presentation_secs.max(audio_secs) + COOLDOWN_PADDING_SECS,
            Self::AfterPresentation => {
                (audio_secs - presentation_secs).max(0.0) + COOLDOWN_PADDING_SECS
            }
        }
    }
}

/// Timestamp gate shared by every actuator. Busy is derived, never stored:
/// the action is busy exactly while `now < ready_at`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimedAction {
    ready_at: f32,
}

impl TimedAction {
    pub fn state(&self, now: f32) -> ActionState {
        if now < self.ready_at {
            ActionState::Busy
        } else {
            ActionState::Idle
        }
    }

    pub fn is_idle(&self, now: f32) -> bool {
        self.state(now) == ActionState::Idle
    }

    pub fn remaining(&self, now: f32) -> f32 {
        (self.ready_at - now).max(0.0)
    }

    /// Enter Busy for `duration` seconds. Returns the new ready time.
    pub fn start(&mut self, now: f32, duration: f32) -> f32 {
        self.ready_at = now + duration.max(0.0);
        self.ready_at
    }
}

/// Presentation length plus the audio cues that go with one discrete choice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variant {
    pub presentation_secs: f32,
    pub clip: Option<String>,
    /// Played instead of `clip` when the action lands on something.
    pub impact_clip: Option<String>,
}

impl Variant {
    pub fn cue(&self, impact: bool) -> Option<&str> {
        if impact {
            self.impact_clip.as_deref()
        } else {
            self.clip.as_deref()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VariantTable<K> {
    entries: Vec<(K, Variant)>,
}

impl<K: Copy + PartialEq> VariantTable<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, key: K, variant: Variant) -> Self {
        self.insert(key, variant);
        self
    }

    pub fn insert(&mut self, key: K, variant: Variant) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = variant;
        } else {
            self.entries.push((key, variant));
        }
    }

    pub fn get(&self, key: K) -> Option<&Variant> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Uniform pick over the registered keys.
    pub fn choose(&self, rng: &mut impl Rng) -> Option<K> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.entries.len());
        Some(self.entries[idx].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn busy_exactly_until_ready_at() {
        let mut action = TimedAction::default();
        assert!(action.is_idle(0.0));
        let ready = action.start(0.0, 2.0);
        assert_eq!(ready, 2.0);
        assert_eq!(action.state(1.9), ActionState::Busy);
        assert_eq!(action.state(2.0), ActionState::Idle);
        assert_eq!(action.remaining(1.5), 0.5);
        assert_eq!(action.remaining(3.0), 0.0);
    }

    #[test]
    fn up_front_takes_longer_of_presentation_and_audio() {
        assert_eq!(CooldownPolicy::UpFront.combined_duration(1.0, 0.5), 2.0);
        assert_eq!(CooldownPolicy::UpFront.combined_duration(1.0, 2.5), 3.5);
        assert_eq!(CooldownPolicy::UpFront.combined_duration(0.0, 0.0), 1.0);
    }

    #[test]
    fn after_presentation_only_waits_audio_overhang() {
        assert_eq!(
            CooldownPolicy::AfterPresentation.combined_duration(1.0, 3.0),
            3.0
        );
        assert_eq!(
            CooldownPolicy::AfterPresentation.combined_duration(1.0, 0.4),
            1.0
        );
    }

    #[test]
    fn variant_table_replaces_and_picks_registered_keys() {
        let table = VariantTable::new()
            .with(
                1u8,
                Variant {
                    presentation_secs: 1.0,
                    ..Default::default()
                },
            )
            .with(
                2u8,
                Variant {
                    presentation_secs: 0.8,
                    ..Default::default()
                },
            )
            .with(
                1u8,
                Variant {
                    presentation_secs: 1.2,
                    ..Default::default()
                },
            );
        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.get(1).map(|v| v.presentation_secs), Some(1.2));

        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let key = table.choose(&mut rng).expect("non-empty table");
            assert!(key == 1 || key == 2);
        }
        assert!(VariantTable::<u8>::new().choose(&mut rng).is_none());
    }

    #[test]
    fn cue_selects_impact_clip_only_on_impact() {
        let variant = Variant {
            presentation_secs: 1.0,
            clip: Some("woosh".into()),
            impact_clip: None,
        };
        assert_eq!(variant.cue(false), Some("woosh"));
        assert_eq!(variant.cue(true), None);
    }
}
