use std::collections::HashMap;

use bevy::audio::Volume;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

const MAX_AUDIO_EVENTS: usize = 256;

fn default_volume() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClipDefinition {
    pub path: String,
    /// Playback length in seconds; cooldowns are arbitrated against it.
    pub length_secs: f32,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioEventLog {
    pub time: f32,
    pub name: String,
    pub volume: f32,
    pub length_secs: f32,
    pub source: String,
}

/// Fire-and-forget playback: start a clip and learn how long it lasts.
pub trait AudioSink {
    /// Unset or unknown clips play nothing and last zero seconds.
    fn play_one_shot(&mut self, clip: Option<&str>, now: f32, source: &str) -> f32;
}

#[derive(Clone, Debug)]
struct QueuedPlayback {
    path: String,
    volume: f32,
}

#[derive(Resource)]
pub struct AudioManager {
    pub clips: HashMap<String, ClipDefinition>,
    pub master_volume: f32,
    pub recent_events: Vec<AudioEventLog>,
    queued: Vec<QueuedPlayback>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self {
            clips: HashMap::new(),
            master_volume: 1.0,
            recent_events: Vec::new(),
            queued: Vec::new(),
        }
    }
}

impl AudioManager {
    pub fn with_clips(clips: HashMap<String, ClipDefinition>) -> Self {
        Self {
            clips,
            ..Self::default()
        }
    }

    pub fn play_clip(&mut self, name: &str, now: f32, source: &str) -> Result<f32, String> {
        let Some(def) = self.clips.get(name) else {
            return Err(format!("Unknown clip: {name}"));
        };
        let volume = def.volume * self.master_volume;
        let length_secs = def.length_secs.max(0.0);
        self.queued.push(QueuedPlayback {
            path: def.path.clone(),
            volume,
        });
        self.push_event(AudioEventLog {
            time: now,
            name: name.to_string(),
            volume,
            length_secs,
            source: source.to_string(),
        });
        Ok(length_secs)
    }

    fn push_event(&mut self, event: AudioEventLog) {
        self.recent_events.push(event);
        if self.recent_events.len() > MAX_AUDIO_EVENTS {
            let excess = self.recent_events.len() - MAX_AUDIO_EVENTS;
            self.recent_events.drain(0..excess);
        }
    }
}

impl AudioSink for AudioManager {
    fn play_one_shot(&mut self, clip: Option<&str>, now: f32, source: &str) -> f32 {
        let Some(name) = clip else {
            return 0.0;
        };
        match self.play_clip(name, now, source) {
            Ok(length) => length,
            Err(e) => {
                debug!("[Tower audio] {source}: {e}");
                0.0
            }
        }
    }
}

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioManager>()
            .add_systems(PostUpdate, spawn_queued_playback);
    }
}

/// Overlapping playback is allowed: every request gets its own
/// self-despawning player.
fn spawn_queued_playback(
    mut commands: Commands,
    mut audio: ResMut<AudioManager>,
    asset_server: Option<Res<AssetServer>>,
) {
    if audio.queued.is_empty() {
        return;
    }
    let queued = std::mem::take(&mut audio.queued);
    let Some(asset_server) = asset_server else {
        return;
    };
    for playback in queued {
        commands.spawn((
            AudioPlayer::<AudioSource>(asset_server.load(playback.path)),
            PlaybackSettings::DESPAWN.with_volume(Volume::new(playback.volume)),
        ));
    }
}
