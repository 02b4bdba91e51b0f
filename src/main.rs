mod animation;
mod audio;
mod combat;
mod components;
mod config;
mod door;
mod input;
mod locomotion;
mod physics;
mod raycast;
mod scene;
mod simulation;
mod timed_action;
mod tween;

use bevy::prelude::*;
use config::GameConfig;

#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
    background_color: Option<[f32; 3]>,
    assets_dir: Option<String>,
}

/// Window settings and gameplay tuning share one document.
fn load_startup_config() -> (StartupConfig, GameConfig) {
    let path = std::env::var("TOWER_GAME_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return (StartupConfig::default(), GameConfig::default());
    };
    let startup = serde_json::from_str::<StartupConfig>(&contents).unwrap_or_else(|e| {
        eprintln!("[Tower] Failed to parse {}: {}", path, e);
        StartupConfig::default()
    });
    let game = GameConfig::from_json(&contents).unwrap_or_else(|e| {
        eprintln!("[Tower] Invalid gameplay config in {}: {}", path, e);
        GameConfig::default()
    });
    println!("[Tower] Loaded startup config from {}", path);
    (startup, game)
}

fn run_simulation_file(path: &str) -> Result<String, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    let request: simulation::SimulationRequest =
        serde_json::from_str(&contents).map_err(|e| format!("invalid request {path}: {e}"))?;
    let result = simulation::run_simulation(&request);
    serde_json::to_string_pretty(&result).map_err(|e| e.to_string())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--simulate") {
        let Some(path) = args.get(pos + 1) else {
            eprintln!("[Tower] --simulate needs a request file");
            std::process::exit(2);
        };
        match run_simulation_file(path) {
            Ok(json) => {
                println!("{json}");
                return;
            }
            Err(e) => {
                eprintln!("[Tower] Simulation failed: {e}");
                std::process::exit(2);
            }
        }
    }

    let (startup_config, game) = load_startup_config();

    let assets_dir = std::env::var("TOWER_ASSETS_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .or(startup_config.assets_dir)
        .unwrap_or_else(|| "assets".to_string());
    let window_title = startup_config
        .window_title
        .unwrap_or_else(|| "Tower of Sin".to_string());
    let window_width = startup_config.window_width.unwrap_or(1280.0);
    let window_height = startup_config.window_height.unwrap_or(720.0);
    let bg = startup_config.background_color.unwrap_or([0.05, 0.05, 0.08]);

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: window_title,
                    resolution: (window_width, window_height).into(),
                    present_mode: bevy::window::PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(bevy::asset::AssetPlugin {
                file_path: assets_dir,
                ..default()
            }),
    );

    app.insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(audio::AudioManager::with_clips(game.clips.clone()))
        .add_plugins(combat::CombatPlugin {
            seed: game.rng_seed,
        })
        .insert_resource(game)
        .add_plugins(input::InputPlugin)
        .add_plugins(animation::AnimationPlugin)
        .add_plugins(audio::AudioPlugin)
        .add_plugins(locomotion::LocomotionPlugin)
        .add_plugins(physics::PhysicsPlugin)
        .add_plugins(door::DoorPlugin)
        .add_plugins(scene::ScenePlugin);

    app.run();
}
