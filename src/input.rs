use bevy::prelude::*;
use std::collections::HashSet;

pub mod actions {
    pub const FORWARD: &str = "forward";
    pub const BACK: &str = "back";
    pub const LEFT: &str = "left";
    pub const RIGHT: &str = "right";
    pub const RUN: &str = "run";
    pub const CROUCH: &str = "crouch";
    pub const JUMP: &str = "jump";
    pub const ATTACK: &str = "attack";
    pub const INTERACT: &str = "interact";
}

const KEY_BINDINGS: &[(KeyCode, &str)] = &[
    (KeyCode::KeyW, actions::FORWARD),
    (KeyCode::ArrowUp, actions::FORWARD),
    (KeyCode::KeyS, actions::BACK),
    (KeyCode::ArrowDown, actions::BACK),
    (KeyCode::KeyA, actions::LEFT),
    (KeyCode::ArrowLeft, actions::LEFT),
    (KeyCode::KeyD, actions::RIGHT),
    (KeyCode::ArrowRight, actions::RIGHT),
    (KeyCode::ShiftLeft, actions::RUN),
    (KeyCode::ControlLeft, actions::CROUCH),
    (KeyCode::Space, actions::JUMP),
    (KeyCode::KeyE, actions::INTERACT),
];

const MOUSE_BINDINGS: &[(MouseButton, &str)] = &[(MouseButton::Left, actions::ATTACK)];

/// Abstraction layer between raw input and game systems.
/// Both keyboard/mouse (windowed) and the scripted simulation write to this.
#[derive(Resource, Default, Clone, Debug)]
pub struct VirtualInput {
    pub active: HashSet<String>,
    pub just_pressed: HashSet<String>,
    pub just_released: HashSet<String>,
}

impl VirtualInput {
    pub fn pressed(&self, action: &str) -> bool {
        self.active.contains(action)
    }

    pub fn just_pressed(&self, action: &str) -> bool {
        self.just_pressed.contains(action)
    }

    /// -1, 0 or 1 from a pair of opposing actions.
    pub fn axis(&self, negative: &str, positive: &str) -> f32 {
        let mut value = 0.0;
        if self.pressed(negative) {
            value -= 1.0;
        }
        if self.pressed(positive) {
            value += 1.0;
        }
        value
    }

    pub fn horizontal(&self) -> f32 {
        self.axis(actions::LEFT, actions::RIGHT)
    }

    pub fn vertical(&self) -> f32 {
        self.axis(actions::BACK, actions::FORWARD)
    }

    /// Replace the held set and derive the edges against the previous one.
    pub fn set_held<'a>(&mut self, held: impl IntoIterator<Item = &'a str>) {
        let held: HashSet<String> = held.into_iter().map(str::to_string).collect();
        self.just_pressed = held.difference(&self.active).cloned().collect();
        self.just_released = self.active.difference(&held).cloned().collect();
        self.active = held;
    }

    pub fn clear_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VirtualInput::default())
            .add_systems(
                PreUpdate,
                keyboard_to_virtual.run_if(resource_exists::<ButtonInput<KeyCode>>),
            )
            .add_systems(Last, clear_virtual_input);
    }
}

fn keyboard_to_virtual(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    mut vinput: ResMut<VirtualInput>,
) {
    vinput.active.clear();
    vinput.just_pressed.clear();
    vinput.just_released.clear();

    for &(key, action) in KEY_BINDINGS {
        if keyboard.pressed(key) {
            vinput.active.insert(action.into());
        }
        if keyboard.just_pressed(key) {
            vinput.just_pressed.insert(action.into());
        }
        if keyboard.just_released(key) {
            vinput.just_released.insert(action.into());
        }
    }

    let Some(mouse) = mouse else { return };
    for &(button, action) in MOUSE_BINDINGS {
        if mouse.pressed(button) {
            vinput.active.insert(action.into());
        }
        if mouse.just_pressed(button) {
            vinput.just_pressed.insert(action.into());
        }
        if mouse.just_released(button) {
            vinput.just_released.insert(action.into());
        }
    }
}

fn clear_virtual_input(mut vinput: ResMut<VirtualInput>) {
    vinput.clear_frame();
}
