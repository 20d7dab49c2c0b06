//! The control surface shared by human and AI pilots.
//!
//! ## Pipeline (runs in order every tick)
//!
//! 1. [`player_intent_system`]: copies the [`PlayerIntent`] resource into the
//!    [`ControlInput`] of the `PlayerControlled` ship.
//! 2. `ai::ai_decision_system`: writes the [`ControlInput`] of AI-piloted ships.
//! 3. `ship::ship_control_system` and `ship::weapon_fire_system`: the only
//!    readers; turn input into steering, thrust and particle spawns.
//!
//! Neither writer knows about the other; both fill the same plain record.

use bevy::prelude::*;

/// Actuation intents for one ship for the current tick.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlInput {
    pub forward: bool,
    pub back: bool,
    /// World point the ship should turn toward; `None` holds the heading.
    pub look_at: Option<Vec2>,
    pub fire_primary: bool,
    pub fire_secondary: bool,
}

impl ControlInput {
    /// Reset every intent to neutral.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Marker for the ship driven by the human player.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlayerControlled;

/// Latest human intent, written by the (external) input-device layer.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerIntent(pub ControlInput);

/// Copy the human intent verbatim onto the player ship's control surface.
pub fn player_intent_system(
    intent: Res<PlayerIntent>,
    mut q: Query<&mut ControlInput, With<PlayerControlled>>,
) {
    for mut input in q.iter_mut() {
        *input = intent.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(PlayerIntent::default());
        app.add_systems(Update, player_intent_system);
        app
    }

    #[test]
    fn intent_is_copied_to_player_ship_only() {
        let mut app = build_test_app();
        let player = app
            .world_mut()
            .spawn((PlayerControlled, ControlInput::default()))
            .id();
        let other = app.world_mut().spawn(ControlInput::default()).id();

        let intent = ControlInput {
            forward: true,
            look_at: Some(Vec2::new(10.0, -4.0)),
            fire_primary: true,
            ..Default::default()
        };
        app.insert_resource(PlayerIntent(intent));
        app.update();

        assert_eq!(*app.world().get::<ControlInput>(player).unwrap(), intent);
        assert_eq!(
            *app.world().get::<ControlInput>(other).unwrap(),
            ControlInput::default()
        );
    }

    #[test]
    fn clear_resets_every_flag() {
        let mut input = ControlInput {
            forward: true,
            back: true,
            look_at: Some(Vec2::ONE),
            fire_primary: true,
            fire_secondary: true,
        };
        input.clear();
        assert_eq!(input, ControlInput::default());
    }
}
