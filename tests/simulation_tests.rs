//! Headless integration tests for the full tick.
//!
//! Each test builds an app from [`MinimalPlugins`] plus [`SimulationPlugin`],
//! spawns a handful of objects directly into the world and steps it with
//! `app.update()`.  No window, no assets on disk: particle templates are
//! registered against an in-memory image catalog.
//!
//! Covered scenarios:
//! 1. Particle collisions see this tick's post-integration positions.
//! 2. Destroyed objects are culled at the end of the tick and leave a death particle.
//! 3. An AI with nobody to fight patrols after its first decision.
//! 4. An AI brute engages and damages an enemy; shields soak first.
//! 5. A weapon never fires twice within its cooldown.
//! 6. Player intent drives the player ship and the AI leaves it alone.
//! 7. The particle pool rejects spawns past capacity.
//! 8. Sound cues reach the sound service only when the camera sees them.
//! 9. Anchored bodies push mobile bodies out.
//! 10. A wreck stops absorbing hits in the same sweep that destroyed it.

use std::sync::{Arc, Mutex};

use accretion_arena::ai::{AiPilot, AiState, Profile};
use accretion_arena::config::SimConfig;
use accretion_arena::input::{ControlInput, PlayerControlled, PlayerIntent};
use accretion_arena::object::{GameObject, ObjectKind, Team};
use accretion_arena::particles::ParticleEngine;
use accretion_arena::physics::Physics;
use accretion_arena::services::{ArenaCamera, ImageCatalog, Services, SoundService};
use accretion_arena::ship::{Ship, ShipClass};
use accretion_arena::simulation::{SimClock, SimulationPlugin, SimulationStats};
use bevy::prelude::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn arena_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(SimulationPlugin);
    app
}

fn register(app: &mut App, name: &str, text: &str) {
    let images = ImageCatalog::default().with("p.png", 10, 10);
    app.world_mut()
        .resource_mut::<ParticleEngine>()
        .load_descriptor(name, text, &images)
        .expect("test descriptor should load");
}

fn ship_bundle(team: &str, position: Vec2, facing: f32, profile: Profile) -> impl Bundle {
    let class = ShipClass {
        death_particle: None,
        ..ShipClass::default()
    };
    (
        GameObject::new(class.name.clone(), ObjectKind::Ship, Team::new(team)).with_health(class.hull),
        Physics::circle(position, class.radius).with_facing(facing),
        Ship::from_class(&class),
        ControlInput::default(),
        AiPilot::new(profile),
    )
}

fn rock(team: &str, health: f32, body: Physics) -> (GameObject, Physics) {
    (
        GameObject::new("rock", ObjectKind::Asteroid, Team::new(team)).with_health(health),
        body,
    )
}

const LASER: &str = "IMAGE p.png\nTIME 45\nSPEED 12\nCAN_COLLIDE true\n";

#[derive(Clone, Default)]
struct SharedSounds(Arc<Mutex<Vec<String>>>);

impl SoundService for SharedSounds {
    fn play(&mut self, reference: &str) {
        self.0.lock().unwrap().push(reference.to_string());
    }

    fn stop(&mut self, _reference: &str) {}

    fn set_volume(&mut self, _volume: f32) {}
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// A rock moving into a stationary mine is hit on the same tick it arrives.
#[test]
fn particle_collision_sees_post_integration_positions() {
    let mut app = arena_app();
    register(&mut app, "mine", "IMAGE p.png\nTIME 100\nCAN_COLLIDE true\n");
    let target = app
        .world_mut()
        .spawn(rock("red", 100.0, Physics::circle(Vec2::new(35.0, 0.0), 5.0).with_velocity(Vec2::new(10.0, 0.0))))
        .id();
    app.world_mut()
        .resource_mut::<ParticleEngine>()
        .spawn("mine", Vec2::new(50.0, 0.0), 0.0, None, None);

    app.update();

    let object = app.world().get::<GameObject>(target).unwrap();
    let health = object.health.unwrap();
    assert!(
        (health.current - 90.0).abs() < 1e-4,
        "contact damage applied on arrival tick, got {}",
        health.current
    );
    assert_eq!(app.world().resource::<ParticleEngine>().live_count(), 0, "mine swept");
}

#[test]
fn destroyed_object_is_culled_and_leaves_death_particle() {
    let mut app = arena_app();
    register(&mut app, "mine", "IMAGE p.png\nCAN_COLLIDE true\n");
    register(&mut app, "boom", "IMAGE p.png\nTIME 10\n");
    let mut object = GameObject::new("rock", ObjectKind::Asteroid, Team::new("red")).with_health(5.0);
    object.death_particle = Some("boom".to_string());
    let target = app
        .world_mut()
        .spawn((object, Physics::circle(Vec2::ZERO, 5.0)))
        .id();
    app.world_mut()
        .resource_mut::<ParticleEngine>()
        .spawn("mine", Vec2::ZERO, 0.0, None, None);

    app.update();

    assert!(app.world().get::<GameObject>(target).is_none(), "culled at end of tick");
    let engine = app.world().resource::<ParticleEngine>();
    assert_eq!(engine.live_count(), 1);
    assert_eq!(engine.particles()[0].template().name, "boom");
    let stats = app.world().resource::<SimulationStats>();
    assert_eq!(stats.culled_objects, 1);
}

#[test]
fn lone_ai_patrols_after_first_decision() {
    let mut app = arena_app();
    let ai = app
        .world_mut()
        .spawn(ship_bundle("red", Vec2::ZERO, 0.0, Profile::Fool))
        .id();
    // Scenery is never a target.
    app.world_mut()
        .spawn(rock("blue", 10.0, Physics::circle(Vec2::new(100.0, 0.0), 5.0)));

    app.update();

    let pilot = app.world().get::<AiPilot>(ai).unwrap();
    assert_eq!(pilot.state(), AiState::Patrol);
    let input = app.world().get::<ControlInput>(ai).unwrap();
    assert!(input.forward && input.look_at.is_some());
}

#[test]
fn brute_engages_and_shields_soak_first() {
    let mut app = arena_app();
    register(&mut app, "laser", LASER);
    register(&mut app, "missile", LASER);
    let brute = app
        .world_mut()
        .spawn(ship_bundle("red", Vec2::ZERO, 0.0, Profile::Brute))
        .id();
    let target = app
        .world_mut()
        .spawn(ship_bundle("blue", Vec2::new(200.0, 0.0), 0.0, Profile::Player))
        .id();

    app.update();
    assert_eq!(app.world().get::<AiPilot>(brute).unwrap().state(), AiState::Combat);
    assert_eq!(app.world().get::<AiPilot>(brute).unwrap().target(), Some(target));

    for _ in 0..30 {
        app.update();
    }

    let ship = app.world().get::<Ship>(target).unwrap();
    let shield = ship.shield.unwrap();
    assert!(shield.current < shield.max, "target shield took hits");
    let hull = app.world().get::<GameObject>(target).unwrap().health.unwrap();
    if shield.current > 0.0 {
        assert_eq!(hull.current, hull.max, "hull untouched while shield holds");
    }
}

#[test]
fn weapon_never_fires_within_cooldown() {
    let mut app = arena_app();
    register(&mut app, "laser", LASER);
    register(&mut app, "missile", LASER);
    let brute = app
        .world_mut()
        .spawn(ship_bundle("red", Vec2::ZERO, 0.0, Profile::Brute))
        .id();
    app.world_mut()
        .spawn(ship_bundle("blue", Vec2::new(200.0, 0.0), 0.0, Profile::Player));

    let cooldown = app.world().get::<Ship>(brute).unwrap().primary.as_ref().unwrap().cooldown_ticks;
    let mut shots = Vec::new();
    for _ in 0..120 {
        app.update();
        let tick = app.world().resource::<SimClock>().tick;
        let Some(ship) = app.world().get::<Ship>(brute) else {
            break;
        };
        if ship.primary.as_ref().unwrap().remaining == cooldown {
            shots.push(tick);
        }
    }

    assert!(shots.len() >= 2, "expected repeated fire, got {shots:?}");
    for pair in shots.windows(2) {
        assert!(pair[1] - pair[0] >= cooldown as u64, "fired inside cooldown: {shots:?}");
    }
}

#[test]
fn player_intent_drives_player_ship() {
    let mut app = arena_app();
    let player = app
        .world_mut()
        .spawn((ship_bundle("blue", Vec2::ZERO, 0.0, Profile::Player), PlayerControlled))
        .id();
    app.world_mut()
        .spawn(ship_bundle("red", Vec2::new(600.0, 0.0), 0.0, Profile::Fool));
    app.insert_resource(PlayerIntent(ControlInput {
        forward: true,
        ..Default::default()
    }));

    app.update();

    let body = app.world().get::<Physics>(player).unwrap();
    assert!(body.velocity.x > 0.0);
    assert!(body.position.x > 0.0);
    let input = app.world().get::<ControlInput>(player).unwrap();
    assert!(input.forward, "AI must not overwrite human input");
}

#[test]
fn pool_rejects_spawns_past_capacity() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).insert_resource(SimConfig {
        particle_cap: 2,
        ..SimConfig::default()
    });
    app.add_plugins(SimulationPlugin);
    register(&mut app, "dust", "IMAGE p.png\nTIME 100\n");

    {
        let mut engine = app.world_mut().resource_mut::<ParticleEngine>();
        assert!(engine.spawn("dust", Vec2::ZERO, 0.0, None, None));
        assert!(engine.spawn("dust", Vec2::ZERO, 0.0, None, None));
        assert!(!engine.spawn("dust", Vec2::ZERO, 0.0, None, None));
    }
    app.update();

    let stats = app.world().resource::<SimulationStats>();
    assert_eq!(stats.live_particles, 2);
    assert_eq!(stats.rejected_spawns, 1);
}

#[test]
fn sound_cues_respect_camera_visibility() {
    let mut app = arena_app();
    let sounds = SharedSounds::default();
    app.insert_resource(Services {
        sounds: Box::new(sounds.clone()),
        camera: Box::new(ArenaCamera {
            center: Vec2::ZERO,
            half_extents: Vec2::splat(100.0),
        }),
    });
    register(&mut app, "zap", "IMAGE p.png\nTIME 5\nSOUND_SPAWN zap.ogg\n");
    {
        let mut engine = app.world_mut().resource_mut::<ParticleEngine>();
        engine.spawn("zap", Vec2::new(10.0, 10.0), 0.0, None, None);
        engine.spawn("zap", Vec2::new(500.0, 0.0), 0.0, None, None);
    }

    app.update();

    assert_eq!(*sounds.0.lock().unwrap(), vec!["zap.ogg".to_string()]);
}

#[test]
fn anchored_planet_pushes_rock_out() {
    let mut app = arena_app();
    app.world_mut().spawn((
        GameObject::new("planet", ObjectKind::Planet, Team::neutral()),
        Physics::circle(Vec2::ZERO, 10.0).anchored(),
    ));
    let rock_id = app
        .world_mut()
        .spawn(rock("neutral", 10.0, Physics::circle(Vec2::new(15.0, 0.0), 10.0).with_velocity(Vec2::new(-1.0, 0.0))))
        .id();

    app.update();

    let body = app.world().get::<Physics>(rock_id).unwrap();
    assert!((body.position - Vec2::new(20.0, 0.0)).length() < 1e-4, "{:?}", body.position);
    assert!((body.velocity.length() - 0.8).abs() < 1e-5);
}

#[test]
fn wreck_does_not_absorb_later_hits_in_same_sweep() {
    let mut app = arena_app();
    register(&mut app, "mine", "IMAGE p.png\nCAN_COLLIDE true\n");
    let weak = app
        .world_mut()
        .spawn(rock("red", 5.0, Physics::circle(Vec2::ZERO, 5.0)))
        .id();
    let strong = app
        .world_mut()
        .spawn(rock("red", 100.0, Physics::circle(Vec2::new(3.0, 0.0), 5.0)))
        .id();
    {
        let mut engine = app.world_mut().resource_mut::<ParticleEngine>();
        engine.spawn("mine", Vec2::ZERO, 0.0, None, None);
        engine.spawn("mine", Vec2::ZERO, 0.0, None, None);
    }

    app.update();

    assert!(app.world().get::<GameObject>(weak).is_none(), "weak rock culled");
    let health = app.world().get::<GameObject>(strong).unwrap().health.unwrap();
    assert!(
        (health.current - 90.0).abs() < 1e-4,
        "second mine passes the wreck and strikes the live rock, got {}",
        health.current
    );
}
