//! The demo encounter spawned by the binary: a planet, a station, an asteroid
//! ring, the player and one AI ship per profile.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use crate::ai::Profile;
use crate::object::{spawn_asteroid, spawn_planet, spawn_station, Team};
use crate::particles::{ParticleEngine, SpawnerView};
use crate::ship::{spawn_ship, ShipRoster};
use crate::simulation::SimRng;

const PLANET_RADIUS: f32 = 220.0;
const STATION_POSITION: Vec2 = Vec2::new(-900.0, 700.0);
const STATION_SIZE: Vec2 = Vec2::new(240.0, 120.0);
const RING_RADIUS: f32 = 650.0;
const RING_COUNT: usize = 24;
const PLAYER_START: Vec2 = Vec2::new(0.0, -1100.0);

/// Who flies what, and where.
struct Berth {
    class: &'static str,
    team: &'static str,
    profile: Profile,
    position: Vec2,
}

const BERTHS: [Berth; 5] = [
    Berth { class: "fighter", team: "blue", profile: Profile::Brute, position: Vec2::new(-300.0, -1150.0) },
    Berth { class: "fighter", team: "red", profile: Profile::Brute, position: Vec2::new(1300.0, 900.0) },
    Berth { class: "skiff", team: "red", profile: Profile::Ambusher, position: Vec2::new(-1400.0, 200.0) },
    Berth { class: "fighter", team: "red", profile: Profile::Controller, position: Vec2::new(0.0, 1500.0) },
    Berth { class: "skiff", team: "red", profile: Profile::Fool, position: Vec2::new(1500.0, -600.0) },
];

/// Startup system: populate the arena.  Runs after particle templates load so
/// the player's engine glow can attach.
pub fn spawn_arena(
    mut commands: Commands,
    roster: Res<ShipRoster>,
    mut engine: ResMut<ParticleEngine>,
    mut rng: ResMut<SimRng>,
) {
    spawn_planet(&mut commands, Vec2::ZERO, PLANET_RADIUS);
    spawn_station(&mut commands, STATION_POSITION, STATION_SIZE, Team::new("blue"));

    for i in 0..RING_COUNT {
        let angle = i as f32 / RING_COUNT as f32 * TAU;
        let radius = RING_RADIUS + rng.0.gen_range(-60.0..60.0);
        let position = Vec2::from_angle(angle) * radius;
        // Slow orbit-ish drift, tangent to the ring.
        let velocity = Vec2::from_angle(angle).perp() * rng.0.gen_range(0.2..0.6);
        spawn_asteroid(&mut commands, position, velocity, rng.0.gen_range(10.0..28.0));
    }

    let player_class = roster.get_or_default("fighter");
    let player = spawn_ship(
        &mut commands,
        &player_class,
        Team::new("blue"),
        PLAYER_START,
        std::f32::consts::FRAC_PI_2,
        Profile::Player,
    );
    let glow_anchor = SpawnerView {
        entity: player,
        position: PLAYER_START,
        velocity: Vec2::ZERO,
        team: Team::new("blue"),
        diameter: player_class.radius * 2.0,
        homing_target: None,
    };
    engine.spawn("engine_glow", PLAYER_START, 0.0, Some(&glow_anchor), None);

    for berth in &BERTHS {
        let class = roster.get_or_default(berth.class);
        let facing = (-berth.position).to_angle();
        spawn_ship(
            &mut commands,
            &class,
            Team::new(berth.team),
            berth.position,
            facing,
            berth.profile,
        );
    }

    info!(
        "Arena ready: 1 planet, 1 station, {RING_COUNT} asteroids, {} ships",
        BERTHS.len() + 1
    );
}
