//! Simulation plugin: resources and the strictly ordered tick.
//!
//! Every stage below runs once per `Update`, in this order, on one thread:
//!
//! | # | System                        | Reads / writes                               |
//! |---|-------------------------------|----------------------------------------------|
//! | 1 | `advance_clock_system`        | `SimClock`                                   |
//! | 2 | `refresh_contacts_system`     | snapshot for AI and particle lookups         |
//! | 3 | `player_intent_system`        | `PlayerIntent` → player `ControlInput`       |
//! | 4 | `ai_decision_system`          | due pilots → `ControlInput`                  |
//! | 5 | `ship_control_system`         | steering, thrust, regen, cooldowns           |
//! | 6 | `integrate_system`            | position += velocity                         |
//! | 7 | `body_collision_system`       | anchored-vs-mobile push-out                  |
//! | 8 | `weapon_fire_system`          | muzzle spawns                                |
//! | 9 | `resync_contacts_system`      | post-integration snapshot                    |
//! | 10| `particle_update_system`      | fade, shrink, home, move, expire             |
//! | 11| `particle_collision_system`   | hits, shields, hull, death particles         |
//! | 12| `sound_cue_system`            | visible cues → sound service                 |
//! | 13| `cull_system`                 | despawn destroyed objects, sweep particles   |

use bevy::ecs::schedule::ExecutorKind;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::ai_decision_system;
use crate::config::SimConfig;
use crate::contacts::{refresh_contacts_system, resync_contacts_system, ContactIndex};
use crate::input::{player_intent_system, PlayerIntent};
use crate::object::{cull_objects, GameObject};
use crate::particles::{
    particle_collision_system, particle_update_system, sound_cue_system, ParticleEngine,
};
use crate::physics::{body_collision_system, integrate_system};
use crate::services::{ImageCatalog, Services};
use crate::ship::{ship_control_system, weapon_fire_system, ShipRoster};

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimConfig>()
            .init_resource::<SimClock>()
            .init_resource::<SimulationStats>()
            .init_resource::<ContactIndex>()
            .init_resource::<PlayerIntent>()
            .init_resource::<Services>()
            .init_resource::<ImageCatalog>()
            .init_resource::<ShipRoster>();

        let config = app.world().resource::<SimConfig>().clone();
        if !app.world().contains_resource::<ParticleEngine>() {
            app.insert_resource(ParticleEngine::from_config(&config));
        }
        if !app.world().contains_resource::<SimRng>() {
            app.insert_resource(SimRng::seeded(config.rng_seed));
        }

        app.edit_schedule(Update, |schedule| {
            schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        });

        app.add_systems(PostStartup, apply_sim_config).add_systems(
            Update,
            (
                advance_clock_system,
                refresh_contacts_system,
                player_intent_system,
                ai_decision_system,
                ship_control_system,
                integrate_system,
                body_collision_system,
                weapon_fire_system,
                resync_contacts_system,
                particle_update_system,
                particle_collision_system,
                sound_cue_system,
                cull_system,
            )
                .chain(),
        );
    }
}

/// Monotonic tick counter; the AI cadence is measured against it.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub tick: u64,
}

/// Shared pseudo-random source for AI waypoints.
#[derive(Resource, Debug)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Running counters, refreshed by `cull_system` each tick.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SimulationStats {
    pub live_particles: usize,
    pub active_objects: usize,
    pub culled_objects: u64,
    pub rejected_spawns: u64,
}

/// Push a config loaded during startup into the engine.
fn apply_sim_config(config: Res<SimConfig>, mut engine: ResMut<ParticleEngine>) {
    engine.apply_config(&config);
}

pub fn advance_clock_system(mut clock: ResMut<SimClock>) {
    clock.tick += 1;
}

/// Last stage: despawn destroyed objects and sweep deleted particles.
pub fn cull_system(
    mut commands: Commands,
    mut engine: ResMut<ParticleEngine>,
    mut stats: ResMut<SimulationStats>,
    q: Query<(Entity, &GameObject)>,
) {
    let culled = cull_objects(&mut commands, &q);
    engine.sweep();

    stats.culled_objects += culled as u64;
    stats.active_objects = q.iter().filter(|(_, o)| o.is_active()).count();
    stats.live_particles = engine.live_count();
    stats.rejected_spawns = engine.rejected_spawns();
}
