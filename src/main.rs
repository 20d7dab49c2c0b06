use std::env;
use std::time::Duration;

use accretion_arena::arena::spawn_arena;
use accretion_arena::config::load_sim_config;
use accretion_arena::particles::load_particle_templates;
use accretion_arena::services::load_image_catalog;
use accretion_arena::ship::load_ship_roster;
use accretion_arena::simulation::{cull_system, SimClock, SimulationPlugin, SimulationStats};
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

/// Ticks between periodic summaries, in seconds of simulated time.
const SUMMARY_SECONDS: f64 = 5.0;

/// Run limits read from the environment.
#[derive(Resource, Debug, Clone, Copy)]
struct RunLimits {
    /// `ARENA_MAX_TICKS`; `None` runs forever.
    max_ticks: Option<u64>,
    summary_every: u64,
}

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins(LogPlugin::default());

    let config = load_sim_config();
    let tick_rate = config.tick_rate_hz.max(1.0);
    let max_ticks = match env::var("ARENA_MAX_TICKS") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("ARENA_MAX_TICKS={raw:?} is not a tick count; running without a limit");
                None
            }
        },
        Err(_) => None,
    };
    let limits = RunLimits {
        max_ticks,
        summary_every: (tick_rate * SUMMARY_SECONDS).round().max(1.0) as u64,
    };
    info!("Starting arena at {tick_rate} Hz, tick limit {max_ticks:?}");

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / tick_rate))),
    )
    .insert_resource(config)
    .insert_resource(limits)
    .add_plugins(SimulationPlugin)
    .add_systems(
        Startup,
        (
            load_image_catalog,
            load_ship_roster,
            load_particle_templates,
            spawn_arena,
        )
            .chain(),
    )
    .add_systems(Update, (summary_system, run_limit_system).chain().after(cull_system));

    app.run()
}

fn summary_system(clock: Res<SimClock>, stats: Res<SimulationStats>, limits: Res<RunLimits>) {
    if clock.tick % limits.summary_every == 0 {
        info!(
            "tick {}: {} objects, {} particles, {} culled, {} spawns rejected",
            clock.tick,
            stats.active_objects,
            stats.live_particles,
            stats.culled_objects,
            stats.rejected_spawns
        );
    }
}

fn run_limit_system(clock: Res<SimClock>, limits: Res<RunLimits>, mut exit: MessageWriter<AppExit>) {
    if limits.max_ticks.is_some_and(|max| clock.tick >= max) {
        info!("Reached ARENA_MAX_TICKS at tick {}", clock.tick);
        exit.write(AppExit::Success);
    }
}
