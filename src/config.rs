//! Runtime simulation configuration loaded from `assets/sim.toml`.
//!
//! [`SimConfig`] is a Bevy [`Resource`] that mirrors the tunable constants in
//! [`crate::constants`].  At startup, [`load_sim_config`] reads
//! `assets/sim.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the constants you care about.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `SimConfig::default()`.

use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::constants::*;
use crate::error::{read_data_file, SimError, SimResult};

/// Default location of the simulation config, relative to the working directory.
pub const SIM_CONFIG_PATH: &str = "assets/sim.toml";

/// Runtime-tunable simulation configuration.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // ── Tick loop ────────────────────────────────────────────────────────────
    pub tick_rate_hz: f64,
    pub rng_seed: u64,

    // ── Arena ────────────────────────────────────────────────────────────────
    pub arena_width: f32,
    pub arena_height: f32,

    // ── Collision ────────────────────────────────────────────────────────────
    pub restitution: f32,

    // ── Particles ────────────────────────────────────────────────────────────
    pub particle_cap: usize,
    pub contact_damage: f32,
    pub homing_gain: f32,
    pub knockback_gain: f32,
    pub random_angle_span: u32,

    // ── AI cadence ───────────────────────────────────────────────────────────
    pub ai_combat_interval: u64,
    pub ai_intercept_interval: u64,
    pub ai_retreat_interval: u64,
    pub ai_patrol_interval: u64,

    // ── AI thresholds ────────────────────────────────────────────────────────
    pub retreat_energy_recovery: f32,
    pub retreat_shield_recovery: f32,
    pub retreat_target_energy: f32,
    pub search_cone_cos: f32,
    pub fire_arc: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ,
            rng_seed: RNG_SEED,
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            restitution: RESTITUTION,
            particle_cap: PARTICLE_CAP,
            contact_damage: CONTACT_DAMAGE,
            homing_gain: HOMING_GAIN,
            knockback_gain: KNOCKBACK_GAIN,
            random_angle_span: RANDOM_ANGLE_SPAN,
            ai_combat_interval: AI_COMBAT_INTERVAL,
            ai_intercept_interval: AI_INTERCEPT_INTERVAL,
            ai_retreat_interval: AI_RETREAT_INTERVAL,
            ai_patrol_interval: AI_PATROL_INTERVAL,
            retreat_energy_recovery: RETREAT_ENERGY_RECOVERY,
            retreat_shield_recovery: RETREAT_SHIELD_RECOVERY,
            retreat_target_energy: RETREAT_TARGET_ENERGY,
            search_cone_cos: SEARCH_CONE_COS,
            fire_arc: FIRE_ARC,
        }
    }
}

impl SimConfig {
    /// Parse a config from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(path: &Path, text: &str) -> SimResult<Self> {
        toml::from_str(text).map_err(|e| SimError::toml(path, e))
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> SimResult<Self> {
        let text = read_data_file(path)?;
        Self::from_toml_str(path, &text)
    }

    /// Half extents of the arena rectangle.
    pub fn arena_half_extents(&self) -> Vec2 {
        Vec2::new(self.arena_width, self.arena_height) * 0.5
    }
}

/// Load `assets/sim.toml`, falling back to compiled defaults.
///
/// Missing keys retain their compiled defaults.  Parse errors are logged but
/// do not abort the simulation.  A missing file is not an error.  Called
/// before the app is built because the tick rate drives the runner.
pub fn load_sim_config() -> SimConfig {
    let path = Path::new(SIM_CONFIG_PATH);
    if !path.exists() {
        info!("No {SIM_CONFIG_PATH} found; using compiled defaults");
        return SimConfig::default();
    }
    match SimConfig::from_file(path) {
        Ok(loaded) => {
            info!("Loaded simulation config from {SIM_CONFIG_PATH}");
            loaded
        }
        Err(err) => {
            warn!("{err}; using defaults");
            SimConfig::default()
        }
    }
}
