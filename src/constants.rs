//! Centralised simulation and gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! [`crate::config::SimConfig`] mirrors the runtime-tunable subset and uses
//! these values as its defaults.
//!
//! Units: distances are world units, times are simulation ticks, angles are
//! radians measured counter-clockwise from +X.

// ── Tick loop ─────────────────────────────────────────────────────────────────

/// Target simulation cadence (steps per second).
pub const TICK_RATE_HZ: f64 = 60.0;

/// Seed for the shared simulation RNG (patrol waypoints, random particle angles).
pub const RNG_SEED: u64 = 0x5eed_a57e;

// ── Arena ─────────────────────────────────────────────────────────────────────

/// Width of the playable arena, centred on the origin.
pub const ARENA_WIDTH: f32 = 4000.0;

/// Height of the playable arena, centred on the origin.
pub const ARENA_HEIGHT: f32 = 4000.0;

// ── Collision ─────────────────────────────────────────────────────────────────

/// Velocity kept by a mobile circle after being pushed off an anchored one.
///
/// 0.8 means the body loses 20 % of its speed per resolved contact.
pub const RESTITUTION: f32 = 0.8;

/// Below this separation two circle centres are treated as coincident and the
/// mobile body is pushed out along +X.
pub const COINCIDENT_EPSILON: f32 = 1e-5;

// ── Particles ─────────────────────────────────────────────────────────────────

/// Hard cap on simultaneously live particles.  Spawns at or above the cap are
/// rejected (backpressure, not an error).
pub const PARTICLE_CAP: usize = 512;

/// Damage applied by a colliding particle that was spawned without its own
/// damage descriptor.
pub const CONTACT_DAMAGE: f32 = 10.0;

/// Homing turn per tick, per unit of particle speed (radians).
pub const HOMING_GAIN: f32 = 0.004;

/// Knockback impulse per unit of particle velocity for `PHYSICS` particles.
pub const KNOCKBACK_GAIN: f32 = 0.05;

/// Exclusive upper bound of the integer part of a `RANDOM` angle draw.
///
/// A random angle is `uniform[0,1) + uniform_int[0, RANDOM_ANGLE_SPAN)`.
pub const RANDOM_ANGLE_SPAN: u32 = 6;

/// Collision radius of a `SUBATOMIC` particle.
pub const SUBATOMIC_RADIUS: f32 = 0.5;

/// Alpha and size at or below this value count as fully faded / shrunk.
pub const FADE_EPSILON: f32 = 1e-4;

/// Native width assumed for an image that reports a zero width.
pub const FALLBACK_IMAGE_WIDTH: f32 = 16.0;

// ── AI cadence (ticks between decisions) ──────────────────────────────────────

pub const AI_COMBAT_INTERVAL: u64 = 6;
pub const AI_INTERCEPT_INTERVAL: u64 = 15;
pub const AI_RETREAT_INTERVAL: u64 = 30;
pub const AI_PATROL_INTERVAL: u64 = 45;

// ── AI thresholds ─────────────────────────────────────────────────────────────

/// Energy fraction a retreating pilot must exceed before re-engaging.
pub const RETREAT_ENERGY_RECOVERY: f32 = 1.0 / 3.0;

/// Shield fraction a retreating pilot must exceed before re-engaging.
pub const RETREAT_SHIELD_RECOVERY: f32 = 1.0 / 5.0;

/// A pilot only retreats from a target holding at least this energy fraction.
pub const RETREAT_TARGET_ENERGY: f32 = 0.25;

/// Cosine of the half-angle of the forward cone used by the early-exit target search.
pub const SEARCH_CONE_COS: f32 = 0.9;

/// Combat only pulls the trigger while facing within this many radians of the target.
pub const FIRE_ARC: f32 = 0.3;

/// Patrol waypoints closer than this are considered reached.
pub const PATROL_ARRIVE_DISTANCE: f32 = 100.0;

// ── Ship defaults ─────────────────────────────────────────────────────────────

pub const SHIP_RADIUS: f32 = 16.0;
pub const SHIP_THRUST: f32 = 0.15;
pub const SHIP_REVERSE_THRUST: f32 = 0.08;
pub const SHIP_TURN_RATE: f32 = 0.08;
pub const SHIP_MAX_SPEED: f32 = 6.0;
pub const SHIP_HULL: f32 = 100.0;
pub const SHIP_ENERGY: f32 = 100.0;
pub const SHIP_ENERGY_REGEN: f32 = 0.2;
pub const SHIP_SHIELD: f32 = 50.0;
pub const SHIP_SHIELD_REGEN: f32 = 0.1;

/// Gap between a ship's hull and the muzzle point where shots appear.
pub const MUZZLE_GAP: f32 = 4.0;

// ── Asteroids ─────────────────────────────────────────────────────────────────

pub const ASTEROID_HULL_PER_RADIUS: f32 = 2.0;
