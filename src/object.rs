//! Game objects: identity, team, health and lifecycle on top of [`Physics`].
//!
//! Objects are never removed synchronously.  [`GameObject::destroy`] only
//! clears the active flag; `cull_system` despawns inactive objects at the end
//! of the tick, after every other stage has had a chance to observe them.

use bevy::prelude::*;

use crate::constants::ASTEROID_HULL_PER_RADIUS;
use crate::physics::Physics;

/// Broad category of a simulated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Ship,
    Asteroid,
    Planet,
    Station,
}

/// Case-normalised team tag.  Normalised once here so comparisons stay cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Team(String);

impl Team {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Team shared by asteroids, planets and other scenery.
    pub fn neutral() -> Self {
        Self::new("neutral")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Team {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Current / maximum hit points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            (self.current / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Identity and lifecycle state shared by ships, asteroids, planets and stations.
#[derive(Component, Debug, Clone)]
pub struct GameObject {
    pub name: String,
    pub kind: ObjectKind,
    pub team: Team,
    /// `None` means the object cannot be damaged.
    pub health: Option<Health>,
    /// Appears as inert debris; excluded from AI targeting.
    pub disguised: bool,
    /// Particle template spawned where the object is destroyed.
    pub death_particle: Option<String>,
    active: bool,
}

impl GameObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind, team: Team) -> Self {
        Self {
            name: name.into(),
            kind,
            team,
            health: None,
            disguised: false,
            death_particle: None,
            active: true,
        }
    }

    pub fn with_health(mut self, max: f32) -> Self {
        self.health = Some(Health::new(max));
        self
    }

    pub fn with_death_particle(mut self, template: Option<String>) -> Self {
        self.death_particle = template;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mark for removal on the next cull pass.
    pub fn destroy(&mut self) {
        self.active = false;
    }

    pub fn is_damageable(&self) -> bool {
        self.health.is_some()
    }

    pub fn is_hostile_to(&self, other: &Team) -> bool {
        &self.team != other
    }

    /// Subtract `amount` from hull.  Returns `true` only on the call that
    /// destroys the object.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.active {
            return false;
        }
        let Some(health) = self.health.as_mut() else {
            return false;
        };
        health.current -= amount;
        if health.is_depleted() {
            self.destroy();
            return true;
        }
        false
    }
}

// ── Spawn helpers ─────────────────────────────────────────────────────────────

/// Spawn a drifting, damageable asteroid.
pub fn spawn_asteroid(commands: &mut Commands, position: Vec2, velocity: Vec2, radius: f32) -> Entity {
    commands
        .spawn((
            GameObject::new("asteroid", ObjectKind::Asteroid, Team::neutral())
                .with_health(radius * ASTEROID_HULL_PER_RADIUS)
                .with_death_particle(Some("debris".to_string())),
            Physics::circle(position, radius).with_velocity(velocity),
        ))
        .id()
}

/// Spawn an anchored, indestructible planet.
pub fn spawn_planet(commands: &mut Commands, position: Vec2, radius: f32) -> Entity {
    commands
        .spawn((
            GameObject::new("planet", ObjectKind::Planet, Team::neutral()),
            Physics::circle(position, radius).anchored(),
        ))
        .id()
}

/// Spawn an anchored rectangular station.
pub fn spawn_station(commands: &mut Commands, position: Vec2, size: Vec2, team: Team) -> Entity {
    commands
        .spawn((
            GameObject::new("station", ObjectKind::Station, team),
            Physics::rect(position, size.x, size.y).anchored(),
        ))
        .id()
}

// ── Cull ──────────────────────────────────────────────────────────────────────

/// Despawn every object whose active flag was cleared this tick or earlier.
pub fn cull_objects(commands: &mut Commands, q: &Query<(Entity, &GameObject)>) -> usize {
    let mut culled = 0;
    for (entity, object) in q.iter() {
        if !object.is_active() {
            commands.entity(entity).despawn();
            culled += 1;
        }
    }
    culled
}
