//! Ships: hull classes, energy, shields, weapons and the control systems that
//! turn a [`ControlInput`] into motion and particle spawns.
//!
//! ## Per-tick flow
//!
//! 1. [`ship_control_system`]: steer toward `look_at`, thrust, clamp speed,
//!    regenerate energy / shield and count weapon cooldowns down.
//! 2. integration and body collision (see `physics`).
//! 3. [`weapon_fire_system`]: spawn weapon templates at the muzzle.
//!
//! Ship classes come from `assets/ships.toml`; a built-in roster is used when
//! the file is missing or malformed.

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::ai::{AiPilot, Profile};
use crate::constants::*;
use crate::contacts::{ContactIndex, ShipStatus};
use crate::error::{read_data_file, SimError, SimResult};
use crate::input::{ControlInput, PlayerControlled};
use crate::object::{GameObject, ObjectKind, Team};
use crate::particles::{Damage, ParticleEngine, SpawnerView};
use crate::physics::{wrap_angle, Physics};

/// Default location of the ship class roster.
pub const SHIP_ROSTER_PATH: &str = "assets/ships.toml";

// ── Classes (data) ────────────────────────────────────────────────────────────

/// One weapon mount as declared in the roster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeaponSpec {
    pub template: String,
    pub cooldown_ticks: u32,
    pub energy_cost: f32,
    pub damage: f32,
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self {
            template: "laser".to_string(),
            cooldown_ticks: 12,
            energy_cost: 5.0,
            damage: 10.0,
        }
    }
}

/// Static description of a ship hull.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShipClass {
    pub name: String,
    pub radius: f32,
    pub thrust: f32,
    pub reverse_thrust: f32,
    pub turn_rate: f32,
    pub max_speed: f32,
    pub hull: f32,
    pub energy: f32,
    pub energy_regen: f32,
    /// `0` means the hull carries no shield.
    pub shield: f32,
    pub shield_regen: f32,
    pub primary: Option<WeaponSpec>,
    pub secondary: Option<WeaponSpec>,
    pub death_particle: Option<String>,
}

impl Default for ShipClass {
    fn default() -> Self {
        Self {
            name: "fighter".to_string(),
            radius: SHIP_RADIUS,
            thrust: SHIP_THRUST,
            reverse_thrust: SHIP_REVERSE_THRUST,
            turn_rate: SHIP_TURN_RATE,
            max_speed: SHIP_MAX_SPEED,
            hull: SHIP_HULL,
            energy: SHIP_ENERGY,
            energy_regen: SHIP_ENERGY_REGEN,
            shield: SHIP_SHIELD,
            shield_regen: SHIP_SHIELD_REGEN,
            primary: Some(WeaponSpec::default()),
            secondary: Some(WeaponSpec {
                template: "missile".to_string(),
                cooldown_ticks: 90,
                energy_cost: 25.0,
                damage: 35.0,
            }),
            death_particle: Some("explosion".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RosterFile {
    #[serde(default)]
    ship: Vec<ShipClass>,
}

/// Every known ship class, by name.
#[derive(Resource, Debug, Clone)]
pub struct ShipRoster {
    classes: HashMap<String, ShipClass>,
}

impl Default for ShipRoster {
    fn default() -> Self {
        let mut roster = Self {
            classes: HashMap::new(),
        };
        roster.insert(ShipClass::default());
        roster.insert(ShipClass {
            name: "skiff".to_string(),
            radius: 12.0,
            thrust: 0.2,
            max_speed: 7.5,
            hull: 60.0,
            shield: 0.0,
            shield_regen: 0.0,
            secondary: None,
            ..ShipClass::default()
        });
        roster
    }
}

impl ShipRoster {
    pub fn insert(&mut self, class: ShipClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&ShipClass> {
        self.classes.get(name)
    }

    /// Look up `name`, falling back to the default class with a warning.
    pub fn get_or_default(&self, name: &str) -> ShipClass {
        self.get(name).cloned().unwrap_or_else(|| {
            warn!("Unknown ship class '{name}', using default hull");
            ShipClass::default()
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn from_toml_str(path: &Path, text: &str) -> SimResult<Self> {
        let file: RosterFile = toml::from_str(text).map_err(|e| SimError::toml(path, e))?;
        let mut roster = Self {
            classes: HashMap::new(),
        };
        for mut class in file.ship {
            if !class.radius.is_finite() || class.radius <= 0.0 {
                warn!(
                    "Ship class '{}' in {} has radius {}; using {SHIP_RADIUS}",
                    class.name,
                    path.display(),
                    class.radius
                );
                class.radius = SHIP_RADIUS;
            }
            roster.insert(class);
        }
        Ok(roster)
    }

    pub fn from_file(path: &Path) -> SimResult<Self> {
        let text = read_data_file(path)?;
        Self::from_toml_str(path, &text)
    }
}

/// Startup system: replace the built-in roster with `assets/ships.toml`.
pub fn load_ship_roster(mut roster: ResMut<ShipRoster>) {
    match ShipRoster::from_file(Path::new(SHIP_ROSTER_PATH)) {
        Ok(loaded) if !loaded.is_empty() => {
            info!("Loaded {} ship classes from {SHIP_ROSTER_PATH}", loaded.len());
            *roster = loaded;
        }
        Ok(_) => warn!("{SHIP_ROSTER_PATH} declares no ships; keeping built-in roster"),
        Err(err) => warn!("{err}; keeping built-in roster"),
    }
}

// ── Runtime state ─────────────────────────────────────────────────────────────

/// Regenerating damage buffer in front of the hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shield {
    pub current: f32,
    pub max: f32,
    pub regen: f32,
}

impl Shield {
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

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub template: String,
    pub cooldown_ticks: u32,
    /// Ticks until the weapon may fire again.
    pub remaining: u32,
    pub energy_cost: f32,
    pub damage: f32,
}

impl Weapon {
    pub fn from_spec(spec: &WeaponSpec) -> Self {
        Self {
            template: spec.template.clone(),
            cooldown_ticks: spec.cooldown_ticks,
            remaining: 0,
            energy_cost: spec.energy_cost,
            damage: spec.damage,
        }
    }

    pub fn is_cooling(&self) -> bool {
        self.remaining > 0
    }

    fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponSlot {
    Primary,
    Secondary,
}

#[derive(Component, Debug, Clone)]
pub struct Ship {
    pub class: String,
    pub thrust: f32,
    pub reverse_thrust: f32,
    pub turn_rate: f32,
    pub max_speed: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub energy_regen: f32,
    pub shield: Option<Shield>,
    pub primary: Option<Weapon>,
    pub secondary: Option<Weapon>,
}

impl Ship {
    pub fn from_class(class: &ShipClass) -> Self {
        let shield = (class.shield > 0.0).then_some(Shield {
            current: class.shield,
            max: class.shield,
            regen: class.shield_regen,
        });
        Self {
            class: class.name.clone(),
            thrust: class.thrust,
            reverse_thrust: class.reverse_thrust,
            turn_rate: class.turn_rate,
            max_speed: class.max_speed,
            energy: class.energy,
            max_energy: class.energy,
            energy_regen: class.energy_regen,
            shield,
            primary: class.primary.as_ref().map(Weapon::from_spec),
            secondary: class.secondary.as_ref().map(Weapon::from_spec),
        }
    }

    pub fn weapon(&self, slot: WeaponSlot) -> Option<&Weapon> {
        match slot {
            WeaponSlot::Primary => self.primary.as_ref(),
            WeaponSlot::Secondary => self.secondary.as_ref(),
        }
    }

    fn weapon_mut(&mut self, slot: WeaponSlot) -> Option<&mut Weapon> {
        match slot {
            WeaponSlot::Primary => self.primary.as_mut(),
            WeaponSlot::Secondary => self.secondary.as_mut(),
        }
    }

    /// Off cooldown and affordable.
    pub fn can_fire(&self, slot: WeaponSlot) -> bool {
        self.weapon(slot)
            .is_some_and(|w| !w.is_cooling() && self.energy >= w.energy_cost)
    }

    pub fn status(&self) -> ShipStatus {
        ShipStatus {
            energy: self.energy,
            max_energy: self.max_energy,
            shield: self.shield,
            primary_ready: self.can_fire(WeaponSlot::Primary),
            secondary_ready: self.can_fire(WeaponSlot::Secondary),
        }
    }

    /// Turn toward `look_at` (rate-limited), thrust and clamp speed.
    pub fn steer(&self, body: &mut Physics, input: &ControlInput) {
        if let Some(point) = input.look_at {
            let to = point - body.position;
            if to.length_squared() > 0.0 {
                let delta = wrap_angle(to.to_angle() - body.facing);
                body.facing = wrap_angle(body.facing + delta.clamp(-self.turn_rate, self.turn_rate));
            }
        }
        if input.forward {
            body.velocity += body.forward() * self.thrust;
        }
        if input.back {
            body.velocity -= body.forward() * self.reverse_thrust;
        }
        body.velocity = body.velocity.clamp_length_max(self.max_speed);
    }

    /// Regenerate energy and shield, count cooldowns down.
    pub fn regenerate(&mut self) {
        self.energy = (self.energy + self.energy_regen).min(self.max_energy);
        if let Some(shield) = self.shield.as_mut() {
            shield.current = (shield.current + shield.regen).min(shield.max);
        }
        for weapon in [self.primary.as_mut(), self.secondary.as_mut()].into_iter().flatten() {
            weapon.tick();
        }
    }

    /// Soak `amount` with the shield; return what is left for the hull.
    pub fn absorb(&mut self, amount: f32) -> f32 {
        let Some(shield) = self.shield.as_mut() else {
            return amount;
        };
        let soaked = amount.min(shield.current.max(0.0));
        shield.current -= soaked;
        amount - soaked
    }

    /// Fire `slot` if ready.  Cooldown and energy are spent only when the
    /// engine accepted the spawn.
    pub fn fire(
        &mut self,
        slot: WeaponSlot,
        engine: &mut ParticleEngine,
        muzzle: Vec2,
        facing: f32,
        spawner: &SpawnerView,
    ) -> bool {
        if !self.can_fire(slot) {
            return false;
        }
        let Some(weapon) = self.weapon_mut(slot) else {
            return false;
        };
        let damage = Damage {
            amount: weapon.damage,
        };
        if !engine.spawn(&weapon.template, muzzle, facing, Some(spawner), Some(damage)) {
            return false;
        }
        weapon.remaining = weapon.cooldown_ticks;
        let cost = weapon.energy_cost;
        self.energy -= cost;
        true
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Spawn a ship of `class` flown by `profile`.  `Profile::Player` ships also get
/// the [`PlayerControlled`] marker.
pub fn spawn_ship(
    commands: &mut Commands,
    class: &ShipClass,
    team: Team,
    position: Vec2,
    facing: f32,
    profile: Profile,
) -> Entity {
    let object = GameObject::new(class.name.clone(), ObjectKind::Ship, team)
        .with_health(class.hull)
        .with_death_particle(class.death_particle.clone());
    let mut entity = commands.spawn((
        object,
        Physics::circle(position, class.radius).with_facing(facing),
        Ship::from_class(class),
        ControlInput::default(),
        AiPilot::new(profile),
    ));
    if profile == Profile::Player {
        entity.insert(PlayerControlled);
    }
    entity.id()
}

// ── Systems ───────────────────────────────────────────────────────────────────

pub fn ship_control_system(mut q: Query<(&GameObject, &ControlInput, &mut Ship, &mut Physics)>) {
    for (object, input, mut ship, mut body) in q.iter_mut() {
        if !object.is_active() {
            continue;
        }
        ship.steer(&mut body, input);
        ship.regenerate();
    }
}

/// Turn fire intents into particle spawns at the muzzle.
pub fn weapon_fire_system(
    mut engine: ResMut<ParticleEngine>,
    contacts: Res<ContactIndex>,
    mut q: Query<(
        Entity,
        &GameObject,
        &ControlInput,
        &mut Ship,
        &Physics,
        Option<&AiPilot>,
    )>,
) {
    for (entity, object, input, mut ship, body, pilot) in q.iter_mut() {
        if !object.is_active() || !(input.fire_primary || input.fire_secondary) {
            continue;
        }
        let homing_target = pilot
            .and_then(AiPilot::target)
            .and_then(|target| contacts.get(target))
            .map(|c| (c.entity, c.body.position));
        let view = SpawnerView {
            entity,
            position: body.position,
            velocity: body.velocity,
            team: object.team.clone(),
            diameter: body.shape.diameter(),
            homing_target,
        };
        let muzzle = body.position + body.forward() * (body.shape.diameter() * 0.5 + MUZZLE_GAP);

        if input.fire_primary && ship.fire(WeaponSlot::Primary, &mut engine, muzzle, body.facing, &view) {
            debug!("{} fired primary", object.name);
        }
        if input.fire_secondary && ship.fire(WeaponSlot::Secondary, &mut engine, muzzle, body.facing, &view) {
            debug!("{} fired secondary", object.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::ParticleTemplate;
    use std::f32::consts::FRAC_PI_2;

    fn test_ship() -> Ship {
        Ship::from_class(&ShipClass::default())
    }

    fn view() -> SpawnerView {
        SpawnerView {
            entity: Entity::PLACEHOLDER,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            team: Team::new("blue"),
            diameter: 32.0,
            homing_target: None,
        }
    }

    fn engine_with_laser(capacity: usize) -> ParticleEngine {
        let mut engine = ParticleEngine::new(capacity, 7);
        let mut laser = ParticleTemplate::named("laser");
        laser.images.push("laser.png".to_string());
        laser.lifetime = Some(30);
        engine.register(laser);
        engine
    }

    #[test]
    fn steering_turns_at_most_turn_rate() {
        let ship = test_ship();
        let mut body = Physics::circle(Vec2::ZERO, 16.0);
        let input = ControlInput {
            look_at: Some(Vec2::new(0.0, 100.0)),
            ..Default::default()
        };
        ship.steer(&mut body, &input);
        assert!((body.facing - ship.turn_rate).abs() < 1e-6);

        for _ in 0..100 {
            ship.steer(&mut body, &input);
        }
        assert!((body.facing - FRAC_PI_2).abs() < 1e-5, "settles on target bearing");
    }

    #[test]
    fn thrust_is_clamped_to_max_speed() {
        let ship = test_ship();
        let mut body = Physics::circle(Vec2::ZERO, 16.0);
        let input = ControlInput {
            forward: true,
            ..Default::default()
        };
        for _ in 0..1_000 {
            ship.steer(&mut body, &input);
        }
        assert!((body.velocity.length() - ship.max_speed).abs() < 1e-4);
        assert!(body.velocity.x > 0.0);
    }

    #[test]
    fn shield_absorbs_before_hull() {
        let mut ship = test_ship();
        ship.shield = Some(Shield {
            current: 10.0,
            max: 50.0,
            regen: 0.0,
        });
        assert_eq!(ship.absorb(4.0), 0.0);
        assert_eq!(ship.absorb(10.0), 4.0);
        assert_eq!(ship.absorb(3.0), 3.0, "empty shield passes everything");
    }

    #[test]
    fn firing_starts_cooldown_and_spends_energy() {
        let mut ship = test_ship();
        let mut engine = engine_with_laser(8);
        let before = ship.energy;

        assert!(ship.fire(WeaponSlot::Primary, &mut engine, Vec2::X, 0.0, &view()));
        assert_eq!(engine.live_count(), 1);
        assert!(ship.energy < before);
        assert!(!ship.can_fire(WeaponSlot::Primary));
        assert!(!ship.fire(WeaponSlot::Primary, &mut engine, Vec2::X, 0.0, &view()));
        assert_eq!(engine.live_count(), 1);

        for _ in 0..ship.primary.as_ref().unwrap().cooldown_ticks {
            ship.regenerate();
        }
        assert!(ship.can_fire(WeaponSlot::Primary));
    }

    #[test]
    fn rejected_spawn_costs_nothing() {
        let mut ship = test_ship();
        let mut engine = engine_with_laser(0);
        let before = ship.energy;
        assert!(!ship.fire(WeaponSlot::Primary, &mut engine, Vec2::X, 0.0, &view()));
        assert_eq!(ship.energy, before);
        assert!(ship.can_fire(WeaponSlot::Primary));
    }

    #[test]
    fn missing_weapon_never_fires() {
        let mut ship = test_ship();
        ship.secondary = None;
        let mut engine = engine_with_laser(8);
        assert!(!ship.fire(WeaponSlot::Secondary, &mut engine, Vec2::X, 0.0, &view()));
    }

    #[test]
    fn zero_shield_class_has_no_shield() {
        let roster = ShipRoster::default();
        let skiff = Ship::from_class(roster.get("skiff").unwrap());
        assert!(skiff.shield.is_none());
        assert!(skiff.secondary.is_none());
    }

    #[test]
    fn roster_parses_ship_tables() {
        let roster = ShipRoster::from_toml_str(
            Path::new("ships.toml"),
            r#"
            [[ship]]
            name = "brick"
            hull = 400.0
            shield = 0.0

            [ship.primary]
            template = "flak"
            cooldown_ticks = 4
            "#,
        )
        .unwrap();
        let brick = roster.get("brick").unwrap();
        assert_eq!(brick.hull, 400.0);
        assert_eq!(brick.radius, SHIP_RADIUS);
        let primary = brick.primary.as_ref().unwrap();
        assert_eq!(primary.template, "flak");
        assert_eq!(primary.cooldown_ticks, 4);
        assert_eq!(primary.energy_cost, WeaponSpec::default().energy_cost);
    }

    #[test]
    fn non_positive_radius_falls_back_to_default() {
        let roster = ShipRoster::from_toml_str(
            Path::new("ships.toml"),
            r#"
            [[ship]]
            name = "ghost"
            radius = 0.0

            [[ship]]
            name = "inverted"
            radius = -4.0
            "#,
        )
        .unwrap();
        assert_eq!(roster.get("ghost").unwrap().radius, SHIP_RADIUS);
        assert_eq!(roster.get("inverted").unwrap().radius, SHIP_RADIUS);
    }

    #[test]
    fn unknown_class_falls_back_to_default() {
        let roster = ShipRoster::default();
        assert_eq!(roster.get_or_default("dreadnought").name, "fighter");
    }

    #[test]
    fn shipped_roster_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(SHIP_ROSTER_PATH);
        let roster = ShipRoster::from_file(&path).expect("assets/ships.toml should parse");
        assert!(!roster.is_empty());
    }
}
