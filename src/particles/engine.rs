//! The particle engine: template registry plus a bounded pool of live
//! particles.
//!
//! Spawning past capacity is rejected outright, never evicting older
//! particles.  Deleted particles stay in the pool until [`ParticleEngine::sweep`]
//! runs at the end of the tick.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::particle::Particle;
use super::template::{AngleSpec, ParticleTemplate};
use crate::config::SimConfig;
use crate::contacts::ContactIndex;
use crate::error::{read_data_file, SimError, SimResult};
use crate::object::Team;
use crate::services::ImageService;

/// Damage carried by a weapon particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damage {
    pub amount: f32,
}

/// The spawning object as the engine needs to see it.
#[derive(Debug, Clone)]
pub struct SpawnerView {
    pub entity: Entity,
    pub position: Vec2,
    pub velocity: Vec2,
    pub team: Team,
    pub diameter: f32,
    /// The spawner's current target, for homing templates.
    pub homing_target: Option<(Entity, Vec2)>,
}

/// A sound the engine wants played at a world position.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundCue {
    pub sound: String,
    pub position: Vec2,
}

/// An object struck by a particle this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleHit {
    pub entity: Entity,
    /// `None` when the struck object cannot take damage.
    pub damage: Option<f32>,
    /// Velocity impulse for non-anchored bodies; zero unless the template has PHYSICS.
    pub knockback: Vec2,
}

/// Inherited context for a new particle.
#[derive(Debug, Clone, Default)]
struct Origin {
    spawner: Option<Entity>,
    team: Team,
    velocity: Vec2,
    diameter: Option<f32>,
    homing_target: Option<(Entity, Vec2)>,
    exclusions: HashSet<Entity>,
}

impl Origin {
    fn from_view(view: &SpawnerView) -> Self {
        Self {
            spawner: Some(view.entity),
            team: view.team.clone(),
            velocity: view.velocity,
            diameter: Some(view.diameter),
            homing_target: view.homing_target,
            exclusions: HashSet::from([view.entity]),
        }
    }
}

#[derive(Resource, Debug)]
pub struct ParticleEngine {
    templates: HashMap<String, Arc<ParticleTemplate>>,
    particles: Vec<Particle>,
    capacity: usize,
    random_angle_span: u32,
    homing_gain: f32,
    rng: StdRng,
    cues: Vec<SoundCue>,
    rejected: u64,
    /// Particles flagged for deletion but still in the pool.
    doomed: usize,
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

impl ParticleEngine {
    pub fn new(capacity: usize, seed: u64) -> Self {
        let defaults = SimConfig::default();
        Self {
            templates: HashMap::new(),
            particles: Vec::with_capacity(capacity.min(4096)),
            capacity,
            random_angle_span: defaults.random_angle_span,
            homing_gain: defaults.homing_gain,
            rng: StdRng::seed_from_u64(seed),
            cues: Vec::new(),
            rejected: 0,
            doomed: 0,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        let mut engine = Self::new(config.particle_cap, config.rng_seed);
        engine.apply_config(config);
        engine
    }

    /// Pick up tunables from a (re)loaded config.  Live particles are kept.
    pub fn apply_config(&mut self, config: &SimConfig) {
        self.capacity = config.particle_cap;
        self.random_angle_span = config.random_angle_span.max(1);
        self.homing_gain = config.homing_gain;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Particles in the pool, including ones awaiting the sweep.
    pub fn live_count(&self) -> usize {
        self.particles.len()
    }

    /// Particles not yet flagged for deletion.  This is what the capacity
    /// bounds, so a dying particle never blocks its own end chain.
    pub fn active_count(&self) -> usize {
        self.particles.len().saturating_sub(self.doomed)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn rejected_spawns(&self) -> u64 {
        self.rejected
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    /// Register an already-resolved template, replacing any of the same name.
    pub fn register(&mut self, template: ParticleTemplate) {
        self.templates
            .insert(template.name.clone(), Arc::new(template));
    }

    pub fn template(&self, name: &str) -> Option<&ParticleTemplate> {
        self.templates.get(name).map(Arc::as_ref)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Parse a descriptor, resolve its first image and register it.
    pub fn load_descriptor(
        &mut self,
        name: &str,
        text: &str,
        images: &dyn ImageService,
    ) -> SimResult<()> {
        let mut template = ParticleTemplate::parse(name, text)?;
        let first = template.images.first().cloned().unwrap_or_default();
        let size = images.dimensions(&first).ok_or_else(|| SimError::ImageNotFound {
            template: name.to_string(),
            image: first.clone(),
        })?;
        if size.x > 0 {
            template.native_width = size.x as f32;
        }
        self.register(template);
        Ok(())
    }

    /// Load every `*.txt` descriptor in `dir`, named by file stem.  A bad
    /// descriptor is logged and skipped; only an unreadable directory fails.
    pub fn load_dir(&mut self, dir: &Path, images: &dyn ImageService) -> SimResult<usize> {
        let entries = fs::read_dir(dir).map_err(|e| SimError::io(dir, e))?;
        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let result = read_data_file(&path).and_then(|text| self.load_descriptor(name, &text, images));
            match result {
                Ok(()) => loaded += 1,
                Err(err) => warn!("Skipping particle template: {err}"),
            }
        }
        Ok(loaded)
    }

    // ── Spawning ──────────────────────────────────────────────────────────────

    /// Spawn one particle of template `name`.  Returns `false` if the name is
    /// unknown or the pool is full.
    pub fn spawn(
        &mut self,
        name: &str,
        position: Vec2,
        facing_offset: f32,
        spawner: Option<&SpawnerView>,
        damage: Option<Damage>,
    ) -> bool {
        let Some(template) = self.templates.get(name).cloned() else {
            warn!("{}; spawn ignored", SimError::UnknownTemplate(name.to_string()));
            return false;
        };
        let origin = spawner.map(Origin::from_view).unwrap_or_default();
        self.spawn_from(template, position, facing_offset, origin, damage)
    }

    fn spawn_from(
        &mut self,
        template: Arc<ParticleTemplate>,
        position: Vec2,
        facing_offset: f32,
        origin: Origin,
        damage: Option<Damage>,
    ) -> bool {
        if self.active_count() >= self.capacity {
            self.rejected += 1;
            debug!(
                "Particle pool full ({}), rejected '{}'",
                self.capacity, template.name
            );
            return false;
        }

        let angle = self.initial_angle(template.rotate, facing_offset);
        let facing = self.initial_angle(template.facing, facing_offset);
        let angle_delta = self.angle_delta(template.rotate_add);
        let facing_delta = self.angle_delta(template.facing_add);

        let size = match origin.diameter {
            Some(diameter) if template.scale_to_spawner && diameter > 0.0 => {
                template.size * diameter / template.native_width
            }
            _ => template.size,
        };

        let homing_target = if template.homing > 0.0 {
            origin
                .homing_target
                .filter(|(_, at)| at.distance(position) <= template.homing)
                .map(|(entity, _)| entity)
        } else {
            None
        };

        if let Some(sound) = &template.sound_spawn {
            self.cues.push(SoundCue {
                sound: sound.clone(),
                position,
            });
        }

        self.particles.push(Particle {
            spawner: origin.spawner,
            team: origin.team,
            damage,
            position,
            drift: origin.velocity,
            speed: template.speed,
            alpha: template.alpha,
            angle,
            angle_delta,
            facing,
            facing_delta,
            size,
            timer: template.lifetime,
            age: 0,
            exclusions: origin.exclusions,
            homing_target,
            delete_requested: false,
            end_fired: false,
            template,
        });
        true
    }

    /// Random angles are a fractional draw plus a whole draw in `0..span`.
    fn random_angle(&mut self) -> f32 {
        self.rng.gen::<f32>() + self.rng.gen_range(0..self.random_angle_span) as f32
    }

    fn initial_angle(&mut self, spec: AngleSpec, offset: f32) -> f32 {
        match spec {
            AngleSpec::Fixed(value) => value + offset,
            AngleSpec::Random => self.random_angle(),
        }
    }

    fn angle_delta(&mut self, spec: AngleSpec) -> f32 {
        match spec {
            AngleSpec::Fixed(value) => value,
            AngleSpec::Random => self.random_angle(),
        }
    }

    // ── Tick stages ───────────────────────────────────────────────────────────

    /// Advance every particle, then run end sequences for those that expired.
    pub fn update(&mut self, contacts: &ContactIndex) {
        let gain = self.homing_gain;
        let ended: Vec<usize> = self
            .particles
            .iter_mut()
            .enumerate()
            .filter_map(|(i, p)| p.update(contacts, gain).then_some(i))
            .collect();
        self.doomed += ended.len();
        for i in ended {
            self.finish(i);
        }
    }

    /// Test colliding particles against the snapshot; first hit wins.
    ///
    /// Each hit is handed to `apply` as soon as it is found.  `apply` returns
    /// `true` when the hit destroyed the struck object, which removes that
    /// object from consideration for the rest of the sweep.
    pub fn collide(
        &mut self,
        contacts: &ContactIndex,
        contact_damage: f32,
        knockback_gain: f32,
        mut apply: impl FnMut(&ParticleHit) -> bool,
    ) -> Vec<ParticleHit> {
        let mut hits = Vec::new();
        let mut ended = Vec::new();
        let mut destroyed = HashSet::new();

        for (i, particle) in self.particles.iter_mut().enumerate() {
            if particle.delete_requested || !particle.template.can_collide {
                continue;
            }
            let footprint = particle.collision_body();
            let struck = contacts.iter().find(|contact| {
                !destroyed.contains(&contact.entity)
                    && !particle.excludes(contact.entity)
                    && (particle.template.friendly_fire || contact.team != particle.team)
                    && footprint.collides_with(&contact.body)
            });
            let Some(contact) = struck else {
                continue;
            };

            let knockback = if particle.template.physics && !contact.body.anchored {
                particle.velocity() * knockback_gain
            } else {
                Vec2::ZERO
            };
            let hit = ParticleHit {
                entity: contact.entity,
                damage: contact
                    .damageable
                    .then(|| particle.damage.map_or(contact_damage, |d| d.amount)),
                knockback,
            };
            if apply(&hit) {
                destroyed.insert(hit.entity);
            }
            hits.push(hit);

            if particle.template.collision_end {
                if particle.request_delete() {
                    ended.push(i);
                }
            } else {
                particle.exclusions.insert(contact.entity);
            }
        }

        self.doomed += ended.len();
        for i in ended {
            self.finish(i);
        }
        hits
    }

    /// End sequence: end sound, then the chained end particles.  Runs at most
    /// once per particle.
    ///
    /// Chained particles fan out around the parent's final heading
    /// (`facing`), which is also the direction they travel.  `angle` is
    /// sprite rotation only.
    fn finish(&mut self, index: usize) {
        let Some(particle) = self.particles.get_mut(index) else {
            return;
        };
        if particle.end_fired {
            return;
        }
        particle.end_fired = true;

        let template = Arc::clone(&particle.template);
        let position = particle.position;
        let facing = particle.facing;
        let damage = particle.damage;
        let origin = Origin {
            spawner: particle.spawner,
            team: particle.team.clone(),
            velocity: Vec2::ZERO,
            diameter: None,
            homing_target: None,
            exclusions: particle.exclusions.clone(),
        };

        if let Some(sound) = &template.sound_end {
            self.cues.push(SoundCue {
                sound: sound.clone(),
                position,
            });
        }

        let Some(end_name) = template.end_particle.as_deref() else {
            return;
        };
        let Some(end_template) = self.templates.get(end_name).cloned() else {
            warn!(
                "{}; end chain of '{}' dropped",
                SimError::UnknownTemplate(end_name.to_string()),
                template.name
            );
            return;
        };
        let count = template.multispawn_end;
        let spread = template.end_facing_add;
        for k in 0..count {
            let fan = (k as f32 - (count as f32 - 1.0) * 0.5) * spread;
            self.spawn_from(
                Arc::clone(&end_template),
                position,
                facing + fan,
                origin.clone(),
                damage,
            );
        }
    }

    /// Drop deleted particles.  Any that were flagged without an end sequence
    /// get it first.  Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let pending: Vec<usize> = self
            .particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.delete_requested && !p.end_fired)
            .map(|(i, _)| i)
            .collect();
        for i in pending {
            self.finish(i);
        }
        let before = self.particles.len();
        self.particles.retain(|p| !p.delete_requested);
        self.doomed = 0;
        before - self.particles.len()
    }

    /// Flag every particle attached to `spawner` for deletion.
    pub fn expire_attached_to(&mut self, spawner: Entity) {
        for particle in &mut self.particles {
            if particle.template.attached
                && particle.spawner == Some(spawner)
                && particle.request_delete()
            {
                self.doomed += 1;
            }
        }
    }

    pub fn drain_sound_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }
}
