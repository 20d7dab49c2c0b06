//! Data-driven particles: templates, live instances and the engine that owns
//! them, plus the systems that run the engine inside the tick.

pub mod engine;
pub mod particle;
pub mod template;

pub use engine::{Damage, ParticleEngine, ParticleHit, SoundCue, SpawnerView};
pub use particle::{Particle, ParticleSprite};
pub use template::{AngleSpec, ParticleTemplate};

use std::path::Path;

use bevy::prelude::*;

use crate::config::SimConfig;
use crate::contacts::ContactIndex;
use crate::object::GameObject;
use crate::physics::Physics;
use crate::services::{ImageCatalog, Services};
use crate::ship::Ship;

/// Directory scanned for `*.txt` particle descriptors.
pub const PARTICLE_DIR: &str = "assets/particles";

/// Startup system: register every descriptor under [`PARTICLE_DIR`].
///
/// Must run after the image catalog is loaded.
pub fn load_particle_templates(mut engine: ResMut<ParticleEngine>, images: Res<ImageCatalog>) {
    match engine.load_dir(Path::new(PARTICLE_DIR), &*images) {
        Ok(count) => info!("Registered {count} particle templates from {PARTICLE_DIR}"),
        Err(err) => warn!("{err}; no particle templates registered"),
    }
}

pub fn particle_update_system(mut engine: ResMut<ParticleEngine>, contacts: Res<ContactIndex>) {
    engine.update(&contacts);
}

/// Apply particle hits: shields soak first, then hull.  Destroyed objects
/// leave their death particle behind and stop drawing fire for the rest of
/// the sweep.
pub fn particle_collision_system(
    mut engine: ResMut<ParticleEngine>,
    contacts: Res<ContactIndex>,
    config: Res<SimConfig>,
    mut q: Query<(&mut GameObject, &mut Physics, Option<&mut Ship>)>,
) {
    let mut wrecks: Vec<(Entity, Option<String>, Vec2, f32)> = Vec::new();
    engine.collide(&contacts, config.contact_damage, config.knockback_gain, |hit| {
        let Ok((mut object, mut body, ship)) = q.get_mut(hit.entity) else {
            return false;
        };
        if !body.anchored && hit.knockback != Vec2::ZERO {
            body.velocity += hit.knockback;
        }
        let Some(amount) = hit.damage else {
            return false;
        };
        let hull_damage = match ship {
            Some(mut ship) => ship.absorb(amount),
            None => amount,
        };
        if !object.apply_damage(hull_damage) {
            return false;
        }
        info!("{} destroyed at {:?}", object.name, body.position);
        wrecks.push((hit.entity, object.death_particle.clone(), body.position, body.facing));
        true
    });

    for (entity, death_particle, position, facing) in wrecks {
        engine.expire_attached_to(entity);
        if let Some(name) = death_particle.as_deref() {
            engine.spawn(name, position, facing, None, None);
        }
    }
}

/// Forward queued sound cues to the sound service if the camera can see them.
pub fn sound_cue_system(mut engine: ResMut<ParticleEngine>, mut services: ResMut<Services>) {
    let services = &mut *services;
    for cue in engine.drain_sound_cues() {
        if services.camera.is_visible(cue.position) {
            services.sounds.play(&cue.sound);
        }
    }
}
