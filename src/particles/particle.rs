//! A single live particle and its per-tick update.

use std::collections::HashSet;
use std::sync::Arc;

use bevy::prelude::*;

use super::template::ParticleTemplate;
use super::Damage;
use crate::constants::{FADE_EPSILON, SUBATOMIC_RADIUS};
use crate::contacts::ContactIndex;
use crate::object::Team;
use crate::physics::{wrap_angle, Physics};

/// What a renderer needs to draw one particle.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSprite<'a> {
    pub image: &'a str,
    pub position: Vec2,
    pub angle: f32,
    pub alpha: f32,
    pub size: f32,
}

/// A live instance of a [`ParticleTemplate`].
#[derive(Debug, Clone)]
pub struct Particle {
    pub(crate) template: Arc<ParticleTemplate>,
    pub(crate) spawner: Option<Entity>,
    pub(crate) team: Team,
    pub(crate) damage: Option<Damage>,
    pub(crate) position: Vec2,
    /// Spawner velocity at spawn time, added every tick.
    pub(crate) drift: Vec2,
    pub(crate) speed: f32,
    pub(crate) alpha: f32,
    pub(crate) angle: f32,
    pub(crate) angle_delta: f32,
    pub(crate) facing: f32,
    pub(crate) facing_delta: f32,
    pub(crate) size: f32,
    pub(crate) timer: Option<u32>,
    pub(crate) age: u32,
    /// Objects this particle can no longer hit.  Seeded with the spawner.
    pub(crate) exclusions: HashSet<Entity>,
    pub(crate) homing_target: Option<Entity>,
    pub(crate) delete_requested: bool,
    pub(crate) end_fired: bool,
}

impl Particle {
    pub fn template(&self) -> &ParticleTemplate {
        &self.template
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn spawner(&self) -> Option<Entity> {
        self.spawner
    }

    pub fn damage(&self) -> Option<Damage> {
        self.damage
    }

    pub fn homing_target(&self) -> Option<Entity> {
        self.homing_target
    }

    pub fn is_delete_requested(&self) -> bool {
        self.delete_requested
    }

    pub fn excludes(&self, entity: Entity) -> bool {
        self.exclusions.contains(&entity)
    }

    /// Displacement per tick.
    pub fn velocity(&self) -> Vec2 {
        Vec2::from_angle(self.facing) * self.speed + self.drift
    }

    /// Flag for removal.  Returns `true` only on the first call.
    pub fn request_delete(&mut self) -> bool {
        !std::mem::replace(&mut self.delete_requested, true)
    }

    /// Advance one tick.  Returns `true` if the particle reached a terminal
    /// condition on this call.  Does nothing once deletion was requested.
    pub fn update(&mut self, contacts: &ContactIndex, homing_gain: f32) -> bool {
        if self.delete_requested {
            return false;
        }
        let template = Arc::clone(&self.template);
        self.age = self.age.saturating_add(1);

        self.alpha = (self.alpha + template.alpha_add).clamp(0.0, 1.0);
        if self.alpha <= FADE_EPSILON {
            self.alpha = 0.0;
        }
        self.size += template.size_add;
        if self.size <= FADE_EPSILON {
            self.size = 0.0;
        }
        self.angle += self.angle_delta;
        self.facing += self.facing_delta;

        if let Some(target) = self.homing_target {
            match contacts.get(target) {
                Some(contact) => self.steer_toward(contact.body.position, homing_gain),
                None => self.homing_target = None,
            }
        }

        let anchor = if template.attached {
            self.spawner
                .and_then(|spawner| contacts.get(spawner))
                .map(|contact| contact.body.position)
        } else {
            None
        };
        match anchor {
            Some(position) => self.position = position,
            None => self.position += self.velocity(),
        }

        if let Some(timer) = self.timer.as_mut() {
            *timer = timer.saturating_sub(1);
        }

        let expired = self.timer == Some(0) || self.alpha <= 0.0 || self.size <= 0.0;
        expired && self.request_delete()
    }

    fn steer_toward(&mut self, point: Vec2, gain: f32) {
        let to = point - self.position;
        if to.length_squared() == 0.0 {
            return;
        }
        let max_turn = gain * self.speed.abs();
        let turn = wrap_angle(to.to_angle() - self.facing).clamp(-max_turn, max_turn);
        self.facing += turn;
        self.angle += turn;
    }

    /// Collision footprint: a circle sized by image width and scale.
    pub fn collision_body(&self) -> Physics {
        let radius = if self.template.subatomic {
            SUBATOMIC_RADIUS
        } else {
            (self.template.native_width * self.size * 0.5).max(SUBATOMIC_RADIUS)
        };
        Physics::circle(self.position, radius)
    }

    pub fn render_state(&self) -> Option<ParticleSprite<'_>> {
        if self.delete_requested {
            return None;
        }
        Some(ParticleSprite {
            image: self.template.frame(self.age)?,
            position: self.position,
            angle: self.angle,
            alpha: self.alpha,
            size: self.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{GameObject, ObjectKind};
    use crate::contacts::Contact;

    fn particle(template: ParticleTemplate) -> Particle {
        Particle {
            timer: template.lifetime,
            alpha: template.alpha,
            size: template.size,
            speed: template.speed,
            template: Arc::new(template),
            spawner: None,
            team: Team::neutral(),
            damage: None,
            position: Vec2::ZERO,
            drift: Vec2::ZERO,
            angle: 0.0,
            angle_delta: 0.0,
            facing: 0.0,
            facing_delta: 0.0,
            age: 0,
            exclusions: HashSet::new(),
            homing_target: None,
            delete_requested: false,
            end_fired: false,
        }
    }

    fn template() -> ParticleTemplate {
        let mut t = ParticleTemplate::named("p");
        t.images.push("p.png".to_string());
        t
    }

    fn index_with(entity: Entity, position: Vec2) -> ContactIndex {
        let mut index = ContactIndex::default();
        let object = GameObject::new("s", ObjectKind::Ship, Team::new("red"));
        index.push(Contact::new(entity, &object, &Physics::circle(position, 10.0), None));
        index
    }

    #[test]
    fn fade_out_ends_before_timer() {
        let mut t = template();
        t.lifetime = Some(30);
        t.alpha = 1.0;
        t.alpha_add = -0.05;
        let mut p = particle(t);
        let contacts = ContactIndex::default();

        let mut ended_on = None;
        for tick in 1..=30 {
            if p.update(&contacts, 0.0) {
                ended_on = Some(tick);
                break;
            }
        }
        assert_eq!(ended_on, Some(20));
        assert_eq!(p.alpha(), 0.0);
    }

    #[test]
    fn timer_expires_exactly() {
        let mut t = template();
        t.lifetime = Some(3);
        let mut p = particle(t);
        let contacts = ContactIndex::default();
        assert!(!p.update(&contacts, 0.0));
        assert!(!p.update(&contacts, 0.0));
        assert!(p.update(&contacts, 0.0));
    }

    #[test]
    fn update_after_delete_is_a_no_op() {
        let mut t = template();
        t.speed = 2.0;
        let mut p = particle(t);
        assert!(p.request_delete());
        assert!(!p.request_delete());
        let before = p.position();
        assert!(!p.update(&ContactIndex::default(), 0.0));
        assert_eq!(p.position(), before);
    }

    #[test]
    fn moves_along_facing_plus_drift() {
        let mut t = template();
        t.speed = 3.0;
        let mut p = particle(t);
        p.drift = Vec2::new(0.0, 1.0);
        p.update(&ContactIndex::default(), 0.0);
        assert!((p.position() - Vec2::new(3.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn attached_particle_follows_spawner_until_it_vanishes() {
        let mut t = template();
        t.attached = true;
        t.speed = 1.0;
        let mut p = particle(t);
        let mut world = World::new();
        let ship = world.spawn_empty().id();
        p.spawner = Some(ship);

        p.update(&index_with(ship, Vec2::new(50.0, 50.0)), 0.0);
        assert_eq!(p.position(), Vec2::new(50.0, 50.0));

        p.update(&ContactIndex::default(), 0.0);
        assert!((p.position() - Vec2::new(51.0, 50.0)).length() < 1e-5);
    }

    #[test]
    fn homing_turn_is_bounded_and_stale_target_is_dropped() {
        let mut t = template();
        t.speed = 5.0;
        let mut p = particle(t);
        let mut world = World::new();
        let target = world.spawn_empty().id();
        p.homing_target = Some(target);

        p.update(&index_with(target, Vec2::new(0.0, 500.0)), 0.01);
        assert!((p.facing() - 0.05).abs() < 1e-6);

        p.update(&ContactIndex::default(), 0.01);
        assert_eq!(p.homing_target(), None);
    }

    #[test]
    fn subatomic_particles_are_point_sized() {
        let mut t = template();
        t.native_width = 64.0;
        t.subatomic = true;
        let p = particle(t);
        assert_eq!(p.collision_body().shape.diameter(), SUBATOMIC_RADIUS * 2.0);
    }

    #[test]
    fn render_state_hidden_after_delete() {
        let mut p = particle(template());
        assert_eq!(p.render_state().map(|s| s.image), Some("p.png"));
        p.request_delete();
        assert!(p.render_state().is_none());
    }
}
