//! Per-tick read-only snapshot of every active object.
//!
//! Particles and AI pilots hold plain [`Entity`] ids for spawners and targets.
//! Those ids are resolved here, never against the world directly, so an id
//! whose object was culled simply resolves to `None`.
//!
//! The index is rebuilt twice per tick: once before AI decisions and once
//! after weapon fire so particle collision sees post-integration positions.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::object::{GameObject, ObjectKind, Team};
use crate::physics::Physics;
use crate::ship::{Shield, Ship};

/// What an observer may know about a ship's internals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipStatus {
    pub energy: f32,
    pub max_energy: f32,
    pub shield: Option<Shield>,
    pub primary_ready: bool,
    pub secondary_ready: bool,
}

impl ShipStatus {
    pub fn energy_fraction(&self) -> f32 {
        if self.max_energy > 0.0 {
            (self.energy / self.max_energy).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One active object as seen at snapshot time.
#[derive(Debug, Clone)]
pub struct Contact {
    pub entity: Entity,
    pub kind: ObjectKind,
    pub team: Team,
    pub body: Physics,
    pub disguised: bool,
    pub damageable: bool,
    pub ship: Option<ShipStatus>,
}

impl Contact {
    pub fn new(entity: Entity, object: &GameObject, body: &Physics, ship: Option<&Ship>) -> Self {
        Self {
            entity,
            kind: object.kind,
            team: object.team.clone(),
            body: body.clone(),
            disguised: object.disguised,
            damageable: object.is_damageable(),
            ship: ship.map(Ship::status),
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct ContactIndex {
    contacts: Vec<Contact>,
    slots: HashMap<Entity, usize>,
}

impl ContactIndex {
    /// Replace the snapshot wholesale.
    pub fn rebuild(&mut self, contacts: impl IntoIterator<Item = Contact>) {
        self.contacts.clear();
        self.slots.clear();
        for contact in contacts {
            self.push(contact);
        }
    }

    pub fn push(&mut self, contact: Contact) {
        self.slots.insert(contact.entity, self.contacts.len());
        self.contacts.push(contact);
    }

    /// Resolve a weak reference.  `None` means the object is gone.
    pub fn get(&self, entity: Entity) -> Option<&Contact> {
        self.slots.get(&entity).and_then(|&i| self.contacts.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

type SnapshotQuery<'w, 's> = Query<'w, 's, (Entity, &'static GameObject, &'static Physics, Option<&'static Ship>)>;

fn snapshot(index: &mut ContactIndex, q: &SnapshotQuery) {
    index.rebuild(
        q.iter()
            .filter(|(_, object, _, _)| object.is_active())
            .map(|(entity, object, body, ship)| Contact::new(entity, object, body, ship)),
    );
}

/// Snapshot taken at the start of the tick, before AI decisions.
pub fn refresh_contacts_system(mut index: ResMut<ContactIndex>, q: SnapshotQuery) {
    snapshot(&mut index, &q);
}

/// Snapshot retaken after movement and weapon fire.
pub fn resync_contacts_system(mut index: ResMut<ContactIndex>, q: SnapshotQuery) {
    snapshot(&mut index, &q);
}
