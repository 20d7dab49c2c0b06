//! Who a pilot may shoot at, and how it picks one.

use bevy::prelude::*;

use crate::contacts::{Contact, ContactIndex};
use crate::object::ObjectKind;

/// Ships of another team that are not disguised.  The index only holds
/// active objects, so destroyed ships never qualify.
pub fn is_valid_target(me: &Contact, candidate: &Contact) -> bool {
    candidate.entity != me.entity
        && candidate.kind == ObjectKind::Ship
        && candidate.team != me.team
        && !candidate.disguised
}

/// Nearest valid target strictly inside `radius`.
///
/// Stops early at the first candidate that is both inside `good_enough` and
/// within the forward cone (`cos(angle) >= cone_cos`).
pub fn find_target(
    me: &Contact,
    contacts: &ContactIndex,
    radius: f32,
    cone_cos: f32,
    good_enough: f32,
) -> Option<Entity> {
    let heading = me.body.forward();
    let mut best: Option<(Entity, f32)> = None;

    for candidate in contacts.iter().filter(|c| is_valid_target(me, c)) {
        let offset = candidate.body.position - me.body.position;
        let distance = offset.length();
        if distance >= radius {
            continue;
        }
        if distance < good_enough && distance > 0.0 && heading.dot(offset / distance) >= cone_cos {
            return Some(candidate.entity);
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate.entity, distance));
        }
    }
    best.map(|(entity, _)| entity)
}
