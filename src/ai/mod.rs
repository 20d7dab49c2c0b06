//! AI pilots: profiles, target search and the decision state machine.
//!
//! Pilots write the same [`ControlInput`](crate::input::ControlInput) a human
//! would.  They read the world only through the tick's
//! [`ContactIndex`](crate::contacts::ContactIndex) snapshot.

pub mod pilot;
pub mod profile;
pub mod targeting;

pub use pilot::{AiPilot, AiState, DecisionContext};
pub use profile::{Profile, ProfileTuning};
pub use targeting::{find_target, is_valid_target};

use bevy::prelude::*;

use crate::config::SimConfig;
use crate::contacts::ContactIndex;
use crate::input::ControlInput;
use crate::object::GameObject;
use crate::simulation::{SimClock, SimRng};

/// Run every due pilot and mirror its disguise onto the object.
pub fn ai_decision_system(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    contacts: Res<ContactIndex>,
    mut rng: ResMut<SimRng>,
    mut q: Query<(Entity, &mut AiPilot, &mut ControlInput, &mut GameObject)>,
) {
    let ctx = DecisionContext {
        tick: clock.tick,
        contacts: &contacts,
        config: &config,
    };
    for (entity, mut pilot, mut input, mut object) in q.iter_mut() {
        if !object.is_active() {
            continue;
        }
        let Some(me) = contacts.get(entity) else {
            continue;
        };
        let before = pilot.state();
        pilot.decide(me, &mut input, &ctx, &mut rng.0);
        if pilot.state() != before {
            debug!("{} ({:?}): {:?} -> {:?}", object.name, pilot.profile(), before, pilot.state());
        }
        if object.disguised != pilot.is_disguised() {
            object.disguised = pilot.is_disguised();
        }
    }
}
