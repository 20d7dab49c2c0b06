//! The per-ship decision state machine.
//!
//! A pilot decides only when its cadence is due.  In between, the input it
//! last wrote stays in place and the ship just flies.  Each decision clears
//! the input and runs exactly one state handler, which re-arms the cadence.

use bevy::prelude::*;
use rand::Rng;

use super::profile::Profile;
use super::targeting::{find_target, is_valid_target};
use crate::config::SimConfig;
use crate::constants::PATROL_ARRIVE_DISTANCE;
use crate::contacts::{Contact, ContactIndex};
use crate::input::ControlInput;
use crate::physics::wrap_angle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiState {
    Disabled,
    Intercept,
    Combat,
    Retreat,
    Patrol,
}

/// Everything a decision may read besides the pilot's own ship.
pub struct DecisionContext<'a> {
    pub tick: u64,
    pub contacts: &'a ContactIndex,
    pub config: &'a SimConfig,
}

#[derive(Component, Debug, Clone)]
pub struct AiPilot {
    profile: Profile,
    state: AiState,
    target: Option<Entity>,
    next_decision: u64,
    waypoint: Option<Vec2>,
    disguised: bool,
}

impl AiPilot {
    pub fn new(profile: Profile) -> Self {
        let state = if profile == Profile::Player {
            AiState::Disabled
        } else {
            AiState::Intercept
        };
        Self {
            profile,
            state,
            target: None,
            next_decision: 0,
            waypoint: None,
            disguised: false,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn next_decision(&self) -> u64 {
        self.next_decision
    }

    pub fn is_disguised(&self) -> bool {
        self.disguised
    }

    /// Force a state, e.g. for scripted encounters.  Ignored for the player.
    pub fn set_state(&mut self, state: AiState) {
        if self.profile != Profile::Player {
            self.state = state;
        }
    }

    /// Make the next call to [`decide`](Self::decide) run regardless of cadence.
    pub fn wake(&mut self) {
        self.next_decision = 0;
    }

    /// Run one decision if due.  Returns `true` if `input` was rewritten.
    pub fn decide(
        &mut self,
        me: &Contact,
        input: &mut ControlInput,
        ctx: &DecisionContext,
        rng: &mut impl Rng,
    ) -> bool {
        if self.state == AiState::Retreat && self.has_recovered(me, ctx.config) {
            self.next_decision = ctx.tick;
        }
        if ctx.tick < self.next_decision {
            return false;
        }

        if self.state == AiState::Disabled {
            self.target = self.acquire(me, ctx).map(|c| c.entity);
            self.schedule(ctx.tick, ctx.config.ai_intercept_interval);
            return false;
        }

        input.clear();
        match self.state {
            AiState::Intercept => self.intercept(me, input, ctx, rng),
            AiState::Combat => self.combat(me, input, ctx, rng),
            AiState::Retreat => self.retreat(me, input, ctx, rng),
            AiState::Patrol => self.patrol(me, input, ctx, rng),
            AiState::Disabled => {}
        }
        true
    }

    fn schedule(&mut self, tick: u64, interval: u64) {
        self.next_decision = tick + interval.max(1);
    }

    /// Keep the current target while it is still valid and in range,
    /// otherwise search again.
    fn acquire<'a>(&mut self, me: &Contact, ctx: &DecisionContext<'a>) -> Option<&'a Contact> {
        let tuning = self.profile.tuning();
        let contacts = ctx.contacts;
        let kept = self
            .target
            .and_then(|entity| contacts.get(entity))
            .filter(|c| is_valid_target(me, c))
            .filter(|c| c.body.position.distance(me.body.position) < tuning.search_radius);
        let found = kept.or_else(|| {
            find_target(
                me,
                contacts,
                tuning.search_radius,
                ctx.config.search_cone_cos,
                tuning.engage_distance,
            )
            .and_then(|entity| contacts.get(entity))
        });
        self.target = found.map(|c| c.entity);
        found
    }

    fn engage_distance(&self) -> f32 {
        let tuning = self.profile.tuning();
        if self.disguised {
            tuning.engage_distance_disguised
        } else {
            tuning.engage_distance
        }
    }

    fn should_retreat(&self, me: &Contact, target: &Contact, config: &SimConfig) -> bool {
        if !self.profile.tuning().retreats {
            return false;
        }
        let own_shield_down = me
            .ship
            .and_then(|s| s.shield)
            .is_some_and(|shield| shield.is_depleted());
        let target_strong = target.ship.is_some_and(|s| {
            s.shield.is_some_and(|shield| shield.current > 0.0)
                && s.energy_fraction() >= config.retreat_target_energy
        });
        own_shield_down && target_strong
    }

    fn has_recovered(&self, me: &Contact, config: &SimConfig) -> bool {
        let Some(ship) = me.ship else {
            return true;
        };
        ship.energy_fraction() > config.retreat_energy_recovery
            && ship
                .shield
                .is_none_or(|shield| shield.fraction() > config.retreat_shield_recovery)
    }

    /// Drop the target and head straight for a waypoint.
    fn enter_patrol(&mut self, me: &Contact, input: &mut ControlInput, ctx: &DecisionContext, rng: &mut impl Rng) {
        self.state = AiState::Patrol;
        self.target = None;
        self.disguised = false;
        self.fly_to_waypoint(me, input, ctx, rng);
    }

    /// Pick a fresh waypoint once the last one is reached, then fly at it.
    fn fly_to_waypoint(&mut self, me: &Contact, input: &mut ControlInput, ctx: &DecisionContext, rng: &mut impl Rng) {
        let arrived = self
            .waypoint
            .is_none_or(|point| point.distance(me.body.position) < PATROL_ARRIVE_DISTANCE);
        if arrived {
            let half = ctx.config.arena_half_extents() * 0.8;
            self.waypoint = Some(Vec2::new(
                rng.gen_range(-half.x..=half.x),
                rng.gen_range(-half.y..=half.y),
            ));
        }
        input.look_at = self.waypoint;
        input.forward = true;
        self.schedule(ctx.tick, ctx.config.ai_patrol_interval);
    }

    fn enter_retreat(&mut self, me: &Contact, target: &Contact, input: &mut ControlInput, ctx: &DecisionContext) {
        self.state = AiState::Retreat;
        self.disguised = false;
        flee(me, target, input);
        self.schedule(ctx.tick, ctx.config.ai_retreat_interval);
    }

    fn intercept(&mut self, me: &Contact, input: &mut ControlInput, ctx: &DecisionContext, rng: &mut impl Rng) {
        let Some(target) = self.acquire(me, ctx) else {
            return self.enter_patrol(me, input, ctx, rng);
        };
        if self.should_retreat(me, target, ctx.config) {
            return self.enter_retreat(me, target, input, ctx);
        }
        input.look_at = Some(target.body.position);
        let distance = me.body.position.distance(target.body.position);
        if distance < self.engage_distance() {
            self.state = AiState::Combat;
            self.disguised = false;
            self.schedule(ctx.tick, ctx.config.ai_combat_interval);
            return;
        }
        input.forward = true;
        if self.profile.tuning().disguises {
            self.disguised = true;
        }
        self.schedule(ctx.tick, ctx.config.ai_intercept_interval);
    }

    fn combat(&mut self, me: &Contact, input: &mut ControlInput, ctx: &DecisionContext, rng: &mut impl Rng) {
        let Some(target) = self.acquire(me, ctx) else {
            return self.enter_patrol(me, input, ctx, rng);
        };
        if self.should_retreat(me, target, ctx.config) {
            return self.enter_retreat(me, target, input, ctx);
        }
        let tuning = self.profile.tuning();
        let offset = target.body.position - me.body.position;
        let distance = offset.length();
        input.look_at = Some(target.body.position);

        if distance > tuning.disengage_distance {
            self.state = AiState::Intercept;
            input.forward = true;
            self.schedule(ctx.tick, ctx.config.ai_intercept_interval);
            return;
        }

        if distance > tuning.engage_distance * 0.5 {
            input.forward = true;
        } else if distance < tuning.engage_distance * 0.25 {
            input.back = true;
        }

        let aligned = distance > 0.0 && wrap_angle(offset.to_angle() - me.body.facing).abs() <= ctx.config.fire_arc;
        if let Some(ship) = me.ship {
            input.fire_primary = aligned && ship.primary_ready;
            input.fire_secondary = aligned && tuning.fires_secondary && ship.secondary_ready;
        }
        self.schedule(ctx.tick, ctx.config.ai_combat_interval);
    }

    fn retreat(&mut self, me: &Contact, input: &mut ControlInput, ctx: &DecisionContext, rng: &mut impl Rng) {
        let Some(target) = self.acquire(me, ctx) else {
            return self.enter_patrol(me, input, ctx, rng);
        };
        if self.has_recovered(me, ctx.config) {
            self.state = AiState::Intercept;
            input.look_at = Some(target.body.position);
            input.forward = true;
            self.schedule(ctx.tick, ctx.config.ai_intercept_interval);
            return;
        }
        flee(me, target, input);
        self.schedule(ctx.tick, ctx.config.ai_retreat_interval);
    }

    fn patrol(&mut self, me: &Contact, input: &mut ControlInput, ctx: &DecisionContext, rng: &mut impl Rng) {
        if let Some(target) = self.acquire(me, ctx) {
            self.state = AiState::Intercept;
            self.waypoint = None;
            input.look_at = Some(target.body.position);
            input.forward = true;
            self.schedule(ctx.tick, ctx.config.ai_intercept_interval);
            return;
        }
        self.fly_to_waypoint(me, input, ctx, rng);
    }
}

/// Point away from `threat` and run.
fn flee(me: &Contact, threat: &Contact, input: &mut ControlInput) {
    let away = me.body.position - threat.body.position;
    let away = if away.length_squared() > 0.0 {
        away.normalize()
    } else {
        -me.body.forward()
    };
    input.look_at = Some(me.body.position + away * 500.0);
    input.forward = true;
}
