//! Accretion Arena simulation core.
//!
//! A headless, fixed-step 2D combat simulation on Bevy ECS: ships, asteroids,
//! planets and stations; data-driven particles; and AI pilots that share a
//! control surface with the human player.  Rendering, audio and input devices
//! are reached only through the traits in [`services`].

pub mod ai;
pub mod arena;
pub mod config;
pub mod constants;
pub mod contacts;
pub mod error;
pub mod input;
pub mod object;
pub mod particles;
pub mod physics;
pub mod services;
pub mod ship;
pub mod simulation;
