//! Immutable particle templates parsed from line-oriented descriptors.
//!
//! ## Descriptor format
//!
//! One directive per line, `KEY value` or `KEY=value`.  `//` starts a comment
//! line, blank lines are skipped and a value of `NONE` leaves the field unset.
//!
//! ```text
//! // plasma bolt
//! IMAGE particles/bolt.png
//! TIME 40
//! SPEED 9
//! FACING 0
//! ROTATE RANDOM
//! CAN_COLLIDE true
//! PARTICLE_END spark
//! MULTISPAWN_END 3
//! END_FACING_ADD 0.4
//! ```
//!
//! Unknown keys and bad literals produce warnings and keep the default; only a
//! descriptor without any `IMAGE` is rejected.

use std::fmt;

use bevy::prelude::*;

use crate::constants::FALLBACK_IMAGE_WIDTH;
use crate::error::{SimError, SimResult};

/// A fixed angle, or a fresh pseudo-random draw per particle instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleSpec {
    Fixed(f32),
    Random,
}

impl Default for AngleSpec {
    fn default() -> Self {
        AngleSpec::Fixed(0.0)
    }
}

/// Shared, read-only behaviour parameters for every particle of one name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleTemplate {
    pub name: String,
    /// Animation frames, in order.  Never empty for a registered template.
    pub images: Vec<String>,
    /// Width of the first frame, in pixels; resolved at registration.
    pub native_width: f32,
    /// Countdown in ticks; `None` lives until faded, shrunk or collided.
    pub lifetime: Option<u32>,
    pub alpha: f32,
    pub alpha_add: f32,
    /// Rendered rotation.
    pub rotate: AngleSpec,
    pub rotate_add: AngleSpec,
    /// Direction of travel.
    pub facing: AngleSpec,
    pub facing_add: AngleSpec,
    pub size: f32,
    pub size_add: f32,
    pub scale_to_spawner: bool,
    pub speed: f32,
    pub attached: bool,
    /// Homing activation distance; `0` disables homing.
    pub homing: f32,
    pub can_collide: bool,
    pub collision_end: bool,
    pub friendly_fire: bool,
    pub subatomic: bool,
    pub physics: bool,
    pub end_particle: Option<String>,
    pub multispawn_end: u32,
    pub end_facing_add: f32,
    pub sound_spawn: Option<String>,
    pub sound_end: Option<String>,
}

impl ParticleTemplate {
    /// A template with every field at its default and no images.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            images: Vec::new(),
            native_width: FALLBACK_IMAGE_WIDTH,
            lifetime: None,
            alpha: 1.0,
            alpha_add: 0.0,
            rotate: AngleSpec::default(),
            rotate_add: AngleSpec::default(),
            facing: AngleSpec::default(),
            facing_add: AngleSpec::default(),
            size: 1.0,
            size_add: 0.0,
            scale_to_spawner: false,
            speed: 0.0,
            attached: false,
            homing: 0.0,
            can_collide: false,
            collision_end: true,
            friendly_fire: false,
            subatomic: false,
            physics: false,
            end_particle: None,
            multispawn_end: 1,
            end_facing_add: 0.0,
            sound_spawn: None,
            sound_end: None,
        }
    }

    /// Parse a descriptor, logging every warning.
    pub fn parse(name: &str, text: &str) -> SimResult<Self> {
        let (template, warnings) = parse_descriptor(name, text)?;
        for warning in &warnings {
            warn!("particle template '{name}': {warning}");
        }
        Ok(template)
    }

    /// Image to show on the given tick of a particle's life.
    pub fn frame(&self, age: u32) -> Option<&str> {
        if self.images.is_empty() {
            return None;
        }
        let index = age as usize % self.images.len();
        self.images.get(index).map(String::as_str)
    }
}

/// A recoverable problem found while reading one descriptor line.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorWarning {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for DescriptorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parse a descriptor and return the template plus every warning raised.
pub fn parse_descriptor(
    name: &str,
    text: &str,
) -> SimResult<(ParticleTemplate, Vec<DescriptorWarning>)> {
    let mut template = ParticleTemplate::named(name);
    let mut warnings = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let (key, value) = split_directive(line);
        let key = key.to_ascii_uppercase();
        if value.eq_ignore_ascii_case("NONE") {
            continue;
        }
        if let Err(message) = apply_directive(&mut template, &key, value) {
            warnings.push(DescriptorWarning {
                line: line_no,
                message,
            });
        }
    }

    if template.images.is_empty() {
        return Err(SimError::MissingImage {
            template: name.to_string(),
        });
    }
    Ok((template, warnings))
}

fn split_directive(line: &str) -> (&str, &str) {
    if let Some((key, value)) = line.split_once('=') {
        return (key.trim(), value.trim());
    }
    match line.split_once(char::is_whitespace) {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line, ""),
    }
}

fn apply_directive(t: &mut ParticleTemplate, key: &str, value: &str) -> Result<(), String> {
    match key {
        "IMAGE" => t.images.push(non_empty(key, value)?.to_string()),
        "TIME" => {
            let ticks = parse_num::<i64>(key, value)?;
            t.lifetime = u32::try_from(ticks).ok().filter(|&n| n > 0);
        }
        "SIZE" => t.size = parse_num(key, value)?,
        "SIZE_ADD" => t.size_add = parse_num(key, value)?,
        "SCALE_TO_SPAWNER" => t.scale_to_spawner = parse_bool(key, value)?,
        "ALPHA" => t.alpha = parse_num::<f32>(key, value)?.clamp(0.0, 1.0),
        "ALPHA_ADD" => t.alpha_add = parse_num(key, value)?,
        "ROTATE" => t.rotate = parse_angle(key, value)?,
        "ROTATE_ADD" => t.rotate_add = parse_angle(key, value)?,
        "FACING" => t.facing = parse_angle(key, value)?,
        "FACING_ADD" => t.facing_add = parse_angle(key, value)?,
        "SPEED" => t.speed = parse_num(key, value)?,
        "ATTACHED" => t.attached = parse_bool(key, value)?,
        "SOUND_SPAWN" => t.sound_spawn = Some(non_empty(key, value)?.to_string()),
        "SOUND_END" => t.sound_end = Some(non_empty(key, value)?.to_string()),
        "CAN_COLLIDE" => t.can_collide = parse_bool(key, value)?,
        "COLLISION_END" => t.collision_end = parse_bool(key, value)?,
        "FRIENDLY_FIRE" => t.friendly_fire = parse_bool(key, value)?,
        "SUBATOMIC" => t.subatomic = parse_bool(key, value)?,
        "PHYSICS" => t.physics = parse_bool(key, value)?,
        "PARTICLE_END" => t.end_particle = Some(non_empty(key, value)?.to_string()),
        "MULTISPAWN_END" => t.multispawn_end = parse_num(key, value)?,
        "END_FACING_ADD" => t.end_facing_add = parse_num(key, value)?,
        "HOMING" => t.homing = parse_num::<f32>(key, value)?.max(0.0),
        other => return Err(format!("unknown directive '{other}' ignored")),
    }
    Ok(())
}

fn non_empty<'a>(key: &str, value: &'a str) -> Result<&'a str, String> {
    if value.is_empty() {
        Err(format!("{key} needs a value"))
    } else {
        Ok(value)
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("{key}: bad number '{value}', keeping default"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(format!("{key}: bad boolean '{value}', keeping default")),
    }
}

fn parse_angle(key: &str, value: &str) -> Result<AngleSpec, String> {
    if value.eq_ignore_ascii_case("RANDOM") {
        Ok(AngleSpec::Random)
    } else {
        parse_num(key, value).map(AngleSpec::Fixed)
    }
}
