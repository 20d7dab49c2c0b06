//! Narrow interfaces to the subsystems that live outside the simulation core.
//!
//! Image rasterisation, audio playback and the camera belong to the frontend.
//! The core only needs a handful of answers from them, expressed as traits
//! here.  Headless implementations back the binary and the tests:
//!
//! | Trait            | Headless impl    | Used for                                   |
//! |------------------|------------------|--------------------------------------------|
//! | [`ImageService`] | [`ImageCatalog`] | template validation, native sprite width   |
//! | [`SoundService`] | [`SoundLog`]     | particle spawn / end cues                  |
//! | [`CameraView`]   | [`ArenaCamera`]  | culling cues to what is on screen          |

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::{read_data_file, SimError, SimResult};

/// Default location of the image metadata manifest.
pub const IMAGE_MANIFEST_PATH: &str = "assets/images.toml";

/// Source of image metadata.
pub trait ImageService: Send + Sync {
    /// Native pixel size of `reference`, or `None` if it cannot be loaded.
    fn dimensions(&self, reference: &str) -> Option<UVec2>;
}

/// Sink for sound playback requests.
pub trait SoundService: Send + Sync {
    fn play(&mut self, reference: &str);
    fn stop(&mut self, reference: &str);
    fn set_volume(&mut self, volume: f32);
}

/// World-to-screen mapping of the active view.
pub trait CameraView: Send + Sync {
    fn world_to_screen(&self, point: Vec2) -> Vec2;
    fn is_visible(&self, point: Vec2) -> bool;
}

// ── Images ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize)]
struct ImageSize {
    width: u32,
    height: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ImageManifest {
    #[serde(default)]
    images: HashMap<String, ImageSize>,
}

/// In-memory table of image references and their native sizes.
#[derive(Resource, Debug, Clone, Default)]
pub struct ImageCatalog {
    sizes: HashMap<String, UVec2>,
}

impl ImageCatalog {
    pub fn insert(&mut self, reference: impl Into<String>, width: u32, height: u32) {
        self.sizes.insert(reference.into(), UVec2::new(width, height));
    }

    pub fn with(mut self, reference: impl Into<String>, width: u32, height: u32) -> Self {
        self.insert(reference, width, height);
        self
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Parse a manifest of the form `[images] "ref" = { width = 16, height = 4 }`.
    pub fn from_toml_str(path: &Path, text: &str) -> SimResult<Self> {
        let manifest: ImageManifest = toml::from_str(text).map_err(|e| SimError::toml(path, e))?;
        let mut catalog = Self::default();
        for (reference, size) in manifest.images {
            catalog.insert(reference, size.width, size.height);
        }
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> SimResult<Self> {
        let text = read_data_file(path)?;
        Self::from_toml_str(path, &text)
    }
}

impl ImageService for ImageCatalog {
    fn dimensions(&self, reference: &str) -> Option<UVec2> {
        self.sizes.get(reference).copied()
    }
}

/// Startup system: fill the [`ImageCatalog`] resource from the manifest.
pub fn load_image_catalog(mut catalog: ResMut<ImageCatalog>) {
    match ImageCatalog::from_file(Path::new(IMAGE_MANIFEST_PATH)) {
        Ok(loaded) => {
            info!("Loaded {} image entries from {IMAGE_MANIFEST_PATH}", loaded.len());
            *catalog = loaded;
        }
        Err(err) => warn!("{err}; particle templates will fail image lookup"),
    }
}

// ── Sound ─────────────────────────────────────────────────────────────────────

/// Headless audio: records every request instead of playing it.
#[derive(Debug, Clone, Default)]
pub struct SoundLog {
    pub played: Vec<String>,
    pub stopped: Vec<String>,
    pub volume: f32,
}

impl SoundService for SoundLog {
    fn play(&mut self, reference: &str) {
        debug!("[sound] play {reference}");
        self.played.push(reference.to_string());
    }

    fn stop(&mut self, reference: &str) {
        self.stopped.push(reference.to_string());
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

// ── Camera ────────────────────────────────────────────────────────────────────

/// Axis-aligned view rectangle in world space.
#[derive(Debug, Clone, Copy)]
pub struct ArenaCamera {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl ArenaCamera {
    /// A camera that sees the whole arena.
    pub fn covering(half_extents: Vec2) -> Self {
        Self {
            center: Vec2::ZERO,
            half_extents,
        }
    }
}

impl CameraView for ArenaCamera {
    fn world_to_screen(&self, point: Vec2) -> Vec2 {
        point - self.center + self.half_extents
    }

    fn is_visible(&self, point: Vec2) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }
}

/// Frontend collaborators the tick talks to, boxed so embedders can swap them.
#[derive(Resource)]
pub struct Services {
    pub sounds: Box<dyn SoundService>,
    pub camera: Box<dyn CameraView>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            sounds: Box::new(SoundLog::default()),
            camera: Box::new(ArenaCamera::covering(Vec2::splat(f32::MAX))),
        }
    }
}
