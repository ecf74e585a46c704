//! Collision derivation settings.

use rigidcad_scene::predicate::IGNORE_TAG;
use rigidcad_scene::Entity;
use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, Result};

/// Parameters handed to the engine's convex decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionParams {
    /// Concavity below which a part is accepted as convex.
    pub concavity_tolerance: f64,
    /// Largest concavity the decomposition may leave behind.
    pub max_concavity: f64,
    /// Upper bound on the number of hulls produced.
    pub max_hulls: u32,
    /// Upper bound on the vertices of each hull.
    pub max_vertices_per_hull: u32,
}

impl Default for DecompositionParams {
    fn default() -> Self {
        Self {
            concavity_tolerance: 0.01,
            max_concavity: 0.2,
            max_hulls: 512,
            max_vertices_per_hull: 1024,
        }
    }
}

/// Settings for collision shape derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Entities carrying this tag (and their subtrees) are left out.
    pub ignore_tag: String,
    /// Include hidden entities.
    pub include_hidden: bool,
    /// Static meshes collide on both sides of each triangle.
    pub double_sided_meshes: bool,
    /// Sampling resolution when an engine approximates an ellipsoid.
    pub ellipsoid_segments: u32,
    /// Convex decomposition parameters.
    pub decomposition: DecompositionParams,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            ignore_tag: IGNORE_TAG.to_string(),
            include_hidden: false,
            double_sided_meshes: true,
            ellipsoid_segments: 16,
            decomposition: DecompositionParams::default(),
        }
    }
}

impl CollisionSettings {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(s).map_err(|e| CollisionError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CollisionError::Settings(e.to_string()))
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.ellipsoid_segments < 4 {
            return Err(CollisionError::Settings(
                "ellipsoid_segments must be at least 4".into(),
            ));
        }
        let d = &self.decomposition;
        if !(d.concavity_tolerance > 0.0 && d.concavity_tolerance <= 1.0) {
            return Err(CollisionError::Settings(
                "decomposition.concavity_tolerance must be in (0, 1]".into(),
            ));
        }
        if d.max_concavity <= 0.0 {
            return Err(CollisionError::Settings(
                "decomposition.max_concavity must be positive".into(),
            ));
        }
        if d.max_hulls == 0 {
            return Err(CollisionError::Settings(
                "decomposition.max_hulls must be at least 1".into(),
            ));
        }
        if d.max_vertices_per_hull < 4 {
            return Err(CollisionError::Settings(
                "decomposition.max_vertices_per_hull must be at least 4".into(),
            ));
        }
        Ok(())
    }

    /// Inclusion predicate applied during traversal.
    pub fn includes(&self, entity: &Entity) -> bool {
        (self.include_hidden || !entity.hidden) && !entity.has_tag(&self.ignore_tag)
    }
}
