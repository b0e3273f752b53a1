//! Scene lighting model.

use serde::{Deserialize, Serialize};

/// A light source in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    /// Uniform fill light.
    Ambient { color: [f32; 3] },
    /// Parallel light shining from `position` towards the origin.
    Directional {
        color: [f32; 3],
        intensity: f32,
        position: [f32; 3],
    },
}

impl Light {
    /// Soft white ambient, the 0x404040 of the classic three.js setup.
    pub fn soft_ambient() -> Self {
        Light::Ambient {
            color: [0.25, 0.25, 0.25],
        }
    }

    pub fn default_directional() -> Self {
        Light::Directional {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            position: [-1.0, 2.0, 4.0],
        }
    }
}
