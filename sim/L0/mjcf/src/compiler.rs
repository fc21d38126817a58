//! Model-wide settings from `<compiler>`.

use sim_schema::Element;

use crate::error::{MjcfError, Result};

/// Angular unit of angle-valued attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AngleUnit {
    /// Degrees (the MJCF default).
    #[default]
    Degree,
    /// Radians.
    Radian,
}

/// Settings read from `<compiler>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    /// `coordinate="local"`: poses are relative to the parent body.
    pub use_local_coordinates: bool,
    /// Unit of euler angles, axis-angle angles, joint ranges and refs.
    pub angle: AngleUnit,
    /// Euler rotation sequence, three characters from `xyzXYZ`.
    pub eulerseq: String,
    /// Folder for mesh and heightfield files.
    pub meshdir: Option<String>,
    /// Folder for texture files.
    pub texturedir: Option<String>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            use_local_coordinates: true,
            angle: AngleUnit::Degree,
            eulerseq: "xyz".to_string(),
            meshdir: None,
            texturedir: None,
        }
    }
}

impl CompilerSettings {
    /// Read the settings from the `<compiler>` child of a `<mujoco>` root.
    ///
    /// Missing attributes keep their defaults.
    pub fn from_model(root: &Element) -> Result<Self> {
        let mut settings = Self::default();
        let Some(compiler) = root.first_child_of_type("compiler") else {
            return Ok(settings);
        };

        if let Some(value) = compiler.attribute("coordinate") {
            settings.use_local_coordinates = match value.to_text().as_str() {
                "local" => true,
                "global" => false,
                other => {
                    return Err(MjcfError::invalid_attribute(
                        "coordinate",
                        "compiler",
                        format!("expected 'local' or 'global', got '{other}'"),
                    ))
                }
            };
        }

        if let Some(value) = compiler.attribute("angle") {
            settings.angle = match value.to_text().as_str() {
                "degree" => AngleUnit::Degree,
                "radian" => AngleUnit::Radian,
                other => {
                    return Err(MjcfError::invalid_attribute(
                        "angle",
                        "compiler",
                        format!("expected 'degree' or 'radian', got '{other}'"),
                    ))
                }
            };
        }

        if let Some(value) = compiler.attribute("eulerseq") {
            let seq = value.to_text();
            let valid = seq.len() == 3 && seq.chars().all(|c| "xyzXYZ".contains(c));
            if !valid {
                return Err(MjcfError::invalid_attribute(
                    "eulerseq",
                    "compiler",
                    format!("expected three of 'xyzXYZ', got '{seq}'"),
                ));
            }
            settings.eulerseq = seq;
        }

        settings.meshdir = compiler.attribute("meshdir").map(|v| v.to_text());
        settings.texturedir = compiler.attribute("texturedir").map(|v| v.to_text());
        Ok(settings)
    }

    /// Whether angles are given in degrees.
    #[must_use]
    pub fn use_degrees(&self) -> bool {
        self.angle == AngleUnit::Degree
    }

    /// Convert an angle in the model's unit to radians.
    #[must_use]
    pub fn to_radians(&self, angle: f64) -> f64 {
        if self.use_degrees() {
            angle.to_radians()
        } else {
            angle
        }
    }
}
