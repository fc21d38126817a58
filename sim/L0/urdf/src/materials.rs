//! Named materials of a robot description.
//!
//! Materials may be declared at the top of `<robot>` or inline inside a
//! link's `<visual>`. Both places feed one table keyed by name, and the first
//! declaration of a name wins.

use std::collections::HashMap;

use nalgebra::{Vector3, Vector4};
use sim_kintree::Material;
use sim_schema::Element;

/// Color used when a material declares no `<color>`.
pub const DEFAULT_RGBA: [f64; 4] = [0.7, 0.5, 0.3, 1.0];

/// Specular color given to every URDF material.
pub const DEFAULT_SPECULAR: [f64; 3] = [0.7, 0.5, 0.3];

/// Specular exponent given to every URDF material.
pub const DEFAULT_SHININESS: f64 = 32.0;

/// A `<material>` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfMaterial {
    /// Color and opacity.
    pub rgba: Vector4<f64>,
    /// Texture filename as written in the document.
    pub texture: Option<String>,
}

impl Default for UrdfMaterial {
    fn default() -> Self {
        Self {
            rgba: Vector4::from(DEFAULT_RGBA),
            texture: None,
        }
    }
}

impl UrdfMaterial {
    /// Read the `<color>` and `<texture>` children of a `<material>`.
    #[must_use]
    pub fn from_element(material: &Element) -> Self {
        let rgba = material
            .first_child_of_type("color")
            .map_or_else(|| Vector4::from(DEFAULT_RGBA), |color| {
                color.get_vec4("rgba", Vector4::from(DEFAULT_RGBA))
            });
        let texture = material
            .first_child_of_type("texture")
            .map(|t| t.get_string("filename", ""))
            .filter(|f| !f.is_empty());
        Self { rgba, texture }
    }

    /// Surface description: ambient and diffuse take the color, specular
    /// and shininess are fixed.
    #[must_use]
    pub fn to_material(&self) -> Material {
        Material {
            ambient: self.rgba.xyz(),
            diffuse: self.rgba.xyz(),
            specular: Vector3::from(DEFAULT_SPECULAR),
            shininess: DEFAULT_SHININESS,
        }
    }
}

/// Material table of one robot.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    materials: HashMap<String, UrdfMaterial>,
}

impl MaterialTable {
    /// Collect top-level materials, then the ones embedded in link visuals.
    #[must_use]
    pub fn from_robot(robot: &Element) -> Self {
        let mut table = Self::default();
        for material in robot.children_of_type("material") {
            table.declare(material);
        }
        for link in robot.children_of_type("link") {
            for visual in link.children_of_type("visual") {
                if let Some(material) = visual.first_child_of_type("material") {
                    table.declare(material);
                }
            }
        }
        tracing::debug!(materials = table.len(), "URDF materials collected");
        table
    }

    fn declare(&mut self, material: &Element) {
        let Some(name) = material.name() else {
            return;
        };
        if self.materials.contains_key(name) {
            return;
        }
        self.materials
            .insert(name.to_string(), UrdfMaterial::from_element(material));
    }

    /// Material by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UrdfMaterial> {
        self.materials.get(name)
    }

    /// Material a `<visual>` refers to.
    ///
    /// A named reference is looked up in the table; an unnamed material is
    /// read in place. `None` if the visual has no `<material>`.
    #[must_use]
    pub fn for_visual(&self, visual: &Element) -> Option<UrdfMaterial> {
        let material = visual.first_child_of_type("material")?;
        match material.name() {
            Some(name) => Some(self.get(name).cloned().unwrap_or_else(|| {
                tracing::warn!(material = name, "undeclared material, using default color");
                UrdfMaterial::default()
            })),
            None => Some(UrdfMaterial::from_element(material)),
        }
    }

    /// Number of materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
