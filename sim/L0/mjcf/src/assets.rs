//! Asset tables from `<asset>`.
//!
//! Assets are collected once per parse and looked up by name while bodies
//! are assembled. Only file paths are recorded; no mesh or texture bytes are
//! read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::{Vector3, Vector4};
use sim_kintree::{HeightfieldData, Material, ShapeDescriptor};
use sim_schema::Element;
use sim_types::ParseConfig;

use crate::compiler::CompilerSettings;
use crate::defaults::DefaultResolver;
use crate::error::Result;

/// Specular scalar used when a material does not set one.
pub const DEFAULT_MATERIAL_SPECULAR: f64 = 0.5;

/// Shininess used when a material does not set one, in `[0, 1]`.
pub const DEFAULT_MATERIAL_SHININESS: f64 = 0.5;

/// Factor from MJCF shininess in `[0, 1]` to a Phong exponent.
pub const SHININESS_SCALE: f64 = 128.0;

/// A `<mesh>` asset.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAsset {
    /// Asset name.
    pub name: String,
    /// Resolved file path.
    pub path: PathBuf,
    /// Per-axis scale.
    pub scale: Vector3<f64>,
}

/// A `<material>` asset.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAsset {
    /// Asset name.
    pub name: String,
    /// Color.
    pub rgba: Vector4<f64>,
    /// Specular intensity, applied to all three channels.
    pub specular: f64,
    /// Phong exponent (already scaled by [`SHININESS_SCALE`]).
    pub shininess: f64,
    /// Referenced texture name.
    pub texture: Option<String>,
}

impl MaterialAsset {
    /// Phong material: ambient and diffuse from the color, uniform specular.
    #[must_use]
    pub fn to_material(&self) -> Material {
        let rgb = self.rgba.xyz();
        Material {
            ambient: rgb,
            diffuse: rgb,
            specular: Vector3::repeat(self.specular),
            shininess: self.shininess,
        }
    }
}

/// A `<texture>` asset.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAsset {
    /// Asset name.
    pub name: String,
    /// Resolved image file, if the texture is file-based.
    pub file: Option<PathBuf>,
    /// Procedural texture kind (`checker`, `gradient`, ...).
    pub builtin: Option<String>,
}

/// An `<hfield>` asset.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightfieldAsset {
    /// Asset name.
    pub name: String,
    /// `(width, depth, max height)` extents.
    pub size: Vector3<f64>,
    /// Samples (flat when the field is file-based).
    pub data: HeightfieldData,
    /// Resolved elevation file, if any.
    pub file: Option<PathBuf>,
}

impl HeightfieldAsset {
    /// Shape for a geom referencing this field.
    #[must_use]
    pub fn to_shape(&self) -> ShapeDescriptor {
        ShapeDescriptor::heightfield(self.size, self.data.clone())
    }
}

/// Name-indexed assets of one document.
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    meshes: HashMap<String, MeshAsset>,
    materials: HashMap<String, MaterialAsset>,
    textures: HashMap<String, TextureAsset>,
    heightfields: HashMap<String, HeightfieldAsset>,
}

impl AssetTable {
    /// Collect every `<asset>` block of a `<mujoco>` root.
    ///
    /// Relative files resolve against the configured working directory, or
    /// the document's folder joined with `meshdir`/`texturedir`.
    pub fn from_model(
        root: &Element,
        settings: &CompilerSettings,
        defaults: &DefaultResolver,
        config: &ParseConfig,
    ) -> Result<Self> {
        let mesh_dir = asset_dir(root.source_dir(), settings.meshdir.as_deref());
        let texture_dir = asset_dir(root.source_dir(), settings.texturedir.as_deref());
        let mut table = Self::default();

        for asset in root.children_of_type("asset") {
            for child in asset.children() {
                let child = defaults.apply(child, None)?;
                match child.element_type() {
                    "mesh" => table.add_mesh(&child, config, mesh_dir.as_deref()),
                    "material" => table.add_material(&child),
                    "texture" => table.add_texture(&child, config, texture_dir.as_deref()),
                    "hfield" => table.add_heightfield(&child, config, mesh_dir.as_deref()),
                    other => tracing::warn!(asset = other, "unsupported asset type, skipping"),
                }
            }
        }

        tracing::debug!(
            meshes = table.meshes.len(),
            materials = table.materials.len(),
            textures = table.textures.len(),
            heightfields = table.heightfields.len(),
            "assets collected"
        );
        Ok(table)
    }

    fn add_mesh(&mut self, element: &Element, config: &ParseConfig, dir: Option<&Path>) {
        let Some(file) = element.attribute("file").map(|v| v.to_text()) else {
            tracing::warn!(
                name = element.name().unwrap_or("<unnamed>"),
                "mesh asset without file, skipping"
            );
            return;
        };
        let name = element.name().map_or_else(
            || {
                Path::new(&file)
                    .file_stem()
                    .map_or_else(|| file.clone(), |s| s.to_string_lossy().into_owned())
            },
            str::to_string,
        );
        let mesh = MeshAsset {
            path: config.resolve_asset(&file, dir),
            scale: element.get_vec3("scale", Vector3::repeat(1.0)),
            name: name.clone(),
        };
        self.meshes.insert(name, mesh);
    }

    fn add_material(&mut self, element: &Element) {
        let Some(name) = element.name() else {
            tracing::warn!("material asset without name, skipping");
            return;
        };
        let material = MaterialAsset {
            name: name.to_string(),
            rgba: element.get_vec4("rgba", Vector4::repeat(1.0)),
            specular: element.get_float("specular", DEFAULT_MATERIAL_SPECULAR),
            shininess: element.get_float("shininess", DEFAULT_MATERIAL_SHININESS) * SHININESS_SCALE,
            texture: element.attribute("texture").map(|v| v.to_text()),
        };
        self.materials.insert(name.to_string(), material);
    }

    fn add_texture(&mut self, element: &Element, config: &ParseConfig, dir: Option<&Path>) {
        let file = element
            .attribute("file")
            .map(|v| config.resolve_asset(&v.to_text(), dir));
        let name = match (element.name(), &file) {
            (Some(name), _) => name.to_string(),
            (None, Some(path)) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            (None, None) => {
                tracing::warn!("texture asset without name or file, skipping");
                return;
            }
        };
        let texture = TextureAsset {
            name: name.clone(),
            file,
            builtin: element.attribute("builtin").map(|v| v.to_text()),
        };
        self.textures.insert(name, texture);
    }

    fn add_heightfield(&mut self, element: &Element, config: &ParseConfig, dir: Option<&Path>) {
        let Some(name) = element.name() else {
            tracing::warn!("hfield asset without name, skipping");
            return;
        };
        // MJCF size is (radius x, radius y, elevation z, base z).
        let size = element.get_float_array("size", &[1.0, 1.0, 1.0, 0.0]);
        let extent = |i: usize| size.get(i).copied().unwrap_or(1.0);
        let size = Vector3::new(2.0 * extent(0), 2.0 * extent(1), extent(2));

        let rows = usize::try_from(element.get_int("nrow", 0)).unwrap_or(0);
        let cols = usize::try_from(element.get_int("ncol", 0)).unwrap_or(0);
        let elevation = element.get_float_array("elevation", &[]);
        let data = if !elevation.is_empty() && elevation.len() == rows * cols {
            HeightfieldData {
                rows,
                cols,
                heights: elevation,
            }
        } else {
            if !elevation.is_empty() {
                tracing::warn!(
                    name,
                    rows,
                    cols,
                    samples = elevation.len(),
                    "hfield elevation does not match nrow x ncol, using a flat field"
                );
            }
            HeightfieldData::flat(rows, cols)
        };

        let field = HeightfieldAsset {
            name: name.to_string(),
            size,
            data,
            file: element
                .attribute("file")
                .map(|v| config.resolve_asset(&v.to_text(), dir)),
        };
        self.heightfields.insert(name.to_string(), field);
    }

    /// Mesh asset by name.
    #[must_use]
    pub fn mesh(&self, name: &str) -> Option<&MeshAsset> {
        self.meshes.get(name)
    }

    /// Material asset by name.
    #[must_use]
    pub fn material(&self, name: &str) -> Option<&MaterialAsset> {
        self.materials.get(name)
    }

    /// Texture asset by name.
    #[must_use]
    pub fn texture(&self, name: &str) -> Option<&TextureAsset> {
        self.textures.get(name)
    }

    /// Heightfield asset by name.
    #[must_use]
    pub fn heightfield(&self, name: &str) -> Option<&HeightfieldAsset> {
        self.heightfields.get(name)
    }

    /// Total number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len() + self.materials.len() + self.textures.len() + self.heightfields.len()
    }

    /// Whether no asset was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn asset_dir(source_dir: Option<&Path>, subdir: Option<&str>) -> Option<PathBuf> {
    match (source_dir, subdir) {
        (Some(base), Some(sub)) => Some(base.join(sub)),
        (Some(base), None) => Some(base.to_path_buf()),
        (None, Some(sub)) => Some(PathBuf::from(sub)),
        (None, None) => None,
    }
}
