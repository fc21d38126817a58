//! Visual shapes attached to bodies.

use nalgebra::{Vector3, Vector4};
use sim_types::Pose;

use crate::adapter::DrawableAdapter;
use crate::lifecycle::{AdapterSlot, Lifecycle, LifecycleState};
use crate::shape::ShapeDescriptor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Phong-style surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Ambient color.
    pub ambient: Vector3<f64>,
    /// Diffuse color.
    pub diffuse: Vector3<f64>,
    /// Specular color.
    pub specular: Vector3<f64>,
    /// Specular exponent.
    pub shininess: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self::uniform(Vector3::new(0.7, 0.7, 0.7))
    }
}

impl Material {
    /// Same color for every term, default shininess.
    #[must_use]
    pub fn uniform(rgb: Vector3<f64>) -> Self {
        Self {
            ambient: rgb,
            diffuse: rgb,
            specular: rgb,
            shininess: 32.0,
        }
    }
}

/// Renderable geometry owned by a body.
#[derive(Debug, Clone)]
pub struct Drawable {
    name: String,
    shape: ShapeDescriptor,
    rgba: Vector4<f64>,
    material: Material,
    texture: Option<String>,
    visible: bool,
    wireframe: bool,
    local0: Pose,
    world: Pose,
    state: LifecycleState,
    adapter: AdapterSlot<dyn DrawableAdapter>,
}

impl Drawable {
    /// Create a drawable with the default grey material.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ShapeDescriptor) -> Self {
        let material = Material::default();
        Self {
            name: name.into(),
            shape,
            rgba: material.diffuse.push(1.0),
            material,
            texture: None,
            visible: true,
            wireframe: false,
            local0: Pose::identity(),
            world: Pose::identity(),
            state: LifecycleState::Uninitialized,
            adapter: AdapterSlot::empty(),
        }
    }

    /// Set the material; the rgba tint follows its diffuse term.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.rgba = material.diffuse.push(self.rgba.w);
        self.material = material;
        self
    }

    /// Set the rgba tint without touching the material.
    #[must_use]
    pub fn with_rgba(mut self, rgba: Vector4<f64>) -> Self {
        self.rgba = rgba;
        self
    }

    /// Set a texture reference.
    #[must_use]
    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    /// Shape description.
    #[must_use]
    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// Pose relative to the owning body.
    #[must_use]
    pub fn local_transform(&self) -> &Pose {
        &self.shape.local
    }

    /// World poses of the leaf parts of a compound shape, or of the shape
    /// itself for any other kind.
    #[must_use]
    pub fn part_transforms(&self) -> Vec<(&ShapeDescriptor, Pose)> {
        self.shape.part_poses(&self.world)
    }

    /// Surface material.
    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Rgba tint.
    #[must_use]
    pub fn rgba(&self) -> &Vector4<f64> {
        &self.rgba
    }

    /// Texture reference.
    #[must_use]
    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    /// Whether this drawable is shown.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether this drawable is rendered as wireframe.
    #[must_use]
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Bind a visualizer adapter.
    pub fn attach_adapter(&mut self, adapter: &std::rc::Rc<std::cell::RefCell<dyn DrawableAdapter>>) {
        self.adapter.attach(adapter);
    }

    /// Whether a live visualizer adapter is bound.
    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_attached()
    }

    /// Change the pose relative to the owning body.
    ///
    /// The world pose follows at the next step of the owning body.
    pub fn set_local_transform(&mut self, local: Pose) {
        self.shape.local = local;
        self.adapter.with(|a| a.set_local_transform(&local));
    }

    /// Use one color for every material term.
    pub fn set_color(&mut self, rgb: Vector3<f64>) {
        self.material.ambient = rgb;
        self.material.diffuse = rgb;
        self.material.specular = rgb;
        self.rgba = rgb.push(self.rgba.w);
        self.adapter.with(|a| a.set_color(&rgb));
    }

    /// Change the ambient color.
    pub fn set_ambient_color(&mut self, rgb: Vector3<f64>) {
        self.material.ambient = rgb;
        self.adapter.with(|a| a.set_ambient_color(&rgb));
    }

    /// Change the diffuse color.
    pub fn set_diffuse_color(&mut self, rgb: Vector3<f64>) {
        self.material.diffuse = rgb;
        self.adapter.with(|a| a.set_diffuse_color(&rgb));
    }

    /// Change the specular color.
    pub fn set_specular_color(&mut self, rgb: Vector3<f64>) {
        self.material.specular = rgb;
        self.adapter.with(|a| a.set_specular_color(&rgb));
    }

    /// Change the rgba tint.
    pub fn set_rgba(&mut self, rgba: Vector4<f64>) {
        self.rgba = rgba;
        self.adapter.with(|a| a.set_rgba(&rgba));
    }

    /// Change the shininess.
    pub fn set_shininess(&mut self, shininess: f64) {
        self.material.shininess = shininess;
        self.adapter.with(|a| a.set_shininess(shininess));
    }

    /// Change the texture reference.
    pub fn set_texture(&mut self, texture: impl Into<String>) {
        let texture = texture.into();
        self.adapter.with(|a| a.set_texture(&texture));
        self.texture = Some(texture);
    }

    /// Change the size vector.
    pub fn set_size(&mut self, size: Vector3<f64>) {
        self.shape.size = size;
        self.adapter.with(|a| a.set_size(&size));
    }

    /// Replace heightfield samples. Ignored with a warning for other shapes
    /// or when the sample count does not match the grid.
    pub fn set_elevation_data(&mut self, heights: &[f64]) {
        let Some(field) = self.shape.heightfield.as_mut() else {
            tracing::warn!(drawable = %self.name, "elevation data on a non-heightfield drawable, ignoring");
            return;
        };
        if heights.len() != field.heights.len() {
            tracing::warn!(
                drawable = %self.name,
                expected = field.heights.len(),
                got = heights.len(),
                "elevation data size mismatch, ignoring"
            );
            return;
        }
        field.heights.copy_from_slice(heights);
        self.adapter.with(|a| a.set_elevation_data(heights));
    }

    /// Show or hide.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.adapter.with(|a| a.set_visible(visible));
    }

    /// Toggle wireframe rendering.
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
        self.adapter.with(|a| a.set_wireframe(wireframe));
    }

    fn update_world(&mut self, parent: &Pose) {
        self.world = parent.compose(&self.shape.local);
        let world = self.world;
        self.adapter.with(|a| a.set_transform(&world));
    }
}

impl Lifecycle for Drawable {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> &Pose {
        &self.world
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn initialize(&mut self, parent: &Pose) {
        self.local0 = self.shape.local;
        self.update_world(parent);
        self.state = LifecycleState::Initialized;
    }

    fn pre_step(&mut self) {}

    fn post_step(&mut self, parent: &Pose) {
        self.update_world(parent);
    }

    fn reset(&mut self, parent: &Pose) {
        self.shape.local = self.local0;
        let local = self.local0;
        self.adapter.with(|a| a.set_local_transform(&local));
        self.update_world(parent);
    }

    fn detach_sim(&mut self) {}

    fn detach_viz(&mut self) {
        self.adapter.detach();
    }
}
