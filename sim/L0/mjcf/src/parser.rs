//! MJCF document to kinematic tree.
//!
//! Parsing runs in four passes over a loaded document:
//!
//! 1. compiler settings,
//! 2. assets,
//! 3. default classes,
//! 4. a depth-first walk of `<worldbody>` that builds one [`Body`] per
//!    `<body>`.
//!
//! Lookup tables built in the first three passes live only for the duration
//! of one parse.

use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;

use nalgebra::{Point3, Vector2, Vector3, Vector4};
use sim_kintree::shape::normalize_segment;
use sim_kintree::{
    Body, Collider, Drawable, HeightfieldData, Joint, KinematicTree, Lifecycle, Material,
    ShapeDescriptor, DEFAULT_DENSITY, DEFAULT_FRICTION,
};
use sim_schema::{Dialect, Element, ModelCache};
use sim_types::{BodyId, InertialData, JointLimits, JointType, ParseConfig, Pose, ShapeType};

use crate::assets::AssetTable;
use crate::compiler::CompilerSettings;
use crate::defaults::DefaultResolver;
use crate::error::{MjcfError, Result};
use crate::orientation::{element_pose, element_segment};

/// Name of the body synthesized when `<worldbody>` has no single root body.
pub const WORLD_BODY: &str = "world";

/// Half-extent used for a primitive geom that declares no size.
const FALLBACK_HALF_SIZE: f64 = 0.1;

/// Turns MJCF documents into kinematic trees.
///
/// # Example
///
/// ```
/// use sim_mjcf::MjcfParser;
/// use sim_types::ParseConfig;
///
/// let xml = r#"
///     <mujoco model="pendulum">
///         <worldbody>
///             <body name="pole" pos="0 0 1">
///                 <joint name="swing" type="hinge" axis="0 1 0"/>
///                 <geom type="capsule" fromto="0 0 0 0 0 -0.5" size="0.02"/>
///             </body>
///         </worldbody>
///     </mujoco>
/// "#;
///
/// let tree = MjcfParser::new(ParseConfig::default()).parse_str(xml).unwrap();
/// assert_eq!(tree.name(), "pendulum");
/// assert!(tree.joint_by_name("swing").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MjcfParser {
    config: ParseConfig,
}

impl MjcfParser {
    /// Create a parser.
    #[must_use]
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    /// Configuration used by this parser.
    #[must_use]
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parse MJCF text.
    pub fn parse_str(&self, text: &str) -> Result<KinematicTree> {
        let document = Element::from_str_with(text, Dialect::Mjcf, &self.config)?;
        self.parse_element(&document)
    }

    /// Parse an MJCF file. Relative asset paths resolve against its folder
    /// unless a working directory is configured.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<KinematicTree> {
        let document = Element::from_file(path, Dialect::Mjcf, &self.config)?;
        self.parse_element(&document)
    }

    /// Parse a named document from a cache, loading it on first use.
    pub fn parse_cached(&self, cache: &mut ModelCache, name: &str) -> Result<KinematicTree> {
        let document: Arc<Element> = cache.get(Dialect::Mjcf, name)?;
        self.parse_element(&document)
    }

    /// Assemble a tree from a loaded `<mujoco>` document.
    pub fn parse_element(&self, document: &Element) -> Result<KinematicTree> {
        if document.element_type() != "mujoco" {
            return Err(MjcfError::WrongDialect(document.element_type().to_string()));
        }
        self.config.validate()?;
        document.validate(self.config.policy)?;

        let settings = CompilerSettings::from_model(document)?;
        let defaults = DefaultResolver::from_model(document)?;
        let assets = AssetTable::from_model(document, &settings, &defaults, &self.config)?;

        let tree_name = self
            .config
            .tree_name
            .clone()
            .or_else(|| document.attribute("model").map(|v| v.to_text()))
            .unwrap_or_else(|| "model".to_string());

        let worldbody = document
            .first_child_of_type("worldbody")
            .ok_or_else(|| MjcfError::missing_element("worldbody", format!("model '{tree_name}'")))?;

        let mut builder = TreeBuilder {
            settings: &settings,
            defaults: &defaults,
            assets: &assets,
            tree: KinematicTree::new(tree_name),
            counters: Counters::default(),
        };
        builder.build_world(worldbody)?;

        let tree = builder.tree;
        tracing::debug!(
            tree = %tree.name(),
            bodies = tree.len(),
            joints = tree.joint_count(),
            colliders = tree.collider_count(),
            "MJCF tree assembled"
        );
        Ok(tree)
    }
}

/// Per-parse counters for generated names.
#[derive(Debug, Default)]
struct Counters {
    body: usize,
    joint: usize,
    collider: usize,
    drawable: usize,
}

struct TreeBuilder<'a> {
    settings: &'a CompilerSettings,
    defaults: &'a DefaultResolver,
    assets: &'a AssetTable,
    tree: KinematicTree,
    counters: Counters,
}

impl TreeBuilder<'_> {
    fn generated_name(&self, kind: &str, n: usize) -> String {
        format!("{}_{kind}_{n}", self.tree.name())
    }

    fn name_or_generate(&mut self, element: &Element, kind: &'static str) -> String {
        if let Some(name) = element.name() {
            return name.to_string();
        }
        let counter = match kind {
            "body" => &mut self.counters.body,
            "joint" => &mut self.counters.joint,
            "collider" => &mut self.counters.collider,
            _ => &mut self.counters.drawable,
        };
        let n = *counter;
        *counter += 1;
        self.generated_name(kind, n)
    }

    /// Convert a declared pose into one relative to `frame`, the world pose
    /// of the owning or parent body.
    fn localize(&self, declared: Pose, frame: &Pose) -> Pose {
        if self.settings.use_local_coordinates {
            declared
        } else {
            frame.relative(&declared)
        }
    }

    fn build_world(&mut self, worldbody: &Element) -> Result<()> {
        let top_bodies: Vec<&Element> = worldbody.children_of_type("body").collect();
        let world_geoms = worldbody.has_child_of_type("geom");

        if let ([single], false) = (top_bodies.as_slice(), world_geoms) {
            return self.build_body(single, None, &Pose::identity(), None);
        }

        let world_frame = Pose::identity();
        let mut world = Body::new(WORLD_BODY).with_inertia(InertialData::massless());
        for geom in worldbody.children_of_type("geom") {
            let geom = self.defaults.apply(geom, None)?;
            let (collider, drawable) = self.build_geom(&geom, &world_frame)?;
            world = world.with_collider(collider).with_drawable(drawable);
        }
        let root = self.tree.add_root(world)?;
        for body in top_bodies {
            self.build_body(body, Some(root), &world_frame, None)?;
        }
        Ok(())
    }

    fn build_body(
        &mut self,
        element: &Element,
        parent: Option<BodyId>,
        parent_world: &Pose,
        inherited_class: Option<&str>,
    ) -> Result<()> {
        let childclass = element
            .attribute("childclass")
            .map(|v| v.to_text())
            .or_else(|| inherited_class.map(str::to_string));
        let childclass = childclass.as_deref();

        let name = self.name_or_generate(element, "body");
        let declared = element_pose(element, self.settings);
        let (local, world) = if self.settings.use_local_coordinates {
            (declared, parent_world.compose(&declared))
        } else {
            (parent_world.relative(&declared), declared)
        };

        let mut joints = Vec::new();
        let mut colliders = Vec::new();
        let mut drawables = Vec::new();
        for child in element.children() {
            match child.element_type() {
                "joint" => {
                    let joint = self.defaults.apply(child, childclass)?;
                    joints.push(self.build_joint(&joint, &world)?);
                }
                "freejoint" => {
                    let name = self.name_or_generate(child, "joint");
                    joints.push(Joint::new(name, JointType::Free));
                }
                "geom" => {
                    let geom = self.defaults.apply(child, childclass)?;
                    let (collider, drawable) = self.build_geom(&geom, &world)?;
                    colliders.push(collider);
                    drawables.push(drawable);
                }
                _ => {}
            }
        }

        let inertia = match element.first_child_of_type("inertial") {
            Some(inertial) => self.build_inertial(inertial, &world),
            None => InertialData::default(),
        };

        // Every body carries at most one joint: extra joints go on massless
        // bodies chained between the parent and this body.
        let mut parent = parent;
        let mut local = local;
        let last_joint = joints.pop();
        for (i, joint) in joints.into_iter().enumerate() {
            let dof = Body::new(format!("{name}_dof{i}"))
                .with_local(local)
                .with_inertia(InertialData::massless())
                .with_joint(joint);
            parent = Some(self.insert(parent, dof)?);
            local = Pose::identity();
        }

        let mut body = Body::new(name).with_local(local).with_inertia(inertia);
        if let Some(joint) = last_joint {
            body = body.with_joint(joint);
        }
        for collider in colliders {
            body = body.with_collider(collider);
        }
        for drawable in drawables {
            body = body.with_drawable(drawable);
        }
        let id = self.insert(parent, body)?;

        for child in element.children_of_type("body") {
            self.build_body(child, Some(id), &world, childclass)?;
        }
        Ok(())
    }

    fn insert(&mut self, parent: Option<BodyId>, body: Body) -> Result<BodyId> {
        let id = match parent {
            Some(parent) => self.tree.add_body(parent, body)?,
            None => self.tree.add_root(body)?,
        };
        Ok(id)
    }

    /// Build one `<joint>` or `<freejoint>`.
    ///
    /// A missing `axis` is +Z, the MJCF convention. URDF joints default to
    /// +X instead, so the same mechanism written in both formats needs an
    /// explicit axis to agree.
    fn build_joint(&mut self, element: &Element, body_world: &Pose) -> Result<Joint> {
        let name = self.name_or_generate(element, "joint");
        let kind = element.get_string("type", "hinge");
        let joint_type = match kind.as_str() {
            "hinge" => JointType::Revolute,
            "slide" => JointType::Prismatic,
            "ball" => JointType::Spherical,
            "free" => JointType::Free,
            "planar" => JointType::Planar,
            "fixed" => JointType::Fixed,
            other => return Err(MjcfError::UnknownJointType(other.to_string())),
        };
        let angular = matches!(joint_type, JointType::Revolute | JointType::Spherical);

        // The joint frame only carries a position; the axis holds the direction.
        let mut position = Point3::from(element.get_vec3("pos", Vector3::zeros()));
        let mut axis = element.get_vec3("axis", Vector3::z());
        if !self.settings.use_local_coordinates {
            position = body_world.inverse().transform_point(&position);
            axis = body_world.rotation.inverse() * axis;
        }
        let local = Pose::from_position(position);

        let limits = self.joint_limits(element, &name, angular);
        let mut joint = Joint::new(name, joint_type)
            .with_axis(axis)
            .with_local(local)
            .with_limits(limits)
            .with_dynamics(
                element.get_float("stiffness", 0.0),
                element.get_float("armature", 0.0),
                element.get_float("damping", 0.0),
            );

        if element.has_attribute("ref") {
            let reference = element.get_float("ref", 0.0);
            match joint_type {
                JointType::Revolute => {
                    joint = joint.with_initial_qpos(vec![self.settings.to_radians(reference)]);
                }
                JointType::Prismatic => joint = joint.with_initial_qpos(vec![reference]),
                _ => tracing::warn!(joint = %joint.name(), "ref ignored for multi-dof joint"),
            }
        }
        Ok(joint)
    }

    fn joint_limits(&self, element: &Element, name: &str, angular: bool) -> JointLimits {
        let limited = match element.get_string("limited", "false").as_str() {
            "true" => true,
            "auto" => element.has_attribute("range"),
            _ => false,
        };
        if !limited {
            return JointLimits::continuous();
        }

        let half_turn = if self.settings.use_degrees() { 180.0 } else { PI };
        let range = match (element.has_attribute("range"), angular) {
            (true, _) => element.get_vec2("range", Vector2::new(1.0, -1.0)),
            (false, true) => Vector2::new(-half_turn, half_turn),
            (false, false) => {
                tracing::warn!(joint = name, "limited slide joint without range, leaving it free");
                return JointLimits::continuous();
            }
        };
        if angular {
            JointLimits::new(
                self.settings.to_radians(range.x),
                self.settings.to_radians(range.y),
            )
        } else {
            JointLimits::new(range.x, range.y)
        }
    }

    fn build_inertial(&self, element: &Element, body_world: &Pose) -> InertialData {
        let mass = element.get_float("mass", 1.0);
        let full = element.get_float_array("fullinertia", &[]);
        let mut inertia = if full.len() == 6 {
            InertialData {
                mass,
                ixx: full[0],
                iyy: full[1],
                izz: full[2],
                ixy: full[3],
                ixz: full[4],
                iyz: full[5],
                frame: Pose::identity(),
            }
        } else if element.has_attribute("diaginertia") {
            let default = InertialData::default();
            let diag = element.get_vec3(
                "diaginertia",
                Vector3::new(default.ixx, default.iyy, default.izz),
            );
            InertialData::diagonal(mass, diag)
        } else {
            InertialData {
                mass,
                ..InertialData::default()
            }
        };
        inertia.frame = self.localize(element_pose(element, self.settings), body_world);
        inertia
    }

    fn build_geom(&mut self, element: &Element, body_world: &Pose) -> Result<(Collider, Drawable)> {
        let kind = element.get_string("type", "sphere");
        let shape_type = match kind.parse::<ShapeType>() {
            Ok(ShapeType::Compound) | Err(_) => return Err(MjcfError::UnknownGeomType(kind)),
            Ok(shape) => shape,
        };

        let shape = self.geom_shape(element, shape_type);
        let local = self.localize(shape.local, body_world);
        let shape = shape.with_local(local);

        let collider_name = match element.name() {
            Some(name) => name.to_string(),
            None => self.name_or_generate(element, "collider"),
        };
        let drawable_name = match element.name() {
            Some(name) => name.to_string(),
            None => self.name_or_generate(element, "drawable"),
        };

        let friction = element.get_float_array("friction", &DEFAULT_FRICTION);
        let friction = Vector3::from_fn(|i, _| friction.get(i).copied().unwrap_or(DEFAULT_FRICTION[i]));
        let collider = Collider::new(collider_name, shape.clone())
            .with_filter(
                int_attribute(element, "contype", 1),
                int_attribute(element, "conaffinity", 1),
            )
            .with_friction(friction)
            .with_density(element.get_float("density", DEFAULT_DENSITY));

        let drawable = self.geom_drawable(element, drawable_name, shape);
        Ok((collider, drawable))
    }

    /// Standard descriptor for a geom, with its declared (unconverted) pose.
    fn geom_shape(&self, element: &Element, shape_type: ShapeType) -> ShapeDescriptor {
        let size = element.get_float_array("size", &[]);

        if let Some((from, to)) = element_segment(element) {
            if shape_type.supports_segment() {
                let radius = size.first().copied().unwrap_or(0.0);
                return normalize_segment(shape_type, &from, &to, radius);
            }
            tracing::warn!(shape = %shape_type, "fromto ignored for this geom type");
        }

        let pose = element_pose(element, self.settings);
        let half = |i: usize| {
            size.get(i).copied().unwrap_or_else(|| {
                tracing::warn!(shape = %shape_type, index = i, "geom size missing, using fallback");
                FALLBACK_HALF_SIZE
            })
        };
        let shape = match shape_type {
            ShapeType::Box => ShapeDescriptor::cuboid(Vector3::new(half(0), half(1), half(2)) * 2.0),
            ShapeType::Sphere => ShapeDescriptor::sphere(half(0)),
            ShapeType::Ellipsoid => {
                ShapeDescriptor::new(ShapeType::Ellipsoid, Vector3::new(half(0), half(1), half(2)))
            }
            ShapeType::Capsule => ShapeDescriptor::capsule(half(0), 2.0 * half(1)),
            ShapeType::Cylinder => ShapeDescriptor::cylinder(half(0), 2.0 * half(1)),
            ShapeType::Plane => ShapeDescriptor::new(
                ShapeType::Plane,
                Vector3::new(
                    2.0 * size.first().copied().unwrap_or(0.0),
                    2.0 * size.get(1).copied().unwrap_or(0.0),
                    0.0,
                ),
            ),
            ShapeType::Mesh => self.mesh_shape(element),
            ShapeType::Heightfield => self.heightfield_shape(element),
            ShapeType::Compound => ShapeDescriptor::compound(Vec::new()),
        };
        shape.with_local(pose)
    }

    fn mesh_shape(&self, element: &Element) -> ShapeDescriptor {
        let reference = element.get_string("mesh", "");
        match self.assets.mesh(&reference) {
            Some(mesh) => ShapeDescriptor::mesh(mesh.path.clone(), mesh.scale),
            None => {
                tracing::warn!(mesh = %reference, "mesh asset not found, keeping the raw reference");
                ShapeDescriptor::mesh(reference, Vector3::repeat(1.0))
            }
        }
    }

    fn heightfield_shape(&self, element: &Element) -> ShapeDescriptor {
        let reference = element.get_string("hfield", "");
        match self.assets.heightfield(&reference) {
            Some(field) => field.to_shape(),
            None => {
                tracing::warn!(hfield = %reference, "hfield asset not found, using a flat field");
                ShapeDescriptor::heightfield(Vector3::repeat(1.0), HeightfieldData::flat(2, 2))
            }
        }
    }

    fn geom_drawable(&self, element: &Element, name: String, shape: ShapeDescriptor) -> Drawable {
        let drawable = Drawable::new(name, shape);
        if element.has_attribute("rgba") {
            let rgba = element.get_vec4("rgba", Vector4::repeat(1.0));
            return drawable
                .with_material(Material::uniform(rgba.xyz()))
                .with_rgba(rgba);
        }

        let Some(reference) = element.attribute("material").map(|v| v.to_text()) else {
            return drawable;
        };
        let Some(material) = self.assets.material(&reference) else {
            tracing::warn!(material = %reference, "material asset not found, using default");
            return drawable;
        };
        let drawable = drawable
            .with_material(material.to_material())
            .with_rgba(material.rgba);
        match &material.texture {
            Some(texture) => drawable.with_texture(texture.clone()),
            None => drawable,
        }
    }
}

fn int_attribute(element: &Element, name: &str, default: i32) -> i32 {
    i32::try_from(element.get_int(name, i64::from(default))).unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_schema::SchemaError;
    use sim_types::SchemaPolicy;
    use std::f64::consts::FRAC_PI_2;

    fn parse(xml: &str) -> KinematicTree {
        MjcfParser::default().parse_str(xml).unwrap()
    }

    #[test]
    fn test_single_body_is_root() {
        let tree = parse(
            r#"<mujoco model="ball"><worldbody>
                <body name="ball" pos="0 0 1"><freejoint/><geom size="0.1"/></body>
            </worldbody></mujoco>"#,
        );
        assert_eq!(tree.name(), "ball");
        assert_eq!(tree.len(), 1);
        let root = tree.root_body().unwrap();
        assert_eq!(root.name(), "ball");
        assert_eq!(root.joint().unwrap().joint_type(), JointType::Free);
        assert_eq!(root.joint().unwrap().name(), "ball_joint_0");
        assert_relative_eq!(root.colliders()[0].shape().size, Vector3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn test_synthetic_world_root() {
        let tree = parse(
            r#"<mujoco><worldbody>
                <geom name="floor" type="plane" size="5 5 0.1"/>
                <body name="a"/>
                <body name="b"/>
            </worldbody></mujoco>"#,
        );
        assert_eq!(tree.name(), "model");
        let root = tree.root_body().unwrap();
        assert_eq!(root.name(), WORLD_BODY);
        assert_eq!(root.inertia().mass, 0.0);
        assert_eq!(tree.children(root.id()).len(), 2);
        assert_relative_eq!(
            tree.collider_by_name("floor").unwrap().shape().size,
            Vector3::new(10.0, 10.0, 0.0)
        );
    }

    #[test]
    fn test_config_tree_name_wins() {
        let parser = MjcfParser::new(ParseConfig::default().tree_name("robot_1"));
        let tree = parser
            .parse_str(r#"<mujoco model="robot"><worldbody><body/></worldbody></mujoco>"#)
            .unwrap();
        assert_eq!(tree.name(), "robot_1");
        assert!(tree.body_by_name("robot_1_body_0").is_some());
    }

    #[test]
    fn test_missing_worldbody() {
        let err = MjcfParser::default()
            .parse_str(r#"<mujoco model="empty"/>"#)
            .unwrap_err();
        assert!(matches!(err, MjcfError::MissingElement { element: "worldbody", .. }));
    }

    #[test]
    fn test_wrong_dialect() {
        let doc = Element::root(Dialect::Urdf).unwrap();
        let err = MjcfParser::default().parse_element(&doc).unwrap_err();
        assert!(matches!(err, MjcfError::WrongDialect(root) if root == "robot"));
    }

    #[test]
    fn test_joint_fields() {
        let tree = parse(
            r#"<mujoco><worldbody><body name="arm">
                <joint name="elbow" axis="0 2 0" limited="true" range="-90 45"
                       stiffness="3" armature="0.2" damping="0.7" ref="30"/>
            </body></worldbody></mujoco>"#,
        );
        let joint = tree.joint_by_name("elbow").unwrap();
        assert_eq!(joint.joint_type(), JointType::Revolute);
        assert_relative_eq!(*joint.axis(), Vector3::y());
        assert_relative_eq!(joint.limits().low, -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(joint.limits().high, PI / 4.0, epsilon = 1e-12);
        assert_eq!(joint.stiffness(), 3.0);
        assert_eq!(joint.armature(), 0.2);
        assert_eq!(joint.damping(), 0.7);
        assert_relative_eq!(joint.qpos0()[0], PI / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_joint_limit_modes() {
        let tree = parse(
            r#"<mujoco><compiler angle="radian"/><worldbody><body name="a">
                <joint name="free_spin" range="-1 1"/>
                <body name="b"><joint name="default_range" limited="true"/>
                <body name="c"><joint name="auto" limited="auto" range="-0.5 0.5"/></body></body>
            </body></worldbody></mujoco>"#,
        );
        assert!(tree.joint_by_name("free_spin").unwrap().limits().is_continuous());
        assert_relative_eq!(*tree.joint_by_name("free_spin").unwrap().axis(), Vector3::z());
        let default = tree.joint_by_name("default_range").unwrap().limits();
        assert_relative_eq!(default.low, -PI, epsilon = 1e-12);
        assert_relative_eq!(default.high, PI, epsilon = 1e-12);
        assert_eq!(tree.joint_by_name("auto").unwrap().limits().high, 0.5);
    }

    #[test]
    fn test_unknown_joint_and_geom_types() {
        let err = MjcfParser::default()
            .parse_str(r#"<mujoco><worldbody><body><joint type="screw"/></body></worldbody></mujoco>"#)
            .unwrap_err();
        assert!(matches!(err, MjcfError::UnknownJointType(t) if t == "screw"));

        let err = MjcfParser::default()
            .parse_str(r#"<mujoco><worldbody><body><geom type="torus"/></body></worldbody></mujoco>"#)
            .unwrap_err();
        assert!(matches!(err, MjcfError::UnknownGeomType(t) if t == "torus"));
    }

    #[test]
    fn test_multi_joint_body_is_split() {
        let tree = parse(
            r#"<mujoco><worldbody><body name="base">
                <body name="wrist" pos="0 0 1">
                    <joint name="pitch" axis="0 1 0"/>
                    <joint name="yaw" axis="0 0 1"/>
                    <geom size="0.1"/>
                </body>
            </body></worldbody></mujoco>"#,
        );
        assert_eq!(tree.len(), 3);
        let dof = tree.body_by_name("wrist_dof0").unwrap();
        assert_eq!(dof.joint().unwrap().name(), "pitch");
        assert_eq!(dof.inertia().mass, 0.0);
        assert_relative_eq!(dof.local_transform().position, Point3::new(0.0, 0.0, 1.0));

        let wrist = tree.body_by_name("wrist").unwrap();
        assert_eq!(wrist.parent(), Some(dof.id()));
        assert_eq!(wrist.joint().unwrap().name(), "yaw");
        assert_relative_eq!(wrist.local_transform().position, Point3::origin());
        assert_eq!(wrist.colliders().len(), 1);
    }

    #[test]
    fn test_local_coordinates_compose() {
        let mut tree = parse(
            r#"<mujoco><worldbody><body name="a" pos="1 0 0" euler="0 0 90">
                <body name="b" pos="1 0 0"><geom name="g" size="0.1" pos="0 0 1"/></body>
            </body></worldbody></mujoco>"#,
        );
        tree.initialize();
        let b = tree.body_by_name("b").unwrap();
        assert_relative_eq!(b.transform().position, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        let g = tree.collider_by_name("g").unwrap();
        assert_relative_eq!(g.transform().position, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_global_coordinates_are_localized() {
        let xml = r#"<mujoco><compiler coordinate="global"/><worldbody>
                <body name="a" pos="1 0 0">
                    <body name="b" pos="1 2 0">
                        <joint name="j" pos="1 2 0.5" axis="0 0 1"/>
                        <geom name="g" size="0.1" pos="1 2 1"/>
                    </body>
                </body>
            </worldbody></mujoco>"#;
        let mut tree = parse(xml);
        let b = tree.body_by_name("b").unwrap();
        assert_relative_eq!(b.local_transform().position, Point3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(
            tree.joint_by_name("j").unwrap().local_transform().position,
            Point3::new(0.0, 0.0, 0.5)
        );
        assert_relative_eq!(
            tree.collider_by_name("g").unwrap().local_transform().position,
            Point3::new(0.0, 0.0, 1.0)
        );

        tree.initialize();
        assert_relative_eq!(
            tree.collider_by_name("g").unwrap().transform().position,
            Point3::new(1.0, 2.0, 1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_fromto_capsule() {
        let tree = parse(
            r#"<mujoco><worldbody><body name="leg">
                <geom name="shin" type="capsule" fromto="0 0 0 0 0 -0.4" size="0.05"/>
                <geom name="stub" type="cylinder" size="0.02 0.1"/>
            </body></worldbody></mujoco>"#,
        );
        let shin = tree.collider_by_name("shin").unwrap();
        assert_relative_eq!(shin.shape().size, Vector3::new(0.05, 0.4, 0.0), epsilon = 1e-12);
        assert_relative_eq!(shin.local_transform().position, Point3::new(0.0, 0.0, -0.2));
        assert_relative_eq!(
            shin.local_transform().rotation * Vector3::z(),
            -Vector3::z(),
            epsilon = 1e-12
        );

        let stub = tree.collider_by_name("stub").unwrap();
        assert_relative_eq!(stub.shape().size, Vector3::new(0.02, 0.2, 0.0));
    }

    #[test]
    fn test_collider_and_drawable_fields() {
        let tree = parse(
            r#"<mujoco>
                <asset><material name="steel" rgba="0.5 0.5 0.6 1" specular="0.9" texture="brushed"/></asset>
                <worldbody><body name="b">
                    <geom name="painted" type="box" size="0.1 0.2 0.3" rgba="1 0 0 0.5"
                          contype="2" conaffinity="4" friction="0.3" density="500"/>
                    <geom name="metal" type="sphere" size="0.1" material="steel"/>
                    <geom name="plain" type="sphere" size="0.1" material="missing"/>
                </body></worldbody>
            </mujoco>"#,
        );
        let painted = tree.collider_by_name("painted").unwrap();
        assert_relative_eq!(painted.shape().size, Vector3::new(0.2, 0.4, 0.6));
        assert_eq!(painted.collision_group(), 2);
        assert_eq!(painted.collision_mask(), 4);
        assert_relative_eq!(*painted.friction(), Vector3::new(0.3, 0.005, 0.0001));
        assert_eq!(painted.density(), 500.0);

        let painted = tree.drawable_by_name("painted").unwrap();
        assert_relative_eq!(painted.material().specular, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(painted.rgba().w, 0.5);

        let metal = tree.drawable_by_name("metal").unwrap();
        assert_relative_eq!(metal.material().specular, Vector3::repeat(0.9));
        assert_eq!(metal.material().shininess, 64.0);
        assert_eq!(metal.texture(), Some("brushed"));

        let plain = tree.drawable_by_name("plain").unwrap();
        assert_eq!(*plain.material(), Material::default());
    }

    #[test]
    fn test_unnamed_geoms_get_generated_names() {
        let tree = parse(
            r#"<mujoco model="m"><worldbody><body name="b">
                <geom size="0.1"/><geom size="0.2"/>
            </body></worldbody></mujoco>"#,
        );
        assert!(tree.collider_by_name("m_collider_0").is_some());
        assert!(tree.collider_by_name("m_collider_1").is_some());
        assert!(tree.drawable_by_name("m_drawable_1").is_some());
    }

    #[test]
    fn test_inertial() {
        let tree = parse(
            r#"<mujoco><worldbody>
                <body name="a"><inertial pos="0 0 0.1" mass="2" diaginertia="0.1 0.2 0.3"/>
                <body name="b"><inertial mass="3" fullinertia="1 2 3 0.1 0.2 0.3"/></body>
                <body name="c"/></body>
            </worldbody></mujoco>"#,
        );
        let a = tree.body_by_name("a").unwrap().inertia();
        assert_eq!(a.mass, 2.0);
        assert_eq!(a.iyy, 0.2);
        assert_relative_eq!(a.frame.position, Point3::new(0.0, 0.0, 0.1));

        let b = tree.body_by_name("b").unwrap().inertia();
        assert_eq!((b.ixx, b.iyy, b.izz, b.ixy, b.ixz, b.iyz), (1.0, 2.0, 3.0, 0.1, 0.2, 0.3));

        assert_eq!(*tree.body_by_name("c").unwrap().inertia(), InertialData::default());
    }

    #[test]
    fn test_childclass_applies_to_descendants() {
        let tree = parse(
            r#"<mujoco>
                <default>
                    <geom rgba="0 0 1 1"/>
                    <default class="red"><geom rgba="1 0 0 1"/><joint damping="2"/></default>
                </default>
                <worldbody><body name="a" childclass="red">
                    <joint name="ja"/><geom name="ga" size="0.1"/>
                    <body name="b"><geom name="gb" size="0.1"/></body>
                </body>
                <body name="c"><geom name="gc" size="0.1"/></body></worldbody>
            </mujoco>"#,
        );
        assert_eq!(tree.joint_by_name("ja").unwrap().damping(), 2.0);
        assert_eq!(tree.drawable_by_name("gb").unwrap().rgba().x, 1.0);
        assert_eq!(tree.drawable_by_name("gc").unwrap().rgba().z, 1.0);
    }

    #[test]
    fn test_strict_policy_rejects_unknown_elements() {
        let xml = r#"<mujoco><worldbody><body><gizmo/></body></worldbody></mujoco>"#;
        assert!(MjcfParser::default().parse_str(xml).is_ok());

        let strict = MjcfParser::new(ParseConfig::default().policy(SchemaPolicy::Strict));
        let err = strict.parse_str(xml).unwrap_err();
        assert!(matches!(err, MjcfError::Schema(SchemaError::UnknownElement { .. })));
    }
}
