//! URDF document to kinematic tree.
//!
//! A URDF robot is a flat list of `<link>` and `<joint>` elements. Parsing
//! collects materials, turns every link into an unattached [`Body`], reads
//! every joint as a connection between two links, and finally resolves the
//! connections into a rooted tree (see [`resolve_tree`]).
//!
//! Each child body is placed at its joint's `<origin>`; the joint frame
//! coincides with the child body frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nalgebra::Vector3;
use sim_kintree::{Body, Collider, Drawable, KinematicTree, ShapeDescriptor};
use sim_schema::{Dialect, Element, ModelCache};
use sim_types::{BodyId, InertialData, JointLimits, ParseConfig};

use crate::error::{Result, UrdfError};
use crate::materials::MaterialTable;
use crate::topology::resolve_tree;
use crate::types::{origin_pose, UrdfJoint, UrdfJointType};

/// Size used for primitives that omit their dimensions, and radius of the
/// sphere that replaces unsupported geometry.
const FALLBACK_SIZE: f64 = 0.1;

/// Turns URDF documents into kinematic trees.
///
/// # Example
///
/// ```
/// use sim_urdf::UrdfParser;
/// use sim_types::ParseConfig;
///
/// let urdf = r#"
///     <robot name="arm">
///         <link name="base"/>
///         <link name="upper"/>
///         <joint name="shoulder" type="continuous">
///             <parent link="base"/>
///             <child link="upper"/>
///             <origin xyz="0 0 0.5"/>
///             <axis xyz="0 1 0"/>
///         </joint>
///     </robot>
/// "#;
///
/// let tree = UrdfParser::new(ParseConfig::default()).parse_str(urdf).unwrap();
/// assert_eq!(tree.name(), "arm");
/// assert_eq!(tree.len(), 2);
/// assert!(tree.joint_by_name("shoulder").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct UrdfParser {
    config: ParseConfig,
}

impl UrdfParser {
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

    /// Parse URDF text.
    pub fn parse_str(&self, text: &str) -> Result<KinematicTree> {
        let document = Element::from_str_with(text, Dialect::Urdf, &self.config)?;
        self.parse_element(&document)
    }

    /// Parse a URDF file. Relative mesh paths resolve against its folder
    /// unless a working directory is configured.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<KinematicTree> {
        let document = Element::from_file(path, Dialect::Urdf, &self.config)?;
        self.parse_element(&document)
    }

    /// Parse a named document from a cache, loading it on first use.
    pub fn parse_cached(&self, cache: &mut ModelCache, name: &str) -> Result<KinematicTree> {
        let document: Arc<Element> = cache.get(Dialect::Urdf, name)?;
        self.parse_element(&document)
    }

    /// Assemble a tree from a loaded `<robot>` document.
    pub fn parse_element(&self, document: &Element) -> Result<KinematicTree> {
        if document.element_type() != "robot" {
            return Err(UrdfError::WrongDialect(document.element_type().to_string()));
        }
        self.config.validate()?;
        document.validate(self.config.policy)?;

        let tree_name = self
            .config
            .tree_name
            .clone()
            .or_else(|| document.name().map(ToString::to_string))
            .unwrap_or_else(|| "robot".to_string());

        let materials = MaterialTable::from_robot(document);
        let mut builder = RobotBuilder {
            config: &self.config,
            materials: &materials,
            source_dir: document.source_dir(),
            tree_name,
            unnamed_joints: 0,
        };

        let mut link_index: HashMap<String, usize> = HashMap::new();
        let mut bodies: Vec<Option<Body>> = Vec::new();
        let mut link_names: Vec<String> = Vec::new();
        for link in document.children_of_type("link") {
            let body = builder.build_link(link)?;
            let name = body_name(link)?;
            if link_index.insert(name.clone(), bodies.len()).is_some() {
                return Err(UrdfError::DuplicateLink(name));
            }
            link_names.push(name);
            bodies.push(Some(body));
        }

        let mut joints: Vec<UrdfJoint> = Vec::new();
        for element in document.children_of_type("joint") {
            let joint = builder.build_joint(element)?;
            if joints.iter().any(|j| j.name == joint.name) {
                return Err(UrdfError::DuplicateJoint(joint.name));
            }
            joints.push(joint);
        }

        let names: Vec<&str> = link_names.iter().map(String::as_str).collect();
        let resolved = resolve_tree(&names, &joints)?;

        let mut tree = KinematicTree::new(builder.tree_name);
        let mut ids: HashMap<&str, BodyId> = HashMap::with_capacity(names.len());

        let root = take_body(&mut bodies, &link_index, &resolved.root)?;
        ids.insert(resolved.root.as_str(), tree.add_root(root)?);

        for &index in &resolved.order {
            let joint = &joints[index];
            let parent = ids
                .get(joint.parent.as_str())
                .copied()
                .ok_or_else(|| UrdfError::undefined_link(&joint.name, &joint.parent))?;
            let child = take_body(&mut bodies, &link_index, &joint.child)?
                .with_local(joint.origin)
                .with_joint(joint.to_joint());
            ids.insert(joint.child.as_str(), tree.add_body(parent, child)?);
        }

        tracing::debug!(
            tree = %tree.name(),
            bodies = tree.len(),
            joints = tree.joint_count(),
            colliders = tree.collider_count(),
            "URDF tree assembled"
        );
        Ok(tree)
    }
}

fn body_name(link: &Element) -> Result<String> {
    link.name()
        .map(ToString::to_string)
        .ok_or_else(|| UrdfError::missing_attribute("name", "link"))
}

fn take_body(
    bodies: &mut [Option<Body>],
    link_index: &HashMap<String, usize>,
    link: &str,
) -> Result<Body> {
    link_index
        .get(link)
        .and_then(|&index| bodies[index].take())
        .ok_or_else(|| UrdfError::DisconnectedLinks(vec![link.to_string()]))
}

/// Strip URI schemes from a mesh or texture filename.
///
/// `package://pkg/meshes/a.stl` becomes `meshes/a.stl`; `file://` is
/// dropped. Anything else is returned unchanged.
#[must_use]
pub fn strip_package_prefix(filename: &str) -> &str {
    if let Some(rest) = filename.strip_prefix("package://") {
        return rest.split_once('/').map_or(rest, |(_, path)| path);
    }
    filename.strip_prefix("file://").unwrap_or(filename)
}

struct RobotBuilder<'a> {
    config: &'a ParseConfig,
    materials: &'a MaterialTable,
    source_dir: Option<&'a Path>,
    tree_name: String,
    unnamed_joints: usize,
}

impl RobotBuilder<'_> {
    fn resolve(&self, filename: &str) -> PathBuf {
        self.config
            .resolve_asset(strip_package_prefix(filename), self.source_dir)
    }

    fn build_link(&self, link: &Element) -> Result<Body> {
        let name = body_name(link)?;
        let inertia = link
            .first_child_of_type("inertial")
            .map_or_else(InertialData::default, build_inertial);
        let mut body = Body::new(name.clone()).with_inertia(inertia);

        for (i, collision) in link.children_of_type("collision").enumerate() {
            let collider_name = match collision.name() {
                Some(own) => format!("{name}_{own}"),
                None => format!("{name}_collider_{i}"),
            };
            let shape = self.shape(collision, &collider_name);
            body = body.with_collider(Collider::new(collider_name, shape));
        }

        for (i, visual) in link.children_of_type("visual").enumerate() {
            let drawable_name = match visual.name() {
                Some(own) => format!("{name}_{own}"),
                None => format!("{name}_drawable_{i}"),
            };
            let shape = self.shape(visual, &drawable_name);
            let mut drawable = Drawable::new(drawable_name, shape);
            if let Some(material) = self.materials.for_visual(visual) {
                drawable = drawable
                    .with_material(material.to_material())
                    .with_rgba(material.rgba);
                if let Some(texture) = &material.texture {
                    drawable = drawable.with_texture(self.resolve(texture).to_string_lossy());
                }
            }
            body = body.with_drawable(drawable);
        }

        Ok(body)
    }

    /// Shape of a `<collision>` or `<visual>`, placed at its `<origin>`.
    fn shape(&self, owner: &Element, owner_name: &str) -> ShapeDescriptor {
        let local = origin_pose(owner.first_child_of_type("origin"));
        let shape = match owner
            .first_child_of_type("geometry")
            .and_then(|g| g.children().first())
        {
            Some(geometry) => self.geometry(geometry, owner_name),
            None => {
                tracing::warn!(owner = owner_name, "missing geometry, using a small sphere");
                ShapeDescriptor::sphere(FALLBACK_SIZE)
            }
        };
        shape.with_local(local)
    }

    fn geometry(&self, geometry: &Element, owner_name: &str) -> ShapeDescriptor {
        match geometry.element_type() {
            "box" => ShapeDescriptor::cuboid(
                geometry.get_vec3("size", Vector3::repeat(FALLBACK_SIZE)),
            ),
            "sphere" => ShapeDescriptor::sphere(geometry.get_float("radius", FALLBACK_SIZE)),
            "cylinder" => ShapeDescriptor::cylinder(
                geometry.get_float("radius", FALLBACK_SIZE),
                geometry.get_float("length", FALLBACK_SIZE),
            ),
            "capsule" => ShapeDescriptor::capsule(
                geometry.get_float("radius", FALLBACK_SIZE),
                geometry.get_float("length", FALLBACK_SIZE),
            ),
            "mesh" => {
                let filename = geometry.get_string("filename", "");
                if filename.is_empty() {
                    tracing::warn!(owner = owner_name, "mesh without filename");
                }
                ShapeDescriptor::mesh(
                    self.resolve(&filename),
                    geometry.get_vec3("scale", Vector3::repeat(1.0)),
                )
            }
            other => {
                tracing::warn!(
                    owner = owner_name,
                    geometry = other,
                    "unsupported geometry, using a small sphere"
                );
                ShapeDescriptor::sphere(FALLBACK_SIZE)
            }
        }
    }

    fn build_joint(&mut self, element: &Element) -> Result<UrdfJoint> {
        let name = match element.name() {
            Some(name) => name.to_string(),
            None => {
                let generated = format!("{}_joint_{}", self.tree_name, self.unnamed_joints);
                self.unnamed_joints += 1;
                tracing::warn!(joint = %generated, "joint without name");
                generated
            }
        };

        let keyword = element.get_string("type", "");
        let joint_type =
            UrdfJointType::from_keyword(&keyword).ok_or_else(|| UrdfError::UnknownJointType {
                joint: name.clone(),
                joint_type: keyword.clone(),
            })?;

        let parent = link_reference(element, "parent", &name)?;
        let child = link_reference(element, "child", &name)?;

        let mut joint = UrdfJoint::new(name.clone(), joint_type, parent, child)
            .with_origin(origin_pose(element.first_child_of_type("origin")));

        if let Some(axis) = element.first_child_of_type("axis") {
            let xyz = axis.get_vec3("xyz", Vector3::x());
            if xyz.norm() < 1e-10 {
                return Err(UrdfError::invalid_attribute(
                    "xyz",
                    format!("axis of joint {name}"),
                    "axis must not be zero",
                ));
            }
            joint = joint.with_axis(xyz);
        }

        if let Some(limit) = element.first_child_of_type("limit") {
            if joint_type.accepts_limits() {
                joint = joint.with_limits(JointLimits::new(
                    limit.get_float("lower", 1.0),
                    limit.get_float("upper", -1.0),
                ));
            } else {
                tracing::debug!(joint = %name, %keyword, "limit ignored for this joint type");
            }
        }

        if let Some(dynamics) = element.first_child_of_type("dynamics") {
            joint = joint.with_damping(dynamics.get_float("damping", 0.0));
        }

        Ok(joint)
    }
}

fn link_reference(joint: &Element, role: &'static str, joint_name: &str) -> Result<String> {
    let element = joint
        .first_child_of_type(role)
        .ok_or_else(|| UrdfError::missing_element(role, format!("joint {joint_name}")))?;
    let link = element.get_string("link", "");
    if link.is_empty() {
        return Err(UrdfError::missing_attribute(
            "link",
            format!("<{role}> of joint {joint_name}"),
        ));
    }
    Ok(link)
}

fn build_inertial(inertial: &Element) -> InertialData {
    let defaults = InertialData::default();
    let mass = inertial
        .first_child_of_type("mass")
        .map_or(defaults.mass, |m| m.get_float("value", defaults.mass));

    let data = match inertial.first_child_of_type("inertia") {
        Some(tensor) => InertialData {
            mass,
            ixx: tensor.get_float("ixx", defaults.ixx),
            iyy: tensor.get_float("iyy", defaults.iyy),
            izz: tensor.get_float("izz", defaults.izz),
            ixy: tensor.get_float("ixy", 0.0),
            ixz: tensor.get_float("ixz", 0.0),
            iyz: tensor.get_float("iyz", 0.0),
            ..defaults
        },
        None => InertialData { mass, ..defaults },
    };
    data.with_frame(origin_pose(inertial.first_child_of_type("origin")))
}
