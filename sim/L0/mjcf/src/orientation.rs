//! Frame resolution for MJCF elements.
//!
//! Positions come from `pos`. Orientations may be written five ways; when
//! several are present the first of `euler`, `axisangle`, `xyaxes`, `zaxis`,
//! `quat` wins. Quaternions are `(w, x, y, z)`.

use nalgebra::{Matrix3, Point3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3, Vector4};
use sim_kintree::shape::shortest_arc;
use sim_schema::Element;
use sim_types::Pose;

use crate::compiler::CompilerSettings;

/// Attributes that together describe one orientation.
///
/// A default class contributes none of them to an element that already
/// declares any one.
pub const ORIENTATION_ATTRIBUTES: [&str; 6] =
    ["quat", "euler", "axisangle", "xyaxes", "zaxis", "fromto"];

const EPSILON: f64 = 1e-10;

/// Convert an MJCF quaternion `[w, x, y, z]` to a `UnitQuaternion`.
#[must_use]
pub fn quat_from_wxyz(q: Vector4<f64>) -> UnitQuaternion<f64> {
    let quat = Quaternion::new(q[0], q[1], q[2], q[3]);
    if quat.norm() < EPSILON {
        tracing::warn!("zero quaternion, using identity");
        return UnitQuaternion::identity();
    }
    UnitQuaternion::from_quaternion(quat)
}

/// Convert euler angles (radians) to a rotation using a rotation sequence.
///
/// Lowercase letters are intrinsic (body-fixed) rotations and post-multiply,
/// uppercase letters are extrinsic (space-fixed) and pre-multiply:
/// `"xyz"` gives `Rx * Ry * Rz`, `"XYZ"` gives `Rz * Ry * Rx`.
#[must_use]
pub fn euler_seq_to_quat(euler_rad: Vector3<f64>, seq: &str) -> UnitQuaternion<f64> {
    let mut q = UnitQuaternion::identity();
    for (i, ch) in seq.chars().take(3).enumerate() {
        let axis = match ch.to_ascii_lowercase() {
            'x' => Vector3::x_axis(),
            'y' => Vector3::y_axis(),
            _ => Vector3::z_axis(),
        };
        let r = UnitQuaternion::from_axis_angle(&axis, euler_rad[i]);
        if ch.is_ascii_lowercase() {
            q *= r;
        } else {
            q = r * q;
        }
    }
    q
}

/// Rotation whose columns are the orthonormalized `x` and `y` axes.
fn from_xyaxes(xy: &[f64]) -> UnitQuaternion<f64> {
    let x = Vector3::new(xy[0], xy[1], xy[2]);
    if x.norm() < EPSILON {
        return UnitQuaternion::identity();
    }
    let x = x.normalize();

    let y = Vector3::new(xy[3], xy[4], xy[5]);
    let y = y - x * x.dot(&y);
    if y.norm() < EPSILON {
        return UnitQuaternion::identity();
    }
    let y = y.normalize();

    let rot = Matrix3::from_columns(&[x, y, x.cross(&y)]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rot))
}

/// Orientation declared on an element, identity if none is.
#[must_use]
pub fn element_rotation(element: &Element, settings: &CompilerSettings) -> UnitQuaternion<f64> {
    if element.has_attribute("euler") {
        let euler = element.get_vec3("euler", Vector3::zeros());
        let euler = euler.map(|a| settings.to_radians(a));
        return euler_seq_to_quat(euler, &settings.eulerseq);
    }

    if element.has_attribute("axisangle") {
        let aa = element.get_vec4("axisangle", Vector4::new(0.0, 0.0, 1.0, 0.0));
        let axis = aa.xyz();
        if axis.norm() < EPSILON {
            return UnitQuaternion::identity();
        }
        return UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), settings.to_radians(aa.w));
    }

    let xyaxes = element.get_float_array("xyaxes", &[]);
    if xyaxes.len() == 6 {
        return from_xyaxes(&xyaxes);
    }

    if element.has_attribute("zaxis") {
        let zaxis = element.get_vec3("zaxis", Vector3::z());
        return shortest_arc(&Vector3::z(), &zaxis);
    }

    if element.has_attribute("quat") {
        return quat_from_wxyz(element.get_vec4("quat", Vector4::new(1.0, 0.0, 0.0, 0.0)));
    }

    UnitQuaternion::identity()
}

/// Pose declared by `pos` and the orientation attributes.
///
/// `fromto` is not considered here; segment shapes are handled by
/// [`sim_kintree::shape::normalize_segment`].
#[must_use]
pub fn element_pose(element: &Element, settings: &CompilerSettings) -> Pose {
    let pos = element.get_vec3("pos", Vector3::zeros());
    Pose::from_position_rotation(Point3::from(pos), element_rotation(element, settings))
}

/// The `fromto` endpoints of an element, if six numbers are given.
#[must_use]
pub fn element_segment(element: &Element) -> Option<(Point3<f64>, Point3<f64>)> {
    let v = element.get_float_array("fromto", &[]);
    (v.len() == 6).then(|| {
        (
            Point3::new(v[0], v[1], v[2]),
            Point3::new(v[3], v[4], v[5]),
        )
    })
}
