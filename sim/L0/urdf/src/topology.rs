//! Link graph resolution.
//!
//! URDF lists links and joints flat; each joint names a parent and a child
//! link. [`resolve_tree`] checks that these connections form exactly one
//! rooted tree and returns the joints in the order their child links can be
//! attached: every joint comes after the joint that attaches its parent.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Result, UrdfError};
use crate::types::UrdfJoint;

/// A rooted link tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTree {
    /// Name of the root link.
    pub root: String,
    /// Joint indices in attachment order (breadth-first from the root,
    /// declaration order among siblings).
    pub order: Vec<usize>,
}

/// Resolve the link graph into a single rooted tree.
///
/// `links` are the declared link names in document order.
///
/// # Errors
///
/// - [`UrdfError::UndefinedLink`] if a joint names an undeclared link
/// - [`UrdfError::MultipleParents`] if a link is the child of two joints
/// - [`UrdfError::NoRootLink`] if every link has a parent
/// - [`UrdfError::MultipleRootLinks`] if more than one link has none
/// - [`UrdfError::KinematicLoop`] if some joints are unreachable from the root
/// - [`UrdfError::DisconnectedLinks`] if some links are never attached
pub fn resolve_tree(links: &[&str], joints: &[UrdfJoint]) -> Result<ResolvedTree> {
    let declared: HashSet<&str> = links.iter().copied().collect();

    let mut parent_joint: HashMap<&str, &str> = HashMap::with_capacity(joints.len());
    for joint in joints {
        for link in [&joint.parent, &joint.child] {
            if !declared.contains(link.as_str()) {
                return Err(UrdfError::undefined_link(&joint.name, link));
            }
        }
        if let Some(first) = parent_joint.insert(&joint.child, &joint.name) {
            return Err(UrdfError::MultipleParents {
                link: joint.child.clone(),
                first: first.to_string(),
                second: joint.name.clone(),
            });
        }
    }

    let roots: Vec<&str> = links
        .iter()
        .copied()
        .filter(|link| !parent_joint.contains_key(link))
        .collect();
    let root = match roots.as_slice() {
        [] => return Err(UrdfError::NoRootLink),
        [root] => *root,
        _ => {
            return Err(UrdfError::MultipleRootLinks(
                roots.iter().map(ToString::to_string).collect(),
            ))
        }
    };

    let mut order = Vec::with_capacity(joints.len());
    let mut attached: HashSet<&str> = HashSet::with_capacity(links.len());
    attached.insert(root);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for (index, joint) in joints.iter().enumerate() {
            if joint.parent == current && attached.insert(&joint.child) {
                order.push(index);
                queue.push_back(&joint.child);
            }
        }
    }

    if order.len() < joints.len() {
        let reached: HashSet<usize> = order.iter().copied().collect();
        let cycle = joints
            .iter()
            .enumerate()
            .filter(|(index, _)| !reached.contains(index))
            .map(|(_, joint)| joint.name.clone())
            .collect();
        return Err(UrdfError::KinematicLoop(cycle));
    }

    if attached.len() < links.len() {
        let disconnected = links
            .iter()
            .filter(|link| !attached.contains(*link))
            .map(ToString::to_string)
            .collect();
        return Err(UrdfError::DisconnectedLinks(disconnected));
    }

    tracing::debug!(root, joints = order.len(), "link graph resolved");
    Ok(ResolvedTree {
        root: root.to_string(),
        order,
    })
}
