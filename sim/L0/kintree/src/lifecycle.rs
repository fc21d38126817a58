//! Lifecycle protocol and adapter slots.
//!
//! Every simulable entity moves through the same states:
//!
//! ```text
//! Uninitialized --initialize--> Initialized --pre_step/post_step--> Initialized
//!                                    |  ^
//!                              reset |  | (pose restored to its initialize-time value)
//!                                    v  |
//!                                 Initialized
//! ```
//!
//! `detach_sim`/`detach_viz` release the backend binding without changing
//! the state; the entity stays valid and may be bound to a new backend.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use sim_types::Pose;

use crate::adapter::Adapter;

/// Where an entity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Created, not yet initialized.
    #[default]
    Uninitialized,
    /// Initialized; steps and resets are allowed.
    Initialized,
}

/// Operations every simulable entity supports.
///
/// Entities stored inside a tree do not keep a pointer to their parent, so
/// the parent's world pose is passed in wherever it is needed.
pub trait Lifecycle {
    /// Entity name.
    fn name(&self) -> &str;

    /// Current world pose.
    fn transform(&self) -> &Pose;

    /// Current lifecycle state.
    fn state(&self) -> LifecycleState;

    /// Compute the world pose from `parent`, record it as the initial pose
    /// and notify the adapter.
    fn initialize(&mut self, parent: &Pose);

    /// Push core state to the adapter before a backend step.
    fn pre_step(&mut self);

    /// Pull state from the adapter after a backend step, or recompute it
    /// from `parent` when there is none.
    fn post_step(&mut self, parent: &Pose);

    /// Restore the initialize-time state.
    fn reset(&mut self, parent: &Pose);

    /// Release the physics binding.
    fn detach_sim(&mut self);

    /// Release the visualizer binding.
    fn detach_viz(&mut self);
}

/// Non-owning reference to an adapter.
///
/// Every access re-checks that the backend still holds the adapter; a
/// dropped adapter makes the slot behave as if nothing were attached.
pub struct AdapterSlot<A: ?Sized + Adapter> {
    adapter: Option<Weak<RefCell<A>>>,
}

impl<A: ?Sized + Adapter> Default for AdapterSlot<A> {
    fn default() -> Self {
        Self { adapter: None }
    }
}

impl<A: ?Sized + Adapter> Clone for AdapterSlot<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
        }
    }
}

impl<A: ?Sized + Adapter> std::fmt::Debug for AdapterSlot<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl<A: ?Sized + Adapter> AdapterSlot<A> {
    /// An empty slot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind an adapter, replacing any previous binding without notifying it.
    pub fn attach(&mut self, adapter: &Rc<RefCell<A>>) {
        self.adapter = Some(Rc::downgrade(adapter));
    }

    /// Whether a live adapter is bound.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.adapter
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Run `f` against the adapter if one is bound and alive.
    ///
    /// Returns `None` without calling `f` when the slot is empty, the
    /// adapter was dropped, or it is already borrowed.
    pub fn with<R>(&self, f: impl FnOnce(&mut A) -> R) -> Option<R> {
        let adapter = self.adapter.as_ref()?.upgrade()?;
        let Ok(mut guard) = adapter.try_borrow_mut() else {
            tracing::warn!("adapter is busy, call skipped");
            return None;
        };
        Some(f(&mut guard))
    }

    /// Read from the adapter if one is bound and alive.
    pub fn read<R>(&self, f: impl FnOnce(&A) -> R) -> Option<R> {
        let adapter = self.adapter.as_ref()?.upgrade()?;
        let guard = adapter.try_borrow().ok()?;
        Some(f(&guard))
    }

    /// Notify the adapter and clear the slot.
    ///
    /// Safe to call on an empty slot or after the adapter was dropped.
    /// Returns whether a live adapter was notified.
    pub fn detach(&mut self) -> bool {
        let Some(weak) = self.adapter.take() else {
            return false;
        };
        match weak.upgrade() {
            Some(adapter) => match adapter.try_borrow_mut() {
                Ok(mut guard) => {
                    guard.on_detach();
                    true
                }
                Err(_) => {
                    tracing::warn!("adapter is busy, detached without notification");
                    false
                }
            },
            None => false,
        }
    }
}
