//! Modes, notifications and driver bookkeeping for the behaviour controller.
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Top-level behaviour of a companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviourMode {
    /// Standing still.
    Idle,
    /// Keeping a formation slot around the anchor.
    #[default]
    Following,
    /// Deferring to the wandering controller.
    Wandering,
    /// Chasing and striking a hostile.
    Attacking,
    /// Walking to a detected item.
    GoingToLoot,
    /// Taking a picked-up item to the delivery point.
    Carrying,
    /// Walking back inside the wander radius before wandering again.
    Returning,
    /// Terminal; the agent no longer acts.
    Dead,
}

impl BehaviourMode {
    /// Modes an owner may command directly and the controller may resume
    /// after an interruption.
    #[must_use]
    pub const fn is_resumable(self) -> bool {
        matches!(self, Self::Idle | Self::Following | Self::Wandering)
    }
}

/// Successful state changes reported to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviourEvent {
    /// The controller switched modes.
    ModeChanged {
        /// Mode left.
        from: BehaviourMode,
        /// Mode entered.
        to: BehaviourMode,
    },
    /// A carried item reached the inventory sink.
    ItemDelivered {
        /// The delivered item.
        item: EntityId,
    },
    /// An attack attempt landed.
    AttackLanded {
        /// The struck hostile.
        target: EntityId,
    },
}

/// Which controller wrote the agent's body during the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    /// Nothing moved or turned the agent.
    #[default]
    None,
    /// The wandering controller.
    Wander,
    /// The behaviour controller's own movement.
    Behaviour,
}
