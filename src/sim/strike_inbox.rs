//! Buffered strikes awaiting resolution.

use bevy::prelude::Resource;

use crate::entity::EntityId;

/// One landed attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    /// Creature that attacked.
    pub attacker: EntityId,
    /// Creature that was hit.
    pub target: EntityId,
    /// Hit points to remove.
    pub damage: u32,
}

/// Strikes landed this tick, applied by the resolution system.
#[derive(Resource, Debug, Default)]
pub struct StrikeInbox {
    strikes: Vec<Strike>,
}

impl StrikeInbox {
    /// Queues a strike.
    pub fn push(&mut self, strike: Strike) {
        self.strikes.push(strike);
    }

    /// Removes and yields every queued strike.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Strike> {
        self.strikes.drain(..)
    }

    /// Whether no strikes are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strike(target: u64, damage: u32) -> Strike {
        Strike {
            attacker: EntityId(1),
            target: EntityId(target),
            damage,
        }
    }

    #[rstest]
    fn drain_empties_inbox_in_order() {
        let mut inbox = StrikeInbox::default();
        assert!(inbox.is_empty());
        inbox.push(strike(2, 5));
        inbox.push(strike(3, 7));
        let drained: Vec<_> = inbox.drain().collect();
        assert_eq!(drained, vec![strike(2, 5), strike(3, 7)]);
        assert!(inbox.is_empty());
    }
}
