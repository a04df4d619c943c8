/// Events recorded by committed operations.
///
/// Each instruction module defines the `#[event]` it produces. The store keeps them in an
/// [`EventLog`]; forwarding them to a ledger or indexer is up to the host.
use crate::instructions::collect::FeesCollected;
use crate::instructions::collect_protocol_fees::ProtocolFeesCollected;
use crate::instructions::initialize_pool::PoolInitialized;
use crate::instructions::initialize_reward::RewardConfigured;
use crate::instructions::modify_position::LiquidityChanged;
use crate::instructions::swap::SwapExecuted;
use anchor_lang::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    PoolInitialized(PoolInitialized),
    LiquidityChanged(LiquidityChanged),
    SwapExecuted(SwapExecuted),
    FeesCollected(FeesCollected),
    ProtocolFeesCollected(ProtocolFeesCollected),
    RewardConfigured(RewardConfigured),
}

impl PoolEvent {
    /// Discriminator-prefixed Borsh encoding, as a program log would carry it.
    pub fn data(&self) -> Vec<u8> {
        match self {
            PoolEvent::PoolInitialized(event) => event.data(),
            PoolEvent::LiquidityChanged(event) => event.data(),
            PoolEvent::SwapExecuted(event) => event.data(),
            PoolEvent::FeesCollected(event) => event.data(),
            PoolEvent::ProtocolFeesCollected(event) => event.data(),
            PoolEvent::RewardConfigured(event) => event.data(),
        }
    }
}

/// Append-only record of committed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = PoolEvent>) {
        self.events.extend(events);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolEvent> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&PoolEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Takes every recorded event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }
}
