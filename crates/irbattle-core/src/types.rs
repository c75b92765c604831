//! Fundamental time and signal types.

use serde::{Deserialize, Serialize};

use crate::enums::Protocol;

/// Control-loop time tracking. All scheduling in the controller is driven
/// from this clock; one tick per loop iteration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoopTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed controller time in milliseconds.
    pub now_ms: u64,
}

impl LoopTime {
    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.now_ms += crate::constants::TICK_MS;
    }
}

/// Set of protocols a captured signal decodes as. A single raw capture can
/// legitimately match more than one protocol: the Tamiya 2-shot kill code is
/// a superset encoding of the plain Tamiya code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSet(u16);

impl ProtocolSet {
    pub const EMPTY: ProtocolSet = ProtocolSet(0);

    fn bit(protocol: Protocol) -> u16 {
        1 << (protocol as u16)
    }

    pub fn single(protocol: Protocol) -> ProtocolSet {
        ProtocolSet(Self::bit(protocol))
    }

    pub fn insert(&mut self, protocol: Protocol) {
        self.0 |= Self::bit(protocol);
    }

    pub fn with(mut self, protocol: Protocol) -> ProtocolSet {
        self.insert(protocol);
        self
    }

    pub fn contains(&self, protocol: Protocol) -> bool {
        self.0 & Self::bit(protocol) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Protocol> for ProtocolSet {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        let mut set = ProtocolSet::EMPTY;
        for p in iter {
            set.insert(p);
        }
        set
    }
}

/// A decoded infrared capture delivered by the receiver: the set of
/// protocols the raw signal decodes as, plus the payload value (team number
/// for protocols that carry one, zero otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCapture {
    pub candidates: ProtocolSet,
    pub value: u16,
}

impl SignalCapture {
    pub fn new(protocol: Protocol) -> SignalCapture {
        SignalCapture {
            candidates: ProtocolSet::single(protocol),
            value: 0,
        }
    }

    pub fn with_value(protocol: Protocol, value: u16) -> SignalCapture {
        SignalCapture {
            candidates: ProtocolSet::single(protocol),
            value,
        }
    }

    /// Whether this capture decodes as the given protocol.
    pub fn decodes_as(&self, protocol: Protocol) -> bool {
        self.candidates.contains(protocol)
    }
}
