//! Caller-supplied edit identity.
//!
//! Every changeset is stamped with an *event*: an opaque token naming the
//! replica/session/edit that produced it. The CRDT needs exactly three
//! things from it — a total order (the sibling tie-break), a stable string
//! form (wire encoding and serialization keys), and the reverse parse.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// The identity and ordering contract for edit events.
///
/// Contract (must hold on every replica, or convergence is lost):
/// - `precedence` is a pure total order, consistent across replicas.
/// - `encode` / `decode` round-trip, and two events are `==` exactly when
///   their encodings are equal.
///
/// `precedence` decides where concurrent siblings land: among nodes
/// inserted after the same predecessor, the event comparing [`Ordering::Less`]
/// is emitted first in traversal.
pub trait Event: Clone + Eq + Hash + fmt::Debug {
    fn precedence(&self, other: &Self) -> Ordering;

    /// Stable string representation, used on the wire.
    fn encode(&self) -> String;

    /// Parse the representation produced by [`Event::encode`].
    fn decode(encoded: &str) -> Result<Self, EventDecodeError>
    where
        Self: Sized;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    #[error("malformed event string: {0:?}")]
    Malformed(String),
}

// ── ReplicaEvent ──────────────────────────────────────────────────────────

/// The stock event type: a per-replica edit counter.
///
/// Precedence ranks the *higher* `seq` first, so a later edit lands
/// adjacent to its causal predecessor, ahead of siblings from earlier
/// edits. That is what makes an insertion "at index 3" still read at
/// index 3 after traversal. Ties (concurrent edits with equal counters)
/// fall back to the replica name.
///
/// Encoded as `"{seq}@{replica}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplicaEvent {
    pub seq: u64,
    pub replica: String,
}

impl ReplicaEvent {
    pub fn new(seq: u64, replica: impl Into<String>) -> Self {
        Self {
            seq,
            replica: replica.into(),
        }
    }

    /// The next edit event of the same replica.
    pub fn next(&self) -> Self {
        Self {
            seq: self.seq + 1,
            replica: self.replica.clone(),
        }
    }
}

impl fmt::Display for ReplicaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.seq, self.replica)
    }
}

impl Event for ReplicaEvent {
    fn precedence(&self, other: &Self) -> Ordering {
        other
            .seq
            .cmp(&self.seq)
            .then_with(|| self.replica.cmp(&other.replica))
    }

    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(encoded: &str) -> Result<Self, EventDecodeError> {
        let malformed = || EventDecodeError::Malformed(encoded.to_string());
        let (seq, replica) = encoded.split_once('@').ok_or_else(malformed)?;
        if replica.is_empty() {
            return Err(malformed());
        }
        let seq = seq.parse::<u64>().map_err(|_| malformed())?;
        Ok(Self {
            seq,
            replica: replica.to_string(),
        })
    }
}
