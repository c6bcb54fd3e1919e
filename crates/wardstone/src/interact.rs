//! The per-actor interaction state machine.
//!
//! "Click a block to act on it" flows are modeled as a value-typed pending
//! request keyed by actor identity, not a captured callback. An actor has at
//! most one outstanding request; a new request displaces the stale one, and
//! disconnect or a mismatched target cancels without mutating anything. The
//! host delivers every resource interaction to one dispatch point
//! ([`ProtectionService::handle_interaction`](crate::ProtectionService::handle_interaction)),
//! which checks pending state before falling back to a plain access decision.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use wardstone_core::{AccessLevel, Coordinate, Protection, ProtectionRole, RoleSource};

use crate::service::ProtectionInfo;

/// The operation an actor has requested and is about to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Protect the next clicked resource.
    Create,
    /// Remove the protection on the next clicked resource.
    Remove,
    /// Describe the protection on the next clicked resource.
    Info,
    /// Grant a role on the next clicked protection.
    AddRole(ProtectionRole),
    /// Revoke a role on the next clicked protection.
    RemoveRole(RoleSource),
}

/// One outstanding request.
#[derive(Debug, Clone)]
struct PendingRequest {
    action: PendingAction,
    requested_at: i64,
}

/// Pending interaction requests keyed by actor.
///
/// An indefinitely pending request is harmless; it resolves on the actor's
/// next interaction or disconnect. No timeout is kept.
#[derive(Default)]
pub(crate) struct InteractionTracker {
    pending: Mutex<HashMap<Uuid, PendingRequest>>,
}

impl InteractionTracker {
    /// Register a request, displacing any stale one for the same actor.
    /// Returns the displaced action, if there was one.
    pub fn begin(&self, actor: Uuid, action: PendingAction, now: i64) -> Option<PendingAction> {
        self.pending
            .lock()
            .unwrap()
            .insert(
                actor,
                PendingRequest {
                    action,
                    requested_at: now,
                },
            )
            .map(|old| old.action)
    }

    /// Consume the pending request for an actor, if any.
    pub fn take(&self, actor: Uuid) -> Option<PendingAction> {
        self.pending.lock().unwrap().remove(&actor).map(|r| r.action)
    }

    /// Drop the pending request without acting on it (actor disconnect).
    pub fn cancel(&self, actor: Uuid) -> bool {
        self.pending.lock().unwrap().remove(&actor).is_some()
    }

    /// Whether the actor has an outstanding request.
    pub fn is_pending(&self, actor: Uuid) -> bool {
        self.pending.lock().unwrap().contains_key(&actor)
    }

    /// When the actor's outstanding request was made, if any.
    pub fn pending_since(&self, actor: Uuid) -> Option<i64> {
        self.pending
            .lock()
            .unwrap()
            .get(&actor)
            .map(|r| r.requested_at)
    }
}

/// The result of dispatching one resource interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// A pending action completed against the clicked target.
    Applied(AppliedAction),
    /// A pending action was discarded: the target was non-protectable or
    /// mismatched. No mutation happened.
    Cancelled,
    /// No action was pending; this is a plain access decision for the
    /// interaction. `None` means the coordinate is unprotected.
    Decision(Option<AccessLevel>),
}

/// What a completed pending action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedAction {
    Created(Protection),
    Removed(Coordinate),
    Described(ProtectionInfo),
    RoleAdded(Protection),
    RoleRemoved(Protection),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_displaces_stale_one() {
        let tracker = InteractionTracker::default();
        let actor = Uuid::new_v4();

        assert!(tracker.begin(actor, PendingAction::Create, 1000).is_none());
        let displaced = tracker.begin(actor, PendingAction::Info, 1001);
        assert_eq!(displaced, Some(PendingAction::Create));

        assert_eq!(tracker.take(actor), Some(PendingAction::Info));
        assert_eq!(tracker.take(actor), None);
    }

    #[test]
    fn one_pending_request_per_actor() {
        let tracker = InteractionTracker::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        tracker.begin(a, PendingAction::Create, 1000);
        tracker.begin(b, PendingAction::Remove, 1000);

        assert_eq!(tracker.take(a), Some(PendingAction::Create));
        assert_eq!(tracker.take(b), Some(PendingAction::Remove));
    }

    #[test]
    fn cancel_discards_without_acting() {
        let tracker = InteractionTracker::default();
        let actor = Uuid::new_v4();

        tracker.begin(actor, PendingAction::Remove, 1000);
        assert!(tracker.is_pending(actor));
        assert!(tracker.cancel(actor));
        assert!(!tracker.is_pending(actor));
        assert!(!tracker.cancel(actor));
    }

    #[test]
    fn pending_since_reports_request_time() {
        let tracker = InteractionTracker::default();
        let actor = Uuid::new_v4();

        assert_eq!(tracker.pending_since(actor), None);
        tracker.begin(actor, PendingAction::Info, 1234);
        assert_eq!(tracker.pending_since(actor), Some(1234));
    }
}
