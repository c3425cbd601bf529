//! In-process record of reactions, keyed by trigger.
//!
//! Gates duplicate submissions for a trigger that is re-delivered (typically
//! after a reconnect). Nothing is persisted; a restart starts empty.

use alloy::primitives::B256;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::responder::types::{ReactionStatus, ReactionTx};

struct Record {
    reaction: ReactionTx,
    updated: Instant,
}

/// A thread-safe map of trigger → latest reaction.
pub struct ReactionLedger {
    entries: DashMap<B256, Record>,
    /// How long settled reactions are remembered.
    retention: Duration,
}

impl ReactionLedger {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
        }
    }

    /// Record `reaction` as in flight unless its trigger is already pending
    /// or confirmed.
    ///
    /// A trigger whose last reaction failed may be claimed again. On
    /// conflict the existing status is returned.
    pub fn try_claim(&self, reaction: ReactionTx) -> Result<(), ReactionStatus> {
        self.prune();

        match self.entries.entry(reaction.target) {
            Entry::Occupied(mut occupied) => {
                if matches!(occupied.get().reaction.status, ReactionStatus::Failed(_)) {
                    occupied.insert(Record {
                        reaction,
                        updated: Instant::now(),
                    });
                    Ok(())
                } else {
                    Err(occupied.get().reaction.status.clone())
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Record {
                    reaction,
                    updated: Instant::now(),
                });
                Ok(())
            }
        }
    }

    /// Store the latest state of a claimed reaction.
    pub fn update(&self, reaction: &ReactionTx) {
        self.entries.insert(
            reaction.target,
            Record {
                reaction: reaction.clone(),
                updated: Instant::now(),
            },
        );
    }

    pub fn get(&self, target: &B256) -> Option<ReactionTx> {
        self.entries.get(target).map(|r| r.reaction.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of (pending, confirmed, failed) reactions.
    pub fn summary(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for r in self.entries.iter() {
            match r.reaction.status {
                ReactionStatus::Pending => counts.0 += 1,
                ReactionStatus::Confirmed { .. } => counts.1 += 1,
                ReactionStatus::Failed(_) => counts.2 += 1,
            }
        }
        counts
    }

    /// Drop settled reactions older than the retention window.
    pub fn prune(&self) {
        let retention = self.retention;
        self.entries
            .retain(|_, r| !r.reaction.status.is_settled() || r.updated.elapsed() < retention);
    }
}
