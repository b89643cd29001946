//! Cart mode selection and migration of local lines into the remote cart.
//!
//! # Modes
//!
//! The active set is a function of two facts:
//!
//! | session | pending local lines | mode |
//! |---|---|---|
//! | no | any | [`CartMode::Local`] |
//! | yes | no | [`CartMode::Remote`] |
//! | yes | yes | [`CartMode::Migrating`] |
//!
//! # Migration
//!
//! 1. Build a [`MigrationPlan`]: one remote add per local line, in order,
//!    keeping quantity and variants but not prices
//! 2. Execute the steps one at a time, waiting for each
//! 3. Stop at the first failure; the local set stays intact
//! 4. On full success the caller clears the local set and reloads remote
//!
//! Retrying after a partial failure replays every step again. Steps that had
//! already succeeded are added twice unless the remote service merges by triple.

use crate::{remote::AddLineRequest, CartLine, Origin};
use serde::{Deserialize, Serialize};

/// Which cart set the store works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CartMode {
    /// No session: read and write browser storage
    Local,
    /// Session present, nothing left to migrate
    Remote,
    /// Session present and local lines waiting to be replayed
    Migrating,
}

impl CartMode {
    pub fn of(has_session: bool, has_pending_local: bool) -> Self {
        match (has_session, has_pending_local) {
            (false, _) => CartMode::Local,
            (true, false) => CartMode::Remote,
            (true, true) => CartMode::Migrating,
        }
    }

    /// The set that operations are dispatched to in this mode.
    pub fn active_set(&self) -> Origin {
        match self {
            CartMode::Local => Origin::Local,
            CartMode::Remote | CartMode::Migrating => Origin::Remote,
        }
    }
}

/// Ordered remote adds replaying a local cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub steps: Vec<AddLineRequest>,
}

impl MigrationPlan {
    /// Plan the replay of `lines`, preserving their order.
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let steps = lines
            .iter()
            .map(|line| AddLineRequest {
                product_id: line.product_id().clone(),
                quantity: line.quantity(),
                color_id: line.key().color_id,
                storage_id: line.key().storage_id,
            })
            .collect();
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AddLineRequest)> {
        self.steps.iter().enumerate()
    }

    /// Start tracking execution of this plan.
    pub fn progress(&self) -> MigrationProgress {
        MigrationProgress {
            total: self.steps.len(),
            migrated: 0,
            failure: None,
        }
    }
}

/// Execution state of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationProgress {
    total: usize,
    migrated: usize,
    failure: Option<(usize, String)>,
}

impl MigrationProgress {
    pub fn record_success(&mut self) {
        if self.failure.is_none() {
            self.migrated += 1;
        }
    }

    /// Record the failure of step `index`. Only the first failure is kept.
    pub fn record_failure(&mut self, index: usize, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some((index, reason.into()));
        }
    }

    /// Whether the caller should stop issuing steps.
    pub fn is_aborted(&self) -> bool {
        self.failure.is_some()
    }

    pub fn migrated(&self) -> usize {
        self.migrated
    }

    pub fn outcome(self) -> MigrationOutcome {
        match self.failure {
            None if self.migrated == self.total => MigrationOutcome::Completed {
                migrated: self.migrated,
            },
            None => MigrationOutcome::Aborted {
                migrated: self.migrated,
                failed_at: self.migrated,
                reason: "migration stopped before every step ran".to_string(),
            },
            Some((failed_at, reason)) => MigrationOutcome::Aborted {
                migrated: self.migrated,
                failed_at,
                reason,
            },
        }
    }
}

/// Final result of a migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MigrationOutcome {
    /// Every step succeeded; the local set may be cleared
    Completed { migrated: usize },
    /// A step failed; the local set must be kept
    #[serde(rename_all = "camelCase")]
    Aborted {
        migrated: usize,
        failed_at: usize,
        reason: String,
    },
}

impl MigrationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, MigrationOutcome::Completed { .. })
    }
}
