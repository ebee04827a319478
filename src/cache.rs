// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local cache of last-known bulb state.
//!
//! The cache holds the authoritative in-memory picture of the account's
//! bulbs. A full listing over the `all` selector replaces the cache
//! wholesale; every other successful command merges its per-bulb results
//! into the existing records field by field, so extended data from the
//! last listing survives command-only updates.

use crate::command::CommandKind;
use crate::response::{Bulb, Response};
use crate::state::SELECTOR_ALL;

/// What [`BulbCache::reconcile`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The cache was replaced with a fresh full listing.
    Replaced,
    /// The response was merged into the existing records.
    Merged,
    /// A response bulb was not in the cache: the local picture no longer
    /// matches the server and a full refresh is needed.
    Diverged,
}

/// Ordered collection of known bulbs.
#[derive(Debug, Default)]
pub struct BulbCache {
    bulbs: Vec<Bulb>,
}

impl BulbCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot copy of the cached bulbs.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Bulb> {
        self.bulbs.clone()
    }

    /// Returns the number of cached bulbs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bulbs.len()
    }

    /// Returns `true` when no bulbs are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bulbs.is_empty()
    }

    /// Removes every cached bulb.
    pub fn clear(&mut self) {
        self.bulbs.clear();
    }

    /// Reconciles a successful command response into the cache.
    ///
    /// A `ListLights` over the `all` selector replaces the cache with the
    /// response's bulb list. Anything else merges per bulb; the first
    /// response bulb whose id is not cached aborts the merge with
    /// [`Reconciliation::Diverged`], signalling the caller to run a full
    /// refresh.
    pub fn reconcile(&mut self, kind: CommandKind, response: &Response) -> Reconciliation {
        let is_full_listing = kind == CommandKind::ListLights
            && response
                .operations
                .first()
                .is_some_and(|op| op.state.selector().eq_ignore_ascii_case(SELECTOR_ALL));

        if is_full_listing {
            self.bulbs.clear();
            if let Some(op) = response.operations.first() {
                self.bulbs.extend(op.bulbs.iter().cloned());
            }
            tracing::debug!(count = self.bulbs.len(), "replaced bulb cache from listing");
            return Reconciliation::Replaced;
        }

        for operation in &response.operations {
            for result in &operation.bulbs {
                let Some(cached) = self.bulbs.iter_mut().find(|b| b.id() == result.id())
                else {
                    tracing::warn!(
                        id = result.id(),
                        "response bulb not in cache, full refresh needed"
                    );
                    return Reconciliation::Diverged;
                };
                cached.apply_state(
                    &operation.state,
                    result.id(),
                    result.label(),
                    result.status(),
                );
            }
        }
        Reconciliation::Merged
    }
}
