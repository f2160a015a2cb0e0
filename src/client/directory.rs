// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-through cache over the admin member roster.
//!
//! The roster is fetched on first use and served from memory afterwards.
//! Mutations made through the directory invalidate it; anything else must
//! call [`MemberDirectory::invalidate`].

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{ClientError, GymClient, MemberQuery};
use crate::models::MemberResponse;
use crate::services::AdminMemberUpdate;

/// Where the cached roster stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    /// Nothing fetched, or invalidated since
    #[default]
    Idle,
    Loading,
    Loaded(Vec<MemberResponse>),
    /// Last fetch failed; the next read retries
    Error(String),
}

/// Cached view of `GET /members` for an admin client.
pub struct MemberDirectory {
    client: GymClient,
    state: RwLock<LoadState>,
    /// Serialises fetches so concurrent readers share one request
    fetch: Mutex<()>,
    /// Bumped on every invalidation, under the `state` write lock. A fetch
    /// only publishes its result if no invalidation happened meanwhile.
    generation: AtomicU64,
}

impl MemberDirectory {
    pub fn new(client: GymClient) -> Self {
        Self {
            client,
            state: RwLock::new(LoadState::Idle),
            fetch: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current state, without fetching.
    pub async fn state(&self) -> LoadState {
        self.state.read().await.clone()
    }

    /// The roster, fetched only if not already loaded.
    pub async fn members(&self) -> Result<Vec<MemberResponse>, ClientError> {
        if let LoadState::Loaded(members) = &*self.state.read().await {
            return Ok(members.clone());
        }

        let _fetching = self.fetch.lock().await;

        // Another caller may have loaded it while we waited.
        if let LoadState::Loaded(members) = &*self.state.read().await {
            return Ok(members.clone());
        }

        let started_at = {
            let mut state = self.state.write().await;
            *state = LoadState::Loading;
            self.generation.load(Ordering::SeqCst)
        };

        let result = self.client.list_members(&MemberQuery::default()).await;

        let mut state = self.state.write().await;
        let current = self.generation.load(Ordering::SeqCst) == started_at;
        match result {
            Ok(members) => {
                if current {
                    *state = LoadState::Loaded(members.clone());
                } else {
                    tracing::debug!("Member directory invalidated during fetch; not caching");
                }
                Ok(members)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load member directory");
                if current {
                    *state = LoadState::Error(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Forget the cached roster; the next read refetches.
    ///
    /// A fetch already in flight still returns its roster to its caller but
    /// does not repopulate the cache.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = LoadState::Idle;
    }

    /// Update a member and invalidate the cache.
    pub async fn update_member(
        &self,
        id: Uuid,
        update: &AdminMemberUpdate,
    ) -> Result<MemberResponse, ClientError> {
        let result = self.client.update_member(id, update).await;
        self.invalidate().await;
        result
    }

    /// Delete a member and invalidate the cache.
    pub async fn delete_member(&self, id: Uuid) -> Result<(), ClientError> {
        let result = self.client.delete_member(id).await;
        self.invalidate().await;
        result
    }
}
