//! Write tracking.
//!
//! A [`Mutation`] wraps one write operation: it refuses a second submission
//! while the first is pending, records the outcome and on success
//! invalidates the query prefixes the write affects. Writes are never
//! retried.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cache::{QueryCache, QueryKey};
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Success,
    /// User-facing message of the failure.
    Error(String),
}

#[derive(Debug, Default)]
pub struct Mutation {
    state: Mutex<MutationState>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutationState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// What a UI checks to disable the triggering control.
    pub fn is_pending(&self) -> bool {
        self.state() == MutationState::Pending
    }

    pub fn reset(&self) {
        self.set(MutationState::Idle);
    }

    fn set(&self, next: MutationState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Run `write`, then invalidate `invalidates` if it succeeded.
    pub async fn run<T, Fut>(
        &self,
        cache: &QueryCache,
        invalidates: &[QueryKey],
        write: Fut,
    ) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == MutationState::Pending {
                return Err(ClientError::MutationPending);
            }
            *state = MutationState::Pending;
        }
        let guard = PendingGuard { mutation: self, armed: true };

        let result = write.await;
        match &result {
            Ok(_) => {
                for prefix in invalidates {
                    cache.invalidate(prefix);
                }
                guard.finish(MutationState::Success);
            }
            Err(err) => guard.finish(MutationState::Error(err.user_message())),
        }
        result
    }
}

/// Returns the mutation to idle if the caller drops the write mid-flight.
struct PendingGuard<'a> {
    mutation: &'a Mutation,
    armed: bool,
}

impl PendingGuard<'_> {
    fn finish(mut self, state: MutationState) {
        self.armed = false;
        self.mutation.set(state);
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.mutation.set(MutationState::Idle);
        }
    }
}

/// Named mutation trackers, one per write operation.
#[derive(Debug, Default)]
pub struct MutationRegistry {
    slots: Mutex<HashMap<&'static str, Arc<Mutation>>>,
}

impl MutationRegistry {
    pub fn get(&self, name: &'static str) -> Arc<Mutation> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name)
            .or_default()
            .clone()
    }

    pub fn is_pending(&self, name: &'static str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .is_some_and(|m| m.is_pending())
    }
}
