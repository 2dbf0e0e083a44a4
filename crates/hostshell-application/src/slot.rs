//! Remote slot: the one place a dashboard remote is mounted.
//!
//! The slot moves through `Idle -> Loading -> Ready | Failed` and back to
//! `Idle` on unmount. Each mount runs in its own task under a fresh
//! `CancellationToken`; a generation counter guarantees that a resolution
//! finishing after an unmount or a newer mount is dropped.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use hostshell_core::remote::{RemoteId, RemoteModule};

use crate::resolver::{RemoteResolver, Resolution};

#[derive(Debug, Clone, Default)]
pub enum SlotState {
    #[default]
    Idle,
    Loading {
        remote: RemoteId,
    },
    Ready {
        remote: RemoteId,
        module: RemoteModule,
    },
    Failed {
        remote: RemoteId,
        reason: String,
    },
}

impl SlotState {
    pub fn remote(&self) -> Option<&RemoteId> {
        match self {
            SlotState::Idle => None,
            SlotState::Loading { remote }
            | SlotState::Ready { remote, .. }
            | SlotState::Failed { remote, .. } => Some(remote),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SlotState::Loading { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SlotState::Idle)
    }
}

struct SlotControl {
    generation: u64,
    in_flight: Option<CancellationToken>,
}

struct SlotInner {
    resolver: RemoteResolver,
    state: watch::Sender<SlotState>,
    control: Mutex<SlotControl>,
}

/// Cloneable handle to a slot.
#[derive(Clone)]
pub struct RemoteSlot {
    inner: Arc<SlotInner>,
}

impl RemoteSlot {
    pub fn new(resolver: RemoteResolver) -> Self {
        let (state, _) = watch::channel(SlotState::Idle);
        Self {
            inner: Arc::new(SlotInner {
                resolver,
                state,
                control: Mutex::new(SlotControl {
                    generation: 0,
                    in_flight: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> SlotState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SlotState> {
        self.inner.state.subscribe()
    }

    /// Remote currently loading, mounted or failed in this slot.
    pub fn mounted_remote(&self) -> Option<RemoteId> {
        self.inner.state.borrow().remote().cloned()
    }

    /// Starts resolving `remote`, replacing whatever the slot held.
    ///
    /// Returns immediately with the slot in `Loading`. Must be called from
    /// within a Tokio runtime.
    pub fn mount(&self, remote: RemoteId) {
        let (generation, token) = {
            let mut control = self.lock_control();
            if let Some(previous) = control.in_flight.take() {
                previous.cancel();
            }
            control.generation += 1;
            let token = CancellationToken::new();
            control.in_flight = Some(token.clone());
            self.inner.state.send_replace(SlotState::Loading {
                remote: remote.clone(),
            });
            (control.generation, token)
        };

        tracing::info!("[Slot] Mounting {} (generation {})", remote, generation);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let resolution = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("[Slot] Resolution of {} cancelled", remote);
                    return;
                }
                resolution = inner.resolver.resolve(&remote) => resolution,
            };
            inner.settle(generation, &token, remote, resolution);
        });
    }

    /// Mounts the current remote again. No-op on an idle slot.
    pub fn remount(&self) -> bool {
        match self.mounted_remote() {
            Some(remote) => {
                self.mount(remote);
                true
            }
            None => false,
        }
    }

    /// Cancels any in-flight resolution and returns the slot to `Idle`.
    pub fn unmount(&self) {
        let mut control = self.lock_control();
        if let Some(token) = control.in_flight.take() {
            token.cancel();
        }
        control.generation += 1;

        let previous = self.inner.state.send_replace(SlotState::Idle);
        if let Some(remote) = previous.remote() {
            tracing::info!("[Slot] Unmounted {}", remote);
        }
    }

    /// Waits until the slot is no longer `Loading`.
    pub async fn wait_settled(&self) -> SlotState {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    fn lock_control(&self) -> std::sync::MutexGuard<'_, SlotControl> {
        self.inner
            .control
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlotInner {
    fn settle(
        &self,
        generation: u64,
        token: &CancellationToken,
        remote: RemoteId,
        resolution: Resolution,
    ) {
        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if control.generation != generation || token.is_cancelled() {
            tracing::debug!(
                "[Slot] Discarding stale resolution of {} (generation {}, current {})",
                remote,
                generation,
                control.generation
            );
            return;
        }
        control.in_flight = None;

        let next = match resolution {
            Resolution::Ready(module) => {
                tracing::info!("[Slot] {} ready", remote);
                SlotState::Ready { remote, module }
            }
            Resolution::Failed(reason) => {
                tracing::warn!("[Slot] {} unavailable: {}", remote, reason);
                SlotState::Failed { remote, reason }
            }
        };
        self.state.send_replace(next);
    }
}
