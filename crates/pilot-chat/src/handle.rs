//! A cloneable handle for poking a chat session from external code.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::render::ExpansionOverrides;

/// UI-local state of the turn currently in flight
#[derive(Debug)]
pub(crate) struct LiveTurn {
    pub(crate) turn_id: Uuid,
    pub(crate) latest_sequence: u32,
    pub(crate) overrides: ExpansionOverrides,
}

/// A cloneable handle for poking a chat session from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap. Sessions sharing a
/// handle share its single-flight guard.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) busy: Arc<AtomicBool>,
    pub(crate) repaint: Arc<Notify>,
    pub(crate) live: Arc<Mutex<Option<LiveTurn>>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            repaint: Arc::new(Notify::new()),
            live: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a turn is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the handle for one turn. `None` if another turn holds it.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                handle: self.clone(),
            })
    }

    /// Flip an action section of the in-flight turn and ask the session to
    /// repaint. Returns the new state, or `None` when no turn is in flight
    /// or it has no action with that sequence number yet.
    pub fn toggle_action(&self, sequence: u32) -> Option<bool> {
        let expanded = {
            let mut live = self.live.lock();
            let live = live.as_mut()?;
            if sequence == 0 || sequence > live.latest_sequence {
                return None;
            }
            let expanded = live.overrides.toggle(sequence, live.latest_sequence);
            tracing::debug!("Toggled action {} of live turn {}: {}", sequence, live.turn_id, expanded);
            expanded
        };
        self.repaint.notify_one();
        Some(expanded)
    }

    pub(crate) fn begin_turn(&self, turn_id: Uuid) {
        *self.live.lock() = Some(LiveTurn {
            turn_id,
            latest_sequence: 0,
            overrides: ExpansionOverrides::new(),
        });
    }

    pub(crate) fn set_latest_sequence(&self, sequence: u32) {
        if let Some(live) = self.live.lock().as_mut() {
            live.latest_sequence = sequence;
        }
    }

    /// Snapshot of the in-flight turn's overrides
    pub(crate) fn live_overrides(&self) -> ExpansionOverrides {
        self.live
            .lock()
            .as_ref()
            .map(|live| live.overrides.clone())
            .unwrap_or_default()
    }

    /// Detach the in-flight turn, handing back its overrides.
    pub(crate) fn end_turn(&self) -> ExpansionOverrides {
        self.live
            .lock()
            .take()
            .map(|live| live.overrides)
            .unwrap_or_default()
    }
}

/// Holds the single-flight claim on a [`SessionHandle`]; released on drop.
pub struct BusyGuard {
    handle: SessionHandle,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.handle.live.lock().take();
        self.handle.busy.store(false, Ordering::Release);
    }
}
