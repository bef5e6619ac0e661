//! Device notifications.
//!
//! Every device publishes lifecycle and acquisition notifications through a
//! per-instance callback registry. Delivery is synchronous on the publishing
//! thread, which for buffer notifications is the vendor's acquisition
//! thread: subscribers must be thread-safe or hand off to their own
//! execution context.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::buffer::ImageBuffer;
use crate::error::HalError;

/// Lock a mutex, recovering the inner value if a panicking holder poisoned
/// it; the guarded state stays usable either way.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A notification published by a device.
#[derive(Debug)]
pub enum DeviceEvent {
    /// A parameter write or command execution committed; other parameters'
    /// ranges or visibility may have changed. Re-run an update if cache
    /// consistency matters.
    ParametersInvalidated { name: String },
    /// A filled buffer arrived from the data stream, in hardware delivery
    /// order. The buffer is an immutable hand-off value; retain it across
    /// frames by cloning.
    NewBuffer(Arc<ImageBuffer>),
    /// The device reported a frame that could not be completed.
    BufferFailed { message: String },
    ConnectionLost,
    AcquisitionStarted,
    AcquisitionStopped,
    /// Acquisition ended abnormally.
    AcquisitionAborted {
        message: String,
        cause: Option<HalError>,
    },
    /// The device was closed and its streams released.
    Closed { unique_id: String },
}

pub type SubscriptionId = u64;

type EventCallback = dyn Fn(&DeviceEvent) + Send + Sync;

#[derive(Default)]
struct HubState {
    subscribers: Mutex<Vec<(SubscriptionId, Arc<EventCallback>)>>,
    next_id: AtomicU64,
}

/// Per-device registry of notification subscribers.
///
/// Cloning the hub clones a handle to the same registry, so streams and
/// backends can publish into the device's subscriber list.
#[derive(Clone, Default)]
pub struct EventHub {
    state: Arc<HubState>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; returns the id used to unsubscribe it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.state.subscribers).push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Idempotent: unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        lock(&self.state.subscribers).retain(|(sid, _)| *sid != id);
    }

    /// Deliver an event to every subscriber, synchronously, on the calling
    /// thread. The subscriber list is snapshotted first so callbacks may
    /// subscribe or unsubscribe without deadlocking.
    pub fn publish(&self, event: &DeviceEvent) {
        let snapshot: Vec<Arc<EventCallback>> = lock(&self.state.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state.subscribers).len()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
