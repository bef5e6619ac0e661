//! Per-device buffer delivery channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{trace, warn};

use crate::buffer::ImageBuffer;
use crate::device::events::{DeviceEvent, EventHub};
use crate::error::HalError;

/// The channel through which a vendor backend delivers filled buffers.
///
/// A stream forwards into the owning device's event hub synchronously on
/// the delivering thread, preserving hardware delivery order; nothing is
/// reordered or buffered at this layer. Once published, a buffer must not
/// be touched again by the producer.
pub struct DataStream {
    id: String,
    events: EventHub,
    open: AtomicBool,
}

impl DataStream {
    pub(crate) fn new(id: String, events: EventHub) -> Self {
        Self {
            id,
            events,
            open: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Publish a filled buffer. Buffers arriving after the stream closed
    /// are dropped with a warning; the race with teardown is expected.
    pub fn deliver(&self, buffer: ImageBuffer) {
        if !self.is_open() {
            warn!(stream = %self.id, frame = buffer.frame_id(), "buffer dropped on closed stream");
            return;
        }
        trace!(stream = %self.id, frame = buffer.frame_id(), "buffer delivered");
        self.events.publish(&DeviceEvent::NewBuffer(Arc::new(buffer)));
    }

    /// Report a frame the device failed to complete.
    pub fn deliver_failed(&self, message: impl Into<String>) {
        self.events.publish(&DeviceEvent::BufferFailed {
            message: message.into(),
        });
    }

    /// Report acquisition ending abnormally, with the underlying cause.
    pub fn abort(&self, message: impl Into<String>, cause: Option<HalError>) {
        self.events.publish(&DeviceEvent::AcquisitionAborted {
            message: message.into(),
            cause,
        });
    }

    pub(crate) fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for DataStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStream")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
