//! Ownership of device-side buffer handles.
//!
//! CPU buffers own the handle of their GPU copy. Dropping the owner does not
//! talk to the device (this crate has no device); instead the handle is queued
//! on a [`ReleaseQueue`] shared with the device manager, which deletes it on
//! its next pass. Each handle therefore reaches the device exactly once.

use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

/// Name of a device buffer. Zero is reserved for "none", so an unset handle is
/// `Option<BufferHandle>::None`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BufferHandle(NonZeroU32);

impl BufferHandle {
    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferHandle({})", self.0)
    }
}

/// Handles waiting to be deleted by the device manager.
///
/// Cloning shares the queue. Single-threaded by construction (`Rc`), matching
/// the one-thread-per-context model.
#[derive(Clone, Default)]
pub struct ReleaseQueue {
    pending: Rc<RefCell<Vec<BufferHandle>>>,
}

impl ReleaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, handle: BufferHandle) {
        self.pending.borrow_mut().push(handle);
    }

    /// Takes every queued handle, leaving the queue empty.
    pub fn drain(&self) -> Vec<BufferHandle> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl fmt::Debug for ReleaseQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseQueue").field("pending", &self.len()).finish()
    }
}

/// A device buffer owned by a CPU-side buffer.
///
/// Dropping the slot queues the handle for deletion.
#[derive(Debug)]
pub struct DeviceSlot {
    handle: BufferHandle,
    release: ReleaseQueue,
}

impl DeviceSlot {
    pub fn new(handle: BufferHandle, release: ReleaseQueue) -> Self {
        Self { handle, release }
    }

    #[inline]
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }
}

impl Drop for DeviceSlot {
    fn drop(&mut self) {
        log::debug!("queueing {:?} for release", self.handle);
        self.release.push(self.handle);
    }
}
