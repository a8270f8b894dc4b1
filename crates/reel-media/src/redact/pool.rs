//! Checkout pool for detector state that needs `&mut self`.
//!
//! Rayon workers each take an idle instance for the duration of one call,
//! so detections run concurrently instead of queueing on a single lock.
//! New instances are created only when every existing one is checked out.

use std::sync::Mutex;

use crate::error::{MediaError, MediaResult};

/// A growable set of reusable instances.
#[derive(Debug)]
pub struct InstancePool<T> {
    idle: Mutex<Vec<T>>,
}

impl<T> InstancePool<T> {
    /// Start with one ready instance.
    pub fn new(seed: T) -> Self {
        Self {
            idle: Mutex::new(vec![seed]),
        }
    }

    /// Run `work` on an idle instance, creating one with `create` if none
    /// is free. The instance goes back to the pool afterwards.
    pub fn with<R>(
        &self,
        create: impl FnOnce() -> MediaResult<T>,
        work: impl FnOnce(&mut T) -> R,
    ) -> MediaResult<R> {
        let checked_out = self.lock()?.pop();
        let mut instance = match checked_out {
            Some(instance) => instance,
            None => create()?,
        };

        let result = work(&mut instance);
        self.lock()?.push(instance);
        Ok(result)
    }

    /// Instances currently waiting for work.
    #[cfg(test)]
    pub(crate) fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn lock(&self) -> MediaResult<std::sync::MutexGuard<'_, Vec<T>>> {
        self.idle
            .lock()
            .map_err(|_| MediaError::detection_failed("detector pool lock poisoned"))
    }
}
