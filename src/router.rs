//! Routing of pushed metric samples to the active cache.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{info, trace};

use crate::cache::CacheInner;
use crate::error::{Error, Result};
use crate::registry::MetricPoint;

/// Routes pushed metric samples to the single active [`SensorCache`].
///
/// The router holds at most one registered cache at a time. It is handed to
/// the telemetry side, which feeds every sample through [`route`]; samples
/// arriving while no cache is registered are dropped silently, which is the
/// normal state during startup and teardown.
///
/// [`SensorCache`]: crate::SensorCache
/// [`route`]: UpdateRouter::route
pub struct UpdateRouter {
    active: Mutex<Weak<CacheInner>>,
}

impl UpdateRouter {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(Weak::new()),
        }
    }

    /// Register `cache` as the active sample consumer.
    ///
    /// Re-registering the instance that is already active is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyRegistered`] if a different cache instance is still
    /// alive and registered.
    pub(crate) fn register(&self, cache: &Arc<CacheInner>) -> Result<()> {
        let mut active = self.active.lock();
        if let Some(existing) = active.upgrade() {
            if !Arc::ptr_eq(&existing, cache) {
                return Err(Error::AlreadyRegistered);
            }
            return Ok(());
        }
        *active = Arc::downgrade(cache);
        info!("sensor cache registered");
        Ok(())
    }

    /// Clear the active cache unconditionally.
    pub(crate) fn unregister(&self) {
        *self.active.lock() = Weak::new();
        info!("sensor cache unregistered");
    }

    /// Forward one pushed sample to the active cache, if any.
    pub fn route(&self, point: &MetricPoint) {
        let cache = self.active.lock().upgrade();
        match cache {
            Some(cache) => cache.handle_update(point),
            None => trace!(metric = %point.name, "no active cache, sample dropped"),
        }
    }

    /// Whether a live cache is currently registered.
    pub fn has_active(&self) -> bool {
        self.active.lock().upgrade().is_some()
    }
}

impl Default for UpdateRouter {
    fn default() -> Self {
        Self::new()
    }
}
