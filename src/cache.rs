//! The display-facing sensor cache.
//!
//! Bridges the metrics registry to the display subsystem: subscribes the
//! display handler to exactly the cataloged metrics, caches their latest
//! values, and serves snapshot reads from the UI's synchronous refresh path.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::catalog::{self, Sensor, CATALOG};
use crate::error::Result;
use crate::registry::{MetricPoint, MetricsRegistry, Sample, DISPLAY_HANDLER};
use crate::router::UpdateRouter;
use crate::store::{Reading, SensorValue, ValueStore};

/// Shared cache state, reachable from both the owning [`SensorCache`] and
/// the router's weak reference.
pub(crate) struct CacheInner {
    registry: Arc<dyn MetricsRegistry>,
    store: Mutex<ValueStore>,
    all_enabled: AtomicBool,
}

impl CacheInner {
    pub(crate) fn new(registry: Arc<dyn MetricsRegistry>) -> Self {
        Self {
            registry,
            store: Mutex::new(ValueStore::new()),
            all_enabled: AtomicBool::new(false),
        }
    }

    /// Subscribe the display handler to every cataloged metric the registry
    /// currently knows. Returns true once every catalog entry is covered.
    ///
    /// Idempotent and re-entrant: once full coverage has been reached this
    /// is a single atomic load. A scan that ends short of full coverage
    /// returns false but keeps whatever subset it matched subscribed; the
    /// next call picks up from the registry's then-current state.
    fn enable(&self) -> bool {
        if self.all_enabled.load(Ordering::SeqCst) {
            return true;
        }

        let handler = match self.registry.handler(DISPLAY_HANDLER) {
            Some(handler) => handler,
            None => {
                trace!("display handler not registered yet");
                return false;
            }
        };

        let mut count = 0usize;
        for metric in self.registry.metrics() {
            if let Some(sensor) = catalog::lookup(&metric.name) {
                self.registry.subscribe(handler, &metric.name);
                self.store.lock().mark_enabled(sensor);
                count += 1;
                if count == CATALOG.len() {
                    self.all_enabled.store(true, Ordering::SeqCst);
                    debug!("all tracked metrics subscribed");
                    return true;
                }
            }
        }

        debug!(
            subscribed = count,
            tracked = CATALOG.len(),
            "partial metric subscription"
        );
        false
    }

    /// Unsubscribe the display handler from every cataloged metric and
    /// invalidate the corresponding slots.
    fn disable(&self) {
        let handler = match self.registry.handler(DISPLAY_HANDLER) {
            Some(handler) => handler,
            // Without the handler there is nothing to clear.
            None => return,
        };

        for metric in self.registry.metrics() {
            if let Some(sensor) = catalog::lookup(&metric.name) {
                self.registry.unsubscribe(handler, &metric.name);
                self.store.lock().disable(sensor);
            }
        }

        self.all_enabled.store(false, Ordering::SeqCst);
        debug!("tracked metrics unsubscribed");
    }

    /// Dispatch adapter: filter one pushed sample and cache it.
    ///
    /// Only numeric samples for cataloged metrics are stored; everything
    /// else is dropped silently, which is the steady state for the vast
    /// majority of registry traffic.
    pub(crate) fn handle_update(&self, point: &MetricPoint) {
        let reading = match &point.sample {
            Sample::Float(v) => Reading::Float(*v),
            Sample::Integer(v) => Reading::Integer(*v),
            Sample::Event | Sample::Text(_) => return,
        };

        match catalog::lookup(&point.name) {
            Some(sensor) => self.store.lock().record(sensor, reading),
            None => trace!(metric = %point.name, "sample for untracked metric dropped"),
        }
    }

    fn value(&self, sensor: Sensor) -> SensorValue {
        // Best-effort re-subscription on every read: a no-op once fully
        // subscribed, otherwise the handler may have shown up since the
        // last attempt.
        self.enable();
        self.store.lock().get(sensor)
    }

    fn values(&self) -> [SensorValue; Sensor::COUNT] {
        self.enable();
        self.store.lock().snapshot()
    }
}

/// Display-facing cache of the latest tracked sensor readings.
///
/// Construction registers the cache with the router and makes a best-effort
/// attempt to subscribe the display handler to every cataloged metric;
/// dropping the cache unregisters it and unsubscribes the handler. At most
/// one cache may be registered with a router at a time.
///
/// All methods are safe to call from any thread; reads return snapshot
/// copies and never observe a partially written value.
pub struct SensorCache {
    inner: Arc<CacheInner>,
    router: Arc<UpdateRouter>,
}

impl SensorCache {
    /// Create the cache, register it with `router`, and attempt to
    /// subscribe to all cataloged metrics.
    ///
    /// The subscription attempt is best-effort: a registry whose display
    /// handler or metrics have not appeared yet is not an error, and
    /// coverage is retried on every subsequent read.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyRegistered`] if another cache is still registered
    /// with `router`.
    ///
    /// [`Error::AlreadyRegistered`]: crate::Error::AlreadyRegistered
    pub fn new(registry: Arc<dyn MetricsRegistry>, router: Arc<UpdateRouter>) -> Result<Self> {
        let inner = Arc::new(CacheInner::new(registry));
        router.register(&inner)?;
        inner.enable();
        Ok(Self { inner, router })
    }

    /// Snapshot of one sensor's latest state.
    pub fn value(&self, sensor: Sensor) -> SensorValue {
        self.inner.value(sensor)
    }

    /// Snapshot of every slot in one lock acquisition.
    ///
    /// Cheaper than per-sensor reads when the display refreshes several
    /// sensors per frame. Untracked slots stay at their default.
    pub fn values(&self) -> [SensorValue; Sensor::COUNT] {
        self.inner.values()
    }

    /// Whether every cataloged metric is currently subscribed.
    pub fn is_fully_subscribed(&self) -> bool {
        self.inner.all_enabled.load(Ordering::SeqCst)
    }

    /// Explicitly retry the subscription scan.
    ///
    /// Reads already do this lazily; an explicit retry is useful from an
    /// event tick that wants coverage before the next frame. Returns true
    /// once every cataloged metric is subscribed.
    pub fn refresh_subscriptions(&self) -> bool {
        self.inner.enable()
    }
}

impl Drop for SensorCache {
    fn drop(&mut self) {
        self.router.unregister();
        self.inner.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HandlerId, InMemoryRegistry, MetricKind};
    use pretty_assertions::assert_eq;

    /// Registry with the display handler and every cataloged metric.
    fn populated_registry() -> (Arc<InMemoryRegistry>, HandlerId) {
        let registry = Arc::new(InMemoryRegistry::new());
        let handler = registry.register_handler(DISPLAY_HANDLER);
        for entry in CATALOG {
            let kind = match entry.sensor {
                Sensor::PrintFan | Sensor::HeatbreakFan => MetricKind::Integer,
                _ => MetricKind::Float,
            };
            registry.register_metric(entry.name, kind);
        }
        (registry, handler)
    }

    fn publish(registry: &InMemoryRegistry, router: &UpdateRouter, name: &str, sample: Sample) {
        registry.publish(name, sample, |_, point| router.route(point));
    }

    #[test]
    fn test_construction_subscribes_all_tracked_metrics() {
        let (registry, handler) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry.clone(), router).unwrap();

        assert!(cache.is_fully_subscribed());
        for entry in CATALOG {
            assert!(registry.is_subscribed(handler, entry.name), "{}", entry.name);
            assert!(cache.value(entry.sensor).enabled, "{}", entry.name);
        }
    }

    #[test]
    fn test_round_trip_float_and_integer() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry.clone(), router.clone()).unwrap();

        publish(&registry, &router, "nozzleTemp", Sample::Float(215.5));
        publish(&registry, &router, "printFan", Sample::Integer(4_200));

        let nozzle = cache.value(Sensor::NozzleTemp);
        assert!(nozzle.is_valid());
        assert_eq!(nozzle.reading, Some(Reading::Float(215.5)));

        let fan = cache.value(Sensor::PrintFan);
        assert_eq!(fan.reading, Some(Reading::Integer(4_200)));
    }

    #[test]
    fn test_update_for_untracked_metric_never_mutates_store() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry, router.clone()).unwrap();

        let before = cache.values();
        router.route(&MetricPoint {
            name: "unknownSensor".to_owned(),
            sample: Sample::Float(1.0),
        });
        assert_eq!(before, cache.values());
    }

    #[test]
    fn test_non_numeric_samples_are_ignored() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry, router.clone()).unwrap();

        router.route(&MetricPoint {
            name: "nozzleTemp".to_owned(),
            sample: Sample::Event,
        });
        router.route(&MetricPoint {
            name: "nozzleTemp".to_owned(),
            sample: Sample::Text("hot".to_owned()),
        });

        assert!(!cache.value(Sensor::NozzleTemp).is_valid());
    }

    #[test]
    fn test_enable_is_idempotent() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry, router).unwrap();

        let first = cache.refresh_subscriptions();
        let snapshot = cache.values();
        let second = cache.refresh_subscriptions();

        assert!(first);
        assert!(second);
        assert_eq!(snapshot, cache.values());
    }

    #[test]
    fn test_partial_registry_keeps_partial_subscriptions() {
        let registry = Arc::new(InMemoryRegistry::new());
        let handler = registry.register_handler(DISPLAY_HANDLER);
        registry.register_metric("nozzleTemp", MetricKind::Float);
        registry.register_metric("printFan", MetricKind::Integer);

        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry.clone(), router).unwrap();

        assert!(!cache.is_fully_subscribed());
        assert!(!cache.refresh_subscriptions());

        // The matched subset stays enabled; nothing is rolled back.
        assert!(cache.value(Sensor::NozzleTemp).enabled);
        assert!(cache.value(Sensor::PrintFan).enabled);
        assert!(registry.is_subscribed(handler, "nozzleTemp"));
        assert!(!cache.value(Sensor::BoardTemp).enabled);
    }

    #[test]
    fn test_missing_handler_self_heals_on_read() {
        let registry = Arc::new(InMemoryRegistry::new());
        for entry in CATALOG {
            registry.register_metric(entry.name, MetricKind::Float);
        }

        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry.clone(), router).unwrap();
        assert!(!cache.is_fully_subscribed());
        assert!(!cache.value(Sensor::NozzleTemp).enabled);

        // The display handler shows up later; the next read re-subscribes.
        let handler = registry.register_handler(DISPLAY_HANDLER);
        let value = cache.value(Sensor::NozzleTemp);

        assert!(value.enabled);
        assert!(cache.is_fully_subscribed());
        assert!(registry.is_subscribed(handler, "nozzleTemp"));
    }

    #[test]
    fn test_second_cache_rejected_while_first_is_alive() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());

        let first = SensorCache::new(registry.clone(), router.clone()).unwrap();
        assert!(matches!(
            SensorCache::new(registry.clone(), router.clone()),
            Err(crate::Error::AlreadyRegistered)
        ));

        drop(first);
        SensorCache::new(registry, router).unwrap();
    }

    #[test]
    fn test_drop_unsubscribes_and_fresh_instance_starts_clean() {
        let (registry, handler) = populated_registry();
        let router = Arc::new(UpdateRouter::new());

        let cache = SensorCache::new(registry.clone(), router.clone()).unwrap();
        publish(&registry, &router, "nozzleTemp", Sample::Float(215.5));
        assert!(cache.value(Sensor::NozzleTemp).is_valid());
        drop(cache);

        for entry in CATALOG {
            assert!(!registry.is_subscribed(handler, entry.name), "{}", entry.name);
        }

        // With no subscribers the registry delivers nothing.
        publish(&registry, &router, "nozzleTemp", Sample::Float(99.0));

        let fresh = SensorCache::new(registry.clone(), router.clone()).unwrap();
        for sensor in Sensor::ALL {
            assert!(!fresh.value(sensor).is_valid(), "{sensor:?}");
        }

        publish(&registry, &router, "nozzleTemp", Sample::Float(216.0));
        assert_eq!(
            fresh.value(Sensor::NozzleTemp).reading,
            Some(Reading::Float(216.0))
        );
    }

    #[test]
    fn test_updates_are_cached_even_before_subscription() {
        // The dispatch adapter filters by catalog, not by enabled state;
        // a sample routed before the handler exists is still cached.
        let registry = Arc::new(InMemoryRegistry::new());
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry, router.clone()).unwrap();

        router.route(&MetricPoint {
            name: "mcuTemp".to_owned(),
            sample: Sample::Float(38.0),
        });

        let value = cache.value(Sensor::McuTemp);
        assert!(value.is_valid());
        assert!(!value.enabled);
    }

    #[cfg(not(feature = "remote-bed"))]
    #[test]
    fn test_display_refresh_walkthrough() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry.clone(), router.clone()).unwrap();

        publish(&registry, &router, "bedTemp", Sample::Float(60.5));
        let bed = cache.value(Sensor::BedTemp);
        assert!(bed.is_valid());
        assert_eq!(bed.reading, Some(Reading::Float(60.5)));

        let before = cache.values();
        router.route(&MetricPoint {
            name: "unknownSensor".to_owned(),
            sample: Sample::Float(1.0),
        });
        assert_eq!(before, cache.values());

        drop(cache);
        let second = SensorCache::new(registry, router).unwrap();
        assert!(!second.value(Sensor::BedTemp).is_valid());
    }

    #[cfg(feature = "remote-bed")]
    #[test]
    fn test_bed_metric_is_untracked_on_remote_bed_builds() {
        let (registry, handler) = populated_registry();
        registry.register_metric("bedTemp", MetricKind::Float);
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry.clone(), router.clone()).unwrap();

        assert!(!registry.is_subscribed(handler, "bedTemp"));
        router.route(&MetricPoint {
            name: "bedTemp".to_owned(),
            sample: Sample::Float(60.5),
        });
        assert!(!cache.value(Sensor::BedTemp).is_valid());
    }

    #[test]
    fn test_concurrent_producer_and_reader() {
        let (registry, _) = populated_registry();
        let router = Arc::new(UpdateRouter::new());
        let cache = SensorCache::new(registry, router.clone()).unwrap();

        let producer = {
            let router = router.clone();
            std::thread::spawn(move || {
                for i in 1..=500i64 {
                    router.route(&MetricPoint {
                        name: "printFan".to_owned(),
                        sample: Sample::Integer(i),
                    });
                }
            })
        };

        // Reads interleave with the producer; every snapshot must be a
        // value that was actually written.
        for _ in 0..100 {
            if let Some(Reading::Integer(v)) = cache.value(Sensor::PrintFan).reading {
                assert!((1..=500).contains(&v));
            }
        }

        producer.join().unwrap();
        assert_eq!(
            cache.value(Sensor::PrintFan).reading,
            Some(Reading::Integer(500))
        );
    }

    #[test]
    fn test_cache_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SensorCache>();
        assert_send_sync::<UpdateRouter>();
    }
}
