//! # sensor-info-cache
//!
//! A thread-safe cache of the latest sensor readings, bridging a process-wide
//! telemetry/metrics registry to a display subsystem.
//!
//! The cache subscribes a single display handler to a fixed catalog of
//! metrics, stores each metric's most recent sample, and serves snapshot
//! reads from the display's synchronous refresh path. Everything else the
//! registry produces passes by untouched.
//!
//! ## Features
//!
//! - **Fixed catalog**: a compile-time sorted table decides which metrics
//!   are tracked; the tracked set is a build-variant decision, not a runtime
//!   one
//! - **Typed readings**: float and integer samples stay tagged end to end
//! - **Single consumer**: at most one cache is registered with the update
//!   router at a time, enforced at construction
//! - **Self-healing subscriptions**: every read retries metric subscription
//!   until the registry exposes the display handler and all tracked metrics
//! - **Scoped lifetime**: constructing the cache registers and subscribes
//!   it, dropping it unregisters and unsubscribes
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use sensor_info_cache::{
//!     InMemoryRegistry, MetricKind, Sample, Sensor, SensorCache, UpdateRouter, DISPLAY_HANDLER,
//! };
//!
//! # fn main() -> sensor_info_cache::Result<()> {
//! let registry = Arc::new(InMemoryRegistry::new());
//! registry.register_handler(DISPLAY_HANDLER);
//! registry.register_metric("nozzleTemp", MetricKind::Float);
//!
//! let router = Arc::new(UpdateRouter::new());
//! let cache = SensorCache::new(registry.clone(), router.clone())?;
//!
//! // Telemetry side: deliver a sample to every subscribed handler.
//! registry.publish("nozzleTemp", Sample::Float(215.5), |_, point| router.route(point));
//!
//! // Display side: synchronous snapshot read.
//! let nozzle = cache.value(Sensor::NozzleTemp);
//! assert_eq!(nozzle.reading.map(|r| r.as_f64()), Some(215.5));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: enable serialization/deserialization for the value types
//! - `remote-bed`: build variant for boards whose heated bed is driven by a
//!   separate controller; bed telemetry is then not tracked

// Public modules
pub mod cache;
pub mod catalog;
pub mod error;
pub mod registry;
pub mod router;
pub mod store;

// Re-exports for convenience
pub use cache::SensorCache;
pub use catalog::{CatalogEntry, Sensor, CATALOG, FIRST_TRACKED};
pub use error::{Error, Result};
pub use registry::{
    HandlerId, InMemoryRegistry, MetricInfo, MetricKind, MetricPoint, MetricsRegistry, Sample,
    DISPLAY_HANDLER,
};
pub use router::UpdateRouter;
pub use store::{Reading, SensorValue};
