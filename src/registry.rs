//! Metrics-registry abstraction consumed by the cache.
//!
//! The telemetry subsystem owns the set of live metrics and the table of
//! registered handlers; this crate only expresses intent against it:
//! "subscribe handler H to metric M". How the registry encodes per-handler
//! subscription state is its own business.
//!
//! [`InMemoryRegistry`] is a reference implementation for tests and for
//! hosts that do not carry a full telemetry subsystem.

use parking_lot::RwLock;
use tracing::debug;

/// Name under which the display subsystem's handler is registered.
pub const DISPLAY_HANDLER: &str = "SENSOR_INFO_SCREEN";

/// Declared type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    /// Floating-point samples.
    Float,
    /// Integer samples.
    Integer,
    /// Samples that carry no payload, only the fact of occurrence.
    Event,
    /// Free-form text samples.
    Text,
}

/// Handle for a registered metrics consumer.
///
/// The identifier is a small integer assigned by the registry; only the
/// registry knows how it maps onto per-metric subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u8);

impl HandlerId {
    /// Wrap a raw registry-assigned identifier.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn raw(self) -> u8 {
        self.0
    }

    fn mask(self) -> u32 {
        1u32 << self.0
    }
}

/// One metric known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricInfo {
    /// Metric name, unique within the registry.
    pub name: String,
    /// Declared sample type.
    pub kind: MetricKind,
}

/// Payload of one pushed sample.
///
/// The variant tag doubles as the metric's declared type, so a consumer can
/// never misread an integer sample as a float or vice versa.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sample {
    /// A floating-point sample.
    Float(f64),
    /// An integer sample.
    Integer(i64),
    /// A payload-free event.
    Event,
    /// A text sample.
    Text(String),
}

impl Sample {
    /// The declared metric type this sample carries.
    pub fn kind(&self) -> MetricKind {
        match self {
            Sample::Float(_) => MetricKind::Float,
            Sample::Integer(_) => MetricKind::Integer,
            Sample::Event => MetricKind::Event,
            Sample::Text(_) => MetricKind::Text,
        }
    }
}

/// One pushed metric sample, as delivered to handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    /// Name of the metric that produced the sample.
    pub name: String,
    /// The sample payload.
    pub sample: Sample,
}

/// Access to the external metrics registry.
///
/// Implementations own the concurrency contract for their internal state;
/// callers may invoke these from any thread.
pub trait MetricsRegistry: Send + Sync {
    /// Enumerate the currently-known metrics.
    fn metrics(&self) -> Vec<MetricInfo>;

    /// Resolve a handler by its registered name.
    fn handler(&self, name: &str) -> Option<HandlerId>;

    /// Start forwarding `metric`'s samples to `handler`.
    ///
    /// Unknown metric names are ignored. Subscribing twice is a no-op.
    fn subscribe(&self, handler: HandlerId, metric: &str);

    /// Stop forwarding `metric`'s samples to `handler`.
    fn unsubscribe(&self, handler: HandlerId, metric: &str);
}

#[derive(Debug)]
struct MetricSlot {
    kind: MetricKind,
    enabled_handlers: u32,
}

/// Minimal in-process [`MetricsRegistry`].
///
/// Keeps metrics in registration order and gates sample delivery on each
/// metric's subscribed-handler set, like the firmware registry it stands in
/// for. Not meant to scale past a few dozen metrics.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    metrics: RwLock<Vec<(String, MetricSlot)>>,
    handlers: RwLock<Vec<(String, HandlerId)>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric. Re-registering an existing name updates its kind and
    /// keeps its subscriptions.
    pub fn register_metric(&self, name: &str, kind: MetricKind) {
        let mut metrics = self.metrics.write();
        if let Some((_, slot)) = metrics.iter_mut().find(|(n, _)| n.as_str() == name) {
            slot.kind = kind;
            return;
        }
        metrics.push((
            name.to_owned(),
            MetricSlot {
                kind,
                enabled_handlers: 0,
            },
        ));
    }

    /// Add a handler, assigning the next free identifier. Re-registering an
    /// existing name returns its original identifier.
    pub fn register_handler(&self, name: &str) -> HandlerId {
        let mut handlers = self.handlers.write();
        if let Some((_, id)) = handlers.iter().find(|(n, _)| n.as_str() == name) {
            return *id;
        }
        let id = HandlerId::new(handlers.len() as u8);
        handlers.push((name.to_owned(), id));
        id
    }

    /// Whether `handler` currently receives `metric`'s samples.
    pub fn is_subscribed(&self, handler: HandlerId, metric: &str) -> bool {
        self.metrics
            .read()
            .iter()
            .find(|(n, _)| n.as_str() == metric)
            .map(|(_, slot)| slot.enabled_handlers & handler.mask() != 0)
            .unwrap_or(false)
    }

    /// Deliver one sample to every handler subscribed to `name`.
    ///
    /// `deliver` is invoked once per subscribed handler, outside the
    /// registry's locks. Unknown metrics and metrics with no subscribers
    /// produce no deliveries.
    pub fn publish<F>(&self, name: &str, sample: Sample, mut deliver: F)
    where
        F: FnMut(HandlerId, &MetricPoint),
    {
        let subscribed: Vec<HandlerId> = {
            let metrics = self.metrics.read();
            let slot = match metrics.iter().find(|(n, _)| n.as_str() == name) {
                Some((_, slot)) => slot,
                None => return,
            };
            self.handlers
                .read()
                .iter()
                .map(|(_, id)| *id)
                .filter(|id| slot.enabled_handlers & id.mask() != 0)
                .collect()
        };

        if subscribed.is_empty() {
            return;
        }

        let point = MetricPoint {
            name: name.to_owned(),
            sample,
        };
        for id in subscribed {
            deliver(id, &point);
        }
    }
}

impl MetricsRegistry for InMemoryRegistry {
    fn metrics(&self) -> Vec<MetricInfo> {
        self.metrics
            .read()
            .iter()
            .map(|(name, slot)| MetricInfo {
                name: name.clone(),
                kind: slot.kind,
            })
            .collect()
    }

    fn handler(&self, name: &str) -> Option<HandlerId> {
        self.handlers
            .read()
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, id)| *id)
    }

    fn subscribe(&self, handler: HandlerId, metric: &str) {
        if let Some((_, slot)) = self
            .metrics
            .write()
            .iter_mut()
            .find(|(n, _)| n.as_str() == metric)
        {
            slot.enabled_handlers |= handler.mask();
            debug!(metric, handler = handler.raw(), "handler subscribed");
        }
    }

    fn unsubscribe(&self, handler: HandlerId, metric: &str) {
        if let Some((_, slot)) = self
            .metrics
            .write()
            .iter_mut()
            .find(|(n, _)| n.as_str() == metric)
        {
            slot.enabled_handlers &= !handler.mask();
            debug!(metric, handler = handler.raw(), "handler unsubscribed");
        }
    }
}
