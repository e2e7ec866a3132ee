//! Latest-value slots for tracked sensors.
//!
//! One fixed-size slot per [`Sensor`] ordinal. Slots are owned by the cache
//! and mutated only under its lock; readers always get snapshot copies.

use crate::catalog::Sensor;

/// A single numeric sensor reading.
///
/// The variant tag carries the metric's declared type, so a value can never
/// be read under the wrong type.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reading {
    /// A floating-point sample.
    Float(f64),
    /// An integer sample.
    Integer(i64),
}

impl Reading {
    /// The reading widened to `f64`, whatever its declared type.
    ///
    /// Convenient for display formatting; no unit conversion is applied.
    pub fn as_f64(self) -> f64 {
        match self {
            Reading::Float(v) => v,
            Reading::Integer(v) => v as f64,
        }
    }
}

/// Snapshot of one sensor slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorValue {
    /// Latest reading, or `None` if nothing has been observed since the
    /// slot was last enabled.
    pub reading: Option<Reading>,
    /// Whether the display handler is currently subscribed to this sensor's
    /// metric.
    pub enabled: bool,
}

impl SensorValue {
    /// Whether a reading has ever been observed (and not since invalidated).
    pub fn is_valid(&self) -> bool {
        self.reading.is_some()
    }
}

/// Fixed-size slot array, one entry per [`Sensor`] ordinal.
#[derive(Debug, Default)]
pub(crate) struct ValueStore {
    slots: [SensorValue; Sensor::COUNT],
}

impl ValueStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Snapshot copy of one slot.
    pub(crate) fn get(&self, sensor: Sensor) -> SensorValue {
        self.slots[sensor.index()]
    }

    /// Replace the slot's payload with a fresh reading.
    pub(crate) fn record(&mut self, sensor: Sensor, reading: Reading) {
        self.slots[sensor.index()].reading = Some(reading);
    }

    pub(crate) fn mark_enabled(&mut self, sensor: Sensor) {
        self.slots[sensor.index()].enabled = true;
    }

    /// Clear the slot's subscription and invalidate any cached reading.
    /// Once disabled, a previously valid reading is stale.
    pub(crate) fn disable(&mut self, sensor: Sensor) {
        let slot = &mut self.slots[sensor.index()];
        slot.enabled = false;
        slot.reading = None;
    }

    /// Snapshot copy of every slot.
    pub(crate) fn snapshot(&self) -> [SensorValue; Sensor::COUNT] {
        self.slots
    }
}
