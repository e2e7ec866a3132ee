//! The fixed catalog of tracked sensors.
//!
//! The catalog maps external metric names to the crate's internal [`Sensor`]
//! identity. It is a compile-time table sorted ascending by name so that
//! lookups can binary-search; which sensors it contains is fixed per build
//! variant, not per run.

/// A tracked physical or logical quantity.
///
/// The ordinal is stable and used as an index into the value store, so the
/// set of sensors is closed at compile time. Sensors before
/// [`FIRST_TRACKED`] in declaration order exist on every build but are only
/// tracked on variants that own the corresponding hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Sensor {
    /// Heated bed thermistor.
    BedTemp = 0,
    /// Print cooling fan tachometer.
    PrintFan = 1,
    /// Heatbreak cooling fan tachometer.
    HeatbreakFan = 2,
    /// Nozzle thermistor.
    NozzleTemp = 3,
    /// Heatbreak thermistor.
    HeatbreakTemp = 4,
    /// Mainboard ambient thermistor.
    BoardTemp = 5,
    /// MCU die temperature.
    McuTemp = 6,
    /// Power supply input voltage.
    InputVoltage = 7,
}

impl Sensor {
    /// Number of sensor slots, across all build variants.
    pub const COUNT: usize = 8;

    /// Every sensor in ordinal order.
    pub const ALL: [Sensor; Self::COUNT] = [
        Sensor::BedTemp,
        Sensor::PrintFan,
        Sensor::HeatbreakFan,
        Sensor::NozzleTemp,
        Sensor::HeatbreakTemp,
        Sensor::BoardTemp,
        Sensor::McuTemp,
        Sensor::InputVoltage,
    ];

    /// Stable index of this sensor in the value store.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The external metric name this sensor is fed from.
    pub const fn metric_name(self) -> &'static str {
        match self {
            Sensor::BedTemp => "bedTemp",
            Sensor::PrintFan => "printFan",
            Sensor::HeatbreakFan => "heatbreakFan",
            Sensor::NozzleTemp => "nozzleTemp",
            Sensor::HeatbreakTemp => "heatbreakTemp",
            Sensor::BoardTemp => "boardTemp",
            Sensor::McuTemp => "mcuTemp",
            Sensor::InputVoltage => "inputVoltage",
        }
    }
}

/// One catalog row: an external metric name and the sensor it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// External metric name, the sort key of the catalog.
    pub name: &'static str,
    /// Sensor identity the metric maps to.
    pub sensor: Sensor,
}

const fn entry(name: &'static str, sensor: Sensor) -> CatalogEntry {
    CatalogEntry { name, sensor }
}

/// First sensor tracked on this build variant.
///
/// Boards that drive their own heated bed track everything from
/// [`Sensor::BedTemp`]; with the `remote-bed` feature the bed lives on a
/// separate controller and tracking starts at [`Sensor::PrintFan`].
#[cfg(not(feature = "remote-bed"))]
pub const FIRST_TRACKED: Sensor = Sensor::BedTemp;
/// First sensor tracked on this build variant.
///
/// The `remote-bed` variant leaves bed telemetry to a separate controller,
/// so tracking starts at [`Sensor::PrintFan`].
#[cfg(feature = "remote-bed")]
pub const FIRST_TRACKED: Sensor = Sensor::PrintFan;

/// The tracked metric catalog, sorted ascending by name.
#[cfg(not(feature = "remote-bed"))]
pub const CATALOG: &[CatalogEntry] = &[
    entry("bedTemp", Sensor::BedTemp),
    entry("boardTemp", Sensor::BoardTemp),
    entry("heatbreakFan", Sensor::HeatbreakFan),
    entry("heatbreakTemp", Sensor::HeatbreakTemp),
    entry("inputVoltage", Sensor::InputVoltage),
    entry("mcuTemp", Sensor::McuTemp),
    entry("nozzleTemp", Sensor::NozzleTemp),
    entry("printFan", Sensor::PrintFan),
];

/// The tracked metric catalog, sorted ascending by name.
#[cfg(feature = "remote-bed")]
pub const CATALOG: &[CatalogEntry] = &[
    entry("boardTemp", Sensor::BoardTemp),
    entry("heatbreakFan", Sensor::HeatbreakFan),
    entry("heatbreakTemp", Sensor::HeatbreakTemp),
    entry("inputVoltage", Sensor::InputVoltage),
    entry("mcuTemp", Sensor::McuTemp),
    entry("nozzleTemp", Sensor::NozzleTemp),
    entry("printFan", Sensor::PrintFan),
];

/// Resolve a metric name to its sensor, if tracked on this build.
///
/// Binary search over the sorted catalog, comparing by name only. The
/// catalog is immutable after build, so no locking is needed.
pub fn lookup(name: &str) -> Option<Sensor> {
    CATALOG
        .binary_search_by(|probe| probe.name.cmp(name))
        .ok()
        .map(|idx| CATALOG[idx].sensor)
}
