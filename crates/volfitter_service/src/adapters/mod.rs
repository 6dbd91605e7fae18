//! Sample-data implementations of the service ports.
//!
//! - [`option_metrics`]: OptionMetrics-style CSV rows and field conversions
//! - [`sample_data`]: Cached, concatenated CSV sources
//! - [`suppliers`]: Raw IV, forward and pricing suppliers
//! - [`clock`]: System, fixed and cycling clocks
//! - [`json_consumer`]: JSON file output

pub mod clock;
pub mod json_consumer;
pub mod option_metrics;
pub mod sample_data;
pub mod suppliers;

pub use clock::{CyclingClock, FixedClock, SystemClock};
pub use json_consumer::JsonFileConsumer;
pub use option_metrics::{ForwardRow, OptionRow};
pub use sample_data::SampleCsvSource;
pub use suppliers::{OptionMetricsForwardCurveSupplier, OptionMetricsPricingSupplier, OptionMetricsRawIvSupplier};
