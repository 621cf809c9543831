//! Background tasks of the trade engine: the monitoring loop that closes
//! positions at their stop-loss or target, and the simulated price feed it
//! reads quotes from.

pub mod monitor;
pub mod price_feed;
pub mod report;
pub mod shutdown;

pub use monitor::{CycleReport, MonitoringLoop};
pub use price_feed::SimulatedPriceFeed;
pub use report::ReportThrottle;
pub use shutdown::{Shutdown, ShutdownTrigger};
