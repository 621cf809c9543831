//! Signal intake: decodes forwarded trade signals and opens positions.

mod error;
mod intake;
pub mod payload;

pub use error::IntakeError;
pub use intake::SignalIntake;
pub use payload::{SignalBody, TradeSignalMessage};
