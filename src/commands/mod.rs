// ABOUTME: Command module aggregator for the berth CLI.
// ABOUTME: Re-exports deploy and plan command handlers.

mod deploy;
mod plan;

pub use deploy::deploy;
pub use plan::plan;
