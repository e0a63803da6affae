//! Agent-based simulation of fishing fleets adapting under catch quotas.
//!
//! An [`engine::Engine`] steps a fleet of fishers through harvest days on a
//! discrete schedule, lets a regulation clip and re-allocate catches, clears
//! an individual quota market, adapts fisher strategies by exploration and
//! imitation, and collects named time series along the way. The
//! [`manager::Manager`] wraps runs in a simulation directory for the CLI.

pub mod adaptation;
pub mod analysis;
pub mod collectors;
pub mod config;
pub mod engine;
pub mod errors;
pub mod manager;
pub mod market;
pub mod model;
pub mod regulation;
pub mod scenario;
pub mod schedule;
pub mod stats;
pub mod stock;
