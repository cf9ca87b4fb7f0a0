//! Periodic backend reachability checks.

pub mod monitor;

pub use monitor::{Connectivity, ConnectivityMonitor};
