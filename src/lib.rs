//! # kitprobe
//!
//! A toolchain discovery and environment synthesis engine for a native
//! build orchestrator. Given a host operating system and a set of search
//! hints, it scans the machine for usable compiler/SDK installations
//! ("kits"), probes each candidate to extract its identity, and produces
//! a canonical, serializable description consumed by a downstream build
//! driver.
//!
//! The library is organized around the components of a single pipeline:
//!
//! - [`paths`] resolves well-known directories and `PATH` lookups.
//! - [`compiler`] probes a candidate binary and classifies it.
//! - [`scanner`] enumerates a directory and applies a prober.
//! - [`vendor`] extracts vendor SDK environments and builds vendor kits.
//! - [`aggregator`] composes the above into one `scan()` entry point.
//! - [`persistence`] loads and validates an on-disk kits document.
//! - [`environment`] composes a kit's effective environment on demand.
//! - [`kit`] is the shared data model every component above produces or
//!   consumes.
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use kitprobe::aggregator::{scan, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let opts = ScanOptions::default();
//!     let kits = scan(&opts).await;
//!     for kit in &kits {
//!         println!("found kit: {}", kit.name());
//!     }
//! }
//! ```

pub mod aggregator;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod exec;
pub mod kit;
pub mod paths;
pub mod persistence;
pub mod scanner;
pub mod scripts;
pub mod variable_map;
pub mod vendor;

pub use config::{load_config, save_config, KitProbeConfig};
pub use error::{KitError, Result};
pub use kit::{change_needs_clean, Kit};
pub use paths::Host;
pub use variable_map::VariableMap;
