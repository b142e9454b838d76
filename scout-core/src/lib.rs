//! Wires the eight Scout subsystem crates behind the four §6 operations
//! (`query`, `sync`, `nav`, `index.query`). Owns process-level config
//! loading and the top-level §7 error taxonomy; everything else is
//! delegated to `scout-facts`, `scout-graph`, `scout-context`,
//! `scout-gate`, `scout-router`, `scout-synth`, `scout-audit`, and
//! `scout-index`.

pub mod config;
pub mod error;
pub mod ops;
pub mod tools;

pub use config::DisplayPrefs;
pub use error::ScoutError;
pub use ops::ScoutCore;
