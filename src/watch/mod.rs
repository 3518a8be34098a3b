//! Change detection for watched source files
//!
//! Two independent detectors with the same contract (mutate your snapshot,
//! report what changed) and different fingerprints: [`hash::HashWatcher`]
//! digests file contents and backs the browser's `/reload-check` polling;
//! [`mtime::MtimeWatcher`] compares modification times and backs the
//! supervisor's restart decision. Each owns its own watch set; the two never
//! share state.

pub mod hash;
pub mod mtime;

pub use hash::HashWatcher;
pub use mtime::MtimeWatcher;
