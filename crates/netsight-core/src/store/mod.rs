// ── Reconciliation store ──
//
// `DataStore` is the single owner of dashboard state. `EntityCollection`
// and `BoundedLog` are its building blocks and stay crate-private.

mod collection;
mod data_store;
mod log;

pub use data_store::{DataStore, MergeOutcome};
