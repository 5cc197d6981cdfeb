//! balrec-core: balance series model, run configuration and the reconciler

pub mod config;
pub mod model;
pub mod reconcile;

pub use config::{ConfigError, ReconConfig, DEFAULT_CLOSING_COL, DEFAULT_DATE_COL};
pub use model::{BalanceRecord, CleanedSeries};
pub use reconcile::{join, reconcile, ReconStatus, Reconciliation, ReconciliationRow};
