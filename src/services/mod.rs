pub mod dispatch;
pub mod listings;
pub mod lookup;
pub mod reconcile;
pub mod update;

pub use dispatch::{DispatchMode, DispatchOutcome, DispatchRecord, DispatchReport, Dispatcher};
pub use listings::{ListingFilter, last_matching};
pub use lookup::{LookupError, ResolvedShow, resolve};
pub use reconcile::{Reconciler, Reconciliation};
pub use update::{ShowOutcome, ShowReport, ShowUpdater, UpdateError, UpdateSummary};
