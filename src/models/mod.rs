pub mod episode;
pub mod listing;
pub mod show;

pub use episode::Episode;
pub use listing::Listing;
pub use show::{Show, ShowSummary};
