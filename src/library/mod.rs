pub mod matcher;
pub mod scanner;

pub use matcher::fuzzy_match;
pub use scanner::{LocalInventory, ScanError, scan};
