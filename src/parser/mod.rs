pub mod title;

pub use title::{ParsedTitle, parse_release_file, parse_title};
