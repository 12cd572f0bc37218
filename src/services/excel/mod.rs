pub mod source;
pub mod utils;

pub use source::{CalamineSource, TableSource, WorkbookFormat};
