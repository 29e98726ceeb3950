pub mod reader;
pub mod writer;

pub use reader::{load_metadata_block, load_sheet, LoadedSheet};
pub use writer::{save_sheet, LOCKED_MESSAGE};
