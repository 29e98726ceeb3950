pub mod fonts;
pub mod renderer;

pub use renderer::{PageGeometry, PdfRenderer};
