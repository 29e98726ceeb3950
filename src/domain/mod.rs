pub mod aggregate;
pub mod dataset;
pub mod document;
pub mod error;
pub mod metadata;
pub mod report;
pub mod table;
