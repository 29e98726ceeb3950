pub mod config;
pub mod excel;
pub mod pdf;
pub mod storage;
