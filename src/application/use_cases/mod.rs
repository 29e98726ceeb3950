pub mod aggregate_builder;
pub mod dataset_service;
pub mod report_assembler;
pub mod report_service;
pub mod row_filter;
