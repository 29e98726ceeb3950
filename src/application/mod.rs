pub mod use_cases;

pub use use_cases::dataset_service::DatasetUseCase;
pub use use_cases::report_service::ReportUseCase;
