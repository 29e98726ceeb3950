mod datasets;
mod error;
mod logs;
mod report;

pub use logs::{add_log, add_log_entry, LogEntry};

use actix_cors::Cors;
use actix_web::{dev::Server, web, App, HttpServer};
use std::sync::{Arc, Mutex};

use crate::application::use_cases::dataset_service::DatasetUseCase;
use crate::application::use_cases::report_service::ReportUseCase;
use crate::domain::dataset::DatasetKind;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::storage::{CachePolicy, DatasetRepository};

pub struct HttpState {
    pub chronic: Arc<DatasetUseCase>,
    pub acute: Arc<DatasetUseCase>,
    pub mexico: Arc<DatasetUseCase>,
    pub reports: Arc<ReportUseCase>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn from_config(config: &AppConfig, logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        let dataset = |kind: DatasetKind, policy: CachePolicy| {
            let repository = DatasetRepository::new(kind.schema(), config.dataset_path(kind), policy);
            Arc::new(DatasetUseCase::new(Arc::new(repository), config.read_only))
        };

        Self {
            chronic: dataset(DatasetKind::Chronic, CachePolicy::KeepSnapshot),
            acute: dataset(DatasetKind::Acute, CachePolicy::KeepSnapshot),
            mexico: dataset(DatasetKind::Mexico, CachePolicy::ReloadEveryRequest),
            reports: Arc::new(ReportUseCase::default()),
            logs,
        }
    }
}

/// Registers every route at the root.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(datasets::chronic_data)
        .service(datasets::chronic_update)
        .service(datasets::acute_data)
        .service(datasets::acute_update)
        .service(datasets::mexico_data)
        .service(datasets::mexico_update)
        .service(report::generate_report)
        .service(report::generate_report_alias)
        .service(report::generate_acute_report)
        .service(report::generate_chronic_report)
        .service(logs::get_logs);
}

pub fn start_server(config: &AppConfig, logs: Arc<Mutex<Vec<LogEntry>>>) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState::from_config(config, Arc::clone(&logs)));
    let payload_limit = config.max_payload_bytes;

    add_log(
        &logs,
        "INFO",
        "HttpApi",
        &format!(
            "Listening on {}:{} (data_dir={} read_only={})",
            config.host,
            config.port,
            config.data_dir.display(),
            config.read_only
        ),
    );

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .configure(configure)
    })
    .bind(config.bind_address())?
    .run();

    Ok(server)
}
