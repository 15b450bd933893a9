//! Data source implementations

pub mod data_source_cynosdb_backup_download_url;
pub mod data_source_scf_request_status;
pub mod data_source_scf_triggers;
pub mod data_source_waf_ports;

pub use data_source_cynosdb_backup_download_url::CynosdbBackupDownloadUrlDataSource;
pub use data_source_scf_request_status::ScfRequestStatusDataSource;
pub use data_source_scf_triggers::ScfTriggersDataSource;
pub use data_source_waf_ports::WafPortsDataSource;
