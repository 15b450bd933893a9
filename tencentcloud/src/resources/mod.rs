//! Resource implementations

pub mod resource_clickhouse_account_permission;
pub mod resource_dts_sync_job_pause_operation;
pub mod resource_monitor_tmp_scrape_job;
pub mod resource_sqlserver_config_database_ct;
pub mod resource_vpc_flow_log_config;
pub mod resource_vpc_notify_routes;

pub use resource_clickhouse_account_permission::ClickhouseAccountPermissionResource;
pub use resource_dts_sync_job_pause_operation::DtsSyncJobPauseOperationResource;
pub use resource_monitor_tmp_scrape_job::MonitorTmpScrapeJobResource;
pub use resource_sqlserver_config_database_ct::SqlserverConfigDatabaseCtResource;
pub use resource_vpc_flow_log_config::VpcFlowLogConfigResource;
pub use resource_vpc_notify_routes::VpcNotifyRoutesResource;
