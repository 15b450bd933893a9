use std::env;
use std::path::PathBuf;
use tencentcloud::TencentCloudProvider;
use tfplug::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the handshake line, so logs go to stderr
    let filter = EnvFilter::try_from_env("TF_LOG_PROVIDER_TENCENTCLOUD")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut config = ServerConfig::new();
    if let (Ok(cert), Ok(key)) = (
        env::var("TENCENTCLOUD_PROVIDER_TLS_CERT"),
        env::var("TENCENTCLOUD_PROVIDER_TLS_KEY"),
    ) {
        config = config
            .with_cert_path(PathBuf::from(cert))
            .with_key_path(PathBuf::from(key));
    }

    // Lets the binary be started by hand under a debugger
    if env::var_os("TENCENTCLOUD_PROVIDER_DEBUG").is_some() {
        config = config.without_magic_cookie();
    }

    tfplug::serve(TencentCloudProvider::new(), config).await?;

    Ok(())
}
