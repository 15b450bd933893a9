//! `result_output_file` support for data sources

use serde::Serialize;
use std::path::Path;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub const RESULT_OUTPUT_FILE: &str = "result_output_file";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Writes `value` to `path` as pretty printed JSON, creating parent
/// directories as needed
pub async fn write_to_file<T: Serialize + ?Sized>(path: &str, value: &T) -> Result<(), OutputError> {
    let body = serde_json::to_vec_pretty(value)?;
    let write_err = |source| OutputError::Write {
        path: path.to_string(),
        source,
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    tokio::fs::write(path, body).await.map_err(write_err)?;
    tracing::debug!("Wrote data source results to {}", path);
    Ok(())
}

/// Writes `value` when the data source config names a non-empty
/// `result_output_file`
pub async fn write_result<T: Serialize + ?Sized>(
    config: &DynamicValue,
    value: &T,
) -> Result<(), Diagnostic> {
    let Some(path) = crate::helper::optional_string(config, RESULT_OUTPUT_FILE) else {
        return Ok(());
    };

    write_to_file(&path, value).await.map_err(|e| {
        Diagnostic::error("Failed to write result_output_file", e.to_string())
            .with_attribute(AttributePath::new(RESULT_OUTPUT_FILE))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tencentcloud-output-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn writes_pretty_json() {
        let dir = temp_path("pretty");
        let path = dir.join("nested").join("out.json");
        let path_str = path.to_string_lossy().to_string();

        write_to_file(&path_str, &serde_json::json!({"http_ports": ["80"]}))
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("\n"));
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["http_ports"][0], "80");

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn reports_unwritable_path() {
        let file = temp_path("blocker");
        tokio::fs::write(&file, b"x").await.unwrap();
        let path = file.join("out.json");

        let err = write_to_file(&path.to_string_lossy(), &serde_json::json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));

        let _ = tokio::fs::remove_file(file).await;
    }

    #[tokio::test]
    async fn write_result_skips_unset_path() {
        let config = DynamicValue::object();
        assert!(write_result(&config, &serde_json::json!([])).await.is_ok());

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new(RESULT_OUTPUT_FILE), String::new())
            .unwrap();
        assert!(write_result(&config, &serde_json::json!([])).await.is_ok());
    }
}
