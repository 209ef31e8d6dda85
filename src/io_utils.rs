use std::path::Path;

use serde::{Deserialize, Serialize, ser};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::AppResult;
use crate::pattern::RunReport;
use crate::profile::Profile;

/// Contents of the `--report` file: the settings used and what came of them.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportFile {
    pub settings: Profile,
    pub dry_run: bool,
    #[serde(flatten)]
    pub report: RunReport,
}

/// Serialize an object to pretty JSON and write it to disk.
#[tracing::instrument(name = "Writing JSON file", level = "debug", skip(obj))]
pub async fn write_json_output<P: AsRef<Path> + std::fmt::Debug, S: ser::Serialize>(
    output: P,
    obj: &S,
) -> AppResult<()> {
    let data = serde_json::to_string_pretty(obj)?;
    if let Some(parent) = output.as_ref().parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    write_file(output, data).await
}

/// Write raw string data to a file, overwriting any existing content.
async fn write_file<P: AsRef<Path> + std::fmt::Debug>(output: P, data: String) -> AppResult<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output)
        .await?;
    file.write_all(data.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
