use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Writes `rendered` to `out_file`, or to stdout when no file is given.
///
/// # Errors
///
/// Returns an error when the file or stdout cannot be written.
pub async fn emit(rendered: &str, out_file: Option<&Path>) -> AppResult<()> {
    match out_file {
        Some(path) => {
            write_file(path, rendered)
                .await
                .map_err(|err| AppError::WriteFile {
                    path: path.to_path_buf(),
                    source: err,
                })?;
            info!("Results saved to {}", path.display());
            Ok(())
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

async fn write_file(path: &Path, rendered: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(rendered.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
