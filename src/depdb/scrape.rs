//! Runs the build system's database dump.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::errors::ScrapeError;

/// Run `<program> <target>` in `tree_root` and capture its stdout.
///
/// The dump is large (the full make database), so both streams are captured
/// rather than streamed; stderr only surfaces in the error path.
pub async fn print_db(
    tree_root: &Path,
    program: &str,
    target: &str,
) -> Result<String, ScrapeError> {
    let output = Command::new(program)
        .arg(target)
        .current_dir(tree_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| ScrapeError::SpawnFailed {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ScrapeError::PrintDbFailed {
            program: program.to_string(),
            target: target.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
