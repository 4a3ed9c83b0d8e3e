//! Run configuration resolved once before the core runs.
//!
//! Which file, which year, which recovery policy: all front-end concerns,
//! settled here and never threaded through the ledger.

use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default statement filename as downloaded from CEI.
pub const DEFAULT_STATEMENT_NAME: &str = "InfoCEI.xls";

/// Everything the pipeline needs to run, fixed up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub file_path: PathBuf,
    pub actions_path: Option<PathBuf>,
    /// Overrides the year read from the statement banner, when present.
    pub year: Option<i32>,
    /// Abort on the first malformed row instead of skip-and-report.
    pub strict: bool,
}

/// Resolve the run configuration from command-line inputs.
///
/// When no file is given, looks for `InfoCEI.xls` in the current directory and
/// then in `~/Downloads`, where the CEI site drops it.
pub fn resolve(
    file: Option<PathBuf>,
    actions: Option<PathBuf>,
    year: Option<i32>,
    strict: bool,
) -> Result<RunConfig> {
    let file_path = match file {
        Some(path) => {
            if !path.exists() {
                bail!("statement file not found: {}", path.display());
            }
            path
        }
        None => {
            let cwd = std::env::current_dir()?;
            let home = std::env::var_os("HOME").map(PathBuf::from);
            discover_statement(&cwd, home.as_deref()).ok_or_else(|| {
                anyhow!(
                    "no statement file given and no {} found in the current \
                     directory or ~/Downloads",
                    DEFAULT_STATEMENT_NAME
                )
            })?
        }
    };

    if let Some(path) = &actions {
        if !path.exists() {
            bail!("actions file not found: {}", path.display());
        }
    }

    info!("using statement file: {}", file_path.display());
    Ok(RunConfig {
        file_path,
        actions_path: actions,
        year,
        strict,
    })
}

fn discover_statement(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(DEFAULT_STATEMENT_NAME);
    if local.exists() {
        return Some(local);
    }
    let downloads = home?.join("Downloads").join(DEFAULT_STATEMENT_NAME);
    downloads.exists().then_some(downloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_prefers_current_directory() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        std::fs::create_dir(home.path().join("Downloads")).unwrap();
        std::fs::write(cwd.path().join(DEFAULT_STATEMENT_NAME), b"x").unwrap();
        std::fs::write(
            home.path().join("Downloads").join(DEFAULT_STATEMENT_NAME),
            b"x",
        )
        .unwrap();

        let found = discover_statement(cwd.path(), Some(home.path())).unwrap();
        assert_eq!(found, cwd.path().join(DEFAULT_STATEMENT_NAME));
    }

    #[test]
    fn test_discover_falls_back_to_downloads() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let downloads = home.path().join("Downloads");
        std::fs::create_dir(&downloads).unwrap();
        std::fs::write(downloads.join(DEFAULT_STATEMENT_NAME), b"x").unwrap();

        let found = discover_statement(cwd.path(), Some(home.path())).unwrap();
        assert_eq!(found, downloads.join(DEFAULT_STATEMENT_NAME));
    }

    #[test]
    fn test_discover_nothing_found() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        assert!(discover_statement(cwd.path(), Some(home.path())).is_none());
    }

    #[test]
    fn test_resolve_rejects_missing_explicit_file() {
        let result = resolve(Some(PathBuf::from("/nonexistent/InfoCEI.xls")), None, None, false);
        assert!(result.is_err());
    }
}
