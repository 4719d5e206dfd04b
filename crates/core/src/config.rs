use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subdirectory of `%APPDATA%` shared by every trading terminal instance.
const TERMINAL_COMMON_FILES: [&str; 4] = ["MetaQuotes", "Terminal", "Common", "Files"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Working directory; relative paths below are resolved against it.
    pub base_dir: PathBuf,
    /// Downloaded legacy-format workbooks.
    pub legacy_dir: PathBuf,
    /// Normalized sheets read by the region locator.
    pub normalized_dir: PathBuf,
    /// Explicit output directory. When unset the terminal folder or `output` is used.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub cme_url: String,
    /// `{year}` is replaced with the current calendar year.
    pub cftc_url_template: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub archive_timeout_secs: u64,
    /// Weekdays to step back from today to reach the settled trade date.
    pub trading_days_back: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                base_dir: PathBuf::from("."),
                legacy_dir: PathBuf::from("old version"),
                normalized_dir: PathBuf::from("new version"),
                output_dir: None,
            },
            sources: SourcesConfig {
                cme_url: "https://www.cmegroup.com/CmeWS/exp/voiProductDetailsViewExport.ctl"
                    .to_string(),
                cftc_url_template: "https://www.cftc.gov/files/dea/history/fut_fin_xls_{year}.zip"
                    .to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                    .to_string(),
                request_timeout_secs: 30,
                archive_timeout_secs: 300,
                trading_days_back: 2,
            },
        }
    }
}

impl PathsConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    #[must_use]
    pub fn legacy_path(&self) -> PathBuf {
        self.resolve(&self.legacy_dir)
    }

    #[must_use]
    pub fn normalized_path(&self) -> PathBuf {
        self.resolve(&self.normalized_dir)
    }

    /// Resolves where result documents go.
    ///
    /// Order: configured `output_dir`, the terminal's common files folder under
    /// `appdata` when it exists, then `<base_dir>/output`.
    #[must_use]
    pub fn output_path(&self, appdata: Option<&Path>) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return self.resolve(dir);
        }

        if let Some(appdata) = appdata {
            let terminal = TERMINAL_COMMON_FILES
                .iter()
                .fold(appdata.to_path_buf(), |acc, part| acc.join(part));
            if terminal.is_dir() {
                return terminal;
            }
        }

        self.base_dir.join("output")
    }
}

impl SourcesConfig {
    #[must_use]
    pub fn cftc_url(&self, year: i32) -> String {
        self.cftc_url_template.replace("{year}", &year.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_dirs_resolve_against_base() {
        let mut config = AppConfig::default();
        config.paths.base_dir = PathBuf::from("/work");

        assert_eq!(config.paths.legacy_path(), PathBuf::from("/work/old version"));
        assert_eq!(
            config.paths.normalized_path(),
            PathBuf::from("/work/new version")
        );
        assert_eq!(config.paths.output_path(None), PathBuf::from("/work/output"));
    }

    #[test]
    fn test_explicit_output_dir_wins() {
        let mut config = AppConfig::default();
        config.paths.output_dir = Some(PathBuf::from("/srv/results"));

        let dir = TempDir::new().unwrap();
        assert_eq!(
            config.paths.output_path(Some(dir.path())),
            PathBuf::from("/srv/results")
        );
    }

    #[test]
    fn test_terminal_folder_used_when_present() {
        let appdata = TempDir::new().unwrap();
        let terminal = appdata
            .path()
            .join("MetaQuotes")
            .join("Terminal")
            .join("Common")
            .join("Files");
        std::fs::create_dir_all(&terminal).unwrap();

        let config = AppConfig::default();
        assert_eq!(config.paths.output_path(Some(appdata.path())), terminal);
    }

    #[test]
    fn test_missing_terminal_folder_falls_back() {
        let appdata = TempDir::new().unwrap();
        let config = AppConfig::default();
        assert_eq!(
            config.paths.output_path(Some(appdata.path())),
            PathBuf::from("./output")
        );
    }

    #[test]
    fn test_cftc_url_substitutes_year() {
        let config = AppConfig::default();
        assert_eq!(
            config.sources.cftc_url(2025),
            "https://www.cftc.gov/files/dea/history/fut_fin_xls_2025.zip"
        );
    }
}
