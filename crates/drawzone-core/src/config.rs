// Configuration loading and parsing (app.toml, zones.toml, credentials.toml).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::access::{CurrentUser, Whitelist};
use crate::source::{DirectorySource, DrawSource, HttpSource};
use crate::zones::{GroupDef, GroupSet, ZoneError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },

    #[error("invalid zone group in {path}: {source}")]
    Zones { path: PathBuf, source: ZoneError },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub db_path: PathBuf,
    pub ui: UiConfig,
    /// `None` when app.toml has no `[access]` section: the gate is off.
    pub access: Option<Whitelist>,
    pub groups: GroupSet,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// app.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire app.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    data: DataConfig,
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    ui: UiConfig,
    #[serde(default)]
    access: Option<Whitelist>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Directory,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl DataConfig {
    /// Construct the configured draw source.
    pub fn build_source(&self) -> Arc<dyn DrawSource> {
        match (self.source, self.base_url.as_deref()) {
            (SourceKind::Http, Some(base_url)) => Arc::new(HttpSource::new(base_url)),
            _ => Arc::new(DirectorySource::new(&self.dir)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_group_name")]
    pub default_group: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            default_group: default_group_name(),
        }
    }
}

fn default_group_name() -> String {
    "A".to_string()
}

// ---------------------------------------------------------------------------
// zones.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
struct ZonesFile {
    #[serde(default)]
    group: Vec<GroupDef>,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    user: CredentialsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl CredentialsConfig {
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            email: self.email.clone().filter(|e| !e.trim().is_empty()),
            display_name: self.display_name.clone().filter(|n| !n.trim().is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/app.toml` and the optional
/// `config/zones.toml` and `config/credentials.toml`, all relative to
/// `base_dir`. Relative data and database paths resolve against `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- app.toml (required) ---
    let app_path = config_dir.join("app.toml");
    let app_file: AppFile = parse_file(&app_path)?;

    let mut data = app_file.data;
    if data.dir.is_relative() {
        data.dir = base_dir.join(&data.dir);
    }

    let db_path = match app_file.database.path {
        Some(path) if path.is_relative() => base_dir.join(path),
        Some(path) => path,
        None => default_db_path(),
    };

    // --- zones.toml (optional) ---
    let zones_path = config_dir.join("zones.toml");
    let zones_file: ZonesFile = if zones_path.exists() {
        parse_file(&zones_path)?
    } else {
        ZonesFile::default()
    };
    let groups = GroupSet::with_overrides(&zones_file.group).map_err(|source| {
        ConfigError::Zones {
            path: zones_path.clone(),
            source,
        }
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        parse_file::<CredentialsFile>(&credentials_path)?.user
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        data,
        db_path,
        ui: app_file.ui,
        access: app_file.access,
        groups,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = read_file(path)?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Per-user data directory, falling back to the working directory.
fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "drawzone")
        .map(|dirs| dirs.data_dir().join("drawzone.db"))
        .unwrap_or_else(|| PathBuf::from("drawzone.db"))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let data = &config.data;
    if data.source == SourceKind::Http {
        match data.base_url.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(ConfigError::ValidationError {
                    field: "data.base_url".into(),
                    message: "required when data.source = \"http\"".into(),
                });
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(ConfigError::ValidationError {
                    field: "data.base_url".into(),
                    message: format!("must be an http(s) URL, got `{url}`"),
                });
            }
            Some(_) => {}
        }
    }

    if data.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.dir".into(),
            message: "must not be empty".into(),
        });
    }

    if config.groups.get(&config.ui.default_group).is_none() {
        let known: Vec<&str> = config.groups.iter().map(|g| g.name()).collect();
        return Err(ConfigError::ValidationError {
            field: "ui.default_group".into(),
            message: format!(
                "unknown group `{}`; expected one of {}",
                config.ui.default_group,
                known.join(", ")
            ),
        });
    }

    if let Some(access) = &config.access {
        if let Some(bad) = access.allowed_emails.iter().find(|e| !e.contains('@')) {
            return Err(ConfigError::ValidationError {
                field: "access.allowed_emails".into(),
                message: format!("`{bad}` is not an email address"),
            });
        }
        if let Some(bad) = access
            .allowed_domains
            .iter()
            .find(|d| d.is_empty() || d.contains('@'))
        {
            return Err(ConfigError::ValidationError {
                field: "access.allowed_domains".into(),
                message: format!("`{bad}` is not a bare domain"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    /// Fresh temp dir with a `config/` holding the given app.toml.
    fn temp_config(tag: &str, app_toml: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("drawzone_config_{tag}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/app.toml"), app_toml).unwrap();
        tmp
    }

    const MINIMAL: &str = "[data]\nsource = \"directory\"\ndir = \"data\"\n\n[database]\npath = \"drawzone.db\"\n";

    #[test]
    fn load_valid_config_from_project_defaults() {
        let tmp = std::env::temp_dir().join("drawzone_config_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        let root = project_root();
        for name in ["app.toml", "credentials.toml.example", "zones.toml.example"] {
            fs::copy(root.join("defaults").join(name), tmp.join("defaults").join(name)).unwrap();
        }

        ensure_config_files(&tmp).expect("should copy default configs");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.data.source, SourceKind::Directory);
        assert_eq!(config.data.dir, tmp.join("data"));
        assert_eq!(config.db_path, tmp.join("drawzone.db"));
        assert_eq!(config.ui.default_group, "A");
        assert!(config.access.is_none());
        assert_eq!(config.groups.len(), 5);
        assert!(config.credentials.email.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn minimal_app_toml_uses_defaults() {
        let tmp = temp_config("minimal", "[data]\n");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.data.source, SourceKind::Directory);
        assert_eq!(config.data.dir, tmp.join("data"));
        assert_eq!(config.ui.default_group, "A");
        assert!(config.db_path.ends_with("drawzone.db"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn http_source_requires_base_url() {
        let tmp = temp_config("http_no_url", "[data]\nsource = \"http\"\n");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "data.base_url"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn http_source_rejects_non_http_url() {
        let tmp = temp_config(
            "http_bad_url",
            "[data]\nsource = \"http\"\nbase_url = \"ftp://example.org\"\n",
        );
        let err = load_config_from(&tmp).unwrap_err();
        assert!(err.to_string().contains("data.base_url"), "{err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn http_source_builds_http_source() {
        let tmp = temp_config(
            "http_ok",
            "[data]\nsource = \"http\"\nbase_url = \"https://example.org/lottery/\"\n",
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.data.build_source().describe(), "https://example.org/lottery");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_source_kind_is_parse_error() {
        let tmp = temp_config("bad_source", "[data]\nsource = \"ftp\"\n");
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_default_group() {
        let tmp = temp_config("bad_group", &format!("{MINIMAL}\n[ui]\ndefault_group = \"Z\"\n"));
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "ui.default_group");
                assert!(message.contains("New-B"));
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn access_section_is_parsed_and_validated() {
        let tmp = temp_config(
            "access_ok",
            &format!("{MINIMAL}\n[access]\nallowed_emails = [\"a@example.org\"]\nallowed_domains = [\"team.example\"]\n"),
        );
        let config = load_config_from(&tmp).unwrap();
        let access = config.access.unwrap();
        assert!(access.allows(Some("x@team.example")));
        let _ = fs::remove_dir_all(&tmp);

        let tmp = temp_config(
            "access_bad",
            &format!("{MINIMAL}\n[access]\nallowed_emails = [\"not-an-email\"]\n"),
        );
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "access.allowed_emails"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn zones_toml_overrides_and_extends_groups() {
        let tmp = temp_config("zones_ok", MINIMAL);
        fs::write(
            tmp.join("config/zones.toml"),
            "[[group]]\nname = \"A\"\nzones = [[1, 2], [3, 4], [5, 6]]\n\n\
             [[group]]\nname = \"Custom\"\nzones = [[10], [20], [30]]\n",
        )
        .unwrap();
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.groups.len(), 6);
        assert_eq!(config.groups.position("A"), Some(0));
        assert_eq!(config.groups.get("A").unwrap().zone_of(5), Some(2));
        assert_eq!(config.groups.position("Custom"), Some(5));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn overlapping_zones_toml_is_rejected() {
        let tmp = temp_config("zones_overlap", MINIMAL);
        fs::write(
            tmp.join("config/zones.toml"),
            "[[group]]\nname = \"Bad\"\nzones = [[1, 2], [2, 3], [4]]\n",
        )
        .unwrap();
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::Zones { path, source } => {
                assert!(path.ends_with("zones.toml"));
                assert!(matches!(source, ZoneError::Overlap { number: 2, .. }));
            }
            other => panic!("expected Zones error, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_is_optional_and_parsed() {
        let tmp = temp_config("credentials", MINIMAL);
        assert!(load_config_from(&tmp).unwrap().credentials.email.is_none());

        fs::write(
            tmp.join("config/credentials.toml"),
            "[user]\nemail = \"alice@example.org\"\ndisplay_name = \"\"\n",
        )
        .unwrap();
        let user = load_config_from(&tmp).unwrap().credentials.current_user();
        assert_eq!(user.email.as_deref(), Some("alice@example.org"));
        assert_eq!(user.display_name, None);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_app_toml() {
        let tmp = std::env::temp_dir().join("drawzone_config_missing_app");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("app.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config("invalid_toml", "this is not valid [[[ toml");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("app.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_existing() {
        let tmp = std::env::temp_dir().join("drawzone_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        fs::write(defaults_dir.join("app.toml"), MINIMAL).unwrap();
        fs::write(defaults_dir.join("zones.toml"), "").unwrap();
        fs::write(defaults_dir.join("credentials.toml.example"), "[user]\n").unwrap();
        fs::write(config_dir.join("app.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("zones.toml"));
        assert_eq!(fs::read_to_string(config_dir.join("app.toml")).unwrap(), "# custom\n");
        assert!(!config_dir.join("credentials.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("drawzone_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
