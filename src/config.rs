//! User configuration (`config.toml`).

use directories::ProjectDirs;
use gridcalc_engine::engine::EngineOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<OutputFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }

    /// Format implied by a file extension (`.md` is markdown, anything else CSV).
    pub fn from_path(path: &Path) -> OutputFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") => OutputFormat::Markdown,
            _ => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    engine: Option<EngineOptions>,
    output: Option<OutputSection>,
}

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSection {
    format: Option<OutputFormat>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub engine: EngineOptions,
    pub output_format: OutputFormat,
}

impl Config {
    fn from_file(file: ConfigFile) -> Config {
        Config {
            engine: file.engine.unwrap_or_default(),
            output_format: file.output.and_then(|o| o.format).unwrap_or_default(),
        }
    }
}

/// Load configuration from `config_file`, or from the user config dir when
/// `use_user_config` is set. Problems are returned as warnings and defaults
/// are used in their place.
pub fn load_config(config_file: Option<&PathBuf>, use_user_config: bool) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let path = match config_file {
        Some(path) => Some(path.clone()),
        None if use_user_config => user_config_path(),
        None => None,
    };

    let Some(path) = path else {
        return (Config::default(), warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(mut config) => {
                    if let Some(warning) = clamp_engine_options(&mut config) {
                        warnings.push(format!("{}: {}", path.display(), warning));
                    }
                    Some(config)
                }
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(Config::from_file(file))
}

/// Pull engine settings into the range the engine accepts, describing the change.
fn clamp_engine_options(config: &mut Config) -> Option<String> {
    let requested = config.engine.max_depth;
    let depth = config.engine.effective_max_depth();
    if requested == depth {
        return None;
    }
    config.engine.max_depth = depth;
    Some(format!(
        "engine.max_depth = {} is outside 1..={}, using {}",
        requested,
        EngineOptions::MAX_DEPTH_LIMIT,
        depth
    ))
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config("[engine]\nmax_depth = 32\n\n[output]\nformat = \"markdown\"\n")
            .unwrap();
        assert_eq!(config.engine.max_depth, 32);
        assert_eq!(config.output_format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
        let config = parse_config("[engine]\n").unwrap();
        assert_eq!(config.engine, EngineOptions::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("[engine]\nmax_dept = 3\n").is_err());
        assert!(parse_config("[colors]\n").is_err());
        assert!(parse_config("[output]\nformat = \"xlsx\"\n").is_err());
    }

    #[test]
    fn test_out_of_range_max_depth_is_clamped_with_warning() {
        let mut config = parse_config("[engine]\nmax_depth = 0\n").unwrap();
        let warning = clamp_engine_options(&mut config).unwrap();
        assert!(warning.contains("max_depth = 0"));
        assert_eq!(config.engine.max_depth, 1);

        let mut config = parse_config("[engine]\nmax_depth = 100000\n").unwrap();
        assert!(clamp_engine_options(&mut config).is_some());
        assert_eq!(config.engine.max_depth, EngineOptions::MAX_DEPTH_LIMIT);

        let mut config = parse_config("[engine]\nmax_depth = 32\n").unwrap();
        assert!(clamp_engine_options(&mut config).is_none());
        assert_eq!(config.engine.max_depth, 32);
    }

    #[test]
    fn test_config_file_with_bad_depth_warns() {
        let path = std::env::temp_dir().join(format!("gridcalc-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[engine]\nmax_depth = 0\n").unwrap();
        let (config, warnings) = load_config(Some(&path), false);
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.engine.max_depth, 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let path = PathBuf::from("/nonexistent/gridcalc/config.toml");
        let (config, warnings) = load_config(Some(&path), true);
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_no_config_skips_user_file() {
        let (config, warnings) = load_config(None, false);
        assert_eq!(config, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_output_format_helpers() {
        assert_eq!(OutputFormat::parse("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("xls"), None);
        assert_eq!(OutputFormat::from_path(Path::new("out.MD")), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_path(Path::new("out.txt")), OutputFormat::Csv);
    }
}
