use crate::cli::{OutputArgs, VibrationArgs};
use crate::error::{CliError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use vibzmat::core::io::traits::{FloatFormat, WriteOptions};
use vibzmat::core::io::viewer::ViewerConfig;
use vibzmat::engine::config::{VibrationConfig, VibrationConfigBuilder};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialViewerConfig {
    program: Option<String>,
    use_current_dir: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOutputConfig {
    precision: Option<usize>,
    sort_index: Option<bool>,
    overwrite: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialVibrationConfig {
    start_index: Option<usize>,
    exclude_trans_rot: Option<bool>,
    zero_threshold: Option<f64>,
}

/// Settings read from the TOML configuration file. Every key is optional; CLI flags
/// take precedence over `-S` overrides, which take precedence over the file.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    viewer: Option<PartialViewerConfig>,
    output: Option<PartialOutputConfig>,
    vibration: Option<PartialVibrationConfig>,
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "vibzmat").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::parsing(path, e))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `explicit` if given, otherwise the platform config file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found, using defaults.");
                Ok(Self::default())
            }
        }
    }

    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "viewer.program" => {
                    self.viewer.get_or_insert_with(Default::default).program =
                        Some(value_str.to_string());
                }
                "viewer.use-current-dir" => {
                    self.viewer
                        .get_or_insert_with(Default::default)
                        .use_current_dir = Some(parse_value(key, value_str)?);
                }
                "output.precision" => {
                    self.output.get_or_insert_with(Default::default).precision =
                        Some(parse_value(key, value_str)?);
                }
                "output.sort-index" => {
                    self.output.get_or_insert_with(Default::default).sort_index =
                        Some(parse_value(key, value_str)?);
                }
                "output.overwrite" => {
                    self.output.get_or_insert_with(Default::default).overwrite =
                        Some(parse_value(key, value_str)?);
                }
                "vibration.start-index" => {
                    self.vibration
                        .get_or_insert_with(Default::default)
                        .start_index = Some(parse_value(key, value_str)?);
                }
                "vibration.exclude-trans-rot" => {
                    self.vibration
                        .get_or_insert_with(Default::default)
                        .exclude_trans_rot = Some(parse_value(key, value_str)?);
                }
                "vibration.zero-threshold" => {
                    self.vibration
                        .get_or_insert_with(Default::default)
                        .zero_threshold = Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn viewer_config(&self) -> ViewerConfig {
        let defaults = ViewerConfig::default();
        let partial = self.viewer.clone().unwrap_or_default();
        ViewerConfig {
            program: partial.program.unwrap_or(defaults.program),
            use_current_dir: partial.use_current_dir.unwrap_or(defaults.use_current_dir),
        }
    }

    pub fn write_options(&self, args: &OutputArgs) -> WriteOptions {
        let defaults = WriteOptions::default();
        let partial = self.output.clone().unwrap_or_default();

        let float_format = match args.precision.or(partial.precision) {
            Some(precision) => FloatFormat::Fixed { precision },
            None => defaults.float_format,
        };
        WriteOptions {
            sort_index: !args.no_sort && partial.sort_index.unwrap_or(defaults.sort_index),
            overwrite: !args.no_overwrite && partial.overwrite.unwrap_or(defaults.overwrite),
            float_format,
        }
    }

    pub fn start_index(&self, cli_value: Option<usize>) -> usize {
        cli_value
            .or(self.vibration.as_ref().and_then(|v| v.start_index))
            .unwrap_or(0)
    }

    pub fn vibration_config(&self, args: &VibrationArgs) -> Result<VibrationConfig> {
        let partial = self.vibration.clone().unwrap_or_default();
        let mut builder = VibrationConfigBuilder::new().start_index(self.start_index(args.start_index));

        if args.keep_trans_rot {
            builder = builder.exclude_trans_rot(false);
        } else if let Some(exclude) = partial.exclude_trans_rot {
            builder = builder.exclude_trans_rot(exclude);
        }
        if let Some(threshold) = partial.zero_threshold {
            builder = builder.zero_threshold(threshold);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value_str))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config_file(dir: &Path, content: &str) -> PathBuf {
        let file_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn empty_config_yields_library_defaults() {
        let config = PartialAppConfig::default();
        assert_eq!(config.viewer_config(), ViewerConfig::default());

        let options = config.write_options(&OutputArgs::default());
        assert!(options.sort_index);
        assert!(options.overwrite);
        assert_eq!(options.float_format.format(1.5), "1.500000");

        let vibration = config.vibration_config(&VibrationArgs::default()).unwrap();
        assert_eq!(vibration, VibrationConfig::default());
    }

    #[test]
    fn load_from_file_reads_every_section() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            dir.path(),
            r#"
            [viewer]
            program = "avogadro"
            use-current-dir = true

            [output]
            precision = 3
            sort-index = false

            [vibration]
            start-index = 1
            exclude-trans-rot = false
            "#,
        );

        let config = PartialAppConfig::load(Some(&path)).unwrap();
        let viewer = config.viewer_config();
        assert_eq!(viewer.program, "avogadro");
        assert!(viewer.use_current_dir);

        let options = config.write_options(&OutputArgs::default());
        assert!(!options.sort_index);
        assert!(options.overwrite);
        assert_eq!(options.float_format.format(1.5), "1.500");

        let vibration = config.vibration_config(&VibrationArgs::default()).unwrap();
        assert_eq!(vibration.start_index, 1);
        assert!(!vibration.exclude_trans_rot);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let config = PartialAppConfig::from_toml(
            r#"
            [output]
            precision = 3
            overwrite = true

            [vibration]
            start-index = 1
            exclude-trans-rot = true
            "#,
        )
        .unwrap();

        let output_args = OutputArgs {
            precision: Some(8),
            no_sort: true,
            no_overwrite: true,
        };
        let options = config.write_options(&output_args);
        assert!(!options.sort_index);
        assert!(!options.overwrite);
        assert_eq!(options.float_format.format(0.5), "0.50000000");

        let vibration_args = VibrationArgs {
            start_index: Some(5),
            keep_trans_rot: true,
            table: None,
        };
        let vibration = config.vibration_config(&vibration_args).unwrap();
        assert_eq!(vibration.start_index, 5);
        assert!(!vibration.exclude_trans_rot);
    }

    #[test]
    fn set_values_override_file_values() {
        let mut config = PartialAppConfig::from_toml(
            r#"
            [viewer]
            program = "avogadro"
            "#,
        )
        .unwrap();
        config
            .apply_set_values(&[
                "viewer.program=jmol".to_string(),
                "output.precision=4".to_string(),
                "vibration.zero-threshold=0.5".to_string(),
            ])
            .unwrap();

        assert_eq!(config.viewer_config().program, "jmol");
        let options = config.write_options(&OutputArgs::default());
        assert_eq!(options.float_format.format(2.0), "2.0000");
        let vibration = config.vibration_config(&VibrationArgs::default()).unwrap();
        assert_eq!(vibration.zero_threshold, 0.5);
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        let mut config = PartialAppConfig::default();
        for bad in ["output.precision", "output.precision=many", "unknown.key=1"] {
            let result = config.apply_set_values(&[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn negative_threshold_is_a_config_error() {
        let mut config = PartialAppConfig::default();
        config
            .apply_set_values(&["vibration.zero-threshold=-1".to_string()])
            .unwrap();
        let result = config.vibration_config(&VibrationArgs::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_keys_in_file_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            dir.path(),
            r#"
            [viewer]
            colour = "red"
            "#,
        );
        let result = PartialAppConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
