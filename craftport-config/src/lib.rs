use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "CRAFTPORT_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    /// 从显式路径加载配置，并校验转换参数。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config
            .conversion
            .validate()
            .map_err(|(field, message)| ConfigError::Invalid {
                path: path.to_path_buf(),
                field,
                message,
            })?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `CRAFTPORT_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 转换默认值，命令行参数会覆盖这里的设置。
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    #[serde(default = "ConversionConfig::default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub exclude_types: Vec<String>,
    /// 默认输出文件名 = 输入文件名主干 + 后缀 + `.xml`。
    #[serde(default = "ConversionConfig::default_output_suffix")]
    pub output_suffix: String,
}

impl ConversionConfig {
    /// 倍率须为正的有限数；后缀只作用于文件名，不能包含路径分隔符。
    fn validate(&self) -> Result<(), (&'static str, String)> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(("scale", format!("倍率必须为正数，实际为 {}", self.scale)));
        }
        if self.output_suffix.contains(['/', '\\']) {
            return Err((
                "output_suffix",
                format!("后缀不能包含路径分隔符：{:?}", self.output_suffix),
            ));
        }
        if self.exclude_types.iter().any(|part_type| part_type.trim().is_empty()) {
            return Err(("exclude_types", "零件类型不能为空".to_string()));
        }
        Ok(())
    }

    fn default_scale() -> f64 {
        1.0
    }

    fn default_output_suffix() -> String {
        "_SR".to_string()
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scale: Self::default_scale(),
            exclude_types: Vec::new(),
            output_suffix: Self::default_output_suffix(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置文件 {path:?} 中 `conversion.{field}` 无效: {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_every_section() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.conversion.scale, 1.0);
        assert!(cfg.conversion.exclude_types.is_empty());
        assert_eq!(cfg.conversion.output_suffix, "_SR");
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [conversion]
            scale = 2.5
            exclude_types = ["Block-2", "Wing-2"]
            output_suffix = "_converted"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.conversion.scale, 2.5);
        assert_eq!(cfg.conversion.exclude_types, ["Block-2", "Wing-2"]);
        assert_eq!(cfg.conversion.output_suffix, "_converted");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\nscale = 0.5").unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.conversion.scale, 0.5);
        assert_eq!(cfg.conversion.output_suffix, "_SR");
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\nscale = \"big\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn non_positive_scale_is_rejected_at_load() {
        for scale in ["0.0", "-1.5", "nan"] {
            let mut file = tempfile::NamedTempFile::new().expect("create temp file");
            writeln!(file, "[conversion]\nscale = {scale}").unwrap();

            let err = AppConfig::from_file(file.path()).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field: "scale", .. }),
                "scale = {scale}: {err}"
            );
        }
    }

    #[test]
    fn suffix_with_path_separator_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\noutput_suffix = \"/../out\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "output_suffix", .. }));
    }

    #[test]
    fn blank_excluded_type_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[conversion]\nexclude_types = [\"Wing-3\", \" \"]").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "exclude_types", .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
