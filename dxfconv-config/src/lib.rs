use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dxfconv_core::options::{Orientation, OutputFormat, PageSize, RenderOptions};
use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV_VAR: &str = "DXFCONV_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFCONV_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
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

/// 页面尺寸可以写预设名称（`"a4"`），也可以写 `{ width, height }` 表。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PageSizeSetting {
    Named(String),
    Custom { width: f64, height: f64 },
}

impl PageSizeSetting {
    pub fn resolve(&self) -> Result<PageSize, ConfigError> {
        match self {
            PageSizeSetting::Named(name) => {
                PageSize::from_name(name).ok_or_else(|| ConfigError::UnknownPageSize(name.clone()))
            }
            PageSizeSetting::Custom { width, height } => Ok(PageSize::new(*width, *height)),
        }
    }
}

impl Default for PageSizeSetting {
    fn default() -> Self {
        PageSizeSetting::Named("a4".to_string())
    }
}

/// 默认输出参数，命令行参数可逐项覆盖。
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub page_size: PageSizeSetting,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub scale: f64,
    #[serde(default = "OutputConfig::default_margin")]
    pub margin: f64,
    #[serde(default)]
    pub font: Option<String>,
}

impl OutputConfig {
    fn default_margin() -> f64 {
        10.0
    }

    pub fn to_render_options(&self) -> Result<RenderOptions, ConfigError> {
        Ok(RenderOptions {
            page_size: self.page_size.resolve()?,
            orientation: self.orientation,
            format: self.format,
            scale: self.scale,
            margin: self.margin,
            font: self.font.clone(),
        })
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            page_size: PageSizeSetting::default(),
            orientation: Orientation::default(),
            format: OutputFormat::default(),
            scale: 0.0,
            margin: Self::default_margin(),
            font: None,
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
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("未知的页面尺寸 {0:?}，可选 a3、a4、a5、letter")]
    UnknownPageSize(String),
}
