//! 配置系统模块
//!
//! 统一处理 TOML 配置文件、环境变量、命令行参数

use crate::export::ChartOptions;
use crate::health::DEFAULT_FRIENDLY_TYPES;
use anyhow::{anyhow, Result};
use clap::Parser;
use config::{Config as ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 命令行参数
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "apple-health-parser")]
#[command(about = "流式解析 Apple Health 导出文件，导出 JSON 与折线图")]
#[command(version)]
pub struct Cli {
    /// Apple Health 导出文件 (export.xml)
    pub input: Option<PathBuf>,

    /// 需要提取的类型（友好名称，不区分大小写）
    pub types: Vec<String>,

    /// 导出格式，逗号分隔：json,png
    #[arg(long, value_enum, value_delimiter = ',', ignore_case = true)]
    pub format: Option<Vec<ExportFormat>>,

    /// 输出目录
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// 列出所有支持的类型后退出
    #[arg(long)]
    pub list_types: bool,

    /// 写出默认配置文件（`--config` 指定的路径或用户配置路径）后退出
    #[arg(long)]
    pub init_config: bool,
}

/// 导出格式
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Png,
}

/// 日志级别
#[derive(clap::ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// 输出配置
    pub output: OutputConfig,
    /// 图表配置
    pub chart: ChartConfig,
    /// 类型配置
    pub types: TypesConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 输出目录
    pub directory: PathBuf,
    /// 导出格式
    pub formats: Vec<ExportFormat>,
}

/// 图表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// 图表宽度（像素）
    pub width: u32,
    /// 图表高度（像素）
    pub height: u32,
}

/// 类型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    /// 未指定类型时使用的友好名称
    pub defaults: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 日志格式
    pub format: LogFormat,
    /// 日志输出目录
    pub directory: Option<PathBuf>,
}

/// 日志格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 简洁格式
    Compact,
    /// 详细格式
    Full,
    /// JSON 格式
    Json,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            formats: vec![ExportFormat::Json, ExportFormat::Png],
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        let options = ChartOptions::default();
        Self {
            width: options.width,
            height: options.height,
        }
    }
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            defaults: DEFAULT_FRIENDLY_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            directory: None,
        }
    }
}

impl ChartConfig {
    pub fn options(&self) -> ChartOptions {
        ChartOptions {
            width: self.width,
            height: self.height,
        }
    }
}

impl OutputConfig {
    pub fn wants(&self, format: ExportFormat) -> bool {
        self.formats.contains(&format)
    }
}

impl Config {
    /// 使用指定的 CLI 参数加载配置
    pub fn load_with_cli(cli: &Cli) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. 首先加载默认配置
        builder = builder.add_source(config::Config::try_from(&Config::default())?);

        // 2. 加载用户配置文件
        if let Some(user_config) = Self::get_user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config));
            }
        }

        // 3. 加载指定的配置文件
        if let Some(config_path) = &cli.config {
            if config_path.exists() {
                builder = builder.add_source(File::from(config_path.clone()));
            } else {
                return Err(anyhow!("配置文件不存在: {}", config_path.display()));
            }
        }

        // 4. 加载环境变量（前缀 APPLE_HEALTH_PARSER_）
        builder = builder.add_source(
            Environment::with_prefix("APPLE_HEALTH_PARSER")
                .prefix_separator("_")
                .separator("__"),
        );

        // 5. 构建配置
        let mut config: Config = builder.build()?.try_deserialize()?;

        // 6. 应用命令行参数覆盖
        config.apply_cli(cli);

        // 7. 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 命令行参数优先于所有其他配置源
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(log_level) = &cli.log_level {
            self.logging.level = log_level.clone();
        }

        if let Some(output_dir) = &cli.output_dir {
            self.output.directory = output_dir.clone();
        }

        if let Some(formats) = &cli.format {
            self.output.formats = formats.clone();
        }
    }

    /// 获取用户配置文件路径
    pub fn get_user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "apple-health-parser")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// 写出默认配置文件，已存在的文件不会被覆盖
    pub fn init_config_file(cli: &Cli) -> Result<PathBuf> {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Self::get_user_config_path().ok_or_else(|| anyhow!("无法确定用户配置目录"))?,
        };

        if path.exists() {
            return Err(anyhow!("配置文件已存在: {}", path.display()));
        }

        Config::default().save_to_file(&path)?;
        Ok(path)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| anyhow!("序列化配置失败: {}", e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置
    fn validate(&self) -> Result<()> {
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(anyhow!(
                "图表尺寸无效: {}x{}",
                self.chart.width,
                self.chart.height
            ));
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(anyhow!("输出目录不能为空"));
        }

        if self.types.defaults.is_empty() {
            return Err(anyhow!("默认类型列表不能为空"));
        }

        // 验证日志目录
        if let Some(log_dir) = &self.logging.directory {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir)?;
            }
        }

        Ok(())
    }

    /// 初始化日志系统
    ///
    /// 写入日志文件时返回的 guard 必须在程序结束前保持存活
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let level_filter = EnvFilter::builder()
            .with_default_directive(Level::from(self.logging.level.clone()).into())
            .from_env_lossy();

        let (file_writer, guard) = match &self.logging.directory {
            Some(log_dir) => {
                std::fs::create_dir_all(log_dir)?;
                let file_appender =
                    tracing_appender::rolling::daily(log_dir, "apple-health-parser.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                (Some(non_blocking), Some(guard))
            }
            None => (None, None),
        };

        // 根据格式选择不同的初始化方式
        let result = match self.logging.format {
            LogFormat::Compact => tracing_subscriber::registry()
                .with(level_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .with(file_writer.map(|writer| {
                    fmt::layer().compact().with_ansi(false).with_writer(writer)
                }))
                .try_init(),
            LogFormat::Full => tracing_subscriber::registry()
                .with(level_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(level_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(file_writer.map(|writer| fmt::layer().json().with_writer(writer)))
                .try_init(),
        };
        result.map_err(|e| anyhow!("日志系统初始化失败: {}", e))?;

        tracing::debug!("日志系统已初始化，级别: {:?}", self.logging.level);
        Ok(guard)
    }
}
