//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Endpoint Vitals - HTTP/HTTPS/TCP 端点存活检测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "endpoint-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "ENDPOINT_VITALS_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的 `log_level`，再缺省为 warn
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "ENDPOINT_VITALS_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", global = true)]
    pub log_json: bool,

    /// 详细程度，可重复
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "提高输出详细程度（可重复，如 -vv）",
        global = true
    )]
    pub verbose: u8,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 执行一次性检测
    Check {
        /// 端点名称（可选，不指定则检测所有端点）
        #[arg(value_name = "SERVICE", help = "端点名称")]
        service: Option<String>,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,

        /// 超时时间（秒），覆盖配置文件
        #[arg(
            short = 'w',
            long,
            visible_alias = "wait",
            value_name = "SECONDS",
            help = "超时时间（秒）",
            env = "ENDPOINT_VITALS_TIMEOUT",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        timeout: Option<u64>,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,
    },

    /// 启动Web页面
    Serve {
        /// 绑定地址，覆盖配置文件
        #[arg(short, long, value_name = "ADDR", help = "绑定地址")]
        bind: Option<String>,

        /// 监听端口，覆盖配置文件
        #[arg(short, long, value_name = "PORT", help = "监听端口")]
        port: Option<u16>,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
    /// 表格格式
    Table,
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::loader::get_default_config_path)
    }

    /// 当前命令要读取的配置文件
    ///
    /// `validate FILE` 指定的文件优先于全局 `--config`。
    pub fn target_config_path(&self) -> PathBuf {
        match &self.command {
            Commands::Validate {
                config_path: Some(path),
            } => path.clone(),
            _ => self.get_config_path(),
        }
    }

    /// 基础日志级别：命令行优先，其次配置文件，最后为 warn
    pub fn effective_log_level(&self, configured: Option<&str>) -> log::LevelFilter {
        self.log_level
            .map(log::LevelFilter::from)
            .or_else(|| configured.and_then(crate::logging::parse_level))
            .unwrap_or(log::LevelFilter::Warn)
    }

    /// 是否输出详细信息
    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 || matches!(self.log_level, Some(LogLevel::Debug | LogLevel::Trace))
    }
}
