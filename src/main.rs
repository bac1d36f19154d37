//! Endpoint Vitals 主程序入口
//!
//! HTTP/HTTPS/TCP 端点存活检测工具

use anyhow::{Context, Result};
use clap::Parser;
use endpoint_vitals::cli::args::{Args, Commands};
use endpoint_vitals::cli::commands::{
    CheckCommand, Command, ServeCommand, ValidateCommand, VersionCommand,
};
use endpoint_vitals::config::{ConfigLoader, TomlConfigLoader};
use endpoint_vitals::error::VitalsError;
use endpoint_vitals::logging::{LogConfig, LoggingSystem};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 配置文件中的日志级别，读取失败时交给命令本身报告
    let configured_level = TomlConfigLoader::new(true)
        .load_from_file(args.target_config_path())
        .await
        .ok()
        .and_then(|config| config.global.log_level);

    // 初始化日志系统
    let log_config = LogConfig {
        level: args.effective_log_level(configured_level.as_deref()),
        json_format: args.log_json,
    }
    .with_verbosity(args.verbose);

    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("Endpoint Vitals v{} 启动", endpoint_vitals::VERSION);

    // 执行命令
    match execute_command(&args).await {
        Ok(()) => Ok(()),
        Err(VitalsError::Unhealthy { unhealthy, total }) => {
            debug!("{}/{} 个端点检测异常", unhealthy, total);
            std::process::exit(1);
        }
        Err(e) => {
            error!("命令执行失败: {}", e);
            eprintln!("错误: {e}");
            std::process::exit(2);
        }
    }
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<(), VitalsError> {
    let command: Box<dyn Command> = match &args.command {
        Commands::Check { .. } => Box::new(CheckCommand),
        Commands::Validate { .. } => Box::new(ValidateCommand),
        Commands::Serve { .. } => Box::new(ServeCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    };
    command.execute(args).await
}
