//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::types::Config;
use crate::config::{ConfigLoader, TomlConfigLoader};
use crate::error::{Result, VitalsError};
use crate::health::{normalize_all, CheckConfig, CheckResult, ConcurrentRunner, RunSummary};
use crate::report;
use crate::web::{server::shutdown_signal, WebAppState, WebServer};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                _ => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate { .. } = &args.command {
            self.validate_config_file(&args.target_config_path(), args.is_verbose())
                .await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;
        let specs = normalize_all(&config.services)?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            if let Some(ref level) = config.global.log_level {
                println!("  日志级别: {}", level);
            }
            println!("  请求超时: {}秒", config.global.request_timeout_seconds);
            println!("  最大并发: {}", config.global.max_concurrent_checks);

            println!("端点配置:");
            for (i, spec) in specs.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, spec.name, spec.url);
                println!("     协议: {}", spec.scheme);
                println!("     目标: {}", spec.authority());
                println!("     期望结果: {}", spec.expected);
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个端点配置", specs.len());
        }

        Ok(())
    }
}

/// 检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Check {
            service,
            format,
            timeout,
        } = &args.command
        {
            self.perform_check(args, service.as_deref(), *format, *timeout)
                .await
        } else {
            Ok(())
        }
    }
}

impl CheckCommand {
    /// 执行一次检测并输出结果
    ///
    /// 存在异常端点时返回 `VitalsError::Unhealthy`。
    async fn perform_check(
        &self,
        args: &Args,
        service_name: Option<&str>,
        format: OutputFormat,
        timeout: Option<u64>,
    ) -> Result<()> {
        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(args.get_config_path()).await?;

        let results = Self::run_check(&config, service_name, timeout).await?;
        if results.is_empty() {
            if let Some(name) = service_name {
                eprintln!("未找到名为 '{name}' 的端点");
            }
            return Ok(());
        }

        let output = match format {
            OutputFormat::Json => report::render_json(&results)?,
            OutputFormat::Table => report::render_table(&results),
            OutputFormat::Text => report::render_text(&results, args.is_verbose()),
        };
        print!("{output}");

        let summary = RunSummary::from_results(&results);
        if summary.all_healthy() {
            Ok(())
        } else {
            Err(VitalsError::Unhealthy {
                unhealthy: summary.unhealthy,
                total: summary.total,
            })
        }
    }

    /// 按名称过滤端点后执行一轮检测
    pub async fn run_check(
        config: &Config,
        service_name: Option<&str>,
        timeout: Option<u64>,
    ) -> Result<Vec<CheckResult>> {
        let descriptors: Vec<_> = config
            .services
            .iter()
            .filter(|s| service_name.is_none_or(|name| s.name == name))
            .cloned()
            .collect();
        let specs = normalize_all(&descriptors)?;

        let mut check_config = CheckConfig::from_global(&config.global);
        if let Some(seconds) = timeout {
            check_config = check_config.with_timeout(Duration::from_secs(seconds));
        }

        let runner = ConcurrentRunner::from_config(&check_config)?;
        Ok(runner.run(specs).await)
    }
}

/// Web服务命令
pub struct ServeCommand;

#[async_trait]
impl Command for ServeCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Serve { bind, port } = &args.command {
            let config_path = args.get_config_path();
            let loader = TomlConfigLoader::new(true);
            let config = loader.load_from_file(&config_path).await?;

            let mut web_config = config.global.web.clone().unwrap_or_default();
            if let Some(bind) = bind {
                web_config.bind_address = bind.clone();
            }
            if let Some(port) = port {
                web_config.port = *port;
            }

            let state = WebAppState::new(config_path, web_config);

            info!("启动Web服务");
            WebServer::new(state).start(shutdown_signal()).await
        } else {
            Ok(())
        }
    }
}
