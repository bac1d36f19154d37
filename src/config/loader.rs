//! 配置加载器实现
//!
//! 提供TOML/YAML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config, EndpointDescriptor};
use crate::error::{ConfigError, Result};
use crate::health::spec::normalize_all;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    ///
    /// # 参数
    /// * `content` - 配置文件内容
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    ///
    /// # 参数
    /// * `config` - 要验证的配置
    ///
    /// # 返回
    /// * `Result<()>` - 验证结果
    fn validate(&self, config: &Config) -> Result<()>;
}

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// 按扩展名判断格式，未知扩展名按 TOML 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Toml,
        }
    }
}

/// YAML 文件既可以是完整配置，也可以只是端点列表
#[derive(Deserialize)]
#[serde(untagged)]
enum YamlDocument {
    List(Vec<EndpointDescriptor>),
    Full(Config),
}

/// TOML配置加载器实现，同时接受 YAML 端点列表
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用环境变量替换
    ///
    /// # 返回
    /// * `Self` - 配置加载器实例
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中的环境变量
    ///
    /// # 参数
    /// * `content` - 要处理的字符串
    ///
    /// # 返回
    /// * `Result<String>` - 替换后的字符串或错误
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        // 匹配 ${VAR_NAME} 格式的环境变量
        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {e}")))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    /// 按格式解析配置内容
    fn parse(&self, content: &str, format: ConfigFormat) -> Result<Config> {
        let processed_content = self.substitute_env_vars(content)?;

        let config = match format {
            ConfigFormat::Toml => toml::from_str(&processed_content)
                .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {e}")))?,
            ConfigFormat::Yaml => {
                match serde_yaml::from_str::<YamlDocument>(&processed_content)
                    .map_err(|e| ConfigError::ParseError(format!("YAML解析失败: {e}")))?
                {
                    YamlDocument::List(services) => Config {
                        global: Default::default(),
                        services,
                    },
                    YamlDocument::Full(config) => config,
                }
            }
        };

        Ok(config)
    }

    /// 读取文件内容
    async fn read_file(path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {e}")).into())
    }

    /// 合并 `services_file` 指向的端点列表
    async fn merge_services_file(&self, config: &mut Config, config_path: &Path) -> Result<()> {
        let Some(services_file) = config.global.services_file.clone() else {
            return Ok(());
        };

        let services_path = resolve_relative(config_path, &services_file);
        let content = Self::read_file(&services_path).await?;
        let extra = self.parse(&content, ConfigFormat::from_path(&services_path))?;

        log::debug!(
            "从 {} 加载了 {} 个端点",
            services_path.display(),
            extra.services.len()
        );
        config.services.extend(extra.services);
        Ok(())
    }
}

impl Default for TomlConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        let content = Self::read_file(path).await?;
        let mut config = self.parse(&content, ConfigFormat::from_path(path))?;
        self.merge_services_file(&mut config, path).await?;

        self.validate(&config)?;

        log::info!(
            "成功加载配置文件: {}，端点数量: {}",
            path.display(),
            config.services.len()
        );
        log::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse(content, ConfigFormat::Toml)?;

        self.validate(&config)?;

        log::debug!("成功解析配置字符串");

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(ConfigError::ValidationError)?;

        // 名称重复不影响检测，只会让结果难以阅读
        let mut seen = HashSet::new();
        for service in &config.services {
            if !seen.insert(service.name.as_str()) {
                log::warn!("端点名称重复: {}", service.name);
            }
        }

        normalize_all(&config.services)?;
        Ok(())
    }
}

/// 相对路径以配置文件所在目录为基准
fn resolve_relative(config_path: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }
    config_path
        .parent()
        .map(|dir| dir.join(target))
        .unwrap_or_else(|| target.to_path_buf())
}

/// 获取默认配置文件路径
///
/// 当前目录存在 `config.toml` 时使用它，否则使用用户配置目录下的
/// `endpoint-vitals/config.toml`。
pub fn get_default_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join(crate::APP_NAME).join("config.toml"))
        .unwrap_or(local)
}
