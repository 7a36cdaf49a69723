//! 配置管理模块
//!
//! 该模块负责加载服务配置。配置来源依次为内置默认值、可选的 YAML/JSON 配置文件，
//! 以及 `FEDHUB__` 前缀的环境变量（层级之间用 `__` 分隔，例如
//! `FEDHUB__DIRECTORY__BASE_URL`）。配置在启动时加载一次，之后以参数形式传给各组件。

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use fedhub_controller::{DirectoryConfig, PollConfig, VaultConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// 环境变量前缀
const ENV_PREFIX: &str = "FEDHUB";

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 联邦控制平面
    #[serde(default)]
    pub control_plane: ControlPlaneConfig,
    /// 目录服务
    pub directory: DirectoryConfig,
    /// 凭证存储
    pub vault: VaultConfig,
    /// 注册与注销
    #[serde(default)]
    pub registration: PollConfig,
}

/// 控制平面连接配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    /// kubeconfig 路径，未设置时使用集群内配置或默认 kubeconfig
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    /// kubeconfig 上下文
    #[serde(default)]
    pub context: Option<String>,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// 加载配置
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => FileFormat::Yaml,
                Some("json") => FileFormat::Json,
                _ => return Err(anyhow!("不支持的配置文件格式，仅支持 YAML 或 JSON")),
            };
            let file = path.to_str().ok_or_else(|| anyhow!("配置路径无效"))?;
            builder = builder.add_source(File::new(file, format));
            info!("从 {} 加载配置", path.display());
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("构建配置失败")?;

        config
            .try_deserialize::<ServerConfig>()
            .context("配置格式错误")
    }

    /// 监听的套接字地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.listen_address, self.port)
            .parse()
            .with_context(|| format!("无效的监听地址: {}:{}", self.listen_address, self.port))
    }
}
