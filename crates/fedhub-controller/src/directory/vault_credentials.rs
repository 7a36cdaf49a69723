//! 基于 Vault 的集群凭证解析
//!
//! 使用 AppRole 登录后读取 KV v2 中的集群凭证，
//! 凭证数据包含 `clusterApiUrl` 和 `clusterToken` 两个字段。

use async_trait::async_trait;
use fedhub_common::{ClusterCredential, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::CredentialResolver;

/// Vault 配置
#[derive(Clone, Deserialize, Serialize)]
pub struct VaultConfig {
    /// Vault 地址
    pub address: String,
    /// AppRole 角色 ID
    pub role_id: String,
    /// AppRole 密钥 ID
    pub secret_id: String,
    /// 集群凭证的基础路径，例如 secret/data/clusters
    pub cluster_path: String,
    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("cluster_path", &self.cluster_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AppRoleLogin<'a> {
    role_id: &'a str,
    secret_id: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct SecretResponse {
    data: SecretEnvelope,
}

#[derive(Deserialize)]
struct SecretEnvelope {
    data: ClusterSecret,
}

/// 凭证存储中的集群数据
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterSecret {
    cluster_api_url: String,
    cluster_token: String,
}

/// Vault 集群凭证解析器
#[derive(Debug, Clone)]
pub struct VaultCredentialResolver {
    /// HTTP 客户端
    client: Client,
    /// Vault 配置
    config: VaultConfig,
}

impl VaultCredentialResolver {
    /// 根据配置创建解析器
    pub fn new(config: VaultConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn address(&self) -> &str {
        self.config.address.trim_end_matches('/')
    }

    fn secret_url(&self, cluster_id: &str) -> String {
        format!(
            "{}/v1/{}/{}",
            self.address(),
            self.config.cluster_path.trim_matches('/'),
            cluster_id
        )
    }

    /// AppRole 登录，返回客户端令牌
    async fn login(&self) -> reqwest::Result<String> {
        let url = format!("{}/v1/auth/approle/login", self.address());
        let response: LoginResponse = self
            .client
            .post(url)
            .json(&AppRoleLogin {
                role_id: &self.config.role_id,
                secret_id: &self.config.secret_id,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.auth.client_token)
    }

    async fn read_secret(&self, cluster_id: &str) -> reqwest::Result<ClusterSecret> {
        let token = self.login().await?;
        let url = self.secret_url(cluster_id);
        debug!("读取集群凭证: {}", url);

        let response: SecretResponse = self
            .client
            .get(url)
            .header("X-Vault-Token", token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.data.data)
    }
}

#[async_trait]
impl CredentialResolver for VaultCredentialResolver {
    async fn get_cluster_credential(&self, cluster_id: &str) -> Result<ClusterCredential> {
        let secret = self.read_secret(cluster_id).await.map_err(|e| {
            error!(cluster_id = %cluster_id, "读取集群凭证失败: {}", e);
            Error::FailedToReadClusterInfo
        })?;

        Ok(ClusterCredential {
            cluster_id: cluster_id.to_string(),
            api_server_url: secret.cluster_api_url,
            bearer_token: secret.cluster_token,
        })
    }
}
