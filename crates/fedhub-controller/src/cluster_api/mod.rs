//! 集群 API 模块
//!
//! 该模块抽象了对单个 Kubernetes 集群（联邦控制平面或成员集群）的访问。
//! 包括控制平面集群对象的生命周期操作和面向任意资源类型的动态操作。

mod crd;
mod kube_api;

pub use crd::{Cluster, ClusterSpec, ClusterStatus, ClusterSyncMode, LocalSecretReference};
pub use kube_api::{KubeClusterApi, KubeConnector};
#[cfg(any(test, feature = "testing"))]
pub(crate) use kube_api::api_resource;

use async_trait::async_trait;
use fedhub_common::{ClusterCredential, ResourceKind};
use kube::api::DynamicObject;
use std::sync::Arc;
use thiserror::Error;

/// 集群 API 错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 对象不存在
    #[error("对象不存在: {0}")]
    NotFound(String),

    /// 对象已存在
    #[error("对象已存在: {0}")]
    AlreadyExists(String),

    /// 集群连接配置无效
    #[error("集群配置无效: {0}")]
    InvalidConfig(String),

    /// 其他 Kubernetes API 错误
    #[error("Kubernetes API 错误: {0}")]
    Kube(kube::Error),
}

impl ApiError {
    /// 是否为对象不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// 是否为对象已存在
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ApiError::AlreadyExists(_))
    }
}

impl From<kube::Error> for ApiError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(resp) if resp.code == 404 => ApiError::NotFound(resp.message),
            kube::Error::Api(resp) if resp.code == 409 => ApiError::AlreadyExists(resp.message),
            other => ApiError::Kube(other),
        }
    }
}

/// 集群 API 结果类型别名
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 以 Push 模式加入控制平面所需的信息
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterJoinSpec {
    /// 控制平面中的集群对象名称
    pub name: String,
    /// 成员集群 API 服务器地址
    pub api_endpoint: String,
    /// 成员集群认证令牌
    pub bearer_token: String,
}

impl ClusterJoinSpec {
    /// 由成员集群凭证构造，地址无法解析时返回 `InvalidConfig`
    pub fn from_credential(name: &str, credential: &ClusterCredential) -> ApiResult<Self> {
        credential
            .api_server_url
            .parse::<http::Uri>()
            .ok()
            .filter(|uri| uri.scheme().is_some() && uri.host().is_some())
            .ok_or_else(|| {
                ApiError::InvalidConfig(format!(
                    "无效的 API 服务器地址: {}",
                    credential.api_server_url
                ))
            })?;

        Ok(Self {
            name: name.to_string(),
            api_endpoint: credential.api_server_url.clone(),
            bearer_token: credential.bearer_token.clone(),
        })
    }
}

impl std::fmt::Debug for ClusterJoinSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterJoinSpec")
            .field("name", &self.name)
            .field("api_endpoint", &self.api_endpoint)
            .finish_non_exhaustive()
    }
}

/// 控制平面中的集群对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCluster {
    /// 集群对象名称
    pub name: String,
    /// 集群对象 UID
    pub uid: String,
    /// Kubernetes 版本
    pub kubernetes_version: Option<String>,
    /// Ready 条件，缺失时为 None
    pub ready: Option<bool>,
    /// 同步模式
    pub sync_mode: ClusterSyncMode,
}

/// 单个集群的 API 访问接口
///
/// `namespace` 为 None 时表示集群级操作；对命名空间级资源类型必须提供命名空间。
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// 以 Push 模式在控制平面中创建集群对象
    async fn create_cluster(&self, spec: &ClusterJoinSpec) -> ApiResult<()>;

    /// 读取控制平面中的集群对象
    async fn get_cluster(&self, name: &str) -> ApiResult<FederatedCluster>;

    /// 列出控制平面中的所有集群对象
    async fn list_clusters(&self) -> ApiResult<Vec<FederatedCluster>>;

    /// 删除控制平面中的集群对象
    async fn delete_cluster(&self, name: &str) -> ApiResult<()>;

    /// 列出资源
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> ApiResult<Vec<DynamicObject>>;

    /// 读取单个资源
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> ApiResult<DynamicObject>;

    /// 创建资源
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> ApiResult<DynamicObject>;
}

/// 根据成员集群凭证建立集群 API 连接
pub trait ClusterConnector: Send + Sync {
    /// 建立连接
    fn connect(&self, credential: &ClusterCredential) -> ApiResult<Arc<dyn ClusterApi>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: format!("code {}", code),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn test_api_error_from_kube() {
        assert!(ApiError::from(api_error(404)).is_not_found());
        assert!(ApiError::from(api_error(409)).is_already_exists());
        assert!(matches!(ApiError::from(api_error(500)), ApiError::Kube(_)));
    }

    #[test]
    fn test_join_spec_requires_absolute_url() {
        let mut credential = ClusterCredential {
            cluster_id: "c-1".into(),
            api_server_url: "https://10.0.0.1:6443".into(),
            bearer_token: "s3cr3t".into(),
        };
        let spec = ClusterJoinSpec::from_credential("alpha", &credential).unwrap();
        assert_eq!(spec.api_endpoint, "https://10.0.0.1:6443");
        assert!(!format!("{:?}", spec).contains("s3cr3t"));

        credential.api_server_url = "not a url".into();
        assert!(matches!(
            ClusterJoinSpec::from_credential("alpha", &credential),
            Err(ApiError::InvalidConfig(_))
        ));
    }
}
