//! 集群模型
//!
//! 该模块定义了目录服务中登记的成员集群、访问成员集群所需的凭证、
//! 注册成功后写回目录服务的联邦记录，以及批量注册的单集群结果。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// 目录服务中登记的集群
///
/// 是否已加入联邦由 `federated_cluster_uid` 是否为空决定，不单独存储。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ManagedClusterRecord", into = "ManagedClusterRecord")]
pub struct ManagedCluster {
    /// 外部集群 ID
    pub cluster_id: String,
    /// 集群名称
    pub name: String,
    /// 控制平面中集群对象的 UID，未加入联邦时为空
    pub federated_cluster_uid: String,
    /// 控制平面中集群对象的名称
    pub federated_cluster_name: String,
}

impl ManagedCluster {
    /// 创建尚未加入联邦的集群记录
    pub fn new(cluster_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            name: name.into(),
            federated_cluster_uid: String::new(),
            federated_cluster_name: String::new(),
        }
    }

    /// 标记为已加入联邦
    pub fn federated(mut self, uid: impl Into<String>, name: impl Into<String>) -> Self {
        self.federated_cluster_uid = uid.into();
        self.federated_cluster_name = name.into();
        self
    }

    /// 是否已加入联邦
    pub fn is_federated(&self) -> bool {
        !self.federated_cluster_uid.is_empty()
    }
}

/// 目录服务的线上格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedClusterRecord {
    cluster_id: String,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "federatedClusterUID")]
    federated_cluster_uid: String,
    #[serde(default)]
    federated_cluster_name: String,
    // 入站时忽略，始终由 UID 推导
    #[serde(default)]
    is_federated: bool,
}

impl From<ManagedClusterRecord> for ManagedCluster {
    fn from(record: ManagedClusterRecord) -> Self {
        Self {
            cluster_id: record.cluster_id,
            name: record.name,
            federated_cluster_uid: record.federated_cluster_uid,
            federated_cluster_name: record.federated_cluster_name,
        }
    }
}

impl From<ManagedCluster> for ManagedClusterRecord {
    fn from(cluster: ManagedCluster) -> Self {
        let is_federated = cluster.is_federated();
        Self {
            cluster_id: cluster.cluster_id,
            name: cluster.name,
            federated_cluster_uid: cluster.federated_cluster_uid,
            federated_cluster_name: cluster.federated_cluster_name,
            is_federated,
        }
    }
}

/// 检查集群是否可以注册
///
/// 不存在时返回 `ClusterNotFound`，已加入联邦时返回 `ClusterAlreadyRegistered`。
pub fn find_registrable_cluster<'a>(
    clusters: &'a [ManagedCluster],
    cluster_id: &str,
) -> Result<&'a ManagedCluster> {
    let cluster = clusters
        .iter()
        .find(|c| c.cluster_id == cluster_id)
        .ok_or(Error::ClusterNotFound)?;

    if cluster.is_federated() {
        return Err(Error::ClusterAlreadyRegistered);
    }

    Ok(cluster)
}

/// 查找已加入联邦的集群
pub fn find_federated_cluster<'a>(
    clusters: &'a [ManagedCluster],
    cluster_id: &str,
) -> Option<&'a ManagedCluster> {
    clusters
        .iter()
        .find(|c| c.cluster_id == cluster_id && c.is_federated())
}

/// 所有尚未加入联邦的集群
pub fn registrable_clusters(clusters: &[ManagedCluster]) -> Vec<ManagedCluster> {
    clusters.iter().filter(|c| !c.is_federated()).cloned().collect()
}

/// 成员集群访问凭证
///
/// 每次操作时重新获取，不持久化，也不写入日志。
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterCredential {
    /// 外部集群 ID
    pub cluster_id: String,
    /// API 服务器地址
    pub api_server_url: String,
    /// 认证令牌
    pub bearer_token: String,
}

impl fmt::Debug for ClusterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterCredential")
            .field("cluster_id", &self.cluster_id)
            .field("api_server_url", &self.api_server_url)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// 注册成功后写入目录服务的联邦记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationRequest {
    /// 外部集群 ID
    pub cluster_id: String,
    /// 控制平面中集群对象的 UID
    #[serde(rename = "federatedClusterUID", skip_serializing_if = "String::is_empty", default)]
    pub federated_cluster_uid: String,
    /// 控制平面中集群对象的名称
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub federated_cluster_name: String,
}

/// 批量注册中单个集群的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResult {
    /// 外部集群 ID
    pub cluster_id: String,
    /// 注册成功时为控制平面中的集群名称
    pub name: String,
    /// HTTP 风格的状态码
    pub code: u16,
    /// 消息键
    pub message: String,
}

/// 注册成功的消息键
pub const REGISTERED_SUCCESSFULLY: &str = "CLUSTER_REGISTERED_SUCCESSFULLY";

/// 删除完成的消息键
pub const DELETION_COMPLETED: &str = "CLUSTER_DELETION_COMPLETED";

impl RegisterResult {
    /// 由单个集群的注册结果构造
    pub fn from_outcome(cluster_id: &str, outcome: &Result<FederationRequest>) -> Self {
        match outcome {
            Ok(request) => Self {
                cluster_id: cluster_id.to_string(),
                name: request.federated_cluster_name.clone(),
                code: 201,
                message: REGISTERED_SUCCESSFULLY.to_string(),
            },
            Err(e) => Self {
                cluster_id: cluster_id.to_string(),
                name: String::new(),
                code: e.status_code(),
                message: e.message_key().to_string(),
            },
        }
    }

    /// 是否注册成功
    pub fn is_success(&self) -> bool {
        self.code == 201
    }
}

/// 控制平面中已加入联邦的集群概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    /// 外部集群 ID
    pub cluster_id: String,
    /// 控制平面中的集群名称
    pub name: String,
    /// 控制平面中集群对象的 UID
    pub uid: String,
    /// Kubernetes 版本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    /// 集群状态：ready、not-ready 或 unknown
    pub status: String,
    /// 同步模式
    pub sync_mode: String,
}
