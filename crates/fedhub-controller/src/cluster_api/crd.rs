//! 控制平面集群对象定义
//!
//! 该模块定义了联邦控制平面中表示成员集群的 `Cluster` 自定义资源
//! （cluster.karmada.io/v1alpha1，集群级）。只包含本服务读写的字段。

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 集群同步模式
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum ClusterSyncMode {
    /// 控制平面主动连接成员集群
    #[default]
    Push,
    /// 成员集群中的代理连接控制平面
    Pull,
}

impl fmt::Display for ClusterSyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterSyncMode::Push => write!(f, "Push"),
            ClusterSyncMode::Pull => write!(f, "Pull"),
        }
    }
}

/// 集群规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(group = "cluster.karmada.io", version = "v1alpha1", kind = "Cluster")]
#[kube(status = "ClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// 同步模式
    #[serde(default)]
    pub sync_mode: ClusterSyncMode,

    /// 成员集群 API 服务器地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,

    /// 访问成员集群的凭证 Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalSecretReference>,

    /// 以调用者身份访问成员集群的凭证 Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonator_secret_ref: Option<LocalSecretReference>,

    /// 是否跳过 TLS 证书校验
    #[serde(default, rename = "insecureSkipTLSVerification")]
    pub insecure_skip_tls_verification: bool,
}

/// 同一控制平面中的 Secret 引用
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct LocalSecretReference {
    /// Secret 所在命名空间
    pub namespace: String,
    /// Secret 名称
    pub name: String,
}

/// 集群状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Kubernetes 版本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    /// 状态条件
    #[serde(default)]
    pub conditions: Vec<ClusterCondition>,
}

/// 状态条件，只关心类型和状态
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct ClusterCondition {
    /// 条件类型，例如 Ready
    #[serde(rename = "type")]
    pub type_: String,
    /// True、False 或 Unknown
    pub status: String,
}

impl ClusterStatus {
    /// Ready 条件的值
    pub fn ready(&self) -> Option<bool> {
        self.conditions
            .iter()
            .find(|c| c.type_ == "Ready")
            .map(|c| c.status == "True")
    }
}
