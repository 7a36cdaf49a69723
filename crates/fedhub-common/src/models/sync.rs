//! 资源同步模型
//!
//! 该模块定义了从成员集群向联邦控制平面同步资源时使用的请求、响应和差异条目，
//! 以及支持同步的资源类型。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// 支持同步的资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Namespace,
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    ConfigMap,
    Secret,
}

impl ResourceKind {
    /// 所有支持的资源类型
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Namespace,
        ResourceKind::Deployment,
        ResourceKind::StatefulSet,
        ResourceKind::DaemonSet,
        ResourceKind::Job,
        ResourceKind::CronJob,
        ResourceKind::ConfigMap,
        ResourceKind::Secret,
    ];

    /// API 组，核心组为空字符串
    pub fn group(&self) -> &'static str {
        match self {
            ResourceKind::Namespace | ResourceKind::ConfigMap | ResourceKind::Secret => "",
            ResourceKind::Deployment | ResourceKind::StatefulSet | ResourceKind::DaemonSet => {
                "apps"
            }
            ResourceKind::Job | ResourceKind::CronJob => "batch",
        }
    }

    /// API 版本
    pub fn version(&self) -> &'static str {
        "v1"
    }

    /// Kubernetes 中的 Kind 名称
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::Job => "Job",
            ResourceKind::CronJob => "CronJob",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
        }
    }

    /// REST 路径中的复数资源名
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespaces",
            ResourceKind::Deployment => "deployments",
            ResourceKind::StatefulSet => "statefulsets",
            ResourceKind::DaemonSet => "daemonsets",
            ResourceKind::Job => "jobs",
            ResourceKind::CronJob => "cronjobs",
            ResourceKind::ConfigMap => "configmaps",
            ResourceKind::Secret => "secrets",
        }
    }

    /// 是否为命名空间级资源
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Namespace => write!(f, "namespace"),
            ResourceKind::Deployment => write!(f, "deployment"),
            ResourceKind::StatefulSet => write!(f, "statefulset"),
            ResourceKind::DaemonSet => write!(f, "daemonset"),
            ResourceKind::Job => write!(f, "job"),
            ResourceKind::CronJob => write!(f, "cronjob"),
            ResourceKind::ConfigMap => write!(f, "configmap"),
            ResourceKind::Secret => write!(f, "secret"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "namespace" => Ok(ResourceKind::Namespace),
            "deployment" => Ok(ResourceKind::Deployment),
            "statefulset" => Ok(ResourceKind::StatefulSet),
            "daemonset" => Ok(ResourceKind::DaemonSet),
            "job" => Ok(ResourceKind::Job),
            "cronjob" => Ok(ResourceKind::CronJob),
            "configmap" => Ok(ResourceKind::ConfigMap),
            "secret" => Ok(ResourceKind::Secret),
            _ => Err(Error::UnsupportedResourceKind),
        }
    }
}

/// 同步请求
///
/// 只在 `create_namespaces` 中列出的命名空间会被创建，`data` 中引用的命名空间不会隐式创建。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// 需要在控制平面创建的命名空间
    #[serde(rename = "createNamespace", alias = "createNamespaces", default)]
    pub create_namespaces: Vec<String>,
    /// 按命名空间分组的待同步资源
    #[serde(default)]
    pub data: Vec<SyncRequestData>,
}

/// 单个命名空间下的待同步资源
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequestData {
    /// 命名空间
    pub namespace: String,
    /// 按资源类型分组的资源名称
    #[serde(default)]
    pub list: Vec<SyncRequestResource>,
}

/// 单个资源类型下的资源名称
///
/// `kind` 保留原始字符串，未知类型在同步时整体计为失败。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequestResource {
    /// 资源类型
    pub kind: String,
    /// 资源名称
    #[serde(default)]
    pub list: Vec<String>,
}

impl SyncRequest {
    /// 请求中声明的资源总数，包括待创建的命名空间
    pub fn declared_resources(&self) -> usize {
        self.create_namespaces.len()
            + self
                .data
                .iter()
                .flat_map(|d| d.list.iter())
                .map(|r| r.list.len())
                .sum::<usize>()
    }
}

/// 同步结果统计
///
/// 每次计数都同时累加 `total_resource`，因此 `total = fail + success` 恒成立。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// 资源总数
    pub total_resource: usize,
    /// 失败数
    pub fail_resource: usize,
    /// 成功数
    pub success_resource: usize,
}

impl SyncResponse {
    /// 记录一个成功的资源
    pub fn succeed(&mut self) {
        self.total_resource += 1;
        self.success_resource += 1;
    }

    /// 记录若干个失败的资源
    pub fn fail(&mut self, count: usize) {
        self.total_resource += count;
        self.fail_resource += count;
    }

    /// 计数是否一致
    pub fn is_consistent(&self) -> bool {
        self.total_resource == self.fail_resource + self.success_resource
    }
}

/// 差异报告条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResource {
    /// 资源名称
    pub name: String,
    /// 控制平面中是否已存在同名资源
    pub is_duplicated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_round_trip_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.to_string().parse::<ResourceKind>().unwrap(), kind);
        }
        assert_eq!("pod".parse::<ResourceKind>(), Err(Error::UnsupportedResourceKind));
        assert_eq!("Deployment".parse::<ResourceKind>(), Err(Error::UnsupportedResourceKind));
    }

    #[test]
    fn test_resource_kind_scope() {
        assert!(!ResourceKind::Namespace.is_namespaced());
        assert!(ResourceKind::Job.is_namespaced());
        assert_eq!(ResourceKind::CronJob.group(), "batch");
        assert_eq!(ResourceKind::ConfigMap.group(), "");
        assert_eq!(ResourceKind::StatefulSet.plural(), "statefulsets");
    }

    #[test]
    fn test_resource_kind_orders_as_map_key() {
        let mut scopes = std::collections::BTreeMap::new();
        scopes.insert((ResourceKind::Secret, "ns1".to_string()), 2);
        scopes.insert((ResourceKind::Namespace, String::new()), 1);
        let kinds: Vec<ResourceKind> = scopes.keys().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, vec![ResourceKind::Namespace, ResourceKind::Secret]);
    }

    #[test]
    fn test_sync_request_wire_format() {
        let json = r#"{
            "createNamespace": ["ns1"],
            "data": [{"namespace": "ns1", "list": [{"kind": "deployment", "list": ["web", "api"]}]}]
        }"#;
        let request: SyncRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.create_namespaces, vec!["ns1"]);
        assert_eq!(request.data[0].list[0].list, vec!["web", "api"]);
        assert_eq!(request.declared_resources(), 3);

        let aliased: SyncRequest = serde_json::from_str(r#"{"createNamespaces": ["a"]}"#).unwrap();
        assert_eq!(aliased.create_namespaces, vec!["a"]);
        assert!(aliased.data.is_empty());
    }

    #[test]
    fn test_sync_response_counters() {
        let mut response = SyncResponse::default();
        assert!(response.is_consistent());

        response.succeed();
        response.fail(3);
        response.fail(0);
        assert_eq!(response.total_resource, 4);
        assert_eq!(response.fail_resource, 3);
        assert_eq!(response.success_resource, 1);
        assert!(response.is_consistent());

        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["totalResource"], 4);
        assert_eq!(value["successResource"], 1);
    }
}
