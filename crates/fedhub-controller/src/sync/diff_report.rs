//! 同步差异报告

use fedhub_common::{Error, ResourceKind, Result, SyncResource};
use kube::ResourceExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

use super::resource_sync::connect_member;
use crate::cluster_api::{ClusterApi, ClusterConnector};
use crate::directory::CredentialResolver;

/// 差异报告器
pub struct DiffReporter {
    credentials: Arc<dyn CredentialResolver>,
    connector: Arc<dyn ClusterConnector>,
    control_plane: Arc<dyn ClusterApi>,
}

impl DiffReporter {
    /// 创建报告器
    pub fn new(
        credentials: Arc<dyn CredentialResolver>,
        connector: Arc<dyn ClusterConnector>,
        control_plane: Arc<dyn ClusterApi>,
    ) -> Self {
        Self {
            credentials,
            connector,
            control_plane,
        }
    }

    /// 列出成员集群中的资源，并标记控制平面中是否已有同名资源
    ///
    /// 结果保持成员集群的列举顺序。不支持的类型、命名空间级类型缺少命名空间
    /// 以及任一侧列举失败都返回 `FailedRequest`。
    pub async fn diff(
        &self,
        cluster_id: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<SyncResource>> {
        let kind = kind.parse::<ResourceKind>().map_err(|_| {
            error!("不支持的资源类型: {}", kind);
            Error::FailedRequest
        })?;
        let namespace = namespace.filter(|ns| !ns.is_empty());
        if kind.is_namespaced() && namespace.is_none() {
            error!("资源类型 {} 需要命名空间", kind);
            return Err(Error::FailedRequest);
        }

        let existing = self.control_plane.list(kind, namespace).await.map_err(|e| {
            error!("列出控制平面 {} 失败: {}", kind, e);
            Error::FailedRequest
        })?;

        let member = connect_member(
            self.credentials.as_ref(),
            self.connector.as_ref(),
            cluster_id,
        )
        .await?;
        let items = member.list(kind, namespace).await.map_err(|e| {
            error!(cluster_id = %cluster_id, "列出成员集群 {} 失败: {}", kind, e);
            Error::FailedRequest
        })?;

        let existing: HashSet<String> = existing.iter().map(|o| o.name_any()).collect();
        Ok(items
            .iter()
            .map(|item| {
                let name = item.name_any();
                SyncResource {
                    is_duplicated: existing.contains(&name),
                    name,
                }
            })
            .collect())
    }
}
