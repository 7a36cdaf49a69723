//! 集群目录查询

use fedhub_common::{registrable_clusters, ClusterSummary, Error, ManagedCluster, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::cluster_api::{ClusterApi, FederatedCluster};
use crate::directory::FederationDirectory;

/// 集群查询
pub struct ClusterCatalog {
    directory: Arc<dyn FederationDirectory>,
    control_plane: Arc<dyn ClusterApi>,
}

impl ClusterCatalog {
    /// 创建查询
    pub fn new(directory: Arc<dyn FederationDirectory>, control_plane: Arc<dyn ClusterApi>) -> Self {
        Self {
            directory,
            control_plane,
        }
    }

    /// 尚未加入联邦的集群
    pub async fn registrable_clusters(&self) -> Result<Vec<ManagedCluster>> {
        let clusters = self.directory.list_managed_clusters().await?;
        Ok(registrable_clusters(&clusters))
    }

    /// 控制平面中已与目录关联的集群
    pub async fn federated_clusters(&self) -> Result<Vec<ClusterSummary>> {
        let clusters = self.directory.list_managed_clusters().await?;
        let ids: HashMap<&str, &str> = clusters
            .iter()
            .filter(|c| c.is_federated())
            .map(|c| (c.federated_cluster_uid.as_str(), c.cluster_id.as_str()))
            .collect();

        let federated = self.control_plane.list_clusters().await.map_err(|e| {
            error!("列出控制平面集群失败: {}", e);
            Error::FailedRequest
        })?;

        Ok(federated
            .into_iter()
            .filter_map(|cluster| {
                let cluster_id = ids.get(cluster.uid.as_str())?.to_string();
                Some(summarize(cluster_id, cluster))
            })
            .collect())
    }
}

fn summarize(cluster_id: String, cluster: FederatedCluster) -> ClusterSummary {
    let status = match cluster.ready {
        Some(true) => "ready",
        Some(false) => "not-ready",
        None => "unknown",
    };
    ClusterSummary {
        cluster_id,
        name: cluster.name,
        uid: cluster.uid,
        kubernetes_version: cluster.kubernetes_version,
        status: status.to_string(),
        sync_mode: cluster.sync_mode.to_string(),
    }
}
