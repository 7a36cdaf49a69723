//! 集群注销

use fedhub_common::{find_federated_cluster, Error, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cluster_api::{ApiError, ClusterApi};
use crate::directory::FederationDirectory;
use crate::utils::{poll_until, PollConfig, PollOutcome};

/// 删除控制平面集群对象并等待其消失
///
/// 对象不存在时返回 `ClusterNotFoundInKarmada`；删除失败、确认过程出错或超时均返回 `FailedRequest`。
pub async fn delete_and_confirm(
    control_plane: &dyn ClusterApi,
    name: &str,
    poll: PollConfig,
) -> Result<()> {
    if let Err(e) = control_plane.delete_cluster(name).await {
        error!("删除集群对象 {} 失败: {}", name, e);
        return Err(if e.is_not_found() {
            Error::ClusterNotFoundInKarmada
        } else {
            Error::FailedRequest
        });
    }

    let outcome = poll_until(poll, move || async move {
        match control_plane.get_cluster(name).await {
            Err(ApiError::NotFound(_)) => Ok(true),
            Err(e) => Err(e),
            Ok(_) => {
                info!("等待集群对象 {} 删除", name);
                Ok(false)
            }
        }
    })
    .await;

    match outcome {
        PollOutcome::Done => {
            info!("集群对象 {} 已删除", name);
            Ok(())
        }
        PollOutcome::Failed(e) => {
            error!("确认集群对象 {} 删除时出错: {}", name, e);
            Err(Error::FailedRequest)
        }
        PollOutcome::TimedOut => {
            warn!("等待集群对象 {} 删除超时", name);
            Err(Error::FailedRequest)
        }
    }
}

/// 集群注销器
pub struct ClusterDeregistrar {
    directory: Arc<dyn FederationDirectory>,
    control_plane: Arc<dyn ClusterApi>,
    poll: PollConfig,
}

impl ClusterDeregistrar {
    /// 创建注销器
    pub fn new(
        directory: Arc<dyn FederationDirectory>,
        control_plane: Arc<dyn ClusterApi>,
        poll: PollConfig,
    ) -> Self {
        Self {
            directory,
            control_plane,
            poll,
        }
    }

    /// 将集群移出联邦
    ///
    /// 只有确认控制平面集群对象已删除后才解除目录中的关联。
    pub async fn unregister(&self, cluster_id: &str) -> Result<()> {
        let clusters = self.directory.list_managed_clusters().await?;
        let cluster = find_federated_cluster(&clusters, cluster_id).ok_or(Error::ClusterNotFound)?;

        info!(cluster_id = %cluster_id, "开始注销集群 {}", cluster.federated_cluster_name);
        delete_and_confirm(
            self.control_plane.as_ref(),
            &cluster.federated_cluster_name,
            self.poll,
        )
        .await?;

        // 控制平面对象已删除，此处失败会留下过期的目录记录
        self.directory
            .unregister_federated_cluster(cluster_id)
            .await
            .map_err(|e| {
                error!(cluster_id = %cluster_id, "解除目录关联失败: {}", e);
                e
            })?;

        info!(cluster_id = %cluster_id, "集群注销完成");
        Ok(())
    }
}
