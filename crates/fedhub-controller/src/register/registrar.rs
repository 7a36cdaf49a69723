//! 集群注册
//!
//! 单个集群的注册流程：
//! 1. 检查集群是否可注册
//! 2. 读取成员集群凭证
//! 3. 以 Push 模式在控制平面创建集群对象
//! 4. 读回集群对象获取 UID
//! 5. 在目录服务中记录联邦关系
//!
//! 第 4、5 步失败时删除第 3 步创建的集群对象，删除本身失败只记录日志。

use fedhub_common::{
    find_registrable_cluster, Error, FederationRequest, ManagedCluster, RegisterResult, Result,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::deregistrar::delete_and_confirm;
use crate::cluster_api::{ApiError, ClusterApi, ClusterJoinSpec};
use crate::directory::{CredentialResolver, FederationDirectory};
use crate::utils::PollConfig;

/// 集群注册器
pub struct ClusterRegistrar {
    directory: Arc<dyn FederationDirectory>,
    credentials: Arc<dyn CredentialResolver>,
    control_plane: Arc<dyn ClusterApi>,
    poll: PollConfig,
}

impl ClusterRegistrar {
    /// 创建注册器
    pub fn new(
        directory: Arc<dyn FederationDirectory>,
        credentials: Arc<dyn CredentialResolver>,
        control_plane: Arc<dyn ClusterApi>,
        poll: PollConfig,
    ) -> Self {
        Self {
            directory,
            credentials,
            control_plane,
            poll,
        }
    }

    /// 批量注册
    ///
    /// 目录只读取一次，各集群并发注册，每个输入 ID 对应一个结果（重复 ID 各自处理）。
    /// 丢弃返回的 future 会同时取消所有进行中的注册。
    pub async fn register_clusters(&self, cluster_ids: &[String]) -> Result<Vec<RegisterResult>> {
        let clusters = self.directory.list_managed_clusters().await?;
        info!("开始批量注册 {} 个集群", cluster_ids.len());

        let attempts = cluster_ids.iter().map(|cluster_id| {
            let clusters = &clusters;
            async move {
                let outcome = self.register_cluster(clusters, cluster_id).await;
                RegisterResult::from_outcome(cluster_id, &outcome)
            }
        });

        Ok(join_all(attempts).await)
    }

    /// 注册单个集群
    pub async fn register_cluster(
        &self,
        clusters: &[ManagedCluster],
        cluster_id: &str,
    ) -> Result<FederationRequest> {
        let cluster = find_registrable_cluster(clusters, cluster_id)?;
        let name = cluster.name.as_str();

        let credential = self
            .credentials
            .get_cluster_credential(cluster_id)
            .await
            .map_err(|e| {
                error!(cluster_id = %cluster_id, "读取集群凭证失败: {}", e);
                Error::FailedToReadClusterInfo
            })?;

        let join = ClusterJoinSpec::from_credential(name, &credential).map_err(|e| {
            error!(cluster_id = %cluster_id, "加载集群配置失败: {}", e);
            Error::ClusterLoadConfigFailed
        })?;

        self.control_plane.create_cluster(&join).await.map_err(|e| {
            error!(cluster_id = %cluster_id, "以 Push 模式加入集群失败: {}", e);
            match e {
                ApiError::AlreadyExists(_) => Error::ClusterAlreadyRegisteredInKarmada,
                _ => Error::ClusterRegistrationFailed,
            }
        })?;

        let uid = match self.control_plane.get_cluster(name).await {
            Ok(federated) if !federated.uid.is_empty() => federated.uid,
            Ok(_) => {
                error!(cluster_id = %cluster_id, "集群对象 {} 没有 UID", name);
                self.compensate(name).await;
                return Err(Error::ClusterRegistrationFailed);
            }
            Err(e) => {
                error!(cluster_id = %cluster_id, "读取集群对象 {} 失败: {}", name, e);
                self.compensate(name).await;
                return Err(Error::ClusterRegistrationFailed);
            }
        };

        let request = FederationRequest {
            cluster_id: cluster_id.to_string(),
            federated_cluster_uid: uid,
            federated_cluster_name: name.to_string(),
        };

        if let Err(e) = self.directory.register_federated_cluster(&request).await {
            error!(cluster_id = %cluster_id, "记录联邦集群失败: {}", e);
            self.compensate(name).await;
            return Err(Error::ClusterRegistrationFailed);
        }

        info!(cluster_id = %cluster_id, "集群 {} 注册成功", name);
        Ok(request)
    }

    /// 尽力删除已创建的集群对象
    async fn compensate(&self, name: &str) {
        if let Err(e) = delete_and_confirm(self.control_plane.as_ref(), name, self.poll).await {
            warn!("回滚集群对象 {} 失败: {}", name, e);
        }
    }
}
