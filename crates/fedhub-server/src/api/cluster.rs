//! 集群注册接口

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use fedhub_common::{ClusterSummary, Error, ManagedCluster, RegisterResult, DELETION_COMPLETED};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::response::{ApiResult, BaseResponse};
use super::AppState;

/// 批量注册请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostClusterRequest {
    /// 待注册的集群 ID
    #[serde(rename = "clusterIds")]
    pub cluster_ids: Vec<String>,
}

/// 集群列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClustersResponse<T> {
    /// 集群
    pub clusters: Vec<T>,
}

/// 尚未加入联邦的集群
pub async fn list_registrable_clusters(
    State(state): State<AppState>,
) -> ApiResult<Json<ClustersResponse<ManagedCluster>>> {
    let clusters = state.catalog.registrable_clusters().await?;
    Ok(Json(ClustersResponse { clusters }))
}

/// 已加入联邦的集群
pub async fn list_clusters(
    State(state): State<AppState>,
) -> ApiResult<Json<ClustersResponse<ClusterSummary>>> {
    let clusters = state.catalog.federated_clusters().await?;
    Ok(Json(ClustersResponse { clusters }))
}

/// 批量注册集群
pub async fn register_clusters(
    State(state): State<AppState>,
    payload: Result<Json<PostClusterRequest>, JsonRejection>,
) -> ApiResult<Json<ClustersResponse<RegisterResult>>> {
    let Json(request) = payload?;
    if request.cluster_ids.is_empty() {
        return Err(Error::RequestValueInvalid.into());
    }

    let clusters = state.registrar.register_clusters(&request.cluster_ids).await?;
    state.metrics.record_registrations(&clusters);
    info!(
        "批量注册完成: {}/{} 成功",
        clusters.iter().filter(|r| r.is_success()).count(),
        clusters.len()
    );
    Ok(Json(ClustersResponse { clusters }))
}

/// 注销集群
pub async fn unregister_cluster(
    State(state): State<AppState>,
    Path(cluster_id): Path<String>,
) -> ApiResult<BaseResponse> {
    let result = state.deregistrar.unregister(&cluster_id).await;
    state.metrics.record_deregistration(result.is_ok());
    result?;
    Ok(BaseResponse::ok(DELETION_COMPLETED))
}
