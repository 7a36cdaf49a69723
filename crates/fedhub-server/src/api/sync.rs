//! 资源同步接口

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use fedhub_common::{SyncRequest, SyncResource, SyncResponse};
use serde::Deserialize;

use super::response::ApiResult;
use super::AppState;

/// 差异查询参数
#[derive(Debug, Default, Deserialize)]
pub struct DiffQuery {
    /// 资源类型
    #[serde(default)]
    pub kind: String,
    /// 命名空间，命名空间类型时可省略
    #[serde(default)]
    pub namespace: Option<String>,
}

/// 比较成员集群和控制平面中的资源
pub async fn diff_resources(
    State(state): State<AppState>,
    Path(cluster_id): Path<String>,
    query: Result<Query<DiffQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SyncResource>>> {
    let Query(query) = query?;
    let report = state
        .diff
        .diff(&cluster_id, &query.kind, query.namespace.as_deref())
        .await?;
    Ok(Json(report))
}

/// 同步资源到控制平面
pub async fn sync_resources(
    State(state): State<AppState>,
    Path(cluster_id): Path<String>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> ApiResult<Json<SyncResponse>> {
    let Json(request) = payload?;
    let response = state.synchronizer.sync(&cluster_id, &request).await?;
    state.metrics.record_sync(&response);
    Ok(Json(response))
}
