//! HTTP 接口
//!
//! 所有业务接口挂在 `/api/v1` 之下，另外提供 `/metrics` 和健康检查接口。

pub mod cluster;
pub mod response;
pub mod sync;

use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use axum::Router;
use fedhub_controller::{
    ClusterApi, ClusterCatalog, ClusterConnector, ClusterDeregistrar, ClusterRegistrar,
    CredentialResolver, DiffReporter, FederationDirectory, PollConfig, ResourceSynchronizer,
};
use std::sync::Arc;

use crate::health_check;
use crate::metrics::{metrics_handler, ApiMetrics};

/// 处理函数共享的状态
#[derive(Clone)]
pub struct AppState {
    /// 集群注册
    pub registrar: Arc<ClusterRegistrar>,
    /// 集群注销
    pub deregistrar: Arc<ClusterDeregistrar>,
    /// 集群列表
    pub catalog: Arc<ClusterCatalog>,
    /// 资源同步
    pub synchronizer: Arc<ResourceSynchronizer>,
    /// 资源差异
    pub diff: Arc<DiffReporter>,
    /// 接口指标
    pub metrics: ApiMetrics,
}

impl FromRef<AppState> for ApiMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

impl AppState {
    /// 用外部依赖组装各个服务
    pub fn new(
        directory: Arc<dyn FederationDirectory>,
        credentials: Arc<dyn CredentialResolver>,
        connector: Arc<dyn ClusterConnector>,
        control_plane: Arc<dyn ClusterApi>,
        poll: PollConfig,
        metrics: ApiMetrics,
    ) -> Self {
        Self {
            registrar: Arc::new(ClusterRegistrar::new(
                directory.clone(),
                credentials.clone(),
                control_plane.clone(),
                poll,
            )),
            deregistrar: Arc::new(ClusterDeregistrar::new(
                directory.clone(),
                control_plane.clone(),
                poll,
            )),
            catalog: Arc::new(ClusterCatalog::new(directory, control_plane.clone())),
            synchronizer: Arc::new(ResourceSynchronizer::new(
                credentials.clone(),
                connector.clone(),
                control_plane.clone(),
            )),
            diff: Arc::new(DiffReporter::new(credentials, connector, control_plane)),
            metrics,
        }
    }
}

/// 构建完整路由
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/cluster",
            get(cluster::list_clusters).post(cluster::register_clusters),
        )
        .route("/cluster/:cluster_id", delete(cluster::unregister_cluster))
        .route(
            "/registrable-clusters",
            get(cluster::list_registrable_clusters),
        )
        .route("/sync/resource/:cluster_id", get(sync::diff_resources))
        .route("/sync/:cluster_id", post(sync::sync_resources));

    Router::new()
        .nest("/api/v1", api)
        .route("/metrics", get(metrics_handler))
        .merge(health_check::routes())
        .with_state(state)
}
