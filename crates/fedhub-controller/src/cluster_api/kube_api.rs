//! 基于 kube-rs 的集群 API 实现

use anyhow::{Context, Result};
use async_trait::async_trait;
use fedhub_common::{ClusterCredential, ResourceKind};
use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, GroupVersionKind, TypeMeta};
use kube::{Client, Config, Resource, ResourceExt};
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    ApiError, ApiResult, Cluster, ClusterApi, ClusterConnector, ClusterJoinSpec, ClusterSpec,
    ClusterSyncMode, FederatedCluster, LocalSecretReference,
};

/// 控制平面中存放成员集群凭证的命名空间
const CLUSTER_SECRET_NAMESPACE: &str = "karmada-cluster";

/// 凭证 Secret 中令牌的键
const TOKEN_KEY: &str = "token";

/// 基于 kube-rs 客户端的集群 API
#[derive(Clone)]
pub struct KubeClusterApi {
    /// Kubernetes 客户端
    client: Client,
}

impl KubeClusterApi {
    /// 使用已有客户端创建
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 连接联邦控制平面
    ///
    /// 指定 kubeconfig 路径时从文件读取，否则依次尝试集群内配置和默认 kubeconfig。
    pub async fn connect_control_plane(
        kubeconfig: Option<&Path>,
        context: Option<String>,
    ) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("读取 kubeconfig 失败: {}", path.display()))?;
                let options = KubeConfigOptions {
                    context,
                    ..Default::default()
                };
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("解析控制平面 kubeconfig 失败")?
            }
            None => Config::infer().await.context("推断控制平面配置失败")?,
        };

        info!("连接联邦控制平面: {}", config.cluster_url);
        let client = Client::try_from(config).context("创建控制平面客户端失败")?;
        Ok(Self::new(client))
    }

    /// 指定资源类型的动态 API
    fn dynamic_api(&self, kind: ResourceKind, namespace: Option<&str>) -> ApiResult<Api<DynamicObject>> {
        let resource = api_resource(kind);
        match (kind.is_namespaced(), namespace) {
            (true, Some(ns)) => Ok(Api::namespaced_with(self.client.clone(), ns, &resource)),
            (true, None) => Err(ApiError::InvalidConfig(format!("资源类型 {} 需要命名空间", kind))),
            (false, _) => Ok(Api::all_with(self.client.clone(), &resource)),
        }
    }

    /// 确保凭证命名空间存在
    async fn ensure_secret_namespace(&self) -> ApiResult<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(CLUSTER_SECRET_NAMESPACE.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        match api.create(&PostParams::default(), &namespace).await {
            Ok(_) => Ok(()),
            Err(e) => match ApiError::from(e) {
                ApiError::AlreadyExists(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    /// 创建归属于集群对象的凭证 Secret
    async fn create_cluster_secrets(&self, cluster: &Cluster, token: &str) -> ApiResult<()> {
        let owner = cluster
            .controller_owner_ref(&())
            .ok_or_else(|| ApiError::InvalidConfig("集群对象缺少 UID".to_string()))?;
        let api: Api<Secret> = Api::namespaced(self.client.clone(), CLUSTER_SECRET_NAMESPACE);

        let references = [&cluster.spec.secret_ref, &cluster.spec.impersonator_secret_ref];
        for reference in references.into_iter().flatten() {
            let secret = Secret {
                metadata: ObjectMeta {
                    name: Some(reference.name.clone()),
                    namespace: Some(reference.namespace.clone()),
                    owner_references: Some(vec![owner.clone()]),
                    ..Default::default()
                },
                string_data: Some(BTreeMap::from([(TOKEN_KEY.to_string(), token.to_string())])),
                ..Default::default()
            };
            api.create(&PostParams::default(), &secret).await?;
            debug!("已创建集群凭证 Secret: {}/{}", reference.namespace, reference.name);
        }
        Ok(())
    }
}

/// 资源类型对应的动态资源描述
pub(crate) fn api_resource(kind: ResourceKind) -> ApiResource {
    let gvk = GroupVersionKind::gvk(kind.group(), kind.version(), kind.kind());
    ApiResource::from_gvk_with_plural(&gvk, kind.plural())
}

/// 控制平面中的 Push 模式集群对象
fn push_cluster(spec: &ClusterJoinSpec) -> Cluster {
    let secret_ref = |name: String| LocalSecretReference {
        namespace: CLUSTER_SECRET_NAMESPACE.to_string(),
        name,
    };
    Cluster::new(
        &spec.name,
        ClusterSpec {
            sync_mode: ClusterSyncMode::Push,
            api_endpoint: Some(spec.api_endpoint.clone()),
            secret_ref: Some(secret_ref(spec.name.clone())),
            impersonator_secret_ref: Some(secret_ref(format!("{}-impersonator", spec.name))),
            insecure_skip_tls_verification: true,
        },
    )
}

impl From<Cluster> for FederatedCluster {
    fn from(cluster: Cluster) -> Self {
        let status = cluster.status.clone().unwrap_or_default();
        Self {
            name: cluster.name_any(),
            uid: cluster.uid().unwrap_or_default(),
            kubernetes_version: status.kubernetes_version.clone(),
            ready: status.ready(),
            sync_mode: cluster.spec.sync_mode,
        }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn create_cluster(&self, spec: &ClusterJoinSpec) -> ApiResult<()> {
        let api: Api<Cluster> = Api::all(self.client.clone());
        let created = api.create(&PostParams::default(), &push_cluster(spec)).await?;
        info!("已在控制平面创建集群对象: {}", spec.name);

        let secrets = match self.ensure_secret_namespace().await {
            Ok(()) => self.create_cluster_secrets(&created, &spec.bearer_token).await,
            Err(e) => Err(e),
        };

        if let Err(e) = secrets {
            warn!("创建集群 {} 的凭证失败，删除集群对象: {}", spec.name, e);
            if let Err(cleanup) = api.delete(&spec.name, &DeleteParams::default()).await {
                warn!("删除集群对象 {} 失败: {}", spec.name, cleanup);
            }
            return Err(e);
        }

        Ok(())
    }

    async fn get_cluster(&self, name: &str) -> ApiResult<FederatedCluster> {
        let api: Api<Cluster> = Api::all(self.client.clone());
        Ok(api.get(name).await?.into())
    }

    async fn list_clusters(&self) -> ApiResult<Vec<FederatedCluster>> {
        let api: Api<Cluster> = Api::all(self.client.clone());
        let clusters = api.list(&ListParams::default()).await?;
        Ok(clusters.items.into_iter().map(FederatedCluster::from).collect())
    }

    async fn delete_cluster(&self, name: &str) -> ApiResult<()> {
        let api: Api<Cluster> = Api::all(self.client.clone());
        api.delete(name, &DeleteParams::default()).await?;
        info!("已请求删除集群对象: {}", name);
        Ok(())
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> ApiResult<Vec<DynamicObject>> {
        let api = self.dynamic_api(kind, namespace)?;
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> ApiResult<DynamicObject> {
        let api = self.dynamic_api(kind, namespace)?;
        Ok(api.get(name).await?)
    }

    async fn create(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> ApiResult<DynamicObject> {
        let api = self.dynamic_api(kind, namespace)?;
        let resource = api_resource(kind);
        let mut object = object.clone();
        object.types = Some(TypeMeta {
            api_version: resource.api_version,
            kind: resource.kind,
        });
        Ok(api.create(&PostParams::default(), &object).await?)
    }
}

/// 基于令牌连接成员集群
///
/// 成员集群证书不做校验。
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeConnector;

impl ClusterConnector for KubeConnector {
    fn connect(&self, credential: &ClusterCredential) -> ApiResult<Arc<dyn ClusterApi>> {
        let uri = credential
            .api_server_url
            .parse::<http::Uri>()
            .map_err(|e| ApiError::InvalidConfig(format!("无效的 API 服务器地址: {}", e)))?;

        let mut config = Config::new(uri);
        config.accept_invalid_certs = true;
        config.auth_info.token = Some(SecretString::new(credential.bearer_token.clone()));

        let client = Client::try_from(config)
            .map_err(|e| ApiError::InvalidConfig(format!("创建成员集群客户端失败: {}", e)))?;
        debug!(cluster_id = %credential.cluster_id, "已建立成员集群客户端");
        Ok(Arc::new(KubeClusterApi::new(client)))
    }
}
