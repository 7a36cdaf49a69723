//! 测试替身
//!
//! 内存版的集群 API、目录服务和凭证解析器，带调用计数，
//! 用于在不连接真实集群的情况下验证注册和同步流程。

use async_trait::async_trait;
use fedhub_common::{
    ClusterCredential, Error, FederationRequest, ManagedCluster, ResourceKind, Result,
};
use kube::api::DynamicObject;
use kube::error::ErrorResponse;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cluster_api::{
    api_resource, ApiError, ApiResult, ClusterApi, ClusterConnector, ClusterJoinSpec,
    ClusterSyncMode, FederatedCluster,
};
use crate::directory::{CredentialResolver, FederationDirectory};

/// 调用计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FakeCalls {
    /// 创建集群对象
    pub create_cluster: usize,
    /// 读取集群对象
    pub get_cluster: usize,
    /// 删除集群对象
    pub delete_cluster: usize,
    /// 动态列表
    pub list: usize,
    /// 动态读取
    pub get: usize,
    /// 动态创建
    pub create: usize,
}

#[derive(Default)]
struct FakeState {
    clusters: BTreeMap<String, FederatedCluster>,
    objects: BTreeMap<(ResourceKind, String), Vec<DynamicObject>>,
    calls: FakeCalls,
    fail_cluster_reads: bool,
    fail_cluster_create: bool,
    keep_deleted_clusters: bool,
    fail_create_names: Vec<String>,
}

/// 内存版集群
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

fn scope(kind: ResourceKind, namespace: Option<&str>) -> ApiResult<String> {
    match (kind.is_namespaced(), namespace) {
        (true, Some(ns)) => Ok(ns.to_string()),
        (true, None) => Err(ApiError::InvalidConfig(format!("资源类型 {} 需要命名空间", kind))),
        (false, _) => Ok(String::new()),
    }
}

fn server_error(message: &str) -> ApiError {
    ApiError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message: message.to_string(),
        reason: "InternalError".into(),
        code: 500,
    }))
}

/// 构造带有服务端元数据的对象，模拟从集群读取的结果
pub fn sample_object(kind: ResourceKind, namespace: Option<&str>, name: &str) -> DynamicObject {
    let mut object = DynamicObject::new(name, &api_resource(kind));
    if let Some(ns) = namespace.filter(|_| kind.is_namespaced()) {
        object = object.within(ns);
    }
    object.metadata.uid = Some(format!("uid-{}", name));
    object.metadata.resource_version = Some("12345".into());
    object.metadata.generation = Some(3);
    object
}

impl FakeCluster {
    /// 创建空集群
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        // 测试中锁被毒化时直接沿用内部状态
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 预置一个资源
    pub fn with_object(self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> Self {
        self.insert_object(kind, namespace, sample_object(kind, namespace, name));
        self
    }

    /// 预置一个控制平面集群对象
    pub fn with_cluster(self, name: &str, uid: &str) -> Self {
        self.state().clusters.insert(
            name.to_string(),
            FederatedCluster {
                name: name.to_string(),
                uid: uid.to_string(),
                kubernetes_version: Some("v1.26.3".into()),
                ready: Some(true),
                sync_mode: ClusterSyncMode::Push,
            },
        );
        self
    }

    /// 读取集群对象时总是失败
    pub fn failing_cluster_reads(self) -> Self {
        self.state().fail_cluster_reads = true;
        self
    }

    /// 创建集群对象时总是失败
    pub fn failing_cluster_create(self) -> Self {
        self.state().fail_cluster_create = true;
        self
    }

    /// 删除请求被接受但集群对象一直存在
    pub fn keeping_deleted_clusters(self) -> Self {
        self.state().keep_deleted_clusters = true;
        self
    }

    /// 创建指定名称的资源时失败
    pub fn failing_create_of(self, name: &str) -> Self {
        self.state().fail_create_names.push(name.to_string());
        self
    }

    /// 写入资源
    pub fn insert_object(&self, kind: ResourceKind, namespace: Option<&str>, object: DynamicObject) {
        let ns = namespace.filter(|_| kind.is_namespaced()).unwrap_or_default();
        self.state()
            .objects
            .entry((kind, ns.to_string()))
            .or_default()
            .push(object);
    }

    /// 读取资源，不计数
    pub fn object(&self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> Option<DynamicObject> {
        let ns = namespace.filter(|_| kind.is_namespaced()).unwrap_or_default();
        self.state()
            .objects
            .get(&(kind, ns.to_string()))
            .and_then(|items| items.iter().find(|o| o.name_any() == name).cloned())
    }

    /// 控制平面集群对象，不计数
    pub fn cluster(&self, name: &str) -> Option<FederatedCluster> {
        self.state().clusters.get(name).cloned()
    }

    /// 调用计数
    pub fn calls(&self) -> FakeCalls {
        self.state().calls
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn create_cluster(&self, spec: &ClusterJoinSpec) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.create_cluster += 1;
        if state.fail_cluster_create {
            return Err(server_error("create cluster failed"));
        }
        if state.clusters.contains_key(&spec.name) {
            return Err(ApiError::AlreadyExists(spec.name.clone()));
        }
        state.clusters.insert(
            spec.name.clone(),
            FederatedCluster {
                name: spec.name.clone(),
                uid: format!("uid-{}", spec.name),
                kubernetes_version: None,
                ready: None,
                sync_mode: ClusterSyncMode::Push,
            },
        );
        Ok(())
    }

    async fn get_cluster(&self, name: &str) -> ApiResult<FederatedCluster> {
        let mut state = self.state();
        state.calls.get_cluster += 1;
        if state.fail_cluster_reads {
            return Err(server_error("get cluster failed"));
        }
        state
            .clusters
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }

    async fn list_clusters(&self) -> ApiResult<Vec<FederatedCluster>> {
        let mut state = self.state();
        state.calls.list += 1;
        Ok(state.clusters.values().cloned().collect())
    }

    async fn delete_cluster(&self, name: &str) -> ApiResult<()> {
        let mut state = self.state();
        state.calls.delete_cluster += 1;
        if !state.clusters.contains_key(name) {
            return Err(ApiError::NotFound(name.to_string()));
        }
        if !state.keep_deleted_clusters {
            state.clusters.remove(name);
        }
        Ok(())
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> ApiResult<Vec<DynamicObject>> {
        let ns = scope(kind, namespace)?;
        let mut state = self.state();
        state.calls.list += 1;
        Ok(state.objects.get(&(kind, ns)).cloned().unwrap_or_default())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> ApiResult<DynamicObject> {
        let ns = scope(kind, namespace)?;
        let mut state = self.state();
        state.calls.get += 1;
        state
            .objects
            .get(&(kind, ns))
            .and_then(|items| items.iter().find(|o| o.name_any() == name).cloned())
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }

    async fn create(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> ApiResult<DynamicObject> {
        let ns = scope(kind, namespace)?;
        let name = object.name_any();
        let mut state = self.state();
        state.calls.create += 1;
        if state.fail_create_names.contains(&name) {
            return Err(server_error("create failed"));
        }
        let items = state.objects.entry((kind, ns)).or_default();
        if items.iter().any(|o| o.name_any() == name) {
            return Err(ApiError::AlreadyExists(name));
        }
        items.push(object.clone());
        Ok(object.clone())
    }
}

/// 按集群 ID 返回内存集群的连接器
#[derive(Default)]
pub struct FakeConnector {
    members: HashMap<String, Arc<FakeCluster>>,
}

impl FakeConnector {
    /// 创建空连接器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记成员集群
    pub fn with_member(mut self, cluster_id: &str, cluster: Arc<FakeCluster>) -> Self {
        self.members.insert(cluster_id.to_string(), cluster);
        self
    }
}

impl ClusterConnector for FakeConnector {
    fn connect(&self, credential: &ClusterCredential) -> ApiResult<Arc<dyn ClusterApi>> {
        self.members
            .get(&credential.cluster_id)
            .map(|cluster| cluster.clone() as Arc<dyn ClusterApi>)
            .ok_or_else(|| ApiError::InvalidConfig(credential.api_server_url.clone()))
    }
}

#[derive(Default)]
struct DirectoryState {
    clusters: Vec<ManagedCluster>,
    registered: Vec<FederationRequest>,
    unregistered: Vec<String>,
    fail_register: bool,
}

/// 内存版目录服务
#[derive(Default)]
pub struct StaticDirectory {
    state: Mutex<DirectoryState>,
}

impl StaticDirectory {
    /// 以给定集群列表创建
    pub fn new(clusters: Vec<ManagedCluster>) -> Self {
        Self {
            state: Mutex::new(DirectoryState {
                clusters,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 记录联邦集群时总是失败
    pub fn failing_register(self) -> Self {
        self.state().fail_register = true;
        self
    }

    /// 已写入的联邦记录
    pub fn registered(&self) -> Vec<FederationRequest> {
        self.state().registered.clone()
    }

    /// 已解除关联的集群 ID
    pub fn unregistered(&self) -> Vec<String> {
        self.state().unregistered.clone()
    }
}

#[async_trait]
impl FederationDirectory for StaticDirectory {
    async fn list_managed_clusters(&self) -> Result<Vec<ManagedCluster>> {
        Ok(self.state().clusters.clone())
    }

    async fn register_federated_cluster(&self, request: &FederationRequest) -> Result<()> {
        let mut state = self.state();
        if state.fail_register {
            return Err(Error::FailedRequest);
        }
        state.registered.push(request.clone());
        if let Some(cluster) = state
            .clusters
            .iter_mut()
            .find(|c| c.cluster_id == request.cluster_id)
        {
            cluster.federated_cluster_uid = request.federated_cluster_uid.clone();
            cluster.federated_cluster_name = request.federated_cluster_name.clone();
        }
        Ok(())
    }

    async fn unregister_federated_cluster(&self, cluster_id: &str) -> Result<()> {
        let mut state = self.state();
        state.unregistered.push(cluster_id.to_string());
        if let Some(cluster) = state.clusters.iter_mut().find(|c| c.cluster_id == cluster_id) {
            cluster.federated_cluster_uid.clear();
            cluster.federated_cluster_name.clear();
        }
        Ok(())
    }
}

/// 固定凭证表
#[derive(Debug, Default)]
pub struct StaticCredentials {
    credentials: HashMap<String, ClusterCredential>,
}

impl StaticCredentials {
    /// 创建空凭证表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记集群凭证
    pub fn with(mut self, cluster_id: &str, api_server_url: &str) -> Self {
        self.credentials.insert(
            cluster_id.to_string(),
            ClusterCredential {
                cluster_id: cluster_id.to_string(),
                api_server_url: api_server_url.to_string(),
                bearer_token: format!("token-{}", cluster_id),
            },
        );
        self
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentials {
    async fn get_cluster_credential(&self, cluster_id: &str) -> Result<ClusterCredential> {
        self.credentials
            .get(cluster_id)
            .cloned()
            .ok_or(Error::FailedToReadClusterInfo)
    }
}
