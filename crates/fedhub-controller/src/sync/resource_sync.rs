//! 资源同步
//!
//! 将成员集群中选定的资源复制到联邦控制平面。命名空间逐个创建，资源按命名空间、
//! 类型逐个复制，单个资源失败只计数，不影响其他资源。

use fedhub_common::{Error, ResourceKind, Result, SyncRequest, SyncRequestData, SyncResponse};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::sanitize::sanitize;
use crate::cluster_api::{ApiError, ClusterApi, ClusterConnector};
use crate::directory::CredentialResolver;

/// 成员集群连接
///
/// 凭证读取或客户端创建失败都返回 `FailedRequest`。
pub(crate) async fn connect_member(
    credentials: &dyn CredentialResolver,
    connector: &dyn ClusterConnector,
    cluster_id: &str,
) -> Result<Arc<dyn ClusterApi>> {
    let credential = credentials
        .get_cluster_credential(cluster_id)
        .await
        .map_err(|e| {
            error!(cluster_id = %cluster_id, "读取成员集群凭证失败: {}", e);
            Error::FailedRequest
        })?;

    connector.connect(&credential).map_err(|e| {
        error!(cluster_id = %cluster_id, "连接成员集群失败: {}", e);
        Error::FailedRequest
    })
}

/// 资源同步器
pub struct ResourceSynchronizer {
    credentials: Arc<dyn CredentialResolver>,
    connector: Arc<dyn ClusterConnector>,
    control_plane: Arc<dyn ClusterApi>,
}

impl ResourceSynchronizer {
    /// 创建同步器
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

    /// 执行同步
    ///
    /// 只有成员集群连接失败才返回错误，其余失败都体现在计数中。
    pub async fn sync(&self, cluster_id: &str, request: &SyncRequest) -> Result<SyncResponse> {
        let member = connect_member(
            self.credentials.as_ref(),
            self.connector.as_ref(),
            cluster_id,
        )
        .await?;

        info!(
            cluster_id = %cluster_id,
            "开始同步，声明资源 {} 个",
            request.declared_resources()
        );

        let mut response = SyncResponse::default();
        for namespace in &request.create_namespaces {
            if self.create_namespace(member.as_ref(), namespace).await {
                response.succeed();
            } else {
                response.fail(1);
            }
        }

        for data in &request.data {
            self.copy_namespace(member.as_ref(), data, &mut response).await;
        }

        info!(
            cluster_id = %cluster_id,
            "同步完成: 共 {} 个，成功 {} 个，失败 {} 个",
            response.total_resource,
            response.success_resource,
            response.fail_resource
        );
        Ok(response)
    }

    /// 在控制平面创建命名空间，已存在视为失败
    async fn create_namespace(&self, member: &dyn ClusterApi, name: &str) -> bool {
        match self.control_plane.get(ResourceKind::Namespace, None, name).await {
            Ok(_) => {
                warn!("命名空间 {} 创建失败: 已存在", name);
                return false;
            }
            Err(ApiError::NotFound(_)) => {}
            Err(e) => {
                warn!("命名空间 {} 创建失败: {}", name, e);
                return false;
            }
        }

        self.copy_resource(member, ResourceKind::Namespace, None, name)
            .await
    }

    /// 复制一个命名空间下声明的所有资源
    async fn copy_namespace(
        &self,
        member: &dyn ClusterApi,
        data: &SyncRequestData,
        response: &mut SyncResponse,
    ) {
        let namespace = data.namespace.as_str();
        if let Err(ApiError::NotFound(_)) = self
            .control_plane
            .get(ResourceKind::Namespace, None, namespace)
            .await
        {
            let count: usize = data.list.iter().map(|group| group.list.len()).sum();
            warn!("命名空间 {} 不存在，{} 个资源全部失败", namespace, count);
            response.fail(count);
            return;
        }

        for group in &data.list {
            let kind = match group.kind.parse::<ResourceKind>() {
                Ok(kind) if kind.is_namespaced() => kind,
                _ => {
                    warn!("不支持的资源类型: {}", group.kind);
                    response.fail(group.list.len());
                    continue;
                }
            };

            for name in &group.list {
                if self.copy_resource(member, kind, Some(namespace), name).await {
                    response.succeed();
                } else {
                    response.fail(1);
                }
            }
        }
    }

    /// 从成员集群读取资源，清理后在控制平面创建
    async fn copy_resource(
        &self,
        member: &dyn ClusterApi,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> bool {
        let target = namespace.map_or_else(|| name.to_string(), |ns| format!("{}/{}", ns, name));

        let source = match member.get(kind, namespace, name).await {
            Ok(source) => source,
            Err(e) => {
                warn!("{} {} 创建失败: 读取源资源出错: {}", kind, target, e);
                return false;
            }
        };

        match self
            .control_plane
            .create(kind, namespace, &sanitize(kind, &source))
            .await
        {
            Ok(_) => {
                info!("{} {} 创建成功", kind, target);
                true
            }
            Err(e) => {
                warn!("{} {} 创建失败: {}", kind, target, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_object, FakeCluster, FakeConnector, StaticCredentials};
    use fedhub_common::SyncRequestResource;
    use kube::api::DynamicObject;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn synchronizer(member: Arc<FakeCluster>, control_plane: Arc<FakeCluster>) -> ResourceSynchronizer {
        ResourceSynchronizer::new(
            Arc::new(StaticCredentials::new().with("c-1", "https://10.0.0.1:6443")),
            Arc::new(FakeConnector::new().with_member("c-1", member)),
            control_plane,
        )
    }

    fn data(namespace: &str, kind: &str, names: &[&str]) -> SyncRequestData {
        SyncRequestData {
            namespace: namespace.to_string(),
            list: vec![SyncRequestResource {
                kind: kind.to_string(),
                list: names.iter().map(|n| n.to_string()).collect(),
            }],
        }
    }

    #[tokio::test]
    async fn test_end_to_end_namespace_and_deployment() {
        let member = Arc::new(
            FakeCluster::new()
                .with_object(ResourceKind::Namespace, None, "ns1")
                .with_object(ResourceKind::Deployment, Some("ns1"), "web"),
        );
        let control_plane = Arc::new(FakeCluster::new());
        let request = SyncRequest {
            create_namespaces: vec!["ns1".into()],
            data: vec![data("ns1", "deployment", &["web"])],
        };

        let response = synchronizer(member, control_plane.clone())
            .sync("c-1", &request)
            .await
            .unwrap();
        assert_eq!(
            response,
            SyncResponse {
                total_resource: 2,
                fail_resource: 0,
                success_resource: 2
            }
        );

        let namespace = control_plane.object(ResourceKind::Namespace, None, "ns1").unwrap();
        assert!(namespace.metadata.uid.is_none());
        let web = control_plane
            .object(ResourceKind::Deployment, Some("ns1"), "web")
            .unwrap();
        assert!(web.metadata.resource_version.is_none());
    }

    fn job_from_template(name: &str, uid: &str) -> DynamicObject {
        let mut job = sample_object(ResourceKind::Job, Some("batch"), name);
        let labels = json!({
            "app": "report",
            "controller-uid": uid,
            "job-name": name,
            "batch.kubernetes.io/controller-uid": uid,
            "batch.kubernetes.io/job-name": name
        });
        job.metadata.labels = serde_json::from_value(labels.clone()).unwrap();
        job.data = json!({
            "spec": {
                "selector": {"matchLabels": {"controller-uid": uid}},
                "template": {
                    "metadata": {"labels": labels},
                    "spec": {"restartPolicy": "Never"}
                }
            }
        });
        job
    }

    #[tokio::test]
    async fn test_jobs_are_created_without_controller_fields() {
        let member = Arc::new(FakeCluster::new());
        member.insert_object(ResourceKind::Job, Some("batch"), job_from_template("report-1", "u-1"));
        member.insert_object(ResourceKind::Job, Some("batch"), job_from_template("report-2", "u-2"));
        let control_plane = Arc::new(FakeCluster::new().with_object(ResourceKind::Namespace, None, "batch"));
        let request = SyncRequest {
            create_namespaces: vec![],
            data: vec![data("batch", "job", &["report-1", "report-2"])],
        };

        let response = synchronizer(member, control_plane.clone())
            .sync("c-1", &request)
            .await
            .unwrap();
        assert_eq!(
            response,
            SyncResponse {
                total_resource: 2,
                fail_resource: 0,
                success_resource: 2
            }
        );

        for name in ["report-1", "report-2"] {
            let job = control_plane
                .object(ResourceKind::Job, Some("batch"), name)
                .unwrap();
            let expected = BTreeMap::from([("app".to_string(), "report".to_string())]);
            assert_eq!(job.metadata.labels.as_ref(), Some(&expected));
            assert!(job.metadata.uid.is_none());
            assert!(job.data["spec"].get("selector").is_none());
            assert_eq!(job.data["spec"]["template"]["metadata"]["labels"], json!({"app": "report"}));
        }
    }

    #[tokio::test]
    async fn test_missing_namespace_fails_in_bulk_without_member_calls() {
        let member = Arc::new(FakeCluster::new());
        let control_plane = Arc::new(FakeCluster::new());
        let request = SyncRequest {
            create_namespaces: vec![],
            data: vec![SyncRequestData {
                namespace: "absent".into(),
                list: vec![
                    SyncRequestResource {
                        kind: "deployment".into(),
                        list: vec!["a".into(), "b".into()],
                    },
                    SyncRequestResource {
                        kind: "configmap".into(),
                        list: vec!["c".into()],
                    },
                ],
            }],
        };

        let response = synchronizer(member.clone(), control_plane.clone())
            .sync("c-1", &request)
            .await
            .unwrap();
        assert_eq!(response.total_resource, 3);
        assert_eq!(response.fail_resource, 3);
        assert_eq!(member.calls().get, 0);
        assert_eq!(control_plane.calls().create, 0);
    }

    #[tokio::test]
    async fn test_existing_namespace_counts_as_failure() {
        let member = Arc::new(FakeCluster::new().with_object(ResourceKind::Namespace, None, "ns1"));
        let control_plane = Arc::new(FakeCluster::new().with_object(ResourceKind::Namespace, None, "ns1"));
        let request = SyncRequest {
            create_namespaces: vec!["ns1".into(), "ns2".into()],
            data: vec![],
        };

        let response = synchronizer(member, control_plane.clone())
            .sync("c-1", &request)
            .await
            .unwrap();
        // ns1 已存在，ns2 在成员集群中不存在
        assert_eq!(response.total_resource, 2);
        assert_eq!(response.fail_resource, 2);
        assert_eq!(control_plane.calls().create, 0);
    }

    #[rstest]
    #[case("pod")]
    #[case("Deployment")]
    #[case("namespace")]
    #[tokio::test]
    async fn test_unsupported_kind_fails_in_bulk(#[case] kind: &str) {
        let member = Arc::new(FakeCluster::new());
        let control_plane = Arc::new(FakeCluster::new().with_object(ResourceKind::Namespace, None, "ns1"));
        let request = SyncRequest {
            create_namespaces: vec![],
            data: vec![data("ns1", kind, &["x", "y"])],
        };

        let response = synchronizer(member.clone(), control_plane)
            .sync("c-1", &request)
            .await
            .unwrap();
        assert_eq!(response.fail_resource, 2);
        assert!(response.is_consistent());
        assert_eq!(member.calls().get, 0);
    }

    #[tokio::test]
    async fn test_resource_failures_are_isolated() {
        let member = Arc::new(
            FakeCluster::new()
                .with_object(ResourceKind::ConfigMap, Some("ns1"), "a")
                .with_object(ResourceKind::ConfigMap, Some("ns1"), "b")
                .with_object(ResourceKind::ConfigMap, Some("ns1"), "dup")
                .with_object(ResourceKind::ConfigMap, Some("ns1"), "broken"),
        );
        let control_plane = Arc::new(
            FakeCluster::new()
                .with_object(ResourceKind::Namespace, None, "ns1")
                .with_object(ResourceKind::ConfigMap, Some("ns1"), "dup")
                .failing_create_of("broken"),
        );
        let request = SyncRequest {
            create_namespaces: vec![],
            data: vec![data("ns1", "configmap", &["a", "missing", "dup", "broken", "b"])],
        };

        let response = synchronizer(member, control_plane.clone())
            .sync("c-1", &request)
            .await
            .unwrap();
        assert_eq!(response.total_resource, 5);
        assert_eq!(response.success_resource, 2);
        assert_eq!(response.fail_resource, 3);
        assert!(control_plane.object(ResourceKind::ConfigMap, Some("ns1"), "b").is_some());
    }

    #[tokio::test]
    async fn test_empty_request() {
        let response = synchronizer(Arc::new(FakeCluster::new()), Arc::new(FakeCluster::new()))
            .sync("c-1", &SyncRequest::default())
            .await
            .unwrap();
        assert_eq!(response, SyncResponse::default());
    }

    #[tokio::test]
    async fn test_unknown_member_aborts() {
        let control_plane = Arc::new(FakeCluster::new());
        let request = SyncRequest {
            create_namespaces: vec!["ns1".into()],
            data: vec![],
        };
        assert_eq!(
            synchronizer(Arc::new(FakeCluster::new()), control_plane.clone())
                .sync("c-404", &request)
                .await,
            Err(Error::FailedRequest)
        );
        assert_eq!(control_plane.calls(), Default::default());
    }
}
