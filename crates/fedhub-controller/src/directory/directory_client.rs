//! 基于 HTTP 的联邦目录服务客户端

use async_trait::async_trait;
use fedhub_common::{Error, FederationRequest, ManagedCluster, Result};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::FederationDirectory;

/// 成功的结果码
const RESULT_SUCCESS: &str = "SUCCESS";
/// 失败的结果码
const RESULT_FAIL: &str = "FAIL";

/// 目录服务配置
#[derive(Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
    /// 服务基础地址
    pub base_url: String,
    /// 基本认证用户名
    pub username: String,
    /// 基本认证密码
    pub password: String,
    /// 集群列表路径
    #[serde(default = "default_list_path")]
    pub list_path: String,
    /// 联邦注册路径
    #[serde(default = "default_register_path")]
    pub register_path: String,
    /// 联邦注销路径前缀，集群 ID 直接拼接在后面
    #[serde(default = "default_unregister_path")]
    pub unregister_path: String,
    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_list_path() -> String {
    "/clusters/federated".to_string()
}

fn default_register_path() -> String {
    "/clusters/federated".to_string()
}

fn default_unregister_path() -> String {
    "/clusters/federated/".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("list_path", &self.list_path)
            .field("register_path", &self.register_path)
            .field("unregister_path", &self.unregister_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// 目录服务响应信封
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryResponse {
    #[serde(default)]
    result_code: String,
    #[serde(default)]
    result_message: String,
    #[serde(default)]
    items: Vec<ManagedCluster>,
}

impl DirectoryResponse {
    /// 列表查询只接受明确的成功结果码
    fn into_success(self) -> Result<Self> {
        if self.result_code == RESULT_SUCCESS {
            Ok(self)
        } else {
            error!("目录服务返回失败: {} {}", self.result_code, self.result_message);
            Err(Error::FailedRequest)
        }
    }

    /// 写操作只有明确的失败结果码才算失败
    fn ensure_not_failed(self) -> Result<()> {
        if self.result_code == RESULT_FAIL {
            error!("目录服务返回失败: {} {}", self.result_code, self.result_message);
            Err(Error::FailedRequest)
        } else {
            Ok(())
        }
    }
}

/// 联邦目录服务客户端
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    /// HTTP 客户端
    client: Client,
    /// 服务配置
    config: DirectoryConfig,
}

impl HttpDirectoryClient {
    /// 根据配置创建客户端
    pub fn new(config: DirectoryConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!("目录服务客户端已创建: {}", config.base_url);
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 发送请求并解析响应信封
    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("调用目录服务: {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.username, Some(&self.config.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("目录服务请求失败: {}", e);
            Error::FailedRequest
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("目录服务返回异常状态: {} {}", status, url);
            return Err(Error::FailedRequest);
        }

        response.json::<T>().await.map_err(|e| {
            error!("解析目录服务响应失败: {}", e);
            Error::FailedRequest
        })
    }
}

#[async_trait]
impl FederationDirectory for HttpDirectoryClient {
    async fn list_managed_clusters(&self) -> Result<Vec<ManagedCluster>> {
        let response: DirectoryResponse = self
            .call::<(), _>(Method::GET, &self.config.list_path, None)
            .await?;
        Ok(response.into_success()?.items)
    }

    async fn register_federated_cluster(&self, request: &FederationRequest) -> Result<()> {
        let response: DirectoryResponse = self
            .call(Method::POST, &self.config.register_path, Some(request))
            .await?;
        response.ensure_not_failed()?;
        info!(cluster_id = %request.cluster_id, "目录服务已记录联邦集群");
        Ok(())
    }

    async fn unregister_federated_cluster(&self, cluster_id: &str) -> Result<()> {
        let path = format!("{}{}", self.config.unregister_path, cluster_id);
        let response: DirectoryResponse = self.call::<(), _>(Method::DELETE, &path, None).await?;
        response.ensure_not_failed()?;
        info!(cluster_id = %cluster_id, "目录服务已解除联邦集群");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{closed_address, spawn_test_server};
    use axum::extract::Path;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn config() -> DirectoryConfig {
        serde_json::from_value(serde_json::json!({
            "base_url": "http://directory.local/",
            "username": "svc",
            "password": "pa55word"
        }))
        .unwrap()
    }

    fn client(base_url: String) -> HttpDirectoryClient {
        HttpDirectoryClient::new(DirectoryConfig {
            base_url,
            ..config()
        })
        .unwrap()
    }

    fn request() -> FederationRequest {
        FederationRequest {
            cluster_id: "c-1".into(),
            federated_cluster_uid: "uid-alpha".into(),
            federated_cluster_name: "alpha".into(),
        }
    }

    #[test]
    fn test_config_defaults_and_redaction() {
        let config = config();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.unregister_path, "/clusters/federated/");
        assert!(!format!("{:?}", config).contains("pa55word"));
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = HttpDirectoryClient::new(config()).unwrap();
        assert_eq!(
            client.url("/clusters/federated"),
            "http://directory.local/clusters/federated"
        );
    }

    #[test]
    fn test_response_envelope() {
        let ok: DirectoryResponse = serde_json::from_str(
            r#"{"resultCode":"SUCCESS","items":[{"clusterId":"c-1","name":"alpha"}]}"#,
        )
        .unwrap();
        let items = ok.into_success().unwrap().items;
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_federated());

        let failed: DirectoryResponse =
            serde_json::from_str(r#"{"resultCode":"FAIL","resultMessage":"boom"}"#).unwrap();
        assert_eq!(failed.into_success().unwrap_err(), Error::FailedRequest);
    }

    #[test]
    fn test_write_reply_without_result_code_is_accepted() {
        let reply: DirectoryResponse = serde_json::from_str(r#"{"resultMessage":"ok"}"#).unwrap();
        assert_eq!(reply.ensure_not_failed(), Ok(()));

        let reply: DirectoryResponse = serde_json::from_str(r#"{"resultMessage":"ok"}"#).unwrap();
        assert_eq!(reply.into_success().unwrap_err(), Error::FailedRequest);
    }

    #[tokio::test]
    async fn test_list_sends_basic_auth() {
        let app = Router::new().route(
            "/clusters/federated",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map_or(false, |v| v.starts_with("Basic "));
                if !authorized {
                    return (StatusCode::UNAUTHORIZED, Json(Value::Null));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "resultCode": "SUCCESS",
                        "items": [
                            {"clusterId": "c-1", "name": "alpha"},
                            {"clusterId": "c-2", "name": "beta", "federatedClusterUID": "uid-beta"}
                        ]
                    })),
                )
            }),
        );
        let client = client(spawn_test_server(app).await);

        let clusters = client.list_managed_clusters().await.unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters[1].is_federated());
    }

    #[tokio::test]
    async fn test_register_and_unregister_paths() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registered = seen.clone();
        let unregistered = seen.clone();
        let app = Router::new()
            .route(
                "/clusters/federated",
                post(move |Json(body): Json<FederationRequest>| {
                    let seen = registered.clone();
                    async move {
                        seen.lock().unwrap().push(format!("register {}", body.cluster_id));
                        Json(json!({"resultMessage": "saved"}))
                    }
                }),
            )
            .route(
                "/clusters/federated/:cluster_id",
                delete(move |Path(cluster_id): Path<String>| {
                    let seen = unregistered.clone();
                    async move {
                        seen.lock().unwrap().push(format!("unregister {}", cluster_id));
                        Json(json!({"resultCode": "SUCCESS"}))
                    }
                }),
            );
        let client = client(spawn_test_server(app).await);

        client.register_federated_cluster(&request()).await.unwrap();
        client.unregister_federated_cluster("c-1").await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["register c-1".to_string(), "unregister c-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fail_result_code_is_failed_request() {
        let app = Router::new().route(
            "/clusters/federated",
            post(|| async { Json(json!({"resultCode": "FAIL", "resultMessage": "duplicated"})) }),
        );
        let client = client(spawn_test_server(app).await);

        assert_eq!(
            client.register_federated_cluster(&request()).await,
            Err(Error::FailedRequest)
        );
    }

    #[tokio::test]
    async fn test_error_status_is_failed_request() {
        let app = Router::new()
            .route(
                "/clusters/federated",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/clusters/federated/:cluster_id",
                delete(|| async { StatusCode::NOT_FOUND }),
            );
        let client = client(spawn_test_server(app).await);

        assert_eq!(client.list_managed_clusters().await, Err(Error::FailedRequest));
        assert_eq!(
            client.unregister_federated_cluster("c-1").await,
            Err(Error::FailedRequest)
        );
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_failed_request() {
        let client = client(closed_address());
        assert_eq!(client.list_managed_clusters().await, Err(Error::FailedRequest));
    }
}
