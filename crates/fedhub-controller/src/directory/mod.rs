//! 目录服务模块
//!
//! 该模块定义了联邦目录服务和集群凭证存储这两个外部协作方的接口，
//! 以及基于 HTTP 的实现。目录服务记录哪些集群已知、哪些已加入联邦；
//! 凭证存储按集群 ID 提供访问成员集群的地址和令牌。

mod directory_client;
mod vault_credentials;

pub use directory_client::{DirectoryConfig, HttpDirectoryClient};
pub use vault_credentials::{VaultConfig, VaultCredentialResolver};

use async_trait::async_trait;
use fedhub_common::{ClusterCredential, FederationRequest, ManagedCluster, Result};

#[cfg(test)]
use mockall::automock;

/// 联邦目录服务
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FederationDirectory: Send + Sync {
    /// 列出目录中登记的所有集群
    async fn list_managed_clusters(&self) -> Result<Vec<ManagedCluster>>;

    /// 记录集群已加入联邦
    async fn register_federated_cluster(&self, request: &FederationRequest) -> Result<()>;

    /// 解除集群与联邦的关联
    async fn unregister_federated_cluster(&self, cluster_id: &str) -> Result<()>;
}

/// 集群凭证解析
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// 获取成员集群访问凭证，每次调用都重新读取
    async fn get_cluster_credential(&self, cluster_id: &str) -> Result<ClusterCredential>;
}

/// 在本地随机端口启动 HTTP 服务，返回基础地址
#[cfg(test)]
pub(crate) async fn spawn_test_server(app: axum::Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());
    tokio::spawn(server);
    format!("http://{}", addr)
}

/// 返回一个没有服务监听的地址
#[cfg(test)]
pub(crate) fn closed_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
