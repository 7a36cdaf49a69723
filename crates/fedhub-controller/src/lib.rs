//! FedHub 控制器
//!
//! 该模块实现成员集群的注册、注销以及成员集群到联邦控制平面的资源同步。
//! 使用 kube-rs 框架与 Kubernetes API 交互。

pub mod cluster_api;
pub mod directory;
pub mod register;
pub mod sync;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cluster_api::{ClusterApi, ClusterConnector, KubeClusterApi, KubeConnector};
pub use directory::{
    CredentialResolver, DirectoryConfig, FederationDirectory, HttpDirectoryClient, VaultConfig,
    VaultCredentialResolver,
};
pub use register::{ClusterCatalog, ClusterDeregistrar, ClusterRegistrar};
pub use sync::{DiffReporter, ResourceSynchronizer};
pub use utils::PollConfig;
