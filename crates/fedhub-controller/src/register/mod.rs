//! 集群注册模块
//!
//! 该模块负责成员集群加入和退出联邦控制平面，以及已注册集群的查询。
//! 注册是多步操作，后续步骤失败时会尽力删除已创建的控制平面集群对象。

mod catalog;
mod deregistrar;
mod registrar;

pub use catalog::ClusterCatalog;
pub use deregistrar::{delete_and_confirm, ClusterDeregistrar};
pub use registrar::ClusterRegistrar;
