//! 数据模型模块
//!
//! 该模块定义了 FedHub 的核心数据模型，包括目录服务中的集群、集群凭证、
//! 注册结果以及资源同步的请求与响应。

pub mod cluster;
pub mod sync;
