//! FedHub Common - 跨模块共享的数据模型与错误类型
//!
//! 该模块提供 FedHub 各组件共享的数据结构和统一的错误处理机制。

pub mod error;
pub mod models;

/// 重新导出常用类型，方便使用
pub use error::Error;
pub use error::ErrorFamily;
pub use error::Result;
pub use models::cluster::*;
pub use models::sync::*;
