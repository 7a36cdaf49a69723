//! 资源同步模块
//!
//! 该模块负责将成员集群中的资源同步到联邦控制平面，
//! 以及比较两侧资源生成差异报告。

mod diff_report;
mod resource_sync;
mod sanitize;

pub use diff_report::DiffReporter;
pub use resource_sync::ResourceSynchronizer;
pub use sanitize::sanitize;
