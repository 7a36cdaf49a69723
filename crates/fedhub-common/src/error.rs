//! 错误处理模块
//!
//! 该模块提供 FedHub 的统一错误类型。每个错误都对应一个 HTTP 状态码和一个稳定的
//! 消息键，HTTP 层只暴露消息键，不泄露内部细节。

use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFamily {
    /// 资源不存在
    NotFound,
    /// 资源冲突
    Conflict,
    /// 请求校验失败
    Validation,
    /// 运行期或下游失败
    Operational,
}

/// FedHub 统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 目录服务中不存在该集群
    #[error("集群不存在")]
    ClusterNotFound,

    /// 控制平面中不存在该集群对象
    #[error("控制平面中不存在该集群")]
    ClusterNotFoundInKarmada,

    /// 命名空间不存在
    #[error("命名空间不存在")]
    NamespaceNotFound,

    /// 资源不存在
    #[error("资源不存在")]
    ResourceNotFound,

    /// 目录服务显示该集群已注册
    #[error("集群已注册")]
    ClusterAlreadyRegistered,

    /// 控制平面中已存在同名集群对象
    #[error("控制平面中已存在该集群")]
    ClusterAlreadyRegisteredInKarmada,

    /// 资源已存在
    #[error("资源已存在")]
    ResourceAlreadyExists,

    /// 请求参数无效
    #[error("请求参数无效")]
    RequestValueInvalid,

    /// YAML 格式无效
    #[error("YAML 格式无效")]
    InvalidYamlFormat,

    /// 不支持的资源类型
    #[error("不支持的资源类型")]
    UnsupportedResourceKind,

    /// 传播策略缺少目标集群
    #[error("传播策略缺少目标集群")]
    PolicyMissingTargetClusters,

    /// 资源与请求不匹配
    #[error("资源与请求不匹配")]
    ResourceMismatch,

    /// 读取集群凭证失败
    #[error("读取集群信息失败")]
    FailedToReadClusterInfo,

    /// 集群注册失败
    #[error("集群注册失败")]
    ClusterRegistrationFailed,

    /// 加载集群配置失败
    #[error("加载集群配置失败")]
    ClusterLoadConfigFailed,

    /// 下游请求失败
    #[error("请求失败")]
    FailedRequest,

    /// 资源操作失败
    #[error("资源操作失败")]
    ResourceOperationFailed,
}

impl Error {
    /// 错误所属的分类
    pub fn family(&self) -> ErrorFamily {
        match self {
            Error::ClusterNotFound
            | Error::ClusterNotFoundInKarmada
            | Error::NamespaceNotFound
            | Error::ResourceNotFound => ErrorFamily::NotFound,
            Error::ClusterAlreadyRegistered
            | Error::ClusterAlreadyRegisteredInKarmada
            | Error::ResourceAlreadyExists => ErrorFamily::Conflict,
            Error::RequestValueInvalid
            | Error::InvalidYamlFormat
            | Error::UnsupportedResourceKind
            | Error::PolicyMissingTargetClusters
            | Error::ResourceMismatch => ErrorFamily::Validation,
            Error::FailedToReadClusterInfo
            | Error::ClusterRegistrationFailed
            | Error::ClusterLoadConfigFailed
            | Error::FailedRequest
            | Error::ResourceOperationFailed => ErrorFamily::Operational,
        }
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self.family() {
            ErrorFamily::NotFound => 404,
            ErrorFamily::Conflict => 409,
            ErrorFamily::Validation => 400,
            ErrorFamily::Operational => 500,
        }
    }

    /// 返回给调用方的消息键
    pub fn message_key(&self) -> &'static str {
        match self {
            Error::ClusterNotFound => "CLUSTER_NOT_FOUND",
            Error::ClusterNotFoundInKarmada => "CLUSTER_NOT_FOUND_IN_KARMADA",
            Error::NamespaceNotFound => "NAMESPACE_NOT_FOUND",
            Error::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Error::ClusterAlreadyRegistered => "CLUSTER_ALREADY_REGISTERED",
            Error::ClusterAlreadyRegisteredInKarmada => "CLUSTER_ALREADY_REGISTERED_IN_KARMADA",
            Error::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            Error::RequestValueInvalid => "REQUEST_VALUE_INVALID",
            Error::InvalidYamlFormat => "INVALID_YAML_FORMAT",
            Error::UnsupportedResourceKind => "UNSUPPORTED_RESOURCE_KIND",
            Error::PolicyMissingTargetClusters => "POLICY_MISSING_TARGET_CLUSTERS",
            Error::ResourceMismatch => "RESOURCE_MISMATCH",
            Error::FailedToReadClusterInfo => "FAILED_TO_READ_CLUSTER_INFO",
            Error::ClusterRegistrationFailed => "CLUSTER_REGISTRATION_FAILED",
            Error::ClusterLoadConfigFailed => "CLUSTER_LOAD_CONFIG_FAILED",
            Error::FailedRequest => "REQUEST_FAILED",
            Error::ResourceOperationFailed => "RESOURCE_OPERATION_FAILED",
        }
    }
}

/// FedHub 结果类型别名
pub type Result<T> = std::result::Result<T, Error>;
