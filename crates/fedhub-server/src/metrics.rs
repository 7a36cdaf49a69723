//! 指标收集与导出模块
//!
//! 该模块统计集群注册、注销和资源同步的结果，
//! 并通过 Prometheus 文本格式导出。

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use fedhub_common::{RegisterResult, SyncResponse};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

const SUCCESS: &str = "success";
const FAILURE: &str = "failure";

/// 接口指标
#[derive(Clone)]
pub struct ApiMetrics {
    /// Prometheus 注册表
    registry: Registry,
    /// 集群注册结果
    registrations: IntCounterVec,
    /// 集群注销结果
    deregistrations: IntCounterVec,
    /// 资源同步结果
    synced_resources: IntCounterVec,
}

fn result_counter(name: &str, help: &str) -> Result<IntCounterVec> {
    Ok(IntCounterVec::new(Opts::new(name, help), &["result"])?)
}

impl ApiMetrics {
    /// 创建并注册指标
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let registrations = result_counter(
            "fedhub_cluster_registrations_total",
            "Total number of cluster registration attempts by result",
        )?;
        let deregistrations = result_counter(
            "fedhub_cluster_deregistrations_total",
            "Total number of cluster deregistration attempts by result",
        )?;
        let synced_resources = result_counter(
            "fedhub_synced_resources_total",
            "Total number of resources synchronized to the control plane by result",
        )?;

        registry.register(Box::new(registrations.clone()))?;
        registry.register(Box::new(deregistrations.clone()))?;
        registry.register(Box::new(synced_resources.clone()))?;

        Ok(Self {
            registry,
            registrations,
            deregistrations,
            synced_resources,
        })
    }

    /// 记录批量注册结果
    pub fn record_registrations(&self, results: &[RegisterResult]) {
        for result in results {
            let label = if result.is_success() { SUCCESS } else { FAILURE };
            self.registrations.with_label_values(&[label]).inc();
        }
    }

    /// 记录注销结果
    pub fn record_deregistration(&self, success: bool) {
        let label = if success { SUCCESS } else { FAILURE };
        self.deregistrations.with_label_values(&[label]).inc();
    }

    /// 记录同步结果
    pub fn record_sync(&self, response: &SyncResponse) {
        self.synced_resources
            .with_label_values(&[SUCCESS])
            .inc_by(response.success_resource as u64);
        self.synced_resources
            .with_label_values(&[FAILURE])
            .inc_by(response.fail_resource as u64);
    }

    /// 以文本格式导出
    pub fn render(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

/// `/metrics` 处理函数
pub async fn metrics_handler(State(metrics): State<ApiMetrics>) -> Response {
    match metrics.render() {
        Ok((content_type, body)) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!("导出指标失败: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_by_result_label() {
        let metrics = ApiMetrics::new().unwrap();
        metrics.record_registrations(&[
            RegisterResult {
                cluster_id: "c-1".into(),
                name: "alpha".into(),
                code: 201,
                message: "CLUSTER_REGISTERED_SUCCESSFULLY".into(),
            },
            RegisterResult {
                cluster_id: "c-2".into(),
                name: String::new(),
                code: 409,
                message: "CLUSTER_ALREADY_REGISTERED".into(),
            },
        ]);
        metrics.record_sync(&SyncResponse {
            total_resource: 3,
            fail_resource: 1,
            success_resource: 2,
        });
        metrics.record_deregistration(true);

        let (content_type, body) = metrics.render().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains(r#"fedhub_cluster_registrations_total{result="success"} 1"#));
        assert!(text.contains(r#"fedhub_cluster_registrations_total{result="failure"} 1"#));
        assert!(text.contains(r#"fedhub_synced_resources_total{result="success"} 2"#));
        assert!(text.contains(r#"fedhub_cluster_deregistrations_total{result="success"} 1"#));
    }
}
