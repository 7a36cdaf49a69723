//! 资源清理
//!
//! 复制到控制平面之前去掉由服务端生成的字段。

use fedhub_common::ResourceKind;
use kube::api::DynamicObject;
use serde_json::Value;

/// Job 控制器写入的标签
const JOB_CONTROLLER_LABELS: [&str; 4] = [
    "controller-uid",
    "job-name",
    "batch.kubernetes.io/controller-uid",
    "batch.kubernetes.io/job-name",
];

/// 返回可在另一个集群中创建的副本
pub fn sanitize(kind: ResourceKind, source: &DynamicObject) -> DynamicObject {
    let mut object = source.clone();

    let metadata = &mut object.metadata;
    metadata.resource_version = None;
    metadata.uid = None;
    metadata.creation_timestamp = None;
    metadata.managed_fields = None;
    metadata.generation = None;

    if kind == ResourceKind::Job {
        if let Some(labels) = metadata.labels.as_mut() {
            for label in JOB_CONTROLLER_LABELS {
                labels.remove(label);
            }
        }
        strip_job_spec(&mut object.data);
    }

    object
}

fn strip_job_spec(data: &mut Value) {
    let Some(spec) = data.get_mut("spec").and_then(Value::as_object_mut) else {
        return;
    };
    // selector 不可变，由服务端按新的 controller-uid 重新生成
    spec.remove("selector");

    let labels = spec
        .get_mut("template")
        .and_then(|t| t.get_mut("metadata"))
        .and_then(|m| m.get_mut("labels"))
        .and_then(Value::as_object_mut);
    if let Some(labels) = labels {
        for label in JOB_CONTROLLER_LABELS {
            labels.remove(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_object;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn job(name: &str, uid: &str) -> DynamicObject {
        let mut object = sample_object(ResourceKind::Job, Some("batch"), name);
        let controller_labels = BTreeMap::from([
            ("app".to_string(), "report".to_string()),
            ("controller-uid".to_string(), uid.to_string()),
            ("job-name".to_string(), name.to_string()),
            ("batch.kubernetes.io/controller-uid".to_string(), uid.to_string()),
            ("batch.kubernetes.io/job-name".to_string(), name.to_string()),
        ]);
        object.metadata.labels = Some(controller_labels.clone());
        object.data = json!({
            "spec": {
                "selector": {"matchLabels": {"controller-uid": uid}},
                "template": {
                    "metadata": {"labels": controller_labels},
                    "spec": {"restartPolicy": "Never"}
                }
            }
        });
        object
    }

    #[test]
    fn test_strips_server_metadata() {
        let mut source = sample_object(ResourceKind::Deployment, Some("ns1"), "web");
        source.metadata.creation_timestamp = Some(Time(Default::default()));
        source.metadata.labels = Some(BTreeMap::from([("job-name".to_string(), "x".to_string())]));

        let copy = sanitize(ResourceKind::Deployment, &source);
        assert!(copy.metadata.uid.is_none());
        assert!(copy.metadata.resource_version.is_none());
        assert!(copy.metadata.generation.is_none());
        assert!(copy.metadata.creation_timestamp.is_none());
        assert_eq!(copy.metadata.namespace.as_deref(), Some("ns1"));
        // 非 Job 保留标签
        assert!(copy.metadata.labels.unwrap().contains_key("job-name"));
        assert!(source.metadata.uid.is_some());
    }

    #[test]
    fn test_strips_job_controller_fields() {
        let copy = sanitize(ResourceKind::Job, &job("nightly", "u-1"));

        let labels = copy.metadata.labels.unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["app"], "report");
        assert!(copy.data["spec"].get("selector").is_none());
        assert_eq!(copy.data["spec"]["template"]["metadata"]["labels"], json!({"app": "report"}));
        assert_eq!(copy.data["spec"]["template"]["spec"]["restartPolicy"], "Never");
    }

    #[test]
    fn test_jobs_from_same_template_do_not_share_controller_labels() {
        let first = sanitize(ResourceKind::Job, &job("a", "u-1"));
        let second = sanitize(ResourceKind::Job, &job("b", "u-2"));
        assert_eq!(first.metadata.labels, second.metadata.labels);
        assert_eq!(
            first.data["spec"]["template"],
            second.data["spec"]["template"]
        );
    }
}
