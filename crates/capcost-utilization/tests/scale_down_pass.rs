//! A scale-down evaluation pass over a small cluster snapshot.
//!
//! Mirrors how a control loop uses the calculator: one call per node,
//! comparing the dominant utilization against a threshold.

use std::time::{Duration, UNIX_EPOCH};

use capcost_core::NodeInfo;
use capcost_core::types::DEFAULT_GPU_LABEL;
use capcost_utilization::{DominantResource, UtilizationError, calculate};

const SCALE_DOWN_THRESHOLD: f64 = 0.5;

fn cluster() -> Vec<NodeInfo> {
    serde_json::from_str(
        r#"[
        {
            "node": {"name": "busy", "allocatable": {"cpu": "4", "memory": "16Gi"}},
            "pods": [
                {"name": "db", "namespace": "prod",
                 "containers": [{"name": "db", "requests": {"cpu": "3", "memory": "8Gi"}}]}
            ]
        },
        {
            "node": {"name": "idle", "allocatable": {"cpu": "4", "memory": "16Gi"}},
            "pods": [
                {"name": "fluentd", "namespace": "kube-system",
                 "owner_references": [{"kind": "DaemonSet", "name": "fluentd", "controller": true}],
                 "containers": [{"name": "fluentd", "requests": {"cpu": "1", "memory": "1Gi"}}]},
                {"name": "stuck", "namespace": "prod",
                 "deletion_timestamp": 1000,
                 "containers": [{"name": "stuck", "requests": {"cpu": "3", "memory": "12Gi"}}]}
            ]
        },
        {
            "node": {"name": "gpu-booting",
                     "labels": {"cloud.google.com/gke-accelerator": "nvidia-tesla-t4"},
                     "allocatable": {"cpu": "8", "memory": "30Gi"}},
            "pods": [
                {"name": "web", "namespace": "prod",
                 "containers": [{"name": "web", "requests": {"cpu": "7", "memory": "28Gi"}}]}
            ]
        },
        {
            "node": {"name": "not-ready", "allocatable": {"memory": "16Gi"}},
            "pods": []
        }
    ]"#,
    )
    .unwrap()
}

#[test]
fn selects_underutilized_nodes() {
    let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let mut candidates = Vec::new();
    let mut failures = Vec::new();

    for info in cluster() {
        match calculate(&info, true, true, DEFAULT_GPU_LABEL, now) {
            Ok(util) if util.utilization < SCALE_DOWN_THRESHOLD => {
                candidates.push((info.node.name.clone(), util.resource))
            }
            Ok(_) => {}
            Err(err) => failures.push((info.node.name.clone(), err)),
        }
    }

    assert_eq!(
        candidates,
        vec![
            ("idle".to_string(), DominantResource::Memory),
            ("gpu-booting".to_string(), DominantResource::Gpu),
        ]
    );
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "not-ready");
    assert!(matches!(failures[0].1, UtilizationError::ResourceMissing { ref resource, .. } if resource == "cpu"));
}
