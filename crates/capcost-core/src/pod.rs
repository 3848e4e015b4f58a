//! Pod lifecycle predicates used when accounting node utilization.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::Pod;

/// Annotation set by the kubelet on static (mirror) pods.
pub const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";
/// Annotation that lets non-DaemonSet-owned pods be treated as daemonset pods.
pub const DAEMONSET_POD_ANNOTATION: &str = "cluster-autoscaler.kubernetes.io/daemonset-pod";
/// Extra time a pod may spend terminating past its grace period before it
/// counts as long-terminating.
pub const LONG_TERMINATING_EXTRA_THRESHOLD: Duration = Duration::from_secs(5 * 60);
/// Grace period the API server applies when a pod does not set one.
pub const DEFAULT_TERMINATION_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// True if the pod is controlled by a DaemonSet or annotated as one.
pub fn is_daemonset_pod(pod: &Pod) -> bool {
    let owned = pod
        .owner_references
        .iter()
        .any(|owner| owner.controller && owner.kind == "DaemonSet");
    owned
        || pod
            .annotations
            .get(DAEMONSET_POD_ANNOTATION)
            .is_some_and(|v| v == "true")
}

/// True if the pod is the API mirror of a static kubelet pod.
pub fn is_mirror_pod(pod: &Pod) -> bool {
    pod.annotations.contains_key(MIRROR_POD_ANNOTATION)
}

/// True if the pod was deleted and has outlived its grace period plus
/// [`LONG_TERMINATING_EXTRA_THRESHOLD`] as of `now`. Pods without a grace
/// period get [`DEFAULT_TERMINATION_GRACE_PERIOD`].
pub fn is_long_terminating(pod: &Pod, now: SystemTime) -> bool {
    let Some(deleted_at) = pod.deletion_timestamp else {
        return false;
    };
    let grace = pod
        .termination_grace_period_secs
        .map_or(DEFAULT_TERMINATION_GRACE_PERIOD, Duration::from_secs);
    UNIX_EPOCH
        .checked_add(Duration::from_secs(deleted_at))
        .and_then(|t| t.checked_add(grace))
        .and_then(|t| t.checked_add(LONG_TERMINATING_EXTRA_THRESHOLD))
        .is_some_and(|deadline| deadline < now)
}
