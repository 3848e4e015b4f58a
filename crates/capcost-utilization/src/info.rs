//! Node utilization: sum of pod requests over allocatable, per resource.
//!
//! GPU nodes are judged by GPU utilization alone. Everything else is judged
//! by the larger of CPU and memory utilization.

use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use capcost_core::config::UtilizationConfig;
use capcost_core::gpu::node_has_gpu;
use capcost_core::pod::{is_daemonset_pod, is_long_terminating, is_mirror_pod};
use capcost_core::resource::{RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_NVIDIA_GPU};
use capcost_core::{NodeInfo, Pod, Quantity};

use crate::error::{UtilizationError, UtilizationResult};

/// Resource that determined a node's utilization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantResource {
    Cpu,
    #[default]
    Memory,
    Gpu,
}

impl DominantResource {
    pub fn resource_name(&self) -> &'static str {
        match self {
            DominantResource::Cpu => RESOURCE_CPU,
            DominantResource::Memory => RESOURCE_MEMORY,
            DominantResource::Gpu => RESOURCE_NVIDIA_GPU,
        }
    }
}

/// Utilization of a single node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UtilizationInfo {
    pub cpu_util: f64,
    pub mem_util: f64,
    pub gpu_util: f64,
    /// Resource with the highest utilization.
    pub resource: DominantResource,
    /// `max(cpu_util, mem_util)`, or `gpu_util` on GPU nodes.
    pub utilization: f64,
}

/// How a pod's requests enter the utilization ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodAccounting {
    /// Requests count towards usage.
    Counted,
    /// Requests are subtracted from allocatable instead of counted.
    ReservedCapacity,
    /// Requests are ignored entirely.
    Ignored,
}

/// Classify a pod for utilization accounting.
pub fn classify_pod(pod: &Pod, skip_daemonset_pods: bool, skip_mirror_pods: bool, now: SystemTime) -> PodAccounting {
    if skip_daemonset_pods && is_daemonset_pod(pod) {
        return PodAccounting::ReservedCapacity;
    }
    if skip_mirror_pods && is_mirror_pod(pod) {
        return PodAccounting::ReservedCapacity;
    }
    if is_long_terminating(pod, now) {
        return PodAccounting::Ignored;
    }
    PodAccounting::Counted
}

/// Calculate the utilization of a node.
///
/// A node with GPUs reports GPU utilization only; an unready GPU (missing
/// or zero allocatable) reports zero so the node stays eligible for scale
/// down. Other nodes report the larger of CPU and memory utilization, with
/// ties going to memory.
pub fn calculate(
    node_info: &NodeInfo,
    skip_daemonset_pods: bool,
    skip_mirror_pods: bool,
    gpu_label: &str,
    now: SystemTime,
) -> UtilizationResult<UtilizationInfo> {
    if node_has_gpu(gpu_label, &node_info.node) {
        let gpu_util = match calculate_utilization_of_resource(
            node_info,
            RESOURCE_NVIDIA_GPU,
            skip_daemonset_pods,
            skip_mirror_pods,
            now,
        ) {
            Ok(util) => util,
            Err(err) => {
                debug!(node = %node_info.node.name, error = %err, "node has unready GPU");
                0.0
            }
        };
        return Ok(UtilizationInfo {
            gpu_util,
            resource: DominantResource::Gpu,
            utilization: gpu_util,
            ..Default::default()
        });
    }

    let cpu_util =
        calculate_utilization_of_resource(node_info, RESOURCE_CPU, skip_daemonset_pods, skip_mirror_pods, now)?;
    let mem_util =
        calculate_utilization_of_resource(node_info, RESOURCE_MEMORY, skip_daemonset_pods, skip_mirror_pods, now)?;

    let (resource, utilization) = if cpu_util > mem_util {
        (DominantResource::Cpu, cpu_util)
    } else {
        (DominantResource::Memory, mem_util)
    };

    Ok(UtilizationInfo {
        cpu_util,
        mem_util,
        gpu_util: 0.0,
        resource,
        utilization,
    })
}

/// [`calculate`] with options taken from configuration.
pub fn calculate_with_config(
    node_info: &NodeInfo,
    config: &UtilizationConfig,
    now: SystemTime,
) -> UtilizationResult<UtilizationInfo> {
    calculate(
        node_info,
        config.skip_daemonset_pods,
        config.skip_mirror_pods,
        &config.gpu_label,
        now,
    )
}

/// Requests of counted pods divided by allocatable minus requests of
/// reserved pods, for one resource.
///
/// Sums are kept in milli-units; only the final ratio is floating point.
pub fn calculate_utilization_of_resource(
    node_info: &NodeInfo,
    resource: &str,
    skip_daemonset_pods: bool,
    skip_mirror_pods: bool,
    now: SystemTime,
) -> UtilizationResult<f64> {
    let node = &node_info.node;
    let allocatable = node
        .allocatable
        .get(resource)
        .copied()
        .ok_or_else(|| UtilizationError::ResourceMissing {
            resource: resource.to_string(),
            node: node.name.clone(),
        })?;
    if allocatable.is_zero() {
        return Err(UtilizationError::ResourceZero {
            resource: resource.to_string(),
            node: node.name.clone(),
        });
    }

    let mut pods_request = Quantity::ZERO;
    let mut reserved = Quantity::ZERO;
    for pod in &node_info.pods {
        match classify_pod(pod, skip_daemonset_pods, skip_mirror_pods, now) {
            PodAccounting::Counted => pods_request += pod.request(resource),
            PodAccounting::ReservedCapacity => reserved += pod.request(resource),
            PodAccounting::Ignored => {}
        }
    }

    let effective = allocatable - reserved;
    if effective.milli_value() <= 0 {
        return Err(UtilizationError::CapacityExhausted {
            resource: resource.to_string(),
            node: node.name.clone(),
            allocatable_milli: allocatable.milli_value(),
            reserved_milli: reserved.milli_value(),
        });
    }

    Ok(pods_request.milli_value() as f64 / effective.milli_value() as f64)
}
