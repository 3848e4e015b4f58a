//! Node and pod snapshots shared across capcost crates.
//!
//! These mirror the parts of the Kubernetes `Node` and `Pod` objects the
//! estimators read. Callers build them once per evaluation pass; nothing
//! here is mutated by the estimators.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resource::{Quantity, ResourceList};

/// Stable instance-type label key.
pub const LABEL_INSTANCE_TYPE_STABLE: &str = "node.kubernetes.io/instance-type";
/// Legacy instance-type label key, consulted when the stable key is absent.
pub const LABEL_INSTANCE_TYPE_LEGACY: &str = "beta.kubernetes.io/instance-type";
/// Marks a node as a GKE preemptible VM.
pub const LABEL_PREEMPTIBLE: &str = "cloud.google.com/gke-preemptible";
/// Marks a node as a GKE spot VM.
pub const LABEL_SPOT: &str = "cloud.google.com/gke-spot";
/// Default label carrying the accelerator type of a GPU node.
pub const DEFAULT_GPU_LABEL: &str = "cloud.google.com/gke-accelerator";

// ── Node ──────────────────────────────────────────────────────────

/// A node as seen by the estimators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Total resources of the machine.
    #[serde(default)]
    pub capacity: ResourceList,
    /// Resources available to pods.
    #[serde(default)]
    pub allocatable: ResourceList,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_capacity(mut self, resource: &str, qty: Quantity) -> Self {
        self.capacity.insert(resource.to_string(), qty);
        self
    }

    pub fn with_allocatable(mut self, resource: &str, qty: Quantity) -> Self {
        self.allocatable.insert(resource.to_string(), qty);
        self
    }

    /// Instance type from the stable label, falling back to the legacy one.
    pub fn instance_type(&self) -> Option<&str> {
        self.labels
            .get(LABEL_INSTANCE_TYPE_STABLE)
            .or_else(|| self.labels.get(LABEL_INSTANCE_TYPE_LEGACY))
            .map(String::as_str)
    }

    /// Whether the node should be priced as preemptible.
    ///
    /// Spot VMs are billed dynamically, but they are always cheaper than
    /// on-demand and prices are only compared against each other, so they
    /// share the preemptible price tables.
    pub fn has_preemptible_pricing(&self) -> bool {
        self.labels.get(LABEL_PREEMPTIBLE).is_some_and(|v| v == "true")
            || self.labels.get(LABEL_SPOT).is_some_and(|v| v == "true")
    }
}

// ── Pod ───────────────────────────────────────────────────────────

/// Owner of a pod (ReplicaSet, DaemonSet, Job, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
    /// True for the managing controller.
    #[serde(default)]
    pub controller: bool,
}

/// A single container and its resource requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub requests: ResourceList,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: ResourceList::new(),
        }
    }

    pub fn with_request(mut self, resource: &str, qty: Quantity) -> Self {
        self.requests.insert(resource.to_string(), qty);
        self
    }
}

/// A pod as seen by the estimators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pod {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Unix timestamp (seconds) at which deletion was requested.
    #[serde(default)]
    pub deletion_timestamp: Option<u64>,
    #[serde(default)]
    pub termination_grace_period_secs: Option<u64>,
}

impl Pod {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn with_owner(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.owner_references.push(OwnerReference {
            kind: kind.into(),
            name: name.into(),
            controller: true,
        });
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Sum of container requests for `resource`.
    pub fn request(&self, resource: &str) -> Quantity {
        self.containers
            .iter()
            .filter_map(|c| c.requests.get(resource).copied())
            .sum()
    }

    /// `namespace/name`, for log fields.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

// ── NodeInfo ──────────────────────────────────────────────────────

/// A node together with the pods bound to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    pub node: Node,
    #[serde(default)]
    pub pods: Vec<Pod>,
}

impl NodeInfo {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            pods: Vec::new(),
        }
    }

    pub fn with_pod(mut self, pod: Pod) -> Self {
        self.pods.push(pod);
        self
    }
}
