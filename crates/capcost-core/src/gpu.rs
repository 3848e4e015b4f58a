//! GPU presence detection.

use crate::resource::{RESOURCE_NVIDIA_GPU, ResourceList};
use crate::types::Node;

/// True if the node carries the GPU label or reports nonzero GPU
/// allocatable or capacity.
pub fn node_has_gpu(gpu_label: &str, node: &Node) -> bool {
    if node.labels.contains_key(gpu_label) {
        return true;
    }
    let nonzero = |list: &ResourceList| {
        list.get(RESOURCE_NVIDIA_GPU).is_some_and(|q| !q.is_zero())
    };
    nonzero(&node.allocatable) || nonzero(&node.capacity)
}
