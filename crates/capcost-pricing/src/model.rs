//! Node and pod price estimation.
//!
//! Node prices come from the full-instance tables when the instance type is
//! known, falling back to per-resource pricing (scaled by the preemptible
//! discount) otherwise. Pod prices are the theoretical minimum on a
//! perfectly sized machine and are never discounted.
//!
//! Attached storage is not priced.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::warn;

use capcost_core::resource::{GIB, RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_NVIDIA_GPU};
use capcost_core::{DEFAULT_GPU_LABEL, Node, Pod, ResourceList};

use crate::catalog::PriceCatalog;
use crate::error::PricingResult;
use crate::resolve::{instance_family, is_custom, lookup_price, resolve_price};

const NANOS_PER_MINUTE: f64 = 60.0 * 1e9;

/// Prices nodes and pods over a time window. All prices are in USD.
pub trait PriceModel: Send + Sync {
    /// Price of running `node` from `start` to `end`.
    fn node_price(&self, node: &Node, start: SystemTime, end: SystemTime) -> PricingResult<f64>;

    /// Theoretical minimum price of running `pod` from `start` to `end` on a
    /// perfectly matching machine.
    fn pod_price(&self, pod: &Pod, start: SystemTime, end: SystemTime) -> PricingResult<f64>;
}

/// How the instance part of a node price was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    /// Full-instance table hit.
    InstanceTable,
    /// Per-resource fallback after a table miss.
    PerResource,
    /// No instance-type label; only GPUs were priced.
    Unpriced,
}

/// Itemized node price.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NodePriceEstimate {
    pub hours: f64,
    pub preemptible: bool,
    pub basis: PriceBasis,
    pub instance: f64,
    pub gpu: f64,
}

impl NodePriceEstimate {
    pub fn total(&self) -> f64 {
        self.instance + self.gpu
    }
}

/// [`PriceModel`] backed by a [`PriceCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogPriceModel {
    catalog: Arc<PriceCatalog>,
    gpu_label: String,
}

impl CatalogPriceModel {
    pub fn new(catalog: impl Into<Arc<PriceCatalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            gpu_label: DEFAULT_GPU_LABEL.to_string(),
        }
    }

    /// Label holding the node's GPU type.
    pub fn with_gpu_label(mut self, label: impl Into<String>) -> Self {
        self.gpu_label = label.into();
        self
    }

    pub fn catalog(&self) -> &PriceCatalog {
        &self.catalog
    }

    /// Itemized version of [`PriceModel::node_price`].
    pub fn estimate_node(&self, node: &Node, start: SystemTime, end: SystemTime) -> NodePriceEstimate {
        let hours = billable_hours(start, end);
        let preemptible = node.has_preemptible_pricing();

        let (basis, instance) = match node.instance_type() {
            None => (PriceBasis::Unpriced, 0.0),
            Some(instance_type) => {
                let table = self.catalog.instance_price_table(preemptible);
                match lookup_price(instance_type, &[table]) {
                    Some(per_hour) => (PriceBasis::InstanceTable, per_hour * hours),
                    None => {
                        warn!(
                            node = %node.name,
                            instance_type,
                            preemptible,
                            "pricing information not found for instance type; falling back to per-resource pricing"
                        );
                        let full = self.base_price(&node.capacity, Some(instance_type), start, end);
                        (PriceBasis::PerResource, full * self.preemptible_discount(node))
                    }
                }
            }
        };

        let gpu = match node.capacity.get(RESOURCE_NVIDIA_GPU) {
            Some(gpus) if !gpus.is_zero() => {
                gpus.milli_value() as f64 / 1000.0 * self.gpu_price_per_hour(node, preemptible) * hours
            }
            _ => 0.0,
        };

        NodePriceEstimate {
            hours,
            preemptible,
            basis,
            instance,
            gpu,
        }
    }

    /// Factor applied to per-resource prices of a preemptible node.
    ///
    /// 1.0 for on-demand nodes and nodes without an instance type.
    pub fn preemptible_discount(&self, node: &Node) -> f64 {
        if !node.has_preemptible_pricing() {
            return 1.0;
        }
        let Some(instance_type) = node.instance_type() else {
            return 1.0;
        };
        resolve_price(
            instance_family(instance_type),
            &[self.catalog.preemptible_discounts(is_custom(instance_type))],
            self.catalog.preemptible_discount,
        )
    }

    /// CPU and memory price of `resources` on the given instance type.
    pub fn base_price(
        &self,
        resources: &ResourceList,
        instance_type: Option<&str>,
        start: SystemTime,
        end: SystemTime,
    ) -> f64 {
        if resources.is_empty() {
            return 0.0;
        }
        let hours = billable_hours(start, end);
        let instance_type = instance_type.unwrap_or_default();
        let family = instance_family(instance_type);
        let custom = is_custom(instance_type);

        let cpu_per_hour = resolve_price(
            family,
            &[self.catalog.cpu_prices(custom)],
            self.catalog.base_cpu_price_per_hour,
        );
        let cpu = resources.get(RESOURCE_CPU).map_or(0, |q| q.milli_value());
        let cpu_price = cpu as f64 / 1000.0 * cpu_per_hour * hours;

        let mem_per_hour = resolve_price(
            family,
            &[self.catalog.memory_prices(custom)],
            self.catalog.base_memory_price_per_hour_per_gib,
        );
        let mem = resources.get(RESOURCE_MEMORY).map_or(0, |q| q.value());
        let mem_price = mem as f64 / GIB as f64 * mem_per_hour * hours;

        cpu_price + mem_price
    }

    /// GPU price of `resources` at the flat base GPU price.
    pub fn additional_price(&self, resources: &ResourceList, start: SystemTime, end: SystemTime) -> f64 {
        if resources.is_empty() {
            return 0.0;
        }
        let hours = billable_hours(start, end);
        let gpus = resources.get(RESOURCE_NVIDIA_GPU).map_or(0, |q| q.milli_value());
        gpus as f64 / 1000.0 * self.catalog.base_gpu_price_per_hour * hours
    }

    fn gpu_price_per_hour(&self, node: &Node, preemptible: bool) -> f64 {
        let base = self.catalog.base_gpu_price_per_hour;
        let Some(gpu_type) = node.labels.get(&self.gpu_label) else {
            return base;
        };
        match lookup_price(gpu_type, &[self.catalog.gpu_price_table(preemptible)]) {
            Some(price) => price,
            None => {
                warn!(
                    node = %node.name,
                    gpu_type = %gpu_type,
                    preemptible,
                    "pricing information not found for GPU type; falling back to base GPU price"
                );
                base
            }
        }
    }
}

impl PriceModel for CatalogPriceModel {
    fn node_price(&self, node: &Node, start: SystemTime, end: SystemTime) -> PricingResult<f64> {
        Ok(self.estimate_node(node, start, end).total())
    }

    fn pod_price(&self, pod: &Pod, start: SystemTime, end: SystemTime) -> PricingResult<f64> {
        let price = pod
            .containers
            .iter()
            .map(|c| self.base_price(&c.requests, None, start, end) + self.additional_price(&c.requests, start, end))
            .sum();
        Ok(price)
    }
}

/// Hours between `start` and `end`, rounded up to the whole minute.
///
/// A reversed interval yields a negative value.
pub fn billable_hours(start: SystemTime, end: SystemTime) -> f64 {
    let nanos = match end.duration_since(start) {
        Ok(elapsed) => elapsed.as_nanos() as f64,
        Err(err) => -(err.duration().as_nanos() as f64),
    };
    (nanos / NANOS_PER_MINUTE).ceil() / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcost_core::{Container, LABEL_INSTANCE_TYPE_STABLE, LABEL_PREEMPTIBLE, LABEL_SPOT, Quantity};
    use std::time::{Duration, UNIX_EPOCH};

    const EPS: f64 = 1e-9;

    fn window(minutes: u64) -> (SystemTime, SystemTime) {
        let start = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        (start, start + Duration::from_secs(minutes * 60))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < EPS, "expected {expected}, got {actual}");
    }

    fn test_catalog() -> PriceCatalog {
        let mut c = PriceCatalog {
            base_cpu_price_per_hour: 0.04,
            base_memory_price_per_hour_per_gib: 0.005,
            base_gpu_price_per_hour: 0.7,
            preemptible_discount: 0.25,
            ..Default::default()
        };
        c.instance_prices.insert("n1-standard-2".into(), 1.0);
        c.preemptible_instance_prices.insert("n1-standard-2".into(), 0.2);
        c.predefined_cpu_prices.insert("n1".into(), 0.03);
        c.predefined_memory_prices.insert("n1".into(), 0.004);
        c.custom_cpu_prices.insert("n1".into(), 0.035);
        c.custom_memory_prices.insert("n1".into(), 0.0045);
        c.predefined_preemptible_discount.insert("n1".into(), 0.2);
        c.custom_preemptible_discount.insert("n1".into(), 0.3);
        c.gpu_prices.insert("nvidia-tesla-t4".into(), 0.35);
        c.preemptible_gpu_prices.insert("nvidia-tesla-t4".into(), 0.11);
        c
    }

    fn model() -> CatalogPriceModel {
        CatalogPriceModel::new(test_catalog())
    }

    fn node(instance_type: &str, cpu: i64, mem_gib: i64) -> Node {
        Node::new("node-1")
            .with_label(LABEL_INSTANCE_TYPE_STABLE, instance_type)
            .with_capacity(RESOURCE_CPU, Quantity::from_value(cpu))
            .with_capacity(RESOURCE_MEMORY, Quantity::from_value(mem_gib * GIB))
    }

    #[test]
    fn hours_round_up_to_the_minute() {
        let start = UNIX_EPOCH;
        assert_close(billable_hours(start, start + Duration::from_secs(1)), 1.0 / 60.0);
        assert_close(billable_hours(start, start + Duration::from_secs(60 * 60)), 1.0);
        assert_close(billable_hours(start, start + Duration::from_secs(61 * 60)), 61.0 / 60.0);
        assert_close(billable_hours(start, start + Duration::from_secs(90 * 60 - 30)), 1.5);
        assert_close(billable_hours(start, start), 0.0);
    }

    #[test]
    fn reversed_interval_is_negative() {
        let start = UNIX_EPOCH + Duration::from_secs(3600);
        assert_close(billable_hours(start, UNIX_EPOCH), -1.0);
    }

    #[test]
    fn instance_table_price() {
        let (start, end) = window(90);
        let estimate = model().estimate_node(&node("n1-standard-2", 2, 8), start, end);
        assert_eq!(estimate.basis, PriceBasis::InstanceTable);
        assert_close(estimate.total(), 1.5);
    }

    #[test]
    fn spot_uses_preemptible_instance_table() {
        let (start, end) = window(60);
        let spot = node("n1-standard-2", 2, 8).with_label(LABEL_SPOT, "true");
        assert_close(model().node_price(&spot, start, end).unwrap(), 0.2);

        let preemptible = node("n1-standard-2", 2, 8).with_label(LABEL_PREEMPTIBLE, "true");
        assert_close(model().node_price(&preemptible, start, end).unwrap(), 0.2);
    }

    #[test]
    fn unknown_instance_falls_back_to_family_prices() {
        let (start, end) = window(60);
        let n = node("n1-standard-16", 16, 60);
        let estimate = model().estimate_node(&n, start, end);
        assert_eq!(estimate.basis, PriceBasis::PerResource);
        assert_close(estimate.total(), 16.0 * 0.03 + 60.0 * 0.004);
    }

    #[test]
    fn custom_shape_uses_custom_tables() {
        let (start, end) = window(60);
        let n = node("n1-custom-4-8192", 4, 8);
        assert_close(model().node_price(&n, start, end).unwrap(), 4.0 * 0.035 + 8.0 * 0.0045);
    }

    #[test]
    fn unknown_family_uses_flat_base_prices() {
        let (start, end) = window(120);
        let n = node("z9-standard-2", 2, 4);
        assert_close(model().node_price(&n, start, end).unwrap(), (2.0 * 0.04 + 4.0 * 0.005) * 2.0);
    }

    #[test]
    fn preemptible_fallback_applies_family_discount() {
        let (start, end) = window(60);
        let on_demand = node("n1-standard-16", 16, 60);
        let preemptible = node("n1-standard-16", 16, 60).with_label(LABEL_PREEMPTIBLE, "true");

        let full = model().node_price(&on_demand, start, end).unwrap();
        let discounted = model().node_price(&preemptible, start, end).unwrap();
        assert_close(discounted, full * 0.2);
        assert!(discounted < full);
    }

    #[test]
    fn preemptible_custom_fallback_applies_custom_discount() {
        let (start, end) = window(60);
        let n = node("n1-custom-4-8192", 4, 8).with_label(LABEL_SPOT, "true");
        assert_close(model().preemptible_discount(&n), 0.3);
        assert_close(model().node_price(&n, start, end).unwrap(), (4.0 * 0.035 + 8.0 * 0.0045) * 0.3);
    }

    #[test]
    fn preemptible_unknown_family_applies_default_discount() {
        let n = node("z9-standard-2", 2, 4).with_label(LABEL_PREEMPTIBLE, "true");
        assert_close(model().preemptible_discount(&n), 0.25);
        assert_close(model().preemptible_discount(&node("z9-standard-2", 2, 4)), 1.0);
    }

    #[test]
    fn missing_instance_label_skips_base_price() {
        let (start, end) = window(60);
        let n = Node::new("bare").with_capacity(RESOURCE_CPU, Quantity::from_value(8));
        let estimate = model().estimate_node(&n, start, end);
        assert_eq!(estimate.basis, PriceBasis::Unpriced);
        assert_close(estimate.total(), 0.0);
    }

    #[test]
    fn gpu_priced_by_type_label() {
        let (start, end) = window(60);
        let n = node("n1-standard-2", 2, 8)
            .with_label(DEFAULT_GPU_LABEL, "nvidia-tesla-t4")
            .with_capacity(RESOURCE_NVIDIA_GPU, Quantity::from_value(2));
        let estimate = model().estimate_node(&n, start, end);
        assert_close(estimate.gpu, 2.0 * 0.35);
        assert_close(estimate.total(), 1.0 + 0.7);

        let spot = n.with_label(LABEL_SPOT, "true");
        assert_close(model().estimate_node(&spot, start, end).gpu, 2.0 * 0.11);
    }

    #[test]
    fn unknown_gpu_type_uses_base_price() {
        let (start, end) = window(60);
        let n = node("n1-standard-2", 2, 8)
            .with_label(DEFAULT_GPU_LABEL, "nvidia-unobtainium")
            .with_capacity(RESOURCE_NVIDIA_GPU, Quantity::from_value(1));
        assert_close(model().estimate_node(&n, start, end).gpu, 0.7);
    }

    #[test]
    fn gpu_without_type_label_uses_base_price() {
        let (start, end) = window(30);
        let n = Node::new("gpu").with_capacity(RESOURCE_NVIDIA_GPU, Quantity::from_value(4));
        assert_close(model().node_price(&n, start, end).unwrap(), 4.0 * 0.7 * 0.5);
    }

    #[test]
    fn custom_gpu_label_key() {
        let (start, end) = window(60);
        let n = Node::new("gpu")
            .with_label("example.com/gpu-type", "nvidia-tesla-t4")
            .with_capacity(RESOURCE_NVIDIA_GPU, Quantity::from_value(1));
        let m = model().with_gpu_label("example.com/gpu-type");
        assert_close(m.node_price(&n, start, end).unwrap(), 0.35);
        assert_close(model().node_price(&n, start, end).unwrap(), 0.7);
    }

    #[test]
    fn pod_price_sums_containers_at_base_prices() {
        let (start, end) = window(60);
        let pod = Pod::new("default", "trainer")
            .with_container(
                Container::new("main")
                    .with_request(RESOURCE_CPU, Quantity::from_milli(1500))
                    .with_request(RESOURCE_MEMORY, Quantity::from_value(2 * GIB))
                    .with_request(RESOURCE_NVIDIA_GPU, Quantity::from_value(1)),
            )
            .with_container(Container::new("sidecar").with_request(RESOURCE_CPU, Quantity::from_milli(500)));

        let expected = 2.0 * 0.04 + 2.0 * 0.005 + 0.7;
        assert_close(model().pod_price(&pod, start, end).unwrap(), expected);
    }

    #[test]
    fn pod_price_is_never_discounted() {
        let (start, end) = window(60);
        let mut pod = Pod::new("default", "web")
            .with_container(Container::new("app").with_request(RESOURCE_CPU, Quantity::from_value(1)));
        let undecorated = model().pod_price(&pod, start, end).unwrap();

        pod.annotations.insert(LABEL_PREEMPTIBLE.into(), "true".into());
        pod.annotations.insert(LABEL_SPOT.into(), "true".into());
        assert_close(model().pod_price(&pod, start, end).unwrap(), undecorated);
        assert_close(undecorated, 0.04);
    }

    #[test]
    fn pod_without_requests_is_free() {
        let (start, end) = window(60);
        let pod = Pod::new("default", "empty").with_container(Container::new("app"));
        assert_close(model().pod_price(&pod, start, end).unwrap(), 0.0);
    }

    #[test]
    fn base_price_of_empty_resources_is_zero() {
        let (start, end) = window(60);
        assert_close(model().base_price(&ResourceList::new(), Some("n1-standard-2"), start, end), 0.0);
        assert_close(model().additional_price(&ResourceList::new(), start, end), 0.0);
    }

    #[test]
    fn model_is_usable_as_trait_object() {
        let (start, end) = window(60);
        let catalog = Arc::new(test_catalog());
        let models: Vec<Box<dyn PriceModel>> = vec![
            Box::new(CatalogPriceModel::new(catalog.clone())),
            Box::new(CatalogPriceModel::new(catalog)),
        ];
        for m in &models {
            assert_close(m.node_price(&node("n1-standard-2", 2, 8), start, end).unwrap(), 1.0);
        }
    }
}
