//! `capcost node-price` / `capcost pod-price`.

use anyhow::Result;
use serde::Serialize;

use capcost_core::{CapcostConfig, Node, Pod};
use capcost_pricing::{NodePriceEstimate, PriceModel};

use super::{billing_window, load_price_model, read_json};

#[derive(Serialize)]
struct NodePriceReport<'a> {
    node: &'a str,
    instance_type: Option<&'a str>,
    #[serde(flatten)]
    estimate: NodePriceEstimate,
    total: f64,
}

#[derive(Serialize)]
struct PodPriceReport {
    pod: String,
    hours: f64,
    total: f64,
}

pub fn node_price(
    config: &CapcostConfig,
    node_path: &str,
    duration: &str,
    catalog: Option<&str>,
    format: &str,
) -> Result<()> {
    let model = load_price_model(config, catalog)?;
    let node: Node = read_json(node_path)?;
    let (start, end) = billing_window(duration)?;

    let estimate = model.estimate_node(&node, start, end);
    let report = NodePriceReport {
        node: &node.name,
        instance_type: node.instance_type(),
        total: estimate.total(),
        estimate,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("node:      {}", report.node);
            println!("instance:  {}", report.instance_type.unwrap_or("<unknown>"));
            println!("hours:     {:.4}", report.estimate.hours);
            println!("pricing:   {:?}{}", report.estimate.basis, if report.estimate.preemptible { " (preemptible)" } else { "" });
            println!("instance $ {:.6}", report.estimate.instance);
            println!("gpu $      {:.6}", report.estimate.gpu);
            println!("total $    {:.6}", report.total);
        }
    }
    Ok(())
}

pub fn pod_price(
    config: &CapcostConfig,
    pod_path: &str,
    duration: &str,
    catalog: Option<&str>,
    format: &str,
) -> Result<()> {
    let model = load_price_model(config, catalog)?;
    let pod: Pod = read_json(pod_path)?;
    let (start, end) = billing_window(duration)?;

    let report = PodPriceReport {
        pod: pod.key(),
        hours: capcost_pricing::billable_hours(start, end),
        total: model.pod_price(&pod, start, end)?,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => println!("{}: ${:.6} for {:.4}h", report.pod, report.total, report.hours),
    }
    Ok(())
}
