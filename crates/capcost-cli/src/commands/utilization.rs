//! `capcost utilization`.

use anyhow::Result;
use serde::Serialize;

use capcost_core::{CapcostConfig, NodeInfo};
use capcost_utilization::{UtilizationInfo, calculate_with_config};

use super::{evaluation_time, read_json};

#[derive(Serialize)]
struct UtilizationReport<'a> {
    node: &'a str,
    pods: usize,
    #[serde(flatten)]
    info: UtilizationInfo,
}

pub fn utilization(config: &CapcostConfig, node_info_path: &str, now: Option<u64>, format: &str) -> Result<()> {
    let node_info: NodeInfo = read_json(node_info_path)?;
    let now = evaluation_time(now)?;

    let info = calculate_with_config(&node_info, &config.utilization, now)?;
    let report = UtilizationReport {
        node: &node_info.node.name,
        pods: node_info.pods.len(),
        info,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("node:        {} ({} pods)", report.node, report.pods);
            println!("cpu:         {:.4}", report.info.cpu_util);
            println!("memory:      {:.4}", report.info.mem_util);
            println!("gpu:         {:.4}", report.info.gpu_util);
            println!(
                "utilization: {:.4} ({})",
                report.info.utilization,
                report.info.resource.resource_name()
            );
        }
    }
    Ok(())
}
