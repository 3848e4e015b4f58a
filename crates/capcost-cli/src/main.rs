use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "capcost",
    about = "capcost: node/pod price and node utilization estimates",
    version,
    propagate_version = true,
)]
struct Cli {
    /// capcost.toml with utilization and pricing options
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the price of running a node.
    NodePrice {
        /// Node snapshot (JSON)
        #[arg(short, long)]
        node: String,
        /// Billing window, e.g. 30m, 2h, 3600s
        #[arg(short, long, default_value = "1h")]
        duration: String,
        /// Price catalog (TOML); overrides the config file
        #[arg(long)]
        catalog: Option<String>,
    },
    /// Estimate the minimum price of running a pod.
    PodPrice {
        /// Pod snapshot (JSON)
        #[arg(short, long)]
        pod: String,
        #[arg(short, long, default_value = "1h")]
        duration: String,
        #[arg(long)]
        catalog: Option<String>,
    },
    /// Calculate the utilization of a node and its pods.
    Utilization {
        /// Node info snapshot (JSON): `{"node": {...}, "pods": [...]}`
        #[arg(short, long)]
        node_info: String,
        /// Evaluation time as a Unix timestamp (default: now)
        #[arg(long)]
        now: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("capcost=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::NodePrice { node, duration, catalog } => {
            commands::price::node_price(&config, &node, &duration, catalog.as_deref(), &cli.format)
        }
        Commands::PodPrice { pod, duration, catalog } => {
            commands::price::pod_price(&config, &pod, &duration, catalog.as_deref(), &cli.format)
        }
        Commands::Utilization { node_info, now } => {
            commands::utilization::utilization(&config, &node_info, now, &cli.format)
        }
    }
}
