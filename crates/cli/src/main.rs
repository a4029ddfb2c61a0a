use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use skiff_api::{Aggregator, ApiConfig, InProcAggregator, ListRequest};
use skiff_core::ResourceKind;
use skiff_dataselect::{QueryParams, SelectQuery};
use skiff_kubehub::NamespaceQuery;
use tracing::{error, info};

mod render;

#[derive(Parser, Debug)]
#[command(name = "skiffctl", version, about = "Skiff CLI: aggregated Kubernetes resource lists")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Namespaces to list from (comma separated; default: all)
    #[arg(long = "ns", global = true, value_delimiter = ',')]
    namespaces: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the kinds skiff can aggregate
    Kinds,
    /// List objects of one kind with their aggregated status
    Ls {
        /// Kind, e.g. "rs", "statefulsets", "pod"
        kind: String,
        /// Sort pairs, e.g. "d,creationTimestamp,a,name"
        #[arg(long = "sort")]
        sort: Option<String>,
        /// Filter pairs, e.g. "name,web,namespace,prod"
        #[arg(long = "filter")]
        filter: Option<String>,
        /// Page number (1-based)
        #[arg(long = "page")]
        page: Option<i64>,
        /// Items per page (default: SKIFF_PAGE_SIZE, else no paging)
        #[arg(long = "per-page")]
        per_page: Option<i64>,
    },
}

fn init_tracing(config: &ApiConfig) {
    let env = config.log_filter.clone().unwrap_or_else(|| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics(config: &ApiConfig) {
    if let Some(addr) = config.metrics_addr.as_deref() {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid SKIFF_METRICS_ADDR; expected host:port");
        }
    }
}

fn select_query(
    config: &ApiConfig,
    sort: Option<String>,
    filter: Option<String>,
    page: Option<i64>,
    per_page: Option<i64>,
) -> Result<SelectQuery> {
    let items_per_page = per_page.or(config.default_page_size);
    let params = QueryParams {
        sort_by: sort,
        filter_by: filter,
        items_per_page,
        page: items_per_page.map(|_| page.unwrap_or(1)),
        ..Default::default()
    };
    Ok(SelectQuery::parse(&params)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiConfig::from_env();
    init_tracing(&config);
    init_metrics(&config);
    let cli = Cli::parse();

    match cli.command {
        Commands::Kinds => match cli.output {
            Output::Human => {
                for k in ResourceKind::ALL {
                    let scope = if k.namespaced() { "namespaced" } else { "cluster" };
                    let role = if k.is_workload() { "workload" } else { "flat" };
                    println!("{} • {} • {}", k, scope, role);
                }
            }
            Output::Json => println!("{}", serde_json::to_string_pretty(&ResourceKind::ALL)?),
        },
        Commands::Ls { kind, sort, filter, page, per_page } => {
            let kind = ResourceKind::from_str(&kind)?;
            let query = select_query(&config, sort, filter, page, per_page)?;
            let namespaces = NamespaceQuery::new(cli.namespaces);
            info!(kind = %kind, ns = ?namespaces.namespaces(), "ls invoked");
            let api = InProcAggregator::try_default(config.clone()).await?;
            let req = ListRequest::new(kind).in_namespaces(namespaces).with_query(query);
            match api.list(req).await {
                Ok(list) => match cli.output {
                    Output::Human => {
                        print!("{}", render::table(&list, chrono::Utc::now()));
                        eprintln!("{} of {} items", list.len(), list.total_items());
                    }
                    Output::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                },
                Err(e) => {
                    error!(error = %e, "ls failed");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
