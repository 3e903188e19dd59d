//! Main entry point for CLI command to start the query service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use controller_graphql::configuration::generate_config_schema;
use controller_graphql::memory::Fixture;
use controller_graphql::server;
use controller_graphql::Configuration;
use controller_graphql::GraphqlService;
use controller_graphql::MemoryStore;
use controller_graphql::Repositories;
use tracing::info;

/// Options for the query service
#[derive(Parser, Debug)]
#[command(name = "controller-graphql", about = "Controller GraphQL query service")]
struct Opt {
    /// Log filter (off|error|warn|info|debug|trace), overrides the configuration.
    #[arg(long = "log", env = "CONTROLLER_GRAPHQL_LOG")]
    log_level: Option<String>,

    /// Configuration location relative to the working directory.
    #[arg(short, long = "config", env = "CONTROLLER_GRAPHQL_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Prints the configuration schema.
    #[arg(long)]
    schema: bool,

    /// Prints the GraphQL schema.
    #[arg(long)]
    sdl: bool,
}

fn main() -> Result<()> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(nb) = std::env::var("CONTROLLER_GRAPHQL_NUM_CORES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
    {
        builder.worker_threads(nb);
    }
    let runtime = builder.build()?;
    runtime.block_on(rt_main())
}

async fn rt_main() -> Result<()> {
    let opt = Opt::parse();

    if opt.schema {
        let schema = generate_config_schema();
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let schema = controller_graphql::build_schema().context("could not build the GraphQL schema")?;
    if opt.sdl {
        println!("{}", schema.sdl());
        return Ok(());
    }

    let configuration = match &opt.config_path {
        Some(path) => Configuration::from_path(path)?,
        None => Configuration::default(),
    };
    controller_graphql::logging::init(&configuration.logging, opt.log_level.as_deref())?;
    info!(format = %configuration.logging.format, "logging initialised");

    let store = match &configuration.fixtures {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("could not read fixtures from {}", path.display()))?;
            let fixture = Fixture::from_yaml(&source)
                .with_context(|| format!("could not parse fixtures from {}", path.display()))?;
            info!(path = %path.display(), "seeding the store from fixtures");
            MemoryStore::from_fixture(fixture)
        }
        None => MemoryStore::new(),
    };

    let service = GraphqlService::new(
        schema,
        Repositories::from_store(Arc::new(store)),
        configuration.server.request_timeout,
    );
    let router = server::router(service, &configuration.server.path);
    let listener = tokio::net::TcpListener::bind(configuration.server.listen)
        .await
        .with_context(|| format!("could not listen on {}", configuration.server.listen))?;

    server::serve(listener, router, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
        }
    })
    .await?;
    Ok(())
}
