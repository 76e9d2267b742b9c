use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use hello_rados_core::backend::{DirClient, FaultPlan, MemoryCluster, CLUSTER_DIR_OPTION};
use hello_rados_core::{run_hello, EnvSnapshot, HelloRequest, SessionBuilder, SessionConfig};

/// Fault spec for the memory backend, e.g. `delete-pool:-5`.
const ENV_FAULTS: &str = "HELLO_RADOS_FAULTS";

mod cli;
mod output;
mod style;

use cli::{Backend, HelloCli};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = HelloCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let env = EnvSnapshot::capture();
    let config = session_config(&cli, &env);
    let request = HelloRequest {
        pool: cli.pool.clone(),
        object: cli.object.clone(),
        content: cli.content.as_bytes().to_vec(),
    };
    tracing::debug!(backend = ?cli.backend, pool = %request.pool, "starting run");

    let report = match cli.backend {
        Backend::Memory => {
            let faults: FaultPlan = env
                .var(ENV_FAULTS)
                .unwrap_or_default()
                .parse()
                .map_err(|err| eyre!("invalid {ENV_FAULTS}: {err}"))?;
            let cluster = MemoryCluster::with_faults(faults);
            run_hello(SessionBuilder::new(cluster.client()), &config, &request)
        }
        Backend::Dir => run_hello(SessionBuilder::new(DirClient::new()), &config, &request),
    };

    let outcome = report.to_outcome();
    let code = output::emit_output(&cli, &report, &outcome).map_err(|err| eyre!("{err:?}"))?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("hello_rados={level},hello_rados_core={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Client arguments in the order the session sees them: `--conf` first,
/// then `CEPH_ARGS`, then `--cluster_dir`, then everything after `--`.
fn session_config(cli: &HelloCli, env: &EnvSnapshot) -> SessionConfig {
    let mut args = Vec::new();
    if let Some(dir) = &cli.cluster_dir {
        args.push(format!("--{CLUSTER_DIR_OPTION}"));
        args.push(dir.display().to_string());
    }
    args.extend(cli.client_args.iter().cloned());

    let config = SessionConfig::new(cli.id.clone())
        .with_args(args)
        .with_env_args(env);
    match &cli.conf {
        Some(path) => config.with_conf(path),
        None => config,
    }
}
