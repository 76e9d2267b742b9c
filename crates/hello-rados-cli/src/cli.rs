use std::path::PathBuf;

use clap::{value_parser, ArgAction, Parser, ValueEnum};
use hello_rados_core::{DEFAULT_CONTENT, DEFAULT_IDENTITY, DEFAULT_OBJECT, DEFAULT_POOL};

pub const HELLO_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nOptions:\n{options}\n{after-help}";

pub const HELLO_BEFORE_HELP: &str = concat!(
    "hello-rados ",
    env!("CARGO_PKG_VERSION"),
    " – object store session demo\n\n",
    "Connects to the cluster, creates a pool, writes one object, reads it\n",
    "back with a balanced read, then deletes the pool and disconnects.\n",
);

pub const HELLO_AFTER_HELP: &str = concat!(
    "Arguments after `--` go to the cluster client unchanged, e.g.\n",
    "    hello-rados -- --mon_host 10.0.0.1 --keyring /etc/ceph/keyring\n\n",
    "Exit codes: 0 success, 1 open/put/get failure, 2 pool cleanup failure.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "hello-rados",
    author,
    version,
    before_help = HELLO_BEFORE_HELP,
    after_help = HELLO_AFTER_HELP,
    help_template = HELLO_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct HelloCli {
    #[arg(long, default_value = DEFAULT_IDENTITY, help = "Client identity; connects as client.<ID>")]
    pub id: String,
    #[arg(long, default_value = DEFAULT_POOL, help = "Pool to create for the run")]
    pub pool: String,
    #[arg(long, default_value = DEFAULT_OBJECT, help = "Object to write and read back")]
    pub object: String,
    #[arg(long, default_value = DEFAULT_CONTENT, help = "Content written to the object")]
    pub content: String,
    #[arg(
        short = 'c',
        long = "conf",
        env = "CEPH_CONF",
        value_parser = value_parser!(PathBuf),
        help = "Config file applied over the client arguments"
    )]
    pub conf: Option<PathBuf>,
    #[arg(
        long,
        value_enum,
        default_value_t = Backend::Memory,
        env = "HELLO_RADOS_BACKEND",
        help = "Cluster client implementation"
    )]
    pub backend: Backend,
    #[arg(
        long,
        env = "HELLO_RADOS_CLUSTER_DIR",
        value_parser = value_parser!(PathBuf),
        help = "Cluster directory for the dir backend (sets cluster_dir)"
    )]
    pub cluster_dir: Option<PathBuf>,
    #[arg(short, long, help = "Suppress human output (cleanup failures still print to stderr)")]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    pub trace: bool,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes")]
    pub json: bool,
    #[arg(long, help = "Disable colored human output")]
    pub no_color: bool,
    #[arg(last = true, allow_hyphen_values = true, value_name = "CLIENT_ARGS")]
    pub client_args: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// In-process cluster that lives for one run.
    Memory,
    /// Cluster kept under --cluster-dir.
    Dir,
}
