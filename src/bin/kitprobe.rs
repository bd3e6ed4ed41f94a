//! Thin developer-facing CLI over the `kitprobe` library. Exposes the
//! engine's entry points directly; it does not grow features of its own.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use kitprobe::aggregator::{scan, ScanOptions};
use kitprobe::config::load_config;
use kitprobe::environment::effective_env;
use kitprobe::paths::{Host, ProcessEnv};
use kitprobe::persistence::{load_kits_strict, save_kits, KitsSchema};
use kitprobe::variable_map::VariableMap;
use kitprobe::{paths, Kit};

#[derive(Parser)]
#[command(name = "kitprobe", version, about = "Toolchain discovery and environment synthesis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the kits document. Defaults to the platform data dir.
    #[arg(long, global = true)]
    kits_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the machine for compiler/SDK kits and write them to disk.
    Scan,
    /// List kits from the on-disk document.
    Kits,
    /// Print the effective environment for a named kit.
    Env {
        /// The kit's `name` field.
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let host = Host::current();
    let env = ProcessEnv;
    let kits_file = cli
        .kits_file
        .unwrap_or_else(|| paths::user_kits_file(host, &env));

    let exit_code = match cli.command {
        Commands::Scan => run_scan(host, &kits_file).await,
        Commands::Kits => run_kits(&kits_file),
        Commands::Env { name } => run_env(host, &kits_file, &name).await,
    };

    std::process::exit(exit_code);
}

async fn run_scan(host: Host, kits_file: &std::path::Path) -> i32 {
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return 1;
        }
    };

    let env = ProcessEnv;
    let path_var = std::env::var("PATH").unwrap_or_default();
    let sep = if host == Host::Windows { ';' } else { ':' };
    let mut path_entries: Vec<PathBuf> = path_var.split(sep).map(PathBuf::from).collect();
    path_entries.extend(config.extra_scan_dirs.clone());

    let raw_cmake_path = config
        .cmake_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "auto".to_string());
    let cmake = paths::resolve_cmake(
        host,
        &env,
        &raw_cmake_path,
        &HashMap::new(),
        None,
        &[],
    );

    let opts = ScanOptions {
        host,
        path_entries,
        min_gw_search_dirs: config.min_gw_search_dirs.clone(),
        vendor_installations: Vec::new(),
        tmp_dir: paths::tmp_dir(host, &env),
        bundled_ninja_dir: cmake.bundled_ninja_dir,
        clang_cl_search_dirs: Vec::new(),
        architectures: config.architectures.clone(),
    };

    let kits = scan(&opts).await;
    println!("discovered {} kit(s)", kits.len());
    for kit in &kits {
        println!("  {}", kit.name());
    }

    if let Err(e) = save_kits(kits_file, &kits) {
        error!(error = %e, "failed to save kits document");
        return 1;
    }
    0
}

fn run_kits(kits_file: &std::path::Path) -> i32 {
    match load_kits_strict(kits_file, &KitsSchema) {
        Ok(kits) => {
            for kit in &kits {
                println!("{}", kit.name());
            }
            0
        }
        Err(e) => {
            error!(error = %e, "failed to load kits document");
            1
        }
    }
}

async fn run_env(host: Host, kits_file: &std::path::Path, name: &str) -> i32 {
    let kits = match load_kits_strict(kits_file, &KitsSchema) {
        Ok(kits) => kits,
        Err(e) => {
            error!(error = %e, "failed to load kits document");
            return 1;
        }
    };

    let kit = match kits.iter().find(|k: &&Kit| k.name() == name) {
        Some(k) => k,
        None => {
            error!(name, "no such kit in the kits document");
            return 1;
        }
    };

    let env = ProcessEnv;
    let host_env: VariableMap = std::env::vars().collect();
    let effective = effective_env(
        host,
        kit,
        &host_env,
        &[],
        &paths::tmp_dir(host, &env),
        None,
        None,
        &HashMap::new(),
    )
    .await;

    for (k, v) in effective.iter() {
        println!("{k}={v}");
    }
    0
}
