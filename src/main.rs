//! Multus thin entrypoint CLI
//!
//! Entry point for the `thin-entrypoint` binary run as the multus daemonset
//! container command.

use clap::Parser;
use multus_thin_entrypoint::fsutil::remove_if_exists;
use multus_thin_entrypoint::shutdown::{self, ShutdownState};
use multus_thin_entrypoint::{run_cycle, CycleState, HostRoot, SynthesisOptions};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "thin-entrypoint")]
#[command(about = "Compose the multus CNI config and kubeconfig", version)]
struct Cli {
    /// Options file (TOML); flags override its values
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory the composed config is written to
    #[arg(long)]
    cni_conf_dir: Option<PathBuf>,

    /// CNI binary directory
    #[arg(long)]
    cni_bin_dir: Option<PathBuf>,

    /// Directory scanned for the master CNI config
    #[arg(long)]
    multus_autoconfig_dir: Option<PathBuf>,

    /// Master CNI config file name (skips the directory scan)
    #[arg(long)]
    multus_master_cni_file_name: Option<String>,

    /// Multus binary path
    #[arg(long)]
    multus_bin_file: Option<PathBuf>,

    /// Legacy multus config path, or "auto"
    #[arg(long)]
    multus_conf_file: Option<String>,

    /// Kubeconfig path as seen from the host
    #[arg(long)]
    multus_kubeconfig_file_host: Option<String>,

    /// Expected CNI version of the master config
    #[arg(long)]
    cni_version: Option<String>,

    /// Overwrite the master config's cniVersion with --cni-version
    #[arg(long)]
    force_cni_version: bool,

    #[arg(long)]
    namespace_isolation: bool,

    #[arg(long)]
    global_namespaces: Option<String>,

    #[arg(long)]
    multus_log_to_stderr: bool,

    #[arg(long)]
    multus_log_level: Option<String>,

    #[arg(long)]
    multus_log_file: Option<String>,

    /// Additional plugin search directory
    #[arg(long)]
    additional_bin_dir: Option<String>,

    /// CNI config directory as seen by multus
    #[arg(long)]
    multus_cni_conf_dir: Option<String>,

    #[arg(long)]
    readiness_indicator_file: Option<String>,

    /// Write insecure-skip-tls-verify instead of the CA data
    #[arg(long)]
    skip_tls_verify: bool,

    /// CA file embedded in the kubeconfig instead of the service account CA
    #[arg(long)]
    kube_ca_file: Option<PathBuf>,

    #[arg(long, env = "KUBERNETES_SERVICE_PROTOCOL")]
    kube_api_protocol: Option<String>,

    #[arg(long, env = "KUBERNETES_SERVICE_HOST")]
    kube_api_host: Option<String>,

    #[arg(long, env = "KUBERNETES_SERVICE_PORT")]
    kube_api_port: Option<String>,

    /// Root the credential paths are resolved under
    #[arg(long)]
    root: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Seconds between cycles
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Remove the composed config on shutdown
    #[arg(long)]
    cleanup_config_on_exit: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer the flags over options loaded from file or defaults.
    fn apply(&self, options: &mut SynthesisOptions) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut options.cni_conf_dir, &self.cni_conf_dir);
        set(&mut options.cni_bin_dir, &self.cni_bin_dir);
        set(&mut options.multus_autoconfig_dir, &self.multus_autoconfig_dir);
        set_opt(
            &mut options.multus_master_cni_file_name,
            &self.multus_master_cni_file_name,
        );
        set(&mut options.multus_bin_file, &self.multus_bin_file);
        set(&mut options.multus_conf_file, &self.multus_conf_file);
        set(
            &mut options.multus_kubeconfig_file_host,
            &self.multus_kubeconfig_file_host,
        );
        set_opt(&mut options.cni_version, &self.cni_version);
        set_opt(&mut options.global_namespaces, &self.global_namespaces);
        set_opt(&mut options.multus_log_level, &self.multus_log_level);
        set_opt(&mut options.multus_log_file, &self.multus_log_file);
        set_opt(&mut options.additional_bin_dir, &self.additional_bin_dir);
        set_opt(&mut options.multus_cni_conf_dir, &self.multus_cni_conf_dir);
        set_opt(
            &mut options.readiness_indicator_file,
            &self.readiness_indicator_file,
        );
        set_opt(&mut options.kube_ca_file, &self.kube_ca_file);
        set(&mut options.api_endpoint.protocol, &self.kube_api_protocol);
        set(&mut options.api_endpoint.host, &self.kube_api_host);
        set(&mut options.api_endpoint.port, &self.kube_api_port);

        if let Some(root) = &self.root {
            options.credentials.root = HostRoot::new(root);
        }

        options.force_cni_version |= self.force_cni_version;
        options.namespace_isolation |= self.namespace_isolation;
        options.multus_log_to_stderr |= self.multus_log_to_stderr;
        options.skip_tls_verify |= self.skip_tls_verify;
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            error!("Error loading options: {}", e);
            process::exit(1);
        }
    };
    debug!("options: {:?}", options);

    let shutdown_state = Arc::new(ShutdownState::new());
    if !cli.once {
        if let Err(e) = shutdown::install(Arc::clone(&shutdown_state)) {
            error!("Failed to install signal handler: {}", e);
            process::exit(1);
        }
    }

    let interval = Duration::from_secs(cli.interval_secs);
    let mut state = CycleState::default();

    let code = loop {
        match run_cycle(&options, &mut state) {
            Ok(report) => {
                if report.config_written || report.kubeconfig_written {
                    info!(
                        fingerprint = %report.fingerprint,
                        "cycle complete: {:?}",
                        report.config_path
                    );
                }
                if cli.once {
                    break 0;
                }
            }
            Err(e) => {
                if cli.once {
                    error!(kind = %e.kind(), "{}", e);
                    break 1;
                }
                warn!(kind = %e.kind(), "{}", e);
            }
        }

        if shutdown_state.wait(interval) {
            info!("shutting down");
            break 0;
        }
    };

    if cli.cleanup_config_on_exit {
        cleanup(&state);
    }

    process::exit(code);
}

fn load_options(cli: &Cli) -> Result<SynthesisOptions, String> {
    let mut options = match &cli.config {
        Some(path) => SynthesisOptions::from_file(path).map_err(|e| e.to_string())?,
        None => SynthesisOptions::default(),
    };
    cli.apply(&mut options);
    Ok(options)
}

fn cleanup(state: &CycleState) {
    let Some(path) = &state.composed_path else {
        return;
    };
    match remove_if_exists(path) {
        Ok(()) => info!("removed {:?}", path),
        Err(e) => warn!("Failed to remove {:?}: {}", path, e),
    }
}
