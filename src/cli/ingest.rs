//! `teleingest ingest` command.

use clap::Args;
use std::path::PathBuf;
use teleingest::client::env::{EnvFlags, Syntax};
use teleingest::client::info::IngestDescription;
use teleingest::client::mount::MountFlags;
use teleingest::client::state::{DefaultRequestBuilder, IngestCommand, IngestState};
use teleingest::config::ClientConfig;
use teleingest::{process, Result};

/// Ingest a container's environment and mounts without rerouting traffic.
#[derive(Args, Debug)]
pub struct IngestCmd {
    /// Name of the workload to ingest
    pub workload: String,

    /// Name of the container. Required when the workload has more than one
    #[arg(long, short = 'c', default_value = "")]
    pub container: String,

    /// The absolute path for the root directory where volumes will be
    /// mounted, $TELEPRESENCE_ROOT. Use "true" to pick a random mount point
    /// (default). Use "false" to disable filesystem mounting entirely
    #[arg(long)]
    pub mount: Option<String>,

    /// Do not mount remote directories. Instead, expose this port on
    /// localhost to an external mounter
    #[arg(long, default_value_t = 0)]
    pub local_mount_port: u16,

    /// Also emit the remote environment to a file. The syntax used in the
    /// file can be set with --env-syntax
    #[arg(long, short = 'e')]
    pub env_file: Option<PathBuf>,

    /// Syntax used for the env file. One of dotenv, shell, json
    #[arg(long, default_value = "dotenv")]
    pub env_syntax: String,

    /// Also emit the remote environment to a file as a JSON blob
    #[arg(long, short = 'j')]
    pub env_json: Option<PathBuf>,

    /// Additional port[/protocol] pairs forwarded to the pod
    #[arg(long = "to-pod")]
    pub to_pod: Vec<String>,

    /// Run the bound command in a container instead of a local process
    #[arg(long)]
    pub docker_run: bool,

    /// Message printed once the containerized handler is up
    #[arg(long, default_value = "")]
    pub wait_message: String,

    /// Command to run bound to the ingest; the ingest is left again when
    /// it exits
    #[arg(last = true)]
    pub cmdline: Vec<String>,
}

impl IngestCmd {
    pub fn run(self) -> Result<()> {
        let config = ClientConfig::load()?;
        let syntax: Syntax = self.env_syntax.parse()?;

        let mut mount_flags = MountFlags {
            mount: self.mount.clone().unwrap_or_else(|| "true".to_string()),
            local_mount_port: self.local_mount_port,
            enabled: false,
        };
        mount_flags.validate(&config, self.mount.is_some())?;
        mount_flags.prepare(&std::env::current_dir()?)?;

        // An interrupt during the bound command must still leave the
        // ingest.
        process::install_interrupt_handler();

        let manager = super::build_manager(&config)?;
        let cmd = IngestCommand {
            workload: self.workload,
            container: self.container,
            mount_flags,
            env_flags: EnvFlags {
                file: self.env_file,
                syntax,
                json_file: self.env_json,
            },
            to_pod: self.to_pod,
            cmdline: self.cmdline,
            docker_run: self.docker_run,
            wait_message: self.wait_message,
        };

        let use_ftp = config.mounts.use_ftp;
        let mut state = IngestState::new(cmd, manager, Box::new(DefaultRequestBuilder), use_ftp);
        let persistent = !state.run_and_leave();
        state.run()?;

        if persistent {
            if let Some(info) = state.info() {
                print!("{}", IngestDescription::new(info, use_ftp, None));
            }
        }
        Ok(())
    }
}
