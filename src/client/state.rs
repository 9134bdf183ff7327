//! Client-side session driving.
//!
//! One CLI invocation becomes a create → (run local process or container)
//! → leave sequence. The leave step is guaranteed for bound commands: once
//! the ingest is acquired it runs whether the command succeeds, fails, or
//! is interrupted.

use crate::client::env::{EnvFlags, ENV_CONTAINER, ENV_ROOT};
use crate::client::handler::{handler_container_name, ContainerRunner};
use crate::client::mount::{self, MountFlags};
use crate::error::{Error, Result};
use crate::manager::session::{IngestIdentifier, IngestInfo, IngestRequest};
use crate::manager::IngestService;
use crate::process;
use std::process::Command;
use std::sync::Arc;

/// Validated inputs of one `ingest` invocation.
#[derive(Debug, Clone, Default)]
pub struct IngestCommand {
    /// Workload to ingest.
    pub workload: String,
    /// Container to ingest, empty to let the server resolve it.
    pub container: String,
    /// Mount flags, already validated.
    pub mount_flags: MountFlags,
    /// Env emission targets.
    pub env_flags: EnvFlags,
    /// `--to-pod`: additional `port[/protocol]` pairs forwarded to the pod.
    pub to_pod: Vec<String>,
    /// Command to run bound to the ingest; empty for a persistent ingest.
    pub cmdline: Vec<String>,
    /// `--docker-run`: run the bound command in a container.
    pub docker_run: bool,
    /// `--wait-message`: printed by the container runner once the handler
    /// is up.
    pub wait_message: String,
}

/// Builds the creation request from the command inputs.
///
/// A strategy passed at construction so extensions can reshape the request
/// without subclass-style mutation of the running state.
pub trait RequestBuilder: Send + Sync {
    /// Build the request sent to the session manager.
    fn create_request(&self, cmd: &IngestCommand) -> Result<IngestRequest>;
}

/// The stock request builder.
#[derive(Debug, Default)]
pub struct DefaultRequestBuilder;

impl RequestBuilder for DefaultRequestBuilder {
    fn create_request(&self, cmd: &IngestCommand) -> Result<IngestRequest> {
        let mut local_ports = Vec::with_capacity(cmd.to_pod.len());
        for to_pod in &cmd.to_pod {
            local_ports.push(port_and_proto(to_pod)?);
        }
        Ok(IngestRequest {
            identifier: IngestIdentifier {
                workload: cmd.workload.clone(),
                container: cmd.container.clone(),
            },
            mount_point: if cmd.mount_flags.enabled {
                cmd.mount_flags.mount.clone()
            } else {
                String::new()
            },
            local_mount_port: cmd.mount_flags.local_mount_port,
            local_ports,
        })
    }
}

/// Normalize a `port[/protocol]` pair; the protocol defaults to TCP.
fn port_and_proto(s: &str) -> Result<String> {
    let (port, proto) = match s.split_once('/') {
        Some((port, proto)) => (port, proto),
        None => (s, "TCP"),
    };
    let port: u16 = port
        .parse()
        .map_err(|_| Error::user(format!("invalid port number in {s}")))?;
    if port == 0 {
        return Err(Error::user(format!("invalid port number in {s}")));
    }
    match proto.to_ascii_uppercase().as_str() {
        p @ ("TCP" | "UDP") => Ok(format!("{port}/{p}")),
        _ => Err(Error::user(format!(
            "invalid protocol in {s}: must be TCP or UDP"
        ))),
    }
}

/// Driver of one ingest invocation.
pub struct IngestState {
    cmd: IngestCommand,
    service: Arc<dyn IngestService>,
    builder: Box<dyn RequestBuilder>,
    runner: Option<Arc<dyn ContainerRunner>>,
    use_ftp: bool,
    mount_error: Option<String>,
    info: Option<IngestInfo>,
}

impl IngestState {
    /// Create a driver for the given command.
    pub fn new(
        cmd: IngestCommand,
        service: Arc<dyn IngestService>,
        builder: Box<dyn RequestBuilder>,
        use_ftp: bool,
    ) -> Self {
        Self {
            cmd,
            service,
            builder,
            runner: None,
            use_ftp,
            mount_error: None,
            info: None,
        }
    }

    /// Attach a container runner for `--docker-run` invocations.
    pub fn with_runner(mut self, runner: Arc<dyn ContainerRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Record a mount preparation failure that was downgraded to a warning;
    /// carried into the mount descriptor handed to container runners.
    pub fn set_mount_error(&mut self, error: String) {
        self.mount_error = Some(error);
    }

    /// True when a command is bound to the ingest, so the ingest is left
    /// again when the command exits.
    pub fn run_and_leave(&self) -> bool {
        !self.cmd.cmdline.is_empty() || self.cmd.docker_run
    }

    /// The created ingest's snapshot, once created.
    pub fn info(&self) -> Option<&IngestInfo> {
        self.info.as_ref()
    }

    /// Drive the invocation to completion.
    pub fn run(&mut self) -> Result<()> {
        if !self.run_and_leave() {
            return self.create();
        }

        if self.cmd.docker_run {
            let runner = self.runner()?;
            let name = handler_container_name(&self.cmd.workload, &self.cmd.container);
            self.cmd.cmdline = runner.pull_or_build_image(&name)?;
        }

        let created = self.create();
        if self.info.is_none() {
            // Nothing acquired, nothing to leave.
            return created;
        }
        let result = match created {
            Ok(()) => self.run_command(),
            Err(e) => Err(e),
        };
        let left = self.leave();
        result.and(left)
    }

    fn runner(&self) -> Result<Arc<dyn ContainerRunner>> {
        self.runner
            .clone()
            .ok_or_else(|| Error::user("--docker-run requires a container runtime"))
    }

    /// Create the ingest and capture its snapshot.
    ///
    /// On failure with a requested mount point, the now-orphaned directory
    /// is removed best-effort; removal only succeeds while it is empty,
    /// which is exactly the orphan case.
    fn create(&mut self) -> Result<()> {
        let rq = self.builder.create_request(&self.cmd)?;
        let mut info = match self.service.ingest(&rq) {
            Ok(info) => info,
            Err(e) => {
                if !rq.mount_point.is_empty() {
                    let _ = std::fs::remove_dir(&rq.mount_point);
                }
                return Err(e);
            }
        };
        println!("Using {}/{}", info.workload, info.container);

        info.environment
            .insert(ENV_ROOT.to_string(), info.client_mount_point.clone());
        // The server may override which container the handler joins.
        self.cmd.container = info
            .environment
            .get(ENV_CONTAINER)
            .cloned()
            .unwrap_or_default();
        let written = self.cmd.env_flags.perhaps_write(&info.environment);
        // Acquired even when the env files could not be written; the
        // caller must still leave.
        self.info = Some(info);
        written
    }

    fn identifier(&self) -> IngestIdentifier {
        IngestIdentifier {
            workload: self.cmd.workload.clone(),
            container: self.cmd.container.clone(),
        }
    }

    /// Run the bound command until it exits or an interrupt arrives.
    fn run_command(&self) -> Result<()> {
        let info = match self.info.as_ref() {
            Some(info) => info,
            None => return Err(Error::user("ingest was not created")),
        };
        let id = self.identifier();

        if !self.cmd.docker_run {
            let (program, args) = match self.cmd.cmdline.split_first() {
                Some(split) => split,
                None => return Err(Error::user("no command to run")),
            };
            let mut child = Command::new(program)
                .args(args)
                .envs(&info.environment)
                .spawn()
                .map_err(|e| Error::HandlerStart(format!("{program}: {e}")))?;
            self.service
                .add_handler(&id, "", Some(child.id() as i32))?;
            return match process::wait_child(&mut child)? {
                // Interrupted; the leave step still runs.
                None => Ok(()),
                Some(0) => Ok(()),
                Some(code) => Err(Error::user(format!(
                    "command {program} exited with code {code}"
                ))),
            };
        }

        let runner = self.runner()?;
        let name = handler_container_name(&self.cmd.workload, &self.cmd.container);
        self.service.add_handler(&id, &name, None)?;
        let mount = mount::describe(info, self.use_ftp, self.mount_error.as_deref());
        runner.run(
            &name,
            &info.environment,
            mount.as_ref(),
            &self.cmd.wait_message,
            &self.cmd.cmdline,
        )
    }

    /// Leave the ingest. A `Canceled` outcome means a disconnect already
    /// tore the session down and is not an error.
    fn leave(&self) -> Result<()> {
        tracing::debug!(
            workload = %self.cmd.workload,
            container = %self.cmd.container,
            "leaving ingest"
        );
        match self.service.leave_ingest(&self.identifier()) {
            Ok(_) => Ok(()),
            Err(e) if e.is_canceled() => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, "leaving ingest failed");
                Err(e)
            }
        }
    }
}
