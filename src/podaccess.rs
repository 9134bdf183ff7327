//! Pod access tracking.
//!
//! *Pod access* is the SFTP/FTP mount and port-forward tunnel established
//! for one ingested container. The transport itself is an external
//! collaborator; the session manager only hands it a descriptor on creation
//! and a cancellation per container on teardown.

use crate::manager::session::CancelToken;
use crate::error::Result;

/// Everything the transport needs to establish mounts and port-forwards
/// for one ingested container.
#[derive(Debug, Clone)]
pub struct PodAccessDescriptor {
    /// Workload name.
    pub workload: String,
    /// Container name.
    pub container: String,
    /// IP of the pod running the agent.
    pub pod_ip: String,
    /// SFTP port on the agent, zero when unavailable.
    pub sftp_port: u16,
    /// FTP port on the agent, zero when unavailable.
    pub ftp_port: u16,
    /// Remote mount point inside the agent.
    pub mount_point: String,
    /// Local directory where the remote volumes land, empty when mounting
    /// is disabled.
    pub client_mount_point: String,
    /// Local port exposed to an external mounter instead of mounting.
    pub local_mount_port: u16,
    /// Additional port/protocol pairs forwarded to the pod.
    pub local_ports: Vec<String>,
    /// Token tripped when the owning session is cancelled. In-flight
    /// transport work must stop when this trips.
    pub cancel: CancelToken,
}

/// Tracks pod access per container: establishes the transport on session
/// creation and releases it on cancellation.
pub trait PodAccessTracker: Send + Sync {
    /// Establish mounts and port-forwards for a newly created ingest.
    ///
    /// Called exactly once per created session, by the creating caller.
    fn initial_start(&self, desc: PodAccessDescriptor) -> Result<()>;

    /// Release all resources held for the given container.
    ///
    /// Idempotent; called from session teardown, possibly more than once
    /// when a leave races with a disconnect.
    fn cancel_container(&self, workload: &str, container: &str);
}

/// A tracker that only records what it is asked to do.
///
/// Used by the serve daemon when no transport is wired in: it logs the
/// request and creates the client mount point directory so the local
/// environment still gets a usable `TELEPRESENCE_ROOT`.
#[derive(Debug, Default)]
pub struct LogOnlyTracker;

impl PodAccessTracker for LogOnlyTracker {
    fn initial_start(&self, desc: PodAccessDescriptor) -> Result<()> {
        tracing::info!(
            workload = %desc.workload,
            container = %desc.container,
            pod_ip = %desc.pod_ip,
            mount_point = %desc.mount_point,
            client_mount_point = %desc.client_mount_point,
            "pod access requested (no transport configured)"
        );
        if !desc.client_mount_point.is_empty() {
            std::fs::create_dir_all(&desc.client_mount_point)?;
        }
        Ok(())
    }

    fn cancel_container(&self, workload: &str, container: &str) {
        tracing::info!(workload, container, "pod access released");
    }
}
