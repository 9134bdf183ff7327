//! Ingest session state.
//!
//! An [`IngestSession`] is the server-side record of one active ingest:
//! one workload container whose environment, mounts, and pod address a
//! client currently holds. Sessions are immutable after construction apart
//! from handler bookkeeping and the cancel token; all lifecycle changes go
//! through the registry mapping.

use crate::agent::AgentSnapshot;
use crate::error::{Error, Result};
use crate::podaccess::PodAccessDescriptor;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Environment key the server injects when a bound-command handler exists,
/// telling the client-side docker runner which container to join.
pub const ENV_HANDLER_CONTAINER_NAME: &str = "TELEPRESENCE_HANDLER_CONTAINER_NAME";

/// Identity of an ingest: one workload container. Equality is exact string
/// match on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IngestKey {
    /// Workload name.
    pub workload: String,
    /// Container name.
    pub container: String,
}

impl fmt::Display for IngestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.workload, self.container)
    }
}

/// Identifies an ingest in a request. The container may be omitted when the
/// workload disambiguates on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestIdentifier {
    /// Workload name.
    pub workload: String,
    /// Container name, empty to let the server resolve it.
    #[serde(default)]
    pub container: String,
}

/// Request to create an ingest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    /// What to ingest.
    pub identifier: IngestIdentifier,
    /// Local directory where remote volumes should be mounted, empty to
    /// skip mounting.
    #[serde(default)]
    pub mount_point: String,
    /// Local port exposed to an external mounter instead of mounting.
    #[serde(default)]
    pub local_mount_port: u16,
    /// Additional port/protocol pairs forwarded to the pod.
    #[serde(default)]
    pub local_ports: Vec<String>,
}

/// Snapshot describing an ingest, returned from every operation.
///
/// Always a fresh value; the environment map is cloned per call and never
/// shared by reference across calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestInfo {
    /// Workload name.
    pub workload: String,
    /// Workload kind (Deployment, ReplicaSet, ...).
    pub workload_kind: String,
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
    /// Local directory where the remote volumes land.
    pub client_mount_point: String,
    /// Environment of the remote container.
    pub environment: HashMap<String, String>,
}

/// Cooperative cancellation token owned by a session.
///
/// Cloned into the pod access descriptor so in-flight transport work can
/// observe teardown. Trips once; never resets.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handler bookkeeping for bound-command ingests.
#[derive(Debug, Clone, Default)]
struct HandlerRecord {
    container: String,
    pid: Option<i32>,
}

/// One active ingest session.
///
/// The resolved agent fields are copied out at construction time; nothing
/// here aliases the resolver's snapshot.
#[derive(Debug)]
pub struct IngestSession {
    key: IngestKey,
    workload_kind: String,
    pod_ip: String,
    sftp_port: u16,
    ftp_port: u16,
    remote_mount_point: String,
    environment: HashMap<String, String>,
    local_mount_point: String,
    local_mount_port: u16,
    local_ports: Vec<String>,
    cancel: CancelToken,
    handler: Mutex<HandlerRecord>,
}

impl IngestSession {
    /// Construct a session from a resolved agent snapshot and the creation
    /// request. Fails `NotFound` when the agent has no such container.
    pub fn new(key: IngestKey, agent: &AgentSnapshot, rq: &IngestRequest) -> Result<Self> {
        let cn = agent.containers.get(&key.container).ok_or_else(|| {
            Error::not_found(format!(
                "workload {} has no container named {}",
                key.workload, key.container
            ))
        })?;
        Ok(Self {
            workload_kind: agent.kind.clone(),
            pod_ip: agent.pod_ip.clone(),
            sftp_port: agent.sftp_port,
            ftp_port: agent.ftp_port,
            remote_mount_point: cn.mount_point.clone(),
            environment: cn.environment.clone(),
            local_mount_point: rq.mount_point.clone(),
            local_mount_port: rq.local_mount_port,
            local_ports: rq.local_ports.clone(),
            cancel: CancelToken::new(),
            handler: Mutex::new(HandlerRecord::default()),
            key,
        })
    }

    /// The session's identity.
    pub fn key(&self) -> &IngestKey {
        &self.key
    }

    /// The requested local mount point, empty when mounting is disabled.
    pub fn local_mount_point(&self) -> &str {
        &self.local_mount_point
    }

    /// The requested local mount port, zero when unused.
    pub fn local_mount_port(&self) -> u16 {
        self.local_mount_port
    }

    /// The session's cancel token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Record the local handler bound to this ingest.
    pub fn set_handler(&self, container: &str, pid: Option<i32>) {
        let mut handler = self.handler.lock();
        handler.container = container.to_string();
        handler.pid = pid;
    }

    /// The recorded handler container name and pid.
    pub fn handler(&self) -> (String, Option<i32>) {
        let handler = self.handler.lock();
        (handler.container.clone(), handler.pid)
    }

    /// Build the descriptor handed to the pod access tracker.
    pub fn pod_access_descriptor(&self) -> PodAccessDescriptor {
        PodAccessDescriptor {
            workload: self.key.workload.clone(),
            container: self.key.container.clone(),
            pod_ip: self.pod_ip.clone(),
            sftp_port: self.sftp_port,
            ftp_port: self.ftp_port,
            mount_point: self.remote_mount_point.clone(),
            client_mount_point: self.local_mount_point.clone(),
            local_mount_port: self.local_mount_port,
            local_ports: self.local_ports.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Build the response snapshot for this session.
    pub fn response(&self) -> IngestInfo {
        let mut environment = self.environment.clone();
        let (handler_container, _) = self.handler();
        if !handler_container.is_empty() {
            environment.insert(ENV_HANDLER_CONTAINER_NAME.to_string(), handler_container);
        }
        IngestInfo {
            workload: self.key.workload.clone(),
            workload_kind: self.workload_kind.clone(),
            container: self.key.container.clone(),
            pod_ip: self.pod_ip.clone(),
            sftp_port: self.sftp_port,
            ftp_port: self.ftp_port,
            mount_point: self.remote_mount_point.clone(),
            client_mount_point: self.local_mount_point.clone(),
            environment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ContainerSnapshot;

    fn snapshot() -> AgentSnapshot {
        AgentSnapshot {
            name: "echo".into(),
            kind: "Deployment".into(),
            pod_ip: "10.0.0.9".into(),
            sftp_port: 2222,
            ftp_port: 0,
            containers: HashMap::from([(
                "web".to_string(),
                ContainerSnapshot {
                    mount_point: "/tel_app_mounts/web".into(),
                    environment: HashMap::from([("TEST".to_string(), "DATA".to_string())]),
                },
            )]),
        }
    }

    fn key() -> IngestKey {
        IngestKey {
            workload: "echo".into(),
            container: "web".into(),
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key().to_string(), "echo[web]");
    }

    #[test]
    fn test_new_rejects_unknown_container() {
        let key = IngestKey {
            workload: "echo".into(),
            container: "nope".into(),
        };
        let err = IngestSession::new(key, &snapshot(), &IngestRequest::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert!(err.to_string().contains("no container named nope"));
    }

    #[test]
    fn test_response_is_fresh_snapshot() {
        let rq = IngestRequest {
            mount_point: "/mnt/echo".into(),
            ..Default::default()
        };
        let session = IngestSession::new(key(), &snapshot(), &rq).unwrap();
        let mut first = session.response();
        first.environment.insert("MUTATED".into(), "yes".into());
        let second = session.response();
        assert!(!second.environment.contains_key("MUTATED"));
        assert_eq!(second.client_mount_point, "/mnt/echo");
        assert_eq!(second.mount_point, "/tel_app_mounts/web");
    }

    #[test]
    fn test_handler_container_injected_into_environment() {
        let session = IngestSession::new(key(), &snapshot(), &IngestRequest::default()).unwrap();
        assert!(!session
            .response()
            .environment
            .contains_key(ENV_HANDLER_CONTAINER_NAME));

        session.set_handler("ingest-echo-web", Some(1234));
        let info = session.response();
        assert_eq!(
            info.environment[ENV_HANDLER_CONTAINER_NAME],
            "ingest-echo-web"
        );
        assert_eq!(session.handler(), ("ingest-echo-web".to_string(), Some(1234)));
    }

    #[test]
    fn test_cancel_token_trips_once() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
