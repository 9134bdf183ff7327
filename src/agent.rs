//! Agent resolution.
//!
//! An *agent* is the sidecar injected into a workload's pods. Resolving it
//! yields a snapshot of everything an ingest needs: the pod IP, the
//! sftp/ftp mount ports, and the set of containers with their remote mount
//! points and environments.
//!
//! The actual traffic-manager RPC is an external collaborator; this module
//! defines the [`AgentResolver`] seam plus a manifest-backed resolver used
//! by the serve daemon and the test suite.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Snapshot of one container as reported by the agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerSnapshot {
    /// Mount point of the container's volumes inside the agent.
    #[serde(default)]
    pub mount_point: String,
    /// Environment of the remote container.
    #[serde(default)]
    pub environment: HashMap<String, String>,
}

/// Snapshot of a resolved agent: the workload it serves and the containers
/// it can expose. Immutable once returned by a resolver.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AgentSnapshot {
    /// Workload name.
    pub name: String,
    /// Workload kind (Deployment, ReplicaSet, ...).
    #[serde(default)]
    pub kind: String,
    /// IP of the pod running the agent.
    #[serde(default)]
    pub pod_ip: String,
    /// SFTP port exposed by the agent, zero when unavailable.
    #[serde(default)]
    pub sftp_port: u16,
    /// FTP port exposed by the agent, zero when unavailable.
    #[serde(default)]
    pub ftp_port: u16,
    /// Containers the agent can expose, by name.
    #[serde(default)]
    pub containers: HashMap<String, ContainerSnapshot>,
}

/// Resolves a workload name to an agent snapshot, injecting the agent first
/// if necessary.
///
/// Implementations must behave as safe-to-repeat, non-mutating reads: the
/// registry's creation path may invoke the resolver more than once per key
/// when callers race.
pub trait AgentResolver: Send + Sync {
    /// Ensure an agent exists for `workload` and return its snapshot.
    fn resolve_agent(&self, workload: &str) -> Result<AgentSnapshot>;
}

/// Manifest file for [`StaticResolver`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterManifest {
    /// Workloads by name.
    #[serde(default)]
    pub workloads: HashMap<String, WorkloadEntry>,
}

/// One workload in the cluster manifest.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct WorkloadEntry {
    /// Workload kind (defaults to Deployment).
    #[serde(default)]
    pub kind: Option<String>,
    /// Pod IP.
    #[serde(default)]
    pub pod_ip: String,
    /// SFTP port.
    #[serde(default)]
    pub sftp_port: u16,
    /// FTP port.
    #[serde(default)]
    pub ftp_port: u16,
    /// Containers by name.
    #[serde(default)]
    pub containers: HashMap<String, ContainerSnapshot>,
}

/// A resolver backed by a static workload manifest.
///
/// Stands in for the traffic-manager RPC in the serve daemon and in tests.
/// Applies the configured environment exclusion list before handing out
/// snapshots, mirroring the manager-side
/// `intercept.environment.excluded` setting.
pub struct StaticResolver {
    manifest: ClusterManifest,
    excluded_env: Vec<String>,
}

impl StaticResolver {
    /// Create a resolver from an already-parsed manifest.
    pub fn new(manifest: ClusterManifest, excluded_env: Vec<String>) -> Self {
        Self {
            manifest,
            excluded_env,
        }
    }

    /// Load the manifest from a TOML file.
    pub fn from_file(path: &Path, excluded_env: Vec<String>) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config("load", format!("failed to read {}: {}", path.display(), e))
        })?;
        let manifest: ClusterManifest = toml::from_str(&contents).map_err(|e| {
            Error::config(
                "parse",
                format!("failed to parse {}: {}", path.display(), e),
            )
        })?;
        Ok(Self::new(manifest, excluded_env))
    }
}

impl AgentResolver for StaticResolver {
    fn resolve_agent(&self, workload: &str) -> Result<AgentSnapshot> {
        let entry = self.manifest.workloads.get(workload).ok_or_else(|| {
            Error::agent_resolve(workload, "workload not present in cluster manifest")
        })?;

        let containers = entry
            .containers
            .iter()
            .map(|(name, cn)| {
                let environment = cn
                    .environment
                    .iter()
                    .filter(|(k, _)| !self.excluded_env.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (
                    name.clone(),
                    ContainerSnapshot {
                        mount_point: cn.mount_point.clone(),
                        environment,
                    },
                )
            })
            .collect();

        Ok(AgentSnapshot {
            name: workload.to_string(),
            kind: entry.kind.clone().unwrap_or_else(|| "Deployment".into()),
            pod_ip: entry.pod_ip.clone(),
            sftp_port: entry.sftp_port,
            ftp_port: entry.ftp_port,
            containers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[workloads.echo-easy]
kind = "Deployment"
pod-ip = "10.1.2.3"
sftp-port = 2222

[workloads.echo-easy.containers.echo]
mount-point = "/tel_app_mounts/echo"

[workloads.echo-easy.containers.echo.environment]
TEST = "DATA"
DATABASE_HOST = "db.default"
DATABASE_PASSWORD = "hunter2"
"#;

    #[test]
    fn test_resolve_known_workload() {
        let manifest: ClusterManifest = toml::from_str(MANIFEST).unwrap();
        let resolver = StaticResolver::new(manifest, Vec::new());
        let ai = resolver.resolve_agent("echo-easy").unwrap();
        assert_eq!(ai.kind, "Deployment");
        assert_eq!(ai.pod_ip, "10.1.2.3");
        assert_eq!(ai.sftp_port, 2222);
        let cn = &ai.containers["echo"];
        assert_eq!(cn.mount_point, "/tel_app_mounts/echo");
        assert_eq!(cn.environment["TEST"], "DATA");
    }

    #[test]
    fn test_resolve_unknown_workload() {
        let resolver = StaticResolver::new(ClusterManifest::default(), Vec::new());
        let err = resolver.resolve_agent("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_excluded_environment_is_filtered() {
        let manifest: ClusterManifest = toml::from_str(MANIFEST).unwrap();
        let resolver = StaticResolver::new(
            manifest,
            vec!["DATABASE_HOST".into(), "DATABASE_PASSWORD".into()],
        );
        let ai = resolver.resolve_agent("echo-easy").unwrap();
        let env = &ai.containers["echo"].environment;
        assert!(!env.contains_key("DATABASE_HOST"));
        assert!(!env.contains_key("DATABASE_PASSWORD"));
        assert_eq!(env["TEST"], "DATA");
    }
}
