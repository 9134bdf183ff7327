//! Client-facing description of an ingest.

use crate::client::mount::{self, MountDescriptor};
use crate::manager::session::IngestInfo;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// What the CLI shows for one ingest: the server snapshot reshaped with
/// the mount block a container runner would consume.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestDescription {
    /// Workload name.
    pub workload: String,
    /// Container name.
    pub container: String,
    /// Merged environment of the remote container.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
    /// Mount block, absent when the ingest mounts nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount: Option<MountDescriptor>,
    /// IP of the pod running the agent.
    pub pod_ip: String,
}

impl IngestDescription {
    /// Reshape a server snapshot for presentation.
    pub fn new(info: &IngestInfo, use_ftp: bool, mount_error: Option<&str>) -> Self {
        Self {
            workload: info.workload.clone(),
            container: info.container.clone(),
            environment: info.environment.clone(),
            mount: mount::describe(info, use_ftp, mount_error),
            pod_ip: info.pod_ip.clone(),
        }
    }
}

impl fmt::Display for IngestDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   {:<18}: {}", "Workload", self.workload)?;
        writeln!(f, "   {:<18}: {}", "Container", self.container)?;
        if let Some(m) = &self.mount {
            if !m.local_dir.is_empty() {
                writeln!(f, "   {:<18}: {}", "Volume Mount Point", m.local_dir)?;
            } else if !m.error.is_empty() {
                writeln!(f, "   {:<18}: {}", "Volume Mount Error", m.error)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> IngestInfo {
        IngestInfo {
            workload: "echo".into(),
            container: "web".into(),
            pod_ip: "10.0.0.9".into(),
            sftp_port: 2222,
            mount_point: "/tel_app_mounts/web".into(),
            client_mount_point: "/tmp/telfs-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_shows_mount_point() {
        let d = IngestDescription::new(&info(), false, None);
        let text = d.to_string();
        assert!(text.contains("Workload          : echo"));
        assert!(text.contains("Volume Mount Point: /tmp/telfs-1"));
    }

    #[test]
    fn test_display_shows_mount_error() {
        let d = IngestDescription::new(&info(), false, Some("fuse unavailable"));
        let text = d.to_string();
        assert!(text.contains("Volume Mount Error: fuse unavailable"));
        assert!(!text.contains("Volume Mount Point"));
    }

    #[test]
    fn test_serializes_without_empty_mount() {
        let mut ii = info();
        ii.mount_point = String::new();
        let d = IngestDescription::new(&ii, false, None);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("\"mount\""));
    }
}
