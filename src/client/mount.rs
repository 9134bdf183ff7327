//! Local mount flag handling and the mount descriptor handed to container
//! runners.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::manager::session::IngestInfo;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Colon-separated list of remote sub-mounts, POSIX path syntax regardless
/// of host.
pub const ENV_MOUNTS: &str = "TELEPRESENCE_MOUNTS";

/// Mount flags picked up from the command line.
///
/// `--mount` accepts `true` (pick a random mount point), `false` (disable
/// mounting), or an explicit path.
#[derive(Debug, Clone)]
pub struct MountFlags {
    /// `--mount` value; empty once validated when the path is unspecified.
    pub mount: String,
    /// `--local-mount-port`: expose this port to an external mounter
    /// instead of mounting.
    pub local_mount_port: u16,
    /// Whether mounting is enabled; settled by [`MountFlags::validate`].
    pub enabled: bool,
}

impl Default for MountFlags {
    fn default() -> Self {
        Self {
            mount: "true".to_string(),
            local_mount_port: 0,
            enabled: false,
        }
    }
}

impl MountFlags {
    /// Settle the enabled/path state from the raw flag values.
    ///
    /// `flag_set` tells whether `--mount` was given explicitly; the
    /// default is mounting enabled with an unspecified path.
    pub fn validate(&mut self, config: &ClientConfig, flag_set: bool) -> Result<()> {
        if self.local_mount_port > 0 && config.mounts.use_ftp {
            return Err(Error::user(
                "only SFTP can be used with --local-mount-port. Client is configured to perform remote mounts using FTP",
            ));
        }
        if !flag_set {
            self.mount = String::new();
            self.enabled = true;
        } else if !self.mount.is_empty() {
            match self.mount.parse::<bool>() {
                // Not a boolean, must be a path.
                Err(_) => self.enabled = true,
                Ok(do_mount) => {
                    self.enabled = do_mount;
                    self.mount = String::new();
                }
            }
        }
        Ok(())
    }

    /// Materialize the mount point: an unspecified path becomes a fresh
    /// temporary directory, a relative one is resolved against `cwd`, and
    /// the directory is created.
    pub fn prepare(&mut self, cwd: &Path) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.mount.is_empty() {
            let dir = tempfile::Builder::new()
                .prefix("telfs-")
                .tempdir()
                .map_err(|e| Error::mount_prepare(e.to_string()))?;
            self.mount = dir.into_path().to_string_lossy().into_owned();
            return Ok(());
        }
        let mut path = PathBuf::from(&self.mount);
        if path.is_relative() {
            path = cwd.join(path);
        }
        std::fs::create_dir_all(&path).map_err(|e| {
            Error::mount_prepare(format!("cannot create {}: {e}", path.display()))
        })?;
        self.mount = path.to_string_lossy().into_owned();
        Ok(())
    }
}

/// Everything a container runner needs to reproduce the remote mounts
/// locally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MountDescriptor {
    /// Local directory where the remote volumes land.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub local_dir: String,
    /// Remote mount point inside the agent.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_dir: String,
    /// Mount failure carried instead of a usable mount.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// IP of the pod running the agent.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pod_ip: String,
    /// Agent port serving the mount, FTP or SFTP depending on client
    /// configuration.
    #[serde(skip_serializing_if = "port_is_zero")]
    pub port: u16,
    /// Remote sub-mounts below the mount point.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<String>,
}

fn port_is_zero(port: &u16) -> bool {
    *port == 0
}

/// Build the mount descriptor for an ingest, or `None` when the ingest
/// mounts nothing.
pub fn describe(info: &IngestInfo, use_ftp: bool, mount_error: Option<&str>) -> Option<MountDescriptor> {
    if let Some(err) = mount_error {
        return Some(MountDescriptor {
            error: err.to_string(),
            ..Default::default()
        });
    }
    if info.mount_point.is_empty() {
        return None;
    }
    let port = if use_ftp { info.ftp_port } else { info.sftp_port };
    let mounts = match info.environment.get(ENV_MOUNTS) {
        // POSIX paths; never the host's path list separator.
        Some(tp) if !tp.is_empty() => tp.split(':').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Some(MountDescriptor {
        local_dir: info.client_mount_point.clone(),
        remote_dir: info.mount_point.clone(),
        error: String::new(),
        pod_ip: info.pod_ip.clone(),
        port,
        mounts,
    })
}
