//! Mount point and mount port conflict arbitration.
//!
//! Ingests and intercepts share one conflict space: a local mount point or
//! mount port claimed by either may not be claimed again. The intercept
//! side is owned by an independent subsystem; we only read its claims under
//! its own lock. The ingest side is read from the registry view inside the
//! atomic creation step, so no second ingest can slip in between check and
//! commit.

use super::registry::CreateView;
use crate::error::{Error, Result};
use parking_lot::Mutex;

/// Mount claims held by one live intercept.
#[derive(Debug, Clone, Default)]
pub struct InterceptClaim {
    /// Intercept name, reported to the user on collision.
    pub name: String,
    /// Local mount point claimed by the intercept, empty when none.
    pub client_mount_point: String,
    /// Local mount port claimed by the intercept, zero when none.
    pub local_mount_port: u16,
}

/// The intercept subsystem's live claims, read under its own lock.
///
/// The lock is held for the duration of a scan only; never across resolver
/// calls or the registry commit.
#[derive(Debug, Default)]
pub struct InterceptRoster {
    claims: Mutex<Vec<InterceptClaim>>,
}

impl InterceptRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live intercept's claims.
    pub fn add(&self, claim: InterceptClaim) {
        self.claims.lock().push(claim);
    }

    /// Drop the claims of a named intercept.
    pub fn remove(&self, name: &str) {
        self.claims.lock().retain(|c| c.name != name);
    }

    /// Scan the claims under the roster lock.
    fn scan<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&InterceptClaim) -> Result<()>,
    {
        let claims = self.claims.lock();
        for claim in claims.iter() {
            visit(claim)?;
        }
        Ok(())
    }
}

/// Validate a proposed mount point/port against all live intercepts and
/// ingests.
///
/// Intercepts are scanned first, then ingests; the first collision wins
/// and names its owner. Empty mount point and zero port never conflict.
/// Must run to completion before the new claim is committed; the caller
/// runs it inside the registry's creation step.
pub fn check_conflict(
    mount_point: &str,
    mount_port: u16,
    intercepts: &InterceptRoster,
    ingests: &CreateView<'_>,
) -> Result<()> {
    if mount_point.is_empty() && mount_port == 0 {
        return Ok(());
    }

    intercepts.scan(|ic| {
        if !mount_point.is_empty() && ic.client_mount_point == mount_point {
            return Err(Error::already_exists(format!(
                "mount point {} already in use by intercept {}",
                mount_point, ic.name
            )));
        }
        if mount_port != 0 && ic.local_mount_port == mount_port {
            return Err(Error::already_exists(format!(
                "mount port {} already in use by intercept {}",
                mount_port, ic.name
            )));
        }
        Ok(())
    })?;

    for (key, session) in ingests.iter() {
        if !mount_point.is_empty() && session.local_mount_point() == mount_point {
            return Err(Error::already_exists(format!(
                "mount point {} already in use by ingest {}",
                mount_point, key
            )));
        }
        if mount_port != 0 && session.local_mount_port() == mount_port {
            return Err(Error::already_exists(format!(
                "mount port {} already in use by ingest {}",
                mount_port, key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentSnapshot, ContainerSnapshot};
    use crate::error::ErrorKind;
    use crate::manager::registry::IngestRegistry;
    use crate::manager::session::{IngestKey, IngestRequest, IngestSession};
    use std::collections::HashMap;

    fn roster_with(name: &str, mount_point: &str, port: u16) -> InterceptRoster {
        let roster = InterceptRoster::new();
        roster.add(InterceptClaim {
            name: name.into(),
            client_mount_point: mount_point.into(),
            local_mount_port: port,
        });
        roster
    }

    /// Run `check_conflict` against a registry holding one ingest with the
    /// given claims.
    fn check_against_ingest(
        ingest_mount: &str,
        ingest_port: u16,
        mount_point: &str,
        mount_port: u16,
        roster: &InterceptRoster,
    ) -> Result<()> {
        let registry = IngestRegistry::new();
        let key = IngestKey {
            workload: "echo".into(),
            container: "web".into(),
        };
        let agent = AgentSnapshot {
            name: "echo".into(),
            containers: HashMap::from([("web".to_string(), ContainerSnapshot::default())]),
            ..Default::default()
        };
        let rq = IngestRequest {
            mount_point: ingest_mount.into(),
            local_mount_port: ingest_port,
            ..Default::default()
        };
        registry
            .compute_or_load(key, |_| IngestSession::new(
                IngestKey {
                    workload: "echo".into(),
                    container: "web".into(),
                },
                &agent,
                &rq,
            ))
            .unwrap();

        let probe_key = IngestKey {
            workload: "other".into(),
            container: "main".into(),
        };
        registry
            .compute_or_load(probe_key, |view| {
                check_conflict(mount_point, mount_port, roster, view)?;
                Err(Error::user("probe only"))
            })
            .map(|_| ())
    }

    #[test]
    fn test_empty_values_never_conflict() {
        let roster = roster_with("api", "/mnt/a", 8022);
        let registry = IngestRegistry::new();
        registry
            .compute_or_load(
                IngestKey {
                    workload: "w".into(),
                    container: "c".into(),
                },
                |view| {
                    check_conflict("", 0, &roster, view).unwrap();
                    Err(Error::user("probe only"))
                },
            )
            .unwrap_err();
    }

    #[test]
    fn test_intercept_mount_point_collision() {
        let roster = roster_with("api", "/mnt/a", 0);
        let err = check_against_ingest("", 0, "/mnt/a", 0, &roster).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("intercept api"));
    }

    #[test]
    fn test_intercept_mount_port_collision() {
        let roster = roster_with("api", "", 8022);
        let err = check_against_ingest("", 0, "", 8022, &roster).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("mount port 8022"));
    }

    #[test]
    fn test_ingest_mount_point_collision() {
        let roster = InterceptRoster::new();
        let err = check_against_ingest("/mnt/echo", 0, "/mnt/echo", 0, &roster).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("ingest echo[web]"));
    }

    #[test]
    fn test_intercepts_scanned_before_ingests() {
        // Both an intercept and an ingest claim /mnt/a; the intercept is
        // named in the error.
        let roster = roster_with("api", "/mnt/a", 0);
        let err = check_against_ingest("/mnt/a", 0, "/mnt/a", 0, &roster).unwrap_err();
        assert!(err.to_string().contains("intercept api"));
    }

    #[test]
    fn test_disjoint_claims_pass() {
        let roster = roster_with("api", "/mnt/a", 8022);
        let err = check_against_ingest("/mnt/b", 9023, "/mnt/c", 9024, &roster).unwrap_err();
        // The probe factory error, not a conflict.
        assert_eq!(err.kind(), ErrorKind::User);
    }
}
