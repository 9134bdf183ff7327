//! Server-side ingest session management.
//!
//! The [`IngestSessionManager`] is the per-user-session component behind
//! the three RPC-shaped operations: it resolves agents, arbitrates mount
//! conflicts, keeps the registry of active sessions, and drives teardown
//! through the pod access tracker.

pub mod conflict;
pub mod registry;
pub mod session;

use crate::agent::{AgentResolver, AgentSnapshot};
use crate::error::{Error, Result};
use crate::podaccess::PodAccessTracker;
use crate::process;
use conflict::{check_conflict, InterceptRoster};
use registry::IngestRegistry;
use session::{IngestIdentifier, IngestInfo, IngestKey, IngestRequest, IngestSession};
use std::sync::Arc;

/// Stops the local handler bound to an ingest when the ingest is left.
///
/// The handler may be a plain process (stopped by pid) or a container
/// (stopped by the client's container runtime); the container side is an
/// external collaborator.
pub trait HandlerStopper: Send + Sync {
    /// Stop the handler known under `name` (`workload/container`).
    fn stop_handler(&self, name: &str, container: &str, pid: Option<i32>);
}

/// Default stopper: terminates a recorded pid, logs container handlers for
/// the client-side runtime to reap.
#[derive(Debug, Default)]
pub struct ProcessHandlerStopper;

impl HandlerStopper for ProcessHandlerStopper {
    fn stop_handler(&self, name: &str, container: &str, pid: Option<i32>) {
        if let Some(pid) = pid {
            if process::is_alive(pid) {
                tracing::debug!(handler = name, pid, "stopping handler process");
                process::stop_process(pid, process::DEFAULT_STOP_TIMEOUT, true);
            }
        }
        if !container.is_empty() {
            tracing::debug!(handler = name, container, "handler container left to client runtime");
        }
    }
}

/// The RPC-shaped surface of the session manager.
///
/// Implemented by [`IngestSessionManager`] for in-process use; a remote
/// client stub would implement the same trait.
pub trait IngestService: Send + Sync {
    /// Create an ingest, or return the existing one for the same key.
    fn ingest(&self, rq: &IngestRequest) -> Result<IngestInfo>;
    /// Look up an ingest.
    fn get_ingest(&self, id: &IngestIdentifier) -> Result<IngestInfo>;
    /// Tear an ingest down and return its last known snapshot.
    fn leave_ingest(&self, id: &IngestIdentifier) -> Result<IngestInfo>;
    /// Record the local handler bound to an ingest.
    fn add_handler(&self, id: &IngestIdentifier, container: &str, pid: Option<i32>)
        -> Result<()>;
}

/// Per-user-session manager of active ingests.
pub struct IngestSessionManager {
    resolver: Arc<dyn AgentResolver>,
    tracker: Arc<dyn PodAccessTracker>,
    stopper: Arc<dyn HandlerStopper>,
    intercepts: Arc<InterceptRoster>,
    registry: IngestRegistry,
}

impl IngestSessionManager {
    /// Create a manager with the default process handler stopper.
    pub fn new(
        resolver: Arc<dyn AgentResolver>,
        tracker: Arc<dyn PodAccessTracker>,
        intercepts: Arc<InterceptRoster>,
    ) -> Self {
        Self::with_stopper(resolver, tracker, intercepts, Arc::new(ProcessHandlerStopper))
    }

    /// Create a manager with an explicit handler stopper.
    pub fn with_stopper(
        resolver: Arc<dyn AgentResolver>,
        tracker: Arc<dyn PodAccessTracker>,
        intercepts: Arc<InterceptRoster>,
        stopper: Arc<dyn HandlerStopper>,
    ) -> Self {
        Self {
            resolver,
            tracker,
            stopper,
            intercepts,
            registry: IngestRegistry::new(),
        }
    }

    /// The intercept roster this manager arbitrates against.
    pub fn intercepts(&self) -> &InterceptRoster {
        &self.intercepts
    }

    /// Number of active ingests.
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Snapshots of every active ingest.
    pub fn list(&self) -> Vec<IngestInfo> {
        let mut infos = Vec::new();
        self.registry.range(|_, session| {
            infos.push(session.response());
            true
        });
        infos
    }

    /// Pick the container name when the request left it unspecified.
    fn single_container_name(&self, ai: &AgentSnapshot) -> Result<String> {
        let mut names = ai.containers.keys();
        match (names.next(), names.next()) {
            (None, _) => Err(Error::unavailable(format!(
                "workload {} has no containers available for ingest",
                ai.name
            ))),
            (Some(name), None) => Ok(name.clone()),
            (Some(_), Some(_)) => Err(Error::not_found(format!(
                "workload {} has multiple containers. Please specify which one to use",
                ai.name
            ))),
        }
    }

    /// Create an ingest, or return the existing session for the same key.
    ///
    /// Creation is atomic: agent verification, the conflict check, and the
    /// insert commit in one registry step, so a failure never leaves a
    /// partial session registered. When callers race on the same key,
    /// exactly one creation commits and only that caller starts pod
    /// access; the rest get the committed session's snapshot.
    pub fn ingest(&self, rq: &IngestRequest) -> Result<IngestInfo> {
        let workload = &rq.identifier.workload;
        let mut agent: Option<AgentSnapshot> = None;
        let container = if rq.identifier.container.is_empty() {
            let ai = self.resolver.resolve_agent(workload)?;
            let name = self.single_container_name(&ai)?;
            agent = Some(ai);
            name
        } else {
            rq.identifier.container.clone()
        };

        let key = IngestKey {
            workload: workload.clone(),
            container,
        };
        let (session, loaded) = self.registry.compute_or_load(key.clone(), |view| {
            // The resolver may already have been consulted for container
            // resolution; it is a safe-to-repeat read either way.
            let ai = match agent.take() {
                Some(ai) => ai,
                None => self.resolver.resolve_agent(&key.workload)?,
            };
            if !ai.containers.contains_key(&key.container) {
                return Err(Error::not_found(format!(
                    "workload {} has no container named {}",
                    key.workload, key.container
                )));
            }
            check_conflict(&rq.mount_point, rq.local_mount_port, &self.intercepts, view)?;
            IngestSession::new(key.clone(), &ai, rq)
        })?;

        if !loaded {
            tracing::debug!(ingest = %key, "created ingest");
            // Failure to establish pod access does not undo the session;
            // the transport reports its own state and the user can leave.
            if let Err(e) = self.tracker.initial_start(session.pod_access_descriptor()) {
                tracing::error!(ingest = %key, error = %e, "pod access start failed");
            }
        }
        Ok(session.response())
    }

    /// Resolve an identifier to a live session.
    ///
    /// When the container is omitted, succeeds only if the workload has
    /// exactly one ingest.
    fn resolve_session(&self, id: &IngestIdentifier) -> Result<Arc<IngestSession>> {
        let mut container = id.container.clone();
        if container.is_empty() {
            let mut ambiguous = false;
            self.registry.range(|key, _| {
                if key.workload == id.workload {
                    if !container.is_empty() {
                        ambiguous = true;
                        return false;
                    }
                    container = key.container.clone();
                }
                true
            });
            if ambiguous {
                return Err(Error::not_found(format!(
                    "workload {} has multiple ingests. Please specify which one to use",
                    id.workload
                )));
            }
            if container.is_empty() {
                return Err(Error::not_found(format!(
                    "no ingest found for workload {}",
                    id.workload
                )));
            }
        }
        let key = IngestKey {
            workload: id.workload.clone(),
            container,
        };
        self.registry
            .get(&key)
            .ok_or_else(|| Error::not_found(format!("ingest {} doesn't exist", key)))
    }

    /// Look up an ingest by identifier.
    pub fn get_ingest(&self, id: &IngestIdentifier) -> Result<IngestInfo> {
        Ok(self.resolve_session(id)?.response())
    }

    /// Tear an ingest down: stop its handler, cancel the session, release
    /// pod access. Returns the last known snapshot. A second leave for the
    /// same key fails `NotFound`.
    pub fn leave_ingest(&self, id: &IngestIdentifier) -> Result<IngestInfo> {
        let session = self.resolve_session(id)?;
        let key = session.key().clone();
        let (handler_container, pid) = session.handler();
        self.stopper.stop_handler(
            &format!("{}/{}", key.workload, key.container),
            &handler_container,
            pid,
        );
        let info = session.response();
        self.cancel_session(&key);
        Ok(info)
    }

    /// Record the local handler bound to an ingest.
    pub fn add_handler(
        &self,
        id: &IngestIdentifier,
        container: &str,
        pid: Option<i32>,
    ) -> Result<()> {
        let session = self.resolve_session(id)?;
        session.set_handler(container, pid);
        Ok(())
    }

    /// The single teardown entry point for one session.
    ///
    /// Removes the registry entry first so concurrent lookups see either
    /// the fully-present or fully-absent state, then trips the session's
    /// token and releases the container's pod access. Safe to call for a
    /// key that is already gone.
    pub fn cancel_session(&self, key: &IngestKey) {
        if let Some(session) = self.registry.remove(key) {
            tracing::debug!(ingest = %key, "cancelling ingest");
            session.cancel_token().cancel();
        }
        self.tracker.cancel_container(&key.workload, &key.container);
    }

    /// Cancel every active ingest. Invoked from the parent session's
    /// teardown path on disconnect.
    pub fn disconnect(&self) {
        let mut keys = Vec::new();
        self.registry.range(|key, _| {
            keys.push(key.clone());
            true
        });
        for key in &keys {
            self.cancel_session(key);
        }
    }
}

impl IngestService for IngestSessionManager {
    fn ingest(&self, rq: &IngestRequest) -> Result<IngestInfo> {
        IngestSessionManager::ingest(self, rq)
    }

    fn get_ingest(&self, id: &IngestIdentifier) -> Result<IngestInfo> {
        IngestSessionManager::get_ingest(self, id)
    }

    fn leave_ingest(&self, id: &IngestIdentifier) -> Result<IngestInfo> {
        IngestSessionManager::leave_ingest(self, id)
    }

    fn add_handler(
        &self,
        id: &IngestIdentifier,
        container: &str,
        pid: Option<i32>,
    ) -> Result<()> {
        IngestSessionManager::add_handler(self, id, container, pid)
    }
}

#[cfg(test)]
mod tests {
    use super::conflict::InterceptClaim;
    use super::*;
    use crate::agent::{ContainerSnapshot, StaticResolver};
    use crate::error::ErrorKind;
    use crate::podaccess::PodAccessDescriptor;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Resolver returning a fixed snapshot, counting calls.
    struct FixedResolver {
        snapshot: AgentSnapshot,
        calls: AtomicUsize,
    }

    impl FixedResolver {
        fn new(snapshot: AgentSnapshot) -> Self {
            Self {
                snapshot,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AgentResolver for FixedResolver {
        fn resolve_agent(&self, workload: &str) -> Result<AgentSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if workload == self.snapshot.name {
                Ok(self.snapshot.clone())
            } else {
                Err(Error::agent_resolve(workload, "unknown workload"))
            }
        }
    }

    /// Tracker that records starts and cancellations and creates the
    /// client mount directory, standing in for the mount transport.
    #[derive(Default)]
    struct RecordingTracker {
        started: Mutex<Vec<PodAccessDescriptor>>,
        cancelled: Mutex<Vec<(String, String)>>,
    }

    impl PodAccessTracker for RecordingTracker {
        fn initial_start(&self, desc: PodAccessDescriptor) -> Result<()> {
            if !desc.client_mount_point.is_empty() {
                std::fs::create_dir_all(&desc.client_mount_point)?;
            }
            self.started.lock().push(desc);
            Ok(())
        }

        fn cancel_container(&self, workload: &str, container: &str) {
            self.cancelled
                .lock()
                .push((workload.to_string(), container.to_string()));
        }
    }

    #[derive(Default)]
    struct RecordingStopper {
        stopped: Mutex<Vec<(String, String, Option<i32>)>>,
    }

    impl HandlerStopper for RecordingStopper {
        fn stop_handler(&self, name: &str, container: &str, pid: Option<i32>) {
            self.stopped
                .lock()
                .push((name.to_string(), container.to_string(), pid));
        }
    }

    fn agent(workload: &str, containers: &[&str]) -> AgentSnapshot {
        AgentSnapshot {
            name: workload.into(),
            kind: "Deployment".into(),
            pod_ip: "10.8.0.4".into(),
            sftp_port: 2222,
            ftp_port: 0,
            containers: containers
                .iter()
                .map(|c| {
                    (
                        c.to_string(),
                        ContainerSnapshot {
                            mount_point: format!("/tel_app_mounts/{}", c),
                            environment: HashMap::from([(
                                "TEST".to_string(),
                                "DATA".to_string(),
                            )]),
                        },
                    )
                })
                .collect(),
        }
    }

    struct Fixture {
        manager: IngestSessionManager,
        resolver: Arc<FixedResolver>,
        tracker: Arc<RecordingTracker>,
        stopper: Arc<RecordingStopper>,
    }

    fn fixture(snapshot: AgentSnapshot) -> Fixture {
        let resolver = Arc::new(FixedResolver::new(snapshot));
        let tracker = Arc::new(RecordingTracker::default());
        let stopper = Arc::new(RecordingStopper::default());
        let manager = IngestSessionManager::with_stopper(
            resolver.clone(),
            tracker.clone(),
            Arc::new(InterceptRoster::new()),
            stopper.clone(),
        );
        Fixture {
            manager,
            resolver,
            tracker,
            stopper,
        }
    }

    fn request(workload: &str, container: &str) -> IngestRequest {
        IngestRequest {
            identifier: IngestIdentifier {
                workload: workload.into(),
                container: container.into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_ingest_resolves_single_container() {
        let fx = fixture(agent("echo", &["web"]));
        let info = fx.manager.ingest(&request("echo", "")).unwrap();
        assert_eq!(info.container, "web");
        assert_eq!(info.workload_kind, "Deployment");
        assert_eq!(info.pod_ip, "10.8.0.4");
        assert_eq!(info.mount_point, "/tel_app_mounts/web");
        assert_eq!(fx.tracker.started.lock().len(), 1);
    }

    #[test]
    fn test_ingest_zero_containers_unavailable() {
        let fx = fixture(agent("echo", &[]));
        let err = fx.manager.ingest(&request("echo", "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(fx.manager.active_count(), 0);
    }

    #[test]
    fn test_ingest_multiple_containers_requires_choice() {
        let fx = fixture(agent("echo", &["web", "sidecar"]));
        let err = fx.manager.ingest(&request("echo", "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("multiple containers"));

        // Naming a container works.
        let info = fx.manager.ingest(&request("echo", "web")).unwrap();
        assert_eq!(info.container, "web");
    }

    #[test]
    fn test_ingest_unknown_container_not_found() {
        let fx = fixture(agent("echo", &["web"]));
        let err = fx.manager.ingest(&request("echo", "nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("no container named nope"));
        assert_eq!(fx.manager.active_count(), 0);
    }

    #[test]
    fn test_ingest_is_idempotent_lookup() {
        let fx = fixture(agent("echo", &["web"]));
        let dir = tempfile::TempDir::new().unwrap();
        let mut rq = request("echo", "web");
        rq.mount_point = dir.path().join("first").to_string_lossy().into_owned();
        let first = fx.manager.ingest(&rq).unwrap();

        // A later request with different parameters gets the existing
        // session unchanged.
        let mut second_rq = request("echo", "web");
        second_rq.mount_point = dir.path().join("second").to_string_lossy().into_owned();
        let second = fx.manager.ingest(&second_rq).unwrap();
        assert_eq!(second.client_mount_point, first.client_mount_point);
        assert_eq!(fx.manager.active_count(), 1);
        assert_eq!(fx.tracker.started.lock().len(), 1);
    }

    #[test]
    fn test_concurrent_ingest_single_winner() {
        let fx = fixture(agent("echo", &["web"]));
        let infos: Mutex<Vec<IngestInfo>> = Mutex::new(Vec::new());

        std::thread::scope(|scope| {
            for _ in 0..12 {
                scope.spawn(|| {
                    let info = fx.manager.ingest(&request("echo", "")).unwrap();
                    infos.lock().push(info);
                });
            }
        });

        let infos = infos.lock();
        assert_eq!(infos.len(), 12);
        for info in infos.iter() {
            assert_eq!(info.pod_ip, infos[0].pod_ip);
            assert_eq!(info.sftp_port, infos[0].sftp_port);
            assert_eq!(info.mount_point, infos[0].mount_point);
        }
        assert_eq!(fx.manager.active_count(), 1);
        // Pod access started exactly once, by the winning creator.
        assert_eq!(fx.tracker.started.lock().len(), 1);
    }

    #[test]
    fn test_conflict_with_intercept_rejected() {
        let fx = fixture(agent("echo", &["web"]));
        fx.manager.intercepts().add(InterceptClaim {
            name: "api".into(),
            client_mount_point: "/mnt/a".into(),
            local_mount_port: 0,
        });

        let mut rq = request("echo", "web");
        rq.mount_point = "/mnt/a".into();
        let err = fx.manager.ingest(&rq).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("intercept api"));
        // No partial session registered, no pod access started.
        assert_eq!(fx.manager.active_count(), 0);
        assert!(fx.tracker.started.lock().is_empty());
    }

    #[test]
    fn test_conflict_between_ingests_rejected() {
        let fx = fixture(agent("echo", &["web", "sidecar"]));
        let mut rq = request("echo", "web");
        rq.local_mount_port = 8022;
        fx.manager.ingest(&rq).unwrap();

        let mut rq2 = request("echo", "sidecar");
        rq2.local_mount_port = 8022;
        let err = fx.manager.ingest(&rq2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("ingest echo[web]"));
        assert_eq!(fx.manager.active_count(), 1);
    }

    #[test]
    fn test_get_ingest_by_workload_only() {
        let fx = fixture(agent("echo", &["web", "sidecar"]));
        fx.manager.ingest(&request("echo", "web")).unwrap();

        let id = IngestIdentifier {
            workload: "echo".into(),
            container: String::new(),
        };
        let info = fx.manager.get_ingest(&id).unwrap();
        assert_eq!(info.container, "web");

        // A second ingest for the same workload makes the bare lookup
        // ambiguous.
        fx.manager.ingest(&request("echo", "sidecar")).unwrap();
        let err = fx.manager.get_ingest(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("multiple ingests"));
    }

    #[test]
    fn test_get_ingest_none_not_found() {
        let fx = fixture(agent("echo", &["web"]));
        let id = IngestIdentifier {
            workload: "missing".into(),
            container: String::new(),
        };
        let err = fx.manager.get_ingest(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("no ingest found"));
    }

    #[test]
    fn test_double_leave_fails_not_found() {
        let fx = fixture(agent("echo", &["web"]));
        fx.manager.ingest(&request("echo", "web")).unwrap();

        let id = IngestIdentifier {
            workload: "echo".into(),
            container: "web".into(),
        };
        let info = fx.manager.leave_ingest(&id).unwrap();
        assert_eq!(info.container, "web");
        assert_eq!(fx.manager.active_count(), 0);
        assert_eq!(
            fx.tracker.cancelled.lock().as_slice(),
            &[("echo".to_string(), "web".to_string())]
        );

        let err = fx.manager.leave_ingest(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_leave_stops_recorded_handler() {
        let fx = fixture(agent("echo", &["web"]));
        fx.manager.ingest(&request("echo", "web")).unwrap();
        let id = IngestIdentifier {
            workload: "echo".into(),
            container: "web".into(),
        };
        fx.manager
            .add_handler(&id, "ingest-echo-web", Some(4321))
            .unwrap();

        // The handler marker shows up in the environment once recorded.
        let info = fx.manager.get_ingest(&id).unwrap();
        assert_eq!(
            info.environment[session::ENV_HANDLER_CONTAINER_NAME],
            "ingest-echo-web"
        );

        fx.manager.leave_ingest(&id).unwrap();
        assert_eq!(
            fx.stopper.stopped.lock().as_slice(),
            &[(
                "echo/web".to_string(),
                "ingest-echo-web".to_string(),
                Some(4321)
            )]
        );
    }

    #[test]
    fn test_key_reusable_after_leave() {
        let fx = fixture(agent("echo", &["web"]));
        fx.manager.ingest(&request("echo", "web")).unwrap();
        let id = IngestIdentifier {
            workload: "echo".into(),
            container: "web".into(),
        };
        fx.manager.leave_ingest(&id).unwrap();
        fx.manager.ingest(&request("echo", "web")).unwrap();
        assert_eq!(fx.manager.active_count(), 1);
        assert_eq!(fx.tracker.started.lock().len(), 2);
    }

    #[test]
    fn test_disconnect_cancels_every_ingest() {
        let fx = fixture(agent("echo", &["web", "sidecar", "metrics"]));
        for container in ["web", "sidecar", "metrics"] {
            fx.manager.ingest(&request("echo", container)).unwrap();
        }
        assert_eq!(fx.manager.active_count(), 3);

        fx.manager.disconnect();

        assert_eq!(fx.manager.active_count(), 0);
        let cancelled = fx.tracker.cancelled.lock();
        for container in ["web", "sidecar", "metrics"] {
            assert!(
                cancelled.contains(&("echo".to_string(), container.to_string())),
                "container {} was not released",
                container
            );
        }
        // Every session's token tripped.
        for desc in fx.tracker.started.lock().iter() {
            assert!(desc.cancel.is_cancelled());
        }
    }

    #[test]
    fn test_ingest_env_exclusion_end_to_end() {
        // Connect with an exclusion rule, ingest a single-container
        // workload, and verify the returned environment plus the client
        // mount directory.
        let manifest: crate::agent::ClusterManifest = toml::from_str(
            r#"
[workloads.echo-easy]
kind = "Deployment"
pod-ip = "10.4.0.7"
sftp-port = 2222

[workloads.echo-easy.containers.echo]
mount-point = "/tel_app_mounts/echo"

[workloads.echo-easy.containers.echo.environment]
TEST = "DATA"
DATABASE_HOST = "db.default"
DATABASE_PASSWORD = "hunter2"
"#,
        )
        .unwrap();
        let resolver = Arc::new(StaticResolver::new(
            manifest,
            vec!["DATABASE_HOST".into(), "DATABASE_PASSWORD".into()],
        ));
        let tracker = Arc::new(RecordingTracker::default());
        let manager = IngestSessionManager::new(
            resolver,
            tracker.clone(),
            Arc::new(InterceptRoster::new()),
        );

        let mount_dir = tempfile::TempDir::new().unwrap();
        let mount_point = mount_dir.path().join("mnt");
        let rq = IngestRequest {
            identifier: IngestIdentifier {
                workload: "echo-easy".into(),
                container: String::new(),
            },
            mount_point: mount_point.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let info = manager.ingest(&rq).unwrap();

        assert!(!info.environment.contains_key("DATABASE_HOST"));
        assert!(!info.environment.contains_key("DATABASE_PASSWORD"));
        assert_eq!(info.environment["TEST"], "DATA");

        // The client mount point materializes within a bounded wait.
        let deadline = Instant::now() + Duration::from_secs(5);
        while !mount_point.is_dir() {
            assert!(Instant::now() < deadline, "mount dir never appeared");
            std::thread::sleep(Duration::from_millis(20));
        }

        let id = IngestIdentifier {
            workload: "echo-easy".into(),
            container: String::new(),
        };
        manager.leave_ingest(&id).unwrap();
        let err = manager.get_ingest(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_resolver_error_aborts_creation() {
        let fx = fixture(agent("echo", &["web"]));
        let err = fx.manager.ingest(&request("missing", "web")).unwrap_err();
        assert!(matches!(err, Error::AgentResolve { .. }));
        assert_eq!(fx.manager.active_count(), 0);
        assert!(fx.resolver.calls.load(Ordering::SeqCst) >= 1);
    }
}
