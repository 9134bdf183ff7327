//! Container-based handler execution.
//!
//! The docker plumbing itself is an external collaborator; the session
//! driver only names the handler container and hands over the environment
//! and mount descriptor.

use crate::client::mount::MountDescriptor;
use crate::error::Result;
use std::collections::HashMap;

/// The name a bound docker run gives its handler container.
pub fn handler_container_name(workload: &str, container: &str) -> String {
    if container.is_empty() {
        format!("ingest-{workload}")
    } else {
        format!("ingest-{workload}-{container}")
    }
}

/// Runs a bound command in a container instead of a local process.
pub trait ContainerRunner: Send + Sync {
    /// Pull or build the handler image; returns the command line that runs
    /// it.
    fn pull_or_build_image(&self, handler_name: &str) -> Result<Vec<String>>;

    /// Run the handler container until it exits or is interrupted.
    fn run(
        &self,
        handler_name: &str,
        environment: &HashMap<String, String>,
        mount: Option<&MountDescriptor>,
        wait_message: &str,
        cmdline: &[String],
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_container_name() {
        assert_eq!(handler_container_name("echo", ""), "ingest-echo");
        assert_eq!(handler_container_name("echo", "web"), "ingest-echo-web");
    }
}
