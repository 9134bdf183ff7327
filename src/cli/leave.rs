//! `teleingest leave` command.

use clap::Args;
use teleingest::config::ClientConfig;
use teleingest::manager::session::IngestIdentifier;
use teleingest::Result;

/// Leave a workload's ingest, tearing down its handler and pod access.
#[derive(Args, Debug)]
pub struct LeaveCmd {
    /// Name of the workload whose ingest to leave
    pub workload: String,

    /// Name of the container. Required when the workload has more than one
    /// ingest
    #[arg(long, short = 'c', default_value = "")]
    pub container: String,
}

impl LeaveCmd {
    pub fn run(self) -> Result<()> {
        let config = ClientConfig::load()?;
        let manager = super::build_manager(&config)?;
        let info = manager.leave_ingest(&IngestIdentifier {
            workload: self.workload,
            container: self.container,
        })?;
        println!("Left ingest {}/{}", info.workload, info.container);
        Ok(())
    }
}
