use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sitetime::{
    host::{args::HostArgs, start_host, HostSettings},
    utils::{
        dir::resolve_application_path,
        logging::{enable_logging, HOST_PREFIX},
        runtime::single_thread_runtime,
    },
};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = HostArgs::parse();
    let app_dir = resolve_application_path(args.dir.clone())?;
    enable_logging(HOST_PREFIX, &app_dir, args.log, args.log_console)?;
    info!("Started by browser with {:?}", args.browser_args);

    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(start_host(app_dir, HostSettings::from(&args)));
    // The blocking stdin read can outlive the host, don't wait for it.
    runtime.shutdown_timeout(Duration::from_secs(1));

    result.inspect_err(|e| error!("Host failed {e:?}"))
}
