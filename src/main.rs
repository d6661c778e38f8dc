use clap::Parser;
use log::info;
use miette::Result;
use waynav::{Cli, Outcome, VERSION};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    info!("waynav {} starting", VERSION);

    match waynav::run(args).await? {
        Outcome::NoPathLeft(target) => {
            miette::bail!("No path left to target waypoint {}", target)
        }
        outcome => {
            info!("Session ended: {:?}", outcome);
            Ok(())
        }
    }
}
