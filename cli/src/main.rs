#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod output;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use structopt::StructOpt;

use gtfs::GTFS;
use model::{Network, SnapConfig, STOP_OFFSET_SLACK};

#[derive(StructOpt)]
#[structopt(about = "Builds a graph of shared shape edges from a GTFS feed")]
struct Args {
    /// The path to a GTFS directory or .zip file
    gtfs: String,
    /// The directory to write the JSON files into. Created if needed.
    #[structopt(short, long, default_value = ".")]
    output: PathBuf,
    /// How much farther than its closest edge a stop may be, in degrees
    #[structopt(long, default_value = "0.0001")]
    stop_slack: f64,
    /// Also write edges.geojson
    #[structopt(long)]
    geojson: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    if args.stop_slack.is_nan() || args.stop_slack < 0.0 {
        bail!("--stop-slack must be a non-negative number, not {}", args.stop_slack);
    }

    let gtfs = timed("Loading GTFS", || GTFS::load_from_path(&args.gtfs))?;
    let config = SnapConfig {
        stop_slack: args.stop_slack,
    };
    if config.stop_slack != STOP_OFFSET_SLACK {
        info!("Using a stop slack of {}", config.stop_slack);
    }
    let network = timed("Building the network", || {
        Ok(Network::build(&gtfs, &config))
    })?;

    timed("Writing output", || {
        output::write_all(&args.output, &gtfs, &network)?;
        if args.geojson {
            output::write_geojson(&args.output, &network.graph)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn timed<T, F: FnOnce() -> Result<T>>(name: &str, f: F) -> Result<T> {
    info!("{name}...");
    let start = Instant::now();
    let result = f()?;
    info!("{name} took {:.1}s", start.elapsed().as_secs_f64());
    Ok(result)
}
