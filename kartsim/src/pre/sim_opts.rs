use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "kartsim",
    about = "Fuel and pit stop simulation of a marker-based kart race"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Run the race in real time and stream notifications to the console HUD
    #[clap(short, long)]
    pub live: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (only for headless mode, ignored in live mode)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file
    #[clap(short, long)]
    pub parfile_path: PathBuf,

    /// Set real-time factor (only relevant in live mode)
    #[clap(short, long, default_value = "1.0", value_parser = parse_realtime_factor)]
    pub realtime_factor: f64,

    /// Seed the random number generator to make a race reproducible
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set directory for the result report, the fuel trace and the log file
    #[clap(short, long, default_value = "output")]
    pub output_dir: PathBuf,
}

/// parse_realtime_factor accepts positive, finite factors only.
fn parse_realtime_factor(arg: &str) -> Result<f64, String> {
    let factor: f64 = arg.parse().map_err(|e| format!("{}", e))?;
    if factor.is_finite() && factor > 0.0 {
        Ok(factor)
    } else {
        Err(format!("must be positive and finite, but is {}", factor))
    }
}
