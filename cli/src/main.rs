use clap::Parser;
use kartsim::core::handle_race::handle_race;
use kartsim::core::race::RaceStatus;
use kartsim::interfaces::race_listener::RaceNotification;
use kartsim::logger::{logger_init, LevelFilter};
use kartsim::post::race_result::RaceResult;
use kartsim::pre::read_sim_pars::read_sim_pars;
use kartsim::pre::sim_opts::SimOpts;
use log::{info, warn};
use rayon::prelude::*;
use std::thread;
use std::time::Instant;

/// hud_line renders a notification the way the in-game HUD announces it.
fn hud_line(notification: &RaceNotification) -> Option<String> {
    let line = match notification {
        RaceNotification::PlayerReady => "Kart ready".to_owned(),
        RaceNotification::StartRace => "GO!".to_owned(),
        RaceNotification::PlayerEntersPitStop => "Pit stop: refuelling".to_owned(),
        RaceNotification::PlayerExitsPitStop => "Leaving pit stop".to_owned(),
        // the fuel gauge is updated every tick and would flood the console
        RaceNotification::FuelLevelChanged { .. } => return None,
        RaceNotification::CriticalFuel => "Fuel critical, speed limited!".to_owned(),
        RaceNotification::OutOfFuel => "Out of fuel!".to_owned(),
        RaceNotification::PlayerFinishedLap => "Lap completed".to_owned(),
        RaceNotification::PlayerFinished => "Finished!".to_owned(),
        RaceNotification::PlayerGaveUp => "Gave up".to_owned(),
        RaceNotification::PlayerUseItem { item, .. } => format!("Used {}", item),
        RaceNotification::ItemTouched { item, marker } => {
            format!("Picked up {} at {}", item, marker)
        }
    };
    Some(line)
}

fn save_results(result: &RaceResult, sim_opts: &SimOpts) {
    match result.write_summary_to_file(&sim_opts.output_dir.join("last_run.txt")) {
        Ok(path) => info!("Race summary written to {}", path),
        Err(e) => warn!("Could not write race summary: {:#}", e),
    }
    match result.write_fuel_trace_csv(&sim_opts.output_dir.join("fuel_trace.csv")) {
        Ok(path) => info!("Fuel trace written to {}", path),
        Err(e) => warn!("Could not write fuel trace: {:#}", e),
    }
}

/// print_batch_summary prints how a batch of races with the same parameters went.
fn print_batch_summary(results: &[RaceResult]) {
    let finished: Vec<&RaceResult> = results
        .iter()
        .filter(|r| r.status == RaceStatus::Finished)
        .collect();

    println!("RESULT: Simulated {} races", results.len());
    println!(
        "RESULT: Finished {}, gave up {}, aborted {}",
        finished.len(),
        results
            .iter()
            .filter(|r| r.status == RaceStatus::GaveUp)
            .count(),
        results
            .iter()
            .filter(|r| r.status == RaceStatus::Aborted)
            .count()
    );

    if finished.is_empty() {
        return;
    }
    let no_finished = finished.len() as f64;
    let mean_race_time = finished.iter().map(|r| r.race_time()).sum::<f64>() / no_finished;
    let best_race_time = finished
        .iter()
        .map(|r| r.race_time())
        .fold(f64::INFINITY, f64::min);
    let mean_pit_stops = finished.iter().map(|r| r.pit_stops as f64).sum::<f64>() / no_finished;

    println!(
        "RESULT: Race time mean {:.1}s, best {:.1}s",
        mean_race_time, best_race_time
    );
    println!("RESULT: Pit stops per finished race {:.2}", mean_pit_stops);
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    std::fs::create_dir_all(&sim_opts.output_dir)?;
    let log_level = if sim_opts.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger_init(log_level, Some(&sim_opts.output_dir.join("kartsim.log")))?;

    // get simulation parameters
    info!("Reading simulation parameters from {:?}", sim_opts.parfile_path);
    let sim_pars = read_sim_pars(&sim_opts.parfile_path)?;

    info!(
        "Simulating {} on {} with a tick interval of {:.2}s",
        sim_pars.kart_pars.name, sim_pars.track_pars.name, sim_pars.race_pars.tick_interval
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.live && sim_opts.no_sim_runs > 1 {
        info!("Running {} races in parallel...", sim_opts.no_sim_runs);
        let t_start = Instant::now();

        // consecutive seeds keep a seeded batch reproducible
        let race_results = (0..sim_opts.no_sim_runs)
            .into_par_iter()
            .map(|run| {
                let seed = sim_opts.seed.map(|seed| seed.wrapping_add(u64::from(run)));
                handle_race(&sim_pars, seed, false, None, 1.0)
            })
            .collect::<anyhow::Result<Vec<RaceResult>>>()?;

        info!("Execution time: {}ms", t_start.elapsed().as_millis());
        print_batch_summary(&race_results);
        return Ok(());
    }

    let race_result = if !sim_opts.live {
        let t_start = Instant::now();

        let race_result = handle_race(&sim_pars, sim_opts.seed, sim_opts.debug, None, 1.0)?;

        info!("Execution time: {}ms", t_start.elapsed().as_millis());
        race_result
    } else {
        info!("Starting live race...");

        // the race runs on its own thread, the main thread acts as the HUD
        let (tx, rx) = flume::unbounded();
        let sim_opts_thread = sim_opts.clone();
        let sim_pars_thread = sim_pars.clone();

        let race_thread = thread::spawn(move || {
            handle_race(
                &sim_pars_thread,
                sim_opts_thread.seed,
                sim_opts_thread.debug,
                Some(tx),
                sim_opts_thread.realtime_factor,
            )
        });

        // the channel disconnects once the race thread has dropped its sender
        for notification in rx.iter() {
            if let Some(line) = hud_line(&notification) {
                println!("HUD: {}", line);
            }
        }

        race_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Race thread panicked!"))??
    };

    // POST-PROCESSING -----------------------------------------------------------------------------
    race_result.print_summary();
    save_results(&race_result, &sim_opts);

    Ok(())
}
