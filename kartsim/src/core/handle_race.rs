use crate::core::race::{BoxedRaceListener, Race};
use crate::interfaces::motion::LogSink;
use crate::interfaces::race_listener::{ChannelListener, LogListener, RaceNotification};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::Sender;
use log::{debug, info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. If a sender is inserted, the race runs in real time and all
/// notifications are sent through it.
pub fn handle_race(
    sim_pars: &SimPars,
    seed: Option<u64>,
    print_debug: bool,
    tx: Option<Sender<RaceNotification>>,
    realtime_factor: f64,
) -> anyhow::Result<RaceResult> {
    let sim_realtime = tx.is_some();
    if sim_realtime && !(realtime_factor.is_finite() && realtime_factor > 0.0) {
        anyhow::bail!(
            "Real-time factor must be positive and finite, but is {}!",
            realtime_factor
        );
    }
    let listener: BoxedRaceListener = match tx {
        Some(tx) => Box::new(ChannelListener::new(tx)),
        None => Box::new(LogListener),
    };

    let mut race = Race::new(sim_pars, Box::new(LogSink), listener, seed)
        .context("Failed to set up the track!")?;
    race.start();

    let mut t_race_update_print = 0.0;
    while !race.is_over() {
        let t_start = Instant::now();
        race.simulate_tick();

        if print_debug && race.cur_racetime() > t_race_update_print + 9.9999 {
            debug!(
                "Simulating... Current race time is {:.1}s, lap {}, fuel {:.1}",
                race.cur_racetime(),
                race.vehicle.lap_count + 1,
                race.vehicle.fuel()
            );
            t_race_update_print = race.cur_racetime();
        }

        if sim_realtime {
            // sleep until the tick is finished in real-time as well (calculation in ms)
            let t_sleep = (race.tick_interval * 1000.0 / realtime_factor) as i64
                - t_start.elapsed().as_millis() as i64;

            if t_sleep > 0 {
                sleep(Duration::from_millis(t_sleep as u64));
            } else {
                warn!("Could not keep up with real-time!")
            }
        }
    }

    let result = race.get_race_result();
    race.teardown();
    info!(
        "Race over: {:?} with {}/{} laps after {:.1}s",
        result.status,
        result.laps_completed,
        result.laps_required,
        result.race_time()
    );
    Ok(result)
}
