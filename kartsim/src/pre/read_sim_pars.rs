use crate::core::autopilot::KartPars;
use crate::core::race::RacePars;
use crate::core::track::{MarkerId, TrackPars};
use crate::core::vehicle::MAX_FUEL;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;
use thiserror::Error;

/// InvalidParsError is used if a simulation parameter does not fulfill the posed requirements,
/// e.g. a pit stop placed on a marker that is not part of the track.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidParsError {
    #[error("`{0}` must be at least 1")]
    ZeroCount(&'static str),

    #[error("Tick interval must be in [0.01, 5.0]s, but is {0}s")]
    TickInterval(f64),

    #[error("Track length must be positive, but is {0}")]
    TrackLength(f64),

    #[error("The track needs at least two markers")]
    TooFewMarkers,

    #[error("Marker `{0}` is positioned at {1}, outside of [0, track length[")]
    MarkerPosition(MarkerId, f64),

    #[error("Marker `{0}` is not part of the track layout")]
    UnknownMarker(MarkerId),

    #[error("`{0}` must be in {1}, but is {2}")]
    OutOfRange(&'static str, &'static str, f64),
}

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Clone)]
pub struct SimPars {
    pub race_pars: RacePars,
    pub track_pars: TrackPars,
    pub kart_pars: KartPars,
}

impl SimPars {
    /// validate checks the parameters against the requirements of the simulation.
    pub fn validate(&self) -> Result<(), InvalidParsError> {
        let race_pars = &self.race_pars;
        if race_pars.laps_required == 0 {
            return Err(InvalidParsError::ZeroCount("laps_required"));
        }
        if race_pars.checkpoints_per_lap == 0 {
            return Err(InvalidParsError::ZeroCount("checkpoints_per_lap"));
        }
        if !(0.01..=5.0).contains(&race_pars.tick_interval) {
            return Err(InvalidParsError::TickInterval(race_pars.tick_interval));
        }
        if race_pars.max_ticks == 0 {
            return Err(InvalidParsError::ZeroCount("max_ticks"));
        }

        let track_pars = &self.track_pars;
        if !(track_pars.length > 0.0) {
            return Err(InvalidParsError::TrackLength(track_pars.length));
        }
        if track_pars.markers.len() < 2 {
            return Err(InvalidParsError::TooFewMarkers);
        }
        for marker_pars in track_pars.markers.iter() {
            if !(0.0 <= marker_pars.position && marker_pars.position < track_pars.length) {
                return Err(InvalidParsError::MarkerPosition(
                    marker_pars.id.to_owned(),
                    marker_pars.position,
                ));
            }
        }

        let layout: HashSet<&MarkerId> = track_pars.markers.iter().map(|m| &m.id).collect();
        let placed = track_pars
            .pit_stops
            .iter()
            .chain(track_pars.items.iter().map(|p| &p.marker));
        for marker in placed {
            if !layout.contains(marker) {
                return Err(InvalidParsError::UnknownMarker(marker.to_owned()));
            }
        }

        let kart_pars = &self.kart_pars;
        if !(kart_pars.distance_per_tick > 0.0 && kart_pars.distance_per_tick < track_pars.length)
        {
            return Err(InvalidParsError::OutOfRange(
                "distance_per_tick",
                "]0, track length[",
                kart_pars.distance_per_tick,
            ));
        }
        if !(0.0..=1.0).contains(&kart_pars.consistency) {
            return Err(InvalidParsError::OutOfRange(
                "consistency",
                "[0, 1]",
                kart_pars.consistency,
            ));
        }
        if !(kart_pars.detection_rate > 0.0 && kart_pars.detection_rate <= 1.0) {
            return Err(InvalidParsError::OutOfRange(
                "detection_rate",
                "]0, 1]",
                kart_pars.detection_rate,
            ));
        }
        if !(kart_pars.refuel_target > 0.0 && kart_pars.refuel_target <= MAX_FUEL) {
            return Err(InvalidParsError::OutOfRange(
                "refuel_target",
                "]0, 100]",
                kart_pars.refuel_target,
            ));
        }
        if !(0.0..=MAX_FUEL).contains(&kart_pars.pit_below_fuel) {
            return Err(InvalidParsError::OutOfRange(
                "pit_below_fuel",
                "[0, 100]",
                kart_pars.pit_below_fuel,
            ));
        }
        if kart_pars.stall_ticks_before_give_up == 0 {
            return Err(InvalidParsError::ZeroCount("stall_ticks_before_give_up"));
        }

        Ok(())
    }
}

/// read_sim_pars reads the JSON file, decodes the JSON string into the simulation parameters
/// struct and validates it.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open parameter file {:?}!", filepath))?;
    let pars: SimPars = serde_json::from_reader(&fh)
        .context(format!("Failed to parse parameter file {:?}!", filepath))?;
    pars.validate()
        .context(format!("Invalid parameters in {:?}!", filepath))?;
    Ok(pars)
}
