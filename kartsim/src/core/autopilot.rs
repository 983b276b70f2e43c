use crate::core::drive_controller::FULL_SPEED;
use crate::core::track::{MarkerId, TrackPars};
use crate::core::vehicle::Vehicle;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::cmp::Ordering;

/// * `name` - Name shown for the kart
/// * `distance_per_tick` - Track units covered per tick at full speed
/// * `consistency` - Driving consistency in [0, 1], 1 means constant speed
/// * `pit_below_fuel` - Fuel level below which the kart stops at the next pit stop
/// * `refuel_target` - Fuel level at which the kart leaves the pit stop
/// * `detection_rate` - Probability in ]0, 1] that a visible marker is detected in a tick
/// * `stall_ticks_before_give_up` - Ticks without fuel after which the player gives up
#[derive(Debug, Deserialize, Clone)]
pub struct KartPars {
    pub name: String,
    pub distance_per_tick: f64,
    #[serde(default = "default_consistency")]
    pub consistency: f64,
    pub pit_below_fuel: f64,
    pub refuel_target: f64,
    #[serde(default = "default_detection_rate")]
    pub detection_rate: f64,
    #[serde(default = "default_stall_ticks")]
    pub stall_ticks_before_give_up: u32,
}

fn default_consistency() -> f64 {
    1.0
}

fn default_detection_rate() -> f64 {
    1.0
}

fn default_stall_ticks() -> u32 {
    10
}

/// What the simulated player wants to do in the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Drive,
    UseItem,
    Wait,
}

/// Outcome of one tick of driving.
///
/// * `distance` - Track units covered, used as the speed for fuel consumption
/// * `detected` - Marker the camera reported in this tick
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub distance: f64,
    pub detected: Option<MarkerId>,
}

/// Autopilot plays the role of the player and the camera: it steers the kart around the marker
/// layout, pits when running low and reports the markers it passes.
#[derive(Debug)]
pub struct Autopilot {
    markers: Vec<(f64, MarkerId)>,
    pit_stops: Vec<MarkerId>,
    track_length: f64,
    start_position: f64,
    distance_per_tick: f64,
    speed_jitter: Option<Normal<f64>>,
    pit_below_fuel: f64,
    refuel_target: f64,
    detection_rate: f64,
    stall_ticks_before_give_up: u32,
    s_track: f64,
    parked_on: Option<MarkerId>,
    pitting: bool,
    stall_ticks: u32,
    rng: StdRng,
}

impl Autopilot {
    pub fn new(kart_pars: &KartPars, track_pars: &TrackPars, seed: Option<u64>) -> Autopilot {
        let std_dev = (1.0 - kart_pars.consistency) * 0.2;
        let speed_jitter = if std_dev > 0.0 {
            Normal::new(1.0, std_dev).ok()
        } else {
            None
        };

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // the kart starts on the start/finish line
        let start_position = track_pars
            .markers
            .first()
            .map(|m| m.position)
            .unwrap_or(0.0);

        Autopilot {
            markers: track_pars
                .markers
                .iter()
                .map(|m| (m.position, m.id.to_owned()))
                .collect(),
            pit_stops: track_pars.pit_stops.to_owned(),
            track_length: track_pars.length,
            start_position,
            distance_per_tick: kart_pars.distance_per_tick,
            speed_jitter,
            pit_below_fuel: kart_pars.pit_below_fuel,
            refuel_target: kart_pars.refuel_target,
            detection_rate: kart_pars.detection_rate,
            stall_ticks_before_give_up: kart_pars.stall_ticks_before_give_up,
            s_track: start_position,
            parked_on: None,
            pitting: false,
            stall_ticks: 0,
            rng,
        }
    }

    pub fn s_track(&self) -> f64 {
        self.s_track
    }

    pub fn is_pitting(&self) -> bool {
        self.pitting
    }

    /// decide returns the intent of the player for the current tick.
    pub fn decide(&mut self, vehicle: &Vehicle) -> Intent {
        if self.pitting {
            if vehicle.fuel() < self.refuel_target {
                return Intent::Wait;
            }
            debug!("Refuelled to {:.1}, leaving pit stop", vehicle.fuel());
            self.pitting = false;
        }

        if vehicle.current_item.is_some() {
            Intent::UseItem
        } else {
            Intent::Drive
        }
    }

    /// advance moves the kart by the distance the commanded speed covers in one tick and returns
    /// the marker the camera sees on the way. A parked kart keeps seeing the marker it stands on.
    pub fn advance(&mut self, speed: i8, vehicle: &Vehicle) -> Step {
        let mut distance = if speed > 0 {
            f64::from(speed) / f64::from(FULL_SPEED) * self.distance_per_tick * self.jitter()
        } else {
            0.0
        };

        let visible = if distance > 0.0 {
            self.parked_on = None;
            match self.next_marker_within(distance) {
                Some((rel, position, marker)) => {
                    if self.wants_pit(&marker, vehicle) {
                        info!("Stopping at pit stop {} with fuel {:.1}", marker, vehicle.fuel());
                        distance = rel;
                        self.pitting = true;
                        self.parked_on = Some(marker.to_owned());
                        self.s_track = position;
                    } else {
                        self.s_track = (self.s_track + distance).rem_euclid(self.track_length);
                    }
                    Some(marker)
                }
                None => {
                    self.s_track = (self.s_track + distance).rem_euclid(self.track_length);
                    None
                }
            }
        } else {
            self.parked_on.to_owned()
        };

        let detected = visible.filter(|_| self.rng.gen::<f64>() < self.detection_rate);

        Step { distance, detected }
    }

    /// note_stall counts consecutive ticks spent without fuel outside a pit stop and returns
    /// true once the player should give up.
    pub fn note_stall(&mut self, vehicle: &Vehicle) -> bool {
        if vehicle.is_out_of_fuel() && !vehicle.in_pit_stop() {
            self.stall_ticks += 1;
        } else {
            self.stall_ticks = 0;
        }
        self.stall_ticks >= self.stall_ticks_before_give_up
    }

    pub fn reset(&mut self) {
        self.s_track = self.start_position;
        self.parked_on = None;
        self.pitting = false;
        self.stall_ticks = 0;
    }

    fn jitter(&mut self) -> f64 {
        match &self.speed_jitter {
            Some(normal) => normal.sample(&mut self.rng).clamp(0.5, 1.5),
            None => 1.0,
        }
    }

    fn wants_pit(&self, marker: &MarkerId, vehicle: &Vehicle) -> bool {
        self.pit_stops.contains(marker)
            && vehicle.fuel() < self.pit_below_fuel
            && !vehicle.is_out_of_fuel()
    }

    /// next_marker_within returns the closest marker ahead within the given distance as
    /// (distance to marker, marker position, marker).
    fn next_marker_within(&self, distance: f64) -> Option<(f64, f64, MarkerId)> {
        self.markers
            .iter()
            .map(|(position, id)| {
                (
                    (position - self.s_track).rem_euclid(self.track_length),
                    *position,
                    id,
                )
            })
            .filter(|(rel, _, _)| *rel > 0.0 && *rel <= distance)
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
            .map(|(rel, position, id)| (rel, position, id.to_owned()))
    }
}
