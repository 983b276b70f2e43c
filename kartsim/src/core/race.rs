use crate::core::autopilot::{Autopilot, Intent};
use crate::core::drive_controller::DriveController;
use crate::core::fuel_coordinator::FuelCoordinator;
use crate::core::item::ItemContext;
use crate::core::track::{MarkerId, TrackError, TrackSlot};
use crate::core::vehicle::Vehicle;
use crate::interfaces::motion::MotionSink;
use crate::interfaces::race_listener::{RaceListener, RaceNotification};
use crate::post::race_result::{FuelSample, RaceEvent, RaceResult};
use crate::pre::read_sim_pars::SimPars;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// * `laps_required` - Laps to complete the race
/// * `checkpoints_per_lap` - Markers to pass in track order to complete a lap
/// * `tick_interval` - (s) Time between two ticks
/// * `max_ticks` - Ticks after which an unfinished race is aborted
#[derive(Debug, Deserialize, Clone)]
pub struct RacePars {
    pub laps_required: u32,
    pub checkpoints_per_lap: u32,
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f64,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

fn default_tick_interval() -> f64 {
    0.5
}

fn default_max_ticks() -> u64 {
    10_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RaceStatus {
    Ready,
    Running,
    Finished,
    GaveUp,
    Aborted,
}

pub type BoxedMotionSink = Box<dyn MotionSink + Send>;
pub type BoxedRaceListener = Box<dyn RaceListener + Send>;

/// Recorder stamps notifications with the current tick before passing them on.
struct Recorder<'a> {
    tick: u64,
    tick_interval: f64,
    events: &'a mut Vec<RaceEvent>,
    inner: &'a mut dyn RaceListener,
}

impl RaceListener for Recorder<'_> {
    fn notify(&mut self, notification: RaceNotification) {
        // the fuel trace already covers level changes
        if !matches!(notification, RaceNotification::FuelLevelChanged { .. }) {
            self.events.push(RaceEvent {
                tick: self.tick,
                time_s: self.tick as f64 * self.tick_interval,
                notification: notification.clone(),
            });
        }
        self.inner.notify(notification);
    }
}

/// Race is one race session of a single kart. It owns the track, the vehicle and everything
/// that mutates them, so all game state is changed from one place.
pub struct Race {
    pub tick_interval: f64,
    pub max_ticks: u64,
    pub cur_tick: u64,
    pub status: RaceStatus,
    pub track: TrackSlot,
    pub vehicle: Vehicle,
    kart_name: String,
    track_name: String,
    fuel: FuelCoordinator,
    drive: DriveController<BoxedMotionSink>,
    autopilot: Autopilot,
    next_marker_idx: usize,
    last_lap_tick: u64,
    lap_times: Vec<f64>,
    fuel_trace: Vec<FuelSample>,
    events: Vec<RaceEvent>,
    listener: BoxedRaceListener,
}

impl Race {
    pub fn new(
        sim_pars: &SimPars,
        motion: BoxedMotionSink,
        listener: BoxedRaceListener,
        seed: Option<u64>,
    ) -> Result<Race, TrackError> {
        let mut track = TrackSlot::new();
        track
            .init_instance(
                sim_pars.race_pars.laps_required,
                sim_pars.race_pars.checkpoints_per_lap,
            )
            .populate(&sim_pars.track_pars)?;

        let vehicle = Vehicle::new();
        let fuel = FuelCoordinator::new(&vehicle);

        Ok(Race {
            tick_interval: sim_pars.race_pars.tick_interval,
            max_ticks: sim_pars.race_pars.max_ticks,
            cur_tick: 0,
            status: RaceStatus::Ready,
            track,
            vehicle,
            kart_name: sim_pars.kart_pars.name.to_owned(),
            track_name: sim_pars.track_pars.name.to_owned(),
            fuel,
            drive: DriveController::new(motion),
            autopilot: Autopilot::new(&sim_pars.kart_pars, &sim_pars.track_pars, seed),
            // the kart starts on the first marker, the next checkpoint is the one after it
            next_marker_idx: 1,
            last_lap_tick: 0,
            lap_times: Vec::new(),
            fuel_trace: Vec::new(),
            events: Vec::new(),
            listener,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_tick lets the player act, applies fuel consumption and processes the marker
    /// seen in this tick.
    pub fn simulate_tick(&mut self) {
        if self.status != RaceStatus::Running {
            return;
        }
        self.cur_tick += 1;

        let speed = match self.autopilot.decide(&self.vehicle) {
            Intent::Wait => {
                self.drive.stop();
                0
            }
            Intent::UseItem => {
                self.use_item();
                self.drive.forward(&self.vehicle)
            }
            Intent::Drive => self.drive.forward(&self.vehicle),
        };

        let step = self.autopilot.advance(speed, &self.vehicle);
        self.on_tick(step.distance);
        self.on_marker_detected(step.detected);
        self.vehicle.tick_boost();

        self.fuel_trace.push(FuelSample {
            tick: self.cur_tick,
            fuel: self.vehicle.fuel(),
            distance: step.distance,
            in_pit_stop: self.vehicle.in_pit_stop(),
        });

        if self.status != RaceStatus::Running {
            return;
        }
        if self.autopilot.note_stall(&self.vehicle) {
            self.give_up();
        } else if self.cur_tick >= self.max_ticks {
            warn!(
                "Race aborted after {} ticks with {} of {} laps",
                self.cur_tick,
                self.vehicle.lap_count,
                self.laps_required()
            );
            self.status = RaceStatus::Aborted;
        }
    }

    // ---------------------------------------------------------------------------------------------
    // RACE PARTS ----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// start reports the player ready and starts the race.
    pub fn start(&mut self) {
        if self.status != RaceStatus::Ready {
            warn!("Tried to start a race that is {:?}", self.status);
            return;
        }
        info!(
            "Starting race of {} on {} over {} laps",
            self.kart_name,
            self.track_name,
            self.laps_required()
        );
        let mut recorder = self.recorder();
        recorder.on_player_ready();
        recorder.on_start_race();
        self.status = RaceStatus::Running;
    }

    /// on_tick applies one tick of fuel consumption/refilling for the given speed.
    pub fn on_tick(&mut self, speed: f64) {
        let Race {
            cur_tick,
            tick_interval,
            events,
            listener,
            fuel,
            vehicle,
            ..
        } = self;
        let mut recorder = Recorder {
            tick: *cur_tick,
            tick_interval: *tick_interval,
            events,
            inner: listener,
        };
        fuel.on_tick(speed, vehicle, &mut recorder);
    }

    /// on_marker_detected processes a marker reported by the camera: pit stop occupancy first,
    /// then item pickup and lap progress while the race is running.
    pub fn on_marker_detected(&mut self, marker: Option<MarkerId>) {
        let Race {
            cur_tick,
            tick_interval,
            events,
            listener,
            fuel,
            vehicle,
            track,
            status,
            next_marker_idx,
            last_lap_tick,
            lap_times,
            ..
        } = self;
        let mut recorder = Recorder {
            tick: *cur_tick,
            tick_interval: *tick_interval,
            events,
            inner: listener,
        };

        fuel.on_marker_detected(marker.as_ref(), track.get_instance_mut(), vehicle, &mut recorder);

        if *status != RaceStatus::Running {
            return;
        }
        let (marker, track) = match (marker, track.get_instance_mut()) {
            (Some(marker), Some(track)) => (marker, track),
            _ => return,
        };

        // a stationary kart keeps reporting the marker it stands on
        if vehicle.last_marker_seen.as_ref() == Some(&marker) {
            return;
        }
        vehicle.last_marker_seen = Some(marker.to_owned());

        if !vehicle.current_item.is_some() {
            if let Some(item) = track.get_object(&marker).filter(|item| item.is_some()) {
                track.remove_object(&marker);
                vehicle.current_item = item;
                info!("Picked up {} at marker {}", item, marker);
                recorder.on_item_touched(item, &marker);
            }
        }

        let markers = track.markers();
        if markers.is_empty() || markers[*next_marker_idx % markers.len()] != marker {
            return;
        }
        *next_marker_idx = (*next_marker_idx + 1) % markers.len();
        vehicle.checkpoint_count += 1;

        if vehicle.checkpoint_count < track.checkpoints_per_lap {
            return;
        }
        vehicle.checkpoint_count = 0;
        vehicle.lap_count += 1;
        lap_times.push((*cur_tick - *last_lap_tick) as f64 * *tick_interval);
        *last_lap_tick = *cur_tick;
        info!(
            "Lap {}/{} completed in {:.1}s",
            vehicle.lap_count,
            track.laps_required,
            lap_times.last().copied().unwrap_or(0.0)
        );
        recorder.on_player_finished_lap();

        if vehicle.lap_count >= track.laps_required {
            info!("Race finished after {} ticks", cur_tick);
            *status = RaceStatus::Finished;
            recorder.on_player_finished();
        }
    }

    /// use_item uses the item the player holds, if any.
    pub fn use_item(&mut self) {
        let item = self.vehicle.take_item();
        if !item.is_some() {
            return;
        }

        let used = item.use_item(&mut ItemContext {
            vehicle: &mut self.vehicle,
            motion: self.drive.motion_mut(),
        });
        if used {
            info!("Using {}", item);
            let marker = self.vehicle.last_marker_seen.to_owned();
            self.recorder().on_player_use_item(item, marker.as_ref());
        }
    }

    /// give_up ends a running race without finishing it.
    pub fn give_up(&mut self) {
        if self.status != RaceStatus::Running {
            return;
        }
        info!(
            "Player gave up after {} of {} laps",
            self.vehicle.lap_count,
            self.laps_required()
        );
        self.drive.stop();
        self.recorder().on_player_gave_up();
        self.status = RaceStatus::GaveUp;
    }

    /// reset brings vehicle, track and player back to the start for another race.
    pub fn reset(&mut self) {
        self.vehicle.reset();
        self.fuel.reset(&mut self.vehicle);
        if let Some(track) = self.track.get_instance_mut() {
            track.reset();
        }
        self.autopilot.reset();
        self.drive.stop();
        self.drive.straighten();

        self.cur_tick = 0;
        self.status = RaceStatus::Ready;
        self.next_marker_idx = 1;
        self.last_lap_tick = 0;
        self.lap_times.clear();
        self.fuel_trace.clear();
        self.events.clear();
    }

    /// teardown ends the session and releases its track. Marker detections are ignored
    /// afterwards, a new race has to be created for the next session.
    pub fn teardown(&mut self) {
        if self.status == RaceStatus::Running {
            self.give_up();
        }
        self.drive.stop();
        self.track.teardown();
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn is_over(&self) -> bool {
        matches!(
            self.status,
            RaceStatus::Finished | RaceStatus::GaveUp | RaceStatus::Aborted
        )
    }

    pub fn cur_racetime(&self) -> f64 {
        self.cur_tick as f64 * self.tick_interval
    }

    fn laps_required(&self) -> u32 {
        self.track
            .get_instance()
            .map(|t| t.laps_required)
            .unwrap_or(0)
    }

    fn recorder(&mut self) -> Recorder<'_> {
        Recorder {
            tick: self.cur_tick,
            tick_interval: self.tick_interval,
            events: &mut self.events,
            inner: &mut self.listener,
        }
    }

    pub fn get_race_result(&self) -> RaceResult {
        RaceResult {
            kart_name: self.kart_name.to_owned(),
            track_name: self.track_name.to_owned(),
            status: self.status,
            laps_required: self.laps_required(),
            laps_completed: self.vehicle.lap_count,
            ticks: self.cur_tick,
            tick_interval: self.tick_interval,
            lap_times: self.lap_times.to_owned(),
            pit_stops: self
                .events
                .iter()
                .filter(|e| e.notification == RaceNotification::PlayerEntersPitStop)
                .count() as u32,
            fuel_left: self.vehicle.fuel(),
            fuel_trace: self.fuel_trace.to_owned(),
            events: self.events.to_owned(),
        }
    }
}
