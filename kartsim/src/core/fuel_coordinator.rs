use crate::core::track::{MarkerId, Track};
use crate::core::vehicle::{Vehicle, CRITICAL_FUEL_THRESHOLD};
use crate::interfaces::race_listener::RaceListener;
use log::{info, trace, warn};

/// FuelCoordinator applies consumption and refilling to its vehicle and reports pit stop and
/// fuel transitions. Pit occupancy only changes on marker detections.
///
/// * `last_fuel_level` - Last reported fuel level
/// * `current_pit_marker` - Pit stop the vehicle currently occupies
/// * `was_refueling_last_tick` - Edge detector for enter/exit notifications
/// * `critical_notified` - Critical fuel was reported and fuel has not risen above the threshold
/// since
/// * `out_of_fuel_notified` - Empty tank was reported and fuel has not risen since
#[derive(Debug)]
pub struct FuelCoordinator {
    last_fuel_level: f64,
    current_pit_marker: Option<MarkerId>,
    was_refueling_last_tick: bool,
    critical_notified: bool,
    out_of_fuel_notified: bool,
}

impl FuelCoordinator {
    pub fn new(vehicle: &Vehicle) -> FuelCoordinator {
        FuelCoordinator {
            last_fuel_level: vehicle.fuel(),
            current_pit_marker: None,
            was_refueling_last_tick: false,
            critical_notified: false,
            out_of_fuel_notified: false,
        }
    }

    pub fn current_pit_marker(&self) -> Option<&MarkerId> {
        self.current_pit_marker.as_ref()
    }

    /// on_tick consumes fuel for the given speed, refills while in a pit stop and reports the
    /// resulting transitions.
    pub fn on_tick(
        &mut self,
        speed: f64,
        vehicle: &mut Vehicle,
        listener: &mut dyn RaceListener,
    ) {
        vehicle.consume_fuel(speed);

        if vehicle.in_pit_stop() {
            vehicle.refill_fuel();
            if !self.was_refueling_last_tick {
                listener.on_player_enters_pit_stop();
            }
            self.was_refueling_last_tick = true;
        } else {
            if self.was_refueling_last_tick {
                listener.on_player_exits_pit_stop();
            }
            self.was_refueling_last_tick = false;
        }

        self.check_fuel_level_change(vehicle, listener);
    }

    /// on_marker_detected updates pit occupancy. Re-detecting the pit stop the vehicle already
    /// occupies does not report a second entry.
    pub fn on_marker_detected(
        &mut self,
        marker: Option<&MarkerId>,
        track: Option<&mut Track>,
        vehicle: &mut Vehicle,
        listener: &mut dyn RaceListener,
    ) {
        let (marker, track) = match (marker, track) {
            (Some(marker), Some(track)) => (marker, track),
            (_, None) => {
                warn!("Marker detection without an initialised track, ignoring it");
                return;
            }
            (None, _) => {
                trace!("No marker detected");
                return;
            }
        };

        if track.is_pit_stop(marker) {
            if self.current_pit_marker.as_ref() == Some(marker) {
                return;
            }
            if let Some(previous) = self.current_pit_marker.take() {
                if let Some(pit_stop) = track.get_pit_stop_mut(&previous) {
                    pit_stop.active = false;
                }
            }
            if let Some(pit_stop) = track.get_pit_stop_mut(marker) {
                pit_stop.active = true;
            }
            info!("Entering pit stop at marker {}", marker);
            self.current_pit_marker = Some(marker.to_owned());
            vehicle.set_in_pit_stop(true);
            self.was_refueling_last_tick = true;
            listener.on_player_enters_pit_stop();
        } else if let Some(previous) = self.current_pit_marker.take() {
            if let Some(pit_stop) = track.get_pit_stop_mut(&previous) {
                pit_stop.active = false;
            }
            info!("Leaving pit stop at marker {}", previous);
            vehicle.set_in_pit_stop(false);
            self.was_refueling_last_tick = false;
            listener.on_player_exits_pit_stop();
        }
    }

    /// check_fuel_level_change reports a changed fuel level. Critical fuel is reported once when
    /// the level drops into (0, CRITICAL_FUEL_THRESHOLD], refilling into that band is not
    /// critical. An empty tank is reported once when it hits zero.
    fn check_fuel_level_change(&mut self, vehicle: &Vehicle, listener: &mut dyn RaceListener) {
        let fuel = vehicle.fuel();
        if fuel == self.last_fuel_level {
            return;
        }
        let falling = fuel < self.last_fuel_level;
        self.last_fuel_level = fuel;
        listener.on_fuel_level_changed(fuel);

        if vehicle.can_move_at_full_speed() {
            self.critical_notified = false;
        } else if falling
            && fuel > 0.0
            && fuel <= CRITICAL_FUEL_THRESHOLD
            && !self.critical_notified
        {
            warn!("Critical fuel level {:.1}", fuel);
            self.critical_notified = true;
            listener.on_critical_fuel();
        }

        if !vehicle.is_out_of_fuel() {
            self.out_of_fuel_notified = false;
        } else if !self.out_of_fuel_notified {
            warn!("Out of fuel");
            self.out_of_fuel_notified = true;
            listener.on_out_of_fuel();
        }
    }

    /// reset refuels the vehicle and forgets all pit stop state.
    pub fn reset(&mut self, vehicle: &mut Vehicle) {
        vehicle.reset_fuel();
        self.last_fuel_level = vehicle.fuel();
        self.current_pit_marker = None;
        self.was_refueling_last_tick = false;
        self.critical_notified = false;
        self.out_of_fuel_notified = false;
    }
}
