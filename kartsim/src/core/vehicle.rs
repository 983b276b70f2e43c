use crate::core::item::Item;
use crate::core::track::MarkerId;

pub const MAX_FUEL: f64 = 100.0;
/// Fuel consumed per unit of speed and tick.
pub const CONSUMPTION_RATE: f64 = 0.5;
/// Fuel added per refill call.
pub const REFILL_RATE: f64 = 2.0;
pub const CRITICAL_FUEL_THRESHOLD: f64 = 10.0;

/// Vehicle holds the fuel and progress state of the kart.
///
/// * `fuel` - Current fuel level, always within [0, MAX_FUEL]
/// * `in_pit_stop` - True while the kart stands in a pit stop
/// * `current_item` - Power-up held by the player
/// * `lap_count` - Completed laps
/// * `checkpoint_count` - Checkpoints passed in the current lap
/// * `last_marker_seen` - Last detected track marker (identifier only, the track owns markers)
/// * `boost_ticks` - Remaining ticks of an active boost
#[derive(Debug, Clone)]
pub struct Vehicle {
    fuel: f64,
    in_pit_stop: bool,
    pub current_item: Item,
    pub lap_count: u32,
    pub checkpoint_count: u32,
    pub last_marker_seen: Option<MarkerId>,
    boost_ticks: u32,
}

impl Vehicle {
    pub fn new() -> Vehicle {
        Vehicle {
            fuel: MAX_FUEL,
            in_pit_stop: false,
            current_item: Item::NoItem,
            lap_count: 0,
            checkpoint_count: 0,
            last_marker_seen: None,
            boost_ticks: 0,
        }
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn in_pit_stop(&self) -> bool {
        self.in_pit_stop
    }

    pub fn set_in_pit_stop(&mut self, in_pit_stop: bool) {
        self.in_pit_stop = in_pit_stop;
    }

    /// consume_fuel burns fuel proportionally to the speed magnitude. Nothing is consumed while
    /// standing in a pit stop or for a speed that is not finite.
    pub fn consume_fuel(&mut self, speed: f64) {
        if self.in_pit_stop || self.fuel <= 0.0 || !speed.is_finite() {
            return;
        }
        self.set_current_fuel(self.fuel - speed.abs() * CONSUMPTION_RATE);
    }

    /// refill_fuel adds REFILL_RATE while standing in a pit stop, saturating at MAX_FUEL.
    pub fn refill_fuel(&mut self) {
        if self.in_pit_stop && self.fuel < MAX_FUEL {
            self.fuel = (self.fuel + REFILL_RATE).min(MAX_FUEL);
        }
    }

    pub fn can_move_at_full_speed(&self) -> bool {
        self.fuel > CRITICAL_FUEL_THRESHOLD
    }

    pub fn is_out_of_fuel(&self) -> bool {
        self.fuel <= 0.0
    }

    pub fn reset_fuel(&mut self) {
        self.fuel = MAX_FUEL;
        self.in_pit_stop = false;
    }

    /// set_current_fuel stores the value clamped to [0, MAX_FUEL]. NaN is treated as empty.
    pub fn set_current_fuel(&mut self, value: f64) {
        self.fuel = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, MAX_FUEL)
        };
    }

    pub fn grant_boost(&mut self, ticks: u32) {
        self.boost_ticks = self.boost_ticks.max(ticks);
    }

    pub fn is_boosted(&self) -> bool {
        self.boost_ticks > 0
    }

    /// tick_boost counts an active boost down by one tick.
    pub fn tick_boost(&mut self) {
        self.boost_ticks = self.boost_ticks.saturating_sub(1);
    }

    /// take_item hands out the held item and leaves the player empty-handed.
    pub fn take_item(&mut self) -> Item {
        std::mem::take(&mut self.current_item)
    }

    /// reset prepares the vehicle for a new race.
    pub fn reset(&mut self) {
        self.reset_fuel();
        self.current_item = Item::NoItem;
        self.lap_count = 0;
        self.checkpoint_count = 0;
        self.last_marker_seen = None;
        self.boost_ticks = 0;
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        Vehicle::new()
    }
}
