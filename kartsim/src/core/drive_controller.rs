use crate::core::vehicle::Vehicle;
use crate::interfaces::motion::{JumpKind, MotionSink};

/// Speed limits in percent of the device maximum.
pub const BOOST_SPEED: i8 = 100;
pub const FULL_SPEED: i8 = 80;
pub const CRITICAL_SPEED: i8 = 40;
pub const TURN_RATE: i8 = 50;

/// DriveController translates player intents into device commands, limiting the speed by the
/// fuel state of the vehicle. Commands are only sent when a value changes.
#[derive(Debug)]
pub struct DriveController<M: MotionSink> {
    motion: M,
    speed: i8,
    turn_rate: i8,
}

impl<M: MotionSink> DriveController<M> {
    pub fn new(motion: M) -> DriveController<M> {
        DriveController {
            motion,
            speed: 0,
            turn_rate: 0,
        }
    }

    /// speed_cap returns the highest speed the vehicle may currently drive at.
    pub fn speed_cap(vehicle: &Vehicle) -> i8 {
        if vehicle.is_out_of_fuel() {
            0
        } else if vehicle.is_boosted() {
            BOOST_SPEED
        } else if vehicle.can_move_at_full_speed() {
            FULL_SPEED
        } else {
            CRITICAL_SPEED
        }
    }

    /// forward drives forward as fast as allowed and returns the commanded speed.
    pub fn forward(&mut self, vehicle: &Vehicle) -> i8 {
        self.set_speed(Self::speed_cap(vehicle))
    }

    /// backward reverses as fast as allowed and returns the commanded speed.
    pub fn backward(&mut self, vehicle: &Vehicle) -> i8 {
        self.set_speed(-Self::speed_cap(vehicle))
    }

    pub fn stop(&mut self) {
        self.set_speed(0);
    }

    pub fn turn_left(&mut self) {
        self.set_turn_rate(-TURN_RATE)
    }

    pub fn turn_right(&mut self) {
        self.set_turn_rate(TURN_RATE)
    }

    pub fn straighten(&mut self) {
        self.set_turn_rate(0)
    }

    pub fn jump(&mut self, kind: JumpKind) {
        self.motion.trigger_jump(kind)
    }

    pub fn speed(&self) -> i8 {
        self.speed
    }

    pub fn turn_rate(&self) -> i8 {
        self.turn_rate
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    fn set_speed(&mut self, speed: i8) -> i8 {
        if speed != self.speed {
            self.speed = speed;
            self.motion.set_forward_speed(speed);
        }
        self.speed
    }

    fn set_turn_rate(&mut self, rate: i8) {
        if rate != self.turn_rate {
            self.turn_rate = rate;
            self.motion.set_turn_rate(rate);
        }
    }
}
