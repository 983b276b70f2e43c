use log::trace;
use serde::Serialize;

/// Jump animations the drone can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    Long,
    High,
}

/// MotionSink is the movement-intent side of the device controller. Speed and turn rate are
/// given in percent of the device maximum, i.e. in [-100, 100].
pub trait MotionSink {
    fn set_forward_speed(&mut self, speed: i8);
    fn set_turn_rate(&mut self, rate: i8);
    fn trigger_jump(&mut self, kind: JumpKind);
}

impl<M: MotionSink + ?Sized> MotionSink for Box<M> {
    fn set_forward_speed(&mut self, speed: i8) {
        (**self).set_forward_speed(speed)
    }

    fn set_turn_rate(&mut self, rate: i8) {
        (**self).set_turn_rate(rate)
    }

    fn trigger_jump(&mut self, kind: JumpKind) {
        (**self).trigger_jump(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionCommand {
    ForwardSpeed(i8),
    TurnRate(i8),
    Jump(JumpKind),
}

/// LogSink stands in for a connected drone when simulating: commands are only traced.
#[derive(Debug, Default)]
pub struct LogSink;

impl MotionSink for LogSink {
    fn set_forward_speed(&mut self, speed: i8) {
        trace!("Device command: forward speed {}", speed);
    }

    fn set_turn_rate(&mut self, rate: i8) {
        trace!("Device command: turn rate {}", rate);
    }

    fn trigger_jump(&mut self, kind: JumpKind) {
        trace!("Device command: jump {:?}", kind);
    }
}

/// RecordingSink keeps every command it receives in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<MotionCommand>,
}

impl MotionSink for RecordingSink {
    fn set_forward_speed(&mut self, speed: i8) {
        self.commands.push(MotionCommand::ForwardSpeed(speed));
    }

    fn set_turn_rate(&mut self, rate: i8) {
        self.commands.push(MotionCommand::TurnRate(rate));
    }

    fn trigger_jump(&mut self, kind: JumpKind) {
        self.commands.push(MotionCommand::Jump(kind));
    }
}
