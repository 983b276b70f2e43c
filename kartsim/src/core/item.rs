use crate::core::vehicle::Vehicle;
use crate::interfaces::motion::{JumpKind, MotionSink};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of ticks a boost lifts the speed limit.
pub const BOOST_TICKS: u32 = 6;
/// Fuel added by a fuel can.
pub const FUEL_CAN_AMOUNT: f64 = 25.0;

/// Power-ups that can be placed on track markers and picked up by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    NoItem,
    Boost,
    Jump,
    FuelCan,
}

/// ItemContext is what an item may act upon when it is used.
pub struct ItemContext<'a> {
    pub vehicle: &'a mut Vehicle,
    pub motion: &'a mut dyn MotionSink,
}

impl Item {
    pub fn is_some(&self) -> bool {
        !matches!(self, Item::NoItem)
    }

    /// use_item applies the effect of the item and returns false if there was nothing to use.
    pub fn use_item(self, ctx: &mut ItemContext) -> bool {
        match self {
            Item::NoItem => false,
            Item::Boost => {
                ctx.vehicle.grant_boost(BOOST_TICKS);
                true
            }
            Item::Jump => {
                ctx.motion.trigger_jump(JumpKind::Long);
                true
            }
            Item::FuelCan => {
                let fuel = ctx.vehicle.fuel();
                ctx.vehicle.set_current_fuel(fuel + FUEL_CAN_AMOUNT);
                true
            }
        }
    }
}

impl Default for Item {
    fn default() -> Self {
        Item::NoItem
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Item::NoItem => "nothing",
            Item::Boost => "boost",
            Item::Jump => "jump",
            Item::FuelCan => "fuel can",
        };
        write!(f, "{}", name)
    }
}
