use crate::core::item::Item;
use crate::core::track::MarkerId;
use flume::Sender;
use log::{debug, info, warn};
use serde::Serialize;

/// RaceNotification is everything the race reports to the game/UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RaceNotification {
    PlayerReady,
    StartRace,
    PlayerEntersPitStop,
    PlayerExitsPitStop,
    FuelLevelChanged { level: f64 },
    CriticalFuel,
    OutOfFuel,
    PlayerFinishedLap,
    PlayerFinished,
    PlayerGaveUp,
    PlayerUseItem { item: Item, marker: Option<MarkerId> },
    ItemTouched { item: Item, marker: MarkerId },
}

/// RaceListener is the callback contract towards the race/UI layer. Implementors only have to
/// provide `notify`, the individual callbacks forward to it.
pub trait RaceListener {
    fn notify(&mut self, notification: RaceNotification);

    fn on_player_enters_pit_stop(&mut self) {
        self.notify(RaceNotification::PlayerEntersPitStop)
    }

    fn on_player_exits_pit_stop(&mut self) {
        self.notify(RaceNotification::PlayerExitsPitStop)
    }

    fn on_fuel_level_changed(&mut self, level: f64) {
        self.notify(RaceNotification::FuelLevelChanged { level })
    }

    fn on_critical_fuel(&mut self) {
        self.notify(RaceNotification::CriticalFuel)
    }

    fn on_out_of_fuel(&mut self) {
        self.notify(RaceNotification::OutOfFuel)
    }

    fn on_player_finished_lap(&mut self) {
        self.notify(RaceNotification::PlayerFinishedLap)
    }

    fn on_player_finished(&mut self) {
        self.notify(RaceNotification::PlayerFinished)
    }

    fn on_player_gave_up(&mut self) {
        self.notify(RaceNotification::PlayerGaveUp)
    }

    fn on_player_use_item(&mut self, item: Item, marker: Option<&MarkerId>) {
        self.notify(RaceNotification::PlayerUseItem {
            item,
            marker: marker.cloned(),
        })
    }

    fn on_item_touched(&mut self, item: Item, marker: &MarkerId) {
        self.notify(RaceNotification::ItemTouched {
            item,
            marker: marker.to_owned(),
        })
    }

    fn on_start_race(&mut self) {
        self.notify(RaceNotification::StartRace)
    }

    fn on_player_ready(&mut self) {
        self.notify(RaceNotification::PlayerReady)
    }
}

impl<L: RaceListener + ?Sized> RaceListener for Box<L> {
    fn notify(&mut self, notification: RaceNotification) {
        (**self).notify(notification)
    }
}

/// EventLog records all notifications in order of arrival.
#[derive(Debug, Default)]
pub struct EventLog {
    pub notifications: Vec<RaceNotification>,
}

impl EventLog {
    /// count returns how often a notification equal to `notification` was received.
    pub fn count(&self, notification: &RaceNotification) -> usize {
        self.notifications
            .iter()
            .filter(|&n| n == notification)
            .count()
    }

    /// count_fuel_changes returns the number of fuel level notifications.
    pub fn count_fuel_changes(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| matches!(n, RaceNotification::FuelLevelChanged { .. }))
            .count()
    }
}

impl RaceListener for EventLog {
    fn notify(&mut self, notification: RaceNotification) {
        self.notifications.push(notification);
    }
}

/// LogListener writes notifications to the log. Fuel level updates arrive every tick and are
/// therefore only logged at debug level.
#[derive(Debug, Default)]
pub struct LogListener;

impl RaceListener for LogListener {
    fn notify(&mut self, notification: RaceNotification) {
        match notification {
            RaceNotification::FuelLevelChanged { level } => debug!("Fuel level: {:.1}", level),
            RaceNotification::CriticalFuel | RaceNotification::OutOfFuel => {
                warn!("{:?}", notification)
            }
            n => info!("{:?}", n),
        }
    }
}

/// ChannelListener forwards notifications to another thread, e.g. a HUD.
#[derive(Debug)]
pub struct ChannelListener {
    tx: Sender<RaceNotification>,
    receiver_gone: bool,
}

impl ChannelListener {
    pub fn new(tx: Sender<RaceNotification>) -> ChannelListener {
        ChannelListener {
            tx,
            receiver_gone: false,
        }
    }
}

impl RaceListener for ChannelListener {
    fn notify(&mut self, notification: RaceNotification) {
        if self.tx.send(notification).is_err() && !self.receiver_gone {
            warn!("Notification receiver disconnected, further notifications are dropped");
            self.receiver_gone = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_forward_to_notify() {
        let mut log = EventLog::default();
        let marker = MarkerId::from("M2");

        log.on_player_ready();
        log.on_item_touched(Item::Boost, &marker);
        log.on_player_use_item(Item::Boost, Some(&marker));
        log.on_fuel_level_changed(42.0);

        assert_eq!(
            log.notifications,
            vec![
                RaceNotification::PlayerReady,
                RaceNotification::ItemTouched {
                    item: Item::Boost,
                    marker: marker.clone()
                },
                RaceNotification::PlayerUseItem {
                    item: Item::Boost,
                    marker: Some(marker)
                },
                RaceNotification::FuelLevelChanged { level: 42.0 },
            ]
        );
        assert_eq!(log.count_fuel_changes(), 1);
    }

    #[test]
    fn channel_listener_delivers_in_order() {
        let (tx, rx) = flume::unbounded();
        let mut listener = ChannelListener::new(tx);

        listener.on_start_race();
        listener.on_player_finished();

        let received: Vec<RaceNotification> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![RaceNotification::StartRace, RaceNotification::PlayerFinished]
        );
    }

    #[test]
    fn channel_listener_survives_dropped_receiver() {
        let (tx, rx) = flume::unbounded();
        drop(rx);
        let mut listener = ChannelListener::new(tx);

        listener.on_player_gave_up();
        listener.on_player_gave_up();

        assert!(listener.receiver_gone);
    }
}
