use crate::core::item::Item;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// MarkerId identifies a physical marker on the track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        MarkerId(id.to_owned())
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// * `id` - Marker identifier
/// * `position` - Distance of the marker from the start of the track
#[derive(Debug, Deserialize, Clone)]
pub struct MarkerPars {
    pub id: MarkerId,
    pub position: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ItemPlacement {
    pub marker: MarkerId,
    pub item: Item,
}

/// * `name` - Track name
/// * `length` - Length of one lap in track units
/// * `markers` - Markers in driving order, the first one is the start/finish line
/// * `pit_stops` - Markers that are pit stops
/// * `items` - Items placed on markers at race start
#[derive(Debug, Deserialize, Clone)]
pub struct TrackPars {
    pub name: String,
    pub length: f64,
    pub markers: Vec<MarkerPars>,
    #[serde(default)]
    pub pit_stops: Vec<MarkerId>,
    #[serde(default)]
    pub items: Vec<ItemPlacement>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("Marker `{0}` is not part of the track layout")]
    UnknownMarker(MarkerId),
}

/// * `marker` - Marker the pit stop is placed on
/// * `position_index` - Index of the marker in the track order
/// * `active` - True while a vehicle refuels here
#[derive(Debug, Clone, PartialEq)]
pub struct PitStop {
    pub marker: MarkerId,
    pub position_index: usize,
    pub active: bool,
}

impl PitStop {
    pub fn new(marker: MarkerId, position_index: usize) -> PitStop {
        PitStop {
            marker,
            position_index,
            active: false,
        }
    }
}

/// Track is the marker layout of one race. Pit stops and items may only be placed on markers
/// that are part of the layout.
#[derive(Debug)]
pub struct Track {
    markers: Vec<MarkerId>,
    pit_stops: HashMap<MarkerId, PitStop>,
    items: HashMap<MarkerId, Item>,
    items_layout: HashMap<MarkerId, Item>,
    pub laps_required: u32,
    pub checkpoints_per_lap: u32,
}

impl Track {
    pub fn new(laps_required: u32, checkpoints_per_lap: u32) -> Track {
        Track {
            markers: Vec::new(),
            pit_stops: HashMap::new(),
            items: HashMap::new(),
            items_layout: HashMap::new(),
            laps_required,
            checkpoints_per_lap,
        }
    }

    /// populate places markers, pit stops and items of the given layout on the track.
    pub fn populate(&mut self, track_pars: &TrackPars) -> Result<(), TrackError> {
        for marker_pars in track_pars.markers.iter() {
            self.add_marker(marker_pars.id.to_owned());
        }

        for pit_marker in track_pars.pit_stops.iter() {
            let position_index = self
                .position_of(pit_marker)
                .ok_or_else(|| TrackError::UnknownMarker(pit_marker.to_owned()))?;
            self.add_pit_stop(
                pit_marker.to_owned(),
                PitStop::new(pit_marker.to_owned(), position_index),
            )?;
        }

        for placement in track_pars.items.iter() {
            self.add_object(placement.marker.to_owned(), placement.item)?;
        }

        Ok(())
    }

    /// add_marker appends a marker to the track order. Duplicates are kept.
    pub fn add_marker(&mut self, id: MarkerId) {
        self.markers.push(id);
    }

    pub fn markers(&self) -> &[MarkerId] {
        &self.markers
    }

    pub fn contains_marker(&self, id: &MarkerId) -> bool {
        self.markers.contains(id)
    }

    /// position_of returns the index of the first occurrence of the marker in the track order.
    pub fn position_of(&self, id: &MarkerId) -> Option<usize> {
        self.markers.iter().position(|m| m == id)
    }

    /// add_pit_stop places a pit stop on a marker, replacing an existing one.
    pub fn add_pit_stop(&mut self, id: MarkerId, pit_stop: PitStop) -> Result<(), TrackError> {
        if !self.contains_marker(&id) {
            return Err(TrackError::UnknownMarker(id));
        }
        self.pit_stops.insert(id, pit_stop);
        Ok(())
    }

    pub fn get_pit_stop(&self, id: &MarkerId) -> Option<&PitStop> {
        self.pit_stops.get(id)
    }

    pub fn get_pit_stop_mut(&mut self, id: &MarkerId) -> Option<&mut PitStop> {
        self.pit_stops.get_mut(id)
    }

    pub fn is_pit_stop(&self, id: &MarkerId) -> bool {
        self.pit_stops.contains_key(id)
    }

    /// pit_stops returns all pit stops ordered by their position on the track.
    pub fn pit_stops(&self) -> Vec<&PitStop> {
        let mut pit_stops: Vec<&PitStop> = self.pit_stops.values().collect();
        pit_stops.sort_unstable_by_key(|p| p.position_index);
        pit_stops
    }

    /// add_object places an item on a marker, replacing an existing one. The placement is also
    /// remembered as part of the layout restored by `reset`.
    pub fn add_object(&mut self, id: MarkerId, item: Item) -> Result<(), TrackError> {
        if !self.contains_marker(&id) {
            return Err(TrackError::UnknownMarker(id));
        }
        self.items_layout.insert(id.to_owned(), item);
        self.items.insert(id, item);
        Ok(())
    }

    pub fn get_object(&self, id: &MarkerId) -> Option<Item> {
        self.items.get(id).copied()
    }

    /// remove_object takes the item off the marker, e.g. when it was picked up.
    pub fn remove_object(&mut self, id: &MarkerId) -> Option<Item> {
        self.items.remove(id)
    }

    /// reset deactivates all pit stops and restores the item layout for a new race.
    pub fn reset(&mut self) {
        for pit_stop in self.pit_stops.values_mut() {
            pit_stop.active = false;
        }
        self.items = self.items_layout.clone();
    }
}

/// TrackSlot holds the track of the current race session. The first initialisation wins until
/// the track is torn down explicitly.
#[derive(Debug, Default)]
pub struct TrackSlot {
    track: Option<Track>,
}

impl TrackSlot {
    pub fn new() -> TrackSlot {
        TrackSlot { track: None }
    }

    /// init_instance creates the track if there is none yet and returns the current one.
    pub fn init_instance(&mut self, laps_required: u32, checkpoints_per_lap: u32) -> &mut Track {
        if self.track.is_some() {
            debug!("Track already initialised, keeping the existing one");
        }
        self.track
            .get_or_insert_with(|| Track::new(laps_required, checkpoints_per_lap))
    }

    pub fn get_instance(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn get_instance_mut(&mut self) -> Option<&mut Track> {
        self.track.as_mut()
    }

    /// teardown removes the track so that the next race can initialise a fresh one.
    pub fn teardown(&mut self) -> Option<Track> {
        if self.track.is_some() {
            info!("Tearing down track");
        }
        self.track.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oval() -> Track {
        let mut track = Track::new(3, 4);
        for id in &["M0", "M1", "M2", "M3"] {
            track.add_marker(MarkerId::from(*id));
        }
        track
    }

    #[test]
    fn markers_keep_insertion_order_and_duplicates() {
        let mut track = oval();
        track.add_marker(MarkerId::from("M1"));

        let ids: Vec<&str> = track.markers().iter().map(|m| m.0.as_str()).collect();
        assert_eq!(ids, vec!["M0", "M1", "M2", "M3", "M1"]);
        assert_eq!(track.position_of(&MarkerId::from("M1")), Some(1));
    }

    #[test]
    fn pit_stop_lookup() {
        let mut track = oval();
        let m2 = MarkerId::from("M2");
        track.add_pit_stop(m2.clone(), PitStop::new(m2.clone(), 2)).unwrap();

        assert!(track.is_pit_stop(&m2));
        assert!(!track.is_pit_stop(&MarkerId::from("M1")));
        assert_eq!(track.get_pit_stop(&m2).unwrap().position_index, 2);
        assert!(track.get_pit_stop(&MarkerId::from("M3")).is_none());
    }

    #[test]
    fn add_pit_stop_overwrites_silently() {
        let mut track = oval();
        let m2 = MarkerId::from("M2");
        track.add_pit_stop(m2.clone(), PitStop::new(m2.clone(), 2)).unwrap();
        track.add_pit_stop(m2.clone(), PitStop::new(m2.clone(), 7)).unwrap();

        assert_eq!(track.pit_stops().len(), 1);
        assert_eq!(track.get_pit_stop(&m2).unwrap().position_index, 7);
    }

    #[test]
    fn placements_require_known_marker() {
        let mut track = oval();
        let unknown = MarkerId::from("X9");

        assert_eq!(
            track.add_pit_stop(unknown.clone(), PitStop::new(unknown.clone(), 0)),
            Err(TrackError::UnknownMarker(unknown.clone()))
        );
        assert_eq!(
            track.add_object(unknown.clone(), Item::Boost),
            Err(TrackError::UnknownMarker(unknown))
        );
    }

    #[test]
    fn items_are_removed_and_restored_on_reset() {
        let mut track = oval();
        let m1 = MarkerId::from("M1");
        let m2 = MarkerId::from("M2");
        track.add_object(m1.clone(), Item::Boost).unwrap();
        track.add_pit_stop(m2.clone(), PitStop::new(m2.clone(), 2)).unwrap();
        track.get_pit_stop_mut(&m2).unwrap().active = true;

        assert_eq!(track.remove_object(&m1), Some(Item::Boost));
        assert_eq!(track.get_object(&m1), None);
        assert_eq!(track.remove_object(&m1), None);

        track.reset();

        assert_eq!(track.get_object(&m1), Some(Item::Boost));
        assert!(!track.get_pit_stop(&m2).unwrap().active);
    }

    #[test]
    fn populate_from_pars() {
        let track_pars: TrackPars = serde_json::from_str(
            r#"{
                "name": "kitchen",
                "length": 40.0,
                "markers": [
                    {"id": "M0", "position": 0.0},
                    {"id": "M1", "position": 10.0},
                    {"id": "PIT", "position": 20.0}
                ],
                "pit_stops": ["PIT"],
                "items": [{"marker": "M1", "item": "fuel_can"}]
            }"#,
        )
        .unwrap();

        let mut track = Track::new(2, 3);
        track.populate(&track_pars).unwrap();

        assert_eq!(track.markers().len(), 3);
        assert_eq!(
            track.get_pit_stop(&MarkerId::from("PIT")).unwrap().position_index,
            2
        );
        assert_eq!(track.get_object(&MarkerId::from("M1")), Some(Item::FuelCan));
    }

    #[test]
    fn populate_rejects_dangling_pit_stop() {
        let track_pars = TrackPars {
            name: "broken".to_owned(),
            length: 10.0,
            markers: vec![MarkerPars {
                id: MarkerId::from("M0"),
                position: 0.0,
            }],
            pit_stops: vec![MarkerId::from("PIT")],
            items: vec![],
        };

        let mut track = Track::new(1, 1);
        assert_eq!(
            track.populate(&track_pars),
            Err(TrackError::UnknownMarker(MarkerId::from("PIT")))
        );
    }

    #[test]
    fn slot_first_initialisation_wins() {
        let mut slot = TrackSlot::new();
        assert!(slot.get_instance().is_none());

        slot.init_instance(3, 4);
        slot.init_instance(10, 10);

        let track = slot.get_instance().unwrap();
        assert_eq!(track.laps_required, 3);
        assert_eq!(track.checkpoints_per_lap, 4);
    }

    #[test]
    fn slot_teardown_allows_reinitialisation() {
        let mut slot = TrackSlot::new();
        slot.init_instance(3, 4);

        assert!(slot.teardown().is_some());
        assert!(slot.get_instance().is_none());
        assert!(slot.teardown().is_none());

        slot.init_instance(5, 2);
        assert_eq!(slot.get_instance().unwrap().laps_required, 5);
    }
}
