pub mod autopilot;
pub mod drive_controller;
pub mod fuel_coordinator;
pub mod handle_race;
pub mod item;
pub mod race;
pub mod track;
pub mod vehicle;
