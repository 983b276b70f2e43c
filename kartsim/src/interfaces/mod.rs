pub mod motion;
pub mod race_listener;
