use crate::core::race::RaceStatus;
use crate::interfaces::race_listener::RaceNotification;
use anyhow::Context;
use serde::Serialize;
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::Path;

/// RaceEvent is a notification stamped with the tick it was raised in.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RaceEvent {
    pub tick: u64,
    pub time_s: f64,
    pub notification: RaceNotification,
}

/// FuelSample is one row of the fuel trace, taken at the end of every tick.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FuelSample {
    pub tick: u64,
    pub fuel: f64,
    pub distance: f64,
    pub in_pit_stop: bool,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Serialize, Clone)]
pub struct RaceResult {
    pub kart_name: String,
    pub track_name: String,
    pub status: RaceStatus,
    pub laps_required: u32,
    pub laps_completed: u32,
    pub ticks: u64,
    pub tick_interval: f64,
    pub lap_times: Vec<f64>,
    pub pit_stops: u32,
    pub fuel_left: f64,
    pub fuel_trace: Vec<FuelSample>,
    pub events: Vec<RaceEvent>,
}

impl RaceResult {
    pub fn race_time(&self) -> f64 {
        self.ticks as f64 * self.tick_interval
    }

    fn summary(&self) -> Result<String, std::fmt::Error> {
        let mut content = String::new();
        writeln!(
            &mut content,
            "RESULT: {} on {} - {:?} after {:.1}s ({} ticks)",
            self.kart_name,
            self.track_name,
            self.status,
            self.race_time(),
            self.ticks
        )?;
        writeln!(
            &mut content,
            "RESULT: Laps {}/{}, pit stops {}, fuel left {:.1}",
            self.laps_completed, self.laps_required, self.pit_stops, self.fuel_left
        )?;

        writeln!(&mut content, "RESULT: Lap times")?;
        for (i, lap_time) in self.lap_times.iter().enumerate() {
            writeln!(&mut content, "{:3}, {:8.3}s", i + 1, lap_time)?;
        }

        writeln!(&mut content, "RESULT: Events")?;
        for event in self.events.iter() {
            writeln!(
                &mut content,
                "{:6}, {:8.3}s, {:?}",
                event.tick, event.time_s, event.notification
            )?;
        }
        Ok(content)
    }

    /// print_summary prints laps, lap times and events to the console output.
    pub fn print_summary(&self) {
        match self.summary() {
            Ok(content) => print!("{}", content),
            Err(e) => log::error!("Could not format race result: {}", e),
        }
    }

    /// write_summary_to_file writes the summary to a text file and returns its path.
    pub fn write_summary_to_file(&self, path: &Path) -> anyhow::Result<String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .context(format!("Failed to create output directory {:?}!", dir))?;
        }
        let content = self.summary()?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)
            .context(format!("Failed to open result file {:?}!", path))?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(path.to_string_lossy().into_owned())
    }

    /// write_fuel_trace_csv writes one row per tick with the fuel level and distance covered.
    pub fn write_fuel_trace_csv(&self, path: &Path) -> anyhow::Result<String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .context(format!("Failed to create output directory {:?}!", dir))?;
        }
        let mut writer = csv::Writer::from_path(path)
            .context(format!("Failed to open fuel trace file {:?}!", path))?;
        for sample in self.fuel_trace.iter() {
            writer.serialize(sample)?;
        }
        writer.flush()?;

        Ok(path.to_string_lossy().into_owned())
    }
}
