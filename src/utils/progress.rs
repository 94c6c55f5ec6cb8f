use crate::models::StationId;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const STATION_TEMPLATE: &str =
    "{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} stations ({eta})";

/// Station-level progress bar for batch decodes. Every method is a no-op
/// when the reporter was built silent.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(stations: u64, message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }

        let pb = ProgressBar::new(stations);
        let style = ProgressStyle::default_bar()
            .template(STATION_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn silent() -> Self {
        Self { progress_bar: None }
    }

    /// Record that `station` finished, `done` being the running total
    pub fn station_finished(&self, station: &StationId, done: u64) {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(done);
            pb.set_message(format!("Last finished: {}", station));
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Print above the bar without corrupting it
    pub fn println(&self, message: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.println(message);
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = &self.progress_bar {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }
}
