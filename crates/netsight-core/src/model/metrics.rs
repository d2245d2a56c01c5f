// ── Metrics and traffic ──
//
// Each metrics type is a whole-value snapshot: a new reading replaces the
// previous one outright.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Headline network figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub uptime_pct: f64,
    pub uptime_change: f64,
    pub bandwidth_mbps: f64,
    pub bandwidth_change: f64,
    pub devices_total: f64,
    pub devices_change: f64,
    pub alerts_active: f64,
    pub alerts_change: f64,
}

/// Backend host utilisation, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub cpu_usage: f64,
    pub cpu_change: f64,
    pub memory_usage: f64,
    pub memory_change: f64,
    pub disk_usage: f64,
    pub disk_change: f64,
}

/// Most recent upload/download rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentTraffic {
    pub upload: f64,
    pub download: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub upload: f64,
    pub download: f64,
    pub timestamp: DateTime<Utc>,
}

/// Bounded traffic history, oldest first.
///
/// Samples are stored as whole triples, so the upload, download, and
/// timestamp series always have the same length and evict together.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficWindow {
    capacity: usize,
    samples: VecDeque<TrafficSample>,
}

impl TrafficWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: TrafficSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Load a historical series (oldest first), keeping the newest
    /// `capacity` samples.
    pub fn replace(&mut self, samples: Vec<TrafficSample>) {
        let skip = samples.len().saturating_sub(self.capacity);
        self.samples = samples.into_iter().skip(skip).collect();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TrafficSample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &TrafficSample> {
        self.samples.iter()
    }

    pub fn uploads(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.upload).collect()
    }

    pub fn downloads(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.download).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn sample(n: u32) -> TrafficSample {
        TrafficSample {
            upload: f64::from(n),
            download: f64::from(n) * 10.0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(i64::from(n)),
        }
    }

    #[test]
    fn series_stay_in_lockstep_across_eviction() {
        let mut window = TrafficWindow::new(20);
        for n in 0..25 {
            window.push(sample(n));
        }

        assert_eq!(window.len(), 20);
        assert_eq!(window.uploads().len(), 20);
        assert_eq!(window.downloads().len(), 20);
        assert_eq!(window.timestamps().len(), 20);
        assert_eq!(window.uploads()[0], 5.0);
        assert_eq!(window.downloads()[0], 50.0);
        assert_eq!(window.latest().map(|s| s.upload), Some(24.0));
    }

    #[test]
    fn replace_keeps_newest() {
        let mut window = TrafficWindow::new(3);
        window.replace((0..10).map(sample).collect());
        assert_eq!(window.uploads(), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut window = TrafficWindow::new(0);
        window.push(sample(1));
        assert!(window.is_empty());
    }
}
