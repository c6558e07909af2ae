//! Sample-time scheduling for discrete rates.
//!
//! Each periodic rate keeps a hit counter; its next due time is always
//! recomputed as `offset + hits * period` instead of being accumulated, and
//! due times are compared with [`time_eq`].

use hf_core::{MAX_TIME, time_eq};

use crate::description::{ModelDescription, SampleTime};

/// Result of marking the sample hits due at some time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitScan {
    /// At least one periodic rate was due.
    pub any_hit: bool,
    /// Rate 0 is periodic, i.e. the model is purely discrete.
    pub base_rate_periodic: bool,
}

/// Per-rate scheduling state.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    table: Vec<SampleTime>,
    offset_sampled_rate: Option<usize>,
    /// Number of hits per rate so far.
    hit_counts: Vec<u64>,
    /// Next due time per rate. Entry 0 is kept separately from the model clock.
    next_hit: Vec<f64>,
    /// Hit flags visible to the backend during the current cycle.
    hits: Vec<bool>,
}

impl SampleSchedule {
    pub fn new(desc: &ModelDescription) -> Self {
        let table = desc.sample_times.clone();
        Self {
            next_hit: table.iter().map(|st| st.offset).collect(),
            hit_counts: vec![0; table.len()],
            hits: vec![false; table.len()],
            offset_sampled_rate: desc.offset_sampled_rate,
            table,
        }
    }

    /// Clear counters and due times.
    pub fn reset(&mut self) {
        for (i, st) in self.table.iter().enumerate() {
            self.next_hit[i] = st.offset;
            self.hit_counts[i] = 0;
            self.hits[i] = false;
        }
    }

    /// Flag every periodic rate due at `t` and bump its counter.
    pub fn mark_hits(&mut self, t: f64) -> HitScan {
        let mut scan = HitScan {
            any_hit: false,
            base_rate_periodic: false,
        };
        for (i, st) in self.table.iter().enumerate() {
            if !st.is_periodic() {
                continue;
            }
            if i == 0 {
                scan.base_rate_periodic = true;
            }
            if time_eq(t, self.next_hit[i]) {
                scan.any_hit = true;
                self.hits[i] = true;
                self.hit_counts[i] += 1;
                tracing::trace!(rate = i, t, "sample hit");
            }
        }
        scan
    }

    /// Recompute due times, clear all hit flags, and return the next time
    /// event (`MAX_TIME` if there is none).
    pub fn advance(&mut self) -> f64 {
        let mut next = MAX_TIME;
        for (i, st) in self.table.iter().enumerate() {
            if !st.is_periodic() {
                continue;
            }
            let due = st.offset + self.hit_counts[i] as f64 * st.period;
            self.next_hit[i] = due;
            next = next.min(due);
        }
        self.hits.iter_mut().for_each(|h| *h = false);
        next
    }

    /// Set or clear the hit flag of the offset-sampled continuous rate.
    pub fn set_offset_sampled_hit(&mut self, hit: bool) {
        if let Some(rate) = self.offset_sampled_rate {
            self.hits[rate] = hit;
        }
    }

    pub fn has_offset_sampled_rate(&self) -> bool {
        self.offset_sampled_rate.is_some()
    }

    pub fn is_hit(&self, rate: usize) -> bool {
        self.hits.get(rate).copied().unwrap_or(false)
    }

    pub fn hits(&self) -> &[bool] {
        &self.hits
    }

    pub fn hit_counts(&self) -> &[u64] {
        &self.hit_counts
    }

    pub fn next_hit(&self, rate: usize) -> Option<f64> {
        self.table
            .get(rate)
            .filter(|st| st.is_periodic())
            .map(|_| self.next_hit[rate])
    }
}
