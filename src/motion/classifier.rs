//! Movement classification with delta thresholding and hysteresis
//!
//! Consecutive samples are compared by L1 distance. A bounded confirmation
//! counter rises on every exceedance and drains on quiet samples, so a single
//! spike never flips the state. Dropped frames (too soon, out of order,
//! non-finite, below the noise floor) leave every field untouched.

use crate::motion::config::MotionConfig;
use crate::motion::sampler::AccelerationSample;
use tracing::trace;

/// Why a sample did not take part in classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Arrived within the minimum inter-sample interval
    TooSoon,
    /// Timestamp not after the last processed sample
    OutOfOrder,
    /// NaN or infinite axis value
    NonFinite,
    /// Every axis below the configured noise floor
    BelowNoiseFloor,
}

/// Movement verdict for one processed sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Moving,
    Still,
}

impl Verdict {
    pub fn is_moving(&self) -> bool {
        matches!(self, Verdict::Moving)
    }
}

/// Outcome of feeding one sample to the classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// Sample ignored; classifier state unchanged
    Skipped(SkipReason),
    /// First sample, stored as the reference point
    Baseline,
    /// Processed but not yet conclusive
    Pending { delta: f64, counter: u32 },
    /// Conclusive verdict
    Verdict { verdict: Verdict, delta: f64 },
}

impl Classification {
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Classification::Verdict { verdict, .. } => Some(*verdict),
            _ => None,
        }
    }
}

/// Stateful movement classifier
#[derive(Debug, Clone)]
pub struct MovementClassifier {
    config: MotionConfig,
    previous: Option<AccelerationSample>,
    counter: u32,
    quiet_samples: u32,
}

impl MovementClassifier {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            previous: None,
            counter: 0,
            quiet_samples: 0,
        }
    }

    /// Feed one sample and classify it
    pub fn classify(&mut self, sample: AccelerationSample) -> Classification {
        if let Some(reason) = self.skip_reason(&sample) {
            trace!("Skipping sample at {}ms: {:?}", sample.timestamp_ms, reason);
            return Classification::Skipped(reason);
        }

        let Some(previous) = self.previous.replace(sample) else {
            return Classification::Baseline;
        };

        let delta = sample.l1_distance(&previous);
        let confirm = self.config.consecutive_samples_to_confirm;

        if delta > self.config.delta_threshold {
            self.counter = self.counter.saturating_add(1).min(confirm.saturating_add(1));
            self.quiet_samples = 0;
        } else {
            self.counter = self.counter.saturating_sub(1);
            if self.counter == 0 {
                self.quiet_samples = self.quiet_samples.saturating_add(1);
            }
        }

        if self.counter > confirm {
            self.counter = 0;
            return Classification::Verdict {
                verdict: Verdict::Moving,
                delta,
            };
        }

        if self.counter == 0 && self.quiet_samples >= self.config.still_samples_to_confirm {
            return Classification::Verdict {
                verdict: Verdict::Still,
                delta,
            };
        }

        Classification::Pending {
            delta,
            counter: self.counter,
        }
    }

    fn skip_reason(&self, sample: &AccelerationSample) -> Option<SkipReason> {
        if !sample.is_finite() {
            return Some(SkipReason::NonFinite);
        }

        if let Some(previous) = &self.previous {
            if sample.timestamp_ms <= previous.timestamp_ms {
                return Some(SkipReason::OutOfOrder);
            }
            if sample.timestamp_ms - previous.timestamp_ms < self.config.sample_interval_ms {
                return Some(SkipReason::TooSoon);
            }
        }

        match self.config.noise_floor {
            Some(floor) if sample.max_axis_magnitude() < floor => {
                Some(SkipReason::BelowNoiseFloor)
            }
            _ => None,
        }
    }

    /// Current confirmation counter
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Last processed sample
    pub fn previous(&self) -> Option<&AccelerationSample> {
        self.previous.as_ref()
    }

    /// Forget the baseline and counters
    pub fn reset(&mut self) {
        self.previous = None;
        self.counter = 0;
        self.quiet_samples = 0;
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}
