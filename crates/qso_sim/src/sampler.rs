//! Measurement samplers
//!
//! Gantree: L1_Engine → Sampler
//!
//! One sampler is built per setup and shared by reference with every
//! measurement, so outcomes across qubits come from a single seeded stream.

use qso_core::{QsoError, QsoResult};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Outcome of sampling one measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementOutcome {
    /// State the qubit is projected onto
    pub projected: u8,
    /// Value reported to the classical bit (after readout error)
    pub declared: u8,
    /// Probability of the projection
    pub probability: f64,
}

/// Source of measurement outcomes
/// Gantree: MeasurementSampler // trait
pub trait MeasurementSampler: fmt::Debug + Send {
    /// Sample given the (unnormalised) probabilities of |0> and |1>
    fn sample(&mut self, p0: f64, p1: f64) -> MeasurementOutcome;
}

/// Sampler shared between a setup and all of its measurements
pub type SharedSampler = Arc<Mutex<dyn MeasurementSampler>>;

/// Wrap a sampler for sharing
pub fn share<S: MeasurementSampler + 'static>(sampler: S) -> SharedSampler {
    Arc::new(Mutex::new(sampler))
}

/// Projective sampler with symmetric readout error
/// Gantree: UniformNoisySampler // 균일 노이즈 샘플러
#[derive(Debug)]
pub struct UniformNoisySampler {
    rng: StdRng,
    readout_error: f64,
}

impl UniformNoisySampler {
    /// Create a seeded sampler
    pub fn new(seed: u64, readout_error: f64) -> QsoResult<Self> {
        if !(0.0..=1.0).contains(&readout_error) {
            return Err(QsoError::ConfigurationError(format!(
                "readout error {} outside [0, 1]",
                readout_error
            )));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            readout_error,
        })
    }

    /// Readout error
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }
}

impl MeasurementSampler for UniformNoisySampler {
    fn sample(&mut self, p0: f64, p1: f64) -> MeasurementOutcome {
        let total = p0 + p1;
        let p0 = if total > 0.0 { p0 / total } else { 0.5 };

        let (projected, probability) = if self.rng.gen::<f64>() < p0 {
            (0, p0)
        } else {
            (1, 1.0 - p0)
        };

        let declared = if self.rng.gen::<f64>() < self.readout_error {
            projected ^ 1
        } else {
            projected
        };

        MeasurementOutcome {
            projected,
            declared,
            probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_readout_error() {
        assert!(UniformNoisySampler::new(1, 1.5).is_err());
        assert!(UniformNoisySampler::new(1, -0.1).is_err());
    }

    #[test]
    fn test_deterministic_projection() {
        let mut sampler = UniformNoisySampler::new(7, 0.0).unwrap();
        for _ in 0..50 {
            let out = sampler.sample(1.0, 0.0);
            assert_eq!(out.projected, 0);
            assert_eq!(out.declared, 0);
            assert_relative_eq!(out.probability, 1.0);
        }
    }

    #[test]
    fn test_full_readout_error_flips() {
        let mut sampler = UniformNoisySampler::new(7, 1.0).unwrap();
        let out = sampler.sample(0.0, 2.0);
        assert_eq!(out.projected, 1);
        assert_eq!(out.declared, 0);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = UniformNoisySampler::new(42, 0.1).unwrap();
        let mut b = UniformNoisySampler::new(42, 0.1).unwrap();
        for _ in 0..20 {
            assert_eq!(a.sample(0.5, 0.5), b.sample(0.5, 0.5));
        }
    }

    #[test]
    fn test_shared_handle() {
        let shared = share(UniformNoisySampler::new(3, 0.0).unwrap());
        let other = Arc::clone(&shared);
        let out = other.lock().unwrap().sample(0.0, 1.0);
        assert_eq!(out.projected, 1);
        assert_eq!(Arc::strong_count(&shared), 2);
    }
}
