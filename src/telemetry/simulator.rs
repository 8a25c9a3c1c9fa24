//! Synthetic voltage/current model.
//!
//! Readings sit at their nominal values. On rare calls one of them drops below
//! nominal, then climbs back by a fixed increment per call and snaps to nominal
//! once it is within one increment.

use log::debug;
use rand::Rng;

use super::joints::{joint_angle, joint_names};
use super::types::{JointAngles, TelemetrySnapshot};
use crate::config::SimulationConfig;

/// Nominal battery voltage (V).
pub const VOLTAGE: f64 = 6.1;
/// Nominal current draw (A).
pub const CURRENT: f64 = 3.0;

/// Below this distance from nominal a reading is considered settled.
pub const EPS: f64 = 0.01;
/// Recovery step applied per call.
pub const INCR: f64 = 0.1;

/// Chance per call that a jump happens at all.
pub const PERTURBATION_PROBABILITY: f64 = 0.01;
/// Largest voltage drop a jump can cause.
pub const MAX_VOLTAGE_DROP: f64 = 0.5;
/// Largest current drop a jump can cause.
pub const MAX_CURRENT_DROP: f64 = 1.0;

/// Outcome of the random draw made at the start of every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perturbation {
    None,
    /// Voltage was reset to this value.
    Voltage(f64),
    /// Current was reset to this value.
    Current(f64),
}

/// The two readings carried from one request to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub volts: f64,
    pub amps: f64,
}

impl SimulationState {
    pub fn nominal() -> Self {
        Self { volts: VOLTAGE, amps: CURRENT }
    }

    /// Roll for a jump. At most one reading changes.
    pub fn perturb<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Perturbation {
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll >= PERTURBATION_PROBABILITY {
            return Perturbation::None;
        }

        let target: f64 = rng.gen_range(0.0..1.0);
        let depth: f64 = rng.gen_range(0.0..1.0);
        if target < 0.5 {
            self.volts = VOLTAGE - depth * MAX_VOLTAGE_DROP;
            Perturbation::Voltage(self.volts)
        } else {
            self.amps = CURRENT - depth * MAX_CURRENT_DROP;
            Perturbation::Current(self.amps)
        }
    }

    /// Move both readings one step back toward nominal.
    pub fn settle(&mut self) {
        self.volts = approach(self.volts, VOLTAGE);
        self.amps = approach(self.amps, CURRENT);
    }

    /// One request worth of simulation: optional jump, then smoothing.
    pub fn advance<R: Rng + ?Sized>(mut self, rng: &mut R, perturbation: bool) -> (Self, TelemetrySnapshot) {
        if perturbation {
            match self.perturb(rng) {
                Perturbation::None => {}
                Perturbation::Voltage(volts) => debug!("Voltage dropped to {:.3} V", volts),
                Perturbation::Current(amps) => debug!("Current dropped to {:.3} A", amps),
            }
        }
        self.settle();

        let snapshot = TelemetrySnapshot {
            joints: joint_angles(),
            voltage: self.volts,
            current: self.amps,
        };
        (self, snapshot)
    }
}

/// Single smoothing step. Only values more than one increment below nominal
/// climb; everything else (including values above nominal) snaps.
fn approach(value: f64, nominal: f64) -> f64 {
    let diff = nominal - value;
    if diff.abs() > EPS && value + INCR < nominal { value + INCR } else { nominal }
}

/// Current joint angles for every joint, in wire order.
pub fn joint_angles() -> JointAngles {
    joint_names().iter().map(|name| (name.clone(), joint_angle(name))).collect()
}

/// Per-connection simulator: owns the carried state and its random source.
pub struct TelemetrySimulator<R> {
    state: SimulationState,
    rng: R,
    config: SimulationConfig,
}

impl<R: Rng> TelemetrySimulator<R> {
    pub fn new(rng: R, config: SimulationConfig) -> Self {
        Self {
            state: SimulationState::nominal(),
            rng,
            config,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Overwrite the carried readings, e.g. to replay a known deviation.
    #[cfg(test)]
    pub fn set_state(&mut self, state: SimulationState) {
        self.state = state;
    }

    /// Produce the next snapshot and carry the updated state forward.
    pub fn next_snapshot(&mut self) -> TelemetrySnapshot {
        let (state, snapshot) = self.state.advance(&mut self.rng, self.config.perturbation);
        self.state = state;
        snapshot
    }
}
