//! Reduced driving-point model types.

use chronos_network::PinId;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A three-element π driving-point model as seen by a driver: `c2` at the
/// driver, `rpi` to an internal node, `c1` beyond it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PiModel {
    /// Near capacitance, farads.
    pub c2: f32,
    /// π resistance, ohms.
    pub rpi: f32,
    /// Far capacitance, farads.
    pub c1: f32,
}

impl PiModel {
    /// Creates a π model from its three elements.
    pub fn new(c2: f32, rpi: f32, c1: f32) -> Self {
        Self { c2, rpi, c1 }
    }

    /// Total capacitance seen by the driver.
    pub fn capacitance(&self) -> f32 {
        self.c1 + self.c2
    }
}

/// A π model plus a scalar Elmore delay per load pin.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PiElmore {
    /// The driving-point π.
    pub pi: PiModel,
    loads: HashMap<PinId, f32>,
}

impl PiElmore {
    /// Creates a π-Elmore with no load entries yet.
    pub fn new(pi: PiModel) -> Self {
        Self {
            pi,
            loads: HashMap::new(),
        }
    }

    /// Records the Elmore delay to `load_pin`.
    pub fn set_elmore(&mut self, load_pin: PinId, elmore: f32) {
        self.loads.insert(load_pin, elmore);
    }

    /// The Elmore delay to `load_pin`, if recorded.
    pub fn elmore(&self, load_pin: PinId) -> Option<f32> {
        self.loads.get(&load_pin).copied()
    }

    /// Number of load entries.
    pub fn load_count(&self) -> usize {
        self.loads.len()
    }
}

/// The pole/residue pair sequences for one load pin. Both sequences have
/// the same length (one or two entries from the reducer).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoleResidue {
    /// Poles, radians/second.
    pub poles: Vec<Complex32>,
    /// Residues, dimensionless.
    pub residues: Vec<Complex32>,
}

impl PoleResidue {
    /// Number of pole/residue pairs.
    pub fn count(&self) -> usize {
        self.poles.len()
    }

    /// The `index`th pole/residue pair.
    pub fn pair(&self, index: usize) -> (Complex32, Complex32) {
        (self.poles[index], self.residues[index])
    }
}

/// A π model plus per-load pole/residue sequences.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PiPoleResidue {
    /// The driving-point π.
    pub pi: PiModel,
    loads: HashMap<PinId, PoleResidue>,
}

impl PiPoleResidue {
    /// Creates a π-pole-residue with no load entries yet.
    pub fn new(pi: PiModel) -> Self {
        Self {
            pi,
            loads: HashMap::new(),
        }
    }

    /// Records the pole/residue pairs for `load_pin`.
    pub fn set_pole_residue(&mut self, load_pin: PinId, pr: PoleResidue) {
        self.loads.insert(load_pin, pr);
    }

    /// The pole/residue pairs for `load_pin`, if recorded.
    pub fn pole_residue(&self, load_pin: PinId) -> Option<&PoleResidue> {
        self.loads.get(&load_pin)
    }
}

/// A reduced driving-point parasitic: either reduction shares the π
/// substructure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Reduced {
    /// π with per-load Elmore delays.
    PiElmore(PiElmore),
    /// π with per-load pole/residue pairs.
    PiPoleResidue(PiPoleResidue),
}

impl Reduced {
    /// The shared π substructure.
    pub fn pi(&self) -> &PiModel {
        match self {
            Reduced::PiElmore(p) => &p.pi,
            Reduced::PiPoleResidue(p) => &p.pi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_model_roundtrip() {
        let pi = PiModel::new(2e-13, 150.0, 8e-13);
        assert_eq!(pi.c2, 2e-13);
        assert_eq!(pi.rpi, 150.0);
        assert_eq!(pi.c1, 8e-13);
        assert!((pi.capacitance() - 1e-12).abs() < 1e-20);
    }

    #[test]
    fn elmore_exists_flag() {
        let mut pe = PiElmore::new(PiModel::default());
        let load = PinId::from_raw(3);
        assert!(pe.elmore(load).is_none());
        pe.set_elmore(load, 1e-9);
        assert_eq!(pe.elmore(load), Some(1e-9));
        assert_eq!(pe.load_count(), 1);
    }

    #[test]
    fn pole_residue_pairs() {
        let pr = PoleResidue {
            poles: vec![Complex32::new(1e9, 0.0)],
            residues: vec![Complex32::new(1.0, 0.0)],
        };
        assert_eq!(pr.count(), 1);
        let (p, k) = pr.pair(0);
        assert_eq!(p.re, 1e9);
        assert_eq!(k.re, 1.0);
    }

    #[test]
    fn reduced_shares_pi() {
        let pi = PiModel::new(1e-13, 50.0, 2e-13);
        let r1 = Reduced::PiElmore(PiElmore::new(pi));
        let r2 = Reduced::PiPoleResidue(PiPoleResidue::new(pi));
        assert_eq!(*r1.pi(), pi);
        assert_eq!(*r2.pi(), pi);
    }

    #[test]
    fn serde_roundtrip() {
        let mut pe = PiElmore::new(PiModel::new(1e-13, 10.0, 3e-13));
        pe.set_elmore(PinId::from_raw(1), 2.5e-10);
        let json = serde_json::to_string(&Reduced::PiElmore(pe)).unwrap();
        let back: Reduced = serde_json::from_str(&json).unwrap();
        match back {
            Reduced::PiElmore(pe) => {
                assert_eq!(pe.elmore(PinId::from_raw(1)), Some(2.5e-10));
            }
            _ => panic!("wrong variant"),
        }
    }
}
