//! Thiele/Small driver parameters and the mechanical quantities derived from them.
//!
//! Units follow manufacturer datasheets: sD in cm², Vas in litres, Le in mH,
//! Xmax in mm. Derived values come out in SI (m/N, kg, Ns/m, Tm).

use std::f64::consts::PI;

/// Adiabatic bulk modulus of air, scaled for sD in cm² and Vas in litres.
const AIR_BULK_MODULUS: f64 = 1.42;
/// Air density (kg/m³) used for the radiation air-load mass.
const AIR_DENSITY: f64 = 1.225e-3;
/// Air-load factor for a piston mounted in a box (both sides).
const AIR_LOAD_FACTOR: f64 = 2.67;

/// Small-signal parameters of one driver, as printed on its datasheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverParams {
    /// Effective diaphragm area (cm²).
    pub sd: f64,
    /// Free-air resonance (Hz).
    pub fs: f64,
    /// Total Q at fs.
    pub qts: f64,
    /// Electrical Q at fs.
    pub qes: f64,
    /// Mechanical Q at fs.
    pub qms: f64,
    /// Voice-coil DC resistance (ohm).
    pub re: f64,
    /// Voice-coil inductance (mH).
    pub le: f64,
    /// Equivalent compliance volume (l).
    pub vas: f64,
    /// Peak linear one-way excursion (mm).
    pub xmax: f64,
}

/// Total Q from its electrical and mechanical parts: Qes·Qms / (Qes + Qms).
pub fn qts_from(qes: f64, qms: f64) -> f64 {
    qes * qms / (qes + qms)
}

impl DriverParams {
    /// Mechanical compliance Cms (m/N).
    pub fn cms(&self) -> f64 {
        self.vas / (AIR_BULK_MODULUS * self.sd * self.sd)
    }

    /// Total moving mass Mms including air load (kg).
    pub fn mms(&self) -> f64 {
        let ws = 2.0 * PI * self.fs;
        1.0 / (ws * ws * self.cms())
    }

    /// Mechanical resistance Rms (Ns/m).
    pub fn rms(&self) -> f64 {
        (self.mms() / self.cms()).sqrt() / self.qms
    }

    /// Force factor Bl (Tm).
    pub fn bl(&self) -> f64 {
        (2.0 * PI * self.fs * self.mms() * self.re / self.qes).sqrt()
    }

    /// Diaphragm-only moving mass Mmd: Mms minus the radiation air load (kg).
    pub fn mmd(&self) -> f64 {
        let radius_term = (1e-2 * self.sd).sqrt() / PI;
        self.mms() - AIR_LOAD_FACTOR * radius_term.powi(3) * AIR_DENSITY
    }

    /// Qts recomputed from Qes and Qms, for cross-checking datasheet figures.
    pub fn qts_derived(&self) -> f64 {
        qts_from(self.qes, self.qms)
    }

    /// Peak linear displaced volume Vd = sD·π/4·Xmax (m³).
    pub fn vd(&self) -> f64 {
        self.sd * PI / 4.0 * self.xmax * 1e-7
    }
}
