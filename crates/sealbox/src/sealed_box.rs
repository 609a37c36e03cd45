//! Sealed (closed) enclosure alignment and excursion limits.
//!
//! The box air spring stiffens the driver suspension by a factor of
//! (1 + Vas/Vc), which raises both resonance and Q by its square root:
//!   Qtc = Qts * sqrt(1 + Vas/Vc)
//!   fc  = fs  * sqrt(1 + Vas/Vc)
//! The resulting system is a 2nd-order highpass with corner fc and Q Qtc.

use std::f64::consts::{LN_10, PI};

use log::{debug, warn};

use crate::thiele_small::DriverParams;

/// Air density over speed of sound (kg/m³ / m/s).
pub const RHO_OVER_C: f64 = 1.18 / 345.0;
/// Reference offset of the excursion-limited SPL curve (dB).
const XSPL_REFERENCE_DB: f64 = 112.0;
/// Upper edge of the band the excursion model is solved over.
pub const MAX_MODELED_HZ: f64 = 20_000.0;
/// Significant decimal digits beyond which rounding an f64 is a no-op.
const F64_MAX_DIGITS: u32 = 17;

fn compliance_ratio(driver: &DriverParams, vc: f64) -> f64 {
    (1.0 + driver.vas / vc).sqrt()
}

/// System Q of the driver in a sealed box of net volume `vc` litres.
pub fn qtc(driver: &DriverParams, vc: f64) -> f64 {
    driver.qts * compliance_ratio(driver, vc)
}

/// System resonance (Hz) of the driver in a sealed box of `vc` litres.
pub fn fc(driver: &DriverParams, vc: f64) -> f64 {
    driver.fs * compliance_ratio(driver, vc)
}

/// -3 dB frequency of a 2nd-order highpass with corner `fc` and quality `q`.
pub fn f3_of(fc: f64, q: f64) -> f64 {
    let k = q.powi(-2) - 2.0;
    fc * ((k + (k * k + 4.0).sqrt()) / 2.0).sqrt()
}

/// -3 dB frequency (Hz) of the driver in a sealed box of `vc` litres.
pub fn f3(driver: &DriverParams, vc: f64) -> f64 {
    let f = f3_of(fc(driver, vc), qtc(driver, vc));
    if !f.is_finite() {
        warn!("f3 is not finite for Vc = {vc} l ({f})");
    }
    f
}

/// Upper rolloff frequency set by voice-coil inductance against the
/// moving system.
pub fn hf_f3(driver: &DriverParams) -> f64 {
    let bl = driver.bl();
    let compliance = 1.0 / (bl * bl / driver.le + 1.0 / driver.cms());
    1.0 / (driver.mmd() * compliance).sqrt()
}

/// Q associated with [`hf_f3`].
pub fn hf_q(driver: &DriverParams) -> f64 {
    1.0 / ((1.0 / driver.rms() + 1.0 / driver.re) * hf_f3(driver))
}

/// Maximum SPL (dB) at `hz` before the diaphragm exceeds Xmax.
///
/// Xspl = 112 + 10*log10(4*pi^3 * rho/c * Vd^2 * f^4)
pub fn xspl(driver: &DriverParams, hz: f64) -> f64 {
    let vd = driver.vd();
    XSPL_REFERENCE_DB + 10.0 * (4.0 * PI.powi(3) * RHO_OVER_C * vd * vd * hz.powi(4)).log10()
}

/// Lowest frequency at which the driver can reach `target_db` without
/// exceeding Xmax, rounded to `digits` significant digits.
///
/// Xspl grows by 40 dB/decade, so the curve is inverted directly:
///   f^4 = 10^((target - 112)/10) / (4*pi^3 * rho/c * Vd^2)
/// Returns `None` when the non-negative root falls outside
/// [0, MAX_MODELED_HZ] or the driver has no displacement to work with.
pub fn excursion_limited_frequency(
    driver: &DriverParams,
    target_db: f64,
    digits: u32,
) -> Option<f64> {
    let vd = driver.vd();
    let k = 4.0 * PI.powi(3) * RHO_OVER_C * vd * vd;
    let f4 = ((target_db - XSPL_REFERENCE_DB) * LN_10 / 10.0).exp() / k;
    let f = f4.sqrt().sqrt();

    if !f.is_finite() || f < 0.0 || f > MAX_MODELED_HZ {
        debug!("no excursion-limited solution for {target_db} dBSPL (f = {f})");
        return None;
    }
    let rounded = round_significant(f, digits);
    debug!("excursion-limited frequency for {target_db} dBSPL: {rounded} Hz");
    Some(rounded)
}

/// Round `x` to `digits` significant digits. Zero and non-finite values
/// pass through unchanged.
/// Requests beyond f64 precision (17 digits or more) also return `x`.
pub fn round_significant(x: f64, digits: u32) -> f64 {
    if x == 0.0 || !x.is_finite() || digits == 0 || digits >= F64_MAX_DIGITS {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits as i32 - 1 - magnitude);
    let scaled = x * scale;
    if !scale.is_finite() || scale == 0.0 || !scaled.is_finite() {
        return x;
    }
    scaled.round() / scale
}
