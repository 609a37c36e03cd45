//! Single-driver sealed-box system: one driver bound to one box volume.
//!
//! `System` is the numeric front end over [`crate::thiele_small`],
//! [`crate::sealed_box`] and [`crate::filters`]: every method plugs the bound
//! parameters into the closed-form formulas and returns plain `f64`s.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use log::debug;

use crate::error::ConfigError;
use crate::filters::{self, FilterChain, Sos, REFERENCE_NYQUIST};
use crate::sealed_box::{self, round_significant};
use crate::thiele_small::DriverParams;

/// Sample rate used for filter design when the caller has no preference.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
/// Significant digits for excursion-limited frequency solves.
pub const DEFAULT_SOLVE_DIGITS: u32 = 10;
/// Lowest frequency every datasheet Linkwitz check reports headroom at.
pub const DEFAULT_TEST_HZ: f64 = 20.0;

/// The ten numbers that define a system, in datasheet units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemConfig {
    /// Diaphragm area (cm²).
    pub sd: f64,
    /// Free-air resonance (Hz).
    pub fs: f64,
    pub qts: f64,
    pub qes: f64,
    pub qms: f64,
    /// DC resistance (ohm).
    pub re: f64,
    /// Voice-coil inductance (mH).
    pub le: f64,
    /// Equivalent compliance volume (l).
    pub vas: f64,
    /// Peak linear excursion (mm).
    pub xmax: f64,
    /// Net box volume (l).
    pub vc: f64,
}

impl SystemConfig {
    fn named_values(&self) -> [(&'static str, f64); 10] {
        [
            ("sD", self.sd),
            ("fs", self.fs),
            ("Qts", self.qts),
            ("Qes", self.qes),
            ("Qms", self.qms),
            ("Re", self.re),
            ("Le", self.le),
            ("Vas", self.vas),
            ("Xmax", self.xmax),
            ("Vc", self.vc),
        ]
    }

    /// Check that every value is finite and positive, and that Qts sits
    /// below both Qes and Qms.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.named_values() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.qts >= self.qes.min(self.qms) {
            return Err(ConfigError::QtsOutOfRange {
                qts: self.qts,
                qes: self.qes,
                qms: self.qms,
            });
        }
        Ok(())
    }

    pub fn driver(&self) -> DriverParams {
        DriverParams {
            sd: self.sd,
            fs: self.fs,
            qts: self.qts,
            qes: self.qes,
            qms: self.qms,
            re: self.re,
            le: self.le,
            vas: self.vas,
            xmax: self.xmax,
        }
    }
}

/// Immutable driver + sealed box pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct System {
    config: SystemConfig,
    driver: DriverParams,
}

impl System {
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let system = Self {
            config,
            driver: config.driver(),
        };
        debug!(
            "system: fc = {:.2} Hz, Qtc = {:.3}, f3 = {:.2} Hz",
            system.fc(),
            system.qtc(),
            system.f3()
        );
        Ok(system)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn driver(&self) -> &DriverParams {
        &self.driver
    }

    pub fn f3(&self) -> f64 {
        sealed_box::f3(&self.driver, self.config.vc)
    }

    pub fn fc(&self) -> f64 {
        sealed_box::fc(&self.driver, self.config.vc)
    }

    pub fn qtc(&self) -> f64 {
        sealed_box::qtc(&self.driver, self.config.vc)
    }

    /// Linkwitz transform from this system's (f3, Qtc) to (target_hz, target_q).
    pub fn linkwitz_transform(&self, target_hz: f64, target_q: f64, sample_rate: f64) -> Sos {
        Sos::linkwitz_transform(self.f3(), self.qtc(), target_hz, target_q, sample_rate)
    }

    /// Low-frequency response of the box as a 2nd-order highpass at
    /// (f3, Qtc), optionally followed by `transform`.
    ///
    /// Evaluate with [`FilterChain::response_db`].
    pub fn response_curve(&self, transform: Option<&Sos>, sample_rate: f64) -> FilterChain {
        let mut sections = vec![Sos::highpass(self.f3(), self.qtc(), sample_rate)];
        sections.extend(transform.copied());
        FilterChain::new(sections, sample_rate)
    }

    /// [`Self::response_curve`] in dB at `hz`.
    pub fn response_at(&self, hz: f64, transform: Option<&Sos>, sample_rate: f64) -> f64 {
        self.response_curve(transform, sample_rate).response_db(hz)
    }

    /// Excursion-limited SPL (dB) at `hz` with no equalisation.
    pub fn excursion_limited_spl(&self, hz: f64) -> f64 {
        sealed_box::xspl(&self.driver, hz)
    }

    /// Lowest frequency reaching `target_db` within Xmax. `None` when the
    /// target cannot be reached anywhere in the modelled band.
    pub fn excursion_limited_frequency(&self, target_db: f64, digits: u32) -> Option<f64> {
        sealed_box::excursion_limited_frequency(&self.driver, target_db, digits)
    }

    /// Safe SPL at `hz` once `transform` is applied: every dB of boost is a
    /// dB less headroom before the cone hits Xmax.
    pub fn excursion_limited_spl_with_transform(&self, transform: &Sos, hz: f64) -> f64 {
        let base = self.excursion_limited_spl(hz);
        let boost = filters::freqz_db(std::slice::from_ref(transform), hz / REFERENCE_NYQUIST);
        debug!("at {hz} Hz: Xspl {base:.2} dB, transform {boost:+.2} dB");
        base - boost
    }

    /// Render the full datasheet.
    pub fn write_datasheet<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        let c = &self.config;
        let d = &self.driver;

        writeln!(w, "---- T/S -------")?;
        writeln!(w, "sD  {} cm2", c.sd)?;
        writeln!(w, "fs  {} Hz", c.fs)?;
        writeln!(w, "Qes {}", c.qes)?;
        writeln!(w, "Qms {}", c.qms)?;
        writeln!(w, "Qts {}", c.qts)?;
        writeln!(w, "Vas {} l", c.vas)?;
        writeln!(w, "Re  {} ohm", c.re)?;
        writeln!(w, "Le  {} mH", c.le)?;
        writeln!(w, "Xmx {} mm", c.xmax)?;
        writeln!(w)?;

        writeln!(w, "---- Box -------")?;
        writeln!(w, "Sealed")?;
        writeln!(w, "Vc  {} l", c.vc)?;
        writeln!(w)?;

        writeln!(w, "---- Derived ---")?;
        writeln!(w, "Cms {} mm/N", sig(d.cms() * 1e3, 4))?;
        writeln!(w, "Rms {} Ns/m", sig(d.rms(), 4))?;
        writeln!(w, "Mmd {} g", sig(d.mmd() * 1e3, 4))?;
        writeln!(w, "Bl  {} Tm", sig(d.bl(), 4))?;
        writeln!(w)?;

        writeln!(w, "---- System ----")?;
        writeln!(w, "f3  {} Hz", sig(self.f3(), 3))?;
        writeln!(w, "fc  {} Hz", sig(self.fc(), 3))?;
        writeln!(w, "Qtc {}", sig(self.qtc(), 3))?;
        for (label, spl) in [("fX7", 70.0), ("fX8", 80.0), ("fX9", 90.0)] {
            let f = match self.excursion_limited_frequency(spl, 3) {
                Some(f) => sig(f, 3),
                None => "(none)".to_string(),
            };
            writeln!(w, "{label} {f} Hz @ {spl}dBSPL")?;
        }
        writeln!(w)?;

        writeln!(w, "---- Linkwitz --")?;
        for check in linkwitz_checks(c.fs) {
            writeln!(w, "{}", check.title)?;
            let lt = self.linkwitz_transform(check.target_hz, check.target_q, DEFAULT_SAMPLE_RATE);
            for (hz, label) in &check.test_points {
                let spl = self.excursion_limited_spl_with_transform(&lt, *hz);
                writeln!(w, "SPL {} dBSPL @ {label}", sig(spl, 3))?;
            }
        }
        Ok(())
    }

    pub fn datasheet(&self) -> String {
        self.to_string()
    }

    pub fn print_datasheet(&self) {
        print!("{self}");
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_datasheet(f)
    }
}

/// One Linkwitz target in the datasheet and the frequencies it is checked at.
struct LinkwitzCheck {
    title: String,
    target_hz: f64,
    target_q: f64,
    test_points: Vec<(f64, String)>,
}

fn linkwitz_checks(fs: f64) -> Vec<LinkwitzCheck> {
    let at = |hz: &[f64]| hz.iter().map(|&f| (f, format!("{f}Hz"))).collect::<Vec<_>>();
    let mut fs_points = at(&[DEFAULT_TEST_HZ, 33.0, 55.0]);
    fs_points.push((fs, "fs".to_string()));

    vec![
        LinkwitzCheck {
            title: "Butterworth, 18Hz".to_string(),
            target_hz: 18.0,
            target_q: FRAC_1_SQRT_2,
            test_points: at(&[DEFAULT_TEST_HZ]),
        },
        LinkwitzCheck {
            title: "Butterworth, 33Hz".to_string(),
            target_hz: 33.0,
            target_q: FRAC_1_SQRT_2,
            test_points: at(&[DEFAULT_TEST_HZ, 33.0]),
        },
        LinkwitzCheck {
            title: "Q = 0.5, 55Hz".to_string(),
            target_hz: 55.0,
            target_q: 0.5,
            test_points: at(&[DEFAULT_TEST_HZ, 33.0, 55.0]),
        },
        LinkwitzCheck {
            title: "Butterworth, fs".to_string(),
            target_hz: fs,
            target_q: FRAC_1_SQRT_2,
            test_points: fs_points,
        },
    ]
}

/// `x` rounded to `digits` significant digits, without trailing noise.
pub fn sig(x: f64, digits: u32) -> String {
    if !x.is_finite() || x == 0.0 {
        return format!("{x}");
    }
    let rounded = round_significant(x, digits);
    let magnitude = rounded.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    format!("{rounded:.decimals$}")
}
