/// Second-order-section design and frequency response.
///
/// Every section is `[b0, b1, b2, a0, a1, a2]` with `a0` normalised to 1.
/// Constructors: `highpass`, `lowpass`, `linkwitz_transform`.
/// Cascades are plain slices; their responses multiply.

use std::f64::consts::PI;
use std::fmt::Write;
use std::ops::Range;

use num_complex::Complex64;

use crate::hexfloat;

/// Nyquist frequency the transform-gain helpers normalise against.
pub const REFERENCE_NYQUIST: f64 = 24_000.0;
/// Frequency grid (Hz) scanned by [`approx_gain`] by default.
pub const DEFAULT_GAIN_DOMAIN: Range<u32> = 20..20_000;
/// Coefficients exported by [`to_filter_string`]: z0 z1 z2 p1 p2.
pub const DEFAULT_EXPORT_INDICES: [usize; 5] = [0, 1, 2, 4, 5];

/// One biquad section: numerator `b`, denominator `a`, `a[0] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sos {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Sos {
    /// Build from raw coefficients, dividing everything by `a0`.
    pub fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b: [b0 / a0, b1 / a0, b2 / a0],
            a: [1.0, a1 / a0, a2 / a0],
        }
    }

    /// Low-pass filter (Audio EQ Cookbook).
    pub fn lowpass(cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// High-pass filter (Audio EQ Cookbook).
    pub fn highpass(cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b1 = -(1.0 + cos_w0);
        let b0 = -b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Linkwitz transform: cancel the (f0, q0) pole pair and replace it with
    /// one at (f1, q1).
    ///
    /// Bilinear mapping with gain constant gn = 2*sr (no prewarp), so the
    /// DC gain is (f0/f1)^2.
    pub fn linkwitz_transform(f0: f64, q0: f64, f1: f64, q1: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * f0;
        let w1 = 2.0 * PI * f1;
        let gn = 2.0 * sample_rate;

        let b0 = w0 * w0 + gn * w0 / q0 + gn * gn;
        let b1 = 2.0 * (w0 * w0 - gn * gn);
        let b2 = w0 * w0 - gn * w0 / q0 + gn * gn;

        let a0 = w1 * w1 + gn * w1 / q1 + gn * gn;
        let a1 = 2.0 * (w1 * w1 - gn * gn);
        let a2 = w1 * w1 - gn * w1 / q1 + gn * gn;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Coefficients in export order `[z0, z1, z2, p0, p1, p2]`.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.b[0], self.b[1], self.b[2], self.a[0], self.a[1], self.a[2]]
    }

    /// Complex response at normalised frequency `j` (1.0 = Nyquist).
    pub fn response(&self, j: f64) -> Complex64 {
        let mut num = Complex64::new(0.0, 0.0);
        let mut den = Complex64::new(0.0, 0.0);
        for k in 0..3 {
            let e = Complex64::from_polar(1.0, -((k + 1) as f64) * PI * j);
            num += self.b[k] * e;
            den += self.a[k] * e;
        }
        num / den
    }
}

/// Complex response of a cascade at normalised frequency `j`
/// (typically hz / nyquist).
pub fn freqz(cascade: &[Sos], j: f64) -> Complex64 {
    cascade
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(j))
}

/// Magnitude of [`freqz`] in dB.
pub fn freqz_db(cascade: &[Sos], j: f64) -> f64 {
    20.0 * freqz(cascade, j).norm().log10()
}

/// Peak linear magnitude of a cascade over integer-Hz `domain`,
/// normalised against [`REFERENCE_NYQUIST`]. `None` for an empty domain.
pub fn approx_gain(cascade: &[Sos], domain: Range<u32>) -> Option<f64> {
    domain
        .map(|hz| freqz(cascade, hz as f64 / REFERENCE_NYQUIST).norm())
        .max_by(f64::total_cmp)
}

/// Single-line export: `[label ]c[i0] c[i1] ... gain`, coefficients as hex
/// floats so the receiving tool gets them bit-exact.
pub fn to_filter_string(
    coefficients: &[f64; 6],
    gain: f64,
    label: Option<&str>,
    indices: &[usize],
) -> String {
    let mut s = String::new();
    if let Some(label) = label {
        s.push_str(label);
        s.push(' ');
    }
    for &i in indices {
        s.push_str(&hexfloat::format(coefficients[i]));
        s.push(' ');
    }
    let _ = write!(s, "{gain:?}");
    s
}

/// Ordered cascade of sections at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub sections: Vec<Sos>,
    pub sample_rate: f64,
}

impl FilterChain {
    pub fn new(sections: Vec<Sos>, sample_rate: f64) -> Self {
        Self { sections, sample_rate }
    }

    /// Complex response at `hz`.
    pub fn response(&self, hz: f64) -> Complex64 {
        freqz(&self.sections, hz / (self.sample_rate / 2.0))
    }

    /// Magnitude response at `hz` in dB.
    pub fn response_db(&self, hz: f64) -> f64 {
        freqz_db(&self.sections, hz / (self.sample_rate / 2.0))
    }

    /// One export line per section, all at the same gain.
    pub fn filter_strings(&self, gain: f64, label: Option<&str>) -> Vec<String> {
        self.sections
            .iter()
            .map(|s| to_filter_string(&s.coefficients(), gain, label, &DEFAULT_EXPORT_INDICES))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    const SR: f64 = 48_000.0;

    fn db_at(cascade: &[Sos], hz: f64, sr: f64) -> f64 {
        freqz_db(cascade, hz / (sr / 2.0))
    }

    #[test]
    fn test_hp_lp_share_denominator() {
        let hp = Sos::highpass(80.0, 0.9, SR);
        let lp = Sos::lowpass(80.0, 0.9, SR);
        assert_eq!(hp.a, lp.a);
        assert_eq!(hp.a[0], 1.0);
    }

    #[test]
    fn test_hp_blocks_dc() {
        let hp = Sos::highpass(80.0, 0.9, SR);
        let dc: f64 = hp.b.iter().sum();
        assert!(dc.abs() < 1e-15, "HP numerator at DC: {dc}");
        // Numerator alternates sign: b0 = b2 = -b1/2.
        assert!(hp.b[0] > 0.0 && hp.b[1] < 0.0 && hp.b[2] > 0.0);
    }

    #[test]
    fn test_lp_unity_at_dc() {
        let lp = Sos::lowpass(1000.0, FRAC_1_SQRT_2, SR);
        let gain = freqz(&[lp], 0.0).norm();
        assert!((gain - 1.0).abs() < 1e-12, "LP DC gain: {gain}");
        let nyq = freqz(&[lp], 1.0).norm();
        assert!(nyq < 1e-9, "LP at Nyquist: {nyq}");
    }

    #[test]
    fn test_butterworth_hp_minus_3db_at_cutoff() {
        let hp = Sos::highpass(1000.0, FRAC_1_SQRT_2, SR);
        let db = db_at(&[hp], 1000.0, SR);
        assert!((db + 3.0103).abs() < 0.01, "HP at cutoff: {db:.3} dB");
        let pass = db_at(&[hp], 15_000.0, SR);
        assert!(pass.abs() < 0.1, "HP passband: {pass:.3} dB");
        let stop = db_at(&[hp], 100.0, SR);
        assert!(stop < -35.0, "HP one decade down: {stop:.1} dB");
    }

    #[test]
    fn test_cascade_is_multiplicative() {
        let a = Sos::highpass(60.0, 0.8, SR);
        let b = Sos::linkwitz_transform(60.0, 0.8, 30.0, 0.5, SR);
        for hz in [10.0, 33.0, 100.0, 1000.0, 9000.0] {
            let j = hz / (SR / 2.0);
            let both = freqz(&[a, b], j);
            let product = a.response(j) * b.response(j);
            assert!((both - product).norm() < 1e-12, "mismatch at {hz} Hz");
            let db_sum = freqz_db(&[a], j) + freqz_db(&[b], j);
            assert!((freqz_db(&[a, b], j) - db_sum).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_cascade_is_unity() {
        assert_eq!(freqz(&[], 0.3), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_linkwitz_identity() {
        let lt = Sos::linkwitz_transform(50.0, 0.7, 50.0, 0.7, SR);
        for hz in [5.0, 50.0, 500.0] {
            let db = db_at(&[lt], hz, SR);
            assert!(db.abs() < 1e-9, "identity transform at {hz} Hz: {db}");
        }
    }

    #[test]
    fn test_linkwitz_dc_gain() {
        let lt = Sos::linkwitz_transform(80.0, 0.98, 20.0, FRAC_1_SQRT_2, SR);
        let dc = freqz(&[lt], 0.0).norm();
        assert!((dc - 16.0).abs() < 1e-6, "DC gain should be (80/20)^2: {dc}");
        let high = db_at(&[lt], 10_000.0, SR);
        assert!(high.abs() < 0.1, "LT should be flat up high: {high:.3} dB");
    }

    #[test]
    fn test_linkwitz_flattens_box() {
        // A box at (80 Hz, Q 1) times LT to (40 Hz, Butterworth) behaves like
        // a Butterworth highpass at 40 Hz.
        let sr = 96_000.0;
        let box_hp = Sos::highpass(80.0, 1.0, sr);
        let lt = Sos::linkwitz_transform(80.0, 1.0, 40.0, FRAC_1_SQRT_2, sr);
        let target = Sos::highpass(40.0, FRAC_1_SQRT_2, sr);
        for hz in [20.0, 40.0, 80.0, 200.0] {
            let got = db_at(&[box_hp, lt], hz, sr);
            let want = db_at(&[target], hz, sr);
            assert!((got - want).abs() < 0.1, "{hz} Hz: {got:.2} vs {want:.2} dB");
        }
    }

    #[test]
    fn test_approx_gain() {
        let lt = Sos::linkwitz_transform(80.0, 0.98, 20.0, FRAC_1_SQRT_2, SR);
        let g = approx_gain(&[lt], DEFAULT_GAIN_DOMAIN).unwrap();
        let at_20 = freqz(&[lt], 20.0 / REFERENCE_NYQUIST).norm();
        assert!(g >= at_20, "peak {g} below value at 20 Hz {at_20}");
        assert!(g > 1.0 && g < 16.0, "LT peak gain: {g}");

        let lp = Sos::lowpass(1000.0, FRAC_1_SQRT_2, SR);
        let g = approx_gain(&[lp], DEFAULT_GAIN_DOMAIN).unwrap();
        assert!((g - 1.0).abs() < 1e-3, "Butterworth LP peak: {g}");
    }

    #[test]
    fn test_approx_gain_empty_domain() {
        let lp = Sos::lowpass(1000.0, FRAC_1_SQRT_2, SR);
        assert_eq!(approx_gain(&[lp], 100..100), None);
        #[allow(clippy::reversed_empty_ranges)]
        let backwards = 200..100;
        assert_eq!(approx_gain(&[lp], backwards), None);
        assert_eq!(approx_gain(&[lp], 1000..1001), Some(freqz(&[lp], 1000.0 / REFERENCE_NYQUIST).norm()));
    }

    #[test]
    fn test_filter_string_layout() {
        let coefs = [1.0, -2.0, 1.0, 1.0, 0.5, 0.25];
        let s = to_filter_string(&coefs, 1.0, Some("lt"), &DEFAULT_EXPORT_INDICES);
        assert_eq!(
            s,
            "lt 0x1.0000000000000p+0 -0x1.0000000000000p+1 0x1.0000000000000p+0 \
             0x1.0000000000000p-1 0x1.0000000000000p-2 1.0"
        );
        let s = to_filter_string(&coefs, 0.5, None, &[3]);
        assert_eq!(s, "0x1.0000000000000p+0 0.5");
    }

    #[test]
    fn test_filter_string_round_trips() {
        let lt = Sos::linkwitz_transform(79.7, 0.984, 18.0, FRAC_1_SQRT_2, SR);
        let coefs = lt.coefficients();
        let s = to_filter_string(&coefs, 0.0625, None, &DEFAULT_EXPORT_INDICES);
        let fields: Vec<&str> = s.split(' ').collect();
        assert_eq!(fields.len(), 6);
        for (field, &i) in fields.iter().zip(DEFAULT_EXPORT_INDICES.iter()) {
            let back = hexfloat::parse(field).unwrap();
            assert_eq!(back.to_bits(), coefs[i].to_bits(), "coefficient {i}");
        }
        assert_eq!(fields[5].parse::<f64>().unwrap(), 0.0625);
    }

    #[test]
    fn test_filter_chain_normalises_to_nyquist() {
        let hp = Sos::highpass(100.0, FRAC_1_SQRT_2, SR);
        let chain = FilterChain::new(vec![hp], SR);
        let db = chain.response_db(100.0);
        assert!((db + 3.0103).abs() < 0.01, "chain at cutoff: {db}");
        assert_eq!(chain.response(100.0), hp.response(100.0 / 24_000.0));
        assert_eq!(chain.filter_strings(1.0, None).len(), 1);
    }
}
