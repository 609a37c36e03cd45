/// Box Sheet — sealed-box loudspeaker datasheet CLI.
///
/// Binds one driver to one box volume and reports on it.
///
/// Usage:
///   box-sheet --preset w8-1808 datasheet
///   box-sheet --preset ho-4-8 response --freq 30 [--lt-freq F --lt-q Q]
///   box-sheet --preset ho-4-8 sweep [--start F1] [--end F2] [--points N]
///   box-sheet --preset w8-1808 xmax --spl 85 [--digits N]
///   box-sheet --preset w8-1808 transform --lt-freq 25 --lt-q 0.707 [--label L]
///
/// Any T/S flag (--sd, --fs, ... --vc) overrides the preset's value; without
/// a preset all ten are required.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use sealbox::error::ConfigError;
use sealbox::filters::{self, DEFAULT_GAIN_DOMAIN};
use sealbox::presets;
use sealbox::system::{DEFAULT_SAMPLE_RATE, DEFAULT_SOLVE_DIGITS, sig};
use sealbox::{Sos, System, SystemConfig};

/// Sealed-box loudspeaker calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    driver: DriverArgs,

    #[command(subcommand)]
    command: Command,
}

/// Driver and box parameters. Flags override the preset.
#[derive(Args, Debug)]
struct DriverArgs {
    /// Bundled driver + box (w8-1808, ho-4-8)
    #[arg(short, long, global = true)]
    preset: Option<String>,
    /// Diaphragm area (cm²)
    #[arg(long, global = true)]
    sd: Option<f64>,
    /// Free-air resonance (Hz)
    #[arg(long, global = true)]
    fs: Option<f64>,
    /// Total Q
    #[arg(long, global = true)]
    qts: Option<f64>,
    /// Electrical Q
    #[arg(long, global = true)]
    qes: Option<f64>,
    /// Mechanical Q
    #[arg(long, global = true)]
    qms: Option<f64>,
    /// DC resistance (ohm)
    #[arg(long, global = true)]
    re: Option<f64>,
    /// Voice-coil inductance (mH)
    #[arg(long, global = true)]
    le: Option<f64>,
    /// Equivalent compliance volume (l)
    #[arg(long, global = true)]
    vas: Option<f64>,
    /// Peak linear excursion (mm)
    #[arg(long, global = true)]
    xmax: Option<f64>,
    /// Net box volume (l)
    #[arg(long, global = true)]
    vc: Option<f64>,
}

impl DriverArgs {
    fn to_config(&self) -> Result<SystemConfig, ConfigError> {
        let base = self.preset.as_deref().map(presets::by_name).transpose()?;
        let pick = |name: &'static str, flag: Option<f64>, from: fn(&SystemConfig) -> f64| {
            flag.or_else(|| base.as_ref().map(from))
                .ok_or(ConfigError::MissingParameter { name })
        };
        Ok(SystemConfig {
            sd: pick("sD", self.sd, |c| c.sd)?,
            fs: pick("fs", self.fs, |c| c.fs)?,
            qts: pick("Qts", self.qts, |c| c.qts)?,
            qes: pick("Qes", self.qes, |c| c.qes)?,
            qms: pick("Qms", self.qms, |c| c.qms)?,
            re: pick("Re", self.re, |c| c.re)?,
            le: pick("Le", self.le, |c| c.le)?,
            vas: pick("Vas", self.vas, |c| c.vas)?,
            xmax: pick("Xmax", self.xmax, |c| c.xmax)?,
            vc: pick("Vc", self.vc, |c| c.vc)?,
        })
    }
}

/// Optional Linkwitz transform target.
#[derive(Args, Debug)]
struct TransformArgs {
    /// Target resonance of the transform (Hz)
    #[arg(long, requires = "lt_q")]
    lt_freq: Option<f64>,
    /// Target Q of the transform
    #[arg(long, requires = "lt_freq")]
    lt_q: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the full T/S, box, and Linkwitz headroom report
    Datasheet,
    /// Response in dB at one frequency
    Response {
        #[arg(long, default_value_t = 20.0)]
        freq: f64,
        #[command(flatten)]
        transform: TransformArgs,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,
    },
    /// Log-spaced response table
    Sweep {
        #[arg(long, default_value_t = 10.0)]
        start: f64,
        #[arg(long, default_value_t = 200.0)]
        end: f64,
        #[arg(long, default_value_t = 20)]
        points: usize,
        #[command(flatten)]
        transform: TransformArgs,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,
    },
    /// Lowest frequency reaching an SPL within Xmax
    Xmax {
        #[arg(long)]
        spl: f64,
        #[arg(long, default_value_t = DEFAULT_SOLVE_DIGITS)]
        digits: u32,
    },
    /// Linkwitz transform coefficients as a filter string
    Transform {
        #[arg(long)]
        lt_freq: f64,
        #[arg(long)]
        lt_q: f64,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,
        /// Text placed before the coefficients
        #[arg(long)]
        label: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = cli.driver.to_config().context("invalid driver parameters")?;
    let system = System::new(config).context("invalid driver parameters")?;
    info!(
        "system: f3 = {:.2} Hz, fc = {:.2} Hz, Qtc = {:.3}",
        system.f3(),
        system.fc(),
        system.qtc()
    );

    match cli.command {
        Command::Datasheet => system.print_datasheet(),
        Command::Response { freq, transform, sample_rate } => {
            cmd_response(&system, freq, &transform, sample_rate)
        }
        Command::Sweep { start, end, points, transform, sample_rate } => {
            cmd_sweep(&system, start, end, points, &transform, sample_rate)
        }
        Command::Xmax { spl, digits } => cmd_xmax(&system, spl, digits),
        Command::Transform { lt_freq, lt_q, sample_rate, label } => {
            cmd_transform(&system, lt_freq, lt_q, sample_rate, label.as_deref())
        }
    }
    Ok(())
}

fn build_transform(system: &System, args: &TransformArgs, sample_rate: f64) -> Option<Sos> {
    let (f, q) = (args.lt_freq?, args.lt_q?);
    debug!("Linkwitz transform to {f} Hz, Q {q} at {sample_rate} Hz");
    Some(system.linkwitz_transform(f, q, sample_rate))
}

// ─── Single-point response ──────────────────────────────────────────────────

fn cmd_response(system: &System, freq: f64, args: &TransformArgs, sample_rate: f64) {
    let lt = build_transform(system, args, sample_rate);
    let db = system.response_at(freq, lt.as_ref(), sample_rate);

    println!("Response");
    println!("  Frequency:   {freq} Hz");
    println!("  f3 / Qtc:    {} Hz / {}", sig(system.f3(), 3), sig(system.qtc(), 3));
    if let (Some(f), Some(q)) = (args.lt_freq, args.lt_q) {
        println!("  Transform:   {f} Hz, Q {q}");
    }
    println!("  Level:       {db:.2} dB");
}

// ─── Frequency sweep ────────────────────────────────────────────────────────

fn cmd_sweep(
    system: &System,
    start: f64,
    end: f64,
    points: usize,
    args: &TransformArgs,
    sample_rate: f64,
) {
    let lt = build_transform(system, args, sample_rate);
    let curve = system.response_curve(lt.as_ref(), sample_rate);

    let log_start = start.ln();
    let log_end = end.ln();

    println!(
        "Frequency response sweep (f3 = {} Hz, Qtc = {})",
        sig(system.f3(), 3),
        sig(system.qtc(), 3)
    );
    println!("{:>10}  {:>10}", "Freq (Hz)", "Level (dB)");
    println!("{:-<10}  {:-<10}", "", "");

    for i in 0..points {
        let frac = i as f64 / (points.max(2) - 1) as f64;
        let freq = (log_start + frac * (log_end - log_start)).exp();
        let db = curve.response_db(freq);
        println!("{freq:>10.1}  {db:>10.2}");
    }
}

// ─── Excursion limit ────────────────────────────────────────────────────────

fn cmd_xmax(system: &System, spl: f64, digits: u32) {
    match system.excursion_limited_frequency(spl, digits) {
        Some(f) => println!("{f} Hz @ {spl} dBSPL"),
        None => println!("(none) Hz @ {spl} dBSPL"),
    }
}

// ─── Transform export ───────────────────────────────────────────────────────

fn cmd_transform(system: &System, f: f64, q: f64, sample_rate: f64, label: Option<&str>) {
    let lt = system.linkwitz_transform(f, q, sample_rate);
    // Scale down by the peak boost so the transform never clips.
    let gain = match filters::approx_gain(&[lt], DEFAULT_GAIN_DOMAIN) {
        Some(peak) => {
            info!("transform peak gain {:.2} dB", 20.0 * peak.log10());
            1.0 / peak
        }
        None => 1.0,
    };
    let line = filters::to_filter_string(
        &lt.coefficients(),
        gain,
        label,
        &filters::DEFAULT_EXPORT_INDICES,
    );
    println!("{line}");
}
