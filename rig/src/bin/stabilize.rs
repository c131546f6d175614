//! Run the pan/tilt stabilization loop against real hardware
//!
//! Reads the IMU line stream from a serial port, fuses it into an
//! orientation estimate and keeps an Axis camera aimed at the configured
//! target. `--offline-test` replays a built-in stationary stream instead
//! of opening hardware, for checking out the pipeline on a desk.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use rig::{console::ConsoleRenderer, serial::SerialSource, setup, AxisCamera};
use stabilizer::{
    ByteSource, ControlLoop, FusionConfig, LoopConfig, OrientationEstimator, Rotator,
};

#[derive(Parser, Debug)]
#[command(name = "stabilize")]
#[command(about = "IMU-driven pan/tilt camera stabilizer")]
struct Args {
    /// Serial port path (e.g., /dev/ttyUSB0); prompted for if omitted
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value = "115200")]
    baud: u32,

    /// Camera IP address; prompted for if omitted
    #[arg(long)]
    camera_ip: Option<String>,

    /// Run without a camera (estimation and diagnostics only)
    #[arg(long, conflicts_with = "camera_ip")]
    no_camera: bool,

    /// Camera HTTP credentials
    #[arg(long, default_value = "root")]
    camera_user: String,

    #[arg(long, default_value = "pass")]
    camera_password: String,

    /// Target pan in degrees, [-90, 90]
    #[arg(long, default_value = "0.0")]
    pan: f64,

    /// Target tilt in degrees, [0, 90]
    #[arg(long, default_value = "45.0")]
    tilt: f64,

    /// Output rate in Hz
    #[arg(long, default_value = "25.0")]
    output_freq: f64,

    /// Sensor calibration file (JSON FusionConfig); defaults are built in
    #[arg(long)]
    config: Option<String>,

    /// Skip interactive confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Replay a built-in stationary sensor stream instead of hardware
    #[arg(long, conflicts_with_all = ["port", "camera_ip"])]
    offline_test: bool,
}

/// Replays calibration-zero records at a steady rate, for `--offline-test`.
struct StationaryStream {
    pending: Vec<u8>,
    next_emit: std::time::Instant,
    period: std::time::Duration,
}

impl StationaryStream {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_emit: std::time::Instant::now(),
            period: std::time::Duration::from_millis(10),
        }
    }
}

impl ByteSource for StationaryStream {
    fn bytes_available(&mut self) -> Result<usize> {
        if std::time::Instant::now() >= self.next_emit {
            self.pending
                .extend_from_slice(b"atxy 10000 4968.7 4981.1\ngtxyz 10000 -12.0 15.0 0.1\n");
            self.next_emit += self.period;
        }
        Ok(self.pending.len())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

fn load_fusion_config(path: Option<&str>) -> Result<FusionConfig> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file {path}"))?
        }
        None => FusionConfig::default(),
    };
    config.validate().context("Invalid sensor configuration")?;
    Ok(config)
}

fn run<S: ByteSource>(source: S, camera: Option<AxisCamera>, args: &Args) -> Result<()> {
    let fusion_config = load_fusion_config(args.config.as_deref())?;
    let loop_config = LoopConfig {
        output_freq_hz: args.output_freq,
        ..LoopConfig::default()
    };
    loop_config.validate().context("Invalid loop configuration")?;

    info!(
        "Stabilizing on pan {:.1}, tilt {:.1} at {:.1} Hz",
        args.pan, args.tilt, args.output_freq
    );

    let control = ControlLoop::new(
        OrientationEstimator::new(fusion_config, loop_config.buffer_len()),
        Rotator::new(args.pan, args.tilt),
        loop_config,
        source,
        camera,
        ConsoleRenderer::new(false),
    );
    control.run()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    setup::confirm_target(args.pan, args.tilt, args.yes || args.offline_test)?;

    if args.offline_test {
        info!("Offline test: replaying a stationary sensor stream");
        return run(StationaryStream::new(), None, &args);
    }

    let camera = match setup::choose_camera(args.camera_ip.clone(), args.no_camera)? {
        Some(ip) => {
            let camera = AxisCamera::new(&ip, &args.camera_user, &args.camera_password)?;
            let (pan, tilt) = camera
                .position()
                .with_context(|| format!("Camera at {ip} is not responding"))?;
            info!("Camera at {ip} reports pan {pan:.1}, tilt {tilt:.1}");
            Some(camera)
        }
        None => {
            info!("Running without a camera");
            None
        }
    };

    let port = setup::choose_port(args.port.clone())?;
    let source = SerialSource::open(&port, args.baud)?;

    run(source, camera, &args)
}
