//! Mock IMU transmitter
//!
//! Emits the accelerometer/gyro line protocol over a serial port at a
//! steady rate, simulating a motionless rig or a constant yaw rate. Point
//! it at one end of a virtual serial pair and run the stabilizer on the
//! other.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "mock_imu")]
#[command(about = "Mock IMU line-protocol transmitter")]
struct Args {
    /// Serial port path to transmit on
    #[arg(long)]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value = "115200")]
    baud: u32,

    /// Record interval per sensor in milliseconds
    #[arg(short, long, default_value = "10")]
    interval_ms: u64,

    /// Simulated yaw rate in degrees per second
    #[arg(long, default_value = "0.0")]
    rate_dps: f64,

    /// Number of record pairs to send (0 = infinite)
    #[arg(short, long, default_value = "0")]
    count: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut port = serialport::new(&args.port, args.baud)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("Failed to open serial port {}", args.port))?;

    let interval = Duration::from_millis(args.interval_ms);
    let dt_us = args.interval_ms * 1000;

    // Calibration-zero raw values report a level, motionless rig; the yaw
    // rate is added on top of the z gyro zero.
    let acc = [4968.7, 4981.1];
    let gyro_zero = [-12.0, 15.0, 0.1];
    let counts_per_dps = 32768.0 / 2000.0;
    // The z axis is sign-flipped on the rig, so a positive commanded rate
    // needs a negative raw offset
    let gz = gyro_zero[2] - args.rate_dps * counts_per_dps;

    info!(
        "Transmitting on {} at {} ms intervals, yaw rate {} deg/s",
        args.port, args.interval_ms, args.rate_dps
    );

    let start_time = Instant::now();
    let mut sent: u64 = 0;
    let mut next_send = Instant::now();

    loop {
        if Instant::now() >= next_send {
            let pair = format!(
                "atxy {dt_us} {} {}\ngtxyz {dt_us} {} {} {gz}\n",
                acc[0], acc[1], gyro_zero[0], gyro_zero[1]
            );
            port.write_all(pair.as_bytes())
                .context("Failed to write records")?;

            sent += 1;
            next_send += interval;

            if args.count > 0 && sent >= args.count {
                break;
            }
            if sent % 500 == 0 {
                let elapsed = start_time.elapsed().as_secs_f64();
                info!("Sent {sent} record pairs in {elapsed:.2}s");
            }
        }
        std::hint::spin_loop();
    }

    let elapsed = start_time.elapsed().as_secs_f64();
    info!("Complete: {sent} record pairs in {elapsed:.2}s");
    Ok(())
}
