//! Measure sensor zero offsets on a motionless rig
//!
//! Averages raw accelerometer and gyro readings over a sample window and
//! prints the values to paste into the calibration config. The rig must
//! sit still for the whole run.

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use imu_wire::{decode, LineFramer, Record};
use rig::{serial::SerialSource, setup};
use stabilizer::ByteSource;

#[derive(Parser, Debug)]
#[command(name = "calibrate_gyro")]
#[command(about = "Sensor zero-offset measurement")]
struct Args {
    /// Serial port path; prompted for if omitted
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value = "115200")]
    baud: u32,

    /// Samples to average per sensor
    #[arg(short, long, default_value = "100")]
    samples: u64,
}

#[derive(Default)]
struct Accumulator {
    acc_sum: [f64; 2],
    acc_count: u64,
    gyro_sum: [f64; 3],
    gyro_count: u64,
}

impl Accumulator {
    fn record(&mut self, record: &Record) {
        match record {
            Record::Acc(reading) => {
                self.acc_sum[0] += reading.ax_raw;
                self.acc_sum[1] += reading.ay_raw;
                self.acc_count += 1;
            }
            Record::Gyro(reading) => {
                self.gyro_sum[0] += reading.gx_raw;
                self.gyro_sum[1] += reading.gy_raw;
                self.gyro_sum[2] += reading.gz_raw;
                self.gyro_count += 1;
            }
            Record::Warning(text) => warn!("sensor warning: {text}"),
        }
    }

    fn done(&self, samples: u64) -> bool {
        self.acc_count >= samples && self.gyro_count >= samples
    }

    /// Per-axis means, or `None` until both sensors have contributed at
    /// least one sample.
    fn means(&self) -> Option<([f64; 2], [f64; 3])> {
        if self.acc_count == 0 || self.gyro_count == 0 {
            return None;
        }
        let acc = [
            self.acc_sum[0] / self.acc_count as f64,
            self.acc_sum[1] / self.acc_count as f64,
        ];
        let gyro = [
            self.gyro_sum[0] / self.gyro_count as f64,
            self.gyro_sum[1] / self.gyro_count as f64,
            self.gyro_sum[2] / self.gyro_count as f64,
        ];
        Some((acc, gyro))
    }

    fn report(&self) {
        match self.means() {
            Some((acc, gyro)) => {
                info!("acc_cal:  [{:.1}, {:.1}]", acc[0], acc[1]);
                info!(
                    "gyro_cal: [{:.1}, {:.1}, {:.1}]",
                    gyro[0], gyro[1], gyro[2]
                );
            }
            None => warn!("no samples collected, nothing to report"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let port = setup::choose_port(args.port.clone())?;
    let mut source = SerialSource::open(&port, args.baud)?;

    info!(
        "Keep the rig motionless; averaging {} samples per sensor",
        args.samples
    );

    let mut framer = LineFramer::new();
    let mut accumulator = Accumulator::default();
    let mut chunk = [0u8; 64];

    while !accumulator.done(args.samples) {
        if source.bytes_available()? > 0 {
            let n = source.read_chunk(&mut chunk)?;
            framer.push_bytes(&chunk[..n]);
        }
        while let Some(line) = framer.pop_line() {
            match decode(&line) {
                Ok(record) => accumulator.record(&record),
                Err(e) => warn!("dropping record {line:?}: {e}"),
            }
        }
        std::hint::spin_loop();
    }

    accumulator.report();
    Ok(())
}
