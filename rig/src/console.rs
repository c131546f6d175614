//! Terminal diagnostics display
//!
//! Redraws the whole screen once per output tick with sample rates, stage
//! latencies, the current orientation and the pan/tilt command. Plain ANSI,
//! no terminal library; the loop owns the cadence so there is nothing to
//! poll.

use stabilizer::{DiagnosticsSink, DiagnosticsSnapshot, FreqStats, LatencyStats};

const CLEAR: &str = "\x1b[2J\x1b[H";

/// Full-screen text renderer for [`DiagnosticsSnapshot`].
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    /// Skip the clear sequence, for piping output to a file
    pub plain: bool,
}

impl ConsoleRenderer {
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }

    fn render_to_string(&self, snapshot: &DiagnosticsSnapshot) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str("=== PTZ Stabilizer ===\n\n");

        out.push_str(&freq_line("acc   ", &snapshot.acc_freq));
        out.push_str(&freq_line("gyro  ", &snapshot.gyro_freq));
        out.push_str(&format!(
            "output  {:6.1} Hz cur  {:6.1} Hz avg  {:6.1} Hz min  (target {:.1})\n\n",
            snapshot.output_freq.current,
            snapshot.output_freq.average,
            snapshot.output_freq.minimum,
            snapshot.output_freq_target,
        ));

        out.push_str(&latency_line("fuse   ", &snapshot.fuse_latency));
        out.push_str(&latency_line("rotate ", &snapshot.rotate_latency));
        out.push_str(&latency_line("output ", &snapshot.output_latency));
        out.push('\n');

        let [roll, pitch, yaw] = snapshot.angles_deg;
        out.push_str(&format!(
            "roll  {roll:7.2}  {}\n",
            bar_1d(roll, 90.0, 21)
        ));
        out.push_str(&format!(
            "pitch {pitch:7.2}  {}\n",
            bar_1d(pitch, 90.0, 21)
        ));
        out.push_str(&format!("yaw   {yaw:7.2}\n\n"));

        out.push_str(&format!(
            "pan  {:7.2}  tilt {:6.2}  (target pan {:.1}, tilt {:.1})\n",
            snapshot.pan_tilt.pan_deg,
            snapshot.pan_tilt.tilt_deg,
            snapshot.target.pan_deg,
            snapshot.target.tilt_deg
        ));
        out.push_str(&plot_2d(
            snapshot.pan_tilt.pan_deg,
            snapshot.pan_tilt.tilt_deg,
        ));

        out.push_str(&format!(
            "\nstatus: {}\n",
            snapshot.status.as_deref().unwrap_or("ok")
        ));
        out
    }
}

impl DiagnosticsSink for ConsoleRenderer {
    fn render(&mut self, snapshot: &DiagnosticsSnapshot) {
        if self.plain {
            print!("{}", self.render_to_string(snapshot));
        } else {
            print!("{CLEAR}{}", self.render_to_string(snapshot));
        }
    }
}

fn freq_line(label: &str, stats: &FreqStats) -> String {
    format!(
        "{label} {:6.1} Hz cur  {:6.1} Hz avg  {:6.1} Hz min\n",
        stats.current, stats.average, stats.minimum
    )
}

fn latency_line(label: &str, stats: &LatencyStats) -> String {
    format!(
        "{label} {:8.1} us avg  {:8.1} us max\n",
        stats.average * 1e6,
        stats.maximum * 1e6
    )
}

/// One-line bar gauge: `value` mapped onto `[-range, range]` across
/// `width` cells, center marked when the value sits elsewhere.
fn bar_1d(value: f64, range: f64, width: usize) -> String {
    let clamped = value.clamp(-range, range);
    let pos = ((clamped + range) / (2.0 * range) * (width - 1) as f64).round() as usize;
    let center = (width - 1) / 2;
    let mut cells = vec!['-'; width];
    cells[center] = '+';
    cells[pos] = '*';
    let body: String = cells.into_iter().collect();
    format!("[{body}]")
}

/// Small 2D map of the aim point: pan across, tilt down, origin top-center.
fn plot_2d(pan_deg: f64, tilt_deg: f64) -> String {
    const COLS: usize = 21;
    const ROWS: usize = 7;
    let col = (((pan_deg.clamp(-90.0, 90.0) + 90.0) / 180.0) * (COLS - 1) as f64).round() as usize;
    let row = ((tilt_deg.clamp(0.0, 90.0) / 90.0) * (ROWS - 1) as f64).round() as usize;
    let mut out = String::with_capacity((COLS + 3) * ROWS);
    for r in 0..ROWS {
        out.push('|');
        for c in 0..COLS {
            if r == row && c == col {
                out.push('*');
            } else if c == (COLS - 1) / 2 {
                out.push('.');
            } else {
                out.push(' ');
            }
        }
        out.push_str("|\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabilizer::PanTilt;

    #[test]
    fn bar_clamps_out_of_range_values() {
        let left = bar_1d(-1000.0, 90.0, 21);
        let right = bar_1d(1000.0, 90.0, 21);
        assert!(left.starts_with("[*"));
        assert!(right.ends_with("*]"));
    }

    #[test]
    fn bar_centers_zero() {
        let bar = bar_1d(0.0, 90.0, 21);
        // The marker lands on the center cell, replacing the '+'
        assert_eq!(bar.chars().nth(11), Some('*'));
        assert!(!bar.contains('+'));
    }

    #[test]
    fn plot_marks_straight_ahead_top_center() {
        let plot = plot_2d(0.0, 0.0);
        let first_row = plot.lines().next().unwrap();
        assert_eq!(first_row.chars().nth(11), Some('*'));
    }

    #[test]
    fn render_mentions_status_and_angles() {
        let snapshot = DiagnosticsSnapshot {
            acc_freq: FreqStats {
                current: 100.0,
                average: 99.0,
                minimum: 95.0,
            },
            gyro_freq: FreqStats {
                current: 100.0,
                average: 99.0,
                minimum: 95.0,
            },
            output_freq_target: 25.0,
            output_freq: FreqStats {
                current: 25.0,
                average: 25.0,
                minimum: 24.0,
            },
            fuse_latency: LatencyStats {
                average: 10e-6,
                maximum: 20e-6,
            },
            rotate_latency: LatencyStats {
                average: 5e-6,
                maximum: 8e-6,
            },
            output_latency: LatencyStats {
                average: 100e-6,
                maximum: 300e-6,
            },
            status: Some("sensor warning".to_string()),
            target: PanTilt {
                pan_deg: 10.0,
                tilt_deg: 40.0,
            },
            pan_tilt: PanTilt {
                pan_deg: 12.5,
                tilt_deg: 45.0,
            },
            angles_deg: [1.0, -2.0, 3.0],
        };
        let text = ConsoleRenderer::new(true).render_to_string(&snapshot);
        assert!(text.contains("status: sensor warning"));
        assert!(text.contains("pan    12.50"));
        assert!(text.contains("tilt  45.00"));
        assert!(text.contains("target pan 10.0, tilt 40.0"));
    }
}
