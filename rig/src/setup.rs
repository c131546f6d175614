//! Interactive startup prompts
//!
//! Fills in whatever the command line left unspecified: which serial port
//! to use, whether to drive a camera, and the target direction. Reads
//! answers from stdin so the rig can be brought up without memorizing
//! flags.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use log::info;

use crate::serial::list_ports;

/// Ask a question and return the trimmed answer.
fn prompt(question: &str) -> Result<String> {
    print!("{question} ");
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read from stdin")?;
    Ok(answer.trim().to_string())
}

/// Yes/no question; anything starting with 'n' counts as no.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{question} [Y/n]"))?;
    Ok(!answer.to_lowercase().starts_with('n'))
}

/// Resolve the serial port path: use the flag if given, auto-pick a sole
/// port, otherwise let the operator choose from the detected list.
pub fn choose_port(flag: Option<String>) -> Result<String> {
    if let Some(path) = flag {
        return Ok(path);
    }
    let ports = list_ports()?;
    match ports.len() {
        0 => bail!("No serial ports detected; pass --port explicitly"),
        1 => {
            info!("Using the only detected serial port: {}", ports[0].port_name);
            Ok(ports[0].port_name.clone())
        }
        _ => {
            println!("Detected serial ports:");
            for (i, port) in ports.iter().enumerate() {
                println!("  [{i}] {}", port.port_name);
            }
            let answer = prompt("Port number?")?;
            let index: usize = answer
                .parse()
                .with_context(|| format!("Not a port number: {answer:?}"))?;
            let port = ports
                .get(index)
                .with_context(|| format!("No port with number {index}"))?;
            Ok(port.port_name.clone())
        }
    }
}

/// Resolve the camera address, or `None` when running without a camera.
pub fn choose_camera(flag: Option<String>, disabled: bool) -> Result<Option<String>> {
    if disabled {
        return Ok(None);
    }
    if flag.is_some() {
        return Ok(flag);
    }
    if !confirm("Drive a pan/tilt camera?")? {
        return Ok(None);
    }
    let ip = prompt("Camera IP address?")?;
    if ip.is_empty() {
        bail!("Empty camera address");
    }
    Ok(Some(ip))
}

/// Validate the target direction and give the operator a chance to abort.
pub fn confirm_target(pan_deg: f64, tilt_deg: f64, assume_yes: bool) -> Result<()> {
    if !(-90.0..=90.0).contains(&pan_deg) {
        bail!("Target pan {pan_deg} out of range [-90, 90] degrees");
    }
    if !(0.0..=90.0).contains(&tilt_deg) {
        bail!("Target tilt {tilt_deg} out of range [0, 90] degrees");
    }
    if assume_yes {
        return Ok(());
    }
    if !confirm(&format!(
        "Stabilize on pan {pan_deg:.1}, tilt {tilt_deg:.1} degrees?"
    ))? {
        bail!("Aborted by operator");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_range_is_enforced() {
        assert!(confirm_target(91.0, 45.0, true).is_err());
        assert!(confirm_target(-91.0, 45.0, true).is_err());
        assert!(confirm_target(0.0, -1.0, true).is_err());
        assert!(confirm_target(0.0, 91.0, true).is_err());
        assert!(confirm_target(90.0, 90.0, true).is_ok());
        assert!(confirm_target(-90.0, 0.0, true).is_ok());
    }

    #[test]
    fn explicit_port_flag_skips_detection() {
        let port = choose_port(Some("/dev/ttyUSB7".to_string())).unwrap();
        assert_eq!(port, "/dev/ttyUSB7");
    }

    #[test]
    fn disabled_camera_needs_no_input() {
        assert_eq!(choose_camera(Some("10.0.0.5".into()), true).unwrap(), None);
        assert_eq!(
            choose_camera(Some("10.0.0.5".into()), false).unwrap(),
            Some("10.0.0.5".to_string())
        );
    }
}
