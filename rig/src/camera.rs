//! Axis VAPIX pan/tilt camera client
//!
//! Commands the camera through `axis-cgi/com/ptz.cgi` over plain HTTP.
//! Absolute moves jerk to a stop between updates, so motion is issued as
//! continuous pan/tilt velocities sized to reach the target over the
//! requested duration; the next update re-aims before the move completes.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    /// HTTP request failed
    #[error("camera transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Camera answered with a non-success status
    #[error("camera returned status {status}")]
    Status { status: u16 },
    /// Position response did not contain pan= and tilt= lines
    #[error("malformed position response: {body:?}")]
    MalformedResponse { body: String },
}

/// Blocking VAPIX client for one camera.
pub struct AxisCamera {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

impl AxisCamera {
    /// Connect-less constructor; the first request finds out whether the
    /// camera is reachable. The timeout is kept short because these calls
    /// run on the control loop thread.
    pub fn new(ip: &str, user: &str, password: &str) -> Result<Self, CameraError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(250))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("http://{ip}/axis-cgi/com/ptz.cgi"),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    fn request(&self, query: &[(&str, String)]) -> Result<String, CameraError> {
        let response = self
            .client
            .get(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .query(query)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CameraError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }

    /// Current (pan, tilt) in degrees.
    pub fn position(&self) -> Result<(f64, f64), CameraError> {
        let body = self.request(&[("query", "position".to_string())])?;
        parse_position(&body)
    }

    /// Start a constant-velocity move that would reach `(pan_deg,
    /// tilt_deg)` after `duration`, starting from the camera's reported
    /// position.
    pub fn continuous_move_to(
        &self,
        pan_deg: f64,
        tilt_deg: f64,
        duration: Duration,
    ) -> Result<(), CameraError> {
        let (current_pan, current_tilt) = self.position()?;
        let seconds = duration.as_secs_f64();
        let pan_speed = (pan_deg - current_pan) / seconds;
        let tilt_speed = (tilt_deg - current_tilt) / seconds;
        debug!("continuous move: pan {pan_speed:.2} deg/s, tilt {tilt_speed:.2} deg/s");
        self.request(&[(
            "continuouspantiltmove",
            format!("{pan_speed:.2},{tilt_speed:.2}"),
        )])?;
        Ok(())
    }

    /// Halt any motion in progress.
    pub fn halt(&self) -> Result<(), CameraError> {
        self.request(&[("continuouspantiltmove", "0,0".to_string())])?;
        Ok(())
    }
}

impl stabilizer::PanTiltActuator for AxisCamera {
    fn move_to(&mut self, pan_deg: f64, tilt_deg: f64, duration: Duration) -> anyhow::Result<()> {
        self.continuous_move_to(pan_deg, tilt_deg, duration)?;
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.halt()?;
        Ok(())
    }
}

/// Parse a VAPIX `query=position` body into (pan, tilt) degrees.
fn parse_position(body: &str) -> Result<(f64, f64), CameraError> {
    let mut pan = None;
    let mut tilt = None;
    for line in body.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("pan=") {
            pan = value.parse::<f64>().ok();
        } else if let Some(value) = line.strip_prefix("tilt=") {
            tilt = value.parse::<f64>().ok();
        }
    }
    match (pan, tilt) {
        (Some(pan), Some(tilt)) => Ok((pan, tilt)),
        _ => Err(CameraError::MalformedResponse {
            body: body.to_string(),
        }),
    }
}
