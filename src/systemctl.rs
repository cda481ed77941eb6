//! Service control facade over the `systemctl` CLI
//!
//! Start/stop report `(output, ok)`: on failure `output` carries the
//! human-readable diagnostic and is surfaced verbatim to the requesting user.
//! Status queries all services with a single `systemctl is-active` invocation.

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// Seam between the command engine and the operating system's service
/// manager. Implemented by [`Systemctl`] in production and by recording mocks
/// in tests.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Active/inactive state per service, in the given order. One external
    /// invocation regardless of how many services are queried.
    async fn status(&self, services: &[String]) -> Result<Vec<(String, String)>>;

    /// Start a service. `ok=false` carries the diagnostic in the output.
    async fn start(&self, service: &str) -> (String, bool);

    /// Stop a service. `ok=false` carries the diagnostic in the output.
    async fn stop(&self, service: &str) -> (String, bool);
}

/// Production facade shelling out to `systemctl`.
pub struct Systemctl;

impl Systemctl {
    /// Run `systemctl <args...>`, returning combined output and whether the
    /// command exited successfully.
    async fn run(args: &[&str]) -> (String, bool) {
        let result = Command::new("systemctl")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let text = if stderr.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    format!("{}{}", stdout, stderr).trim().to_string()
                };
                (text, output.status.success())
            }
            Err(e) => (format!("Failed to run systemctl: {e}"), false),
        }
    }
}

#[async_trait]
impl ServiceControl for Systemctl {
    async fn status(&self, services: &[String]) -> Result<Vec<(String, String)>> {
        if services.is_empty() {
            return Ok(Vec::new());
        }

        // `is-active` prints one state per line in argument order. A non-zero
        // exit only means some service is not active, so the exit status is
        // ignored here.
        let output = Command::new("systemctl")
            .arg("is-active")
            .args(services)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run systemctl is-active")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let states: Vec<&str> = stdout.lines().collect();

        Ok(services
            .iter()
            .enumerate()
            .map(|(i, service)| {
                let state = states.get(i).map_or("unknown", |s| s.trim());
                (service.clone(), state.to_string())
            })
            .collect())
    }

    async fn start(&self, service: &str) -> (String, bool) {
        tracing::info!("systemctl start {}", service);
        Self::run(&["start", service]).await
    }

    async fn stop(&self, service: &str) -> (String, bool) {
        tracing::info!("systemctl stop {}", service);
        Self::run(&["stop", service]).await
    }
}
