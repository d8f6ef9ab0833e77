//! Detects an embedding host and tells it the widget is ready.
//!
//! This is advisory only. Nothing here shares state with the controllers, and
//! every failure is logged and swallowed so the widget keeps working as a
//! plain standalone app.

use crate::binder::RenderSink;
use crate::config::HostConfig;
use anyhow::{bail, Context};
use async_trait::async_trait;
use std::env::{self, VarError};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

/// Whether the widget is running inside a host container or on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    MiniApp,
    Web,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::MiniApp => "mini app",
            Mode::Web => "web",
        }
    }
}

/// The host container the widget may be embedded in.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    /// Asks whether the widget runs inside the host.
    async fn is_in_mini_app(&self) -> anyhow::Result<bool>;

    /// Signals the host that rendering is complete. Only called when embedded.
    async fn ready(&self) -> anyhow::Result<()>;
}

/// A host reached through the process environment and stdout.
///
/// The host marks the widget as embedded by setting `flag_var` to a truthy
/// value, and listens for `ready_line` on the widget's stdout.
#[derive(Debug, Clone)]
pub struct ProcessHost {
    flag_var: String,
    ready_line: String,
}

impl ProcessHost {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            flag_var: config.flag_var.clone(),
            ready_line: config.ready_line.clone(),
        }
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised host flag value '{other}'"),
    }
}

#[async_trait]
impl HostEnvironment for ProcessHost {
    async fn is_in_mini_app(&self) -> anyhow::Result<bool> {
        match env::var(&self.flag_var) {
            Ok(value) => parse_flag(&value).with_context(|| format!("reading {}", self.flag_var)),
            Err(VarError::NotPresent) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("reading {}", self.flag_var)),
        }
    }

    async fn ready(&self) -> anyhow::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{}\n", self.ready_line).as_bytes())
            .await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Queries the host, updates the mode labels and signals readiness.
///
/// Returns the detected mode, or `None` if the query failed. Never returns an
/// error: failures are logged and the labels are left untouched.
pub async fn run(host: &dyn HostEnvironment, sink: &dyn RenderSink) -> Option<Mode> {
    let mode = match host.is_in_mini_app().await {
        Ok(true) => Mode::MiniApp,
        Ok(false) => Mode::Web,
        Err(err) => {
            error!("Host detection failed, staying in standalone mode: {err:#}");
            return None;
        }
    };
    info!(mode = mode.label(), "Host environment detected.");

    sink.env_label(mode.label());
    sink.footer_mode(&format!("Mode: {}", mode.label()));

    if mode == Mode::MiniApp {
        match host.ready().await {
            Ok(()) => info!("Host notified that the widget is ready."),
            Err(err) => error!("Failed to signal host readiness: {err:#}"),
        }
    }
    Some(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Labels {
        env: Mutex<Option<String>>,
        footer: Mutex<Option<String>>,
    }

    impl RenderSink for Labels {
        fn env_label(&self, text: &str) {
            *self.env.lock().unwrap() = Some(text.to_string());
        }
        fn footer_mode(&self, text: &str) {
            *self.footer.lock().unwrap() = Some(text.to_string());
        }
    }

    struct FakeHost {
        embedded: anyhow::Result<bool>,
        ready_fails: bool,
        ready_called: AtomicBool,
    }

    impl FakeHost {
        fn new(embedded: anyhow::Result<bool>, ready_fails: bool) -> Self {
            Self {
                embedded,
                ready_fails,
                ready_called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl HostEnvironment for FakeHost {
        async fn is_in_mini_app(&self) -> anyhow::Result<bool> {
            match &self.embedded {
                Ok(value) => Ok(*value),
                Err(err) => bail!("{err}"),
            }
        }

        async fn ready(&self) -> anyhow::Result<()> {
            self.ready_called.store(true, Ordering::SeqCst);
            if self.ready_fails {
                bail!("host went away");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn embedded_host_gets_ready_signal() {
        let host = FakeHost::new(Ok(true), false);
        let labels = Labels::default();
        assert_eq!(run(&host, &labels).await, Some(Mode::MiniApp));
        assert!(host.ready_called.load(Ordering::SeqCst));
        assert_eq!(labels.env.lock().unwrap().as_deref(), Some("mini app"));
        assert_eq!(labels.footer.lock().unwrap().as_deref(), Some("Mode: mini app"));
    }

    #[tokio::test]
    async fn standalone_skips_ready_signal() {
        let host = FakeHost::new(Ok(false), false);
        let labels = Labels::default();
        assert_eq!(run(&host, &labels).await, Some(Mode::Web));
        assert!(!host.ready_called.load(Ordering::SeqCst));
        assert_eq!(labels.footer.lock().unwrap().as_deref(), Some("Mode: web"));
    }

    #[tokio::test]
    async fn failed_query_leaves_labels_alone() {
        let host = FakeHost::new(Err(anyhow::anyhow!("sdk unavailable")), false);
        let labels = Labels::default();
        assert_eq!(run(&host, &labels).await, None);
        assert!(labels.env.lock().unwrap().is_none());
        assert!(!host.ready_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failed_ready_signal_is_swallowed() {
        let host = FakeHost::new(Ok(true), true);
        let labels = Labels::default();
        assert_eq!(run(&host, &labels).await, Some(Mode::MiniApp));
        assert!(host.ready_called.load(Ordering::SeqCst));
    }

    #[test]
    fn host_flag_values() {
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag(" TRUE ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[tokio::test]
    async fn process_host_without_flag_is_web() {
        let host = ProcessHost::new(&HostConfig {
            flag_var: "TIMERBOX_TEST_FLAG_THAT_IS_NEVER_SET".to_string(),
            ready_line: "ready".to_string(),
        });
        assert!(!host.is_in_mini_app().await.unwrap());
    }
}
