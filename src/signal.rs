//! # Signal Module
//!
//! Cooperative cancellation. An interrupt (Ctrl+C, or SIGTERM on unix) sets a
//! [`CancellationToken`]; the processor checks it before starting each file,
//! so a file that is being written is always finished.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shared flag set once a run should stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

async fn interrupt_signal() -> Result<()> {
  let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

  #[cfg(unix)]
  let terminate = async {
    signal::unix::signal(signal::unix::SignalKind::terminate())
      .context("Failed to install SIGTERM handler")?
      .recv()
      .await;
    Ok::<_, anyhow::Error>(())
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<Result<()>>();

  tokio::select! {
    res = ctrl_c => {
      res.context("Ctrl+C signal received")?;
    },
    res = terminate => {
      res.context("SIGTERM signal received")?;
    },
  }

  Ok(())
}

/// Spawns a task that cancels `token` when the process is interrupted.
///
/// Must be called from within a tokio runtime. Abort the returned handle once
/// the run is over.
pub fn spawn_interrupt_listener(token: CancellationToken) -> JoinHandle<()> {
  tokio::spawn(async move {
    match interrupt_signal().await {
      Ok(()) => {
        debug!("Interrupt received, finishing the current file");
        token.cancel();
      }
      Err(e) => warn!("Interrupt handling unavailable: {:#}", e),
    }
  })
}
