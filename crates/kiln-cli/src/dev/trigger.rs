//! Rebuild trigger with coalescing.
//!
//! [`BuildTrigger`] owns the builder and runs at most one rebuild at a time.
//! Change notifications reach it through a [`RebuildSignal`], whose
//! single-slot queue holds at most one pending rebuild; signals arriving
//! while that slot is taken are folded into it.

use crate::dev::hub::HubHandle;
use crate::dev::protocol::BuildOutcome;
use crate::ui;
use kiln_bundler::Builder;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receives "something changed" notifications.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self);
}

impl<L: ChangeListener + ?Sized> ChangeListener for Arc<L> {
    fn on_change(&self) {
        (**self).on_change()
    }
}

/// Runs rebuilds and classifies their results.
pub struct BuildTrigger<B> {
    builder: B,
    rebuilds: u64,
}

impl<B: Builder> BuildTrigger<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            rebuilds: 0,
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Number of rebuilds run so far.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Rebuild once, print the result and classify it.
    ///
    /// A builder that cannot run at all is reported as a failure carrying
    /// the error text, so the dev loop keeps going.
    pub async fn trigger_rebuild(&mut self) -> BuildOutcome {
        self.rebuilds += 1;
        let start = Instant::now();
        let result = self.builder.rebuild().await;
        let elapsed = ui::format_duration(start.elapsed());

        match result {
            Ok(output) => {
                let outcome = BuildOutcome::from(&output);
                match &outcome {
                    BuildOutcome::Success => ui::success(&format!("Rebuilt in {elapsed}")),
                    BuildOutcome::Failure { diagnostics } => ui::error(&format!(
                        "Rebuild failed with {} error(s) in {elapsed}",
                        diagnostics.len()
                    )),
                }
                ui::print_diagnostics(&output);
                outcome
            }
            Err(e) => {
                ui::error(&format!("Bundler failed to run: {e}"));
                BuildOutcome::failed(e.to_string())
            }
        }
    }
}

impl<B: Builder + 'static> BuildTrigger<B> {
    /// Start the rebuild loop.
    ///
    /// Every outcome is published to `hub`. The loop ends when every
    /// [`RebuildSignal`] is dropped or the hub stops.
    pub fn spawn(mut self, hub: HubHandle) -> (RebuildSignal, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let outcome = self.trigger_rebuild().await;

                if hub.publish(outcome).await.is_err() {
                    tracing::debug!("Hub closed, stopping rebuild loop");
                    break;
                }
            }
        });

        (RebuildSignal { tx }, task)
    }
}

/// Handle that requests a rebuild from a running [`BuildTrigger`] loop.
#[derive(Debug, Clone)]
pub struct RebuildSignal {
    tx: mpsc::Sender<()>,
}

impl ChangeListener for RebuildSignal {
    fn on_change(&self) {
        match self.tx.try_send(()) {
            Ok(()) => tracing::debug!("Rebuild queued"),
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::debug!("Rebuild already pending, coalesced");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::warn!("Rebuild loop is not running");
            }
        }
    }
}
