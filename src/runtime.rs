//! Runtime - real-time driving, graceful shutdown and signal handling

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::surface::Surface;
use crate::theme::EffectScheduler;

/// Frame interval used by the CLI, roughly 60 Hz
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shutdown signal broadcaster
#[derive(Clone)]
pub struct Shutdown {
    sender: broadcast::Sender<()>,
    triggered: Arc<RwLock<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self { Self::new() }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender, triggered: Arc::new(RwLock::new(false)) }
    }

    /// Subscribe to shutdown signal
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Trigger shutdown
    pub async fn trigger(&self) {
        let mut triggered = self.triggered.write().await;
        if !*triggered {
            *triggered = true;
            let _ = self.sender.send(());
        }
    }

    /// Check if shutdown was triggered
    pub async fn is_triggered(&self) -> bool {
        *self.triggered.read().await
    }
}

/// Install signal handlers and return shutdown handle
pub fn install_signal_handlers() -> Shutdown {
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let (Ok(mut sigterm), Ok(mut sigint)) =
                (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
            else {
                tracing::warn!("Signal handlers unavailable");
                return;
            };

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
            }
        }

        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Ctrl+C handler unavailable");
                return;
            }
            info!("Received Ctrl+C");
        }

        handle.trigger().await;
    });

    shutdown
}

/// Advance `scheduler` with wall-clock time every `frame` until `shutdown`
/// fires or `limit` has passed. Returns the time driven, in ms.
pub async fn drive<S: Surface>(
    scheduler: &mut EffectScheduler<S>,
    frame: Duration,
    limit: Option<Duration>,
    mut shutdown: broadcast::Receiver<()>,
) -> u64 {
    let started = Instant::now();
    let mut driven = 0u64;
    let mut ticker = tokio::time::interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Measured from the start so sub-millisecond remainders carry over
                let wall = Instant::now().duration_since(started);
                let total = u64::try_from(wall.as_millis()).unwrap_or(u64::MAX);
                let dt = total.saturating_sub(driven);
                scheduler.advance(dt);
                driven += dt;
                if limit.is_some_and(|limit| wall >= limit) {
                    debug!(driven, "Drive limit reached");
                    break;
                }
            }
            _ = shutdown.recv() => {
                info!(driven, "Shutdown requested");
                break;
            }
        }
    }
    driven
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chance::FixedChance;
    use crate::surface::MemorySurface;
    use crate::theme::ThemeConfig;

    #[tokio::test]
    async fn drive_stops_at_limit() {
        let config = ThemeConfig::quiet().with_static(true);
        let mut theme = EffectScheduler::new(MemorySurface::new("Home"), config)
            .with_chance(Box::new(FixedChance::never()));
        theme.init();
        let shutdown = Shutdown::new();
        let limit = Some(Duration::from_millis(150));
        let driven = drive(&mut theme, FRAME_INTERVAL, limit, shutdown.subscribe()).await;
        assert!(driven >= 100);
        assert_eq!(theme.now_ms(), driven);
        assert!(theme.stats().frames > 0);
    }

    #[tokio::test]
    async fn drive_keeps_pace_with_wall_clock() {
        let mut theme = EffectScheduler::new(MemorySurface::new("Home"), ThemeConfig::quiet());
        theme.init();
        let shutdown = Shutdown::new();
        let started = Instant::now();
        let limit = Some(Duration::from_millis(400));
        let driven = drive(&mut theme, FRAME_INTERVAL, limit, shutdown.subscribe()).await;
        let wall = started.elapsed().as_millis() as u64;
        // Only the final partial millisecond may be outstanding
        assert!(wall.saturating_sub(driven) <= 2, "wall={wall} driven={driven}");
    }

    #[tokio::test]
    async fn drive_stops_on_shutdown() {
        let mut theme = EffectScheduler::new(MemorySurface::new("Home"), ThemeConfig::quiet());
        theme.init();
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        shutdown.trigger().await;
        drive(&mut theme, FRAME_INTERVAL, None, rx).await;
        assert!(shutdown.is_triggered().await);
    }
}
