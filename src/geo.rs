use async_trait::async_trait;
use log::{ info, warn };
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::models::location::{ Coordinates, GeoSample };

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geolocation not supported")]
    Unsupported,
    #[error("Position acquisition timed out")]
    Timeout,
    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Source of single-shot position fixes. The console client ships a fixed
/// provider standing in for device GPS; tests supply mocks.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Whether this device can produce positions at all. Checked once at
    /// poller startup.
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self, high_accuracy: bool) -> Result<Coordinates, GeoError>;
}

/// Reports coordinates supplied through configuration. Unsupported when no
/// coordinates were configured, which mirrors a device without geolocation.
pub struct FixedGeoProvider {
    coords: Option<Coordinates>,
}

impl FixedGeoProvider {
    pub fn new(lat: Option<f64>, lon: Option<f64>) -> Self {
        let coords = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        };
        Self { coords }
    }
}

#[async_trait]
impl GeoProvider for FixedGeoProvider {
    fn is_supported(&self) -> bool {
        self.coords.is_some()
    }

    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, GeoError> {
        self.coords.ok_or_else(|| GeoError::Unavailable("no coordinates configured".to_string()))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PollerSettings {
    pub interval: Duration,
    pub acquire_timeout: Duration,
    pub high_accuracy: bool,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            acquire_timeout: Duration::from_secs(5),
            high_accuracy: true,
        }
    }
}

/// Periodically samples the provider and publishes the latest fix. On a
/// failed acquisition the profile's last known location is substituted, if
/// one exists; otherwise the current sample is left untouched.
pub struct LocationPoller {
    sample_rx: watch::Receiver<Option<GeoSample>>,
    handle: Option<JoinHandle<()>>,
}

impl LocationPoller {
    pub fn start(
        provider: Arc<dyn GeoProvider>,
        fallback: Option<Coordinates>,
        settings: PollerSettings
    ) -> Result<Self, GeoError> {
        if !provider.is_supported() {
            return Err(GeoError::Unsupported);
        }

        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(settings.interval);
            loop {
                ticker.tick().await;
                let acquired = time::timeout(
                    settings.acquire_timeout,
                    provider.current_position(settings.high_accuracy)
                ).await;
                match acquired {
                    Ok(Ok(coords)) => {
                        let _ = tx.send(Some(GeoSample::now(coords)));
                    }
                    Ok(Err(e)) => {
                        warn!("Location error: {}", e);
                        if let Some(coords) = fallback {
                            let _ = tx.send(Some(GeoSample::now(coords)));
                        }
                    }
                    Err(_) => {
                        warn!("Location error: {}", GeoError::Timeout);
                        if let Some(coords) = fallback {
                            let _ = tx.send(Some(GeoSample::now(coords)));
                        }
                    }
                }
            }
        });
        info!("Location poller started (interval {:?})", settings.interval);

        Ok(Self {
            sample_rx: rx,
            handle: Some(handle),
        })
    }

    /// Latest sample, if any poll has succeeded (or the fallback applied).
    pub fn sample(&self) -> Option<GeoSample> {
        *self.sample_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<GeoSample>> {
        self.sample_rx.clone()
    }

    /// Cancels the periodic task. Idempotent: the handle is taken on the
    /// first call, so a later call (or the Drop backstop) is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Location poller stopped");
        }
    }
}

impl Drop for LocationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
