use async_trait::async_trait;
use log::{ info, warn };
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::api::{ ApiClient, ApiError };
use crate::models::location::{ Coordinates, GeoSample };

/// Delivery seam for the alert request. The API client is the production
/// implementation; tests substitute mocks.
#[async_trait]
pub trait SosAlerter: Send + Sync {
    async fn send_alert(
        &self,
        token: &str,
        user_id: &str,
        coords: Coordinates
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl SosAlerter for ApiClient {
    async fn send_alert(
        &self,
        token: &str,
        user_id: &str,
        coords: Coordinates
    ) -> Result<(), ApiError> {
        self.trigger_sos(token, user_id, coords).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SosState {
    Idle,
    Sending,
    Activated,
}

/// Presentation pacing: how long the flow lingers in Sending after the
/// server accepts, and how long Activated lasts before the automatic reset.
/// Both are polish, not protocol, and may be zero.
#[derive(Clone, Copy, Debug)]
pub struct SosTimings {
    pub send_delay: Duration,
    pub cooldown: Duration,
}

impl Default for SosTimings {
    fn default() -> Self {
        Self {
            send_delay: Duration::from_secs(2),
            cooldown: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SosOutcome {
    /// Alert accepted; the flow is now Activated and will reset itself.
    Activated,
    /// No location sample yet. Nothing was sent; the user must re-invoke.
    WaitingForLocation,
    /// A previous invocation is still in its Sending/Activated span.
    AlreadyInProgress,
    /// The alert was refused or could not be delivered.
    Failed(String),
}

impl SosOutcome {
    pub fn message(&self) -> String {
        match self {
            SosOutcome::Activated => "Emergency contacts notified".to_string(),
            SosOutcome::WaitingForLocation => "Waiting for location data...".to_string(),
            SosOutcome::AlreadyInProgress => "SOS already in progress".to_string(),
            SosOutcome::Failed(msg) => msg.clone(),
        }
    }
}

/// Idle -> Sending -> Activated -> Idle. One alert per invocation, gated on a
/// current location sample; no retry, no cancellation of an in-flight send.
pub struct SosFlow {
    alerter: Arc<dyn SosAlerter>,
    token: String,
    user_id: String,
    timings: SosTimings,
    state: Arc<Mutex<SosState>>,
}

impl SosFlow {
    pub fn new(
        alerter: Arc<dyn SosAlerter>,
        token: impl Into<String>,
        user_id: impl Into<String>,
        timings: SosTimings
    ) -> Self {
        Self {
            alerter,
            token: token.into(),
            user_id: user_id.into(),
            timings,
            state: Arc::new(Mutex::new(SosState::Idle)),
        }
    }

    pub async fn state(&self) -> SosState {
        *self.state.lock().await
    }

    pub async fn trigger(&self, sample: Option<GeoSample>) -> SosOutcome {
        let Some(sample) = sample else {
            return SosOutcome::WaitingForLocation;
        };

        {
            let mut state = self.state.lock().await;
            if *state != SosState::Idle {
                return SosOutcome::AlreadyInProgress;
            }
            *state = SosState::Sending;
        }

        info!(
            "Sending SOS alert for user {} at ({}, {})",
            self.user_id,
            sample.coords.lat,
            sample.coords.lon
        );
        match self.alerter.send_alert(&self.token, &self.user_id, sample.coords).await {
            Ok(()) => {
                sleep(self.timings.send_delay).await;
                *self.state.lock().await = SosState::Activated;
                self.schedule_reset();
                SosOutcome::Activated
            }
            Err(e) => {
                warn!("SOS alert failed: {}", e);
                *self.state.lock().await = SosState::Idle;
                SosOutcome::Failed(failure_message(&e))
            }
        }
    }

    /// Returns the flow to Idle after the cooldown with no user action.
    fn schedule_reset(&self) {
        let state = Arc::clone(&self.state);
        let cooldown = self.timings.cooldown;
        tokio::spawn(async move {
            sleep(cooldown).await;
            let mut state = state.lock().await;
            if *state == SosState::Activated {
                *state = SosState::Idle;
            }
        });
    }
}

/// User-facing text for the three error buckets the flow distinguishes.
fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Authentication failed".to_string(),
        ApiError::RateLimited => "Too many SOS requests".to_string(),
        ApiError::Rejected(msg) => msg.clone(),
        _ => "SOS request failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::Mutex as StdMutex;

    struct RecordingAlerter {
        calls: AtomicUsize,
        last_coords: StdMutex<Option<Coordinates>>,
        response: fn() -> Result<(), ApiError>,
    }

    impl RecordingAlerter {
        fn new(response: fn() -> Result<(), ApiError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_coords: StdMutex::new(None),
                response,
            })
        }
    }

    #[async_trait]
    impl SosAlerter for RecordingAlerter {
        async fn send_alert(
            &self,
            _token: &str,
            _user_id: &str,
            coords: Coordinates
        ) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_coords.lock().unwrap() = Some(coords);
            (self.response)()
        }
    }

    fn fast_timings() -> SosTimings {
        SosTimings {
            send_delay: Duration::from_millis(5),
            cooldown: Duration::from_millis(40),
        }
    }

    fn sample_at(lat: f64, lon: f64) -> GeoSample {
        GeoSample::now(Coordinates { lat, lon })
    }

    #[tokio::test]
    async fn missing_location_sends_nothing() {
        let alerter = RecordingAlerter::new(|| Ok(()));
        let flow = SosFlow::new(alerter.clone(), "tok", "u1", fast_timings());

        let outcome = flow.trigger(None).await;
        assert_eq!(outcome, SosOutcome::WaitingForLocation);
        assert_eq!(alerter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(flow.state().await, SosState::Idle);
    }

    #[tokio::test]
    async fn trigger_sends_exactly_one_alert_with_the_sample_coords() {
        let alerter = RecordingAlerter::new(|| Ok(()));
        let flow = SosFlow::new(alerter.clone(), "tok", "u1", fast_timings());

        let outcome = flow.trigger(Some(sample_at(12.9, 77.5))).await;
        assert_eq!(outcome, SosOutcome::Activated);
        assert_eq!(alerter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *alerter.last_coords.lock().unwrap(),
            Some(Coordinates { lat: 12.9, lon: 77.5 })
        );
    }

    #[tokio::test]
    async fn activated_resets_to_idle_after_the_cooldown() {
        let alerter = RecordingAlerter::new(|| Ok(()));
        let flow = SosFlow::new(alerter, "tok", "u1", fast_timings());

        flow.trigger(Some(sample_at(1.0, 2.0))).await;
        assert_eq!(flow.state().await, SosState::Activated);

        sleep(Duration::from_millis(80)).await;
        assert_eq!(flow.state().await, SosState::Idle);
    }

    #[tokio::test]
    async fn reentry_is_rejected_while_activated() {
        let alerter = RecordingAlerter::new(|| Ok(()));
        let flow = SosFlow::new(alerter.clone(), "tok", "u1", fast_timings());

        flow.trigger(Some(sample_at(1.0, 2.0))).await;
        let second = flow.trigger(Some(sample_at(1.0, 2.0))).await;
        assert_eq!(second, SosOutcome::AlreadyInProgress);
        assert_eq!(alerter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_the_auth_bucket_and_returns_to_idle() {
        let alerter = RecordingAlerter::new(|| Err(ApiError::Unauthorized));
        let flow = SosFlow::new(alerter, "tok", "u1", fast_timings());

        let outcome = flow.trigger(Some(sample_at(1.0, 2.0))).await;
        assert_eq!(outcome, SosOutcome::Failed("Authentication failed".to_string()));
        assert_eq!(flow.state().await, SosState::Idle);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_its_own_bucket() {
        let alerter = RecordingAlerter::new(|| Err(ApiError::RateLimited));
        let flow = SosFlow::new(alerter, "tok", "u1", fast_timings());

        let outcome = flow.trigger(Some(sample_at(1.0, 2.0))).await;
        assert_eq!(outcome, SosOutcome::Failed("Too many SOS requests".to_string()));
    }

    #[tokio::test]
    async fn other_failures_use_the_generic_bucket() {
        let alerter = RecordingAlerter::new(|| Err(ApiError::Server(500)));
        let flow = SosFlow::new(alerter.clone(), "tok", "u1", fast_timings());

        let outcome = flow.trigger(Some(sample_at(1.0, 2.0))).await;
        assert_eq!(outcome, SosOutcome::Failed("SOS request failed".to_string()));

        // failure releases the guard, so a manual re-invoke sends again
        let again = flow.trigger(Some(sample_at(1.0, 2.0))).await;
        assert_eq!(again, SosOutcome::Failed("SOS request failed".to_string()));
        assert_eq!(alerter.calls.load(Ordering::SeqCst), 2);
    }
}
