//! Single-shot weather lookup: position, then current conditions.
//!
//! A [`WeatherLookup`] runs exactly once. Observers follow it through a
//! [`LookupHandle`], which starts out `Loading` and moves to exactly one
//! terminal state. A cancelled lookup publishes nothing further.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    geolocation::{GeolocationError, Geolocator},
    model::WeatherSnapshot,
    provider::{FetchError, WeatherProvider},
};

pub const UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported by your device.";
pub const PERMISSION_DENIED_MESSAGE: &str = "Location permission denied.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load weather data.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    LocationUnavailable(String),
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("parse failure: {0}")]
    ParseFailure(String),
}

impl LookupError {
    /// Message shown to the user. Any failed position request reads as a
    /// denial; fetch and parse failures share one text.
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::Unsupported => UNSUPPORTED_MESSAGE,
            LookupError::PermissionDenied | LookupError::LocationUnavailable(_) => {
                PERMISSION_DENIED_MESSAGE
            }
            LookupError::NetworkFailure(_) | LookupError::ParseFailure(_) => FETCH_FAILED_MESSAGE,
        }
    }
}

impl From<GeolocationError> for LookupError {
    fn from(err: GeolocationError) -> Self {
        match err {
            GeolocationError::Unsupported => LookupError::Unsupported,
            GeolocationError::PermissionDenied => LookupError::PermissionDenied,
            GeolocationError::Unavailable(detail) => LookupError::LocationUnavailable(detail),
        }
    }
}

impl From<FetchError> for LookupError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(detail) => LookupError::NetworkFailure(detail),
            FetchError::Parse(detail) => LookupError::ParseFailure(detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Loading,
    Ready { snapshot: WeatherSnapshot, location: String },
    Failed(LookupError),
    /// Returned to the runner only; never published to observers.
    Cancelled,
}

impl LookupState {
    pub fn loading(&self) -> bool {
        matches!(self, LookupState::Loading)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            LookupState::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            LookupState::Ready { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LookupError> {
        match self {
            LookupState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error().map(LookupError::user_message)
    }

    pub fn is_terminal(&self) -> bool {
        !self.loading()
    }
}

/// Read side of a lookup.
#[derive(Debug, Clone)]
pub struct LookupHandle {
    rx: watch::Receiver<LookupState>,
}

impl LookupHandle {
    pub fn state(&self) -> LookupState {
        self.rx.borrow().clone()
    }

    /// Wait until the lookup leaves `Loading`.
    ///
    /// Returns `None` if the lookup was dropped or cancelled first.
    pub async fn settled(&mut self) -> Option<LookupState> {
        match self.rx.wait_for(LookupState::is_terminal).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        }
    }
}

type LocationCallback = Box<dyn FnOnce(&str) + Send>;

pub struct WeatherLookup {
    geolocator: Box<dyn Geolocator>,
    provider: Box<dyn WeatherProvider>,
    on_location: Option<LocationCallback>,
    state: watch::Sender<LookupState>,
}

impl std::fmt::Debug for WeatherLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherLookup")
            .field("geolocator", &self.geolocator)
            .field("provider", &self.provider)
            .field("on_location", &self.on_location.is_some())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl WeatherLookup {
    pub fn new(geolocator: Box<dyn Geolocator>, provider: Box<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(LookupState::Loading);
        Self { geolocator, provider, on_location: None, state }
    }

    /// Receive the `"{name}, {region}"` string once data is ready.
    pub fn on_location<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&str) + Send + 'static,
    {
        self.on_location = Some(Box::new(callback));
        self
    }

    pub fn subscribe(&self) -> LookupHandle {
        LookupHandle { rx: self.state.subscribe() }
    }

    /// Run the lookup to completion. Consumes `self`: there is no refresh.
    ///
    /// The returned state is always terminal, never `Loading`.
    pub async fn run(self, cancel: CancellationToken) -> LookupState {
        let WeatherLookup { geolocator, provider, on_location, state } = self;
        let publisher = Publisher { cancel: &cancel, on_location, state };

        tracing::debug!("weather lookup started");

        let coordinates = match until_cancelled(&cancel, geolocator.current_position()).await {
            None => return cancelled(),
            Some(Ok(coordinates)) => coordinates,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "could not obtain position");
                return publisher.finish(LookupState::Failed(err.into()));
            }
        };

        let snapshot = match until_cancelled(&cancel, provider.current(&coordinates)).await {
            None => return cancelled(),
            Some(Ok(snapshot)) => snapshot,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "weather fetch failed");
                return publisher.finish(LookupState::Failed(err.into()));
            }
        };

        let location = snapshot.location_label();
        publisher.finish(LookupState::Ready { snapshot, location })
    }
}

/// Writes the terminal state, unless the lookup was cancelled meanwhile.
struct Publisher<'a> {
    cancel: &'a CancellationToken,
    on_location: Option<LocationCallback>,
    state: watch::Sender<LookupState>,
}

impl Publisher<'_> {
    fn finish(self, state: LookupState) -> LookupState {
        if self.cancel.is_cancelled() {
            return cancelled();
        }

        if let (Some(callback), Some(location)) = (self.on_location, state.location()) {
            callback(location);
        }

        tracing::debug!(?state, "weather lookup finished");
        self.state.send_replace(state.clone());
        state
    }
}

fn cancelled() -> LookupState {
    tracing::debug!("weather lookup cancelled");
    LookupState::Cancelled
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::{DeniedGeolocator, FixedGeolocator, UnsupportedGeolocator},
        model::{Condition, Coordinates},
    };
    use async_trait::async_trait;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    fn snapshot(uv_index: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: "Indore".into(),
            region: "Madhya Pradesh".into(),
            temperature_c: 31.0,
            humidity_pct: 40,
            wind_kph: 9.0,
            wind_dir: "N".into(),
            pressure_mb: 1008.0,
            visibility_km: 8.0,
            uv_index,
            condition: Condition { text: "Sunny".into(), icon: "//cdn/113.png".into() },
            observed_at: None,
        }
    }

    #[derive(Debug, Clone)]
    struct StubProvider {
        calls: Arc<AtomicUsize>,
        result: Result<WeatherSnapshot, FetchError>,
        cancel_on_call: Option<CancellationToken>,
    }

    impl StubProvider {
        fn new(result: Result<WeatherSnapshot, FetchError>) -> Self {
            Self { calls: Arc::new(AtomicUsize::new(0)), result, cancel_on_call: None }
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn current(&self, _: &Coordinates) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(cancel) = &self.cancel_on_call {
                cancel.cancel();
            }
            self.result.clone()
        }
    }

    #[derive(Debug)]
    struct PendingGeolocator;

    #[async_trait]
    impl Geolocator for PendingGeolocator {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            std::future::pending().await
        }
    }

    fn fixed() -> Box<dyn Geolocator> {
        Box::new(FixedGeolocator::new(Coordinates::new(22.7, 75.8)))
    }

    #[tokio::test]
    async fn ready_state_exposes_snapshot_and_location() {
        let provider = StubProvider::new(Ok(snapshot(6.0)));
        let reported = Arc::new(Mutex::new(None::<String>));
        let sink = reported.clone();

        let lookup = WeatherLookup::new(fixed(), Box::new(provider.clone()))
            .on_location(move |loc| *sink.lock().unwrap() = Some(loc.to_string()));
        let mut handle = lookup.subscribe();
        assert!(handle.state().loading());

        let state = lookup.run(CancellationToken::new()).await;

        assert!(!state.loading());
        assert_eq!(state.location(), Some("Indore, Madhya Pradesh"));
        assert_eq!(state.snapshot().map(|s| s.uv_level().label()), Some("High"));
        assert_eq!(state.error(), None);
        assert_eq!(handle.settled().await, Some(state));
        assert_eq!(reported.lock().unwrap().as_deref(), Some("Indore, Madhya Pradesh"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn permission_denied_skips_network() {
        let provider = StubProvider::new(Ok(snapshot(1.0)));
        let lookup = WeatherLookup::new(Box::new(DeniedGeolocator), Box::new(provider.clone()));

        let state = lookup.run(CancellationToken::new()).await;

        assert!(!state.loading());
        assert_eq!(state.error(), Some(&LookupError::PermissionDenied));
        assert_eq!(state.error_message(), Some(PERMISSION_DENIED_MESSAGE));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[derive(Debug)]
    struct TimedOutGeolocator;

    #[async_trait]
    impl Geolocator for TimedOutGeolocator {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            Err(GeolocationError::Unavailable("timeout".into()))
        }
    }

    #[tokio::test]
    async fn unavailable_position_reads_as_denied_and_skips_network() {
        let provider = StubProvider::new(Ok(snapshot(1.0)));
        let lookup = WeatherLookup::new(Box::new(TimedOutGeolocator), Box::new(provider.clone()));

        let state = lookup.run(CancellationToken::new()).await;

        assert!(!state.loading());
        assert_eq!(state.error(), Some(&LookupError::LocationUnavailable("timeout".into())));
        assert_eq!(state.error_message(), Some(PERMISSION_DENIED_MESSAGE));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_fails_immediately_without_network() {
        let provider = StubProvider::new(Ok(snapshot(1.0)));
        let lookup =
            WeatherLookup::new(Box::new(UnsupportedGeolocator), Box::new(provider.clone()));
        let handle = lookup.subscribe();

        let state = lookup.run(CancellationToken::new()).await;

        assert_eq!(state.error_message(), Some(UNSUPPORTED_MESSAGE));
        assert_eq!(handle.state(), state);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_and_parse_failures_share_generic_message() {
        for err in [FetchError::Network("status 500".into()), FetchError::Parse("eof".into())] {
            let provider = StubProvider::new(Err(err));
            let lookup = WeatherLookup::new(fixed(), Box::new(provider));
            let handle = lookup.subscribe();

            let state = lookup.run(CancellationToken::new()).await;

            assert!(!state.loading());
            assert!(state.snapshot().is_none());
            assert!(state.location().is_none());
            assert_eq!(state.error_message(), Some(FETCH_FAILED_MESSAGE));
            assert_eq!(handle.state(), state);
        }
    }

    #[tokio::test]
    async fn tagged_errors_keep_detail() {
        let provider = StubProvider::new(Err(FetchError::Parse("missing field `current`".into())));
        let state = WeatherLookup::new(fixed(), Box::new(provider))
            .run(CancellationToken::new())
            .await;

        assert_eq!(
            state.error(),
            Some(&LookupError::ParseFailure("missing field `current`".into()))
        );
    }

    #[tokio::test]
    async fn cancellation_during_geolocation_publishes_nothing() {
        let provider = StubProvider::new(Ok(snapshot(3.0)));
        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();

        let lookup = WeatherLookup::new(Box::new(PendingGeolocator), Box::new(provider.clone()))
            .on_location(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let handle = lookup.subscribe();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(lookup.run(cancel.clone()));
        cancel.cancel();

        let state = task.await.unwrap();
        assert_eq!(state, LookupState::Cancelled);
        assert!(handle.state().loading());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_during_fetch_discards_result() {
        let cancel = CancellationToken::new();
        let mut provider = StubProvider::new(Ok(snapshot(3.0)));
        provider.cancel_on_call = Some(cancel.clone());

        let lookup = WeatherLookup::new(fixed(), Box::new(provider));
        let mut handle = lookup.subscribe();

        let state = lookup.run(cancel).await;

        assert_eq!(state, LookupState::Cancelled);
        assert!(handle.state().loading());
        assert_eq!(handle.settled().await, None);
    }
}
