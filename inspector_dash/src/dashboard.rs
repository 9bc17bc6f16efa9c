//! Dashboard model: feed and presentation state behind one update function
//!
//! Everything that happens to the dashboard arrives as a `DashboardMsg`:
//! snapshot resolution, live records, stream status, user intent and platform
//! notifications. `update` routes each message to the container that owns it
//! and returns the platform work the event loop still has to do.

use crate::feed::Feed;
use crate::live::StreamStatus;
use crate::platform::PlatformEvent;
use crate::presentation::{PlatformIntent, PresentationController, PresentationState, SurfaceId};
use inspector_common::CapturedRequest;

/// Messages driving the dashboard
#[derive(Debug, Clone)]
pub enum DashboardMsg {
    /// Snapshot fetch resolved
    SnapshotLoaded(Vec<CapturedRequest>),
    /// Snapshot fetch failed (non-fatal)
    SnapshotFailed(String),
    /// Live stream delivered a record
    LiveRequest(Box<CapturedRequest>),
    /// Live stream connection state changed
    StreamStatus(StreamStatus),
    /// User asked for item `index` to go fullscreen
    FocusRequested(usize),
    /// User pressed the close control
    ExitRequested,
    /// Fullscreen platform notification
    Platform(PlatformEvent),
}

/// Outcome of the snapshot fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    Loading,
    Loaded(usize),
    Failed(String),
}

pub struct Dashboard {
    feed: Feed<CapturedRequest>,
    presentation: PresentationController,
    stream_status: StreamStatus,
    snapshot_status: SnapshotStatus,
    torn_down: bool,
}

impl Dashboard {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            feed: Feed::with_capacity(capacity),
            presentation: PresentationController::new(),
            stream_status: StreamStatus::Connecting,
            snapshot_status: SnapshotStatus::Loading,
            torn_down: false,
        }
    }

    pub fn feed(&self) -> &Feed<CapturedRequest> {
        &self.feed
    }

    pub fn presentation(&self) -> PresentationState {
        self.presentation.state()
    }

    pub fn stream_status(&self) -> StreamStatus {
        self.stream_status
    }

    pub fn snapshot_status(&self) -> &SnapshotStatus {
        &self.snapshot_status
    }

    #[cfg(test)]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Whether the platform last reported a card in fullscreen
    pub fn fullscreen_active(&self) -> bool {
        self.presentation.platform_active().is_some()
    }

    /// Apply one message and return the platform work it produced
    pub fn update(&mut self, msg: DashboardMsg) -> Vec<PlatformIntent> {
        if self.torn_down {
            tracing::debug!("Dashboard torn down, dropping {:?}", msg_kind(&msg));
            return Vec::new();
        }

        match msg {
            DashboardMsg::SnapshotLoaded(records) => {
                tracing::info!("Snapshot loaded with {} requests", records.len());
                self.snapshot_status = SnapshotStatus::Loaded(records.len());
                self.feed.hydrate(records);
                Vec::new()
            }
            DashboardMsg::SnapshotFailed(error) => {
                tracing::warn!("Snapshot load failed: {}", error);
                self.snapshot_status = SnapshotStatus::Failed(error);
                Vec::new()
            }
            DashboardMsg::LiveRequest(record) => {
                tracing::debug!("Live request {}", record.summary());
                self.feed.ingest_live(*record);
                Vec::new()
            }
            DashboardMsg::StreamStatus(status) => {
                if status != self.stream_status {
                    tracing::info!("Live stream {}", status.as_str());
                }
                self.stream_status = status;
                Vec::new()
            }
            DashboardMsg::FocusRequested(index) => match self.feed.key_at(index) {
                Some(surface) => self.presentation.request_focus(index, surface),
                None => {
                    tracing::debug!("Ignoring focus request for missing item {}", index);
                    Vec::new()
                }
            },
            DashboardMsg::ExitRequested => self.presentation.request_exit(),
            DashboardMsg::Platform(event) => match event {
                PlatformEvent::FullscreenChanged(active) => {
                    self.presentation.on_fullscreen_change(active)
                }
                PlatformEvent::FullscreenError { surface, reason } => {
                    self.presentation.on_fullscreen_error(surface, &reason);
                    Vec::new()
                }
                PlatformEvent::KeyPressed(key) => {
                    self.presentation.on_key(&key);
                    Vec::new()
                }
            },
        }
    }

    /// Current position and record of the focused item.
    ///
    /// Resolved by key, so the card stays pinned while live records are
    /// prepended. `None` when nothing is focused or the item was evicted.
    pub fn focused_entry(&self) -> Option<(usize, &CapturedRequest)> {
        let surface = self.presentation.focused_surface()?;
        let position = self.feed.position_of(surface)?;
        self.feed.get(position).map(|record| (position, record))
    }

    /// Whether a deferred enter request for `surface` is still wanted
    pub fn wants_surface(&self, surface: SurfaceId) -> bool {
        !self.torn_down && self.presentation.focused_surface() == Some(surface)
    }

    /// Stop accepting messages. Late deliveries become no-ops.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            tracing::debug!("Dashboard teardown with {} requests in feed", self.feed.len());
        }
        self.torn_down = true;
    }
}

fn msg_kind(msg: &DashboardMsg) -> &'static str {
    match msg {
        DashboardMsg::SnapshotLoaded(_) => "snapshot",
        DashboardMsg::SnapshotFailed(_) => "snapshot failure",
        DashboardMsg::LiveRequest(_) => "live request",
        DashboardMsg::StreamStatus(_) => "stream status",
        DashboardMsg::FocusRequested(_) => "focus request",
        DashboardMsg::ExitRequested => "exit request",
        DashboardMsg::Platform(_) => "platform notification",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> CapturedRequest {
        CapturedRequest {
            method: Some("GET".to_string()),
            path: Some(path.to_string()),
            ..Default::default()
        }
    }

    fn paths(dashboard: &Dashboard) -> Vec<String> {
        dashboard
            .feed()
            .iter()
            .map(|r| r.path_str().to_string())
            .collect()
    }

    fn live(path: &str) -> DashboardMsg {
        DashboardMsg::LiveRequest(Box::new(request(path)))
    }

    #[test]
    fn test_live_before_snapshot_then_focus_then_platform_exit() {
        let mut dashboard = Dashboard::new(None);

        dashboard.update(live("/c"));
        dashboard.update(DashboardMsg::SnapshotLoaded(vec![request("/s0"), request("/s1")]));
        assert_eq!(paths(&dashboard), vec!["/c", "/s0", "/s1"]);
        assert_eq!(dashboard.snapshot_status(), &SnapshotStatus::Loaded(2));

        let intents = dashboard.update(DashboardMsg::FocusRequested(0));
        assert_eq!(dashboard.presentation(), PresentationState::Focused(0));
        let surface = match intents.as_slice() {
            [PlatformIntent::EnterFullscreen(surface)] => *surface,
            other => panic!("Unexpected intents: {:?}", other),
        };
        assert!(dashboard.wants_surface(surface));

        dashboard.update(DashboardMsg::Platform(PlatformEvent::FullscreenChanged(Some(surface))));
        dashboard.update(DashboardMsg::Platform(PlatformEvent::FullscreenChanged(None)));

        assert_eq!(dashboard.presentation(), PresentationState::Idle);
        assert!(!dashboard.wants_surface(surface));
    }

    #[test]
    fn test_snapshot_failure_leaves_feed_untouched() {
        let mut dashboard = Dashboard::new(None);
        dashboard.update(live("/c"));

        dashboard.update(DashboardMsg::SnapshotFailed("connection refused".to_string()));

        assert_eq!(paths(&dashboard), vec!["/c"]);
        assert_eq!(
            dashboard.snapshot_status(),
            &SnapshotStatus::Failed("connection refused".to_string())
        );
    }

    #[test]
    fn test_focused_entry_stays_pinned_across_prepends() {
        let mut dashboard = Dashboard::new(None);
        dashboard.update(DashboardMsg::SnapshotLoaded(vec![request("/a"), request("/b")]));
        dashboard.update(DashboardMsg::FocusRequested(1));

        dashboard.update(live("/new"));

        // State keeps the index from request time, the entry is found by key
        assert_eq!(dashboard.presentation(), PresentationState::Focused(1));
        let (position, record) = dashboard.focused_entry().unwrap();
        assert_eq!(position, 2);
        assert_eq!(record.path_str(), "/b");
    }

    #[test]
    fn test_focused_entry_gone_after_eviction() {
        let mut dashboard = Dashboard::new(Some(1));
        dashboard.update(live("/a"));
        dashboard.update(DashboardMsg::FocusRequested(0));

        dashboard.update(live("/b"));

        assert!(dashboard.focused_entry().is_none());
    }

    #[test]
    fn test_focus_on_missing_item_is_ignored() {
        let mut dashboard = Dashboard::new(None);

        let intents = dashboard.update(DashboardMsg::FocusRequested(3));

        assert!(intents.is_empty());
        assert_eq!(dashboard.presentation(), PresentationState::Idle);
    }

    #[test]
    fn test_rejected_fullscreen_reverts() {
        let mut dashboard = Dashboard::new(None);
        dashboard.update(live("/a"));
        let surface = dashboard.feed().key_at(0).unwrap();
        dashboard.update(DashboardMsg::FocusRequested(0));

        dashboard.update(DashboardMsg::Platform(PlatformEvent::FullscreenError {
            surface,
            reason: "too small".to_string(),
        }));

        assert_eq!(dashboard.presentation(), PresentationState::Idle);
    }

    #[test]
    fn test_teardown_rejects_late_deliveries() {
        let mut dashboard = Dashboard::new(None);
        dashboard.update(live("/a"));
        let surface = dashboard.feed().key_at(0).unwrap();
        dashboard.update(DashboardMsg::FocusRequested(0));

        dashboard.teardown();

        assert!(dashboard.update(live("/late")).is_empty());
        assert!(dashboard
            .update(DashboardMsg::SnapshotLoaded(vec![request("/s")]))
            .is_empty());
        dashboard.update(DashboardMsg::Platform(PlatformEvent::FullscreenChanged(None)));
        dashboard.update(DashboardMsg::StreamStatus(StreamStatus::Offline));

        assert!(dashboard.is_torn_down());
        assert_eq!(paths(&dashboard), vec!["/a"]);
        assert_eq!(dashboard.presentation(), PresentationState::Focused(0));
        assert_eq!(dashboard.stream_status(), StreamStatus::Connecting);
        assert!(!dashboard.wants_surface(surface));
    }

    #[test]
    fn test_stream_status_tracked() {
        let mut dashboard = Dashboard::new(None);
        dashboard.update(DashboardMsg::StreamStatus(StreamStatus::Online));
        assert_eq!(dashboard.stream_status(), StreamStatus::Online);
    }
}
