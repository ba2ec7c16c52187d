//! Application state and reconciliation logic.
//!
//! `App` owns everything the UI shows. Network results reach it only
//! through [`App::reload_data`] and [`App::tick`], which run on the render
//! thread once per frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Days, Local, NaiveDate, Timelike};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::data::{
    day_intervals, dispatch_plan, layout_intervals, normalize_events, reconcile, select_visible,
    CanonicalMetric, CanonicalMetrics, ChangeDetector, ContentSignature, Feed,
    GaugeAnimation, LayoutSlot, MetricHistory, MetricUpdate, NormalizedEvent, Selection,
    VisibilityWindow,
};
use crate::scheduler::Deferred;
use crate::settings::Settings;
use crate::source::{
    events_on_day, DayEvents, DayOrigin, DayRequest, FetchError, HttpClient, PollDelivery,
    PollLoop, PollState, RawEvent, StatsClient,
};
use crate::ui::Theme;

/// Hour the schedule scrolls to when a day is opened.
const SCHEDULE_FIRST_HOUR: u32 = 10;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Gauges, clocks and upcoming events.
    Dashboard,
    /// Timeline of a single day.
    Schedule,
}

impl View {
    /// Cycle to the other view.
    pub fn next(self) -> Self {
        match self {
            View::Dashboard => View::Schedule,
            View::Schedule => View::Dashboard,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Schedule => "Schedule",
        }
    }
}

/// Background machinery: the HTTP client, the poll loop and the runtime
/// they run on.
pub struct Services {
    client: Arc<dyn StatsClient>,
    poll: PollLoop,
    runtime: Handle,
}

impl Services {
    /// Build the HTTP client and start polling on `runtime`.
    pub fn start(settings: &Settings, runtime: Handle) -> Result<Self> {
        let client: Arc<dyn StatsClient> = Arc::new(
            HttpClient::builder()
                .base_url(settings.source.base_url.as_str())
                .timeout(settings.fetch_timeout())
                .build()?,
        );
        Ok(Self::with_client(client, settings, runtime))
    }

    /// Start polling with an existing client.
    pub fn with_client(client: Arc<dyn StatsClient>, settings: &Settings, runtime: Handle) -> Self {
        let poll = {
            let _guard = runtime.enter();
            PollLoop::spawn(client.clone(), settings.poll_config())
        };
        Self {
            client,
            poll,
            runtime,
        }
    }
}

/// State of the schedule tab.
#[derive(Debug)]
pub struct ScheduleState {
    pub date: NaiveDate,
    /// Events of `date`, in the order they arrived.
    pub events: Vec<NormalizedEvent>,
    /// Column layout; `event_ref` indexes into `events`.
    pub slots: Vec<LayoutSlot>,
    pub origin: Option<DayOrigin>,
    pub error: Option<FetchError>,
    pending: Option<DayRequest>,
    /// First hour row on screen.
    pub first_hour: u32,
}

impl ScheduleState {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
            slots: Vec::new(),
            origin: None,
            error: None,
            pending: None,
            first_hour: SCHEDULE_FIRST_HOUR,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    pub settings: Settings,
    services: Option<Services>,

    // Gauges
    gauges: [GaugeAnimation; 4],
    pending_gauges: Deferred<MetricUpdate>,
    pub metrics: Option<CanonicalMetrics>,
    pub history: MetricHistory,

    // Events
    detector: ChangeDetector,
    snapshot_events: Vec<RawEvent>,
    normalized: Vec<NormalizedEvent>,
    pub visible: Selection,
    visible_minute: Option<DateTime<Local>>,
    pub event_scroll: usize,

    pub schedule: ScheduleState,

    pub last_update: Option<DateTime<Local>>,
    pub last_error: Option<FetchError>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App. Without services the app only shows what is fed to
    /// it through [`App::apply_delivery`].
    pub fn new(settings: Settings, services: Option<Services>) -> Self {
        let animation = settings.animation();
        Self {
            running: true,
            current_view: View::Dashboard,
            show_help: false,
            services,
            gauges: [GaugeAnimation::new(0.0, animation); 4],
            pending_gauges: Deferred::new(),
            metrics: None,
            history: MetricHistory::new(),
            detector: ChangeDetector::new(),
            snapshot_events: Vec::new(),
            normalized: Vec::new(),
            visible: Selection::Empty,
            visible_minute: None,
            event_scroll: 0,
            schedule: ScheduleState::new(Local::now().date_naive()),
            last_update: None,
            last_error: None,
            theme: Theme::dark(),
            status_message: None,
            settings,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        match &self.services {
            Some(services) => services.poll.description(),
            None => "offline",
        }
    }

    pub fn poll_state(&self) -> PollState {
        match &self.services {
            Some(services) => services.poll.state(),
            None => PollState::Stopped,
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Drain every delivery the poll loop has produced since the last frame.
    ///
    /// Returns true if at least one delivery was applied.
    pub fn reload_data(&mut self) -> bool {
        let mut deliveries = Vec::new();
        if let Some(services) = self.services.as_mut() {
            while let Some(delivery) = services.poll.poll() {
                deliveries.push(delivery);
            }
        }

        let received = !deliveries.is_empty();
        let now = Instant::now();
        for delivery in deliveries {
            self.apply_delivery(delivery, now, Local::now());
        }
        received
    }

    /// Fold one poll outcome into the app state.
    pub fn apply_delivery(&mut self, delivery: PollDelivery, now: Instant, wall: DateTime<Local>) {
        match delivery {
            PollDelivery::Snapshot {
                payload,
                received_at,
            } => {
                let metrics = reconcile(&payload);
                self.history.record(&metrics);
                self.metrics = Some(metrics);
                for update in dispatch_plan(&metrics, self.settings.stagger_unit()) {
                    self.pending_gauges.schedule_after(now, update.delay, update);
                }

                let signature = ContentSignature::of(&payload.events);
                if self.detector.observe(Feed::EventList, signature).is_changed() {
                    debug!(
                        count = payload.events.len(),
                        signature = signature.value(),
                        "event list changed"
                    );
                    self.snapshot_events = payload.events;
                    self.normalized = normalize_events(&self.snapshot_events);
                    self.refresh_visible(wall);
                }

                self.last_update = Some(received_at);
                self.last_error = None;
            }
            PollDelivery::Unavailable(err) => {
                // previous values stay on screen
                self.last_error = Some(err);
            }
        }
    }

    /// Per-frame housekeeping: apply due gauge updates, re-evaluate the
    /// event list when the minute rolls over, collect a finished day fetch.
    pub fn tick(&mut self, now: Instant, wall: DateTime<Local>) {
        for update in self.pending_gauges.drain_due(now) {
            self.gauges[update.metric.index()].retarget(update.value, now);
        }

        let minute = wall.with_second(0).and_then(|t| t.with_nanosecond(0));
        if minute != self.visible_minute {
            self.refresh_visible(wall);
        }

        if let Some(result) = self.schedule.pending.as_mut().and_then(DayRequest::poll) {
            self.schedule.pending = None;
            self.apply_day_events(result);
        }
    }

    fn refresh_visible(&mut self, wall: DateTime<Local>) {
        let window =
            VisibilityWindow::new(wall).with_buffer_minutes(self.settings.events.buffer_minutes);
        self.visible = select_visible(&self.normalized, &window, self.settings.events.visibility);
        self.visible_minute = wall.with_second(0).and_then(|t| t.with_nanosecond(0));
        self.event_scroll = self.event_scroll.min(self.visible.len().saturating_sub(1));
    }

    /// Current needle position of a gauge.
    pub fn gauge_value(&self, metric: CanonicalMetric, now: Instant) -> f64 {
        self.gauges[metric.index()].value_at(now)
    }

    /// Value a gauge is heading for (used for colouring).
    pub fn gauge_target(&self, metric: CanonicalMetric) -> f64 {
        self.gauges[metric.index()].target()
    }

    /// Gauge updates scheduled but not yet applied.
    pub fn pending_gauge_updates(&self) -> usize {
        self.pending_gauges.len()
    }

    // Schedule

    /// Show `date` in the schedule view and fetch its events.
    pub fn open_day(&mut self, date: NaiveDate) {
        if date != self.schedule.date {
            self.schedule = ScheduleState::new(date);
            self.detector.reset(Feed::Schedule);
        }
        self.request_day();
    }

    pub fn next_day(&mut self) {
        if let Some(date) = self.schedule.date.checked_add_days(Days::new(1)) {
            self.open_day(date);
        }
    }

    pub fn prev_day(&mut self) {
        if let Some(date) = self.schedule.date.checked_sub_days(Days::new(1)) {
            self.open_day(date);
        }
    }

    pub fn today(&mut self) {
        self.open_day(Local::now().date_naive());
    }

    /// (Re)fetch the schedule's day.
    ///
    /// Without services, the last snapshot is used directly.
    pub fn request_day(&mut self) {
        let date = self.schedule.date;
        let fallback = self.snapshot_events.clone();

        match &self.services {
            Some(services) => {
                let _guard = services.runtime.enter();
                self.schedule.pending = Some(DayRequest::spawn(
                    services.client.clone(),
                    date,
                    self.settings.fetch_timeout(),
                    fallback,
                ));
                debug!(%date, "day fetch requested");
            }
            None => {
                let events = events_on_day(fallback, date);
                self.apply_day_events(DayEvents {
                    date,
                    events,
                    origin: DayOrigin::Fallback,
                    error: None,
                });
            }
        }
    }

    /// Install a finished day fetch, re-running the layout only if the
    /// content changed.
    pub fn apply_day_events(&mut self, result: DayEvents) {
        if result.date != self.schedule.date {
            debug!(date = %result.date, "stale day result dropped");
            return;
        }

        self.schedule.origin = Some(result.origin);
        self.schedule.error = result.error;

        let signature = ContentSignature::of(&result.events);
        if !self.detector.observe(Feed::Schedule, signature).is_changed() {
            return;
        }

        let events = normalize_events(&result.events);
        let intervals = day_intervals(&events, result.date);
        self.schedule.slots = layout_intervals(&intervals);
        self.schedule.events = events;
        info!(
            date = %result.date,
            origin = result.origin.label(),
            events = self.schedule.events.len(),
            "schedule updated"
        );
    }

    pub fn scroll_schedule(&mut self, delta: i32) {
        let hour = self.schedule.first_hour as i32 + delta;
        self.schedule.first_hour = hour.clamp(0, 23) as u32;
    }

    // Navigation

    pub fn set_view(&mut self, view: View) {
        let entering_schedule = view == View::Schedule && self.current_view != View::Schedule;
        self.current_view = view;
        if entering_schedule && self.schedule.origin.is_none() && !self.schedule.is_loading() {
            self.request_day();
        }
    }

    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    pub fn scroll_down(&mut self) {
        match self.current_view {
            View::Dashboard => {
                let max = self.visible.len().saturating_sub(1);
                self.event_scroll = (self.event_scroll + 1).min(max);
            }
            View::Schedule => self.scroll_schedule(1),
        }
    }

    pub fn scroll_up(&mut self) {
        match self.current_view {
            View::Dashboard => self.event_scroll = self.event_scroll.saturating_sub(1),
            View::Schedule => self.scroll_schedule(-1),
        }
    }

    /// Refresh whatever the current view shows.
    pub fn refresh(&mut self) {
        match self.current_view {
            View::Dashboard => match &self.services {
                Some(services) => {
                    services.poll.refresh_now();
                    self.set_status_message("Refreshing".to_string());
                }
                None => self.set_status_message("Offline: nothing to refresh".to_string()),
            },
            View::Schedule => {
                self.request_day();
                self.set_status_message(format!("Fetching {}", self.schedule.date));
            }
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        if let Some(services) = &self.services {
            services.poll.stop();
        }
        self.running = false;
    }
}
