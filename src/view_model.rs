use chrono::{DateTime, Local};
use ratatui::style::Color;
use tracing::{debug, info};

use crate::channel::{ChannelClient, ChannelError, ChannelEvent, EventKind};
use crate::prefs::{DisplayPreference, PreferenceStore, PrefsError};
use crate::telemetry::{show, Reading, StatusSnapshot, Usage};

/// Divisor for the CPU gauge when the agent sends no usable `max`.
pub const DEFAULT_CPU_FALLBACK_MAX_GHZ: f64 = 2.0;

/// Inner radius of the gauge ring as a fraction of the outer radius.
pub const RING_CUTOUT: f64 = 0.85;

pub const REMAINING_COLOR: Color = Color::Rgb(0xe0, 0xe0, 0xe0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Memory,
    Storage,
}

impl Metric {
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU Status",
            Metric::Memory => "Memory Status",
            Metric::Storage => "Storage Status",
        }
    }

    pub fn used_color(&self) -> Color {
        match self {
            Metric::Cpu => Color::Rgb(0x4c, 0xaf, 0x50),
            Metric::Memory => Color::Rgb(0x42, 0xa5, 0xf5),
            Metric::Storage => Color::Rgb(0xff, 0x70, 0x43),
        }
    }
}

/// Everything one gauge card draws. Values are not clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct GaugeView {
    pub metric: Metric,
    pub used: f64,
    pub remaining: f64,
    pub label: String,
    pub rows: Vec<(&'static str, String)>,
}

impl GaugeView {
    fn new(metric: Metric, used: f64, label: String, rows: Vec<(&'static str, String)>) -> Self {
        Self {
            metric,
            used,
            remaining: 100.0 - used,
            label,
            rows,
        }
    }
}

/// Latest known status, connection state and theme flag.
///
/// Mutated only by the UI loop: channel handlers forward their events to
/// the loop, which applies them here in arrival order.
pub struct TelemetryViewModel {
    snapshot: StatusSnapshot,
    connected: bool,
    preference: DisplayPreference,
    store: PreferenceStore,
    channel: ChannelClient,
    mounted: bool,
    cpu_fallback_max: f64,
    last_sequence: Option<u64>,
    last_update: Option<DateTime<Local>>,
}

impl TelemetryViewModel {
    /// Build the view model around a not-yet-connected channel. The theme
    /// flag is read once here; a bad stored value means light.
    pub fn initialize(channel: ChannelClient, store: PreferenceStore, cpu_fallback_max: f64) -> Self {
        let preference = DisplayPreference::load(&store);
        debug!(dark = preference.dark, "loaded display preference");
        Self {
            snapshot: StatusSnapshot::default(),
            connected: false,
            preference,
            store,
            channel,
            mounted: false,
            cpu_fallback_max,
            last_sequence: None,
            last_update: None,
        }
    }

    /// Register the three channel handlers and open the connection. Safe to
    /// call twice: the second call does nothing.
    pub fn mount<F>(&mut self, forward: F) -> Result<(), ChannelError>
    where
        F: Fn(ChannelEvent) + Clone + Send + Sync + 'static,
    {
        if self.mounted {
            return Ok(());
        }
        for kind in EventKind::ALL {
            self.channel.on(kind, forward.clone());
        }
        self.channel.connect()?;
        self.mounted = true;
        debug!(handlers = self.channel.handler_count(), "view model mounted");
        Ok(())
    }

    /// Deregister all handlers, then close the transport.
    pub async fn teardown(&mut self) {
        self.channel.off_all();
        self.channel.close().await;
        self.mounted = false;
        info!("view model torn down");
    }

    pub fn apply(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connect => self.on_connect(),
            ChannelEvent::Disconnect => self.on_disconnect(),
            ChannelEvent::StatusUpdate(snapshot) => {
                self.on_snapshot(snapshot);
            }
        }
    }

    pub fn on_connect(&mut self) {
        self.connected = true;
    }

    /// The last snapshot stays on screen. The sequence watermark is
    /// forgotten since a restarted agent counts from zero again.
    pub fn on_disconnect(&mut self) {
        self.connected = false;
        self.last_sequence = None;
    }

    /// Replace the snapshot whole. Returns `false` when the snapshot carries
    /// a sequence number not newer than the current one and was dropped.
    pub fn on_snapshot(&mut self, snapshot: StatusSnapshot) -> bool {
        if let (Some(current), Some(incoming)) = (self.last_sequence, snapshot.sequence) {
            if incoming <= current {
                debug!(current, incoming, "dropping stale snapshot");
                return false;
            }
        }
        self.last_sequence = snapshot.sequence;
        self.snapshot = snapshot;
        self.last_update = Some(Local::now());
        true
    }

    /// Flip the theme and write it through. The flip sticks even when the
    /// write fails; the error is handed back for logging.
    pub fn toggle_theme(&mut self) -> Result<(), PrefsError> {
        self.preference = self.preference.toggled();
        self.preference.save(&self.store)
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn dark(&self) -> bool {
        self.preference.dark
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn cpu_gauge(&self) -> GaugeView {
        let cpu = &self.snapshot.cpu;
        let used = cpu.fraction(self.cpu_fallback_max);
        GaugeView::new(
            Metric::Cpu,
            used,
            format!("{:.1}%", used),
            vec![
                ("Current Speed", format!("{} Ghz", show(&cpu.current))),
                ("Current Temperature", format!("{}°", show(&cpu.temperature))),
            ],
        )
    }

    pub fn memory_gauge(&self) -> GaugeView {
        usage_gauge(Metric::Memory, &self.snapshot.memory, "Used Memory", "Total Memory")
    }

    pub fn storage_gauge(&self) -> GaugeView {
        usage_gauge(
            Metric::Storage,
            &self.snapshot.storage,
            "Used Storage",
            "Total Storage",
        )
    }

    pub fn gauges(&self) -> [GaugeView; 3] {
        [self.cpu_gauge(), self.memory_gauge(), self.storage_gauge()]
    }

    /// Rows of the system info panel; empty values until the agent sends them.
    pub fn system_rows(&self) -> Vec<(&'static str, String)> {
        let info = self.snapshot.system_info.as_ref();
        let os = match info {
            Some(i) => match (&i.os, &i.os_version) {
                (Some(os), Some(v)) => format!("{} {}", os, v),
                (Some(os), None) => os.clone(),
                (None, _) => String::new(),
            },
            None => String::new(),
        };
        let uptime = info
            .and_then(|i| i.uptime.as_ref())
            .map(|u| {
                format!(
                    "{} days {} hours {} minutes",
                    show(&u.days),
                    show(&u.hours),
                    show(&u.minutes)
                )
            })
            .unwrap_or_default();
        let processor = self.snapshot.cpu.processor.clone().unwrap_or_default();

        vec![
            ("Operating System", os),
            ("Processor", processor),
            ("Uptime", uptime),
            ("CPU Range", cpu_range(&self.snapshot.cpu.min, &self.snapshot.cpu.max)),
        ]
    }
}

fn usage_gauge(metric: Metric, usage: &Usage, used_label: &'static str, total_label: &'static str) -> GaugeView {
    let used = usage.fraction();
    GaugeView::new(
        metric,
        used,
        format!("{:.0}%", used),
        vec![
            (used_label, format!("{} GB", show(&usage.used))),
            (total_label, format!("{} GB", show(&usage.total))),
        ],
    )
}

fn cpu_range(min: &Option<Reading>, max: &Option<Reading>) -> String {
    if min.is_none() && max.is_none() {
        return String::new();
    }
    format!("{} - {} Ghz", show(min), show(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelOptions;
    use crate::telemetry::{normalize, SystemInfo, Uptime};
    use serde_json::json;

    fn view_model(dir: &tempfile::TempDir) -> TelemetryViewModel {
        TelemetryViewModel::initialize(
            ChannelClient::new(ChannelOptions::default()),
            PreferenceStore::at(dir.path().join("preferences.json")),
            DEFAULT_CPU_FALLBACK_MAX_GHZ,
        )
    }

    fn sample() -> StatusSnapshot {
        normalize(json!({
            "cpu": {"current": 1.0, "max": 2.0, "temperature": 45},
            "memory": {"percent": 60, "total": 16, "used": 9.6},
            "storage": {"percent": 30, "total": 512, "used": 153.6}
        }))
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let vm = view_model(&dir);
        assert!(!vm.connected());
        assert!(!vm.dark());
        assert_eq!(vm.snapshot(), &StatusSnapshot::default());
        assert_eq!(vm.cpu_gauge().label, "0.0%");
        assert!(vm.last_update().is_none());
    }

    #[test]
    fn test_connect_disconnect_leaves_snapshot_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        vm.on_snapshot(sample());
        let before = vm.snapshot().clone();

        vm.apply(ChannelEvent::Connect);
        assert!(vm.connected());
        vm.apply(ChannelEvent::Disconnect);
        assert!(!vm.connected());
        assert_eq!(vm.snapshot(), &before);
    }

    #[test]
    fn test_snapshot_replaces_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        let mut first = sample();
        first.log_status = Some([("portfolio".to_string(), Reading::Number(4.0))].into());
        vm.on_snapshot(first);

        let second = normalize(json!({"memory": {"percent": 10}})).unwrap();
        vm.apply(ChannelEvent::StatusUpdate(second.clone()));
        assert_eq!(vm.snapshot(), &second);
        assert!(vm.snapshot().log_status.is_none());
        assert!(vm.last_update().is_some());
    }

    #[test]
    fn test_stale_sequence_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        let mut s = sample();
        s.sequence = Some(5);
        assert!(vm.on_snapshot(s.clone()));

        let mut older = sample();
        older.sequence = Some(4);
        older.memory.percent = Some(99.0.into());
        assert!(!vm.on_snapshot(older));
        assert_eq!(vm.memory_gauge().label, "60%");

        let mut dup = sample();
        dup.sequence = Some(5);
        assert!(!vm.on_snapshot(dup));

        let mut newer = sample();
        newer.sequence = Some(6);
        assert!(vm.on_snapshot(newer));
    }

    #[test]
    fn test_unsequenced_snapshots_are_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        let mut s = sample();
        s.sequence = Some(10);
        vm.on_snapshot(s);
        assert!(vm.on_snapshot(sample()));
        assert!(vm.snapshot().sequence.is_none());
    }

    #[test]
    fn test_sequence_watermark_resets_on_disconnect() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        let mut s = sample();
        s.sequence = Some(100);
        vm.on_snapshot(s);
        vm.on_disconnect();

        let mut restarted = sample();
        restarted.sequence = Some(1);
        assert!(vm.on_snapshot(restarted));
    }

    #[test]
    fn test_gauges_for_reference_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        vm.on_snapshot(sample());

        let cpu = vm.cpu_gauge();
        assert_eq!(cpu.label, "50.0%");
        assert_eq!(cpu.used, 50.0);
        assert_eq!(cpu.remaining, 50.0);
        assert_eq!(cpu.rows[0].1, "1 Ghz");
        assert_eq!(cpu.rows[1].1, "45°");

        let mem = vm.memory_gauge();
        assert_eq!(mem.label, "60%");
        assert_eq!(mem.remaining, 40.0);
        assert_eq!(mem.rows[0].1, "9.6 GB");
        assert_eq!(mem.rows[1].1, "16 GB");

        let storage = vm.storage_gauge();
        assert_eq!(storage.label, "30%");
        assert_eq!(storage.rows[0].1, "153.6 GB");
        assert_eq!(storage.rows[1].1, "512 GB");
    }

    #[test]
    fn test_cpu_gauge_falls_back_to_constant_divisor() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        vm.on_snapshot(normalize(json!({"cpu": {"current": 1.5}})).unwrap());
        assert_eq!(vm.cpu_gauge().label, "75.0%");
    }

    #[test]
    fn test_partial_snapshot_renders_empty_and_nan() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        vm.on_snapshot(normalize(json!({})).unwrap());
        let mem = vm.memory_gauge();
        assert_eq!(mem.label, "NaN%");
        assert_eq!(mem.rows[0].1, " GB");
        assert_eq!(vm.cpu_gauge().rows[1].1, "°");
    }

    #[test]
    fn test_toggle_theme_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        vm.toggle_theme().unwrap();
        assert!(vm.dark());

        let reloaded = view_model(&dir);
        assert!(reloaded.dark());

        let mut reloaded = reloaded;
        reloaded.toggle_theme().unwrap();
        assert!(!view_model(&dir).dark());
    }

    #[test]
    fn test_invalid_stored_theme_initializes_light() {
        let dir = tempfile::tempdir().unwrap();
        PreferenceStore::at(dir.path().join("preferences.json"))
            .set(crate::prefs::DARK_MODE_KEY, "not valid json")
            .unwrap();
        assert!(!view_model(&dir).dark());
    }

    #[test]
    fn test_system_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut vm = view_model(&dir);
        assert!(vm.system_rows().iter().all(|(_, v)| v.is_empty() || v.contains("Ghz")));

        let mut s = sample();
        s.cpu.processor = Some("AMD EPYC 7B13".to_string());
        s.system_info = Some(SystemInfo {
            os: Some("Linux".to_string()),
            os_version: None,
            uptime: Some(Uptime {
                days: Some(3.0.into()),
                hours: Some(4.0.into()),
                minutes: Some(12.0.into()),
            }),
        });
        vm.on_snapshot(s);
        let rows = vm.system_rows();
        assert_eq!(rows[0].1, "Linux");
        assert_eq!(rows[1].1, "AMD EPYC 7B13");
        assert_eq!(rows[2].1, "3 days 4 hours 12 minutes");
        assert_eq!(rows[3].1, " - 2 Ghz");
    }

    #[tokio::test]
    async fn test_mount_registers_once_and_teardown_releases() {
        let dir = tempfile::tempdir().unwrap();
        let channel = ChannelClient::new(ChannelOptions {
            // Nothing listens on the discard port; the transport just fails
            url: "http://127.0.0.1:9".to_string(),
            reconnect: false,
            ..ChannelOptions::default()
        });
        let mut vm = TelemetryViewModel::initialize(
            channel,
            PreferenceStore::at(dir.path().join("preferences.json")),
            DEFAULT_CPU_FALLBACK_MAX_GHZ,
        );

        vm.mount(|_| {}).unwrap();
        vm.mount(|_| {}).unwrap();
        assert!(vm.is_mounted());
        assert_eq!(vm.channel.handler_count(), 3);

        vm.teardown().await;
        assert!(!vm.is_mounted());
        assert_eq!(vm.channel.handler_count(), 0);
        assert!(!vm.channel.is_active());
    }
}
