//! System metrics widgets: summary bars, the detail view's live charts and
//! the disk gauge.
//!
//! Charts exist only while the detail view is open. Samples that arrive
//! while they are absent still update the bars and are otherwise dropped.

use std::collections::VecDeque;

use crate::api::SystemStats;

/// Samples kept by each live chart unless configured otherwise.
pub const DEFAULT_WINDOW: usize = 20;

/// Fixed-capacity FIFO of recent samples.
///
/// Starts full of zeros so a chart always has `capacity` points; every push
/// drops the oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: std::iter::repeat_n(0.0, capacity).collect(),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// SVG polyline points for a `width`×`height` box, 0–100 scale.
    pub fn polyline_points(&self, width: f64, height: f64) -> String {
        let step = if self.capacity > 1 {
            width / (self.capacity - 1) as f64
        } else {
            0.0
        };
        self.samples
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let y = height - (clamp_percent(*v) / 100.0) * height;
                format!("{:.1},{:.1}", i as f64 * step, y)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A single 0–100 reading, drawn as a half-circle gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gauge {
    value: f64,
}

impl Gauge {
    pub fn set(&mut self, value: f64) {
        self.value = clamp_percent(value);
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A horizontal percentage bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bar {
    percent: f64,
}

impl Bar {
    pub fn set(&mut self, percent: f64) {
        self.percent = clamp_percent(percent);
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// CSS width, e.g. `"42%"`.
    pub fn width(&self) -> String {
        format!("{}%", self.percent)
    }

    /// Text next to the bar, e.g. `"42.0%"`.
    pub fn label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Live charts of the detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsCharts {
    pub cpu: RollingWindow,
    pub memory: RollingWindow,
    pub disk: Gauge,
}

impl MetricsCharts {
    pub fn new(window: usize) -> Self {
        Self {
            cpu: RollingWindow::new(window),
            memory: RollingWindow::new(window),
            disk: Gauge::default(),
        }
    }
}

/// Everything the metrics facet displays.
#[derive(Debug, Clone, Default)]
pub struct MetricsView {
    pub cpu: Bar,
    pub memory: Bar,
    pub disk: Bar,
    /// Last full sample, for the detail view's text.
    pub last: Option<SystemStats>,
    charts: Option<MetricsCharts>,
    /// Set when the latest poll failed; cleared by the next success.
    pub status: Option<String>,
}

impl MetricsView {
    /// Create the charts, replacing any existing ones.
    pub fn open_charts(&mut self, window: usize) {
        self.charts = Some(MetricsCharts::new(window));
    }

    pub fn close_charts(&mut self) {
        self.charts = None;
    }

    pub fn charts(&self) -> Option<&MetricsCharts> {
        self.charts.as_ref()
    }

    /// Apply one successful poll.
    pub fn apply(&mut self, stats: &SystemStats) {
        self.cpu.set(stats.cpu.percent);
        self.memory.set(stats.memory.percent);
        self.disk.set(stats.disk.percent);

        if let Some(charts) = self.charts.as_mut() {
            charts.cpu.push(stats.cpu.percent);
            charts.memory.push(stats.memory.percent);
            charts.disk.set(stats.disk.percent);
        }

        self.last = Some(stats.clone());
        self.status = None;
    }

    /// Record a failed poll. Displayed values are left as they were.
    pub fn record_failure(&mut self, message: &str) {
        self.status = Some(format!("Stats unavailable: {message}"));
    }

    /// The summary widget: three labelled bars.
    pub fn render_summary_html(&self) -> String {
        let mut html = String::from(r#"<div class="system-stats">"#);
        for (id, name, bar) in [
            ("cpu", "CPU", &self.cpu),
            ("ram", "RAM", &self.memory),
            ("disk", "Disk", &self.disk),
        ] {
            html.push_str(&format!(
                concat!(
                    r#"<div class="stat-row"><span class="stat-name">{name}</span>"#,
                    r#"<div class="stat-bar"><div id="{id}-bar" class="stat-fill" style="width: {width}"></div></div>"#,
                    r#"<span id="{id}-text" class="stat-text">{label}</span></div>"#
                ),
                name = name,
                id = id,
                width = bar.width(),
                label = bar.label(),
            ));
        }
        if let Some(status) = &self.status {
            html.push_str(&format!(
                r#"<div class="stat-status">{}</div>"#,
                super::format::escape_html(status)
            ));
        }
        html.push_str("</div>");
        html
    }

    /// The detail modal body: per-core text, two charts and the gauge.
    pub fn render_detail_html(&self) -> String {
        let Some(charts) = &self.charts else {
            return String::new();
        };
        let mut html = String::from(r#"<div class="metrics-detail">"#);

        if let Some(stats) = &self.last {
            html.push_str(&format!(
                concat!(
                    r#"<p class="cpu-info">{cores} cores @ {freq:.0} MHz</p>"#,
                    r#"<p class="mem-info">{used} / {total} used</p>"#,
                    r#"<p class="disk-info">{free} free of {disk_total}</p>"#
                ),
                cores = stats.cpu.cores,
                freq = stats.cpu.frequency,
                used = format_bytes(stats.memory.used),
                total = format_bytes(stats.memory.total),
                free = format_bytes(stats.disk.free),
                disk_total = format_bytes(stats.disk.total),
            ));
            html.push_str(r#"<ul class="per-core">"#);
            for (i, pct) in stats.cpu.per_core.iter().enumerate() {
                html.push_str(&format!("<li>Core {i}: {pct:.1}%</li>"));
            }
            html.push_str("</ul>");
        }

        for (id, window) in [("cpu-chart", &charts.cpu), ("memory-chart", &charts.memory)] {
            html.push_str(&format!(
                r#"<svg id="{id}" viewBox="0 0 200 60"><polyline fill="none" points="{}"/></svg>"#,
                window.polyline_points(200.0, 60.0)
            ));
        }
        html.push_str(&format!(
            r#"<div id="disk-gauge" class="gauge" data-value="{:.1}"></div>"#,
            charts.disk.value()
        ));
        html.push_str("</div>");
        html
    }
}

/// Human-readable byte count (binary units).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(cpu: f64, mem: f64, disk: f64) -> SystemStats {
        let mut s = SystemStats::default();
        s.cpu.percent = cpu;
        s.memory.percent = mem;
        s.disk.percent = disk;
        s
    }

    #[test]
    fn window_drops_oldest_after_capacity() {
        let mut window = RollingWindow::new(DEFAULT_WINDOW);
        for i in 1..=21 {
            window.push(i as f64);
        }
        assert_eq!(window.len(), 20);
        let samples: Vec<f64> = window.iter().collect();
        assert!(!samples.contains(&1.0));
        assert_eq!(samples.first(), Some(&2.0));
        assert_eq!(window.latest(), Some(21.0));
    }

    #[test]
    fn window_starts_full_of_zeros() {
        let window = RollingWindow::new(5);
        assert_eq!(window.len(), 5);
        assert!(window.iter().all(|v| v == 0.0));
        assert_eq!(RollingWindow::new(0).capacity(), 1);
    }

    #[test]
    fn bars_render_css_widths() {
        let mut view = MetricsView::default();
        view.apply(&stats(42.0, 10.0, 5.0));
        assert_eq!(view.cpu.width(), "42%");
        assert_eq!(view.memory.width(), "10%");
        assert_eq!(view.disk.width(), "5%");
        assert_eq!(view.cpu.label(), "42.0%");
        assert!(view.render_summary_html().contains(r#"id="cpu-bar" class="stat-fill" style="width: 42%""#));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut bar = Bar::default();
        bar.set(180.0);
        assert_eq!(bar.width(), "100%");
        bar.set(f64::NAN);
        assert_eq!(bar.width(), "0%");
    }

    #[test]
    fn samples_reach_charts_only_while_open() {
        let mut view = MetricsView::default();
        view.apply(&stats(1.0, 1.0, 1.0));
        assert!(view.charts().is_none());

        view.open_charts(DEFAULT_WINDOW);
        view.apply(&stats(50.0, 60.0, 70.0));
        let charts = view.charts().unwrap();
        assert_eq!(charts.cpu.latest(), Some(50.0));
        assert_eq!(charts.memory.latest(), Some(60.0));
        assert_eq!(charts.disk.value(), 70.0);
        assert!(view.render_detail_html().contains("cpu-chart"));

        view.close_charts();
        view.apply(&stats(9.0, 9.0, 9.0));
        assert!(view.charts().is_none());
        assert_eq!(view.render_detail_html(), "");
    }

    #[test]
    fn failure_keeps_previous_values() {
        let mut view = MetricsView::default();
        view.apply(&stats(42.0, 10.0, 5.0));
        view.record_failure("connection refused");
        assert_eq!(view.cpu.width(), "42%");
        assert!(view.status.as_deref().unwrap().contains("connection refused"));
        view.apply(&stats(43.0, 10.0, 5.0));
        assert!(view.status.is_none());
    }

    #[test]
    fn format_bytes_picks_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
