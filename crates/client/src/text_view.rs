use furrow_engine::{
    ActionCharts, ChartSeries, Controls, LogLine, LogPanel, PlotRow, PointColor, StatsRow, View,
};
use furrow_protocol::{GameOutcome, PlayerId};
use std::fmt::Write as _;
use std::io::Write;
use tracing::warn;

/// Days shown per chart row.
const CHART_WINDOW: u32 = 60;

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Default)]
struct Screen {
    controls: Option<Controls>,
    day: Option<u32>,
    season: String,
    weather: String,
    farms: [Vec<PlotRow>; 2],
    stats: [Option<StatsRow>; 2],
    logs: Vec<(LogPanel, Vec<LogLine>)>,
    charts: Option<ActionCharts>,
    outcome: Option<GameOutcome>,
}

/// Plain-text [`View`]. Updates are buffered and the whole screen is redrawn on
/// [`View::flush`].
pub struct TextView<W: Write> {
    out: W,
    color: bool,
    screen: Screen,
}

impl<W: Write> TextView<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            screen: Screen::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self) -> String {
        let s = &self.screen;
        let mut buf = String::new();
        if self.color {
            buf.push_str(CLEAR_SCREEN);
        }

        if let Some(controls) = s.controls {
            let _ = writeln!(
                buf,
                "[start: {}] [stop: {}]",
                on_off(controls.start_enabled),
                on_off(controls.stop_enabled)
            );
        }
        match s.day {
            Some(day) => {
                let _ = writeln!(buf, "Day {day}  {}  {}", s.season, s.weather);
            }
            None => {
                let _ = writeln!(buf, "Day -");
            }
        }

        for player in PlayerId::ALL {
            let _ = writeln!(buf, "\n== {player} ==");
            if let Some(stats) = &s.stats[player.index()] {
                self.paint_stats(&mut buf, stats);
            }
            for row in &s.farms[player.index()] {
                match &row.crop {
                    Some(crop) => {
                        let _ = writeln!(
                            buf,
                            "  plot {:>2}  soil {}  {} {}",
                            row.index, row.soil_quality, crop.kind, crop.growth
                        );
                    }
                    None => {
                        let _ = writeln!(
                            buf,
                            "  plot {:>2}  soil {}  vacant",
                            row.index, row.soil_quality
                        );
                    }
                }
            }
        }

        for (panel, lines) in &s.logs {
            let title = match panel {
                LogPanel::Combined => "log".to_string(),
                LogPanel::Player(player) => format!("{player} log"),
            };
            let _ = writeln!(buf, "\n-- {title} --");
            for line in lines {
                self.paint_log_line(&mut buf, line);
            }
        }

        if let Some(charts) = &s.charts {
            for series in charts.iter() {
                paint_series(&mut buf, series);
            }
        }

        if let Some(outcome) = &s.outcome {
            let _ = write!(buf, "\nGame over on day {}: {}", outcome.day, outcome.winner);
            let scores: Vec<String> = PlayerId::ALL
                .into_iter()
                .filter_map(|p| outcome.score(p).map(|score| format!("{p} {score}")))
                .collect();
            if !scores.is_empty() {
                let _ = write!(buf, " ({})", scores.join(", "));
            }
            buf.push('\n');
        }
        buf
    }

    fn paint_stats(&self, buf: &mut String, stats: &StatsRow) {
        let _ = writeln!(buf, "  money {}  energy {}", stats.money, stats.energy);
        if !stats.harvested.is_empty() {
            let crops: Vec<String> = stats
                .harvested
                .iter()
                .map(|(crop, qty)| format!("{crop} {qty}"))
                .collect();
            let _ = writeln!(buf, "  harvested: {}", crops.join(", "));
        }
        if !stats.upgrades.is_empty() {
            let _ = writeln!(buf, "  upgrades: {}", stats.upgrades.join(", "));
        }
    }

    fn paint_log_line(&self, buf: &mut String, line: &LogLine) {
        if !line.is_error() {
            let _ = writeln!(buf, "  ✓ {}", line.text);
        } else if self.color {
            let _ = writeln!(buf, "  {RED}✗ {}{RESET}", line.text);
        } else {
            let _ = writeln!(buf, "  ✗ {}", line.text);
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

// One row per action label, one column per day: `o` plotted, `x` plotted after a
// failed log entry, `.` nothing that day.
fn paint_series(buf: &mut String, series: &ChartSeries) {
    let _ = writeln!(buf, "\n-- {} actions --", series.player());
    let Some(last) = series.points().last().map(|p| p.day) else {
        let _ = writeln!(buf, "  (none yet)");
        return;
    };
    let first = series
        .points()
        .first()
        .map(|p| p.day)
        .unwrap_or(last)
        .max(last.saturating_sub(CHART_WINDOW - 1));
    let width = series.labels().iter().map(|l| l.chars().count()).max().unwrap_or(0);

    for label in series.labels() {
        let mut row: Vec<char> = (first..=last).map(|_| '.').collect();
        for point in series.points() {
            if point.label != *label || point.day < first {
                continue;
            }
            if let Some(cell) = row.get_mut((point.day - first) as usize) {
                *cell = match point.color() {
                    PointColor::SeriesDefault => 'o',
                    PointColor::Error => 'x',
                };
            }
        }
        let row: String = row.into_iter().collect();
        let _ = writeln!(buf, "  {label:>width$} |{row}");
    }
    let _ = writeln!(buf, "  {:>width$}  days {first}-{last}", "");
}

impl<W: Write> View for TextView<W> {
    fn render_controls(&mut self, controls: Controls) {
        // Controls only go to running when a new game starts.
        if controls == Controls::RUNNING {
            self.screen.outcome = None;
        }
        self.screen.controls = Some(controls);
    }

    fn render_day(&mut self, day: u32) {
        self.screen.day = Some(day);
    }

    fn render_season(&mut self, label: &str) {
        self.screen.season = label.to_string();
    }

    fn render_weather(&mut self, label: &str) {
        self.screen.weather = label.to_string();
    }

    fn render_farm(&mut self, player: PlayerId, plots: &[PlotRow]) {
        self.screen.farms[player.index()] = plots.to_vec();
    }

    fn render_stats(&mut self, player: PlayerId, stats: &StatsRow) {
        self.screen.stats[player.index()] = Some(stats.clone());
    }

    fn render_log(&mut self, panel: LogPanel, lines: &[LogLine]) {
        let logs = &mut self.screen.logs;
        match logs.iter_mut().find(|(p, _)| *p == panel) {
            Some((_, shown)) => *shown = lines.to_vec(),
            None => logs.push((panel, lines.to_vec())),
        }
    }

    fn render_charts(&mut self, charts: &ActionCharts) {
        self.screen.charts = Some(charts.clone());
    }

    fn render_outcome(&mut self, outcome: &GameOutcome) {
        self.screen.outcome = Some(outcome.clone());
    }

    fn flush(&mut self) {
        let text = self.paint();
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %err, "failed to draw screen");
        }
    }
}
