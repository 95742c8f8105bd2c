use crate::charts::ActionCharts;
use crate::logbook::{LogLine, LogPanel};
use crate::render::{PlotRow, StatsRow};
use furrow_protocol::{GameOutcome, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Controls {
    pub const IDLE: Controls = Controls {
        start_enabled: true,
        stop_enabled: false,
    };
    pub const RUNNING: Controls = Controls {
        start_enabled: false,
        stop_enabled: true,
    };
}

/// Presentation capabilities the session drives. Implementations own the actual
/// widgets; every call replaces what was shown for that element before.
pub trait View {
    fn render_controls(&mut self, controls: Controls);
    fn render_day(&mut self, day: u32);
    fn render_season(&mut self, label: &str);
    fn render_weather(&mut self, label: &str);
    fn render_farm(&mut self, player: PlayerId, plots: &[PlotRow]);
    fn render_stats(&mut self, player: PlayerId, stats: &StatsRow);
    fn render_log(&mut self, panel: LogPanel, lines: &[LogLine]);
    fn render_charts(&mut self, charts: &ActionCharts);
    fn render_outcome(&mut self, outcome: &GameOutcome);

    /// Called once a batch of updates is complete.
    fn flush(&mut self) {}
}

impl<V: View + ?Sized> View for &mut V {
    fn render_controls(&mut self, controls: Controls) {
        (**self).render_controls(controls)
    }
    fn render_day(&mut self, day: u32) {
        (**self).render_day(day)
    }
    fn render_season(&mut self, label: &str) {
        (**self).render_season(label)
    }
    fn render_weather(&mut self, label: &str) {
        (**self).render_weather(label)
    }
    fn render_farm(&mut self, player: PlayerId, plots: &[PlotRow]) {
        (**self).render_farm(player, plots)
    }
    fn render_stats(&mut self, player: PlayerId, stats: &StatsRow) {
        (**self).render_stats(player, stats)
    }
    fn render_log(&mut self, panel: LogPanel, lines: &[LogLine]) {
        (**self).render_log(panel, lines)
    }
    fn render_charts(&mut self, charts: &ActionCharts) {
        (**self).render_charts(charts)
    }
    fn render_outcome(&mut self, outcome: &GameOutcome) {
        (**self).render_outcome(outcome)
    }
    fn flush(&mut self) {
        (**self).flush()
    }
}
