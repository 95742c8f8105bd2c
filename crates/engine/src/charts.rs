use furrow_protocol::{Action, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointColor {
    SeriesDefault,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub day: u32,
    pub label: String,
    pub parameters: Vec<String>,
    pub success: bool,
}

impl ChartPoint {
    pub fn color(&self) -> PointColor {
        if self.success {
            PointColor::SeriesDefault
        } else {
            PointColor::Error
        }
    }
}

/// One player's actions over time. The label axis is categorical and only grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    player: PlayerId,
    labels: Vec<String>,
    points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            labels: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Distinct action names in first-seen order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    fn push(&mut self, day: u32, action: &Action, success: bool) {
        if self.label_index(&action.name).is_none() {
            self.labels.push(action.name.clone());
        }
        self.points.push(ChartPoint {
            day,
            label: action.name.clone(),
            parameters: action.parameters.clone(),
            success,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCharts {
    series: [ChartSeries; 2],
}

impl Default for ActionCharts {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionCharts {
    pub fn new() -> Self {
        Self {
            series: [ChartSeries::new(PlayerId::One), ChartSeries::new(PlayerId::Two)],
        }
    }

    pub fn series(&self, player: PlayerId) -> &ChartSeries {
        &self.series[player.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartSeries> {
        self.series.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    /// Adds a point for `action` on `day`. `last_entry_failed` is whether that
    /// player's most recently rendered log entry was styled as an error.
    /// Returns false when the action has no name and nothing was recorded.
    pub fn record(
        &mut self,
        day: u32,
        player: PlayerId,
        action: &Action,
        last_entry_failed: bool,
    ) -> bool {
        if action.name.trim().is_empty() {
            return false;
        }
        self.series[player.index()].push(day, action, !last_entry_failed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(name: &str, params: &[&str]) -> Action {
        Action {
            name: name.to_string(),
            parameters: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn labels_keep_first_seen_order_without_duplicates() {
        let mut charts = ActionCharts::new();
        charts.record(1, PlayerId::One, &action("Plant", &["Wheat", "1"]), false);
        charts.record(2, PlayerId::One, &action("Rest", &[]), false);
        charts.record(3, PlayerId::One, &action("Plant", &["Corn", "1"]), true);

        let series = charts.series(PlayerId::One);
        assert_eq!(series.labels(), ["Plant", "Rest"]);
        assert_eq!(series.points().len(), 3);
        assert_eq!(series.points()[2].parameters, vec!["Corn", "1"]);
        assert_eq!(series.points()[2].color(), PointColor::Error);
        assert_eq!(series.points()[0].color(), PointColor::SeriesDefault);
        assert!(charts.series(PlayerId::Two).points().is_empty());
    }

    #[test]
    fn unnamed_actions_are_not_plotted() {
        let mut charts = ActionCharts::new();
        assert!(!charts.record(1, PlayerId::Two, &action("  ", &[]), false));
        assert!(charts.is_empty());
        assert!(charts.series(PlayerId::Two).labels().is_empty());
    }
}
