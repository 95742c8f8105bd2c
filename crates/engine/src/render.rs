use crate::logbook::{LogBook, LogLayout};
use crate::view::View;
use furrow_protocol::{GameState, PlayerId, PlayerState, Plot};

const SEASON_LABELS: [(&str, &str); 4] = [
    ("Spring", "🌱 Spring"),
    ("Summer", "☀️ Summer"),
    ("Fall", "🍂 Fall"),
    ("Winter", "❄️ Winter"),
];

const WEATHER_LABELS: [(&str, &str); 4] = [
    ("Sunny", "☀️ Sunny"),
    ("Rainy", "🌧️ Rainy"),
    ("Drought", "🏜️ Drought"),
    ("Storm", "⛈️ Storm"),
];

fn lookup(table: &[(&str, &'static str)], value: &str) -> String {
    table
        .iter()
        .find(|(k, _)| *k == value)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Unknown seasons pass through unchanged.
pub fn season_label(season: &str) -> String {
    lookup(&SEASON_LABELS, season)
}

/// Unknown weather passes through unchanged.
pub fn weather_label(weather: &str) -> String {
    lookup(&WEATHER_LABELS, weather)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRow {
    /// 1-based.
    pub index: usize,
    pub soil_quality: String,
    pub crop: Option<CropRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropRow {
    pub kind: String,
    pub growth: String,
}

impl PlotRow {
    pub fn new(index: usize, plot: &Plot) -> Self {
        Self {
            index,
            soil_quality: format!("{:.2}", plot.soil_quality),
            crop: plot.crop.as_ref().map(|c| CropRow {
                kind: c.kind.clone(),
                growth: format!("{:.2}%", c.growth_progress * 100.0),
            }),
        }
    }
}

pub fn farm_rows(plots: &[Plot]) -> Vec<PlotRow> {
    plots
        .iter()
        .enumerate()
        .map(|(i, plot)| PlotRow::new(i + 1, plot))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRow {
    pub money: String,
    pub energy: String,
    pub harvested: Vec<(String, String)>,
    pub upgrades: Vec<String>,
}

impl StatsRow {
    pub fn zeroed() -> Self {
        Self {
            money: "0".to_string(),
            energy: "0".to_string(),
            harvested: Vec::new(),
            upgrades: Vec::new(),
        }
    }

    pub fn from_player(player: &PlayerState) -> Self {
        Self {
            money: player.money.to_string(),
            energy: player.energy.to_string(),
            harvested: player
                .harvested_crops
                .iter()
                .map(|(crop, qty)| (crop.clone(), qty.to_string()))
                .collect(),
            upgrades: player.upgrades.clone(),
        }
    }
}

/// Rebuilds every snapshot-driven element of a [`View`] from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateRenderer {
    layout: LogLayout,
}

impl StateRenderer {
    pub fn new(layout: LogLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> LogLayout {
        self.layout
    }

    /// Renders `state` and returns the log book that was shown, which the chart
    /// recorder uses to colour the day's actions.
    pub fn render<V: View + ?Sized>(&self, state: &GameState, view: &mut V) -> LogBook {
        view.render_day(state.current_day);
        // Both players share the season and weather.
        view.render_season(&season_label(&state.player1.season));
        view.render_weather(&weather_label(&state.player1.weather));

        for player in PlayerId::ALL {
            let p = state.player(player);
            view.render_farm(player, &farm_rows(&p.plots));
            view.render_stats(player, &StatsRow::from_player(p));
        }

        let book = LogBook::build(&state.game_log, self.layout);
        for (panel, lines) in &book.panels {
            view.render_log(*panel, lines);
        }
        book
    }

    /// Resets stats to zero and empties the log panels.
    pub fn clear<V: View + ?Sized>(&self, view: &mut V) {
        let zero = StatsRow::zeroed();
        for player in PlayerId::ALL {
            view.render_stats(player, &zero);
        }
        for (panel, lines) in &LogBook::empty(self.layout).panels {
            view.render_log(*panel, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furrow_protocol::Crop;

    #[test]
    fn plot_numbers_are_formatted_to_two_decimals() {
        let row = PlotRow::new(
            1,
            &Plot {
                soil_quality: 0.4567,
                crop: Some(Crop {
                    kind: "Wheat".to_string(),
                    growth_progress: 0.5,
                }),
            },
        );
        assert_eq!(row.soil_quality, "0.46");
        let crop = row.crop.unwrap();
        assert_eq!(crop.kind, "Wheat");
        assert_eq!(crop.growth, "50.00%");
    }

    #[test]
    fn vacant_plots_have_no_crop_row_and_are_numbered_from_one() {
        let rows = farm_rows(&[
            Plot {
                soil_quality: 1.0,
                crop: None,
            },
            Plot {
                soil_quality: 0.1,
                crop: None,
            },
        ]);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[0].soil_quality, "1.00");
        assert!(rows.iter().all(|r| r.crop.is_none()));
    }

    #[test]
    fn known_seasons_and_weather_map_to_symbols() {
        assert_eq!(season_label("Winter"), "❄️ Winter");
        assert_eq!(weather_label("Storm"), "⛈️ Storm");
    }

    #[test]
    fn unknown_labels_pass_through() {
        assert_eq!(season_label("Monsoon"), "Monsoon");
        assert_eq!(weather_label("Hail"), "Hail");
        assert_eq!(season_label(""), "");
    }
}
