use serde::{Deserialize, Serialize};

/// Icon colors handed out to game entries in round-robin order.
pub const GAME_ICON_COLORS: [&str; 18] = [
    "bg-cyan-500",
    "bg-red-500",
    "bg-sky-600",
    "bg-amber-500",
    "bg-lime-500",
    "bg-indigo-500",
    "bg-pink-500",
    "bg-purple-500",
    "bg-gray-400",
    "bg-teal-500",
    "bg-orange-500",
    "bg-blue-700",
    "bg-emerald-500",
    "bg-fuchsia-500",
    "bg-violet-500",
    "bg-yellow-400",
    "bg-green-600",
    "bg-rose-500",
];

/// Position in [`GAME_ICON_COLORS`] for one transformation pass.
#[derive(Debug, Clone, Default)]
pub struct PaletteCursor {
    position: usize,
}

impl PaletteCursor {
    pub fn next_color(&mut self) -> &'static str {
        let color = GAME_ICON_COLORS[self.position % GAME_ICON_COLORS.len()];
        self.position += 1;
        color
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Study {
    #[default]
    First,
    Second,
}

impl Study {
    pub fn label(self) -> &'static str {
        match self {
            Study::First => "1st Year",
            Study::Second => "2nd Year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: u32,
    pub name: String,
    pub study: Study,
    pub lpi: LpiScores,
    pub percentiles: Percentiles,
    pub streaks: Streaks,
    pub game_rankings: Vec<Game>,
    pub most_improved_games: Vec<Game>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpiScores {
    pub overall: i64,
    pub speed: i64,
    pub memory: i64,
    pub attention: i64,
    pub flexibility: i64,
    pub problem_solving: i64,
    pub math: i64,
    pub first_lpi: i64,
    pub best_lpi: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Percentiles {
    /// Always 0; the results API no longer reports an overall percentile.
    pub overall: f64,
    pub speed: f64,
    pub problem_solving: f64,
    pub memory: f64,
    pub attention: f64,
    pub flexibility: f64,
    pub math: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streaks {
    pub current: i64,
    pub best: i64,
    /// Weekly activity, oldest day first.
    pub history: [bool; 7],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lpi_increase: Option<i64>,
    pub icon_color: String,
}

#[derive(Debug, Clone)]
pub struct StudySummary {
    pub study: Study,
    pub count: usize,
    pub avg_overall: f64,
    pub leader: Option<String>,
}
