use serde_json::Value;
use tracing::{debug, error};

use crate::coerce::{is_truthy, to_integer, to_percent};
use crate::models::{Game, LpiScores, PaletteCursor, Percentiles, Streaks, Student, Study};

/// Normalizes every raw student in `data`, in order.
///
/// Anything other than a JSON array degrades to an empty list. Each call
/// starts its own palette cursor, so colors repeat for identical input.
pub fn transform_students(data: &Value) -> Vec<Student> {
    let Some(records) = data.as_array() else {
        error!(payload = %data, "student payload is not an array");
        return Vec::new();
    };

    let mut cursor = PaletteCursor::default();
    let students: Vec<Student> = records
        .iter()
        .enumerate()
        .map(|(position, raw)| normalize_student(raw, position, &mut cursor))
        .collect();
    debug!(
        students = students.len(),
        games = cursor.position(),
        "normalized student payload"
    );
    students
}

/// Maps one raw API record onto a [`Student`]; `position` is its zero-based
/// index in the batch.
pub fn normalize_student(raw: &Value, position: usize, cursor: &mut PaletteCursor) -> Student {
    let area = |name: &str, field: &str| raw.pointer(&format!("/lpi/byArea/{name}/{field}"));
    let percentile = |name: &str| to_percent(raw.pointer(&format!("/percentiles/{name}")));

    let name = raw
        .pointer("/summary/user")
        .and_then(Value::as_str)
        .filter(|user| !user.is_empty())
        .unwrap_or("Unknown")
        .to_lowercase();

    let study = match raw.pointer("/accountInfo/study").and_then(Value::as_str) {
        Some("second") => Study::Second,
        _ => Study::First,
    };

    let lpi = LpiScores {
        overall: to_integer(raw.pointer("/lpi/overall")),
        speed: to_integer(area("speed", "current")),
        memory: to_integer(area("memory", "current")),
        attention: to_integer(area("attention", "current")),
        flexibility: to_integer(area("flexibility", "current")),
        problem_solving: to_integer(area("problem-solving", "current")),
        math: to_integer(area("math", "current")),
        first_lpi: first_lpi(raw),
        best_lpi: to_integer(raw.pointer("/lpi/best")),
    };

    let percentiles = Percentiles {
        overall: 0.0,
        speed: percentile("speed"),
        problem_solving: percentile("problem-solving"),
        memory: percentile("memory"),
        attention: percentile("attention"),
        flexibility: percentile("flexibility"),
        math: percentile("math"),
    };

    let streaks = Streaks {
        current: to_integer(raw.pointer("/streaks/current")),
        best: to_integer(raw.pointer("/streaks/best")),
        history: [false; 7],
    };

    let game_rankings = games(raw, "/rankings/topGames")
        .map(|game| Game {
            name: display_name(game),
            rank: Some(to_integer(game.get("rank"))),
            score: Some(to_integer(game.get("lpi"))),
            lpi_increase: None,
            icon_color: cursor.next_color().to_string(),
        })
        .collect();

    let most_improved_games = games(raw, "/rankings/mostImproved")
        .map(|game| Game {
            name: display_name(game),
            rank: None,
            score: None,
            lpi_increase: Some(to_integer(game.get("improvement"))),
            icon_color: cursor.next_color().to_string(),
        })
        .collect();

    Student {
        id: u32::try_from(position + 1).unwrap_or(u32::MAX),
        name,
        study,
        lpi,
        percentiles,
        streaks,
        game_rankings,
        most_improved_games,
    }
}

/// There is no top-level first LPI, so the first area that reports one wins,
/// in the order the payload lists its areas.
fn first_lpi(raw: &Value) -> i64 {
    raw.pointer("/lpi/byArea")
        .and_then(Value::as_object)
        .and_then(|areas| {
            areas
                .values()
                .filter_map(|area| area.get("first"))
                .find(|first| is_truthy(first))
        })
        .map_or(0, |first| to_integer(Some(first)))
}

fn games<'a>(raw: &'a Value, path: &str) -> impl Iterator<Item = &'a Value> {
    raw.pointer(path)
        .and_then(Value::as_array)
        .map(|games| games.iter())
        .into_iter()
        .flatten()
}

fn display_name(game: &Value) -> String {
    game.get("game")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .replace('-', " ")
}
