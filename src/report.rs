use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::dashboard::{compare, StatKey};
use crate::models::{Student, Study, StudySummary};

const LEADERBOARD_COLUMNS: [StatKey; 7] = [
    StatKey::Overall,
    StatKey::ProblemSolving,
    StatKey::Speed,
    StatKey::Memory,
    StatKey::Attention,
    StatKey::Flexibility,
    StatKey::Math,
];

pub fn summarize_by_study(students: &[Student]) -> Vec<StudySummary> {
    [Study::First, Study::Second]
        .into_iter()
        .map(|study| {
            let cohort: Vec<&Student> = students
                .iter()
                .filter(|student| student.study == study)
                .collect();
            let total = cohort
                .iter()
                .fold(0i64, |total, student| total.saturating_add(student.lpi.overall));
            let leader = cohort
                .iter()
                .copied()
                .reduce(|best, student| {
                    if student.lpi.overall > best.lpi.overall {
                        student
                    } else {
                        best
                    }
                })
                .map(|student| student.name.clone());

            StudySummary {
                study,
                count: cohort.len(),
                avg_overall: if cohort.is_empty() {
                    0.0
                } else {
                    total as f64 / cohort.len() as f64
                },
                leader,
            }
        })
        .collect()
}

/// Plain-text table of `students` ranked by `stat`. Zero scores show as `-`.
pub fn render_leaderboard(students: &[Student], stat: StatKey, limit: usize) -> String {
    let mut output = String::new();

    if students.is_empty() {
        let _ = writeln!(output, "No student data available for this year.");
        return output;
    }

    let _ = write!(output, "{:<4} {:<24}", "#", "User");
    for column in LEADERBOARD_COLUMNS {
        let _ = write!(output, " {:>15}", column.label());
    }
    let _ = writeln!(output);

    let mut ranked: Vec<&Student> = students.iter().collect();
    ranked.sort_by(|a, b| stat.value(b).cmp(&stat.value(a)));

    for (position, student) in ranked.iter().take(limit).enumerate() {
        let _ = write!(output, "{:<4} {:<24}", position + 1, student.name);
        for column in LEADERBOARD_COLUMNS {
            let _ = write!(output, " {:>15}", score_cell(column.value(student)));
        }
        let _ = writeln!(output);
    }

    output
}

pub fn render_student_detail(student: &Student, peers: &[Student], stat: StatKey) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{}'s Stats ({})", student.name, student.study.label());
    let _ = writeln!(output);
    let _ = writeln!(output, "Cognitive performance index");
    for key in StatKey::ALL {
        let _ = writeln!(output, "  {:<16} {:>6}", key.label(), key.value(student));
    }
    let _ = writeln!(
        output,
        "  First LPI {}  |  Best LPI {}",
        student.lpi.first_lpi, student.lpi.best_lpi
    );

    let percentiles = &student.percentiles;
    let _ = writeln!(output);
    let _ = writeln!(output, "How I Compare (percentile)");
    for (label, value) in [
        ("Overall", percentiles.overall),
        ("Speed", percentiles.speed),
        ("Problem Solving", percentiles.problem_solving),
        ("Memory", percentiles.memory),
        ("Attention", percentiles.attention),
        ("Flexibility", percentiles.flexibility),
        ("Math", percentiles.math),
    ] {
        let _ = writeln!(output, "  {:<16} {:>5.1}%", label, value);
    }

    let history: Vec<&str> = student
        .streaks
        .history
        .iter()
        .map(|active| if *active { "x" } else { "." })
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Training Streaks: current {} days, best {} days  [{}]",
        student.streaks.current,
        student.streaks.best,
        history.join(" ")
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Game Rankings");
    if student.game_rankings.is_empty() {
        let _ = writeln!(output, "  No ranked games yet.");
    }
    for game in &student.game_rankings {
        let _ = writeln!(
            output,
            "  {:>2}. {:<24} {:>6}  ({})",
            game.rank.unwrap_or_default(),
            game.name,
            game.score.unwrap_or_default(),
            game.icon_color
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Most Improved Games");
    if student.most_improved_games.is_empty() {
        let _ = writeln!(output, "  No improvement recorded yet.");
    }
    for game in &student.most_improved_games {
        let _ = writeln!(
            output,
            "  {:<28} LPI Increase: {}  ({})",
            game.name,
            game.lpi_increase.unwrap_or_default(),
            game.icon_color
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} Comparison ({} players)",
        stat.label(),
        student.study.label()
    );
    let entries = compare(peers, stat, Some(student.id));
    let max_value = entries.iter().map(|entry| entry.value).max().unwrap_or(0).max(1);
    for entry in entries {
        let width = (i128::from(entry.value.max(0)) * 30 / i128::from(max_value)) as usize;
        let marker = if entry.is_selected { '>' } else { ' ' };
        let _ = writeln!(
            output,
            "{} {:<24} {:>6} {}",
            marker,
            entry.name,
            entry.value,
            "#".repeat(width)
        );
    }

    output
}

pub fn build_report(
    students: &[Student],
    advisory: Option<&str>,
    generated_at: DateTime<Utc>,
) -> String {
    let summaries = summarize_by_study(students);
    let mut output = String::new();

    let _ = writeln!(output, "# LPI Performance Report");
    let _ = writeln!(
        output,
        "Generated {} for {} players",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        students.len()
    );
    if let Some(advisory) = advisory {
        let _ = writeln!(output);
        let _ = writeln!(output, "> {advisory}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Study Years");
    for summary in &summaries {
        let _ = writeln!(
            output,
            "- {}: {} players (avg overall LPI {:.1}, leader {})",
            summary.study.label(),
            summary.count,
            summary.avg_overall,
            summary.leader.as_deref().unwrap_or("none")
        );
    }

    for study in [Study::First, Study::Second] {
        let cohort: Vec<Student> = students
            .iter()
            .filter(|student| student.study == study)
            .cloned()
            .collect();
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} Leaderboard", study.label());
        if cohort.is_empty() {
            let _ = writeln!(output, "No student data available for this year.");
            continue;
        }
        for (position, entry) in compare(&cohort, StatKey::Overall, None).iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({})",
                position + 1,
                entry.name,
                score_cell(entry.value)
            );
        }
    }

    let mut improvements: Vec<(&str, &str, i64)> = students
        .iter()
        .flat_map(|student| {
            student.most_improved_games.iter().map(move |game| {
                (
                    student.name.as_str(),
                    game.name.as_str(),
                    game.lpi_increase.unwrap_or_default(),
                )
            })
        })
        .collect();
    improvements.sort_by(|a, b| b.2.cmp(&a.2));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Biggest Improvements");
    if improvements.is_empty() {
        let _ = writeln!(output, "No improvement recorded yet.");
    } else {
        for (name, game, increase) in improvements.iter().take(5) {
            let _ = writeln!(output, "- {name}: {game} (+{increase} LPI)");
        }
    }

    let mut streaks: Vec<&Student> = students.iter().collect();
    streaks.sort_by(|a, b| b.streaks.current.cmp(&a.streaks.current));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Streaks");
    let active: Vec<&&Student> = streaks
        .iter()
        .filter(|student| student.streaks.current > 0)
        .take(5)
        .collect();
    if active.is_empty() {
        let _ = writeln!(output, "No active streaks.");
    } else {
        for student in active {
            let _ = writeln!(
                output,
                "- {}: {} days (best {})",
                student.name, student.streaks.current, student.streaks.best
            );
        }
    }

    output
}

fn score_cell(value: i64) -> String {
    if value == 0 {
        "-".to_string()
    } else {
        value.to_string()
    }
}
