use crate::models::{Game, LpiScores, Percentiles, Streaks, Student, Study};

type Ranked = (&'static str, i64, &'static str);
type Record = (
    &'static str,
    Study,
    [i64; 9],
    [f64; 7],
    (i64, i64, [bool; 7]),
    [Ranked; 3],
    [Ranked; 3],
);

/// Bundled snapshot shown when the live results cannot be loaded.
pub fn students() -> Vec<Student> {
    let records: Vec<Record> = vec![
        (
            "kulkarni naga sravani",
            Study::First,
            [781, 708, 773, 834, 987, 401, 907, 749, 789],
            [32.0, 27.7, 17.6, 25.8, 35.2, 52.8, 49.7],
            (1, 5, [true, false, false, true, true, true, true]),
            [
                ("Raindrops", 1494, "bg-cyan-500"),
                ("Memory Matrix", 1263, "bg-red-500"),
                ("Lost in Migration", 1262, "bg-sky-600"),
            ],
            [
                ("Raindrops", 182, "bg-cyan-500"),
                ("Trouble Brewing", 120, "bg-amber-500"),
                ("Train of Thought", 92, "bg-lime-500"),
            ],
        ),
        (
            "syed arman",
            Study::Second,
            [1239, 1284, 1045, 1624, 1041, 634, 1116, 1100, 1250],
            [88.0, 92.1, 60.5, 78.3, 95.0, 81.2, 85.4],
            (12, 15, [true, true, true, true, false, true, true]),
            [
                ("Eagle Eye", 1840, "bg-indigo-500"),
                ("Speed Match", 1755, "bg-pink-500"),
                ("Pinball Recall", 1500, "bg-purple-500"),
            ],
            [
                ("Attention", 210, "bg-indigo-500"),
                ("Speed Match", 150, "bg-pink-500"),
                ("Flexibility Flow", 110, "bg-green-500"),
            ],
        ),
        (
            "karthikeya",
            Study::First,
            [661, 502, 469, 751, 957, 373, 298, 600, 670],
            [25.0, 18.2, 15.0, 17.5, 30.1, 48.9, 12.3],
            (2, 4, [false, false, true, true, false, true, true]),
            [
                ("Penguin Pursuit", 1100, "bg-gray-400"),
                ("Word Bubbles", 980, "bg-teal-500"),
                ("Color Match", 950, "bg-orange-500"),
            ],
            [
                ("Flexibility", 88, "bg-orange-500"),
                ("Attention Grabber", 72, "bg-teal-500"),
                ("Problem Solving", 50, "bg-rose-500"),
            ],
        ),
        (
            "adarsh",
            Study::Second,
            [904, 893, 824, 1051, 891, 893, 1066, 850, 910],
            [65.0, 68.4, 70.1, 63.2, 75.8, 67.3, 79.9],
            (7, 7, [true; 7]),
            [
                ("Math Master", 1600, "bg-blue-700"),
                ("Logic Train", 1420, "bg-emerald-500"),
                ("Speed Drills", 1380, "bg-fuchsia-500"),
            ],
            [
                ("Problem Solving", 125, "bg-emerald-500"),
                ("Math Master", 115, "bg-blue-700"),
                ("Memory Lane", 85, "bg-violet-500"),
            ],
        ),
        (
            "venkat k",
            Study::First,
            [0, 220, 1147, 304, 210, 0, 1023, 0, 0],
            [0.0, 5.6, 0.0, 85.2, 8.3, 4.1, 77.0],
            (0, 2, [false, false, false, false, false, true, true]),
            [
                ("Memory Match", 1800, "bg-yellow-400"),
                ("Math Blaster", 1500, "bg-red-600"),
                ("Pattern Recognition", 900, "bg-green-600"),
            ],
            [
                ("Memory", 250, "bg-yellow-400"),
                ("Math", 180, "bg-red-600"),
                ("Attention Focus", 30, "bg-blue-400"),
            ],
        ),
    ];

    records
        .into_iter()
        .zip(1u32..)
        .map(|((name, study, lpi, percentiles, streaks, top, improved), id)| Student {
            id,
            name: name.to_string(),
            study,
            lpi: LpiScores {
                overall: lpi[0],
                speed: lpi[1],
                memory: lpi[2],
                attention: lpi[3],
                flexibility: lpi[4],
                problem_solving: lpi[5],
                math: lpi[6],
                first_lpi: lpi[7],
                best_lpi: lpi[8],
            },
            // overall, speed, problem solving, memory, attention, flexibility, math
            percentiles: Percentiles {
                overall: percentiles[0],
                speed: percentiles[1],
                problem_solving: percentiles[2],
                memory: percentiles[3],
                attention: percentiles[4],
                flexibility: percentiles[5],
                math: percentiles[6],
            },
            streaks: Streaks {
                current: streaks.0,
                best: streaks.1,
                history: streaks.2,
            },
            game_rankings: top
                .into_iter()
                .zip(1i64..)
                .map(|((name, score, color), rank)| Game {
                    name: name.to_string(),
                    rank: Some(rank),
                    score: Some(score),
                    lpi_increase: None,
                    icon_color: color.to_string(),
                })
                .collect(),
            most_improved_games: improved
                .into_iter()
                .map(|(name, increase, color)| Game {
                    name: name.to_string(),
                    rank: None,
                    score: None,
                    lpi_increase: Some(increase),
                    icon_color: color.to_string(),
                })
                .collect(),
        })
        .collect()
}
