use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::models::{Student, Study};

#[derive(Serialize)]
struct CsvRow<'a> {
    id: u32,
    name: &'a str,
    study: Study,
    overall: i64,
    speed: i64,
    memory: i64,
    attention: i64,
    flexibility: i64,
    problem_solving: i64,
    math: i64,
    first_lpi: i64,
    best_lpi: i64,
    speed_percentile: f64,
    memory_percentile: f64,
    attention_percentile: f64,
    flexibility_percentile: f64,
    problem_solving_percentile: f64,
    math_percentile: f64,
    current_streak: i64,
    best_streak: i64,
    top_game: &'a str,
    most_improved_game: &'a str,
}

impl<'a> From<&'a Student> for CsvRow<'a> {
    fn from(student: &'a Student) -> Self {
        Self {
            id: student.id,
            name: &student.name,
            study: student.study,
            overall: student.lpi.overall,
            speed: student.lpi.speed,
            memory: student.lpi.memory,
            attention: student.lpi.attention,
            flexibility: student.lpi.flexibility,
            problem_solving: student.lpi.problem_solving,
            math: student.lpi.math,
            first_lpi: student.lpi.first_lpi,
            best_lpi: student.lpi.best_lpi,
            speed_percentile: student.percentiles.speed,
            memory_percentile: student.percentiles.memory,
            attention_percentile: student.percentiles.attention,
            flexibility_percentile: student.percentiles.flexibility,
            problem_solving_percentile: student.percentiles.problem_solving,
            math_percentile: student.percentiles.math,
            current_streak: student.streaks.current,
            best_streak: student.streaks.best,
            top_game: student
                .game_rankings
                .first()
                .map_or("", |game| game.name.as_str()),
            most_improved_game: student
                .most_improved_games
                .first()
                .map_or("", |game| game.name.as_str()),
        }
    }
}

/// Writes one row per student and returns the number of rows written.
pub fn write_csv(path: &Path, students: &[Student]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for student in students {
        writer.serialize(CsvRow::from(student))?;
    }
    writer.flush()?;

    Ok(students.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");

        let written = write_csv(&path, &fallback::students()).unwrap();
        assert_eq!(written, 5);

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,name,study,overall,"));
        assert!(header.ends_with("top_game,most_improved_game"));

        let arman = lines.nth(1).unwrap();
        assert!(arman.starts_with("2,syed arman,second,1239,"));
        assert!(arman.ends_with(",12,15,Eagle Eye,Attention"));
    }

    #[test]
    fn export_reads_back_with_csv_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        write_csv(&path, &fallback::students()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let names: Vec<String> = reader
            .records()
            .map(|record| record.unwrap()[1].to_string())
            .collect();
        assert_eq!(names[0], "kulkarni naga sravani");
        assert_eq!(names.len(), 5);
    }
}
