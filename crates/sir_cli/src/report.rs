use anyhow::{Context, Result};
use serde::Serialize;
use sir_core::analysis::EpidemicSummary;
use sir_core::Trajectory;
use std::fs::File;
use std::path::Path;

#[derive(Serialize)]
struct TrajectoryRow {
    time: f64,
    susceptible: f64,
    infected: f64,
    recovered: f64,
}

/// Writes one row per grid point: time,susceptible,infected,recovered.
pub fn write_trajectory_csv(path: &Path, trajectory: &Trajectory) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for (time, state) in trajectory.iter() {
        writer.serialize(TrajectoryRow {
            time,
            susceptible: state.susceptible,
            infected: state.infected,
            recovered: state.recovered,
        })?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_summary_json(path: &Path, summary: &EpidemicSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sir_core::SirConfig;

    #[test]
    fn csv_has_header_and_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");
        let trajectory = SirConfig::default().run().unwrap();
        write_trajectory_csv(&path, &trajectory).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["time", "susceptible", "infected", "recovered"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), trajectory.len());
        assert_eq!(&rows[0][1], "999.0");
        assert_eq!(&rows[0][2], "1.0");
    }
}
