//! Feed and config loading

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use milestrack_core::config::CONFIG_FILE_NAME;
use milestrack_core::{Config, DependencyEdge, FeedError, FeedRecord};
use tracing::{debug, info};

/// On-disk layout of a dependency feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeedFormat {
    /// Header row with the twelve feed columns
    Csv,
    /// Array of feed records
    Json,
}

impl FeedFormat {
    /// `.json` files are JSON, everything else is CSV
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FeedFormat::Json,
            _ => FeedFormat::Csv,
        }
    }
}

pub fn load_feed(path: &Path, format: Option<FeedFormat>) -> Result<Vec<DependencyEdge>> {
    let format = format.unwrap_or_else(|| FeedFormat::detect(path));
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open feed {}", path.display()))?;

    let edges = match format {
        FeedFormat::Csv => parse_csv(file),
        FeedFormat::Json => parse_json(file),
    }
    .with_context(|| format!("Failed to read feed {}", path.display()))?;

    info!(path = %path.display(), edges = edges.len(), "loaded feed");
    Ok(edges)
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<DependencyEdge>, FeedError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader
        .deserialize::<FeedRecord>()
        .enumerate()
        .map(|(index, record)| {
            let record = record.map_err(|e| FeedError::Malformed(e.to_string()))?;
            record.into_edge(index + 1)
        })
        .collect()
}

pub fn parse_json<R: Read>(reader: R) -> Result<Vec<DependencyEdge>, FeedError> {
    let records: Vec<FeedRecord> =
        serde_json::from_reader(reader).map_err(|e| FeedError::Malformed(e.to_string()))?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_edge(index + 1))
        .collect()
}

/// Explicit path, else `milestrack.toml` in the working directory, else defaults
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let local = Path::new(CONFIG_FILE_NAME);
    if local.exists() {
        debug!(path = %local.display(), "using local config");
        return Config::load(local).with_context(|| format!("Failed to load config {}", CONFIG_FILE_NAME));
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "predecessor_project,predecessor_milestone,predecessor_projected_start,predecessor_projected_end,predecessor_actual_start,predecessor_actual_end,successor_project,successor_milestone,successor_projected_start,successor_projected_end,successor_actual_start,successor_actual_end";

    #[test]
    fn csv_with_blank_and_sentinel_cells() {
        let csv = format!(
            "{}\nRadar,CDR,2024-01-01,2024-01-20,,1969-12-31,Avionics,Integration,2024-02-01,2024-03-01,,\n",
            HEADER
        );
        let edges = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(edge.predecessor.name, "CDR");
        assert_eq!(edge.predecessor.actual_start, None);
        // kept here, ignored by the resolution policy
        assert_eq!(
            edge.predecessor.actual_end,
            NaiveDate::from_ymd_opt(1969, 12, 31)
        );
        assert_eq!(edge.successor.project, "Avionics");
    }

    #[test]
    fn csv_bad_date_names_row_and_column() {
        let csv = format!(
            "{}\nRadar,CDR,2024-01-01,2024-01-20,,,Avionics,Integration,02/01/2024,,,\n",
            HEADER
        );
        let err = parse_csv(csv.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("row 1"), "{}", err);
        assert!(err.contains("successor_projected_start"), "{}", err);
    }

    #[test]
    fn json_records() {
        let json = r#"[
            {"predecessor_project": "Radar", "predecessor_milestone": "CDR",
             "predecessor_actual_end": "2024-01-10",
             "successor_project": "Avionics", "successor_milestone": "Integration",
             "successor_actual_start": "2024-01-05T00:00:00"}
        ]"#;
        let edges = parse_json(json.as_bytes()).unwrap();
        assert_eq!(
            edges[0].successor.actual_start,
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(edges[0].predecessor.projected_start, None);
    }

    #[test]
    fn detect_by_extension() {
        assert_eq!(FeedFormat::detect(Path::new("feed.JSON")), FeedFormat::Json);
        assert_eq!(FeedFormat::detect(Path::new("feed.csv")), FeedFormat::Csv);
        assert_eq!(FeedFormat::detect(Path::new("feed")), FeedFormat::Csv);
    }
}
