use crate::volume::Verdict;
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use std::{fs, io::Write, path::Path, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Kept,
    Removed { reason: Verdict },
    WouldRemove { reason: Verdict },
    Skipped { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub name: String,
    /// Peak volume in dB; absent when analysis failed. Silent files serialise as null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub song_dir: PathBuf,
    pub quiet_threshold: f64,
    pub dry_run: bool,
    /// Regular files found in the directory, including non-.ogg files.
    pub files_listed: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl SweepReport {
    pub fn new(song_dir: &Path, quiet_threshold: f64, dry_run: bool) -> Self {
        Self {
            song_dir: song_dir.to_path_buf(),
            quiet_threshold,
            dry_run,
            files_listed: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn files_examined(&self) -> usize {
        self.outcomes.len()
    }

    pub fn removed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Removed { .. }))
            .count()
    }

    pub fn would_remove_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::WouldRemove { .. }))
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Skipped { .. }))
    }

    /// Table of every file that was removed, would be removed, or skipped.
    /// `None` when all examined files were kept.
    pub fn summary_table(&self) -> Option<Table> {
        let rows: Vec<Vec<String>> = self.outcomes.iter().filter_map(summary_row).collect();
        if rows.is_empty() {
            return None;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["File", "Max Volume (dB)", "Action", "Reason"]);
        for row in rows {
            table.add_row(row);
        }
        Some(table)
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn summary_row(file: &FileOutcome) -> Option<Vec<String>> {
    let (action, reason) = match &file.outcome {
        Outcome::Kept => return None,
        Outcome::Removed { reason } => ("Removed", reason_label(*reason).to_string()),
        Outcome::WouldRemove { reason } => ("Would remove", reason_label(*reason).to_string()),
        Outcome::Skipped { error } => ("Skipped", error.clone()),
    };
    let volume = file
        .volume
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string());
    Some(vec![file.name.clone(), volume, action.to_string(), reason])
}

fn reason_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Loud => "loud (peak truncates to 0 dB)",
        Verdict::Quiet => "quiet (below threshold)",
        Verdict::Keep => "kept",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SweepReport {
        let mut report = SweepReport::new(Path::new("/music"), -20.0, false);
        report.files_listed = 4;
        report.outcomes = vec![
            FileOutcome {
                name: "a.ogg".into(),
                volume: Some(-45.0),
                outcome: Outcome::Removed {
                    reason: Verdict::Quiet,
                },
            },
            FileOutcome {
                name: "b.ogg".into(),
                volume: Some(-5.0),
                outcome: Outcome::Kept,
            },
            FileOutcome {
                name: "d.ogg".into(),
                volume: None,
                outcome: Outcome::Skipped {
                    error: "No max_volume reading found in ffmpeg output".into(),
                },
            },
        ];
        report
    }

    #[test]
    fn counts_outcomes() {
        let report = sample();
        assert_eq!(report.files_examined(), 3);
        assert_eq!(report.removed_count(), 1);
        assert_eq!(report.would_remove_count(), 0);
        assert_eq!(report.skipped().count(), 1);
    }

    #[test]
    fn summary_table_lists_only_actionable_files() {
        let rendered = sample().summary_table().unwrap().to_string();
        assert!(rendered.contains("a.ogg"));
        assert!(rendered.contains("d.ogg"));
        assert!(!rendered.contains("b.ogg"));
        assert!(rendered.contains("quiet (below threshold)"));
    }

    #[test]
    fn no_table_when_everything_was_kept() {
        let mut report = SweepReport::new(Path::new("."), -20.0, false);
        report.outcomes.push(FileOutcome {
            name: "b.ogg".into(),
            volume: Some(-5.0),
            outcome: Outcome::Kept,
        });
        assert!(report.summary_table().is_none());
    }

    #[test]
    fn writes_json_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        sample().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["quiet_threshold"], -20.0);
        assert_eq!(value["files_listed"], 4);
        let outcomes = value["outcomes"].as_array().unwrap();
        assert_eq!(outcomes[0]["status"], "removed");
        assert_eq!(outcomes[0]["reason"], "quiet");
        assert_eq!(outcomes[1]["status"], "kept");
        assert!(outcomes[2].get("volume").is_none());
        assert_eq!(outcomes[2]["status"], "skipped");
    }
}
