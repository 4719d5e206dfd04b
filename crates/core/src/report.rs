//! Per-instrument outcomes of a pipeline run.

use crate::instrument::Instrument;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage at which an instrument was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    Price,
    Load,
    Locate,
    Extract,
    Compute,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Download => "download",
            Self::Price => "price",
            Self::Load => "load",
            Self::Locate => "locate",
            Self::Extract => "extract",
            Self::Compute => "compute",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Written { path: PathBuf, skipped_rows: usize },
    Skipped { stage: Stage, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentOutcome {
    pub instrument: Instrument,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<InstrumentOutcome>,
}

impl RunReport {
    pub fn push(&mut self, instrument: Instrument, outcome: Outcome) {
        self.outcomes.push(InstrumentOutcome {
            instrument,
            outcome,
        });
    }

    #[must_use]
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Written { .. }))
            .count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (Instrument, Stage, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Skipped { stage, reason } => Some((o.instrument, *stage, reason.as_str())),
            Outcome::Written { .. } => None,
        })
    }
}
