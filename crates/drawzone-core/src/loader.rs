// Period listing and loading on top of a `DrawSource`.

use thiserror::Error;
use tracing::{debug, info};

use crate::draw::{parse_draws, Draw};
use crate::period::{sort_periods, PeriodDescriptor};
use crate::source::DrawSource;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot reach {resource}: {source}")]
    Unreachable {
        resource: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{resource} is not a list of draw records: {message}")]
    InvalidDocument { resource: String, message: String },

    #[error("{resource}: record {index} is malformed: {message}")]
    MalformedRecord {
        resource: String,
        index: usize,
        message: String,
    },

    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid period name: {0}")]
    InvalidName(String),
}

impl LoadError {
    pub fn unreachable(
        resource: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LoadError::Unreachable {
            resource: resource.into(),
            source: source.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// List the periods `source` offers, in listing order. An empty listing is a
/// normal result.
pub async fn list_periods(source: &dyn DrawSource) -> Result<Vec<PeriodDescriptor>, LoadError> {
    let mut periods = source.list().await?;
    sort_periods(&mut periods);
    debug!("listed {} periods from {}", periods.len(), source.describe());
    Ok(periods)
}

/// Fetch and parse one period. Draws come back newest first whatever the
/// order of the underlying resource.
pub async fn load_period(source: &dyn DrawSource, name: &str) -> Result<Vec<Draw>, LoadError> {
    let text = source.fetch(name).await?;
    let mut draws = parse_draws(name, &text)?;
    sort_newest_first(&mut draws);
    info!("loaded {} draws from {}", draws.len(), name);
    Ok(draws)
}

/// Sort by date, most recent first. Stable for equal dates.
pub fn sort_newest_first(draws: &mut [Draw]) {
    draws.sort_by(|a, b| b.date.cmp(&a.date));
}
