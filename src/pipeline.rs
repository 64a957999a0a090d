//! Fetch-then-normalize composition.

use crate::models::{NormalizedRecord, SearchRequest};
use crate::normalize::{NormalizeOutcome, Normalizer, SchemaError};
use crate::sources::{CollectionSource, FetchError};

/// Either stage of the pipeline failed; no partial output exists
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// One search followed by one normalization pass, keeping uuids.
pub async fn fetch_publications(
    source: &dyn CollectionSource,
    request: &SearchRequest,
    normalizer: &Normalizer,
) -> Result<NormalizeOutcome, PipelineError> {
    let response = source.search_objects(request).await?;
    let outcome = normalizer.normalize_keyed(&response)?;

    tracing::info!(
        source = source.id(),
        entries = outcome.report.entries,
        kept = outcome.report.kept,
        "Fetched publications"
    );

    Ok(outcome)
}

/// Like [`fetch_publications`], returning only the output rows.
pub async fn fetch_records(
    source: &dyn CollectionSource,
    request: &SearchRequest,
    normalizer: &Normalizer,
) -> Result<Vec<NormalizedRecord>, PipelineError> {
    fetch_publications(source, request, normalizer)
        .await
        .map(NormalizeOutcome::into_records)
}
