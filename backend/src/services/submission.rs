//! Batch submission pipeline
//!
//! Validates the complete rows of a session as one batch, submits them
//! concurrently through the inventory gateway and records each row's outcome
//! as it arrives. Successful rows are cleared after a short display delay and
//! the session's inventory snapshot is refreshed.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use shared::models::{BatchSummary, DraftEntry, RowResult, SubmissionState};
use shared::validation::ValidationMessage;
use uuid::Uuid;

use crate::config::SubmissionConfig;
use crate::error::AppResult;
use crate::external::InventoryGateway;
use crate::services::session::EntrySession;

/// What happened to a submit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// No row was complete; nothing changed
    NothingToSubmit,
    /// Validation failed; nothing changed
    Rejected(Vec<ValidationMessage>),
    Submitted(BatchSummary),
}

/// Submission pipeline over any inventory gateway
pub struct SubmissionPipeline<G: InventoryGateway> {
    gateway: Arc<G>,
    config: SubmissionConfig,
}

impl<G: InventoryGateway> SubmissionPipeline<G> {
    pub fn new(gateway: Arc<G>, config: SubmissionConfig) -> Self {
        Self { gateway, config }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Fetch inventory and catalog together and hand them to the session
    pub async fn refresh(&self, session: &mut EntrySession) -> AppResult<()> {
        let (inventory, catalog) = tokio::try_join!(
            self.gateway.list_inventory(),
            self.gateway.list_catalog_combinations()
        )?;
        session.replace_snapshot(inventory, catalog);
        Ok(())
    }

    /// Submit every complete row in the session
    pub async fn submit_batch(&self, session: &mut EntrySession) -> BatchOutcome {
        let batch: Vec<(usize, DraftEntry)> = session
            .complete_rows()
            .into_iter()
            .map(|(position, row)| (position, row.clone()))
            .collect();

        if batch.is_empty() {
            tracing::info!("Nothing to submit: no complete rows");
            return BatchOutcome::NothingToSubmit;
        }

        let messages = session.validate();
        if !messages.is_empty() {
            tracing::info!("Batch rejected with {} validation messages", messages.len());
            return BatchOutcome::Rejected(messages);
        }

        let row_ids: Vec<Uuid> = batch.iter().map(|(_, row)| row.id).collect();
        session.mark_submitting(&row_ids);
        tracing::info!("Submitting {} entries", batch.len());

        let gateway = self.gateway.as_ref();
        let mut in_flight = stream::iter(batch)
            .map(move |(position, row)| async move { submit_row(gateway, position, row).await })
            .buffer_unordered(self.config.max_concurrent.max(1));

        let mut results = Vec::with_capacity(row_ids.len());
        while let Some(result) = in_flight.next().await {
            session.apply_result(&result);
            results.push(result);
        }
        drop(in_flight);

        results.sort_by_key(|r| r.position);
        let success_count = results
            .iter()
            .filter(|r| r.state == SubmissionState::Success)
            .count();
        let summary = BatchSummary {
            success_count,
            fail_count: results.len() - success_count,
            results,
        };

        match summary.failure_message() {
            Some(message) => tracing::error!("{}", message),
            None => tracing::info!("All {} entries submitted", summary.success_count),
        }

        if summary.success_count > 0 {
            tokio::time::sleep(self.config.success_display_delay()).await;
            let succeeded: Vec<Uuid> = summary
                .results
                .iter()
                .filter(|r| r.state == SubmissionState::Success)
                .map(|r| r.row_id)
                .collect();
            session.remove_rows(&succeeded);
        }

        if let Err(e) = self.refresh(session).await {
            tracing::warn!("Inventory refresh after submission failed: {}", e);
        }

        BatchOutcome::Submitted(summary)
    }
}

/// Submit one row, then link its jobs when it is a withdrawal
async fn submit_row<G: InventoryGateway + ?Sized>(
    gateway: &G,
    position: usize,
    row: DraftEntry,
) -> RowResult {
    let record = match gateway.submit_row(&row).await {
        Ok(record) => record,
        Err(e) => {
            tracing::debug!("Row {} failed: {}", position, e);
            return RowResult {
                row_id: row.id,
                position,
                state: SubmissionState::Error,
                record_id: None,
                error: Some(e.detail().message),
                warning: None,
            };
        }
    };

    let mut warning = None;
    if row.movement_type.is_withdrawal() && !row.linked_job_ids.is_empty() {
        if let Err(e) = gateway
            .update_job_links(&record.record_id, &row.linked_job_ids)
            .await
        {
            tracing::warn!(
                "Row {} saved as {} but job links failed: {}",
                position,
                record.record_id,
                e
            );
            warning = Some(format!("Saved, but linking jobs failed: {}", e.detail().message));
        }
    }

    tracing::debug!("Row {} saved as {}", position, record.record_id);
    RowResult {
        row_id: row.id,
        position,
        state: SubmissionState::Success,
        record_id: Some(record.record_id),
        error: None,
        warning,
    }
}
