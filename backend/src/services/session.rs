//! Entry session: the single owner of the draft row list
//!
//! Every mutation of the batch goes through `&mut EntrySession`, so the
//! cascade, the debounced auto-append and the submission pipeline never race
//! on the list. Inventory and catalog snapshots live here too, alongside the
//! suggestion cache they feed.

use std::time::{Duration, Instant};

use shared::allocation::validate_positioned;
use shared::cascade::{apply_field_edit, should_append, CascadeContext, FieldEdit};
use shared::models::{CatalogCombination, DraftEntry, InventoryUnit, RowResult, SubmissionState};
use shared::suggest::{matching_units, SuggestField, SuggestionCache};
use shared::validation::ValidationMessage;
use uuid::Uuid;

use crate::config::EntryConfig;
use crate::error::{AppError, AppResult};

/// A blank row requested after `row_id` became the complete last row
#[derive(Debug, Clone, Copy)]
struct PendingAppend {
    row_id: Uuid,
    requested_at: Instant,
}

/// Row list plus the read-only data the engine consults
#[derive(Debug)]
pub struct EntrySession {
    rows: Vec<DraftEntry>,
    inventory: Vec<InventoryUnit>,
    catalog: Vec<CatalogCombination>,
    suggestions: SuggestionCache,
    pending_append: Option<PendingAppend>,
    append_debounce: Duration,
}

impl EntrySession {
    /// New session holding a single blank row
    pub fn new(config: &EntryConfig) -> Self {
        Self::with_rows(Vec::new(), config)
    }

    /// Session seeded with existing rows, e.g. a batch loaded from disk
    pub fn with_rows(rows: Vec<DraftEntry>, config: &EntryConfig) -> Self {
        let mut session = Self {
            rows,
            inventory: Vec::new(),
            catalog: Vec::new(),
            suggestions: SuggestionCache::new(),
            pending_append: None,
            append_debounce: config.append_debounce(),
        };
        session.ensure_blank_row();
        session
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn rows(&self) -> &[DraftEntry] {
        &self.rows
    }

    pub fn row(&self, row_id: Uuid) -> Option<&DraftEntry> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn inventory(&self) -> &[InventoryUnit] {
        &self.inventory
    }

    pub fn catalog(&self) -> &[CatalogCombination] {
        &self.catalog
    }

    /// 1-based position of a row in the list
    pub fn position(&self, row_id: Uuid) -> Option<usize> {
        self.rows.iter().position(|r| r.id == row_id).map(|i| i + 1)
    }

    /// Complete rows with their positions in the full list
    pub fn complete_rows(&self) -> Vec<(usize, &DraftEntry)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_complete())
            .map(|(i, r)| (i + 1, r))
            .collect()
    }

    pub fn suggestion_generation(&self) -> u64 {
        self.suggestions.generation()
    }

    pub fn has_pending_append(&self) -> bool {
        self.pending_append.is_some()
    }

    fn index_of(&self, row_id: Uuid) -> AppResult<usize> {
        self.rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or_else(|| AppError::NotFound(format!("Row {}", row_id)))
    }

    // ========================================================================
    // Row list
    // ========================================================================

    /// Append a blank row and return its id
    pub fn add_row(&mut self) -> Uuid {
        let row = DraftEntry::new();
        let id = row.id;
        self.rows.push(row);
        id
    }

    /// Remove one row; the list never ends up empty
    pub fn remove_row(&mut self, row_id: Uuid) -> AppResult<DraftEntry> {
        let index = self.index_of(row_id)?;
        let removed = self.rows.remove(index);
        if self.pending_append.is_some_and(|p| p.row_id == row_id) {
            self.pending_append = None;
        }
        self.ensure_blank_row();
        Ok(removed)
    }

    /// Drop every row and start over with one blank row
    pub fn clear(&mut self) {
        self.rows.clear();
        self.pending_append = None;
        self.ensure_blank_row();
    }

    fn ensure_blank_row(&mut self) {
        if self.rows.is_empty() {
            self.add_row();
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Apply an operator edit and its cascade to one row.
    ///
    /// Editing a row that failed submission puts it back to idle.
    pub fn edit_field(&mut self, row_id: Uuid, edit: FieldEdit) -> AppResult<&DraftEntry> {
        let index = self.index_of(row_id)?;
        if self.rows[index].submission_state == SubmissionState::Submitting {
            return Err(AppError::InvalidStateTransition(format!(
                "Row {} is being submitted",
                index + 1
            )));
        }

        let ctx = CascadeContext::new(&self.inventory, &self.catalog);
        let mut updated = apply_field_edit(&self.rows[index], &edit, &ctx);
        if updated.submission_state == SubmissionState::Error {
            updated.submission_state = SubmissionState::Idle;
            updated.submission_error = None;
        }
        tracing::debug!("Row {} edited: {:?}", index + 1, edit);
        self.rows[index] = updated;

        let is_last = index + 1 == self.rows.len();
        if should_append(&self.rows[index], is_last) {
            self.pending_append = Some(PendingAppend {
                row_id,
                requested_at: Instant::now(),
            });
        }

        Ok(&self.rows[index])
    }

    /// Consume a pending append once the debounce interval has passed.
    ///
    /// Returns the id of the new blank row, if one was appended.
    pub fn tick(&mut self, now: Instant) -> Option<Uuid> {
        let pending = self.pending_append?;
        if now.saturating_duration_since(pending.requested_at) < self.append_debounce {
            return None;
        }
        self.pending_append = None;

        let still_last_and_complete = self
            .rows
            .last()
            .is_some_and(|r| r.id == pending.row_id && r.is_complete());
        if !still_last_and_complete {
            return None;
        }
        let id = self.add_row();
        tracing::debug!("Appended blank row {}", self.rows.len());
        Some(id)
    }

    // ========================================================================
    // Suggestions & validation
    // ========================================================================

    pub fn suggest(&mut self, row_id: Uuid, field: SuggestField) -> AppResult<Vec<String>> {
        let index = self.index_of(row_id)?;
        Ok(self
            .suggestions
            .suggest(field, &self.rows[index], &self.inventory, &self.catalog))
    }

    /// Units a withdrawal row may be locked to
    pub fn matching_units(&self, row_id: Uuid) -> AppResult<Vec<&InventoryUnit>> {
        let index = self.index_of(row_id)?;
        Ok(matching_units(&self.rows[index], &self.inventory))
    }

    /// Validate the complete rows against the current snapshot
    pub fn validate(&self) -> Vec<ValidationMessage> {
        validate_positioned(self.complete_rows(), &self.inventory)
    }

    // ========================================================================
    // Submission bookkeeping
    // ========================================================================

    pub fn mark_submitting(&mut self, row_ids: &[Uuid]) {
        for row in self.rows.iter_mut().filter(|r| row_ids.contains(&r.id)) {
            row.submission_state = SubmissionState::Submitting;
            row.submission_error = None;
            row.submission_warning = None;
        }
    }

    /// Record one row's outcome; unknown ids are ignored
    pub fn apply_result(&mut self, result: &RowResult) {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == result.row_id) else {
            tracing::warn!("Result for unknown row {}", result.row_id);
            return;
        };
        row.submission_state = result.state;
        row.submission_error = result.error.clone();
        row.submission_warning = result.warning.clone();
    }

    /// Remove rows by id; the list never ends up empty
    pub fn remove_rows(&mut self, row_ids: &[Uuid]) {
        self.rows.retain(|r| !row_ids.contains(&r.id));
        if self
            .pending_append
            .is_some_and(|p| row_ids.contains(&p.row_id))
        {
            self.pending_append = None;
        }
        self.ensure_blank_row();
    }

    /// Swap in fresh inventory and catalog data
    pub fn replace_snapshot(
        &mut self,
        inventory: Vec<InventoryUnit>,
        catalog: Vec<CatalogCombination>,
    ) {
        tracing::debug!(
            "Snapshot replaced: {} units, {} catalog combinations",
            inventory.len(),
            catalog.len()
        );
        self.inventory = inventory;
        self.catalog = catalog;
        self.suggestions.invalidate();
    }
}
