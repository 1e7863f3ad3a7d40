//! One-shot discharge-notes form: paste notes, get a structured breakdown.

use crate::api::SimplifyService;
use crate::models::SimplifiedResult;
use crate::render::{MedicationChecklist, SimplifiedView};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SimplifyForm {
    notes: String,
    loading: bool,
    error: Option<String>,
    result: Option<SimplifiedResult>,
    checklist: MedicationChecklist,
}

impl SimplifyForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&SimplifiedResult> {
        self.result.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.notes.trim().is_empty()
    }

    /// Send the notes for simplification. Returns `false` when nothing was
    /// sent (blank notes or a request already running).
    pub async fn submit(&mut self, service: &dyn SimplifyService) -> bool {
        if !self.can_submit() {
            return false;
        }

        self.loading = true;
        self.error = None;
        info!("Simplifying {} chars of discharge notes", self.notes.len());

        match service.simplify(&self.notes).await {
            Ok(result) => {
                self.checklist.reset(result.medications.len());
                self.result = Some(result);
            }
            Err(e) => {
                warn!("Simplification failed: {}", e);
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
        true
    }

    pub fn toggle_medication(&mut self, index: usize) -> Option<bool> {
        self.result.as_ref()?;
        self.checklist.toggle(index)
    }

    pub fn view(&self) -> Option<SimplifiedView> {
        self.result
            .as_ref()
            .map(|result| SimplifiedView::build(result, &self.checklist))
    }

    /// Start over with an empty form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockSimplifyClient;
    use crate::models::Medication;

    fn result_with_meds(names: &[&str]) -> SimplifiedResult {
        SimplifiedResult {
            summary: "summary".to_string(),
            medications: names
                .iter()
                .map(|name| Medication {
                    name: name.to_string(),
                    dosage: None,
                    frequency: None,
                    duration: None,
                    important_notes: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_blank_notes_are_not_sent() {
        let service = MockSimplifyClient::new();
        let mut form = SimplifyForm::new();
        form.set_notes("   ");

        assert!(!form.submit(&service).await);
        assert_eq!(service.get_call_count(), 0);
        assert!(form.result().is_none());
    }

    #[tokio::test]
    async fn test_submit_stores_result() {
        let service = MockSimplifyClient::new().with_result(result_with_meds(&["Aspirin"]));
        let mut form = SimplifyForm::new();
        form.set_notes("Aspirin 75mg daily");

        assert!(form.submit(&service).await);
        assert!(!form.is_loading());
        assert_eq!(form.result().unwrap().medications[0].name, "Aspirin");
        assert!(form.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_keeps_notes() {
        let service = MockSimplifyClient::new().with_failure("Notes too short");
        let mut form = SimplifyForm::new();
        form.set_notes("hi");

        form.submit(&service).await;
        assert_eq!(form.error(), Some("Notes too short"));
        assert_eq!(form.notes(), "hi");
        assert!(form.view().is_none());
    }

    #[tokio::test]
    async fn test_new_result_resets_checklist() {
        let service = MockSimplifyClient::new()
            .with_result(result_with_meds(&["A", "B"]))
            .with_result(result_with_meds(&["C", "D", "E"]));
        let mut form = SimplifyForm::new();
        form.set_notes("notes");

        form.submit(&service).await;
        form.toggle_medication(0);
        assert_eq!(form.view().unwrap().completed, 1);

        form.submit(&service).await;
        let view = form.view().unwrap();
        assert_eq!(view.completed, 0);
        assert_eq!(view.checklist_rows().len(), 3);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let service = MockSimplifyClient::new();
        let mut form = SimplifyForm::new();
        form.set_notes("notes");
        form.submit(&service).await;
        assert!(form.result().is_some());

        form.reset();
        assert!(form.result().is_none());
        assert!(form.error().is_none());
        assert_eq!(form.notes(), "");
        assert_eq!(form.toggle_medication(0), None);
    }
}
