//! Sectioned view of a simplified discharge result
//!
//! Each section is built independently; an empty or absent section becomes an
//! explicit placeholder instead of an empty block.

use crate::models::{Medication, SimplifiedResult};
use std::fmt;

pub const NO_CARE_PLAN: &str = "No specific day-by-day plan provided.";
pub const NO_MEDICATIONS: &str = "No medications listed.";
pub const NO_WARNING_SIGNS: &str = "No specific warning signs mentioned. \
If you experience any unusual symptoms, contact your doctor immediately.";
pub const NO_FOLLOW_UPS: &str = "No specific follow-up reminders mentioned. \
Please check with your doctor about follow-up appointments.";

const DEFAULT_REMINDER_LABEL: &str = "Follow-up";

/// Per-medication checked state. Local to the viewer; never sent anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicationChecklist {
    checked: Vec<bool>,
}

impl MedicationChecklist {
    pub fn new(len: usize) -> Self {
        Self {
            checked: vec![false; len],
        }
    }

    pub fn for_result(result: &SimplifiedResult) -> Self {
        Self::new(result.medications.len())
    }

    /// Clear all ticks and resize for a new medication list.
    pub fn reset(&mut self, len: usize) {
        self.checked = vec![false; len];
    }

    /// Flip one item; returns the new state, or `None` when out of range.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let item = self.checked.get_mut(index)?;
        *item = !*item;
        Some(*item)
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn completed(&self) -> usize {
        self.checked.iter().filter(|c| **c).count()
    }

    pub fn total(&self) -> usize {
        self.checked.len()
    }

    /// Rounded completion percentage; 0 for an empty list.
    pub fn percent(&self) -> u32 {
        if self.checked.is_empty() {
            return 0;
        }
        ((self.completed() as f64 / self.total() as f64) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    Items(Vec<T>),
    Placeholder(&'static str),
}

impl<T> Section<T> {
    fn from_items(items: Vec<T>, placeholder: &'static str) -> Self {
        if items.is_empty() {
            Section::Placeholder(placeholder)
        } else {
            Section::Items(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Section::Items(items) => items,
            Section::Placeholder(_) => &[],
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Section::Items(_) => None,
            Section::Placeholder(text) => Some(*text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarePlanLine {
    pub label: String,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistRow {
    pub checked: bool,
    pub name: String,
    pub details: Vec<(&'static str, String)>,
    pub important: Option<String>,
}

impl ChecklistRow {
    fn new(medication: &Medication, checked: bool) -> Self {
        let details: Vec<(&'static str, String)> = [
            ("Dosage", &medication.dosage),
            ("Frequency", &medication.frequency),
            ("Duration", &medication.duration),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| (label, v.clone()))
        })
        .collect();

        Self {
            checked,
            name: medication.name.clone(),
            details,
            important: medication
                .important_notes
                .clone()
                .filter(|notes| !notes.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderLine {
    pub label: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedView {
    pub summary: String,
    pub care_plan: Section<CarePlanLine>,
    pub medications: Section<ChecklistRow>,
    pub warning_signs: Section<String>,
    pub follow_ups: Section<ReminderLine>,
    pub completed: usize,
    pub percent: u32,
}

impl SimplifiedView {
    pub fn build(result: &SimplifiedResult, checklist: &MedicationChecklist) -> Self {
        let care_plan: Vec<CarePlanLine> = result
            .care_plan
            .iter()
            .map(|day| CarePlanLine {
                label: format!("Day {}", day.day),
                instructions: day.instructions.clone(),
            })
            .collect();

        let medications: Vec<ChecklistRow> = result
            .medications
            .iter()
            .enumerate()
            .map(|(i, medication)| ChecklistRow::new(medication, checklist.is_checked(i)))
            .collect();

        let follow_ups: Vec<ReminderLine> = result
            .follow_up_reminders
            .iter()
            .map(|reminder| ReminderLine {
                label: reminder
                    .date
                    .clone()
                    .filter(|date| !date.is_empty())
                    .unwrap_or_else(|| DEFAULT_REMINDER_LABEL.to_string()),
                action: reminder.action.clone(),
            })
            .collect();

        Self {
            summary: result.summary.clone(),
            care_plan: Section::from_items(care_plan, NO_CARE_PLAN),
            medications: Section::from_items(medications, NO_MEDICATIONS),
            warning_signs: Section::from_items(result.warning_signs.clone(), NO_WARNING_SIGNS),
            follow_ups: Section::from_items(follow_ups, NO_FOLLOW_UPS),
            completed: checklist.completed(),
            percent: checklist.percent(),
        }
    }

    pub fn checklist_rows(&self) -> &[ChecklistRow] {
        self.medications.items()
    }
}

fn write_placeholder(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "  {}", text)
}

impl fmt::Display for SimplifiedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary")?;
        writeln!(f, "  {}", self.summary)?;

        writeln!(f, "\nDay-by-Day Care Plan")?;
        match &self.care_plan {
            Section::Items(days) => {
                for day in days {
                    writeln!(f, "  {}: {}", day.label, day.instructions)?;
                }
            }
            Section::Placeholder(text) => write_placeholder(f, text)?,
        }

        writeln!(f, "\nMedication Checklist")?;
        match &self.medications {
            Section::Items(rows) => {
                for row in rows {
                    let mark = if row.checked { "x" } else { " " };
                    writeln!(f, "  [{}] {}", mark, row.name)?;
                    for (label, value) in &row.details {
                        writeln!(f, "      {}: {}", label, value)?;
                    }
                    if let Some(notes) = &row.important {
                        writeln!(f, "      Important: {}", notes)?;
                    }
                }
                writeln!(
                    f,
                    "  Completed: {} / {} ({}%)",
                    self.completed,
                    rows.len(),
                    self.percent
                )?;
            }
            Section::Placeholder(text) => write_placeholder(f, text)?,
        }

        writeln!(f, "\nWarning Signs - Seek Immediate Medical Attention")?;
        match &self.warning_signs {
            Section::Items(signs) => {
                for sign in signs {
                    writeln!(f, "  ! {}", sign)?;
                }
            }
            Section::Placeholder(text) => write_placeholder(f, text)?,
        }

        writeln!(f, "\nFollow-Up Reminders")?;
        match &self.follow_ups {
            Section::Items(reminders) => {
                for reminder in reminders {
                    writeln!(f, "  {}: {}", reminder.label, reminder.action)?;
                }
            }
            Section::Placeholder(text) => write_placeholder(f, text)?,
        }

        Ok(())
    }
}
