//! # Staff Contribution Splits
//!
//! Several stylists can share one service (colour by one, blow-dry by
//! another). Each gets a percentage of the line for commission purposes, and
//! the shares must add up to exactly 100 before checkout.
//!
//! ## Editor State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open(line)                                                             │
//! │     ├── line has split ────────► load entries as-is                     │
//! │     ├── line has single staff ─► [staff @ 100%]                         │
//! │     └── unassigned ────────────► []                                     │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  ┌────────────────────────────────────────────────────────┐            │
//! │  │ Editing                                                │            │
//! │  │   add_staff     → equal split across all entries       │            │
//! │  │   remove_staff  → equal split across the rest          │            │
//! │  │   set_percent   → honoured as typed, no rebalance      │            │
//! │  │   equal_split   → forced rebalance                     │            │
//! │  └────────────────────────────────────────────────────────┘            │
//! │                │                               │                        │
//! │            commit()                        cancel()                     │
//! │     sum == 100 && non-empty            edits discarded                  │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  Vec<StaffContribution> ──► Cart::set_item_staff_contributions          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Remainder Rule
//! `n` staff each get `floor(100 / n)`; the first entry in list order also
//! takes `100 - floor(100 / n) * n`. Three staff → `[34, 33, 33]`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartLine, LineItem, StaffAssignment};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{LineId, StaffRef};
use crate::validation::{validate_percent, validate_split_total, ValidationResult};

/// Role label stamped on contributions created from the editor.
pub const DEFAULT_ROLE: &str = "Staff";

// =============================================================================
// Contribution Types
// =============================================================================

/// How a contribution is measured. Only percentages exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    #[default]
    Percentage,
}

/// One staff member's share of a multi-staff service line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffContribution {
    pub staff_id: String,
    pub staff_name: String,
    /// Free text, informational only.
    pub role: String,
    /// 1-based; display and settlement order.
    pub sequence_order: u32,
    #[serde(default)]
    pub contribution_type: ContributionType,
    /// 0-100.
    pub contribution_percent: u8,
    #[serde(default)]
    pub time_spent_minutes: Option<u32>,
}

impl StaffContribution {
    pub fn staff(&self) -> StaffRef {
        StaffRef::new(self.staff_id.clone(), self.staff_name.clone())
    }
}

/// Sum of the percentages of a split.
pub fn split_total(contributions: &[StaffContribution]) -> u32 {
    contributions
        .iter()
        .map(|c| u32::from(c.contribution_percent))
        .sum()
}

/// Splits 100% across `n` staff, the remainder going to the first entry.
///
/// ## Example
/// ```rust
/// use salon_core::contribution::equal_split;
///
/// assert_eq!(equal_split(3), vec![34, 33, 33]);
/// assert_eq!(equal_split(7), vec![16, 14, 14, 14, 14, 14, 14]);
/// assert!(equal_split(0).is_empty());
/// ```
pub fn equal_split(n: usize) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let base = 100 / n;
    let remainder = 100 - base * n;

    let mut shares = vec![base as u8; n];
    shares[0] += remainder as u8;
    shares
}

// =============================================================================
// Editor
// =============================================================================

/// A staff entry while the split dialog is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftContribution {
    pub staff: StaffRef,
    pub percent: u8,
    pub time_spent_minutes: Option<u32>,
}

/// Editing session for the staff split of one service line.
///
/// Nothing here touches the cart. The caller applies the result of
/// [`ContributionEditor::commit`] with `Cart::set_item_staff_contributions`;
/// dropping the editor (or calling [`ContributionEditor::cancel`]) throws the
/// edits away.
#[derive(Debug, Clone)]
pub struct ContributionEditor {
    line_id: LineId,
    entries: Vec<DraftContribution>,
}

impl ContributionEditor {
    /// Opens the editor seeded from the line's current assignment.
    pub fn open(line: &CartLine) -> CoreResult<Self> {
        let service = match &line.item {
            LineItem::Service(service) => service,
            LineItem::Product(_) => return Err(CoreError::NotAService(line.id.to_string())),
        };

        let entries = match &service.assignment {
            StaffAssignment::Split(contributions) => {
                let mut ordered: Vec<&StaffContribution> = contributions.iter().collect();
                ordered.sort_by_key(|c| c.sequence_order);
                ordered
                    .into_iter()
                    .map(|c| DraftContribution {
                        staff: c.staff(),
                        percent: c.contribution_percent,
                        time_spent_minutes: c.time_spent_minutes,
                    })
                    .collect()
            }
            StaffAssignment::Single(staff) => vec![DraftContribution {
                staff: staff.clone(),
                percent: 100,
                time_spent_minutes: None,
            }],
            StaffAssignment::Unassigned => Vec::new(),
        };

        Ok(ContributionEditor {
            line_id: line.id.clone(),
            entries,
        })
    }

    pub fn line_id(&self) -> &LineId {
        &self.line_id
    }

    pub fn entries(&self) -> &[DraftContribution] {
        &self.entries
    }

    /// Current sum of all percentages.
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|e| u32::from(e.percent)).sum()
    }

    /// Whether [`ContributionEditor::commit`] would succeed.
    pub fn is_balanced(&self) -> bool {
        !self.entries.is_empty() && self.total() == 100
    }

    /// Adds a staff member and rebalances everyone to an equal split.
    pub fn add_staff(&mut self, staff: StaffRef) -> ValidationResult<()> {
        if self.entries.iter().any(|e| e.staff.id == staff.id) {
            return Err(ValidationError::Duplicate {
                field: "staff".to_string(),
                value: staff.id,
            });
        }

        self.entries.push(DraftContribution {
            staff,
            percent: 0,
            time_spent_minutes: None,
        });
        self.equal_split();
        Ok(())
    }

    /// Removes a staff member and rebalances the rest.
    ///
    /// Returns `false` if the staff member was not on the split.
    pub fn remove_staff(&mut self, staff_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.staff.id != staff_id);
        if self.entries.len() == before {
            return false;
        }

        self.equal_split();
        true
    }

    /// Sets one entry's percentage exactly as typed. Others are not touched.
    pub fn set_percent(&mut self, staff_id: &str, percent: u8) -> ValidationResult<()> {
        validate_percent(percent)?;
        self.entry_mut(staff_id)?.percent = percent;
        Ok(())
    }

    pub fn set_time_spent(&mut self, staff_id: &str, minutes: Option<u32>) -> ValidationResult<()> {
        self.entry_mut(staff_id)?.time_spent_minutes = minutes;
        Ok(())
    }

    /// Rebalances all current entries to an equal split.
    pub fn equal_split(&mut self) {
        let shares = equal_split(self.entries.len());
        for (entry, share) in self.entries.iter_mut().zip(shares) {
            entry.percent = share;
        }
    }

    /// Finalizes the split.
    ///
    /// Fails without changing anything when the list is empty or the
    /// percentages do not total exactly 100.
    pub fn commit(&self) -> ValidationResult<Vec<StaffContribution>> {
        validate_split_total(self.entries.iter().map(|e| e.percent))?;

        Ok(self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| StaffContribution {
                staff_id: entry.staff.id.clone(),
                staff_name: entry.staff.name.clone(),
                role: DEFAULT_ROLE.to_string(),
                sequence_order: idx as u32 + 1,
                contribution_type: ContributionType::Percentage,
                contribution_percent: entry.percent,
                time_spent_minutes: entry.time_spent_minutes,
            })
            .collect())
    }

    /// Discards the editing session.
    pub fn cancel(self) {}

    fn entry_mut(&mut self, staff_id: &str) -> ValidationResult<&mut DraftContribution> {
        self.entries
            .iter_mut()
            .find(|e| e.staff.id == staff_id)
            .ok_or_else(|| ValidationError::NotFound {
                field: "staff".to_string(),
                value: staff_id.to_string(),
            })
    }
}
