//! Wire views
//!
//! Read models returned by `LedgerService`, serialized camelCase for the
//! existing admin-backend consumers. Views carry the resolved student
//! display name; internal bookkeeping (entry numbers, reversal flags) stays
//! off the wire.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{LedgerEntryId, Money, StudentId};

use crate::balance::StudentBalance;
use crate::entry::{BalanceType, EntryType, LedgerEntry};
use crate::ports::EntryPage;
use crate::reversal::ReversalOutcome;
use crate::stats::LedgerStats;

/// Placeholder rendered when an entry references a student no longer in
/// the directory
pub const UNKNOWN_STUDENT: &str = "Unknown student";

/// One ledger entry as seen by callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryView {
    pub id: LedgerEntryId,
    pub student_id: StudentId,
    pub student_name: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub debit: Money,
    pub credit: Money,
    pub balance: Money,
    pub balance_type: BalanceType,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntryView {
    /// Builds the view for an entry, falling back to the placeholder name
    pub fn from_entry(entry: &LedgerEntry, student_name: Option<&str>) -> Self {
        Self {
            id: entry.id,
            student_id: entry.student_id,
            student_name: student_name.unwrap_or(UNKNOWN_STUDENT).to_string(),
            date: entry.date,
            entry_type: entry.entry_type,
            description: entry.description.clone(),
            reference_id: entry.reference_id,
            debit: entry.debit,
            credit: entry.credit,
            balance: entry.balance,
            balance_type: entry.balance_type,
            notes: entry.notes.clone(),
            created_by: entry.created_by.clone(),
            created_at: entry.created_at,
        }
    }
}

/// A student's derived balance as seen by callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub student_id: StudentId,
    /// Magnitude of the net; the tag carries the sign
    pub balance: Money,
    pub balance_type: BalanceType,
    pub debit_balance: Money,
    pub credit_balance: Money,
    pub total_entries: u64,
}

impl From<&StudentBalance> for BalanceView {
    fn from(balance: &StudentBalance) -> Self {
        Self {
            student_id: balance.student_id,
            balance: balance.absolute(),
            balance_type: balance.balance_type,
            debit_balance: balance.debit_total,
            credit_balance: balance.credit_total,
            total_entries: balance.entry_count,
        }
    }
}

/// Per-type slice of the statistics view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBreakdownView {
    pub count: u64,
    pub debits: Money,
    pub credits: Money,
}

/// Ledger-wide statistics as seen by callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_entries: u64,
    pub total_debits: Money,
    pub total_credits: Money,
    pub net_balance: Money,
    pub active_students: u64,
    /// Keyed by entry type name, in stable alphabetical order
    pub entry_type_breakdown: BTreeMap<String, TypeBreakdownView>,
}

impl From<&LedgerStats> for StatsView {
    fn from(stats: &LedgerStats) -> Self {
        let entry_type_breakdown = stats
            .per_type
            .iter()
            .map(|row| {
                (
                    row.entry_type.as_str().to_string(),
                    TypeBreakdownView {
                        count: row.entry_count,
                        debits: row.debit_total,
                        credits: row.credit_total,
                    },
                )
            })
            .collect();

        Self {
            total_entries: stats.total_entries,
            total_debits: stats.total_debits,
            total_credits: stats.total_credits,
            net_balance: stats.net_balance,
            active_students: stats.active_students,
            entry_type_breakdown,
        }
    }
}

/// Pagination envelope for entry listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationView {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

/// One page of entries plus its pagination envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryListView {
    pub items: Vec<LedgerEntryView>,
    pub pagination: PaginationView,
}

impl EntryListView {
    /// Builds the listing from a store page and resolved display names
    pub fn from_page(page: &EntryPage, names: &HashMap<StudentId, String>) -> Self {
        let items = page
            .items
            .iter()
            .map(|entry| {
                LedgerEntryView::from_entry(
                    entry,
                    names.get(&entry.student_id).map(String::as_str),
                )
            })
            .collect();

        Self {
            items,
            pagination: PaginationView {
                page: page.page,
                limit: page.limit,
                total_items: page.total_items,
                total_pages: page.total_pages(),
            },
        }
    }
}

/// Both rows of a completed reversal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalView {
    pub original_entry: LedgerEntryView,
    pub reversal_entry: LedgerEntryView,
}

impl ReversalView {
    /// Builds the view for a reversal outcome; both rows share one student
    pub fn from_outcome(outcome: &ReversalOutcome, student_name: Option<&str>) -> Self {
        Self {
            original_entry: LedgerEntryView::from_entry(&outcome.original, student_name),
            reversal_entry: LedgerEntryView::from_entry(&outcome.reversal, student_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::TypeAggregate;
    use serde_json::json;

    fn sample_entry() -> LedgerEntry {
        LedgerEntry::new(
            StudentId::new_v7(),
            7,
            EntryType::Payment,
            "Payment received – UPI – Asha Verma",
            Money::zero(),
            Money::from_major(3000),
            "warden.rao",
        )
        .with_reference(Uuid::new_v4())
        .with_balance(Money::from_major(3200), BalanceType::Dr)
    }

    #[test]
    fn test_entry_view_uses_camel_case_wire_names() {
        let view = LedgerEntryView::from_entry(&sample_entry(), Some("Asha Verma"));
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["studentName"], json!("Asha Verma"));
        assert_eq!(value["type"], json!("Payment"));
        assert_eq!(value["balanceType"], json!("Dr"));
        assert_eq!(value["credit"], json!("3000"));
        assert!(value.get("referenceId").is_some());
        assert!(value.get("createdBy").is_some());

        // Internal bookkeeping stays off the wire
        assert!(value.get("entryNumber").is_none());
        assert!(value.get("isReversed").is_none());
        assert!(value.get("reversedBy").is_none());
    }

    #[test]
    fn test_entry_view_falls_back_to_placeholder_name() {
        let view = LedgerEntryView::from_entry(&sample_entry(), None);
        assert_eq!(view.student_name, UNKNOWN_STUDENT);
    }

    #[test]
    fn test_balance_view_reports_absolute_value() {
        let student = StudentId::new_v7();
        let balance = StudentBalance::empty(student)
            .after(Money::zero(), Money::from_major(2800))
            .unwrap();

        let view = BalanceView::from(&balance);
        assert_eq!(view.balance, Money::from_major(2800));
        assert_eq!(view.balance_type, BalanceType::Cr);
        assert_eq!(view.total_entries, 1);

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["balance"], json!("2800"));
        assert_eq!(value["balanceType"], json!("Cr"));
        assert!(value.get("debitBalance").is_some());
        assert!(value.get("creditBalance").is_some());
    }

    #[test]
    fn test_stats_view_keys_breakdown_by_type_name() {
        let stats = LedgerStats {
            total_entries: 3,
            total_debits: Money::from_major(14700),
            total_credits: Money::from_major(8500),
            net_balance: Money::from_major(6200),
            active_students: 2,
            per_type: vec![
                TypeAggregate {
                    entry_type: EntryType::Payment,
                    entry_count: 1,
                    debit_total: Money::zero(),
                    credit_total: Money::from_major(8500),
                },
                TypeAggregate {
                    entry_type: EntryType::Invoice,
                    entry_count: 2,
                    debit_total: Money::from_major(14700),
                    credit_total: Money::zero(),
                },
            ],
        };

        let view = StatsView::from(&stats);
        assert_eq!(view.entry_type_breakdown.len(), 2);
        assert_eq!(view.entry_type_breakdown["Invoice"].count, 2);
        assert_eq!(
            view.entry_type_breakdown["Payment"].credits,
            Money::from_major(8500)
        );

        // BTreeMap keys serialize in stable alphabetical order
        let keys: Vec<&String> = view.entry_type_breakdown.keys().collect();
        assert_eq!(keys, vec!["Invoice", "Payment"]);

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["netBalance"], json!("6200"));
        assert_eq!(value["activeStudents"], json!(2));
        assert!(value["entryTypeBreakdown"]["Invoice"]["debits"].is_string());
    }

    #[test]
    fn test_list_view_resolves_names_per_entry() {
        let entry = sample_entry();
        let student = entry.student_id;
        let page = EntryPage {
            items: vec![entry],
            page: 1,
            limit: 20,
            total_items: 41,
        };

        let mut names = HashMap::new();
        names.insert(student, "Asha Verma".to_string());

        let view = EntryListView::from_page(&page, &names);
        assert_eq!(view.items[0].student_name, "Asha Verma");
        assert_eq!(view.pagination.total_pages, 3);

        let view = EntryListView::from_page(&page, &HashMap::new());
        assert_eq!(view.items[0].student_name, UNKNOWN_STUDENT);
    }
}
