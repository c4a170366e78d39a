//! Integration tests for the PostgreSQL ledger store
//!
//! Every test starts its own PostgreSQL container through testcontainers,
//! so the suite needs a local Docker daemon. Run it explicitly with
//! `cargo test -p infra_db -- --ignored`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use core_kernel::{AdapterHealth, HealthCheckable, LedgerEntryId, Money, StudentId};
use domain_ledger::{
    BalanceType, EntryType, LedgerQuery, LedgerService, LedgerStorePort, MockStudentDirectory,
};
use rust_decimal_macros::dec;
use test_utils::{
    assert_newest_first, AdjustmentRequestBuilder, IdFixtures, InvoiceRequestBuilder,
    LedgerEntryBuilder, MoneyFixtures, PaymentRequestBuilder, StudentFixtures, TemporalFixtures,
    TestDatabase,
};
use uuid::Uuid;

async fn test_db() -> TestDatabase {
    TestDatabase::new()
        .await
        .expect("postgres test container should start")
}

mod entry_persistence {
    use super::*;

    /// Tests that an entry survives the full trip through the database
    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_insert_round_trips_through_postgres() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        let reference = Uuid::new_v4();
        let entry = LedgerEntryBuilder::new()
            .with_entry_number(1)
            .with_date(TemporalFixtures::invoice_date())
            .with_reference(reference)
            .with_balance(Money::new(dec!(8500.00)), BalanceType::Dr)
            .with_notes("August rent, single room")
            .build();

        let stored = store.insert(entry.clone(), None).await?;
        assert_eq!(stored.id, entry.id);
        assert_eq!(stored.entry_number, 1);

        let fetched = store.entry(entry.id, None).await?;
        assert_eq!(fetched.student_id, entry.student_id);
        assert_eq!(fetched.date, TemporalFixtures::invoice_date());
        assert_eq!(fetched.entry_type, EntryType::Invoice);
        assert_eq!(fetched.description, entry.description);
        assert_eq!(fetched.reference_id, Some(reference));
        assert_eq!(fetched.debit, entry.debit);
        assert_eq!(fetched.credit, Money::zero());
        assert_eq!(fetched.balance, Money::new(dec!(8500.00)));
        assert_eq!(fetched.balance_type, BalanceType::Dr);
        assert_eq!(fetched.notes.as_deref(), Some("August rent, single room"));
        assert_eq!(fetched.created_by, entry.created_by);
        assert!(!fetched.is_reversed);
        // TIMESTAMPTZ is microsecond precision; Utc::now() carries nanoseconds
        assert_eq!((fetched.created_at - entry.created_at).num_milliseconds(), 0);

        Ok(())
    }

    /// Tests that the UNIQUE backstop on entry numbers surfaces as a conflict
    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_insert_rejects_duplicate_entry_numbers() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        store
            .insert(LedgerEntryBuilder::new().with_entry_number(7).build(), None)
            .await?;

        let rival = LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
            .with_entry_number(7)
            .build();
        let err = store.insert(rival, None).await.unwrap_err();
        assert!(err.is_conflict(), "expected a conflict, got: {err}");

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_missing_entry_reads_as_not_found() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        let err = store
            .entry(LedgerEntryId::new_v7(), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        Ok(())
    }
}

mod reversal_stamping {
    use super::*;

    /// Tests the guarded `Active → Reversed` transition end to end
    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_reversal_stamp_applies_exactly_once() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        let neighbor = LedgerEntryBuilder::new().with_entry_number(1).build();
        let neighbor_id = neighbor.id;
        store.insert(neighbor, None).await?;

        let target = LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
            .with_entry_number(2)
            .build();
        let target_id = target.id;
        store.insert(target, None).await?;

        let stamped = store
            .mark_reversed(
                target_id,
                "warden.rao",
                TemporalFixtures::payment_date(),
                None,
            )
            .await?;
        assert!(stamped.is_reversed);
        assert_eq!(stamped.reversed_by.as_deref(), Some("warden.rao"));
        assert_eq!(
            stamped.reversal_date,
            Some(TemporalFixtures::payment_date())
        );

        let second = store
            .mark_reversed(target_id, "warden.rao", Utc::now(), None)
            .await
            .unwrap_err();
        assert!(second.is_conflict(), "expected a conflict, got: {second}");

        // the guard touches only the targeted row
        let untouched = store.entry(neighbor_id, None).await?;
        assert!(!untouched.is_reversed);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_reversing_a_missing_entry_is_not_found() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        let err = store
            .mark_reversed(LedgerEntryId::new_v7(), "warden.rao", Utc::now(), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        Ok(())
    }
}

mod student_history {
    use super::*;

    /// Tests ordering and that reversed rows stay visible in the history
    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_history_is_newest_first_and_keeps_reversed_rows() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();
        let asha = IdFixtures::student_id();
        let ravi = IdFixtures::second_student_id();

        let invoice = LedgerEntryBuilder::new()
            .with_entry_number(1)
            .with_date(TemporalFixtures::invoice_date())
            .build();
        let payment = LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
            .with_entry_number(2)
            .with_date(TemporalFixtures::payment_date())
            .build();
        let payment_id = payment.id;
        let other = LedgerEntryBuilder::new()
            .with_student(ravi)
            .with_entry_number(3)
            .with_date(TemporalFixtures::invoice_date())
            .build();

        store.insert(invoice, None).await?;
        store.insert(payment, None).await?;
        store.insert(other, None).await?;
        store
            .mark_reversed(payment_id, "warden.rao", Utc::now(), None)
            .await?;

        let history = store.entries_for_student(asha, None).await?;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.student_id == asha));
        assert!(history.iter().any(|e| e.is_reversed));
        assert_newest_first(&history);

        Ok(())
    }
}

mod search_and_pagination {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_search_filters_compose() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();
        let asha = IdFixtures::student_id();
        let ravi = IdFixtures::second_student_id();

        store
            .insert(
                LedgerEntryBuilder::new()
                    .with_entry_number(1)
                    .with_date(TemporalFixtures::invoice_date())
                    .build(),
                None,
            )
            .await?;
        store
            .insert(
                LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
                    .with_entry_number(2)
                    .with_date(TemporalFixtures::payment_date())
                    .build(),
                None,
            )
            .await?;
        store
            .insert(
                LedgerEntryBuilder::new()
                    .with_student(ravi)
                    .with_entry_number(3)
                    .with_date(TemporalFixtures::invoice_date())
                    .build(),
                None,
            )
            .await?;

        let payments = store
            .search(
                LedgerQuery::for_student(asha).with_type(EntryType::Payment),
                None,
            )
            .await?;
        assert_eq!(payments.total_items, 1);
        assert_eq!(payments.items[0].entry_type, EntryType::Payment);
        assert_eq!(payments.items[0].student_id, asha);

        // a window around the invoice date excludes the later payment
        let window = store
            .search(
                LedgerQuery::default().between(
                    TemporalFixtures::term_start(),
                    TemporalFixtures::discount_date(),
                ),
                None,
            )
            .await?;
        assert_eq!(window.total_items, 2);
        assert!(window
            .items
            .iter()
            .all(|e| e.entry_type == EntryType::Invoice));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_search_matches_description_and_notes_case_insensitively() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        store
            .insert(
                LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
                    .with_entry_number(1)
                    .build(),
                None,
            )
            .await?;
        store
            .insert(
                LedgerEntryBuilder::new()
                    .with_entry_number(2)
                    .with_notes("Carried forward from August")
                    .build(),
                None,
            )
            .await?;

        let by_description = store
            .search(LedgerQuery::default().matching("upi"), None)
            .await?;
        assert_eq!(by_description.total_items, 1);
        assert_eq!(by_description.items[0].entry_type, EntryType::Payment);

        let by_notes = store
            .search(LedgerQuery::default().matching("CARRIED"), None)
            .await?;
        assert_eq!(by_notes.total_items, 1);
        assert_eq!(
            by_notes.items[0].notes.as_deref(),
            Some("Carried forward from August")
        );

        let miss = store
            .search(LedgerQuery::default().matching("cheque"), None)
            .await?;
        assert_eq!(miss.total_items, 0);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_pagination_reports_totals() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        for number in 1..=5u64 {
            let date = TemporalFixtures::term_start() + Duration::days(number as i64);
            store
                .insert(
                    LedgerEntryBuilder::new()
                        .with_entry_number(number)
                        .with_date(date)
                        .build(),
                    None,
                )
                .await?;
        }

        let first = store
            .search(LedgerQuery::default().paginate(1, 2), None)
            .await?;
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_items, 5);
        assert_eq!(first.total_pages(), 3);
        assert_eq!(first.items[0].entry_number, 5);

        let last = store
            .search(LedgerQuery::default().paginate(3, 2), None)
            .await?;
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].entry_number, 1);

        let beyond = store
            .search(LedgerQuery::default().paginate(9, 2), None)
            .await?;
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_items, 5);

        Ok(())
    }
}

mod aggregates {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_student_totals_skip_reversed_entries() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();
        let asha = IdFixtures::student_id();

        store
            .insert(LedgerEntryBuilder::new().with_entry_number(1).build(), None)
            .await?;
        store
            .insert(
                LedgerEntryBuilder::payment(Money::new(dec!(3000.00)))
                    .with_entry_number(2)
                    .build(),
                None,
            )
            .await?;
        let bounced = LedgerEntryBuilder::payment(Money::new(dec!(1000.00)))
            .with_entry_number(3)
            .build();
        let bounced_id = bounced.id;
        store.insert(bounced, None).await?;
        store
            .mark_reversed(bounced_id, "warden.rao", Utc::now(), None)
            .await?;

        let totals = store.student_totals(asha, None).await?;
        assert_eq!(totals.debit_total, MoneyFixtures::monthly_rent());
        assert_eq!(totals.credit_total, Money::new(dec!(3000.00)));
        assert_eq!(totals.entry_count, 2);

        // a student with no rows reads as zero totals
        let empty = store.student_totals(StudentId::new_v7(), None).await?;
        assert_eq!(empty.entry_count, 0);
        assert!(empty.debit_total.is_zero());
        assert!(empty.credit_total.is_zero());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_stats_group_by_type_and_count_active_students() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();
        let ravi = IdFixtures::second_student_id();

        store
            .insert(LedgerEntryBuilder::new().with_entry_number(1).build(), None)
            .await?;
        store
            .insert(
                LedgerEntryBuilder::payment(Money::new(dec!(3000.00)))
                    .with_entry_number(2)
                    .build(),
                None,
            )
            .await?;
        let withdrawn = LedgerEntryBuilder::new()
            .with_student(ravi)
            .with_entry_number(3)
            .build();
        let withdrawn_id = withdrawn.id;
        store.insert(withdrawn, None).await?;
        store
            .mark_reversed(withdrawn_id, "warden.rao", Utc::now(), None)
            .await?;

        let stats = store.collect_stats(None).await?;
        // ravi's only entry is reversed, so asha is the one active student
        assert_eq!(stats.active_students, 1);
        assert_eq!(stats.per_type.len(), 2);
        assert_eq!(stats.per_type[0].entry_type, EntryType::Invoice);
        assert_eq!(stats.per_type[0].entry_count, 1);
        assert_eq!(stats.per_type[0].debit_total, MoneyFixtures::monthly_rent());
        assert_eq!(stats.per_type[1].entry_type, EntryType::Payment);
        assert_eq!(stats.per_type[1].credit_total, Money::new(dec!(3000.00)));

        Ok(())
    }
}

mod sequencing {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_latest_entry_number_tracks_the_high_water_mark() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        assert_eq!(store.latest_entry_number(None).await?, None);

        store
            .insert(LedgerEntryBuilder::new().with_entry_number(5).build(), None)
            .await?;
        assert_eq!(store.latest_entry_number(None).await?, Some(5));

        let latest = LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
            .with_entry_number(9)
            .build();
        let latest_id = latest.id;
        store.insert(latest, None).await?;
        store
            .mark_reversed(latest_id, "warden.rao", Utc::now(), None)
            .await?;

        // reversed entries keep their number on the high-water mark
        assert_eq!(store.latest_entry_number(None).await?, Some(9));

        Ok(())
    }
}

mod source_references {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_reference_exists_is_keyed_on_the_type_tag() -> anyhow::Result<()> {
        let db = test_db().await;
        let store = db.ledger_store();

        let reference = Uuid::new_v4();
        store
            .insert(
                LedgerEntryBuilder::payment(MoneyFixtures::partial_payment())
                    .with_entry_number(1)
                    .with_reference(reference)
                    .build(),
                None,
            )
            .await?;

        assert!(
            store
                .reference_exists(reference, EntryType::Payment, None)
                .await?
        );
        assert!(
            !store
                .reference_exists(reference, EntryType::Invoice, None)
                .await?
        );
        assert!(
            !store
                .reference_exists(Uuid::new_v4(), EntryType::Payment, None)
                .await?
        );

        Ok(())
    }
}

mod adapter_health {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_health_check_reports_healthy() {
        let db = test_db().await;
        let store = db.ledger_store();

        let result = store.health_check().await;
        assert_eq!(result.adapter_id, "postgres-ledger-store");
        assert!(matches!(result.status, AdapterHealth::Healthy));
    }
}

mod end_to_end {
    use super::*;

    /// Drives the full service stack over a real database: create entries,
    /// reverse one, and verify the balance and the restart-safe numbering.
    #[tokio::test]
    #[ignore = "requires a local Docker daemon"]
    async fn test_service_round_trip_over_postgres() -> anyhow::Result<()> {
        let db = test_db().await;
        let store: Arc<dyn LedgerStorePort> = Arc::new(db.ledger_store());
        let directory = Arc::new(MockStudentDirectory::with_students(StudentFixtures::all()).await);

        let service = LedgerService::new(store.clone(), directory.clone()).await?;

        let invoice = service
            .create_invoice_entry(InvoiceRequestBuilder::new().build(), None)
            .await?;
        assert_eq!(invoice.balance_type, BalanceType::Dr);
        assert_eq!(invoice.balance, MoneyFixtures::monthly_rent());

        let payment = service
            .create_payment_entry(
                PaymentRequestBuilder::new()
                    .with_amount(MoneyFixtures::monthly_rent())
                    .build(),
                None,
            )
            .await?;
        assert_eq!(payment.balance_type, BalanceType::Nil);

        let reversal = service
            .reverse_entry(payment.id, "warden.rao", "Cheque bounced", None)
            .await?;
        assert_eq!(reversal.reversal_entry.debit, MoneyFixtures::monthly_rent());

        let balance = service
            .student_balance(IdFixtures::student_id(), None)
            .await?;
        assert_eq!(balance.balance_type, BalanceType::Dr);
        assert_eq!(balance.balance, MoneyFixtures::monthly_rent());
        assert_eq!(balance.total_entries, 1);

        // a fresh service over the same store continues the numbering
        let restarted = LedgerService::new(store.clone(), directory).await?;
        restarted
            .create_adjustment_entry(AdjustmentRequestBuilder::credit().build(), None)
            .await?;
        assert_eq!(store.latest_entry_number(None).await?, Some(4));

        Ok(())
    }
}
