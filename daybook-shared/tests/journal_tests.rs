/// Integration tests for journal entries
///
/// Run with: cargo test --test journal_tests

mod common;

use chrono::{TimeZone, Utc};
use common::{day, lines, TestContext};
use daybook_shared::error::ServiceError;
use daybook_shared::models::journal::format_date;
use daybook_shared::store::{Collection, DocumentStore};

#[tokio::test]
async fn test_create_then_get_by_date() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;

    let written_at = Utc.with_ymd_and_hms(2002, 5, 20, 18, 30, 0).unwrap();
    let created = journal
        .create("user-1", &lines(&["first", "second"]), written_at)
        .await
        .unwrap();
    assert_eq!(format_date(created.date), "2002-05-20T00:00:00Z");

    let lookup_at = Utc.with_ymd_and_hms(2002, 5, 20, 3, 0, 0).unwrap();
    let entry = journal.get_by_date("user-1", lookup_at).await.unwrap();

    assert_eq!(entry.id, created.id);
    assert_eq!(entry.entries, vec!["first", "second"]);
    assert_eq!(entry.date, day(2002, 5, 20));
    assert_eq!(entry.user_id, "user-1");
}

#[tokio::test]
async fn test_second_create_same_day_fails() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;

    journal.create("user-1", &lines(&["morning"]), day(2002, 5, 20)).await.unwrap();

    let later = Utc.with_ymd_and_hms(2002, 5, 20, 23, 59, 59).unwrap();
    assert!(matches!(
        journal.create("user-1", &lines(&["evening"]), later).await,
        Err(ServiceError::EntryAlreadyExists)
    ));

    // Other users and other days are unaffected
    journal.create("user-2", &lines(&["mine"]), day(2002, 5, 20)).await.unwrap();
    journal.create("user-1", &lines(&["next"]), day(2002, 5, 21)).await.unwrap();
    assert_eq!(ctx.store.count(Collection::Journal).await, 3);
}

#[tokio::test]
async fn test_concurrent_creates_same_day() {
    let ctx = TestContext::new();
    let journal = ctx.services.journal.clone();
    let a = lines(&["a"]);
    let b = lines(&["b"]);

    let (first, second) = tokio::join!(
        journal.create("user-1", &a, day(2002, 5, 20)),
        journal.create("user-1", &b, day(2002, 5, 20)),
    );

    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(ctx.store.count(Collection::Journal).await, 1);
}

#[tokio::test]
async fn test_create_validation() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;
    let today = Utc::now();

    assert!(matches!(
        journal.create("", &lines(&["entry"]), today).await,
        Err(ServiceError::UserUnauthorized)
    ));
    assert!(matches!(
        journal.create("u", &lines(&["1", "2", "3", "4", "5", "6", "7", "8"]), today).await,
        Err(ServiceError::TooManyEntries)
    ));
    assert!(matches!(
        journal.create("u", &lines(&["<div></div>"]), today).await,
        Err(ServiceError::JournalEntryEmpty)
    ));
    assert!(matches!(
        journal.create("u", &["a".repeat(501)], today).await,
        Err(ServiceError::JournalEntryInvalid)
    ));
    assert_eq!(ctx.store.count(Collection::Journal).await, 0);
}

#[tokio::test]
async fn test_create_stores_sanitized_entries() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;

    journal
        .create("u", &lines(&["  <b>bold</b> day ", "<script>x</script>y"]), day(2002, 5, 20))
        .await
        .unwrap();

    let entry = journal.get_by_date("u", day(2002, 5, 20)).await.unwrap();
    assert_eq!(entry.entries, vec!["bold day", "xy"]);
}

#[tokio::test]
async fn test_get_by_date_missing() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;
    ctx.write_entry("user-1", "entry", day(2002, 5, 20)).await;

    assert!(matches!(
        journal.get_by_date("user-1", day(2002, 5, 21)).await,
        Err(ServiceError::NoJournalWithDate)
    ));
    assert!(matches!(
        journal.get_by_date("user-2", day(2002, 5, 20)).await,
        Err(ServiceError::NoJournalWithDate)
    ));
    assert!(matches!(
        journal.get_by_date("", day(2002, 5, 20)).await,
        Err(ServiceError::UserUnauthorized)
    ));
}

#[tokio::test]
async fn test_update_replaces_entries() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;
    let id = ctx.write_entry("user-1", "before", day(2002, 5, 20)).await;

    let updated = journal
        .update(&id, "user-1", &lines(&["after", "<i>more</i>"]))
        .await
        .unwrap();
    assert_eq!(updated.entries, vec!["after", "more"]);

    let entry = journal.get_by_date("user-1", day(2002, 5, 20)).await.unwrap();
    assert_eq!(entry.entries, vec!["after", "more"]);
}

#[tokio::test]
async fn test_update_by_other_user_is_not_found() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;
    let id = ctx.write_entry("owner", "private", day(2002, 5, 20)).await;

    assert!(matches!(
        journal.update(&id, "intruder", &lines(&["mine now"])).await,
        Err(ServiceError::EntryNotFound)
    ));

    let entry = journal.get_by_date("owner", day(2002, 5, 20)).await.unwrap();
    assert_eq!(entry.entries, vec!["private"]);
}

#[tokio::test]
async fn test_update_validates_before_lookup() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;

    assert!(matches!(
        journal.update("missing", "user-1", &lines(&[" ", "entry"])).await,
        Err(ServiceError::JournalEntryEmpty)
    ));
    assert!(matches!(
        journal.update("missing", "user-1", &lines(&["<div></div>", "entry"])).await,
        Err(ServiceError::JournalEntryEmpty)
    ));
    assert!(matches!(
        journal.update("missing", "user-1", &lines(&["entry"])).await,
        Err(ServiceError::EntryNotFound)
    ));
    assert!(matches!(
        journal.update("missing", "", &lines(&["entry"])).await,
        Err(ServiceError::UserUnauthorized)
    ));
}

#[tokio::test]
async fn test_malformed_ids_never_reach_the_store() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;
    let id = ctx.write_entry("owner", "entry", day(2002, 5, 20)).await;

    // Lookups that got as far as the store would fail with a store error
    ctx.store.set_available(false);

    let shouting = id.to_uppercase();
    for bad in ["", ".", "..", "../../daybook_users/_doc/abc", "abc?x=1", shouting.as_str()] {
        assert!(matches!(
            journal.update(bad, "owner", &lines(&["entry"])).await,
            Err(ServiceError::EntryNotFound)
        ));
        assert!(matches!(
            journal.delete(bad, "owner").await,
            Err(ServiceError::EntryNotFound)
        ));
    }

    ctx.store.set_available(true);
    journal.delete(&id, "owner").await.unwrap();
}

#[tokio::test]
async fn test_delete() {
    let ctx = TestContext::new();
    let journal = &ctx.services.journal;
    let id = ctx.write_entry("owner", "entry", day(2002, 5, 20)).await;

    assert!(matches!(
        journal.delete(&id, "intruder").await,
        Err(ServiceError::EntryNotFound)
    ));
    assert!(ctx.store.exists(Collection::Journal, &id).await.unwrap());

    journal.delete(&id, "owner").await.unwrap();
    assert!(!ctx.store.exists(Collection::Journal, &id).await.unwrap());

    assert!(matches!(
        journal.delete(&id, "owner").await,
        Err(ServiceError::EntryNotFound)
    ));
    assert!(matches!(
        journal.delete(&id, "").await,
        Err(ServiceError::UserUnauthorized)
    ));

    // The day is free again
    ctx.write_entry("owner", "again", day(2002, 5, 20)).await;
}
