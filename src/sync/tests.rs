use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tempfile::TempDir;

use super::*;
use crate::db::{init_database, APPLICATIONS_KEY};
use crate::models::{FileUpload, StatHighlight};
use crate::remote::MemoryRemoteStore;

struct Fixture {
    gateway: SyncGateway,
    cache: Arc<LocalCache>,
    remote: Arc<MemoryRemoteStore>,
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    async fn with_config(config: SyncConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("cache.sqlite"))
            .await
            .expect("Failed to init DB");
        let cache = Arc::new(LocalCache::new(pool.clone()));
        let remote = Arc::new(MemoryRemoteStore::new());
        let gateway = SyncGateway::new(cache.clone(), remote.clone(), config);
        Fixture {
            gateway,
            cache,
            remote,
            pool,
            _temp_dir: temp_dir,
        }
    }
}

fn test_config() -> SyncConfig {
    SyncConfig {
        submit_timeout: Duration::from_millis(100),
        fetch_timeout: Duration::from_millis(100),
        ..SyncConfig::default()
    }
}

fn upload(name: &str) -> Attachment {
    Attachment::Upload(FileUpload {
        file_name: name.to_string(),
        content_type: "application/octet-stream".to_string(),
        data: "aGVsbG8=".to_string(),
    })
}

fn ada(created_at: Option<&str>) -> NewApplication {
    NewApplication {
        full_name: "Ada Lovelace".to_string(),
        email: "ada@x.com".to_string(),
        phone: "555-1".to_string(),
        position: "Nurse".to_string(),
        years_of_experience: 5,
        passport_photo: Some(upload("photo.jpg")),
        cv: Some(upload("cv.pdf")),
        created_at: created_at.map(str::to_string),
    }
}

#[tokio::test]
async fn test_submit_with_unreachable_remote_is_visible_locally() {
    let fixture = Fixture::new().await;
    fixture.remote.set_reachable(false);

    let saved = fixture.gateway.submit_application(ada(None)).await.unwrap();
    assert!(saved.id.starts_with("local_"));
    assert_eq!(saved.status, ApplicationStatus::Pending);

    let local = fixture.cache.list_applications().await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].full_name, "Ada Lovelace");
    assert!(local[0].passport_photo.is_placeholder());
    assert_eq!(fixture.remote.document_count(Collection::Applications), 0);

    let fetched = fixture.gateway.fetch_applications().await;
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].status, ApplicationStatus::Pending);
    assert_eq!(fetched[0].full_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_submit_resolves_uploads_when_remote_is_up() {
    let fixture = Fixture::new().await;

    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();

    let photo_url = synced.passport_photo.resolved_url().expect("photo url");
    assert!(photo_url.starts_with("memory://files/"));
    assert_eq!(fixture.remote.file(photo_url).unwrap(), b"hello");
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);

    // The local buffer never keeps upload payloads.
    let local = fixture.cache.list_applications().await.unwrap();
    assert_eq!(local[0].id, synced.id);
    assert!(local[0].cv.is_placeholder());
}

#[tokio::test]
async fn test_failed_uploads_fall_back_to_placeholders() {
    let fixture = Fixture::new().await;
    fixture.remote.set_uploads_enabled(false);

    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);
    assert_eq!(
        synced.passport_photo,
        Attachment::Url("pending-upload://photo.jpg".to_string())
    );
    assert_eq!(synced.cv, Attachment::Url("pending-upload://cv.pdf".to_string()));
}

#[tokio::test]
async fn test_incomplete_submission_writes_nothing() {
    let fixture = Fixture::new().await;
    let mut request = ada(None);
    request.cv = None;

    let result = fixture.gateway.submit_application(request).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(fixture.cache.list_applications().await.unwrap().is_empty());
    assert_eq!(fixture.remote.document_count(Collection::Applications), 0);
}

#[tokio::test]
async fn test_invalid_created_at_is_rejected() {
    let fixture = Fixture::new().await;

    let result = fixture
        .gateway
        .submit_application(ada(Some("last tuesday")))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(fixture.cache.list_applications().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_local_buffer_does_not_block_submissions() {
    let fixture = Fixture::new().await;
    fixture
        .cache
        .put_raw(APPLICATIONS_KEY, "{not json")
        .await
        .unwrap();

    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);

    let local = fixture.cache.list_applications().await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].id, synced.id);
}

#[tokio::test]
async fn test_local_failure_still_pushes_to_remote() {
    let fixture = Fixture::new().await;
    fixture.pool.close().await;

    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);
    assert!(synced.passport_photo.resolved_url().is_some());

    // Nowhere to keep it: the caller must hear about it.
    fixture.remote.set_reachable(false);
    let result = fixture.gateway.submit_application(ada(None)).await;
    assert!(matches!(result, Err(AppError::Database(_))));
}

#[tokio::test]
async fn test_fetch_resyncs_local_only_applications() {
    let fixture = Fixture::new().await;
    fixture.remote.set_reachable(false);
    let offline = fixture.gateway.submit_application(ada(None)).await.unwrap();
    assert_eq!(fixture.remote.document_count(Collection::Applications), 0);

    fixture.remote.set_reachable(true);
    let fetched = fixture.gateway.fetch_applications().await;
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);
    // Local copy plus the freshly pushed remote copy.
    assert_eq!(fetched.len(), 2);
    assert!(fetched.iter().all(|a| a.id == offline.id));

    // Already synced: nothing is pushed twice.
    fixture.gateway.fetch_applications().await;
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);
}

#[tokio::test]
async fn test_get_pushes_local_only_application() {
    let fixture = Fixture::new().await;
    fixture.remote.set_reachable(false);
    let offline = fixture.gateway.submit_application(ada(None)).await.unwrap();
    fixture.remote.set_reachable(true);

    let found = fixture.gateway.get_application(&offline.id).await.unwrap();
    assert_eq!(found.id, offline.id);
    assert_eq!(found.status, ApplicationStatus::Pending);
    assert!(found.passport_photo.is_placeholder());
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);

    let unknown = fixture.gateway.get_application("local_0_00000000").await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_fetch_under_timeout_returns_local_newest_first() {
    let fixture = Fixture::new().await;
    fixture.remote.set_latency(Duration::from_millis(300));

    for created_at in [
        "2024-03-01T00:00:00Z",
        "2024-05-01T00:00:00Z",
        "2024-04-01T00:00:00Z",
    ] {
        fixture
            .gateway
            .submit_application(ada(Some(created_at)))
            .await
            .unwrap();
    }

    let fetched = fixture.gateway.fetch_applications().await;
    let created: Vec<&str> = fetched.iter().map(|a| a.created_at.as_str()).collect();
    assert_eq!(
        created,
        vec![
            "2024-05-01T00:00:00Z",
            "2024-04-01T00:00:00Z",
            "2024-03-01T00:00:00Z"
        ]
    );

    let mut local_ids: Vec<String> = fixture
        .cache
        .list_applications()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    let mut fetched_ids: Vec<String> = fetched.into_iter().map(|a| a.id).collect();
    local_ids.sort();
    fetched_ids.sort();
    assert_eq!(local_ids, fetched_ids);
}

#[tokio::test]
async fn test_slow_remote_write_lands_after_timeout() {
    let fixture = Fixture::new().await;
    fixture.remote.set_latency(Duration::from_millis(200));

    let saved = fixture.gateway.submit_application(ada(None)).await.unwrap();
    assert!(saved.passport_photo.is_placeholder());
    assert_eq!(fixture.remote.document_count(Collection::Applications), 0);

    // Two uploads and one insert, 200 ms each.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(fixture.remote.document_count(Collection::Applications), 1);

    fixture.remote.set_latency(Duration::ZERO);
    let remote_copy = fixture.gateway.get_application(&saved.id).await.unwrap();
    assert_eq!(remote_copy.full_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_merged_fetch_keeps_duplicates_by_default() {
    let fixture = Fixture::new().await;
    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();

    let fetched = fixture.gateway.fetch_applications().await;
    assert_eq!(fetched.len(), 2);
    assert!(fetched.iter().all(|a| a.id == synced.id));
}

#[tokio::test]
async fn test_merged_fetch_can_dedupe_by_identity() {
    let fixture = Fixture::with_config(SyncConfig {
        dedupe_applications: true,
        ..test_config()
    })
    .await;
    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();

    let fetched = fixture.gateway.fetch_applications().await;
    assert_eq!(fetched.len(), 1);
    // The remote copy wins.
    assert_eq!(fetched[0].passport_photo, synced.passport_photo);
}

#[tokio::test]
async fn test_update_status_is_remote_only() {
    let fixture = Fixture::new().await;
    fixture.remote.set_reachable(false);
    let local = fixture.gateway.submit_application(ada(None)).await.unwrap();
    fixture.remote.set_reachable(true);

    // Only the local buffer knows this id.
    let result = fixture
        .gateway
        .update_application_status(&local.id, ApplicationStatus::Rejected, None)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_update_status_writes_details_only_when_given() {
    let fixture = Fixture::new().await;
    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();

    let details = ApprovalDetails {
        approved_position: "Nurse".to_string(),
        amount: "$40,000".to_string(),
        start_date: "2024-06-01".to_string(),
        department: "Pediatrics".to_string(),
        notes: String::new(),
    };
    fixture
        .gateway
        .update_application_status(&synced.id, ApplicationStatus::Approved, Some(&details))
        .await
        .unwrap();

    let stored = fixture.gateway.get_application(&synced.id).await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Approved);
    assert_eq!(stored.approval_details, Some(details));
    assert!(stored.is_consistent());
}

#[tokio::test]
async fn test_update_status_fails_when_remote_errors() {
    let fixture = Fixture::new().await;
    let synced = fixture.gateway.submit_application(ada(None)).await.unwrap();
    fixture.remote.set_reachable(false);

    let result = fixture
        .gateway
        .update_application_status(&synced.id, ApplicationStatus::Rejected, None)
        .await;
    assert!(matches!(result, Err(AppError::Remote(_))));
}

#[tokio::test]
async fn test_appointments_round_trip_and_degrade_to_empty() {
    let fixture = Fixture::new().await;
    let booked = fixture
        .gateway
        .submit_appointment(NewAppointment {
            full_name: "Alan Turing".to_string(),
            email: "alan@x.com".to_string(),
            phone: "555-3".to_string(),
            doctor_id: "dr-1".to_string(),
            date: "2024-06-02".to_string(),
            time: "10:30".to_string(),
            message: "Checkup".to_string(),
        })
        .await
        .unwrap();
    assert!(!booked.id.is_empty());

    let listed = fixture.gateway.fetch_appointments().await;
    assert_eq!(listed, vec![booked]);

    fixture.remote.set_reachable(false);
    assert!(fixture.gateway.fetch_appointments().await.is_empty());
}

#[tokio::test]
async fn test_contact_requires_message() {
    let fixture = Fixture::new().await;
    let mut contact = NewContactMessage {
        name: "Ada".to_string(),
        email: "ada@x.com".to_string(),
        subject: "Hello".to_string(),
        message: String::new(),
    };
    assert!(matches!(
        fixture.gateway.submit_contact(contact.clone()).await,
        Err(AppError::Validation(_))
    ));

    contact.message = "Visiting hours?".to_string();
    fixture.gateway.submit_contact(contact).await.unwrap();
    assert_eq!(fixture.remote.document_count(Collection::Contacts), 1);
}

#[tokio::test]
async fn test_homepage_content_is_local_and_last_write_wins() {
    let fixture = Fixture::new().await;
    assert!(fixture.gateway.get_homepage_content().await.unwrap().is_none());

    let mut content = HomepageContent::default();
    content.stats.push(StatHighlight {
        id: String::new(),
        icon: "heart".to_string(),
        label: "Patients".to_string(),
        value: "10k+".to_string(),
    });
    let saved = fixture
        .gateway
        .update_homepage_content(content.clone())
        .await
        .unwrap();
    assert!(!saved.stats[0].id.is_empty());
    assert!(saved.updated_at.is_some());

    content.hero.title = "Second edit".to_string();
    fixture.gateway.update_homepage_content(content).await.unwrap();

    let stored = fixture.gateway.get_homepage_content().await.unwrap().unwrap();
    assert_eq!(stored.hero.title, "Second edit");

    // The remote store is never involved.
    fixture.remote.set_reachable(false);
    assert!(fixture.gateway.get_homepage_content().await.unwrap().is_some());
}

#[test]
fn test_sort_sinks_unparseable_timestamps() {
    let base = JobApplication {
        id: "a".to_string(),
        full_name: "x".to_string(),
        email: "x".to_string(),
        phone: "x".to_string(),
        position: "x".to_string(),
        years_of_experience: 0,
        passport_photo: Attachment::Url("u".to_string()),
        cv: Attachment::Url("u".to_string()),
        status: ApplicationStatus::Pending,
        created_at: "garbage".to_string(),
        approval_details: None,
    };
    let newer = JobApplication {
        id: "b".to_string(),
        created_at: "2024-01-02T00:00:00+02:00".to_string(),
        ..base.clone()
    };
    let older = JobApplication {
        id: "c".to_string(),
        created_at: "2024-01-01T23:00:00Z".to_string(),
        ..base.clone()
    };

    let mut apps = vec![base, older, newer];
    sort_newest_first(&mut apps);
    let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
    // 2024-01-02T00:00+02:00 is 2024-01-01T22:00Z, older than 23:00Z.
    assert_eq!(ids, vec!["c", "b", "a"]);
}

#[test]
fn test_local_ids_are_prefixed_and_unique() {
    let a = next_local_id();
    let b = next_local_id();
    assert!(a.starts_with(LOCAL_ID_PREFIX));
    assert_ne!(a, b);
}
