//! Unit tests for the store module
//!
//! Every behaviour is checked against both backends.

use super::*;
use crate::core::audit::{AuditAction, AuditEvent, AuditSink};
use crate::entities::case::{ConflictType, NewCase, Resolution, ResolutionMethod, ResidentialBlock};
use chrono::{DateTime, Duration, Offset, TimeZone, Utc};
use std::collections::HashSet;
use tempfile::tempdir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

fn backends() -> Vec<(&'static str, Box<dyn CaseStore>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        ("sqlite", Box::new(SqliteStore::open_in_memory().unwrap())),
    ]
}

fn file_case(store: &dyn CaseStore, judge: &str, filed_at: DateTime<Utc>) -> Case {
    let bucket = Bucket::containing(filed_at, Utc.fix());
    let sequence = store.next_sequence(bucket).unwrap();
    let case = Case::file(
        CaseNumber::new(bucket, sequence).unwrap(),
        NewCase {
            conflict_type: ConflictType::Vecinal,
            residential_block: ResidentialBlock::Bloque20,
            judge_id: judge.to_string(),
        },
        filed_at,
    );
    store.insert_case(&case).unwrap();
    case
}

#[test]
fn test_sequence_per_bucket() {
    for (name, store) in backends() {
        let jan = Bucket::new(2024, 1);
        let feb = Bucket::new(2024, 2);

        assert_eq!(store.next_sequence(jan).unwrap(), 1, "{name}");
        assert_eq!(store.next_sequence(jan).unwrap(), 2, "{name}");
        assert_eq!(store.next_sequence(feb).unwrap(), 1, "{name}");
        assert_eq!(store.next_sequence(jan).unwrap(), 3, "{name}");
    }
}

#[test]
fn test_insert_and_get_roundtrip() {
    for (name, store) in backends() {
        let case = file_case(store.as_ref(), "juez-01", t0());

        let loaded = store.get_case(&case.id).unwrap().expect(name);
        assert_eq!(loaded, case, "{name}");

        let by_number = store.find_by_number(&case.case_number).unwrap().expect(name);
        assert_eq!(by_number.id, case.id, "{name}");

        assert!(store.get_case(&CaseId::new()).unwrap().is_none(), "{name}");
    }
}

#[test]
fn test_duplicate_number_rejected() {
    for (name, store) in backends() {
        let case = file_case(store.as_ref(), "juez-01", t0());

        let mut clash = case.clone();
        clash.id = CaseId::new();
        let err = store.insert_case(&clash).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCase { .. }), "{name}: {err}");
    }
}

#[test]
fn test_extension_compare_and_set() {
    for (name, store) in backends() {
        let case = file_case(store.as_ref(), "juez-01", t0());
        let at = t0() + Duration::days(11);
        let first = Extension::new(at, "Peritaje pendiente", 15).granted_by("juez-01");
        let second = Extension::new(at + Duration::days(1), "Otra", 15);

        assert!(store.set_extension_if_absent(&case.id, &first).unwrap(), "{name}");
        assert!(!store.set_extension_if_absent(&case.id, &second).unwrap(), "{name}");

        let loaded = store.get_case(&case.id).unwrap().unwrap();
        assert_eq!(loaded.extension.granted(), Some(&first), "{name}");
        assert_eq!(loaded.updated_at, at, "{name}");
    }
}

#[test]
fn test_extension_refused_once_case_left_en_tramite() {
    for (name, store) in backends() {
        let case = file_case(store.as_ref(), "juez-01", t0());
        let now = t0() + Duration::days(4);

        let mut resolved = case.clone();
        resolved.status = Status::Resuelto;
        resolved.resolved_at = Some(now);
        resolved.updated_at = now;
        assert!(store.update_status(&resolved, Status::EnTramite).unwrap(), "{name}");

        let ext = Extension::new(now, "Peritaje pendiente", 15);
        assert!(!store.set_extension_if_absent(&case.id, &ext).unwrap(), "{name}");

        let loaded = store.get_case(&case.id).unwrap().unwrap();
        assert!(!loaded.extension.is_granted(), "{name}");
        assert_eq!(loaded.status, Status::Resuelto, "{name}");
    }
}

#[test]
fn test_extension_on_missing_case() {
    for (name, store) in backends() {
        let ext = Extension::new(t0(), "x", 15);
        let err = store.set_extension_if_absent(&CaseId::new(), &ext).unwrap_err();
        assert!(matches!(err, StoreError::CaseNotFound { .. }), "{name}");
    }
}

#[test]
fn test_status_compare_and_set() {
    for (name, store) in backends() {
        let case = file_case(store.as_ref(), "juez-01", t0());
        let now = t0() + Duration::days(3);

        let mut resolved = case.clone();
        resolved.status = Status::Resuelto;
        resolved.resolved_at = Some(now);
        resolved.updated_at = now;
        resolved.resolution = Some(Resolution {
            method: ResolutionMethod::Mediacion,
            notes: Some("Acuerdo firmado".to_string()),
        });

        assert!(store.update_status(&resolved, Status::EnTramite).unwrap(), "{name}");
        // Second writer still believes the case is en_tramite
        assert!(!store.update_status(&resolved, Status::EnTramite).unwrap(), "{name}");

        let loaded = store.get_case(&case.id).unwrap().unwrap();
        assert_eq!(loaded, resolved, "{name}");
    }
}

#[test]
fn test_list_filters_and_order() {
    for (name, store) in backends() {
        let a = file_case(store.as_ref(), "juez-01", t0());
        let b = file_case(store.as_ref(), "juez-02", t0() + Duration::days(1));
        let c = file_case(store.as_ref(), "juez-01", t0() + Duration::days(20));

        let all = store.list_cases(&CaseFilter::default()).unwrap();
        let ids: Vec<CaseId> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id], "{name}");

        let judge = store
            .list_cases(&CaseFilter::default().with_judge("juez-01"))
            .unwrap();
        assert_eq!(judge.len(), 2, "{name}");

        let jan = store
            .list_cases(&CaseFilter::default().with_bucket(Bucket::new(2024, 1)))
            .unwrap();
        assert_eq!(jan.len(), 2, "{name}");

        let mut closed = a.clone();
        closed.status = Status::Archivado;
        closed.archived_at = Some(t0() + Duration::days(2));
        store.update_status(&closed, Status::EnTramite).unwrap();

        let open = store
            .list_cases(&CaseFilter::default().with_status(Status::EnTramite))
            .unwrap();
        assert_eq!(open.len(), 2, "{name}");
        assert!(open.iter().all(|c| c.id != a.id), "{name}");
    }
}

#[test]
fn test_memory_store_offline() {
    let store = MemoryStore::new();
    let case = file_case(&store, "juez-01", t0());

    store.set_available(false);
    assert!(store.next_sequence(Bucket::new(2024, 1)).unwrap_err().is_unavailable());
    assert!(store.get_case(&case.id).unwrap_err().is_unavailable());

    store.set_available(true);
    assert_eq!(store.next_sequence(Bucket::new(2024, 1)).unwrap(), 2);
}

#[test]
fn test_sqlite_file_persists_counters_and_cases() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("cases.db");

    let case = {
        let store = SqliteStore::open(&path).unwrap();
        file_case(&store, "juez-03", t0())
    };

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.get_case(&case.id).unwrap(), Some(case));
    assert_eq!(reopened.next_sequence(Bucket::new(2024, 1)).unwrap(), 2);
}

#[test]
fn test_sqlite_open_missing_directory_is_unavailable() {
    let tmp = tempdir().unwrap();
    let err = SqliteStore::open(tmp.path().join("missing/cases.db"))
        .err()
        .unwrap();
    assert!(err.is_unavailable());
}

#[test]
fn test_sqlite_concurrent_connections_never_duplicate() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("cases.db");
    SqliteStore::open(&path).unwrap();

    let bucket = Bucket::new(2024, 7);
    let threads = 8;
    let per_thread = 25;

    let mut seen: Vec<u32> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let path = path.clone();
                scope.spawn(move || {
                    // Independent connection per thread, as separate processes would have
                    let store = SqliteStore::open(&path).unwrap();
                    (0..per_thread)
                        .map(|_| store.next_sequence(bucket).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let total = threads * per_thread;
    let unique: HashSet<u32> = seen.iter().copied().collect();
    assert_eq!(unique.len(), total);
    seen.sort_unstable();
    assert_eq!(seen, (1..=total as u32).collect::<Vec<_>>());
}

#[test]
fn test_sqlite_audit_trail() {
    let store = SqliteStore::open_in_memory().unwrap();
    let case = file_case(&store, "juez-01", t0());
    let other = file_case(&store, "juez-01", t0());

    store.record(&AuditEvent::filed(&case, "juez-01")).unwrap();
    store.record(&AuditEvent::filed(&other, "juez-01")).unwrap();
    store
        .record(&AuditEvent::extension_granted(
            &case,
            "juez-01",
            t0() + Duration::days(12),
            "Peritaje",
        ))
        .unwrap();

    let trail = store.audit_trail(&case.id).unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].action, AuditAction::Filed);
    assert_eq!(trail[0].to_status, Some(Status::EnTramite));
    assert_eq!(trail[1].action, AuditAction::ExtensionGranted);
    assert_eq!(trail[1].detail.as_deref(), Some("Peritaje"));
}
