//! Engine behaviour through the public library API

use chrono::{DateTime, Duration, TimeZone, Utc};
use jpc::core::{
    AuditAction, CaseEngine, CaseFilter, CaseStore, DeadlineTracker, EngineError,
    ExtensionError, ExtensionState, MemoryAuditSink, MemoryStore, SqliteStore, Status, Tier,
    WorkflowError,
};
use jpc::entities::{ConflictType, NewCase, ResidentialBlock};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

fn request(judge: &str) -> NewCase {
    NewCase {
        conflict_type: ConflictType::Individual,
        residential_block: ResidentialBlock::Bloque17,
        judge_id: judge.to_string(),
    }
}

fn memory_engine() -> CaseEngine<Arc<MemoryStore>, Arc<MemoryAuditSink>> {
    CaseEngine::with_audit(Arc::new(MemoryStore::new()), Arc::new(MemoryAuditSink::new()))
}

// ============================================================================
// Numbering
// ============================================================================

#[test]
fn test_parallel_filings_share_one_sequence() {
    let engine = memory_engine();
    let n = 50;

    let numbers: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let engine = &engine;
                scope.spawn(move || {
                    engine
                        .file_case(request("juez-01"), t0())
                        .unwrap()
                        .case_number
                        .to_string()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let actual: HashSet<String> = numbers.into_iter().collect();
    let expected: HashSet<String> = (1..=n).map(|i| format!("JC-2024-01-{:04}", i)).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_parallel_filings_on_shared_database_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cases.db");
    SqliteStore::open(&path).unwrap();

    let threads = 6;
    let per_thread = 10;

    let numbers: Vec<u32> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let path = path.clone();
                scope.spawn(move || {
                    let store = Arc::new(SqliteStore::open(&path).unwrap());
                    let engine = CaseEngine::with_audit(Arc::clone(&store), store);
                    (0..per_thread)
                        .map(|_| {
                            engine
                                .file_case(request("juez-02"), t0())
                                .unwrap()
                                .case_number
                                .sequence()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let mut sorted = numbers.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (1..=(threads * per_thread) as u32).collect::<Vec<_>>());

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(
        store.list_cases(&CaseFilter::default()).unwrap().len(),
        threads * per_thread
    );
}

#[test]
fn test_month_boundary_restarts_sequence() {
    let engine = memory_engine();
    let jan = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
    let feb = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    engine.file_case(request("juez-01"), jan).unwrap();
    let last_jan = engine.file_case(request("juez-01"), jan).unwrap();
    let first_feb = engine.file_case(request("juez-01"), feb).unwrap();

    assert_eq!(last_jan.case_number.to_string(), "JC-2024-01-0002");
    assert_eq!(first_feb.case_number.to_string(), "JC-2024-02-0001");
}

#[test]
fn test_sequence_exhaustion_is_reported() {
    let store = Arc::new(MemoryStore::new());
    let bucket = jpc::core::Bucket::new(2024, 1);
    for _ in 0..9999 {
        store.next_sequence(bucket).unwrap();
    }
    let engine = CaseEngine::with_audit(Arc::clone(&store), MemoryAuditSink::new());

    let err = engine.file_case(request("juez-01"), t0()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::SequenceExhausted { max: 9999, .. }
    ));
    assert!(store.list_cases(&CaseFilter::default()).unwrap().is_empty());

    // Other months are unaffected
    let feb = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
    assert!(engine.file_case(request("juez-01"), feb).is_ok());
}

// ============================================================================
// Deadlines
// ============================================================================

#[test]
fn test_deadline_examples() {
    let engine = memory_engine();
    let case = engine.file_case(request("juez-01"), t0()).unwrap();

    let at_filing = engine.view_deadline(&case, t0());
    assert_eq!(at_filing.tier, Tier::EnTiempo);
    assert_eq!(at_filing.progress_pct, 0.0);

    let day_ten = engine.view_deadline(&case, t0() + Duration::days(10));
    assert_eq!(day_ten.tier, Tier::Urgente);

    let day_fifteen = engine.view_deadline(&case, t0() + Duration::days(15));
    assert_eq!(day_fifteen.tier, Tier::Vencido);
    assert_eq!(day_fifteen.progress_pct, 100.0);

    let late = engine.view_deadline(&case, t0() + Duration::days(40));
    assert_eq!(late.progress_pct, 100.0);
    assert_eq!(late.remaining_days, -25);
}

#[test]
fn test_deadline_is_monotonic_and_repeatable() {
    let tracker = DeadlineTracker::default();
    let mut previous = Tier::EnTiempo;
    for hours in 0..(20 * 24) {
        let now = t0() + Duration::hours(hours);
        let view = tracker.evaluate(t0(), &ExtensionState::NotExtended, now);
        assert!(view.tier >= previous, "tier went back at hour {hours}");
        assert_eq!(view, tracker.evaluate(t0(), &ExtensionState::NotExtended, now));
        previous = view.tier;
    }
}

// ============================================================================
// Extensions and transitions
// ============================================================================

#[test]
fn test_concurrent_extension_requests_single_winner() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cases.db");
    let case = {
        let store = SqliteStore::open(&path).unwrap();
        CaseEngine::new(store)
            .file_case(request("juez-03"), t0())
            .unwrap()
    };

    let outcomes: Vec<Result<(), EngineError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let path = path.clone();
                let case = case.clone();
                scope.spawn(move || {
                    let engine = CaseEngine::new(SqliteStore::open(&path).unwrap());
                    engine
                        .grant_extension(&case, &format!("Motivo {i}"), "juez-03", t0())
                        .map(|_| ())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for outcome in outcomes.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            outcome,
            EngineError::Extension(ExtensionError::AlreadyExtended { .. })
        ));
    }

    let stored = SqliteStore::open(&path)
        .unwrap()
        .get_case(&case.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.extension.extra_days(), 15);
}

#[test]
fn test_terminal_states_reject_everything() {
    let engine = memory_engine();
    let case = engine.file_case(request("juez-01"), t0()).unwrap();
    let archived = engine
        .change_status(&case, Status::Archivado, "admin", t0())
        .unwrap();

    for target in Status::ALL {
        let err = engine
            .change_status(&archived, target, "admin", t0())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Workflow(WorkflowError::InvalidTransition { .. })
        ));
    }
    assert_eq!(engine.get_case(&case.id).unwrap(), archived);
}

#[test]
fn test_audit_trail_in_sqlite() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let engine = CaseEngine::with_audit(Arc::clone(&store), Arc::clone(&store));

    let case = engine.file_case(request("juez-04"), t0()).unwrap();
    let case = engine
        .grant_extension(&case, "Peritaje", "juez-04", t0() + Duration::days(3))
        .unwrap();
    engine
        .change_status(&case, Status::Resuelto, "juez-04", t0() + Duration::days(20))
        .unwrap();

    let trail = store.audit_trail(&case.id).unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Filed,
            AuditAction::ExtensionGranted,
            AuditAction::StatusChanged
        ]
    );
    assert_eq!(trail[2].from_status, Some(Status::EnTramite));
    assert_eq!(trail[2].to_status, Some(Status::Resuelto));
}
