use chrono::{NaiveDate, NaiveTime};
use routine_core::{
    error_chain, InMemoryRoutineRepository, JsonFileRoutineRepository, NewRoutine, RepoError, RepoResult,
    RoutineItem, RoutineRepository, RoutineStore, RoutineStoreError, RoutineValidationError,
};
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn request(day: u32, start: (u32, u32), end: Option<(u32, u32)>, activity: &str) -> NewRoutine {
    NewRoutine {
        date: date(2024, 6, day),
        start_time: time(start.0, start.1),
        end_time: end.map(|(h, m)| time(h, m)),
        activity: activity.to_string(),
    }
}

fn assert_sorted(items: &[RoutineItem]) {
    for pair in items.windows(2) {
        assert!(
            pair[0].schedule_key() <= pair[1].schedule_key(),
            "out of order: {:?} before {:?}",
            pair[0].schedule_key(),
            pair[1].schedule_key()
        );
    }
}

/// Repository whose saves always fail.
struct FailingRepository;

impl RoutineRepository for FailingRepository {
    fn load(&self) -> Vec<RoutineItem> {
        Vec::new()
    }

    fn save(&self, _items: &[RoutineItem]) -> RepoResult<()> {
        Err(RepoError::Write {
            path: PathBuf::from("/read-only/routines.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

#[test]
fn gym_then_coffee_then_remove_gym() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());

    let gym = store
        .add(&request(1, (8, 0), Some((9, 0)), " Gym "))
        .unwrap();
    let listed = store.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].activity(), "Gym");
    assert_eq!(listed[0].time_range(), "08:00\u{2013}09:00");

    store
        .add(&request(1, (7, 0), Some((7, 30)), "Coffee"))
        .unwrap();
    let activities = store
        .list()
        .iter()
        .map(|item| item.activity().to_string())
        .collect::<Vec<_>>();
    assert_eq!(activities, vec!["Coffee", "Gym"]);

    assert!(store.remove(gym.id()).unwrap());
    let remaining = store.list();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].activity(), "Coffee");
}

#[test]
fn order_holds_after_mixed_adds_and_removes() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    let inputs = [
        (3, (10, 0), Some((11, 0))),
        (1, (18, 0), None),
        (2, (6, 0), Some((6, 30))),
        (1, (18, 0), Some((19, 0))),
        (1, (7, 45), Some((8, 0))),
        (3, (9, 59), Some((23, 59))),
        (2, (6, 0), Some((6, 15))),
    ];

    let mut created = Vec::new();
    for (index, (day, start, end)) in inputs.into_iter().enumerate() {
        let item = store
            .add(&request(day, start, end, &format!("activity {index}")))
            .unwrap();
        created.push(item);
        assert_sorted(&store.list());
    }

    store.remove(created[0].id()).unwrap();
    assert_sorted(&store.list());
    store.remove(created[4].id()).unwrap();
    assert_sorted(&store.list());

    let listed = store.list();
    assert_eq!(listed.len(), inputs.len() - 2);
    assert_eq!(listed[0].time_range(), "18:00");
    assert_eq!(listed[2].time_range(), "06:00\u{2013}06:15");
    assert_eq!(listed[3].time_range(), "06:00\u{2013}06:30");
    // Instant sorts before the interval sharing its start.
    let evening = listed
        .iter()
        .filter(|item| item.date() == date(2024, 6, 1) && item.start_time() == time(18, 0))
        .collect::<Vec<_>>();
    assert!(evening[0].is_instant());
    assert!(!evening[1].is_instant());
}

#[test]
fn equal_schedule_keeps_insertion_order() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    store.add(&request(1, (8, 0), Some((9, 0)), "first")).unwrap();
    store.add(&request(1, (8, 0), Some((9, 0)), "second")).unwrap();
    store.add(&request(1, (8, 0), Some((9, 0)), "third")).unwrap();

    let activities = store
        .list()
        .iter()
        .map(|item| item.activity().to_string())
        .collect::<Vec<_>>();
    assert_eq!(activities, vec!["first", "second", "third"]);
}

#[test]
fn blank_activity_is_rejected_without_side_effects() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    store.add(&request(1, (8, 0), Some((9, 0)), "Gym")).unwrap();
    let saves_before = store.repository().save_count();

    let err = store
        .add(&request(1, (10, 0), Some((11, 0)), "\u{200B}  \u{00A0}\u{200B}"))
        .unwrap_err();

    assert!(matches!(
        err,
        RoutineStoreError::Validation(RoutineValidationError::EmptyActivity)
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(store.repository().save_count(), saves_before);
}

#[test]
fn non_increasing_interval_is_rejected_without_side_effects() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());

    let equal = store
        .add(&request(1, (9, 0), Some((9, 0)), "Meeting"))
        .unwrap_err();
    let reversed = store
        .add(&request(1, (9, 0), Some((8, 59)), "Meeting"))
        .unwrap_err();

    for err in [equal, reversed] {
        assert!(matches!(
            err,
            RoutineStoreError::Validation(RoutineValidationError::InvalidInterval { .. })
        ));
    }
    assert!(store.is_empty());
    assert_eq!(store.repository().save_count(), 0);
}

#[test]
fn every_mutation_saves_the_full_collection() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    let walk = store.add(&request(2, (6, 0), None, "Walk")).unwrap();
    store.add(&request(1, (6, 0), None, "Run")).unwrap();
    assert_eq!(store.repository().save_count(), 2);
    assert_eq!(store.repository().snapshot(), store.list());

    store.remove(walk.id()).unwrap();
    assert_eq!(store.repository().save_count(), 3);
    assert_eq!(store.repository().snapshot(), store.list());
}

#[test]
fn removing_absent_id_is_a_noop() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    store.add(&request(1, (8, 0), None, "Journal")).unwrap();
    let before = store.list();

    assert!(!store.remove(Uuid::new_v4()).unwrap());
    assert_eq!(store.list(), before);
    assert_eq!(store.repository().save_count(), 1);
}

#[test]
fn remove_drops_exactly_the_requested_id() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    let a = store.add(&request(1, (8, 0), None, "A")).unwrap();
    let b = store.add(&request(1, (9, 0), None, "B")).unwrap();
    let c = store.add(&request(1, (10, 0), None, "C")).unwrap();

    assert!(store.remove(b.id()).unwrap());
    let ids = store.list().iter().map(RoutineItem::id).collect::<Vec<_>>();
    assert_eq!(ids, vec![a.id(), c.id()]);
    assert!(store.get(b.id()).is_none());
}

#[test]
fn list_is_a_detached_snapshot() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    store.add(&request(1, (8, 0), None, "A")).unwrap();
    let snapshot = store.list();

    store.add(&request(1, (7, 0), None, "B")).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.len(), 2);
}

#[test]
fn save_failure_is_reported_and_memory_keeps_the_change() {
    let mut store = RoutineStore::new(FailingRepository);

    let err = store
        .add(&request(1, (8, 0), Some((9, 0)), "Gym"))
        .unwrap_err();
    assert!(matches!(err, RoutineStoreError::Persist(RepoError::Write { .. })));
    assert_eq!(
        error_chain(&err),
        "routine change not saved: failed to write `/read-only/routines.json`: read-only volume"
    );

    let listed = store.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].activity(), "Gym");

    let err = store.remove(listed[0].id()).unwrap_err();
    assert!(matches!(err, RoutineStoreError::Persist(_)));
    assert!(store.is_empty());
    assert!(store.flush().is_err());
}

#[test]
fn open_hydrates_sorted_and_deduplicated() {
    let late = RoutineItem::with_id(Uuid::new_v4(), date(2024, 6, 2), time(8, 0), None, "Late")
        .unwrap();
    let early =
        RoutineItem::with_id(Uuid::new_v4(), date(2024, 6, 1), time(8, 0), None, "Early")
            .unwrap();
    let repo =
        InMemoryRoutineRepository::with_items(vec![late.clone(), early.clone(), late.clone()]);

    let store = RoutineStore::open(repo);
    assert_eq!(store.list(), vec![early, late]);
    assert_eq!(store.repository().save_count(), 0);
}

#[test]
fn reopening_a_file_store_restores_the_same_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("DailyRoutineTracker").join("routines.json");

    let mut store = RoutineStore::open(JsonFileRoutineRepository::new(&path));
    assert!(store.is_empty());
    store.add(&request(1, (8, 0), Some((9, 0)), "Gym")).unwrap();
    store.add(&request(1, (7, 0), Some((7, 30)), "Coffee")).unwrap();
    store.flush().unwrap();
    let expected = store.list();

    let reopened = RoutineStore::open(JsonFileRoutineRepository::new(&path));
    assert_eq!(reopened.list(), expected);
}

#[test]
fn rejected_input_reports_its_reason_once() {
    let mut store = RoutineStore::new(InMemoryRoutineRepository::new());
    let err = store
        .add(&request(1, (9, 0), Some((9, 0)), "Standup"))
        .unwrap_err();

    let rendered = error_chain(&err);
    assert_eq!(rendered.matches("must be after start").count(), 1, "{rendered}");
    assert!(std::error::Error::source(&err).is_none());
}
