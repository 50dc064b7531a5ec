use chrono::{TimeZone, Utc};
use perch_core::category::{PALETTE, UNCATEGORIZED_ID};
use perch_core::clock::FixedClock;
use perch_core::datastore::DataStore;
use perch_core::ids::SeqIds;
use perch_core::store::Board;
use perch_core::task::TaskDraft;
use tempfile::tempdir;

fn fixed_board(store: DataStore) -> Board {
    let now = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("timestamp");
    Board::with_capabilities(
        store,
        Box::new(FixedClock(now)),
        Box::new(SeqIds::new("task")),
    )
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        ..TaskDraft::default()
    }
}

#[test]
fn board_flow_orders_and_persists() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store.clone());

    let work = board
        .categories
        .create("Work", None)
        .expect("create category")
        .expect("category id");
    assert_eq!(work, "work");
    board
        .categories
        .create("Home", None)
        .expect("create category")
        .expect("category id");

    let mut report = draft("Write report");
    report.category_id = work.clone();
    board.tasks.create(report).expect("create task");
    board.tasks.create(draft("Buy groceries")).expect("create task");

    let titles: Vec<&str> = board.tasks.all().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Buy groceries", "Write report"]);

    let ids: Vec<&str> = board.categories.all().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["work", "home"]);

    let reloaded = Board::open(store);
    assert_eq!(reloaded.tasks.all(), board.tasks.all());
    assert_eq!(reloaded.categories.all(), board.categories.all());
}

#[test]
fn injected_clock_and_ids_flow_into_new_tasks() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    board.tasks.create(draft("First")).expect("create task");
    board.tasks.create(draft("Second")).expect("create task");

    let tasks = board.tasks.all();
    assert_eq!(tasks[0].id, "task-2");
    assert_eq!(tasks[1].id, "task-1");
    assert_eq!(tasks[0].created_at, board.now());
}

#[test]
fn toggle_is_an_involution() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    board.tasks.create(draft("Flip me")).expect("create task");
    let id = board.tasks.all()[0].id.clone();
    let before = board.tasks.all()[0].clone();

    assert_eq!(
        board.tasks.toggle_completed(&id).expect("toggle"),
        Some(true)
    );
    assert!(board.tasks.get(&id).expect("task").completed);

    assert_eq!(
        board.tasks.toggle_completed(&id).expect("toggle"),
        Some(false)
    );
    assert_eq!(board.tasks.get(&id), Some(&before));

    assert_eq!(board.tasks.toggle_completed("missing").expect("toggle"), None);
}

#[test]
fn blank_titles_and_names_are_silent_noops() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    assert!(board.tasks.create(draft("   ")).expect("create").is_none());
    assert!(board.tasks.all().is_empty());

    board.tasks.create(draft("Keep me")).expect("create task");
    let id = board.tasks.all()[0].id.clone();
    assert!(!board.tasks.update(&id, draft("  ")).expect("update"));
    assert_eq!(board.tasks.get(&id).expect("task").title, "Keep me");

    assert!(
        board
            .categories
            .create("  ", None)
            .expect("create")
            .is_none()
    );
    assert!(board.categories.all().is_empty());
}

#[test]
fn deleting_a_category_detaches_its_tasks() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    let work = board
        .categories
        .create("Work", None)
        .expect("create category")
        .expect("category id");

    let mut one = draft("One");
    one.category_id = work.clone();
    let mut two = draft("Two");
    two.category_id = work.clone();
    board.tasks.create(one).expect("create task");
    board.tasks.create(two).expect("create task");
    let done_id = board.tasks.all()[0].id.clone();
    board.tasks.toggle_completed(&done_id).expect("toggle");

    let detached = board
        .remove_category(&work)
        .expect("remove category")
        .expect("category existed");
    assert_eq!(detached, 2);
    assert_eq!(board.tasks.all().len(), 2);
    assert!(board.tasks.all().iter().all(|t| t.category_id.is_empty()));

    assert_eq!(board.remove_category("missing").expect("remove"), None);
}

#[test]
fn view_groups_lanes_with_bucket_last() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    let work = board
        .categories
        .create("Work", None)
        .expect("create category")
        .expect("category id");

    let mut in_lane = draft("In lane");
    in_lane.category_id = work.clone();
    board.tasks.create(in_lane).expect("create task");
    board.tasks.create(draft("Stray")).expect("create task");
    board.tasks.create(draft("Done already")).expect("create task");
    let done_id = board.tasks.all()[0].id.clone();
    board.tasks.toggle_completed(&done_id).expect("toggle");

    let view = board.view();
    assert_eq!(view.totals.all, 3);
    assert_eq!(view.totals.completed, 1);

    let lane_ids: Vec<&str> = view.lanes.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(lane_ids, vec!["work", UNCATEGORIZED_ID]);
    assert_eq!(view.lanes[0].tasks.len(), 1);
    assert_eq!(view.lanes[1].tasks.len(), 1);
    assert_eq!(view.lanes[1].tasks[0].title, "Stray");
}

#[test]
fn slug_collisions_get_numeric_suffixes() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    let first = board
        .categories
        .create("Work", None)
        .expect("create")
        .expect("id");
    let second = board
        .categories
        .create("work", None)
        .expect("create")
        .expect("id");
    let third = board
        .categories
        .create("WORK", None)
        .expect("create")
        .expect("id");

    assert_eq!(first, "work");
    assert_eq!(second, "work-2");
    assert_eq!(third, "work-3");
}

#[test]
fn palette_cycles_by_creation_order() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store);

    for i in 0..PALETTE.len() + 1 {
        board
            .categories
            .create(&format!("Lane {i}"), None)
            .expect("create category");
    }
    board
        .categories
        .create("Custom", Some("#123456".to_string()))
        .expect("create category");

    let categories = board.categories.all();
    assert_eq!(categories[0].color, PALETTE[0]);
    assert_eq!(categories[PALETTE.len() - 1].color, PALETTE[PALETTE.len() - 1]);
    assert_eq!(categories[PALETTE.len()].color, PALETTE[0]);
    assert_eq!(categories.last().expect("custom").color, "#123456");
}

#[test]
fn corrupt_task_slot_loads_empty_without_touching_categories() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let mut board = fixed_board(store.clone());

    board
        .categories
        .create("Survivor", None)
        .expect("create category");
    board.tasks.create(draft("Lost to corruption")).expect("create task");

    std::fs::write(&store.tasks_path, "definitely not json\n").expect("corrupt slot");

    let reloaded = Board::open(store);
    assert!(reloaded.tasks.all().is_empty());
    assert_eq!(reloaded.categories.all().len(), 1);
}
