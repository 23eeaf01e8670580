use rewards_core::db::migrations::latest_version;
use rewards_core::db::open_db_in_memory;
use rewards_core::{
    CatalogService, NewTask, RepoError, RepoResult, SqliteTaskCatalogRepository, Task, TaskId,
    TaskCatalogRepository, TaskValidationError,
};
use rusqlite::Connection;

struct UnreachableCatalog;

impl TaskCatalogRepository for UnreachableCatalog {
    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        Err(RepoError::Unavailable("connection refused".to_string()))
    }

    fn get_task(&self, _id: TaskId) -> RepoResult<Option<Task>> {
        Err(RepoError::Unavailable("connection refused".to_string()))
    }
}

#[test]
fn insert_and_list_tasks_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskCatalogRepository::try_new(&conn).unwrap();

    let skate = repo
        .insert_task(
            &NewTask::new("Skate", 50)
                .with_category("sport")
                .with_recurrence("daily")
                .with_description("Half an hour at the park"),
        )
        .unwrap();
    let dishes = repo
        .insert_task(&NewTask::new("  Dishes ", 30).with_category("home"))
        .unwrap();

    let tasks = repo.list_tasks().unwrap();
    assert_eq!(tasks, vec![skate.clone(), dishes.clone()]);
    assert_eq!(dishes.name, "Dishes");
    assert_eq!(skate.description.as_deref(), Some("Half an hour at the park"));

    let fetched = repo.get_task(skate.id).unwrap().unwrap();
    assert_eq!(fetched, skate);
    assert!(repo.get_task(9_999).unwrap().is_none());
}

#[test]
fn insert_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskCatalogRepository::try_new(&conn).unwrap();

    let err = repo.insert_task(&NewTask::new(" ", 10)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::BlankName)
    ));
}

#[test]
fn list_rejects_invalid_persisted_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO tasks (name, points) VALUES ('', 10);", [])
        .unwrap();
    let repo = SqliteTaskCatalogRepository::try_new(&conn).unwrap();

    let err = repo.list_tasks().unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskCatalogRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            points INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskCatalogRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "category"
        })
    ));
}

#[test]
fn service_degrades_to_empty_catalog_when_store_is_unreachable() {
    let service = CatalogService::new(UnreachableCatalog);

    let err = service.list_tasks().unwrap_err();
    assert_eq!(err.operation, "list_tasks");

    let section = service.load();
    assert!(section.data.is_empty());
    assert!(section.is_degraded());
}

#[test]
fn service_lists_tasks_from_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskCatalogRepository::try_new(&conn).unwrap();
    let task = repo.insert_task(&NewTask::new("Skate", 50)).unwrap();

    let service = CatalogService::new(repo);
    let section = service.load();
    assert!(!section.is_degraded());
    assert_eq!(section.data, vec![task]);
}
