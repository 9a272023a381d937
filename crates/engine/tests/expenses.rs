use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Category, DateWindow, Engine, EngineError, ExpenseInput, ExpenseSearch, Money, SignupInput,
    Summary,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    for username in ["alice", "bob"] {
        engine
            .signup(SignupInput {
                username,
                password1: "correct-horse-battery",
                password2: "correct-horse-battery",
            })
            .await
            .unwrap();
    }
    (engine, db)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn form<'a>(date: &'a str, category: &'a str, description: &'a str, amount: &'a str) -> ExpenseInput<'a> {
    ExpenseInput {
        date,
        category,
        description,
        amount,
    }
}

#[tokio::test]
async fn create_then_list_newest_first() {
    let (engine, _db) = engine_with_db().await;

    engine
        .create_expense("alice", form("2024-05-01", "food", "Lunch", "100.00"))
        .await
        .unwrap();
    engine
        .create_expense("alice", form("2024-05-03", "bills", "Power", "50.50"))
        .await
        .unwrap();
    engine
        .create_expense("alice", form("2024-05-02", "transport", "Bus", "2"))
        .await
        .unwrap();

    let expenses = engine.list_expenses("alice", None).await.unwrap();
    let dates: Vec<_> = expenses.iter().map(|e| e.date).collect();
    assert_eq!(dates, [day(2024, 5, 3), day(2024, 5, 2), day(2024, 5, 1)]);
    assert_eq!(expenses[0].category, Category::Bills);
    assert_eq!(expenses[0].amount, Money::new(50_50));

    let summary = Summary::compute(&expenses, day(2024, 5, 2));
    assert_eq!(summary.total, Money::new(152_50));
    assert_eq!(summary.today_total, Money::new(2_00));
    assert_eq!(summary.highest, Money::new(100_00));
}

#[tokio::test]
async fn invalid_form_is_not_persisted() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_expense("alice", form("2024-05-01", "food", "Lunch", "lots"))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("amount"), ["Enter a number.".to_string()]);

    assert!(engine.list_expenses("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_respects_inclusive_window() {
    let (engine, _db) = engine_with_db().await;
    for date in ["2024-04-30", "2024-05-01", "2024-05-31", "2024-06-01"] {
        engine
            .create_expense("alice", form(date, "other", "x", "1"))
            .await
            .unwrap();
    }

    let window = DateWindow::new(day(2024, 5, 1), day(2024, 5, 31));
    let expenses = engine.list_expenses("alice", Some(window)).await.unwrap();
    let dates: Vec<_> = expenses.iter().map(|e| e.date).collect();
    assert_eq!(dates, [day(2024, 5, 31), day(2024, 5, 1)]);
}

#[tokio::test]
async fn update_overwrites_fields() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense("alice", form("2024-05-01", "food", "Lunch", "10"))
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            "alice",
            created.id,
            form("2024-05-02", "shopping", "Shoes", "79.99"),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.category, Category::Shopping);

    let stored = engine.expense("alice", created.id).await.unwrap();
    assert_eq!(stored.date, day(2024, 5, 2));
    assert_eq!(stored.description, "Shoes");
    assert_eq!(stored.amount, Money::new(79_99));
}

#[tokio::test]
async fn invalid_update_keeps_the_old_record() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense("alice", form("2024-05-01", "food", "Lunch", "10"))
        .await
        .unwrap();

    let err = engine
        .update_expense("alice", created.id, form("", "food", "Lunch", "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let stored = engine.expense("alice", created.id).await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let (engine, _db) = engine_with_db().await;

    assert_eq!(
        engine.delete_expense("alice", 999).await,
        Err(EngineError::KeyNotFound("expense 999".to_string()))
    );
    assert!(matches!(
        engine
            .update_expense("alice", 999, form("2024-05-01", "food", "x", "1"))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.expense("alice", 999).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn delete_removes_the_record() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense("alice", form("2024-05-01", "food", "Lunch", "10"))
        .await
        .unwrap();

    engine.delete_expense("alice", created.id).await.unwrap();
    assert!(engine.list_expenses("alice", None).await.unwrap().is_empty());
    assert!(matches!(
        engine.delete_expense("alice", created.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn expenses_are_scoped_to_their_owner() {
    let (engine, _db) = engine_with_db().await;
    let alices = engine
        .create_expense("alice", form("2024-05-01", "food", "Lunch", "10"))
        .await
        .unwrap();

    assert!(engine.list_expenses("bob", None).await.unwrap().is_empty());
    assert!(matches!(
        engine.expense("bob", alices.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_expense("bob", alices.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(engine.list_expenses("alice", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn admin_search_spans_users() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_expense("alice", form("2024-05-01", "food", "Jollibee lunch", "10"))
        .await
        .unwrap();
    engine
        .create_expense("bob", form("2024-05-02", "bills", "Meralco", "1500"))
        .await
        .unwrap();
    engine
        .create_expense("bob", form("2024-06-02", "food", "Groceries", "800"))
        .await
        .unwrap();

    let all = engine
        .search_expenses(&ExpenseSearch::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let food = engine
        .search_expenses(&ExpenseSearch {
            category: Some(Category::Food),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(food.len(), 2);

    let text = engine
        .search_expenses(&ExpenseSearch {
            text: Some("LUNCH".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(text.len(), 1);
    assert_eq!(text[0].user_id, "alice");

    let bob_in_may = engine
        .search_expenses(&ExpenseSearch {
            user_id: Some("bob".to_string()),
            window: Some(DateWindow::new(day(2024, 5, 1), day(2024, 5, 31))),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(bob_in_may.len(), 1);
    assert_eq!(bob_in_may[0].description, "Meralco");

    engine.admin_delete_expense(bob_in_may[0].id).await.unwrap();
    assert!(matches!(
        engine.admin_delete_expense(bob_in_may[0].id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let (engine, _db) = engine_with_db().await;
    for description in ["50% off shoes", "Bus_fare", "Lunch"] {
        engine
            .create_expense("alice", form("2024-05-01", "other", description, "1"))
            .await
            .unwrap();
    }

    let search = |text: &str| ExpenseSearch {
        text: Some(text.to_string()),
        ..Default::default()
    };

    let percent = engine.search_expenses(&search("%")).await.unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].description, "50% off shoes");

    let underscore = engine.search_expenses(&search("_")).await.unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].description, "Bus_fare");

    assert!(engine.search_expenses(&search("\\")).await.unwrap().is_empty());
    assert_eq!(engine.search_expenses(&search("lunch")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn two_digit_years_are_stored_in_this_century() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense("alice", form("03/05/24", "food", "Lunch", "12.50"))
        .await
        .unwrap();
    assert_eq!(created.date, day(2024, 3, 5));

    let march = DateWindow::new(day(2024, 3, 1), day(2024, 3, 31));
    let listed = engine.list_expenses("alice", Some(march)).await.unwrap();
    assert_eq!(listed.len(), 1);
}
