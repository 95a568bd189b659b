//! Repository tests against a live database.
//!
//! Skipped unless `DATABASE_URL` is set. Each test migrates the schema once,
//! then works inside a transaction that is rolled back on drop.

use jobly::models::company::{self, NewCompany};
use jobly::models::job::{self, NewJob};
use jobly::models::user::{self, NewUser};
use jobly::{FilterRequest, JoblyError, UpdatePayload};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::Mutex;
use tokio_postgres::Transaction;

static DB: Mutex<bool> = Mutex::const_new(false);

async fn try_connect() -> Option<tokio_postgres::Client> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (mut client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });

    let mut migrated = DB.lock().await;
    if !*migrated {
        jobly::migrate::run(&mut client).await.unwrap();
        *migrated = true;
    }
    Some(client)
}

fn new_company(handle: &str, num_employees: i32) -> NewCompany {
    NewCompany {
        handle: handle.to_string(),
        name: format!("Test {handle}"),
        description: format!("Desc {handle}"),
        num_employees: Some(num_employees),
        logo_url: Some(format!("http://{handle}.img")),
    }
}

fn new_job(title: &str, handle: &str, salary: i32, equity: Option<Decimal>) -> NewJob {
    NewJob {
        title: title.to_string(),
        salary: Some(salary),
        equity,
        company_handle: handle.to_string(),
    }
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        first_name: "First".to_string(),
        last_name: "Last".to_string(),
        email: format!("{username}@email.com"),
        is_admin: false,
    }
}

async fn seed(tx: &Transaction<'_>) -> Vec<job::Job> {
    for (handle, size) in [("zzt-c1", 1), ("zzt-c2", 2), ("zzt-c3", 3)] {
        company::create(tx, &new_company(handle, size)).await.unwrap();
    }
    let mut jobs = Vec::new();
    for (title, salary, equity) in [
        ("J1", 100, Some(Decimal::new(1, 1))),
        ("J2", 200, Some(Decimal::ZERO)),
        ("J3", 300, None),
    ] {
        jobs.push(
            job::create(tx, &new_job(title, "zzt-c1", salary, equity))
                .await
                .unwrap(),
        );
    }
    jobs
}

fn request(value: serde_json::Value) -> FilterRequest {
    serde_json::from_value(value).unwrap()
}

fn payload(value: serde_json::Value) -> UpdatePayload {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn company_search_and_update() {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let _guard = DB.lock().await;
    let tx = client.transaction().await.unwrap();
    seed(&tx).await;

    let found = company::search(&tx, &request(json!({"nameLike": "zzt-c", "minEmployees": 2})))
        .await
        .unwrap();
    let handles: Vec<_> = found.iter().map(|c| c.handle.as_str()).collect();
    assert_eq!(handles, ["zzt-c2", "zzt-c3"]);

    let found = company::search(
        &tx,
        &FilterRequest::from_pairs([("nameLike", "ZZT-C"), ("maxEmployees", "1")]),
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);

    let updated = company::update(
        &tx,
        "zzt-c1",
        &payload(json!({"numEmployees": 10, "logoUrl": null})),
    )
    .await
    .unwrap();
    assert_eq!(updated.num_employees, Some(10));
    assert_eq!(updated.logo_url, None);
    assert_eq!(updated.name, "Test zzt-c1");

    let detail = company::get(&tx, "zzt-c1").await.unwrap();
    assert_eq!(detail.jobs.len(), 3);

    let err = company::update(&tx, "zzt-nope", &payload(json!({"name": "X"})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    company::remove(&tx, "zzt-c3").await.unwrap();
    assert!(company::get(&tx, "zzt-c3").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn duplicate_company_is_a_bad_request() {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let _guard = DB.lock().await;
    let tx = client.transaction().await.unwrap();
    seed(&tx).await;

    let err = company::create(&tx, &new_company("zzt-c1", 1))
        .await
        .unwrap_err();
    assert!(err.is_bad_request());
    assert_eq!(err.to_string(), "Duplicate company: zzt-c1");
}

#[tokio::test]
async fn job_search_and_lifecycle() {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let _guard = DB.lock().await;
    let mut tx = client.transaction().await.unwrap();
    let jobs = seed(&tx).await;

    let found = job::search(
        &tx,
        &request(json!({"companyLike": "zzt-c1", "hasEquity": true})),
    )
    .await
    .unwrap();
    let titles: Vec<_> = found.iter().map(|j| j.title.as_str()).collect();
    assert_eq!(titles, ["J1"]);

    let found = job::search(
        &tx,
        &FilterRequest::from_pairs([("companyLike", "zzt-c1"), ("minSalary", "200")]),
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 2);

    let updated = job::update(&tx, jobs[2].id, &payload(json!({"equity": 0.5, "salary": null})))
        .await
        .unwrap();
    assert_eq!(updated.equity, Some(Decimal::new(5, 1)));
    assert_eq!(updated.salary, None);
    assert_eq!(updated.company_handle, "zzt-c1");

    let equity = serde_json::to_value(&updated).unwrap()["equity"].clone();
    let updated = job::update(&tx, jobs[2].id, &payload(json!({"equity": equity})))
        .await
        .unwrap();
    assert_eq!(updated.equity, Some(Decimal::new(5, 1)));

    {
        let sp = tx.savepoint("missing_company").await.unwrap();
        let err = job::create(&sp, &new_job("J9", "zzt-nope", 1, None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No company: zzt-nope");
    }

    job::remove(&tx, jobs[0].id).await.unwrap();
    let err = job::get(&tx, jobs[0].id).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(_)));
}

#[tokio::test]
async fn applications() {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let _guard = DB.lock().await;
    let mut tx = client.transaction().await.unwrap();
    let jobs = seed(&tx).await;
    user::register(&tx, &new_user("zzt-u1")).await.unwrap();

    user::apply(&tx, "zzt-u1", jobs[0].id).await.unwrap();
    user::apply(&tx, "zzt-u1", jobs[1].id).await.unwrap();

    {
        let sp = tx.savepoint("duplicate_application").await.unwrap();
        let err = user::apply(&sp, "zzt-u1", jobs[0].id).await.unwrap_err();
        assert!(err.is_bad_request());
    }

    let err = user::apply(&tx, "zzt-nobody", jobs[0].id).await.unwrap_err();
    assert_eq!(err.to_string(), "No user: zzt-nobody");

    let detail = user::get(&tx, "zzt-u1").await.unwrap();
    assert_eq!(detail.jobs, [jobs[0].id, jobs[1].id]);

    user::unapply(&tx, "zzt-u1", jobs[0].id).await.unwrap();
    assert!(
        user::get_application(&tx, "zzt-u1", jobs[0].id)
            .await
            .unwrap_err()
            .is_not_found()
    );

    assert_eq!(user::unapply_all(&tx, "zzt-u1").await.unwrap(), 1);
    assert!(user::applications_for(&tx, "zzt-u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn user_update_and_remove() {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let _guard = DB.lock().await;
    let mut tx = client.transaction().await.unwrap();
    user::register(&tx, &new_user("zzt-u2")).await.unwrap();

    {
        let sp = tx.savepoint("duplicate_user").await.unwrap();
        let err = user::register(&sp, &new_user("zzt-u2")).await.unwrap_err();
        assert_eq!(err.to_string(), "Duplicate username: zzt-u2");
    }

    let updated = user::update(&tx, "zzt-u2", &payload(json!({"firstName": "New"})))
        .await
        .unwrap();
    assert_eq!(updated.first_name, "New");
    assert_eq!(updated.last_name, "Last");

    user::remove(&tx, "zzt-u2").await.unwrap();
    assert!(user::remove(&tx, "zzt-u2").await.unwrap_err().is_not_found());
}
