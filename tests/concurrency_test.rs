//! 并发新增测试
//!
//! 适配器在任务间共享；唯一性冲突由后端在同一把集合锁内判定

use futures::future::join_all;
use rat_mongo_adapter::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

fn account_model() -> ModelMeta {
    ModelMeta::new("accounts")
        .field("id", object_id_field())
        .field("email", string_field(None, None, None).required().unique())
        .field("balance", integer_field(Some(0), None).default_value(DataValue::Int(0)))
}

fn setup() -> (Arc<MemoryDriver>, Arc<MongoAdapter>) {
    let model = account_model();
    let driver = Arc::new(MemoryDriver::new("bank"));
    driver.ensure_model_indexes(&model);
    let catalog = ModelCatalog::from_models(vec![model]).unwrap();
    let adapter = Arc::new(MongoAdapter::new(driver.clone(), catalog));
    (driver, adapter)
}

fn account(email: &str) -> NormalizedQuery {
    let mut payload = HashMap::new();
    payload.insert("email".to_string(), DataValue::String(email.to_string()));
    NormalizedQuery::create("accounts", payload).with_fetch(true)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_creates_all_succeed() {
    let (driver, adapter) = setup();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.create_record(account(&format!("user{}@bank.io", i))).await })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for result in join_all(handles).await {
        let record = result.unwrap().unwrap().unwrap();
        assert_eq!(record["balance"], DataValue::Int(0));
        ids.insert(record["id"].to_string());
    }

    assert_eq!(ids.len(), 32);
    assert_eq!(driver.documents("accounts").len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_colliding_creates_yield_one_winner() {
    let (driver, adapter) = setup();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.create_record(account("same@bank.io")).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(Some(_)) => successes += 1,
            Err(AdapterError::NotUnique { fields, .. }) => {
                assert_eq!(fields, Some(BTreeSet::from(["email".to_string()])));
                conflicts += 1;
            }
            other => panic!("意外结果: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(driver.documents("accounts").len(), 1);
}

#[tokio::test]
async fn test_joined_creates_on_one_task() {
    let (_driver, adapter) = setup();

    let results = join_all(vec![
        adapter.create_record(account("a@bank.io")),
        adapter.create_record(account("b@bank.io")),
        adapter.create_record(account("a@bank.io")),
    ])
    .await;

    let not_unique = results
        .iter()
        .filter(|r| matches!(r, Err(AdapterError::NotUnique { .. })))
        .count();
    assert_eq!(not_unique, 1);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
}
