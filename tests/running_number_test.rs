mod common;

use chrono::{Local, NaiveDate};
use common::{quote, Harness};
use detailing_backend::service::running_number::month_prefix;
use serde_json::json;
use std::collections::HashSet;

fn may_2025() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
}

#[tokio::test]
async fn test_first_number_of_an_empty_month() {
    let h = Harness::new();
    assert_eq!(h.numbers.next_for(may_2025()).await.unwrap(), "2505001");
    assert_eq!(h.numbers.next_for(may_2025()).await.unwrap(), "2505002");
}

#[tokio::test]
async fn test_counter_is_seeded_from_stored_numbers() {
    let h = Harness::new();
    for number in ["2505003", "2505007", "2505005"] {
        h.quotes.insert(quote(json!({ "runningNumber": number, "idNumber": number })));
    }
    assert_eq!(h.numbers.next_for(may_2025()).await.unwrap(), "2505008");
}

#[tokio::test]
async fn test_previous_month_numbers_do_not_carry_over() {
    let h = Harness::new();
    h.quotes.insert(quote(json!({ "runningNumber": "2504099" })));
    assert_eq!(h.numbers.next_for(may_2025()).await.unwrap(), "2505001");
}

#[tokio::test]
async fn test_concurrent_callers_get_distinct_numbers() {
    let h = Harness::new();
    h.quotes.insert(quote(json!({ "runningNumber": "2505010" })));

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let numbers = h.numbers.clone();
            tokio::spawn(async move { numbers.next_for(may_2025()).await.unwrap() })
        })
        .collect();

    let mut issued = HashSet::new();
    for task in tasks {
        issued.insert(task.await.unwrap());
    }
    assert_eq!(issued.len(), 50);
    assert!(issued.contains("2505011"));
    assert!(issued.contains("2505060"));
}

#[tokio::test]
async fn test_peek_does_not_consume() {
    let h = Harness::new();
    let prefix = month_prefix(Local::now().date_naive());
    h.quotes.insert(quote(json!({ "runningNumber": format!("{}004", prefix) })));

    let expected = format!("{}005", prefix);
    assert_eq!(h.numbers.peek().await.unwrap(), expected);
    assert_eq!(h.numbers.peek().await.unwrap(), expected);
    assert_eq!(h.numbers.next().await.unwrap(), expected);
    assert_eq!(h.numbers.peek().await.unwrap(), format!("{}006", prefix));
}
