//! Integration tests for the Row Source queries.
//!
//! Requires a migrated database at `DATABASE_URL`; run with `--ignored`.

use nps_db::test_fixtures::{midday, TestDatabase};
use nps_db::{FilterContext, ResponseRepository};

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_kpis_for_empty_context_are_zero() {
    let test_db = TestDatabase::new().await;

    let filter = FilterContext::all()
        .with_range(Some(midday("2024-01-01")), Some(midday("2024-01-31")))
        .with_survey(test_db.survey_name.clone())
        .with_title("X");
    let kpis = test_db.db.responses.kpis(&filter).await.unwrap();

    assert_eq!(kpis.total, 0);
    assert_eq!(kpis.nps, 0.0);
    assert_eq!(kpis.promoters, 0);
    assert_eq!(kpis.detractors, 0);
    assert_eq!(kpis.avg_score, 0.0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_kpis_count_bands_inside_range() {
    let test_db = TestDatabase::new().await;
    test_db.seed_response(10, Some("Prima"), "X", "2024-01-03").await;
    test_db.seed_response(9, None, "X", "2024-01-10").await;
    test_db.seed_response(7, Some("Ok"), "X", "2024-01-15").await;
    test_db.seed_response(3, Some("Te duur"), "X", "2024-01-31").await;
    // Outside the range
    test_db.seed_response(0, Some("Slecht"), "X", "2024-02-01").await;

    let filter = FilterContext::all()
        .with_range(Some(midday("2024-01-01")), Some(midday("2024-01-31")))
        .with_survey(test_db.survey_name.clone());
    let kpis = test_db.db.responses.kpis(&filter).await.unwrap();

    assert_eq!(kpis.total, 4);
    assert_eq!(kpis.promoters, 2);
    assert_eq!(kpis.passives, 1);
    assert_eq!(kpis.detractors, 1);
    assert_eq!(kpis.nps, 25.0);
    assert_eq!(kpis.avg_score, 7.3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_monthly_trend_is_chronological() {
    let test_db = TestDatabase::new().await;
    test_db.seed_response(10, None, "X", "2024-03-02").await;
    test_db.seed_response(2, None, "X", "2024-01-02").await;
    test_db.seed_response(9, None, "X", "2024-02-02").await;

    let filter = FilterContext::all().with_survey(test_db.survey_name.clone());
    let trend = test_db.db.responses.monthly_trend(&filter).await.unwrap();

    let months: Vec<&str> = trend.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(trend[0].nps, -100.0);
    assert_eq!(trend[2].nps, 100.0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_nps_by_title_applies_minimum() {
    let test_db = TestDatabase::new().await;
    for _ in 0..3 {
        test_db.seed_response(9, None, "Big", "2024-01-02").await;
    }
    test_db.seed_response(0, None, "Small", "2024-01-02").await;

    let filter = FilterContext::all().with_survey(test_db.survey_name.clone());
    let titles = test_db.db.responses.nps_by_title(&filter, 2).await.unwrap();

    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0].name, "Big");
    assert_eq!(titles[0].nps, 100.0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_unenriched_orders_placeholders_last() {
    let test_db = TestDatabase::new().await;
    let placeholder = test_db.seed_response(5, Some("n.v.t."), "X", "2020-01-01").await;
    let real = test_db
        .seed_response(5, Some("Bezorging was te laat"), "X", "2020-01-02")
        .await;

    let batch = test_db.db.responses.unenriched(100_000).await.unwrap();
    let pos_placeholder = batch.iter().position(|r| r.id == placeholder).unwrap();
    let pos_real = batch.iter().position(|r| r.id == real).unwrap();
    assert!(pos_real < pos_placeholder);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_responses_since_is_oldest_first() {
    let test_db = TestDatabase::new().await;
    test_db.seed_response(8, Some("Later"), "X", "2024-01-20").await;
    test_db.seed_response(2, Some("Vroeg"), "X", "2024-01-10").await;
    // Before the cut-off
    test_db.seed_response(9, Some("Te oud"), "X", "2024-01-01").await;

    let rows = test_db
        .db
        .responses
        .responses_since(midday("2024-01-05"))
        .await
        .unwrap();
    let ours: Vec<&str> = rows
        .iter()
        .filter(|r| r.survey_name == test_db.survey_name)
        .filter_map(|r| r.nps_explanation.as_deref())
        .collect();

    assert_eq!(ours, vec!["Vroeg", "Later"]);

    test_db.cleanup().await;
}
