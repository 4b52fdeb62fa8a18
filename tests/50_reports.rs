mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestApp, CS, CUSTOMER_ONE, CUSTOMER_TWO, NOC, OWNER, TECH};

/// Three tickets: one received, one with NOC, one resolved.
async fn populate(app: &TestApp) -> Result<()> {
    let cs = app.staff_token(CS).await?;
    let noc = app.staff_token(NOC).await?;
    let one = app.customer_id(CUSTOMER_ONE).await?;
    let two = app.customer_id(CUSTOMER_TWO).await?;

    let tickets = [
        (one, "No signal", "connectivity"),
        (one, "Invoice question", "billing"),
        (two, "Packet loss", "connectivity"),
    ];
    let mut ids = Vec::new();
    for (customer_id, title, kind) in tickets {
        let body = json!({ "customer_id": customer_id, "title": title, "type": kind, "description": "reported by phone" });
        let (status, body) = app.post("/api/tickets", Some(&cs), Some(body)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "{}", body);
        ids.push(body["data"]["id"].as_i64().unwrap_or_default());
    }

    app.post(&format!("/api/tickets/{}/forward/noc", ids[1]), Some(&cs), None).await?;
    app.post(&format!("/api/tickets/{}/forward/noc", ids[2]), Some(&cs), None).await?;
    let (status, body) = app
        .post(
            &format!("/api/tickets/{}/noc/diagnose", ids[2]),
            Some(&noc),
            Some(json!({ "resolved_by_noc": true })),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "{}", body);
    Ok(())
}

#[tokio::test]
async fn summary_counts_by_bucket() -> Result<()> {
    let app = common::spawn_app().await?;
    populate(&app).await?;
    let owner = app.staff_token(OWNER).await?;

    let (status, body) = app.get("/api/reports/summary", Some(&owner)).await?;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["total_tickets"], 3);
    assert_eq!(summary["resolved_tickets"], 1);
    assert_eq!(summary["open_tickets"], 1);
    assert_eq!(summary["in_progress_tickets"], 1);
    assert_eq!(summary["by_status"]["forwarded_to_noc"], 1);
    assert_eq!(summary["by_status"]["diagnosed"], 0);
    Ok(())
}

#[tokio::test]
async fn empty_store_reports_zeroes() -> Result<()> {
    let app = common::spawn_app().await?;
    let noc = app.staff_token(NOC).await?;

    let (_, body) = app.get("/api/reports/summary", Some(&noc)).await?;
    assert_eq!(body["data"]["total_tickets"], 0);

    let (_, body) = app.get("/api/reports/trouble-types", Some(&noc)).await?;
    assert_eq!(body["data"], json!([]));

    let (_, body) = app.get("/api/reports/geographic", Some(&noc)).await?;
    assert_eq!(body["data"]["areas"], json!([]));
    assert!(body["data"]["most_affected_area"].is_null());
    Ok(())
}

#[tokio::test]
async fn trouble_types_carry_percentages() -> Result<()> {
    let app = common::spawn_app().await?;
    populate(&app).await?;
    let tech = app.staff_token(TECH).await?;

    let (status, body) = app.get("/api/reports/trouble-types", Some(&tech)).await?;
    assert_eq!(status, StatusCode::OK);
    let stats = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(stats.len(), 2);

    let find = |name: &str| -> Value {
        stats.iter().find(|s| s["name"] == name).cloned().unwrap_or(Value::Null)
    };
    assert_eq!(find("connectivity")["count"], 2);
    assert_eq!(find("billing")["count"], 1);

    let total: f64 = stats.iter().filter_map(|s| s["percentage"].as_f64()).sum();
    assert!((total - 100.0).abs() < 1e-6);
    let share = find("connectivity")["percentage"].as_f64().unwrap_or_default();
    assert!((share - 200.0 / 3.0).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
async fn geographic_groups_by_customer_location() -> Result<()> {
    let app = common::spawn_app().await?;
    populate(&app).await?;
    let cs = app.staff_token(CS).await?;

    let (status, body) = app.get("/api/reports/geographic", Some(&cs)).await?;
    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["areas"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["areas"][0]["ticket_count"], 2);
    assert_eq!(report["areas"][0]["area"], "Area -6.21, 106.85");
    assert_eq!(report["most_affected_area"], "Area -6.21, 106.85");
    assert_eq!(report["areas"][1]["ticket_count"], 1);
    Ok(())
}

#[tokio::test]
async fn ticket_report_pages_and_searches() -> Result<()> {
    let app = common::spawn_app().await?;
    populate(&app).await?;
    let owner = app.staff_token(OWNER).await?;

    let (status, body) = app.get("/api/reports/tickets?limit=2", Some(&owner)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["limit"], 2);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));

    let (_, body) = app.get("/api/reports/tickets?search=invoice", Some(&owner)).await?;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Invoice question");

    // Description matches too
    let (_, body) = app.get("/api/reports/tickets?search=BY%20PHONE", Some(&owner)).await?;
    assert_eq!(body["data"]["total"], 3);
    Ok(())
}
