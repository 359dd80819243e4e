/// Integration tests for the statistics endpoint

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_stats_for_new_user_are_zero() {
    let ctx = TestContext::new();
    let ana = ctx.user("Ana").await;

    let (status, body) = ctx.get("/api/stats", &ana).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProjects"], 0);
    assert_eq!(body["totalTasks"], 0);
    assert_eq!(body["completionRate"], 0.0);
    assert_eq!(body["avgTasksPerProject"], 0.0);
    assert_eq!(
        body["tasksByStatus"],
        json!({ "pending": 0, "in-progress": 0, "completed": 0 })
    );
    assert_eq!(
        body["tasksByPriority"],
        json!({ "low": 0, "medium": 0, "high": 0 })
    );
}

#[tokio::test]
async fn test_stats_rollup_across_owned_and_shared_projects() {
    let ctx = TestContext::new();
    let ana = ctx.user("Ana").await;
    let bob = ctx.user("Bob").await;

    // P1 owned by Ana with three tasks, P2 owned by Bob and shared, no tasks
    let p1 = ctx.project(&ana, "P1").await;
    let p2 = ctx.project(&bob, "P2").await;
    ctx.share(&p2, &bob, &ana).await;
    ctx.share(&p1, &ana, &bob).await;

    ctx.task(
        &p1,
        &ana,
        json!({ "description": "done", "status": "completed", "assignedTo": ana.id }),
    )
    .await;
    ctx.task(
        &p1,
        &ana,
        json!({ "description": "todo", "priority": "high", "assignedTo": ana.id }),
    )
    .await;
    ctx.task(
        &p1,
        &ana,
        json!({ "description": "bob's", "assignedTo": bob.id }),
    )
    .await;

    // Projects Ana has nothing to do with are excluded
    let eve = ctx.user("Eve").await;
    let p3 = ctx.project(&eve, "P3").await;
    ctx.task(&p3, &eve, json!({ "description": "x", "assignedTo": eve.id }))
        .await;

    let (status, body) = ctx.get("/api/stats", &ana).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProjects"], 2);
    assert_eq!(body["totalTasks"], 3);
    assert_eq!(body["tasksByStatus"]["completed"], 1);
    assert_eq!(body["tasksByStatus"]["pending"], 2);
    assert_eq!(body["tasksByPriority"]["medium"], 2);
    assert_eq!(body["tasksByPriority"]["high"], 1);
    assert_eq!(body["assignedToUser"], 2);
    assert!((body["completionRate"].as_f64().unwrap() - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(body["avgTasksPerProject"], 1.5);
}

#[tokio::test]
async fn test_stats_requires_authentication() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/stats", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}
