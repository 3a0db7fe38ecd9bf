//! PostgreSQL repository tests.
//!
//! Skipped unless `DANI_TEST_DATABASE_URL` points at a disposable database.

use serde_json::json;
use uuid::Uuid;

use dani_core::types::PageRequest;
use dani_database::migration::run_migrations;
use dani_database::{ExecutionLogRepository, ExecutionLogStore};
use dani_entity::execution_log::{
    Feedback, FeedbackFilter, FeedbackStatus, LogFilter, LogPayload, LogSort, NewExecutionLog,
};

async fn repository() -> Option<ExecutionLogRepository> {
    let url = std::env::var("DANI_TEST_DATABASE_URL").ok()?;
    let pool = sqlx::PgPool::connect(&url).await.expect("connect");
    run_migrations(&pool).await.expect("migrate");
    Some(ExecutionLogRepository::new(pool))
}

fn payload(user: &str, text: &str, tools: &[&str]) -> LogPayload {
    let calls: Vec<_> = tools
        .iter()
        .map(|t| {
            json!({
                "toolName": t, "serverName": "netops", "input": {}, "output": "ok",
                "timestamp": "2024-05-01T10:00:01Z", "duration": 5, "iteration": 1, "isError": false
            })
        })
        .collect();
    serde_json::from_value(json!({
        "username": user,
        "startTime": "2024-05-01T10:00:00Z",
        "endTime": "2024-05-01T10:00:01Z",
        "executionTimeMs": 1000,
        "query": {
            "originalText": text,
            "analyzerOutput": { "selectedModel": "claude-sonnet", "complexityLevel": "PROCEDURAL" }
        },
        "execution": { "toolCalls": calls, "reasoningSteps": [], "iterations": 1 },
        "response": { "finalText": "ok", "modelUsed": "claude-sonnet", "usage": { "inputTokens": 3, "outputTokens": 4 } }
    }))
    .expect("payload")
}

#[tokio::test]
async fn test_insert_filter_and_feedback_round_trip() {
    let Some(repo) = repository().await else {
        return;
    };
    let user_id = Uuid::new_v4();
    let id = repo
        .insert(&NewExecutionLog {
            conversation_id: None,
            message_id: None,
            user_id,
            payload: payload("alice", "Ping the core routers", &["ping", "ping"]),
        })
        .await
        .expect("insert");

    let filter = LogFilter {
        user_id: Some(user_id),
        query_text: Some("router".into()),
        tool_used: Some("ping".into()),
        feedback_status: Some(FeedbackFilter::None),
        ..LogFilter::default()
    };
    let page = repo
        .find_page(&filter, &LogSort::default(), &PageRequest::default())
        .await
        .expect("page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, id);

    let feedback = Feedback::submitted(FeedbackStatus::Positive, None);
    assert!(repo.update_feedback(id, &feedback).await.expect("update"));
    assert_eq!(repo.count(&filter).await.expect("count"), 0);

    let stored = repo.find_by_id(id).await.expect("find").expect("exists");
    assert_eq!(stored.payload.feedback.status, Some(FeedbackStatus::Positive));
    assert_eq!(stored.payload.query.original_text, "Ping the core routers");

    let scoped = LogFilter {
        user_id: Some(user_id),
        ..LogFilter::default()
    };
    let tools = repo.top_tools(&scoped, 10).await.expect("top tools");
    assert_eq!(tools[0].key, "ping");
    assert_eq!(tools[0].count, 2);
}
