use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::DifficultyLevel;
use crate::test_support::{
    bearer_token, insert_admin, insert_bank_question, insert_user, json_request, read_json,
    setup_test_context, TestContext,
};

/// Two-question batch spanning both sections: one fresh reading question
/// and one fresh listening question with media.
fn demo_exam_body() -> serde_json::Value {
    json!({
        "testName": "Demo",
        "description": "Smoke exam",
        "strategy": "fixed",
        "questions": [
            {
                "type": "reading",
                "section": "Part 5",
                "part": 5,
                "description": "Grammar",
                "difficulty": "easy",
                "template": {
                    "question": "She ___ to the office yesterday.",
                    "options": ["went", "goes", "going", "go"]
                }
            },
            {
                "type": "listening",
                "section": "Part 1",
                "part": 1,
                "description": "Photograph",
                "difficulty": "easy",
                "template": {
                    "question": "What is happening in the picture?",
                    "options": ["A truck is being unloaded", "A bicycle is parked"],
                    "image": "https://cdn.example.com/p1.png",
                    "audio": "https://cdn.example.com/p1.mp3"
                }
            }
        ]
    })
}

async fn post_exam(ctx: &TestContext, token: &str, body: serde_json::Value) -> i64 {
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/exams", Some(token), Some(body)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    body["examId"].as_i64().expect("exam id")
}

async fn view_exam(ctx: &TestContext, token: &str, exam_id: i64) -> serde_json::Value {
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}"),
            Some(token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

fn question_ids(view: &serde_json::Value) -> Vec<i64> {
    view["sections"]
        .as_array()
        .expect("sections")
        .iter()
        .flat_map(|section| section["questions"].as_array().expect("questions").iter())
        .map(|question| question["id"].as_i64().expect("question id"))
        .collect()
}

async fn count_rows(ctx: &TestContext, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(ctx.state.db())
        .await
        .expect("count")
}

#[tokio::test]
async fn created_exam_is_served_grouped_by_section() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let exam_id = post_exam(&ctx, &token, demo_exam_body()).await;
    let view = view_exam(&ctx, &token, exam_id).await;

    assert_eq!(view["id"].as_i64(), Some(exam_id));
    assert_eq!(view["name"], json!("Demo"));
    assert!(view["exam_attempt_id"].as_i64().expect("attempt id") > 0);

    let sections = view["sections"].as_array().expect("sections");
    assert_eq!(sections.len(), 2);

    let listening = &sections[0];
    assert_eq!(listening["name"], json!("listening"));
    assert_eq!(listening["time"].as_i64(), Some(2700));
    let listening_question = &listening["questions"][0];
    assert_eq!(listening_question["part_code"], json!("part_1"));
    assert_eq!(listening_question["image"], json!("https://cdn.example.com/p1.png"));
    assert_eq!(listening_question["audio"], json!("https://cdn.example.com/p1.mp3"));

    let reading = &sections[1];
    assert_eq!(reading["name"], json!("reading"));
    assert_eq!(reading["time"].as_i64(), Some(4500));
    let reading_question = &reading["questions"][0];
    assert_eq!(reading_question["question"], json!("She ___ to the office yesterday."));
    assert_eq!(reading_question["part_code"], json!("part_5"));
    assert_eq!(
        reading_question["options"],
        json!(["went", "goes", "going", "go"])
    );
    assert!(reading_question.get("image").is_none());
}

#[tokio::test]
async fn repeated_views_resume_the_same_attempt() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let exam_id = post_exam(&ctx, &token, demo_exam_body()).await;
    let first = view_exam(&ctx, &token, exam_id).await;
    let second = view_exam(&ctx, &token, exam_id).await;

    assert_eq!(first["exam_attempt_id"], second["exam_attempt_id"]);
    assert_eq!(count_rows(&ctx, "exam_attempts").await, 1);
}

#[tokio::test]
async fn random_order_is_stable_across_views() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let questions: Vec<serde_json::Value> = (0..8)
        .map(|i| {
            json!({
                "type": "reading",
                "section": "Part 5",
                "part": 5,
                "description": format!("Filler {i}"),
                "template": {
                    "question": format!("Question {i}"),
                    "options": ["yes", "no"]
                }
            })
        })
        .collect();
    let body = json!({ "testName": "Shuffled", "strategy": "random", "questions": questions });

    let exam_id = post_exam(&ctx, &token, body).await;
    let first = view_exam(&ctx, &token, exam_id).await;
    let second = view_exam(&ctx, &token, exam_id).await;

    let first_ids = question_ids(&first);
    assert_eq!(first_ids.len(), 8);
    assert_eq!(first_ids, question_ids(&second));
    assert_eq!(first["exam_attempt_id"], second["exam_attempt_id"]);
}

#[tokio::test]
async fn snapshot_is_isolated_from_bank_edits() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let question_id =
        insert_bank_question(ctx.state.db(), "Original prompt", &["alpha", "beta"], 5, DifficultyLevel::Easy)
            .await;

    let body = json!({
        "testName": "Reuse",
        "questions": [{
            "type": "reading",
            "section": "Part 5",
            "part": 5,
            "description": "Reused",
            "template": { "options": [] },
            "existedIDInDB": question_id
        }]
    });
    let exam_id = post_exam(&ctx, &token, body).await;

    sqlx::query("UPDATE questions SET content = 'Edited prompt', correct_answer = 'beta' WHERE id = $1")
        .bind(question_id)
        .execute(ctx.state.db())
        .await
        .expect("edit bank question");

    let view = view_exam(&ctx, &token, exam_id).await;
    let question = &view["sections"][0]["questions"][0];
    assert_eq!(question["question"], json!("Original prompt"));
    assert_eq!(question["options"], json!(["alpha", "beta"]));

    // "alpha" was the correct answer when the snapshot was frozen.
    let answers = json!({
        "examAttemptId": view["exam_attempt_id"],
        "answers": { (question["id"].as_i64().expect("id").to_string()): "alpha" }
    });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&token),
            Some(answers),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert_eq!(result["correctCount"].as_i64(), Some(1));
}

#[tokio::test]
async fn submit_scores_answers_and_allows_resubmission() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let exam_id = post_exam(&ctx, &token, demo_exam_body()).await;
    let view = view_exam(&ctx, &token, exam_id).await;
    let attempt_id = view["exam_attempt_id"].as_i64().expect("attempt id");

    let listening_id = view["sections"][0]["questions"][0]["id"].as_i64().expect("id");
    let reading_id = view["sections"][1]["questions"][0]["id"].as_i64().expect("id");

    // One correct, one wrong.
    let body = json!({
        "examAttemptId": attempt_id,
        "answers": {
            (reading_id.to_string()): "went",
            (listening_id.to_string()): "A bicycle is parked"
        }
    });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&token),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert_eq!(result["score"].as_i64(), Some(5));
    assert_eq!(result["correctCount"].as_i64(), Some(1));
    assert_eq!(result["totalQuestions"].as_i64(), Some(2));

    // Resubmitting corrects the listening answer in place.
    let body = json!({
        "examAttemptId": attempt_id,
        "answers": {
            (reading_id.to_string()): "went",
            (listening_id.to_string()): "A truck is being unloaded"
        }
    });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&token),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert_eq!(result["score"].as_i64(), Some(10));
    assert_eq!(result["correctCount"].as_i64(), Some(2));
    assert_eq!(count_rows(&ctx, "exam_answers").await, 2);

    // The finished attempt shows up in the caller's history.
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, "/api/v1/attempts", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let history = read_json(response).await;
    assert_eq!(history["total"].as_i64(), Some(1));
    assert_eq!(history["data"][0]["examTitle"], json!("Demo"));
    assert_eq!(history["data"][0]["score"].as_i64(), Some(10));
}

#[tokio::test]
async fn submit_requires_attempt_id_and_answers() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let exam_id = post_exam(&ctx, &token, demo_exam_body()).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&token),
            Some(json!({ "answers": {} })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&token),
            Some(json!({ "examAttemptId": 1 })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_rejects_foreign_and_unknown_attempts() {
    let ctx = setup_test_context().await;
    let owner = insert_user(ctx.state.db(), "owner", "Exam Owner", "password123").await;
    let owner_token = bearer_token(owner.id, ctx.state.settings());
    let intruder = insert_user(ctx.state.db(), "intruder", "Someone Else", "password123").await;
    let intruder_token = bearer_token(intruder.id, ctx.state.settings());

    let exam_id = post_exam(&ctx, &owner_token, demo_exam_body()).await;
    let view = view_exam(&ctx, &owner_token, exam_id).await;
    let attempt_id = view["exam_attempt_id"].as_i64().expect("attempt id");

    let body = json!({ "examAttemptId": attempt_id, "answers": {} });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&intruder_token),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = json!({ "examAttemptId": attempt_id + 1000, "answers": {} });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(&owner_token),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A real attempt id under the wrong exam path is treated as unknown.
    let body = json!({ "examAttemptId": attempt_id, "answers": {} });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/exams/{}/submit", exam_id + 1000),
            Some(&owner_token),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_malformed_batches_before_persisting() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "author", "Exam Author", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let cases = vec![
        json!({ "testName": "   ", "questions": demo_exam_body()["questions"] }),
        json!({ "testName": "No questions", "questions": [] }),
        json!({ "testName": "No questions at all" }),
        json!({
            "testName": "Missing part",
            "questions": [{
                "type": "reading",
                "section": "Part 5",
                "description": "Grammar",
                "template": { "question": "Q", "options": ["a", "b"] }
            }]
        }),
        json!({
            "testName": "Missing template",
            "questions": [{
                "type": "reading",
                "section": "Part 5",
                "part": 5,
                "description": "Grammar"
            }]
        }),
    ];

    for body in cases {
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/exams", Some(&token), Some(body)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    assert_eq!(count_rows(&ctx, "exams").await, 0);
    assert_eq!(count_rows(&ctx, "questions").await, 0);
}

#[tokio::test]
async fn dangling_question_reference_rolls_the_exam_back() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "author", "Exam Author", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let body = json!({
        "testName": "Broken",
        "questions": [{
            "type": "reading",
            "section": "Part 5",
            "part": 5,
            "description": "Reused",
            "template": { "options": [] },
            "existedIDInDB": 424242
        }]
    });
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/exams", Some(&token), Some(body)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(count_rows(&ctx, "exams").await, 0);
    assert_eq!(count_rows(&ctx, "exam_questions").await, 0);
}

#[tokio::test]
async fn exam_routes_require_authentication() {
    let ctx = setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, "/api/v1/exams", None, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exams",
            None,
            Some(demo_exam_body()),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_is_admin_only_and_cascades() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "taker", "Test Taker", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());
    let admin = insert_admin(ctx.state.db(), "admin", "Administrator", "password123").await;
    let admin_token = bearer_token(admin.id, ctx.state.settings());

    let exam_id = post_exam(&ctx, &token, demo_exam_body()).await;
    view_exam(&ctx, &token, exam_id).await;
    assert_eq!(count_rows(&ctx, "exam_attempts").await, 1);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::DELETE,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(count_rows(&ctx, "exam_questions").await, 0);
    assert_eq!(count_rows(&ctx, "exam_attempts").await, 0);
}

#[tokio::test]
async fn listing_supports_pagination_filtering_and_grouping() {
    let ctx = setup_test_context().await;
    let user = insert_user(ctx.state.db(), "author", "Exam Author", "password123").await;
    let token = bearer_token(user.id, ctx.state.settings());

    let easy = json!({
        "testName": "Easy one",
        "questions": [{
            "type": "reading",
            "section": "Part 5",
            "part": 5,
            "description": "Grammar",
            "difficulty": "easy",
            "template": { "question": "Q", "options": ["a", "b"] }
        }]
    });
    let hard = json!({
        "testName": "Hard one",
        "questions": [{
            "type": "reading",
            "section": "Part 7",
            "part": 7,
            "description": "Reading comprehension",
            "difficulty": "hard",
            "template": { "question": "Q", "options": ["a", "b"] }
        }]
    });
    post_exam(&ctx, &token, easy).await;
    post_exam(&ctx, &token, hard).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, "/api/v1/exams?pageSize=1", Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json(response).await;
    assert_eq!(page["total"].as_i64(), Some(2));
    assert_eq!(page["data"].as_array().expect("data").len(), 1);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::GET,
            "/api/v1/exams?difficulty=hard",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json(response).await;
    assert_eq!(page["total"].as_i64(), Some(1));
    assert_eq!(page["data"][0]["name"], json!("Hard one"));

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::GET,
            "/api/v1/exams?group=difficulty",
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let grouped = read_json(response).await;
    assert_eq!(grouped["easy"].as_array().expect("easy").len(), 1);
    assert_eq!(grouped["easy"][0]["name"], json!("Easy one"));
    assert_eq!(grouped["hard"].as_array().expect("hard").len(), 1);
    assert_eq!(grouped["medium"].as_array().expect("medium").len(), 0);
}
