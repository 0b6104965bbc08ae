use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use ledger::models::{Id, Scope, SubscriptionStatus};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use server::{
    app,
    config::Config,
    state::State,
    store::{
        NewArticle, NewCategory, NewEmission, NewPlan, NewSubscription, NewSupportCategory, Store,
    },
};
use tower::ServiceExt;

struct Harness {
    app: Router,
    store: Store,
}

impl Harness {
    fn new() -> Self {
        let store = Store::memory();
        let config = Config {
            password_cost: 4,
            ..Config::default()
        };
        let app = app(State::with_store(config, store.clone()));

        Self { app, store }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, value)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/register",
                None,
                Some(json!({
                    "username": username,
                    "password": "password123",
                    "email": format!("{username}@example.com"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        body["token"].as_str().unwrap().to_string()
    }

    /// Registered user that owns a fresh company.
    async fn tenant(&self, username: &str) -> String {
        let token = self.register(username).await;
        let (status, _) = self
            .post("/api/company", &token, json!({ "name": format!("{username} Corp") }))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        token
    }

    async fn category(&self, name: &str, scope: Scope) -> Id {
        self.store
            .create_category(NewCategory {
                name: name.to_string(),
                scope,
                description: None,
                icon: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn emission(&self, token: &str, category_id: Id, amount: &str, date: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/emissions",
                token,
                json!({ "categoryId": category_id, "amount": amount, "date": date }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        body
    }
}

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new();
    let (status, body) = harness.send(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_register_and_login() {
    let harness = Harness::new();
    let token = harness.register("alice").await;

    let (status, profile) = harness.get("/api/user", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert!(profile.get("passwordHash").is_none());

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let harness = Harness::new();
    harness.register("alice").await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/register",
            None,
            Some(json!({
                "username": "alice",
                "password": "password123",
                "email": "other@example.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn test_registration_reports_every_violation() {
    let harness = Harness::new();
    let (status, body) = harness
        .send(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "username": "al", "password": "123", "email": "nope" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "password", "email"]);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let harness = Harness::new();
    let token = harness.register("alice").await;

    let (status, _) = harness.send(Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = harness.get("/api/user", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_profile_updates() {
    let harness = Harness::new();
    let alice = harness.register("alice").await;
    harness.register("bob").await;

    let (status, _) = harness.patch("/api/user/2", &alice, json!({ "firstName": "B" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = harness.patch("/api/user/1", &alice, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");

    let (status, body) = harness
        .patch("/api/user/1", &alice, json!({ "email": "bob@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = harness
        .patch(
            "/api/user/1",
            &alice,
            json!({ "firstName": "Alice", "language": "de" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Alice");
    assert_eq!(body["language"], "de");
}

#[tokio::test]
async fn test_company_is_required() {
    let harness = Harness::new();
    let token = harness.register("alice").await;

    for uri in ["/api/emissions", "/api/emissions/summary", "/api/reports"] {
        let (status, body) = harness.get(uri, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Company required to access this resource");
    }

    let (status, _) = harness.get("/api/company", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_company_lifecycle() {
    let harness = Harness::new();
    let alice = harness.tenant("alice").await;
    let bob = harness.tenant("bob").await;

    let (status, company) = harness.get("/api/company", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(company["name"], "alice Corp");

    let (status, company) = harness
        .patch("/api/company/1", &alice, json!({ "industry": "Energy" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(company["industry"], "Energy");

    let (status, _) = harness
        .patch("/api/company/1", &bob, json!({ "industry": "Retail" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_summary_across_scopes() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;
    let power = harness.category("Electricity", Scope::ScopeTwo).await;
    let travel = harness.category("Business Travel", Scope::ScopeThree).await;

    harness.emission(&token, gas, "2", "2024-01-10").await;
    harness.emission(&token, gas, "3", "2024-02-10").await;
    harness.emission(&token, power, "3", "2024-03-10").await;
    harness.emission(&token, travel, "2", "2024-04-10").await;

    let (status, summary) = harness.get("/api/emissions/summary", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&summary["total"]), 10.0);
    assert_eq!(number(&summary["scope1"]), 5.0);
    assert_eq!(number(&summary["scope2"]), 3.0);
    assert_eq!(number(&summary["scope3"]), 2.0);

    let shares: Vec<(String, f64)> = summary["byCategory"]
        .as_array()
        .unwrap()
        .iter()
        .map(|share| {
            (
                share["name"].as_str().unwrap().to_string(),
                number(&share["percentage"]),
            )
        })
        .collect();
    assert_eq!(
        shares,
        vec![
            ("Natural Gas".to_string(), 50.0),
            ("Electricity".to_string(), 30.0),
            ("Business Travel".to_string(), 20.0),
        ]
    );
}

#[tokio::test]
async fn test_summary_period_is_inclusive() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;

    harness.emission(&token, gas, "1.5", "2024-01-01").await;
    harness.emission(&token, gas, "2.5", "2024-01-31").await;
    harness.emission(&token, gas, "4", "2024-02-01T00:00:01Z").await;

    let (status, summary) = harness
        .get(
            "/api/emissions/summary?startDate=2024-01-01&endDate=2024-02-01",
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&summary["total"]), 4.0);

    let (status, summary) = harness
        .get("/api/emissions/summary?startDate=2030-01-01", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&summary["total"]), 0.0);
    assert_eq!(summary["byCategory"], json!([]));

    let (status, _) = harness
        .get("/api/emissions/summary?startDate=yesterday", &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = harness
        .get(
            "/api/emissions/summary?startDate=2024-03-01&endDate=2024-01-01",
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "endDate");
}

#[tokio::test]
async fn test_emission_listing_filters_and_order() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;
    let travel = harness.category("Business Travel", Scope::ScopeThree).await;

    harness.emission(&token, gas, "1", "2024-01-01").await;
    harness.emission(&token, travel, "2", "2024-03-01").await;
    harness.emission(&token, gas, "3", "2024-02-01").await;

    let (status, list) = harness.get("/api/emissions", &token).await;
    assert_eq!(status, StatusCode::OK);
    let amounts: Vec<f64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|record| number(&record["amount"]))
        .collect();
    assert_eq!(amounts, vec![2.0, 3.0, 1.0]);
    assert_eq!(list[0]["category"]["scope"], "Scope 3");

    let (status, list) = harness.get("/api/emissions?scope=Scope%201", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, _) = harness.get("/api/emissions?scope=Scope%204", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_emission_validation() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;

    let (status, body) = harness
        .post("/api/emissions", &token, json!({ "categoryId": gas, "amount": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");

    let (status, _) = harness
        .post("/api/emissions", &token, json!({ "categoryId": gas, "amount": "abc" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = harness
        .post("/api/emissions", &token, json!({ "categoryId": 99, "amount": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid emission category");
}

#[tokio::test]
async fn test_emission_amounts_are_capped() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;

    let (status, body) = harness
        .post(
            "/api/emissions",
            &token,
            json!({ "categoryId": gas, "amount": "50000000000000000000000000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");
    assert_eq!(body["errors"][0]["message"], "Amount must not exceed 1000000000000");

    harness.emission(&token, gas, "1000000000000", "2024-01-01").await;
    harness.emission(&token, gas, "1000000000000", "2024-02-01").await;

    let (status, summary) = harness.get("/api/emissions/summary", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&summary["total"]), 2e12);
}

#[tokio::test]
async fn test_summary_survives_oversized_stored_amounts() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;
    let (_, company) = harness.get("/api/company", &token).await;
    let (_, profile) = harness.get("/api/user", &token).await;

    for _ in 0..2 {
        harness
            .store
            .create_emission(NewEmission {
                company_id: company["id"].as_i64().unwrap(),
                category_id: gas,
                description: None,
                amount: "50000000000000000000000000000".parse().unwrap(),
                unit: "tCO2e".to_string(),
                date: chrono::Utc::now(),
                document_url: None,
                verified_by: None,
                created_by: profile["id"].as_i64().unwrap(),
            })
            .await
            .unwrap();
    }

    let (status, summary) = harness.get("/api/emissions/summary", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&summary["byCategory"][0]["percentage"]), 100.0);

    let (status, _) = harness
        .post(
            "/api/reports",
            &token,
            json!({
                "name": "Everything",
                "startDate": "2000-01-01",
                "endDate": "2100-01-01",
                "type": "custom",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_emission_tenancy_and_verification() {
    let harness = Harness::new();
    let alice = harness.tenant("alice").await;
    let bob = harness.tenant("bob").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;

    let created = harness.emission(&alice, gas, "7.25", "2024-05-05").await;
    assert_eq!(created["verified"], false);
    assert_eq!(created["unit"], "tCO2e");
    let uri = format!("/api/emissions/{}", created["id"]);

    let (status, _) = harness.get(&uri, &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness.get("/api/emissions/404", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = harness.patch(&uri, &alice, json!({ "verified": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["verified"], true);
    assert_eq!(updated["verifiedBy"], 1);

    let (status, updated) = harness.patch(&uri, &alice, json!({ "verified": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["verifiedBy"], Value::Null);

    let (status, _) = harness.patch(&uri, &bob, json!({ "amount": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_timeline() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;

    harness.emission(&token, gas, "1", "2024-01-15").await;
    harness.emission(&token, gas, "2", "2024-03-15").await;
    harness.emission(&token, gas, "4", "2024-04-15").await;

    let (status, points) = harness
        .get("/api/emissions/timeline?granularity=quarterly", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(points[0]["period"], "2024-Q1");
    assert_eq!(number(&points[0]["amount"]), 3.0);
    assert_eq!(points[1]["period"], "2024-Q2");

    let (status, points) = harness.get("/api/emissions/timeline", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(points.as_array().unwrap().len(), 3);

    let (status, _) = harness
        .get("/api/emissions/timeline?granularity=weekly", &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_capture_and_regenerate_summary() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;
    let gas = harness.category("Natural Gas", Scope::ScopeOne).await;

    harness.emission(&token, gas, "10", "2024-01-15").await;
    harness.emission(&token, gas, "5", "2024-06-15").await;

    let (status, report) = harness
        .post(
            "/api/reports",
            &token,
            json!({
                "name": "Q1 2024",
                "type": "quarterly",
                "startDate": "2024-01-01",
                "endDate": "2024-03-31",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{report}");
    assert_eq!(report["status"], "draft");
    assert_eq!(number(&report["data"]["total"]), 10.0);

    let uri = format!("/api/reports/{}", report["id"]);
    let (status, report) = harness
        .patch(&uri, &token, json!({ "endDate": "2024-12-31" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&report["data"]["total"]), 15.0);

    let (status, report) = harness
        .patch(&uri, &token, json!({ "status": "published" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "published");

    let (status, body) = harness
        .post(
            "/api/reports",
            &token,
            json!({
                "name": "Q",
                "type": "annual",
                "startDate": "2024-12-31",
                "endDate": "2024-01-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let other = harness.tenant("bob").await;
    let (status, _) = harness.get(&uri, &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, list) = harness.get("/api/reports", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_subscription() {
    let harness = Harness::new();
    let token = harness.tenant("alice").await;

    let (status, body) = harness.get("/api/subscription", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let plan = harness
        .store
        .create_plan(NewPlan {
            name: "Pro".to_string(),
            description: None,
            price: Decimal::new(4999, 2),
            features: vec!["Report templates".to_string()],
        })
        .await
        .unwrap();
    harness
        .store
        .create_subscription(NewSubscription {
            company_id: 1,
            plan_id: plan.id,
            start_date: chrono::Utc::now(),
            end_date: None,
            status: SubscriptionStatus::Active,
        })
        .await
        .unwrap();

    let (status, plans) = harness.send(Method::GET, "/api/subscription-plans", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plans[0]["name"], "Pro");

    let (status, body) = harness.get("/api/subscription", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["plan"]["name"], "Pro");
}

#[tokio::test]
async fn test_ticket_lifecycle() {
    let harness = Harness::new();
    let token = harness.register("alice").await;
    let intruder = harness.register("mallory").await;
    let billing = harness
        .store
        .create_support_category(NewSupportCategory {
            name: "Billing".to_string(),
            description: None,
            icon: None,
        })
        .await
        .unwrap();

    let (status, ticket) = harness
        .post(
            "/api/support/tickets",
            &token,
            json!({
                "subject": "Invoice missing",
                "categoryId": billing.id,
                "message": "Where is my March invoice?",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{ticket}");
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["priority"], "medium");

    let uri = format!("/api/support/tickets/{}", ticket["id"]);
    let messages_uri = format!("{uri}/messages");

    let (status, messages) = harness.get(&messages_uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["message"], "Where is my March invoice?");

    let (status, _) = harness.get(&uri, &intruder).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, message) = harness
        .post(&messages_uri, &token, json!({ "message": "Any update?" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["isStaff"], false);

    let (status, closed) = harness.patch(&uri, &token, json!({ "status": "closed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(closed["closedAt"].is_string());

    let (status, body) = harness
        .post(&messages_uri, &token, json!({ "message": "Hello?" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot add messages to a closed ticket");

    let (status, list) = harness.get("/api/support/tickets?status=open", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    let (status, reopened) = harness.patch(&uri, &token, json!({ "status": "open" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["closedAt"], Value::Null);

    let (status, list) = harness.get("/api/support/tickets?status=all", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, categories) = harness.get("/api/help/categories", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories[0]["name"], "Billing");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_closing_races_with_new_messages() {
    let harness = Harness::new();
    let token = harness.register("alice").await;

    for _ in 0..20 {
        let (_, ticket) = harness
            .post("/api/support/tickets", &token, json!({ "subject": "Invoice missing" }))
            .await;
        let uri = format!("/api/support/tickets/{}", ticket["id"]);
        let messages_uri = format!("{uri}/messages");

        let ((closed, _), (posted, _)) = tokio::join!(
            harness.patch(&uri, &token, json!({ "status": "closed" })),
            harness.post(&messages_uri, &token, json!({ "message": "Any update?" })),
        );
        assert_eq!(closed, StatusCode::OK);
        assert!(posted == StatusCode::CREATED || posted == StatusCode::BAD_REQUEST);

        let (_, stored) = harness.get(&uri, &token).await;
        assert_eq!(stored["status"], "closed");
        assert!(stored["closedAt"].is_string());
    }
}

#[tokio::test]
async fn test_blank_ticket_subject_is_rejected() {
    let harness = Harness::new();
    let token = harness.register("alice").await;

    let (status, body) = harness
        .post("/api/support/tickets", &token, json!({ "subject": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "subject");
}

#[tokio::test]
async fn test_help_articles() {
    let harness = Harness::new();
    for (title, slug, published) in [
        ("Importing Emissions Data", "importing-emissions-data", true),
        ("Getting Started", "getting-started", true),
        ("Drafted", "drafted", false),
    ] {
        harness
            .store
            .create_article(NewArticle {
                title: title.to_string(),
                slug: slug.to_string(),
                content: String::new(),
                category_id: None,
                is_published: published,
            })
            .await
            .unwrap();
    }

    let (status, list) = harness
        .send(Method::GET, "/api/help/articles?published=true", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|article| article["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Getting Started", "Importing Emissions Data"]);

    for expected in 1..=2 {
        let (status, article) = harness
            .send(Method::GET, "/api/help/articles/getting-started", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(article["views"], expected);
    }

    let (status, _) = harness
        .send(Method::GET, "/api/help/articles/missing", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = harness
        .send(Method::GET, "/api/help/articles?published=maybe", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
