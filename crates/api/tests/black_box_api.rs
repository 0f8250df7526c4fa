use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use yamdb_auth::{AccessClaims, Email, Hs256TokenCodec, Role, Username};
use yamdb_core::UserId;
use yamdb_infra::{InMemoryOutbox, InMemoryStore, Services};

const SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    services: Arc<Services>,
    outbox: Arc<InMemoryOutbox>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let outbox = Arc::new(InMemoryOutbox::new());
        let codec = Arc::new(Hs256TokenCodec::new(SECRET.as_bytes(), ChronoDuration::hours(1)));
        let services = Arc::new(Services::new(
            Arc::new(InMemoryStore::new()),
            outbox.clone(),
            codec,
        ));

        // Same router as prod, bound to an ephemeral port.
        let app = yamdb_api::app::build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            outbox,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn signup(&self, username: &str, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/signup"))
            .json(&json!({ "username": username, "email": email }))
            .send()
            .await
            .unwrap()
    }

    async fn exchange(&self, username: &str, code: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/token"))
            .json(&json!({ "username": username, "confirmation_code": code }))
            .send()
            .await
            .unwrap()
    }

    /// Full signup + exchange through HTTP, reading the code from the outbox.
    async fn login(&self, username: &str, email: &str) -> String {
        let res = self.signup(username, email).await;
        assert_eq!(res.status(), StatusCode::OK);
        let code = self.outbox.latest_code(username).expect("code delivered");
        let res = self.exchange(username, &code).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Token for a bootstrap superuser, minted without going through signup.
    async fn admin_token(&self) -> String {
        let admin = self
            .services
            .identity
            .ensure_superuser(
                Username::parse("root").unwrap(),
                Email::parse("root@example.com").unwrap(),
                Utc::now(),
            )
            .await
            .unwrap();
        self.services
            .codec
            .mint(&admin.principal(), Utc::now())
            .unwrap()
            .token
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn patch(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// A title with no category or genres, created as admin.
    async fn title(&self, admin: &str, name: &str) -> String {
        let res = self
            .post("/titles", admin, json!({ "name": name, "year": 1979 }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn forge(secret: &str, role: Role, issued_ago: ChronoDuration, ttl: ChronoDuration) -> String {
    let issued_at = Utc::now() - issued_ago;
    let claims = AccessClaims {
        sub: UserId::new(),
        username: "mallory".to_string(),
        role,
        issued_at,
        expires_at: issued_at + ttl,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_then_exchange_yields_a_working_token() {
    let srv = TestServer::spawn().await;

    let res = srv.signup("alice", "alice@example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "username": "alice", "email": "alice@example.com" }));
    assert_eq!(
        srv.outbox.delivered_to("alice").unwrap().as_str(),
        "alice@example.com"
    );

    let code = srv.outbox.latest_code("alice").unwrap();
    let res = srv.exchange("alice", &code).await;
    assert_eq!(res.status(), StatusCode::OK);
    let token = res.json::<Value>().await.unwrap()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let res = srv.get("/whoami", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "user");

    // The code is spent.
    let res = srv.exchange("alice", &code).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_signup_reissues_the_code() {
    let srv = TestServer::spawn().await;

    srv.signup("bob", "bob@example.com").await;
    let first = srv.outbox.latest_code("bob").unwrap();
    let res = srv.signup("bob", "bob@example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    let second = srv.outbox.latest_code("bob").unwrap();
    assert_ne!(first, second);

    assert_eq!(srv.exchange("bob", &first).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.exchange("bob", &second).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_rejects_collisions_and_bad_input() {
    let srv = TestServer::spawn().await;
    srv.signup("carol", "carol@example.com").await;

    let res = srv.signup("carol", "other@example.com").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = srv.signup("carl", "carol@example.com").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    assert_eq!(srv.signup("me", "me@example.com").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.signup("dave", "not-an-email").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.signup("", "").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let nia = srv.login("nia", "nia@example.com").await;
    let title = srv.title(&admin, "Lantern").await;
    let reviews = format!("/titles/{title}/reviews");

    for score in [json!(7.5), json!("8"), json!(null)] {
        let res = srv.post(&reviews, &nia, json!({ "text": "odd", "score": score })).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "score {score}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "validation_error", "score {score}");
    }

    let res = srv
        .client
        .post(srv.url("/auth/signup"))
        .json(&json!({ "username": 5, "email": "five@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = srv
        .client
        .post(srv.url("/auth/signup"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .post(srv.url("/auth/signup"))
        .body(r#"{"username":"plain","email":"plain@example.com"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get(&reviews, None).await;
    let listed: Value = res.json().await.unwrap();
    assert!(listed["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn exchange_failures() {
    let srv = TestServer::spawn().await;
    srv.signup("erin", "erin@example.com").await;

    assert_eq!(srv.exchange("erin", "wrong").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.exchange("erin", "").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.exchange("nobody", "whatever").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_bearer_tokens_are_rejected() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/titles", Some("not-a-jwt")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let wrong_secret = forge("other-secret", Role::Admin, ChronoDuration::zero(), ChronoDuration::hours(1));
    let res = srv.get("/titles", Some(&wrong_secret)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let expired = forge(SECRET, Role::Admin, ChronoDuration::hours(2), ChronoDuration::hours(1));
    let res = srv.get("/titles", Some(&expired)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(srv.url("/titles"))
        .header("Authorization", "Basic abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // No header at all is an anonymous read.
    assert_eq!(srv.get("/titles", None).await.status(), StatusCode::OK);
    assert_eq!(srv.get("/whoami", None).await.status(), StatusCode::UNAUTHORIZED);
}

// ─────────────────────────────────────────────────────────────────────────────
// Profiles and administration
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn own_profile_cannot_change_role() {
    let srv = TestServer::spawn().await;
    let token = srv.login("frank", "frank@example.com").await;

    let res = srv
        .patch(
            "/users/me",
            &token,
            json!({ "bio": "film nerd", "role": "admin" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["bio"], "film nerd");
    assert_eq!(body["role"], "user");

    let res = srv.get("/users/me", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_administration_is_admin_only() {
    let srv = TestServer::spawn().await;
    let user = srv.login("gina", "gina@example.com").await;
    let admin = srv.admin_token().await;

    assert_eq!(srv.get("/users", Some(&user)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(srv.get("/users", None).await.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .post(
            "/users",
            &admin,
            json!({ "username": "hank", "email": "hank@example.com", "role": "moderator" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = srv
        .post("/users", &admin, json!({ "username": "gina", "email": "g2@example.com" }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = srv
        .post(
            "/users",
            &admin,
            json!({ "username": "ivy", "email": "ivy@example.com", "role": "overlord" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get("/users?search=hA", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["hank"]);

    let res = srv
        .patch("/users/gina", &admin, json!({ "role": "moderator" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["role"], "moderator");

    assert_eq!(srv.get("/users/nobody", Some(&admin)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_accounts_cannot_sign_in() {
    let srv = TestServer::spawn().await;
    srv.login("jack", "jack@example.com").await;
    let admin = srv.admin_token().await;

    let res = srv.delete("/users/jack", &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    srv.signup("jack", "jack@example.com").await;
    let code = srv.outbox.latest_code("jack").unwrap();
    assert_eq!(srv.exchange("jack", &code).await.status(), StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalogue
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalogue_writes_need_admin() {
    let srv = TestServer::spawn().await;
    let user = srv.login("kate", "kate@example.com").await;
    let admin = srv.admin_token().await;

    let res = srv
        .client
        .post(srv.url("/categories"))
        .json(&json!({ "name": "Movie", "slug": "movie" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .post("/categories", &user, json!({ "name": "Movie", "slug": "movie" }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .post("/categories", &admin, json!({ "name": "Movie", "slug": "movie" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = srv
        .post("/categories", &admin, json!({ "name": "Film", "slug": "movie" }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .post("/genres", &admin, json!({ "name": "Drama", "slug": "drama" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv
        .post(
            "/titles",
            &admin,
            json!({ "name": "Stalker", "year": 1979, "category": "movie", "genre": ["drama"] }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let title: Value = res.json().await.unwrap();
    assert_eq!(title["category"]["slug"], "movie");
    assert_eq!(title["genre"][0]["slug"], "drama");
    assert!(title["rating"].is_null());

    let res = srv
        .post(
            "/titles",
            &admin,
            json!({ "name": "Solaris", "year": 1972, "category": "nope" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.delete("/categories/movie", &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let id = title["id"].as_str().unwrap();
    let res = srv.get(&format!("/titles/{id}"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await.unwrap()["category"].is_null());

    assert_eq!(srv.get("/titles/not-a-uuid", None).await.status(), StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────────────
// Reviews and comments
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_review_per_author_and_live_rating() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let liz = srv.login("liz", "liz@example.com").await;
    let max = srv.login("max", "max@example.com").await;
    let title = srv.title(&admin, "Mirror").await;
    let reviews = format!("/titles/{title}/reviews");

    let res = srv.post(&reviews, &liz, json!({ "text": "great", "score": 8 })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let review: Value = res.json().await.unwrap();
    assert_eq!(review["author"], "liz");
    assert_eq!(review["score"], 8);

    let res = srv.post(&reviews, &liz, json!({ "text": "again", "score": 9 })).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv.post(&reviews, &max, json!({ "text": "too long", "score": 11 })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = srv.post(&reviews, &max, json!({ "text": "no score" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.post(&reviews, &max, json!({ "text": "fine", "score": 5 })).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv.get(&format!("/titles/{title}"), None).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["rating"].as_f64(), Some(6.5));

    let res = srv.get(&reviews, None).await;
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed["items"].as_array().unwrap().len(), 2);

    let res = srv
        .client
        .post(srv.url(&reviews))
        .json(&json!({ "text": "anon", "score": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let missing = format!("/titles/{}/reviews", UserId::new());
    let res = srv.post(&missing, &max, json!({ "text": "ghost", "score": 5 })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_reviews_by_one_author_yield_one_row() {
    let srv = Arc::new(TestServer::spawn().await);
    let admin = srv.admin_token().await;
    let nina = srv.login("nina", "nina@example.com").await;
    let title = srv.title(&admin, "Nostalghia").await;
    let path = format!("/titles/{title}/reviews");

    let mut tasks = Vec::new();
    for i in 0..10 {
        let srv = srv.clone();
        let nina = nina.clone();
        let path = path.clone();
        tasks.push(tokio::spawn(async move {
            srv.post(&path, &nina, json!({ "text": format!("take {i}"), "score": 7 }))
                .await
                .status()
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for t in tasks {
        match t.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!((created, conflicts), (1, 9));
}

#[tokio::test]
async fn only_author_or_staff_may_edit() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let olga = srv.login("olga", "olga@example.com").await;
    let pete = srv.login("pete", "pete@example.com").await;

    // Admin-created moderator signs in through the normal signup flow.
    let res = srv
        .post(
            "/users",
            &admin,
            json!({ "username": "quinn", "email": "quinn@example.com", "role": "moderator" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let quinn = srv.login("quinn", "quinn@example.com").await;

    let title = srv.title(&admin, "Ivan's Childhood").await;
    let res = srv
        .post(
            &format!("/titles/{title}/reviews"),
            &olga,
            json!({ "text": "moving", "score": 9 }),
        )
        .await;
    let review_id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let review = format!("/titles/{title}/reviews/{review_id}");

    let res = srv.patch(&review, &pete, json!({ "score": 1 })).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.patch(&review, &olga, json!({ "text": "still moving" })).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.patch(&review, &quinn, json!({ "score": 4 })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["score"], 4);
    assert_eq!(body["author"], "olga");
    assert_eq!(body["text"], "still moving");

    // Comments follow the same rules and go away with their review.
    let comments = format!("{review}/comments");
    let res = srv.post(&comments, &pete, json!({ "text": "disagree" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment_id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let comment = format!("{comments}/{comment_id}");

    assert_eq!(
        srv.patch(&comment, &olga, json!({ "text": "hm" })).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        srv.patch(&comment, &pete, json!({ "text": "" })).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(srv.get(&comment, None).await.status(), StatusCode::OK);

    assert_eq!(srv.delete(&review, &pete).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(srv.delete(&review, &admin).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get(&review, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.get(&comments, None).await.status(), StatusCode::NOT_FOUND);

    let res = srv.get(&format!("/titles/{title}"), None).await;
    assert!(res.json::<Value>().await.unwrap()["rating"].is_null());
}
