#![allow(dead_code)]

use bookshop::entities::{account::Role, book, setup_schema};
use bookshop::repository::{
    accounts::{self, NewAccount},
    books::{self, NewBook},
};
use bookshop::routes::api_router;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const PASSWORD: &str = "Muzion15";

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub db: Arc<DatabaseConnection>,
}

/// Serves the full router on an ephemeral port backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open database");
    setup_schema(&db).await.expect("Failed to create schema");
    let db = Arc::new(db);

    let app = api_router(db.clone(), Arc::from("test-secret"));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let address = format!("http://{}", listener.local_addr().expect("No local address"));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        address,
        client: Client::new(),
        db,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str) -> StatusCode {
        self.client
            .post(self.url("/register"))
            .json(&json!({
                "username": username,
                "password": PASSWORD,
                "address": "Main st. 1"
            }))
            .send()
            .await
            .expect("Failed to send request")
            .status()
    }

    pub async fn login(&self, username: &str, password: &str) -> Option<String> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to send request");
        if response.status() != StatusCode::OK {
            return None;
        }
        let body = response
            .json::<Value>()
            .await
            .expect("Failed to parse response JSON");
        body["token"].as_str().map(str::to_owned)
    }

    /// Registers a user and returns its token.
    pub async fn user_token(&self, username: &str) -> String {
        assert_eq!(self.register(username).await, StatusCode::CREATED);
        self.login(username, PASSWORD)
            .await
            .expect("Token not found in login response")
    }

    pub async fn admin_token(&self) -> String {
        accounts::create_account(
            self.db.as_ref(),
            NewAccount {
                username: "admin".to_owned(),
                password: PASSWORD.to_owned(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                address: String::new(),
            },
            Role::Admin,
        )
        .await
        .expect("Failed to create admin");
        self.login("admin", PASSWORD)
            .await
            .expect("Token not found in login response")
    }

    pub async fn seed_book(&self, name: &str, price: f64) -> book::Model {
        books::create_book(
            self.db.as_ref(),
            NewBook {
                isbn: "9781234567897".to_owned(),
                name: name.to_owned(),
                description: format!("All about {name}"),
                publish_date: NaiveDate::from_ymd_opt(1999, 9, 9).expect("valid date"),
                price,
                publisher: "Acme".to_owned(),
                page_number: 320,
                language: "English".to_owned(),
                cover_image: "cover.jpg".to_owned(),
            },
        )
        .await
        .expect("Failed to seed book")
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }
}
