use std::net::TcpListener;

use review_harvest::{configuration::get_configuration, startup::run};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

struct TestApp {
    address: String,
    client: reqwest::Client,
}

impl TestApp {
    async fn scrape(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/scrape", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Starts the app on a random port with every pause set to zero.
fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let mut settings = get_configuration().expect("Failed to read configuration.");
    settings.session.backoff_factor = 0.0;
    settings.session.max_retries = 1;
    settings.fetcher.delay_min_secs = 0.0;
    settings.fetcher.delay_max_secs = 0.0;
    settings.fetcher.cooldown_secs = 0;

    let server = run(listener, settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

fn review_page(page: u32, count: usize) -> String {
    let reviews: String = (1..=count)
        .map(|i| {
            format!(
                r#"<div data-test="review-details-container">
                    <span data-test="review-rating-label">4,0</span>
                    <h3 data-test="review-details-title">Avis {page}-{i}</h3>
                    <span data-test="review-text-PROS">Formations</span>
                    <div class="rating-icon_ratingContainer__9UoJ6"><span>Recommande</span></div>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", reviews)
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn scrape_collects_pages_until_an_empty_one() {
    let app = spawn_app();
    let site = MockServer::start().await;
    mount_page(&site, "/Avis/Acme-E1.htm", 200, review_page(1, 2)).await;
    mount_page(&site, "/Avis/Acme-E1_P2.htm", 200, review_page(2, 1)).await;
    mount_page(&site, "/Avis/Acme-E1_P3.htm", 200, review_page(3, 0)).await;

    let response = app
        .scrape(json!({
            "base_url": format!("{}/Avis/Acme-E1", site.uri()),
            "lang_param": "?filter.iso3Language=fra",
            "max_pages": 5
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["stop_reason"], "empty_page");
    assert_eq!(report["stopped_at_page"], 3);
    assert_eq!(report["requests_issued"], 3);

    let records = report["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["title"], "Avis 1-1");
    assert_eq!(records[2]["title"], "Avis 2-1");
    assert_eq!(records[0]["recommends"], "Yes");
    assert_eq!(records[0]["date"], "");
}

#[tokio::test]
async fn scrape_stops_when_blocked() {
    let app = spawn_app();
    let site = MockServer::start().await;
    mount_page(&site, "/Avis/Acme-E1.htm", 200, review_page(1, 3)).await;
    mount_page(&site, "/Avis/Acme-E1_P2.htm", 403, String::new()).await;
    Mock::given(method("GET"))
        .and(path("/Avis/Acme-E1_P3.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(review_page(3, 3)))
        .expect(0)
        .mount(&site)
        .await;

    let report: Value = app
        .scrape(json!({
            "base_url": format!("{}/Avis/Acme-E1", site.uri()),
            "max_pages": 3
        }))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(report["stop_reason"], "blocked");
    assert_eq!(report["stopped_at_page"], 2);
    assert_eq!(report["last_status"], 403);
    assert_eq!(report["records"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn scrape_reports_exhausted_server_errors() {
    let app = spawn_app();
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Avis/Acme-E1.htm"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&site)
        .await;

    let report: Value = app
        .scrape(json!({
            "base_url": format!("{}/Avis/Acme-E1", site.uri()),
            "max_pages": 2
        }))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(report["stop_reason"], "exhausted");
    assert_eq!(report["stopped_at_page"], 1);
    assert_eq!(report["last_status"], 503);
    assert!(report["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn scrape_rejects_invalid_requests() {
    let app = spawn_app();
    let test_cases = vec![
        (json!({"base_url": "https://reviews.test/a", "max_pages": 0}), "zero pages"),
        (json!({"base_url": "https://reviews.test/a", "max_pages": 11}), "too many pages"),
        (json!({"base_url": "reviews", "max_pages": 2}), "relative url"),
        (json!({"max_pages": 2}), "missing base_url"),
    ];

    for (body, description) in test_cases {
        let response = app.scrape(body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
    }
}
