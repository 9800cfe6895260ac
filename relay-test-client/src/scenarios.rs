use anyhow::Result;
use colored::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_secs(1);
const SITE_EVENT: &str = "site:event";

fn with_run_id(run_id: &str) -> impl Fn(&Value) -> bool + '_ {
    move |data: &Value| data["meta"]["run_id"] == run_id
}

fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub async fn test_connection(panel1: &Connection, panel2: &Connection) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Connection ===".bright_cyan().bold());

    match (&panel1.connection_id, &panel2.connection_id) {
        (Some(first), Some(second)) if first != second => {
            println!(
                "{} Both panels greeted ({} / {})",
                "✓".green(),
                first,
                second
            );
            Ok(TestResult::pass("connection", start.elapsed()))
        }
        (Some(first), Some(second)) => Ok(TestResult::fail(
            "connection",
            format!("Panels share a connection id: {} == {}", first, second),
            start.elapsed(),
        )),
        _ => Ok(TestResult::fail(
            "connection",
            "A panel's greeting carried no connection_id",
            start.elapsed(),
        )),
    }
}

pub async fn test_broadcast(
    api_client: &ApiClient,
    secret: &str,
    panel1: &mut Connection,
    panel2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Broadcast ===".bright_cyan().bold());

    let run_id = new_run_id();
    let payload = json!({
        "type": "click",
        "who": "homepage",
        "meta": { "run_id": run_id, "button": "signup" }
    });

    println!("{} Posting event as the public site...", "→".blue());
    let posted_at = Instant::now();
    let response = api_client.post_event(Some(secret), None, &payload).await?;

    if !response.status.is_success() || response.body != json!({"ok": true}) {
        return Ok(TestResult::fail(
            "broadcast",
            format!(
                "Expected 200 {{\"ok\":true}}, got {} {}",
                response.status, response.body
            ),
            start.elapsed(),
        ));
    }
    println!("{} Relay acknowledged the event", "✓".green());

    for panel in [panel1, panel2] {
        println!("{} Waiting for {} to receive {}...", "→".blue(), panel.label, SITE_EVENT);

        let event = match panel
            .wait_for(SITE_EVENT, EVENT_TIMEOUT, with_run_id(&run_id))
            .await
        {
            Ok(event) => event,
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                return Ok(TestResult::fail(
                    "broadcast",
                    format!("{}: {}", panel.label, e),
                    start.elapsed(),
                ));
            }
        };
        print_event(&panel.label, &event);

        let data = &event.data;
        let fields_match = data["type"] == "click"
            && data["who"] == "homepage"
            && data["meta"] == payload["meta"]
            && data["at"].is_string();

        if !fields_match {
            println!("{} Event data mismatch!", "✗".red());
            return Ok(TestResult::fail(
                "broadcast",
                format!("{} received unexpected payload: {}", panel.label, data),
                start.elapsed(),
            ));
        }

        println!(
            "{} {} verified (delivered {:?} after post)",
            "✓".green(),
            panel.label,
            event.timestamp.saturating_duration_since(posted_at)
        );
    }

    Ok(TestResult::pass("broadcast", start.elapsed()))
}

pub async fn test_defaults(
    api_client: &ApiClient,
    secret: &str,
    panel: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Field Defaults ===".bright_cyan().bold());

    // meta is required to correlate the event, so only type/who are defaulted here
    let run_id = new_run_id();
    let payload = json!({ "meta": { "run_id": run_id } });
    api_client.post_event(Some(secret), None, &payload).await?;

    match panel
        .wait_for(SITE_EVENT, EVENT_TIMEOUT, with_run_id(&run_id))
        .await
    {
        Ok(event) if event.data["type"] == "unknown" && event.data["who"] == "public-site" => {
            print_event(&panel.label, &event);
            println!("{} Defaults applied", "✓".green());
            Ok(TestResult::pass("defaults", start.elapsed()))
        }
        Ok(event) => Ok(TestResult::fail(
            "defaults",
            format!("Defaults not applied: {}", event.data),
            start.elapsed(),
        )),
        Err(e) => Ok(TestResult::fail("defaults", e.to_string(), start.elapsed())),
    }
}

pub async fn test_unauthorized(
    api_client: &ApiClient,
    panel: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Unauthorized ===".bright_cyan().bold());

    let run_id = new_run_id();
    let payload = json!({ "type": "click", "meta": { "run_id": run_id } });

    for secret in [Some("definitely-wrong"), None] {
        let response = api_client.post_event(secret, None, &payload).await?;
        let expected = json!({"ok": false, "error": "Unauthorized"});

        if response.status != reqwest::StatusCode::UNAUTHORIZED || response.body != expected {
            return Ok(TestResult::fail(
                "unauthorized",
                format!(
                    "Expected 401 {}, got {} {}",
                    expected, response.status, response.body
                ),
                start.elapsed(),
            ));
        }
    }
    println!("{} Wrong and missing secrets rejected with 401", "✓".green());

    println!("{} Checking that nothing was broadcast...", "→".blue());
    match panel
        .expect_silence(SITE_EVENT, SILENCE_WINDOW, with_run_id(&run_id))
        .await
    {
        None => {
            println!("{} No event leaked", "✓".green());
            Ok(TestResult::pass("unauthorized", start.elapsed()))
        }
        Some(event) => Ok(TestResult::fail(
            "unauthorized",
            format!("Rejected event was broadcast anyway: {}", event.data),
            start.elapsed(),
        )),
    }
}

pub async fn test_late_joiner(
    api_client: &ApiClient,
    base_url: &str,
    secret: &str,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Late Joiner ===".bright_cyan().bold());

    let before_id = new_run_id();
    api_client
        .post_event(Some(secret), None, &json!({ "meta": { "run_id": before_id } }))
        .await?;
    println!("{} Posted an event before the panel connected", "→".blue());

    let mut late = Connection::establish(base_url, None, "Late Panel".to_string()).await?;
    println!("{} Late panel connected", "✓".green());

    let after_id = new_run_id();
    api_client
        .post_event(Some(secret), None, &json!({ "meta": { "run_id": after_id } }))
        .await?;

    let first = match late.wait_for_event(SITE_EVENT, EVENT_TIMEOUT).await {
        Ok(event) => event,
        Err(e) => return Ok(TestResult::fail("late_joiner", e.to_string(), start.elapsed())),
    };

    if first.data["meta"]["run_id"] == after_id.as_str() {
        println!("{} Late panel only saw the event posted after it joined", "✓".green());
        Ok(TestResult::pass("late_joiner", start.elapsed()))
    } else {
        Ok(TestResult::fail(
            "late_joiner",
            format!("Late panel received an earlier event: {}", first.data),
            start.elapsed(),
        ))
    }
}

pub async fn test_origin_rejection(
    api_client: &ApiClient,
    secret: &str,
    foreign_origin: &str,
    panel: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Origin Rejection ===".bright_cyan().bold());

    let run_id = new_run_id();
    let payload = json!({ "meta": { "run_id": run_id } });
    let ingress = api_client
        .post_event(Some(secret), Some(foreign_origin), &payload)
        .await?;
    let stream = api_client.probe_stream(foreign_origin).await?;

    if ingress.status != reqwest::StatusCode::FORBIDDEN || stream != reqwest::StatusCode::FORBIDDEN
    {
        return Ok(TestResult::fail(
            "origin_rejection",
            format!(
                "Expected 403 for {} on ingress and stream, got {} and {}",
                foreign_origin, ingress.status, stream
            ),
            start.elapsed(),
        ));
    }
    println!("{} Ingress and stream both rejected {}", "✓".green(), foreign_origin);

    match panel
        .expect_silence(SITE_EVENT, SILENCE_WINDOW, with_run_id(&run_id))
        .await
    {
        None => Ok(TestResult::pass("origin_rejection", start.elapsed())),
        Some(event) => Ok(TestResult::fail(
            "origin_rejection",
            format!("Rejected origin's event was broadcast: {}", event.data),
            start.elapsed(),
        )),
    }
}
