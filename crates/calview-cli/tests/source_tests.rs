use std::fs;
use std::thread;

use anyhow::{Result, anyhow};
use calview_cli::file_source::FileSource;
use calview_cli::google::GoogleCalendarSource;
use calview_core::{EventSource, EventStart, FetchWindow, LoadFailure};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use tiny_http::{Header, Response, Server};

fn window() -> FetchWindow {
    let anchor = Utc
        .with_ymd_and_hms(2024, 3, 11, 0, 0, 0)
        .single()
        .expect("valid instant");
    FetchWindow::around(anchor, 4, 4)
}

fn serve_once(status: u16, body: String) -> Result<(String, thread::JoinHandle<String>)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/v3", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        let response = Response::from_string(body)
            .with_status_code(status)
            .with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
        request.respond(response).expect("response should succeed");
        url
    });

    Ok((addr, handle))
}

#[tokio::test]
async fn fetches_and_decodes_feed_from_mock_server() -> Result<()> {
    let body = json!({
        "kind": "calendar#events",
        "items": [
            {
                "id": "kickoff",
                "summary": "Kickoff",
                "description": "Room 4",
                "start": { "dateTime": "2024-03-12T09:30:00-04:00" }
            },
            { "id": "report", "summary": "Report due", "start": { "date": "2024-03-15" } }
        ]
    })
    .to_string();
    let (addr, handle) = serve_once(200, body)?;

    let source = GoogleCalendarSource::new(&addr, "cal", Some("k".to_string()), 50)?;
    let events = source
        .fetch_events(&window())
        .await
        .map_err(|failure| anyhow!("fetch failed: {failure}"))?;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Kickoff");
    assert_eq!(events[0].description.as_deref(), Some("Room 4"));
    assert_eq!(
        events[1].start,
        EventStart::AllDay(NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date"))
    );

    let url = handle.join().expect("server thread should join");
    assert!(url.starts_with("/v3/calendars/cal/events?"));
    assert!(url.contains("key=k"));
    assert!(url.contains("singleEvents=true"));
    assert!(url.contains("orderBy=startTime"));
    assert!(url.contains("maxResults=50"));
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_reported() -> Result<()> {
    let (addr, handle) = serve_once(500, r#"{"error":"boom"}"#.to_string())?;

    let source = GoogleCalendarSource::new(&addr, "cal", None, 250)?;
    let failure = source
        .fetch_events(&window())
        .await
        .expect_err("server error should fail");
    assert_eq!(failure, LoadFailure::Status(500));

    handle.join().expect("server thread should join");
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() -> Result<()> {
    let (addr, handle) = serve_once(200, "<html>nope</html>".to_string())?;

    let source = GoogleCalendarSource::new(&addr, "cal", None, 250)?;
    let failure = source
        .fetch_events(&window())
        .await
        .expect_err("html should not decode");
    assert!(matches!(failure, LoadFailure::Decode(_)));

    handle.join().expect("server thread should join");
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() -> Result<()> {
    let source = GoogleCalendarSource::new("http://127.0.0.1:1/v3", "cal", None, 250)?;
    let failure = source
        .fetch_events(&window())
        .await
        .expect_err("nothing listens on port 1");
    assert!(matches!(failure, LoadFailure::Transport(_)));
    Ok(())
}

#[tokio::test]
async fn file_source_reads_bare_event_list() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("events.json");
    fs::write(
        &path,
        r#"[{ "id": "x", "summary": "Exam due", "start": { "date": "2024-03-13" } }]"#,
    )?;

    let events = FileSource::new(&path)
        .fetch_events(&window())
        .await
        .map_err(|failure| anyhow!("file load failed: {failure}"))?;
    assert_eq!(events.len(), 1);
    assert!(events[0].is_due());
    Ok(())
}

#[tokio::test]
async fn missing_file_is_a_transport_failure() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let failure = FileSource::new(dir.path().join("absent.json"))
        .fetch_events(&window())
        .await
        .expect_err("missing file");
    assert!(matches!(failure, LoadFailure::Transport(_)));
    Ok(())
}
