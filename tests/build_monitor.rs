use std::sync::{Arc, Mutex};
use std::time::Duration;

use remote_job::config::{Credentials, PollSettings, RunConfig, TriggerRequest};
use remote_job::contract::{ConsoleSink, Crumb, HttpResponse, MockHttpTransport, MockSleeper};
use remote_job::error::RemoteJobError;
use remote_job::monitor::BuildMonitor;
use remote_job::outcome::BuildResult;

const BUILD_URL: &str = "http://host/job/x/7/";

#[derive(Default, Clone)]
struct CollectingSink {
    lines: Arc<Mutex<Vec<(String, String)>>>,
}

impl CollectingSink {
    fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }
}

impl ConsoleSink for CollectingSink {
    fn emit(&self, job_name: &str, line: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((job_name.to_string(), line.to_string()));
    }
}

fn config(timeout_secs: u64, interval_secs: u64) -> RunConfig {
    RunConfig {
        trigger: TriggerRequest::new(
            "http://host",
            "x",
            vec![],
            Credentials {
                user: "user".to_string(),
                token: "secret".to_string(),
            },
        ),
        poll: PollSettings {
            build_timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_secs(interval_secs),
        },
    }
}

fn console(lines: usize) -> String {
    (1..=lines).map(|n| format!("line {n}\r\n")).collect()
}

/// Transport serving `statuses` to `{build}api/json` and `consoles` to `{build}consoleText`, in
/// order. Each list must be consumed exactly.
fn build_transport(statuses: Vec<&'static str>, consoles: Vec<String>) -> MockHttpTransport {
    let mut transport = MockHttpTransport::new();
    let expected = statuses.len() + consoles.len();
    let mut statuses = statuses.into_iter();
    let mut consoles = consoles.into_iter();
    transport
        .expect_get()
        .times(expected)
        .returning(move |url, crumb| {
            assert!(crumb.is_some(), "every build request carries the crumb");
            if url == format!("{BUILD_URL}api/json") {
                Ok(HttpResponse::ok(statuses.next().expect("scripted status")))
            } else if url == format!("{BUILD_URL}consoleText") {
                Ok(HttpResponse::ok(consoles.next().expect("scripted console")))
            } else {
                panic!("unexpected url {url}");
            }
        });
    transport
}

fn sleeper(times: usize) -> MockSleeper {
    let mut sleeper = MockSleeper::new();
    sleeper
        .expect_sleep()
        .times(times)
        .returning(|_| ());
    sleeper
}

#[tokio::test]
async fn logs_only_new_lines_and_reports_success() {
    let transport = build_transport(
        vec![
            r#"{"building": true, "result": null}"#,
            r#"{"building": false, "result": "SUCCESS"}"#,
            r#"{"building": false, "result": "SUCCESS"}"#,
        ],
        vec![console(3), console(5)],
    );
    let sleeper = sleeper(2);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    let report = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .expect("monitor should finish");

    assert_eq!(
        sink.lines(),
        vec!["line 1", "line 2", "line 3", "line 4", "line 5"]
    );
    assert!(sink
        .lines
        .lock()
        .unwrap()
        .iter()
        .all(|(job, _)| job == "x"));
    assert_eq!(report.result, BuildResult::Success);
    assert_eq!(report.lines_emitted, 5);
    assert!(!report.timed_out);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn unchanged_console_logs_nothing_new() {
    let transport = build_transport(
        vec![
            r#"{"building": true}"#,
            r#"{"building": true}"#,
            r#"{"building": false, "result": "FAILURE"}"#,
            r#"{"building": false, "result": "FAILURE"}"#,
        ],
        vec![console(3), console(3), console(4)],
    );
    let sleeper = sleeper(3);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    let report = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .unwrap();

    assert_eq!(sink.len(), 4);
    assert_eq!(report.result, BuildResult::Failure);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn unterminated_last_line_waits_for_its_terminator() {
    let transport = build_transport(
        vec![
            r#"{"building": true}"#,
            r#"{"building": false, "result": "SUCCESS"}"#,
            r#"{"building": false, "result": "SUCCESS"}"#,
        ],
        vec!["first\r\nsec".to_string(), "first\r\nsecond\r\n".to_string()],
    );
    let sleeper = sleeper(2);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .unwrap();

    assert_eq!(sink.lines(), vec!["first", "second"]);
}

#[tokio::test]
async fn local_timeout_finishes_with_a_failing_report() {
    // 10s budget, 5s interval: polls at 5s and 10s, gives up at 15s, then one final status read.
    let transport = build_transport(
        vec![
            r#"{"building": true, "result": null}"#,
            r#"{"building": true, "result": null}"#,
            r#"{"building": true, "result": null}"#,
        ],
        vec![console(1), console(2)],
    );
    let sleeper = sleeper(3);
    let sink = CollectingSink::default();
    let config = config(10, 5);

    let report = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .unwrap();

    assert!(report.timed_out);
    assert_eq!(report.result, BuildResult::Missing);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(sink.lines(), vec!["line 1", "line 2"]);
}

#[tokio::test]
async fn aborted_build_maps_to_failure() {
    let transport = build_transport(
        vec![
            r#"{"building": false, "result": "ABORTED"}"#,
            r#"{"building": false, "result": "ABORTED"}"#,
        ],
        vec![console(2)],
    );
    let sleeper = sleeper(1);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    let report = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Aborted);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn console_http_error_is_fatal() {
    let mut transport = MockHttpTransport::new();
    transport.expect_get().times(2).returning(|url, _| {
        if url.ends_with("api/json") {
            Ok(HttpResponse::ok(r#"{"building": true}"#))
        } else {
            Ok(HttpResponse {
                status: 404,
                ..HttpResponse::default()
            })
        }
    });
    let sleeper = sleeper(1);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    let err = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .unwrap_err();

    match err {
        RemoteJobError::HttpStatus { url, status } => {
            assert_eq!(url, format!("{BUILD_URL}consoleText"));
            assert_eq!(status, 404);
        }
        other => panic!("expected http status error, got {other:?}"),
    }
}

#[tokio::test]
async fn build_url_without_trailing_slash_gets_one_separator() {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_get()
        .times(3)
        .returning(|url, _| match url {
            "http://host/job/x/7/api/json" => Ok(HttpResponse::ok(
                r#"{"building": false, "result": "SUCCESS"}"#,
            )),
            "http://host/job/x/7/consoleText" => Ok(HttpResponse::ok("done\n")),
            other => panic!("unexpected url {other}"),
        });
    let sleeper = sleeper(1);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    let report = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch("http://host/job/x/7", &Crumb::new("abc"))
        .await
        .unwrap();

    assert_eq!(report.result, BuildResult::Success);
    assert_eq!(sink.lines(), vec!["done"]);
}

#[tokio::test]
async fn status_without_building_flag_is_a_decode_error() {
    let mut transport = MockHttpTransport::new();
    transport
        .expect_get()
        .times(1)
        .returning(|_, _| Ok(HttpResponse::ok(r#"{"result": null}"#)));
    let sleeper = sleeper(1);
    let sink = CollectingSink::default();
    let config = config(60, 5);

    let err = BuildMonitor::new(&transport, &sleeper, &sink, &config)
        .watch(BUILD_URL, &Crumb::new("abc"))
        .await
        .unwrap_err();

    match err {
        RemoteJobError::Decode { url, .. } => assert_eq!(url, format!("{BUILD_URL}api/json")),
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(sink.len(), 0);
}
