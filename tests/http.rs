use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::{json, Value};
use tempfile::TempDir;
use warp::http::StatusCode;
use warp::Filter;

use proofing::audio::probe::Prober;
use proofing::environment::{Config, Environment};
use proofing::persistence::Gateway;
use proofing::routes;
use proofing::urls::Urls;

const BOUNDARY: &str = "thisisaboundary1234";
const BASE_URL: &str = "http://localhost:8080/";
const KEY: &str = "dw25dec";

struct Fixture {
    dir: TempDir,
    environment: Environment,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("create temporary directory");
        let logger = Arc::new(log::silent_logger());

        let environment = Environment::new(
            logger.clone(),
            Arc::new(Gateway::new(dir.path(), logger)),
            Arc::new(Urls::new(BASE_URL)),
            Arc::new(Prober::new(None)),
            Config::new(
                dir.path(),
                vec!["Breath".to_owned(), "Pop".to_owned(), "Click".to_owned()],
                2,
                Default::default(),
            ),
        );

        Fixture { dir, environment }
    }

    fn filter(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + 'static {
        let logger = self.environment.logger.clone();

        routes::make_routes(self.environment.clone())
            .recover(move |r| routes::format_rejection(logger.clone(), r))
    }

    async fn send(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = warp::test::request().method(method).path(path);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.reply(&self.filter()).await;

        (response.status(), parse(response.body()))
    }

    async fn upload(&self, name: &str, data: &[u8]) -> (StatusCode, Value) {
        let body = make_multipart_body(name, data);

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/s/{}/upload", KEY))
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .header("content-length", body.len())
            .body(body)
            .reply(&self.filter())
            .await;

        (response.status(), parse(response.body()))
    }

    fn audio_dir(&self) -> PathBuf {
        self.dir.path().join(KEY).join("audio")
    }
}

fn parse(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }

    serde_json::from_slice(body).expect("parse response as JSON")
}

fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = vec![];
    {
        let mut writer =
            hound::WavWriter::new(Cursor::new(&mut buffer), spec).expect("create WAV writer");
        for _ in 0..12000 {
            writer.write_sample(0i16).expect("write sample");
        }
        writer.finalize().expect("finalize WAV");
    }

    buffer
}

fn make_multipart_body(name: &str, content: &[u8]) -> Vec<u8> {
    let header = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        BOUNDARY, name
    );
    let footer = format!("\r\n--{}--\r\n", BOUNDARY);

    [header.as_bytes(), content, footer.as_bytes()].concat()
}

#[tokio::test]
async fn entering_a_scope_sanitizes_the_key() {
    let fixture = Fixture::new();

    let (status, body) = fixture
        .send("POST", "/scope", Some(json!({ "key": " dw 25!dec " })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["key"], "dw25dec");
    assert_eq!(body["url"], "http://localhost:8080/s/dw25dec/");

    let (status, body) = fixture
        .send("POST", "/scope", Some(json!({ "key": " !!! " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["action"], "scope");
    assert!(body["message"].as_str().is_some());

    let (status, body) = fixture.send("GET", "/scope?key=dw25dec", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "dw25dec");
}

#[tokio::test]
async fn first_visit_is_empty() {
    let fixture = Fixture::new();

    let (status, body) = fixture.send("GET", "/s/dw25dec/state", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"], json!([]));
    assert_eq!(body["assets"], json!([]));
    assert_eq!(body["active"], Value::Null);
    assert_eq!(body["labels"], json!(["Breath", "Pop", "Click"]));
    assert_eq!(body["export_url"], "http://localhost:8080/s/dw25dec/export.csv");
}

#[tokio::test]
async fn proofing_workflow() {
    let fixture = Fixture::new();

    let (status, body) = fixture.upload("Take 1.wav", &wav_bytes()).await;
    assert_eq!(status, StatusCode::CREATED);
    let audio_id = body["view"]["active"]["audio_id"]
        .as_str()
        .expect("active audio ID")
        .to_owned();
    assert_eq!(body["view"]["active"]["duration_sec"], 1.5);
    assert_eq!(body["view"]["assets"][0]["label"], "Take 1.wav (00:00:01.50)");
    assert_eq!(body["commands"][0]["command"], "mount_player");

    let (status, _) = fixture
        .send(
            "POST",
            "/s/dw25dec/position",
            Some(json!({ "audio_id": audio_id, "current_time": 12.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = fixture
        .send("POST", "/s/dw25dec/events", Some(json!({ "label": "Pop" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["commands"], json!([{ "command": "clear_note" }]));
    assert_eq!(body["view"]["events"][0]["timecode"], "00:00:12.50");
    assert_eq!(body["view"]["active"]["last_played"], 12.5);

    let response = warp::test::request()
        .method("GET")
        .path("/s/dw25dec/export.csv")
        .reply(&fixture.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv; charset=utf-8");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"proofing_log.csv\""
    );
    let csv = String::from_utf8(response.body().to_vec()).expect("decode CSV");
    assert!(csv.starts_with("audio_file,time_sec,timecode,label,note,logged_at_epoch\r\n"));
    assert!(csv.contains("\r\nTake 1.wav,12.5,00:00:12.50,Pop,,"));

    let mut rows = body["view"]["events"].clone();
    rows[0]["timecode"] = json!("00:01:00.00");
    let (status, body) = fixture
        .send("PUT", "/s/dw25dec/events", Some(json!({ "rows": rows })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["events"][0]["time_sec"], 60.0);

    let (_, body) = fixture
        .send(
            "POST",
            "/s/dw25dec/jump",
            Some(json!({ "audio_id": audio_id, "target": "last_played" })),
        )
        .await;
    assert_eq!(
        body["commands"][0],
        json!({ "command": "mount_player", "audio_id": audio_id, "start_at": 12.5, "version": 1 })
    );

    let (_, body) = fixture.send("POST", "/s/dw25dec/undo", None).await;
    assert_eq!(body["view"]["events"], json!([]));

    fixture
        .send("POST", "/s/dw25dec/events", Some(json!({ "label": "Click", "note": " lip ", "current_time": 3 })))
        .await;
    fixture
        .send("POST", "/s/dw25dec/events", Some(json!({ "label": "Breath" })))
        .await;
    let (_, body) = fixture
        .send("DELETE", "/s/dw25dec/events", Some(json!({ "indices": [0] })))
        .await;
    assert_eq!(body["view"]["events"][0]["label"], "Breath");
    assert_eq!(body["view"]["events"][0]["time_sec"], 3.0);

    let (_, body) = fixture.send("POST", "/s/dw25dec/clear", None).await;
    assert_eq!(body["view"]["events"], json!([]));

    let (status, body) = fixture.send("GET", "/s/dw25dec/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"], json!([]));
    assert_eq!(body["active"]["audio_id"], audio_id.as_str());
}

#[tokio::test]
async fn playback_and_vanished_audio() {
    let fixture = Fixture::new();
    let wav = wav_bytes();

    let (_, body) = fixture.upload("take.wav", &wav).await;
    let audio_id = body["view"]["active"]["audio_id"]
        .as_str()
        .expect("active audio ID")
        .to_owned();
    let path = format!("/s/dw25dec/audio/{}", audio_id);

    let response = warp::test::request()
        .method("GET")
        .path(&path)
        .reply(&fixture.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/wav");
    assert_eq!(response.body().as_ref(), wav.as_slice());

    fs::remove_dir_all(fixture.audio_dir()).expect("delete audio out of band");

    let (status, body) = fixture.send("GET", &path, None).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["action"], "audio");
    assert_eq!(body["audio_id"], audio_id.as_str());

    let (status, body) = fixture
        .send("POST", "/s/dw25dec/select", Some(json!({ "audio_id": audio_id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commands"][0]["command"], "warn");
    assert_eq!(body["view"]["active"]["available"], false);
    assert_eq!(body["view"]["assets"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn bad_requests_fail() {
    let fixture = Fixture::new();

    let (status, body) = fixture.upload("notes.txt", b"hello").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["action"], "upload");
    assert_eq!(body["name"], "notes.txt");

    let (status, body) = fixture
        .send("POST", "/s/dw25dec/events", Some(json!({ "label": "Hum" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["action"], "log_event");

    let (status, _) = fixture
        .send("POST", "/s/dw25dec/select", Some(json!({ "audio_id": "ffffffffffffffff" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = fixture.send("GET", "/s/!!!/state", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["action"], "state");

    let response = warp::test::request()
        .method("POST")
        .path("/s/dw25dec/upload")
        .header("content-type", "text/plain")
        .header("content-length", 0)
        .reply(&fixture.filter())
        .await;
    assert!(response.status().is_client_error());

    assert!(!fixture.dir.path().join(KEY).join("state.json").exists());
}

#[tokio::test]
async fn healthz_reports_the_version() {
    let fixture = Fixture::new();

    let response = warp::test::request()
        .method("GET")
        .path("/healthz")
        .reply(&routes::admin::make_healthz_route(fixture.environment.clone()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse(response.body())["version"], info::VERSION);
}
