//! Minimal Responses API double: structured output picked by request shape.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct OpenAiStubConfig {
    /// Answer to requests carrying an `input_image` part.
    pub identify: Value,
    /// Answer to `BEGIN_QUERY` metadata lookups.
    pub metadata: Value,
    /// Fail every request with this status instead.
    pub fail_status: Option<u16>,
}

pub struct OpenAiStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    stop: Option<mpsc::Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl OpenAiStub {
    pub fn spawn(config: OpenAiStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub");
        let base_url = format!("http://{}/v1", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (stop, stopped) = mpsc::channel::<()>();

        let log = Arc::clone(&requests);
        let worker = thread::spawn(move || {
            while stopped.try_recv().is_err() {
                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(request)) => request,
                    Ok(None) => continue,
                    Err(_) => return,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let is_responses =
                    request.method() == &tiny_http::Method::Post && request.url() == "/v1/responses";

                let (status, reply) = match serde_json::from_str::<Value>(&body) {
                    Ok(parsed) if is_responses => {
                        log.lock().expect("request log").push(parsed.clone());
                        route(&config, &parsed)
                    }
                    Ok(_) => (404, json!({ "error": { "message": "not found" } })),
                    Err(_) => (400, json!({ "error": { "message": "invalid json" } })),
                };

                let content_type =
                    tiny_http::Header::from_bytes("Content-Type", "application/json")
                        .expect("content type header");
                let response = tiny_http::Response::from_string(reply.to_string())
                    .with_status_code(status)
                    .with_header(content_type);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            stop: Some(stop),
            worker: Some(worker),
        }
    }

    /// Parsed bodies of every Responses request, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Drop for OpenAiStub {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn route(config: &OpenAiStubConfig, request: &Value) -> (u16, Value) {
    if let Some(status) = config.fail_status {
        return (status, json!({ "error": { "message": "stub failure" } }));
    }

    let structured = if carries_image(request) {
        &config.identify
    } else if request["input"]
        .as_str()
        .is_some_and(|input| input.contains("BEGIN_QUERY"))
    {
        &config.metadata
    } else {
        return (400, json!({ "error": { "message": "unexpected request" } }));
    };

    let text = structured.to_string();
    let model = request["model"].as_str().unwrap_or("stub-model");
    (
        200,
        json!({
            "id": "resp_stub",
            "object": "response",
            "model": model,
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "output_text", "text": text }]
            }]
        }),
    )
}

fn carries_image(request: &Value) -> bool {
    request["input"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|message| message["content"].as_array())
        .flatten()
        .any(|part| part["type"] == "input_image")
}
