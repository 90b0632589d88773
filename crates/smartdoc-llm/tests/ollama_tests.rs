use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use smartdoc_core::traits::Generator;
use smartdoc_core::types::{DocumentChunk, RetrievedChunk};
use smartdoc_llm::{AnswerSynthesizer, OllamaGenerator};

/// Serve `responses` one connection at a time, reporting each request line and body.
fn mock_ollama(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
            }
            let mut req_body = vec![0u8; content_length];
            reader.read_exact(&mut req_body).unwrap();
            tx.send((request_line.trim().to_string(), String::from_utf8(req_body).unwrap())).unwrap();

            let reason = if status == 200 { "OK" } else { "Error" };
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
        }
    });
    (format!("http://{addr}"), rx)
}

fn passage(content: &str) -> RetrievedChunk {
    RetrievedChunk {
        chunk: DocumentChunk {
            id: "d:0".into(),
            doc_id: "d".into(),
            source: "manual.pdf".into(),
            page: 4,
            content: content.into(),
            chunk_index: 0,
            total_chunks: 1,
        },
        score: 0.9,
    }
}

#[test]
fn generate_posts_non_streaming_request_and_returns_response() {
    let (url, rx) = mock_ollama(vec![(200, r#"{"model":"deepseek-r1","response":"X is 42.","done":true}"#.into())]);
    let gen = OllamaGenerator::new(&url, "deepseek-r1", Duration::from_secs(5)).unwrap();

    let answer = gen.generate("What is X?").unwrap();
    assert_eq!(answer, "X is 42.");

    let (line, body) = rx.recv().unwrap();
    assert!(line.starts_with("POST /api/generate"), "{line}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["model"], "deepseek-r1");
    assert_eq!(json["prompt"], "What is X?");
    assert_eq!(json["stream"], false);
}

#[test]
fn error_status_is_reported_with_body() {
    let (url, _rx) = mock_ollama(vec![(404, r#"{"error":"model 'nope' not found"}"#.into())]);
    let gen = OllamaGenerator::new(&url, "nope", Duration::from_secs(5)).unwrap();
    let err = gen.generate("hi").unwrap_err().to_string();
    assert!(err.contains("404"), "{err}");
    assert!(err.contains("not found"), "{err}");
}

#[test]
fn unreachable_runtime_is_an_error() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let gen = OllamaGenerator::new(&format!("http://127.0.0.1:{port}"), "deepseek-r1", Duration::from_secs(2)).unwrap();
    assert!(gen.generate("hi").is_err());
    assert!(!gen.health_check());
}

#[test]
fn model_listing_matches_untagged_name() {
    let tags = r#"{"models":[{"name":"llama3:8b"},{"name":"deepseek-r1:latest"}]}"#;
    let (url, rx) = mock_ollama(vec![(200, tags.into())]);
    let gen = OllamaGenerator::new(&format!("{url}/"), "deepseek-r1", Duration::from_secs(5)).unwrap();
    assert!(gen.has_model().unwrap());
    let (line, _) = rx.recv().unwrap();
    assert!(line.starts_with("GET /api/tags"), "{line}");
}

#[test]
fn synthesizer_sends_rendered_prompt_and_trims_answer() {
    let (url, rx) = mock_ollama(vec![(200, r#"{"response":"\n The pump runs at 3 bar. \n"}"#.into())]);
    let gen = OllamaGenerator::new(&url, "deepseek-r1", Duration::from_secs(5)).unwrap();
    let synth = AnswerSynthesizer::new(Arc::new(gen));

    let answer = synth.synthesize("How hard does the pump push?", &[passage("The pump runs at 3 bar.")]).unwrap();
    assert_eq!(answer, "The pump runs at 3 bar.");

    let (_, body) = rx.recv().unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let prompt = json["prompt"].as_str().unwrap();
    assert!(prompt.contains("Content: The pump runs at 3 bar.\nSource: manual.pdf, page 4"));
    assert!(prompt.contains("Question: How hard does the pump push?"));
}

struct Failing(AtomicUsize);

impl Generator for Failing {
    fn model_id(&self) -> &str {
        "failing"
    }
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("connection refused")
    }
}

#[test]
fn synthesizer_names_the_model_on_failure() {
    let gen = Arc::new(Failing(AtomicUsize::new(0)));
    let synth = AnswerSynthesizer::new(gen.clone());
    let err = synth.synthesize("q", &[passage("c")]).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("model 'failing' failed"), "{msg}");
    assert!(msg.contains("connection refused"), "{msg}");
    assert_eq!(gen.0.load(Ordering::SeqCst), 1);
}
