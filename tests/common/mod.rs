//! In-process HTTP stub standing in for the OpenRouter endpoint

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TEST_KEY: &str = "sk-or-test";

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// One request as seen by the stub
#[derive(Debug, Clone)]
pub struct CapturedRequest
{   pub head: String
  , pub body: String
}

impl CapturedRequest
{   pub fn header(&self, name: &str) -> Option<String>
    {   self.head
          .lines()
          .skip(1)
          .filter_map(|line| line.split_once(':'))
          .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
          .map(|(_, value)| value.trim().to_string())
    }

    pub fn json(&self) -> serde_json::Value
    {   serde_json::from_str(&self.body).unwrap()
    }

    pub fn request_line(&self) -> &str
    {   self.head.lines().next().unwrap_or("")
    }
}

pub struct StubServer
{   pub addr: SocketAddr
  , hits: Arc<AtomicUsize>
  , requests: Arc<Mutex<Vec<CapturedRequest>>>
}

impl StubServer
{   /// Answer every request with `status` and `body`
    pub async fn start(status: u16, body: String) -> Self
    {   Self::spawn(Some((status, body))).await
    }

    /// Accept connections and never answer
    pub async fn hanging() -> Self
    {   Self::spawn(None).await
    }

    /// 200 with a well-formed completion envelope
    pub async fn completion(
      content: &str
    , prompt_tokens: u64
    , completion_tokens: u64
    ) -> Self
    {   Self::start(
          200,
          completion_body(content, prompt_tokens, completion_tokens)
        ).await
    }

    async fn spawn(reply: Option<(u16, String)>) -> Self
    {   let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
          .await
          .expect("bind stub listener");
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let task_hits = Arc::clone(&hits);
        let task_requests = Arc::clone(&requests);
        tokio::spawn(async move {
          loop
          {   let (stream, _) = match listener.accept().await
              {   Ok(conn) => conn
                , Err(_) => break
              };
              let hits = Arc::clone(&task_hits);
              let requests = Arc::clone(&task_requests);
              let reply = reply.clone();
              tokio::spawn(async move {
                serve(stream, reply, hits, requests).await;
              });
          }
        });

        StubServer
        {   addr
          , hits
          , requests
        }
    }

    pub fn base_url(&self) -> String
    {   format!("http://{}/api/v1", self.addr)
    }

    pub fn hits(&self) -> usize
    {   self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest>
    {   self.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> agentmedia::ClientConfig
    {   agentmedia::ClientConfig::new(TEST_KEY)
          .with_api_base(self.base_url())
          .with_app_url("https://app.example.test")
    }

    pub fn client(&self) -> agentmedia::OpenRouterClient
    {   agentmedia::OpenRouterClient::new(self.config()).unwrap()
    }
}

async fn serve(
  mut stream: TcpStream
, reply: Option<(u16, String)>
, hits: Arc<AtomicUsize>
, requests: Arc<Mutex<Vec<CapturedRequest>>>
)
{   let request = match read_request(&mut stream).await
    {   Some(request) => request
      , None => return
    };
    requests.lock().unwrap().push(request);
    hits.fetch_add(1, Ordering::SeqCst);

    match reply
    {   Some((status, body)) => {
          let response = format!(
            "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{}",
            status, reason(status), body.len(), body
          );
          let _ = stream.write_all(response.as_bytes()).await;
          let _ = stream.shutdown().await;
        }
      , None => {
          tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest>
{   let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop
    {   if let Some(pos) = find(&buf, b"\r\n\r\n")
        {   break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0
        {   return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let body_start = head_end + 4;
    let length = content_length(&head);

    while buf.len() < body_start + length
    {   let n = stream.read(&mut chunk).await.ok()?;
        if n == 0
        {   break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = (body_start + length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[body_start..body_end]).to_string();
    Some(CapturedRequest { head, body })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize>
{   haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(head: &str) -> usize
{   head.lines()
      .filter_map(|line| line.split_once(':'))
      .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
      .and_then(|(_, value)| value.trim().parse().ok())
      .unwrap_or(0)
}

fn reason(status: u16) -> &'static str
{   match status
    {   200 => "OK"
      , 400 => "Bad Request"
      , 401 => "Unauthorized"
      , 429 => "Too Many Requests"
      , 500 => "Internal Server Error"
      , 502 => "Bad Gateway"
      , 503 => "Service Unavailable"
      , _ => "Unknown"
    }
}

/// OpenRouter-shaped success body
pub fn completion_body(
  content: &str
, prompt_tokens: u64
, completion_tokens: u64
) -> String
{   json!({
      "id": "gen-test",
      "choices": [{
        "index": 0,
        "message": { "role": "assistant", "content": content },
        "finish_reason": "stop"
      }],
      "usage": {
        "prompt_tokens": prompt_tokens,
        "completion_tokens": completion_tokens,
        "total_tokens": prompt_tokens + completion_tokens
      }
    }).to_string()
}

/// Wrap a JSON value the way models usually do
pub fn fenced(value: &serde_json::Value) -> String
{   format!("Voici le résultat:\n```json\n{}\n```", value)
}
