//! Minimal HTTP/1.1 object server that answers HEAD for integration tests.
//!
//! Objects are addressed path-style (`/{bucket}/{key}`). Known objects get
//! `200` with `Content-Length` and, if set, `x-amz-server-side-encryption`;
//! unknown paths get `404`. An object can be told to answer `503` for its
//! first N requests to exercise retries.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct TestObject {
    pub size: u64,
    pub sse: Option<String>,
    /// Number of initial requests answered with 503.
    pub fail_first: usize,
}

impl TestObject {
    pub fn sized(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn encrypted(size: u64, sse: &str) -> Self {
        Self {
            size,
            sse: Some(sse.to_string()),
            fail_first: 0,
        }
    }

    pub fn flaky(size: u64, fail_first: usize) -> Self {
        Self {
            size,
            sse: None,
            fail_first,
        }
    }
}

struct State {
    objects: HashMap<String, TestObject>,
    hits: Mutex<HashMap<String, usize>>,
    requests: AtomicUsize,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct HeadServer {
    pub endpoint: String,
    state: Arc<State>,
}

impl HeadServer {
    /// Total requests served so far.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Requests seen for `path` (`bucket/key`, as sent on the wire).
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

/// Serve `objects`, keyed by `bucket/key` path (without the leading slash).
pub fn start<I, P>(objects: I) -> HeadServer
where
    I: IntoIterator<Item = (P, TestObject)>,
    P: Into<String>,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(State {
        objects: objects.into_iter().map(|(p, o)| (p.into(), o)).collect(),
        hits: Mutex::new(HashMap::new()),
        requests: AtomicUsize::new(0),
    });
    let server_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&server_state);
            thread::spawn(move || handle(stream, &state));
        }
    });
    HeadServer {
        endpoint: format!("http://127.0.0.1:{}", port),
        state,
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path) = parse_request_line(request);
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    let path = path.trim_start_matches('/').to_string();
    let seen = {
        let mut hits = state.hits.lock().unwrap();
        let n = hits.entry(path.clone()).or_insert(0);
        *n += 1;
        *n
    };
    let response = match state.objects.get(&path) {
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
        Some(obj) if seen <= obj.fail_first => {
            "HTTP/1.1 503 Slow Down\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
        }
        Some(obj) => {
            let sse = obj
                .sse
                .as_deref()
                .map(|v| format!("x-amz-server-side-encryption: {}\r\n", v))
                .unwrap_or_default();
            format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
                obj.size, sse
            )
        }
    };
    let _ = stream.write_all(response.as_bytes());
}

/// Returns (method, path) from the request line.
fn parse_request_line(request: &str) -> (&str, &str) {
    let line = request.lines().next().unwrap_or("");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    (method, path)
}
