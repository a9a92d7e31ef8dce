//! A primitive HTTP server standing in for the GraphQL endpoint.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

use url::Url;

/// A request received on the HTTP server.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// The response the HTTP server should send to the client.
pub struct Response {
    pub code: u32,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json(value: serde_json::Value) -> Response {
        Response {
            code: 200,
            body: value.to_string().into_bytes(),
        }
    }

    pub fn status(mut self, code: u32) -> Self {
        self.code = code;
        self
    }
}

pub type Handler = Box<dyn Send + Fn(&Request) -> Response>;

/// Every request the server has seen, in arrival order.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<Request>>>);

impl Events {
    pub fn requests(&self) -> Vec<Request> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, request: Request) {
        self.0.lock().unwrap().push(request);
    }
}

pub struct HttpServer {
    listener: TcpListener,
    handler: Handler,
    events: Events,
}

/// Shuts the server down when dropped.
pub struct HttpServerHandle {
    pub addr: SocketAddr,
    pub events: Events,
}

impl HttpServerHandle {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        if let Ok(mut stream) = TcpStream::connect(self.addr) {
            let _ = stream.write_all(b"STOP");
            let _ = stream.flush();
        }
    }
}

impl HttpServer {
    pub fn start<F: 'static + Send + Fn(&Request) -> Response>(handler: F) -> HttpServerHandle {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let events = Events::default();
        let server = HttpServer {
            listener,
            handler: Box::new(handler),
            events: events.clone(),
        };
        std::thread::spawn(move || server.serve());
        HttpServerHandle { addr, events }
    }

    fn serve(&self) {
        let mut line = String::new();
        'server: loop {
            let (socket, _) = self.listener.accept().unwrap();
            let mut buf = BufReader::new(socket);
            line.clear();
            if buf.read_line(&mut line).unwrap_or(0) == 0 {
                continue;
            }
            let mut parts = line.split_ascii_whitespace();
            let method = parts.next().unwrap_or_default().to_ascii_uppercase();
            if method.starts_with("STOP") {
                return;
            }
            let target = parts.next().unwrap_or("/").to_string();
            let url = Url::parse(&format!("http://localhost{target}")).unwrap();

            let mut headers = HashMap::new();
            let mut content_len = 0usize;
            loop {
                line.clear();
                if buf.read_line(&mut line).unwrap_or(0) == 0 {
                    continue 'server;
                }
                if line == "\r\n" {
                    break;
                }
                let Some((name, value)) = line.split_once(':') else {
                    continue;
                };
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                if name == "content-length" {
                    content_len = value.parse().unwrap();
                }
                headers.insert(name, value);
            }
            let mut body = vec![0u8; content_len];
            buf.read_exact(&mut body).unwrap();

            let request = Request {
                method,
                path: url.path().to_string(),
                headers,
                body,
            };
            let response = (self.handler)(&request);
            self.events.push(request);

            let stream = buf.get_mut();
            write!(stream, "HTTP/1.1 {}\r\n", response.code).unwrap();
            write!(stream, "Content-Type: application/json\r\n").unwrap();
            write!(stream, "Content-Length: {}\r\n", response.body.len()).unwrap();
            write!(stream, "Connection: close\r\n\r\n").unwrap();
            stream.write_all(&response.body).unwrap();
            stream.flush().unwrap();
        }
    }
}
