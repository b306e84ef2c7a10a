#![allow(dead_code)]

use flate2::{write::ZlibEncoder, Compression};
use git_clone_rs::git_object::{
    hash_raw, AuthorSignature, Commit, Object, ObjectType, Tree, TreeEntry, TreeEntryMode,
};
use git_clone_rs::Sha1Hash;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const BASE: &[u8] = b"hello world\n";
pub const TARGET: &[u8] = b"hello rust world\n";

// copy(0,6) insert("rust ") copy(6,6)
pub const DELTA: &[u8] = &[12, 17, 0x90, 6, 5, b'r', b'u', b's', b't', b' ', 0x91, 6, 6];

pub enum Raw<'a> {
    Whole(u8, &'a [u8]),
    RefDelta(Sha1Hash, &'a [u8]),
}

fn compress(data: &[u8]) -> Vec<u8> {
    let mut e = ZlibEncoder::new(vec![], Compression::default());
    e.write_all(data).unwrap();
    e.finish().unwrap()
}

fn object_header(type_code: u8, mut size: usize) -> Vec<u8> {
    let mut byte = (type_code << 4) | (size as u8 & 0x0f);
    size >>= 4;
    let mut header = vec![];
    while size > 0 {
        header.push(byte | 0x80);
        byte = size as u8 & 0x7f;
        size >>= 7;
    }
    header.push(byte);
    header
}

pub fn build_pack(entries: &[Raw]) -> Vec<u8> {
    let mut pack = b"PACK".to_vec();
    pack.extend_from_slice(&2u32.to_be_bytes());
    pack.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for entry in entries {
        match entry {
            Raw::Whole(code, data) => {
                pack.extend(object_header(*code, data.len()));
                pack.extend(compress(data));
            }
            Raw::RefDelta(base, payload) => {
                pack.extend(object_header(7, payload.len()));
                pack.extend_from_slice(base.as_bytes());
                pack.extend(compress(payload));
            }
        }
    }
    let checksum = Sha1Hash::digest([&pack[..]]);
    pack.extend_from_slice(checksum.as_bytes());
    pack
}

pub struct Fixture {
    pub pack: Vec<u8>,
    pub commit: Sha1Hash,
}

/// A commit whose root tree holds `a.txt`, a deltified `b.txt` and `docs/c.md`.
pub fn fixture() -> Fixture {
    let base = hash_raw(ObjectType::Blob, BASE);
    let target = hash_raw(ObjectType::Blob, TARGET);

    let docs = Tree::new(vec![TreeEntry::new(
        TreeEntryMode::regular_file(0o644),
        "c.md",
        base,
    )]);
    let docs_hash = hash_raw(ObjectType::Tree, &docs.encode());

    let root = Tree::new(vec![
        TreeEntry::new(TreeEntryMode::regular_file(0o644), "b.txt", target),
        TreeEntry::new(TreeEntryMode::directory(), "docs", docs_hash),
        TreeEntry::new(TreeEntryMode::regular_file(0o644), "a.txt", base),
    ]);
    let root_hash = hash_raw(ObjectType::Tree, &root.encode());

    let signature = AuthorSignature::new("Test User", "test@example.com", 1703490120, 60);
    let commit = Commit::new(root_hash, None, signature.clone(), signature, "Initial commit\n");
    let commit_bytes = commit.encode();

    let docs_bytes = docs.encode();
    let root_bytes = root.encode();
    let pack = build_pack(&[
        Raw::Whole(1, &commit_bytes),
        Raw::Whole(2, &root_bytes),
        Raw::RefDelta(base, DELTA),
        Raw::Whole(2, &docs_bytes),
        Raw::Whole(3, BASE),
    ]);

    Fixture {
        pack,
        commit: hash_raw(ObjectType::Commit, &commit_bytes),
    }
}

/// Canned answer for requests whose target ends with `path`.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    /// Written one at a time with a pause in between.
    pub chunks: Vec<Vec<u8>>,
}

impl Route {
    pub fn ok(method: &'static str, path: &'static str, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            method,
            path,
            status: 200,
            chunks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Minimal HTTP/1.1 server on a random local port.
pub struct Server {
    pub url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl Server {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(vec![]));
        let routes = Arc::new(routes);

        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move { handle(socket, &routes, &log).await });
            }
        });

        Self {
            url: format!("http://{addr}/repo.git"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_more(socket: &mut TcpStream, buf: &mut Vec<u8>) -> bool {
    let mut chunk = [0u8; 4096];
    let n = socket.read(&mut chunk).await.unwrap();
    buf.extend_from_slice(&chunk[..n]);
    n > 0
}

async fn handle(mut socket: TcpStream, routes: &[Route], log: &Mutex<Vec<Request>>) {
    let mut buf = vec![];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if !read_more(&mut socket, &mut buf).await {
            return;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap().split(' ');
    let method = request_line.next().unwrap().to_string();
    let target = request_line.next().unwrap().to_string();

    let mut content_length = 0;
    let mut content_type = None;
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            match key.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap(),
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    while buf.len() < header_end + content_length {
        if !read_more(&mut socket, &mut buf).await {
            return;
        }
    }
    let body = buf[header_end..header_end + content_length].to_vec();

    let route = routes
        .iter()
        .find(|route| route.method == method && target.ends_with(route.path))
        .cloned();
    log.lock().unwrap().push(Request {
        method,
        target,
        content_type,
        body,
    });

    let (status, chunks) = match route {
        Some(route) => (route.status, route.chunks),
        None => (404, vec![]),
    };
    let len: usize = chunks.iter().map(Vec::len).sum();
    let head = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n"
    );
    socket.write_all(head.as_bytes()).await.unwrap();
    for chunk in chunks {
        socket.write_all(&chunk).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let _ = socket.shutdown().await;
}
