use super::{PktLine, PktLines};
use crate::config::{UPLOAD_PACK_REQUEST, UPLOAD_PACK_SERVICE};
use crate::hash::SHA1_HEX_SIZE;
use crate::{Error, Result, Sha1Hash};
use futures_util::StreamExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Response;

/// A ref advertised by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub hash: Sha1Hash,
}

#[derive(Debug, Clone)]
pub struct GitClient {
    http: reqwest::Client,
    url: String,
}

impl GitClient {
    pub fn new(url: &str) -> Self {
        Self::with_http(url, reqwest::Client::new())
    }

    pub fn with_http(url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch_references(&self) -> Result<Vec<Reference>> {
        let url = format!("{}/info/refs?service={UPLOAD_PACK_SERVICE}", self.url);
        tracing::debug!("GET {url}");

        let res = check_status(self.http.get(url).send().await?)?
            .bytes()
            .await?;

        parse_references(PktLines::from(res))
    }

    /// Requests a pack holding everything reachable from `reference`.
    pub async fn get_pack(&self, reference: &Reference) -> Result<Vec<u8>> {
        let url = format!("{}/{UPLOAD_PACK_SERVICE}", self.url);
        tracing::debug!("POST {url} want {}", reference.hash);

        let body = want_request(&reference.hash);

        let res = self
            .http
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static(UPLOAD_PACK_REQUEST))
            .body(body)
            .send()
            .await?;
        let mut stream = std::pin::pin!(check_status(res)?.bytes_stream());

        let mut lines = PktLines::default();
        let first = loop {
            if let Some(line) = lines.next_line()? {
                break line;
            }
            match stream.next().await {
                Some(chunk) => lines.append(&chunk?),
                None => {
                    return Err(Error::Protocol(
                        "response ended before the first pkt-line".into(),
                    ))
                }
            }
        };
        expect_nak(&first)?;

        let mut pack = lines.into_remaining();
        while let Some(chunk) = stream.next().await {
            pack.extend_from_slice(&chunk?);
        }

        tracing::debug!("received pack of {} bytes", pack.len());
        Ok(pack)
    }
}

/// `want <hash>`, flush, `done`: no capabilities, so the pack follows a bare NAK.
pub fn want_request(hash: &Sha1Hash) -> Vec<u8> {
    [
        PktLine::new(format!("want {hash}\n").into_bytes()),
        PktLine::flush(),
        PktLine::from("done\n"),
    ]
    .iter()
    .flat_map(PktLine::encode)
    .collect()
}

fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if !status.is_success() {
        return Err(Error::Protocol(format!(
            "{} answered with status {status}",
            res.url()
        )));
    }
    Ok(res)
}

fn expect_nak(line: &PktLine) -> Result<()> {
    match line.content() {
        Some(bytes) if bytes.starts_with(b"NAK") => Ok(()),
        _ => Err(Error::Protocol(format!(
            "first pkt-line must be NAK, got {line:?}"
        ))),
    }
}

/// Reads `<hash> <name>[\0capabilities]` lines, skipping comments and flushes.
pub fn parse_references(lines: PktLines) -> Result<Vec<Reference>> {
    let mut references = vec![];

    for line in lines {
        let line = line?;
        let Some(bytes) = line.content() else {
            continue;
        };
        if line.is_comment() {
            continue;
        }

        let hash = bytes
            .get(..SHA1_HEX_SIZE)
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .ok_or_else(|| Error::Protocol(format!("malformed ref line: {line:?}")))?
            .parse::<Sha1Hash>()
            .map_err(|err| Error::Protocol(format!("malformed ref hash: {err}")))?;

        if bytes.get(SHA1_HEX_SIZE) != Some(&b' ') {
            return Err(Error::Protocol(format!("ref line lacks a name: {line:?}")));
        }
        let name = bytes[(SHA1_HEX_SIZE + 1)..]
            .split(|&b| b == b'\0' || b.is_ascii_whitespace())
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::Protocol(format!("ref line lacks a name: {line:?}")))?;
        let name = String::from_utf8_lossy(name).to_string();

        references.push(Reference { name, hash });
    }

    Ok(references)
}
