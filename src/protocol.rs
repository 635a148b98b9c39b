use std::collections::HashMap;

use crate::error::{GitError, Result};
use crate::pkt_line::{encode_line, PktLine, PktLineReader, DELIM_PKT, FLUSH_PKT};

const SERVICE: &str = "git-upload-pack";

/// Capability declarations parsed off the first ref line of a discovery
/// response. `symref_head` carries the remote's advertised default branch
/// (`symref=HEAD:refs/heads/<name>`), used by `clone` instead of always
/// assuming `main`.
#[derive(Debug, Default, Clone)]
pub struct Capabilities {
    pub symref_head: Option<String>,
    pub flags: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Discovery {
    pub capabilities: Capabilities,
    pub refs: Vec<(String, String)>,
}

impl Discovery {
    pub fn default_branch(&self) -> &str {
        self.capabilities.symref_head.as_deref().unwrap_or("refs/heads/main")
    }

    pub fn sha_for(&self, ref_name: &str) -> Option<&str> {
        self.refs.iter().find(|(_, name)| name == ref_name).map(|(sha, _)| sha.as_str())
    }
}

fn parse_capabilities(caps: &str) -> Capabilities {
    let mut parsed = Capabilities::default();
    for token in caps.split(' ') {
        if token.is_empty() {
            continue;
        }
        if let Some(target) = token.strip_prefix("symref=HEAD:") {
            parsed.symref_head = Some(target.to_string());
        } else if let Some((key, value)) = token.split_once('=') {
            parsed.flags.insert(key.to_string(), value.to_string());
        } else {
            parsed.flags.insert(token.to_string(), String::new());
        }
    }
    parsed
}

/// Performs the Smart-HTTP v0 ref advertisement GET and parses the
/// pkt-line response: a service banner, a flush, then one ref-per-line
/// (the first ref line also carrying the `\0`-separated capability list)
/// terminated by a final flush.
pub fn discover(client: &reqwest::blocking::Client, url: &str) -> Result<Discovery> {
    let full_url = format!("{url}/info/refs?service={SERVICE}");
    let response = client.get(&full_url).send()?;

    if !response.status().is_success() {
        return Err(GitError::TransportError(response.error_for_status().unwrap_err()));
    }

    let body = response.bytes()?;
    let mut reader = PktLineReader::new(&body);

    match reader.next()? {
        Some(PktLine::Data(banner)) => {
            let banner = std::str::from_utf8(banner).unwrap_or_default().trim();
            if banner != format!("# service={SERVICE}") {
                return Err(GitError::ProtocolError(format!("unexpected service banner '{banner}'")));
            }
        }
        other => return Err(GitError::ProtocolError(format!("expected service banner, got {other:?}"))),
    }

    // Some servers emit a flush right after the banner line.
    if matches!(reader.remaining().get(..4), Some(b"0000")) {
        reader.next()?;
    }

    let mut refs = Vec::new();
    let mut capabilities = Capabilities::default();
    let mut first_ref = true;

    loop {
        match reader.next()? {
            Some(PktLine::Flush) | None => break,
            Some(PktLine::Delim) => continue,
            Some(PktLine::Data(line)) => {
                let line = std::str::from_utf8(line)
                    .map_err(|_| GitError::ProtocolError("non-UTF-8 ref line".into()))?
                    .trim_end_matches('\n');

                let (sha_and_name, caps) = match line.split_once('\0') {
                    Some((left, caps)) => (left, Some(caps)),
                    None => (line, None),
                };

                let (sha, ref_name) = sha_and_name
                    .split_once(' ')
                    .ok_or_else(|| GitError::ProtocolError(format!("malformed ref line '{line}'")))?;

                if first_ref {
                    if let Some(caps) = caps {
                        capabilities = parse_capabilities(caps);
                    }
                    first_ref = false;
                }

                refs.push((sha.to_string(), ref_name.to_string()));
            }
        }
    }

    Ok(Discovery { capabilities, refs })
}

/// Performs the protocol-v2 `command=fetch` exchange and returns the raw
/// pack bytes (still including the `PACK` header/trailer), after
/// demultiplexing the sideband: channel 1 is pack data, channel 2 is
/// progress (logged), channel 3 is an error.
pub fn fetch(client: &reqwest::blocking::Client, url: &str, want_sha: &str) -> Result<Vec<u8>> {
    let full_url = format!("{url}/{SERVICE}");

    let mut body = Vec::new();
    body.extend_from_slice(&encode_line(b"command=fetch\n"));
    body.extend_from_slice(DELIM_PKT);
    body.extend_from_slice(&encode_line(b"no-progress\n"));
    body.extend_from_slice(&encode_line(format!("want {want_sha}\n").as_bytes()));
    body.extend_from_slice(&encode_line(b"done\n"));
    body.extend_from_slice(FLUSH_PKT);

    let response = client
        .post(&full_url)
        .header("Content-Type", "application/x-git-upload-pack-request")
        .header("Git-Protocol", "version=2")
        .body(body)
        .send()?;

    if !response.status().is_success() {
        return Err(GitError::TransportError(response.error_for_status().unwrap_err()));
    }

    let response_body = response.bytes()?;
    let mut reader = PktLineReader::new(&response_body);

    match reader.next()? {
        Some(PktLine::Data(line)) if line == b"packfile\n" => {}
        other => return Err(GitError::ProtocolError(format!("expected 'packfile' section header, got {other:?}"))),
    }

    let mut pack = Vec::new();
    loop {
        match reader.next()? {
            Some(PktLine::Flush) | None => break,
            Some(PktLine::Delim) => continue,
            Some(PktLine::Data(line)) => {
                let (&channel, rest) = line
                    .split_first()
                    .ok_or_else(|| GitError::ProtocolError("empty sideband pkt-line".into()))?;
                match channel {
                    1 => pack.extend_from_slice(rest),
                    2 => log::info!("remote: {}", String::from_utf8_lossy(rest).trim_end()),
                    3 => {
                        return Err(GitError::RemoteError(
                            String::from_utf8_lossy(rest).trim_end().to_string(),
                        ))
                    }
                    other => {
                        return Err(GitError::ProtocolError(format!("unknown sideband channel {other}")))
                    }
                }
            }
        }
    }

    Ok(pack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symref_and_flags() {
        let caps = parse_capabilities(
            "multi_ack thin-pack symref=HEAD:refs/heads/trunk agent=git/2.40.0",
        );
        assert_eq!(caps.symref_head.as_deref(), Some("refs/heads/trunk"));
        assert!(caps.flags.contains_key("multi_ack"));
        assert_eq!(caps.flags.get("agent").map(String::as_str), Some("git/2.40.0"));
    }

    #[test]
    fn default_branch_falls_back_to_main() {
        let discovery = Discovery { capabilities: Capabilities::default(), refs: vec![] };
        assert_eq!(discovery.default_branch(), "refs/heads/main");
    }

    #[test]
    fn sha_for_looks_up_by_ref_name() {
        let discovery = Discovery {
            capabilities: Capabilities::default(),
            refs: vec![("abc123".to_string(), "refs/heads/main".to_string())],
        };
        assert_eq!(discovery.sha_for("refs/heads/main"), Some("abc123"));
        assert_eq!(discovery.sha_for("refs/heads/other"), None);
    }
}
