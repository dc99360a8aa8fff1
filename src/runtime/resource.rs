use std::{
    fs::File,
    net::TcpStream,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::runtime::value::Value;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle snapshot: a process-unique id, a kind label, and optional
/// metadata captured when the snapshot was taken.
#[derive(Debug, Clone)]
pub struct Resource {
    id: u64,
    kind: String,
    metadata: Option<Vec<(String, Value)>>,
}

impl Resource {
    /// Creates a resource of the given kind without metadata.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed),
            kind: kind.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<(String, Value)>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Snapshot of an open file as a `stream` resource.
    pub fn from_file(file: &File, path: &Path, mode: &str) -> Self {
        let meta = file.metadata().ok();
        let is_regular = meta.as_ref().is_some_and(|m| m.is_file());
        let metadata = vec![
            ("timed_out".to_string(), Value::Bool(false)),
            ("blocked".to_string(), Value::Bool(true)),
            ("eof".to_string(), Value::Bool(false)),
            ("wrapper_type".to_string(), Value::string("plainfile")),
            ("stream_type".to_string(), Value::string("STDIO")),
            ("mode".to_string(), Value::string(mode)),
            ("unread_bytes".to_string(), Value::Int(0)),
            ("seekable".to_string(), Value::Bool(is_regular)),
            (
                "uri".to_string(),
                Value::string(&path.display().to_string()),
            ),
        ];
        Self::new("stream").with_metadata(metadata)
    }

    /// Snapshot of a connected TCP stream as a `socket` resource.
    pub fn from_tcp(stream: &TcpStream) -> Self {
        let addr = |a: std::io::Result<std::net::SocketAddr>| match a {
            Ok(addr) => Value::string(&addr.to_string()),
            Err(_) => Value::Null,
        };
        let metadata = vec![
            ("local_address".to_string(), addr(stream.local_addr())),
            ("peer_address".to_string(), addr(stream.peer_addr())),
            ("nodelay".to_string(), stream.nodelay().ok().into()),
            ("ttl".to_string(), stream.ttl().ok().map(i64::from).into()),
        ];
        Self::new("socket").with_metadata(metadata)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Identity label, `#<id>`.
    pub fn identity(&self) -> String {
        format!("#{}", self.id)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn metadata(&self) -> Option<&[(String, Value)]> {
        self.metadata.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Resource::new("stream");
        let b = Resource::new("stream");
        assert_ne!(a.id(), b.id());
        assert!(a.identity().starts_with('#'));
    }

    #[test]
    fn test_from_file_collects_stream_metadata() {
        let path = std::env::current_exe().expect("test binary path");
        let file = File::open(&path).expect("open test binary");
        let resource = Resource::from_file(&file, &path, "rb");
        assert_eq!(resource.kind(), "stream");
        let meta = resource.metadata().expect("stream metadata");
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys[0], "timed_out");
        assert!(keys.contains(&"uri"));
        assert!(matches!(meta[7].1, Value::Bool(true)));
    }

    #[test]
    fn test_from_tcp_collects_socket_metadata() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("listener address");
        let stream = TcpStream::connect(addr).expect("connect loopback");
        let resource = Resource::from_tcp(&stream);
        assert_eq!(resource.kind(), "socket");
        let meta = resource.metadata().expect("socket metadata");
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["local_address", "peer_address", "nodelay", "ttl"]);
        assert!(matches!(&meta[1].1, Value::Str(peer) if **peer == *addr.to_string().as_bytes()));
    }
}
