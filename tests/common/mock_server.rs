//! In-memory memcached emulation for tests.
//!
//! Speaks enough of the text protocol to exercise the client: storage,
//! retrieval with CAS tokens, arithmetic, delete, touch, flush, version and
//! stats. General and slab stats are split across two rounds per connection
//! so the client has to accumulate them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use memwire::Config;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    flags: u32,
    cas: u64,
}

#[derive(Default)]
struct Shared {
    items: Mutex<HashMap<String, Entry>>,
    next_cas: AtomicU64,
    accepted: AtomicUsize,
}

pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockServer {
    pub fn start() -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let shared = Arc::new(Shared::default());

        let accept_shared = Arc::clone(&shared);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                accept_shared.accepted.fetch_add(1, Ordering::SeqCst);
                let shared = Arc::clone(&accept_shared);
                thread::spawn(move || serve(stream, shared));
            }
        });

        MockServer { addr, shared }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.shared.accepted.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> Config {
        Config::builder()
            .host("127.0.0.1")
            .port(self.port())
            .connect_timeout(Duration::from_secs(2))
            .read_timeout(Duration::from_secs(5))
            .build()
    }

    /// Raw stored payload and flags
    pub fn raw(&self, key: &str) -> Option<(Vec<u8>, u32)> {
        let items = self.shared.items.lock().unwrap();
        items.get(key).map(|entry| (entry.data.clone(), entry.flags))
    }
}

fn serve(stream: TcpStream, shared: Arc<Shared>) {
    let mut writer = stream.try_clone().expect("clone");
    let mut reader = BufReader::new(stream);
    let mut stats_rounds: HashMap<String, usize> = HashMap::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let text = String::from_utf8_lossy(&line).trim_end().to_string();
        let tokens: Vec<&str> = text.split(' ').filter(|t| !t.is_empty()).collect();
        let Some(&command) = tokens.first() else {
            continue;
        };

        let reply = match command {
            "set" | "add" | "replace" | "append" | "prepend" | "cas" => {
                let Some(length) = tokens.get(4).and_then(|t| t.parse::<usize>().ok()) else {
                    let _ = writer.write_all(b"CLIENT_ERROR bad command line format\r\n");
                    continue;
                };
                let mut data = vec![0u8; length + 2];
                if reader.read_exact(&mut data).is_err() {
                    return;
                }
                data.truncate(length);
                store(&shared, &tokens, data)
            }
            "get" | "gets" => retrieve(&shared, &tokens[1..], command == "gets"),
            "delete" => {
                let removed = shared.items.lock().unwrap().remove(tokens[1]).is_some();
                status(removed, "DELETED")
            }
            "touch" => {
                let found = shared.items.lock().unwrap().contains_key(tokens[1]);
                status(found, "TOUCHED")
            }
            "incr" | "decr" => arithmetic(&shared, &tokens, command == "incr"),
            "flush_all" => {
                shared.items.lock().unwrap().clear();
                b"OK\r\n".to_vec()
            }
            "version" => b"VERSION 1.6.21-mock\r\n".to_vec(),
            "stats" => {
                let kind = tokens.get(1).copied().unwrap_or("general").to_string();
                let round = stats_rounds.entry(kind.clone()).or_insert(0);
                let reply = stats(&shared, &kind, *round);
                *round += 1;
                reply
            }
            _ => b"ERROR\r\n".to_vec(),
        };

        if writer.write_all(&reply).is_err() {
            return;
        }
    }
}

fn status(found: bool, success: &str) -> Vec<u8> {
    if found {
        format!("{}\r\n", success).into_bytes()
    } else {
        b"NOT_FOUND\r\n".to_vec()
    }
}

fn store(shared: &Shared, tokens: &[&str], data: Vec<u8>) -> Vec<u8> {
    let key = tokens[1].to_string();
    let flags: u32 = tokens[2].parse().unwrap_or(0);
    let cas = shared.next_cas.fetch_add(1, Ordering::SeqCst) + 1;
    let mut items = shared.items.lock().unwrap();
    let existing = items.get(&key).cloned();

    let entry = match (tokens[0], existing) {
        ("set", _) => Entry { data, flags, cas },
        ("add", None) => Entry { data, flags, cas },
        ("add", Some(_)) => return b"NOT_STORED\r\n".to_vec(),
        ("replace", Some(_)) => Entry { data, flags, cas },
        ("append", Some(old)) => Entry {
            data: [old.data, data].concat(),
            flags: old.flags,
            cas,
        },
        ("prepend", Some(old)) => Entry {
            data: [data, old.data].concat(),
            flags: old.flags,
            cas,
        },
        ("cas", None) => return b"NOT_FOUND\r\n".to_vec(),
        ("cas", Some(old)) => {
            let token: u64 = tokens.get(5).and_then(|t| t.parse().ok()).unwrap_or(0);
            if token != old.cas {
                return b"EXISTS\r\n".to_vec();
            }
            Entry { data, flags, cas }
        }
        _ => return b"NOT_STORED\r\n".to_vec(),
    };

    items.insert(key, entry);
    b"STORED\r\n".to_vec()
}

fn retrieve(shared: &Shared, keys: &[&str], with_cas: bool) -> Vec<u8> {
    let items = shared.items.lock().unwrap();
    let mut reply = Vec::new();
    for key in keys {
        let Some(entry) = items.get(*key) else {
            continue;
        };
        let header = if with_cas {
            format!("VALUE {} {} {} {}\r\n", key, entry.flags, entry.data.len(), entry.cas)
        } else {
            format!("VALUE {} {} {}\r\n", key, entry.flags, entry.data.len())
        };
        reply.extend_from_slice(header.as_bytes());
        reply.extend_from_slice(&entry.data);
        reply.extend_from_slice(b"\r\n");
    }
    reply.extend_from_slice(b"END\r\n");
    reply
}

fn arithmetic(shared: &Shared, tokens: &[&str], increment: bool) -> Vec<u8> {
    let Some(delta) = tokens.get(2).and_then(|t| t.parse::<u64>().ok()) else {
        return b"CLIENT_ERROR invalid numeric delta argument\r\n".to_vec();
    };
    let mut items = shared.items.lock().unwrap();
    let Some(entry) = items.get_mut(tokens[1]) else {
        return b"NOT_FOUND\r\n".to_vec();
    };
    let Some(current) = std::str::from_utf8(&entry.data)
        .ok()
        .and_then(|text| text.trim().parse::<u64>().ok())
    else {
        return b"CLIENT_ERROR cannot increment or decrement non-numeric value\r\n".to_vec();
    };

    let updated = if increment {
        current.wrapping_add(delta)
    } else {
        current.saturating_sub(delta)
    };
    entry.data = updated.to_string().into_bytes();
    entry.cas = shared.next_cas.fetch_add(1, Ordering::SeqCst) + 1;
    format!("{}\r\n", updated).into_bytes()
}

fn stats(shared: &Shared, kind: &str, round: usize) -> Vec<u8> {
    if kind == "cachedump" {
        return cachedump(shared);
    }
    let items = shared.items.lock().unwrap().len();
    let lines: Vec<String> = match (kind, round) {
        ("general", 0) => vec!["pid 4242".into(), "uptime 17".into()],
        ("general", _) => vec![format!("curr_items {}", items), "evictions 0".into()],
        ("slabs", 0) => vec!["1:chunk_size 96".into(), "1:used_chunks 1".into()],
        ("slabs", _) => vec![
            "1:total_pages 1".into(),
            "active_slabs 1".into(),
            "total_malloced 1048576".into(),
        ],
        ("items", _) => vec![
            format!("items:1:number {}", items),
            "items:1:age 5".into(),
        ],
        ("settings", _) => vec!["maxconns 1024".into(), "evictions on".into()],
        ("reset", _) => return b"RESET\r\n".to_vec(),
        _ => return b"ERROR\r\n".to_vec(),
    };

    let mut reply = String::new();
    for line in lines {
        reply.push_str("STAT ");
        reply.push_str(&line);
        reply.push_str("\r\n");
    }
    reply.push_str("END\r\n");
    reply.into_bytes()
}

fn cachedump(shared: &Shared) -> Vec<u8> {
    let items = shared.items.lock().unwrap();
    let mut reply = String::new();
    for (key, entry) in items.iter() {
        reply.push_str(&format!("ITEM {} [{} b; 0 s]\r\n", key, entry.data.len()));
    }
    reply.push_str("END\r\n");
    reply.into_bytes()
}
