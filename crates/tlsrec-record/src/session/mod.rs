//! In-memory session cache for resumption.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use lru::LruCache;
use tlsrec_types::ProtocolVersion;
use zeroize::Zeroize;

/// Default number of cached sessions.
pub const DEFAULT_CAPACITY: usize = 20_480;

/// Default session lifetime.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A resumable session.
#[derive(Clone)]
pub struct CachedSession {
    /// Session identifier.
    pub id: Vec<u8>,
    /// Peer host name; empty when unknown.
    pub peer_host: String,
    pub peer_port: u16,
    pub protocol_version: ProtocolVersion,
    /// The negotiated cipher suite.
    pub cipher_suite: u16,
    pub master_secret: Vec<u8>,
    pub creation_time: SystemTime,
    pub last_access_time: SystemTime,
}

impl CachedSession {
    pub fn new(
        id: &[u8],
        protocol_version: ProtocolVersion,
        cipher_suite: u16,
        master_secret: &[u8],
    ) -> Self {
        let now = SystemTime::now();
        Self {
            id: id.to_vec(),
            peer_host: String::new(),
            peer_port: 0,
            protocol_version,
            cipher_suite,
            master_secret: master_secret.to_vec(),
            creation_time: now,
            last_access_time: now,
        }
    }

    pub fn with_peer(mut self, host: &str, port: u16) -> Self {
        self.peer_host = host.to_string();
        self.peer_port = port;
        self
    }

    fn peer_key(&self) -> Option<(String, u16)> {
        if self.peer_host.is_empty() {
            None
        } else {
            Some((self.peer_host.clone(), self.peer_port))
        }
    }
}

impl fmt::Debug for CachedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSession")
            .field("id", &self.id)
            .field("peer_host", &self.peer_host)
            .field("peer_port", &self.peer_port)
            .field("protocol_version", &self.protocol_version)
            .field("cipher_suite", &format_args!("0x{:04X}", self.cipher_suite))
            .field("master_secret", &"<redacted>")
            .finish()
    }
}

impl Drop for CachedSession {
    fn drop(&mut self) {
        self.master_secret.zeroize();
    }
}

#[derive(Debug)]
struct Slot {
    session: CachedSession,
    inserted: Instant,
}

struct Inner {
    entries: LruCache<Vec<u8>, Slot>,
    by_peer: HashMap<(String, u16), Vec<u8>>,
    /// 0 means unbounded.
    capacity: usize,
    /// Zero means sessions never expire.
    timeout: Duration,
}

impl Inner {
    fn is_expired(&self, slot: &Slot, now: Instant) -> bool {
        !self.timeout.is_zero() && now.saturating_duration_since(slot.inserted) > self.timeout
    }

    fn unindex(&mut self, session: &CachedSession) {
        if let Some(key) = session.peer_key() {
            if self.by_peer.get(&key) == Some(&session.id) {
                self.by_peer.remove(&key);
            }
        }
    }

    fn remove(&mut self, id: &Vec<u8>) -> Option<CachedSession> {
        let slot = self.entries.pop(id)?;
        self.unindex(&slot.session);
        Some(slot.session)
    }

    /// Drop one entry: the expired one nearest the least-recently-used end
    /// if any, otherwise the least recently used.
    fn evict(&mut self, now: Instant) {
        let expired = self
            .entries
            .iter()
            .rev()
            .find(|(_, slot)| self.is_expired(slot, now))
            .map(|(id, _)| id.clone());
        let victim = match expired {
            Some(id) => self.entries.pop(&id),
            None => self.entries.pop_lru().map(|(_, slot)| slot),
        };
        if let Some(slot) = victim {
            log::debug!(
                target: crate::debug::TARGET_HANDSHAKE,
                "session cache evicted {:02X?}",
                slot.session.id
            );
            self.unindex(&slot.session);
        }
    }

    fn trim(&mut self, now: Instant) {
        while self.capacity > 0 && self.entries.len() > self.capacity {
            self.evict(now);
        }
    }
}

/// Bounded, expiring map from session id to session, with a secondary
/// index by peer. Safe to share between connections.
pub struct SessionCache {
    inner: Mutex<Inner>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TIMEOUT)
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionCache")
            .field("len", &inner.entries.len())
            .field("capacity", &inner.capacity)
            .field("timeout", &inner.timeout)
            .finish()
    }
}

impl SessionCache {
    /// A cache of at most `capacity` sessions (0 for unbounded), each valid
    /// for `timeout` (zero for no expiry).
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                by_peer: HashMap::new(),
                capacity,
                timeout,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a session, replacing any with the same id.
    pub fn put(&self, session: CachedSession) {
        self.put_at(session, Instant::now());
    }

    pub(crate) fn put_at(&self, session: CachedSession, now: Instant) {
        let mut inner = self.lock();
        let id = session.id.clone();
        inner.remove(&id);
        if inner.capacity > 0 && inner.entries.len() >= inner.capacity {
            inner.evict(now);
        }
        if let Some(key) = session.peer_key() {
            inner.by_peer.insert(key, id.clone());
        }
        inner.entries.put(
            id,
            Slot {
                session,
                inserted: now,
            },
        );
    }

    /// Look a session up by id. An expired session is removed and `None`
    /// returned.
    pub fn get(&self, id: &[u8]) -> Option<CachedSession> {
        self.get_at(id, Instant::now())
    }

    pub(crate) fn get_at(&self, id: &[u8], now: Instant) -> Option<CachedSession> {
        let mut inner = self.lock();
        let id = id.to_vec();
        let expired = {
            let slot = inner.entries.peek(&id)?;
            inner.is_expired(slot, now)
        };
        if expired {
            inner.remove(&id);
            return None;
        }
        let slot = inner.entries.get_mut(&id)?;
        slot.session.last_access_time = SystemTime::now();
        Some(slot.session.clone())
    }

    /// The most recent session stored for a peer.
    pub fn get_by_peer(&self, host: &str, port: u16) -> Option<CachedSession> {
        self.get_by_peer_at(host, port, Instant::now())
    }

    pub(crate) fn get_by_peer_at(&self, host: &str, port: u16, now: Instant) -> Option<CachedSession> {
        let id = self.lock().by_peer.get(&(host.to_string(), port))?.clone();
        self.get_at(&id, now)
    }

    pub fn remove(&self, id: &[u8]) -> Option<CachedSession> {
        self.lock().remove(&id.to_vec())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn timeout(&self) -> Duration {
        self.lock().timeout
    }

    /// Change the bound, evicting down to it at once.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.lock();
        inner.capacity = capacity;
        inner.trim(Instant::now());
    }

    /// Change the lifetime; it applies to entries already cached.
    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().timeout = timeout;
    }

    /// Remove every expired session.
    pub fn clear_expired(&self) {
        self.clear_expired_at(Instant::now());
    }

    pub(crate) fn clear_expired_at(&self, now: Instant) {
        let mut inner = self.lock();
        let expired: Vec<Vec<u8>> = inner
            .entries
            .iter()
            .filter(|(_, slot)| inner.is_expired(slot, now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            inner.remove(id);
        }
    }
}
