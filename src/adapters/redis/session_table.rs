//! Redis-backed session table for production deployments.
//!
//! Layout:
//! - `{prefix}:session:{id}` - JSON record, written with `SET NX EXAT` so Redis
//!   reclaims it at `expires_at`
//! - `{prefix}:user:{username}` - sorted set of session ids scored by
//!   `expires_at`; the username index
//!
//! Item and index are written in one Lua script so a concurrent writer can
//! never shorten the index key's expiry below one of its live members.
//! Deletes go through a second script that checks the record's owner, since
//! an index member can outlive its item and the id can be reused by another
//! user.
//! Requires Redis 6.2+ (`EXAT`) and a non-cluster deployment (item and index
//! keys are not hash-tagged to one slot).

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::RedisConfig;
use crate::domain::foundation::{SessionId, Timestamp, Username};
use crate::domain::session::Session;
use crate::ports::{IndexEntry, PutOutcome, SessionTable, TableError};

/// Writes the item only if absent, then prunes and extends the user index.
///
/// KEYS[1] item key, KEYS[2] index key
/// ARGV[1] record, ARGV[2] expires_at, ARGV[3] now, ARGV[4] session id
const PUT_IF_ABSENT_SCRIPT: &str = r"
if not redis.call('SET', KEYS[1], ARGV[1], 'NX', 'EXAT', ARGV[2]) then
  return 0
end
redis.call('ZREMRANGEBYSCORE', KEYS[2], '-inf', ARGV[3])
redis.call('ZADD', KEYS[2], ARGV[2], ARGV[4])
local top = redis.call('ZRANGE', KEYS[2], -1, -1, 'WITHSCORES')
redis.call('EXPIREAT', KEYS[2], top[2])
return 1
";

/// Deletes the item only when `username` owns it; always drops the index member.
///
/// KEYS[1] item key, KEYS[2] index key
/// ARGV[1] session id, ARGV[2] username
const DELETE_OWNED_SCRIPT: &str = r"
local removed = 0
local record = redis.call('GET', KEYS[1])
if record then
  local ok, stored = pcall(cjson.decode, record)
  if ok and stored['username'] == ARGV[2] then
    redis.call('DEL', KEYS[1])
    removed = 1
  end
end
redis.call('ZREM', KEYS[2], ARGV[1])
return removed
";

/// Redis implementation of [`SessionTable`].
#[derive(Clone)]
pub struct RedisSessionTable {
    conn: MultiplexedConnection,
    key_prefix: String,
    put_script: Script,
    delete_script: Script,
}

/// Wire format of a stored session.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    id: String,
    username: String,
    payload: String,
    created_at: i64,
    expires_at: i64,
}

impl RedisSessionTable {
    /// Create a table over an existing connection.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            put_script: Script::new(PUT_IF_ABSENT_SCRIPT),
            delete_script: Script::new(DELETE_OWNED_SCRIPT),
        }
    }

    /// Open a multiplexed connection using `config`.
    pub async fn connect(config: &RedisConfig) -> Result<Self, TableError> {
        let client = redis::Client::open(config.url.expose_secret().as_str()).map_err(unavailable)?;

        let conn = tokio::time::timeout(
            config.timeout(),
            client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| TableError::Timeout(config.timeout()))?
        .map_err(unavailable)?;

        tracing::info!(prefix = %config.key_prefix, "Connected to Redis session table");
        Ok(Self::new(conn, config.key_prefix.clone()))
    }

    fn item_key(&self, id: &SessionId) -> String {
        format!("{}:session:{}", self.key_prefix, id)
    }

    fn index_key(&self, username: &Username) -> String {
        format!("{}:user:{}", self.key_prefix, username)
    }
}

#[async_trait]
impl SessionTable for RedisSessionTable {
    async fn put_if_absent(
        &self,
        session: &Session,
        now: Timestamp,
    ) -> Result<PutOutcome, TableError> {
        let record = encode(session)?;
        let mut conn = self.conn.clone();

        let written: i64 = self
            .put_script
            .key(self.item_key(session.id()))
            .key(self.index_key(session.username()))
            .arg(record)
            .arg(session.expires_at().as_unix_secs())
            .arg(now.as_unix_secs())
            .arg(session.id().as_str())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(if written == 1 {
            PutOutcome::Created
        } else {
            PutOutcome::AlreadyExists
        })
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, TableError> {
        let mut conn = self.conn.clone();

        let record: Option<String> = redis::cmd("GET")
            .arg(self.item_key(id))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        record.as_deref().map(decode).transpose()
    }

    async fn query_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<IndexEntry>, TableError> {
        let mut conn = self.conn.clone();

        let members: Vec<(String, f64)> = redis::cmd("ZRANGE")
            .arg(self.index_key(username))
            .arg(0)
            .arg(-1)
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        members
            .into_iter()
            .map(|(id, score)| {
                let session_id = SessionId::new(id)
                    .map_err(|e| TableError::Corrupt(format!("index member: {}", e)))?;
                let expires_at = Timestamp::from_unix_secs(score as i64)
                    .ok_or_else(|| TableError::Corrupt(format!("index score: {}", score)))?;
                Ok(IndexEntry {
                    session_id,
                    expires_at,
                })
            })
            .collect()
    }

    async fn delete(&self, username: &Username, id: &SessionId) -> Result<bool, TableError> {
        let mut conn = self.conn.clone();

        let deleted: i64 = self
            .delete_script
            .key(self.item_key(id))
            .key(self.index_key(username))
            .arg(id.as_str())
            .arg(username.as_str())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(deleted == 1)
    }

    async fn ping(&self) -> Result<(), TableError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionTable")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn unavailable(e: redis::RedisError) -> TableError {
    TableError::Unavailable(e.to_string())
}

fn encode(session: &Session) -> Result<String, TableError> {
    let stored = StoredSession {
        id: session.id().to_string(),
        username: session.username().to_string(),
        payload: session.payload().to_string(),
        created_at: session.created_at().as_unix_secs(),
        expires_at: session.expires_at().as_unix_secs(),
    };
    serde_json::to_string(&stored).map_err(|e| TableError::Corrupt(e.to_string()))
}

fn decode(record: &str) -> Result<Session, TableError> {
    let stored: StoredSession =
        serde_json::from_str(record).map_err(|e| TableError::Corrupt(e.to_string()))?;

    let id = SessionId::new(stored.id).map_err(|e| TableError::Corrupt(e.to_string()))?;
    let username =
        Username::new(stored.username).map_err(|e| TableError::Corrupt(e.to_string()))?;
    let created_at = Timestamp::from_unix_secs(stored.created_at)
        .ok_or_else(|| TableError::Corrupt("created_at out of range".to_string()))?;
    let expires_at = Timestamp::from_unix_secs(stored.expires_at)
        .ok_or_else(|| TableError::Corrupt("expires_at out of range".to_string()))?;

    Ok(Session::reconstitute(
        id,
        username,
        stored.payload,
        created_at,
        expires_at,
    ))
}
