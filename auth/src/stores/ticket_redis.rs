//! Redis-based ticket store implementation.
//!
//! # Architecture
//!
//! Each ticket is its own key:
//! - **Key**: `qrlogin:ticket:{id}` → JSON-encoded [`Ticket`]
//! - **TTL**: ticket TTL plus a grace period, so Redis reclaims tickets
//!   nobody polls; the service still decides expiry from `issued_at`
//!
//! Claiming and consuming are Lua scripts, so the read-check-write of a
//! ticket executes atomically on the server across any number of processes.

use crate::config::ReclaimPolicy;
use crate::constants::REDIS_KEY_PREFIX;
use crate::error::{Result, TicketError};
use crate::providers::{Assignment, Consumption, TicketStore};
use crate::state::{Ticket, TicketId, UserId};
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Seconds a key outlives its ticket's TTL.
const EXPIRY_GRACE_SECS: i64 = 60;

/// Keys fetched per SCAN round-trip.
const SCAN_BATCH: usize = 200;

// ARGV: user id, policy, now (unix secs), ttl (secs)
const ASSIGN_SCRIPT: &str = r"
    local raw = redis.call('GET', KEYS[1])
    if not raw then
        return 'missing'
    end

    local ticket = cjson.decode(raw)
    if tonumber(ARGV[3]) - tonumber(ticket['generate_time']) > tonumber(ARGV[4]) then
        redis.call('DEL', KEYS[1])
        return 'expired'
    end

    local current = ticket['user_id'] or ''

    if current == ARGV[1] then
        return 'held'
    end
    if current ~= '' and ARGV[2] == 'reject' then
        return 'conflict'
    end

    ticket['user_id'] = ARGV[1]
    redis.call('SET', KEYS[1], cjson.encode(ticket), 'KEEPTTL')

    if current ~= '' then
        return 'replaced'
    end
    return 'assigned'
";

// ARGV: now (unix secs), ttl (secs). Replies with a status and, when
// taken, the ticket JSON.
const TAKE_CLAIMED_SCRIPT: &str = r"
    local raw = redis.call('GET', KEYS[1])
    if not raw then
        return {'missing'}
    end

    local ticket = cjson.decode(raw)
    if tonumber(ARGV[1]) - tonumber(ticket['generate_time']) > tonumber(ARGV[2]) then
        redis.call('DEL', KEYS[1])
        return {'expired'}
    end
    if (ticket['user_id'] or '') == '' then
        return {'pending'}
    end

    redis.call('DEL', KEYS[1])
    return {'taken', raw}
";

/// Redis-based ticket store.
///
/// Suitable for running several server processes against one ticket table.
///
/// # Failure semantics
///
/// This store does **not** follow the fail-soft contract of
/// [`TableTicketStore`](crate::stores::TableTicketStore), where a broken
/// backend is logged and the request is still answered from memory. There
/// is no in-memory copy here, so every Redis error (including on `load` and
/// `find`) fails the in-flight call with [`TicketError::Persistence`], which
/// the HTTP layer reports as `503`.
///
/// # Example
///
/// ```no_run
/// use qrlogin_auth::stores::RedisTicketStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RedisTicketStore::new("redis://127.0.0.1:6379").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisTicketStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisTicketStore {
    /// Create a new Redis ticket store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            TicketError::Persistence(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            TicketError::Persistence(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    fn ticket_key(id: &TicketId) -> String {
        format!("{REDIS_KEY_PREFIX}{}", id.0)
    }

    /// All ticket keys currently in Redis.
    async fn ticket_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn_manager.clone();
        let pattern = format!("{REDIS_KEY_PREFIX}*");
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| TicketError::Persistence(format!("Failed to scan tickets: {e}")))?;

            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();
        conn.get(key)
            .await
            .map_err(|e| TicketError::Persistence(format!("Failed to get ticket: {e}")))
    }
}

impl TicketStore for RedisTicketStore {
    async fn load(&self) -> Result<Vec<Ticket>> {
        let mut tickets = Vec::new();

        for key in self.ticket_keys().await? {
            // Keys can expire between SCAN and GET.
            if let Some(raw) = self.get_raw(&key).await? {
                tickets.push(serde_json::from_str(&raw)?);
            }
        }

        Ok(tickets)
    }

    async fn save(&self) -> Result<()> {
        // Every operation writes through.
        Ok(())
    }

    async fn insert(&self, ticket: Ticket, _now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::ticket_key(&ticket.id);
        let json = serde_json::to_string(&ticket)?;

        #[allow(clippy::cast_sign_loss)]
        let expire_secs = ttl.num_seconds().max(0).saturating_add(EXPIRY_GRACE_SECS) as u64;

        // SET NX: an existing key means an id collision, never overwrite it.
        let created: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .arg("NX")
            .arg("EX")
            .arg(expire_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| TicketError::Persistence(format!("Failed to store ticket: {e}")))?;

        if created.is_none() {
            return Err(TicketError::Persistence(format!(
                "ticket id {} already exists",
                ticket.id
            )));
        }

        tracing::debug!(ticket_id = %ticket.id, expire_secs, "Stored ticket in Redis");
        Ok(())
    }

    async fn find(&self, id: &TicketId) -> Result<Option<Ticket>> {
        let raw = self.get_raw(&Self::ticket_key(id)).await?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    async fn assign_user(
        &self,
        id: &TicketId,
        user_id: &UserId,
        policy: ReclaimPolicy,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Assignment> {
        let mut conn = self.conn_manager.clone();

        let result: String = redis::Script::new(ASSIGN_SCRIPT)
            .key(Self::ticket_key(id))
            .arg(user_id.as_str())
            .arg(policy.as_str())
            .arg(now.timestamp())
            .arg(ttl.num_seconds())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TicketError::Persistence(format!("Failed to claim ticket: {e}")))?;

        match result.as_str() {
            "assigned" => Ok(Assignment::Assigned),
            "replaced" => {
                tracing::warn!(ticket_id = %id, "Overwrote ticket claimant");
                Ok(Assignment::Assigned)
            }
            "held" => Ok(Assignment::AlreadyHeld),
            "conflict" => Ok(Assignment::Conflict),
            "expired" => Ok(Assignment::Expired),
            "missing" => Ok(Assignment::Missing),
            other => Err(TicketError::Persistence(format!(
                "unexpected claim script result: {other}"
            ))),
        }
    }

    async fn take_claimed(
        &self,
        id: &TicketId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Consumption> {
        let mut conn = self.conn_manager.clone();

        let reply: Vec<String> = redis::Script::new(TAKE_CLAIMED_SCRIPT)
            .key(Self::ticket_key(id))
            .arg(now.timestamp())
            .arg(ttl.num_seconds())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TicketError::Persistence(format!("Failed to consume ticket: {e}")))?;

        match reply.as_slice() {
            [status, json] if status == "taken" => {
                Ok(Consumption::Taken(serde_json::from_str(json)?))
            }
            [status] if status == "pending" => Ok(Consumption::Pending),
            [status] if status == "expired" => Ok(Consumption::Expired),
            [status] if status == "missing" => Ok(Consumption::Missing),
            other => Err(TicketError::Persistence(format!(
                "unexpected consume script result: {other:?}"
            ))),
        }
    }

    async fn delete(&self, id: &TicketId) -> Result<()> {
        let mut conn = self.conn_manager.clone();

        let _: () = conn
            .del(Self::ticket_key(id))
            .await
            .map_err(|e| TicketError::Persistence(format!("Failed to delete ticket: {e}")))?;

        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize> {
        let mut conn = self.conn_manager.clone();
        let mut removed = 0;

        for key in self.ticket_keys().await? {
            let Some(raw) = self.get_raw(&key).await? else {
                continue;
            };

            let expired = match serde_json::from_str::<Ticket>(&raw) {
                Ok(ticket) => ticket.is_expired(now, ttl),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Removing undecodable ticket");
                    true
                }
            };

            if expired {
                let deleted: usize = conn.del(&key).await.map_err(|e| {
                    TicketError::Persistence(format!("Failed to delete ticket: {e}"))
                })?;
                removed += deleted;
            }
        }

        Ok(removed)
    }
}
