//! Per-job-description generation lease.
//!
//! Only the holder of the lease may call the completion collaborator for a given
//! job description. The storage compare-and-set still decides the final write; the
//! lease just keeps two requests from paying for the same generation.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

const LEASE_PREFIX: &str = "rehearse:generation-lease";

/// Deletes the key only while it still holds our token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub job_description_id: Uuid,
    token: String,
}

#[async_trait]
pub trait GenerationLocks: Send + Sync {
    /// `None` when another holder already owns the lease.
    async fn try_acquire(&self, job_description_id: Uuid) -> Result<Option<Lease>>;

    async fn release(&self, lease: Lease) -> Result<()>;
}

pub struct RedisLocks {
    client: redis::Client,
    ttl: Duration,
}

impl RedisLocks {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(job_description_id: Uuid) -> String {
        format!("{LEASE_PREFIX}:{job_description_id}")
    }
}

#[async_trait]
impl GenerationLocks for RedisLocks {
    async fn try_acquire(&self, job_description_id: Uuid) -> Result<Option<Lease>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let token = Uuid::new_v4().to_string();
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let acquired: Option<String> = redis::cmd("SET")
            .arg(Self::key(job_description_id))
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        if acquired.is_none() {
            debug!("Generation lease for {job_description_id} is held elsewhere");
            return Ok(None);
        }
        Ok(Some(Lease {
            job_description_id,
            token,
        }))
    }

    async fn release(&self, lease: Lease) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let released: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(Self::key(lease.job_description_id))
            .arg(&lease.token)
            .invoke_async(&mut conn)
            .await?;

        if released == 0 {
            warn!(
                "Generation lease for {} expired before release",
                lease.job_description_id
            );
        }
        Ok(())
    }
}

/// Process-local lease table for single-instance deployments and tests.
#[derive(Default)]
pub struct LocalLocks {
    held: Mutex<HashSet<Uuid>>,
}

#[async_trait]
impl GenerationLocks for LocalLocks {
    async fn try_acquire(&self, job_description_id: Uuid) -> Result<Option<Lease>> {
        let mut held = self.held.lock().map_err(|_| anyhow::anyhow!("lease table poisoned"))?;
        if !held.insert(job_description_id) {
            return Ok(None);
        }
        Ok(Some(Lease {
            job_description_id,
            token: Uuid::new_v4().to_string(),
        }))
    }

    async fn release(&self, lease: Lease) -> Result<()> {
        let mut held = self.held.lock().map_err(|_| anyhow::anyhow!("lease table poisoned"))?;
        held.remove(&lease.job_description_id);
        Ok(())
    }
}

/// Grants every request. Behaves like a holder whose lease expired unnoticed
/// while another instance took over.
#[cfg(test)]
pub struct AlwaysGrant;

#[cfg(test)]
#[async_trait]
impl GenerationLocks for AlwaysGrant {
    async fn try_acquire(&self, job_description_id: Uuid) -> Result<Option<Lease>> {
        Ok(Some(Lease {
            job_description_id,
            token: Uuid::new_v4().to_string(),
        }))
    }

    async fn release(&self, _lease: Lease) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_acquire_is_refused_until_release() {
        let locks = LocalLocks::default();
        let id = Uuid::new_v4();

        let lease = locks.try_acquire(id).await.unwrap().expect("first acquire");
        assert!(locks.try_acquire(id).await.unwrap().is_none());

        locks.release(lease).await.unwrap();
        assert!(locks.try_acquire(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_leases_are_per_job_description() {
        let locks = LocalLocks::default();
        assert!(locks.try_acquire(Uuid::new_v4()).await.unwrap().is_some());
        assert!(locks.try_acquire(Uuid::new_v4()).await.unwrap().is_some());
    }

    #[test]
    fn test_redis_key_is_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            RedisLocks::key(id),
            "rehearse:generation-lease:00000000-0000-0000-0000-000000000000"
        );
    }
}
