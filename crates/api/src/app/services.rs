use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};

use wms_auth::{Hs256Jwt, JwtClaims, JwtError, JwtValidator, Principal};
use wms_infra::seed::seed_demo;
use wms_infra::{InMemoryWarehouse, WmsConfig};

/// Everything a handler needs: the warehouse and the token signer.
pub struct AppServices {
    pub warehouse: InMemoryWarehouse,
    jwt: Arc<Hs256Jwt>,
    token_ttl: Duration,
}

impl AppServices {
    pub fn new(warehouse: InMemoryWarehouse, jwt_secret: &str, token_ttl: Duration) -> Self {
        Self {
            warehouse,
            jwt: Arc::new(Hs256Jwt::new(jwt_secret.as_bytes())),
            token_ttl,
        }
    }

    pub fn validator(&self) -> Arc<dyn JwtValidator> {
        self.jwt.clone()
    }

    /// Sign a token for a freshly authenticated principal.
    pub fn issue_token(&self, principal: &Principal) -> Result<String, JwtError> {
        let claims = JwtClaims::for_principal(principal, Utc::now(), self.token_ttl);
        self.jwt.issue(&claims)
    }
}

/// In-memory wiring: event store + bus + projections, optionally seeded.
pub fn build_services(config: WmsConfig) -> anyhow::Result<AppServices> {
    let jwt_secret = config.jwt_secret.clone();
    let ttl = Duration::try_minutes(config.token_ttl_minutes)
        .with_context(|| format!("token ttl of {} minutes is out of range", config.token_ttl_minutes))?;
    let seed = config.seed_demo;

    let warehouse = InMemoryWarehouse::in_memory(config);
    if seed {
        seed_demo(&warehouse).context("seeding demo data")?;
    }

    Ok(AppServices::new(warehouse, &jwt_secret, ttl))
}
