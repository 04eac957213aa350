//! API tokens. Secrets are returned once at creation; only their SHA-256
//! digest is stored and used as the lookup key.

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use super::codec::{put_json, remove_key, TableRead};
use super::db::Store;
use super::tables::TOKENS;
use crate::error::{Error, Result};
use crate::model::{ResourcePermission, Timestamp, Token};

pub const TOKEN_PREFIX: &str = "flt_";

/// Hex SHA-256 of a token secret.
pub fn hash_token(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{TOKEN_PREFIX}{}", hex::encode(bytes))
}

impl Store {
    /// Create a token. Returns the plaintext secret together with the stored row.
    pub fn create_token(
        &self,
        name: &str,
        admin: bool,
        permissions: Vec<ResourcePermission>,
        now: Timestamp,
    ) -> Result<(String, Token)> {
        if name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        let secret = generate_secret();
        let token = Token {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            hash: hash_token(&secret),
            admin,
            permissions,
            created_at: now,
        };
        let txn = self.begin_write()?;
        put_json(&txn, TOKENS, &token.hash, &token)?;
        self.commit(txn)?;
        info!(token_id = %token.id, name = %token.name, admin, "token created");
        Ok((secret, token))
    }

    /// Look a token up by its plaintext secret.
    pub fn find_token(&self, secret: &str) -> Result<Option<Token>> {
        let txn = self.begin_read()?;
        Ok(txn.get_json(TOKENS, &hash_token(secret))?)
    }

    pub fn list_tokens(&self) -> Result<Vec<Token>> {
        let txn = self.begin_read()?;
        Ok(txn.scan_json(TOKENS, "")?)
    }

    /// Revoke a token by id.
    pub fn revoke_token(&self, id: &str) -> Result<()> {
        let txn = self.begin_write()?;
        let tokens: Vec<Token> = txn.scan_json(TOKENS, "")?;
        let token = tokens
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found(format!("token {id}")))?;
        remove_key(&txn, TOKENS, &token.hash)?;
        self.commit(txn)?;
        info!(token_id = %id, "token revoked");
        Ok(())
    }
}
