//! Domain operations.
//!
//! Domains are created lazily and never updated. Creation is get-or-create:
//! the id returned is always the one stored for the name, whichever caller
//! inserted it.

use std::collections::HashMap;

use super::{Domain, Executor, Query, RowKey, TabStore};
use crate::Error;

/// Insert `name` if absent and return its stored id.
///
/// Must run inside a transaction so the lookup sees the row just written.
pub(crate) fn resolve_domain(ex: &Executor<'_>, name: &str) -> Result<i64, Error> {
    ex.execute(&Query::new("INSERT OR IGNORE INTO domains (name) VALUES (:name)").bind("name", name.to_string()))?;
    ex.scalar::<i64>(&Query::new("SELECT id FROM domains WHERE name = :name").bind("name", name.to_string()))?
        .ok_or_else(|| Error::NotFound(format!("domain {name}")))
}

fn validate_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("domain name cannot be empty".into()));
    }
    Ok(())
}

impl TabStore {
    /// Get or create the domain `name`, returning its id.
    pub async fn create_domain(&self, name: &str) -> Result<i64, Error> {
        validate_name(name)?;
        let name = name.to_string();
        self.exec.transaction(move |ex| resolve_domain(ex, &name)).await
    }

    /// Look up a single domain by name.
    pub async fn get_domain_by_name(&self, name: &str) -> Result<Option<Domain>, Error> {
        let mut found = self.get_domains_by_name(&[name.to_string()]).await?;
        Ok(found.remove(name))
    }

    /// Look up several domains by name. Missing names are absent from the map.
    pub async fn get_domains_by_name(&self, names: &[String]) -> Result<HashMap<String, Domain>, Error> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let query = Query::new("SELECT id, name FROM domains WHERE name IN (:names)").bind_list("names", names.to_vec());
        let keyed = self.exec.keyed(query, "name").await?;

        keyed
            .into_iter()
            .map(|(key, record)| {
                let domain = Domain::try_from(&record)?;
                match key {
                    RowKey::Text(name) => Ok((name, domain)),
                    RowKey::Integer(_) => Ok((domain.name.clone(), domain)),
                }
            })
            .collect()
    }

    /// Delete a domain by name. Its tabs must already be gone.
    pub async fn delete_domain_by_name(&self, name: &str) -> Result<(), Error> {
        self.exec
            .execute(Query::new("DELETE FROM domains WHERE name = :name").bind("name", name.to_string()))
            .await?;
        Ok(())
    }
}
