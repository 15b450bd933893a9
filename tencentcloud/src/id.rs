//! Composite resource identifiers
//!
//! Resources without a single natural key store several sub-identifiers in
//! `id`, joined with `#`. Internally they are handled as typed tuples and only
//! turned into strings at the Terraform boundary.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

pub const SEPARATOR: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("id is broken, expected {expected} parts separated by '#', id is {id}")]
    Broken { expected: usize, id: String },

    #[error("id component '{0}' must not contain '#'")]
    InvalidComponent(String),
}

/// Joins components with the separator
pub fn join<S: AsRef<str>>(parts: &[S]) -> Result<String, IdError> {
    let mut joined = String::new();
    for (i, part) in parts.iter().enumerate() {
        let part = part.as_ref();
        if part.contains(SEPARATOR) {
            return Err(IdError::InvalidComponent(part.to_string()));
        }
        if i > 0 {
            joined.push(SEPARATOR);
        }
        joined.push_str(part);
    }
    Ok(joined)
}

/// Splits `raw` into exactly `N` non-empty components
pub fn split<const N: usize>(raw: &str) -> Result<[String; N], IdError> {
    let broken = || IdError::Broken {
        expected: N,
        id: raw.to_string(),
    };

    let parts: Vec<String> = raw.split(SEPARATOR).map(str::to_string).collect();
    if parts.iter().any(String::is_empty) {
        return Err(broken());
    }
    parts.try_into().map_err(|_| broken())
}

/// Stable id for a data source result, derived from the names it returned
pub fn ids_hash<S: AsRef<str>>(ids: &[S]) -> String {
    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update(id.as_ref().as_bytes());
        hasher.update(b"-");
    }
    hex::encode(hasher.finalize())
}

/// `instance_id#db_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseCtId {
    pub instance_id: String,
    pub db_name: String,
}

impl DatabaseCtId {
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let [instance_id, db_name] = split::<2>(raw)?;
        Ok(Self {
            instance_id,
            db_name,
        })
    }

    pub fn encode(&self) -> Result<String, IdError> {
        join(&[&self.instance_id, &self.db_name])
    }
}

/// `instance_id#cluster#user_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPermissionId {
    pub instance_id: String,
    pub cluster: String,
    pub user_name: String,
}

impl AccountPermissionId {
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let [instance_id, cluster, user_name] = split::<3>(raw)?;
        Ok(Self {
            instance_id,
            cluster,
            user_name,
        })
    }

    pub fn encode(&self) -> Result<String, IdError> {
        join(&[&self.instance_id, &self.cluster, &self.user_name])
    }
}

/// `job_id#instance_id#agent_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeJobId {
    pub job_id: String,
    pub instance_id: String,
    pub agent_id: String,
}

impl ScrapeJobId {
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let [job_id, instance_id, agent_id] = split::<3>(raw)?;
        Ok(Self {
            job_id,
            instance_id,
            agent_id,
        })
    }

    pub fn encode(&self) -> Result<String, IdError> {
        join(&[&self.job_id, &self.instance_id, &self.agent_id])
    }
}

/// `route_table_id#item1,item2`, items kept sorted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRoutesId {
    pub route_table_id: String,
    pub route_item_ids: Vec<String>,
}

impl NotifyRoutesId {
    pub fn new(route_table_id: impl Into<String>, mut route_item_ids: Vec<String>) -> Self {
        route_item_ids.sort();
        route_item_ids.dedup();
        Self {
            route_table_id: route_table_id.into(),
            route_item_ids,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let [route_table_id, items] = split::<2>(raw)?;
        let route_item_ids: Vec<String> = items
            .split(',')
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if route_item_ids.is_empty() {
            return Err(IdError::Broken {
                expected: 2,
                id: raw.to_string(),
            });
        }
        Ok(Self::new(route_table_id, route_item_ids))
    }

    pub fn encode(&self) -> Result<String, IdError> {
        join(&[self.route_table_id.clone(), self.route_item_ids.join(",")])
    }
}

macro_rules! display_via_encode {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    match self.encode() {
                        Ok(id) => f.write_str(&id),
                        Err(_) => Err(fmt::Error),
                    }
                }
            }
        )*
    };
}

display_via_encode!(DatabaseCtId, AccountPermissionId, ScrapeJobId, NotifyRoutesId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_uses_separator() {
        assert_eq!(join(&["ins-1", "db1"]).unwrap(), "ins-1#db1");
    }

    #[test]
    fn join_rejects_separator_in_component() {
        assert_eq!(
            join(&["ins#1", "db1"]),
            Err(IdError::InvalidComponent("ins#1".to_string()))
        );
    }

    #[test]
    fn split_requires_exact_count() {
        let [a, b, c] = split::<3>("a#b#c").unwrap();
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("a", "b", "c"));

        assert!(matches!(
            split::<3>("a#b"),
            Err(IdError::Broken { expected: 3, .. })
        ));
        assert!(split::<2>("a#b#c").is_err());
    }

    #[test]
    fn split_rejects_empty_components() {
        assert!(split::<2>("a#").is_err());
        assert!(split::<2>("#b").is_err());
        assert!(split::<1>("").is_err());
    }

    #[test]
    fn broken_id_message() {
        let err = split::<2>("only").unwrap_err();
        assert!(err.to_string().starts_with("id is broken"));
        assert!(err.to_string().contains("only"));
    }

    #[test]
    fn account_permission_id() {
        let id = AccountPermissionId::parse("cdwch-1#default_cluster#alice").unwrap();
        assert_eq!(id.cluster, "default_cluster");
        assert_eq!(id.to_string(), "cdwch-1#default_cluster#alice");
    }

    #[test]
    fn scrape_job_id_order() {
        let id = ScrapeJobId::parse("job-1#prom-1#agent-1").unwrap();
        assert_eq!(id.job_id, "job-1");
        assert_eq!(id.instance_id, "prom-1");
        assert_eq!(id.agent_id, "agent-1");
    }

    #[test]
    fn notify_routes_id_sorts_items() {
        let id = NotifyRoutesId::new("rtb-1", vec!["rti-2".to_string(), "rti-1".to_string()]);
        assert_eq!(id.encode().unwrap(), "rtb-1#rti-1,rti-2");

        let parsed = NotifyRoutesId::parse("rtb-1#rti-2,rti-1").unwrap();
        assert_eq!(parsed, id);
        assert!(NotifyRoutesId::parse("rtb-1#,").is_err());
    }

    #[test]
    fn ids_hash_is_stable_and_order_sensitive() {
        let a = ids_hash(&["fn-a", "fn-b"]);
        assert_eq!(a, ids_hash(&["fn-a", "fn-b"]));
        assert_ne!(a, ids_hash(&["fn-b", "fn-a"]));
        assert_eq!(a.len(), 64);
        assert_eq!(ids_hash::<&str>(&[]).len(), 64);
    }

    #[test]
    fn database_ct_id() {
        let id = DatabaseCtId::parse("mssql-1#db1").unwrap();
        assert_eq!(id.db_name, "db1");
        assert!(DatabaseCtId::parse("mssql-1").is_err());
    }
}
