use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::invalid_addr_path;

/// Filesystem-addressable identity of a declared resource.
pub trait ResourceAddress {
    fn to_path_buf(&self) -> PathBuf;

    fn from_path(path: &Path) -> Result<Self, anyhow::Error>
    where
        Self: Sized;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnowflakeResourceAddress {
    Warehouse { name: String },
    Database { name: String },
    Schema { database: String, name: String },
    Table { database: String, schema: String, name: String },
    // RBAC resources
    User { name: String },
    Role { name: String },
    // Grant declarations, keyed by their declaration identifier
    RoleGrant { name: String },
    PrivilegeGrant { name: String },
}

impl SnowflakeResourceAddress {
    /// The remote object name this address points at. Grant declarations
    /// have no object name of their own and answer with their identifier.
    pub fn object_name(&self) -> &str {
        match self {
            SnowflakeResourceAddress::Warehouse { name } => name,
            SnowflakeResourceAddress::Database { name } => name,
            SnowflakeResourceAddress::Schema { name, .. } => name,
            SnowflakeResourceAddress::Table { name, .. } => name,
            SnowflakeResourceAddress::User { name } => name,
            SnowflakeResourceAddress::Role { name } => name,
            SnowflakeResourceAddress::RoleGrant { name } => name,
            SnowflakeResourceAddress::PrivilegeGrant { name } => name,
        }
    }
}

fn strip_ron_suffix(s: &str) -> String {
    s.strip_suffix(".ron").unwrap().to_string()
}

impl ResourceAddress for SnowflakeResourceAddress {
    fn to_path_buf(&self) -> PathBuf {
        match self {
            SnowflakeResourceAddress::Warehouse { name } => {
                PathBuf::from(format!("snowflake/warehouses/{}.ron", name))
            }
            SnowflakeResourceAddress::Database { name } => {
                PathBuf::from(format!("snowflake/databases/{}/database.ron", name))
            }
            SnowflakeResourceAddress::Schema { database, name } => {
                PathBuf::from(format!("snowflake/databases/{}/{}/schema.ron", database, name))
            }
            SnowflakeResourceAddress::Table { database, schema, name } => {
                PathBuf::from(format!("snowflake/databases/{}/{}/{}/table.ron", database, schema, name))
            }
            SnowflakeResourceAddress::User { name } => PathBuf::from(format!("snowflake/users/{}.ron", name)),
            SnowflakeResourceAddress::Role { name } => PathBuf::from(format!("snowflake/roles/{}.ron", name)),
            SnowflakeResourceAddress::RoleGrant { name } => {
                PathBuf::from(format!("snowflake/grants/roles/{}.ron", name))
            }
            SnowflakeResourceAddress::PrivilegeGrant { name } => {
                PathBuf::from(format!("snowflake/grants/privileges/{}.ron", name))
            }
        }
    }

    fn from_path(path: &Path) -> Result<Self, anyhow::Error> {
        let path_components: Vec<&str> = path
            .components()
            .map(|s| s.as_os_str().to_str().unwrap())
            .collect();

        match path_components[..] {
            ["snowflake", "warehouses", name] if name.ends_with(".ron") => Ok(SnowflakeResourceAddress::Warehouse {
                name: strip_ron_suffix(name),
            }),
            ["snowflake", "databases", name, "database.ron"] => {
                Ok(SnowflakeResourceAddress::Database { name: name.to_string() })
            }
            ["snowflake", "databases", database, name, "schema.ron"] => Ok(SnowflakeResourceAddress::Schema {
                database: database.to_string(),
                name: name.to_string(),
            }),
            ["snowflake", "databases", database, schema, name, "table.ron"] => Ok(SnowflakeResourceAddress::Table {
                database: database.to_string(),
                schema: schema.to_string(),
                name: name.to_string(),
            }),
            ["snowflake", "users", name] if name.ends_with(".ron") => Ok(SnowflakeResourceAddress::User {
                name: strip_ron_suffix(name),
            }),
            ["snowflake", "roles", name] if name.ends_with(".ron") => Ok(SnowflakeResourceAddress::Role {
                name: strip_ron_suffix(name),
            }),
            ["snowflake", "grants", "roles", name] if name.ends_with(".ron") => {
                Ok(SnowflakeResourceAddress::RoleGrant {
                    name: strip_ron_suffix(name),
                })
            }
            ["snowflake", "grants", "privileges", name] if name.ends_with(".ron") => {
                Ok(SnowflakeResourceAddress::PrivilegeGrant {
                    name: strip_ron_suffix(name),
                })
            }
            _ => Err(invalid_addr_path(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_paths_round_trip() {
        let addrs = vec![
            SnowflakeResourceAddress::Warehouse {
                name: "ANALYTICS_WH".to_string(),
            },
            SnowflakeResourceAddress::Database {
                name: "ANALYTICS".to_string(),
            },
            SnowflakeResourceAddress::Schema {
                database: "ANALYTICS".to_string(),
                name: "RAW".to_string(),
            },
            SnowflakeResourceAddress::Table {
                database: "ANALYTICS".to_string(),
                schema: "RAW".to_string(),
                name: "EVENTS".to_string(),
            },
            SnowflakeResourceAddress::User {
                name: "ANALYST_USER".to_string(),
            },
            SnowflakeResourceAddress::Role {
                name: "ANALYST".to_string(),
            },
            SnowflakeResourceAddress::RoleGrant {
                name: "analyst-membership".to_string(),
            },
            SnowflakeResourceAddress::PrivilegeGrant {
                name: "analyst-table-select".to_string(),
            },
        ];

        for addr in addrs {
            let path = addr.to_path_buf();
            let parsed = SnowflakeResourceAddress::from_path(&path).unwrap();
            assert_eq!(addr, parsed);
        }
    }

    #[test]
    fn rejects_foreign_paths() {
        assert!(SnowflakeResourceAddress::from_path(Path::new("aws/s3/bucket.ron")).is_err());
        assert!(SnowflakeResourceAddress::from_path(Path::new("snowflake/warehouses/WH.sql")).is_err());
        assert!(SnowflakeResourceAddress::from_path(Path::new("snowflake/grants/unknown/x.ron")).is_err());
    }
}
