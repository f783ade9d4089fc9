use indexmap::IndexSet;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::{
    addr::{ResourceAddress, SnowflakeResourceAddress},
    input::Input,
    util::RON,
};

/// A resource declaration that can be marshalled into the engine's on-disk
/// representation.
pub trait Resource {
    fn to_bytes(&self) -> Result<Vec<u8>, anyhow::Error>;

    fn from_bytes(addr: &impl ResourceAddress, s: &[u8]) -> Result<Self, anyhow::Error>
    where
        Self: Sized;
}

macro_rules! ron_resource {
    ($ty:ty) => {
        impl Resource for $ty {
            fn to_bytes(&self) -> Result<Vec<u8>, anyhow::Error> {
                let pretty_config = PrettyConfig::default().struct_names(true);
                Ok(RON.to_string_pretty(self, pretty_config)?.into())
            }

            fn from_bytes(_addr: &impl ResourceAddress, s: &[u8]) -> Result<Self, anyhow::Error> {
                let s = str::from_utf8(s)?;
                Ok(RON.from_str(s)?)
            }
        }
    };
}

fn default_true() -> bool {
    true
}

/// Snowflake User declaration - properties map to Snowflake's CREATE USER
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeUser {
    /// The login name for the user.
    pub login_name: String,
    /// Email address for the user. Format is not checked here.
    pub email: String,
    /// Default role applied at session start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_role: Option<Input>,
    /// Default warehouse for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_warehouse: Option<Input>,
    /// Default namespace (database or database.schema) for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<Input>,
    /// Force a password change on first login.
    #[serde(default = "default_true")]
    pub must_change_password: bool,
    /// Whether the user is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Comment/description for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeRole {
    /// Comment/description for the role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Associates one role with the users it is granted to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeRoleGrant {
    pub role_name: Input,
    pub users: Vec<Input>,
}

/// Snowflake Warehouse declaration. Cluster counts and suspend timings are
/// passed through as-is; the remote provider rejects out-of-range values at
/// apply time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeWarehouse {
    /// Size class (X-SMALL, SMALL, MEDIUM, LARGE, ...).
    pub warehouse_size: String,
    /// Seconds of inactivity before the warehouse suspends itself.
    pub auto_suspend: i64,
    /// Resume automatically when a query arrives.
    pub auto_resume: bool,
    /// Start out suspended.
    pub initially_suspended: bool,
    pub min_cluster_count: i64,
    pub max_cluster_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeDatabase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Time-travel retention window, in days.
    pub data_retention_time_in_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeSchema {
    /// Parent database, possibly late-bound.
    pub database: Input,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Overrides the database retention setting when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_retention_days: Option<i64>,
    /// Whether this is a managed-access schema.
    #[serde(default)]
    pub is_managed: bool,
}

/// Caller-facing column mapping, as accepted by the table constructor.
///
/// `nullable` is the literal string `"true"` or `"false"`. Anything else,
/// misspellings included, compares unequal to `"true"` and therefore lands
/// as non-nullable; absence defaults to `"true"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableColumnSpec {
    pub name: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<String>,
}

impl TableColumnSpec {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        TableColumnSpec {
            name: name.into(),
            r#type: r#type.into(),
            nullable: None,
        }
    }

    pub fn nullable(mut self, value: impl Into<String>) -> Self {
        self.nullable = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeTableColumn {
    pub name: String,
    pub r#type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeTable {
    /// Parent database, possibly late-bound.
    pub database: Input,
    /// Parent schema, possibly late-bound.
    pub schema: Input,
    pub columns: Vec<SnowflakeTableColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Clustering keys, drawn from the column names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_bys: Option<Vec<String>>,
}

/// What a privilege grant applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GrantTarget {
    /// An account-level object such as a database or warehouse.
    AccountObject { object_type: String, object_name: Input },
    /// A single schema, addressed as `database.schema`.
    Schema { schema_name: Input },
    /// Every existing object of one type inside a schema.
    AllInSchema {
        object_type_plural: String,
        in_schema: Input,
    },
}

/// Privileges granted to an account role on a target object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SnowflakePrivilegeGrant {
    pub account_role_name: Input,
    pub privileges: IndexSet<String>,
    pub target: GrantTarget,
}

ron_resource!(SnowflakeUser);
ron_resource!(SnowflakeRole);
ron_resource!(SnowflakeRoleGrant);
ron_resource!(SnowflakeWarehouse);
ron_resource!(SnowflakeDatabase);
ron_resource!(SnowflakeSchema);
ron_resource!(SnowflakeTable);
ron_resource!(SnowflakePrivilegeGrant);

/// Union of every declaration kind this layer can register.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SnowflakeResource {
    User(SnowflakeUser),
    Role(SnowflakeRole),
    RoleGrant(SnowflakeRoleGrant),
    Warehouse(SnowflakeWarehouse),
    Database(SnowflakeDatabase),
    Schema(SnowflakeSchema),
    Table(SnowflakeTable),
    PrivilegeGrant(SnowflakePrivilegeGrant),
}

impl SnowflakeResource {
    pub fn to_bytes(&self) -> Result<Vec<u8>, anyhow::Error> {
        match self {
            SnowflakeResource::User(user) => user.to_bytes(),
            SnowflakeResource::Role(role) => role.to_bytes(),
            SnowflakeResource::RoleGrant(grant) => grant.to_bytes(),
            SnowflakeResource::Warehouse(warehouse) => warehouse.to_bytes(),
            SnowflakeResource::Database(database) => database.to_bytes(),
            SnowflakeResource::Schema(schema) => schema.to_bytes(),
            SnowflakeResource::Table(table) => table.to_bytes(),
            SnowflakeResource::PrivilegeGrant(grant) => grant.to_bytes(),
        }
    }

    /// Decode the declaration stored at `addr`; the address variant fixes
    /// the expected resource kind.
    pub fn from_bytes(addr: &SnowflakeResourceAddress, s: &[u8]) -> Result<Self, anyhow::Error> {
        Ok(match addr {
            SnowflakeResourceAddress::User { .. } => SnowflakeResource::User(SnowflakeUser::from_bytes(addr, s)?),
            SnowflakeResourceAddress::Role { .. } => SnowflakeResource::Role(SnowflakeRole::from_bytes(addr, s)?),
            SnowflakeResourceAddress::RoleGrant { .. } => {
                SnowflakeResource::RoleGrant(SnowflakeRoleGrant::from_bytes(addr, s)?)
            }
            SnowflakeResourceAddress::Warehouse { .. } => {
                SnowflakeResource::Warehouse(SnowflakeWarehouse::from_bytes(addr, s)?)
            }
            SnowflakeResourceAddress::Database { .. } => {
                SnowflakeResource::Database(SnowflakeDatabase::from_bytes(addr, s)?)
            }
            SnowflakeResourceAddress::Schema { .. } => {
                SnowflakeResource::Schema(SnowflakeSchema::from_bytes(addr, s)?)
            }
            SnowflakeResourceAddress::Table { .. } => SnowflakeResource::Table(SnowflakeTable::from_bytes(addr, s)?),
            SnowflakeResourceAddress::PrivilegeGrant { .. } => {
                SnowflakeResource::PrivilegeGrant(SnowflakePrivilegeGrant::from_bytes(addr, s)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_round_trips_through_ron() {
        let addr = SnowflakeResourceAddress::User {
            name: "ANALYST_USER".to_string(),
        };
        let user = SnowflakeUser {
            login_name: "ANALYST_USER".to_string(),
            email: "analyst@example.com".to_string(),
            default_role: Some(Input::attr(
                SnowflakeResourceAddress::Role {
                    name: "ANALYST".to_string(),
                },
                "name",
            )),
            default_warehouse: None,
            default_namespace: Some(Input::concat([
                Input::from("ANALYTICS"),
                Input::from("."),
                Input::from("RAW"),
            ])),
            must_change_password: true,
            disabled: false,
            comment: Some("Managed by Pulumi - dev".to_string()),
        };

        let bytes = user.to_bytes().unwrap();
        let parsed = SnowflakeUser::from_bytes(&addr, &bytes).unwrap();
        assert_eq!(user, parsed);
    }

    #[test]
    fn union_decodes_by_address_kind() {
        let addr = SnowflakeResourceAddress::Role {
            name: "ANALYST".to_string(),
        };
        let role = SnowflakeRole {
            comment: Some("Managed by Pulumi - dev".to_string()),
        };
        let bytes = role.to_bytes().unwrap();

        let parsed = SnowflakeResource::from_bytes(&addr, &bytes).unwrap();
        assert_eq!(parsed, SnowflakeResource::Role(role));
    }

    #[test]
    fn must_change_password_defaults_on_when_absent() {
        let addr = SnowflakeResourceAddress::User {
            name: "MINIMAL".to_string(),
        };
        let ron = br#"SnowflakeUser(login_name: "MINIMAL", email: "min@example.com")"#;
        let parsed = SnowflakeUser::from_bytes(&addr, ron).unwrap();
        assert!(parsed.must_change_password);
        assert!(!parsed.disabled);
    }
}
