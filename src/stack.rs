use std::env;

use indexmap::IndexSet;

use crate::{
    addr::SnowflakeResourceAddress,
    error::DeclarationError,
    input::Input,
    registry::{DeclarationRegistry, ResourceHandle},
    resource::{
        GrantTarget, SnowflakeDatabase, SnowflakePrivilegeGrant, SnowflakeResource, SnowflakeRole,
        SnowflakeRoleGrant, SnowflakeSchema, SnowflakeTable, SnowflakeTableColumn, SnowflakeUser,
        SnowflakeWarehouse, TableColumnSpec,
    },
};

/// Settings consumed by the declaration layer, loaded from the process
/// environment.
#[derive(Clone, Debug)]
pub struct SnowflakeStackConfig {
    /// Environment label stamped into managed-resource comments.
    pub environment: String,
}

impl SnowflakeStackConfig {
    pub fn from_env() -> Self {
        let environment = env::var("SNOWFLAKE_ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        SnowflakeStackConfig { environment }
    }
}

impl Default for SnowflakeStackConfig {
    fn default() -> Self {
        SnowflakeStackConfig {
            environment: "dev".to_string(),
        }
    }
}

/// Optional parameters for `create_user`.
#[derive(Debug, Clone)]
pub struct UserArgs {
    pub default_role: Option<Input>,
    pub default_warehouse: Option<Input>,
    pub default_namespace: Option<Input>,
    pub must_change_password: bool,
    pub disabled: bool,
}

impl Default for UserArgs {
    fn default() -> Self {
        UserArgs {
            default_role: None,
            default_warehouse: None,
            default_namespace: None,
            must_change_password: true,
            disabled: false,
        }
    }
}

/// Optional parameters for `create_warehouse`.
#[derive(Debug, Clone)]
pub struct WarehouseArgs {
    pub warehouse_size: String,
    pub auto_suspend: i64,
    pub auto_resume: bool,
    pub initially_suspended: bool,
    pub min_cluster_count: i64,
    pub max_cluster_count: i64,
}

impl Default for WarehouseArgs {
    fn default() -> Self {
        WarehouseArgs {
            warehouse_size: "SMALL".to_string(),
            auto_suspend: 300,
            auto_resume: true,
            initially_suspended: true,
            min_cluster_count: 1,
            max_cluster_count: 1,
        }
    }
}

/// Optional parameters for `create_database`.
#[derive(Debug, Clone)]
pub struct DatabaseArgs {
    pub comment: Option<String>,
    pub data_retention_time_in_days: i64,
}

impl Default for DatabaseArgs {
    fn default() -> Self {
        DatabaseArgs {
            comment: None,
            data_retention_time_in_days: 1,
        }
    }
}

/// Optional parameters for `create_schema`.
#[derive(Debug, Clone, Default)]
pub struct SchemaArgs {
    pub comment: Option<String>,
    pub data_retention_days: Option<i64>,
    pub is_managed: bool,
}

/// Optional parameters for `create_table`.
#[derive(Debug, Clone, Default)]
pub struct TableArgs {
    pub comment: Option<String>,
    pub cluster_by: Option<Vec<String>>,
}

/// Optional parameters for `grant_table_select`.
#[derive(Debug, Clone)]
pub struct TableSelectArgs {
    /// Grant on all tables in the schema. Per-table selection is not
    /// implemented and is rejected.
    pub all_tables: bool,
}

impl Default for TableSelectArgs {
    fn default() -> Self {
        TableSelectArgs { all_tables: true }
    }
}

/// Declares Snowflake account resources against an owned registry.
///
/// Constructors only build descriptors and register them. Dependency
/// ordering, diffing and API calls stay with the orchestration engine that
/// later consumes the registry.
pub struct SnowflakeStack {
    config: SnowflakeStackConfig,
    registry: DeclarationRegistry,
}

impl SnowflakeStack {
    pub fn new(config: SnowflakeStackConfig) -> Self {
        SnowflakeStack {
            config,
            registry: DeclarationRegistry::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(SnowflakeStackConfig::from_env())
    }

    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> DeclarationRegistry {
        self.registry
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    fn managed_comment(&self) -> String {
        format!("Managed by Pulumi - {}", self.config.environment)
    }

    /// Declare a user. The comment is always the managed-by stamp; there is
    /// no comment parameter on this path.
    pub fn create_user(
        &mut self,
        name: &str,
        login_name: &str,
        email: &str,
        args: UserArgs,
    ) -> Result<ResourceHandle, DeclarationError> {
        let user = SnowflakeUser {
            login_name: login_name.to_string(),
            email: email.to_string(),
            default_role: args.default_role,
            default_warehouse: args.default_warehouse,
            default_namespace: args.default_namespace,
            must_change_password: args.must_change_password,
            disabled: args.disabled,
            comment: Some(self.managed_comment()),
        };
        let addr = SnowflakeResourceAddress::User {
            name: login_name.to_string(),
        };
        self.registry.register(name, addr, SnowflakeResource::User(user))
    }

    pub fn create_role(&mut self, name: &str, comment: Option<&str>) -> Result<ResourceHandle, DeclarationError> {
        let role = SnowflakeRole {
            comment: Some(comment.map(str::to_string).unwrap_or_else(|| self.managed_comment())),
        };
        let addr = SnowflakeResourceAddress::Role { name: name.to_string() };
        self.registry.register(name, addr, SnowflakeResource::Role(role))
    }

    /// Grant a role to a user. Both operands may be late-bound.
    pub fn grant_role_to_user(
        &mut self,
        name: &str,
        role_name: impl Into<Input>,
        user_name: impl Into<Input>,
    ) -> Result<ResourceHandle, DeclarationError> {
        let grant = SnowflakeRoleGrant {
            role_name: role_name.into(),
            users: vec![user_name.into()],
        };
        let addr = SnowflakeResourceAddress::RoleGrant { name: name.to_string() };
        self.registry.register(name, addr, SnowflakeResource::RoleGrant(grant))
    }

    /// Declare a warehouse. Cluster counts and suspend timings are passed
    /// through unchecked; the remote provider rejects bad values at apply
    /// time.
    pub fn create_warehouse(&mut self, name: &str, args: WarehouseArgs) -> Result<ResourceHandle, DeclarationError> {
        let warehouse = SnowflakeWarehouse {
            warehouse_size: args.warehouse_size,
            auto_suspend: args.auto_suspend,
            auto_resume: args.auto_resume,
            initially_suspended: args.initially_suspended,
            min_cluster_count: args.min_cluster_count,
            max_cluster_count: args.max_cluster_count,
            comment: Some(self.managed_comment()),
        };
        let addr = SnowflakeResourceAddress::Warehouse { name: name.to_string() };
        self.registry.register(name, addr, SnowflakeResource::Warehouse(warehouse))
    }

    pub fn create_database(&mut self, name: &str, args: DatabaseArgs) -> Result<ResourceHandle, DeclarationError> {
        let database = SnowflakeDatabase {
            comment: Some(args.comment.unwrap_or_else(|| self.managed_comment())),
            data_retention_time_in_days: args.data_retention_time_in_days,
        };
        let addr = SnowflakeResourceAddress::Database { name: name.to_string() };
        self.registry.register(name, addr, SnowflakeResource::Database(database))
    }

    /// Declare a schema inside `database`, which must already be declared
    /// (or be a literal name).
    pub fn create_schema(
        &mut self,
        name: &str,
        database: impl Into<Input>,
        schema_name: &str,
        args: SchemaArgs,
    ) -> Result<ResourceHandle, DeclarationError> {
        let database = database.into();
        // Placement under the parent database fixes the schema's address.
        let database_name = self.registry.resolve(&database)?;

        let schema = SnowflakeSchema {
            database,
            comment: Some(args.comment.unwrap_or_else(|| self.managed_comment())),
            data_retention_days: args.data_retention_days,
            is_managed: args.is_managed,
        };
        let addr = SnowflakeResourceAddress::Schema {
            database: database_name,
            name: schema_name.to_string(),
        };
        self.registry.register(name, addr, SnowflakeResource::Schema(schema))
    }

    /// Declare a table inside a (database, schema) pair.
    ///
    /// A column is nullable iff its `nullable` field is exactly the string
    /// `"true"`; absence defaults to `"true"`.
    pub fn create_table(
        &mut self,
        name: &str,
        database: impl Into<Input>,
        schema: impl Into<Input>,
        table_name: &str,
        columns: Vec<TableColumnSpec>,
        args: TableArgs,
    ) -> Result<ResourceHandle, DeclarationError> {
        let database = database.into();
        let schema = schema.into();
        let database_name = self.registry.resolve(&database)?;
        let schema_name = self.registry.resolve(&schema)?;

        let columns = columns
            .into_iter()
            .map(|col| SnowflakeTableColumn {
                nullable: col.nullable.as_deref().unwrap_or("true") == "true",
                name: col.name,
                r#type: col.r#type,
            })
            .collect();

        let table = SnowflakeTable {
            database,
            schema,
            columns,
            comment: Some(args.comment.unwrap_or_else(|| self.managed_comment())),
            cluster_bys: args.cluster_by,
        };
        let addr = SnowflakeResourceAddress::Table {
            database: database_name,
            schema: schema_name,
            name: table_name.to_string(),
        };
        self.registry.register(name, addr, SnowflakeResource::Table(table))
    }

    /// Grant USAGE on a database to a role.
    pub fn grant_database_usage(
        &mut self,
        name: &str,
        database_name: impl Into<Input>,
        role: impl Into<Input>,
    ) -> Result<ResourceHandle, DeclarationError> {
        self.register_privilege_grant(
            name,
            role.into(),
            ["USAGE"],
            GrantTarget::AccountObject {
                object_type: "DATABASE".to_string(),
                object_name: database_name.into(),
            },
        )
    }

    /// Grant USAGE on a schema to a role. The schema target is the deferred
    /// join `database.schema`, since either operand may be late-bound.
    pub fn grant_schema_usage(
        &mut self,
        name: &str,
        database_name: impl Into<Input>,
        schema_name: impl Into<Input>,
        role: impl Into<Input>,
    ) -> Result<ResourceHandle, DeclarationError> {
        let schema_name = Input::concat([database_name.into(), Input::literal("."), schema_name.into()]);
        self.register_privilege_grant(name, role.into(), ["USAGE"], GrantTarget::Schema { schema_name })
    }

    /// Grant USAGE on a warehouse to a role.
    pub fn grant_warehouse_usage(
        &mut self,
        name: &str,
        warehouse_name: impl Into<Input>,
        role: impl Into<Input>,
    ) -> Result<ResourceHandle, DeclarationError> {
        self.register_privilege_grant(
            name,
            role.into(),
            ["USAGE"],
            GrantTarget::AccountObject {
                object_type: "WAREHOUSE".to_string(),
                object_name: warehouse_name.into(),
            },
        )
    }

    /// Grant SELECT on all tables in a schema to a role.
    ///
    /// Granting on a subset of tables is not implemented; rather than
    /// silently declaring nothing, that configuration is rejected outright.
    pub fn grant_table_select(
        &mut self,
        name: &str,
        database_name: impl Into<Input>,
        schema_name: impl Into<Input>,
        role: impl Into<Input>,
        args: TableSelectArgs,
    ) -> Result<ResourceHandle, DeclarationError> {
        if !args.all_tables {
            return Err(DeclarationError::PerTableSelectGrant);
        }

        let in_schema = Input::concat([database_name.into(), Input::literal("."), schema_name.into()]);
        self.register_privilege_grant(
            name,
            role.into(),
            ["SELECT"],
            GrantTarget::AllInSchema {
                object_type_plural: "TABLES".to_string(),
                in_schema,
            },
        )
    }

    /// Publish a named output binding, resolved after the engine's apply
    /// phase.
    pub fn export(&mut self, name: &str, value: Input) {
        self.registry.export(name, value);
    }

    fn register_privilege_grant<const N: usize>(
        &mut self,
        name: &str,
        role: Input,
        privileges: [&str; N],
        target: GrantTarget,
    ) -> Result<ResourceHandle, DeclarationError> {
        let grant = SnowflakePrivilegeGrant {
            account_role_name: role,
            privileges: IndexSet::from(privileges.map(str::to_string)),
            target,
        };
        let addr = SnowflakeResourceAddress::PrivilegeGrant { name: name.to_string() };
        self.registry
            .register(name, addr, SnowflakeResource::PrivilegeGrant(grant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> SnowflakeStack {
        SnowflakeStack::new(SnowflakeStackConfig {
            environment: "dev".to_string(),
        })
    }

    fn resource<'a>(stack: &'a SnowflakeStack, identifier: &str) -> &'a SnowflakeResource {
        &stack.registry().get(identifier).unwrap().resource
    }

    #[test]
    fn warehouse_defaults_match_documented_values() {
        let mut stack = stack();
        stack.create_warehouse("ANALYTICS_WH", WarehouseArgs::default()).unwrap();

        let SnowflakeResource::Warehouse(wh) = resource(&stack, "ANALYTICS_WH") else {
            panic!("expected a warehouse declaration");
        };
        assert_eq!(wh.warehouse_size, "SMALL");
        assert_eq!(wh.auto_suspend, 300);
        assert!(wh.auto_resume);
        assert!(wh.initially_suspended);
        assert_eq!(wh.min_cluster_count, 1);
        assert_eq!(wh.max_cluster_count, 1);
        assert_eq!(wh.comment.as_deref(), Some("Managed by Pulumi - dev"));
    }

    #[test]
    fn column_nullability_follows_exact_string_match() {
        let mut stack = stack();
        let db = stack.create_database("DB", DatabaseArgs::default()).unwrap();
        let schema = stack.create_schema("db-public", db.name(), "PUBLIC", SchemaArgs::default()).unwrap();
        stack
            .create_table(
                "db-events",
                db.name(),
                schema.name(),
                "EVENTS",
                vec![
                    TableColumnSpec::new("ID", "NUMBER(38,0)").nullable("false"),
                    TableColumnSpec::new("NAME", "VARCHAR(100)"),
                    TableColumnSpec::new("FLAGS", "VARCHAR(10)").nullable("flase"),
                ],
                TableArgs::default(),
            )
            .unwrap();

        let SnowflakeResource::Table(table) = resource(&stack, "db-events") else {
            panic!("expected a table declaration");
        };
        assert_eq!(table.columns.len(), 3);
        assert!(!table.columns[0].nullable);
        assert!(table.columns[1].nullable);
        // Anything that is not exactly "true" lands as non-nullable.
        assert!(!table.columns[2].nullable);
    }

    #[test]
    fn comments_default_to_environment_stamp() {
        let mut stack = SnowflakeStack::new(SnowflakeStackConfig {
            environment: "prod".to_string(),
        });
        stack.create_role("ANALYST", None).unwrap();
        stack.create_database("DB", DatabaseArgs::default()).unwrap();
        stack
            .create_database(
                "DOCS",
                DatabaseArgs {
                    comment: Some("Documentation corpus".to_string()),
                    ..DatabaseArgs::default()
                },
            )
            .unwrap();

        let SnowflakeResource::Role(role) = resource(&stack, "ANALYST") else {
            panic!("expected a role declaration");
        };
        assert_eq!(role.comment.as_deref(), Some("Managed by Pulumi - prod"));

        let SnowflakeResource::Database(db) = resource(&stack, "DB") else {
            panic!("expected a database declaration");
        };
        assert_eq!(db.comment.as_deref(), Some("Managed by Pulumi - prod"));

        let SnowflakeResource::Database(docs) = resource(&stack, "DOCS") else {
            panic!("expected a database declaration");
        };
        assert_eq!(docs.comment.as_deref(), Some("Documentation corpus"));
    }

    #[test]
    fn user_comment_is_always_stamped() {
        let mut stack = stack();
        stack
            .create_user("analyst", "ANALYST_USER", "analyst@example.com", UserArgs::default())
            .unwrap();

        let SnowflakeResource::User(user) = resource(&stack, "analyst") else {
            panic!("expected a user declaration");
        };
        assert_eq!(user.comment.as_deref(), Some("Managed by Pulumi - dev"));
        assert!(user.must_change_password);
        assert!(!user.disabled);
    }

    #[test]
    fn role_grant_links_one_role_to_one_user() {
        let mut stack = stack();
        let role = stack.create_role("ANALYST", None).unwrap();
        let user = stack
            .create_user("analyst", "ANALYST_USER", "analyst@example.com", UserArgs::default())
            .unwrap();
        stack
            .grant_role_to_user("analyst-membership", role.name(), user.name())
            .unwrap();

        let SnowflakeResource::RoleGrant(grant) = resource(&stack, "analyst-membership") else {
            panic!("expected a role grant declaration");
        };
        assert_eq!(stack.registry().resolve(&grant.role_name).unwrap(), "ANALYST");
        assert_eq!(grant.users.len(), 1);
        assert_eq!(stack.registry().resolve(&grant.users[0]).unwrap(), "ANALYST_USER");
    }

    #[test]
    fn grants_carry_fixed_privilege_sets() {
        let mut stack = stack();
        let wh = stack.create_warehouse("WH", WarehouseArgs::default()).unwrap();
        let db = stack.create_database("DB", DatabaseArgs::default()).unwrap();
        let schema = stack.create_schema("db-public", db.name(), "PUBLIC", SchemaArgs::default()).unwrap();
        let role = stack.create_role("ANALYST", None).unwrap();

        stack.grant_database_usage("g-db", db.name(), role.name()).unwrap();
        stack.grant_warehouse_usage("g-wh", wh.name(), role.name()).unwrap();
        stack
            .grant_schema_usage("g-schema", db.name(), schema.name(), role.name())
            .unwrap();
        stack
            .grant_table_select("g-select", db.name(), schema.name(), role.name(), TableSelectArgs::default())
            .unwrap();

        for identifier in ["g-db", "g-wh", "g-schema"] {
            let SnowflakeResource::PrivilegeGrant(grant) = resource(&stack, identifier) else {
                panic!("expected a privilege grant declaration");
            };
            let privileges: Vec<&String> = grant.privileges.iter().collect();
            assert_eq!(privileges, ["USAGE"]);
        }

        let SnowflakeResource::PrivilegeGrant(select) = resource(&stack, "g-select") else {
            panic!("expected a privilege grant declaration");
        };
        let privileges: Vec<&String> = select.privileges.iter().collect();
        assert_eq!(privileges, ["SELECT"]);
    }

    #[test]
    fn schema_grant_target_joins_database_and_schema() {
        let mut stack = stack();
        let db = stack.create_database("DB", DatabaseArgs::default()).unwrap();
        let schema = stack.create_schema("db-public", db.name(), "PUBLIC", SchemaArgs::default()).unwrap();
        let role = stack.create_role("ANALYST", None).unwrap();
        stack
            .grant_schema_usage("g-schema", db.name(), schema.name(), role.name())
            .unwrap();

        let SnowflakeResource::PrivilegeGrant(grant) = resource(&stack, "g-schema") else {
            panic!("expected a privilege grant declaration");
        };
        let GrantTarget::Schema { schema_name } = &grant.target else {
            panic!("expected a schema grant target");
        };
        assert_eq!(stack.registry().resolve(schema_name).unwrap(), "DB.PUBLIC");
    }

    #[test]
    fn per_table_select_grant_is_rejected() {
        let mut stack = stack();
        let db = stack.create_database("DB", DatabaseArgs::default()).unwrap();
        let schema = stack.create_schema("db-public", db.name(), "PUBLIC", SchemaArgs::default()).unwrap();
        let role = stack.create_role("ANALYST", None).unwrap();

        let before = stack.registry().len();
        let err = stack
            .grant_table_select(
                "g-select",
                db.name(),
                schema.name(),
                role.name(),
                TableSelectArgs { all_tables: false },
            )
            .unwrap_err();
        assert!(matches!(err, DeclarationError::PerTableSelectGrant));
        // Nothing was registered for the rejected grant.
        assert_eq!(stack.registry().len(), before);
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let mut stack = stack();
        stack.create_role("ANALYST", None).unwrap();
        let err = stack.create_role("ANALYST", None).unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateIdentifier(name) if name == "ANALYST"));
    }

    #[test]
    fn schema_placement_requires_declared_database() {
        let mut stack = stack();
        let ghost = Input::attr(
            SnowflakeResourceAddress::Database {
                name: "GHOST".to_string(),
            },
            "name",
        );
        let err = stack
            .create_schema("ghost-schema", ghost, "PUBLIC", SchemaArgs::default())
            .unwrap_err();
        assert!(matches!(err, DeclarationError::UnresolvedReference { .. }));
    }

    #[test]
    fn exports_resolve_to_declared_names() {
        let mut stack = stack();
        let wh = stack.create_warehouse("ANALYTICS_WH", WarehouseArgs::default()).unwrap();
        let role = stack.create_role("ANALYST", None).unwrap();
        stack.export("warehouse", wh.name());
        stack.export("role", role.name());

        let resolved = stack.registry().resolved_exports().unwrap();
        assert_eq!(resolved["warehouse"], "ANALYTICS_WH");
        assert_eq!(resolved["role"], "ANALYST");
    }
}
