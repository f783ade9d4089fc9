use std::path::PathBuf;

use snowflake_declare::{
    input::Input,
    resource::TableColumnSpec,
    stack::{DatabaseArgs, SchemaArgs, SnowflakeStack, TableArgs, TableSelectArgs, UserArgs, WarehouseArgs},
    util::{sql, store},
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut stack = SnowflakeStack::from_env();
    tracing::info!("declaring analytics stack for environment `{}`", stack.environment());

    let warehouse = stack.create_warehouse("ANALYTICS_WH", WarehouseArgs::default())?;
    let database = stack.create_database(
        "ANALYTICS",
        DatabaseArgs {
            comment: Some("Analytics landing zone".to_string()),
            ..DatabaseArgs::default()
        },
    )?;
    let schema = stack.create_schema("analytics-raw", database.name(), "RAW", SchemaArgs::default())?;
    let table = stack.create_table(
        "analytics-events",
        database.name(),
        schema.name(),
        "EVENTS",
        vec![
            TableColumnSpec::new("ID", "NUMBER(38,0)").nullable("false"),
            TableColumnSpec::new("NAME", "VARCHAR(100)"),
            TableColumnSpec::new("CREATED_AT", "TIMESTAMP_NTZ").nullable("false"),
        ],
        TableArgs {
            cluster_by: Some(vec!["ID".to_string()]),
            ..TableArgs::default()
        },
    )?;

    let role = stack.create_role("ANALYST", None)?;
    let user = stack.create_user(
        "analyst",
        "ANALYST_USER",
        "analyst@example.com",
        UserArgs {
            default_role: Some(role.name()),
            default_warehouse: Some(warehouse.name()),
            default_namespace: Some(Input::concat([
                database.name(),
                Input::literal("."),
                schema.name(),
            ])),
            ..UserArgs::default()
        },
    )?;

    stack.grant_role_to_user("analyst-membership", role.name(), user.name())?;
    stack.grant_warehouse_usage("analyst-warehouse-usage", warehouse.name(), role.name())?;
    stack.grant_database_usage("analyst-database-usage", database.name(), role.name())?;
    stack.grant_schema_usage("analyst-schema-usage", database.name(), schema.name(), role.name())?;
    stack.grant_table_select(
        "analyst-table-select",
        database.name(),
        schema.name(),
        role.name(),
        TableSelectArgs::default(),
    )?;

    stack.export("warehouse", warehouse.name());
    stack.export("database", database.name());
    stack.export("schema", schema.name());
    stack.export("table", table.name());
    stack.export("user", user.name());
    stack.export("role", role.name());

    let registry = stack.into_registry();

    for statement in sql::preview(&registry)? {
        tracing::info!("{}", statement);
    }

    let prefix = PathBuf::from(std::env::var("SNOWFLAKE_DECLARE_PREFIX").unwrap_or_else(|_| ".".to_string()));
    store::write_tree(&registry, &prefix)?;
    tracing::info!("wrote {} declarations under {}", registry.len(), prefix.display());

    println!("{}", serde_json::to_string_pretty(&registry.resolved_exports()?)?);

    Ok(())
}
