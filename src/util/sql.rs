//! Renders declarations as the CREATE/GRANT statements the engine would
//! issue against a fresh account. Preview only; execution stays with the
//! engine.

use crate::{
    error::DeclarationError,
    registry::DeclarationRegistry,
    resource::{
        GrantTarget, SnowflakeDatabase, SnowflakePrivilegeGrant, SnowflakeResource, SnowflakeRole,
        SnowflakeRoleGrant, SnowflakeSchema, SnowflakeTable, SnowflakeUser, SnowflakeWarehouse,
    },
};

pub fn build_create_role_sql(name: &str, role: &SnowflakeRole) -> String {
    let mut sql = format!("CREATE ROLE \"{}\"", name);

    if let Some(ref comment) = role.comment {
        sql.push_str(&format!(" COMMENT = '{}'", comment.replace('\'', "''")));
    }

    sql.push(';');
    sql
}

pub fn build_create_user_sql(
    registry: &DeclarationRegistry,
    name: &str,
    user: &SnowflakeUser,
) -> Result<String, DeclarationError> {
    let mut sql = format!("CREATE USER \"{}\"", name);
    let mut props = Vec::new();

    props.push(format!("LOGIN_NAME = '{}'", user.login_name));
    props.push(format!("EMAIL = '{}'", user.email));
    if let Some(ref default_warehouse) = user.default_warehouse {
        props.push(format!("DEFAULT_WAREHOUSE = {}", registry.resolve(default_warehouse)?));
    }
    if let Some(ref default_namespace) = user.default_namespace {
        props.push(format!("DEFAULT_NAMESPACE = {}", registry.resolve(default_namespace)?));
    }
    if let Some(ref default_role) = user.default_role {
        props.push(format!("DEFAULT_ROLE = {}", registry.resolve(default_role)?));
    }
    props.push(format!(
        "MUST_CHANGE_PASSWORD = {}",
        if user.must_change_password { "TRUE" } else { "FALSE" }
    ));
    if user.disabled {
        props.push("DISABLED = TRUE".to_string());
    }
    if let Some(ref comment) = user.comment {
        props.push(format!("COMMENT = '{}'", comment.replace('\'', "''")));
    }

    sql.push(' ');
    sql.push_str(&props.join(" "));
    sql.push(';');
    Ok(sql)
}

pub fn build_create_warehouse_sql(name: &str, warehouse: &SnowflakeWarehouse) -> String {
    let mut sql = format!("CREATE WAREHOUSE \"{}\"", name);
    let mut props = vec![
        format!("WAREHOUSE_SIZE = '{}'", warehouse.warehouse_size),
        format!("AUTO_SUSPEND = {}", warehouse.auto_suspend),
        format!("AUTO_RESUME = {}", if warehouse.auto_resume { "TRUE" } else { "FALSE" }),
        format!(
            "INITIALLY_SUSPENDED = {}",
            if warehouse.initially_suspended { "TRUE" } else { "FALSE" }
        ),
        format!("MIN_CLUSTER_COUNT = {}", warehouse.min_cluster_count),
        format!("MAX_CLUSTER_COUNT = {}", warehouse.max_cluster_count),
    ];
    if let Some(ref comment) = warehouse.comment {
        props.push(format!("COMMENT = '{}'", comment.replace('\'', "''")));
    }

    sql.push(' ');
    sql.push_str(&props.join(" "));
    sql.push(';');
    sql
}

pub fn build_create_database_sql(name: &str, database: &SnowflakeDatabase) -> String {
    let mut sql = format!(
        "CREATE DATABASE \"{}\" DATA_RETENTION_TIME_IN_DAYS = {}",
        name, database.data_retention_time_in_days
    );
    if let Some(ref comment) = database.comment {
        sql.push_str(&format!(" COMMENT = '{}'", comment.replace('\'', "''")));
    }
    sql.push(';');
    sql
}

pub fn build_create_schema_sql(
    registry: &DeclarationRegistry,
    name: &str,
    schema: &SnowflakeSchema,
) -> Result<String, DeclarationError> {
    let database = registry.resolve(&schema.database)?;
    let mut sql = format!("CREATE SCHEMA \"{}\".\"{}\"", database, name);
    if schema.is_managed {
        sql.push_str(" WITH MANAGED ACCESS");
    }
    if let Some(days) = schema.data_retention_days {
        sql.push_str(&format!(" DATA_RETENTION_TIME_IN_DAYS = {}", days));
    }
    if let Some(ref comment) = schema.comment {
        sql.push_str(&format!(" COMMENT = '{}'", comment.replace('\'', "''")));
    }
    sql.push(';');
    Ok(sql)
}

pub fn build_create_table_sql(
    registry: &DeclarationRegistry,
    name: &str,
    table: &SnowflakeTable,
) -> Result<String, DeclarationError> {
    let database = registry.resolve(&table.database)?;
    let schema = registry.resolve(&table.schema)?;

    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|col| {
            let mut def = format!("\"{}\" {}", col.name, col.r#type);
            if !col.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();

    let mut sql = format!(
        "CREATE TABLE \"{}\".\"{}\".\"{}\" ({})",
        database,
        schema,
        name,
        columns.join(", ")
    );
    if let Some(ref cluster_bys) = table.cluster_bys {
        if !cluster_bys.is_empty() {
            sql.push_str(&format!(" CLUSTER BY ({})", cluster_bys.join(", ")));
        }
    }
    if let Some(ref comment) = table.comment {
        sql.push_str(&format!(" COMMENT = '{}'", comment.replace('\'', "''")));
    }
    sql.push(';');
    Ok(sql)
}

pub fn build_role_grant_sql(
    registry: &DeclarationRegistry,
    grant: &SnowflakeRoleGrant,
) -> Result<Vec<String>, DeclarationError> {
    let role = registry.resolve(&grant.role_name)?;
    let mut statements = Vec::new();
    for user in &grant.users {
        statements.push(format!("GRANT ROLE {} TO USER {};", role, registry.resolve(user)?));
    }
    Ok(statements)
}

pub fn build_privilege_grant_sql(
    registry: &DeclarationRegistry,
    grant: &SnowflakePrivilegeGrant,
) -> Result<String, DeclarationError> {
    let role = registry.resolve(&grant.account_role_name)?;
    let privileges: Vec<&str> = grant.privileges.iter().map(String::as_str).collect();
    let on = match &grant.target {
        GrantTarget::AccountObject { object_type, object_name } => {
            format!("{} {}", object_type, registry.resolve(object_name)?)
        }
        GrantTarget::Schema { schema_name } => format!("SCHEMA {}", registry.resolve(schema_name)?),
        GrantTarget::AllInSchema {
            object_type_plural,
            in_schema,
        } => format!("ALL {} IN SCHEMA {}", object_type_plural, registry.resolve(in_schema)?),
    };
    Ok(format!("GRANT {} ON {} TO ROLE {};", privileges.join(", "), on, role))
}

/// Render every registered declaration, in registration order.
pub fn preview(registry: &DeclarationRegistry) -> Result<Vec<String>, DeclarationError> {
    let mut statements = Vec::new();
    for (_, entry) in registry.entries() {
        let name = entry.addr.object_name();
        match &entry.resource {
            SnowflakeResource::User(user) => statements.push(build_create_user_sql(registry, name, user)?),
            SnowflakeResource::Role(role) => statements.push(build_create_role_sql(name, role)),
            SnowflakeResource::RoleGrant(grant) => statements.extend(build_role_grant_sql(registry, grant)?),
            SnowflakeResource::Warehouse(warehouse) => statements.push(build_create_warehouse_sql(name, warehouse)),
            SnowflakeResource::Database(database) => statements.push(build_create_database_sql(name, database)),
            SnowflakeResource::Schema(schema) => statements.push(build_create_schema_sql(registry, name, schema)?),
            SnowflakeResource::Table(table) => statements.push(build_create_table_sql(registry, name, table)?),
            SnowflakeResource::PrivilegeGrant(grant) => statements.push(build_privilege_grant_sql(registry, grant)?),
        }
    }
    Ok(statements)
}
