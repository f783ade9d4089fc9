use std::path::Path;

use thiserror::Error;

use crate::addr::SnowflakeResourceAddress;

#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("a declaration named `{0}` was already registered in this run")]
    DuplicateIdentifier(String),

    #[error("cannot resolve `{attr}` of {addr:?}: the resource is not declared")]
    UnresolvedReference {
        addr: SnowflakeResourceAddress,
        attr: String,
    },

    #[error("{addr:?} has no attribute `{attr}`")]
    UnknownAttribute {
        addr: SnowflakeResourceAddress,
        attr: String,
    },

    #[error("SELECT grants on individual tables are not implemented; declare the grant with `all_tables` set")]
    PerTableSelectGrant,
}

pub fn invalid_addr_path(path: &Path) -> anyhow::Error {
    anyhow::anyhow!("not a Snowflake declaration path: {}", path.display())
}
