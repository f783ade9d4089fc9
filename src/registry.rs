use indexmap::IndexMap;

use crate::{
    addr::SnowflakeResourceAddress, error::DeclarationError, input::Input, resource::SnowflakeResource,
};

/// Handle to a registered declaration, used to thread a resource's
/// attributes into declarations that depend on it.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    addr: SnowflakeResourceAddress,
}

impl ResourceHandle {
    pub(crate) fn new(addr: SnowflakeResourceAddress) -> Self {
        ResourceHandle { addr }
    }

    pub fn addr(&self) -> &SnowflakeResourceAddress {
        &self.addr
    }

    /// Late-bound projection of the resource's name attribute.
    pub fn name(&self) -> Input {
        Input::attr(self.addr.clone(), "name")
    }
}

/// One registered declaration.
#[derive(Debug, Clone)]
pub struct DeclarationEntry {
    pub addr: SnowflakeResourceAddress,
    pub resource: SnowflakeResource,
}

/// Ordered set of declarations produced by a single program run.
///
/// The registry is a write-once sink from the constructors' point of view;
/// the orchestration engine consumes it after the program finishes. Nothing
/// here talks to Snowflake.
#[derive(Debug, Default)]
pub struct DeclarationRegistry {
    entries: IndexMap<String, DeclarationEntry>,
    exports: IndexMap<String, Input>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration under its identifier. Identifiers must be
    /// unique within a run.
    pub fn register(
        &mut self,
        identifier: &str,
        addr: SnowflakeResourceAddress,
        resource: SnowflakeResource,
    ) -> Result<ResourceHandle, DeclarationError> {
        if self.entries.contains_key(identifier) {
            return Err(DeclarationError::DuplicateIdentifier(identifier.to_string()));
        }

        tracing::debug!("registering declaration `{}` at {:?}", identifier, addr);
        self.entries.insert(
            identifier.to_string(),
            DeclarationEntry {
                addr: addr.clone(),
                resource,
            },
        );
        Ok(ResourceHandle::new(addr))
    }

    pub fn get(&self, identifier: &str) -> Option<&DeclarationEntry> {
        self.entries.get(identifier)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DeclarationEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_addr(&self, addr: &SnowflakeResourceAddress) -> bool {
        self.entries.values().any(|entry| entry.addr == *addr)
    }

    /// Resolve an input to a concrete string.
    ///
    /// Attribute projections resolve against declarations registered in this
    /// run; resolution of values the remote provider generates at apply time
    /// is the engine's job, not ours.
    pub fn resolve(&self, input: &Input) -> Result<String, DeclarationError> {
        match input {
            Input::Literal(s) => Ok(s.clone()),
            Input::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&self.resolve(part)?);
                }
                Ok(out)
            }
            Input::Attr { addr, attr } => {
                if !self.contains_addr(addr) {
                    return Err(DeclarationError::UnresolvedReference {
                        addr: addr.clone(),
                        attr: attr.clone(),
                    });
                }
                match attr.as_str() {
                    "name" => Ok(addr.object_name().to_string()),
                    _ => Err(DeclarationError::UnknownAttribute {
                        addr: addr.clone(),
                        attr: attr.clone(),
                    }),
                }
            }
        }
    }

    /// Publish a named output binding.
    pub fn export(&mut self, name: &str, value: Input) {
        self.exports.insert(name.to_string(), value);
    }

    pub fn exports(&self) -> impl Iterator<Item = (&String, &Input)> {
        self.exports.iter()
    }

    /// Exports with every late-bound value resolved.
    pub fn resolved_exports(&self) -> Result<IndexMap<String, String>, DeclarationError> {
        let mut out = IndexMap::new();
        for (name, value) in &self.exports {
            out.insert(name.clone(), self.resolve(value)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::SnowflakeRole;

    fn role_addr(name: &str) -> SnowflakeResourceAddress {
        SnowflakeResourceAddress::Role { name: name.to_string() }
    }

    fn role() -> SnowflakeResource {
        SnowflakeResource::Role(SnowflakeRole { comment: None })
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let mut registry = DeclarationRegistry::new();
        registry.register("ANALYST", role_addr("ANALYST"), role()).unwrap();

        let err = registry.register("ANALYST", role_addr("OTHER"), role()).unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateIdentifier(name) if name == "ANALYST"));
    }

    #[test]
    fn resolves_literals_and_concats() {
        let registry = DeclarationRegistry::new();
        let joined = Input::concat([Input::from("DB"), Input::from("."), Input::from("PUBLIC")]);
        assert_eq!(registry.resolve(&joined).unwrap(), "DB.PUBLIC");
    }

    #[test]
    fn resolves_name_attrs_of_declared_resources() {
        let mut registry = DeclarationRegistry::new();
        let handle = registry.register("ANALYST", role_addr("ANALYST"), role()).unwrap();
        assert_eq!(registry.resolve(&handle.name()).unwrap(), "ANALYST");
    }

    #[test]
    fn undeclared_attrs_do_not_resolve() {
        let registry = DeclarationRegistry::new();
        let ghost = Input::attr(role_addr("GHOST"), "name");
        let err = registry.resolve(&ghost).unwrap_err();
        assert!(matches!(err, DeclarationError::UnresolvedReference { .. }));
    }

    #[test]
    fn unknown_attributes_do_not_resolve() {
        let mut registry = DeclarationRegistry::new();
        registry.register("ANALYST", role_addr("ANALYST"), role()).unwrap();

        let input = Input::attr(role_addr("ANALYST"), "owner");
        let err = registry.resolve(&input).unwrap_err();
        assert!(matches!(err, DeclarationError::UnknownAttribute { attr, .. } if attr == "owner"));
    }

    #[test]
    fn exports_keep_insertion_order() {
        let mut registry = DeclarationRegistry::new();
        registry.register("ANALYST", role_addr("ANALYST"), role()).unwrap();
        registry.export("role", Input::attr(role_addr("ANALYST"), "name"));
        registry.export("label", Input::from("analytics"));

        let resolved = registry.resolved_exports().unwrap();
        let keys: Vec<&String> = resolved.keys().collect();
        assert_eq!(keys, ["role", "label"]);
        assert_eq!(resolved["role"], "ANALYST");
        assert_eq!(resolved["label"], "analytics");
    }
}
