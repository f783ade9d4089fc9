use serde::{Deserialize, Serialize};

use crate::addr::SnowflakeResourceAddress;

/// A string-valued input to a declaration.
///
/// Inputs are either literals known at declaration time, or late-bound
/// projections of another declared resource's attributes. Late-bound values
/// stay symbolic inside the descriptor; the engine substitutes them during
/// its apply phase. Concatenation of inputs is itself deferred.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Input {
    /// A plain string, known at declaration time.
    Literal(String),
    /// Projection of an attribute of a declared resource.
    Attr {
        addr: SnowflakeResourceAddress,
        attr: String,
    },
    /// Deferred concatenation, resolved once every part is resolved.
    Concat(Vec<Input>),
}

impl Input {
    pub fn literal(s: impl Into<String>) -> Self {
        Input::Literal(s.into())
    }

    pub fn attr(addr: SnowflakeResourceAddress, attr: impl Into<String>) -> Self {
        Input::Attr {
            addr,
            attr: attr.into(),
        }
    }

    /// Deferred equivalent of joining `parts` with no separator.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Input>,
    {
        Input::Concat(parts.into_iter().collect())
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Literal(s.to_string())
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::Literal(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_from_strings() {
        assert_eq!(Input::from("DB"), Input::Literal("DB".to_string()));
        assert_eq!(
            Input::from("DB".to_string()),
            Input::Literal("DB".to_string())
        );
    }

    #[test]
    fn concat_keeps_part_order() {
        let joined = Input::concat([Input::from("DB"), Input::from("."), Input::from("PUBLIC")]);
        let Input::Concat(parts) = joined else {
            panic!("expected a concat input");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], Input::Literal(".".to_string()));
    }
}
