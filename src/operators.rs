use crate::operator_roles::OPERATOR_TABLE;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// An operator as it appears in the replay: an opaque u64 id.
/// Zero means "no operator yet" (empty roster slot, or a descriptor read
/// before the pick phase finished).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Operator(pub u64);

/// Which side an operator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Attack,
    Defense,
}

impl Role {
    pub fn opposite(self) -> Role {
        match self {
            Role::Attack => Role::Defense,
            Role::Defense => Role::Attack,
        }
    }
}

impl Operator {
    pub fn id(self) -> u64 {
        self.0
    }

    /// Display name, if the id is in the baked table.
    pub fn name(self) -> Option<&'static str> {
        OPERATOR_TABLE
            .iter()
            .find(|(id, _, _)| *id == self.0)
            .map(|(_, name, _)| *name)
    }

    /// Side of the operator. `None` for ids missing from the baked table;
    /// callers skip role inference in that case rather than failing.
    pub fn role(self) -> Option<Role> {
        OPERATOR_TABLE
            .iter()
            .find(|(id, _, _)| *id == self.0)
            .map(|(_, _, role)| *role)
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        OPERATOR_TABLE
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name))
            .map(|(id, _, _)| Operator(*id))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Operator({})", self.0),
        }
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Operator", 2)?;
        s.serialize_field("name", &self.to_string())?;
        s.serialize_field("id", &self.0)?;
        s.end()
    }
}
