use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle phase at which handler chains run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    BeforeCreate,
    BeforeUpdate,
    BeforeDelete,
    AfterCreate,
    AfterUpdate,
    AfterDelete,
    AfterRestore,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::BeforeCreate,
        Phase::BeforeUpdate,
        Phase::BeforeDelete,
        Phase::AfterCreate,
        Phase::AfterUpdate,
        Phase::AfterDelete,
        Phase::AfterRestore,
    ];

    pub fn is_before(&self) -> bool {
        matches!(
            self,
            Self::BeforeCreate | Self::BeforeUpdate | Self::BeforeDelete
        )
    }

    pub fn is_after(&self) -> bool {
        !self.is_before()
    }

    /// Creation phases never consult the recursion guard: the records have
    /// no identity yet on before-create, and a fresh identity on after-create.
    pub fn is_create(&self) -> bool {
        matches!(self, Self::BeforeCreate | Self::AfterCreate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeCreate => "BEFORE_CREATE",
            Self::BeforeUpdate => "BEFORE_UPDATE",
            Self::BeforeDelete => "BEFORE_DELETE",
            Self::AfterCreate => "AFTER_CREATE",
            Self::AfterUpdate => "AFTER_UPDATE",
            Self::AfterDelete => "AFTER_DELETE",
            Self::AfterRestore => "AFTER_RESTORE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BEFORE_CREATE" => Ok(Self::BeforeCreate),
            "BEFORE_UPDATE" => Ok(Self::BeforeUpdate),
            "BEFORE_DELETE" => Ok(Self::BeforeDelete),
            "AFTER_CREATE" => Ok(Self::AfterCreate),
            "AFTER_UPDATE" => Ok(Self::AfterUpdate),
            "AFTER_DELETE" => Ok(Self::AfterDelete),
            "AFTER_RESTORE" => Ok(Self::AfterRestore),
            other => Err(format!("Unknown phase '{}'", other)),
        }
    }
}
