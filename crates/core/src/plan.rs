use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::SiteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Pro,
}

impl Plan {
    /// Maximum number of items a list may hold under this plan.
    pub fn limit(&self) -> usize {
        match self {
            Self::Basic => 5,
            Self::Pro => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            _ => Err(CoreError::InvalidData(format!("unknown plan: {s}"))),
        }
    }
}

/// The tenant an editing session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteContext {
    pub site_id: SiteId,
    pub plan: Plan,
}

impl SiteContext {
    pub fn new(site_id: SiteId, plan: Plan) -> Self {
        Self { site_id, plan }
    }

    pub fn item_limit(&self) -> usize {
        self.plan.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_limits() {
        assert_eq!(Plan::Basic.limit(), 5);
        assert_eq!(Plan::Pro.limit(), 10);
    }

    #[test]
    fn parse_roundtrip() {
        for plan in [Plan::Basic, Plan::Pro] {
            assert_eq!(Plan::parse(plan.as_str()).unwrap(), plan);
        }
        assert!(Plan::parse("enterprise").is_err());
    }
}
