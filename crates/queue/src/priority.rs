//! Job priority tiers (spec §6): `low|default|high`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Default,
    High,
}

impl Priority {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::High => db::repository::jobs::PRIORITY_HIGH,
            Self::Default => db::repository::jobs::PRIORITY_NORMAL,
            Self::Low => db::repository::jobs::PRIORITY_LOW,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}
