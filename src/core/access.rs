use super::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Single-identity allow-list applied to inbound posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessFilter {
    allowed: Option<UserId>,
}

impl AccessFilter {
    #[must_use]
    pub fn new(allowed: Option<UserId>) -> Self {
        Self { allowed }
    }

    /// Posts without an author (channel-signed or anonymous admin posts)
    /// always pass; they cannot come from an unauthorized user.
    #[must_use]
    pub fn check(&self, author: Option<UserId>) -> Access {
        match (self.allowed, author) {
            (None, _) | (_, None) => Access::Allow,
            (Some(allowed), Some(author)) if allowed == author => Access::Allow,
            _ => Access::Deny,
        }
    }
}
