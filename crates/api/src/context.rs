use warden_auth::Authorities;

/// Principal context for a request (authenticated identity + authorities).
///
/// Built by the auth middleware from verified token claims only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    authorities: Authorities,
}

impl PrincipalContext {
    pub fn new(authorities: Authorities) -> Self {
        Self { authorities }
    }

    pub fn username(&self) -> &str {
        &self.authorities.username
    }

    pub fn authorities(&self) -> &Authorities {
        &self.authorities
    }
}
