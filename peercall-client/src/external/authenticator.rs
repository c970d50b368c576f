use crate::error::CallError;
use peercall_core::PeerId;

/// Identity and bearer token presented to the relay on connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: PeerId,
    pub user_name: String,
    pub team_name: Option<String>,
    pub company_name: Option<String>,
    pub token: String,
}

/// Source of the local identity. How the token is obtained is up to the
/// implementation.
pub trait Authenticator: Send + Sync {
    fn service_name(&self) -> &str;

    /// Stable id of this device or user, as the relay will know it.
    fn user_id(&self) -> PeerId;

    fn user_name(&self) -> String;

    fn team_name(&self) -> Option<String> {
        None
    }

    fn company_name(&self) -> Option<String> {
        None
    }

    /// `None` until signed in.
    fn authentication_token(&self) -> Option<String>;

    fn credentials(&self) -> Result<Credentials, CallError> {
        let token = self
            .authentication_token()
            .ok_or(CallError::NotAuthenticated)?;
        Ok(Credentials {
            user_id: self.user_id(),
            user_name: self.user_name(),
            team_name: self.team_name(),
            company_name: self.company_name(),
            token,
        })
    }
}

/// Fixed credentials, for tools and tests.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    credentials: Credentials,
}

impl StaticAuthenticator {
    pub fn new(user_id: impl Into<PeerId>, user_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                user_id: user_id.into(),
                user_name: user_name.into(),
                team_name: None,
                company_name: None,
                token: token.into(),
            },
        }
    }

    pub fn with_team(mut self, team_name: impl Into<String>) -> Self {
        self.credentials.team_name = Some(team_name.into());
        self
    }

    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        self.credentials.company_name = Some(company_name.into());
        self
    }
}

impl Authenticator for StaticAuthenticator {
    fn service_name(&self) -> &str {
        "static"
    }

    fn user_id(&self) -> PeerId {
        self.credentials.user_id.clone()
    }

    fn user_name(&self) -> String {
        self.credentials.user_name.clone()
    }

    fn team_name(&self) -> Option<String> {
        self.credentials.team_name.clone()
    }

    fn company_name(&self) -> Option<String> {
        self.credentials.company_name.clone()
    }

    fn authentication_token(&self) -> Option<String> {
        Some(self.credentials.token.clone())
    }

    fn credentials(&self) -> Result<Credentials, CallError> {
        Ok(self.credentials.clone())
    }
}
