//! In-memory user table implementing every authentication scheme.

use crate::config::User;
use crate::error::AuthenticationError;
use crate::handler::{ChapAuthModule, MsChap2AuthModule, MsChapAuthModule, PapAuthModule};
use async_trait::async_trait;
use radius_proto::attributes::microsoft::{MsChap2Response, MsChap2Success, MsChapChallenge, MsChapResponse};
use radius_proto::{AttributeType, AttributesList, ChapChallenge, ChapPassword, RadiusAttribute, mschap};
use std::collections::HashMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    framed_ip_address: Option<Ipv4Addr>,
}

/// Users with clear text passwords, as loaded from the configuration
#[derive(Debug, Clone, Default)]
pub struct SimpleAuthModule {
    users: HashMap<String, Account>,
}

impl SimpleAuthModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: &[User]) -> Self {
        let mut module = SimpleAuthModule::new();
        for user in users {
            module.users.insert(
                user.username.clone(),
                Account {
                    password: user.password.clone(),
                    framed_ip_address: user.framed_ip_address,
                },
            );
        }
        module
    }

    pub fn add_user(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(
            username.into(),
            Account {
                password: password.into(),
                framed_ip_address: None,
            },
        );
    }

    /// Add a user who is assigned `address` on Access-Accept
    pub fn add_user_with_address(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        address: Ipv4Addr,
    ) {
        self.users.insert(
            username.into(),
            Account {
                password: password.into(),
                framed_ip_address: Some(address),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn account(&self, user_name: &str) -> Result<&Account, AuthenticationError> {
        self.users
            .get(user_name)
            .ok_or_else(|| AuthenticationError::new("unknown user"))
    }

    fn accept(account: &Account) -> AttributesList {
        let mut reply = AttributesList::new();
        if let Some(address) = account.framed_ip_address {
            reply.add(RadiusAttribute::address(AttributeType::FRAMED_IP_ADDRESS, address));
        }
        reply
    }
}

fn bad_password() -> AuthenticationError {
    AuthenticationError::new("incorrect password")
}

#[async_trait]
impl PapAuthModule for SimpleAuthModule {
    async fn auth_pap(
        &self,
        user_name: &str,
        password: &str,
        _request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError> {
        let account = self.account(user_name)?;
        if !mschap::constant_time_eq(account.password.as_bytes(), password.as_bytes()) {
            return Err(bad_password());
        }
        Ok(Self::accept(account))
    }
}

#[async_trait]
impl ChapAuthModule for SimpleAuthModule {
    async fn auth_chap(
        &self,
        user_name: &str,
        password: &ChapPassword,
        challenge: &ChapChallenge,
        _request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError> {
        let account = self.account(user_name)?;
        if !password.verify(&account.password, challenge) {
            return Err(bad_password());
        }
        Ok(Self::accept(account))
    }
}

#[async_trait]
impl MsChapAuthModule for SimpleAuthModule {
    async fn auth_ms_chap(
        &self,
        user_name: &str,
        challenge: &MsChapChallenge,
        response: &MsChapResponse,
        _request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError> {
        let account = self.account(user_name)?;
        if !response.verify(challenge, &account.password) {
            return Err(bad_password());
        }
        Ok(Self::accept(account))
    }
}

#[async_trait]
impl MsChap2AuthModule for SimpleAuthModule {
    async fn auth_ms_chap2(
        &self,
        user_name: &str,
        challenge: &MsChapChallenge,
        response: &MsChap2Response,
        _request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError> {
        let account = self.account(user_name)?;
        if !response.verify(user_name, &account.password, challenge) {
            return Err(bad_password());
        }
        let success = MsChap2Success::new(user_name, &account.password, challenge, response)
            .map_err(|e| AuthenticationError::new(e.to_string()))?;
        let mut reply = Self::accept(account);
        reply.add(success.to_attribute());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pap() {
        let mut module = SimpleAuthModule::new();
        module.add_user("testuser", "testpass");
        let request = AttributesList::new();

        assert!(module.auth_pap("testuser", "testpass", &request).await.is_ok());
        let err = module.auth_pap("testuser", "wrongpass", &request).await.unwrap_err();
        assert_eq!(err.reason(), "incorrect password");
        let err = module.auth_pap("wronguser", "testpass", &request).await.unwrap_err();
        assert_eq!(err.reason(), "unknown user");
    }

    #[tokio::test]
    async fn test_from_users_assigns_address() {
        let module = SimpleAuthModule::from_users(&[User {
            username: "bob".to_string(),
            password: "pw".to_string(),
            framed_ip_address: Some(Ipv4Addr::new(10, 0, 0, 5)),
        }]);
        assert_eq!(module.len(), 1);

        let reply = module.auth_pap("bob", "pw", &AttributesList::new()).await.unwrap();
        assert_eq!(
            reply.get_first(AttributeType::FRAMED_IP_ADDRESS).and_then(|a| a.as_address()),
            Some(Ipv4Addr::new(10, 0, 0, 5))
        );
    }

    #[tokio::test]
    async fn test_ms_chap2_success_verifies_on_client() {
        let mut module = SimpleAuthModule::new();
        module.add_user("user", "accept");
        let challenge = MsChapChallenge::random();
        let response = MsChap2Response::new(4, "user", "accept", &challenge).unwrap();

        let reply = module
            .auth_ms_chap2("user", &challenge, &response, &AttributesList::new())
            .await
            .unwrap();
        let success = reply
            .get_first(radius_proto::attributes::microsoft::MS_CHAP2_SUCCESS)
            .map(MsChap2Success::from_attribute)
            .unwrap()
            .unwrap();
        assert!(success.verify("user", "accept", &challenge, &response));

        let wrong = MsChap2Response::new(4, "user", "reject", &challenge).unwrap();
        assert!(module
            .auth_ms_chap2("user", &challenge, &wrong, &AttributesList::new())
            .await
            .is_err());
    }
}
