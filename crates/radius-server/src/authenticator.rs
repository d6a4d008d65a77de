//! Client side user authentication over a [`ClientChannel`].

use crate::client::ClientChannel;
use crate::error::{AuthenticationError, AuthenticatorError};
use radius_proto::attributes::microsoft::{
    MS_CHAP2_SUCCESS, MsChap2Response, MsChap2Success, MsChapChallenge, MsChapResponse,
};
use radius_proto::{
    AttributeType, AttributesList, ChapChallenge, ChapPassword, Code, IdSequence, Packet,
    RadiusAttribute, ServiceType,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the password is carried in an Access-Request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthScheme {
    /// User-Password
    #[default]
    Pap,
    /// CHAP-Password + CHAP-Challenge
    Chap,
    /// MS-CHAP-Challenge + MS-CHAP-Response
    MsChap,
    /// MS-CHAP-Challenge + MS-CHAP2-Response
    MsChapV2,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthScheme::Pap => "PAP",
            AuthScheme::Chap => "CHAP",
            AuthScheme::MsChap => "MS-CHAP",
            AuthScheme::MsChapV2 => "MS-CHAPv2",
        })
    }
}

/// Builds Access-Requests for a user and interprets the reply.
#[derive(Debug, Clone)]
pub struct RadiusAuthenticator {
    scheme: AuthScheme,
    nas_identifier: String,
    nas_ip_address: Ipv4Addr,
    service_type: Option<ServiceType>,
    idents: Arc<IdSequence>,
}

impl Default for RadiusAuthenticator {
    fn default() -> Self {
        Self::new(AuthScheme::default())
    }
}

impl RadiusAuthenticator {
    pub fn new(scheme: AuthScheme) -> Self {
        RadiusAuthenticator {
            scheme,
            nas_identifier: "localhost".to_string(),
            nas_ip_address: Ipv4Addr::LOCALHOST,
            service_type: None,
            idents: Arc::new(IdSequence::new()),
        }
    }

    pub fn with_nas_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.nas_identifier = identifier.into();
        info!(nas_identifier = %self.nas_identifier, "Configured NAS-Identifier");
        self
    }

    pub fn with_nas_ip_address(mut self, address: Ipv4Addr) -> Self {
        self.nas_ip_address = address;
        info!(nas_ip_address = %address, "Configured NAS-IP-Address");
        self
    }

    pub fn with_service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = Some(service_type);
        self
    }

    /// Sequence for CHAP and MS-CHAP idents
    pub fn with_ident_sequence(mut self, idents: Arc<IdSequence>) -> Self {
        self.idents = idents;
        self
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn nas_identifier(&self) -> &str {
        &self.nas_identifier
    }

    pub fn nas_ip_address(&self) -> Ipv4Addr {
        self.nas_ip_address
    }

    /// Authenticate `user_name` and return the attributes of the Access-Accept.
    ///
    /// Any other reply fails with its Reply-Message as the reason. For
    /// MS-CHAPv2 the server must also prove knowledge of the password with
    /// a valid MS-CHAP2-Success.
    pub async fn authenticate(
        &self,
        channel: &ClientChannel,
        user_name: &str,
        password: &str,
    ) -> Result<AttributesList, AuthenticatorError> {
        let mut request = Packet::request(Code::AccessRequest);
        let attributes = &mut request.attributes;
        attributes.set(RadiusAttribute::user_name(user_name));

        let mut v2_exchange = None;
        match self.scheme {
            AuthScheme::Pap => attributes.set(RadiusAttribute::user_password(password)),
            AuthScheme::Chap => {
                let challenge = ChapChallenge::random();
                attributes.set(ChapPassword::with_sequence(&self.idents, password, &challenge).to_attribute());
                attributes.set(challenge.to_attribute());
            }
            AuthScheme::MsChap => {
                let challenge = MsChapChallenge::random_v1();
                let response = MsChapResponse::with_sequence(&self.idents, &challenge, password);
                attributes.add(challenge.to_attribute());
                attributes.add(response.to_attribute());
            }
            AuthScheme::MsChapV2 => {
                let challenge = MsChapChallenge::random();
                let response = MsChap2Response::new(self.idents.next(), user_name, password, &challenge)?;
                attributes.add(challenge.to_attribute());
                attributes.add(response.to_attribute());
                v2_exchange = Some((challenge, response));
            }
        }

        attributes.set(RadiusAttribute::string(
            AttributeType::NAS_IDENTIFIER,
            self.nas_identifier.clone(),
        ));
        attributes.set(RadiusAttribute::address(
            AttributeType::NAS_IP_ADDRESS,
            self.nas_ip_address,
        ));
        if let Some(service_type) = self.service_type {
            attributes.set(RadiusAttribute::enumerated(service_type));
        }

        let response = channel.query(request).await?;
        if response.code != Code::AccessAccept {
            let reason = response
                .find_attribute(AttributeType::REPLY_MESSAGE)
                .and_then(RadiusAttribute::as_str)
                .unwrap_or_default()
                .to_string();
            warn!(
                user = user_name,
                scheme = %self.scheme,
                code = %response.code,
                reason = %reason,
                "Authentication failure"
            );
            return Err(AuthenticationError::new(reason).into());
        }

        if let Some((challenge, v2_response)) = v2_exchange {
            let success = response
                .find_attribute(MS_CHAP2_SUCCESS)
                .ok_or_else(|| {
                    AuthenticationError::new("server response does not contain MS-CHAP2-Success")
                })?;
            let success = MsChap2Success::from_attribute(success)
                .map_err(|e| AuthenticationError::new(e.to_string()))?;
            if !success.verify(user_name, password, &challenge, &v2_response) {
                return Err(AuthenticationError::new("incorrect MS-CHAP2-Success from server").into());
            }
        }

        debug!(user = user_name, scheme = %self.scheme, "Authentication success");
        Ok(response.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_names() {
        assert_eq!(AuthScheme::default(), AuthScheme::Pap);
        assert_eq!(AuthScheme::MsChapV2.to_string(), "MS-CHAPv2");
        let scheme: AuthScheme = serde_json::from_str("\"Chap\"").unwrap();
        assert_eq!(scheme, AuthScheme::Chap);
    }

    #[test]
    fn test_builder() {
        let authenticator = RadiusAuthenticator::new(AuthScheme::MsChap)
            .with_nas_identifier("nas-1")
            .with_nas_ip_address(Ipv4Addr::new(10, 0, 0, 1))
            .with_service_type(ServiceType::Framed);
        assert_eq!(authenticator.scheme(), AuthScheme::MsChap);
        assert_eq!(authenticator.nas_identifier(), "nas-1");
        assert_eq!(authenticator.nas_ip_address(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(authenticator.service_type, Some(ServiceType::Framed));
    }
}
