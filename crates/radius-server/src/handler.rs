//! Request handling: the [`RequestHandler`] seam used by the server runtime,
//! the pluggable back-end module traits and [`StandardRequestHandler`],
//! which routes requests to them.

use crate::accounting::AccountingModule;
use crate::authenticator::AuthScheme;
use crate::error::{AuthenticationError, HandlerError};
use async_trait::async_trait;
use radius_proto::attributes::microsoft::{
    MS_CHAP_CHALLENGE, MS_CHAP_RESPONSE, MS_CHAP2_RESPONSE, MsChap2Response, MsChapChallenge,
    MsChapResponse,
};
use radius_proto::{
    AcctStatusType, AttributeType, AttributesList, ChapChallenge, ChapPassword, Code, Packet,
    RadiusAttribute,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Produces the response to a decoded request.
///
/// `Ok(None)` means the request is silently dropped.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle_request(&self, request: &Packet) -> Result<Option<Packet>, HandlerError>;
}

/// Checks a clear text password.
///
/// Returns the attributes to add to the Access-Accept.
#[async_trait]
pub trait PapAuthModule: Send + Sync {
    async fn auth_pap(
        &self,
        user_name: &str,
        password: &str,
        request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError>;
}

#[async_trait]
pub trait ChapAuthModule: Send + Sync {
    async fn auth_chap(
        &self,
        user_name: &str,
        password: &ChapPassword,
        challenge: &ChapChallenge,
        request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError>;
}

#[async_trait]
pub trait MsChapAuthModule: Send + Sync {
    async fn auth_ms_chap(
        &self,
        user_name: &str,
        challenge: &MsChapChallenge,
        response: &MsChapResponse,
        request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError>;
}

/// MS-CHAPv2 back end. A successful result should carry the
/// MS-CHAP2-Success the peer needs to authenticate the server.
#[async_trait]
pub trait MsChap2AuthModule: Send + Sync {
    async fn auth_ms_chap2(
        &self,
        user_name: &str,
        challenge: &MsChapChallenge,
        response: &MsChap2Response,
        request: &AttributesList,
    ) -> Result<AttributesList, AuthenticationError>;
}

/// Routes Access-Requests by authentication scheme and Accounting-Requests
/// to the configured modules.
///
/// A request whose scheme has no module, or that lacks User-Name, gets no
/// response.
#[derive(Clone, Default)]
pub struct StandardRequestHandler {
    pap: Option<Arc<dyn PapAuthModule>>,
    chap: Option<Arc<dyn ChapAuthModule>>,
    ms_chap: Option<Arc<dyn MsChapAuthModule>>,
    ms_chap2: Option<Arc<dyn MsChap2AuthModule>>,
    accounting: Option<Arc<dyn AccountingModule>>,
    accounting_interval: Option<u32>,
}

impl StandardRequestHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pap_module(mut self, module: Arc<dyn PapAuthModule>) -> Self {
        self.pap = Some(module);
        self
    }

    pub fn with_chap_module(mut self, module: Arc<dyn ChapAuthModule>) -> Self {
        self.chap = Some(module);
        self
    }

    pub fn with_ms_chap_module(mut self, module: Arc<dyn MsChapAuthModule>) -> Self {
        self.ms_chap = Some(module);
        self
    }

    pub fn with_ms_chap2_module(mut self, module: Arc<dyn MsChap2AuthModule>) -> Self {
        self.ms_chap2 = Some(module);
        self
    }

    pub fn with_accounting_module(mut self, module: Arc<dyn AccountingModule>) -> Self {
        self.accounting = Some(module);
        self
    }

    /// Acct-Interim-Interval added to every Access-Accept that lacks one
    pub fn with_accounting_interval(mut self, interval: Option<u32>) -> Self {
        match interval {
            Some(seconds) => info!(seconds, "Configured accounting interval"),
            None => info!("Accounting interval is disabled"),
        }
        self.accounting_interval = interval;
        self
    }

    pub fn accounting_interval(&self) -> Option<u32> {
        self.accounting_interval
    }

    async fn handle_access_request(&self, request: &Packet) -> Result<Option<Packet>, HandlerError> {
        let Some(user_name) = request.user_name() else {
            debug!(request_id = request.identifier, "Access-Request without User-Name");
            return Ok(None);
        };
        let attributes = &request.attributes;

        let (scheme, result) = if let Some(password) = request.find_attribute(AttributeType::USER_PASSWORD) {
            let Some(module) = &self.pap else {
                return Ok(self.no_module(AuthScheme::Pap, user_name));
            };
            let password = password
                .as_str()
                .ok_or_else(|| HandlerError::IncorrectRequest("User-Password is not text".to_string()))?;
            (AuthScheme::Pap, module.auth_pap(user_name, password, attributes).await)
        } else if let (Some(password), Some(challenge)) = (
            request.find_attribute(AttributeType::CHAP_PASSWORD),
            request.find_attribute(AttributeType::CHAP_CHALLENGE),
        ) {
            let Some(module) = &self.chap else {
                return Ok(self.no_module(AuthScheme::Chap, user_name));
            };
            let password = ChapPassword::from_attribute(password).map_err(incorrect)?;
            let challenge = ChapChallenge::from_attribute(challenge).map_err(incorrect)?;
            (
                AuthScheme::Chap,
                module.auth_chap(user_name, &password, &challenge, attributes).await,
            )
        } else if let Some(challenge) = request.find_attribute(MS_CHAP_CHALLENGE) {
            let challenge = MsChapChallenge::from_attribute(challenge).map_err(incorrect)?;
            if let Some(response) = request.find_attribute(MS_CHAP_RESPONSE) {
                let Some(module) = &self.ms_chap else {
                    return Ok(self.no_module(AuthScheme::MsChap, user_name));
                };
                let response = MsChapResponse::from_attribute(response).map_err(incorrect)?;
                (
                    AuthScheme::MsChap,
                    module.auth_ms_chap(user_name, &challenge, &response, attributes).await,
                )
            } else if let Some(response) = request.find_attribute(MS_CHAP2_RESPONSE) {
                let Some(module) = &self.ms_chap2 else {
                    return Ok(self.no_module(AuthScheme::MsChapV2, user_name));
                };
                let response = MsChap2Response::from_attribute(response).map_err(incorrect)?;
                (
                    AuthScheme::MsChapV2,
                    module.auth_ms_chap2(user_name, &challenge, &response, attributes).await,
                )
            } else {
                debug!(user = user_name, "MS-CHAP-Challenge without a response");
                return Ok(None);
            }
        } else {
            debug!(user = user_name, "Unknown authentication scheme");
            return Ok(None);
        };

        let response = match result {
            Ok(mut reply) => {
                if let Some(interval) = self.accounting_interval {
                    if !reply.contains(AttributeType::ACCT_INTERIM_INTERVAL) {
                        reply.add(RadiusAttribute::integer(AttributeType::ACCT_INTERIM_INTERVAL, interval));
                    }
                }
                debug!(user = user_name, scheme = %scheme, "Authentication success");
                let mut accept = Packet::response(Code::AccessAccept, request);
                accept.attributes.add_all(reply);
                accept
            }
            Err(e) => {
                warn!(user = user_name, scheme = %scheme, reason = %e, "Authentication failure");
                let mut reject = Packet::response(Code::AccessReject, request);
                reject.add_attribute(RadiusAttribute::reply_message(e.reason()));
                reject
            }
        };
        Ok(Some(response))
    }

    async fn handle_accounting_request(&self, request: &Packet) -> Result<Option<Packet>, HandlerError> {
        let Some(module) = &self.accounting else {
            debug!(request_id = request.identifier, "No accounting module configured");
            return Ok(None);
        };

        let status = request
            .find_attribute(AttributeType::ACCT_STATUS_TYPE)
            .ok_or_else(|| HandlerError::IncorrectRequest("missing Acct-Status-Type".to_string()))?;
        let status = status.as_enum::<AcctStatusType>().ok_or_else(|| {
            HandlerError::IncorrectRequest(format!("unknown Acct-Status-Type {}", status.value()))
        })?;

        let session_id = request
            .find_attribute(AttributeType::ACCT_SESSION_ID)
            .ok_or_else(|| HandlerError::IncorrectRequest("missing Acct-Session-Id".to_string()))?;
        let id = session_id
            .as_str()
            .ok_or_else(|| HandlerError::IncorrectRequest("Acct-Session-Id is not text".to_string()))?;

        match module.process_accounting(status, id, &request.attributes).await {
            Ok(mut reply) => {
                reply.set(session_id.clone());
                let mut response = Packet::response(Code::AccountingResponse, request);
                response.attributes.add_all(reply);
                Ok(Some(response))
            }
            Err(e) => {
                error!(session_id = id, status = ?status, error = %e, "Accounting error");
                Ok(None)
            }
        }
    }

    fn no_module(&self, scheme: AuthScheme, user_name: &str) -> Option<Packet> {
        debug!(user = user_name, scheme = %scheme, "No module configured for scheme");
        None
    }
}

fn incorrect(e: impl std::fmt::Display) -> HandlerError {
    HandlerError::IncorrectRequest(e.to_string())
}

#[async_trait]
impl RequestHandler for StandardRequestHandler {
    async fn handle_request(&self, request: &Packet) -> Result<Option<Packet>, HandlerError> {
        match request.code {
            Code::AccessRequest => self.handle_access_request(request).await,
            Code::AccountingRequest => self.handle_accounting_request(request).await,
            code => Err(HandlerError::IncorrectRequest(format!("{code} is not a request"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::SimpleAccountingModule;
    use crate::users::SimpleAuthModule;
    use radius_proto::attributes::microsoft::MS_CHAP2_SUCCESS;
    use radius_proto::{AttributeValue, IdSequence};
    use std::net::Ipv4Addr;

    fn users() -> Arc<SimpleAuthModule> {
        let mut module = SimpleAuthModule::new();
        module.add_user("alice", "password");
        module.add_user_with_address("bob", "hunter2", Ipv4Addr::new(10, 8, 0, 2));
        Arc::new(module)
    }

    fn full_handler() -> StandardRequestHandler {
        let users = users();
        StandardRequestHandler::new()
            .with_pap_module(users.clone())
            .with_chap_module(users.clone())
            .with_ms_chap_module(users.clone())
            .with_ms_chap2_module(users)
            .with_accounting_module(Arc::new(SimpleAccountingModule::new()))
    }

    fn access_request(user: &str) -> Packet {
        let mut packet = Packet::request(Code::AccessRequest).with_attribute(RadiusAttribute::user_name(user));
        packet.identifier = 17;
        packet
    }

    #[tokio::test]
    async fn test_pap_accept_and_reject() {
        let handler = full_handler().with_accounting_interval(Some(300));

        let request = access_request("bob").with_attribute(RadiusAttribute::user_password("hunter2"));
        let response = handler.handle_request(&request).await.unwrap().unwrap();
        assert_eq!(response.code, Code::AccessAccept);
        assert_eq!(response.identifier, 17);
        assert_eq!(
            response.find_attribute(AttributeType::FRAMED_IP_ADDRESS).and_then(|a| a.as_address()),
            Some(Ipv4Addr::new(10, 8, 0, 2))
        );
        assert_eq!(
            response.find_attribute(AttributeType::ACCT_INTERIM_INTERVAL).and_then(|a| a.as_integer()),
            Some(300)
        );

        let request = access_request("bob").with_attribute(RadiusAttribute::user_password("wrong"));
        let response = handler.handle_request(&request).await.unwrap().unwrap();
        assert_eq!(response.code, Code::AccessReject);
        assert!(response.find_attribute(AttributeType::REPLY_MESSAGE).is_some());
        assert!(response.find_attribute(AttributeType::ACCT_INTERIM_INTERVAL).is_none());
    }

    #[tokio::test]
    async fn test_chap_and_ms_chap() {
        let handler = full_handler();
        let idents = IdSequence::starting_at(3);

        let challenge = ChapChallenge::random();
        let request = access_request("alice")
            .with_attribute(ChapPassword::with_sequence(&idents, "password", &challenge).to_attribute())
            .with_attribute(challenge.to_attribute());
        let response = handler.handle_request(&request).await.unwrap().unwrap();
        assert_eq!(response.code, Code::AccessAccept);

        let challenge = MsChapChallenge::random_v1();
        let request = access_request("alice")
            .with_attribute(challenge.to_attribute())
            .with_attribute(MsChapResponse::with_sequence(&idents, &challenge, "nope").to_attribute());
        let response = handler.handle_request(&request).await.unwrap().unwrap();
        assert_eq!(response.code, Code::AccessReject);
    }

    #[tokio::test]
    async fn test_ms_chap2_success_attribute() {
        let handler = full_handler();
        let challenge = MsChapChallenge::random();
        let v2 = MsChap2Response::new(9, "alice", "password", &challenge).unwrap();
        let request = access_request("alice")
            .with_attribute(challenge.to_attribute())
            .with_attribute(v2.to_attribute());

        let response = handler.handle_request(&request).await.unwrap().unwrap();
        assert_eq!(response.code, Code::AccessAccept);
        let success = response.find_attribute(MS_CHAP2_SUCCESS).unwrap();
        assert_eq!(success.ident(), Some(9));
        assert!(success.as_str().unwrap().starts_with("S="));
    }

    #[tokio::test]
    async fn test_no_response_cases() {
        let pap_only = StandardRequestHandler::new().with_pap_module(users());

        // No User-Name
        let request = Packet::request(Code::AccessRequest).with_attribute(RadiusAttribute::user_password("x"));
        assert!(pap_only.handle_request(&request).await.unwrap().is_none());

        // No credentials at all
        assert!(pap_only.handle_request(&access_request("alice")).await.unwrap().is_none());

        // MS-CHAPv2 without a module
        let challenge = MsChapChallenge::random();
        let request = access_request("alice")
            .with_attribute(challenge.to_attribute())
            .with_attribute(MsChap2Response::new(1, "alice", "password", &challenge).unwrap().to_attribute());
        assert!(pap_only.handle_request(&request).await.unwrap().is_none());

        // Accounting without a module
        let request = Packet::request(Code::AccountingRequest);
        assert!(pap_only.handle_request(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accounting_response_carries_session_id() {
        let handler = full_handler();
        let request = Packet::request(Code::AccountingRequest)
            .with_attribute(RadiusAttribute::enumerated(AcctStatusType::Start))
            .with_attribute(RadiusAttribute::string(AttributeType::ACCT_SESSION_ID, "sess-1"))
            .with_attribute(RadiusAttribute::user_name("alice"));

        let response = handler.handle_request(&request).await.unwrap().unwrap();
        assert_eq!(response.code, Code::AccountingResponse);
        assert_eq!(
            response.find_attribute(AttributeType::ACCT_SESSION_ID).and_then(|a| a.as_str()),
            Some("sess-1")
        );

        // Duplicate start is an accounting error: dropped
        assert!(handler.handle_request(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accounting_incorrect_requests() {
        let handler = full_handler();

        let missing_id = Packet::request(Code::AccountingRequest)
            .with_attribute(RadiusAttribute::enumerated(AcctStatusType::Start));
        assert!(matches!(
            handler.handle_request(&missing_id).await,
            Err(HandlerError::IncorrectRequest(_))
        ));

        let unknown_status = Packet::request(Code::AccountingRequest)
            .with_attribute(RadiusAttribute::new(AttributeType::ACCT_STATUS_TYPE, AttributeValue::Integer(99)))
            .with_attribute(RadiusAttribute::string(AttributeType::ACCT_SESSION_ID, "sess-2"));
        assert!(matches!(
            handler.handle_request(&unknown_status).await,
            Err(HandlerError::IncorrectRequest(_))
        ));
    }
}
