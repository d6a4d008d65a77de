//! Accounting back end seam and an in-memory session store.

use crate::error::AccountingError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use radius_proto::{AcctStatusType, AttributeType, AttributesList, RadiusAttribute};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Processes one Accounting-Request.
///
/// Returns attributes for the Accounting-Response. An error drops the
/// request so the NAS retransmits it.
#[async_trait]
pub trait AccountingModule: Send + Sync {
    async fn process_accounting(
        &self,
        status: AcctStatusType,
        session_id: &str,
        request: &AttributesList,
    ) -> Result<AttributesList, AccountingError>;
}

/// Session information tracked by the accounting system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Acct-Session-Id
    pub session_id: String,
    pub username: Option<String>,
    /// NAS-IP-Address of the reporting NAS
    pub nas_ip: Option<Ipv4Addr>,
    pub framed_ip: Option<Ipv4Addr>,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub input_octets: u32,
    pub output_octets: u32,
    pub input_packets: u32,
    pub output_packets: u32,
    /// Acct-Session-Time in seconds
    pub session_time: u32,
    pub terminate_cause: Option<u32>,
}

impl Session {
    fn start(session_id: &str, request: &AttributesList) -> Self {
        let now = Utc::now();
        let mut session = Session {
            session_id: session_id.to_string(),
            username: request
                .get_first(AttributeType::USER_NAME)
                .and_then(RadiusAttribute::as_str)
                .map(str::to_string),
            nas_ip: address(request, AttributeType::NAS_IP_ADDRESS),
            framed_ip: address(request, AttributeType::FRAMED_IP_ADDRESS),
            start_time: now,
            last_update: now,
            input_octets: 0,
            output_octets: 0,
            input_packets: 0,
            output_packets: 0,
            session_time: 0,
            terminate_cause: None,
        };
        session.update(request);
        session
    }

    fn same_origin(&self, other: &Session) -> bool {
        self.username == other.username && self.nas_ip == other.nas_ip
    }

    fn update(&mut self, request: &AttributesList) {
        self.last_update = Utc::now();
        let counters = [
            (AttributeType::ACCT_SESSION_TIME, &mut self.session_time),
            (AttributeType::ACCT_INPUT_OCTETS, &mut self.input_octets),
            (AttributeType::ACCT_OUTPUT_OCTETS, &mut self.output_octets),
            (AttributeType::ACCT_INPUT_PACKETS, &mut self.input_packets),
            (AttributeType::ACCT_OUTPUT_PACKETS, &mut self.output_packets),
        ];
        for (attr_type, field) in counters {
            if let Some(value) = integer(request, attr_type) {
                *field = value;
            }
        }
        if let Some(ip) = address(request, AttributeType::FRAMED_IP_ADDRESS) {
            self.framed_ip = Some(ip);
        }
    }
}

fn integer(request: &AttributesList, attr_type: AttributeType) -> Option<u32> {
    request.get_first(attr_type).and_then(RadiusAttribute::as_integer)
}

fn address(request: &AttributesList, attr_type: AttributeType) -> Option<Ipv4Addr> {
    request.get_first(attr_type).and_then(RadiusAttribute::as_address)
}

/// In-memory accounting keyed by Acct-Session-Id.
///
/// Start opens a session, Interim-Update refreshes its counters and Stop
/// closes it. Accounting-Off closes every session of the reporting NAS.
#[derive(Debug, Default)]
pub struct SimpleAccountingModule {
    sessions: DashMap<String, Session>,
}

impl SimpleAccountingModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    pub fn active_sessions(&self) -> Vec<Session> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[async_trait]
impl AccountingModule for SimpleAccountingModule {
    async fn process_accounting(
        &self,
        status: AcctStatusType,
        session_id: &str,
        request: &AttributesList,
    ) -> Result<AttributesList, AccountingError> {
        match status {
            AcctStatusType::Start => {
                let session = Session::start(session_id, request);
                match self.sessions.entry(session_id.to_string()) {
                    Entry::Occupied(existing) => {
                        // A retransmitted Start is acknowledged again
                        if !existing.get().same_origin(&session) {
                            return Err(AccountingError::DuplicateSession(session_id.to_string()));
                        }
                        warn!(session_id, user = ?session.username, "Duplicate Accounting-Start acknowledged");
                    }
                    Entry::Vacant(slot) => {
                        info!(session_id, user = ?session.username, "Accounting session started");
                        slot.insert(session);
                    }
                }
            }
            AcctStatusType::InterimUpdate => {
                let mut session = self
                    .sessions
                    .get_mut(session_id)
                    .ok_or_else(|| AccountingError::SessionNotFound(session_id.to_string()))?;
                session.update(request);
                debug!(session_id, session_time = session.session_time, "Accounting session updated");
            }
            AcctStatusType::Stop => {
                let (_, mut session) = self
                    .sessions
                    .remove(session_id)
                    .ok_or_else(|| AccountingError::SessionNotFound(session_id.to_string()))?;
                session.update(request);
                session.terminate_cause = integer(request, AttributeType::ACCT_TERMINATE_CAUSE);
                info!(
                    session_id,
                    user = ?session.username,
                    session_time = session.session_time,
                    input_octets = session.input_octets,
                    output_octets = session.output_octets,
                    terminate_cause = ?session.terminate_cause,
                    "Accounting session stopped"
                );
            }
            AcctStatusType::AccountingOn => {
                debug!(nas_ip = ?address(request, AttributeType::NAS_IP_ADDRESS), "Accounting-On");
            }
            AcctStatusType::AccountingOff => {
                let nas_ip = address(request, AttributeType::NAS_IP_ADDRESS);
                let before = self.sessions.len();
                self.sessions.retain(|_, session| session.nas_ip != nas_ip);
                info!(nas_ip = ?nas_ip, closed = before - self.sessions.len(), "Accounting-Off");
            }
        }
        Ok(AttributesList::new())
    }
}
