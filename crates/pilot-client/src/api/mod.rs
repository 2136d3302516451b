//! Request/response endpoints of the agent backend
//!
//! Each group is a thin borrowed view over [`AgentClient`]. None of them
//! stream; the server is authoritative and callers re-fetch after mutating.

pub mod connection;
pub mod knowledge;
pub mod plans;
pub mod rules;
pub mod service;

use crate::client::AgentClient;

pub use connection::{ConnectionApi, ConnectionInfo, ConnectionTest, Credentials, FetchTest, MailPreview};
pub use knowledge::{KnowledgeApi, QueryHit, QueryResult, UploadResult};
pub use plans::{ActionPlan, Frequency, NewPlan, PlanExecution, PlansApi};
pub use rules::{ActivitySummary, NewRule, Rule, RulesApi};
pub use service::{ManualRun, ServiceApi, ServiceState, ServiceStatus};

impl AgentClient {
    /// Knowledge-base collections, uploads and queries
    pub fn knowledge(&self) -> KnowledgeApi<'_> {
        KnowledgeApi { client: self }
    }

    /// Autopilot mail-handling rules
    pub fn rules(&self) -> RulesApi<'_> {
        RulesApi { client: self }
    }

    /// Scheduled action plans
    pub fn plans(&self) -> PlansApi<'_> {
        PlansApi { client: self }
    }

    /// Mailbox connection settings
    pub fn connection(&self) -> ConnectionApi<'_> {
        ConnectionApi { client: self }
    }

    /// Background autopilot service control
    pub fn service(&self) -> ServiceApi<'_> {
        ServiceApi { client: self }
    }
}
