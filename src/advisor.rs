//! Turn handler
//!
//! One chat turn: STORE READ → CLASSIFY → MERGE → INTAKE → ALLOCATE → PRESENT

use crate::allocation::{AllocationEngine, RandomSampler, Recommender};
use crate::catalog::InstrumentCatalog;
use crate::config::AdvisorConfig;
use crate::intake::{self, first_missing_slot, IntakeOutcome};
use crate::llm::{HttpLlmClient, LlmClient};
use crate::models::AllocationPlan;
use crate::nlu::{IntentClassifier, LlmClassifier, RuleBasedClassifier};
use crate::presentation::Presenter;
use crate::session::{build_session_store, effective_updates, purge_interval, spawn_purge_task, SessionStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Portfolio,
}

/// What the user sees for one turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response_type: ResponseType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_data: Option<AllocationPlan>,
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Text,
            content: content.into(),
            portfolio_data: None,
        }
    }

    pub fn portfolio(content: impl Into<String>, plan: AllocationPlan) -> Self {
        Self {
            response_type: ResponseType::Portfolio,
            content: content.into(),
            portfolio_data: Some(plan),
        }
    }
}

pub struct Advisor {
    store: Arc<dyn SessionStore>,
    classifier: Arc<dyn IntentClassifier>,
    presenter: Presenter,
    engine: AllocationEngine,
}

impl Advisor {
    pub fn new(
        store: Arc<dyn SessionStore>,
        classifier: Arc<dyn IntentClassifier>,
        presenter: Presenter,
        engine: AllocationEngine,
    ) -> Self {
        Self {
            store,
            classifier,
            presenter,
            engine,
        }
    }

    /// Wire every collaborator from configuration
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let llm: Option<Arc<dyn LlmClient>> = match &config.llm {
            Some(llm_config) => {
                let client: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(llm_config.clone())?);
                info!(model = %llm_config.model, url = %llm_config.api_url, "LLM client configured");
                Some(client)
            }
            None => {
                info!("No LLM configured, using rule-based classifier and template presenter");
                None
            }
        };

        let classifier: Arc<dyn IntentClassifier> = match &llm {
            Some(client) => Arc::new(LlmClassifier::new(client.clone())),
            None => Arc::new(RuleBasedClassifier),
        };
        let presenter = llm.map(Presenter::new).unwrap_or_else(Presenter::template);

        let catalog = match &config.catalog_dir {
            Some(dir) => InstrumentCatalog::load_from_dir(dir),
            None => InstrumentCatalog::builtin(),
        };
        let recommender: Arc<dyn Recommender> = Arc::new(match config.recommendation_seed {
            Some(seed) => RandomSampler::seeded(seed),
            None => RandomSampler::new(),
        });
        let engine = AllocationEngine::new(Arc::new(catalog), recommender);

        let store = build_session_store(config.database_url.as_deref(), config.session_ttl);
        if let Some(ttl) = config.session_ttl {
            match tokio::runtime::Handle::try_current() {
                Ok(_) => {
                    let every = purge_interval(ttl);
                    spawn_purge_task(store.clone(), every);
                    info!(every_secs = every.as_secs(), "Expired-session purge scheduled");
                }
                Err(_) => warn!("No async runtime, expired sessions are only evicted on access"),
            }
        }

        Ok(Self::new(store, classifier, presenter, engine))
    }

    pub async fn handle_turn(&self, session_id: &str, message: &str) -> Result<ChatReply> {
        let session = self.store.get(session_id).await?;

        // A fresh session has no pending question yet
        let awaiting = if session.is_empty() {
            None
        } else {
            first_missing_slot(&session)
        };

        let classification = self.classifier.classify(message, awaiting).await;
        debug!(
            session_id,
            intent = ?classification.intent,
            awaiting = ?awaiting.map(|slot| slot.key()),
            "Turn classified"
        );

        let updates = effective_updates(&intake::canonicalize_keys(&classification.entities));
        let session = if updates.is_empty() {
            session
        } else {
            self.store.merge(session_id, &updates).await?
        };

        if !classification.intent.drives_intake() {
            let answer = self.presenter.answer_general(message).await;
            return Ok(ChatReply::text(answer));
        }

        let (_, outcome) = intake::advance(&session, &updates)?;
        match outcome {
            IntakeOutcome::FollowUp { slot, question } => {
                info!(session_id, slot = %slot, "Asking for missing slot");
                Ok(ChatReply::text(self.presenter.render_follow_up(question)))
            }
            IntakeOutcome::ReadyIntake(request) => {
                let plan = self.engine.generate(&request);
                let content = self.presenter.render_plan(&plan).await;
                info!(
                    session_id,
                    risk_tier = %request.risk_tier,
                    lump_sum = plan.lump_sum_total(),
                    recurring = plan.recurring_total(),
                    "Portfolio delivered"
                );
                Ok(ChatReply::portfolio(content, plan))
            }
        }
    }
}
