//! Deployment pipeline driver.
//!
//! One driver owns one run: it validates configuration before anything
//! touches the chain, deploys base contracts, links and deploys dependents,
//! issues post-deploy configuration transactions, and conditionally triggers
//! source verification. The driver exclusively owns the mutable record set;
//! every other component sees read-only views and results flow back through
//! the driver into the run report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ContractRole;
use crate::artifacts::ArtifactStore;
use crate::chain::ChainBackend;
use crate::config::DeploymentConfig;
use crate::configurator::{ActionKind, ActionReceipt, Configurator, PostDeployAction};
use crate::deployer::{ContractDeployer, DeploymentRecord};
use crate::error::DeployError;
use crate::linker::{find_record, resolve_constructor_args};
use crate::network::NetworkProfile;
use crate::verifier::{VerificationOutcome, VerificationTrigger};

/// Progress of one pipeline run. `Verified` is skipped on local networks;
/// `Aborted` is terminal and reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PipelineState {
    Init,
    ConfigLoaded,
    BaseDeployed,
    DependentsDeployed,
    Configured,
    Verified,
    Done,
    Aborted,
}

impl PipelineState {
    /// Legal transitions. Forward steps follow the dependency order;
    /// `Configured → Done` is the local-network shortcut past `Verified`.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Init, ConfigLoaded)
                | (ConfigLoaded, BaseDeployed)
                | (BaseDeployed, DependentsDeployed)
                | (DependentsDeployed, Configured)
                | (Configured, Verified)
                | (Configured, Done)
                | (Verified, Done)
        ) || (next == Aborted && !matches!(self, Done | Aborted))
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }
}

/// Which contract roles a run covers. Mirrors the deploy tag groups of the
/// CLI: everything, the token+game pair, or the collection alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeploymentScope {
    All,
    Game,
    Collection,
}

impl DeploymentScope {
    /// Roles in dependency order: a role always appears after everything it
    /// depends on.
    pub fn roles(&self) -> &'static [ContractRole] {
        match self {
            DeploymentScope::All => &[
                ContractRole::Token,
                ContractRole::Game,
                ContractRole::Collection,
            ],
            DeploymentScope::Game => &[ContractRole::Token, ContractRole::Game],
            DeploymentScope::Collection => &[ContractRole::Collection],
        }
    }
}

/// Everything a pipeline run reads: the resolved network profile, the
/// validated configuration, and the artifact store. No ambient globals.
pub struct RunContext<'a> {
    pub profile: &'a NetworkProfile,
    pub config: &'a DeploymentConfig,
    pub artifacts: &'a ArtifactStore,
}

/// Outcome of one post-deploy action, confirmed or not.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ActionOutcome {
    Confirmed(ActionReceipt),
    Failed {
        target: ContractRole,
        action: String,
        error: String,
    },
}

/// Verification outcome for one deployed role.
#[derive(Debug, Clone, Serialize)]
pub struct RoleVerification {
    pub role: ContractRole,
    #[serde(flatten)]
    pub outcome: VerificationOutcome,
}

/// Why a run aborted.
#[derive(Debug, Clone, Serialize)]
pub struct AbortInfo {
    pub kind: String,
    pub message: String,
}

/// Aggregated audit output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub network: String,
    pub scope: DeploymentScope,
    pub state: PipelineState,
    pub records: Vec<DeploymentRecord>,
    pub actions: Vec<ActionOutcome>,
    pub verifications: Vec<RoleVerification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_with: Option<AbortInfo>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Persist the report as pretty JSON under `dir`, one file per run.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        let path = dir.join(format!(
            "{}-{}.json",
            self.network,
            self.finished_at.format("%Y%m%dT%H%M%SZ")
        ));
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        Ok(path)
    }
}

/// Drives one deployment run to `Done` or `Aborted`.
pub struct Pipeline<'a, C> {
    ctx: RunContext<'a>,
    chain: &'a C,
    scope: DeploymentScope,
    state: PipelineState,
    records: Vec<DeploymentRecord>,
    /// Roles seeded from a previous partial run; not redeployed.
    resumed: Vec<ContractRole>,
    actions: Vec<ActionOutcome>,
    verifications: Vec<RoleVerification>,
}

impl<'a, C: ChainBackend> Pipeline<'a, C> {
    pub fn new(ctx: RunContext<'a>, chain: &'a C, scope: DeploymentScope) -> Self {
        Self {
            ctx,
            chain,
            scope,
            state: PipelineState::Init,
            records: Vec::new(),
            resumed: Vec::new(),
            actions: Vec::new(),
            verifications: Vec::new(),
        }
    }

    /// Seed records from an earlier partial run against the same network.
    /// Roles with a matching record are skipped, their records reused for
    /// linking, so a rerun resumes instead of redeploying.
    pub fn with_prior_records(mut self, prior: Vec<DeploymentRecord>) -> Self {
        for record in prior {
            if record.network != self.ctx.profile.name {
                tracing::warn!(
                    role = %record.role,
                    record_network = %record.network,
                    run_network = %self.ctx.profile.name,
                    "Ignoring prior record from a different network"
                );
                continue;
            }
            if self.scope.roles().contains(&record.role)
                && find_record(&self.records, record.role).is_none()
            {
                tracing::info!(
                    role = %record.role,
                    address = %record.address,
                    "Reusing prior deployment record"
                );
                self.resumed.push(record.role);
                self.records.push(record);
            }
        }
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn records(&self) -> &[DeploymentRecord] {
        &self.records
    }

    /// Run the pipeline to completion. Fatal errors abort the run; the
    /// report always carries whatever records and outcomes exist, so an
    /// operator can diagnose and resume from partial state.
    pub async fn run(mut self) -> RunReport {
        match self.execute().await {
            Ok(()) => self.finish(None),
            Err(err) => {
                tracing::error!(kind = err.kind(), error = %err, "Pipeline aborted");
                self.advance(PipelineState::Aborted);
                self.finish(Some(err))
            }
        }
    }

    async fn execute(&mut self) -> Result<(), DeployError> {
        self.ctx.config.require_roles(self.scope.roles())?;
        self.advance(PipelineState::ConfigLoaded);

        let deployer = ContractDeployer::new(self.chain, self.ctx.profile, self.ctx.artifacts);

        // Base contracts first, then the roles that link against them.
        for role in self.scope.roles() {
            if role.dependencies().is_empty() {
                self.deploy_role(&deployer, *role).await?;
            }
        }
        self.advance(PipelineState::BaseDeployed);

        for role in self.scope.roles() {
            if !role.dependencies().is_empty() {
                self.deploy_role(&deployer, *role).await?;
            }
        }
        self.advance(PipelineState::DependentsDeployed);

        self.run_post_deploy_actions().await?;
        self.advance(PipelineState::Configured);

        if self.ctx.profile.is_local() {
            tracing::info!(
                network = %self.ctx.profile.name,
                "Local network, skipping verification stage"
            );
        } else {
            self.run_verification().await;
            self.advance(PipelineState::Verified);
        }

        self.advance(PipelineState::Done);
        Ok(())
    }

    async fn deploy_role(
        &mut self,
        deployer: &ContractDeployer<'a, C>,
        role: ContractRole,
    ) -> Result<(), DeployError> {
        if self.resumed.contains(&role) {
            tracing::info!(role = %role, "Role already deployed in a prior run, skipping");
            return Ok(());
        }

        let args = resolve_constructor_args(role, self.ctx.config, &self.records)?;
        let record = deployer.deploy(role, &args).await?;
        self.records.push(record);
        Ok(())
    }

    /// The post-deploy plan for this run. Repeatable actions appear once per
    /// repetition: each mint is its own confirmed transaction.
    fn planned_actions(&self) -> Vec<PostDeployAction> {
        let mut actions = Vec::new();

        if self.scope.roles().contains(&ContractRole::Collection) {
            if let Some(collection) = &self.ctx.config.collection {
                let depth = self.ctx.profile.confirmation_depth;
                actions.push(PostDeployAction {
                    target: ContractRole::Collection,
                    kind: ActionKind::ConfigureMetadata {
                        base_uri: collection.base_uri.clone(),
                    },
                    confirmations_required: depth,
                });
                for _ in 0..collection.premint {
                    actions.push(PostDeployAction {
                        target: ContractRole::Collection,
                        kind: ActionKind::Mint {
                            to: collection.owner,
                        },
                        confirmations_required: depth,
                    });
                }
            }
        }

        actions
    }

    async fn run_post_deploy_actions(&mut self) -> Result<(), DeployError> {
        let configurator = Configurator::new(self.chain, self.ctx.profile);

        for action in self.planned_actions() {
            let record = find_record(&self.records, action.target).ok_or(
                DeployError::DependencyNotDeployed {
                    missing: action.target,
                    needed_by: format!("{} action", action.kind.label()),
                },
            )?;

            match configurator.apply(&action, record).await {
                Ok(receipt) => self.actions.push(ActionOutcome::Confirmed(receipt)),
                Err(err) => {
                    // Record the failure before aborting so prior confirmed
                    // actions stay visible in the report.
                    self.actions.push(ActionOutcome::Failed {
                        target: action.target,
                        action: action.kind.label().to_string(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Verification never aborts the run: each failure is logged and
    /// recorded, and the remaining roles still get their submission.
    async fn run_verification(&mut self) {
        let trigger = VerificationTrigger::new(self.ctx.profile, self.ctx.artifacts);

        for record in &self.records {
            let outcome = match resolve_constructor_args(record.role, self.ctx.config, &self.records)
            {
                Ok(args) => trigger.verify(record, &args).await,
                Err(err) => Err(DeployError::VerificationFailed(err.to_string())),
            };

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(
                        role = %record.role,
                        error = %err,
                        "Source verification failed"
                    );
                    VerificationOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            self.verifications.push(RoleVerification {
                role: record.role,
                outcome,
            });
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal pipeline transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "Pipeline state transition");
        self.state = next;
    }

    fn finish(self, error: Option<DeployError>) -> RunReport {
        RunReport {
            network: self.ctx.profile.name.clone(),
            scope: self.scope,
            state: self.state,
            records: self.records,
            actions: self.actions,
            verifications: self.verifications,
            aborted_with: error.map(|e| AbortInfo {
                kind: e.kind().to_string(),
                message: e.to_string(),
            }),
            finished_at: Utc::now(),
        }
    }
}
