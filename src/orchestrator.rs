//! The mint sequence: validate, generate, pin, mint, confirm.
//!
//! One sequence runs at a time per orchestrator. Steps run strictly in order,
//! each bounded by its own timeout, and any failure ends the sequence without
//! undoing earlier steps. Pins made before a failed mint stay pinned.

use crate::{
    chain::NftContract,
    config::Config,
    error::{MintError, Result},
    generation::{HuggingFaceClient, ImageGenerator},
    logger::StepTimer,
    models::{GeneratedImage, MintRequest, MintResult, MintState, StorageReceipt},
    storage::{ContentStore, NftStorageClient},
    wallet::{JsonRpcWallet, Wallet},
};
use alloy_primitives::{Address, U256};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct StepTimeouts {
    pub generate: Duration,
    pub upload: Duration,
    /// Covers signing, broadcasting and waiting for the confirmation.
    pub mint: Duration,
}

impl StepTimeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generate: config.generator.timeout,
            upload: config.storage.timeout,
            mint: config.chain.request_timeout + config.chain.confirmation_timeout,
        }
    }
}

pub struct MintOrchestrator {
    generator: Arc<dyn ImageGenerator>,
    store: Arc<dyn ContentStore>,
    wallet: Arc<dyn Wallet>,
    contract: NftContract,
    timeouts: StepTimeouts,
    state: watch::Sender<MintState>,
    in_flight: Arc<Mutex<()>>,
    cancel: StdMutex<CancellationToken>,
}

impl MintOrchestrator {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn ContentStore>,
        wallet: Arc<dyn Wallet>,
        config: &Config,
    ) -> Result<Self> {
        let contract = NftContract::new(&config.chain, wallet.clone())?;
        let (state, _) = watch::channel(MintState::Idle);

        Ok(Self {
            generator,
            store,
            wallet,
            contract,
            timeouts: StepTimeouts::from_config(config),
            state,
            in_flight: Arc::new(Mutex::new(())),
            cancel: StdMutex::new(CancellationToken::new()),
        })
    }

    /// Builds the production collaborators from `config`.
    pub fn from_config(config: &Config) -> Result<(Self, Arc<JsonRpcWallet>)> {
        config.validate()?;
        let generator = Arc::new(HuggingFaceClient::new(config.generator.clone())?);
        let store = Arc::new(NftStorageClient::new(config.storage.clone())?);
        let wallet = Arc::new(JsonRpcWallet::new(&config.chain)?);
        let orchestrator = Self::new(generator, store, wallet.clone(), config)?;
        Ok((orchestrator, wallet))
    }

    pub fn state(&self) -> MintState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MintState> {
        self.state.subscribe()
    }

    pub fn current_account(&self) -> Option<Address> {
        *self.wallet.account_changes().borrow()
    }

    /// Requests wallet accounts and moves the wallet onto the contract's chain.
    pub async fn connect(&self) -> Result<Address> {
        let accounts = self.wallet.request_accounts().await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| MintError::Wallet("wallet exposed no accounts".into()))?;
        self.contract.ensure_network().await?;
        log::info!("🔗 Connected {}", account);
        Ok(account)
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.contract.balance_of(owner).await
    }

    /// Cancels the running sequence or step, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        if self.in_flight.try_lock().is_ok() {
            return false;
        }
        log::warn!("🛑 Cancelling active mint sequence");
        self.token().cancel();
        true
    }

    /// Generates a preview image without pinning or minting it.
    pub async fn generate_image(&self, request: &MintRequest) -> Result<GeneratedImage> {
        let (_guard, token) = self.acquire()?;
        self.generate_step(request, &token, "preview").await
    }

    pub async fn upload_to_storage(
        &self,
        image: &GeneratedImage,
        request: &MintRequest,
    ) -> Result<StorageReceipt> {
        let (_guard, token) = self.acquire()?;
        self.upload_step(image, request, &token, "upload").await
    }

    pub async fn mint(&self, receipt: &StorageReceipt) -> Result<MintResult> {
        let (_guard, token) = self.acquire()?;
        let account = self.require_account()?;
        self.mint_step(account, receipt, &token, "mint").await
    }

    /// Runs the whole sequence for `request`, rejecting it if another is in flight.
    pub async fn submit(&self, request: MintRequest) -> Result<MintResult> {
        let (_guard, token) = self.acquire()?;
        self.run_sequence(request, token).await
    }

    /// Like `submit`, but claims the in-flight slot before returning and runs
    /// the sequence on a spawned task.
    pub fn start(self: &Arc<Self>, request: MintRequest) -> Result<JoinHandle<Result<MintResult>>> {
        let guard = self
            .in_flight
            .clone()
            .try_lock_owned()
            .map_err(|_| MintError::Busy)?;
        let token = self.fresh_token();
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let _guard = guard;
            this.run_sequence(request, token).await
        }))
    }

    /// Claims the in-flight slot and installs the token `cancel` will trip.
    fn acquire(&self) -> Result<(MutexGuard<'_, ()>, CancellationToken)> {
        let guard = self.in_flight.try_lock().map_err(|_| {
            log::warn!("⏳ Rejecting submission: a mint sequence is already in flight");
            MintError::Busy
        })?;
        Ok((guard, self.fresh_token()))
    }

    fn token(&self) -> CancellationToken {
        match self.cancel.lock() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn fresh_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        match self.cancel.lock() {
            Ok(mut current) => *current = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }
        token
    }

    fn require_account(&self) -> Result<Address> {
        self.current_account()
            .ok_or_else(|| MintError::Wallet("no wallet account connected".into()))
    }

    fn transition(&self, next: MintState) {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                log::debug!("State {} -> {}", current.name(), next.name());
                *current = next;
                true
            } else {
                log::error!(
                    "Ignoring invalid state transition {} -> {}",
                    current.name(),
                    next.name()
                );
                false
            }
        });
    }

    /// Puts the state back to `Idle` for a fresh attempt. Callers hold the
    /// in-flight slot, so no other sequence owns the current state.
    fn begin_attempt(&self) {
        self.state.send_if_modified(|current| {
            match current {
                MintState::Idle => return false,
                ref state if state.is_active() => {
                    log::warn!("Discarding state {} left by an abandoned sequence", state.name())
                }
                _ => {}
            }
            *current = MintState::Idle;
            true
        });
    }

    async fn run_sequence(&self, request: MintRequest, token: CancellationToken) -> Result<MintResult> {
        let sequence = Uuid::new_v4().to_string()[..8].to_string();
        log::info!("🚀 [{}] Mint requested for '{}'", sequence, request.name);

        self.begin_attempt();
        let _abandoned = AbandonedSequence {
            state: &self.state,
            sequence: &sequence,
        };
        let outcome = self.sequence(&request, &token, &sequence).await;

        match &outcome {
            Ok(result) => {
                log::info!(
                    "✅ [{}] Minted {} in tx {}",
                    sequence,
                    result.token_uri,
                    result.transaction_hash
                );
                self.transition(MintState::Confirmed(result.clone()));
            }
            Err(e) => {
                log::error!("❌ [{}] Mint sequence failed: {}", sequence, e);
                self.transition(MintState::failed(e));
            }
        }
        outcome
    }

    async fn sequence(
        &self,
        request: &MintRequest,
        token: &CancellationToken,
        sequence: &str,
    ) -> Result<MintResult> {
        self.transition(MintState::Validating);
        request.validate()?;
        let account = self.require_account()?;

        self.transition(MintState::Generating);
        let image = self.generate_step(request, token, sequence).await?;

        self.transition(MintState::Uploading);
        let receipt = self.upload_step(&image, request, token, sequence).await?;
        drop(image);

        self.transition(MintState::Minting {
            token_uri: receipt.token_uri.clone(),
        });
        self.mint_step(account, &receipt, token, sequence)
            .await
            .map_err(|e| {
                log::warn!(
                    "📌 [{}] {} stays pinned without a token",
                    sequence,
                    receipt.cid
                );
                e
            })
    }

    async fn generate_step(
        &self,
        request: &MintRequest,
        token: &CancellationToken,
        sequence: &str,
    ) -> Result<GeneratedImage> {
        request.validate()?;
        let _timer = StepTimer::new("generate", sequence);
        bounded(
            token,
            self.timeouts.generate,
            || MintError::upstream("generator", "image generation timed out"),
            self.generator.generate(&request.description),
        )
        .await
    }

    async fn upload_step(
        &self,
        image: &GeneratedImage,
        request: &MintRequest,
        token: &CancellationToken,
        sequence: &str,
    ) -> Result<StorageReceipt> {
        let _timer = StepTimer::new("upload", sequence);
        let receipt = bounded(
            token,
            self.timeouts.upload,
            || MintError::upstream("storage", "upload timed out"),
            self.store.store(image, request),
        )
        .await?;
        log::info!("📌 [{}] Pinned as {}", sequence, receipt.token_uri);
        Ok(receipt)
    }

    async fn mint_step(
        &self,
        account: Address,
        receipt: &StorageReceipt,
        token: &CancellationToken,
        sequence: &str,
    ) -> Result<MintResult> {
        let _timer = StepTimer::new("mint", sequence);
        let deadline = Instant::now() + self.timeouts.mint;
        let timed_out = || MintError::Chain("mint did not complete in time".into());

        let hash = bounded(
            token,
            self.timeouts.mint,
            timed_out,
            self.contract.send_mint(account, &receipt.token_uri),
        )
        .await?;

        bounded(
            token,
            deadline.saturating_duration_since(Instant::now()),
            timed_out,
            self.contract.confirm_mint(account, &receipt.token_uri, hash),
        )
        .await
        .map_err(|e| {
            log::warn!(
                "⚠️  [{}] Transaction {} for {} was already broadcast, check it before retrying",
                sequence,
                hash,
                receipt.token_uri
            );
            e
        })
    }
}

/// Fails a sequence whose future was dropped before it reached a terminal state.
struct AbandonedSequence<'a> {
    state: &'a watch::Sender<MintState>,
    sequence: &'a str,
}

impl Drop for AbandonedSequence<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|current| {
            if !current.is_active() {
                return false;
            }
            log::warn!(
                "🛑 [{}] Sequence dropped while {}",
                self.sequence,
                current.name()
            );
            *current = MintState::failed(&MintError::Cancelled);
            true
        });
    }
}

/// Runs `step` until it finishes, `limit` elapses or `token` is cancelled.
async fn bounded<T, F>(
    token: &CancellationToken,
    limit: Duration,
    on_timeout: impl FnOnce() -> MintError,
    step: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(MintError::Cancelled),
        outcome = tokio::time::timeout(limit, step) => match outcome {
            Ok(result) => result,
            Err(_) => Err(on_timeout()),
        },
    }
}
