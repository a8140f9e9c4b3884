// This file is part of the SORA network and Polkaswap app.

// Copyright (c) 2020, 2021, Polka Biome Ltd. All rights reserved.
// SPDX-License-Identifier: BSD-4-Clause

// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:

// Redistributions of source code must retain the above copyright notice, this list
// of conditions and the following disclaimer.
// Redistributions in binary form must reproduce the above copyright notice, this
// list of conditions and the following disclaimer in the documentation and/or other
// materials provided with the distribution.
//
// All advertising materials mentioning features or use of this software must display
// the following acknowledgement: This product includes software developed by Polka Biome
// Ltd., SORA, and Polkaswap.
//
// Neither the name of the Polka Biome Ltd. nor the names of its contributors may be used
// to endorse or promote products derived from this software without specific prior written permission.

// THIS SOFTWARE IS PROVIDED BY Polka Biome Ltd. AS IS AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL Polka Biome Ltd. BE LIABLE FOR ANY
// DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING,
// BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR PROFITS;
// OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT,
// STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Lifecycle of signed extrinsics: one pending transaction per channel, status tracking,
//! UI notifications and the balance refresh after finalization.

pub mod errors;
pub mod events;
pub mod notification;

use crate::balances::BalanceRefresher;
use crate::chain::{
    AccountId, BlockHash, DispatchError, ErrorRegistry, Extrinsic, ExtrinsicSubmitter, TxStatus,
};
use crate::config::EngineConfig;
use crate::cross_chain::XcmDirection;
use crate::prelude::*;
use core::fmt;
use errors::{describe_dispatch_error, DispatchFailure};
use events::{parse_executed, Executed};
use futures::StreamExt;
use notification::{ExplorerLinks, Notification, NotificationBody, NotificationQueue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(180);

/// Independent lanes of the UI. At most one transaction is pending per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Swap,
    Liquidity,
    CrossChain,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Swap => write!(f, "swap"),
            Channel::Liquidity => write!(f, "liquidity"),
            Channel::CrossChain => write!(f, "cross-chain"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Swap,
    AddLiquidity,
    RemoveLiquidity,
    CreatePool,
    CrossIn,
    CrossOut,
}

impl TxKind {
    pub fn channel(&self) -> Channel {
        match self {
            TxKind::Swap => Channel::Swap,
            TxKind::AddLiquidity | TxKind::RemoveLiquidity | TxKind::CreatePool => {
                Channel::Liquidity
            }
            TxKind::CrossIn | TxKind::CrossOut => Channel::CrossChain,
        }
    }
}

impl From<XcmDirection> for TxKind {
    fn from(direction: XcmDirection) -> Self {
        match direction {
            XcmDirection::CrossIn => TxKind::CrossIn,
            XcmDirection::CrossOut => TxKind::CrossOut,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxKind::Swap => "Swap",
            TxKind::AddLiquidity => "Add liquidity",
            TxKind::RemoveLiquidity => "Remove liquidity",
            TxKind::CreatePool => "Create pool",
            TxKind::CrossIn => "Cross-in",
            TxKind::CrossOut => "Cross-out",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A call the user confirmed, together with the tokens whose balances it touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRequest {
    pub kind: TxKind,
    pub signer: AccountId,
    pub call: Extrinsic,
    pub tokens: Vec<TokenId>,
}

impl TxRequest {
    pub fn new(
        kind: TxKind,
        signer: impl Into<AccountId>,
        call: Extrinsic,
        tokens: Vec<TokenId>,
    ) -> Self {
        Self {
            kind,
            signer: signer.into(),
            call,
            tokens,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeEstimate {
    Known(Balance),
    /// Estimation failed, the form still allows submission.
    Unknown,
}

impl FeeEstimate {
    pub fn amount(&self) -> Option<Balance> {
        match self {
            FeeEstimate::Known(fee) => Some(*fee),
            FeeEstimate::Unknown => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedTx {
    pub request: TxRequest,
    pub fee: FeeEstimate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleStatus {
    Submitted,
    Ready,
    InBlock(BlockHash),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionHandle {
    pub id: TxId,
    pub kind: TxKind,
    pub status: HandleStatus,
    pub fee: FeeEstimate,
    pub timeout_at: Instant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    Finalized {
        block: BlockHash,
        executed: Executed,
    },
    /// Included and finalized, but the dispatch failed.
    Errored {
        block: BlockHash,
        failure: DispatchFailure,
    },
    /// Never reached finalization: signing, pool or subscription failure.
    Failed(ChainError),
    /// Local waiting stopped. The chain may still finalize the extrinsic.
    TimedOut,
}

enum Terminal {
    Finalized {
        block: BlockHash,
        events: Vec<crate::chain::ChainEvent>,
        dispatch_error: Option<DispatchError>,
    },
    Failed(ChainError),
    TimedOut,
}

type PendingMap = Arc<Mutex<HashMap<Channel, TransactionHandle>>>;

/// Releases the channel however `submit` exits, including cancellation.
struct ChannelGuard {
    pending: PendingMap,
    channel: Channel,
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.channel);
        }
    }
}

#[derive(Default)]
pub struct TxOrchestratorBuilder {
    submitter: Option<Arc<dyn ExtrinsicSubmitter>>,
    registry: Option<Arc<dyn ErrorRegistry>>,
    refresher: Option<Arc<dyn BalanceRefresher>>,
    notifications: Option<NotificationQueue>,
    explorer: Option<ExplorerLinks>,
    timeout: Option<Duration>,
}

impl TxOrchestratorBuilder {
    pub fn with_submitter(mut self, submitter: Arc<dyn ExtrinsicSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn ErrorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn BalanceRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_notifications(mut self, notifications: NotificationQueue) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_explorer(mut self, explorer: ExplorerLinks) -> Self {
        self.explorer = Some(explorer);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_explorer(ExplorerLinks::new(config.explorer.clone()))
            .with_timeout(config.tx_timeout())
    }

    pub fn build(self) -> Result<TxOrchestrator, TxError> {
        Ok(TxOrchestrator {
            submitter: self.submitter.ok_or(TxError::Incomplete("submitter"))?,
            registry: self.registry.ok_or(TxError::Incomplete("error registry"))?,
            refresher: self
                .refresher
                .ok_or(TxError::Incomplete("balance refresher"))?,
            notifications: self.notifications.unwrap_or_default(),
            explorer: self.explorer.ok_or(TxError::Incomplete("explorer links"))?,
            timeout: self.timeout.unwrap_or(DEFAULT_TX_TIMEOUT),
            pending: Default::default(),
            next_id: AtomicU64::new(1),
        })
    }
}

pub struct TxOrchestrator {
    submitter: Arc<dyn ExtrinsicSubmitter>,
    registry: Arc<dyn ErrorRegistry>,
    refresher: Arc<dyn BalanceRefresher>,
    notifications: NotificationQueue,
    explorer: ExplorerLinks,
    timeout: Duration,
    pending: PendingMap,
    next_id: AtomicU64,
}

impl TxOrchestrator {
    pub fn builder() -> TxOrchestratorBuilder {
        TxOrchestratorBuilder::default()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn channel_busy(&self, channel: Channel) -> bool {
        self.pending.lock().expect("poisoned").contains_key(&channel)
    }

    pub fn pending(&self, channel: Channel) -> Option<TransactionHandle> {
        self.pending.lock().expect("poisoned").get(&channel).cloned()
    }

    /// Estimates the fee of the request. A failed estimate never blocks submission.
    pub async fn prepare(&self, request: TxRequest) -> PreparedTx {
        let fee = match self
            .submitter
            .estimate_fee(&request.signer, &request.call)
            .await
        {
            Ok(fee) => FeeEstimate::Known(fee),
            Err(err) => {
                warn!("Failed to estimate {} fee: {}", request.kind, err);
                FeeEstimate::Unknown
            }
        };
        PreparedTx { request, fee }
    }

    /// Signs and watches the transaction until it is finalized, fails or times out.
    pub async fn submit(&self, prepared: PreparedTx) -> Result<TxOutcome, TxError> {
        let (handle, guard) = self.open(&prepared)?;
        let request = &prepared.request;
        info!("Submitting {} {}", request.kind, handle.id);

        let terminal = tokio::select! {
            terminal = self.watch(&handle, request) => terminal,
            _ = tokio::time::sleep_until(handle.timeout_at) => Terminal::TimedOut,
        };

        let outcome = match terminal {
            Terminal::Finalized {
                block,
                events,
                dispatch_error: None,
            } => {
                let executed = parse_executed(request.kind, &events);
                info!("{} {} finalized: {}", request.kind, handle.id, executed);
                self.notify(
                    &handle,
                    NotificationBody::Success {
                        executed: executed.clone(),
                        explorer: self.explorer.block(&block),
                    },
                );
                // The channel is free once finalized, whatever the refresh does.
                drop(guard);
                let refresh = self.refresher.refresh(&request.tokens);
                match tokio::time::timeout(self.timeout, refresh).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        warn!("Failed to refresh balances after {}: {}", handle.id, err)
                    }
                    Err(_) => warn!(
                        "Balance refresh after {} did not finish in {:?}",
                        handle.id, self.timeout
                    ),
                }
                TxOutcome::Finalized { block, executed }
            }
            Terminal::Finalized {
                block,
                dispatch_error: Some(error),
                ..
            } => {
                let failure = describe_dispatch_error(self.registry.as_ref(), &error);
                warn!(
                    "{} {} failed on chain: {}",
                    request.kind, handle.id, failure.message
                );
                self.notify(
                    &handle,
                    NotificationBody::Failed {
                        category: ErrorCategory::Dispatch,
                        reason: failure.message.clone(),
                        explorer: Some(self.explorer.block(&block)),
                    },
                );
                TxOutcome::Errored { block, failure }
            }
            Terminal::Failed(err) => {
                warn!("{} {} failed: {}", request.kind, handle.id, err);
                self.notify(
                    &handle,
                    NotificationBody::Failed {
                        category: ErrorCategory::Transport,
                        reason: err.to_string(),
                        explorer: None,
                    },
                );
                TxOutcome::Failed(err)
            }
            Terminal::TimedOut => {
                warn!(
                    "{} {} not finalized after {:?}, no longer watching it",
                    request.kind, handle.id, self.timeout
                );
                self.notify(
                    &handle,
                    NotificationBody::TimedOut {
                        explorer: self.explorer.account(&request.signer),
                    },
                );
                TxOutcome::TimedOut
            }
        };
        Ok(outcome)
    }

    fn open(&self, prepared: &PreparedTx) -> Result<(TransactionHandle, ChannelGuard), TxError> {
        let channel = prepared.request.kind.channel();
        let mut pending = self.pending.lock().expect("poisoned");
        if pending.contains_key(&channel) {
            debug!("Rejecting {}, channel {} is busy", prepared.request.kind, channel);
            return Err(TxError::ChannelBusy(channel));
        }
        let handle = TransactionHandle {
            id: TxId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            kind: prepared.request.kind,
            status: HandleStatus::Submitted,
            fee: prepared.fee,
            timeout_at: Instant::now() + self.timeout,
        };
        pending.insert(channel, handle.clone());
        let guard = ChannelGuard {
            pending: self.pending.clone(),
            channel,
        };
        Ok((handle, guard))
    }

    async fn watch(&self, handle: &TransactionHandle, request: &TxRequest) -> Terminal {
        let mut statuses = match self
            .submitter
            .sign_and_watch(&request.signer, &request.call)
            .await
        {
            Ok(statuses) => statuses,
            Err(err) => return Terminal::Failed(err),
        };
        while let Some(status) = statuses.next().await {
            match status {
                Ok(TxStatus::Ready) => {
                    self.set_status(handle, HandleStatus::Ready);
                    self.notify(handle, NotificationBody::Initiated);
                }
                Ok(TxStatus::InBlock(block)) => {
                    debug!("{} {} in block 0x{}", request.kind, handle.id, hex::encode(block));
                    self.set_status(handle, HandleStatus::InBlock(block));
                    self.notify(
                        handle,
                        NotificationBody::InBlock {
                            explorer: self.explorer.block(&block),
                        },
                    );
                }
                Ok(TxStatus::Finalized {
                    block,
                    events,
                    dispatch_error,
                }) => {
                    return Terminal::Finalized {
                        block,
                        events,
                        dispatch_error,
                    }
                }
                Ok(TxStatus::Dropped) => return Terminal::Failed(ChainError::Dropped),
                Ok(TxStatus::Invalid(reason)) => {
                    return Terminal::Failed(ChainError::Invalid(reason))
                }
                Err(err) => return Terminal::Failed(err),
            }
        }
        Terminal::Failed(ChainError::SubscriptionClosed)
    }

    fn set_status(&self, handle: &TransactionHandle, status: HandleStatus) {
        let mut pending = self.pending.lock().expect("poisoned");
        if let Some(entry) = pending.get_mut(&handle.kind.channel()) {
            if entry.id == handle.id {
                entry.status = status;
            }
        }
    }

    fn notify(&self, handle: &TransactionHandle, body: NotificationBody) {
        self.notifications.push(Notification {
            tx: handle.id,
            kind: handle.kind,
            body,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::MockBalanceRefresher;
    use crate::chain::{
        ChainEvent, DecodedModuleError, MockErrorRegistry, MockExtrinsicSubmitter, ModuleError,
    };
    use crate::swap_amount::SwapAmount;
    use errors::DispatchCategory;
    use futures::stream;
    use url::Url;

    fn usdt() -> TokenId {
        TokenId::asset("1984")
    }

    fn swap_request() -> TxRequest {
        TxRequest::new(
            TxKind::Swap,
            "alice",
            Extrinsic::swap(
                &TokenId::native(),
                &usdt(),
                SwapAmount::with_desired_input(10_000_000_000, 4_207_920),
            ),
            vec![TokenId::native(), usdt()],
        )
    }

    fn prepared() -> PreparedTx {
        PreparedTx {
            request: swap_request(),
            fee: FeeEstimate::Known(1_000),
        }
    }

    fn explorer() -> ExplorerLinks {
        ExplorerLinks::new(Url::parse("https://assethub-kusama.subscan.io/").unwrap())
    }

    fn submitter_with(statuses: Vec<TxStatus>) -> MockExtrinsicSubmitter {
        let mut submitter = MockExtrinsicSubmitter::new();
        submitter
            .expect_sign_and_watch()
            .returning(move |_, _| Ok(stream::iter(statuses.clone().into_iter().map(Ok)).boxed()));
        submitter
    }

    fn orchestrator(
        submitter: MockExtrinsicSubmitter,
        registry: MockErrorRegistry,
        refresher: MockBalanceRefresher,
    ) -> TxOrchestrator {
        TxOrchestrator::builder()
            .with_submitter(Arc::new(submitter))
            .with_registry(Arc::new(registry))
            .with_refresher(Arc::new(refresher))
            .with_explorer(explorer())
            .build()
            .unwrap()
    }

    fn terminal_count(notifications: &[Notification]) -> usize {
        notifications.iter().filter(|n| n.body.is_terminal()).count()
    }

    #[test]
    fn kinds_map_to_channels() {
        assert_eq!(TxKind::Swap.channel(), Channel::Swap);
        assert_eq!(TxKind::CreatePool.channel(), Channel::Liquidity);
        assert_eq!(TxKind::RemoveLiquidity.channel(), Channel::Liquidity);
        assert_eq!(TxKind::from(XcmDirection::CrossOut).channel(), Channel::CrossChain);
    }

    #[test]
    fn builder_requires_collaborators() {
        let res = TxOrchestrator::builder()
            .with_registry(Arc::new(MockErrorRegistry::new()))
            .build();
        assert_eq!(res.err(), Some(TxError::Incomplete("submitter")));
    }

    #[tokio::test]
    async fn failed_fee_estimation_is_unknown() {
        let mut submitter = MockExtrinsicSubmitter::new();
        submitter
            .expect_estimate_fee()
            .returning(|_, _| Err(ChainError::Rpc("timeout".into())));
        let orch = orchestrator(
            submitter,
            MockErrorRegistry::new(),
            MockBalanceRefresher::new(),
        );
        let prepared = orch.prepare(swap_request()).await;
        assert_eq!(prepared.fee, FeeEstimate::Unknown);
        assert_eq!(prepared.fee.amount(), None);
    }

    #[tokio::test]
    async fn finalized_swap_notifies_success_and_refreshes_balances() {
        let block = [2u8; 32];
        let mut submitter = submitter_with(vec![
            TxStatus::Ready,
            TxStatus::InBlock([1u8; 32]),
            TxStatus::Finalized {
                block,
                events: vec![ChainEvent::SwapExecuted {
                    amount_in: 10_000_000_000,
                    amount_out: 4_950_495,
                    path: vec![TokenId::native(), usdt()],
                }],
                dispatch_error: None,
            },
        ]);
        submitter.expect_estimate_fee().returning(|_, _| Ok(1_000));
        let mut refresher = MockBalanceRefresher::new();
        refresher
            .expect_refresh()
            .withf(|tokens: &[TokenId]| tokens.to_vec() == vec![TokenId::native(), usdt()])
            .times(1)
            .returning(|_| Ok(()));
        let orch = orchestrator(submitter, MockErrorRegistry::new(), refresher);

        let prepared = orch.prepare(swap_request()).await;
        assert_eq!(prepared.fee, FeeEstimate::Known(1_000));
        let outcome = orch.submit(prepared).await.unwrap();
        assert_eq!(
            outcome,
            TxOutcome::Finalized {
                block,
                executed: Executed::Swap {
                    amount_in: 10_000_000_000,
                    amount_out: 4_950_495,
                },
            }
        );

        let notifications = orch.notifications().drain();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].body, NotificationBody::Initiated);
        assert_eq!(
            notifications[1].body,
            NotificationBody::InBlock {
                explorer: explorer().block(&[1u8; 32]),
            }
        );
        assert_eq!(terminal_count(&notifications), 1);
        assert!(notifications.iter().all(|n| n.tx == notifications[0].tx));
        match &notifications[2].body {
            NotificationBody::Success { explorer: link, .. } => {
                assert_eq!(link, &explorer().block(&block))
            }
            other => panic!("unexpected notification {:?}", other),
        }
        assert!(!orch.channel_busy(Channel::Swap));
    }

    struct StalledRefresher(Arc<Mutex<bool>>);

    #[async_trait]
    impl BalanceRefresher for StalledRefresher {
        async fn refresh(&self, _tokens: &[TokenId]) -> Result<(), ChainError> {
            *self.0.lock().expect("poisoned") = true;
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_refresh_does_not_keep_channel_busy() {
        let submitter = submitter_with(vec![TxStatus::Finalized {
            block: [2u8; 32],
            events: vec![],
            dispatch_error: None,
        }]);
        let started = Arc::new(Mutex::new(false));
        let orch = Arc::new(
            TxOrchestrator::builder()
                .with_submitter(Arc::new(submitter))
                .with_registry(Arc::new(MockErrorRegistry::new()))
                .with_refresher(Arc::new(StalledRefresher(started.clone())))
                .with_explorer(explorer())
                .build()
                .unwrap(),
        );

        let task = tokio::spawn({
            let orch = orch.clone();
            async move { orch.submit(prepared()).await }
        });
        while !*started.lock().expect("poisoned") {
            tokio::task::yield_now().await;
        }
        assert!(!orch.channel_busy(Channel::Swap));
        assert!(matches!(
            orch.notifications().drain().last().map(|n| &n.body),
            Some(NotificationBody::Success { .. })
        ));

        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, TxOutcome::Finalized { .. }));
    }

    #[tokio::test]
    async fn dispatch_error_uses_canonical_message_and_releases_channel() {
        let submitter = submitter_with(vec![
            TxStatus::Ready,
            TxStatus::InBlock([1u8; 32]),
            TxStatus::Finalized {
                block: [2u8; 32],
                events: vec![],
                dispatch_error: Some(DispatchError::Module(ModuleError {
                    index: 0x35,
                    error: [6, 0, 0, 0],
                })),
            },
        ]);
        let mut registry = MockErrorRegistry::new();
        registry
            .expect_lookup()
            .withf(|err: &ModuleError| err.index == 0x35)
            .returning(|_| {
                Some(DecodedModuleError {
                    pallet: "AssetConversion".into(),
                    error: "PoolNotFound".into(),
                    docs: "Provided asset pair is not supported for pool.".into(),
                })
            });
        let mut refresher = MockBalanceRefresher::new();
        refresher.expect_refresh().never();
        let orch = orchestrator(submitter, registry, refresher);

        let outcome = orch.submit(prepared()).await.unwrap();
        match outcome {
            TxOutcome::Errored { failure, .. } => {
                assert_eq!(failure.category, Some(DispatchCategory::PoolNotFound));
                assert_eq!(failure.message, "Pool not found");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let notifications = orch.notifications().drain();
        assert_eq!(terminal_count(&notifications), 1);
        assert!(matches!(
            notifications.last().map(|n| &n.body),
            Some(NotificationBody::Failed {
                category: ErrorCategory::Dispatch,
                reason,
                ..
            }) if reason == "Pool not found"
        ));
        assert!(!orch.channel_busy(Channel::Swap));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_only_warns_and_ignores_late_finalization() {
        let mut submitter = MockExtrinsicSubmitter::new();
        submitter.expect_sign_and_watch().returning(|_, _| {
            Ok(stream::once(async {
                tokio::time::sleep(Duration::from_secs(200)).await;
                Ok(TxStatus::Finalized {
                    block: [9u8; 32],
                    events: vec![],
                    dispatch_error: None,
                })
            })
            .boxed())
        });
        let mut refresher = MockBalanceRefresher::new();
        refresher.expect_refresh().never();
        let orch = orchestrator(submitter, MockErrorRegistry::new(), refresher);

        let outcome = orch.submit(prepared()).await.unwrap();
        assert_eq!(outcome, TxOutcome::TimedOut);
        tokio::time::sleep(Duration::from_secs(60)).await;

        let notifications = orch.notifications().drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].body,
            NotificationBody::TimedOut {
                explorer: explorer().account("alice"),
            }
        );
        assert!(!orch.channel_busy(Channel::Swap));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_channel_rejects_second_submit() {
        let mut submitter = MockExtrinsicSubmitter::new();
        submitter
            .expect_sign_and_watch()
            .times(1)
            .returning(|_, _| Ok(stream::pending().boxed()));
        let orch = Arc::new(orchestrator(
            submitter,
            MockErrorRegistry::new(),
            MockBalanceRefresher::new(),
        ));

        let first = tokio::spawn({
            let orch = orch.clone();
            async move { orch.submit(prepared()).await }
        });
        while !orch.channel_busy(Channel::Swap) {
            tokio::task::yield_now().await;
        }
        let pending = orch.pending(Channel::Swap).unwrap();
        assert_eq!(
            orch.submit(prepared()).await,
            Err(TxError::ChannelBusy(Channel::Swap))
        );
        assert_eq!(orch.pending(Channel::Swap).unwrap().id, pending.id);
        assert!(!orch.channel_busy(Channel::Liquidity));

        assert_eq!(first.await.unwrap(), Ok(TxOutcome::TimedOut));
        assert!(!orch.channel_busy(Channel::Swap));
    }

    #[tokio::test]
    async fn rejected_signature_is_a_transport_failure() {
        let mut submitter = MockExtrinsicSubmitter::new();
        submitter
            .expect_sign_and_watch()
            .returning(|_, _| Err(ChainError::SignatureRejected));
        let orch = orchestrator(
            submitter,
            MockErrorRegistry::new(),
            MockBalanceRefresher::new(),
        );
        assert_eq!(
            orch.submit(prepared()).await,
            Ok(TxOutcome::Failed(ChainError::SignatureRejected))
        );
        let notifications = orch.notifications().drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].body,
            NotificationBody::Failed {
                category: ErrorCategory::Transport,
                reason: "Signing was rejected".into(),
                explorer: None,
            }
        );
        assert!(!orch.channel_busy(Channel::Swap));
    }

    #[tokio::test]
    async fn closed_subscription_fails_the_transaction() {
        let orch = orchestrator(
            submitter_with(vec![TxStatus::Ready]),
            MockErrorRegistry::new(),
            MockBalanceRefresher::new(),
        );
        assert_eq!(
            orch.submit(prepared()).await,
            Ok(TxOutcome::Failed(ChainError::SubscriptionClosed))
        );
        let notifications = orch.notifications().drain();
        assert_eq!(notifications.len(), 2);
        assert_eq!(terminal_count(&notifications), 1);
    }
}
