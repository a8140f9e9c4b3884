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

//! Interfaces of the chain client and wallet collaborators.
//!
//! The engine never talks to an RPC endpoint itself. Everything it needs from the Asset Hub
//! node comes through the traits below, which keeps the calculators testable against
//! [`xyk::OfflineChain`] or mocks.

pub mod xyk;

use crate::cross_chain::XcmDirection;
use crate::prelude::*;
use crate::swap_amount::SwapAmount;
use codec::{Decode, Encode};
use futures::stream::BoxStream;

pub type BlockHash = [u8; 32];

/// SS58 address of an account, as handed out by the wallet.
pub type AccountId = String;

pub type TxStatusStream = BoxStream<'static, Result<TxStatus, ChainError>>;

/// Read-only pool queries of the asset conversion pallet.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PoolQuery: Send + Sync {
    /// Reserves of the native/`asset` pool, `None` when the pool was never created.
    async fn pool_reserves(&self, asset: &TokenId) -> Result<Option<PoolReserves>, ChainError>;

    /// Assets which have a pool against the native token.
    async fn pools(&self) -> Result<Vec<TokenId>, ChainError>;

    /// Output for an exact input, routed through the native token when both sides are assets.
    /// `None` when no route exists.
    async fn quote_exact_tokens_for_tokens(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: Balance,
    ) -> Result<Option<Balance>, ChainError>;

    /// Input required for an exact output.
    async fn quote_tokens_for_exact_tokens(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_out: Balance,
    ) -> Result<Option<Balance>, ChainError>;
}

/// Account and asset registry queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    async fn asset_metadata(&self, asset: &TokenId) -> Result<Option<AssetMetadata>, ChainError>;

    async fn account_balance(
        &self,
        account: &str,
        token: &TokenId,
    ) -> Result<AccountBalance, ChainError>;

    async fn existential_deposit(&self) -> Result<Balance, ChainError>;
}

/// Signs, broadcasts and watches extrinsics on behalf of the wallet.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtrinsicSubmitter: Send + Sync {
    async fn estimate_fee(&self, signer: &str, call: &Extrinsic) -> Result<Balance, ChainError>;

    /// Signing may be rejected by the user, which is reported as
    /// [`ChainError::SignatureRejected`] before any status is produced.
    async fn sign_and_watch(
        &self,
        signer: &str,
        call: &Extrinsic,
    ) -> Result<TxStatusStream, ChainError>;
}

/// Metadata lookup of module errors.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorRegistry: Send + Sync {
    fn lookup(&self, error: &ModuleError) -> Option<DecodedModuleError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Ready,
    InBlock(BlockHash),
    Finalized {
        block: BlockHash,
        events: Vec<ChainEvent>,
        dispatch_error: Option<DispatchError>,
    },
    Dropped,
    Invalid(String),
}

/// Events the engine understands, already decoded by the chain client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainEvent {
    SwapExecuted {
        amount_in: Balance,
        amount_out: Balance,
        path: Vec<TokenId>,
    },
    LiquidityAdded {
        asset: TokenId,
        native_amount: Balance,
        asset_amount: Balance,
        lp_minted: Balance,
    },
    LiquidityRemoved {
        asset: TokenId,
        native_amount: Balance,
        asset_amount: Balance,
        lp_burned: Balance,
    },
    PoolCreated {
        asset: TokenId,
    },
    XcmTransferred {
        amount: Balance,
    },
    Other {
        pallet: String,
        variant: String,
    },
}

/// SCALE encoded module error as found in `DispatchError::Module`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct ModuleError {
    pub index: u8,
    pub error: [u8; 4],
}

impl ModuleError {
    pub fn from_scale(mut bytes: &[u8]) -> Result<Self, codec::Error> {
        Self::decode(&mut bytes)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedModuleError {
    pub pallet: String,
    pub error: String,
    pub docs: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    Module(ModuleError),
    BadOrigin,
    Token(String),
    Arithmetic(String),
    Other(String),
}

/// Calls the engine asks the submitter to sign. Encoding them is left to the chain client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extrinsic {
    CreatePool {
        asset: TokenId,
    },
    AddLiquidity {
        asset: TokenId,
        native_desired: Balance,
        asset_desired: Balance,
        native_min: Balance,
        asset_min: Balance,
    },
    RemoveLiquidity {
        asset: TokenId,
        lp_amount: Balance,
        native_min: Balance,
        asset_min: Balance,
    },
    Swap {
        path: Vec<TokenId>,
        amount: SwapAmount<Balance>,
    },
    CrossChain {
        direction: XcmDirection,
        beneficiary: AccountId,
        amount: Balance,
    },
}

impl Extrinsic {
    /// Swap call with the routing path the pallet expects, asset to asset goes through native.
    pub fn swap(token_in: &TokenId, token_out: &TokenId, amount: SwapAmount<Balance>) -> Self {
        let path = if !token_in.is_native() && !token_out.is_native() {
            vec![token_in.clone(), TokenId::native(), token_out.clone()]
        } else {
            vec![token_in.clone(), token_out.clone()]
        };
        Extrinsic::Swap { path, amount }
    }
}
