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

use crate::prelude::*;
use crate::tx::Channel;
use thiserror::Error;

/// Problems with what the user typed. Surfaced inline, never sent to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputError {
    #[error("Too many decimals, {decimals_allowed} allowed")]
    TooManyDecimals { decimals_allowed: BalancePrecision },
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Amount can not be negative")]
    NegativeAmount,
    #[error("Token is not selected")]
    TokenNotSelected,
    #[error("Selected tokens are equal")]
    EqualTokens,
    #[error("Pool already exists")]
    PoolExists,
    #[error("Invalid number: {value}")]
    InvalidNumber { value: String },
    #[error("Slippage tolerance must be between 0% and 99%")]
    InvalidSlippage,
    #[error("Amount does not fit into the balance type")]
    Overflow,
}

/// The chain can not price the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteUnavailable {
    #[error("Pool not found")]
    PoolNotFound,
    #[error("Pool has no liquidity")]
    ZeroReserves,
    #[error("Not enough liquidity in the pool")]
    InsufficientLiquidity,
}

/// Transport level failures of the chain client, the wallet or the subscription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Signing was rejected")]
    SignatureRejected,
    #[error("Status subscription closed before finalization")]
    SubscriptionClosed,
    #[error("Transaction was dropped from the pool")]
    Dropped,
    #[error("Transaction is invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Unavailable(#[from] QuoteUnavailable),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl QuoteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            QuoteError::Input(_) => ErrorCategory::Input,
            QuoteError::Unavailable(_) => ErrorCategory::QuoteUnavailable,
            QuoteError::Chain(_) => ErrorCategory::Transport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("Another {0} transaction is still pending")]
    ChannelBusy(Channel),
    #[error("Orchestrator is missing {0}")]
    Incomplete(&'static str),
}

/// What the UI shows for a failure, every error ends up in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Input,
    QuoteUnavailable,
    FeeEstimation,
    Dispatch,
    Transport,
    Timeout,
}
