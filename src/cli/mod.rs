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

mod cross_chain;
mod error;
mod max_amount;
mod quote;

use error::*;

use crate::prelude::*;
use clap::*;
use dex_engine::chain::xyk::OfflineChain;
use dex_engine::config::EngineConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Offline calculators of the Asset Hub DEX engine
#[derive(Parser, Debug)]
#[clap(version, author)]
pub struct Cli {
    /// JSON engine config, Kusama Asset Hub defaults when omitted
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    commands: Commands,
}

impl Cli {
    pub async fn run(&self) -> AnyResult<()> {
        let config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        self.commands.run(&config).await
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    Quote(quote::Quote),
    MaxAmount(max_amount::MaxAmount),
    CrossChain(cross_chain::CrossChain),
}

impl Commands {
    pub async fn run(&self, config: &EngineConfig) -> AnyResult<()> {
        match self {
            Self::Quote(cmd) => cmd.run(config).await,
            Self::MaxAmount(cmd) => cmd.run(config).await,
            Self::CrossChain(cmd) => cmd.run(config),
        }
    }
}

/// `native` or an asset id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenArg(TokenId);

impl TokenArg {
    pub fn token(&self, config: &EngineConfig, decimals: Option<BalancePrecision>) -> AnyResult<Token> {
        if self.0.is_native() {
            return Ok(config.native_token());
        }
        let decimals = decimals.ok_or_else(|| CliError::MissingDecimals(self.0.to_string()))?;
        Ok(Token::new(self.0.clone(), self.0.as_str(), decimals))
    }
}

impl FromStr for TokenArg {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" | "" => Ok(Self(TokenId::native())),
            id if id.chars().all(|c| c.is_ascii_alphanumeric()) => Ok(Self(TokenId::asset(id))),
            id => Err(CliError::InvalidToken(id.to_string())),
        }
    }
}

/// `<asset>:<native reserve>:<asset reserve>` in raw units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolArg {
    asset: TokenId,
    reserves: PoolReserves,
}

impl FromStr for PoolArg {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CliError::InvalidPool(s.to_string());
        let mut parts = s.split(':');
        let (asset, native_reserve, asset_reserve) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(asset), Some(native), Some(other), None) if !asset.is_empty() => {
                    (asset, native, other)
                }
                _ => return Err(invalid()),
            };
        Ok(Self {
            asset: TokenId::asset(asset),
            reserves: PoolReserves::new(
                native_reserve.parse().map_err(|_| invalid())?,
                asset_reserve.parse().map_err(|_| invalid())?,
            ),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct Pools {
    /// Pool reserves as `<asset>:<native reserve>:<asset reserve>`, repeatable
    #[clap(long = "pool")]
    pools: Vec<PoolArg>,
}

impl Pools {
    pub fn chain(&self, config: &EngineConfig) -> OfflineChain {
        self.pools
            .iter()
            .fold(OfflineChain::new(config.lp_fee_permille), |chain, pool| {
                chain.with_pool(pool.asset.clone(), pool.reserves)
            })
    }
}

#[derive(Args, Debug, Clone)]
pub struct Output {
    /// Print JSON instead of text
    #[clap(long)]
    json: bool,
}

impl Output {
    pub fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> AnyResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}
