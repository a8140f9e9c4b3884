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

use super::*;
use crate::prelude::*;
use clap::*;
use dex_engine::balance::{format_for_display, from_raw_units, parse_amount, to_raw_units};
use dex_engine::chain::PoolQuery;
use dex_engine::max_amount::{MaxAmountRequest, MaxAmountSolver};
use std::sync::Arc;

#[derive(Args, Clone, Debug)]
pub(super) struct MaxAmount {
    #[clap(flatten)]
    pools: Pools,
    #[clap(flatten)]
    output: Output,
    #[clap(long)]
    sell: TokenArg,
    #[clap(long)]
    sell_decimals: Option<BalancePrecision>,
    #[clap(long)]
    buy: TokenArg,
    #[clap(long)]
    buy_decimals: Option<BalancePrecision>,
    /// Free balance of the sold token, decimal
    #[clap(long)]
    balance: String,
    /// Minimum balance of the sold asset in raw units, the existential deposit for native
    #[clap(long, default_value = "0")]
    sell_min_balance: Balance,
    /// Minimum balance of the bought asset in raw units, the existential deposit for native
    #[clap(long, default_value = "0")]
    buy_min_balance: Balance,
    /// Network fee estimate in raw native units
    #[clap(long)]
    fee: Option<Balance>,
}

impl MaxAmount {
    pub(super) async fn run(&self, config: &EngineConfig) -> AnyResult<()> {
        let chain = Arc::new(self.pools.chain(config));
        let sell = self.sell.token(config, self.sell_decimals)?;
        let buy = self.buy.token(config, self.buy_decimals)?;
        let balance = to_raw_units(&parse_amount(&self.balance)?, sell.decimals)?;
        let floor = |token: &Token, given: Balance| {
            if token.is_native() {
                config.existential_deposit
            } else {
                given
            }
        };
        let pool_asset = if buy.is_native() { &sell.id } else { &buy.id };
        let reserves = chain
            .pool_reserves(pool_asset)
            .await?
            .ok_or_else(|| anyhow!("No pool for {}", pool_asset))?;
        let request = MaxAmountRequest {
            sell_token_min_balance: floor(&sell, self.sell_min_balance),
            buy_pool_reserve: reserves.reserve_of(&buy.id),
            buy_token_min_balance_or_ed: floor(&buy, self.buy_min_balance),
            sell_token: sell.with_balance(balance),
            buy_token: buy,
            fee_estimate: self.fee,
        };
        let result = MaxAmountSolver::new(chain)
            .solve(&request)
            .await
            .context("Max amount failed")?;
        self.output.print(&result, || {
            let mut text = format!(
                "Max {}: {} for {} {}",
                request.sell_token.symbol,
                format_for_display(&result.max_sell_amount, None, false),
                format_for_display(
                    &from_raw_units(result.expected_out_raw, request.buy_token.decimals),
                    None,
                    false
                ),
                request.buy_token.symbol,
            );
            if result.fee_exceeds_balance {
                text.push_str("\nNetwork fee exceeds the available balance");
            }
            if result.below_minimum {
                text.push_str("\nOutput is below the minimum balance of the bought token");
            }
            text
        })
    }
}
