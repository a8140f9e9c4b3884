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
use dex_engine::balance::{format_for_display, parse_amount};
use dex_engine::quote::QuoteEngine;
use dex_engine::slippage::{SlippageTolerance, SwapForm};
use dex_engine::swap_amount::SwapVariant;
use std::sync::Arc;

#[derive(Args, Clone, Debug)]
pub(super) struct Quote {
    #[clap(flatten)]
    pools: Pools,
    #[clap(flatten)]
    output: Output,
    #[clap(long)]
    token_in: TokenArg,
    /// Required for assets
    #[clap(long)]
    decimals_in: Option<BalancePrecision>,
    #[clap(long)]
    token_out: TokenArg,
    #[clap(long)]
    decimals_out: Option<BalancePrecision>,
    /// Decimal amount of the input, or of the output with `--exact-out`
    #[clap(long, short)]
    amount: String,
    #[clap(long)]
    exact_out: bool,
    /// Slippage tolerance in percent
    #[clap(long)]
    slippage: Option<SlippageTolerance>,
}

#[derive(Serialize)]
struct QuoteReport {
    quote: dex_engine::quote::Quote,
    slippage: SlippageTolerance,
    bound: Option<dex_engine::slippage::SlippageBound>,
}

impl Quote {
    pub(super) async fn run(&self, config: &EngineConfig) -> AnyResult<()> {
        let engine = QuoteEngine::new(Arc::new(self.pools.chain(config)));
        let variant = if self.exact_out {
            SwapVariant::WithDesiredOutput
        } else {
            SwapVariant::WithDesiredInput
        };
        let intent = TradeIntent::new(
            self.token_in.token(config, self.decimals_in)?,
            self.token_out.token(config, self.decimals_out)?,
            parse_amount(&self.amount)?,
            variant,
        );
        let quote = engine.quote(&intent).await.context("Quote failed")?;
        let slippage = self.slippage.unwrap_or(config.slippage);
        let mut form = SwapForm::new(slippage);
        let bound = form.apply_quote(&quote, &intent);
        let report = QuoteReport {
            quote,
            slippage,
            bound,
        };
        self.output.print(&report, || {
            let quote = &report.quote;
            let mut text = format!(
                "{} {} -> {} {}",
                format_for_display(&quote.amount_in, None, false),
                intent.token_in.symbol,
                format_for_display(&quote.amount_out, None, false),
                intent.token_out.symbol,
            );
            if let Some(impact) = &quote.price_impact {
                text.push_str(&format!("\nPrice impact: {}%", impact));
            }
            if let Some(bound) = &report.bound {
                let (label, token) = match variant {
                    SwapVariant::WithDesiredInput => ("Minimum received", &intent.token_out),
                    SwapVariant::WithDesiredOutput => ("Maximum sold", &intent.token_in),
                };
                text.push_str(&format!(
                    "\n{} ({} slippage): {} {}",
                    label,
                    report.slippage,
                    format_for_display(&bound.bounded_amount, None, false),
                    token.symbol
                ));
            }
            if quote.low_trading_minimum {
                text.push_str("\nAmount is too low to trade");
            }
            text
        })
    }
}
