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
use dex_engine::cross_chain::{CrossChainCalculator, CrossChainRequest, XcmDirection};

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    CrossIn,
    CrossOut,
}

impl From<Direction> for XcmDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::CrossIn => XcmDirection::CrossIn,
            Direction::CrossOut => XcmDirection::CrossOut,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub(super) struct CrossChain {
    #[clap(flatten)]
    output: Output,
    #[clap(long, arg_enum)]
    direction: Direction,
    /// Decimal amount to transfer
    #[clap(long, short)]
    amount: String,
    /// Free native balance on the origin chain, decimal
    #[clap(long)]
    free: String,
    /// Existential deposit of the origin chain in raw units, the configured one when omitted
    #[clap(long)]
    existential_deposit: Option<Balance>,
    /// Estimated origin fee in raw units
    #[clap(long)]
    origin_fee: Option<Balance>,
    #[clap(long, default_value = "self")]
    origin_account: String,
    #[clap(long, default_value = "self")]
    destination_account: String,
    /// Native balance of the destination account in raw units
    #[clap(long)]
    destination_balance: Option<Balance>,
}

impl CrossChain {
    pub(super) fn run(&self, config: &EngineConfig) -> AnyResult<()> {
        let decimals = config.native_decimals;
        let request = CrossChainRequest {
            direction: self.direction.into(),
            origin_account: self.origin_account.clone(),
            destination_account: self.destination_account.clone(),
            amount: to_raw_units(&parse_amount(&self.amount)?, decimals)?,
            free_balance: to_raw_units(&parse_amount(&self.free)?, decimals)?,
            existential_deposit: self
                .existential_deposit
                .unwrap_or(config.existential_deposit),
            origin_fee_estimate: self.origin_fee,
            destination_balance: self.destination_balance,
        };
        let summary = CrossChainCalculator::new(config.cross_chain).summary(&request);
        let show = |raw: Balance| {
            format!(
                "{} {}",
                format_for_display(&from_raw_units(raw, decimals), None, false),
                config.native_symbol
            )
        };
        self.output.print(&summary, || {
            let mut text = format!(
                "{}: {}\nMax transferable: {}\nDestination fee: {}",
                summary.direction,
                show(summary.amount),
                show(summary.max_transferable),
                show(summary.destination_fee)
            );
            if let Some(fee) = summary.displayed_origin_fee {
                text.push_str(&format!("\nOrigin fee: {}", show(fee)));
            }
            if let Some(balance) = summary.destination_balance_after {
                text.push_str(&format!("\nDestination balance after: {}", show(balance)));
            }
            if summary.exceeds_max {
                text.push_str("\nAmount exceeds the transferable maximum");
            }
            text
        })
    }
}
