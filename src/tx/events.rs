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

use super::TxKind;
use crate::chain::ChainEvent;
use crate::prelude::*;
use crate::serialization::balance as balance_serde;
use core::fmt;

/// Amounts the chain actually executed, read from the finalized block events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Executed {
    Swap {
        #[serde(with = "balance_serde")]
        amount_in: Balance,
        #[serde(with = "balance_serde")]
        amount_out: Balance,
    },
    AddLiquidity {
        #[serde(with = "balance_serde")]
        native_amount: Balance,
        #[serde(with = "balance_serde")]
        asset_amount: Balance,
        #[serde(with = "balance_serde")]
        lp_minted: Balance,
    },
    RemoveLiquidity {
        #[serde(with = "balance_serde")]
        native_amount: Balance,
        #[serde(with = "balance_serde")]
        asset_amount: Balance,
        #[serde(with = "balance_serde")]
        lp_burned: Balance,
    },
    CreatePool {
        asset: TokenId,
    },
    CrossChain {
        #[serde(with = "balance_serde")]
        amount: Balance,
    },
    /// Finalized without an event the engine knows for this kind.
    Unknown,
}

impl fmt::Display for Executed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executed::Swap {
                amount_in,
                amount_out,
            } => write!(f, "sold {} for {}", amount_in, amount_out),
            Executed::AddLiquidity {
                native_amount,
                asset_amount,
                lp_minted,
            } => write!(
                f,
                "deposited {} native and {} asset for {} LP",
                native_amount, asset_amount, lp_minted
            ),
            Executed::RemoveLiquidity {
                native_amount,
                asset_amount,
                lp_burned,
            } => write!(
                f,
                "withdrew {} native and {} asset for {} LP",
                native_amount, asset_amount, lp_burned
            ),
            Executed::CreatePool { asset } => write!(f, "created pool for {}", asset),
            Executed::CrossChain { amount } => write!(f, "transferred {}", amount),
            Executed::Unknown => write!(f, "no amounts reported"),
        }
    }
}

/// Picks the executed amounts of a transaction of `kind` out of its events.
pub fn parse_executed(kind: TxKind, events: &[ChainEvent]) -> Executed {
    let executed = match kind {
        TxKind::Swap => {
            let mut swaps = events.iter().filter_map(|event| match event {
                ChainEvent::SwapExecuted {
                    amount_in,
                    amount_out,
                    ..
                } => Some((*amount_in, *amount_out)),
                _ => None,
            });
            swaps.next().map(|(amount_in, first_out)| {
                let amount_out = swaps.last().map_or(first_out, |(_, out)| out);
                Executed::Swap {
                    amount_in,
                    amount_out,
                }
            })
        }
        TxKind::AddLiquidity => events.iter().find_map(|event| match event {
            ChainEvent::LiquidityAdded {
                native_amount,
                asset_amount,
                lp_minted,
                ..
            } => Some(Executed::AddLiquidity {
                native_amount: *native_amount,
                asset_amount: *asset_amount,
                lp_minted: *lp_minted,
            }),
            _ => None,
        }),
        TxKind::RemoveLiquidity => events.iter().find_map(|event| match event {
            ChainEvent::LiquidityRemoved {
                native_amount,
                asset_amount,
                lp_burned,
                ..
            } => Some(Executed::RemoveLiquidity {
                native_amount: *native_amount,
                asset_amount: *asset_amount,
                lp_burned: *lp_burned,
            }),
            _ => None,
        }),
        TxKind::CreatePool => events.iter().find_map(|event| match event {
            ChainEvent::PoolCreated { asset } => Some(Executed::CreatePool {
                asset: asset.clone(),
            }),
            _ => None,
        }),
        TxKind::CrossIn | TxKind::CrossOut => events.iter().find_map(|event| match event {
            ChainEvent::XcmTransferred { amount } => Some(Executed::CrossChain { amount: *amount }),
            _ => None,
        }),
    };
    executed.unwrap_or_else(|| {
        warn!("No {} event among {} finalized events", kind, events.len());
        Executed::Unknown
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other() -> ChainEvent {
        ChainEvent::Other {
            pallet: "System".into(),
            variant: "ExtrinsicSuccess".into(),
        }
    }

    #[test]
    fn swap_amounts_come_from_events() {
        let events = vec![
            other(),
            ChainEvent::SwapExecuted {
                amount_in: 1_000,
                amount_out: 497,
                path: vec![TokenId::native(), TokenId::asset("1984")],
            },
        ];
        assert_eq!(
            parse_executed(TxKind::Swap, &events),
            Executed::Swap {
                amount_in: 1_000,
                amount_out: 497
            }
        );
    }

    #[test]
    fn multi_hop_swap_takes_first_input_and_last_output() {
        let events = vec![
            ChainEvent::SwapExecuted {
                amount_in: 10,
                amount_out: 20,
                path: vec![TokenId::asset("1"), TokenId::native()],
            },
            ChainEvent::SwapExecuted {
                amount_in: 20,
                amount_out: 40,
                path: vec![TokenId::native(), TokenId::asset("2")],
            },
        ];
        assert_eq!(
            parse_executed(TxKind::Swap, &events),
            Executed::Swap {
                amount_in: 10,
                amount_out: 40
            }
        );
    }

    #[test]
    fn missing_event_is_unknown() {
        assert_eq!(parse_executed(TxKind::AddLiquidity, &[other()]), Executed::Unknown);
        assert_eq!(
            parse_executed(
                TxKind::CrossOut,
                &[ChainEvent::XcmTransferred { amount: 5 }]
            ),
            Executed::CrossChain { amount: 5 }
        );
    }
}
