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

//! Amount math of XCM transfers between the relay chain and Asset Hub.

use crate::chain::{AccountId, Extrinsic};
use crate::prelude::*;
use crate::serialization::{balance as balance_serde, option_balance};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XcmDirection {
    /// Relay chain to Asset Hub.
    CrossIn,
    /// Asset Hub to relay chain.
    CrossOut,
}

impl fmt::Display for XcmDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XcmDirection::CrossIn => write!(f, "relay chain -> Asset Hub"),
            XcmDirection::CrossOut => write!(f, "Asset Hub -> relay chain"),
        }
    }
}

/// Calibrated fee constants of one direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XcmFees {
    /// Charged on the destination chain out of the transferred amount.
    #[serde(with = "balance_serde")]
    pub destination_fee: Balance,
    /// Added on top of the estimated origin fee for the XCM instructions.
    #[serde(with = "balance_serde")]
    pub xcm_buffer: Balance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainFees {
    pub cross_in: XcmFees,
    pub cross_out: XcmFees,
}

impl CrossChainFees {
    pub fn get(&self, direction: XcmDirection) -> &XcmFees {
        match direction {
            XcmDirection::CrossIn => &self.cross_in,
            XcmDirection::CrossOut => &self.cross_out,
        }
    }
}

/// What the transfer form knows when the user edits the amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossChainRequest {
    pub direction: XcmDirection,
    pub origin_account: AccountId,
    pub destination_account: AccountId,
    pub amount: Balance,
    pub free_balance: Balance,
    pub existential_deposit: Balance,
    /// `None` when fee estimation failed.
    pub origin_fee_estimate: Option<Balance>,
    /// Fetched on demand, only when the destination account differs.
    pub destination_balance: Option<Balance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CrossChainTransfer {
    pub direction: XcmDirection,
    #[serde(with = "balance_serde")]
    pub amount: Balance,
    #[serde(with = "balance_serde")]
    pub max_transferable: Balance,
    #[serde(with = "option_balance")]
    pub displayed_origin_fee: Option<Balance>,
    #[serde(with = "balance_serde")]
    pub destination_fee: Balance,
    #[serde(with = "option_balance")]
    pub destination_balance_after: Option<Balance>,
    pub exceeds_max: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CrossChainCalculator {
    fees: CrossChainFees,
}

impl CrossChainCalculator {
    pub fn new(fees: CrossChainFees) -> Self {
        Self { fees }
    }

    pub fn fees(&self, direction: XcmDirection) -> &XcmFees {
        self.fees.get(direction)
    }

    /// `free - origin_fee - existential_deposit - destination_fee`, never below zero.
    pub fn max_transferable(
        &self,
        free: Balance,
        origin_fee: Balance,
        existential_deposit: Balance,
        direction: XcmDirection,
    ) -> Balance {
        free.saturating_sub(origin_fee)
            .saturating_sub(existential_deposit)
            .saturating_sub(self.fees(direction).destination_fee)
    }

    pub fn displayed_origin_fee(&self, estimated: Balance, direction: XcmDirection) -> Balance {
        estimated.saturating_add(self.fees(direction).xcm_buffer)
    }

    /// Destination balance once the transfer lands, net of the destination fee.
    pub fn destination_balance_after(
        &self,
        destination_balance: Balance,
        amount: Balance,
        direction: XcmDirection,
    ) -> Balance {
        destination_balance.saturating_add(amount.saturating_sub(self.fees(direction).destination_fee))
    }

    pub fn summary(&self, request: &CrossChainRequest) -> CrossChainTransfer {
        let origin_fee = request.origin_fee_estimate.unwrap_or_else(|| {
            debug!("Origin fee unknown, max transferable ignores it");
            0
        });
        let max_transferable = self.max_transferable(
            request.free_balance,
            origin_fee,
            request.existential_deposit,
            request.direction,
        );
        let destination_balance_after = if request.destination_account != request.origin_account {
            request
                .destination_balance
                .map(|balance| self.destination_balance_after(balance, request.amount, request.direction))
        } else {
            None
        };
        CrossChainTransfer {
            direction: request.direction,
            amount: request.amount,
            max_transferable,
            displayed_origin_fee: request
                .origin_fee_estimate
                .map(|fee| self.displayed_origin_fee(fee, request.direction)),
            destination_fee: self.fees(request.direction).destination_fee,
            destination_balance_after,
            exceeds_max: request.amount > max_transferable,
        }
    }
}

impl CrossChainRequest {
    pub fn to_extrinsic(&self) -> Extrinsic {
        Extrinsic::CrossChain {
            direction: self.direction,
            beneficiary: self.destination_account.clone(),
            amount: self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> CrossChainCalculator {
        CrossChainCalculator::new(CrossChainFees {
            cross_in: XcmFees {
                destination_fee: 30,
                xcm_buffer: 5,
            },
            cross_out: XcmFees {
                destination_fee: 100,
                xcm_buffer: 20,
            },
        })
    }

    fn request() -> CrossChainRequest {
        CrossChainRequest {
            direction: XcmDirection::CrossOut,
            origin_account: "alice".into(),
            destination_account: "alice".into(),
            amount: 500,
            free_balance: 1_000,
            existential_deposit: 50,
            origin_fee_estimate: Some(10),
            destination_balance: Some(7),
        }
    }

    #[test]
    fn max_subtracts_every_fee_and_deposit() {
        let calc = calculator();
        assert_eq!(calc.max_transferable(1_000, 10, 50, XcmDirection::CrossOut), 840);
        assert_eq!(calc.max_transferable(1_000, 10, 50, XcmDirection::CrossIn), 910);
        assert_eq!(calc.max_transferable(100, 10, 50, XcmDirection::CrossOut), 0);
    }

    #[test]
    fn displayed_fee_includes_buffer() {
        let calc = calculator();
        assert_eq!(calc.displayed_origin_fee(10, XcmDirection::CrossOut), 30);
        assert_eq!(calc.displayed_origin_fee(10, XcmDirection::CrossIn), 15);
    }

    #[test]
    fn destination_balance_only_for_other_accounts() {
        let calc = calculator();
        let summary = calc.summary(&request());
        assert_eq!(summary.destination_balance_after, None);
        assert_eq!(summary.max_transferable, 840);
        assert_eq!(summary.displayed_origin_fee, Some(30));
        assert!(!summary.exceeds_max);

        let other = CrossChainRequest {
            destination_account: "bob".into(),
            amount: 900,
            ..request()
        };
        let summary = calc.summary(&other);
        assert_eq!(summary.destination_balance_after, Some(807));
        assert_eq!(summary.max_transferable, 840);
        assert!(summary.exceeds_max);
    }

    #[test]
    fn unknown_fee_hides_the_fee_display() {
        let summary = calculator().summary(&CrossChainRequest {
            origin_fee_estimate: None,
            ..request()
        });
        assert_eq!(summary.displayed_origin_fee, None);
        assert_eq!(summary.max_transferable, 850);
    }

    #[test]
    fn extrinsic_pays_the_destination_account() {
        let req = CrossChainRequest {
            destination_account: "bob".into(),
            ..request()
        };
        assert_eq!(
            req.to_extrinsic(),
            Extrinsic::CrossChain {
                direction: XcmDirection::CrossOut,
                beneficiary: "bob".into(),
                amount: 500,
            }
        );
    }
}
