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

use crate::balance::{
    fractional_digits, from_raw_units, increase_by_slippage, parse_amount, reduce_by_slippage, to_raw_units,
};
use crate::prelude::*;
use crate::quote::Quote;
use crate::swap_amount::{SwapAmount, SwapVariant};
use core::fmt;
use core::str::FromStr;
use num_traits::ToPrimitive;

/// Default tolerance of 15 %, pools on Asset Hub are thin and move fast.
pub const DEFAULT_TOLERANCE_BPS: u32 = 1500;

/// Tolerance has to stay strictly below 100 %.
pub const MAX_TOLERANCE_BPS: u32 = 9900;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SlippageTolerance(u32);

impl SlippageTolerance {
    pub fn from_bps(bps: u32) -> Result<Self, InputError> {
        if bps > MAX_TOLERANCE_BPS {
            return Err(InputError::InvalidSlippage);
        }
        Ok(Self(bps))
    }

    /// Parses a percentage like `"0.5"` or `"15"`, at most two fraction digits.
    pub fn from_percent(percent: &str) -> Result<Self, InputError> {
        let percent = parse_amount(percent).map_err(|_| InputError::InvalidSlippage)?;
        let bps = percent * BigDecimal::from(100);
        if fractional_digits(&bps) > 0 {
            return Err(InputError::InvalidSlippage);
        }
        let bps = bps.to_u32().ok_or(InputError::InvalidSlippage)?;
        Self::from_bps(bps)
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    pub fn as_percent(&self) -> BigDecimal {
        BigDecimal::new(self.0.into(), 2)
    }
}

impl Default for SlippageTolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE_BPS)
    }
}

impl TryFrom<u32> for SlippageTolerance {
    type Error = InputError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_bps(bps)
    }
}

impl From<SlippageTolerance> for u32 {
    fn from(tolerance: SlippageTolerance) -> Self {
        tolerance.0
    }
}

impl FromStr for SlippageTolerance {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_percent(s)
    }
}

impl fmt::Display for SlippageTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (whole, rest) = (self.0 / 100, self.0 % 100);
        if rest == 0 {
            write!(f, "{}%", whole)
        } else {
            let rest = format!("{:02}", rest);
            write!(f, "{}.{}%", whole, rest.trim_end_matches('0'))
        }
    }
}

/// Minimum received for exact-in trades, maximum paid for exact-out trades.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlippageBound {
    pub variant: SwapVariant,
    pub desired_amount: BigDecimal,
    pub tolerance: SlippageTolerance,
    pub bounded_amount: BigDecimal,
}

impl SlippageBound {
    pub fn new(variant: SwapVariant, desired_amount: BigDecimal, tolerance: SlippageTolerance) -> Self {
        let bounded_amount = match variant {
            SwapVariant::WithDesiredInput => reduce_by_slippage(&desired_amount, tolerance.bps()),
            SwapVariant::WithDesiredOutput => increase_by_slippage(&desired_amount, tolerance.bps()),
        };
        Self {
            variant,
            desired_amount,
            tolerance,
            bounded_amount,
        }
    }

    /// Bound in raw units, rounded down and saturated to the balance range.
    pub fn bounded_raw(&self, decimals: BalancePrecision) -> Balance {
        match to_raw_units(&self.bounded_amount, decimals) {
            Ok(raw) => raw,
            Err(_) => Balance::MAX,
        }
    }
}

/// Last quote of a trade, kept in raw units so tolerance changes never read stale form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotedTrade {
    pub variant: SwapVariant,
    pub raw_in: Balance,
    pub raw_out: Balance,
    pub decimals_in: BalancePrecision,
    pub decimals_out: BalancePrecision,
}

impl QuotedTrade {
    pub fn from_quote(quote: &Quote, intent: &TradeIntent) -> Self {
        Self {
            variant: quote.variant,
            raw_in: quote.raw_in,
            raw_out: quote.raw_out,
            decimals_in: intent.token_in.decimals,
            decimals_out: intent.token_out.decimals,
        }
    }

    fn counter(&self) -> (Balance, BalancePrecision) {
        match self.variant {
            SwapVariant::WithDesiredInput => (self.raw_out, self.decimals_out),
            SwapVariant::WithDesiredOutput => (self.raw_in, self.decimals_in),
        }
    }

    fn desired_raw(&self) -> Balance {
        match self.variant {
            SwapVariant::WithDesiredInput => self.raw_in,
            SwapVariant::WithDesiredOutput => self.raw_out,
        }
    }
}

/// Swap form state owned by the caller: remembered trade and chosen tolerance.
#[derive(Clone, Debug, Default)]
pub struct SwapForm {
    last: Option<QuotedTrade>,
    tolerance: SlippageTolerance,
}

impl SwapForm {
    pub fn new(tolerance: SlippageTolerance) -> Self {
        Self {
            last: None,
            tolerance,
        }
    }

    pub fn tolerance(&self) -> SlippageTolerance {
        self.tolerance
    }

    pub fn last_trade(&self) -> Option<&QuotedTrade> {
        self.last.as_ref()
    }

    /// Remembers a freshly applied quote and returns its bound.
    pub fn apply_quote(&mut self, quote: &Quote, intent: &TradeIntent) -> Option<SlippageBound> {
        self.last = Some(QuotedTrade::from_quote(quote, intent));
        self.bound()
    }

    /// Changes the tolerance and recomputes the bound of the remembered trade.
    pub fn set_tolerance(&mut self, tolerance: SlippageTolerance) -> Option<SlippageBound> {
        self.tolerance = tolerance;
        self.recompute(tolerance)
    }

    pub fn bound(&self) -> Option<SlippageBound> {
        self.recompute(self.tolerance)
    }

    pub fn recompute(&self, tolerance: SlippageTolerance) -> Option<SlippageBound> {
        let trade = self.last.as_ref()?;
        let (raw, decimals) = trade.counter();
        Some(SlippageBound::new(
            trade.variant,
            from_raw_units(raw, decimals),
            tolerance,
        ))
    }

    /// Desired amount and limit in raw units, ready for the swap extrinsic.
    pub fn to_swap_amount(&self, tolerance: SlippageTolerance) -> Option<SwapAmount<Balance>> {
        let trade = self.last.as_ref()?;
        let bound = self.recompute(tolerance)?;
        let (_, decimals) = trade.counter();
        Some(SwapAmount::with_variant(
            trade.variant,
            trade.desired_raw(),
            bound.bounded_raw(decimals),
        ))
    }

    /// Forgets the trade, e.g. on token pair change or wallet disconnect.
    pub fn clear(&mut self) {
        self.last = None;
    }
}
