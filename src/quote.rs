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

use crate::balance::{fractional_digits, from_raw_units, round_to, to_raw_units, MAX_DISPLAY_DIGITS};
use crate::chain::PoolQuery;
use crate::prelude::*;
use crate::serialization::balance as balance_serde;
use crate::swap_amount::SwapVariant;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Digits of the reported price impact percentage.
pub const PRICE_IMPACT_DIGITS: u32 = 2;

/// Counter amount and pricing of one trade intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub variant: SwapVariant,
    pub amount_in: BigDecimal,
    pub amount_out: BigDecimal,
    #[serde(with = "balance_serde")]
    pub raw_in: Balance,
    #[serde(with = "balance_serde")]
    pub raw_out: Balance,
    /// Units of the output token per unit of the input token.
    pub price: Option<BigDecimal>,
    /// Percentage, two fraction digits.
    pub price_impact: Option<BigDecimal>,
    /// The chain returned zero for a nonzero amount.
    pub low_trading_minimum: bool,
}

impl Quote {
    /// Amount the user did not type, the one slippage applies to.
    pub fn counter_amount(&self) -> &BigDecimal {
        match self.variant {
            SwapVariant::WithDesiredInput => &self.amount_out,
            SwapVariant::WithDesiredOutput => &self.amount_in,
        }
    }
}

/// Validates the intent without touching the chain, returns the raw edited amount.
pub fn check_intent(intent: &TradeIntent) -> Result<Balance, InputError> {
    if intent.token_in.id == intent.token_out.id {
        return Err(InputError::EqualTokens);
    }
    if intent.amount <= BigDecimal::zero() {
        return Err(InputError::NonPositiveAmount);
    }
    let decimals = intent.edited_token().decimals;
    if fractional_digits(&intent.amount) > decimals as u64 {
        return Err(InputError::TooManyDecimals {
            decimals_allowed: decimals,
        });
    }
    to_raw_units(&intent.amount, decimals)
}

fn ratio(numerator: BigInt, denominator: BigInt) -> BigDecimal {
    BigDecimal::new(numerator, 0) / BigDecimal::new(denominator, 0)
}

/// Impact of one constant product leg as a fraction, `1 - before / after` with
/// `before = reserve_in / reserve_out` and `after = (reserve_in + amount_in) / (reserve_out - amount_out)`.
pub fn leg_impact(
    reserve_in: Balance,
    reserve_out: Balance,
    amount_in: Balance,
    amount_out: Balance,
) -> Result<BigDecimal, QuoteUnavailable> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(QuoteUnavailable::ZeroReserves);
    }
    if amount_out >= reserve_out {
        return Err(QuoteUnavailable::InsufficientLiquidity);
    }
    let (reserve_in, reserve_out) = (BigInt::from(reserve_in), BigInt::from(reserve_out));
    let (amount_in, amount_out) = (BigInt::from(amount_in), BigInt::from(amount_out));
    let before_after = ratio(
        &reserve_in * (&reserve_out - &amount_out),
        &reserve_out * (&reserve_in + &amount_in),
    );
    Ok(BigDecimal::one() - before_after)
}

/// Combines the impacts of the two legs of an asset to asset trade.
pub fn compose_impacts(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    if a < b {
        b * (BigDecimal::one() + a)
    } else {
        a * (BigDecimal::one() + b)
    }
}

fn as_percent(fraction: &BigDecimal) -> BigDecimal {
    round_to(&(fraction * BigDecimal::from(100)), PRICE_IMPACT_DIGITS)
}

/// Prices trade intents through the chain quote primitive.
pub struct QuoteEngine<C: ?Sized> {
    chain: Arc<C>,
}

impl<C: ?Sized> Clone for QuoteEngine<C> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
        }
    }
}

impl<C: PoolQuery + ?Sized> QuoteEngine<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub async fn quote(&self, intent: &TradeIntent) -> Result<Quote, QuoteError> {
        let raw_amount = check_intent(intent)?;
        let (token_in, token_out) = (&intent.token_in, &intent.token_out);
        let counter = match intent.variant {
            SwapVariant::WithDesiredInput => {
                self.chain
                    .quote_exact_tokens_for_tokens(&token_in.id, &token_out.id, raw_amount)
                    .await?
            }
            SwapVariant::WithDesiredOutput => {
                self.chain
                    .quote_tokens_for_exact_tokens(&token_in.id, &token_out.id, raw_amount)
                    .await?
            }
        };
        let counter = match counter {
            Some(counter) => counter,
            None => return Err(self.unavailable_reason(intent).await?.into()),
        };
        let (raw_in, raw_out) = match intent.variant {
            SwapVariant::WithDesiredInput => (raw_amount, counter),
            SwapVariant::WithDesiredOutput => (counter, raw_amount),
        };
        let amount_in = from_raw_units(raw_in, token_in.decimals);
        let amount_out = from_raw_units(raw_out, token_out.decimals);
        if counter.is_zero() {
            debug!(
                "Quote {} -> {} for {} is below trading minimum",
                token_in.id, token_out.id, intent.amount
            );
            return Ok(Quote {
                variant: intent.variant,
                amount_in,
                amount_out,
                raw_in,
                raw_out,
                price: None,
                price_impact: None,
                low_trading_minimum: true,
            });
        }
        let impact = self.price_impact(&token_in.id, &token_out.id, raw_in, raw_out).await?;
        let price = round_to(&(&amount_out / &amount_in), MAX_DISPLAY_DIGITS);
        Ok(Quote {
            variant: intent.variant,
            amount_in,
            amount_out,
            raw_in,
            raw_out,
            price: Some(price),
            price_impact: Some(as_percent(&impact)),
            low_trading_minimum: false,
        })
    }

    /// Quotes `intent` unless a newer request for the same pair and direction was started
    /// meanwhile, in which case `None` is returned and the result is dropped.
    pub async fn quote_latest(
        &self,
        tracker: &QuoteTracker,
        intent: &TradeIntent,
    ) -> Option<Result<Quote, QuoteError>> {
        let ticket = tracker.begin(QuoteKey::of(intent));
        let result = self.quote(intent).await;
        tracker.resolve(&ticket, result)
    }

    /// Price impact of a trade as a fraction, reserves are always fetched fresh.
    pub async fn price_impact(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        raw_in: Balance,
        raw_out: Balance,
    ) -> Result<BigDecimal, QuoteError> {
        if token_in.is_native() || token_out.is_native() {
            let asset = if token_in.is_native() { token_out } else { token_in };
            let reserves = self.reserves(asset).await?;
            return Ok(leg_impact(
                reserves.reserve_of(token_in),
                reserves.reserve_of(token_out),
                raw_in,
                raw_out,
            )?);
        }
        let native = TokenId::native();
        let intermediate = self
            .chain
            .quote_exact_tokens_for_tokens(token_in, &native, raw_in)
            .await?
            .ok_or(QuoteUnavailable::PoolNotFound)?;
        let pool_in = self.reserves(token_in).await?;
        let pool_out = self.reserves(token_out).await?;
        let a = leg_impact(pool_in.asset_reserve, pool_in.native_reserve, raw_in, intermediate)?;
        let b = leg_impact(pool_out.native_reserve, pool_out.asset_reserve, intermediate, raw_out)?;
        Ok(compose_impacts(&a, &b))
    }

    async fn reserves(&self, asset: &TokenId) -> Result<PoolReserves, QuoteError> {
        match self.chain.pool_reserves(asset).await? {
            Some(reserves) if reserves.exists() => Ok(reserves),
            _ => Err(QuoteUnavailable::ZeroReserves.into()),
        }
    }

    async fn unavailable_reason(&self, intent: &TradeIntent) -> Result<QuoteUnavailable, ChainError> {
        for token in [&intent.token_in.id, &intent.token_out.id] {
            if token.is_native() {
                continue;
            }
            match self.chain.pool_reserves(token).await? {
                Some(reserves) if reserves.exists() => {}
                _ => return Ok(QuoteUnavailable::PoolNotFound),
            }
        }
        Ok(QuoteUnavailable::InsufficientLiquidity)
    }

    /// Whether a usable pool pairs `asset` with the native token.
    pub async fn check_pool(&self, asset: &TokenId) -> Result<bool, ChainError> {
        Ok(self
            .chain
            .pool_reserves(asset)
            .await?
            .map_or(false, |reserves| reserves.exists()))
    }

    pub async fn list_pools(&self) -> Result<Vec<TokenId>, ChainError> {
        self.chain.pools().await
    }
}

/// Pair and direction a quote request is superseded by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub variant: SwapVariant,
}

impl QuoteKey {
    pub fn of(intent: &TradeIntent) -> Self {
        Self {
            token_in: intent.token_in.id.clone(),
            token_out: intent.token_out.id.clone(),
            variant: intent.variant,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteTicket {
    key: QuoteKey,
    generation: u64,
}

/// Request generation counter, only the latest request per key may update UI state.
#[derive(Debug, Default)]
pub struct QuoteTracker {
    generations: Mutex<HashMap<QuoteKey, u64>>,
}

impl QuoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: QuoteKey) -> QuoteTicket {
        let mut generations = self.generations.lock().expect("poisoned");
        let generation = generations.entry(key.clone()).or_default();
        *generation += 1;
        QuoteTicket {
            key,
            generation: *generation,
        }
    }

    pub fn is_current(&self, ticket: &QuoteTicket) -> bool {
        let generations = self.generations.lock().expect("poisoned");
        generations.get(&ticket.key) == Some(&ticket.generation)
    }

    pub fn resolve<T>(&self, ticket: &QuoteTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(
                "Dropping stale quote {} -> {} (generation {})",
                ticket.key.token_in, ticket.key.token_out, ticket.generation
            );
            None
        }
    }
}
