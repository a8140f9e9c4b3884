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

//! Constant product pools evaluated locally with the asset conversion pallet formulas.

use super::PoolQuery;
use crate::prelude::*;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::collections::BTreeMap;

/// Fee the pallet takes from every input, in permille.
pub const DEFAULT_LP_FEE_PERMILLE: u32 = 3;

const PERMILLE: u32 = 1000;

/// Share of the input left after the LP fee, `None` when the fee takes all of it.
fn fee_factor(lp_fee_permille: u32) -> Option<u32> {
    PERMILLE.checked_sub(lp_fee_permille).filter(|factor| *factor > 0)
}

fn mul_div(a: Balance, b: Balance, c: Balance) -> Option<Balance> {
    if c.is_zero() {
        return None;
    }
    (BigUint::from(a) * BigUint::from(b) / BigUint::from(c)).to_u128()
}

/// Given an input amount and pair reserves, returns the maximum output amount of the other side.
pub fn amount_out(
    amount_in: Balance,
    reserve_in: Balance,
    reserve_out: Balance,
    lp_fee_permille: u32,
) -> Option<Balance> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return None;
    }
    let amount_in_with_fee = BigUint::from(amount_in) * fee_factor(lp_fee_permille)?;
    let numerator = &amount_in_with_fee * reserve_out;
    let denominator = BigUint::from(reserve_in) * PERMILLE + amount_in_with_fee;
    (numerator / denominator).to_u128()
}

/// Given an output amount and pair reserves, returns the input amount required to get it.
pub fn amount_in(
    amount_out: Balance,
    reserve_in: Balance,
    reserve_out: Balance,
    lp_fee_permille: u32,
) -> Option<Balance> {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
        return None;
    }
    let numerator = BigUint::from(reserve_in) * amount_out * PERMILLE;
    let denominator = BigUint::from(reserve_out - amount_out) * fee_factor(lp_fee_permille)?;
    (numerator / denominator + 1u8).to_u128()
}

/// Amount of the other side equivalent to `amount_a` at the current pool ratio.
pub fn quote(amount_a: Balance, reserve_a: Balance, reserve_b: Balance) -> Option<Balance> {
    mul_div(amount_a, reserve_b, reserve_a)
}

/// In-memory chain with native-paired pools only, as on Asset Hub.
#[derive(Clone, Debug, Default)]
pub struct OfflineChain {
    pools: BTreeMap<TokenId, PoolReserves>,
    lp_fee_permille: u32,
}

impl OfflineChain {
    pub fn new(lp_fee_permille: u32) -> Self {
        Self {
            pools: BTreeMap::new(),
            lp_fee_permille,
        }
    }

    pub fn with_pool(mut self, asset: TokenId, reserves: PoolReserves) -> Self {
        self.pools.insert(asset, reserves);
        self
    }

    pub fn set_pool(&mut self, asset: TokenId, reserves: PoolReserves) {
        self.pools.insert(asset, reserves);
    }

    fn pool(&self, asset: &TokenId) -> Option<&PoolReserves> {
        self.pools.get(asset).filter(|pool| pool.exists())
    }

    fn hop_out(&self, token_in: &TokenId, token_out: &TokenId, amount: Balance) -> Option<Balance> {
        if token_in.is_native() {
            let pool = self.pool(token_out)?;
            amount_out(amount, pool.native_reserve, pool.asset_reserve, self.lp_fee_permille)
        } else {
            let pool = self.pool(token_in)?;
            amount_out(amount, pool.asset_reserve, pool.native_reserve, self.lp_fee_permille)
        }
    }

    fn hop_in(&self, token_in: &TokenId, token_out: &TokenId, amount: Balance) -> Option<Balance> {
        if token_in.is_native() {
            let pool = self.pool(token_out)?;
            amount_in(amount, pool.native_reserve, pool.asset_reserve, self.lp_fee_permille)
        } else {
            let pool = self.pool(token_in)?;
            amount_in(amount, pool.asset_reserve, pool.native_reserve, self.lp_fee_permille)
        }
    }

    pub fn exact_in(&self, token_in: &TokenId, token_out: &TokenId, amount: Balance) -> Option<Balance> {
        if token_in == token_out {
            return None;
        }
        if token_in.is_native() || token_out.is_native() {
            return self.hop_out(token_in, token_out, amount);
        }
        let native = self.hop_out(token_in, &TokenId::native(), amount)?;
        self.hop_out(&TokenId::native(), token_out, native)
    }

    pub fn exact_out(&self, token_in: &TokenId, token_out: &TokenId, amount: Balance) -> Option<Balance> {
        if token_in == token_out {
            return None;
        }
        if token_in.is_native() || token_out.is_native() {
            return self.hop_in(token_in, token_out, amount);
        }
        let native = self.hop_in(&TokenId::native(), token_out, amount)?;
        self.hop_in(token_in, &TokenId::native(), native)
    }
}

#[async_trait]
impl PoolQuery for OfflineChain {
    async fn pool_reserves(&self, asset: &TokenId) -> Result<Option<PoolReserves>, ChainError> {
        Ok(self.pools.get(asset).copied())
    }

    async fn pools(&self) -> Result<Vec<TokenId>, ChainError> {
        Ok(self.pools.keys().cloned().collect())
    }

    async fn quote_exact_tokens_for_tokens(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: Balance,
    ) -> Result<Option<Balance>, ChainError> {
        Ok(self.exact_in(token_in, token_out, amount_in))
    }

    async fn quote_tokens_for_exact_tokens(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_out: Balance,
    ) -> Result<Option<Balance>, ChainError> {
        Ok(self.exact_out(token_in, token_out, amount_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_out_matches_pallet_formula() {
        // 1000 * 997 * 10000 / (10000 * 1000 + 1000 * 997)
        assert_eq!(amount_out(1000, 10_000, 10_000, 3), Some(906));
        assert_eq!(amount_out(1000, 0, 10_000, 3), None);
        assert_eq!(amount_out(10_000_000_000, 1_000_000_000_000, 500_000_000, 0), Some(4_950_495));
    }

    #[test]
    fn amount_in_covers_requested_output() {
        let needed = amount_in(906, 10_000, 10_000, 3).unwrap();
        assert_eq!(needed, 1000);
        assert!(amount_out(needed, 10_000, 10_000, 3).unwrap() >= 906);
        assert_eq!(amount_in(10_000, 10_000, 10_000, 3), None);
    }

    #[test]
    fn fee_of_whole_input_has_no_quote() {
        assert_eq!(amount_out(1000, 10_000, 10_000, 1000), None);
        assert_eq!(amount_out(1000, 10_000, 10_000, 1001), None);
        assert_eq!(amount_in(10, 10_000, 10_000, 1000), None);
        let chain = OfflineChain::new(1001).with_pool(TokenId::asset("1984"), PoolReserves::new(10_000, 10_000));
        assert_eq!(chain.exact_in(&TokenId::native(), &TokenId::asset("1984"), 10), None);
        assert_eq!(chain.exact_out(&TokenId::native(), &TokenId::asset("1984"), 10), None);
    }

    #[test]
    fn quote_keeps_ratio() {
        assert_eq!(quote(10, 100, 50), Some(5));
        assert_eq!(quote(10, 0, 50), None);
    }

    #[tokio::test]
    async fn asset_to_asset_goes_through_native() {
        let usdt = TokenId::asset("1984");
        let rmrk = TokenId::asset("8");
        let chain = OfflineChain::new(3)
            .with_pool(usdt.clone(), PoolReserves::new(1_000_000, 2_000_000))
            .with_pool(rmrk.clone(), PoolReserves::new(1_000_000, 500_000));
        let native = chain.exact_in(&usdt, &TokenId::native(), 10_000).unwrap();
        let expected = chain.exact_in(&TokenId::native(), &rmrk, native).unwrap();
        assert_eq!(
            chain
                .quote_exact_tokens_for_tokens(&usdt, &rmrk, 10_000)
                .await
                .unwrap(),
            Some(expected)
        );
        let required = chain
            .quote_tokens_for_exact_tokens(&usdt, &rmrk, expected)
            .await
            .unwrap()
            .unwrap();
        assert!(required >= 9_990 && required <= 10_010);
        assert_eq!(
            chain
                .quote_exact_tokens_for_tokens(&usdt, &TokenId::asset("7"), 10)
                .await
                .unwrap(),
            None
        );
        assert_eq!(chain.exact_in(&usdt, &usdt, 10), None);
    }
}
