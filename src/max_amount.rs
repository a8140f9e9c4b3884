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

//! Largest sell amount that keeps the wallet and the pool above their minimum balances.

use crate::balance::from_raw_units;
use crate::chain::{AccountQuery, PoolQuery};
use crate::prelude::*;
use crate::serialization::balance as balance_serde;
use std::sync::Arc;

/// Upper bound of chain quotes spent narrowing the amount down, one per bit of `Balance`.
const MAX_BISECTION_STEPS: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxPairing {
    NativeForAsset,
    AssetForNative,
    AssetForAsset,
}

impl MaxPairing {
    pub fn of(sell: &TokenId, buy: &TokenId) -> Result<Self, InputError> {
        match (sell.is_native(), buy.is_native()) {
            _ if sell == buy => Err(InputError::EqualTokens),
            (true, false) => Ok(MaxPairing::NativeForAsset),
            (false, true) => Ok(MaxPairing::AssetForNative),
            (false, false) => Ok(MaxPairing::AssetForAsset),
            (true, true) => Err(InputError::EqualTokens),
        }
    }

    pub fn sells_native(&self) -> bool {
        matches!(self, MaxPairing::NativeForAsset)
    }
}

/// Inputs of the solver. `sell_token.raw_balance` is the free wallet balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxAmountRequest {
    pub sell_token: Token,
    /// Existential deposit when selling native, the asset minimum balance otherwise.
    pub sell_token_min_balance: Balance,
    pub buy_token: Token,
    /// Reserve of the bought token in the pool it leaves.
    pub buy_pool_reserve: Balance,
    pub buy_token_min_balance_or_ed: Balance,
    pub fee_estimate: Option<Balance>,
}

impl MaxAmountRequest {
    pub fn pairing(&self) -> Result<MaxPairing, InputError> {
        MaxPairing::of(&self.sell_token.id, &self.buy_token.id)
    }

    /// Collects balances, floors and reserves of `account` from the chain.
    pub async fn load<A, P>(
        accounts: &A,
        pools: &P,
        account: &str,
        sell_token: Token,
        buy_token: Token,
        fee_estimate: Option<Balance>,
    ) -> Result<Self, QuoteError>
    where
        A: AccountQuery + ?Sized,
        P: PoolQuery + ?Sized,
    {
        let pairing = MaxPairing::of(&sell_token.id, &buy_token.id)?;
        let existential_deposit = accounts.existential_deposit().await?;
        let min_balance = |metadata: Option<AssetMetadata>| {
            metadata.map(|metadata| metadata.min_balance).unwrap_or_default()
        };
        let sell_token_min_balance = if sell_token.is_native() {
            existential_deposit
        } else {
            min_balance(accounts.asset_metadata(&sell_token.id).await?)
        };
        let buy_token_min_balance_or_ed = if buy_token.is_native() {
            existential_deposit
        } else {
            min_balance(accounts.asset_metadata(&buy_token.id).await?)
        };
        let pool_asset = match pairing {
            MaxPairing::AssetForNative => &sell_token.id,
            MaxPairing::NativeForAsset | MaxPairing::AssetForAsset => &buy_token.id,
        };
        let reserves = pools
            .pool_reserves(pool_asset)
            .await?
            .filter(|reserves| reserves.exists())
            .ok_or(QuoteUnavailable::PoolNotFound)?;
        let free = accounts.account_balance(account, &sell_token.id).await?.free;
        Ok(Self {
            buy_pool_reserve: reserves.reserve_of(&buy_token.id),
            sell_token: sell_token.with_balance(free),
            sell_token_min_balance,
            buy_token,
            buy_token_min_balance_or_ed,
            fee_estimate,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaxAmountResult {
    pub max_sell_amount: BigDecimal,
    #[serde(with = "balance_serde")]
    pub max_sell_raw: Balance,
    /// Output of selling the maximum, as quoted by the chain.
    #[serde(with = "balance_serde")]
    pub expected_out_raw: Balance,
    /// The output would not reach the buyer's minimum balance, do not populate the input.
    pub below_minimum: bool,
    /// The fee alone exhausts the spendable balance.
    pub fee_exceeds_balance: bool,
}

pub struct MaxAmountSolver<C: ?Sized> {
    chain: Arc<C>,
}

impl<C: PoolQuery + ?Sized> MaxAmountSolver<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    async fn amount_out(&self, request: &MaxAmountRequest, amount_in: Balance) -> Result<Balance, QuoteError> {
        if amount_in == 0 {
            return Ok(0);
        }
        Ok(self
            .chain
            .quote_exact_tokens_for_tokens(&request.sell_token.id, &request.buy_token.id, amount_in)
            .await?
            .ok_or(QuoteUnavailable::PoolNotFound)?)
    }

    /// Input that takes the bought reserve down to its floor. Routes that can not deliver that
    /// much are not bounded by the pool, the re-quote still catches missing pools.
    async fn pool_cap(&self, request: &MaxAmountRequest) -> Result<Balance, QuoteError> {
        if request.buy_token_min_balance_or_ed == 0 {
            return Ok(Balance::MAX);
        }
        let room = request
            .buy_pool_reserve
            .saturating_sub(request.buy_token_min_balance_or_ed);
        if room == 0 {
            return Ok(0);
        }
        let cap = self
            .chain
            .quote_tokens_for_exact_tokens(&request.sell_token.id, &request.buy_token.id, room)
            .await?;
        Ok(cap.unwrap_or(Balance::MAX))
    }

    fn keeps_pool_floor(request: &MaxAmountRequest, amount_out: Balance) -> bool {
        request.buy_pool_reserve.saturating_sub(amount_out) >= request.buy_token_min_balance_or_ed
            && amount_out <= request.buy_pool_reserve
    }

    /// Largest amount of `sell_token` that can be sold right now.
    ///
    /// When selling native, the fee is reserved against the free balance minus the existential
    /// deposit rather than the free balance, so paying the fee never reaps the account.
    pub async fn solve(&self, request: &MaxAmountRequest) -> Result<MaxAmountResult, QuoteError> {
        let pairing = request.pairing()?;
        let wallet_cap = request
            .sell_token
            .raw_balance
            .saturating_sub(request.sell_token_min_balance);
        let pool_cap = self.pool_cap(request).await?;
        let mut max = wallet_cap.min(pool_cap);
        debug!(
            "Max amount {:?}: wallet cap {}, pool cap {}",
            pairing, wallet_cap, pool_cap
        );

        let mut fee_exceeds_balance = false;
        if let (true, Some(fee)) = (pairing.sells_native(), request.fee_estimate) {
            if max.saturating_add(fee) > wallet_cap {
                if fee > max {
                    warn!(
                        "Fee estimate {} exceeds sellable amount {}, max set to zero",
                        fee, max
                    );
                    fee_exceeds_balance = true;
                    max = 0;
                } else {
                    max -= fee;
                }
            }
        }

        let mut expected_out = self.amount_out(request, max).await?;
        if !Self::keeps_pool_floor(request, expected_out) {
            let (mut lo, mut hi) = (0, max);
            for _ in 0..MAX_BISECTION_STEPS {
                if hi - lo <= 1 {
                    break;
                }
                let mid = lo + (hi - lo) / 2;
                if Self::keeps_pool_floor(request, self.amount_out(request, mid).await?) {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            max = lo;
            expected_out = self.amount_out(request, max).await?;
            debug!("Max amount narrowed to {} by the pool floor", max);
        }

        let below_minimum = expected_out < request.buy_token_min_balance_or_ed;
        if below_minimum {
            warn!(
                "Max amount {} of {} buys {} {}, below its minimum balance",
                max, request.sell_token.symbol, expected_out, request.buy_token.symbol
            );
        }
        Ok(MaxAmountResult {
            max_sell_amount: from_raw_units(max, request.sell_token.decimals),
            max_sell_raw: max,
            expected_out_raw: expected_out,
            below_minimum,
            fee_exceeds_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::xyk::OfflineChain;
    use crate::chain::{MockAccountQuery, MockPoolQuery};
    use core::str::FromStr;

    fn ksm(balance: Balance) -> Token {
        Token::new(TokenId::native(), "KSM", 2).with_balance(balance)
    }

    fn usdt(balance: Balance) -> Token {
        Token::new(TokenId::asset("1984"), "USDT", 1).with_balance(balance)
    }

    fn request(sell: Token, sell_min: Balance, buy: Token, reserve: Balance, buy_min: Balance) -> MaxAmountRequest {
        MaxAmountRequest {
            sell_token: sell,
            sell_token_min_balance: sell_min,
            buy_token: buy,
            buy_pool_reserve: reserve,
            buy_token_min_balance_or_ed: buy_min,
            fee_estimate: None,
        }
    }

    #[test]
    fn pairing_follows_native_side() {
        let (native, asset) = (TokenId::native(), TokenId::asset("1"));
        assert_eq!(MaxPairing::of(&native, &asset), Ok(MaxPairing::NativeForAsset));
        assert_eq!(MaxPairing::of(&asset, &native), Ok(MaxPairing::AssetForNative));
        assert_eq!(
            MaxPairing::of(&asset, &TokenId::asset("2")),
            Ok(MaxPairing::AssetForAsset)
        );
        assert_eq!(MaxPairing::of(&asset, &asset), Err(InputError::EqualTokens));
        assert_eq!(MaxPairing::of(&native, &native), Err(InputError::EqualTokens));
    }

    #[tokio::test]
    async fn native_max_is_balance_minus_existential_deposit() {
        // 10 KSM in the wallet, ED 1, pool 100 KSM / 50 USDT, USDT minimum 0.1
        let chain = OfflineChain::new(3).with_pool(TokenId::asset("1984"), PoolReserves::new(10_000, 500));
        let solver = MaxAmountSolver::new(Arc::new(chain.clone()));
        let result = solver
            .solve(&request(ksm(1_000), 100, usdt(0), 500, 1))
            .await
            .unwrap();
        assert_eq!(result.max_sell_raw, 900);
        assert_eq!(result.max_sell_amount, BigDecimal::from_str("9").unwrap());
        assert_eq!(
            Some(result.expected_out_raw),
            chain.exact_in(&TokenId::native(), &TokenId::asset("1984"), 900)
        );
        assert!(500 - result.expected_out_raw >= 1);
        assert!(!result.below_minimum);
    }

    #[tokio::test]
    async fn requote_narrows_down_to_the_pool_floor() {
        let mut chain = MockPoolQuery::new();
        chain
            .expect_quote_tokens_for_exact_tokens()
            .returning(|_, _, _| Ok(Some(60_000)));
        chain
            .expect_quote_exact_tokens_for_tokens()
            .returning(|_, _, amount| Ok(Some(amount * 50_000 / (amount + 100))));
        let solver = MaxAmountSolver::new(Arc::new(chain));
        let result = solver
            .solve(&request(usdt(1_000_000), 1, ksm(0), 50_000, 100))
            .await
            .unwrap();
        assert_eq!(result.max_sell_raw, 50_405);
        assert_eq!(result.expected_out_raw, 49_900);
        assert!(!result.below_minimum);
    }

    #[tokio::test]
    async fn fee_is_deducted_when_selling_native() {
        let chain = OfflineChain::new(3).with_pool(TokenId::asset("1984"), PoolReserves::new(10_000, 500));
        let solver = MaxAmountSolver::new(Arc::new(chain));
        let mut req = request(ksm(1_000), 100, usdt(0), 500, 1);
        req.fee_estimate = Some(50);
        let result = solver.solve(&req).await.unwrap();
        assert_eq!(result.max_sell_raw, 850);
        assert!(!result.fee_exceeds_balance);

        req.fee_estimate = Some(1_000);
        let result = solver.solve(&req).await.unwrap();
        assert_eq!(result.max_sell_raw, 0);
        assert!(result.fee_exceeds_balance);
        assert!(result.below_minimum);
    }

    #[tokio::test]
    async fn fee_is_ignored_when_selling_asset() {
        let chain = OfflineChain::new(3).with_pool(TokenId::asset("1984"), PoolReserves::new(1_000_000, 1_000_000));
        let solver = MaxAmountSolver::new(Arc::new(chain));
        let mut req = request(usdt(1_000), 10, ksm(0), 1_000_000, 100);
        req.fee_estimate = Some(500);
        let result = solver.solve(&req).await.unwrap();
        assert_eq!(result.max_sell_raw, 990);
    }

    #[tokio::test]
    async fn tiny_output_is_flagged_below_minimum() {
        let chain = OfflineChain::new(3).with_pool(TokenId::asset("1984"), PoolReserves::new(1_000_000_000, 1_000));
        let solver = MaxAmountSolver::new(Arc::new(chain));
        let result = solver
            .solve(&request(ksm(200), 100, usdt(0), 1_000, 5))
            .await
            .unwrap();
        assert_eq!(result.max_sell_raw, 100);
        assert!(result.below_minimum);
    }

    #[tokio::test]
    async fn max_never_breaks_a_minimum_balance() {
        let asset = TokenId::asset("1984");
        let other = TokenId::asset("8");
        for (native_reserve, asset_reserve) in [(10_000u128, 500u128), (1_000, 1_000_000), (500, 500), (7, 13)] {
            for (balance, sell_min) in [(0u128, 0u128), (1_000, 100), (1_000_000_000, 1), (100, 100)] {
                for buy_min in [0u128, 1, 13, 500, asset_reserve] {
                    let chain = OfflineChain::new(3)
                        .with_pool(asset.clone(), PoolReserves::new(native_reserve, asset_reserve))
                        .with_pool(other.clone(), PoolReserves::new(native_reserve, asset_reserve));
                    let solver = MaxAmountSolver::new(Arc::new(chain.clone()));
                    let cases = [
                        (ksm(balance), usdt(0), asset_reserve),
                        (usdt(balance), ksm(0), native_reserve),
                        (usdt(balance), Token::new(other.clone(), "RMRK", 1), asset_reserve),
                    ];
                    for (sell, buy, reserve) in cases {
                        let req = request(sell.clone(), sell_min, buy.clone(), reserve, buy_min);
                        let result = match solver.solve(&req).await {
                            Ok(result) => result,
                            Err(err) => panic!("{:?} for {:?}", err, req),
                        };
                        assert!(balance.saturating_sub(result.max_sell_raw) >= sell_min.min(balance));
                        if result.max_sell_raw > 0 {
                            let out = chain.exact_in(&sell.id, &buy.id, result.max_sell_raw).unwrap();
                            assert_eq!(out, result.expected_out_raw);
                            assert!(reserve - out >= buy_min, "{:?} -> {:?}", req, result);
                        }
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn request_is_loaded_from_the_chain() {
        let mut accounts = MockAccountQuery::new();
        accounts.expect_existential_deposit().returning(|| Ok(100));
        accounts.expect_asset_metadata().returning(|_| {
            Ok(Some(AssetMetadata {
                symbol: "USDT".into(),
                decimals: 1,
                min_balance: 7,
            }))
        });
        accounts
            .expect_account_balance()
            .returning(|_, _| Ok(AccountBalance::free(1_000)));
        let pools = OfflineChain::new(3).with_pool(TokenId::asset("1984"), PoolReserves::new(10_000, 500));
        let req = MaxAmountRequest::load(&accounts, &pools, "alice", ksm(0), usdt(0), Some(3))
            .await
            .unwrap();
        assert_eq!(req.sell_token.raw_balance, 1_000);
        assert_eq!(req.sell_token_min_balance, 100);
        assert_eq!(req.buy_token_min_balance_or_ed, 7);
        assert_eq!(req.buy_pool_reserve, 500);
        assert_eq!(req.fee_estimate, Some(3));

        let missing = MaxAmountRequest::load(&accounts, &pools, "alice", ksm(0), Token::new(TokenId::asset("9"), "X", 1), None).await;
        assert_eq!(
            missing,
            Err(QuoteError::Unavailable(QuoteUnavailable::PoolNotFound))
        );
    }
}
