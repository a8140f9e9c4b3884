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

//! Add, remove and create-pool amounts for native/asset pools.

use crate::balance::{from_raw_units, round_to, BPS_DENOMINATOR};
use crate::chain::{xyk, Extrinsic, PoolQuery};
use crate::prelude::*;
use crate::serialization::balance as balance_serde;
use crate::slippage::SlippageTolerance;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

fn mul_div(a: Balance, b: Balance, c: Balance) -> Option<Balance> {
    if c.is_zero() {
        return None;
    }
    (BigUint::from(a) * BigUint::from(b) / BigUint::from(c)).to_u128()
}

/// `raw` lowered by the tolerance, rounded down.
pub fn min_with_tolerance(raw: Balance, tolerance: SlippageTolerance) -> Balance {
    mul_div(raw, (BPS_DENOMINATOR - tolerance.bps()) as Balance, BPS_DENOMINATOR as Balance)
        .unwrap_or_default()
}

/// Counter amount matching the pool ratio, `amount * reserve_counter / reserve_amount`.
pub fn optimal_counter_amount(
    amount: Balance,
    reserve_amount: Balance,
    reserve_counter: Balance,
) -> Option<Balance> {
    xyk::quote(amount, reserve_amount, reserve_counter)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddLiquidityEstimate {
    #[serde(with = "balance_serde")]
    pub native_amount: Balance,
    #[serde(with = "balance_serde")]
    pub asset_amount: Balance,
    #[serde(with = "balance_serde")]
    pub lp_minted: Balance,
    /// Percentage of the pool owned after the deposit.
    pub share_of_pool: BigDecimal,
}

/// Deposit accepted by the pool for the desired amounts. Only one side is corrected, the
/// one that fits.
pub fn estimate_add_liquidity(
    reserves: &PoolReserves,
    lp_supply: Balance,
    native_desired: Balance,
    asset_desired: Balance,
) -> Result<AddLiquidityEstimate, QuoteError> {
    if native_desired.is_zero() || asset_desired.is_zero() {
        return Err(InputError::NonPositiveAmount.into());
    }
    let overflow = || QuoteError::from(InputError::Overflow);
    if !reserves.exists() || lp_supply.is_zero() {
        let lp_minted = (BigUint::from(native_desired) * BigUint::from(asset_desired))
            .sqrt()
            .to_u128()
            .ok_or_else(overflow)?;
        return Ok(AddLiquidityEstimate {
            native_amount: native_desired,
            asset_amount: asset_desired,
            lp_minted,
            share_of_pool: BigDecimal::from(100),
        });
    }
    let (native_reserve, asset_reserve) = (reserves.native_reserve, reserves.asset_reserve);
    let asset_optimal =
        optimal_counter_amount(native_desired, native_reserve, asset_reserve).ok_or_else(overflow)?;
    let (native_amount, asset_amount) = if asset_optimal <= asset_desired {
        (native_desired, asset_optimal)
    } else {
        let native_optimal = optimal_counter_amount(asset_desired, asset_reserve, native_reserve)
            .ok_or_else(overflow)?;
        (native_optimal.min(native_desired), asset_desired)
    };
    let lp_by_native = mul_div(native_amount, lp_supply, native_reserve).ok_or_else(overflow)?;
    let lp_by_asset = mul_div(asset_amount, lp_supply, asset_reserve).ok_or_else(overflow)?;
    let lp_minted = lp_by_native.min(lp_by_asset);
    let share = from_raw_units(lp_minted, 0) * BigDecimal::from(100)
        / from_raw_units(lp_supply.saturating_add(lp_minted), 0);
    Ok(AddLiquidityEstimate {
        native_amount,
        asset_amount,
        lp_minted,
        share_of_pool: round_to(&share, 2),
    })
}

impl AddLiquidityEstimate {
    pub fn to_extrinsic(&self, asset: &TokenId, tolerance: SlippageTolerance) -> Extrinsic {
        Extrinsic::AddLiquidity {
            asset: asset.clone(),
            native_desired: self.native_amount,
            asset_desired: self.asset_amount,
            native_min: min_with_tolerance(self.native_amount, tolerance),
            asset_min: min_with_tolerance(self.asset_amount, tolerance),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemoveLiquidityEstimate {
    #[serde(with = "balance_serde")]
    pub lp_amount: Balance,
    #[serde(with = "balance_serde")]
    pub native_amount: Balance,
    #[serde(with = "balance_serde")]
    pub asset_amount: Balance,
}

/// Amounts paid out for burning `lp_amount`, `lp * reserve / supply` on each side.
pub fn estimate_remove_liquidity(
    reserves: &PoolReserves,
    lp_supply: Balance,
    lp_amount: Balance,
) -> Result<RemoveLiquidityEstimate, QuoteError> {
    if lp_amount.is_zero() {
        return Err(InputError::NonPositiveAmount.into());
    }
    if lp_supply.is_zero() || !reserves.exists() {
        return Err(QuoteUnavailable::ZeroReserves.into());
    }
    if lp_amount > lp_supply {
        return Err(QuoteUnavailable::InsufficientLiquidity.into());
    }
    let overflow = || QuoteError::from(InputError::Overflow);
    Ok(RemoveLiquidityEstimate {
        lp_amount,
        native_amount: mul_div(lp_amount, reserves.native_reserve, lp_supply).ok_or_else(overflow)?,
        asset_amount: mul_div(lp_amount, reserves.asset_reserve, lp_supply).ok_or_else(overflow)?,
    })
}

impl RemoveLiquidityEstimate {
    pub fn to_extrinsic(&self, asset: &TokenId, tolerance: SlippageTolerance) -> Extrinsic {
        Extrinsic::RemoveLiquidity {
            asset: asset.clone(),
            lp_amount: self.lp_amount,
            native_min: min_with_tolerance(self.native_amount, tolerance),
            asset_min: min_with_tolerance(self.asset_amount, tolerance),
        }
    }
}

/// Largest LP amount whose withdrawal keeps the native reserve at or above the existential
/// deposit and the asset reserve at or above the asset minimum balance.
pub fn max_withdraw_lp(
    reserves: &PoolReserves,
    lp_supply: Balance,
    lp_balance: Balance,
    existential_deposit: Balance,
    asset_min_balance: Balance,
) -> Balance {
    if lp_supply.is_zero() || !reserves.exists() {
        return 0;
    }
    let side_cap = |reserve: Balance, floor: Balance| {
        mul_div(reserve.saturating_sub(floor), lp_supply, reserve).unwrap_or_default()
    };
    lp_balance
        .min(side_cap(reserves.native_reserve, existential_deposit))
        .min(side_cap(reserves.asset_reserve, asset_min_balance))
}

/// Create-pool call for `asset`, rejected when it would pair native with itself or the pool
/// is already there.
pub async fn create_pool<P: PoolQuery + ?Sized>(
    chain: &P,
    asset: &TokenId,
) -> Result<Extrinsic, QuoteError> {
    if asset.is_native() {
        return Err(InputError::EqualTokens.into());
    }
    if chain.pool_reserves(asset).await?.is_some() {
        return Err(InputError::PoolExists.into());
    }
    Ok(Extrinsic::CreatePool {
        asset: asset.clone(),
    })
}
