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

use crate::prelude::*;
use crate::serialization::balance as balance_serde;
use crate::swap_amount::SwapVariant;
use core::fmt;

/// Raw on-chain amount in base units of a token.
pub type Balance = u128;

/// Number of decimals of a token.
pub type BalancePrecision = u8;

/// Identifier of a fungible token. The empty id is the chain's native token.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn native() -> Self {
        Self(String::new())
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_native(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Token together with the wallet balance it was loaded with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub symbol: String,
    pub decimals: BalancePrecision,
    #[serde(with = "balance_serde", default)]
    pub raw_balance: Balance,
}

impl Token {
    pub fn new(id: TokenId, symbol: impl Into<String>, decimals: BalancePrecision) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            decimals,
            raw_balance: 0,
        }
    }

    pub fn with_balance(mut self, raw_balance: Balance) -> Self {
        self.raw_balance = raw_balance;
        self
    }

    pub fn is_native(&self) -> bool {
        self.id.is_native()
    }

    pub fn balance(&self) -> BigDecimal {
        crate::balance::from_raw_units(self.raw_balance, self.decimals)
    }
}

/// Asset pallet metadata needed to render and bound amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub symbol: String,
    pub decimals: BalancePrecision,
    #[serde(with = "balance_serde")]
    pub min_balance: Balance,
}

/// Reserves of the pool pairing the native token with one asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    #[serde(with = "balance_serde")]
    pub native_reserve: Balance,
    #[serde(with = "balance_serde")]
    pub asset_reserve: Balance,
}

impl PoolReserves {
    pub fn new(native_reserve: Balance, asset_reserve: Balance) -> Self {
        Self {
            native_reserve,
            asset_reserve,
        }
    }

    /// A pool with an empty side can not be quoted.
    pub fn exists(&self) -> bool {
        self.native_reserve > 0 && self.asset_reserve > 0
    }

    pub fn reserve_of(&self, token: &TokenId) -> Balance {
        if token.is_native() {
            self.native_reserve
        } else {
            self.asset_reserve
        }
    }
}

/// Account balance split the way the balances and assets pallets report it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    #[serde(with = "balance_serde")]
    pub free: Balance,
    #[serde(with = "balance_serde")]
    pub reserved: Balance,
    #[serde(with = "balance_serde")]
    pub frozen: Balance,
}

impl AccountBalance {
    pub fn free(free: Balance) -> Self {
        Self {
            free,
            ..Default::default()
        }
    }

    /// Part of the free balance that is not locked by freezes exceeding reserves.
    pub fn spendable(&self) -> Balance {
        self.free
            .saturating_sub(self.frozen.saturating_sub(self.reserved))
    }
}

/// One keystroke worth of user intent on the swap form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradeIntent {
    pub token_in: Token,
    pub token_out: Token,
    pub amount: BigDecimal,
    pub variant: SwapVariant,
}

impl TradeIntent {
    pub fn new(token_in: Token, token_out: Token, amount: BigDecimal, variant: SwapVariant) -> Self {
        Self {
            token_in,
            token_out,
            amount,
            variant,
        }
    }

    /// Builds an intent from the form selection, rejecting unselected tokens.
    pub fn from_selection(
        token_in: Option<Token>,
        token_out: Option<Token>,
        amount: BigDecimal,
        variant: SwapVariant,
    ) -> Result<Self, InputError> {
        match (token_in, token_out) {
            (Some(token_in), Some(token_out)) => {
                Ok(Self::new(token_in, token_out, amount, variant))
            }
            _ => Err(InputError::TokenNotSelected),
        }
    }

    /// Token whose amount the user typed.
    pub fn edited_token(&self) -> &Token {
        match self.variant {
            SwapVariant::WithDesiredInput => &self.token_in,
            SwapVariant::WithDesiredOutput => &self.token_out,
        }
    }

    /// Token whose amount is derived from the quote.
    pub fn counter_token(&self) -> &Token {
        match self.variant {
            SwapVariant::WithDesiredInput => &self.token_out,
            SwapVariant::WithDesiredOutput => &self.token_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_native() {
        assert!(TokenId::native().is_native());
        assert!(TokenId::asset("").is_native());
        assert!(!TokenId::asset("1984").is_native());
        assert_eq!(TokenId::native().to_string(), "native");
        assert_eq!(TokenId::asset("1984").to_string(), "1984");
    }

    #[test]
    fn pool_without_a_side_does_not_exist() {
        assert!(PoolReserves::new(10, 10).exists());
        assert!(!PoolReserves::new(0, 10).exists());
        assert!(!PoolReserves::new(10, 0).exists());
        assert!(!PoolReserves::default().exists());
    }

    #[test]
    fn spendable_ignores_frozen_covered_by_reserves() {
        let balance = AccountBalance {
            free: 100,
            reserved: 30,
            frozen: 50,
        };
        assert_eq!(balance.spendable(), 80);
        let balance = AccountBalance {
            free: 100,
            reserved: 60,
            frozen: 50,
        };
        assert_eq!(balance.spendable(), 100);
    }

    #[test]
    fn intent_requires_both_tokens() {
        let ksm = Token::new(TokenId::native(), "KSM", 12);
        let res = TradeIntent::from_selection(
            Some(ksm),
            None,
            BigDecimal::from(1),
            SwapVariant::WithDesiredInput,
        );
        assert_eq!(res, Err(InputError::TokenNotSelected));
    }

    #[test]
    fn edited_token_follows_variant() {
        let ksm = Token::new(TokenId::native(), "KSM", 12);
        let usdt = Token::new(TokenId::asset("1984"), "USDT", 6);
        let intent = TradeIntent::new(
            ksm.clone(),
            usdt.clone(),
            BigDecimal::from(1),
            SwapVariant::WithDesiredOutput,
        );
        assert_eq!(intent.edited_token(), &usdt);
        assert_eq!(intent.counter_token(), &ksm);
    }
}
