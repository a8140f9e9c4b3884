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

//! Dispatch error decoding and the table of errors the UI has its own wording for.

use crate::chain::{DispatchError, ErrorRegistry};
use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchCategory {
    PoolNotFound,
    ZeroLiquidity,
    EqualAssets,
    InsufficientLiquidity,
    PoolExists,
    ZeroAmount,
    SlippageExceeded,
    BelowMinimum,
    InsufficientBalance,
    ExistentialDeposit,
}

impl DispatchCategory {
    pub fn message(&self) -> &'static str {
        match self {
            DispatchCategory::PoolNotFound => "Pool not found",
            DispatchCategory::ZeroLiquidity => "Pool has zero liquidity",
            DispatchCategory::EqualAssets => "Assets must be different",
            DispatchCategory::InsufficientLiquidity => "Not enough liquidity in the pool",
            DispatchCategory::PoolExists => "Pool already exists",
            DispatchCategory::ZeroAmount => "Amount must be greater than zero",
            DispatchCategory::SlippageExceeded => "Price moved beyond the slippage tolerance",
            DispatchCategory::BelowMinimum => "Amount is below the minimum balance of the asset",
            DispatchCategory::InsufficientBalance => "Insufficient balance",
            DispatchCategory::ExistentialDeposit => {
                "Transaction would take the account below the existential deposit"
            }
        }
    }
}

/// `(pallet, error)` pairs as named in chain metadata.
pub const CANONICAL_ERRORS: &[(&str, &str, DispatchCategory)] = &[
    ("AssetConversion", "PoolNotFound", DispatchCategory::PoolNotFound),
    ("AssetConversion", "ZeroLiquidity", DispatchCategory::ZeroLiquidity),
    ("AssetConversion", "EqualAssets", DispatchCategory::EqualAssets),
    ("AssetConversion", "InsufficientLiquidity", DispatchCategory::InsufficientLiquidity),
    ("AssetConversion", "PoolExists", DispatchCategory::PoolExists),
    ("AssetConversion", "ZeroAmount", DispatchCategory::ZeroAmount),
    ("AssetConversion", "AmountOutTooHigh", DispatchCategory::SlippageExceeded),
    ("AssetConversion", "ProvidedMinimumNotSufficientForSwap", DispatchCategory::SlippageExceeded),
    ("AssetConversion", "ProvidedMaximumNotSufficientForSwap", DispatchCategory::SlippageExceeded),
    ("AssetConversion", "AmountOneLessThanMinimal", DispatchCategory::SlippageExceeded),
    ("AssetConversion", "AmountTwoLessThanMinimal", DispatchCategory::SlippageExceeded),
    ("AssetConversion", "InsufficientLiquidityMinted", DispatchCategory::ZeroAmount),
    ("Dex", "PoolNotFound", DispatchCategory::PoolNotFound),
    ("Dex", "PoolExists", DispatchCategory::PoolExists),
    ("Dex", "InsufficientLiquidity", DispatchCategory::InsufficientLiquidity),
    ("Dex", "InsufficientOutputAmount", DispatchCategory::SlippageExceeded),
    ("Dex", "ExcessiveInputAmount", DispatchCategory::SlippageExceeded),
    ("Assets", "BalanceLow", DispatchCategory::InsufficientBalance),
    ("Assets", "BelowMinimum", DispatchCategory::BelowMinimum),
    ("Balances", "InsufficientBalance", DispatchCategory::InsufficientBalance),
    ("Balances", "ExistentialDeposit", DispatchCategory::ExistentialDeposit),
    ("Balances", "KeepAlive", DispatchCategory::ExistentialDeposit),
];

/// `TokenError` variants of the runtime.
const TOKEN_ERRORS: &[(&str, DispatchCategory)] = &[
    ("FundsUnavailable", DispatchCategory::InsufficientBalance),
    ("NoFunds", DispatchCategory::InsufficientBalance),
    ("BelowMinimum", DispatchCategory::BelowMinimum),
    ("OnlyProvider", DispatchCategory::ExistentialDeposit),
];

pub fn canonical_category(pallet: &str, error: &str) -> Option<DispatchCategory> {
    CANONICAL_ERRORS
        .iter()
        .find(|(p, e, _)| *p == pallet && *e == error)
        .map(|(_, _, category)| *category)
}

/// Human readable dispatch failure. `category` is set when the error has canonical wording.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchFailure {
    pub category: Option<DispatchCategory>,
    pub message: String,
}

impl DispatchFailure {
    fn canonical(category: DispatchCategory) -> Self {
        Self {
            category: Some(category),
            message: category.message().to_string(),
        }
    }

    fn raw(message: String) -> Self {
        Self {
            category: None,
            message,
        }
    }
}

pub fn describe_dispatch_error(registry: &dyn ErrorRegistry, error: &DispatchError) -> DispatchFailure {
    match error {
        DispatchError::Module(module) => match registry.lookup(module) {
            Some(decoded) => match canonical_category(&decoded.pallet, &decoded.error) {
                Some(category) => DispatchFailure::canonical(category),
                None if decoded.docs.is_empty() => {
                    DispatchFailure::raw(format!("{}.{}", decoded.pallet, decoded.error))
                }
                None => DispatchFailure::raw(format!(
                    "{}.{}: {}",
                    decoded.pallet, decoded.error, decoded.docs
                )),
            },
            None => {
                warn!("Module error {:?} is not in the registry", module);
                DispatchFailure::raw(format!(
                    "Module error {} (0x{})",
                    module.index,
                    hex::encode(module.error)
                ))
            }
        },
        DispatchError::Token(token) => TOKEN_ERRORS
            .iter()
            .find(|(name, _)| name == token)
            .map(|(_, category)| DispatchFailure::canonical(*category))
            .unwrap_or_else(|| DispatchFailure::raw(format!("Token error: {}", token))),
        DispatchError::BadOrigin => DispatchFailure::raw("Bad origin".to_string()),
        DispatchError::Arithmetic(err) => DispatchFailure::raw(format!("Arithmetic error: {}", err)),
        DispatchError::Other(err) => DispatchFailure::raw(err.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{DecodedModuleError, MockErrorRegistry, ModuleError};

    fn registry(pallet: &'static str, error: &'static str, docs: &'static str) -> MockErrorRegistry {
        let mut registry = MockErrorRegistry::new();
        registry.expect_lookup().returning(move |_| {
            Some(DecodedModuleError {
                pallet: pallet.into(),
                error: error.into(),
                docs: docs.into(),
            })
        });
        registry
    }

    fn module_error() -> DispatchError {
        DispatchError::Module(ModuleError {
            index: 0x35,
            error: [6, 0, 0, 0],
        })
    }

    #[test]
    fn known_errors_use_canonical_wording() {
        let failure = describe_dispatch_error(
            &registry("AssetConversion", "PoolNotFound", "Provided asset pair is not supported for pool."),
            &module_error(),
        );
        assert_eq!(failure.category, Some(DispatchCategory::PoolNotFound));
        assert_eq!(failure.message, "Pool not found");
    }

    #[test]
    fn unknown_errors_fall_back_to_decoded_text() {
        let failure = describe_dispatch_error(
            &registry("AssetConversion", "Overflow", "An overflow happened."),
            &module_error(),
        );
        assert_eq!(failure.category, None);
        assert_eq!(failure.message, "AssetConversion.Overflow: An overflow happened.");

        let mut empty = MockErrorRegistry::new();
        empty.expect_lookup().returning(|_| None);
        let failure = describe_dispatch_error(&empty, &module_error());
        assert_eq!(failure.message, "Module error 53 (0x06000000)");
    }

    #[test]
    fn token_errors_are_mapped() {
        let mut empty = MockErrorRegistry::new();
        empty.expect_lookup().never();
        assert_eq!(
            describe_dispatch_error(&empty, &DispatchError::Token("FundsUnavailable".into())).category,
            Some(DispatchCategory::InsufficientBalance)
        );
        assert_eq!(
            describe_dispatch_error(&empty, &DispatchError::Token("Frozen".into())).message,
            "Token error: Frozen"
        );
    }

    #[test]
    fn table_has_no_duplicates() {
        for (i, (pallet, error, _)) in CANONICAL_ERRORS.iter().enumerate() {
            assert!(CANONICAL_ERRORS[i + 1..]
                .iter()
                .all(|(p, e, _)| p != pallet || e != error));
        }
    }
}
