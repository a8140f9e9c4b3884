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

//! Engine configuration. Defaults describe Kusama Asset Hub.

use crate::chain::xyk::DEFAULT_LP_FEE_PERMILLE;
use crate::cross_chain::{CrossChainFees, XcmFees};
use crate::prelude::*;
use crate::serialization::balance as balance_serde;
use crate::slippage::SlippageTolerance;
use crate::tx::DEFAULT_TX_TIMEOUT;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_EXPLORER: &str = "https://assethub-kusama.subscan.io/";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub native_symbol: String,
    pub native_decimals: BalancePrecision,
    #[serde(with = "balance_serde")]
    pub existential_deposit: Balance,
    pub lp_fee_permille: u32,
    pub slippage: SlippageTolerance,
    pub tx_timeout_secs: u64,
    pub explorer: Url,
    pub cross_chain: CrossChainFees,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            native_symbol: "KSM".to_string(),
            native_decimals: 12,
            existential_deposit: 3_333_333,
            lp_fee_permille: DEFAULT_LP_FEE_PERMILLE,
            slippage: SlippageTolerance::default(),
            tx_timeout_secs: DEFAULT_TX_TIMEOUT.as_secs(),
            explorer: Url::parse(DEFAULT_EXPLORER).expect("valid default explorer url"),
            cross_chain: CrossChainFees {
                cross_in: XcmFees {
                    destination_fee: 20_000_000,
                    xcm_buffer: 0,
                },
                cross_out: XcmFees {
                    destination_fee: 100_000_000,
                    xcm_buffer: 80_000_000,
                },
            },
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> AnyResult<()> {
        anyhow::ensure!(
            self.lp_fee_permille < 1000,
            "lp_fee_permille must be below 1000, got {}",
            self.lp_fee_permille
        );
        anyhow::ensure!(self.tx_timeout_secs > 0, "tx_timeout_secs must be positive");
        Ok(())
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_secs(self.tx_timeout_secs)
    }

    pub fn native_token(&self) -> Token {
        Token::new(TokenId::native(), self.native_symbol.clone(), self.native_decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"slippage": 50, "existential_deposit": "1000000000", "explorer": "https://assethub-polkadot.subscan.io/"}"#,
        )
        .unwrap();
        assert_eq!(config.slippage.bps(), 50);
        assert_eq!(config.existential_deposit, 1_000_000_000);
        assert_eq!(config.native_decimals, 12);
        assert_eq!(config.tx_timeout(), Duration::from_secs(180));
        assert_eq!(config.explorer.host_str(), Some("assethub-polkadot.subscan.io"));
    }

    #[test]
    fn slippage_above_limit_is_rejected() {
        assert!(serde_json::from_str::<EngineConfig>(r#"{"slippage": 10000}"#).is_err());
    }

    #[test]
    fn fee_taking_whole_input_is_rejected() {
        assert!(EngineConfig::default().validate().is_ok());
        for fee in [1000, 1001] {
            let config: EngineConfig =
                serde_json::from_str(&format!(r#"{{"lp_fee_permille": {}}}"#, fee)).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("lp_fee_permille"));
        }
    }

    #[test]
    fn invalid_file_is_rejected_on_load() {
        let path = std::env::temp_dir().join(format!("dex-engine-fee-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"lp_fee_permille": 1000}"#).unwrap();
        let err = EngineConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn default_round_trips_through_json() {
        let json = serde_json::to_string(&EngineConfig::default()).unwrap();
        let config: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.native_token().is_native());
    }

    #[test]
    fn missing_file_has_context() {
        let err = EngineConfig::load("/nonexistent/dex-engine.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
