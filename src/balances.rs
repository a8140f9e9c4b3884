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

use crate::chain::{AccountId, AccountQuery};
use crate::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Re-reads balances of the given tokens after a transaction touched them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceRefresher: Send + Sync {
    async fn refresh(&self, tokens: &[TokenId]) -> Result<(), ChainError>;
}

/// In-memory balance snapshot of the connected account. Writes are last-writer-wins.
#[derive(Clone, Debug, Default)]
pub struct BalanceBook {
    balances: Arc<RwLock<HashMap<TokenId, AccountBalance>>>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &TokenId) -> Option<AccountBalance> {
        self.balances.read().expect("poisoned").get(token).copied()
    }

    pub fn set(&self, token: TokenId, balance: AccountBalance) {
        self.balances.write().expect("poisoned").insert(token, balance);
    }

    pub fn snapshot(&self) -> HashMap<TokenId, AccountBalance> {
        self.balances.read().expect("poisoned").clone()
    }

    /// Drops everything, e.g. when the account changes.
    pub fn clear(&self) {
        self.balances.write().expect("poisoned").clear();
    }

    /// `token` with its raw balance set to the free balance from the book.
    pub fn token_with_balance(&self, token: Token) -> Token {
        let free = self.get(&token.id).map(|balance| balance.free).unwrap_or_default();
        token.with_balance(free)
    }
}

/// Refreshes a [`BalanceBook`] from the chain for one account.
pub struct ChainBalanceRefresher<Q: ?Sized> {
    query: Arc<Q>,
    account: AccountId,
    book: BalanceBook,
}

impl<Q: AccountQuery + ?Sized> ChainBalanceRefresher<Q> {
    pub fn new(query: Arc<Q>, account: AccountId, book: BalanceBook) -> Self {
        Self {
            query,
            account,
            book,
        }
    }

    pub fn book(&self) -> &BalanceBook {
        &self.book
    }
}

#[async_trait]
impl<Q: AccountQuery + ?Sized> BalanceRefresher for ChainBalanceRefresher<Q> {
    async fn refresh(&self, tokens: &[TokenId]) -> Result<(), ChainError> {
        let balances = futures::future::try_join_all(
            tokens
                .iter()
                .map(|token| self.query.account_balance(&self.account, token)),
        )
        .await?;
        for (token, balance) in tokens.iter().zip(balances) {
            debug!("Balance of {} for {}: {}", token, self.account, balance.free);
            self.book.set(token.clone(), balance);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockAccountQuery;

    #[tokio::test]
    async fn refresh_writes_every_token() {
        let mut query = MockAccountQuery::new();
        query
            .expect_account_balance()
            .withf(|account, _| account == "alice")
            .returning(|_, token| {
                Ok(AccountBalance::free(if token.is_native() { 10 } else { 20 }))
            });
        let book = BalanceBook::new();
        let refresher = ChainBalanceRefresher::new(Arc::new(query), "alice".into(), book.clone());
        refresher
            .refresh(&[TokenId::native(), TokenId::asset("1984")])
            .await
            .unwrap();
        assert_eq!(book.get(&TokenId::native()), Some(AccountBalance::free(10)));
        assert_eq!(book.get(&TokenId::asset("1984")), Some(AccountBalance::free(20)));
        assert_eq!(
            book.token_with_balance(Token::new(TokenId::asset("1984"), "USDT", 6))
                .raw_balance,
            20
        );
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let mut query = MockAccountQuery::new();
        query
            .expect_account_balance()
            .returning(|_, _| Err(ChainError::Rpc("socket closed".into())));
        let book = BalanceBook::new();
        book.set(TokenId::native(), AccountBalance::free(5));
        let refresher = ChainBalanceRefresher::new(Arc::new(query), "alice".into(), book.clone());
        assert!(refresher.refresh(&[TokenId::native()]).await.is_err());
        assert_eq!(book.get(&TokenId::native()), Some(AccountBalance::free(5)));
    }

    #[test]
    fn last_write_wins() {
        let book = BalanceBook::new();
        book.set(TokenId::native(), AccountBalance::free(1));
        book.set(TokenId::native(), AccountBalance::free(2));
        assert_eq!(book.get(&TokenId::native()).unwrap().free, 2);
        book.clear();
        assert!(book.snapshot().is_empty());
    }
}
