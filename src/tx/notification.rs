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

use super::events::Executed;
use super::{TxId, TxKind};
use crate::chain::BlockHash;
use crate::prelude::*;
use core::fmt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use url::Url;

/// One UI notification update. Updates of the same transaction share `tx`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub tx: TxId,
    pub kind: TxKind,
    pub body: NotificationBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NotificationBody {
    Initiated,
    InBlock {
        explorer: Url,
    },
    Success {
        executed: Executed,
        explorer: Url,
    },
    Failed {
        category: ErrorCategory,
        reason: String,
        explorer: Option<Url>,
    },
    /// Only local waiting stopped, the extrinsic may still be finalized.
    TimedOut {
        explorer: Url,
    },
}

impl NotificationBody {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            NotificationBody::Initiated | NotificationBody::InBlock { .. }
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            NotificationBody::Initiated => write!(f, "{} initiated", self.kind),
            NotificationBody::InBlock { explorer } => {
                write!(f, "{} included in block {}", self.kind, explorer)
            }
            NotificationBody::Success { executed, explorer } => {
                write!(f, "{} succeeded: {} ({})", self.kind, executed, explorer)
            }
            NotificationBody::Failed {
                reason, explorer, ..
            } => match explorer {
                Some(explorer) => write!(f, "{} failed: {} ({})", self.kind, reason, explorer),
                None => write!(f, "{} failed: {}", self.kind, reason),
            },
            NotificationBody::TimedOut { explorer } => write!(
                f,
                "{} is taking longer than expected and may still complete, check {}",
                self.kind, explorer
            ),
        }
    }
}

/// Notifications waiting to be rendered, shared between the orchestrator and the UI.
#[derive(Clone, Debug, Default)]
pub struct NotificationQueue {
    inner: Arc<Mutex<VecDeque<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: Notification) {
        debug!("Notification: {}", notification);
        self.inner.lock().expect("poisoned").push_back(notification);
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.inner.lock().expect("poisoned").drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Block explorer URLs. The base should end with `/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorerLinks {
    base: Url,
}

impl ExplorerLinks {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn join(&self, path: &str) -> Url {
        match self.base.join(path) {
            Ok(url) => url,
            Err(err) => {
                warn!("Failed to build explorer link {}: {}", path, err);
                self.base.clone()
            }
        }
    }

    pub fn block(&self, block: &BlockHash) -> Url {
        self.join(&format!("block/0x{}", hex::encode(block)))
    }

    pub fn account(&self, account: &str) -> Url {
        self.join(&format!("account/{}", account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn links() -> ExplorerLinks {
        ExplorerLinks::new(Url::parse("https://assethub-kusama.subscan.io/").unwrap())
    }

    #[test]
    fn explorer_links_are_joined_to_base() {
        let block = hex!("ab00000000000000000000000000000000000000000000000000000000000001");
        assert_eq!(
            links().block(&block).as_str(),
            "https://assethub-kusama.subscan.io/block/0xab00000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(
            links()
                .account("HNZata7iMYWmk5RvZRTiAsSDhV8366zq2YGb3tLH5Upf74F")
                .as_str(),
            "https://assethub-kusama.subscan.io/account/HNZata7iMYWmk5RvZRTiAsSDhV8366zq2YGb3tLH5Upf74F"
        );
    }

    #[test]
    fn queue_drains_in_order() {
        let queue = NotificationQueue::new();
        let explorer = links().account("alice");
        queue.push(Notification {
            tx: TxId(1),
            kind: TxKind::Swap,
            body: NotificationBody::Initiated,
        });
        queue.push(Notification {
            tx: TxId(1),
            kind: TxKind::Swap,
            body: NotificationBody::TimedOut {
                explorer: explorer.clone(),
            },
        });
        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert!(!drained[0].body.is_terminal());
        assert!(drained[1].body.is_terminal());
        assert_eq!(
            drained[1].to_string(),
            format!(
                "Swap is taking longer than expected and may still complete, check {}",
                explorer
            )
        );
        assert!(queue.is_empty());
    }
}
