// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Single-consumer validation worker.
//!
//! A dispatcher feeds [`WorkItem`]s through a channel and receives one
//! [`ValidationOutcome`] per item, in the order the items were sent. The
//! worker owns the engine, so the stores are never shared.
//!
//! # Example
//!
//! ```no_run
//! use rpki_validator::config::EngineConfig;
//! use rpki_validator::engine::Engine;
//! use rpki_validator::types::Object;
//! use rpki_validator::worker::{self, WorkItem};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::from_config(EngineConfig::default());
//! let (work_tx, work_rx) = mpsc::channel(64);
//! let (report_tx, mut report_rx) = mpsc::channel(64);
//!
//! let handle = tokio::spawn(worker::run(engine, work_rx, report_tx));
//!
//! work_tx
//!     .send(WorkItem::Object(Object::new("repo/ca.cer", std::fs::read("repo/ca.cer")?)?))
//!     .await?;
//! drop(work_tx);
//!
//! while let Some(outcome) = report_rx.recv().await {
//!     println!("{}: {}", outcome.location, outcome.valid);
//! }
//! let _engine = handle.await?;
//! # Ok(())
//! # }
//! ```

use crate::engine::{Engine, ValidationOutcome};
use crate::tal::Tal;
use crate::types::Object;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One unit of work.
#[derive(Debug, Clone)]
pub enum WorkItem {
    /// Bootstrap a trust anchor from a parsed TAL.
    TrustAnchor(Tal),
    /// Validate a repository object.
    Object(Object),
}

/// Process work items until the input channel closes, then return the
/// engine with its stores.
///
/// Items are handled strictly one after another. If the report receiver is
/// dropped, remaining items are still processed but their outcomes are
/// discarded.
pub async fn run(
    mut engine: Engine,
    mut rx: mpsc::Receiver<WorkItem>,
    tx: mpsc::Sender<ValidationOutcome>,
) -> Engine {
    info!("Validation worker started");
    let mut processed = 0usize;
    let mut reporting = true;

    while let Some(item) = rx.recv().await {
        let outcome = match &item {
            WorkItem::TrustAnchor(tal) => engine.submit_tal(tal),
            WorkItem::Object(object) => engine.submit(object),
        };
        processed += 1;

        if reporting && tx.send(outcome).await.is_err() {
            warn!("Report receiver closed, discarding further outcomes");
            reporting = false;
        }
    }

    info!("Validation worker stopped after {} items", processed);
    engine
}
