//! Host-side orchestration over the registry.
//!
//! These functions drive whole runs: they walk declared blocks and the
//! state document, pick the lifecycle operation per resource, and keep the
//! state document in step with every operation that succeeded. A failure
//! on one resource is recorded and the run moves on to the next one; once
//! the context is cancelled no further resource is touched.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use slackctl_config::{Address, Block};
use tracing::{info, warn};

use crate::binding::PlannedChange;
use crate::controller::OpContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::registry::LifecycleRegistry;
use crate::state::StateDocument;

/// Outcome of a run, per address.
#[derive(Debug, Default)]
pub struct RunReport {
    pub created: Vec<Address>,
    pub updated: Vec<Address>,
    pub unchanged: Vec<Address>,
    pub deleted: Vec<Address>,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    fn fail(&mut self, address: &Address, diagnostics: Diagnostics) {
        for diagnostic in diagnostics.into_vec() {
            warn!(%address, summary = %diagnostic.summary, "operation failed");
            self.diagnostics.push(Diagnostic {
                summary: format!("{}: {}", address, diagnostic.summary),
                ..diagnostic
            });
        }
    }
}

/// Creates what is declared but not tracked, updates what drifted, and
/// deletes what is tracked but no longer declared.
pub async fn apply(
    registry: &LifecycleRegistry,
    ctx: &OpContext,
    blocks: &[Block],
    state: &mut StateDocument,
) -> RunReport {
    let mut report = RunReport::default();
    let declared: BTreeSet<&Address> = blocks.iter().map(|b| &b.address).collect();

    for block in blocks {
        if ctx.is_cancelled() {
            break;
        }
        let address = &block.address;

        let resource = match registry.resource(&address.type_name) {
            Ok(resource) => resource,
            Err(e) => {
                report.fail(address, e.into());
                continue;
            }
        };

        let prior = state.get(address).map(|record| record.attributes.clone());
        let change = match resource.plan(&block.body, prior.as_ref()) {
            Ok(change) => change,
            Err(diagnostics) => {
                report.fail(address, diagnostics);
                continue;
            }
        };

        let result = match (change, &prior) {
            (PlannedChange::NoOp, _) => {
                report.unchanged.push(address.clone());
                continue;
            }
            (PlannedChange::Update, Some(prior)) => {
                info!(%address, "updating");
                resource.update(ctx, &block.body, prior).await
            }
            _ => {
                info!(%address, "creating");
                resource.create(ctx, &block.body).await
            }
        };

        match result {
            Ok(observed) => {
                state.insert(address, observed);
                if prior.is_some() {
                    report.updated.push(address.clone());
                } else {
                    report.created.push(address.clone());
                }
            }
            Err(diagnostics) => report.fail(address, diagnostics),
        }
    }

    let orphaned: Vec<Address> = state
        .addresses()
        .into_iter()
        .filter(|address| !declared.contains(address))
        .collect();
    delete_all(registry, ctx, orphaned, state, &mut report).await;

    report
}

/// Deletes every tracked resource.
pub async fn destroy(
    registry: &LifecycleRegistry,
    ctx: &OpContext,
    state: &mut StateDocument,
) -> RunReport {
    let mut report = RunReport::default();
    let addresses = state.addresses();
    delete_all(registry, ctx, addresses, state, &mut report).await;
    report
}

async fn delete_all(
    registry: &LifecycleRegistry,
    ctx: &OpContext,
    addresses: Vec<Address>,
    state: &mut StateDocument,
    report: &mut RunReport,
) {
    for address in addresses {
        if ctx.is_cancelled() {
            break;
        }
        let Some(record) = state.get(&address) else {
            continue;
        };

        let resource = match registry.resource(&record.type_name) {
            Ok(resource) => resource,
            Err(e) => {
                report.fail(&address, e.into());
                continue;
            }
        };

        info!(%address, "deleting");
        match resource.delete(ctx, &record.attributes).await {
            Ok(()) => {
                state.remove(&address);
                report.deleted.push(address);
            }
            Err(diagnostics) => report.fail(&address, diagnostics),
        }
    }
}

/// Adopts an existing remote entity under `address`.
pub async fn import(
    registry: &LifecycleRegistry,
    ctx: &OpContext,
    address: &Address,
    id: &str,
    state: &mut StateDocument,
) -> Result<(), Diagnostics> {
    if state.get(address).is_some() {
        return Err(Diagnostic::error(
            format!("{}: already managed", address),
            "remove it from the state file before importing again",
        )
        .into());
    }

    let resource = registry.resource(&address.type_name)?;
    info!(%address, id, "importing");
    let observed = resource.import(ctx, id).await?;
    state.insert(address, observed);
    Ok(())
}

/// Runs Read on every tracked resource and stores the result.
pub async fn refresh(
    registry: &LifecycleRegistry,
    ctx: &OpContext,
    state: &mut StateDocument,
) -> RunReport {
    let mut report = RunReport::default();

    for address in state.addresses() {
        if ctx.is_cancelled() {
            break;
        }
        let Some(record) = state.get(&address).cloned() else {
            continue;
        };

        let result = match registry.resource(&record.type_name) {
            Ok(resource) => resource.read(ctx, &record.attributes).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(observed) => {
                if observed != record.attributes {
                    state.insert(&address, observed);
                    report.updated.push(address);
                } else {
                    report.unchanged.push(address);
                }
            }
            Err(diagnostics) => report.fail(&address, diagnostics),
        }
    }

    report
}

/// Evaluates every data block, keyed by address.
pub async fn read_data(
    registry: &LifecycleRegistry,
    ctx: &OpContext,
    blocks: &[Block],
) -> (BTreeMap<String, Value>, Diagnostics) {
    let mut values = BTreeMap::new();
    let mut report = RunReport::default();

    for block in blocks {
        if ctx.is_cancelled() {
            break;
        }
        let address = &block.address;
        let result = match registry.data_source(&address.type_name) {
            Ok(source) => source.read(ctx, &block.body).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(value) => {
                values.insert(address.to_string(), value);
            }
            Err(diagnostics) => report.fail(address, diagnostics),
        }
    }

    (values, report.diagnostics)
}
