//! Type-erased lifecycle surface.
//!
//! The host only ever holds attribute documents as JSON values. A
//! [`Binding`] decodes them into a controller's typed desired and observed
//! state, runs the operation, and encodes the result back. Errors come out
//! as [`Diagnostics`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::controller::{OpContext, ResourceController};
use crate::diagnostics::Diagnostics;
use crate::RunnerError;

/// What applying a desired document against prior state would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedChange {
    Create,
    Update,
    NoOp,
}

#[async_trait]
pub trait ManagedResource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn plan(&self, desired: &Value, prior: Option<&Value>) -> Result<PlannedChange, Diagnostics>;

    async fn create(&self, ctx: &OpContext, desired: &Value) -> Result<Value, Diagnostics>;

    async fn read(&self, ctx: &OpContext, prior: &Value) -> Result<Value, Diagnostics>;

    async fn update(
        &self,
        ctx: &OpContext,
        desired: &Value,
        prior: &Value,
    ) -> Result<Value, Diagnostics>;

    async fn delete(&self, ctx: &OpContext, prior: &Value) -> Result<(), Diagnostics>;

    async fn import(&self, ctx: &OpContext, id: &str) -> Result<Value, Diagnostics>;
}

pub struct Binding<C> {
    controller: C,
}

impl<C: ResourceController> Binding<C> {
    pub fn new(controller: C) -> Self {
        Self { controller }
    }

    fn decode<T: DeserializeOwned>(&self, value: &Value) -> Result<T, RunnerError> {
        decode(self.controller.type_name(), value)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(type_name: &str, value: &Value) -> Result<T, RunnerError> {
    T::deserialize(value).map_err(|e| RunnerError::Decode {
        type_name: type_name.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn encode<T: Serialize>(type_name: &str, value: &T) -> Result<Value, RunnerError> {
    serde_json::to_value(value).map_err(|e| RunnerError::Decode {
        type_name: type_name.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl<C: ResourceController> ManagedResource for Binding<C> {
    fn type_name(&self) -> &'static str {
        self.controller.type_name()
    }

    fn plan(&self, desired: &Value, prior: Option<&Value>) -> Result<PlannedChange, Diagnostics> {
        let desired: C::Desired = self.decode(desired)?;
        let Some(prior) = prior else {
            return Ok(PlannedChange::Create);
        };
        let prior: C::Observed = self.decode(prior)?;

        if self.controller.matches(&desired, &prior) {
            Ok(PlannedChange::NoOp)
        } else {
            Ok(PlannedChange::Update)
        }
    }

    async fn create(&self, ctx: &OpContext, desired: &Value) -> Result<Value, Diagnostics> {
        let desired: C::Desired = self.decode(desired)?;
        let observed = self.controller.create(ctx, &desired).await?;
        Ok(encode(self.type_name(), &observed)?)
    }

    async fn read(&self, ctx: &OpContext, prior: &Value) -> Result<Value, Diagnostics> {
        let prior: C::Observed = self.decode(prior)?;
        let observed = self.controller.read(ctx, &prior).await?;
        Ok(encode(self.type_name(), &observed)?)
    }

    async fn update(
        &self,
        ctx: &OpContext,
        desired: &Value,
        prior: &Value,
    ) -> Result<Value, Diagnostics> {
        let desired: C::Desired = self.decode(desired)?;
        let prior: C::Observed = self.decode(prior)?;
        let observed = self.controller.update(ctx, &desired, &prior).await?;
        Ok(encode(self.type_name(), &observed)?)
    }

    async fn delete(&self, ctx: &OpContext, prior: &Value) -> Result<(), Diagnostics> {
        let prior: C::Observed = self.decode(prior)?;
        self.controller.delete(ctx, &prior).await?;
        Ok(())
    }

    async fn import(&self, ctx: &OpContext, id: &str) -> Result<Value, Diagnostics> {
        let observed = self.controller.import(ctx, id).await?;
        Ok(encode(self.type_name(), &observed)?)
    }
}
