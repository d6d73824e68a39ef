pub mod error;
pub mod set;

pub use error::{BoxedError, ToolError};
pub use set::ToolSet;

use std::{collections::BTreeMap, future::Future, sync::Arc};

use futures_util::{FutureExt, future::BoxFuture};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::context::Context;

/// One argument of a tool's input schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// JSON type name (`string`, `number`, `object`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl Property {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: None,
            required: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Argument name to property. Ordered so declarations render identically
/// on every request.
pub type InputSchema = BTreeMap<String, Property>;

/// Renders an input schema as a JSON-schema object.
pub fn json_schema(input_schema: &InputSchema) -> Value {
    let properties: serde_json::Map<String, Value> = input_schema
        .iter()
        .map(|(name, prop)| {
            let mut entry = json!({ "type": prop.kind });
            if let Some(description) = &prop.description {
                entry["description"] = json!(description);
            }
            (name.clone(), entry)
        })
        .collect();
    let required: Vec<&str> = input_schema
        .iter()
        .filter(|(_, prop)| prop.required)
        .map(|(name, _)| name.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

enum Failure {
    Input(BoxedError),
    Execution(BoxedError),
    Output(serde_json::Error),
}

type ExecuteFn =
    dyn Fn(Context, String) -> BoxFuture<'static, Result<String, Failure>> + Send + Sync;

/// A caller-supplied function the model may invoke by name.
///
/// The name is the key under which the tool is registered in a [`ToolSet`].
#[derive(Clone)]
pub struct Tool {
    description: String,
    input_schema: InputSchema,
    execute: Arc<ExecuteFn>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

impl Tool {
    /// Tool receiving the raw JSON argument text.
    ///
    /// Whatever `execute` returns on success is serialized with `serde_json`
    /// and becomes the tool-role message content.
    pub fn new<F, Fut, R, E>(
        description: impl Into<String>,
        input_schema: InputSchema,
        execute: F,
    ) -> Self
    where
        F: Fn(Context, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Serialize,
        E: Into<BoxedError>,
    {
        let execute = move |ctx: Context, args: String| {
            execute(ctx, args)
                .map(|result| match result {
                    Ok(value) => serde_json::to_string(&value).map_err(Failure::Output),
                    Err(e) => Err(Failure::Execution(e.into())),
                })
                .boxed()
        };
        Self {
            description: description.into(),
            input_schema,
            execute: Arc::new(execute),
        }
    }

    /// Tool whose arguments are deserialized into `A` before `execute` runs.
    ///
    /// Arguments that don't fit `A` are reported back to the model like any
    /// other tool failure.
    pub fn typed<A, F, Fut, R, E>(
        description: impl Into<String>,
        input_schema: InputSchema,
        execute: F,
    ) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        F: Fn(Context, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Serialize,
        E: Into<BoxedError>,
    {
        let execute = Arc::new(execute);
        let run = move |ctx: Context, args: String| -> BoxFuture<'static, Result<String, Failure>> {
            let args: A = match serde_json::from_str(&args) {
                Ok(args) => args,
                Err(e) => return futures_util::future::ready(Err(Failure::Input(e.into()))).boxed(),
            };
            let execute = Arc::clone(&execute);
            async move {
                match execute(ctx, args).await {
                    Ok(value) => serde_json::to_string(&value).map_err(Failure::Output),
                    Err(e) => Err(Failure::Execution(e.into())),
                }
            }
            .boxed()
        };
        Self {
            description: description.into(),
            input_schema,
            execute: Arc::new(run),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Runs the tool registered as `name` and returns its serialized result.
    pub async fn invoke(
        &self,
        name: &str,
        ctx: Context,
        arguments: String,
    ) -> Result<String, ToolError> {
        (self.execute)(ctx, arguments).await.map_err(|failure| match failure {
            Failure::Input(e) => ToolError::input_deserialization(name, e),
            Failure::Execution(e) => ToolError::execution(name, e),
            Failure::Output(e) => ToolError::output_serialization(name, e),
        })
    }
}

/// Hook called with `(tool name, raw arguments)` right before a tool runs.
pub type ToolObserver = Arc<dyn Fn(&str, &str) + Send + Sync>;
