#![forbid(unsafe_code)]

use super::jsonrpc::{
    INVALID_PARAMS, JsonRpcRequest, METHOD_NOT_FOUND, json_rpc_error, json_rpc_response, op_error,
    op_ok,
};
use crate::{ExternalIdentity, ServiceError, TaskService};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use vt_core::{PrincipalId, TaskFields, TaskId, TaskPatch};

#[derive(Debug, Deserialize)]
struct RegisterParams {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SyncParams {
    id: String,
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CredentialParams {
    #[serde(default)]
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskParams {
    #[serde(default)]
    credential: Option<String>,
    task: TaskFields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskParams {
    #[serde(default)]
    credential: Option<String>,
    task_id: String,
    #[serde(default)]
    patch: TaskPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskIdParams {
    #[serde(default)]
    credential: Option<String>,
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleBlockParams {
    #[serde(default)]
    credential: Option<String>,
    target_id: String,
}

/// Routes JSON-RPC methods to [`TaskService`] operations.
///
/// Every principal-scoped method resolves `params.credential` first and passes the resulting
/// principal explicitly.
#[derive(Debug)]
pub struct RpcServer {
    service: TaskService,
}

enum Dispatch {
    Done(Result<Value, ServiceError>),
    BadParams(String),
    UnknownMethod,
}

impl RpcServer {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    /// Returns `None` for notifications (requests without an id).
    pub fn handle(&self, request: JsonRpcRequest) -> Option<Value> {
        let JsonRpcRequest {
            method, id, params, ..
        } = request;
        let params = params.unwrap_or(Value::Null);

        let outcome = self.dispatch(method.as_str(), params);
        let id = id?;

        let response = match outcome {
            Dispatch::Done(Ok(result)) => json_rpc_response(Some(id), op_ok(result)),
            Dispatch::Done(Err(err)) => {
                tracing::debug!(method = %method, code = err.code(), "operation refused");
                json_rpc_response(Some(id), op_error(&err))
            }
            Dispatch::BadParams(message) => {
                json_rpc_error(Some(id), INVALID_PARAMS, &format!("Invalid params: {message}"))
            }
            Dispatch::UnknownMethod => json_rpc_error(
                Some(id),
                METHOD_NOT_FOUND,
                &format!("Method not found: {method}"),
            ),
        };
        Some(response)
    }

    fn dispatch(&self, method: &str, params: Value) -> Dispatch {
        let service = &self.service;
        match method {
            "ping" => Dispatch::Done(Ok(json!({}))),
            "health" => Dispatch::Done(service.health().and_then(to_value)),
            "register" => with_params(params, |p: RegisterParams| {
                service
                    .register(&p.email, &p.password, &p.name)
                    .and_then(to_value)
            }),
            "login" => with_params(params, |p: LoginParams| {
                service.login(&p.email, &p.password).and_then(to_value)
            }),
            "syncExternalIdentity" => with_params(params, |p: SyncParams| {
                service
                    .sync_external_identity(ExternalIdentity {
                        id: p.id,
                        email: p.email,
                        name: p.name,
                        picture: p.picture,
                    })
                    .and_then(to_value)
            }),
            "upgradeTier" => with_params(params, |p: CredentialParams| {
                let principal = service.resolve(p.credential.as_deref())?;
                service.upgrade_tier(&principal.id).and_then(to_value)
            }),
            "tasks/list" => with_params(params, |p: CredentialParams| {
                let principal = service.resolve(p.credential.as_deref())?;
                service.list_tasks(&principal).and_then(to_value)
            }),
            "tasks/create" => with_params(params, |p: CreateTaskParams| {
                let principal = service.resolve(p.credential.as_deref())?;
                service.create_task(&principal, p.task).and_then(to_value)
            }),
            "tasks/update" => with_params(params, |p: UpdateTaskParams| {
                let principal = service.resolve(p.credential.as_deref())?;
                let task_id = parse_task_id(p.task_id)?;
                service
                    .update_task(&principal, &task_id, p.patch)
                    .and_then(to_value)
            }),
            "tasks/delete" => with_params(params, |p: TaskIdParams| {
                let principal = service.resolve(p.credential.as_deref())?;
                let task_id = parse_task_id(p.task_id)?;
                service.delete_task(&principal, &task_id)?;
                Ok(json!({ "deleted": task_id.as_str() }))
            }),
            "admin/listUsers" => with_params(params, |p: CredentialParams| {
                let admin = service.resolve(p.credential.as_deref())?;
                service.list_all_users(&admin).and_then(to_value)
            }),
            "admin/toggleBlock" => with_params(params, |p: ToggleBlockParams| {
                let admin = service.resolve(p.credential.as_deref())?;
                // An unparseable target cannot exist.
                let target_id =
                    PrincipalId::try_new(p.target_id).map_err(|_| ServiceError::NotFound)?;
                service.toggle_block(&admin, &target_id).and_then(to_value)
            }),
            _ => Dispatch::UnknownMethod,
        }
    }
}

fn with_params<P, F>(params: Value, op: F) -> Dispatch
where
    P: DeserializeOwned,
    F: FnOnce(P) -> Result<Value, ServiceError>,
{
    // Absent params read as an empty object so missing fields are reported by name.
    let params = match params {
        Value::Null => json!({}),
        other => other,
    };
    let parsed = serde_json::from_value::<P>(params);
    match parsed {
        Ok(p) => Dispatch::Done(op(p)),
        Err(err) => Dispatch::BadParams(err.to_string()),
    }
}

fn parse_task_id(raw: String) -> Result<TaskId, ServiceError> {
    TaskId::try_new(raw).map_err(|_| ServiceError::NotFound)
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|_| ServiceError::InvalidInput("response not serializable"))
}
