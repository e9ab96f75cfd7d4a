//! 统一端点请求数据传输对象
//!
//! 处理器先用这些结构校验请求形状，再把原始JSON原样转发给后端，
//! 未声明的字段不会丢失

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, StatusCode},
    Form, Json,
};
use std::collections::HashMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::business::GatewayContext;
use crate::shared::AppError;

/// 请求体提取器，接受 JSON 和表单编码，解析失败时返回带 `error` 字段的JSON错误
///
/// 表单字段统一转成字符串值的JSON对象
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl FromRequest<GatewayContext> for JsonBody {
    type Rejection = AppError;

    async fn from_request(request: Request, state: &GatewayContext) -> Result<Self, Self::Rejection> {
        let limit = state.config.max_body_bytes;

        if is_form_encoded(request.headers()) {
            return match Form::<HashMap<String, String>>::from_request(request, state).await {
                Ok(Form(fields)) => Ok(Self(form_to_json(fields))),
                Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    Err(AppError::PayloadTooLarge { limit })
                }
                Err(rejection) => Err(AppError::Validation(rejection.body_text())),
            };
        }

        match Json::<Value>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(AppError::PayloadTooLarge { limit })
            }
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn form_to_json(fields: HashMap<String, String>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

/// 请求体提取结果，失败时保留错误交给调度器计数
pub type BodyResult = Result<JsonBody, AppError>;

/// 提取并校验请求体，返回校验后的结构和原始JSON
pub fn validated_body<T: ValidatedRequest>(body: BodyResult) -> Result<(T, Value), AppError> {
    let JsonBody(value) = body?;
    let request = T::parse(&value)?;
    Ok((request, value))
}

/// 请求体校验
pub trait ValidatedRequest: DeserializeOwned {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// 从原始JSON解析并校验
    fn parse(value: &Value) -> Result<Self, AppError> {
        let request: Self = serde_json::from_value(value.clone())
            .map_err(|e| crate::validation_error!("请求体格式错误: {}", e))?;
        request.validate().map_err(AppError::Validation)?;
        Ok(request)
    }
}

/// 文本生成请求
#[derive(Debug, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidatedRequest for GenerateTextRequest {
    fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt 不能为空".to_string());
        }
        Ok(())
    }
}

/// 工作流执行请求
#[derive(Debug, Deserialize)]
pub struct ExecuteWorkflowRequest {
    pub workflow: Value,
    pub parameters: Option<Value>,
    pub priority: Option<Value>,
}

impl ValidatedRequest for ExecuteWorkflowRequest {
    fn validate(&self) -> Result<(), String> {
        if self.workflow.is_null() {
            return Err("workflow 不能为空".to_string());
        }
        Ok(())
    }
}

/// 团队任务请求
#[derive(Debug, Deserialize)]
pub struct TeamTaskRequest {
    pub task: String,
    #[serde(default)]
    pub parameters: Value,
}

impl ValidatedRequest for TeamTaskRequest {
    fn validate(&self) -> Result<(), String> {
        if self.task.trim().is_empty() {
            return Err("task 不能为空".to_string());
        }
        Ok(())
    }
}

/// 聊天请求
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: Option<Value>,
    pub stream: Option<bool>,
}

impl ValidatedRequest for ChatRequest {
    fn validate(&self) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("message 不能为空".to_string());
        }
        Ok(())
    }
}

/// 素材目录请求
#[derive(Debug, Deserialize)]
pub struct AssetCatalogRequest {
    #[serde(default)]
    pub requirements: Value,
}

impl ValidatedRequest for AssetCatalogRequest {}

impl ValidatedRequest for crate::business::services::ImageSpec {
    fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt 不能为空".to_string());
        }
        Ok(())
    }
}
