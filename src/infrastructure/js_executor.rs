//! JS 执行器 - 基础设施层
//!
//! 持有渲染上下文里唯一的 page，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{DeckError, DeckResult};

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力，返回值按 JSON 取回（Promise 会被等待）
/// - 不认识 Deck / RenderJob
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（导航、打印等非 JS 操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// `action` 只用于错误信息，说明这段脚本在做什么。
    pub async fn eval(&self, action: &str, js_code: impl Into<String>) -> DeckResult<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| DeckError::script(action, e))?;

        // 脚本返回 undefined 时没有值
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        action: &str,
        js_code: impl Into<String>,
    ) -> DeckResult<T> {
        let json_value = self.eval(action, js_code).await?;
        serde_json::from_value(json_value).map_err(|e| DeckError::script(action, e))
    }
}
