//! 演示框架探测 - 业务能力层
//!
//! 检查页面上是否存在演示框架的运行时对象（如 `window.Reveal`）

use tracing::{info, warn};

use crate::error::DeckResult;
use crate::infrastructure::JsExecutor;

/// 把探测表达式包装成不会抛异常的脚本
pub fn probe_script(expression: &str) -> String {
    format!(
        r#"
        (() => {{
            try {{
                return Boolean({});
            }} catch (error) {{
                return false;
            }}
        }})()
        "#,
        expression
    )
}

/// 执行探测，返回运行时对象是否存在
pub async fn probe_framework(executor: &JsExecutor, expression: &str) -> DeckResult<bool> {
    let present: bool = executor
        .eval_as("探测演示框架", probe_script(expression))
        .await?;

    if present {
        info!("✓ 检测到演示框架运行时");
    } else {
        warn!("⚠️ 页面上未检测到演示框架运行时 ({})", expression);
    }

    Ok(present)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_script_wraps_expression_in_try() {
        let script = probe_script("typeof window.Reveal !== 'undefined'");
        assert!(script.contains("return Boolean(typeof window.Reveal !== 'undefined');"));
        assert!(script.contains("catch (error)"));
    }
}
