//! Rendering of weather payloads as the text the tool returns

use serde_json::Value;

const NO_DATA: &str = "未找到天气数据";

/// Render a weather payload.
///
/// An `error` field wins over everything else. A payload without live
/// records renders the API's `info` message when the API reported a failure.
pub fn format_weather_data(data: &Value) -> String {
    if let Some(error) = data.get("error") {
        return format!("错误: {}", plain(error));
    }

    let Some(live) = data
        .get("lives")
        .and_then(Value::as_array)
        .and_then(|lives| lives.first())
    else {
        let api_failed = data.get("status").and_then(Value::as_str) != Some("1");
        let info = data
            .get("info")
            .and_then(Value::as_str)
            .filter(|_| api_failed)
            .unwrap_or(NO_DATA);
        return format!("错误: {}", info);
    };

    let field = |key: &str| live.get(key).map(plain).unwrap_or_default();

    format!(
        "省份: {}\n城市: {}\n天气: {}\n温度: {}℃\n风力: {}风 {}级\n报告时间: {}",
        field("province"),
        field("city"),
        field("weather"),
        field("temperature"),
        field("winddirection"),
        field("windpower"),
        field("reporttime"),
    )
}

/// Parse a textual payload first, then render it
pub fn format_weather_text(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(data) => format_weather_data(&data),
        Err(e) => format!("JSON解析错误: {}", e),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
