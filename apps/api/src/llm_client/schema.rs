use serde_json::{json, Value};

/// Response schema sent with every analysis request: four string arrays and
/// a summary string, in Gemini's OpenAPI-subset notation.
pub fn swot_response_schema() -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "strengths": string_list,
            "weaknesses": string_list,
            "opportunities": string_list,
            "threats": string_list,
            "summary": { "type": "STRING" }
        }
    })
}
