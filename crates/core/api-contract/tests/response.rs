use api_contract::ApiResponse;

#[test]
fn success_envelope_shape() {
    let response = ApiResponse::success(vec![1, 2, 3]);
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    assert_eq!(json["error"], serde_json::Value::Null);
}

#[test]
fn error_envelope_shape() {
    let response = ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "device not found");
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "RESOURCE.NOT_FOUND");
    assert_eq!(json["error"]["message"], "device not found");
}
