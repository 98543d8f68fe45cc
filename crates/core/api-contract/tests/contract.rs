use api_contract::{DeviceLatestResponse, ReportRequest, SeriesQuery};
use domain::{RawPayload, Snapshot};

#[test]
fn series_query_defaults_and_aliases() {
    let query: SeriesQuery =
        serde_json::from_str(r#"{"device":"001","from":"2026-01-01","to":"2026-01-31"}"#)
            .expect("query");
    assert_eq!(query.device, "001");
    assert_eq!(query.metric, "kwh");
    assert_eq!(query.series, "total");
    assert_eq!(query.group, "day");
    assert_eq!(query.date_from, "2026-01-01");
    assert_eq!(query.date_to, "2026-01-31");
}

#[test]
fn report_request_defaults() {
    let request: ReportRequest =
        serde_json::from_str(r#"{"labels":["a"],"values":[1.0]}"#).expect("request");
    assert_eq!(request.title, "Period Analysis");
    assert_eq!(request.metric, "kwh");
    assert_eq!(request.series, "total");
}

// 单设备响应把快照字段平铺到顶层，同时保留 summary_value 嵌套
#[test]
fn device_latest_flattens_snapshot() {
    let snapshot = Snapshot {
        v_avg: Some(220.0),
        ..Snapshot::default()
    };
    let response = DeviceLatestResponse {
        key: "th/site001/pg46/001".to_string(),
        online: true,
        age_sec: 1.5,
        last_seen: 1_700_000_000_000,
        last_topic: "th/site001/pg46/001/meter".to_string(),
        payload: RawPayload::from_text(r#"{"v":220}"#),
        channels: Vec::new(),
        channel_count: 0,
        summary_value: snapshot.clone(),
        summary: snapshot,
    };
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["v_avg"], 220.0);
    assert_eq!(json["summary_value"]["v_avg"], 220.0);
    assert_eq!(json["online"], true);
}
