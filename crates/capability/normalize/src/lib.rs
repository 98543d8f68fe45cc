//! 报文规整能力。
//!
//! 把松散类型的设备报文转成规范数值快照（normalize）和相位通道列表
//! （build_channels）。两者都是纯函数，对任意输入形态都不报错：
//! 转换失败的字段按缺失处理，不中断其余字段。
//!
//! 字段别名按序解析，复刻上游设备的 `or` 链语义：取第一个"真值"别名，
//! 全部为假值时退回最后一个别名的原值。数值 0 因此会被当作缺失落到
//! 后续别名；这是与既有设备行为对齐而保留的怪癖，不要顺手修掉。

use domain::{ChannelRecord, DiMap, RawPayload, Snapshot};
use serde_json::{Map, Value};

/// DI 布尔真值的可接受写法。
const DI_TRUE_TOKENS: [&str; 5] = ["1", "true", "True", "ON", "on"];

const V_AVG_ALIASES: [&str; 4] = ["v_avg", "v", "volt", "voltage"];
const A_AVG_ALIASES: [&str; 4] = ["a_avg", "a", "amp", "current"];
const PF_AVG_ALIASES: [&str; 3] = ["pf_avg", "pf", "power_factor"];
const KW_ALIASES: [&str; 4] = ["kw", "kW", "p", "power_kw"];
const KWH_ALIASES: [&str; 3] = ["kwh", "kWh", "energy_kwh"];

/// 尽力把一个 JSON 值转成有限浮点数。
///
/// 数字直接通过，布尔按 1/0，字符串去空白后解析；null、空串、
/// 非有限结果（NaN/inf）和其余类型都算缺失。
pub fn try_parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|x| x.is_finite())
        }
        _ => None,
    }
}

/// 上游意义上的"真值"：null/false/0/空串/空数组/空对象都是假值。
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// 按别名次序解析数值字段（`or` 链）。
fn pick(map: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    for alias in aliases {
        if let Some(value) = map.get(*alias) {
            if is_truthy(value) {
                return try_parse_number(value);
            }
        }
    }
    // 全部为假值时链条落在最后一个别名的原值上
    aliases
        .last()
        .and_then(|alias| map.get(*alias))
        .and_then(try_parse_number)
}

/// 按别名次序解析文本字段，非字符串的真值原样转文本。
fn pick_label(map: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        if let Some(value) = map.get(*alias) {
            if is_truthy(value) {
                return Some(value_label(value));
            }
        }
    }
    None
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 出现值的算术平均，保留 3 位小数。
fn mean3(x1: Option<f64>, x2: Option<f64>, x3: Option<f64>) -> Option<f64> {
    let nums: Vec<f64> = [x1, x2, x3].into_iter().flatten().collect();
    if nums.is_empty() {
        return None;
    }
    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
    Some((mean * 1000.0).round() / 1000.0)
}

/// 解析一族相位量（V/A/PF 之一）：三个相位值加聚合值。
///
/// 聚合在、相位全缺 → 三相回填为聚合值；聚合缺 → 聚合取出现相位的均值。
fn resolve_quantity(
    map: &Map<String, Value>,
    phases: [[&str; 3]; 3],
    avg_aliases: &[&str],
) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    let mut l1 = pick(map, &phases[0]);
    let mut l2 = pick(map, &phases[1]);
    let mut l3 = pick(map, &phases[2]);
    let mut avg = pick(map, avg_aliases);

    if avg.is_some() && l1.is_none() && l2.is_none() && l3.is_none() {
        l1 = avg;
        l2 = avg;
        l3 = avg;
    }
    if avg.is_none() {
        avg = mean3(l1, l2, l3);
    }
    (l1, l2, l3, avg)
}

/// DI 单值是否按 1 处理。
fn di_token_is_on(value: &Value) -> bool {
    match value {
        Value::String(s) => DI_TRUE_TOKENS.contains(&s.as_str()),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// 解析 DI 槽位表。
///
/// 来源优先级：`di` 对象（键 1..16）→ `di` 列表（前 16 项，0/1 之外为
/// null）→ 平铺键 `di1`..`di16`。平铺键最后生效，覆盖前两者的结果。
/// 没有任何来源时返回 None。
fn resolve_di(map: &Map<String, Value>) -> Option<DiMap> {
    let mut slots: DiMap = DiMap::new();
    let di_obj = map.get("di");

    if let Some(Value::Object(obj)) = di_obj {
        for (key, value) in obj {
            if let Ok(index) = key.trim().parse::<i64>() {
                if (1..=16).contains(&index) {
                    slots.insert(index as u8, Some(u8::from(di_token_is_on(value))));
                }
            }
        }
    }

    if slots.is_empty() {
        if let Some(Value::Array(list)) = di_obj {
            for (idx, value) in list.iter().take(16).enumerate() {
                let bit = match value {
                    Value::Bool(b) => Some(u8::from(*b)),
                    Value::Number(n) => match n.as_f64() {
                        Some(x) if x == 0.0 => Some(0),
                        Some(x) if x == 1.0 => Some(1),
                        _ => None,
                    },
                    _ => None,
                };
                slots.insert((idx + 1) as u8, bit);
            }
        }
    }

    for index in 1..=16u8 {
        let flat_key = format!("di{}", index);
        if let Some(value) = map.get(&flat_key) {
            slots.insert(index, Some(u8::from(di_token_is_on(value))));
        }
    }

    if slots.is_empty() {
        return None;
    }
    let mut full = DiMap::new();
    for index in 1..=16u8 {
        full.insert(index, slots.get(&index).copied().flatten());
    }
    Some(full)
}

/// 把原始报文规整成数值快照。对象之外的形态产出全缺失快照。
pub fn normalize(payload: &RawPayload) -> Snapshot {
    let Some(p) = payload.as_object() else {
        return Snapshot::default();
    };

    let (v_l1, v_l2, v_l3, v_avg) = resolve_quantity(
        p,
        [
            ["v_l1", "v1", "vl1"],
            ["v_l2", "v2", "vl2"],
            ["v_l3", "v3", "vl3"],
        ],
        &V_AVG_ALIASES,
    );
    let (a_l1, a_l2, a_l3, a_avg) = resolve_quantity(
        p,
        [
            ["a_l1", "a1", "al1"],
            ["a_l2", "a2", "al2"],
            ["a_l3", "a3", "al3"],
        ],
        &A_AVG_ALIASES,
    );
    let (pf_l1, pf_l2, pf_l3, pf_avg) = resolve_quantity(
        p,
        [
            ["pf_l1", "pf1", "pfl1"],
            ["pf_l2", "pf2", "pfl2"],
            ["pf_l3", "pf3", "pfl3"],
        ],
        &PF_AVG_ALIASES,
    );

    Snapshot {
        kw: pick(p, &KW_ALIASES),
        kwh: pick(p, &KWH_ALIASES),
        v_l1,
        v_l2,
        v_l3,
        v_avg,
        a_l1,
        a_l2,
        a_l3,
        a_avg,
        pf_l1,
        pf_l2,
        pf_l3,
        pf_avg,
        di: resolve_di(p),
    }
}

/// 相位标签：1/"1" → L1，2/"2" → L2，3/"3" → L3，其余真值原样保留，
/// 假值或缺失 → L1。
fn resolve_phase(map: &Map<String, Value>) -> String {
    let raw = ["phase", "ph"]
        .iter()
        .find_map(|key| map.get(*key).filter(|v| is_truthy(v)));
    match raw {
        Some(value) => match phase_index(value) {
            Some(1) => "L1".to_string(),
            Some(2) => "L2".to_string(),
            Some(3) => "L3".to_string(),
            _ => value_label(value),
        },
        None => "L1".to_string(),
    }
}

fn phase_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(1),
            Some(x) if x == 2.0 => Some(2),
            Some(x) if x == 3.0 => Some(3),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" => Some(1),
            "2" => Some(2),
            "3" => Some(3),
            _ => None,
        },
        Value::Bool(true) => Some(1),
        _ => None,
    }
}

/// 把原始报文展开成相位通道列表。
///
/// 报文带非空 `channels` 列表时逐条修正（缺 term 补 "in"，缺 phase 补
/// "L1"，非对象条目跳过）；否则若存在任一平铺读数，复制成 L1/L2/L3
/// 三条相同通道；两者皆无时为空列表。
pub fn build_channels(payload: &RawPayload) -> Vec<ChannelRecord> {
    let Some(p) = payload.as_object() else {
        return Vec::new();
    };

    if let Some(Value::Array(entries)) = p.get("channels") {
        if !entries.is_empty() {
            let mut fixed = Vec::new();
            for entry in entries {
                let Value::Object(c) = entry else { continue };
                fixed.push(ChannelRecord {
                    term: pick_label(c, &["term", "io", "side"]).unwrap_or_else(|| "in".to_string()),
                    phase: resolve_phase(c),
                    v: pick(c, &["v", "volt", "voltage"]),
                    a: pick(c, &["a", "amp", "current"]),
                    kw: pick(c, &KW_ALIASES),
                    pf: pick(c, &["pf", "power_factor"]),
                });
            }
            return fixed;
        }
    }

    // 单值报文回退：同一组读数复制到三个相位
    let v = pick(p, &["v", "volt", "voltage"]);
    let a = pick(p, &["a", "amp", "current"]);
    let kw = pick(p, &KW_ALIASES);
    let pf = pick(p, &["pf", "power_factor"]);

    if v.is_none() && a.is_none() && kw.is_none() && pf.is_none() {
        return Vec::new();
    }

    ["L1", "L2", "L3"]
        .iter()
        .map(|phase| ChannelRecord {
            term: "in".to_string(),
            phase: (*phase).to_string(),
            v,
            a,
            kw,
            pf,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> RawPayload {
        RawPayload::from_text(&value.to_string())
    }

    #[test]
    fn try_parse_number_policy() {
        assert_eq!(try_parse_number(&json!(220)), Some(220.0));
        assert_eq!(try_parse_number(&json!(0.95)), Some(0.95));
        assert_eq!(try_parse_number(&json!("  221.5 ")), Some(221.5));
        assert_eq!(try_parse_number(&json!(true)), Some(1.0));
        assert_eq!(try_parse_number(&json!(false)), Some(0.0));
        assert_eq!(try_parse_number(&json!("")), None);
        assert_eq!(try_parse_number(&json!("abc")), None);
        assert_eq!(try_parse_number(&json!("nan")), None);
        assert_eq!(try_parse_number(&json!("inf")), None);
        assert_eq!(try_parse_number(&Value::Null), None);
        assert_eq!(try_parse_number(&json!([1])), None);
        assert_eq!(try_parse_number(&json!({"x": 1})), None);
    }

    #[test]
    fn aggregate_from_present_phases() {
        let snap = normalize(&object(json!({"v_l1": 220, "v_l2": 222})));
        assert_eq!(snap.v_l1, Some(220.0));
        assert_eq!(snap.v_l2, Some(222.0));
        assert_eq!(snap.v_l3, None);
        assert_eq!(snap.v_avg, Some(221.0));
    }

    #[test]
    fn aggregate_mean_rounds_to_three_decimals() {
        let snap = normalize(&object(json!({"a_l1": 1, "a_l2": 1, "a_l3": 2})));
        assert_eq!(snap.a_avg, Some(1.333));
    }

    #[test]
    fn phases_backfilled_from_aggregate() {
        let snap = normalize(&object(json!({"v": 230})));
        assert_eq!(snap.v_l1, Some(230.0));
        assert_eq!(snap.v_l2, Some(230.0));
        assert_eq!(snap.v_l3, Some(230.0));
        assert_eq!(snap.v_avg, Some(230.0));
    }

    #[test]
    fn quantities_resolve_independently() {
        let snap = normalize(&object(json!({"v": 230, "a_l1": 5, "pf": 0.9})));
        assert_eq!(snap.v_l2, Some(230.0));
        assert_eq!(snap.a_avg, Some(5.0));
        assert_eq!(snap.a_l2, None);
        assert_eq!(snap.pf_l3, Some(0.9));
    }

    #[test]
    fn alias_order_first_match_wins() {
        let snap = normalize(&object(json!({"v_avg": 231, "v": 999, "voltage": 1})));
        assert_eq!(snap.v_avg, Some(231.0));
        let snap = normalize(&object(json!({"volt": 229})));
        assert_eq!(snap.v_avg, Some(229.0));
    }

    // 上游 `or` 链把 0 当假值：首别名为 0 时落到后续别名。
    #[test]
    fn zero_value_falls_through_aliases() {
        let snap = normalize(&object(json!({"v_avg": 0, "v": 225})));
        assert_eq!(snap.v_avg, Some(225.0));

        // 全链为假值、末别名缺失 → 缺失
        let snap = normalize(&object(json!({"v_l3": 0})));
        assert_eq!(snap.v_l3, None);

        // 末别名本身为 0 时照常转换：链条落在最后一个操作数上
        let snap = normalize(&object(json!({"vl3": 0})));
        assert_eq!(snap.v_l3, Some(0.0));
    }

    #[test]
    fn normalize_never_fails_on_odd_shapes() {
        for payload in [
            RawPayload::from_text("null"),
            RawPayload::from_text("[1, 2, 3]"),
            RawPayload::from_text("\"hello\""),
            RawPayload::from_text("{broken"),
            object(json!({"v": {"deeply": {"nested": [1]}}, "a": [], "pf": {}})),
            object(json!({"di": "junk", "channels": 7})),
        ] {
            let snap = normalize(&payload);
            assert_eq!(snap.kw, None);
            assert_eq!(snap.v_avg, None);
        }
    }

    #[test]
    fn kw_kwh_aliases() {
        let snap = normalize(&object(json!({"p": 3.2, "energy_kwh": 42})));
        assert_eq!(snap.kw, Some(3.2));
        assert_eq!(snap.kwh, Some(42.0));
        let snap = normalize(&object(json!({"kW": 1.5, "kWh": 2.5})));
        assert_eq!(snap.kw, Some(1.5));
        assert_eq!(snap.kwh, Some(2.5));
    }

    #[test]
    fn di_object_tokens() {
        let snap = normalize(&object(json!({"di": {"1": "ON", "2": 0, "3": true, "4": "off", "16": 1}})));
        let di = snap.di.expect("di");
        assert_eq!(di[&1], Some(1));
        assert_eq!(di[&2], Some(0));
        assert_eq!(di[&3], Some(1));
        assert_eq!(di[&4], Some(0));
        assert_eq!(di[&16], Some(1));
        assert_eq!(di[&5], None);
        assert_eq!(di.len(), 16);
    }

    #[test]
    fn di_object_out_of_range_keys_skipped() {
        let snap = normalize(&object(json!({"di": {"0": 1, "17": 1, "abc": 1}})));
        assert_eq!(snap.di, None);
    }

    #[test]
    fn di_list_passthrough() {
        let snap = normalize(&object(json!({"di": [1, 0, 2, "x", true]})));
        let di = snap.di.expect("di");
        assert_eq!(di[&1], Some(1));
        assert_eq!(di[&2], Some(0));
        assert_eq!(di[&3], None);
        assert_eq!(di[&4], None);
        assert_eq!(di[&5], Some(1));
        assert_eq!(di[&6], None);
    }

    #[test]
    fn di_flat_key_overrides_object() {
        let snap = normalize(&object(json!({"di": {"1": "ON", "2": 0}, "di1": "0"})));
        let di = snap.di.expect("di");
        assert_eq!(di[&1], Some(0));
        assert_eq!(di[&2], Some(0));
        for slot in 3..=16u8 {
            assert_eq!(di[&slot], None);
        }
    }

    #[test]
    fn di_absent_when_no_source() {
        let snap = normalize(&object(json!({"v": 220})));
        assert_eq!(snap.di, None);
    }

    #[test]
    fn channels_from_flat_values() {
        let channels = build_channels(&object(json!({"v": 100, "a": 5})));
        assert_eq!(channels.len(), 3);
        for (channel, phase) in channels.iter().zip(["L1", "L2", "L3"]) {
            assert_eq!(channel.term, "in");
            assert_eq!(channel.phase, phase);
            assert_eq!(channel.v, Some(100.0));
            assert_eq!(channel.a, Some(5.0));
            assert_eq!(channel.kw, None);
            assert_eq!(channel.pf, None);
        }
    }

    #[test]
    fn channels_empty_without_any_reading() {
        assert!(build_channels(&object(json!({"status": "ok"}))).is_empty());
        assert!(build_channels(&RawPayload::from_text("not json")).is_empty());
    }

    #[test]
    fn channels_list_coerced() {
        let channels = build_channels(&object(json!({
            "channels": [
                {"term": "out", "phase": 2, "v": "231", "a": 4.2},
                {"ph": "3", "pf": 0.98},
                "junk",
                {"io": "aux", "phase": "weird", "kw": 1.1}
            ]
        })));
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].term, "out");
        assert_eq!(channels[0].phase, "L2");
        assert_eq!(channels[0].v, Some(231.0));
        assert_eq!(channels[1].term, "in");
        assert_eq!(channels[1].phase, "L3");
        assert_eq!(channels[1].pf, Some(0.98));
        assert_eq!(channels[2].term, "aux");
        assert_eq!(channels[2].phase, "weird");
        assert_eq!(channels[2].kw, Some(1.1));
    }

    // 空 channels 列表走单值回退，而不是空结果
    #[test]
    fn empty_channels_list_falls_back_to_flat() {
        let channels = build_channels(&object(json!({"channels": [], "kw": 2.0})));
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].kw, Some(2.0));
    }

    // 非空 channels 列表即使全是坏条目也不回退
    #[test]
    fn non_object_channel_entries_skipped_without_fallback() {
        let channels = build_channels(&object(json!({"channels": [1, "x"], "kw": 2.0})));
        assert!(channels.is_empty());
    }
}
