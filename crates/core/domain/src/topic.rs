//! 设备主题编解码。
//!
//! 主题格式：`{country}/{site_id}/{model}/{device_id}/{kind}[/...]`，
//! 例如 `th/site001/pg46/001/meter`。前四段拼成缓存键，第五段是消息类型。

/// 解析设备主题，返回 (country, site_id, model, device_id, last_type)。
///
/// 段数不足 5 时返回 None；第 5 段之后的内容忽略。段内容不做校验，
/// 空字符串也是合法段。
pub fn parse_topic(topic: &str) -> Option<(String, String, String, String, String)> {
    let mut parts = topic.split('/');
    let country = parts.next()?.to_string();
    let site_id = parts.next()?.to_string();
    let model = parts.next()?.to_string();
    let device_id = parts.next()?.to_string();
    let last_type = parts.next()?.to_string();
    Some((country, site_id, model, device_id, last_type))
}

/// 由四元组拼出设备键。与 parse_topic 的前四段互为投影：
/// 两个设备不同当且仅当四元组中任一字段不同。
pub fn make_key(country: &str, site_id: &str, model: &str, device_id: &str) -> String {
    format!("{}/{}/{}/{}", country, site_id, model, device_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_topic_five_segments() {
        let parsed = parse_topic("th/site001/pg46/001/meter").expect("parsed");
        assert_eq!(
            parsed,
            (
                "th".to_string(),
                "site001".to_string(),
                "pg46".to_string(),
                "001".to_string(),
                "meter".to_string()
            )
        );
    }

    #[test]
    fn parse_topic_extra_segments_ignored() {
        let parsed = parse_topic("th/site001/pg46/001/meter/extra/extra2").expect("parsed");
        assert_eq!(parsed.4, "meter");
    }

    #[test]
    fn parse_topic_too_short() {
        assert!(parse_topic("a/b/c").is_none());
        assert!(parse_topic("").is_none());
        assert!(parse_topic("a/b/c/d").is_none());
    }

    #[test]
    fn parse_topic_empty_segments_are_valid() {
        let parsed = parse_topic("//pg46//meter").expect("parsed");
        assert_eq!(parsed.0, "");
        assert_eq!(parsed.2, "pg46");
    }

    #[test]
    fn make_key_round_trip() {
        let (country, site_id, model, device_id, _) =
            parse_topic("th/site001/pg46/001/meter").expect("parsed");
        let key = make_key(&country, &site_id, &model, &device_id);
        assert_eq!(key, "th/site001/pg46/001");

        // 共享前四段的不同主题落到同一个键
        let (c2, s2, m2, d2, _) = parse_topic("th/site001/pg46/001/heartbeat").expect("parsed");
        assert_eq!(make_key(&c2, &s2, &m2, &d2), key);
    }
}
