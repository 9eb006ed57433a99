//! 消息渲染：转义、zID 标签与换行

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

static ZID_TAG: LazyLock<Regex> = LazyLock::new(|| {
    // 正则为字面量，运行时不会编译失败
    Regex::new(r"\bz\d{7}\b").unwrap_or_else(|e| panic!("invalid zID pattern: {e}"))
});

/// 转义五个 HTML 特殊字符
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `text` 中标记的不重复 zID，按首次出现顺序
pub fn mentioned_ids(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in ZID_TAG.find_iter(text) {
        let id = m.as_str();
        if !seen.iter().any(|s: &String| s == id) {
            seen.push(id.to_string());
        }
    }
    seen
}

/// 把存储的消息转换为展示用 HTML。
///
/// 已知标签转为显示姓名的主页链接，未知标签保留原文。
/// 真实换行与导入数据中的字面 `\n` 都转换为 `<br>`。
pub fn render_message(text: &str, names: &HashMap<String, String>) -> String {
    // 转义不影响 `z` 与数字，标签保持完整
    let escaped = escape_html(text);

    let linked = ZID_TAG.replace_all(&escaped, |caps: &regex::Captures<'_>| {
        let id = &caps[0];
        match names.get(id) {
            Some(name) => format!("<a href='/profile/{}'>{}</a>", id, escape_html(name)),
            None => id.to_string(),
        }
    });

    linked
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
        .replace("\\n", "<br>")
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%H:%M:%S, %a %d %m %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn names() -> HashMap<String, String> {
        HashMap::from([
            ("z5000001".to_string(), "Ada Lovelace".to_string()),
            ("z5000002".to_string(), "<Bob>".to_string()),
        ])
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_mentioned_ids_dedupes_in_order() {
        let ids = mentioned_ids("hi z5000002 and z5000001, again z5000002");
        assert_eq!(ids, vec!["z5000002", "z5000001"]);
    }

    #[test]
    fn test_mentioned_ids_requires_word_boundary() {
        assert!(mentioned_ids("z50000011 xz5000001 z500000").is_empty());
    }

    #[test]
    fn test_render_links_known_tags() {
        let html = render_message("ping z5000001", &names());
        assert_eq!(html, "ping <a href='/profile/z5000001'>Ada Lovelace</a>");
    }

    #[test]
    fn test_render_escapes_names_and_body() {
        let html = render_message("<b>z5000002</b>", &names());
        assert_eq!(
            html,
            "&lt;b&gt;<a href='/profile/z5000002'>&lt;Bob&gt;</a>&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_leaves_unknown_tags() {
        assert_eq!(render_message("who is z5999999", &names()), "who is z5999999");
    }

    #[test]
    fn test_render_line_breaks() {
        assert_eq!(
            render_message("one\ntwo\\nthree\r\nfour", &HashMap::new()),
            "one<br>two<br>three<br>four"
        );
    }

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.with_ymd_and_hms(2017, 10, 21, 14, 5, 9).unwrap();
        assert_eq!(format_timestamp(&dt), "14:05:09, Sat 21 10 2017");
    }
}
