//! 根据共同课程推荐好友

use std::collections::{HashMap, HashSet};

use crate::storage::Course;

/// 按其他用户与 `my_courses` 共同修过的开课数排序。
///
/// 开课按 (code, year, semester) 匹配。排除 `viewer` 与 `excluded` 中的用户，
/// 数量相同时按 zID 排序以保证顺序稳定。
pub fn rank_classmates(
    viewer: &str,
    my_courses: &[Course],
    rows: &[Course],
    excluded: &HashSet<String>,
) -> Vec<(String, usize)> {
    let mine: HashSet<(&str, i32, &str)> = my_courses.iter().map(Course::offering).collect();

    let mut counts: HashMap<&str, HashSet<(&str, i32, &str)>> = HashMap::new();
    for row in rows {
        if row.user == viewer || excluded.contains(&row.user) {
            continue;
        }
        let offering = row.offering();
        if mine.contains(&offering) {
            counts.entry(row.user.as_str()).or_default().insert(offering);
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(user, shared)| (user.to_string(), shared.len()))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
