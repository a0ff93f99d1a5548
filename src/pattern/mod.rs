//! 检索词生成
//!
//! 全量扫描使用全部 55 个检索词；每日扫描按星期把数字、字母、한글 三段各自切片，
//! 一周七天合起来恰好覆盖全量且不重复。输出只取决于输入的星期，与随机数和系统时间无关。

mod ascii;
mod hangul;

use chrono::{Datelike, Local, Weekday};

/// 检索词生成器
pub struct QueryPatternGenerator;

impl QueryPatternGenerator {
    /// 全量扫描检索词：'0'~'9'、'a'~'z'、19 个初声音节，共 55 个
    pub fn full_scan() -> Vec<String> {
        let mut queries = ascii::full_scan_patterns();
        queries.extend(hangul::full_scan_patterns());
        queries
    }

    /// 指定星期的每日扫描检索词
    pub fn daily_scan(weekday: Weekday) -> Vec<String> {
        let mut queries = ascii::daily_patterns(weekday);
        queries.extend(hangul::daily_patterns(weekday));
        queries
    }

    /// 今天（本地时间）的每日扫描检索词
    pub fn daily_scan_today() -> Vec<String> {
        Self::daily_scan(Local::now().weekday())
    }
}

/// 越界的区间收敛为有效部分，不会 panic
fn slice_clamped(source: &[String], (from, to): (usize, usize)) -> Vec<String> {
    let to = to.min(source.len());
    if from >= to {
        return Vec::new();
    }
    source[from..to].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const WEEK: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    #[test]
    fn full_scan_has_fixed_order_and_size() {
        let queries = QueryPatternGenerator::full_scan();
        assert_eq!(queries.len(), 55);
        assert_eq!(queries[0], "0");
        assert_eq!(queries[9], "9");
        assert_eq!(queries[10], "a");
        assert_eq!(queries[35], "z");
        assert_eq!(queries[36], "가");
        assert_eq!(queries[54], "하");
        assert_eq!(queries, QueryPatternGenerator::full_scan());
    }

    #[test]
    fn week_of_daily_scans_partitions_each_range_exactly() {
        let full = QueryPatternGenerator::full_scan();
        let ranges = [(0, 10), (10, 36), (36, 55)];

        for (from, to) in ranges {
            let expected = &full[from..to];
            let mut seen = Vec::new();
            for day in WEEK {
                seen.extend(
                    QueryPatternGenerator::daily_scan(day)
                        .into_iter()
                        .filter(|q| expected.contains(q)),
                );
            }
            let unique: HashSet<&String> = seen.iter().collect();
            assert_eq!(unique.len(), seen.len(), "duplicate token in range {}..{}", from, to);

            seen.sort();
            let mut expected = expected.to_vec();
            expected.sort();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn monday_slice() {
        assert_eq!(
            QueryPatternGenerator::daily_scan(Weekday::Mon),
            vec!["0", "1", "a", "b", "c", "d", "가", "까", "나"]
        );
    }

    #[test]
    fn out_of_range_slices_are_clamped() {
        let source = vec!["x".to_string(), "y".to_string()];
        assert_eq!(slice_clamped(&source, (1, 10)), vec!["y"]);
        assert!(slice_clamped(&source, (5, 7)).is_empty());
        assert!(slice_clamped(&source, (2, 1)).is_empty());
    }
}
