//! 数字 (0~9) 与小写字母 (a~z) 检索词

use chrono::Weekday;

/// 数字按星期的分配区间（全量列表下标，左闭右开），周一=0 … 周日=6
const DIGIT_RANGES: [(usize, usize); 7] = [
    (0, 2),  // 周一: 0,1
    (2, 4),  // 周二: 2,3
    (4, 6),  // 周三: 4,5
    (6, 7),  // 周四: 6
    (7, 8),  // 周五: 7
    (8, 9),  // 周六: 8
    (9, 10), // 周日: 9
];

/// 字母按星期的分配区间（全量列表下标，10~35 对应 a~z）
const ALPHA_RANGES: [(usize, usize); 7] = [
    (10, 14), // a b c d
    (14, 18), // e f g h
    (18, 22), // i j k l
    (22, 26), // m n o p
    (26, 30), // q r s t
    (30, 33), // u v w
    (33, 36), // x y z
];

/// 全量：下标 0~9 为 '0'~'9'，10~35 为 'a'~'z'
pub(super) fn full_scan_patterns() -> Vec<String> {
    ('0'..='9').chain('a'..='z').map(String::from).collect()
}

pub(super) fn daily_patterns(weekday: Weekday) -> Vec<String> {
    let all = full_scan_patterns();
    let day = weekday.num_days_from_monday() as usize;

    let mut result = super::slice_clamped(&all, DIGIT_RANGES[day]);
    result.extend(super::slice_clamped(&all, ALPHA_RANGES[day]));
    result
}
