//! 한글 초성 检索词
//!
//! 每个初声取其区块内的第一个音节（가, 까, 나, 다, …, 하）。

use chrono::Weekday;

const HANGUL_BASE: u32 = 0xAC00; // '가'
const CHOSEONG_COUNT: u32 = 19;
const JUNGSEONG_COUNT: u32 = 21;
const JONGSEONG_COUNT: u32 = 28;
const BLOCK_SIZE: u32 = JUNGSEONG_COUNT * JONGSEONG_COUNT; // 588

/// 初声按星期的分配区间（初声下标，左闭右开）
const CHOSEONG_RANGES: [(usize, usize); 7] = [
    (0, 3),
    (3, 6),
    (6, 9),
    (9, 12),
    (12, 15),
    (15, 17),
    (17, 19),
];

pub(super) fn full_scan_patterns() -> Vec<String> {
    (0..CHOSEONG_COUNT)
        .filter_map(|i| char::from_u32(HANGUL_BASE + i * BLOCK_SIZE))
        .map(String::from)
        .collect()
}

pub(super) fn daily_patterns(weekday: Weekday) -> Vec<String> {
    let all = full_scan_patterns();
    super::slice_clamped(&all, CHOSEONG_RANGES[weekday.num_days_from_monday() as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_choseong_blocks() {
        let all = full_scan_patterns();
        assert_eq!(all.len(), 19);
        assert_eq!(all[0], "가");
        assert_eq!(all[1], "까");
        assert_eq!(all[2], "나");
        assert_eq!(all[18], "하");
    }
}
