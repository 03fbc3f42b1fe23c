// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 质量分权重
///
/// 质量分只用于监控，不参与取舍判断。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    /// 长度分满分
    pub length: u32,
    /// 达到长度满分所需的字符数
    pub length_target: usize,
    /// 段落分满分
    pub paragraphs: u32,
    /// 达到段落满分所需的段落数
    pub paragraph_target: usize,
    /// 存在作者时的加分
    pub author: u32,
    /// 存在发布时间时的加分
    pub date: u32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            length: 40,
            length_target: 2000,
            paragraphs: 30,
            paragraph_target: 8,
            author: 15,
            date: 15,
        }
    }
}

/// 计算 0-100 的质量分
pub fn score(
    weights: &QualityWeights,
    content_length: usize,
    paragraph_count: usize,
    has_author: bool,
    has_date: bool,
) -> u8 {
    let ratio = |value: usize, target: usize| {
        if target == 0 {
            1.0
        } else {
            (value as f64 / target as f64).min(1.0)
        }
    };

    let mut total = ratio(content_length, weights.length_target) * weights.length as f64
        + ratio(paragraph_count, weights.paragraph_target) * weights.paragraphs as f64;
    if has_author {
        total += weights.author as f64;
    }
    if has_date {
        total += weights.date as f64;
    }

    total.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_marks() {
        let weights = QualityWeights::default();
        assert_eq!(score(&weights, 5000, 12, true, true), 100);
    }

    #[test]
    fn test_partial_score() {
        let weights = QualityWeights::default();
        // 1000/2000 * 40 + 4/8 * 30 = 35
        assert_eq!(score(&weights, 1000, 4, false, false), 35);
        assert_eq!(score(&weights, 1000, 4, true, false), 50);
    }

    #[test]
    fn test_clamped_to_hundred() {
        let weights = QualityWeights {
            length: 90,
            paragraphs: 90,
            ..Default::default()
        };
        assert_eq!(score(&weights, 5000, 20, true, true), 100);
    }
}
