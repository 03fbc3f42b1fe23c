// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 结构化过滤
//!
//! 只依据 HTML 结构判断段落是否为推广内容，从不依据措辞。

use scraper::{ElementRef, Selector};

use super::{collapse_whitespace, visible_text};

/// 判断段落是否为结构性推广
///
/// 三个条件同时满足才丢弃：整段文本恰好是一个链接，
/// 文本全部大写，且长度超过 `min_length`。
pub fn is_structural_promo(paragraph: ElementRef<'_>, min_length: usize) -> bool {
    let text = visible_text(paragraph);
    if text.chars().count() <= min_length {
        return false;
    }
    if !is_fully_upper_case(&text) {
        return false;
    }

    let Ok(anchor_selector) = Selector::parse("a") else {
        return false;
    };
    let mut anchors = paragraph.select(&anchor_selector);
    let Some(anchor) = anchors.next() else {
        return false;
    };
    if anchors.next().is_some() {
        return false;
    }

    collapse_whitespace(&visible_text(anchor)) == text
}

/// 至少包含一个字母，且所有字母都是大写
pub fn is_fully_upper_case(text: &str) -> bool {
    let mut has_alpha = false;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        has_alpha = true;
        if c.is_lowercase() {
            return false;
        }
    }
    has_alpha
}
