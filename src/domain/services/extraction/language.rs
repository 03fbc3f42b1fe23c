// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 语言识别
//!
//! 优先使用页面声明的 `<html lang>`，否则按文字系统和常见虚词做粗略判断。

use scraper::{Html, Selector};

const SAMPLE_CHARS: usize = 2000;

const STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "of", "to", "is", "in", "that", "with"]),
    ("fr", &["le", "la", "les", "et", "des", "est", "une", "dans"]),
    ("es", &["el", "los", "las", "y", "del", "que", "una", "por"]),
    ("de", &["der", "die", "und", "das", "ist", "nicht", "mit", "ein"]),
];

/// `<html lang>` 的主标签，小写
pub fn html_lang(document: &Html) -> Option<String> {
    let selector = Selector::parse("html[lang]").ok()?;
    let lang = document.select(&selector).next()?.value().attr("lang")?;
    let primary = lang.trim().split(['-', '_']).next()?.to_ascii_lowercase();
    (primary.len() >= 2 && primary.chars().all(|c| c.is_ascii_alphabetic())).then_some(primary)
}

/// 识别正文语言
pub fn detect(declared: Option<&str>, text: &str) -> Option<String> {
    if let Some(lang) = declared.filter(|l| !l.is_empty()) {
        return Some(lang.to_string());
    }
    detect_script(text).or_else(|| detect_latin(text))
}

fn detect_script(text: &str) -> Option<String> {
    let mut counts = [0usize; 8];
    let mut letters = 0usize;
    for c in text.chars().take(SAMPLE_CHARS).filter(|c| c.is_alphabetic()) {
        letters += 1;
        let slot = match c as u32 {
            0x0600..=0x06FF | 0x0750..=0x077F => 0, // ar
            0x0590..=0x05FF => 1,                   // he
            0x0400..=0x04FF => 2,                   // ru
            0x3040..=0x30FF => 3,                   // ja kana
            0x4E00..=0x9FFF => 4,                   // han
            0xAC00..=0xD7AF | 0x1100..=0x11FF => 5, // ko
            0x0370..=0x03FF => 6,                   // el
            _ => 7,
        };
        counts[slot] += 1;
    }
    if letters == 0 {
        return None;
    }

    // 含假名即视为日文
    if counts[3] > 0 && counts[3] + counts[4] > letters / 2 {
        return Some("ja".to_string());
    }
    let (slot, count) = counts[..7]
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)?;
    if *count * 2 <= letters {
        return None;
    }
    let code = ["ar", "he", "ru", "ja", "zh", "ko", "el"][slot];
    Some(code.to_string())
}

fn detect_latin(text: &str) -> Option<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .take(400)
        .map(str::to_lowercase)
        .collect();
    if words.len() < 5 {
        return None;
    }

    let (code, hits) = STOPWORDS
        .iter()
        .map(|(code, stopwords)| {
            let hits = words.iter().filter(|w| stopwords.contains(&w.as_str())).count();
            (*code, hits)
        })
        .max_by_key(|(_, hits)| *hits)?;

    (hits >= 2).then(|| code.to_string())
}
