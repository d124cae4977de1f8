//! # Value 模块
//!
//! 控件属性值。
//!
//! 宿主控件的属性是动态的：`opacity` / `scale` 可能是数字，也可能是
//! 数字字符串；`visible` 是布尔；`color` / `src` 是字符串。

use serde::{Deserialize, Serialize};

/// 控件属性值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// 数值
    Number(f64),
    /// 布尔
    Bool(bool),
    /// 字符串
    Text(String),
}

impl PropertyValue {
    /// 空字符串（用于清除颜色覆盖等）
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// 读取为数值
    ///
    /// 字符串按 `parseFloat` 的规则取最长的数值前缀，例如 `"0.5"`、
    /// `" 2px"`、`"-Infinity"` 都能读出数值。布尔不视为数值。
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_float(s),
            Self::Bool(_) => None,
        }
    }

    /// 读取为布尔（只有 `Bool` 有效）
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 读取为字符串
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 真值判断
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// 取字符串开头最长的合法浮点数前缀
fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut best = None;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
                best = Some(end);
            }
            b'.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                end += 1;
            }
            b'e' | b'E' if seen_digit && !seen_exp => {
                seen_exp = true;
                end += 1;
                if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
                    end += 1;
                }
            }
            _ => break,
        }
    }

    best.and_then(|end| s[..end].parse().ok())
}
