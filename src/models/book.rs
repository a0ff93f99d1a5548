//! 네이버 책 검색 API 的请求 / 响应模型
//!
//! 只做 JSON 映射，不包含任何业务逻辑。

use serde::{Deserialize, Deserializer, Serialize};

/// 单本图书的元数据
///
/// 上游返回的字段可能为空字符串或缺失，这里不做任何校验。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookItem {
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub author: String,
    /// 上游以字符串形式返回价格，空字符串视为缺失
    #[serde(deserialize_with = "lenient_number")]
    pub price: Option<u64>,
    #[serde(deserialize_with = "lenient_number")]
    pub discount: Option<u64>,
    #[serde(deserialize_with = "null_as_empty")]
    pub publisher: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub pubdate: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub isbn: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub description: String,
}

/// 一页搜索结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResponse {
    pub last_build_date: Option<String>,
    pub total: i64,
    pub start: i64,
    pub display: i64,
    pub items: Vec<BookItem>,
}

impl SearchResponse {
    /// 未调用上游时使用的空结果
    pub fn empty() -> Self {
        Self {
            start: 1,
            ..Default::default()
        }
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

/// 单次分页请求
///
/// `None` 的字段由传输层按配置补全（display/sort 取配置值，start 默认 1）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub query: String,
    pub display: Option<u32>,
    pub start: Option<u32>,
    pub sort: Option<String>,
}

impl PageRequest {
    /// 只指定 start，其余使用默认值
    pub fn page(query: impl Into<String>, start: u32) -> Self {
        Self {
            query: query.into(),
            start: Some(start),
            ..Default::default()
        }
    }
}

/// `null` 按空字符串处理
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Float(f)) => whole_amount(f),
        Some(Raw::Text(s)) => {
            let s = s.trim();
            s.parse().ok().or_else(|| s.parse().ok().and_then(whole_amount))
        }
        None => None,
    })
}

/// 负数和非有限值视为缺失
fn whole_amount(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}
