/// TOML-based engine configuration
///
/// Every threshold the suggestion engine uses lives here, along with the
/// keyword taxonomy. A missing file means defaults. Any key left out of the
/// file also falls back to its default.
///
/// Configuration is stored at `~/.taskmind/config.toml`.

use crate::error::{Result, TaskmindError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory
pub const HOME_ENV: &str = "TASKMIND_HOME";

/// Resolve the data directory (`$TASKMIND_HOME` or `~/.taskmind`)
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = dirs::home_dir()
        .ok_or_else(|| TaskmindError::Config("Could not determine home directory".to_string()))?;

    Ok(home.join(".taskmind"))
}

/// One category of the keyword taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub tag: String,
    pub display_name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn new(tag: &str, display_name: &str, keywords: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            display_name: display_name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered tag → keyword table. Order decides tie-breaks downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
    /// Tag whose keywords count as "urgent"
    #[serde(default = "default_urgent_tag")]
    pub urgent_tag: String,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            urgent_tag: default_urgent_tag(),
        }
    }
}

impl Taxonomy {
    /// Keywords that flag a task as urgent
    pub fn urgent_keywords(&self) -> &[String] {
        self.categories
            .iter()
            .find(|c| c.tag == self.urgent_tag)
            .map(|c| c.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// Localized name for a tag, or the tag itself
    pub fn display_name<'a>(&'a self, tag: &'a str) -> &'a str {
        self.categories
            .iter()
            .find(|c| c.tag == tag)
            .map(|c| c.display_name.as_str())
            .unwrap_or(tag)
    }
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "work",
            "工作",
            &["会议", "项目", "报告", "演示", "代码", "开发", "设计", "文档", "邮件", "客户", "团队"],
        ),
        CategoryRule::new(
            "study",
            "学习",
            &["学习", "阅读", "课程", "作业", "考试", "复习", "笔记", "练习"],
        ),
        CategoryRule::new(
            "life",
            "生活",
            &["购物", "买菜", "做饭", "洗衣", "打扫", "整理", "维修", "缴费"],
        ),
        CategoryRule::new(
            "health",
            "健康",
            &["运动", "健身", "跑步", "瑜伽", "体检", "医生", "吃药"],
        ),
        CategoryRule::new(
            "social",
            "社交",
            &["聚会", "约会", "拜访", "电话", "聊天", "聚餐"],
        ),
        CategoryRule::new(
            "finance",
            "财务",
            &["账单", "支付", "转账", "投资", "理财", "报销"],
        ),
        CategoryRule::new("travel", "旅行", &["旅行", "出差", "订票", "酒店", "行程"]),
        CategoryRule::new(
            "urgent",
            "紧急",
            &["紧急", "重要", "尽快", "立即", "马上", "今天必须"],
        ),
    ]
}

fn default_urgent_tag() -> String {
    "urgent".to_string()
}

/// Tunable thresholds. The defaults were picked by trial, not derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Pairs scoring above this are reported as similar
    #[serde(default = "default_similar_pair")]
    pub similar_pair: f64,
    /// The best pair must score above this to suggest a merge
    #[serde(default = "default_merge")]
    pub merge: f64,
    /// Texts longer than this (in characters) are decomposition candidates
    #[serde(default = "default_long_task_chars")]
    pub long_task_chars: usize,
    /// Words must appear at least this often in completed tasks
    #[serde(default = "default_pattern_min_occurrences")]
    pub pattern_min_occurrences: usize,
    /// Words must be longer than this to become a pattern
    #[serde(default = "default_pattern_min_word_chars")]
    pub pattern_min_word_chars: usize,
    /// Tokens no longer than this are not counted at all
    #[serde(default = "default_token_min_chars")]
    pub token_min_chars: usize,
    #[serde(default = "default_pattern_limit")]
    pub pattern_limit: usize,
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    /// More active tasks than this triggers the workload rule
    #[serde(default = "default_workload")]
    pub workload: usize,
    #[serde(default = "default_dominant_category_min")]
    pub dominant_category_min: usize,
    /// More active tasks than this with none high triggers a nudge
    #[serde(default = "default_no_high_min_active")]
    pub no_high_min_active: usize,
    #[serde(default = "default_no_high_promote")]
    pub no_high_promote: usize,
    #[serde(default = "default_focus_promote")]
    pub focus_promote: usize,
    #[serde(default = "default_completion_rate")]
    pub completion_rate: f64,
    #[serde(default = "default_completion_min_done")]
    pub completion_min_done: usize,
    /// Seconds before a pending change confirms itself
    #[serde(default = "default_pending_timeout_secs")]
    pub pending_timeout_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            similar_pair: default_similar_pair(),
            merge: default_merge(),
            long_task_chars: default_long_task_chars(),
            pattern_min_occurrences: default_pattern_min_occurrences(),
            pattern_min_word_chars: default_pattern_min_word_chars(),
            token_min_chars: default_token_min_chars(),
            pattern_limit: default_pattern_limit(),
            recent_window_days: default_recent_window_days(),
            recent_limit: default_recent_limit(),
            workload: default_workload(),
            dominant_category_min: default_dominant_category_min(),
            no_high_min_active: default_no_high_min_active(),
            no_high_promote: default_no_high_promote(),
            focus_promote: default_focus_promote(),
            completion_rate: default_completion_rate(),
            completion_min_done: default_completion_min_done(),
            pending_timeout_secs: default_pending_timeout_secs(),
        }
    }
}

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

impl Thresholds {
    /// Recent-completion window in milliseconds
    ///
    /// Saturates instead of overflowing for absurd day counts.
    pub fn recent_window_ms(&self) -> i64 {
        self.recent_window_days.saturating_mul(DAY_MS)
    }
}

fn default_similar_pair() -> f64 {
    0.3
}
fn default_merge() -> f64 {
    0.5
}
fn default_long_task_chars() -> usize {
    30
}
fn default_pattern_min_occurrences() -> usize {
    3
}
fn default_pattern_min_word_chars() -> usize {
    2
}
fn default_token_min_chars() -> usize {
    1
}
fn default_pattern_limit() -> usize {
    10
}
fn default_recent_window_days() -> i64 {
    7
}
fn default_recent_limit() -> usize {
    5
}
fn default_workload() -> usize {
    8
}
fn default_dominant_category_min() -> usize {
    3
}
fn default_no_high_min_active() -> usize {
    3
}
fn default_no_high_promote() -> usize {
    2
}
fn default_focus_promote() -> usize {
    3
}
fn default_completion_rate() -> f64 {
    0.7
}
fn default_completion_min_done() -> usize {
    5
}
fn default_pending_timeout_secs() -> u64 {
    60
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub taxonomy: Taxonomy,
}

impl EngineConfig {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values that would make the engine meaningless
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;

        for (name, value) in [
            ("similar_pair", t.similar_pair),
            ("merge", t.merge),
            ("completion_rate", t.completion_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TaskmindError::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if t.recent_window_days < 0 {
            return Err(TaskmindError::Config(
                "recent_window_days cannot be negative".to_string(),
            ));
        }

        if t.recent_window_days.checked_mul(DAY_MS).is_none() {
            return Err(TaskmindError::Config(format!(
                "recent_window_days is too large, got {}",
                t.recent_window_days
            )));
        }

        if !self
            .taxonomy
            .categories
            .iter()
            .any(|c| c.tag == self.taxonomy.urgent_tag)
        {
            return Err(TaskmindError::Config(format!(
                "urgent_tag '{}' does not name a category",
                self.taxonomy.urgent_tag
            )));
        }

        Ok(())
    }
}
