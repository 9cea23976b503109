use serde::{Deserialize, Serialize};

pub const SALUTATION: &str = "Dr.";

/// 上游提供的機構資料，原樣轉送；未知欄位保留在 `extra`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Institution {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown institution")
    }
}

/// 上游爬蟲送來的教職員個人頁面
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingProfile {
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub department: String,
    pub institution: Institution,
}

impl IncomingProfile {
    pub fn embedded_html(&self) -> Option<&str> {
        non_blank(self.html_content.as_deref())
    }

    pub fn profile_url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    pub fn has_source(&self) -> bool {
        self.embedded_html().is_some() || self.profile_url().is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// 從補全服務回應解析出的個人資訊
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specializations: Option<Vec<String>>,
}

impl ProfileInfo {
    /// 去除重複的專長並保留首次出現的順序；空集合視為缺少
    pub fn new(name: Option<String>, email: Option<String>, specializations: Vec<String>) -> Self {
        let specializations = dedupe_preserving_order(specializations);
        Self {
            name,
            email,
            specializations: (!specializations.is_empty()).then_some(specializations),
        }
    }
}

pub fn dedupe_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: Option<String>,
    pub salutation: String,
    pub email: Option<String>,
    pub institution: Institution,
    pub department: String,
    pub specializations: Option<Vec<String>>,
}

impl Reviewer {
    pub fn from_profile(profile: &IncomingProfile, info: ProfileInfo) -> Self {
        Self {
            name: info.name,
            salutation: SALUTATION.to_string(),
            email: info.email,
            institution: profile.institution.clone(),
            department: profile.department.clone(),
            specializations: info.specializations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MissingFlag {
    Name,
    Email,
    Specs,
}

/// 缺少欄位、需要人工處理的結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteScrape {
    pub profile: IncomingProfile,
    #[serde(rename = "partial_reviewer")]
    pub reviewer: Reviewer,
    #[serde(rename = "missing_flags")]
    pub flags: Vec<MissingFlag>,
}

impl IncompleteScrape {
    /// `flags` 為空時回傳 `None`，保證此結構一定帶有缺少的欄位
    pub fn new(profile: IncomingProfile, reviewer: Reviewer, flags: Vec<MissingFlag>) -> Option<Self> {
        if flags.is_empty() {
            return None;
        }
        Some(Self {
            profile,
            reviewer,
            flags,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Reviewer(Reviewer),
    ManualIntervention(IncompleteScrape),
}

/// 單一訊息處理結束時的去向
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reviewer,
    ManualIntervention,
    DeadLettered { reason: String, attempts: u32 },
}
