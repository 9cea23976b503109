use crate::domain::model::{
    IncompleteScrape, IncomingProfile, MissingFlag, ProfileInfo, Reviewer, RouteDecision,
};
use regex::Regex;
use std::sync::OnceLock;

fn valid_email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email validation pattern is valid")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    valid_email_pattern().is_match(email)
}

/// 依 NAME、EMAIL、SPECS 順序列出缺少或無效的欄位
pub fn missing_flags(reviewer: &Reviewer) -> Vec<MissingFlag> {
    let mut flags = Vec::new();
    if reviewer.name.is_none() {
        flags.push(MissingFlag::Name);
    }
    if !reviewer.email.as_deref().is_some_and(is_valid_email) {
        flags.push(MissingFlag::Email);
    }
    if reviewer.specializations.is_none() {
        flags.push(MissingFlag::Specs);
    }
    flags
}

/// 純函式：同一組輸入永遠得到同一個去向
pub fn classify_and_route(profile: &IncomingProfile, info: ProfileInfo) -> RouteDecision {
    let reviewer = Reviewer::from_profile(profile, info);
    let flags = missing_flags(&reviewer);

    match IncompleteScrape::new(profile.clone(), reviewer.clone(), flags) {
        Some(incomplete) => RouteDecision::ManualIntervention(incomplete),
        None => RouteDecision::Reviewer(reviewer),
    }
}
